//! Mock chain server for local testing of the private token platform.
//!
//! This provides a JSON-RPC server that orders submitted calls into blocks
//! and applies them to the runtime module without a real blockchain.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use jsonrpsee::core::async_trait;
use jsonrpsee::proc_macros::rpc;
use jsonrpsee::server::Server;
use jsonrpsee::types::ErrorObjectOwned;
use parking_lot::RwLock;
use tracing::{info, warn};

use privtoken_module::{
    CallReceipt, ModuleError, ModuleGenesisConfig, ModuleQuery, ModuleQueryResponse, RuntimeCall,
};
use privtoken_types::Owner;

mod chain;
use chain::{BlockInfo, ChainState};

/// Error code for rejected calls.
const CALL_REJECTED: i32 = -32000;
/// Error code for malformed parameters.
const INVALID_PARAMS: i32 = -32602;

#[derive(Parser)]
#[command(name = "mock-chain")]
#[command(about = "Local JSON-RPC node for the private token platform")]
struct Cli {
    /// Address to serve JSON-RPC on
    #[arg(long, default_value = "127.0.0.1:9944")]
    listen: SocketAddr,

    /// Genesis configuration (JSON); a dev genesis is used when absent
    #[arg(long)]
    genesis: Option<PathBuf>,

    /// Admin identity (hex) for the dev genesis
    #[arg(long)]
    admin: Option<String>,

    /// Proof attestor identity (hex) for the dev genesis; the public dev
    /// attestor is used when absent
    #[arg(long)]
    attestor: Option<String>,
}

/// RPC API definition for the mock chain.
#[rpc(server)]
pub trait MockChainApi {
    // ============ Admin Methods ============

    /// Advance the chain by `count` blocks (default 1).
    #[method(name = "admin_advanceBlock")]
    async fn admin_advance_block(&self, count: Option<u64>) -> Result<BlockInfo, ErrorObjectOwned>;

    // ============ Chain Methods ============

    /// Get current block info.
    #[method(name = "chain_getBlockInfo")]
    async fn chain_get_block_info(&self) -> Result<BlockInfo, ErrorObjectOwned>;

    /// Get the genesis configuration the chain was started with.
    #[method(name = "chain_getGenesis")]
    async fn chain_get_genesis(&self) -> Result<ModuleGenesisConfig, ErrorObjectOwned>;

    /// Apply a call from `sender` (hex identity) at the current height.
    #[method(name = "chain_submit")]
    async fn chain_submit(
        &self,
        sender: String,
        call: RuntimeCall,
    ) -> Result<CallReceipt, ErrorObjectOwned>;

    /// Run a module query.
    #[method(name = "chain_query")]
    async fn chain_query(&self, query: ModuleQuery) -> Result<ModuleQueryResponse, ErrorObjectOwned>;

    /// Sealed bid auctions ready for settlement.
    #[method(name = "chain_getSettleableAuctions")]
    async fn chain_get_settleable_auctions(&self) -> Result<Vec<u64>, ErrorObjectOwned>;
}

/// Implementation of the mock chain RPC server.
struct MockChainServer {
    state: Arc<RwLock<ChainState>>,
}

impl MockChainServer {
    fn new(chain: ChainState) -> Self {
        Self {
            state: Arc::new(RwLock::new(chain)),
        }
    }

    fn rejection(err: &ModuleError) -> ErrorObjectOwned {
        ErrorObjectOwned::owned(CALL_REJECTED, err.to_string(), Some(format!("{err:?}")))
    }

    fn invalid_params(msg: &str) -> ErrorObjectOwned {
        ErrorObjectOwned::owned(INVALID_PARAMS, msg.to_string(), None::<()>)
    }
}

#[async_trait]
impl MockChainApiServer for MockChainServer {
    async fn admin_advance_block(&self, count: Option<u64>) -> Result<BlockInfo, ErrorObjectOwned> {
        Ok(self.state.write().advance(count.unwrap_or(1)))
    }

    async fn chain_get_block_info(&self) -> Result<BlockInfo, ErrorObjectOwned> {
        Ok(self.state.read().block_info())
    }

    async fn chain_get_genesis(&self) -> Result<ModuleGenesisConfig, ErrorObjectOwned> {
        Ok(self.state.read().genesis().clone())
    }

    async fn chain_submit(
        &self,
        sender: String,
        call: RuntimeCall,
    ) -> Result<CallReceipt, ErrorObjectOwned> {
        let sender = Owner::from_hex(sender.trim_start_matches("0x"))
            .ok_or_else(|| Self::invalid_params("sender must be a 48-byte hex identity"))?;

        self.state
            .write()
            .submit(sender, call)
            .map_err(|err| Self::rejection(&err))
    }

    async fn chain_query(&self, query: ModuleQuery) -> Result<ModuleQueryResponse, ErrorObjectOwned> {
        Ok(self.state.read().query(query))
    }

    async fn chain_get_settleable_auctions(&self) -> Result<Vec<u64>, ErrorObjectOwned> {
        Ok(self.state.read().settleable_auctions())
    }
}

fn load_genesis(cli: &Cli) -> Result<ModuleGenesisConfig> {
    if let Some(path) = &cli.genesis {
        let json = std::fs::read_to_string(path)
            .with_context(|| format!("reading genesis file {}", path.display()))?;
        let config = ModuleGenesisConfig::from_json(&json)?;
        info!(path = %path.display(), "loaded genesis");
        return Ok(config);
    }

    let admin = match &cli.admin {
        Some(hex_str) => Owner::from_hex(hex_str.trim_start_matches("0x"))
            .context("admin must be a 48-byte hex identity")?,
        None => {
            warn!("no --admin given; public tokens cannot be issued");
            Owner::EMPTY
        }
    };
    let mut config = ModuleGenesisConfig::dev(admin);
    if admin.is_empty() {
        config.admin = None;
    }
    match &cli.attestor {
        Some(hex_str) => {
            config.attestor = Owner::from_hex(hex_str).context("attestor must be a 48-byte hex identity")?;
        }
        None => warn!(attestor = %config.attestor, "using the dev attestor; anyone can sign proofs"),
    }
    info!("using dev genesis");
    Ok(config)
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("mock_chain=info".parse()?)
                .add_directive("privtoken_module=info".parse()?)
                .add_directive("jsonrpsee=warn".parse()?),
        )
        .init();

    let cli = Cli::parse();
    let chain = ChainState::new(load_genesis(&cli)?)?;

    info!("Starting mock chain server on {}", cli.listen);

    let server = Server::builder().build(cli.listen).await?;
    let handle = server.start(MockChainServer::new(chain).into_rpc());

    info!("Mock chain server running. Press Ctrl+C to stop.");

    // Wait for shutdown signal
    tokio::signal::ctrl_c().await?;

    info!("Shutting down...");
    handle.stop()?;
    handle.stopped().await;

    Ok(())
}
