//! CLI for holding keys and interacting with a private token chain.
//!
//! This binary provides commands for:
//! - Generating keys and reading balances
//! - Depositing, redeeming, transferring, claiming and withdrawing
//! - Starting, bidding in, revealing and settling sealed bid auctions
//!
//! Proofs are produced locally; secret keys and salts never leave the CLI.

use anyhow::{anyhow, Context, Result};
use clap::{Parser, Subcommand};
use jsonrpsee::core::client::ClientT;
use jsonrpsee::http_client::{HttpClient, HttpClientBuilder};
use jsonrpsee::rpc_params;
use rand::rngs::OsRng;
use rand::RngCore;
use serde::{Deserialize, Serialize};
use tracing::info;

use privtoken_client::{DepositLog, Prover, SealedBid};
use privtoken_crypto::{decrypt_amount, Keypair, SecretKey};
use privtoken_module::{
    dev_attestor_key, AuctionKind, CallReceipt, ModuleGenesisConfig, ModuleQuery, ModuleQueryResponse,
    RuntimeCall,
};
use privtoken_types::{AssetKey, ClaimKey, Digest, EncryptedAmount, Owner, Salt};

#[derive(Parser)]
#[command(name = "privtoken-cli")]
#[command(about = "CLI for the private token platform")]
struct Cli {
    /// Mock chain RPC endpoint
    #[arg(long, default_value = "http://127.0.0.1:9944")]
    rpc: String,

    /// Attestor secret key (hex); defaults to the dev chain attestor
    #[arg(long, global = true)]
    attestor_key: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate a new keypair
    Keygen,

    /// Show public and confidential balances
    Balance {
        /// Secret key (hex)
        #[arg(long)]
        secret: String,
    },

    /// Issue public tokens (admin only)
    SetBalance {
        #[arg(long)]
        secret: String,
        /// Recipient identity (hex)
        #[arg(long)]
        owner: String,
        #[arg(long)]
        amount: u64,
    },

    /// Mint an asset into the sender's collection
    MintAsset {
        #[arg(long)]
        secret: String,
        /// Metadata digest (hex)
        #[arg(long)]
        metadata: Option<String>,
    },

    /// Lock public tokens behind a deposit commitment
    Deposit {
        #[arg(long)]
        secret: String,
        #[arg(long)]
        amount: u64,
    },

    /// Redeem a deposit into a confidential claim
    Redeem {
        #[arg(long)]
        secret: String,
        #[arg(long)]
        amount: u64,
        /// Salt printed by `deposit` (hex)
        #[arg(long)]
        salt: String,
        /// Recipient identity (hex), defaults to the sender
        #[arg(long)]
        to: Option<String>,
    },

    /// Claim a pending credit into the confidential balance
    Claim {
        #[arg(long)]
        secret: String,
        /// Claim index
        #[arg(long)]
        index: u64,
    },

    /// Confidential transfer
    Transfer {
        #[arg(long)]
        secret: String,
        #[arg(long)]
        to: String,
        #[arg(long)]
        amount: u64,
    },

    /// Convert confidential balance to public tokens
    Withdraw {
        #[arg(long)]
        secret: String,
        #[arg(long)]
        amount: u64,
    },

    /// Start a sealed bid auction for an owned asset
    StartAuction {
        #[arg(long)]
        secret: String,
        /// Asset collection (hex)
        #[arg(long)]
        collection: String,
        #[arg(long)]
        sequence: u32,
        #[arg(long)]
        bidding_window: u64,
        #[arg(long)]
        reveal_window: u64,
        #[arg(long, default_value = "0")]
        min_price: u64,
    },

    /// Place a sealed bid
    Bid {
        #[arg(long)]
        secret: String,
        #[arg(long)]
        collection: String,
        #[arg(long)]
        sequence: u32,
        #[arg(long)]
        amount: u64,
    },

    /// Reveal a sealed bid
    Reveal {
        #[arg(long)]
        secret: String,
        #[arg(long)]
        auction_id: u64,
        #[arg(long)]
        amount: u64,
        /// Salt printed by `bid` (hex)
        #[arg(long)]
        salt: String,
    },

    /// Settle a sealed bid auction
    Settle {
        #[arg(long)]
        secret: String,
        #[arg(long)]
        collection: String,
        #[arg(long)]
        sequence: u32,
    },

    /// Advance the chain (for testing)
    AdvanceBlock {
        #[arg(long, default_value = "1")]
        count: u64,
    },
}

#[derive(Debug, Serialize, Deserialize)]
struct BlockInfo {
    height: u64,
}

struct Session {
    client: HttpClient,
    genesis: ModuleGenesisConfig,
    prover: Prover,
}

impl Session {
    async fn connect(rpc: &str, attestor_key: Option<&str>) -> Result<Self> {
        let client = HttpClientBuilder::default().build(rpc)?;
        let genesis: ModuleGenesisConfig = client.request("chain_getGenesis", rpc_params![]).await?;
        let attestor = match attestor_key {
            Some(hex_str) => parse_keypair(hex_str)?.secret().clone(),
            None => dev_attestor_key(),
        };
        let prover = Prover::from_genesis(&genesis, attestor).context("cannot attest proofs for this chain")?;
        Ok(Self {
            client,
            genesis,
            prover,
        })
    }

    async fn submit(&self, sender: &Keypair, call: RuntimeCall) -> Result<CallReceipt> {
        let name = call.name();
        let receipt: CallReceipt = self
            .client
            .request("chain_submit", rpc_params![sender.owner().to_hex(), call])
            .await
            .with_context(|| format!("{name} rejected"))?;
        info!(call = name, ?receipt, "submitted");
        Ok(receipt)
    }

    async fn query(&self, query: ModuleQuery) -> Result<ModuleQueryResponse> {
        Ok(self.client.request("chain_query", rpc_params![query]).await?)
    }

    async fn ledger_of(&self, owner: &Owner) -> Result<Option<EncryptedAmount>> {
        match self.query(ModuleQuery::GetLedger { owner: *owner }).await? {
            ModuleQueryResponse::Ledger(entry) => Ok(entry),
            other => Err(anyhow!("unexpected response: {other:?}")),
        }
    }

    async fn require_ledger(&self, owner: &Owner) -> Result<EncryptedAmount> {
        self.ledger_of(owner)
            .await?
            .ok_or_else(|| anyhow!("no confidential balance yet; claim a credit first"))
    }
}

fn parse_keypair(secret: &str) -> Result<Keypair> {
    let bytes: [u8; 32] = hex::decode(secret)?
        .try_into()
        .map_err(|_| anyhow!("secret key must be 32 bytes"))?;
    Ok(Keypair::from_secret(SecretKey::from_bytes(&bytes)?))
}

fn parse_owner(hex_str: &str) -> Result<Owner> {
    Owner::from_hex(hex_str).ok_or_else(|| anyhow!("identity must be 48 hex-encoded bytes"))
}

fn parse_salt(hex_str: &str) -> Result<Salt> {
    let bytes: [u8; 32] = hex::decode(hex_str)?
        .try_into()
        .map_err(|_| anyhow!("salt must be 32 bytes"))?;
    Ok(Salt(bytes))
}

fn random_salt() -> Salt {
    let mut salt = Salt::default();
    OsRng.fill_bytes(&mut salt.0);
    salt
}

async fn balance_cmd(session: &Session, keypair: &Keypair) -> Result<()> {
    let owner = keypair.owner();
    let public = match session.query(ModuleQuery::GetBalance { owner }).await? {
        ModuleQueryResponse::Balance(amount) => amount,
        _ => 0,
    };
    println!("Identity: {}", owner.to_hex());
    println!("  Public: {}", public);

    match session.ledger_of(&owner).await? {
        Some(encrypted) => {
            println!("  Confidential: {}", decrypt_amount(keypair.secret(), &encrypted)?)
        }
        None => println!("  Confidential: <none>"),
    }

    let nonce = match session
        .query(ModuleQuery::GetClaimNonce { recipient: owner })
        .await?
    {
        ModuleQueryResponse::ClaimNonce(nonce) => nonce,
        _ => 0,
    };
    for index in 0..nonce {
        let claim_key = ClaimKey::new(owner, index);
        if let ModuleQueryResponse::Claim(Some(claim)) =
            session.query(ModuleQuery::GetClaim { claim_key }).await?
        {
            if !claim.is_empty() {
                let amount = decrypt_amount(keypair.secret(), &claim)?;
                println!("  Pending claim [{}]: {}", index, amount);
            }
        }
    }
    Ok(())
}

async fn redeem_cmd(session: &Session, keypair: &Keypair, amount: u64, salt: Salt, to: Owner) -> Result<()> {
    let deposits = match session.query(ModuleQuery::ListDeposits).await? {
        ModuleQueryResponse::Deposits(deposits) => deposits,
        other => return Err(anyhow!("unexpected response: {other:?}")),
    };
    let log = DepositLog::new(deposits);
    let proof = session
        .prover
        .prove_deposit(&log, amount, &salt, &to, &mut OsRng)?;

    let receipt = session.submit(keypair, RuntimeCall::AddDeposit { proof }).await?;
    if let CallReceipt::ClaimCreated(key) = receipt {
        println!("Claim created for {} at index {}", key.recipient, key.index);
    }
    Ok(())
}

async fn claim_cmd(session: &Session, keypair: &Keypair, index: u64) -> Result<()> {
    let owner = keypair.owner();
    let claim_key = ClaimKey::new(owner, index);
    let claim = match session.query(ModuleQuery::GetClaim { claim_key }).await? {
        ModuleQueryResponse::Claim(Some(claim)) => claim,
        _ => return Err(anyhow!("no claim at index {index}")),
    };

    let current = session.ledger_of(&owner).await?;
    let proof = session
        .prover
        .prove_claim(keypair, current.as_ref(), &claim, &mut OsRng)?;
    let call = match current {
        None => RuntimeCall::AddFirstClaim { claim_key, proof },
        Some(_) => RuntimeCall::AddClaim { claim_key, proof },
    };
    session.submit(keypair, call).await?;
    println!("Claim {} added", index);
    Ok(())
}

async fn bid_cmd(session: &Session, keypair: &Keypair, asset: AssetKey, amount: u64) -> Result<()> {
    let auction_id = match session
        .query(ModuleQuery::GetAuctionId {
            kind: AuctionKind::SealedBid,
            asset,
        })
        .await?
    {
        ModuleQueryResponse::AuctionId(Some(id)) => id,
        _ => return Err(anyhow!("no sealed bid auction for asset")),
    };

    let current = session.require_ledger(&keypair.owner()).await?;
    let bid: SealedBid = session.prover.prove_sealed_bid(
        keypair,
        &current,
        auction_id,
        amount,
        &session.genesis.escrows.sealed_bid_auction,
        &mut OsRng,
    )?;
    let salt = bid.salt;
    session
        .submit(
            keypair,
            RuntimeCall::PlaceSealedBid {
                asset,
                proof: bid.proof,
            },
        )
        .await?;

    println!("Sealed bid placed in auction {}", auction_id);
    println!("  Keep this salt to reveal: {}", hex::encode(salt.0));
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("privtoken_cli=info".parse()?),
        )
        .init();

    let cli = Cli::parse();

    if let Commands::Keygen = cli.command {
        let keypair = Keypair::generate(&mut OsRng);
        println!("Secret: {}", hex::encode(keypair.secret().to_bytes()));
        println!("Identity: {}", keypair.owner().to_hex());
        return Ok(());
    }

    let session = Session::connect(&cli.rpc, cli.attestor_key.as_deref()).await?;

    match cli.command {
        Commands::Keygen => {}

        Commands::Balance { secret } => {
            balance_cmd(&session, &parse_keypair(&secret)?).await?;
        }

        Commands::SetBalance {
            secret,
            owner,
            amount,
        } => {
            let call = RuntimeCall::SetBalance {
                owner: parse_owner(&owner)?,
                amount,
            };
            session.submit(&parse_keypair(&secret)?, call).await?;
            println!("Issued {} to {}", amount, owner);
        }

        Commands::MintAsset { secret, metadata } => {
            let keypair = parse_keypair(&secret)?;
            let metadata = match metadata {
                Some(hex_str) => Digest(
                    hex::decode(hex_str)?
                        .try_into()
                        .map_err(|_| anyhow!("metadata must be 32 bytes"))?,
                ),
                None => Digest::default(),
            };
            let call = RuntimeCall::MintAsset {
                to: keypair.owner(),
                metadata,
            };
            if let CallReceipt::AssetMinted(key) = session.submit(&keypair, call).await? {
                println!("Asset minted: collection {} sequence {}", key.collection.to_hex(), key.sequence);
            }
        }

        Commands::Deposit { secret, amount } => {
            let keypair = parse_keypair(&secret)?;
            let salt = random_salt();
            let proof = session.prover.prove_deposit_hash(amount, &salt)?;
            session.submit(&keypair, RuntimeCall::Deposit { proof }).await?;
            println!("Deposited {}", amount);
            println!("  Keep this salt to redeem: {}", hex::encode(salt.0));
        }

        Commands::Redeem {
            secret,
            amount,
            salt,
            to,
        } => {
            let keypair = parse_keypair(&secret)?;
            let to = match to {
                Some(to) => parse_owner(&to)?,
                None => keypair.owner(),
            };
            redeem_cmd(&session, &keypair, amount, parse_salt(&salt)?, to).await?;
        }

        Commands::Claim { secret, index } => {
            claim_cmd(&session, &parse_keypair(&secret)?, index).await?;
        }

        Commands::Transfer { secret, to, amount } => {
            let keypair = parse_keypair(&secret)?;
            let current = session.require_ledger(&keypair.owner()).await?;
            let proof = session.prover.prove_transfer(
                &keypair,
                &current,
                amount,
                &parse_owner(&to)?,
                &mut OsRng,
            )?;
            if let CallReceipt::ClaimCreated(key) =
                session.submit(&keypair, RuntimeCall::Transfer { proof }).await?
            {
                println!("Transferred; recipient claim index {}", key.index);
            }
        }

        Commands::Withdraw { secret, amount } => {
            let keypair = parse_keypair(&secret)?;
            let current = session.require_ledger(&keypair.owner()).await?;
            let proof = session.prover.prove_withdraw(
                &keypair,
                &current,
                amount,
                &session.genesis.escrows.withdraw,
                &mut OsRng,
            )?;
            session.submit(&keypair, RuntimeCall::Withdraw { proof }).await?;
            println!("Withdrew {}", amount);
        }

        Commands::StartAuction {
            secret,
            collection,
            sequence,
            bidding_window,
            reveal_window,
            min_price,
        } => {
            let call = RuntimeCall::StartSealedBid {
                asset: AssetKey::new(parse_owner(&collection)?, sequence),
                bidding_window,
                reveal_window,
                min_price,
            };
            if let CallReceipt::AuctionStarted { auction_id } =
                session.submit(&parse_keypair(&secret)?, call).await?
            {
                println!("Auction ID: {}", auction_id);
            }
        }

        Commands::Bid {
            secret,
            collection,
            sequence,
            amount,
        } => {
            let asset = AssetKey::new(parse_owner(&collection)?, sequence);
            bid_cmd(&session, &parse_keypair(&secret)?, asset, amount).await?;
        }

        Commands::Reveal {
            secret,
            auction_id,
            amount,
            salt,
        } => {
            let keypair = parse_keypair(&secret)?;
            let proof = session.prover.prove_reveal(
                &keypair.owner(),
                auction_id,
                amount,
                &parse_salt(&salt)?,
            )?;
            if let CallReceipt::BidRevealed(outcome) =
                session.submit(&keypair, RuntimeCall::RevealBid { proof }).await?
            {
                println!("Revealed: {:?}", outcome);
            }
        }

        Commands::Settle {
            secret,
            collection,
            sequence,
        } => {
            let call = RuntimeCall::SettleSealedBid {
                asset: AssetKey::new(parse_owner(&collection)?, sequence),
            };
            if let CallReceipt::AuctionSettled(settlement) =
                session.submit(&parse_keypair(&secret)?, call).await?
            {
                println!("Auction {} settled", settlement.auction_id);
                println!("  Winner: {}", settlement.winner.to_hex());
                println!("  Price: {}", settlement.price);
            }
        }

        Commands::AdvanceBlock { count } => {
            let info: BlockInfo = session
                .client
                .request("admin_advanceBlock", rpc_params![count])
                .await?;
            println!("Advanced to height {}", info.height);
        }
    }

    Ok(())
}
