//! Simulated chain: a single sequencer applying calls to the runtime.
//!
//! Calls submitted while the chain is at height `h` are applied in arrival
//! order with `block_height = h`. Advancing the chain is an explicit admin
//! action.

use serde::{Deserialize, Serialize};
use tracing::info;

use privtoken_module::{
    CallContext, CallReceipt, GenesisValidationError, HandlerResult, ModuleGenesisConfig,
    ModuleQuery, ModuleQueryResponse, Runtime, RuntimeCall,
};
use privtoken_types::Owner;

/// Block info response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockInfo {
    pub height: u64,
    /// Calls applied since genesis
    pub applied: u64,
    /// Calls rejected since genesis
    pub rejected: u64,
}

/// Shared chain state.
pub struct ChainState {
    runtime: Runtime,
    genesis: ModuleGenesisConfig,
    block_height: u64,
    applied: u64,
    rejected: u64,
}

impl ChainState {
    pub fn new(genesis: ModuleGenesisConfig) -> Result<Self, GenesisValidationError> {
        let runtime = Runtime::from_genesis(&genesis)?;
        Ok(Self {
            runtime,
            genesis,
            block_height: 1,
            applied: 0,
            rejected: 0,
        })
    }

    pub fn genesis(&self) -> &ModuleGenesisConfig {
        &self.genesis
    }

    pub fn block_info(&self) -> BlockInfo {
        BlockInfo {
            height: self.block_height,
            applied: self.applied,
            rejected: self.rejected,
        }
    }

    pub fn advance(&mut self, count: u64) -> BlockInfo {
        self.block_height = self.block_height.saturating_add(count);
        info!(height = self.block_height, "advanced");
        self.block_info()
    }

    /// Apply one call from `sender` at the current height.
    pub fn submit(&mut self, sender: Owner, call: RuntimeCall) -> HandlerResult<CallReceipt> {
        let ctx = CallContext {
            sender,
            block_height: self.block_height,
        };
        let result = self.runtime.dispatch(&ctx, call);
        match result {
            Ok(_) => self.applied += 1,
            Err(_) => self.rejected += 1,
        }
        result
    }

    pub fn query(&self, query: ModuleQuery) -> ModuleQueryResponse {
        self.runtime.query(query)
    }

    pub fn settleable_auctions(&self) -> Vec<u64> {
        privtoken_module::queries::get_settleable_auctions(self.runtime.state(), self.block_height)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use privtoken_module::ModuleError;
    use privtoken_types::{AssetKey, Digest};

    const ADMIN: Owner = Owner([0xad; 48]);
    const ALICE: Owner = Owner([0xa1; 48]);

    #[test]
    fn test_submit_counts_and_rolls_back() {
        let mut chain = ChainState::new(ModuleGenesisConfig::dev(ADMIN)).unwrap();

        chain
            .submit(ADMIN, RuntimeCall::SetBalance { owner: ALICE, amount: 5 })
            .unwrap();
        let rejected = chain.submit(ALICE, RuntimeCall::SetBalance { owner: ALICE, amount: 5 });

        assert_eq!(rejected, Err(ModuleError::NotAuthorized));
        assert_eq!(
            chain.query(ModuleQuery::GetBalance { owner: ALICE }),
            ModuleQueryResponse::Balance(5)
        );
        assert_eq!(
            chain.block_info(),
            BlockInfo {
                height: 1,
                applied: 1,
                rejected: 1
            }
        );
    }

    #[test]
    fn test_settleable_after_reveal_window() {
        let mut chain = ChainState::new(ModuleGenesisConfig::dev(ADMIN)).unwrap();
        chain
            .submit(
                ALICE,
                RuntimeCall::MintAsset {
                    to: ALICE,
                    metadata: Digest::default(),
                },
            )
            .unwrap();
        chain
            .submit(
                ALICE,
                RuntimeCall::StartSealedBid {
                    asset: AssetKey::new(ALICE, 0),
                    bidding_window: 2,
                    reveal_window: 2,
                    min_price: 0,
                },
            )
            .unwrap();

        chain.advance(4);
        assert!(chain.settleable_auctions().is_empty());
        chain.advance(1);
        assert_eq!(chain.settleable_auctions(), vec![1]);
    }
}
