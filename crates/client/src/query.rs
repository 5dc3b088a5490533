//! Typed query helpers over module state.

use privtoken_module::{
    AuctionKind, ModuleQuery, ModuleQueryResponse, ProofVerifier, Runtime, SealedBidAuction,
};
use privtoken_types::{AssetKey, ClaimKey, EncryptedAmount, Owner};

use crate::deposit_log::DepositLog;

/// Anything that answers module queries.
///
/// In production, this would be the node RPC.
pub trait ChainQuery {
    fn query(&self, query: ModuleQuery) -> ModuleQueryResponse;

    /// Encrypted ledger balance of `owner`, if any.
    fn ledger_of(&self, owner: &Owner) -> Option<EncryptedAmount> {
        match self.query(ModuleQuery::GetLedger { owner: *owner }) {
            ModuleQueryResponse::Ledger(entry) => entry,
            _ => None,
        }
    }

    /// Pending claim, `None` if absent or already consumed.
    fn pending_claim(&self, claim_key: &ClaimKey) -> Option<EncryptedAmount> {
        match self.query(ModuleQuery::GetClaim {
            claim_key: *claim_key,
        }) {
            ModuleQueryResponse::Claim(Some(claim)) if !claim.is_empty() => Some(claim),
            _ => None,
        }
    }

    fn public_balance(&self, owner: &Owner) -> u64 {
        match self.query(ModuleQuery::GetBalance { owner: *owner }) {
            ModuleQueryResponse::Balance(amount) => amount,
            _ => 0,
        }
    }

    /// Replay of the on-chain deposit log.
    fn deposit_log(&self) -> DepositLog {
        match self.query(ModuleQuery::ListDeposits) {
            ModuleQueryResponse::Deposits(commitments) => DepositLog::new(commitments),
            _ => DepositLog::default(),
        }
    }

    fn sealed_bid_auction_for(&self, asset: &AssetKey) -> Option<(u64, SealedBidAuction)> {
        let auction_id = match self.query(ModuleQuery::GetAuctionId {
            kind: AuctionKind::SealedBid,
            asset: *asset,
        }) {
            ModuleQueryResponse::AuctionId(Some(id)) => id,
            _ => return None,
        };
        match self.query(ModuleQuery::GetSealedBidAuction { auction_id }) {
            ModuleQueryResponse::SealedBidAuction(Some(auction)) => Some((auction_id, auction)),
            _ => None,
        }
    }
}

impl<V: ProofVerifier> ChainQuery for Runtime<V> {
    fn query(&self, query: ModuleQuery) -> ModuleQueryResponse {
        Runtime::query(self, query)
    }
}
