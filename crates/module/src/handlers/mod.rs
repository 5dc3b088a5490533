//! Call handlers for the private token module.
//!
//! These functions implement the business logic for each call type. They
//! mutate the state they are given directly; atomicity is provided by the
//! runtime, which hands them a checkpoint and discards it on error.

use privtoken_types::Owner;

mod assets;
mod dutch;
mod english;
mod ledger;
mod lifecycle;
mod sealed_bid;

#[cfg(test)]
pub(crate) mod testing;

pub use assets::{handle_mint_asset, handle_set_balance, handle_transfer_asset, handle_transfer_public};
pub use dutch::{handle_dutch_bid, handle_start_dutch};
pub use english::{handle_end_english, handle_place_english_bid, handle_start_english};
pub use ledger::{
    handle_add_claim, handle_add_deposit, handle_add_first_claim, handle_deposit,
    handle_transfer, handle_withdraw, unlock_balance,
};
pub use lifecycle::{create_auction, end_auction};
pub use sealed_bid::{
    handle_place_sealed_bid, handle_reveal_bid, handle_settle_sealed_bid, handle_start_sealed_bid,
    RevealOutcome, Settlement,
};

/// Context provided by the runtime for each call.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CallContext {
    /// Sender of the transaction
    pub sender: Owner,
    /// Current block height
    pub block_height: u64,
}

/// Result type for handlers.
pub type HandlerResult<T> = Result<T, crate::error::ModuleError>;
