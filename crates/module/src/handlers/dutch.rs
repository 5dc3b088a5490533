//! Dutch (descending price) auction paid in public tokens.

use tracing::debug;

use privtoken_types::AssetKey;

use super::lifecycle::{create_auction, end_auction};
use super::sealed_bid::Settlement;
use super::{CallContext, HandlerResult};
use crate::balances::PublicLedger;
use crate::error::ModuleError;
use crate::records::{AuctionHeader, DutchAuction};
use crate::state::ModuleState;

/// Handle StartDutch call.
pub fn handle_start_dutch(
    state: &mut ModuleState,
    ctx: &CallContext,
    asset: AssetKey,
    start_price: u64,
    decay_rate: u64,
    min_price: u64,
) -> HandlerResult<u64> {
    if min_price > start_price {
        return Err(ModuleError::InvalidPriceCurve);
    }

    let auction_id = state.allocate_auction_id()?;
    let record = DutchAuction {
        header: AuctionHeader::new(asset, ctx.sender),
        start_time: ctx.block_height,
        start_price,
        decay_rate,
        min_price,
    };
    create_auction(&mut state.dutch, &mut state.assets, &ctx.sender, auction_id, record)?;
    Ok(auction_id)
}

/// Handle DutchBid call: buy at the current price.
pub fn handle_dutch_bid(
    state: &mut ModuleState,
    ctx: &CallContext,
    auction_id: u64,
) -> HandlerResult<Settlement> {
    let auction = state.dutch.get(auction_id)?;
    if auction.header.ended {
        return Err(ModuleError::AlreadySettled);
    }

    let price = auction.current_price(ctx.block_height);
    let creator = auction.header.creator;
    state.balances.transfer_from(&ctx.sender, &creator, price)?;
    end_auction(&mut state.dutch, &mut state.assets, auction_id, ctx.sender)?;

    debug!(auction_id, buyer = %ctx.sender, price, "dutch auction sold");
    Ok(Settlement {
        auction_id,
        winner: ctx.sender,
        price,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handlers::testing::*;

    #[test]
    fn test_buy_at_decayed_price() {
        let (mut state, asset) = state_with_asset(ALICE);
        state.balances.mint(&BOB, 1_000).unwrap();
        let id = handle_start_dutch(&mut state, &ctx(ALICE, 100), asset, 1_000, 30, 400).unwrap();

        let settlement = handle_dutch_bid(&mut state, &ctx(BOB, 110), id).unwrap();

        assert_eq!(settlement.price, 700);
        assert_eq!(state.balances.balance_of(&BOB), 300);
        assert_eq!(state.balances.balance_of(&ALICE), 700);
        assert_eq!(state.assets.get(&asset).unwrap().owner, BOB);
        assert!(!state.assets.get(&asset).unwrap().locked);
    }

    #[test]
    fn test_second_bid_fails() {
        let (mut state, asset) = state_with_asset(ALICE);
        state.balances.mint(&BOB, 1_000).unwrap();
        state.balances.mint(&CAROL, 1_000).unwrap();
        let id = handle_start_dutch(&mut state, &ctx(ALICE, 100), asset, 1_000, 30, 400).unwrap();

        handle_dutch_bid(&mut state, &ctx(BOB, 200), id).unwrap();
        assert_eq!(
            handle_dutch_bid(&mut state, &ctx(CAROL, 201), id),
            Err(ModuleError::AlreadySettled)
        );
        assert_eq!(state.balances.balance_of(&ALICE), 400);
    }

    #[test]
    fn test_bad_curve_and_unknown_auction() {
        let (mut state, asset) = state_with_asset(ALICE);
        assert_eq!(
            handle_start_dutch(&mut state, &ctx(ALICE, 100), asset, 100, 1, 200),
            Err(ModuleError::InvalidPriceCurve)
        );
        assert_eq!(
            handle_dutch_bid(&mut state, &ctx(BOB, 100), 9),
            Err(ModuleError::AuctionNotFound(9))
        );
    }

    #[test]
    fn test_buyer_without_funds() {
        let (mut state, asset) = state_with_asset(ALICE);
        let id = handle_start_dutch(&mut state, &ctx(ALICE, 100), asset, 1_000, 30, 400).unwrap();

        assert_eq!(
            handle_dutch_bid(&mut state, &ctx(BOB, 100), id),
            Err(ModuleError::InsufficientFunds {
                required: 1_000,
                available: 0
            })
        );
    }
}
