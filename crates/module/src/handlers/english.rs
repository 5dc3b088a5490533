//! English (open ascending) auction paid in public tokens.

use tracing::debug;

use privtoken_types::AssetKey;

use super::lifecycle::{create_auction, end_auction};
use super::sealed_bid::Settlement;
use super::{CallContext, HandlerResult};
use crate::balances::PublicLedger;
use crate::error::ModuleError;
use crate::records::{AuctionHeader, BestBid, EnglishAuction};
use crate::state::ModuleState;

/// Handle StartEnglish call.
pub fn handle_start_english(
    state: &mut ModuleState,
    ctx: &CallContext,
    asset: AssetKey,
    end_time: u64,
) -> HandlerResult<u64> {
    if end_time <= ctx.block_height {
        return Err(ModuleError::InvalidTiming);
    }

    let auction_id = state.allocate_auction_id()?;
    let record = EnglishAuction {
        header: AuctionHeader::new(asset, ctx.sender),
        start_time: ctx.block_height,
        end_time,
        max_bid: BestBid {
            bidder: ctx.sender,
            price: 0,
        },
    };
    create_auction(&mut state.english, &mut state.assets, &ctx.sender, auction_id, record)?;
    Ok(auction_id)
}

/// Handle PlaceEnglishBid call.
///
/// Escrows the new bid and refunds the bid it replaces.
pub fn handle_place_english_bid(
    state: &mut ModuleState,
    ctx: &CallContext,
    asset: AssetKey,
    price: u64,
) -> HandlerResult<()> {
    let auction_id = state.english.id_for_asset(&asset)?;
    let auction = state.english.get(auction_id)?;
    if price <= auction.max_bid.price {
        return Err(ModuleError::BidTooLow);
    }
    if auction.header.ended || ctx.block_height >= auction.end_time {
        return Err(ModuleError::AuctionEnded);
    }

    let previous = auction.max_bid;
    let escrow = state.escrows.english_auction;
    state.balances.transfer_from(&ctx.sender, &escrow, price)?;
    state
        .balances
        .transfer_from(&escrow, &previous.bidder, previous.price)?;

    state.english.get_mut(auction_id)?.max_bid = BestBid {
        bidder: ctx.sender,
        price,
    };

    debug!(auction_id, bidder = %ctx.sender, price, "english bid placed");
    Ok(())
}

/// Handle EndEnglish call.
pub fn handle_end_english(
    state: &mut ModuleState,
    ctx: &CallContext,
    asset: AssetKey,
) -> HandlerResult<Settlement> {
    let auction_id = state.english.id_for_asset(&asset)?;
    let auction = state.english.get(auction_id)?;
    if auction.header.ended {
        return Err(ModuleError::AlreadySettled);
    }
    if ctx.block_height <= auction.end_time {
        return Err(ModuleError::TooEarly);
    }

    let creator = auction.header.creator;
    let best = auction.max_bid;
    let escrow = state.escrows.english_auction;
    state.balances.transfer_from(&escrow, &creator, best.price)?;
    end_auction(&mut state.english, &mut state.assets, auction_id, best.bidder)?;

    Ok(Settlement {
        auction_id,
        winner: best.bidder,
        price: best.price,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handlers::testing::*;

    fn setup() -> (ModuleState, AssetKey, u64) {
        let (mut state, asset) = state_with_asset(ALICE);
        state.balances.mint(&BOB, 1_000).unwrap();
        state.balances.mint(&CAROL, 1_000).unwrap();
        let id = handle_start_english(&mut state, &ctx(ALICE, 10), asset, 20).unwrap();
        (state, asset, id)
    }

    #[test]
    fn test_start_requires_future_end() {
        let (mut state, asset) = state_with_asset(ALICE);
        assert_eq!(
            handle_start_english(&mut state, &ctx(ALICE, 10), asset, 10),
            Err(ModuleError::InvalidTiming)
        );
    }

    #[test]
    fn test_outbid_refunds_previous_bidder() {
        let (mut state, asset, id) = setup();

        handle_place_english_bid(&mut state, &ctx(BOB, 11), asset, 100).unwrap();
        handle_place_english_bid(&mut state, &ctx(CAROL, 12), asset, 150).unwrap();

        assert_eq!(state.balances.balance_of(&BOB), 1_000);
        assert_eq!(state.balances.balance_of(&CAROL), 850);
        assert_eq!(state.balances.balance_of(&state.escrows.english_auction), 150);
        assert_eq!(state.english.get(id).unwrap().max_bid, BestBid { bidder: CAROL, price: 150 });
    }

    #[test]
    fn test_bid_must_increase() {
        let (mut state, asset, _) = setup();
        handle_place_english_bid(&mut state, &ctx(BOB, 11), asset, 100).unwrap();

        assert_eq!(
            handle_place_english_bid(&mut state, &ctx(CAROL, 12), asset, 100),
            Err(ModuleError::BidTooLow)
        );
    }

    #[test]
    fn test_bid_after_end() {
        let (mut state, asset, _) = setup();
        assert_eq!(
            handle_place_english_bid(&mut state, &ctx(BOB, 20), asset, 100),
            Err(ModuleError::AuctionEnded)
        );
    }

    #[test]
    fn test_end_pays_creator() {
        let (mut state, asset, id) = setup();
        handle_place_english_bid(&mut state, &ctx(BOB, 11), asset, 100).unwrap();

        assert_eq!(
            handle_end_english(&mut state, &ctx(ALICE, 20), asset),
            Err(ModuleError::TooEarly)
        );
        let settlement = handle_end_english(&mut state, &ctx(ALICE, 21), asset).unwrap();

        assert_eq!(settlement.auction_id, id);
        assert_eq!(settlement.winner, BOB);
        assert_eq!(state.balances.balance_of(&ALICE), 100);
        assert_eq!(state.assets.get(&asset).unwrap().owner, BOB);
        assert_eq!(
            handle_end_english(&mut state, &ctx(ALICE, 22), asset),
            Err(ModuleError::AlreadySettled)
        );
    }
}
