//! Sealed-bid first-price auction with commit-reveal.
//!
//! Bids are escrowed as confidential balance reductions during the bidding
//! window and opened during the reveal window. Losing reveals are refunded
//! immediately as public tokens; the final best bid is paid to the creator
//! on settlement. Commitments never revealed stay in escrow.

use borsh::{BorshDeserialize, BorshSerialize};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use privtoken_types::{AssetKey, Owner, Proof, RevealBidOutput, SealedBidOutput};

use super::lifecycle::{create_auction, end_auction};
use super::{unlock_balance, CallContext, HandlerResult};
use crate::balances::PublicLedger;
use crate::error::ModuleError;
use crate::records::{AuctionHeader, BestBid, BidCommitment, SealedBidAuction};
use crate::state::ModuleState;
use crate::verifier::{verify_proof, ProofVerifier};

/// Effect of a successful reveal.
#[derive(Clone, Debug, PartialEq, Eq, BorshSerialize, BorshDeserialize, Serialize, Deserialize)]
pub enum RevealOutcome {
    /// The reveal became the best bid; the previous best was refunded.
    NewBest { refunded: Owner, amount: u64 },
    /// The reveal did not beat the best bid and was refunded.
    Refunded { amount: u64 },
}

/// Result of settling an auction.
#[derive(Clone, Debug, PartialEq, Eq, BorshSerialize, BorshDeserialize, Serialize, Deserialize)]
pub struct Settlement {
    pub auction_id: u64,
    pub winner: Owner,
    pub price: u64,
}

/// Handle StartSealedBid call.
///
/// The creator's floor price moves from its public balance into the deposit
/// escrow and stands as the initial best bid.
pub fn handle_start_sealed_bid(
    state: &mut ModuleState,
    ctx: &CallContext,
    asset: AssetKey,
    bidding_window: u64,
    reveal_window: u64,
    min_price: u64,
) -> HandlerResult<u64> {
    let reveal_time = ctx
        .block_height
        .checked_add(bidding_window)
        .ok_or(ModuleError::InvalidTiming)?;
    let end_time = reveal_time
        .checked_add(reveal_window)
        .ok_or(ModuleError::InvalidTiming)?;

    let auction_id = state.allocate_auction_id()?;
    let record = SealedBidAuction {
        header: AuctionHeader::new(asset, ctx.sender),
        start_time: ctx.block_height,
        reveal_time,
        end_time,
        max_bid: BestBid {
            bidder: ctx.sender,
            price: min_price,
        },
    };
    create_auction(&mut state.sealed_bid, &mut state.assets, &ctx.sender, auction_id, record)?;

    let escrow = state.escrows.deposit;
    state.balances.transfer_from(&ctx.sender, &escrow, min_price)?;

    debug!(auction_id, reveal_time, end_time, min_price, "sealed bid auction started");
    Ok(auction_id)
}

/// Handle PlaceSealedBid call.
pub fn handle_place_sealed_bid(
    state: &mut ModuleState,
    ctx: &CallContext,
    verifier: &dyn ProofVerifier,
    asset: AssetKey,
    proof: Proof<SealedBidOutput>,
) -> HandlerResult<()> {
    let output = verify_proof(verifier, &proof)?.into_inner();

    let auction_id = state.sealed_bid.id_for_asset(&asset)?;
    let auction = state.sealed_bid.get(auction_id)?;
    if !auction.accepts_bids_at(ctx.block_height) {
        return Err(ModuleError::BiddingEnded);
    }

    if output.to != state.escrows.sealed_bid_auction || output.auction_id != auction_id {
        return Err(ModuleError::WrongAuction);
    }
    state
        .private_token
        .assert_current_balance(&output.owner, &output.current_balance)?;
    if state.bid_commitments.contains_key(&output.bid_hash) {
        return Err(ModuleError::DuplicateBid);
    }

    state
        .private_token
        .ledger
        .insert(output.owner, output.resulting_balance);
    state.bid_commitments.insert(
        output.bid_hash,
        BidCommitment {
            auction_id,
            live: true,
        },
    );

    debug!(auction_id, bid_hash = ?output.bid_hash, "sealed bid placed");
    Ok(())
}

/// Handle RevealBid call.
pub fn handle_reveal_bid(
    state: &mut ModuleState,
    ctx: &CallContext,
    verifier: &dyn ProofVerifier,
    proof: Proof<RevealBidOutput>,
) -> HandlerResult<RevealOutcome> {
    let revealed = verify_proof(verifier, &proof)?.into_inner();

    let auction = state.sealed_bid.get(revealed.auction_id)?;
    if !auction.accepts_reveals_at(ctx.block_height) {
        return Err(ModuleError::OutsideRevealWindow);
    }
    if !state.is_live_commitment(revealed.auction_id, &revealed.bid_hash) {
        return Err(ModuleError::UnknownCommitment);
    }

    let best = auction.max_bid;
    let outcome = if revealed.amount > best.price {
        unlock_balance(state, &best.bidder, best.price)?;
        state.sealed_bid.get_mut(revealed.auction_id)?.max_bid = BestBid {
            bidder: revealed.bidder,
            price: revealed.amount,
        };
        RevealOutcome::NewBest {
            refunded: best.bidder,
            amount: best.price,
        }
    } else {
        unlock_balance(state, &revealed.bidder, revealed.amount)?;
        RevealOutcome::Refunded {
            amount: revealed.amount,
        }
    };
    state.bid_commitments.insert(
        revealed.bid_hash,
        BidCommitment {
            auction_id: revealed.auction_id,
            live: false,
        },
    );

    debug!(auction_id = revealed.auction_id, ?outcome, "bid revealed");
    Ok(outcome)
}

/// Handle SettleSealedBid call: pay the creator and hand over the asset.
pub fn handle_settle_sealed_bid(
    state: &mut ModuleState,
    ctx: &CallContext,
    asset: AssetKey,
) -> HandlerResult<Settlement> {
    let auction_id = state.sealed_bid.id_for_asset(&asset)?;
    let auction = state.sealed_bid.get(auction_id)?;
    if auction.header.ended {
        return Err(ModuleError::AlreadySettled);
    }
    if ctx.block_height <= auction.end_time {
        return Err(ModuleError::TooEarly);
    }

    let creator = auction.header.creator;
    let best = auction.max_bid;
    unlock_balance(state, &creator, best.price)?;
    end_auction(&mut state.sealed_bid, &mut state.assets, auction_id, best.bidder)?;

    info!(auction_id, winner = %best.bidder, price = best.price, "sealed bid auction settled");
    Ok(Settlement {
        auction_id,
        winner: best.bidder,
        price: best.price,
    })
}
