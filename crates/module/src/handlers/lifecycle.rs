//! Auction lifecycle shared by every auction variant.

use tracing::info;

use privtoken_types::Owner;

use super::HandlerResult;
use crate::error::ModuleError;
use crate::nft::AssetRegistry;
use crate::records::AuctionRecord;
use crate::state::AuctionBook;

/// Register `record` under `auction_id` and lock its asset.
///
/// The caller must own the asset and the asset must not already be locked.
pub fn create_auction<A: AuctionRecord>(
    book: &mut AuctionBook<A>,
    assets: &mut impl AssetRegistry,
    caller: &Owner,
    auction_id: u64,
    record: A,
) -> HandlerResult<()> {
    let asset = record.header().asset;
    assets.assert_owner(&asset, caller)?;
    assets.assert_unlocked(&asset)?;

    book.records.insert(auction_id, record);
    book.auction_ids.insert(asset, auction_id);
    assets.lock(&asset)?;

    info!(auction_id, creator = %caller, "auction created");
    Ok(())
}

/// Close an auction, hand the asset to `winner` and unlock it.
pub fn end_auction<A: AuctionRecord>(
    book: &mut AuctionBook<A>,
    assets: &mut impl AssetRegistry,
    auction_id: u64,
    winner: Owner,
) -> HandlerResult<()> {
    if winner.is_empty() {
        return Err(ModuleError::EmptyWinner);
    }

    let header = book.get_mut(auction_id)?.header_mut();
    header.ended = true;
    header.winner = winner;
    let asset = header.asset;

    assets.transfer(&asset, &winner)?;
    assets.unlock(&asset)?;

    info!(auction_id, %winner, "auction ended");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handlers::testing::*;
    use crate::records::{AuctionHeader, BestBid, EnglishAuction};

    fn english(asset: privtoken_types::AssetKey, creator: Owner) -> EnglishAuction {
        EnglishAuction {
            header: AuctionHeader::new(asset, creator),
            start_time: 0,
            end_time: 10,
            max_bid: BestBid {
                bidder: creator,
                price: 0,
            },
        }
    }

    #[test]
    fn test_create_locks_asset() {
        let (mut state, asset) = state_with_asset(ALICE);

        create_auction(&mut state.english, &mut state.assets, &ALICE, 1, english(asset, ALICE)).unwrap();

        assert!(state.assets.get(&asset).unwrap().locked);
        assert_eq!(state.english.id_for_asset(&asset), Ok(1));
    }

    #[test]
    fn test_create_requires_owner_and_unlocked() {
        let (mut state, asset) = state_with_asset(ALICE);

        assert_eq!(
            create_auction(&mut state.english, &mut state.assets, &BOB, 1, english(asset, BOB)),
            Err(ModuleError::NotOwner)
        );

        create_auction(&mut state.english, &mut state.assets, &ALICE, 1, english(asset, ALICE)).unwrap();
        assert_eq!(
            create_auction(&mut state.english, &mut state.assets, &ALICE, 2, english(asset, ALICE)),
            Err(ModuleError::AlreadyLocked)
        );
    }

    #[test]
    fn test_end_transfers_and_unlocks() {
        let (mut state, asset) = state_with_asset(ALICE);
        create_auction(&mut state.english, &mut state.assets, &ALICE, 1, english(asset, ALICE)).unwrap();

        end_auction(&mut state.english, &mut state.assets, 1, BOB).unwrap();

        let record = state.assets.get(&asset).unwrap();
        assert_eq!(record.owner, BOB);
        assert!(!record.locked);
        let header = &state.english.get(1).unwrap().header;
        assert!(header.ended);
        assert_eq!(header.winner, BOB);
    }

    #[test]
    fn test_end_rejects_empty_winner() {
        let (mut state, asset) = state_with_asset(ALICE);
        create_auction(&mut state.english, &mut state.assets, &ALICE, 1, english(asset, ALICE)).unwrap();

        assert_eq!(
            end_auction(&mut state.english, &mut state.assets, 1, Owner::EMPTY),
            Err(ModuleError::EmptyWinner)
        );
        assert!(state.assets.get(&asset).unwrap().locked);
    }
}
