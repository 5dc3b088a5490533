//! Auction records for each auction variant.

use borsh::{BorshDeserialize, BorshSerialize};
use serde::{Deserialize, Serialize};

use privtoken_types::{AssetKey, Owner};

/// Fields every auction variant carries.
#[derive(Clone, Debug, PartialEq, Eq, BorshSerialize, BorshDeserialize, Serialize, Deserialize)]
pub struct AuctionHeader {
    pub asset: AssetKey,
    pub creator: Owner,
    /// Empty until the auction ends
    pub winner: Owner,
    pub ended: bool,
}

impl AuctionHeader {
    pub fn new(asset: AssetKey, creator: Owner) -> Self {
        Self {
            asset,
            creator,
            winner: Owner::EMPTY,
            ended: false,
        }
    }
}

/// Access to the shared header, used by the generic lifecycle.
pub trait AuctionRecord: Clone {
    fn header(&self) -> &AuctionHeader;
    fn header_mut(&mut self) -> &mut AuctionHeader;
}

/// Current best bid.
#[derive(Clone, Copy, Debug, PartialEq, Eq, BorshSerialize, BorshDeserialize, Serialize, Deserialize)]
pub struct BestBid {
    pub bidder: Owner,
    pub price: u64,
}

/// A placed sealed bid, bound to the auction it was placed in.
#[derive(Clone, Copy, Debug, PartialEq, Eq, BorshSerialize, BorshDeserialize, Serialize, Deserialize)]
pub struct BidCommitment {
    pub auction_id: u64,
    /// `false` once revealed
    pub live: bool,
}

/// Phase of a sealed-bid auction at a given height.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum SealedBidPhase {
    Created,
    Bidding,
    Revealing,
    AwaitingSettlement,
    Settled,
}

#[derive(Clone, Debug, PartialEq, Eq, BorshSerialize, BorshDeserialize, Serialize, Deserialize)]
pub struct SealedBidAuction {
    pub header: AuctionHeader,
    pub start_time: u64,
    /// Last height at which sealed bids are accepted
    pub reveal_time: u64,
    /// Last height at which reveals are accepted
    pub end_time: u64,
    pub max_bid: BestBid,
}

impl SealedBidAuction {
    pub fn phase(&self, height: u64) -> SealedBidPhase {
        if self.header.ended {
            SealedBidPhase::Settled
        } else if height < self.start_time {
            SealedBidPhase::Created
        } else if height <= self.reveal_time {
            SealedBidPhase::Bidding
        } else if height <= self.end_time {
            SealedBidPhase::Revealing
        } else {
            SealedBidPhase::AwaitingSettlement
        }
    }

    pub fn accepts_bids_at(&self, height: u64) -> bool {
        height <= self.reveal_time
    }

    pub fn accepts_reveals_at(&self, height: u64) -> bool {
        self.reveal_time < height && height <= self.end_time
    }
}

impl AuctionRecord for SealedBidAuction {
    fn header(&self) -> &AuctionHeader {
        &self.header
    }

    fn header_mut(&mut self) -> &mut AuctionHeader {
        &mut self.header
    }
}

/// Open ascending auction paid from public balances.
#[derive(Clone, Debug, PartialEq, Eq, BorshSerialize, BorshDeserialize, Serialize, Deserialize)]
pub struct EnglishAuction {
    pub header: AuctionHeader,
    pub start_time: u64,
    pub end_time: u64,
    pub max_bid: BestBid,
}

impl AuctionRecord for EnglishAuction {
    fn header(&self) -> &AuctionHeader {
        &self.header
    }

    fn header_mut(&mut self) -> &mut AuctionHeader {
        &mut self.header
    }
}

/// Descending-price auction; the first bidder buys at the current price.
#[derive(Clone, Debug, PartialEq, Eq, BorshSerialize, BorshDeserialize, Serialize, Deserialize)]
pub struct DutchAuction {
    pub header: AuctionHeader,
    pub start_time: u64,
    pub start_price: u64,
    /// Price decrease per block
    pub decay_rate: u64,
    pub min_price: u64,
}

impl DutchAuction {
    /// `max(min_price, start_price - elapsed * decay_rate)`
    pub fn current_price(&self, height: u64) -> u64 {
        let elapsed = height.saturating_sub(self.start_time);
        let decay = elapsed.saturating_mul(self.decay_rate);
        let headroom = self.start_price.saturating_sub(self.min_price);
        if decay >= headroom {
            self.min_price
        } else {
            self.start_price - decay
        }
    }
}

impl AuctionRecord for DutchAuction {
    fn header(&self) -> &AuctionHeader {
        &self.header
    }

    fn header_mut(&mut self) -> &mut AuctionHeader {
        &mut self.header
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn header() -> AuctionHeader {
        AuctionHeader::new(AssetKey::new(Owner([1u8; 48]), 0), Owner([1u8; 48]))
    }

    #[test]
    fn test_sealed_bid_phases() {
        let auction = SealedBidAuction {
            header: header(),
            start_time: 10,
            reveal_time: 15,
            end_time: 20,
            max_bid: BestBid {
                bidder: Owner([1u8; 48]),
                price: 0,
            },
        };

        assert_eq!(auction.phase(9), SealedBidPhase::Created);
        assert_eq!(auction.phase(15), SealedBidPhase::Bidding);
        assert_eq!(auction.phase(16), SealedBidPhase::Revealing);
        assert_eq!(auction.phase(20), SealedBidPhase::Revealing);
        assert_eq!(auction.phase(21), SealedBidPhase::AwaitingSettlement);

        assert!(auction.accepts_bids_at(15));
        assert!(!auction.accepts_reveals_at(15));
        assert!(auction.accepts_reveals_at(20));
        assert!(!auction.accepts_reveals_at(21));
    }

    #[test]
    fn test_dutch_price_decays_to_floor() {
        let auction = DutchAuction {
            header: header(),
            start_time: 100,
            start_price: 1000,
            decay_rate: 30,
            min_price: 400,
        };

        assert_eq!(auction.current_price(100), 1000);
        assert_eq!(auction.current_price(110), 700);
        assert_eq!(auction.current_price(120), 400);
        assert_eq!(auction.current_price(10_000), 400);
        assert_eq!(auction.current_price(u64::MAX), 400);
    }
}
