//! On-chain state structures for the private token module.
//!
//! Plain in-memory maps. The runtime snapshots the whole [`ModuleState`]
//! before every call and only keeps the copy when the call succeeds, so all
//! of it must stay cheaply cloneable.

use std::collections::{BTreeMap, HashMap, HashSet};

use serde::{Deserialize, Serialize};

use privtoken_types::{
    deposit_log_step, AssetKey, ClaimKey, Digest, EncryptedAmount, Owner, DEPOSIT_LOG_GENESIS,
};

use crate::balances::Balances;
use crate::error::ModuleError;
use crate::handlers::HandlerResult;
use crate::nft::NftRegistry;
use crate::records::{AuctionRecord, BidCommitment, DutchAuction, EnglishAuction, SealedBidAuction};

/// Well-known identities holding public tokens on behalf of the module.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EscrowAccounts {
    /// Holds publicly deposited tokens backing the confidential supply
    pub deposit: Owner,
    /// Target identity of withdraw proofs
    pub withdraw: Owner,
    /// Target identity of sealed bid proofs
    pub sealed_bid_auction: Owner,
    /// Holds english auction bids
    pub english_auction: Owner,
}

impl EscrowAccounts {
    pub fn all(&self) -> [Owner; 4] {
        [
            self.deposit,
            self.withdraw,
            self.sealed_bid_auction,
            self.english_auction,
        ]
    }
}

impl Default for EscrowAccounts {
    fn default() -> Self {
        Self {
            deposit: Owner([0xd0; 48]),
            withdraw: Owner([0xd1; 48]),
            sealed_bid_auction: Owner([0xd2; 48]),
            english_auction: Owner([0xd3; 48]),
        }
    }
}

/// Confidential ledger: encrypted balances, pending claims and the deposit log.
#[derive(Clone, Debug)]
pub struct PrivateTokenState {
    /// Encrypted balance per owner; absent until the first claim
    pub ledger: HashMap<Owner, EncryptedAmount>,
    /// Pending encrypted credits; the empty sentinel once claimed
    pub claims: HashMap<ClaimKey, EncryptedAmount>,
    /// Next claim index per recipient
    pub nonces: HashMap<Owner, u64>,
    /// Deposit commitments by log index
    pub deposits: BTreeMap<u64, Digest>,
    pub deposit_nonce: u64,
    /// Accumulator over all deposit commitments
    pub deposit_root: Digest,
    /// Every root the deposit log has had
    pub deposit_roots: HashSet<Digest>,
    /// Spent deposit nullifiers
    pub nullifiers: HashSet<Digest>,
}

impl Default for PrivateTokenState {
    fn default() -> Self {
        Self {
            ledger: HashMap::new(),
            claims: HashMap::new(),
            nonces: HashMap::new(),
            deposits: BTreeMap::new(),
            deposit_nonce: 0,
            deposit_root: DEPOSIT_LOG_GENESIS,
            deposit_roots: HashSet::from([DEPOSIT_LOG_GENESIS]),
            nullifiers: HashSet::new(),
        }
    }
}

impl PrivateTokenState {
    /// Append a claim for `recipient` at its next free index.
    pub fn push_claim(&mut self, recipient: Owner, amount: EncryptedAmount) -> HandlerResult<ClaimKey> {
        let index = self.nonces.get(&recipient).copied().unwrap_or(0);
        let next = index.checked_add(1).ok_or(ModuleError::Overflow)?;

        let key = ClaimKey::new(recipient, index);
        self.claims.insert(key, amount);
        self.nonces.insert(recipient, next);
        Ok(key)
    }

    /// Append a commitment to the deposit log and return its index.
    pub fn append_deposit(&mut self, commitment: Digest) -> HandlerResult<u64> {
        let index = self.deposit_nonce;
        let next = index.checked_add(1).ok_or(ModuleError::Overflow)?;

        self.deposits.insert(index, commitment);
        self.deposit_root = deposit_log_step(&self.deposit_root, index, &commitment);
        self.deposit_roots.insert(self.deposit_root);
        self.deposit_nonce = next;
        Ok(index)
    }

    pub fn is_known_root(&self, root: &Digest) -> bool {
        self.deposit_roots.contains(root)
    }

    /// Require the stored balance of `owner` to be exactly `claimed`.
    pub fn assert_current_balance(&self, owner: &Owner, claimed: &EncryptedAmount) -> HandlerResult<()> {
        match self.ledger.get(owner) {
            Some(stored) if stored.encodes_same_ciphertext_as(claimed) => Ok(()),
            _ => Err(ModuleError::StaleBalance),
        }
    }
}

/// Records of one auction variant plus the asset index.
#[derive(Clone, Debug)]
pub struct AuctionBook<A> {
    pub records: BTreeMap<u64, A>,
    /// Latest auction per asset
    pub auction_ids: HashMap<AssetKey, u64>,
}

impl<A> Default for AuctionBook<A> {
    fn default() -> Self {
        Self {
            records: BTreeMap::new(),
            auction_ids: HashMap::new(),
        }
    }
}

impl<A: AuctionRecord> AuctionBook<A> {
    pub fn get(&self, auction_id: u64) -> HandlerResult<&A> {
        self.records
            .get(&auction_id)
            .ok_or(ModuleError::AuctionNotFound(auction_id))
    }

    pub fn get_mut(&mut self, auction_id: u64) -> HandlerResult<&mut A> {
        self.records
            .get_mut(&auction_id)
            .ok_or(ModuleError::AuctionNotFound(auction_id))
    }

    pub fn id_for_asset(&self, asset: &AssetKey) -> HandlerResult<u64> {
        self.auction_ids
            .get(asset)
            .copied()
            .ok_or(ModuleError::NoAuctionForAsset(*asset))
    }
}

/// Private token module state.
#[derive(Clone, Debug)]
pub struct ModuleState {
    pub escrows: EscrowAccounts,
    /// Identity allowed to issue public tokens after genesis
    pub admin: Option<Owner>,

    pub balances: Balances,
    pub assets: NftRegistry,
    pub private_token: PrivateTokenState,

    /// Next auction ID to assign, shared by every variant
    pub next_auction_id: u64,
    pub sealed_bid: AuctionBook<SealedBidAuction>,
    /// Sealed bid commitments by bid hash
    pub bid_commitments: HashMap<Digest, BidCommitment>,
    pub english: AuctionBook<EnglishAuction>,
    pub dutch: AuctionBook<DutchAuction>,
}

impl Default for ModuleState {
    fn default() -> Self {
        Self::new(EscrowAccounts::default())
    }
}

impl ModuleState {
    pub fn new(escrows: EscrowAccounts) -> Self {
        Self {
            escrows,
            admin: None,
            balances: Balances::default(),
            assets: NftRegistry::default(),
            private_token: PrivateTokenState::default(),
            next_auction_id: 1,
            sealed_bid: AuctionBook::default(),
            bid_commitments: HashMap::new(),
            english: AuctionBook::default(),
            dutch: AuctionBook::default(),
        }
    }

    /// Get the next auction ID and increment.
    pub fn allocate_auction_id(&mut self) -> HandlerResult<u64> {
        let id = self.next_auction_id;
        self.next_auction_id = id.checked_add(1).ok_or(ModuleError::Overflow)?;
        Ok(id)
    }

    /// Whether `commitment` was placed in `auction_id` and has not been revealed.
    pub fn is_live_commitment(&self, auction_id: u64, commitment: &Digest) -> bool {
        matches!(
            self.bid_commitments.get(commitment),
            Some(entry) if entry.live && entry.auction_id == auction_id
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use privtoken_types::sha256;

    #[test]
    fn test_allocate_auction_id() {
        let mut state = ModuleState::default();
        assert_eq!(state.allocate_auction_id(), Ok(1));
        assert_eq!(state.allocate_auction_id(), Ok(2));
        assert_eq!(state.allocate_auction_id(), Ok(3));
    }

    #[test]
    fn test_claim_indices_are_per_recipient() {
        let mut token = PrivateTokenState::default();
        let alice = Owner([1u8; 48]);
        let bob = Owner([2u8; 48]);
        let amount = EncryptedAmount::empty();

        assert_eq!(token.push_claim(alice, amount).unwrap(), ClaimKey::new(alice, 0));
        assert_eq!(token.push_claim(alice, amount).unwrap(), ClaimKey::new(alice, 1));
        assert_eq!(token.push_claim(bob, amount).unwrap(), ClaimKey::new(bob, 0));
        assert_eq!(token.nonces[&alice], 2);
    }

    #[test]
    fn test_deposit_log_keeps_every_root() {
        let mut token = PrivateTokenState::default();
        assert!(token.is_known_root(&DEPOSIT_LOG_GENESIS));

        let c0 = sha256(b"first");
        let c1 = sha256(b"second");
        assert_eq!(token.append_deposit(c0).unwrap(), 0);
        let root_after_first = token.deposit_root;
        assert_eq!(token.append_deposit(c1).unwrap(), 1);

        assert_eq!(
            root_after_first,
            deposit_log_step(&DEPOSIT_LOG_GENESIS, 0, &c0)
        );
        assert_eq!(
            token.deposit_root,
            deposit_log_step(&root_after_first, 1, &c1)
        );
        assert!(token.is_known_root(&root_after_first));
        assert!(token.is_known_root(&token.deposit_root));
        assert!(!token.is_known_root(&sha256(b"bogus")));
        assert_eq!(token.deposits.len(), 2);
    }

    #[test]
    fn test_absent_balance_is_stale() {
        let token = PrivateTokenState::default();
        assert_eq!(
            token.assert_current_balance(&Owner([1u8; 48]), &EncryptedAmount::empty()),
            Err(ModuleError::StaleBalance)
        );
    }

    #[test]
    fn test_escrows_are_distinct_by_default() {
        let escrows = EscrowAccounts::default().all();
        let unique: HashSet<_> = escrows.iter().collect();
        assert_eq!(unique.len(), escrows.len());
    }
}
