//! Runtime module for a confidential token with sealed-bid auctions.
//!
//! This module implements the on-chain side of the platform:
//!
//! - A confidential ledger of encrypted balances, moved only by verified
//!   proofs, with pending claims and a deposit log bridging public tokens in
//! - Sealed-bid first-price auctions over that ledger using commit-reveal
//! - English and Dutch auctions paid in public tokens
//! - A shared auction lifecycle that locks the auctioned asset
//!
//! # Architecture
//!
//! - `call`: Message types for state-changing operations
//! - `handlers`: Business logic for processing calls
//! - `runtime`: Atomic dispatch of calls against module state
//! - `queries`: Read-only state access
//! - `state`: On-chain state structures
//! - `records`: Auction records per variant
//! - `verifier`: Proof verification boundary
//! - `balances` / `nft`: Public ledger and asset registry collaborators
//! - `genesis`: Initial configuration
//! - `error`: Error types
//!
//! # Example
//!
//! ```ignore
//! use privtoken_module::{CallContext, ModuleGenesisConfig, Runtime, RuntimeCall};
//!
//! let mut runtime = Runtime::from_genesis(&ModuleGenesisConfig::default())?;
//! let ctx = CallContext { sender, block_height: 100 };
//!
//! runtime.dispatch(&ctx, RuntimeCall::StartSealedBid { asset, bidding_window: 10, reveal_window: 10, min_price: 0 })?;
//! runtime.dispatch(&ctx, RuntimeCall::PlaceSealedBid { asset, proof })?;
//! ```

pub mod balances;
pub mod call;
pub mod error;
pub mod genesis;
pub mod handlers;
pub mod nft;
pub mod queries;
pub mod records;
pub mod runtime;
pub mod state;
pub mod verifier;

pub use balances::{Balances, PublicLedger};
pub use call::RuntimeCall;
pub use error::ModuleError;
pub use genesis::{dev_attestor_key, dev_verifying_keys, GenesisValidationError, ModuleGenesisConfig};
pub use handlers::{CallContext, HandlerResult, RevealOutcome, Settlement};
pub use nft::{AssetRegistry, NftRegistry};
pub use queries::{AuctionKind, ModuleQuery, ModuleQueryResponse};
pub use records::{BestBid, BidCommitment, DutchAuction, EnglishAuction, SealedBidAuction, SealedBidPhase};
pub use runtime::{CallReceipt, Runtime};
pub use state::{EscrowAccounts, ModuleState};
pub use verifier::{AttestationVerifier, ProofRejection, ProofVerifier, Verified};
