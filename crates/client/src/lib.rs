//! Client SDK for the private token platform.
//!
//! This crate provides a high-level API for:
//! - Proving confidential transfers, claims, deposits and withdrawals
//! - Creating and revealing sealed bids
//! - Replaying the deposit log for inclusion witnesses
//! - Querying module state

pub mod deposit_log;
pub mod error;
pub mod prover;
pub mod query;

pub use deposit_log::{DepositLog, InclusionWitness};
pub use error::ProverError;
pub use prover::{Prover, ProverResult, SealedBid};
pub use query::ChainQuery;
