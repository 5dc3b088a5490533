//! Transaction dispatch.
//!
//! Each call runs against a checkpoint of the module state. The checkpoint
//! replaces the live state only when the handler succeeds, so a rejected
//! call leaves no partial writes behind.

use borsh::{BorshDeserialize, BorshSerialize};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use privtoken_types::{AssetKey, ClaimKey};

use crate::call::RuntimeCall;
use crate::genesis::{GenesisValidationError, ModuleGenesisConfig};
use crate::handlers::{self, CallContext, HandlerResult, RevealOutcome, Settlement};
use crate::queries::{handle_query, ModuleQuery, ModuleQueryResponse};
use crate::state::ModuleState;
use crate::verifier::{AttestationVerifier, ProofVerifier};

/// What a successful call produced.
#[derive(Clone, Debug, PartialEq, Eq, BorshSerialize, BorshDeserialize, Serialize, Deserialize)]
pub enum CallReceipt {
    Done,
    ClaimCreated(ClaimKey),
    DepositRecorded { index: u64 },
    AuctionStarted { auction_id: u64 },
    BidRevealed(RevealOutcome),
    AuctionSettled(Settlement),
    AssetMinted(AssetKey),
}

/// Module state plus the verifier proofs are checked against.
#[derive(Debug, Clone)]
pub struct Runtime<V = AttestationVerifier> {
    state: ModuleState,
    verifier: V,
}

impl Runtime<AttestationVerifier> {
    /// Build a runtime from a genesis configuration.
    pub fn from_genesis(config: &ModuleGenesisConfig) -> Result<Self, GenesisValidationError> {
        Ok(Self::new(config.build_state()?, config.build_verifier()))
    }
}

impl<V: ProofVerifier> Runtime<V> {
    pub fn new(state: ModuleState, verifier: V) -> Self {
        Self { state, verifier }
    }

    pub fn state(&self) -> &ModuleState {
        &self.state
    }

    /// Apply `call` atomically.
    ///
    /// The checkpoint is a full clone of the module state, so every call
    /// costs O(state). This is a development strategy sized for the mock
    /// chain; a production runtime should stage writes in a journaled or
    /// copy-on-write store and commit or discard the journal instead.
    pub fn dispatch(&mut self, ctx: &CallContext, call: RuntimeCall) -> HandlerResult<CallReceipt> {
        let name = call.name();
        let mut checkpoint = self.state.clone();

        match apply(&mut checkpoint, &self.verifier, ctx, call) {
            Ok(receipt) => {
                self.state = checkpoint;
                info!(call = name, sender = %ctx.sender, height = ctx.block_height, ?receipt, "call applied");
                Ok(receipt)
            }
            Err(err) => {
                warn!(call = name, sender = %ctx.sender, height = ctx.block_height, %err, "call rejected");
                Err(err)
            }
        }
    }

    pub fn query(&self, query: ModuleQuery) -> ModuleQueryResponse {
        handle_query(&self.state, query)
    }
}

fn apply(
    state: &mut ModuleState,
    verifier: &dyn ProofVerifier,
    ctx: &CallContext,
    call: RuntimeCall,
) -> HandlerResult<CallReceipt> {
    let receipt = match call {
        RuntimeCall::Transfer { proof } => {
            CallReceipt::ClaimCreated(handlers::handle_transfer(state, ctx, verifier, proof)?)
        }
        RuntimeCall::AddFirstClaim { claim_key, proof } => {
            handlers::handle_add_first_claim(state, ctx, verifier, claim_key, proof)?;
            CallReceipt::Done
        }
        RuntimeCall::AddClaim { claim_key, proof } => {
            handlers::handle_add_claim(state, ctx, verifier, claim_key, proof)?;
            CallReceipt::Done
        }
        RuntimeCall::Deposit { proof } => CallReceipt::DepositRecorded {
            index: handlers::handle_deposit(state, ctx, verifier, proof)?,
        },
        RuntimeCall::AddDeposit { proof } => {
            CallReceipt::ClaimCreated(handlers::handle_add_deposit(state, ctx, verifier, proof)?)
        }
        RuntimeCall::Withdraw { proof } => {
            handlers::handle_withdraw(state, ctx, verifier, proof)?;
            CallReceipt::Done
        }

        RuntimeCall::StartSealedBid {
            asset,
            bidding_window,
            reveal_window,
            min_price,
        } => CallReceipt::AuctionStarted {
            auction_id: handlers::handle_start_sealed_bid(
                state,
                ctx,
                asset,
                bidding_window,
                reveal_window,
                min_price,
            )?,
        },
        RuntimeCall::PlaceSealedBid { asset, proof } => {
            handlers::handle_place_sealed_bid(state, ctx, verifier, asset, proof)?;
            CallReceipt::Done
        }
        RuntimeCall::RevealBid { proof } => {
            CallReceipt::BidRevealed(handlers::handle_reveal_bid(state, ctx, verifier, proof)?)
        }
        RuntimeCall::SettleSealedBid { asset } => {
            CallReceipt::AuctionSettled(handlers::handle_settle_sealed_bid(state, ctx, asset)?)
        }

        RuntimeCall::StartEnglish { asset, end_time } => CallReceipt::AuctionStarted {
            auction_id: handlers::handle_start_english(state, ctx, asset, end_time)?,
        },
        RuntimeCall::PlaceEnglishBid { asset, price } => {
            handlers::handle_place_english_bid(state, ctx, asset, price)?;
            CallReceipt::Done
        }
        RuntimeCall::EndEnglish { asset } => {
            CallReceipt::AuctionSettled(handlers::handle_end_english(state, ctx, asset)?)
        }

        RuntimeCall::StartDutch {
            asset,
            start_price,
            decay_rate,
            min_price,
        } => CallReceipt::AuctionStarted {
            auction_id: handlers::handle_start_dutch(
                state,
                ctx,
                asset,
                start_price,
                decay_rate,
                min_price,
            )?,
        },
        RuntimeCall::DutchBid { auction_id } => {
            CallReceipt::AuctionSettled(handlers::handle_dutch_bid(state, ctx, auction_id)?)
        }

        RuntimeCall::MintAsset { to, metadata } => {
            CallReceipt::AssetMinted(handlers::handle_mint_asset(state, ctx, to, metadata)?)
        }
        RuntimeCall::TransferAsset { to, asset } => {
            handlers::handle_transfer_asset(state, ctx, to, asset)?;
            CallReceipt::Done
        }
        RuntimeCall::TransferPublic { to, amount } => {
            handlers::handle_transfer_public(state, ctx, to, amount)?;
            CallReceipt::Done
        }
        RuntimeCall::SetBalance { owner, amount } => {
            handlers::handle_set_balance(state, ctx, owner, amount)?;
            CallReceipt::Done
        }
    };
    Ok(receipt)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ModuleError;
    use crate::handlers::testing::*;
    use crate::queries::ModuleQuery;
    use privtoken_types::{Digest, SealedBidOutput};

    #[test]
    fn test_failed_call_leaves_no_writes() {
        let (mut state, asset) = state_with_asset(ALICE);
        state.balances.mint(&ALICE, 10).unwrap();
        let mut runtime = Runtime::new(state, verifier());

        // Ownership and locking pass, then the floor transfer fails.
        let result = runtime.dispatch(
            &ctx(ALICE, 1),
            RuntimeCall::StartSealedBid {
                asset,
                bidding_window: 5,
                reveal_window: 5,
                min_price: 50,
            },
        );

        assert!(matches!(result, Err(ModuleError::InsufficientFunds { .. })));
        assert!(!runtime.state().assets.get(&asset).unwrap().locked);
        assert!(runtime.state().sealed_bid.records.is_empty());
        assert_eq!(runtime.state().next_auction_id, 1);
    }

    #[test]
    fn test_failed_bid_keeps_balance() {
        let (mut state, asset) = state_with_asset(ALICE);
        state.private_token.ledger.insert(BOB, enc(1));
        let mut runtime = Runtime::new(state, verifier());
        runtime
            .dispatch(
                &ctx(ALICE, 1),
                RuntimeCall::StartSealedBid {
                    asset,
                    bidding_window: 5,
                    reveal_window: 5,
                    min_price: 0,
                },
            )
            .unwrap();

        let bid_hash = Digest([1u8; 32]);
        let proof = attest(SealedBidOutput {
            owner: BOB,
            to: runtime.state().escrows.sealed_bid_auction,
            auction_id: 1,
            current_balance: enc(1),
            resulting_balance: enc(2),
            bid_hash,
        });
        runtime
            .dispatch(&ctx(BOB, 2), RuntimeCall::PlaceSealedBid { asset, proof: proof.clone() })
            .unwrap();

        // Same commitment, fresh balance proof: rejected, balance untouched.
        let replay = attest(SealedBidOutput {
            current_balance: enc(2),
            resulting_balance: enc(3),
            ..proof.public_output
        });
        assert_eq!(
            runtime.dispatch(&ctx(BOB, 3), RuntimeCall::PlaceSealedBid { asset, proof: replay }),
            Err(ModuleError::DuplicateBid)
        );
        assert_eq!(
            runtime.query(ModuleQuery::GetLedger { owner: BOB }),
            ModuleQueryResponse::Ledger(Some(enc(2)))
        );
    }

    #[test]
    fn test_auction_ids_shared_across_variants() {
        let mut state = ModuleState::default();
        let a = state.assets.mint(&ALICE, &ALICE, Digest::default()).unwrap();
        let b = state.assets.mint(&ALICE, &ALICE, Digest::default()).unwrap();
        let mut runtime = Runtime::new(state, verifier());

        let first = runtime
            .dispatch(&ctx(ALICE, 1), RuntimeCall::StartEnglish { asset: a, end_time: 10 })
            .unwrap();
        let second = runtime
            .dispatch(
                &ctx(ALICE, 1),
                RuntimeCall::StartDutch {
                    asset: b,
                    start_price: 10,
                    decay_rate: 1,
                    min_price: 1,
                },
            )
            .unwrap();

        assert_eq!(first, CallReceipt::AuctionStarted { auction_id: 1 });
        assert_eq!(second, CallReceipt::AuctionStarted { auction_id: 2 });
    }

    #[test]
    fn test_call_borsh_encoding() {
        let call = RuntimeCall::SettleSealedBid {
            asset: AssetKey::new(ALICE, 3),
        };
        let bytes = borsh::to_vec(&call).unwrap();
        let decoded: RuntimeCall = borsh::from_slice(&bytes).unwrap();
        assert_eq!(decoded, call);
    }
}
