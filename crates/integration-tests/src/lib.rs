//! End-to-end integration tests for the private token platform.
//!
//! These tests drive the runtime the way users would:
//! 1. Public tokens are deposited and redeemed into confidential balances
//! 2. Balances move by proofs from the reference prover
//! 3. Assets are auctioned with sealed bids, revealed and settled
//! 4. Every rejection leaves the state untouched

#![cfg(test)]

use privtoken_client::{ChainQuery, Prover, ProverError, SealedBid};
use privtoken_crypto::{decrypt_amount, encrypt_amount, sign, Keypair, SecretKey};
use privtoken_module::genesis::BalanceConfig;
use privtoken_module::{
    dev_attestor_key, dev_verifying_keys, BidCommitment, CallContext, CallReceipt, ModuleError, ModuleGenesisConfig, ModuleQuery, ModuleQueryResponse,
    ProofRejection, RevealOutcome, Runtime, RuntimeCall,
};
use privtoken_types::{
    proof_attestation, AssetKey, ClaimKey, Digest, Owner, Proof, ProofKind, PublicOutput, Salt, WithdrawOutput,
};

use rand::rngs::OsRng;
use rand::RngCore;

/// A chain with an admin, a prover and a block height the test controls.
struct World {
    runtime: Runtime,
    prover: Prover,
    height: u64,
}

impl World {
    /// Dev genesis where each of `funded` starts with `amount` public tokens.
    fn new(funded: &[&Keypair], amount: u64) -> Self {
        let mut config = ModuleGenesisConfig::dev(Owner([0xad; 48]));
        for user in funded {
            config.initial_balances.push(BalanceConfig {
                owner: user.owner(),
                amount,
            });
        }
        let runtime = Runtime::from_genesis(&config).unwrap();
        let prover = Prover::from_genesis(&config, dev_attestor_key()).unwrap();
        Self {
            runtime,
            prover,
            height: 1,
        }
    }

    fn submit(&mut self, sender: &Owner, call: RuntimeCall) -> Result<CallReceipt, ModuleError> {
        let ctx = CallContext {
            sender: *sender,
            block_height: self.height,
        };
        self.runtime.dispatch(&ctx, call)
    }

    fn advance(&mut self, blocks: u64) {
        self.height += blocks;
    }

    fn escrow_balance(&self) -> u64 {
        let escrow = self.runtime.state().escrows.deposit;
        self.runtime.public_balance(&escrow)
    }

    /// Deposit `amount` public tokens and redeem them into `user`'s ledger.
    fn fund_confidential(&mut self, user: &Keypair, amount: u64) {
        let salt = random_salt();
        let proof = self.prover.prove_deposit_hash(amount, &salt).unwrap();
        self.submit(&user.owner(), RuntimeCall::Deposit { proof }).unwrap();

        let log = self.runtime.deposit_log();
        let proof = self
            .prover
            .prove_deposit(&log, amount, &salt, &user.owner(), &mut OsRng)
            .unwrap();
        let claim_key = match self.submit(&user.owner(), RuntimeCall::AddDeposit { proof }) {
            Ok(CallReceipt::ClaimCreated(key)) => key,
            other => panic!("unexpected receipt: {other:?}"),
        };
        self.claim(user, claim_key).unwrap();
    }

    /// Claim a pending credit, first-time or not.
    fn claim(&mut self, user: &Keypair, claim_key: ClaimKey) -> Result<CallReceipt, ModuleError> {
        let claim = self.runtime.pending_claim(&claim_key).unwrap();
        let current = self.runtime.ledger_of(&user.owner());
        let proof = self
            .prover
            .prove_claim(user, current.as_ref(), &claim, &mut OsRng)
            .unwrap();
        let call = match current {
            None => RuntimeCall::AddFirstClaim { claim_key, proof },
            Some(_) => RuntimeCall::AddClaim { claim_key, proof },
        };
        self.submit(&user.owner(), call)
    }

    fn confidential_balance(&self, user: &Keypair) -> u64 {
        let encrypted = self.runtime.ledger_of(&user.owner()).unwrap();
        decrypt_amount(user.secret(), &encrypted).unwrap()
    }

    fn mint_asset(&mut self, owner: &Keypair) -> AssetKey {
        let call = RuntimeCall::MintAsset {
            to: owner.owner(),
            metadata: Digest([0x11; 32]),
        };
        match self.submit(&owner.owner(), call) {
            Ok(CallReceipt::AssetMinted(key)) => key,
            other => panic!("unexpected receipt: {other:?}"),
        }
    }

    fn start_sealed_bid(&mut self, creator: &Keypair, asset: AssetKey, min_price: u64) -> u64 {
        self.start_sealed_bid_with_windows(creator, asset, min_price, 2)
    }

    fn start_sealed_bid_with_windows(
        &mut self,
        creator: &Keypair,
        asset: AssetKey,
        min_price: u64,
        window: u64,
    ) -> u64 {
        let call = RuntimeCall::StartSealedBid {
            asset,
            bidding_window: window,
            reveal_window: window,
            min_price,
        };
        match self.submit(&creator.owner(), call) {
            Ok(CallReceipt::AuctionStarted { auction_id }) => auction_id,
            other => panic!("unexpected receipt: {other:?}"),
        }
    }

    fn place_bid(&mut self, bidder: &Keypair, asset: AssetKey, auction_id: u64, amount: u64) -> SealedBid {
        let current = self.runtime.ledger_of(&bidder.owner()).unwrap();
        let escrow = self.runtime.state().escrows.sealed_bid_auction;
        let bid = self
            .prover
            .prove_sealed_bid(bidder, &current, auction_id, amount, &escrow, &mut OsRng)
            .unwrap();
        self.submit(
            &bidder.owner(),
            RuntimeCall::PlaceSealedBid {
                asset,
                proof: bid.proof.clone(),
            },
        )
        .unwrap();
        bid
    }

    fn reveal(&mut self, bidder: &Keypair, bid: &SealedBid) -> Result<CallReceipt, ModuleError> {
        let proof = bid.reveal(&self.prover).unwrap();
        self.submit(&bidder.owner(), RuntimeCall::RevealBid { proof })
    }
}

fn random_salt() -> Salt {
    let mut salt = Salt::default();
    OsRng.fill_bytes(&mut salt.0);
    salt
}

fn keypair() -> Keypair {
    Keypair::generate(&mut OsRng)
}

/// Test the complete sealed bid flow from public tokens to settlement.
#[test]
fn test_full_sealed_bid_auction() {
    let creator = keypair();
    let bidder_a = keypair();
    let bidder_b = keypair();
    let mut world = World::new(&[&bidder_a, &bidder_b], 1_000);

    // ========================================
    // Phase 1: Bidders move funds into the confidential ledger
    // ========================================

    world.fund_confidential(&bidder_a, 600);
    world.fund_confidential(&bidder_b, 600);
    assert_eq!(world.confidential_balance(&bidder_a), 600);
    assert_eq!(world.runtime.public_balance(&bidder_a.owner()), 400);
    assert_eq!(world.escrow_balance(), 1_200);

    // ========================================
    // Phase 2: Creator locks the asset in a sealed bid auction
    // ========================================

    let asset = world.mint_asset(&creator);
    let auction_id = world.start_sealed_bid(&creator, asset, 0);
    let record = world.runtime.sealed_bid_auction_for(&asset).unwrap().1;
    assert_eq!(record.reveal_time, world.height + 2);
    assert_eq!(record.end_time, world.height + 4);

    // ========================================
    // Phase 3: Sealed bids before reveal time
    // ========================================

    let bid_a = world.place_bid(&bidder_a, asset, auction_id, 500);
    world.advance(1);
    let bid_b = world.place_bid(&bidder_b, asset, auction_id, 400);
    assert_eq!(world.confidential_balance(&bidder_a), 100);
    assert_eq!(world.confidential_balance(&bidder_b), 200);

    // Reveals open only after the bidding window.
    assert_eq!(world.reveal(&bidder_a, &bid_a), Err(ModuleError::OutsideRevealWindow));

    // ========================================
    // Phase 4: Reveals
    // ========================================

    world.advance(2);
    assert_eq!(
        world.reveal(&bidder_a, &bid_a),
        Ok(CallReceipt::BidRevealed(RevealOutcome::NewBest {
            refunded: creator.owner(),
            amount: 0
        }))
    );
    assert_eq!(
        world.reveal(&bidder_b, &bid_b),
        Ok(CallReceipt::BidRevealed(RevealOutcome::Refunded { amount: 400 }))
    );
    assert_eq!(world.runtime.public_balance(&bidder_b.owner()), 400 + 400);

    // ========================================
    // Phase 5: Settlement
    // ========================================

    assert_eq!(
        world.submit(&bidder_b.owner(), RuntimeCall::SettleSealedBid { asset }),
        Err(ModuleError::TooEarly)
    );
    world.advance(2);
    world
        .submit(&bidder_b.owner(), RuntimeCall::SettleSealedBid { asset })
        .unwrap();

    let state = world.runtime.state();
    let nft = state.assets.get(&asset).unwrap();
    assert_eq!(nft.owner, bidder_a.owner());
    assert!(!nft.locked);
    let auction = state.sealed_bid.get(auction_id).unwrap();
    assert!(auction.header.ended);
    assert_eq!(auction.header.winner, bidder_a.owner());
    assert_eq!(world.runtime.public_balance(&creator.owner()), 500);

    // B's refund is spendable on the public ledger.
    world
        .submit(
            &bidder_b.owner(),
            RuntimeCall::TransferPublic {
                to: creator.owner(),
                amount: 800,
            },
        )
        .unwrap();
    assert_eq!(world.runtime.public_balance(&creator.owner()), 1_300);

    // Backing: 1200 deposited, 400 refunded, 500 paid out.
    assert_eq!(world.escrow_balance(), 300);
}

/// A commitment that is never revealed stays escrowed.
#[test]
fn test_unrevealed_bid_forfeits() {
    let creator = keypair();
    let bidder_a = keypair();
    let bidder_b = keypair();
    let mut world = World::new(&[&bidder_a, &bidder_b], 1_000);
    world.fund_confidential(&bidder_a, 500);
    world.fund_confidential(&bidder_b, 500);

    let asset = world.mint_asset(&creator);
    let auction_id = world.start_sealed_bid(&creator, asset, 0);
    let bid_a = world.place_bid(&bidder_a, asset, auction_id, 300);
    let bid_b = world.place_bid(&bidder_b, asset, auction_id, 450);

    world.advance(3);
    world.reveal(&bidder_a, &bid_a).unwrap();

    world.advance(2);
    world
        .submit(&creator.owner(), RuntimeCall::SettleSealedBid { asset })
        .unwrap();

    // Settled on the revealed bid only.
    assert_eq!(world.runtime.state().assets.get(&asset).unwrap().owner, bidder_a.owner());
    assert_eq!(world.runtime.public_balance(&creator.owner()), 300);

    // B's 450 is gone from its balance and no path returns it.
    assert_eq!(world.confidential_balance(&bidder_b), 50);
    assert_eq!(world.reveal(&bidder_b, &bid_b), Err(ModuleError::OutsideRevealWindow));
    assert_eq!(world.runtime.public_balance(&bidder_b.owner()), 500);
    assert_eq!(
        world.runtime.query(ModuleQuery::GetBidCommitment {
            bid_hash: bid_b.bid_hash()
        }),
        ModuleQueryResponse::BidCommitment(Some(BidCommitment {
            auction_id,
            live: true,
        }))
    );
    assert_eq!(world.escrow_balance(), 1_000 - 300);
}

/// Reveal order does not matter for the final best bid; ties keep the incumbent.
#[test]
fn test_reveal_order_and_ties() {
    for amounts in [[500, 400], [400, 500], [400, 400]] {
        let creator = keypair();
        let first = keypair();
        let second = keypair();
        let mut world = World::new(&[&first, &second], 1_000);
        world.fund_confidential(&first, 500);
        world.fund_confidential(&second, 500);

        let asset = world.mint_asset(&creator);
        let auction_id = world.start_sealed_bid(&creator, asset, 0);
        let bid_first = world.place_bid(&first, asset, auction_id, amounts[0]);
        let bid_second = world.place_bid(&second, asset, auction_id, amounts[1]);

        world.advance(3);
        world.reveal(&first, &bid_first).unwrap();
        world.reveal(&second, &bid_second).unwrap();

        let best = world.runtime.state().sealed_bid.get(auction_id).unwrap().max_bid;
        if amounts[1] > amounts[0] {
            assert_eq!(best.bidder, second.owner());
            assert_eq!(world.runtime.public_balance(&first.owner()), 500 + amounts[0]);
            assert_eq!(world.runtime.public_balance(&second.owner()), 500);
        } else {
            assert_eq!(best.bidder, first.owner());
            assert_eq!(world.runtime.public_balance(&first.owner()), 500);
            assert_eq!(world.runtime.public_balance(&second.owner()), 500 + amounts[1]);
        }
        assert_eq!(best.price, amounts[0].max(amounts[1]));
    }
}

/// Confidential transfer, claim and withdraw round trip.
#[test]
fn test_transfer_claim_withdraw() {
    let alice = keypair();
    let bob = keypair();
    let mut world = World::new(&[&alice], 1_000);
    world.fund_confidential(&alice, 700);

    let current = world.runtime.ledger_of(&alice.owner()).unwrap();
    let proof = world
        .prover
        .prove_transfer(&alice, &current, 250, &bob.owner(), &mut OsRng)
        .unwrap();
    let claim_key = match world.submit(&alice.owner(), RuntimeCall::Transfer { proof }) {
        Ok(CallReceipt::ClaimCreated(key)) => key,
        other => panic!("unexpected receipt: {other:?}"),
    };
    assert_eq!(world.confidential_balance(&alice), 450);

    world.claim(&bob, claim_key).unwrap();
    assert_eq!(world.confidential_balance(&bob), 250);
    assert!(world.runtime.pending_claim(&claim_key).is_none());

    let current = world.runtime.ledger_of(&bob.owner()).unwrap();
    let escrow = world.runtime.state().escrows.withdraw;
    let proof = world
        .prover
        .prove_withdraw(&bob, &current, 100, &escrow, &mut OsRng)
        .unwrap();
    world.submit(&bob.owner(), RuntimeCall::Withdraw { proof }).unwrap();

    assert_eq!(world.confidential_balance(&bob), 150);
    assert_eq!(world.runtime.public_balance(&bob.owner()), 100);
    assert_eq!(world.escrow_balance(), 600);
}

/// A second claim folds into the existing balance exactly once.
#[test]
fn test_claim_exactly_once() {
    let alice = keypair();
    let mut world = World::new(&[&alice], 1_000);
    world.fund_confidential(&alice, 100);

    let salt = random_salt();
    let proof = world.prover.prove_deposit_hash(50, &salt).unwrap();
    world.submit(&alice.owner(), RuntimeCall::Deposit { proof }).unwrap();
    let log = world.runtime.deposit_log();
    let proof = world
        .prover
        .prove_deposit(&log, 50, &salt, &alice.owner(), &mut OsRng)
        .unwrap();
    let claim_key = match world.submit(&alice.owner(), RuntimeCall::AddDeposit { proof: proof.clone() }) {
        Ok(CallReceipt::ClaimCreated(key)) => key,
        other => panic!("unexpected receipt: {other:?}"),
    };

    // Deposit replay
    assert_eq!(
        world.submit(&alice.owner(), RuntimeCall::AddDeposit { proof }),
        Err(ModuleError::NullifierReused)
    );

    let claim = world.runtime.pending_claim(&claim_key).unwrap();
    let current = world.runtime.ledger_of(&alice.owner()).unwrap();
    let proof = world
        .prover
        .prove_claim(&alice, Some(&current), &claim, &mut OsRng)
        .unwrap();
    let call = RuntimeCall::AddClaim { claim_key, proof };

    world.submit(&alice.owner(), call.clone()).unwrap();
    assert_eq!(world.confidential_balance(&alice), 150);
    assert_eq!(world.submit(&alice.owner(), call), Err(ModuleError::ClaimMismatch));
    assert_eq!(world.confidential_balance(&alice), 150);
}

/// The first claim can only happen once per owner.
#[test]
fn test_no_second_first_claim() {
    let alice = keypair();
    let bob = keypair();
    let mut world = World::new(&[&alice], 1_000);
    world.fund_confidential(&alice, 100);

    let mut keys = Vec::new();
    for amount in [10, 20] {
        let current = world.runtime.ledger_of(&alice.owner()).unwrap();
        let proof = world
            .prover
            .prove_transfer(&alice, &current, amount, &bob.owner(), &mut OsRng)
            .unwrap();
        match world.submit(&alice.owner(), RuntimeCall::Transfer { proof }) {
            Ok(CallReceipt::ClaimCreated(key)) => keys.push(key),
            other => panic!("unexpected receipt: {other:?}"),
        }
    }

    for key in &keys {
        let claim = world.runtime.pending_claim(key).unwrap();
        let proof = world.prover.prove_claim(&bob, None, &claim, &mut OsRng).unwrap();
        let result = world.submit(
            &bob.owner(),
            RuntimeCall::AddFirstClaim {
                claim_key: *key,
                proof,
            },
        );
        if key.index == 0 {
            assert!(result.is_ok());
        } else {
            assert_eq!(result, Err(ModuleError::NotFirstTime));
        }
    }
    assert_eq!(world.confidential_balance(&bob), 10);
}

/// Overspending has no valid proof, forged proofs are rejected, and a
/// re-encryption of the right plaintext is still stale.
#[test]
fn test_balance_cannot_go_negative() {
    let alice = keypair();
    let bob = keypair();
    let mut world = World::new(&[&alice], 1_000);
    world.fund_confidential(&alice, 100);
    let current = world.runtime.ledger_of(&alice.owner()).unwrap();

    let overspend = world
        .prover
        .prove_transfer(&alice, &current, 101, &bob.owner(), &mut OsRng);
    assert!(matches!(
        overspend,
        Err(ProverError::InsufficientBalance {
            balance: 100,
            amount: 101
        })
    ));

    // Lying output without a valid proof
    let mut forged = world
        .prover
        .prove_transfer(&alice, &current, 10, &bob.owner(), &mut OsRng)
        .unwrap();
    forged.public_output.amount = encrypt_amount(&bob.owner(), 1_000, &mut OsRng).unwrap();
    assert_eq!(
        world.submit(&alice.owner(), RuntimeCall::Transfer { proof: forged }),
        Err(ModuleError::InvalidProof {
            kind: ProofKind::Transfer,
            reason: ProofRejection::BadProof,
        })
    );

    // Same plaintext, different ciphertext
    let reencrypted = encrypt_amount(&alice.owner(), 100, &mut OsRng).unwrap();
    let stale = world
        .prover
        .prove_transfer(&alice, &reencrypted, 10, &bob.owner(), &mut OsRng)
        .unwrap();
    assert_eq!(
        world.submit(&alice.owner(), RuntimeCall::Transfer { proof: stale }),
        Err(ModuleError::StaleBalance)
    );
    assert_eq!(world.confidential_balance(&alice), 100);
}

/// English and Dutch auctions share the asset lock and the auction counter.
#[test]
fn test_public_auction_variants() {
    let creator = keypair();
    let bidder_a = keypair();
    let bidder_b = keypair();
    let mut world = World::new(&[&bidder_a, &bidder_b], 1_000);

    let english_asset = world.mint_asset(&creator);
    let dutch_asset = world.mint_asset(&creator);

    let english_id = match world.submit(
        &creator.owner(),
        RuntimeCall::StartEnglish {
            asset: english_asset,
            end_time: world.height + 5,
        },
    ) {
        Ok(CallReceipt::AuctionStarted { auction_id }) => auction_id,
        other => panic!("unexpected receipt: {other:?}"),
    };
    let dutch_id = match world.submit(
        &creator.owner(),
        RuntimeCall::StartDutch {
            asset: dutch_asset,
            start_price: 300,
            decay_rate: 50,
            min_price: 100,
        },
    ) {
        Ok(CallReceipt::AuctionStarted { auction_id }) => auction_id,
        other => panic!("unexpected receipt: {other:?}"),
    };
    assert_eq!(dutch_id, english_id + 1);

    // Locked assets cannot be auctioned twice or moved.
    assert_eq!(
        world.submit(
            &creator.owner(),
            RuntimeCall::TransferAsset {
                to: bidder_a.owner(),
                asset: english_asset,
            }
        ),
        Err(ModuleError::AlreadyLocked)
    );

    world
        .submit(&bidder_a.owner(), RuntimeCall::PlaceEnglishBid { asset: english_asset, price: 200 })
        .unwrap();
    world
        .submit(&bidder_b.owner(), RuntimeCall::PlaceEnglishBid { asset: english_asset, price: 250 })
        .unwrap();
    assert_eq!(world.runtime.public_balance(&bidder_a.owner()), 1_000);

    world.advance(2);
    world
        .submit(&bidder_a.owner(), RuntimeCall::DutchBid { auction_id: dutch_id })
        .unwrap();
    assert_eq!(world.runtime.public_balance(&bidder_a.owner()), 800);

    world.advance(4);
    world
        .submit(&creator.owner(), RuntimeCall::EndEnglish { asset: english_asset })
        .unwrap();

    let state = world.runtime.state();
    assert_eq!(state.assets.get(&english_asset).unwrap().owner, bidder_b.owner());
    assert_eq!(state.assets.get(&dutch_asset).unwrap().owner, bidder_a.owner());
    assert_eq!(world.runtime.public_balance(&creator.owner()), 250 + 200);
}

/// A bid committed to a closed auction cannot be escrowed through an open one.
#[test]
fn test_bid_routed_through_other_auction() {
    let creator = keypair();
    let bidder = keypair();
    let mut world = World::new(&[&bidder], 1_000);
    world.fund_confidential(&bidder, 500);

    let closed_asset = world.mint_asset(&creator);
    let closed_id = world.start_sealed_bid(&creator, closed_asset, 0);
    world.advance(2);
    let open_asset = world.mint_asset(&creator);
    world.start_sealed_bid_with_windows(&creator, open_asset, 0, 10);
    world.advance(1);

    let current = world.runtime.ledger_of(&bidder.owner()).unwrap();
    let escrow = world.runtime.state().escrows.sealed_bid_auction;
    let late = world
        .prover
        .prove_sealed_bid(&bidder, &current, closed_id, 400, &escrow, &mut OsRng)
        .unwrap();

    assert_eq!(
        world.submit(
            &bidder.owner(),
            RuntimeCall::PlaceSealedBid {
                asset: closed_asset,
                proof: late.proof.clone(),
            }
        ),
        Err(ModuleError::BiddingEnded)
    );
    assert_eq!(
        world.submit(
            &bidder.owner(),
            RuntimeCall::PlaceSealedBid {
                asset: open_asset,
                proof: late.proof.clone(),
            }
        ),
        Err(ModuleError::WrongAuction)
    );
    assert_eq!(world.runtime.ledger_of(&bidder.owner()), Some(current));
    assert_eq!(
        world.runtime.query(ModuleQuery::GetBidCommitment {
            bid_hash: late.bid_hash()
        }),
        ModuleQueryResponse::BidCommitment(None)
    );

    // The closed auction is now revealing, but never saw the commitment.
    assert_eq!(world.reveal(&bidder, &late), Err(ModuleError::UnknownCommitment));
    assert_eq!(world.confidential_balance(&bidder), 500);
}

/// Only the genesis attestor can vouch for a withdraw.
#[test]
fn test_withdraw_needs_registered_attestor() {
    let victim = keypair();
    let thief = keypair();
    let mut world = World::new(&[&victim, &thief], 1_000);
    world.fund_confidential(&victim, 900);
    world.fund_confidential(&thief, 1);

    let current = world.runtime.ledger_of(&thief.owner()).unwrap();
    let output = WithdrawOutput {
        owner: thief.owner(),
        to: world.runtime.state().escrows.withdraw,
        current_balance: current,
        resulting_balance: current,
        amount: 900,
    };
    let vkey_hash = dev_verifying_keys()
        .into_iter()
        .find(|key| key.kind == ProofKind::Withdraw)
        .unwrap()
        .vkey_hash;
    let digest = proof_attestation(ProofKind::Withdraw, &vkey_hash, &output.encode());
    let thief_attestor = SecretKey::from_seed(&thief.secret().to_bytes());

    for proof_bytes in [digest.0.to_vec(), sign(&thief_attestor, &digest.0).to_vec()] {
        let proof = Proof {
            vkey_hash,
            proof_bytes,
            public_output: output.clone(),
        };
        assert_eq!(
            world.submit(&thief.owner(), RuntimeCall::Withdraw { proof }),
            Err(ModuleError::InvalidProof {
                kind: ProofKind::Withdraw,
                reason: ProofRejection::BadProof,
            })
        );
    }
    assert_eq!(world.runtime.public_balance(&thief.owner()), 999);
    assert_eq!(world.escrow_balance(), 901);
}
