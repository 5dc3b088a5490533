//! Confidential ledger transitions.
//!
//! Balances are only ever replaced by ciphertexts a verified proof produced.
//! Every transition that spends from a balance first requires the proof's
//! `current_balance` to be the exact stored ciphertext, which serializes
//! spends per owner.

use tracing::debug;

use privtoken_types::{
    ClaimKey, ClaimOutput, DepositHashOutput, DepositOutput, Owner, Proof, TransferOutput,
    WithdrawOutput,
};

use super::{CallContext, HandlerResult};
use crate::balances::PublicLedger;
use crate::error::ModuleError;
use crate::state::ModuleState;
use crate::verifier::{verify_proof, ProofVerifier};

/// Handle Transfer call.
///
/// Replaces the sender's balance and records the encrypted amount as a new
/// claim for the recipient.
pub fn handle_transfer(
    state: &mut ModuleState,
    _ctx: &CallContext,
    verifier: &dyn ProofVerifier,
    proof: Proof<TransferOutput>,
) -> HandlerResult<ClaimKey> {
    let output = verify_proof(verifier, &proof)?.into_inner();

    if output.to.is_empty() {
        return Err(ModuleError::WrongRecipient);
    }

    let token = &mut state.private_token;
    token.assert_current_balance(&output.owner, &output.current_balance)?;
    token.ledger.insert(output.owner, output.resulting_balance);
    let claim_key = token.push_claim(output.to, output.amount)?;

    debug!(from = %output.owner, to = %output.to, index = claim_key.index, "confidential transfer");
    Ok(claim_key)
}

/// Handle AddFirstClaim call: create a ledger entry from a pending claim.
pub fn handle_add_first_claim(
    state: &mut ModuleState,
    _ctx: &CallContext,
    verifier: &dyn ProofVerifier,
    claim_key: ClaimKey,
    proof: Proof<ClaimOutput>,
) -> HandlerResult<()> {
    let output = verify_proof(verifier, &proof)?.into_inner();

    if claim_key.recipient != output.owner {
        return Err(ModuleError::NotClaimRecipient);
    }

    let token = &mut state.private_token;
    if token.ledger.contains_key(&output.owner) {
        return Err(ModuleError::NotFirstTime);
    }
    assert_claim_matches(token.claims.get(&claim_key), &output)?;

    token.ledger.insert(output.owner, output.amount);
    token.claims.insert(claim_key, Default::default());

    debug!(owner = %output.owner, index = claim_key.index, "first claim");
    Ok(())
}

/// Handle AddClaim call: fold a pending claim into an existing balance.
pub fn handle_add_claim(
    state: &mut ModuleState,
    _ctx: &CallContext,
    verifier: &dyn ProofVerifier,
    claim_key: ClaimKey,
    proof: Proof<ClaimOutput>,
) -> HandlerResult<()> {
    let output = verify_proof(verifier, &proof)?.into_inner();

    if claim_key.recipient != output.owner {
        return Err(ModuleError::NotClaimRecipient);
    }

    let token = &mut state.private_token;
    assert_claim_matches(token.claims.get(&claim_key), &output)?;
    token.assert_current_balance(&output.owner, &output.current_balance)?;

    token.ledger.insert(output.owner, output.resulting_balance);
    token.claims.insert(claim_key, Default::default());

    debug!(owner = %output.owner, index = claim_key.index, "claim added");
    Ok(())
}

/// Handle Deposit call.
///
/// Moves public tokens from the sender into the deposit escrow and appends
/// the commitment to the deposit log. Returns the log index.
pub fn handle_deposit(
    state: &mut ModuleState,
    ctx: &CallContext,
    verifier: &dyn ProofVerifier,
    proof: Proof<DepositHashOutput>,
) -> HandlerResult<u64> {
    let output = verify_proof(verifier, &proof)?.into_inner();

    let escrow = state.escrows.deposit;
    state
        .balances
        .transfer_from(&ctx.sender, &escrow, output.amount)?;
    let index = state.private_token.append_deposit(output.deposit_hash)?;

    debug!(sender = %ctx.sender, amount = output.amount, index, "deposit recorded");
    Ok(index)
}

/// Handle AddDeposit call: redeem a logged deposit as a confidential claim.
pub fn handle_add_deposit(
    state: &mut ModuleState,
    _ctx: &CallContext,
    verifier: &dyn ProofVerifier,
    proof: Proof<DepositOutput>,
) -> HandlerResult<ClaimKey> {
    let output = verify_proof(verifier, &proof)?.into_inner();

    let token = &mut state.private_token;
    if token.nullifiers.contains(&output.nullifier_hash) {
        return Err(ModuleError::NullifierReused);
    }
    if !token.is_known_root(&output.root_hash) {
        return Err(ModuleError::UnknownDepositRoot);
    }

    let claim_key = token.push_claim(output.to, output.amount)?;
    token.nullifiers.insert(output.nullifier_hash);

    debug!(to = %output.to, index = claim_key.index, "deposit redeemed");
    Ok(claim_key)
}

/// Handle Withdraw call: burn confidential balance for public tokens.
pub fn handle_withdraw(
    state: &mut ModuleState,
    _ctx: &CallContext,
    verifier: &dyn ProofVerifier,
    proof: Proof<WithdrawOutput>,
) -> HandlerResult<()> {
    let output = verify_proof(verifier, &proof)?.into_inner();

    if output.to != state.escrows.withdraw {
        return Err(ModuleError::WrongRecipient);
    }

    let token = &mut state.private_token;
    token.assert_current_balance(&output.owner, &output.current_balance)?;
    token.ledger.insert(output.owner, output.resulting_balance);

    unlock_balance(state, &output.owner, output.amount)?;

    debug!(owner = %output.owner, amount = output.amount, "withdrawal");
    Ok(())
}

/// Pay `amount` of deposit-escrowed public tokens to `to`.
///
/// Internal entry point for withdrawals, auction refunds and auction proceeds.
/// Not reachable as a call.
pub fn unlock_balance(state: &mut ModuleState, to: &Owner, amount: u64) -> HandlerResult<()> {
    let escrow = state.escrows.deposit;
    state.balances.transfer_from(&escrow, to, amount)
}

fn assert_claim_matches(
    stored: Option<&privtoken_types::EncryptedAmount>,
    output: &ClaimOutput,
) -> HandlerResult<()> {
    match stored {
        Some(claim) if !claim.is_empty() && claim.encodes_same_ciphertext_as(&output.amount) => {
            Ok(())
        }
        _ => Err(ModuleError::ClaimMismatch),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handlers::testing::*;
    use crate::verifier::ProofRejection;
    use privtoken_crypto::{sign, SecretKey};
    use privtoken_types::{proof_attestation, Digest, EncryptedAmount, ProofKind, PublicOutput};

    fn transfer_proof(
        owner: Owner,
        to: Owner,
        current: EncryptedAmount,
        resulting: EncryptedAmount,
        amount: EncryptedAmount,
    ) -> Proof<TransferOutput> {
        attest(TransferOutput {
            owner,
            to,
            current_balance: current,
            resulting_balance: resulting,
            amount,
        })
    }

    fn claim_proof(
        owner: Owner,
        current: EncryptedAmount,
        resulting: EncryptedAmount,
        amount: EncryptedAmount,
    ) -> Proof<ClaimOutput> {
        attest(ClaimOutput {
            owner,
            current_balance: current,
            resulting_balance: resulting,
            amount,
        })
    }

    /// State where `ALICE` holds `enc(1)` in the ledger.
    fn funded_alice() -> ModuleState {
        let mut state = ModuleState::default();
        state.private_token.ledger.insert(ALICE, enc(1));
        state
    }

    #[test]
    fn test_transfer_creates_claim() {
        let mut state = funded_alice();
        let proof = transfer_proof(ALICE, BOB, enc(1), enc(2), enc(3));

        let key = handle_transfer(&mut state, &ctx(ALICE, 1), &verifier(), proof).unwrap();

        assert_eq!(key, ClaimKey::new(BOB, 0));
        assert_eq!(state.private_token.ledger[&ALICE], enc(2));
        assert_eq!(state.private_token.claims[&key], enc(3));
        assert_eq!(state.private_token.nonces[&BOB], 1);
    }

    #[test]
    fn test_transfer_replay_is_stale() {
        let mut state = funded_alice();
        let proof = transfer_proof(ALICE, BOB, enc(1), enc(2), enc(3));

        handle_transfer(&mut state, &ctx(ALICE, 1), &verifier(), proof.clone()).unwrap();
        let result = handle_transfer(&mut state, &ctx(ALICE, 1), &verifier(), proof);

        assert_eq!(result, Err(ModuleError::StaleBalance));
        assert_eq!(state.private_token.nonces[&BOB], 1);
    }

    #[test]
    fn test_transfer_without_balance_is_stale() {
        let mut state = ModuleState::default();
        let proof = transfer_proof(ALICE, BOB, enc(1), enc(2), enc(3));
        assert_eq!(
            handle_transfer(&mut state, &ctx(ALICE, 1), &verifier(), proof),
            Err(ModuleError::StaleBalance)
        );
    }

    #[test]
    fn test_transfer_rejects_tampered_output() {
        let mut state = funded_alice();
        let mut proof = transfer_proof(ALICE, BOB, enc(1), enc(2), enc(3));
        proof.public_output.amount = enc(9);

        assert_eq!(
            handle_transfer(&mut state, &ctx(ALICE, 1), &verifier(), proof),
            Err(ModuleError::InvalidProof {
                kind: ProofKind::Transfer,
                reason: ProofRejection::BadProof,
            })
        );
        assert!(state.private_token.claims.is_empty());
    }

    #[test]
    fn test_first_claim_then_not_first_time() {
        let mut state = ModuleState::default();
        let first = state.private_token.push_claim(BOB, enc(3)).unwrap();
        let second = state.private_token.push_claim(BOB, enc(4)).unwrap();

        let proof = claim_proof(BOB, EncryptedAmount::empty(), enc(3), enc(3));
        handle_add_first_claim(&mut state, &ctx(BOB, 1), &verifier(), first, proof).unwrap();

        assert_eq!(state.private_token.ledger[&BOB], enc(3));
        assert!(state.private_token.claims[&first].is_empty());

        let proof = claim_proof(BOB, EncryptedAmount::empty(), enc(4), enc(4));
        assert_eq!(
            handle_add_first_claim(&mut state, &ctx(BOB, 1), &verifier(), second, proof),
            Err(ModuleError::NotFirstTime)
        );
    }

    #[test]
    fn test_first_claim_checks_amount_and_recipient() {
        let mut state = ModuleState::default();
        let key = state.private_token.push_claim(BOB, enc(3)).unwrap();

        let wrong_amount = claim_proof(BOB, EncryptedAmount::empty(), enc(5), enc(5));
        assert_eq!(
            handle_add_first_claim(&mut state, &ctx(BOB, 1), &verifier(), key, wrong_amount),
            Err(ModuleError::ClaimMismatch)
        );

        let wrong_owner = claim_proof(CAROL, EncryptedAmount::empty(), enc(3), enc(3));
        assert_eq!(
            handle_add_first_claim(&mut state, &ctx(CAROL, 1), &verifier(), key, wrong_owner),
            Err(ModuleError::NotClaimRecipient)
        );
        assert!(!state.private_token.ledger.contains_key(&BOB));
    }

    #[test]
    fn test_add_claim_only_once() {
        let mut state = funded_alice();
        let key = state.private_token.push_claim(ALICE, enc(3)).unwrap();
        let proof = claim_proof(ALICE, enc(1), enc(4), enc(3));

        handle_add_claim(&mut state, &ctx(ALICE, 1), &verifier(), key, proof.clone()).unwrap();
        assert_eq!(state.private_token.ledger[&ALICE], enc(4));
        assert!(state.private_token.claims[&key].is_empty());

        assert_eq!(
            handle_add_claim(&mut state, &ctx(ALICE, 1), &verifier(), key, proof),
            Err(ModuleError::ClaimMismatch)
        );
    }

    #[test]
    fn test_add_claim_requires_current_balance() {
        let mut state = funded_alice();
        let key = state.private_token.push_claim(ALICE, enc(3)).unwrap();
        let proof = claim_proof(ALICE, enc(8), enc(4), enc(3));

        assert_eq!(
            handle_add_claim(&mut state, &ctx(ALICE, 1), &verifier(), key, proof),
            Err(ModuleError::StaleBalance)
        );
        assert_eq!(state.private_token.claims[&key], enc(3));
    }

    #[test]
    fn test_deposit_moves_public_funds() {
        let mut state = ModuleState::default();
        state.balances.mint(&ALICE, 100).unwrap();
        let proof = attest(DepositHashOutput {
            amount: 60,
            deposit_hash: Digest([5u8; 32]),
        });

        let index = handle_deposit(&mut state, &ctx(ALICE, 1), &verifier(), proof).unwrap();

        assert_eq!(index, 0);
        assert_eq!(state.balances.balance_of(&ALICE), 40);
        assert_eq!(state.balances.balance_of(&state.escrows.deposit), 60);
        assert_eq!(state.private_token.deposits[&0], Digest([5u8; 32]));
        assert_eq!(state.private_token.deposit_nonce, 1);
    }

    #[test]
    fn test_deposit_insufficient_funds() {
        let mut state = ModuleState::default();
        state.balances.mint(&ALICE, 10).unwrap();
        let proof = attest(DepositHashOutput {
            amount: 60,
            deposit_hash: Digest([5u8; 32]),
        });

        assert_eq!(
            handle_deposit(&mut state, &ctx(ALICE, 1), &verifier(), proof),
            Err(ModuleError::InsufficientFunds {
                required: 60,
                available: 10
            })
        );
    }

    #[test]
    fn test_add_deposit_nullifier_single_use() {
        let mut state = ModuleState::default();
        state.private_token.append_deposit(Digest([5u8; 32])).unwrap();
        let root = state.private_token.deposit_root;

        let proof = attest(DepositOutput {
            root_hash: root,
            nullifier_hash: Digest([6u8; 32]),
            to: BOB,
            amount: enc(3),
        });

        let key = handle_add_deposit(&mut state, &ctx(CAROL, 1), &verifier(), proof.clone()).unwrap();
        assert_eq!(key, ClaimKey::new(BOB, 0));
        assert_eq!(state.private_token.claims[&key], enc(3));

        assert_eq!(
            handle_add_deposit(&mut state, &ctx(CAROL, 1), &verifier(), proof),
            Err(ModuleError::NullifierReused)
        );
    }

    #[test]
    fn test_add_deposit_unknown_root() {
        let mut state = ModuleState::default();
        let proof = attest(DepositOutput {
            root_hash: Digest([42u8; 32]),
            nullifier_hash: Digest([6u8; 32]),
            to: BOB,
            amount: enc(3),
        });

        assert_eq!(
            handle_add_deposit(&mut state, &ctx(BOB, 1), &verifier(), proof),
            Err(ModuleError::UnknownDepositRoot)
        );
        assert!(state.private_token.nullifiers.is_empty());
    }

    #[test]
    fn test_withdraw_pays_from_deposit_escrow() {
        let mut state = funded_alice();
        let escrow = state.escrows.deposit;
        state.balances.mint(&escrow, 100).unwrap();
        let to = state.escrows.withdraw;

        let proof = attest(WithdrawOutput {
            owner: ALICE,
            to,
            current_balance: enc(1),
            resulting_balance: enc(2),
            amount: 30,
        });
        handle_withdraw(&mut state, &ctx(ALICE, 1), &verifier(), proof).unwrap();

        assert_eq!(state.private_token.ledger[&ALICE], enc(2));
        assert_eq!(state.balances.balance_of(&ALICE), 30);
        assert_eq!(state.balances.balance_of(&escrow), 70);
    }

    #[test]
    fn test_withdraw_wrong_recipient() {
        let mut state = funded_alice();
        let proof = attest(WithdrawOutput {
            owner: ALICE,
            to: BOB,
            current_balance: enc(1),
            resulting_balance: enc(2),
            amount: 30,
        });

        assert_eq!(
            handle_withdraw(&mut state, &ctx(ALICE, 1), &verifier(), proof),
            Err(ModuleError::WrongRecipient)
        );
        assert_eq!(state.private_token.ledger[&ALICE], enc(1));
    }

    #[test]
    fn test_withdraw_rejects_self_made_attestation() {
        let mut state = funded_alice();
        let escrow = state.escrows.deposit;
        state.balances.mint(&escrow, 900).unwrap();
        let output = WithdrawOutput {
            owner: ALICE,
            to: state.escrows.withdraw,
            current_balance: enc(1),
            resulting_balance: enc(1),
            amount: 900,
        };
        let vkey_hash = vkey(ProofKind::Withdraw);
        let digest = proof_attestation(ProofKind::Withdraw, &vkey_hash, &output.encode());

        // Bare digest, then a signature by a key that is not the attestor.
        let forged = [
            digest.0.to_vec(),
            sign(&SecretKey::from_seed(b"alice's own key"), &digest.0).to_vec(),
        ];
        for proof_bytes in forged {
            let proof = Proof {
                vkey_hash,
                proof_bytes,
                public_output: output.clone(),
            };
            assert_eq!(
                handle_withdraw(&mut state, &ctx(ALICE, 1), &verifier(), proof),
                Err(ModuleError::InvalidProof {
                    kind: ProofKind::Withdraw,
                    reason: ProofRejection::BadProof,
                })
            );
        }
        assert_eq!(state.balances.balance_of(&ALICE), 0);
        assert_eq!(state.balances.balance_of(&escrow), 900);
    }
}
