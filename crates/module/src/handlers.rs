//! Call handlers for the auction module.
//!
//! These functions implement the business logic for each call type. Every
//! handler checks all of its preconditions before touching state, so a
//! failure never leaves a partial write behind; outgoing fund movements are
//! returned as [`Transfer`]s for the environment to execute inside the same
//! atomic unit as the state change.

use timelock_types::{
    attestation_message, compute_commitment, Address, Asset, AuctionParams, BidderRecord, Phase,
    Transfer, ATTESTATION_LEN,
};

use crate::attest::verify_attestation;
use crate::call::{AuctionCall, CreateParams};
use crate::error::AuctionError;
use crate::state::AuctionState;

/// Context provided by the runtime for each call.
pub struct CallContext {
    /// Authenticated sender of the call
    pub sender: Address,
    /// Current round of the ledger clock
    pub round: u64,
    /// Environment-attested fund transfer grouped with this call, if any.
    ///
    /// The host ledger guarantees the transfer committed atomically with the
    /// call; handlers match it against the payment they require and never
    /// trust an unverified claim of prior payment.
    pub paired_transfer: Option<Transfer>,
}

/// Result type for handlers.
pub type HandlerResult<T> = Result<T, AuctionError>;

fn require_phase(params: &AuctionParams, round: u64, expected: Phase) -> HandlerResult<()> {
    let got = params.phase(round);
    if got == expected {
        Ok(())
    } else {
        Err(AuctionError::PhaseViolation(got))
    }
}

fn require_payment(
    ctx: &CallContext,
    asset: Asset,
    amount: u64,
    receiver: Address,
) -> HandlerResult<()> {
    match &ctx.paired_transfer {
        Some(t) if t.asset == asset && t.amount == amount && t.receiver == receiver => Ok(()),
        _ => Err(AuctionError::PaymentMismatch),
    }
}

/// Handle Create: initialize parameters with a zeroed leaderboard.
pub fn handle_create(
    state: &mut AuctionState,
    ctx: &CallContext,
    params: CreateParams,
) -> HandlerResult<()> {
    if state.params.is_some() {
        return Err(AuctionError::AlreadyCreated);
    }
    if params.commit_end <= ctx.round {
        return Err(AuctionError::InvalidSchedule);
    }

    state.params = Some(AuctionParams {
        seller: ctx.sender,
        quote_asset: params.quote_asset,
        reserve: params.reserve,
        min_bid: params.min_bid,
        bond: params.bond,
        second_price: params.second_price,
        kyc_required: params.kyc_required,
        commit_end: params.commit_end,
        unlock_slack: params.unlock_slack,
        pay_window: params.pay_window,
        oracle_pubkey: params.oracle_pubkey,
        param_hash: params.param_hash,
        winner: None,
        second_winner: None,
        win_bid: 0,
        second_bid: 0,
        settled: false,
        finalized: false,
        settle_round: 0,
    });

    Ok(())
}

/// Handle Commit: register a sealed-bid commitment against a posted bond.
pub fn handle_commit(
    state: &mut AuctionState,
    ctx: &CallContext,
    commitment_hash: [u8; 32],
    content_ref: Vec<u8>,
    privacy_key: [u8; 32],
) -> HandlerResult<()> {
    let params = state.params()?;
    require_phase(params, ctx.round, Phase::Commit)?;

    if params.kyc_required && !state.is_verified(&ctx.sender) {
        return Err(AuctionError::KycNotVerified);
    }

    // The bond must have moved to escrow in the same grouped operation.
    require_payment(ctx, Asset::Native, params.bond, state.escrow_address)?;
    let bond = params.bond;

    if state.bidder(&ctx.sender).map_or(false, |b| b.bonded) {
        return Err(AuctionError::AlreadyCommitted);
    }

    state.insert_commitment(commitment_hash, ctx.sender)?;
    state.bidders.insert(
        ctx.sender,
        BidderRecord::new(commitment_hash, content_ref, privacy_key, bond),
    );

    Ok(())
}

/// Handle RevealFor: open a commitment, update the leaderboard, and pay the
/// reveal bounty when a third party performed the reveal.
pub fn handle_reveal_for(
    state: &mut AuctionState,
    ctx: &CallContext,
    commit_id: [u8; 32],
    bid: u64,
    salt: &[u8],
    hybrid_param: &[u8],
    attestation: &[u8],
) -> HandlerResult<Vec<Transfer>> {
    let params = state.params()?;
    require_phase(params, ctx.round, Phase::Reveal)?;

    if attestation.len() != ATTESTATION_LEN {
        return Err(AuctionError::BadAttestation);
    }
    let msg = attestation_message(
        state.instance_id,
        hybrid_param,
        ctx.round,
        &params.param_hash,
        params.commit_end,
        params.reveal_end(),
    );
    verify_attestation(&params.oracle_pubkey, &msg, attestation)?;
    let min_bid = params.min_bid;

    let bidder_addr = *state
        .commitment_owner(&commit_id)
        .ok_or(AuctionError::UnknownCommitment)?;
    let record = state
        .bidder(&bidder_addr)
        .ok_or(AuctionError::UnknownCommitment)?;

    let expected = compute_commitment(bid, salt, &record.privacy_key, state.instance_id);
    if expected != record.commitment_hash {
        return Err(AuctionError::CommitmentMismatch);
    }
    if record.revealed {
        return Err(AuctionError::AlreadyRevealed);
    }
    if bid < min_bid {
        return Err(AuctionError::BidBelowMinimum { min: min_bid, got: bid });
    }

    // All preconditions hold; from here on the reveal commits.
    let record = state
        .bidder_mut(&bidder_addr)
        .ok_or(AuctionError::UnknownCommitment)?;
    record.revealed = true;
    record.bid = bid;

    let mut transfers = Vec::new();
    if ctx.sender != bidder_addr {
        // Third-party reveal: 70% of the held bond goes to the caller right
        // away; the truncation residual stays with the bidder.
        let held = record.remaining_bond;
        let bounty = (held as u128 * 70 / 100) as u64;
        record.remaining_bond = held - bounty;
        if bounty > 0 {
            transfers.push(Transfer::native(ctx.sender, bounty));
        }
    }

    let params = state.params_mut()?;
    if bid > params.win_bid {
        params.second_bid = params.win_bid;
        params.second_winner = params.winner;
        params.win_bid = bid;
        params.winner = Some(bidder_addr);
    } else if bid > params.second_bid {
        params.second_bid = bid;
        params.second_winner = Some(bidder_addr);
    }

    Ok(transfers)
}

/// Handle Settle: close the reveal window and stamp the settlement round.
///
/// Settlement is unconditional; whether a winner actually qualifies against
/// the reserve is only decided at finalize time.
pub fn handle_settle(state: &mut AuctionState, ctx: &CallContext) -> HandlerResult<()> {
    let params = state.params_mut()?;
    if params.settled {
        return Err(AuctionError::AlreadySettled);
    }
    match params.phase(ctx.round) {
        Phase::SettlePending => {}
        p => return Err(AuctionError::PhaseViolation(p)),
    }

    params.settled = true;
    params.settle_round = ctx.round;
    Ok(())
}

/// Handle FinalizeWin: the winner pays the clearing price; the payment is
/// forwarded to the seller and the winner's remaining bond refunded.
pub fn handle_finalize_win(
    state: &mut AuctionState,
    ctx: &CallContext,
    price: u64,
) -> HandlerResult<Vec<Transfer>> {
    let escrow = state.escrow_address;
    let params = state.params()?;
    if !params.settled {
        return Err(AuctionError::PhaseViolation(params.phase(ctx.round)));
    }
    if params.finalized {
        return Err(AuctionError::AlreadyFinalized);
    }
    let winner = params.winner.ok_or(AuctionError::NotWinner)?;
    if ctx.sender != winner {
        return Err(AuctionError::NotWinner);
    }
    if ctx.round > params.pay_deadline() {
        return Err(AuctionError::PhaseViolation(Phase::Expired));
    }

    require_payment(ctx, Asset::Token(params.quote_asset), price, escrow)?;
    let expected = params.expected_price();
    if price != expected {
        return Err(AuctionError::PriceMismatch {
            expected,
            got: price,
        });
    }
    let seller = params.seller;
    let quote_asset = params.quote_asset;

    let mut transfers = vec![Transfer::token(seller, price, quote_asset)];
    if let Some(record) = state.bidder_mut(&winner) {
        if record.remaining_bond > 0 {
            transfers.push(Transfer::native(winner, record.remaining_bond));
            record.remaining_bond = 0;
        }
    }
    state.params_mut()?.finalized = true;

    Ok(transfers)
}

/// Handle PromoteNext: slash a winner who missed the pay window and advance
/// the runner-up, restarting the pay window.
pub fn handle_promote_next(
    state: &mut AuctionState,
    ctx: &CallContext,
) -> HandlerResult<Vec<Transfer>> {
    let params = state.params()?;
    if !params.settled {
        return Err(AuctionError::PhaseViolation(params.phase(ctx.round)));
    }
    if params.finalized {
        return Err(AuctionError::AlreadyFinalized);
    }
    if ctx.round <= params.pay_deadline() {
        return Err(AuctionError::PhaseViolation(Phase::PayWindow));
    }
    let fallback = params.second_winner.ok_or(AuctionError::NoFallbackBidder)?;
    let expired_winner = params.winner;
    let seller = params.seller;
    let second_bid = params.second_bid;

    let mut transfers = Vec::new();
    if let Some(expired) = expired_winner {
        if let Some(record) = state.bidder_mut(&expired) {
            if record.remaining_bond > 0 {
                transfers.push(Transfer::native(seller, record.remaining_bond));
                record.remaining_bond = 0;
            }
            // The slash closes the expired winner's books; no refund later.
            record.refunded = true;
        }
    }

    let params = state.params_mut()?;
    params.winner = Some(fallback);
    params.win_bid = second_bid;
    params.second_winner = None;
    params.second_bid = 0;
    params.settle_round = ctx.round;

    Ok(transfers)
}

/// Handle ClaimRefund: a revealed non-winner recovers the remaining bond.
pub fn handle_claim_refund(
    state: &mut AuctionState,
    ctx: &CallContext,
) -> HandlerResult<Vec<Transfer>> {
    let params = state.params()?;
    if !params.settled {
        return Err(AuctionError::PhaseViolation(params.phase(ctx.round)));
    }
    let winner = params.winner;

    let record = state
        .bidders
        .get_mut(&ctx.sender)
        .ok_or(AuctionError::NotRevealed)?;
    if !record.revealed {
        return Err(AuctionError::NotRevealed);
    }
    if winner == Some(ctx.sender) {
        return Err(AuctionError::WinnerCannotRefund);
    }
    if record.refunded {
        return Err(AuctionError::AlreadyRefunded);
    }

    let mut transfers = Vec::new();
    if record.remaining_bond > 0 {
        transfers.push(Transfer::native(ctx.sender, record.remaining_bond));
        record.remaining_bond = 0;
    }
    // Set unconditionally, even when the bounty split already consumed the
    // whole bond.
    record.refunded = true;

    Ok(transfers)
}

/// Handle SetKyc: seller writes an allowlist flag during the commit phase.
pub fn handle_set_kyc(
    state: &mut AuctionState,
    ctx: &CallContext,
    address: Address,
    verified: bool,
) -> HandlerResult<()> {
    let params = state.params()?;
    if ctx.sender != params.seller {
        return Err(AuctionError::NotSeller);
    }
    require_phase(params, ctx.round, Phase::Commit)?;

    state.set_verified(address, verified);
    Ok(())
}

/// Handle Update: upgrade hook, authenticates the seller only.
pub fn handle_update(state: &AuctionState, ctx: &CallContext) -> HandlerResult<()> {
    if ctx.sender != state.params()?.seller {
        return Err(AuctionError::NotSeller);
    }
    Ok(())
}

/// Handle Delete: teardown hook, authenticates the seller only.
pub fn handle_delete(state: &AuctionState, ctx: &CallContext) -> HandlerResult<()> {
    if ctx.sender != state.params()?.seller {
        return Err(AuctionError::NotSeller);
    }
    Ok(())
}

/// Dispatch a call message to its handler.
pub fn handle_call(
    state: &mut AuctionState,
    ctx: &CallContext,
    call: AuctionCall,
) -> HandlerResult<Vec<Transfer>> {
    match call {
        AuctionCall::Create(params) => {
            handle_create(state, ctx, params)?;
            Ok(Vec::new())
        }
        AuctionCall::Commit {
            commitment_hash,
            content_ref,
            privacy_key,
        } => {
            handle_commit(state, ctx, commitment_hash, content_ref, privacy_key)?;
            Ok(Vec::new())
        }
        AuctionCall::RevealFor {
            commit_id,
            bid,
            salt,
            hybrid_param,
            attestation,
        } => handle_reveal_for(state, ctx, commit_id, bid, &salt, &hybrid_param, &attestation),
        AuctionCall::Settle => {
            handle_settle(state, ctx)?;
            Ok(Vec::new())
        }
        AuctionCall::FinalizeWin { price } => handle_finalize_win(state, ctx, price),
        AuctionCall::PromoteNext => handle_promote_next(state, ctx),
        AuctionCall::ClaimRefund => handle_claim_refund(state, ctx),
        AuctionCall::SetKyc { address, verified } => {
            handle_set_kyc(state, ctx, address, verified)?;
            Ok(Vec::new())
        }
        AuctionCall::Update => {
            handle_update(state, ctx)?;
            Ok(Vec::new())
        }
        AuctionCall::Delete => {
            handle_delete(state, ctx)?;
            Ok(Vec::new())
        }
    }
}
