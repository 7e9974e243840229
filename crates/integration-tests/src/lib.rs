//! End-to-end integration tests for the timelock auction system.
//!
//! These tests exercise the full auction lifecycle against a simulated
//! ledger:
//! 1. Auction creation with an oracle public key
//! 2. Sealed-bid commits with bonds
//! 3. Oracle-attested reveals (self-service and bounty-hunted)
//! 4. Settlement and second-price clearing
//! 5. Winner payment, promotion on expiry, and bond refunds

#![allow(dead_code)]

use std::collections::HashMap;

use ed25519_dalek::{Signer, SigningKey};
use rand::rngs::OsRng;

use timelock_client::{seal_bid, SealedBid};
use timelock_module::{handlers, AuctionError, AuctionState, CallContext, CreateParams, InstanceConfig};
use timelock_types::{attestation_message, Address, Asset, Transfer};

const INSTANCE: u64 = 42;
const ESCROW: Address = [0xEE; 32];
const SELLER: Address = [0x51; 32];
const PARAM_HASH: [u8; 32] = [0xAB; 32];
const HYBRID: &[u8] = b"hybrid-v1";

const QUOTE: u64 = 7;
const BOND: u64 = 1_000_000;
const RESERVE: u64 = 50_000;
const MIN_BID: u64 = 10_000;
const COMMIT_END: u64 = 100;
const UNLOCK_SLACK: u64 = 20;
const PAY_WINDOW: u64 = 50;

const ORACLE_SEED: [u8; 32] = [77u8; 32];

/// Simulated host ledger: round clock, balances, and grouped execution.
struct Ledger {
    state: AuctionState,
    round: u64,
    native: HashMap<Address, u64>,
    assets: HashMap<(u64, Address), u64>,
    oracle: SigningKey,
}

impl Ledger {
    fn new() -> Self {
        Self {
            state: AuctionState::new(&InstanceConfig {
                instance_id: INSTANCE,
                escrow_address: ESCROW,
            }),
            round: 0,
            native: HashMap::new(),
            assets: HashMap::new(),
            oracle: SigningKey::from_bytes(&ORACLE_SEED),
        }
    }

    fn fund(&mut self, who: Address, amount: u64) {
        *self.native.entry(who).or_insert(0) += amount;
    }

    fn fund_asset(&mut self, who: Address, asset_id: u64, amount: u64) {
        *self.assets.entry((asset_id, who)).or_insert(0) += amount;
    }

    fn balance(&self, who: &Address) -> u64 {
        self.native.get(who).copied().unwrap_or(0)
    }

    fn asset_balance(&self, who: &Address, asset_id: u64) -> u64 {
        self.assets.get(&(asset_id, *who)).copied().unwrap_or(0)
    }

    fn total_native(&self) -> u64 {
        self.native.values().sum()
    }

    fn ctx(&self, sender: Address) -> CallContext {
        CallContext {
            sender,
            round: self.round,
            paired_transfer: None,
        }
    }

    fn apply(&mut self, transfers: &[Transfer]) {
        for t in transfers {
            match t.asset {
                Asset::Native => {
                    let escrow = self.native.get_mut(&ESCROW).expect("escrow funded");
                    assert!(*escrow >= t.amount, "escrow underfunded");
                    *escrow -= t.amount;
                    *self.native.entry(t.receiver).or_insert(0) += t.amount;
                }
                Asset::Token(id) => {
                    let escrow = self
                        .assets
                        .get_mut(&(id, ESCROW))
                        .expect("escrow asset funded");
                    assert!(*escrow >= t.amount, "escrow underfunded");
                    *escrow -= t.amount;
                    *self.assets.entry((id, t.receiver)).or_insert(0) += t.amount;
                }
            }
        }
    }

    fn create(&mut self, second_price: bool, kyc_required: bool) {
        let ctx = self.ctx(SELLER);
        handlers::handle_create(
            &mut self.state,
            &ctx,
            CreateParams {
                quote_asset: QUOTE,
                reserve: RESERVE,
                min_bid: MIN_BID,
                bond: BOND,
                second_price,
                kyc_required,
                commit_end: COMMIT_END,
                unlock_slack: UNLOCK_SLACK,
                pay_window: PAY_WINDOW,
                oracle_pubkey: self.oracle.verifying_key().to_bytes(),
                param_hash: PARAM_HASH,
            },
        )
        .expect("create failed");
    }

    /// Commit with the bond moved atomically alongside the call.
    fn commit(&mut self, bidder: Address, sealed: &SealedBid) -> Result<(), AuctionError> {
        let held = self.balance(&bidder);
        assert!(held >= BOND, "bidder not funded");
        *self.native.get_mut(&bidder).unwrap() -= BOND;
        *self.native.entry(ESCROW).or_insert(0) += BOND;

        let ctx = CallContext {
            sender: bidder,
            round: self.round,
            paired_transfer: Some(Transfer::native(ESCROW, BOND)),
        };
        let result = handlers::handle_commit(
            &mut self.state,
            &ctx,
            sealed.commitment_hash,
            b"ref".to_vec(),
            sealed.privacy_key,
        );
        if result.is_err() {
            // Grouped call aborts atomically with its payment.
            *self.native.get_mut(&ESCROW).unwrap() -= BOND;
            *self.native.get_mut(&bidder).unwrap() += BOND;
        }
        result
    }

    fn attest(&self) -> Vec<u8> {
        let msg = attestation_message(
            INSTANCE,
            HYBRID,
            self.round,
            &PARAM_HASH,
            COMMIT_END,
            COMMIT_END + UNLOCK_SLACK,
        );
        self.oracle.sign(&msg).to_bytes().to_vec()
    }

    fn reveal(
        &mut self,
        caller: Address,
        sealed: &SealedBid,
    ) -> Result<Vec<Transfer>, AuctionError> {
        let attestation = self.attest();
        let ctx = self.ctx(caller);
        let transfers = handlers::handle_reveal_for(
            &mut self.state,
            &ctx,
            sealed.commitment_hash,
            sealed.bid_value,
            &sealed.salt,
            HYBRID,
            &attestation,
        )?;
        self.apply(&transfers);
        Ok(transfers)
    }

    fn settle(&mut self, caller: Address) -> Result<(), AuctionError> {
        let ctx = self.ctx(caller);
        handlers::handle_settle(&mut self.state, &ctx)
    }

    /// Finalize with the clearing-price payment grouped alongside the call.
    fn finalize(&mut self, winner: Address, price: u64) -> Result<Vec<Transfer>, AuctionError> {
        let held = self.asset_balance(&winner, QUOTE);
        assert!(held >= price, "winner not funded in quote asset");
        *self.assets.get_mut(&(QUOTE, winner)).unwrap() -= price;
        *self.assets.entry((QUOTE, ESCROW)).or_insert(0) += price;

        let ctx = CallContext {
            sender: winner,
            round: self.round,
            paired_transfer: Some(Transfer::token(ESCROW, price, QUOTE)),
        };
        let result = handlers::handle_finalize_win(&mut self.state, &ctx, price);
        match result {
            Ok(transfers) => {
                self.apply(&transfers);
                Ok(transfers)
            }
            Err(e) => {
                *self.assets.get_mut(&(QUOTE, ESCROW)).unwrap() -= price;
                *self.assets.get_mut(&(QUOTE, winner)).unwrap() += price;
                Err(e)
            }
        }
    }

    fn promote(&mut self, caller: Address) -> Result<Vec<Transfer>, AuctionError> {
        let ctx = self.ctx(caller);
        let transfers = handlers::handle_promote_next(&mut self.state, &ctx)?;
        self.apply(&transfers);
        Ok(transfers)
    }

    fn refund(&mut self, bidder: Address) -> Result<Vec<Transfer>, AuctionError> {
        let ctx = self.ctx(bidder);
        let transfers = handlers::handle_claim_refund(&mut self.state, &ctx)?;
        self.apply(&transfers);
        Ok(transfers)
    }

    fn params(&self) -> &timelock_types::AuctionParams {
        self.state.params().expect("created")
    }
}

fn bidder(tag: u8) -> Address {
    [tag; 32]
}

fn sealed(bid: u64) -> SealedBid {
    seal_bid(bid, INSTANCE, &mut OsRng).expect("seal failed")
}

/// Three bidders, second-price clearing, full happy path.
#[test]
fn test_second_price_full_lifecycle() {
    let mut ledger = Ledger::new();

    // ========================================
    // Phase 1: Create the auction
    // ========================================

    ledger.create(true, false);

    // ========================================
    // Phase 2: Commit window - sealed bids with bonds
    // ========================================

    let (a, b, c) = (bidder(1), bidder(2), bidder(3));
    let bid_a = sealed(100_000);
    let bid_b = sealed(250_000);
    let bid_c = sealed(180_000);

    ledger.round = 10;
    for who in [a, b, c] {
        ledger.fund(who, BOND);
    }
    ledger.commit(a, &bid_a).unwrap();
    ledger.commit(b, &bid_b).unwrap();
    ledger.commit(c, &bid_c).unwrap();

    assert_eq!(ledger.balance(&ESCROW), 3 * BOND);

    // ========================================
    // Phase 3: Reveal window - self reveals keep the full bond
    // ========================================

    ledger.round = 105;
    ledger.reveal(a, &bid_a).unwrap();
    ledger.reveal(b, &bid_b).unwrap();
    ledger.reveal(c, &bid_c).unwrap();

    let params = ledger.params();
    assert_eq!(params.winner, Some(b));
    assert_eq!(params.win_bid, 250_000);
    assert_eq!(params.second_winner, Some(c));
    assert_eq!(params.second_bid, 180_000);

    // ========================================
    // Phase 4: Settle and pay
    // ========================================

    ledger.round = 125;
    ledger.settle(a).unwrap();
    assert_eq!(ledger.params().settle_round, 125);

    // Second-price: winner pays the runner-up's bid, above the reserve.
    let price = ledger.params().expected_price();
    assert_eq!(price, 180_000);

    ledger.round = 130;
    ledger.fund_asset(b, QUOTE, price);
    ledger.finalize(b, price).unwrap();

    assert_eq!(ledger.asset_balance(&SELLER, QUOTE), price);
    assert_eq!(ledger.balance(&b), BOND);
    assert!(ledger.params().finalized);

    // ========================================
    // Phase 5: Losers reclaim bonds
    // ========================================

    ledger.refund(a).unwrap();
    ledger.refund(c).unwrap();
    assert_eq!(ledger.balance(&a), BOND);
    assert_eq!(ledger.balance(&c), BOND);

    // Every bond found its way home; escrow holds nothing.
    assert_eq!(ledger.balance(&ESCROW), 0);
    assert_eq!(ledger.asset_balance(&ESCROW, QUOTE), 0);
}

/// A third party reveals on a bidder's behalf and earns 70% of the bond.
#[test]
fn test_bounty_reveal_splits_bond() {
    let mut ledger = Ledger::new();
    ledger.create(true, false);

    let sleeper = bidder(4);
    let hunter = bidder(5);
    let bid = sealed(120_000);

    ledger.round = 10;
    ledger.fund(sleeper, BOND);
    ledger.commit(sleeper, &bid).unwrap();

    ledger.round = 110;
    let transfers = ledger.reveal(hunter, &bid).unwrap();

    let bounty = BOND * 70 / 100;
    assert_eq!(transfers, vec![Transfer::native(hunter, bounty)]);
    assert_eq!(ledger.balance(&hunter), bounty);
    assert_eq!(
        ledger.state.bidder(&sleeper).unwrap().remaining_bond,
        BOND - bounty
    );

    // The sleeper's leaderboard entry is intact despite the slashed bond.
    assert_eq!(ledger.params().winner, Some(sleeper));
    assert_eq!(ledger.params().win_bid, 120_000);

    // After losing (here: winning, so refund is blocked), accounting for a
    // loser path is covered below; verify total supply is unchanged.
    assert_eq!(ledger.total_native(), BOND);
}

/// The bounty residual stays with the bidder even when the split rounds down.
#[test]
fn test_bounty_residual_retained_by_bidder() {
    let mut ledger = Ledger::new();
    ledger.create(true, false);

    let quiet = bidder(6);
    let loud = bidder(7);
    let hunter = bidder(8);
    let bid_quiet = sealed(60_000);
    let bid_loud = sealed(90_000);

    ledger.round = 10;
    ledger.fund(quiet, BOND);
    ledger.fund(loud, BOND);
    ledger.commit(quiet, &bid_quiet).unwrap();
    ledger.commit(loud, &bid_loud).unwrap();

    ledger.round = 110;
    ledger.reveal(hunter, &bid_quiet).unwrap();
    ledger.reveal(loud, &bid_loud).unwrap();

    ledger.round = 125;
    ledger.settle(loud).unwrap();

    // The hunted bidder lost, so the residual 30% comes back on refund.
    ledger.refund(quiet).unwrap();
    assert_eq!(ledger.balance(&quiet), BOND - BOND * 70 / 100);
    assert_eq!(ledger.balance(&hunter), BOND * 70 / 100);
}

/// A single revealed bid clears at the reserve, not at zero.
#[test]
fn test_reserve_floors_clearing_price() {
    let mut ledger = Ledger::new();
    ledger.create(true, false);

    let solo = bidder(9);
    let bid = sealed(200_000);

    ledger.round = 10;
    ledger.fund(solo, BOND);
    ledger.commit(solo, &bid).unwrap();

    ledger.round = 105;
    ledger.reveal(solo, &bid).unwrap();

    ledger.round = 125;
    ledger.settle(solo).unwrap();

    // No runner-up, so the reserve is the floor.
    assert_eq!(ledger.params().expected_price(), RESERVE);

    ledger.fund_asset(solo, QUOTE, RESERVE);
    ledger.finalize(solo, RESERVE).unwrap();
    assert_eq!(ledger.asset_balance(&SELLER, QUOTE), RESERVE);
    assert_eq!(ledger.balance(&solo), BOND);
}

/// First-price mode charges the winner their own bid.
#[test]
fn test_first_price_charges_winning_bid() {
    let mut ledger = Ledger::new();
    ledger.create(false, false);

    let (a, b) = (bidder(10), bidder(11));
    let bid_a = sealed(300_000);
    let bid_b = sealed(150_000);

    ledger.round = 10;
    ledger.fund(a, BOND);
    ledger.fund(b, BOND);
    ledger.commit(a, &bid_a).unwrap();
    ledger.commit(b, &bid_b).unwrap();

    ledger.round = 105;
    ledger.reveal(a, &bid_a).unwrap();
    ledger.reveal(b, &bid_b).unwrap();

    ledger.round = 125;
    ledger.settle(a).unwrap();
    assert_eq!(ledger.params().expected_price(), 300_000);

    // Paying the second-price amount must be rejected in first-price mode.
    ledger.fund_asset(a, QUOTE, 300_000);
    assert_eq!(
        ledger.finalize(a, 150_000).unwrap_err(),
        AuctionError::PriceMismatch {
            expected: 300_000,
            got: 150_000
        }
    );
    ledger.finalize(a, 300_000).unwrap();
}

/// A winner who never pays is slashed and the runner-up takes over.
#[test]
fn test_promotion_after_pay_window_expiry() {
    let mut ledger = Ledger::new();
    ledger.create(true, false);

    let (ghost, runner) = (bidder(12), bidder(13));
    let bid_ghost = sealed(400_000);
    let bid_runner = sealed(220_000);

    ledger.round = 10;
    ledger.fund(ghost, BOND);
    ledger.fund(runner, BOND);
    ledger.commit(ghost, &bid_ghost).unwrap();
    ledger.commit(runner, &bid_runner).unwrap();

    ledger.round = 105;
    ledger.reveal(ghost, &bid_ghost).unwrap();
    ledger.reveal(runner, &bid_runner).unwrap();

    ledger.round = 125;
    ledger.settle(ghost).unwrap();

    // Promotion is blocked while the pay window is still open.
    ledger.round = 125 + PAY_WINDOW;
    assert!(ledger.promote(runner).is_err());

    // Past the deadline: slash the ghost's bond to the seller and promote.
    ledger.round = 125 + PAY_WINDOW + 1;
    let transfers = ledger.promote(runner).unwrap();
    assert_eq!(transfers, vec![Transfer::native(SELLER, BOND)]);
    assert_eq!(ledger.balance(&SELLER), BOND);

    let params = ledger.params();
    assert_eq!(params.winner, Some(runner));
    assert_eq!(params.win_bid, 220_000);
    assert_eq!(params.second_winner, None);
    assert_eq!(params.settle_round, 125 + PAY_WINDOW + 1);

    // The promoted winner gets a fresh pay window at the reserve-floored price.
    let price = params.expected_price();
    assert_eq!(price, RESERVE);
    ledger.round += 10;
    ledger.fund_asset(runner, QUOTE, price);
    ledger.finalize(runner, price).unwrap();
    assert_eq!(ledger.balance(&runner), BOND);

    // The slashed ghost cannot also claim a refund.
    assert_eq!(
        ledger.refund(ghost).unwrap_err(),
        AuctionError::AlreadyRefunded
    );
    assert_eq!(ledger.balance(&ESCROW), 0);
}

/// An unrevealed commitment forfeits its bond entirely.
#[test]
fn test_unrevealed_bidder_cannot_refund() {
    let mut ledger = Ledger::new();
    ledger.create(true, false);

    let (active, silent) = (bidder(14), bidder(15));
    let bid_active = sealed(130_000);
    let bid_silent = sealed(500_000);

    ledger.round = 10;
    ledger.fund(active, BOND);
    ledger.fund(silent, BOND);
    ledger.commit(active, &bid_active).unwrap();
    ledger.commit(silent, &bid_silent).unwrap();

    ledger.round = 105;
    ledger.reveal(active, &bid_active).unwrap();
    // The silent bidder never reveals; their higher bid never competes.

    ledger.round = 125;
    ledger.settle(active).unwrap();
    assert_eq!(ledger.params().winner, Some(active));

    assert_eq!(
        ledger.refund(silent).unwrap_err(),
        AuctionError::NotRevealed
    );
    // The forfeited bond stays in escrow.
    assert_eq!(ledger.balance(&ESCROW), 2 * BOND);
}

/// Attestations signed by the wrong key are rejected.
#[test]
fn test_forged_attestation_rejected() {
    let mut ledger = Ledger::new();
    ledger.create(true, false);

    let who = bidder(16);
    let bid = sealed(75_000);

    ledger.round = 10;
    ledger.fund(who, BOND);
    ledger.commit(who, &bid).unwrap();

    ledger.round = 105;
    let imposter = SigningKey::from_bytes(&[99u8; 32]);
    let msg = attestation_message(
        INSTANCE,
        HYBRID,
        105,
        &PARAM_HASH,
        COMMIT_END,
        COMMIT_END + UNLOCK_SLACK,
    );
    let forged = imposter.sign(&msg).to_bytes().to_vec();

    let ctx = ledger.ctx(who);
    let result = handlers::handle_reveal_for(
        &mut ledger.state,
        &ctx,
        bid.commitment_hash,
        bid.bid_value,
        &bid.salt,
        HYBRID,
        &forged,
    );
    assert_eq!(result.unwrap_err(), AuctionError::BadAttestation);
    assert!(!ledger.state.bidder(&who).unwrap().revealed);
}

/// KYC-gated auctions reject unverified commits until the seller approves.
#[test]
fn test_kyc_gate_enforced_during_commit() {
    let mut ledger = Ledger::new();
    ledger.create(true, true);

    let who = bidder(17);
    let bid = sealed(80_000);

    ledger.round = 10;
    ledger.fund(who, BOND);
    assert_eq!(
        ledger.commit(who, &bid).unwrap_err(),
        AuctionError::KycNotVerified
    );
    // The aborted grouped call returned the bond.
    assert_eq!(ledger.balance(&who), BOND);

    let ctx = ledger.ctx(SELLER);
    handlers::handle_set_kyc(&mut ledger.state, &ctx, who, true).unwrap();
    ledger.commit(who, &bid).unwrap();
}

/// Finalize is one-shot: the second payment attempt bounces atomically.
#[test]
fn test_double_finalize_blocked() {
    let mut ledger = Ledger::new();
    ledger.create(true, false);

    let who = bidder(18);
    let bid = sealed(90_000);

    ledger.round = 10;
    ledger.fund(who, BOND);
    ledger.commit(who, &bid).unwrap();

    ledger.round = 105;
    ledger.reveal(who, &bid).unwrap();

    ledger.round = 125;
    ledger.settle(who).unwrap();

    ledger.fund_asset(who, QUOTE, 2 * RESERVE);
    ledger.finalize(who, RESERVE).unwrap();
    assert_eq!(
        ledger.finalize(who, RESERVE).unwrap_err(),
        AuctionError::AlreadyFinalized
    );

    // The rejected second payment was returned in full.
    assert_eq!(ledger.asset_balance(&who, QUOTE), RESERVE);
    assert_eq!(ledger.asset_balance(&SELLER, QUOTE), RESERVE);
}

/// Every unit of bond is accounted for across a mixed-outcome auction.
#[test]
fn test_bond_conservation_across_lifecycle() {
    let mut ledger = Ledger::new();
    ledger.create(true, false);

    let (w, l, s) = (bidder(19), bidder(20), bidder(21));
    let hunter = bidder(22);
    let bid_w = sealed(500_000);
    let bid_l = sealed(200_000);
    let bid_s = sealed(300_000);

    ledger.round = 10;
    for who in [w, l, s] {
        ledger.fund(who, BOND);
    }
    ledger.commit(w, &bid_w).unwrap();
    ledger.commit(l, &bid_l).unwrap();
    ledger.commit(s, &bid_s).unwrap();
    let supply = ledger.total_native();

    ledger.round = 105;
    ledger.reveal(w, &bid_w).unwrap();
    // The loser is hunted; the straggler never reveals at all.
    ledger.reveal(hunter, &bid_l).unwrap();

    ledger.round = 125;
    ledger.settle(w).unwrap();

    let price = ledger.params().expected_price();
    assert_eq!(price, 200_000);
    ledger.fund_asset(w, QUOTE, price);
    ledger.finalize(w, price).unwrap();
    ledger.refund(l).unwrap();

    // Nothing minted, nothing burned.
    assert_eq!(ledger.total_native(), supply);
    // winner's full bond is back; hunted loser holds the 30% residual;
    // the straggler's bond is stranded in escrow.
    assert_eq!(ledger.balance(&w), BOND);
    assert_eq!(ledger.balance(&hunter), BOND * 70 / 100);
    assert_eq!(ledger.balance(&l), BOND - BOND * 70 / 100);
    assert_eq!(ledger.balance(&ESCROW), BOND);
}

/// Reveals at the window edges: last commit round is too early, first
/// settle round is too late.
#[test]
fn test_reveal_window_boundaries() {
    let mut ledger = Ledger::new();
    ledger.create(true, false);

    let who = bidder(23);
    let bid = sealed(110_000);

    ledger.round = 10;
    ledger.fund(who, BOND);
    ledger.commit(who, &bid).unwrap();

    // Round 99 is still the commit phase.
    ledger.round = COMMIT_END - 1;
    assert!(matches!(
        ledger.reveal(who, &bid).unwrap_err(),
        AuctionError::PhaseViolation(_)
    ));

    // Round 120 is already past the reveal window.
    ledger.round = COMMIT_END + UNLOCK_SLACK;
    assert!(matches!(
        ledger.reveal(who, &bid).unwrap_err(),
        AuctionError::PhaseViolation(_)
    ));

    // Round 100 is the first reveal round.
    ledger.round = COMMIT_END;
    ledger.reveal(who, &bid).unwrap();
}
