//! Core type definitions for the timelock sealed-bid auction.
//!
//! This crate provides the shared data structures used across the auction
//! system: the on-chain parameter and bidder records, the phase derivation,
//! fund-transfer descriptions, and the commitment-hash and attestation-message
//! algorithms that bind reveals to a specific auction instance and round.

use borsh::{BorshDeserialize, BorshSerialize};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

// =========================
// IDENTITIES & ASSETS
// =========================

/// Generic account address (32 bytes)
pub type Address = [u8; 32];

/// Fungible asset identifier on the host ledger.
#[derive(
    Copy, Clone, Debug, PartialEq, Eq, Hash, BorshSerialize, BorshDeserialize, Serialize, Deserialize,
)]
pub enum Asset {
    /// The ledger's native currency (bonds, bounties, refunds, slashes).
    Native,
    /// A ledger-managed fungible token, identified by its asset id.
    Token(u64),
}

/// A single fund movement, either attested by the environment as having been
/// grouped with a call (incoming) or emitted by a handler for the environment
/// to execute inside the same atomic unit (outgoing).
#[derive(Clone, Debug, PartialEq, Eq, BorshSerialize, BorshDeserialize, Serialize, Deserialize)]
pub struct Transfer {
    pub receiver: Address,
    pub amount: u64,
    pub asset: Asset,
}

impl Transfer {
    pub fn native(receiver: Address, amount: u64) -> Self {
        Self {
            receiver,
            amount,
            asset: Asset::Native,
        }
    }

    pub fn token(receiver: Address, amount: u64, asset_id: u64) -> Self {
        Self {
            receiver,
            amount,
            asset: Asset::Token(asset_id),
        }
    }
}

// =========================
// LIFECYCLE PHASE
// =========================

/// Auction lifecycle phase, derived fresh from the round clock and the
/// settlement flags on every call. Never cached across calls.
#[derive(
    Copy, Clone, Debug, PartialEq, Eq, BorshSerialize, BorshDeserialize, Serialize, Deserialize,
)]
pub enum Phase {
    /// Before `commit_end`: accepting commitments.
    Commit,
    /// `[commit_end, commit_end + unlock_slack)`: accepting reveals.
    Reveal,
    /// Reveal window closed, `settle` not yet called.
    SettlePending,
    /// Settled, within the winner's payment window.
    PayWindow,
    /// Settled, payment window elapsed.
    Expired,
}

// =========================
// AUCTION STATE RECORDS
// =========================

/// Auction configuration and running leaderboard.
///
/// Created once by `create`; the configuration half is immutable afterwards,
/// the leaderboard half is mutated by reveals, settlement, and promotion.
#[derive(Clone, Debug, PartialEq, Eq, BorshSerialize, BorshDeserialize, Serialize, Deserialize)]
pub struct AuctionParams {
    // Configuration (immutable after create)
    pub seller: Address,
    pub quote_asset: u64,
    pub reserve: u64,
    pub min_bid: u64,
    pub bond: u64,
    /// Clearing rule: winner pays max(second_bid, reserve) when true,
    /// max(win_bid, reserve) when false.
    pub second_price: bool,
    /// Gate `commit` on the seller-managed allowlist.
    pub kyc_required: bool,
    pub commit_end: u64,
    pub unlock_slack: u64,
    pub pay_window: u64,
    pub oracle_pubkey: [u8; 32],
    pub param_hash: [u8; 32],

    // Leaderboard (mutable)
    pub winner: Option<Address>,
    pub second_winner: Option<Address>,
    pub win_bid: u64,
    pub second_bid: u64,
    pub settled: bool,
    pub finalized: bool,
    pub settle_round: u64,
}

impl AuctionParams {
    /// End of the reveal window: `commit_end + unlock_slack`.
    pub fn reveal_end(&self) -> u64 {
        self.commit_end.saturating_add(self.unlock_slack)
    }

    /// Last round at which the recorded winner may still finalize.
    pub fn pay_deadline(&self) -> u64 {
        self.settle_round.saturating_add(self.pay_window)
    }

    /// Derive the lifecycle phase for the given round.
    pub fn phase(&self, round: u64) -> Phase {
        if !self.settled {
            if round < self.commit_end {
                Phase::Commit
            } else if round < self.reveal_end() {
                Phase::Reveal
            } else {
                Phase::SettlePending
            }
        } else if round <= self.pay_deadline() {
            Phase::PayWindow
        } else {
            Phase::Expired
        }
    }

    /// Clearing price the winner must pay at finalize time.
    pub fn expected_price(&self) -> u64 {
        if self.second_price {
            self.second_bid.max(self.reserve)
        } else {
            self.win_bid.max(self.reserve)
        }
    }
}

/// Per-bidder participation record, created on first `commit`.
///
/// The commitment material is immutable after commit; the flags each flip
/// false-to-true at most once, and `remaining_bond` only ever decreases.
#[derive(Clone, Debug, PartialEq, Eq, BorshSerialize, BorshDeserialize, Serialize, Deserialize)]
pub struct BidderRecord {
    pub commitment_hash: [u8; 32],
    pub content_ref: Vec<u8>,
    pub privacy_key: [u8; 32],
    pub bonded: bool,
    pub revealed: bool,
    pub refunded: bool,
    pub bid: u64,
    pub remaining_bond: u64,
}

impl BidderRecord {
    /// Fresh record for a bidder who just posted `bond`.
    pub fn new(
        commitment_hash: [u8; 32],
        content_ref: Vec<u8>,
        privacy_key: [u8; 32],
        bond: u64,
    ) -> Self {
        Self {
            commitment_hash,
            content_ref,
            privacy_key,
            bonded: true,
            revealed: false,
            refunded: false,
            bid: 0,
            remaining_bond: bond,
        }
    }
}

// =========================
// COMMITMENT & ATTESTATION
// =========================

/// Version tag prefixing every attestation message.
pub const ATTESTATION_TAG: &[u8] = b"v:1";

/// Required length of an oracle attestation signature.
pub const ATTESTATION_LEN: usize = 64;

/// Compute the sealed-bid commitment hash:
/// `SHA256(be8(bid) || salt || privacy_key || be8(instance_id))`.
///
/// Binding the instance id prevents replaying a commitment into a different
/// auction.
pub fn compute_commitment(
    bid: u64,
    salt: &[u8],
    privacy_key: &[u8; 32],
    instance_id: u64,
) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(bid.to_be_bytes());
    hasher.update(salt);
    hasher.update(privacy_key);
    hasher.update(instance_id.to_be_bytes());
    hasher.finalize().into()
}

/// Reconstruct the canonical message the timing oracle signs:
/// `"v:1" || be8(instance_id) || hybrid_param || be8(round) || param_hash
///  || be8(commit_end) || be8(reveal_end)`.
///
/// Every reveal is thereby bound to one round of one auction instance and to
/// the immutable parameter hash, so an attestation can never be replayed
/// across rounds or across auctions.
pub fn attestation_message(
    instance_id: u64,
    hybrid_param: &[u8],
    round: u64,
    param_hash: &[u8; 32],
    commit_end: u64,
    reveal_end: u64,
) -> Vec<u8> {
    let mut msg = Vec::with_capacity(ATTESTATION_TAG.len() + hybrid_param.len() + 64);
    msg.extend_from_slice(ATTESTATION_TAG);
    msg.extend_from_slice(&instance_id.to_be_bytes());
    msg.extend_from_slice(hybrid_param);
    msg.extend_from_slice(&round.to_be_bytes());
    msg.extend_from_slice(param_hash);
    msg.extend_from_slice(&commit_end.to_be_bytes());
    msg.extend_from_slice(&reveal_end.to_be_bytes());
    msg
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(settled: bool, settle_round: u64) -> AuctionParams {
        AuctionParams {
            seller: [1u8; 32],
            quote_asset: 7,
            reserve: 50,
            min_bid: 10,
            bond: 1_000_000,
            second_price: true,
            kyc_required: false,
            commit_end: 100,
            unlock_slack: 20,
            pay_window: 30,
            oracle_pubkey: [0u8; 32],
            param_hash: [0u8; 32],
            winner: None,
            second_winner: None,
            win_bid: 0,
            second_bid: 0,
            settled,
            finalized: false,
            settle_round,
        }
    }

    #[test]
    fn test_phase_windows() {
        let p = params(false, 0);
        assert_eq!(p.phase(0), Phase::Commit);
        assert_eq!(p.phase(99), Phase::Commit);
        // Reveal phase admits the commit_end instant.
        assert_eq!(p.phase(100), Phase::Reveal);
        assert_eq!(p.phase(119), Phase::Reveal);
        // ...but not the reveal_end instant.
        assert_eq!(p.phase(120), Phase::SettlePending);

        let p = params(true, 120);
        assert_eq!(p.phase(120), Phase::PayWindow);
        assert_eq!(p.phase(150), Phase::PayWindow);
        assert_eq!(p.phase(151), Phase::Expired);
    }

    #[test]
    fn test_expected_price_second_price() {
        let mut p = params(true, 120);
        p.win_bid = 200;
        p.second_bid = 120;
        assert_eq!(p.expected_price(), 120);

        // Reserve floors the clearing price.
        p.second_bid = 30;
        assert_eq!(p.expected_price(), 50);
    }

    #[test]
    fn test_expected_price_first_price() {
        let mut p = params(true, 120);
        p.second_price = false;
        p.win_bid = 200;
        p.second_bid = 120;
        assert_eq!(p.expected_price(), 200);
    }

    #[test]
    fn test_commitment_is_deterministic() {
        let key = [9u8; 32];
        let a = compute_commitment(500, b"salt", &key, 42);
        let b = compute_commitment(500, b"salt", &key, 42);
        assert_eq!(a, b);
    }

    #[test]
    fn test_commitment_binds_every_input() {
        let key = [9u8; 32];
        let base = compute_commitment(500, b"salt", &key, 42);

        assert_ne!(base, compute_commitment(501, b"salt", &key, 42));
        assert_ne!(base, compute_commitment(500, b"galt", &key, 42));
        assert_ne!(base, compute_commitment(500, b"salt", &[8u8; 32], 42));
        assert_ne!(base, compute_commitment(500, b"salt", &key, 43));
    }

    #[test]
    fn test_attestation_message_layout() {
        let hash = [3u8; 32];
        let msg = attestation_message(1, b"hy", 105, &hash, 100, 120);

        assert_eq!(&msg[..3], b"v:1");
        assert_eq!(&msg[3..11], &1u64.to_be_bytes());
        assert_eq!(&msg[11..13], b"hy");
        assert_eq!(&msg[13..21], &105u64.to_be_bytes());
        assert_eq!(&msg[21..53], &hash);
        assert_eq!(&msg[53..61], &100u64.to_be_bytes());
        assert_eq!(&msg[61..69], &120u64.to_be_bytes());
        assert_eq!(msg.len(), 69);
    }

    #[test]
    fn test_record_roundtrip_borsh() {
        let record = BidderRecord::new([5u8; 32], b"cid".to_vec(), [6u8; 32], 1_000);
        let encoded = borsh::to_vec(&record).unwrap();
        let decoded: BidderRecord = borsh::from_slice(&encoded).unwrap();
        assert_eq!(record, decoded);
    }
}
