//! Call message types for the auction module.

use borsh::{BorshDeserialize, BorshSerialize};

use timelock_types::Address;

/// Parameters supplied to `Create`.
#[derive(Clone, Debug, BorshSerialize, BorshDeserialize)]
pub struct CreateParams {
    /// Asset id of the token being sold.
    pub quote_asset: u64,
    /// Minimum acceptable clearing price.
    pub reserve: u64,
    /// Minimum bid amount accepted at reveal.
    pub min_bid: u64,
    /// Collateral required to commit.
    pub bond: u64,
    /// Second-price clearing when true, first-price when false.
    pub second_price: bool,
    /// Require allowlist verification before commit.
    pub kyc_required: bool,
    /// Round at which the commit window closes.
    pub commit_end: u64,
    /// Extra rounds after `commit_end` during which reveals are accepted.
    pub unlock_slack: u64,
    /// Rounds the winner has to finalize after settlement.
    pub pay_window: u64,
    /// Timing oracle's Ed25519 public key.
    pub oracle_pubkey: [u8; 32],
    /// Hash of the auction parameters, bound into attestations.
    pub param_hash: [u8; 32],
}

/// Call messages for the auction module.
#[derive(Clone, Debug, BorshSerialize, BorshDeserialize)]
pub enum AuctionCall {
    // === Lifecycle ===
    /// Initialize the auction (creator only, exactly once).
    Create(CreateParams),

    /// Register a sealed-bid commitment. The bond payment travels in the
    /// same grouped operation.
    Commit {
        commitment_hash: [u8; 32],
        content_ref: Vec<u8>,
        privacy_key: [u8; 32],
    },

    /// Reveal a committed bid, by the bidder or a third party, with an
    /// oracle attestation for the current round.
    RevealFor {
        commit_id: [u8; 32],
        bid: u64,
        salt: Vec<u8>,
        hybrid_param: Vec<u8>,
        attestation: Vec<u8>,
    },

    /// Close the reveal window and record the settlement round (anyone).
    Settle,

    /// Winner pays the clearing price; the payment travels in the same
    /// grouped operation.
    FinalizeWin { price: u64 },

    /// Slash a winner who missed the pay window and promote the runner-up
    /// (anyone).
    PromoteNext,

    /// Recover a revealed non-winner's remaining bond.
    ClaimRefund,

    // === Admin ===
    /// Set allowlist status for a bidder (seller only, commit phase only).
    SetKyc { address: Address, verified: bool },

    /// Upgrade hook; authenticates the seller, changes no auction state.
    Update,

    /// Teardown hook; authenticates the seller, changes no auction state.
    Delete,
}
