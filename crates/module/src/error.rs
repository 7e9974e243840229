//! Auction module error types.

use thiserror::Error;

use timelock_types::Phase;

/// Errors that can occur in the auction module.
///
/// Every error aborts the whole operation, including any fund transfer
/// grouped with it; a failed call leaves the auction in its prior state.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuctionError {
    #[error("Operation not valid in phase {0:?}")]
    PhaseViolation(Phase),

    #[error("Commit deadline must be in the future")]
    InvalidSchedule,

    #[error("Auction already created")]
    AlreadyCreated,

    #[error("Auction not created")]
    NotCreated,

    #[error("Sender already holds a bonded commitment")]
    AlreadyCommitted,

    #[error("Commitment hash already registered")]
    DuplicateCommitment,

    #[error("Bid already revealed")]
    AlreadyRevealed,

    #[error("Auction already settled")]
    AlreadySettled,

    #[error("Auction already finalized")]
    AlreadyFinalized,

    #[error("Refund already claimed")]
    AlreadyRefunded,

    #[error("Invalid oracle attestation")]
    BadAttestation,

    #[error("Unknown commitment")]
    UnknownCommitment,

    #[error("Revealed bid does not match commitment")]
    CommitmentMismatch,

    #[error("Bid below minimum: need {min}, got {got}")]
    BidBelowMinimum { min: u64, got: u64 },

    #[error("Wrong settlement price: expected {expected}, got {got}")]
    PriceMismatch { expected: u64, got: u64 },

    #[error("Required payment missing or mismatched")]
    PaymentMismatch,

    #[error("No fallback bidder to promote")]
    NoFallbackBidder,

    #[error("Sender is not the recorded winner")]
    NotWinner,

    #[error("Sender is not the seller")]
    NotSeller,

    #[error("Sender has not revealed a bid")]
    NotRevealed,

    #[error("The recorded winner cannot claim a refund")]
    WinnerCannotRefund,

    #[error("Sender is not on the allowlist")]
    KycNotVerified,
}
