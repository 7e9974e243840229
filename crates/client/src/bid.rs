//! Sealed bid construction.

use rand::{CryptoRng, RngCore};
use thiserror::Error;

use timelock_types::compute_commitment;

/// Errors that can occur during bid preparation.
#[derive(Debug, Error)]
pub enum BidError {
    #[error("Bid must be non-zero")]
    ZeroBid,
}

/// A prepared sealed bid ready for commit.
///
/// The `commitment_hash` and `privacy_key` go on-chain at commit time; the
/// salt and bid value must remain secret until reveal.
#[derive(Debug, Clone)]
pub struct SealedBid {
    /// Commitment hash submitted with `commit`
    pub commitment_hash: [u8; 32],
    /// Random salt (keep secret until reveal)
    pub salt: [u8; 32],
    /// Privacy key stored with the commitment
    pub privacy_key: [u8; 32],
    /// Original bid value (keep secret until reveal)
    pub bid_value: u64,
}

/// Seal a bid for an auction instance.
///
/// # Arguments
/// * `bid_value` - The bid amount
/// * `instance_id` - Application id of the auction, bound into the hash
/// * `rng` - Cryptographically secure random number generator
///
/// # Returns
/// The sealed bid with its secret salt and privacy key.
pub fn seal_bid<R: RngCore + CryptoRng>(
    bid_value: u64,
    instance_id: u64,
    rng: &mut R,
) -> Result<SealedBid, BidError> {
    if bid_value == 0 {
        return Err(BidError::ZeroBid);
    }

    let mut salt = [0u8; 32];
    rng.fill_bytes(&mut salt);
    let mut privacy_key = [0u8; 32];
    rng.fill_bytes(&mut privacy_key);

    let commitment_hash = compute_commitment(bid_value, &salt, &privacy_key, instance_id);

    Ok(SealedBid {
        commitment_hash,
        salt,
        privacy_key,
        bid_value,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::OsRng;

    #[test]
    fn test_seal_bid_matches_commitment() {
        let sealed = seal_bid(1_000, 42, &mut OsRng).unwrap();
        let recomputed =
            compute_commitment(sealed.bid_value, &sealed.salt, &sealed.privacy_key, 42);
        assert_eq!(sealed.commitment_hash, recomputed);
    }

    #[test]
    fn test_seal_bid_unique_per_call() {
        let a = seal_bid(1_000, 42, &mut OsRng).unwrap();
        let b = seal_bid(1_000, 42, &mut OsRng).unwrap();
        // Fresh salt and key each time, so equal bids stay unlinkable.
        assert_ne!(a.commitment_hash, b.commitment_hash);
    }

    #[test]
    fn test_seal_bid_rejects_zero() {
        assert!(matches!(seal_bid(0, 42, &mut OsRng), Err(BidError::ZeroBid)));
    }

    #[test]
    fn test_mutated_reveal_breaks_commitment() {
        let sealed = seal_bid(1_000, 42, &mut OsRng).unwrap();

        let mut wrong_salt = sealed.salt;
        wrong_salt[0] ^= 1;
        assert_ne!(
            sealed.commitment_hash,
            compute_commitment(sealed.bid_value, &wrong_salt, &sealed.privacy_key, 42)
        );
        assert_ne!(
            sealed.commitment_hash,
            compute_commitment(sealed.bid_value + 1, &sealed.salt, &sealed.privacy_key, 42)
        );
        assert_ne!(
            sealed.commitment_hash,
            compute_commitment(sealed.bid_value, &sealed.salt, &sealed.privacy_key, 43)
        );
    }
}
