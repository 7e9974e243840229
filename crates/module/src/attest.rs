//! Oracle attestation verification.
//!
//! The timing oracle signs the canonical message described in
//! [`timelock_types::attestation_message`] with an Ed25519 key; the module
//! only verifies that signature, it never generates one.

use ed25519_dalek::{Signature, VerifyingKey};

use timelock_types::ATTESTATION_LEN;

use crate::error::AuctionError;

/// Verify a 64-byte Ed25519 attestation over `message` under the oracle key.
///
/// Any malformed input (wrong length, off-curve key, invalid signature) maps
/// to `BadAttestation`; callers cannot distinguish why the check failed.
pub fn verify_attestation(
    oracle_pubkey: &[u8; 32],
    message: &[u8],
    attestation: &[u8],
) -> Result<(), AuctionError> {
    let sig_bytes: [u8; ATTESTATION_LEN] = attestation
        .try_into()
        .map_err(|_| AuctionError::BadAttestation)?;
    let signature = Signature::from_bytes(&sig_bytes);

    let key = VerifyingKey::from_bytes(oracle_pubkey).map_err(|_| AuctionError::BadAttestation)?;

    key.verify_strict(message, &signature)
        .map_err(|_| AuctionError::BadAttestation)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ed25519_dalek::{Signer, SigningKey};

    fn oracle() -> SigningKey {
        SigningKey::from_bytes(&[41u8; 32])
    }

    #[test]
    fn test_valid_attestation() {
        let key = oracle();
        let msg = b"round attestation";
        let sig = key.sign(msg);

        let pubkey = key.verifying_key().to_bytes();
        assert!(verify_attestation(&pubkey, msg, &sig.to_bytes()).is_ok());
    }

    #[test]
    fn test_wrong_length_rejected() {
        let key = oracle();
        let pubkey = key.verifying_key().to_bytes();

        assert_eq!(
            verify_attestation(&pubkey, b"msg", &[0u8; 63]).unwrap_err(),
            AuctionError::BadAttestation
        );
        assert_eq!(
            verify_attestation(&pubkey, b"msg", &[0u8; 65]).unwrap_err(),
            AuctionError::BadAttestation
        );
    }

    #[test]
    fn test_tampered_message_rejected() {
        let key = oracle();
        let sig = key.sign(b"round 105");

        let pubkey = key.verifying_key().to_bytes();
        assert_eq!(
            verify_attestation(&pubkey, b"round 106", &sig.to_bytes()).unwrap_err(),
            AuctionError::BadAttestation
        );
    }

    #[test]
    fn test_wrong_key_rejected() {
        let key = oracle();
        let msg = b"round 105";
        let sig = key.sign(msg);

        let other = SigningKey::from_bytes(&[42u8; 32]);
        let pubkey = other.verifying_key().to_bytes();
        assert_eq!(
            verify_attestation(&pubkey, msg, &sig.to_bytes()).unwrap_err(),
            AuctionError::BadAttestation
        );
    }
}
