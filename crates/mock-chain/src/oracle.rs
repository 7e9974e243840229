//! Mock timing oracle.
//!
//! Signs the canonical attestation message for the chain's current round.
//! Only the mock environment generates signatures; the module itself never
//! does.

use ed25519_dalek::{Signer, SigningKey};

use timelock_types::{attestation_message, ATTESTATION_LEN};

/// A deterministic Ed25519 signer standing in for the timing oracle.
pub struct MockOracle {
    signing_key: SigningKey,
}

impl MockOracle {
    /// Build an oracle from a 32-byte seed.
    pub fn from_seed(seed: [u8; 32]) -> Self {
        Self {
            signing_key: SigningKey::from_bytes(&seed),
        }
    }

    /// The oracle's public key, as supplied to `create`.
    pub fn public_key(&self) -> [u8; 32] {
        self.signing_key.verifying_key().to_bytes()
    }

    /// Sign the canonical message binding `round` to the auction parameters.
    #[allow(clippy::too_many_arguments)]
    pub fn attest(
        &self,
        instance_id: u64,
        hybrid_param: &[u8],
        round: u64,
        param_hash: &[u8; 32],
        commit_end: u64,
        reveal_end: u64,
    ) -> [u8; ATTESTATION_LEN] {
        let msg = attestation_message(
            instance_id,
            hybrid_param,
            round,
            param_hash,
            commit_end,
            reveal_end,
        );
        self.signing_key.sign(&msg).to_bytes()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ed25519_dalek::{Signature, VerifyingKey};

    #[test]
    fn test_attestation_verifies_under_public_key() {
        let oracle = MockOracle::from_seed([7u8; 32]);
        let hash = [1u8; 32];
        let sig = oracle.attest(42, b"hy", 105, &hash, 100, 120);

        let msg = attestation_message(42, b"hy", 105, &hash, 100, 120);
        let key = VerifyingKey::from_bytes(&oracle.public_key()).unwrap();
        assert!(key
            .verify_strict(&msg, &Signature::from_bytes(&sig))
            .is_ok());
    }
}
