//! On-chain state structures for the auction module.

use std::collections::HashMap;

use timelock_types::{Address, AuctionParams, BidderRecord};

use crate::error::AuctionError;
use crate::genesis::InstanceConfig;

/// Auction module state.
///
/// One instance per auction. The host ledger persists this aggregate and
/// totally orders the calls against it; the module itself holds no locks and
/// caches nothing across calls.
#[derive(Debug, Clone)]
pub struct AuctionState {
    /// Application id bound into commitments and attestation messages
    pub instance_id: u64,

    /// Account that escrows bonds and settlement payments
    pub escrow_address: Address,

    /// Parameters and leaderboard, written once by `create`
    pub params: Option<AuctionParams>,

    /// Per-bidder participation records
    pub bidders: HashMap<Address, BidderRecord>,

    /// Commitment index: commitment hash -> bidder
    pub commitments: HashMap<[u8; 32], Address>,

    /// Seller-managed allowlist: bidder -> verified
    pub allowlist: HashMap<Address, bool>,
}

impl AuctionState {
    /// Create an empty state for a provisioned instance.
    pub fn new(config: &InstanceConfig) -> Self {
        Self {
            instance_id: config.instance_id,
            escrow_address: config.escrow_address,
            params: None,
            bidders: HashMap::new(),
            commitments: HashMap::new(),
            allowlist: HashMap::new(),
        }
    }

    /// Auction parameters, or `NotCreated` before `create` has run.
    pub fn params(&self) -> Result<&AuctionParams, AuctionError> {
        self.params.as_ref().ok_or(AuctionError::NotCreated)
    }

    /// Mutable auction parameters.
    pub fn params_mut(&mut self) -> Result<&mut AuctionParams, AuctionError> {
        self.params.as_mut().ok_or(AuctionError::NotCreated)
    }

    /// Get a bidder's record.
    pub fn bidder(&self, address: &Address) -> Option<&BidderRecord> {
        self.bidders.get(address)
    }

    /// Get a mutable bidder record.
    pub fn bidder_mut(&mut self, address: &Address) -> Option<&mut BidderRecord> {
        self.bidders.get_mut(address)
    }

    /// Register a commitment hash for a bidder.
    ///
    /// Create-if-absent semantics: a hash already present, including one
    /// registered by a different bidder, is rejected.
    pub fn insert_commitment(
        &mut self,
        hash: [u8; 32],
        bidder: Address,
    ) -> Result<(), AuctionError> {
        if self.commitments.contains_key(&hash) {
            return Err(AuctionError::DuplicateCommitment);
        }
        self.commitments.insert(hash, bidder);
        Ok(())
    }

    /// Look up the bidder who registered a commitment hash.
    pub fn commitment_owner(&self, hash: &[u8; 32]) -> Option<&Address> {
        self.commitments.get(hash)
    }

    /// Whether an address is marked verified on the allowlist.
    pub fn is_verified(&self, address: &Address) -> bool {
        self.allowlist.get(address).copied().unwrap_or(false)
    }

    /// Write an allowlist flag.
    pub fn set_verified(&mut self, address: Address, verified: bool) {
        self.allowlist.insert(address, verified);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_state() -> AuctionState {
        AuctionState::new(&InstanceConfig {
            instance_id: 42,
            escrow_address: [0xEE; 32],
        })
    }

    #[test]
    fn test_params_before_create() {
        let state = test_state();
        assert_eq!(state.params().unwrap_err(), AuctionError::NotCreated);
    }

    #[test]
    fn test_commitment_index_rejects_duplicates() {
        let mut state = test_state();
        let hash = [7u8; 32];

        assert!(state.insert_commitment(hash, [1u8; 32]).is_ok());
        assert_eq!(state.commitment_owner(&hash), Some(&[1u8; 32]));

        // Same hash from a different bidder is still a collision.
        assert_eq!(
            state.insert_commitment(hash, [2u8; 32]).unwrap_err(),
            AuctionError::DuplicateCommitment
        );
        assert_eq!(state.commitment_owner(&hash), Some(&[1u8; 32]));
    }

    #[test]
    fn test_allowlist_defaults_to_unverified() {
        let mut state = test_state();
        let addr = [3u8; 32];

        assert!(!state.is_verified(&addr));
        state.set_verified(addr, true);
        assert!(state.is_verified(&addr));
        state.set_verified(addr, false);
        assert!(!state.is_verified(&addr));
    }
}
