//! Instance configuration for the auction module.
//!
//! Provisioning creates the instance, funds its operating balance, and
//! supplies this configuration before `create` is invoked.

use serde::{Deserialize, Serialize};

use timelock_types::Address;

/// Per-instance configuration supplied by the deployment tooling.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct InstanceConfig {
    /// Application id of this auction instance.
    ///
    /// Bound into every commitment hash and attestation message, so
    /// commitments and reveals cannot be replayed across instances.
    pub instance_id: u64,

    /// Account holding bonds and settlement payments in escrow.
    pub escrow_address: Address,
}

impl InstanceConfig {
    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), InstanceValidationError> {
        if self.instance_id == 0 {
            return Err(InstanceValidationError::InvalidInstanceId);
        }
        if self.escrow_address == [0u8; 32] {
            return Err(InstanceValidationError::InvalidEscrowAddress);
        }
        Ok(())
    }
}

/// Errors that can occur during instance validation.
#[derive(Debug, Clone, thiserror::Error)]
pub enum InstanceValidationError {
    #[error("Instance id cannot be zero")]
    InvalidInstanceId,

    #[error("Escrow address cannot be the zero address")]
    InvalidEscrowAddress,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_config() {
        let config = InstanceConfig {
            instance_id: 1,
            escrow_address: [0xEE; 32],
        };
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_zero_instance_id() {
        let config = InstanceConfig {
            instance_id: 0,
            escrow_address: [0xEE; 32],
        };
        assert!(matches!(
            config.validate(),
            Err(InstanceValidationError::InvalidInstanceId)
        ));
    }

    #[test]
    fn test_zero_escrow_address() {
        let config = InstanceConfig {
            instance_id: 1,
            escrow_address: [0u8; 32],
        };
        assert!(matches!(
            config.validate(),
            Err(InstanceValidationError::InvalidEscrowAddress)
        ));
    }
}
