//! RPC-compatible types for the mock chain.
//!
//! These are JSON-serializable, hex-encoded versions of the core auction
//! types, plus the parsing helpers the server uses.

use jsonrpsee::types::ErrorObjectOwned;
use serde::{Deserialize, Serialize};

use timelock_types::{Address, Asset, BidderRecord, Phase, Transfer};

/// Round clock info.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoundInfo {
    pub round: u64,
}

/// Parameters for creating the auction.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateAuctionRpc {
    /// Hex-encoded seller address (32 bytes)
    pub sender: String,
    pub quote_asset: u64,
    pub reserve: u64,
    pub min_bid: u64,
    pub bond: u64,
    pub second_price: bool,
    pub kyc_required: bool,
    pub commit_end: u64,
    pub unlock_slack: u64,
    pub pay_window: u64,
    /// Hex-encoded oracle public key (32 bytes); omit to use the mock oracle
    pub oracle_pubkey: Option<String>,
    /// Hex-encoded parameter hash (32 bytes)
    pub param_hash: String,
}

/// Parameters for committing a sealed bid.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommitRpc {
    pub sender: String,
    /// Hex-encoded commitment hash (32 bytes)
    pub commitment_hash: String,
    /// Hex-encoded content reference
    pub content_ref: String,
    /// Hex-encoded privacy key (32 bytes)
    pub privacy_key: String,
}

/// Parameters for revealing a committed bid.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RevealRpc {
    pub sender: String,
    /// Hex-encoded commitment hash (32 bytes)
    pub commit_id: String,
    pub bid: u64,
    /// Hex-encoded salt
    pub salt: String,
    /// Hex-encoded hybrid parameter
    pub hybrid_param: String,
    /// Hex-encoded attestation signature (64 bytes)
    pub attestation: String,
}

/// An attestation produced by the mock oracle.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AttestationRpc {
    /// Round the attestation is bound to
    pub round: u64,
    /// Hex-encoded signature (64 bytes)
    pub signature: String,
}

/// A fund movement executed by the chain.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransferRpc {
    /// Hex-encoded receiver address
    pub receiver: String,
    pub amount: u64,
    /// `None` for the native currency, `Some(id)` for a token
    pub asset: Option<u64>,
}

impl From<&Transfer> for TransferRpc {
    fn from(t: &Transfer) -> Self {
        Self {
            receiver: hex::encode(t.receiver),
            amount: t.amount,
            asset: match t.asset {
                Asset::Native => None,
                Asset::Token(id) => Some(id),
            },
        }
    }
}

/// Leaderboard snapshot for RPC.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LeaderboardRpc {
    pub winner: Option<String>,
    pub win_bid: u64,
    pub second_winner: Option<String>,
    pub second_bid: u64,
    pub settled: bool,
    pub finalized: bool,
    pub settle_round: u64,
    pub phase: Phase,
}

/// Bidder record for RPC.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BidderRpc {
    pub commitment_hash: String,
    pub content_ref: String,
    pub bonded: bool,
    pub revealed: bool,
    pub refunded: bool,
    pub bid: u64,
    pub remaining_bond: u64,
}

impl From<&BidderRecord> for BidderRpc {
    fn from(r: &BidderRecord) -> Self {
        Self {
            commitment_hash: hex::encode(r.commitment_hash),
            content_ref: hex::encode(&r.content_ref),
            bonded: r.bonded,
            revealed: r.revealed,
            refunded: r.refunded,
            bid: r.bid,
            remaining_bond: r.remaining_bond,
        }
    }
}

pub fn rpc_error(msg: impl std::fmt::Display) -> ErrorObjectOwned {
    ErrorObjectOwned::owned(-32000, msg.to_string(), None::<()>)
}

/// Decode a hex string into a 32-byte value (address, hash, key).
pub fn parse_bytes32(hex_str: &str) -> Result<[u8; 32], ErrorObjectOwned> {
    let bytes = hex::decode(hex_str).map_err(|e| rpc_error(format!("invalid hex: {e}")))?;
    bytes
        .try_into()
        .map_err(|_| rpc_error("expected 32 bytes"))
}

/// Decode a hex string into an address.
pub fn parse_address(hex_str: &str) -> Result<Address, ErrorObjectOwned> {
    parse_bytes32(hex_str)
}

/// Decode a hex string of arbitrary length.
pub fn parse_bytes(hex_str: &str) -> Result<Vec<u8>, ErrorObjectOwned> {
    hex::decode(hex_str).map_err(|e| rpc_error(format!("invalid hex: {e}")))
}
