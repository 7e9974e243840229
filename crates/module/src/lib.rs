//! Sealed-bid second-price auction module with oracle-attested timing.
//!
//! This module implements the on-ledger logic for timelock auctions:
//!
//! - Commitment submission with refundable bonds during the commit window
//! - Oracle-attested reveals with third-party bounty incentives
//! - Second-price (or first-price) settlement against a reserve
//! - Winner payment with a bounded pay window and fallback promotion
//! - Bond refund, bounty, and slash accounting
//!
//! # Architecture
//!
//! The module follows the usual chain-module layout:
//! - `call`: Message types for state-changing operations
//! - `handlers`: Business logic for processing calls
//! - `queries`: Read-only state access
//! - `state`: On-chain state structures
//! - `genesis`: Instance configuration
//! - `attest`: Oracle attestation verification
//! - `error`: Error types
//!
//! # Example
//!
//! ```ignore
//! use timelock_module::{handlers, state::AuctionState, CallContext};
//!
//! let mut state = AuctionState::new(config);
//! let ctx = CallContext { sender, round, paired_transfer: None };
//!
//! // Initialize the auction
//! handlers::handle_create(&mut state, &ctx, params)?;
//!
//! // Commit a sealed bid (bond attached by the environment)
//! handlers::handle_commit(&mut state, &ctx, hash, content_ref, privacy_key)?;
//! ```

pub mod attest;
pub mod call;
pub mod error;
pub mod genesis;
pub mod handlers;
pub mod queries;
pub mod state;

pub use call::{AuctionCall, CreateParams};
pub use error::AuctionError;
pub use genesis::InstanceConfig;
pub use handlers::{CallContext, HandlerResult};
pub use queries::{AuctionQuery, AuctionQueryResponse};
pub use state::AuctionState;
