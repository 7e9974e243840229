//! Bidder-side SDK for the timelock auction.
//!
//! Builds the secret material a bidder needs to participate: a random salt,
//! a random privacy key, and the commitment hash derived from them. The salt
//! and privacy key must stay secret until reveal time.

pub mod bid;

pub use bid::{seal_bid, BidError, SealedBid};
