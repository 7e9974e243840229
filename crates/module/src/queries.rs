//! Query handlers for the auction module.
//!
//! These functions provide read-only access for the reporting surface; none
//! of them mutate state or move funds.

use serde::{Deserialize, Serialize};

use timelock_types::{Address, AuctionParams, BidderRecord, Phase};

use crate::state::AuctionState;

/// Query request types.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub enum AuctionQuery {
    /// Get the auction parameters and leaderboard.
    GetParams,

    /// Derive the lifecycle phase at the given round.
    GetPhase { round: u64 },

    /// Get the current leaderboard snapshot.
    GetLeaderboard,

    /// Get a bidder's participation record.
    GetBidder { address: Address },

    /// Look up who registered a commitment hash.
    GetCommitmentOwner { commitment_hash: [u8; 32] },

    /// Check a bidder's allowlist status.
    GetKycStatus { address: Address },

    /// Get the static instance configuration.
    GetInstance,
}

/// Query response types.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub enum AuctionQueryResponse {
    Params(Option<AuctionParams>),
    Phase(Option<Phase>),
    Leaderboard(Option<LeaderboardView>),
    Bidder(Option<BidderRecord>),
    CommitmentOwner(Option<Address>),
    KycStatus(bool),
    Instance {
        instance_id: u64,
        escrow_address: Address,
    },
}

/// Snapshot of the running leaderboard and settlement flags.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct LeaderboardView {
    pub winner: Option<Address>,
    pub win_bid: u64,
    pub second_winner: Option<Address>,
    pub second_bid: u64,
    pub settled: bool,
    pub finalized: bool,
    pub settle_round: u64,
}

impl LeaderboardView {
    fn from_params(params: &AuctionParams) -> Self {
        Self {
            winner: params.winner,
            win_bid: params.win_bid,
            second_winner: params.second_winner,
            second_bid: params.second_bid,
            settled: params.settled,
            finalized: params.finalized,
            settle_round: params.settle_round,
        }
    }
}

/// Handle a query.
pub fn handle_query(state: &AuctionState, query: AuctionQuery) -> AuctionQueryResponse {
    match query {
        AuctionQuery::GetParams => AuctionQueryResponse::Params(state.params.clone()),

        AuctionQuery::GetPhase { round } => {
            AuctionQueryResponse::Phase(state.params.as_ref().map(|p| p.phase(round)))
        }

        AuctionQuery::GetLeaderboard => AuctionQueryResponse::Leaderboard(
            state.params.as_ref().map(LeaderboardView::from_params),
        ),

        AuctionQuery::GetBidder { address } => {
            AuctionQueryResponse::Bidder(state.bidder(&address).cloned())
        }

        AuctionQuery::GetCommitmentOwner { commitment_hash } => {
            AuctionQueryResponse::CommitmentOwner(state.commitment_owner(&commitment_hash).copied())
        }

        AuctionQuery::GetKycStatus { address } => {
            AuctionQueryResponse::KycStatus(state.is_verified(&address))
        }

        AuctionQuery::GetInstance => AuctionQueryResponse::Instance {
            instance_id: state.instance_id,
            escrow_address: state.escrow_address,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::genesis::InstanceConfig;

    fn empty_state() -> AuctionState {
        AuctionState::new(&InstanceConfig {
            instance_id: 42,
            escrow_address: [0xEE; 32],
        })
    }

    #[test]
    fn test_params_query_before_create() {
        let state = empty_state();
        let response = handle_query(&state, AuctionQuery::GetParams);
        assert!(matches!(response, AuctionQueryResponse::Params(None)));
    }

    #[test]
    fn test_phase_query_before_create() {
        let state = empty_state();
        let response = handle_query(&state, AuctionQuery::GetPhase { round: 0 });
        assert!(matches!(response, AuctionQueryResponse::Phase(None)));
    }

    #[test]
    fn test_instance_query() {
        let state = empty_state();
        let response = handle_query(&state, AuctionQuery::GetInstance);
        match response {
            AuctionQueryResponse::Instance {
                instance_id,
                escrow_address,
            } => {
                assert_eq!(instance_id, 42);
                assert_eq!(escrow_address, [0xEE; 32]);
            }
            other => panic!("unexpected response: {other:?}"),
        }
    }

    #[test]
    fn test_kyc_query_defaults_false() {
        let state = empty_state();
        let response = handle_query(
            &state,
            AuctionQuery::GetKycStatus {
                address: [1u8; 32],
            },
        );
        assert!(matches!(response, AuctionQueryResponse::KycStatus(false)));
    }
}
