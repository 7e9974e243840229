//! Mock chain server for local testing of the timelock auction.
//!
//! This provides a JSON-RPC server that simulates the host ledger for the
//! auction module without requiring a real blockchain: a round clock, native
//! and token balances, grouped transfer-plus-call execution with rollback,
//! and a mock timing oracle.

use anyhow::Result;
use jsonrpsee::core::async_trait;
use jsonrpsee::proc_macros::rpc;
use jsonrpsee::server::Server;
use jsonrpsee::types::ErrorObjectOwned;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::{error, info};

use timelock_module::{
    handlers, queries, AuctionQuery, AuctionQueryResponse, AuctionState, CallContext,
    CreateParams, InstanceConfig,
};
use timelock_types::{Address, Asset, Phase, Transfer};

mod oracle;
mod types;

use oracle::MockOracle;
use types::*;

const ORACLE_SEED: [u8; 32] = [7u8; 32];

/// Shared chain state.
struct ChainState {
    /// Module state
    module: AuctionState,
    /// Current round (simulated, can be advanced)
    round: u64,
    /// Native currency balances
    native: HashMap<Address, u64>,
    /// Token balances keyed by (asset id, holder)
    assets: HashMap<(u64, Address), u64>,
    /// Mock timing oracle
    oracle: MockOracle,
}

impl ChainState {
    fn new(config: &InstanceConfig) -> Self {
        Self {
            module: AuctionState::new(config),
            round: 0,
            native: HashMap::new(),
            assets: HashMap::new(),
            oracle: MockOracle::from_seed(ORACLE_SEED),
        }
    }

    fn credit_native(&mut self, address: Address, amount: u64) {
        *self.native.entry(address).or_insert(0) += amount;
    }

    fn debit_native(&mut self, address: &Address, amount: u64) -> bool {
        match self.native.get_mut(address) {
            Some(balance) if *balance >= amount => {
                *balance -= amount;
                true
            }
            _ => false,
        }
    }

    fn credit_asset(&mut self, asset_id: u64, address: Address, amount: u64) {
        *self.assets.entry((asset_id, address)).or_insert(0) += amount;
    }

    fn debit_asset(&mut self, asset_id: u64, address: &Address, amount: u64) -> bool {
        match self.assets.get_mut(&(asset_id, *address)) {
            Some(balance) if *balance >= amount => {
                *balance -= amount;
                true
            }
            _ => false,
        }
    }

    /// Execute handler-emitted transfers out of the escrow account.
    ///
    /// Escrow conservation guarantees funding; a shortfall here means the
    /// module's accounting is broken, so it is logged loudly.
    fn apply_transfers(&mut self, transfers: &[Transfer]) {
        let escrow = self.module.escrow_address;
        for t in transfers {
            let ok = match t.asset {
                Asset::Native => {
                    self.debit_native(&escrow, t.amount) && {
                        self.credit_native(t.receiver, t.amount);
                        true
                    }
                }
                Asset::Token(id) => {
                    self.debit_asset(id, &escrow, t.amount) && {
                        self.credit_asset(id, t.receiver, t.amount);
                        true
                    }
                }
            };
            if !ok {
                error!(amount = t.amount, "escrow underfunded; transfer dropped");
            }
        }
    }
}

/// RPC API definition for the mock chain.
#[rpc(server)]
pub trait MockChainApi {
    // ============ Admin Methods ============

    /// Advance the round clock by `count` rounds.
    #[method(name = "admin_advanceRound")]
    async fn admin_advance_round(&self, count: u64) -> Result<RoundInfo, ErrorObjectOwned>;

    /// Set the round clock (for testing time-dependent logic).
    #[method(name = "admin_setRound")]
    async fn admin_set_round(&self, round: u64) -> Result<RoundInfo, ErrorObjectOwned>;

    /// Credit native currency to an account.
    #[method(name = "admin_fund")]
    async fn admin_fund(&self, address: String, amount: u64) -> Result<u64, ErrorObjectOwned>;

    /// Credit a token balance to an account.
    #[method(name = "admin_fundAsset")]
    async fn admin_fund_asset(
        &self,
        address: String,
        asset_id: u64,
        amount: u64,
    ) -> Result<u64, ErrorObjectOwned>;

    /// Replace the mock oracle's signing key; returns the new public key.
    #[method(name = "admin_setOracleSeed")]
    async fn admin_set_oracle_seed(&self, seed: String) -> Result<String, ErrorObjectOwned>;

    // ============ Oracle Methods ============

    /// Get the mock oracle's public key.
    #[method(name = "oracle_getPubkey")]
    async fn oracle_get_pubkey(&self) -> Result<String, ErrorObjectOwned>;

    /// Sign an attestation for the current round.
    #[method(name = "oracle_attest")]
    async fn oracle_attest(&self, hybrid_param: String)
        -> Result<AttestationRpc, ErrorObjectOwned>;

    // ============ Auction Methods ============

    /// Initialize the auction.
    #[method(name = "auction_create")]
    async fn auction_create(&self, params: CreateAuctionRpc) -> Result<bool, ErrorObjectOwned>;

    /// Commit a sealed bid; the bond moves with the call.
    #[method(name = "auction_commit")]
    async fn auction_commit(&self, params: CommitRpc) -> Result<bool, ErrorObjectOwned>;

    /// Reveal a committed bid.
    #[method(name = "auction_reveal")]
    async fn auction_reveal(&self, params: RevealRpc)
        -> Result<Vec<TransferRpc>, ErrorObjectOwned>;

    /// Settle the auction after the reveal window.
    #[method(name = "auction_settle")]
    async fn auction_settle(&self, sender: String) -> Result<bool, ErrorObjectOwned>;

    /// Winner pays the clearing price; the payment moves with the call.
    #[method(name = "auction_finalize")]
    async fn auction_finalize(
        &self,
        sender: String,
        price: u64,
    ) -> Result<Vec<TransferRpc>, ErrorObjectOwned>;

    /// Slash an expired winner and promote the runner-up.
    #[method(name = "auction_promote")]
    async fn auction_promote(&self, sender: String)
        -> Result<Vec<TransferRpc>, ErrorObjectOwned>;

    /// Claim a revealed non-winner's bond refund.
    #[method(name = "auction_claimRefund")]
    async fn auction_claim_refund(
        &self,
        sender: String,
    ) -> Result<Vec<TransferRpc>, ErrorObjectOwned>;

    /// Set allowlist status for a bidder (seller only).
    #[method(name = "auction_setKyc")]
    async fn auction_set_kyc(
        &self,
        sender: String,
        address: String,
        verified: bool,
    ) -> Result<bool, ErrorObjectOwned>;

    // ============ Query Methods ============

    /// Get the current round.
    #[method(name = "chain_getRound")]
    async fn chain_get_round(&self) -> Result<RoundInfo, ErrorObjectOwned>;

    /// Get the leaderboard snapshot with the current phase.
    #[method(name = "query_getLeaderboard")]
    async fn query_get_leaderboard(&self) -> Result<Option<LeaderboardRpc>, ErrorObjectOwned>;

    /// Get a bidder's record.
    #[method(name = "query_getBidder")]
    async fn query_get_bidder(&self, address: String)
        -> Result<Option<BidderRpc>, ErrorObjectOwned>;

    /// Get an account's native balance.
    #[method(name = "query_getBalance")]
    async fn query_get_balance(&self, address: String) -> Result<u64, ErrorObjectOwned>;

    /// Get an account's token balance.
    #[method(name = "query_getAssetBalance")]
    async fn query_get_asset_balance(
        &self,
        address: String,
        asset_id: u64,
    ) -> Result<u64, ErrorObjectOwned>;
}

/// Implementation of the mock chain RPC server.
struct MockChainServer {
    state: Arc<RwLock<ChainState>>,
}

impl MockChainServer {
    fn new(config: &InstanceConfig) -> Self {
        Self {
            state: Arc::new(RwLock::new(ChainState::new(config))),
        }
    }
}

#[async_trait]
impl MockChainApiServer for MockChainServer {
    async fn admin_advance_round(&self, count: u64) -> Result<RoundInfo, ErrorObjectOwned> {
        let mut chain = self.state.write();
        chain.round = chain.round.saturating_add(count);
        Ok(RoundInfo { round: chain.round })
    }

    async fn admin_set_round(&self, round: u64) -> Result<RoundInfo, ErrorObjectOwned> {
        let mut chain = self.state.write();
        chain.round = round;
        info!(round, "round set");
        Ok(RoundInfo { round })
    }

    async fn admin_fund(&self, address: String, amount: u64) -> Result<u64, ErrorObjectOwned> {
        let address = parse_address(&address)?;
        let mut chain = self.state.write();
        chain.credit_native(address, amount);
        Ok(chain.native[&address])
    }

    async fn admin_fund_asset(
        &self,
        address: String,
        asset_id: u64,
        amount: u64,
    ) -> Result<u64, ErrorObjectOwned> {
        let address = parse_address(&address)?;
        let mut chain = self.state.write();
        chain.credit_asset(asset_id, address, amount);
        Ok(chain.assets[&(asset_id, address)])
    }

    async fn admin_set_oracle_seed(&self, seed: String) -> Result<String, ErrorObjectOwned> {
        let seed = parse_bytes32(&seed)?;
        let mut chain = self.state.write();
        chain.oracle = MockOracle::from_seed(seed);
        Ok(hex::encode(chain.oracle.public_key()))
    }

    async fn oracle_get_pubkey(&self) -> Result<String, ErrorObjectOwned> {
        let chain = self.state.read();
        Ok(hex::encode(chain.oracle.public_key()))
    }

    async fn oracle_attest(
        &self,
        hybrid_param: String,
    ) -> Result<AttestationRpc, ErrorObjectOwned> {
        let hy = parse_bytes(&hybrid_param)?;
        let chain = self.state.read();
        let params = chain.module.params().map_err(rpc_error)?;
        let signature = chain.oracle.attest(
            chain.module.instance_id,
            &hy,
            chain.round,
            &params.param_hash,
            params.commit_end,
            params.reveal_end(),
        );
        Ok(AttestationRpc {
            round: chain.round,
            signature: hex::encode(signature),
        })
    }

    async fn auction_create(&self, params: CreateAuctionRpc) -> Result<bool, ErrorObjectOwned> {
        let sender = parse_address(&params.sender)?;
        let param_hash = parse_bytes32(&params.param_hash)?;

        let mut chain = self.state.write();
        let oracle_pubkey = match &params.oracle_pubkey {
            Some(hex_key) => parse_bytes32(hex_key)?,
            None => chain.oracle.public_key(),
        };

        let ctx = CallContext {
            sender,
            round: chain.round,
            paired_transfer: None,
        };
        handlers::handle_create(
            &mut chain.module,
            &ctx,
            CreateParams {
                quote_asset: params.quote_asset,
                reserve: params.reserve,
                min_bid: params.min_bid,
                bond: params.bond,
                second_price: params.second_price,
                kyc_required: params.kyc_required,
                commit_end: params.commit_end,
                unlock_slack: params.unlock_slack,
                pay_window: params.pay_window,
                oracle_pubkey,
                param_hash,
            },
        )
        .map_err(rpc_error)?;

        info!(commit_end = params.commit_end, "auction created");
        Ok(true)
    }

    async fn auction_commit(&self, params: CommitRpc) -> Result<bool, ErrorObjectOwned> {
        let sender = parse_address(&params.sender)?;
        let commitment_hash = parse_bytes32(&params.commitment_hash)?;
        let content_ref = parse_bytes(&params.content_ref)?;
        let privacy_key = parse_bytes32(&params.privacy_key)?;

        let mut chain = self.state.write();
        let bond = chain.module.params().map_err(rpc_error)?.bond;
        let escrow = chain.module.escrow_address;

        // Grouped operation: bond payment travels with the call.
        if !chain.debit_native(&sender, bond) {
            return Err(rpc_error("insufficient balance for bond"));
        }
        chain.credit_native(escrow, bond);

        let ctx = CallContext {
            sender,
            round: chain.round,
            paired_transfer: Some(Transfer::native(escrow, bond)),
        };
        match handlers::handle_commit(&mut chain.module, &ctx, commitment_hash, content_ref, privacy_key)
        {
            Ok(()) => {
                info!(bidder = %hex::encode(sender), "commitment registered");
                Ok(true)
            }
            Err(e) => {
                // All-or-nothing: unwind the bond payment with the call.
                chain.debit_native(&escrow, bond);
                chain.credit_native(sender, bond);
                Err(rpc_error(e))
            }
        }
    }

    async fn auction_reveal(
        &self,
        params: RevealRpc,
    ) -> Result<Vec<TransferRpc>, ErrorObjectOwned> {
        let sender = parse_address(&params.sender)?;
        let commit_id = parse_bytes32(&params.commit_id)?;
        let salt = parse_bytes(&params.salt)?;
        let hybrid_param = parse_bytes(&params.hybrid_param)?;
        let attestation = parse_bytes(&params.attestation)?;

        let mut chain = self.state.write();
        let ctx = CallContext {
            sender,
            round: chain.round,
            paired_transfer: None,
        };
        let transfers = handlers::handle_reveal_for(
            &mut chain.module,
            &ctx,
            commit_id,
            params.bid,
            &salt,
            &hybrid_param,
            &attestation,
        )
        .map_err(rpc_error)?;

        chain.apply_transfers(&transfers);
        info!(bid = params.bid, "bid revealed");
        Ok(transfers.iter().map(TransferRpc::from).collect())
    }

    async fn auction_settle(&self, sender: String) -> Result<bool, ErrorObjectOwned> {
        let sender = parse_address(&sender)?;
        let mut chain = self.state.write();
        let ctx = CallContext {
            sender,
            round: chain.round,
            paired_transfer: None,
        };
        handlers::handle_settle(&mut chain.module, &ctx).map_err(rpc_error)?;
        info!(round = chain.round, "auction settled");
        Ok(true)
    }

    async fn auction_finalize(
        &self,
        sender: String,
        price: u64,
    ) -> Result<Vec<TransferRpc>, ErrorObjectOwned> {
        let sender = parse_address(&sender)?;
        let mut chain = self.state.write();
        let quote_asset = chain.module.params().map_err(rpc_error)?.quote_asset;
        let escrow = chain.module.escrow_address;

        // Grouped operation: the clearing-price payment travels with the call.
        if !chain.debit_asset(quote_asset, &sender, price) {
            return Err(rpc_error("insufficient asset balance for price"));
        }
        chain.credit_asset(quote_asset, escrow, price);

        let ctx = CallContext {
            sender,
            round: chain.round,
            paired_transfer: Some(Transfer::token(escrow, price, quote_asset)),
        };
        match handlers::handle_finalize_win(&mut chain.module, &ctx, price) {
            Ok(transfers) => {
                chain.apply_transfers(&transfers);
                info!(price, "auction finalized");
                Ok(transfers.iter().map(TransferRpc::from).collect())
            }
            Err(e) => {
                chain.debit_asset(quote_asset, &escrow, price);
                chain.credit_asset(quote_asset, sender, price);
                Err(rpc_error(e))
            }
        }
    }

    async fn auction_promote(
        &self,
        sender: String,
    ) -> Result<Vec<TransferRpc>, ErrorObjectOwned> {
        let sender = parse_address(&sender)?;
        let mut chain = self.state.write();
        let ctx = CallContext {
            sender,
            round: chain.round,
            paired_transfer: None,
        };
        let transfers =
            handlers::handle_promote_next(&mut chain.module, &ctx).map_err(rpc_error)?;
        chain.apply_transfers(&transfers);
        info!("runner-up promoted");
        Ok(transfers.iter().map(TransferRpc::from).collect())
    }

    async fn auction_claim_refund(
        &self,
        sender: String,
    ) -> Result<Vec<TransferRpc>, ErrorObjectOwned> {
        let sender = parse_address(&sender)?;
        let mut chain = self.state.write();
        let ctx = CallContext {
            sender,
            round: chain.round,
            paired_transfer: None,
        };
        let transfers =
            handlers::handle_claim_refund(&mut chain.module, &ctx).map_err(rpc_error)?;
        chain.apply_transfers(&transfers);
        Ok(transfers.iter().map(TransferRpc::from).collect())
    }

    async fn auction_set_kyc(
        &self,
        sender: String,
        address: String,
        verified: bool,
    ) -> Result<bool, ErrorObjectOwned> {
        let sender = parse_address(&sender)?;
        let address = parse_address(&address)?;
        let mut chain = self.state.write();
        let ctx = CallContext {
            sender,
            round: chain.round,
            paired_transfer: None,
        };
        handlers::handle_set_kyc(&mut chain.module, &ctx, address, verified).map_err(rpc_error)?;
        Ok(true)
    }

    async fn chain_get_round(&self) -> Result<RoundInfo, ErrorObjectOwned> {
        let chain = self.state.read();
        Ok(RoundInfo { round: chain.round })
    }

    async fn query_get_leaderboard(&self) -> Result<Option<LeaderboardRpc>, ErrorObjectOwned> {
        let chain = self.state.read();
        let round = chain.round;
        let leaderboard = match queries::handle_query(&chain.module, AuctionQuery::GetLeaderboard)
        {
            AuctionQueryResponse::Leaderboard(view) => view,
            _ => None,
        };
        let phase = match queries::handle_query(&chain.module, AuctionQuery::GetPhase { round }) {
            AuctionQueryResponse::Phase(p) => p,
            _ => None,
        };
        Ok(leaderboard.map(|l| LeaderboardRpc {
            winner: l.winner.map(hex::encode),
            win_bid: l.win_bid,
            second_winner: l.second_winner.map(hex::encode),
            second_bid: l.second_bid,
            settled: l.settled,
            finalized: l.finalized,
            settle_round: l.settle_round,
            phase: phase.unwrap_or(Phase::Commit),
        }))
    }

    async fn query_get_bidder(
        &self,
        address: String,
    ) -> Result<Option<BidderRpc>, ErrorObjectOwned> {
        let address = parse_address(&address)?;
        let chain = self.state.read();
        match queries::handle_query(&chain.module, AuctionQuery::GetBidder { address }) {
            AuctionQueryResponse::Bidder(record) => {
                Ok(record.as_ref().map(BidderRpc::from))
            }
            _ => Ok(None),
        }
    }

    async fn query_get_balance(&self, address: String) -> Result<u64, ErrorObjectOwned> {
        let address = parse_address(&address)?;
        let chain = self.state.read();
        Ok(chain.native.get(&address).copied().unwrap_or(0))
    }

    async fn query_get_asset_balance(
        &self,
        address: String,
        asset_id: u64,
    ) -> Result<u64, ErrorObjectOwned> {
        let address = parse_address(&address)?;
        let chain = self.state.read();
        Ok(chain.assets.get(&(asset_id, address)).copied().unwrap_or(0))
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let config = InstanceConfig {
        instance_id: 1,
        escrow_address: [0xEE; 32],
    };
    config
        .validate()
        .map_err(|e| anyhow::anyhow!("invalid instance config: {e}"))?;

    let addr: SocketAddr = "127.0.0.1:9944".parse()?;
    let server = Server::builder().build(addr).await?;
    let handle = server.start(MockChainServer::new(&config).into_rpc());

    info!(%addr, "mock chain listening");
    handle.stopped().await;
    Ok(())
}
