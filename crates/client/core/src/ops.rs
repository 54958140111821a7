//! Contract operation adapters.
//!
//! Five instances of the generic [`TxTracker`] machine, parameterized only
//! by which contract function is encoded. Adapters apply operation-specific
//! pre-validation (zero/one coercion of absent numeric inputs) and otherwise
//! share the phase behavior verbatim.

use std::sync::Arc;

use client_chain_celo::{ChainHandle, abi};
use client_chain_core::{TxHash, WalletError, WalletTransport};

use crate::tx::TxTracker;

/// The five contract-mutating operations, each with isolated lifecycle
/// state. Independent operations may be in flight concurrently.
pub struct GameOperations {
    pub registration: TxTracker,
    pub session_save: TxTracker,
    pub purchase: TxTracker,
    pub token_claim: TxTracker,
    pub nft_claim: TxTracker,
}

impl GameOperations {
    pub fn new(wallet: Arc<dyn WalletTransport>, chain: &ChainHandle) -> Self {
        let game = chain.contracts.game;
        let target = chain.network.chain_id;
        Self {
            registration: TxTracker::new("register_player", wallet.clone(), game, target),
            session_save: TxTracker::new("save_game_session", wallet.clone(), game, target),
            purchase: TxTracker::new("purchase_item", wallet.clone(), game, target),
            token_claim: TxTracker::new("claim_tokens", wallet.clone(), game, target),
            nft_claim: TxTracker::new("claim_nft", wallet, game, target),
        }
    }

    pub async fn register_player(&self, username: &str) -> Result<TxHash, WalletError> {
        self.registration
            .submit(abi::register_player(username))
            .await
    }

    /// Absent or zero stage falls back to stage 1; absent counters to 0.
    pub async fn save_game_session(
        &self,
        stage: Option<u64>,
        score: Option<u64>,
        coins_collected: Option<u64>,
        correct_answers: Option<u64>,
        completed: bool,
    ) -> Result<TxHash, WalletError> {
        let call = abi::save_game_session(
            stage.unwrap_or(0).max(1),
            score.unwrap_or(0),
            coins_collected.unwrap_or(0),
            correct_answers.unwrap_or(0),
            completed,
        );
        self.session_save.submit(call).await
    }

    pub async fn purchase_item(&self, item_type: &str, cost: u64) -> Result<TxHash, WalletError> {
        self.purchase.submit(abi::purchase_item(item_type, cost)).await
    }

    pub async fn claim_tokens(&self, stage: u64) -> Result<TxHash, WalletError> {
        self.token_claim.submit(abi::claim_tokens(stage)).await
    }

    pub async fn claim_nft(&self, stage: u64) -> Result<TxHash, WalletError> {
        self.nft_claim.submit(abi::claim_nft(stage)).await
    }
}
