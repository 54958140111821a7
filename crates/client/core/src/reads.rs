//! Read accessors over the game contract.
//!
//! [`ContractReader`] performs the typed read calls; [`QueryCell`] wraps one
//! read's `{is_loading, error, data}` for presentation, with refetch-on-
//! demand. A failed refetch records the error but keeps the prior data:
//! stale-but-present beats empty.

use std::future::Future;
use std::sync::Arc;

use tokio::sync::watch;

use client_chain_celo::{ChainHandle, abi};
use client_chain_core::{Address, RawValue, ReadError, ReadTransport};

use crate::normalize::{self, GameStats, LeaderboardEntry, Player};

// ============================================================================
// ContractReader
// ============================================================================

/// Typed read calls against the game contract.
#[derive(Clone)]
pub struct ContractReader {
    read: Arc<dyn ReadTransport>,
    contract: Address,
}

impl ContractReader {
    pub fn new(chain: &ChainHandle) -> Self {
        Self {
            read: chain.read.clone(),
            contract: chain.contracts.game,
        }
    }

    async fn call(&self, call: client_chain_core::ContractCall) -> Result<RawValue, ReadError> {
        self.read.read_call(self.contract, call).await
    }

    pub async fn player(&self, address: Address) -> Result<Player, ReadError> {
        let raw = self.call(abi::get_player(address)).await?;
        Ok(normalize::player(&raw))
    }

    pub async fn stage_leaderboard(
        &self,
        stage: u64,
        limit: u64,
    ) -> Result<Vec<LeaderboardEntry>, ReadError> {
        let raw = self.call(abi::get_stage_leaderboard(stage, limit)).await?;
        Ok(normalize::leaderboard(&raw))
    }

    pub async fn general_leaderboard(&self, limit: u64) -> Result<Vec<LeaderboardEntry>, ReadError> {
        let raw = self.call(abi::get_general_leaderboard(limit)).await?;
        Ok(normalize::leaderboard(&raw))
    }

    pub async fn stage_completed(&self, player: Address, stage: u64) -> Result<bool, ReadError> {
        let raw = self.call(abi::is_stage_completed(player, stage)).await?;
        Ok(normalize::boolean(&raw))
    }

    pub async fn tokens_claimed(&self, player: Address, stage: u64) -> Result<bool, ReadError> {
        let raw = self.call(abi::are_tokens_claimed(player, stage)).await?;
        Ok(normalize::boolean(&raw))
    }

    pub async fn nft_claimed(&self, player: Address, stage: u64) -> Result<bool, ReadError> {
        let raw = self.call(abi::is_nft_claimed(player, stage)).await?;
        Ok(normalize::boolean(&raw))
    }

    pub async fn game_stats(&self) -> Result<GameStats, ReadError> {
        let raw = self.call(abi::get_game_stats()).await?;
        Ok(normalize::game_stats(&raw))
    }
}

// ============================================================================
// QueryCell
// ============================================================================

/// Observable state of one read.
#[derive(Debug, Clone)]
pub struct ReadState<T> {
    pub is_loading: bool,
    pub error: Option<ReadError>,
    pub data: Option<T>,
}

impl<T> Default for ReadState<T> {
    fn default() -> Self {
        Self {
            is_loading: false,
            error: None,
            data: None,
        }
    }
}

/// Holds one read's presentation state and runs refetches against it.
pub struct QueryCell<T> {
    state_tx: watch::Sender<ReadState<T>>,
}

impl<T: Clone + Send + Sync + 'static> QueryCell<T> {
    pub fn new() -> Self {
        let (state_tx, _) = watch::channel(ReadState::default());
        Self { state_tx }
    }

    pub fn subscribe(&self) -> watch::Receiver<ReadState<T>> {
        self.state_tx.subscribe()
    }

    pub fn state(&self) -> ReadState<T> {
        self.state_tx.borrow().clone()
    }

    /// Drive one fetch through the cell.
    ///
    /// Failure keeps whatever data the cell already holds.
    pub async fn refetch<F>(&self, fetch: F)
    where
        F: Future<Output = Result<T, ReadError>>,
    {
        self.state_tx.send_modify(|state| {
            state.is_loading = true;
            state.error = None;
        });

        match fetch.await {
            Ok(data) => self.state_tx.send_modify(|state| {
                state.is_loading = false;
                state.error = None;
                state.data = Some(data);
            }),
            Err(error) => {
                tracing::warn!(%error, "read refetch failed, keeping prior data");
                self.state_tx.send_modify(|state| {
                    state.is_loading = false;
                    state.error = Some(error);
                });
            }
        }
    }

    /// Drop the held data (e.g. the subject address changed).
    pub fn clear(&self) {
        self.state_tx.send_replace(ReadState::default());
    }
}

impl<T: Clone + Send + Sync + 'static> Default for QueryCell<T> {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// Concrete queries
// ============================================================================

/// Player record accessor.
pub struct PlayerQuery {
    reader: ContractReader,
    cell: QueryCell<Player>,
}

impl PlayerQuery {
    pub fn new(reader: ContractReader) -> Self {
        Self {
            reader,
            cell: QueryCell::new(),
        }
    }

    pub async fn refetch(&self, address: Address) {
        self.cell.refetch(self.reader.player(address)).await;
    }

    pub fn subscribe(&self) -> watch::Receiver<ReadState<Player>> {
        self.cell.subscribe()
    }

    pub fn state(&self) -> ReadState<Player> {
        self.cell.state()
    }

    pub fn clear(&self) {
        self.cell.clear();
    }
}

/// Which board a leaderboard query targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LeaderboardScope {
    Stage(u64),
    General,
}

/// Leaderboard accessor; rank is read-order position.
pub struct LeaderboardQuery {
    reader: ContractReader,
    scope: LeaderboardScope,
    cell: QueryCell<Vec<LeaderboardEntry>>,
}

impl LeaderboardQuery {
    pub fn new(reader: ContractReader, scope: LeaderboardScope) -> Self {
        Self {
            reader,
            scope,
            cell: QueryCell::new(),
        }
    }

    pub async fn refetch(&self, limit: u64) {
        match self.scope {
            LeaderboardScope::Stage(stage) => {
                self.cell
                    .refetch(self.reader.stage_leaderboard(stage, limit))
                    .await;
            }
            LeaderboardScope::General => {
                self.cell
                    .refetch(self.reader.general_leaderboard(limit))
                    .await;
            }
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<ReadState<Vec<LeaderboardEntry>>> {
        self.cell.subscribe()
    }

    pub fn state(&self) -> ReadState<Vec<LeaderboardEntry>> {
        self.cell.state()
    }
}

/// Aggregate stats accessor.
pub struct StatsQuery {
    reader: ContractReader,
    cell: QueryCell<GameStats>,
}

impl StatsQuery {
    pub fn new(reader: ContractReader) -> Self {
        Self {
            reader,
            cell: QueryCell::new(),
        }
    }

    pub async fn refetch(&self) {
        self.cell.refetch(self.reader.game_stats()).await;
    }

    pub fn subscribe(&self) -> watch::Receiver<ReadState<GameStats>> {
        self.cell.subscribe()
    }

    pub fn state(&self) -> ReadState<GameStats> {
        self.cell.state()
    }
}

/// Per-stage claim and completion flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlagKind {
    StageCompleted,
    TokensClaimed,
    NftClaimed,
}

/// Boolean flag accessor keyed by `(player, stage)`.
pub struct FlagQuery {
    reader: ContractReader,
    kind: FlagKind,
    cell: QueryCell<bool>,
}

impl FlagQuery {
    pub fn new(reader: ContractReader, kind: FlagKind) -> Self {
        Self {
            reader,
            kind,
            cell: QueryCell::new(),
        }
    }

    pub async fn refetch(&self, player: Address, stage: u64) {
        match self.kind {
            FlagKind::StageCompleted => {
                self.cell
                    .refetch(self.reader.stage_completed(player, stage))
                    .await;
            }
            FlagKind::TokensClaimed => {
                self.cell
                    .refetch(self.reader.tokens_claimed(player, stage))
                    .await;
            }
            FlagKind::NftClaimed => {
                self.cell
                    .refetch(self.reader.nft_claimed(player, stage))
                    .await;
            }
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<ReadState<bool>> {
        self.cell.subscribe()
    }

    pub fn state(&self) -> ReadState<bool> {
        self.cell.state()
    }

    pub fn clear(&self) {
        self.cell.clear();
    }
}

#[cfg(test)]
mod tests {
    use client_chain_celo::ChainSelector;
    use client_chain_core::mock::MockReadClient;

    use super::*;

    fn reader_with_mock() -> (ContractReader, Arc<MockReadClient>) {
        let mock = Arc::new(MockReadClient::new());
        let transport = mock.clone();
        let selector = ChainSelector::new(move |_| transport.clone() as Arc<dyn ReadTransport>);
        let chain = selector.select(None);
        (ContractReader::new(&chain), mock)
    }

    #[tokio::test]
    async fn failed_refetch_keeps_prior_data() {
        let (reader, mock) = reader_with_mock();
        mock.set_response(
            "getGameStats",
            RawValue::List(vec![RawValue::Uint(10), RawValue::Uint(42)]),
        );

        let query = StatsQuery::new(reader);
        query.refetch().await;
        assert_eq!(query.state().data.unwrap().total_players, 10);

        mock.push_response("getGameStats", Err(ReadError::call("getGameStats", "rpc down")));
        query.refetch().await;

        let state = query.state();
        assert!(state.error.is_some());
        assert!(!state.is_loading);
        // Stale-but-present beats empty.
        assert_eq!(state.data.unwrap().total_players, 10);
    }

    #[tokio::test]
    async fn flag_queries_target_their_function() {
        let (reader, mock) = reader_with_mock();
        mock.set_response("areTokensClaimed", RawValue::Bool(true));

        let query = FlagQuery::new(reader, FlagKind::TokensClaimed);
        query.refetch(Address::new([5u8; 20]), 2).await;

        assert_eq!(query.state().data, Some(true));
        assert_eq!(mock.call_count("areTokensClaimed"), 1);
        assert_eq!(mock.call_count("isNFTClaimed"), 0);
    }

    #[tokio::test]
    async fn player_query_round_trips_both_shapes() {
        let (reader, mock) = reader_with_mock();
        let query = PlayerQuery::new(reader);
        let subject = Address::new([9u8; 20]);

        mock.push_response(
            "getPlayer",
            Ok(RawValue::Map(vec![
                ("username".into(), RawValue::Str("dave".into())),
                ("isRegistered".into(), RawValue::Bool(true)),
            ])),
        );
        query.refetch(subject).await;
        let named = query.state().data.unwrap();

        mock.push_response(
            "getPlayer",
            Ok(RawValue::List(vec![
                RawValue::Str("dave".into()),
                RawValue::Bool(true),
            ])),
        );
        query.refetch(subject).await;
        let positional = query.state().data.unwrap();

        assert_eq!(named, positional);
        assert!(named.is_complete());

        query.clear();
        assert!(query.state().data.is_none());
    }
}
