//! Player registration orchestration.
//!
//! Consumes the reconciled session view and the read layer to decide when
//! the registration prompt is warranted, drives the registration protocol
//! through the transaction adapter, and reconciles duplicate-registration
//! races.
//!
//! Outer status per connected address:
//!
//! ```text
//! Unknown ──(read resolves)──→ Registered | NotRegistered
//!    └─────(5s, fail open)───→ NotRegistered
//! ```
//!
//! An unresolved read must never hold the prompt back indefinitely; a
//! wrongly shown prompt recovers through the defensive pre-read and the
//! duplicate-registration reclassification.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;

use client_chain_core::{Address, WalletError};

use crate::normalize::Player;
use crate::ops::GameOperations;
use crate::reads::ContractReader;
use crate::session::Session;

pub const USERNAME_MAX_LEN: usize = 20;

/// How long an unresolved player read may hold the prompt back.
pub const DETECTION_TIMEOUT: Duration = Duration::from_secs(5);

/// Settle time between a confirmed registration and the refresh read.
pub const CONFIRMATION_GRACE: Duration = Duration::from_secs(4);

/// Shorter settle time when the contract reported an existing registration.
pub const DUPLICATE_GRACE: Duration = Duration::from_secs(2);

/// Known phrasings of the contract's duplicate-registration revert. Matched
/// case-insensitively, so this also covers "Already registered ..." and
/// "Player already registered".
const ALREADY_REGISTERED_PHRASES: &[&str] = &["already registered"];

/// Registration status of the connected player.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display)]
#[strum(serialize_all = "snake_case")]
pub enum PlayerStatus {
    /// Player data not yet loaded.
    Unknown,
    NotRegistered,
    Registered,
}

/// Phase of an in-flight registration attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display)]
#[strum(serialize_all = "snake_case")]
pub enum RegistrationPhase {
    Idle,
    Pending,
    WaitingConfirmation,
    Success,
}

/// Observable registration state.
#[derive(Debug, Clone, PartialEq)]
pub struct RegistrationView {
    pub status: PlayerStatus,
    pub phase: RegistrationPhase,
    /// Username of the in-flight attempt; empty while idle.
    pub username: String,
    pub player: Option<Player>,
    pub show_prompt: bool,
}

impl RegistrationView {
    fn hidden() -> Self {
        Self {
            status: PlayerStatus::Unknown,
            phase: RegistrationPhase::Idle,
            username: String::new(),
            player: None,
            show_prompt: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RegistrationError {
    #[error("username must be non-empty and at most 20 characters")]
    InvalidUsername,

    #[error("registration orchestrator is no longer running")]
    Closed,
}

enum Command {
    Register { username: String },
}

/// Builds and spawns the orchestration worker.
pub struct RegistrationOrchestrator {
    session: watch::Receiver<Session>,
    reader: ContractReader,
    operations: Arc<GameOperations>,
}

impl RegistrationOrchestrator {
    pub fn new(
        session: watch::Receiver<Session>,
        reader: ContractReader,
        operations: Arc<GameOperations>,
    ) -> Self {
        Self {
            session,
            reader,
            operations,
        }
    }

    pub fn spawn(self) -> RegistrationHandle {
        let (view_tx, view_rx) = watch::channel(RegistrationView::hidden());
        let (command_tx, command_rx) = mpsc::channel(8);
        let worker = Worker {
            session: self.session,
            commands: command_rx,
            commands_closed: false,
            reader: self.reader,
            operations: self.operations,
            view_tx,
        };
        let task = tokio::spawn(worker.run());
        RegistrationHandle {
            view: view_rx,
            commands: command_tx,
            task,
        }
    }
}

/// Handle to the running orchestrator. Dropping it cancels every pending
/// timer and read.
pub struct RegistrationHandle {
    view: watch::Receiver<RegistrationView>,
    commands: mpsc::Sender<Command>,
    task: JoinHandle<()>,
}

impl RegistrationHandle {
    pub fn subscribe(&self) -> watch::Receiver<RegistrationView> {
        self.view.clone()
    }

    pub fn current(&self) -> RegistrationView {
        self.view.borrow().clone()
    }

    /// Submit a registration request for `username`.
    ///
    /// Validation happens here; protocol errors surface through the view.
    pub async fn register(&self, username: &str) -> Result<(), RegistrationError> {
        let trimmed = username.trim();
        if trimmed.is_empty() || trimmed.chars().count() > USERNAME_MAX_LEN {
            return Err(RegistrationError::InvalidUsername);
        }
        self.commands
            .send(Command::Register {
                username: trimmed.to_string(),
            })
            .await
            .map_err(|_| RegistrationError::Closed)
    }
}

impl Drop for RegistrationHandle {
    fn drop(&mut self) {
        self.task.abort();
    }
}

// ============================================================================
// Worker
// ============================================================================

/// Run `fut` while the session stays connected to `address`.
///
/// Returns `None` if the session disconnects or changes address first; the
/// suspended work is dropped, so no continuation can write stale state.
async fn guarded<F>(
    guard: &mut watch::Receiver<Session>,
    address: Address,
    fut: F,
) -> Option<F::Output>
where
    F: Future,
{
    tokio::pin!(fut);
    loop {
        tokio::select! {
            result = &mut fut => return Some(result),
            changed = guard.changed() => {
                if changed.is_err() {
                    return None;
                }
                let session = guard.borrow_and_update().clone();
                if !session.connected || session.address != Some(address) {
                    return None;
                }
            }
        }
    }
}

enum Wake {
    Session(bool),
    Command(Option<Command>),
}

struct Worker {
    session: watch::Receiver<Session>,
    commands: mpsc::Receiver<Command>,
    commands_closed: bool,
    reader: ContractReader,
    operations: Arc<GameOperations>,
    view_tx: watch::Sender<RegistrationView>,
}

impl Worker {
    async fn run(mut self) {
        loop {
            if self.session.has_changed().is_err() {
                // Reconciler gone; nothing left to orchestrate.
                return;
            }
            let current = self.session.borrow_and_update().clone();
            match current.address {
                Some(address) if current.connected => self.connected_cycle(address).await,
                _ => {
                    self.publish(|view| *view = RegistrationView::hidden());
                    let wake = tokio::select! {
                        changed = self.session.changed() => Wake::Session(changed.is_ok()),
                        command = self.commands.recv(), if !self.commands_closed => {
                            Wake::Command(command)
                        }
                    };
                    match wake {
                        Wake::Session(false) => return,
                        Wake::Session(true) => {}
                        Wake::Command(None) => self.commands_closed = true,
                        Wake::Command(Some(Command::Register { username })) => {
                            tracing::warn!(%username, "ignoring registration while disconnected");
                        }
                    }
                }
            }
        }
    }

    /// One connected period for one address. Returns when the session
    /// disconnects, switches address, or every channel closes.
    async fn connected_cycle(&mut self, address: Address) {
        let mut guard = self.session.clone();
        {
            let session = guard.borrow_and_update().clone();
            if !session.connected || session.address != Some(address) {
                return;
            }
        }

        tracing::debug!(%address, "session connected, loading player data");
        self.publish(|view| {
            *view = RegistrationView::hidden();
        });

        let reader = self.reader.clone();
        let detection = async {
            let read = async {
                match reader.player(address).await {
                    Ok(player) => player,
                    Err(error) => {
                        // An errored read counts as unresolved; the timeout
                        // below decides, not the error.
                        tracing::warn!(%error, "player data load failed");
                        std::future::pending().await
                    }
                }
            };
            tokio::time::timeout(DETECTION_TIMEOUT, read).await
        };

        match guarded(&mut guard, address, detection).await {
            None => return,
            Some(Ok(player)) => self.apply_player(player),
            Some(Err(_elapsed)) => {
                tracing::warn!(
                    %address,
                    "player data not resolved in time, showing registration prompt"
                );
                self.publish(|view| {
                    view.status = PlayerStatus::NotRegistered;
                    view.show_prompt = true;
                });
            }
        }

        loop {
            let wake = tokio::select! {
                changed = guard.changed() => Wake::Session(changed.is_ok()),
                command = self.commands.recv(), if !self.commands_closed => {
                    Wake::Command(command)
                }
            };
            match wake {
                Wake::Session(false) => return,
                Wake::Session(true) => {
                    let session = guard.borrow_and_update().clone();
                    if !session.connected || session.address != Some(address) {
                        return;
                    }
                }
                Wake::Command(None) => self.commands_closed = true,
                Wake::Command(Some(Command::Register { username })) => {
                    if !self.register_flow(address, &mut guard, username).await {
                        return;
                    }
                }
            }
        }
    }

    fn apply_player(&self, player: Player) {
        let complete = player.is_complete();
        tracing::debug!(
            username = %player.username,
            is_registered = player.is_registered,
            complete,
            "player data resolved"
        );
        self.publish(|view| {
            view.status = if complete {
                PlayerStatus::Registered
            } else {
                PlayerStatus::NotRegistered
            };
            view.show_prompt = !complete;
            view.player = Some(player);
        });
    }

    /// Drive one registration attempt. Returns `false` when the session went
    /// away mid-flight and the cycle must end.
    async fn register_flow(
        &self,
        address: Address,
        guard: &mut watch::Receiver<Session>,
        username: String,
    ) -> bool {
        self.publish(|view| {
            view.username = username.clone();
        });

        // A registration may have succeeded in a previous session without
        // local state catching up; a fresh read settles it before spending a
        // transaction.
        match guarded(guard, address, self.reader.player(address)).await {
            None => return self.cancelled(),
            Some(Ok(player)) if player.is_complete() => {
                tracing::info!(
                    username = %player.username,
                    "player already registered, skipping submission"
                );
                self.finish_registered(Some(player));
                return true;
            }
            Some(Ok(_)) => {}
            Some(Err(error)) => {
                tracing::debug!(%error, "pre-registration check failed, submitting anyway");
            }
        }

        self.publish(|view| {
            view.phase = RegistrationPhase::Pending;
        });

        match guarded(guard, address, self.operations.register_player(&username)).await {
            None => self.cancelled(),
            Some(Ok(hash)) => {
                tracing::info!(%hash, %username, "registration submitted");
                self.confirm_after(address, guard, CONFIRMATION_GRACE).await
            }
            Some(Err(error)) if is_already_registered(&error) => {
                // Duplicate-submission race, not a failure: the contract
                // already holds a registration for this account.
                tracing::info!(%error, "contract reports an existing registration");
                self.confirm_after(address, guard, DUPLICATE_GRACE).await
            }
            Some(Err(error)) => {
                tracing::warn!(%error, "registration failed");
                // The prompt stays visible for a manual retry.
                self.publish(|view| {
                    view.phase = RegistrationPhase::Idle;
                    view.username.clear();
                });
                true
            }
        }
    }

    /// Wait out the confirmation grace period, refresh the player record,
    /// and settle into `Registered`.
    async fn confirm_after(
        &self,
        address: Address,
        guard: &mut watch::Receiver<Session>,
        grace: Duration,
    ) -> bool {
        self.publish(|view| {
            view.phase = RegistrationPhase::WaitingConfirmation;
        });

        if guarded(guard, address, tokio::time::sleep(grace))
            .await
            .is_none()
        {
            return self.cancelled();
        }

        let player = match guarded(guard, address, self.reader.player(address)).await {
            None => return self.cancelled(),
            Some(Ok(player)) => Some(player),
            Some(Err(error)) => {
                // Registration itself is settled; only the refresh failed.
                tracing::warn!(%error, "post-registration refresh failed");
                None
            }
        };
        self.finish_registered(player);
        true
    }

    fn finish_registered(&self, player: Option<Player>) {
        self.publish(|view| {
            view.phase = RegistrationPhase::Success;
            view.status = PlayerStatus::Registered;
            view.show_prompt = false;
            view.username.clear();
            if let Some(player) = player {
                view.player = Some(player);
            }
        });
    }

    fn cancelled(&self) -> bool {
        self.publish(|view| *view = RegistrationView::hidden());
        false
    }

    fn publish(&self, f: impl FnOnce(&mut RegistrationView)) {
        self.view_tx.send_if_modified(|view| {
            let before = view.clone();
            f(view);
            *view != before
        });
    }
}

fn is_already_registered(error: &WalletError) -> bool {
    let message = error.to_string().to_lowercase();
    ALREADY_REGISTERED_PHRASES
        .iter()
        .any(|phrase| message.contains(phrase))
}

#[cfg(test)]
mod tests {
    use client_chain_celo::ChainSelector;
    use client_chain_core::mock::{MockReadClient, MockWallet};
    use client_chain_core::{ChainId, RawValue, ReadTransport};

    use crate::session::Environment;

    use super::*;

    const CHAIN: ChainId = ChainId(42220);

    fn addr(n: u8) -> Address {
        Address::new([n; 20])
    }

    fn connected_session(address: Address) -> Session {
        Session {
            environment: Environment::ExternalWallet,
            connected: true,
            address: Some(address),
            chain_id: Some(CHAIN),
        }
    }

    fn unregistered_player() -> RawValue {
        RawValue::Map(vec![
            ("username".into(), RawValue::Str(String::new())),
            ("isRegistered".into(), RawValue::Bool(false)),
        ])
    }

    fn registered_player(name: &str) -> RawValue {
        RawValue::Map(vec![
            ("username".into(), RawValue::Str(name.into())),
            ("isRegistered".into(), RawValue::Bool(true)),
        ])
    }

    struct Harness {
        session_tx: watch::Sender<Session>,
        read: Arc<MockReadClient>,
        wallet: Arc<MockWallet>,
        handle: RegistrationHandle,
    }

    fn harness(initial: Session) -> Harness {
        let read = Arc::new(MockReadClient::new());
        let transport = read.clone();
        let selector = ChainSelector::new(move |_| transport.clone() as Arc<dyn ReadTransport>);
        let chain = selector.select(Some(CHAIN));

        let wallet = Arc::new(MockWallet::connected(addr(1), CHAIN));
        let operations = Arc::new(GameOperations::new(wallet.clone(), &chain));
        let reader = ContractReader::new(&chain);

        let (session_tx, session_rx) = watch::channel(initial);
        let handle = RegistrationOrchestrator::new(session_rx, reader, operations).spawn();
        Harness {
            session_tx,
            read,
            wallet,
            handle,
        }
    }

    async fn settle() {
        for _ in 0..8 {
            tokio::task::yield_now().await;
        }
    }

    #[tokio::test]
    async fn registered_flag_routes_to_registered() {
        let h = harness(connected_session(addr(1)));
        h.read.set_response("getPlayer", registered_player("alice"));

        settle().await;
        let view = h.handle.current();
        assert_eq!(view.status, PlayerStatus::Registered);
        assert!(!view.show_prompt);
    }

    #[tokio::test]
    async fn bare_username_still_counts_as_registered() {
        let h = harness(connected_session(addr(1)));
        // Flag lagging behind the username during a confirmation window.
        h.read.set_response(
            "getPlayer",
            RawValue::Map(vec![
                ("username".into(), RawValue::Str("  alice ".into())),
                ("isRegistered".into(), RawValue::Bool(false)),
            ]),
        );

        settle().await;
        assert_eq!(h.handle.current().status, PlayerStatus::Registered);
    }

    #[tokio::test]
    async fn incomplete_player_shows_prompt() {
        let h = harness(connected_session(addr(1)));
        h.read.set_response("getPlayer", unregistered_player());

        settle().await;
        let view = h.handle.current();
        assert_eq!(view.status, PlayerStatus::NotRegistered);
        assert!(view.show_prompt);
    }

    #[tokio::test(start_paused = true)]
    async fn unresolved_read_fails_open_to_the_prompt_exactly_once() {
        let h = harness(connected_session(addr(1)));
        h.read.hang("getPlayer");

        let mut view = h.handle.subscribe();
        settle().await;
        assert_eq!(h.handle.current().status, PlayerStatus::Unknown);

        tokio::time::sleep(DETECTION_TIMEOUT + Duration::from_millis(100)).await;

        let mut prompt_shows = 0;
        let mut last_shown = false;
        loop {
            let current = view.borrow_and_update().clone();
            if current.show_prompt && !last_shown {
                prompt_shows += 1;
            }
            last_shown = current.show_prompt;
            if view.has_changed().map(|changed| !changed).unwrap_or(true) {
                break;
            }
        }
        assert_eq!(prompt_shows, 1);
        assert_eq!(h.handle.current().status, PlayerStatus::NotRegistered);

        // Long after the timeout, the prompt has not re-fired.
        tokio::time::sleep(Duration::from_secs(30)).await;
        assert!(h.handle.current().show_prompt);
        assert_eq!(h.read.call_count("getPlayer"), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn registration_happy_path_settles_after_grace() {
        let h = harness(connected_session(addr(1)));
        h.read.set_response("getPlayer", unregistered_player());

        settle().await;
        h.handle.register("alice").await.unwrap();
        settle().await;
        assert_eq!(
            h.handle.current().phase,
            RegistrationPhase::WaitingConfirmation
        );

        h.read.set_response("getPlayer", registered_player("alice"));
        tokio::time::sleep(CONFIRMATION_GRACE + Duration::from_millis(100)).await;
        settle().await;

        let view = h.handle.current();
        assert_eq!(view.phase, RegistrationPhase::Success);
        assert_eq!(view.status, PlayerStatus::Registered);
        assert!(!view.show_prompt);
        assert_eq!(view.player.unwrap().username, "alice");
        assert_eq!(h.wallet.writes().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn already_registered_error_is_reclassified_as_success() {
        let h = harness(connected_session(addr(1)));
        h.read.set_response("getPlayer", unregistered_player());
        h.wallet.push_write_outcome(Err(WalletError::Submission(
            "Error: Already registered by another wallet".into(),
        )));

        settle().await;
        h.handle.register("alice").await.unwrap();
        settle().await;
        assert_eq!(
            h.handle.current().phase,
            RegistrationPhase::WaitingConfirmation
        );

        tokio::time::sleep(DUPLICATE_GRACE + Duration::from_millis(100)).await;
        settle().await;

        let view = h.handle.current();
        assert_eq!(view.phase, RegistrationPhase::Success);
        assert_eq!(view.status, PlayerStatus::Registered);
        assert!(!view.show_prompt);
    }

    #[tokio::test(start_paused = true)]
    async fn other_submission_errors_leave_the_prompt_for_retry() {
        let h = harness(connected_session(addr(1)));
        h.read.set_response("getPlayer", unregistered_player());
        h.wallet
            .push_write_outcome(Err(WalletError::Submission("user rejected".into())));

        settle().await;
        h.handle.register("alice").await.unwrap();
        settle().await;

        let view = h.handle.current();
        assert_eq!(view.phase, RegistrationPhase::Idle);
        assert_eq!(view.status, PlayerStatus::NotRegistered);
        assert!(view.show_prompt);
    }

    #[tokio::test]
    async fn defensive_read_skips_submission_when_already_complete() {
        let h = harness(connected_session(addr(1)));
        h.read.set_response("getPlayer", unregistered_player());

        settle().await;
        assert!(h.handle.current().show_prompt);

        // Registration landed elsewhere between prompt and submit.
        h.read.set_response("getPlayer", registered_player("alice"));
        h.handle.register("alice").await.unwrap();
        settle().await;

        let view = h.handle.current();
        assert_eq!(view.status, PlayerStatus::Registered);
        assert_eq!(view.phase, RegistrationPhase::Success);
        assert!(h.wallet.writes().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn disconnect_mid_confirmation_cancels_the_grace_read() {
        let h = harness(connected_session(addr(1)));
        h.read.set_response("getPlayer", unregistered_player());

        settle().await;
        h.handle.register("alice").await.unwrap();
        settle().await;
        assert_eq!(
            h.handle.current().phase,
            RegistrationPhase::WaitingConfirmation
        );
        let reads_before = h.read.call_count("getPlayer");

        h.session_tx
            .send(Session::disconnected(Environment::ExternalWallet))
            .unwrap();
        tokio::time::sleep(CONFIRMATION_GRACE + Duration::from_secs(1)).await;
        settle().await;

        let view = h.handle.current();
        assert_eq!(view.status, PlayerStatus::Unknown);
        assert_eq!(view.phase, RegistrationPhase::Idle);
        assert!(!view.show_prompt);
        // No stale success transition and no grace-period read fired.
        assert_eq!(h.read.call_count("getPlayer"), reads_before);
    }

    #[tokio::test]
    async fn username_validation_rejects_bad_input() {
        let h = harness(connected_session(addr(1)));
        assert_eq!(
            h.handle.register("   ").await,
            Err(RegistrationError::InvalidUsername)
        );
        assert_eq!(
            h.handle.register(&"x".repeat(USERNAME_MAX_LEN + 1)).await,
            Err(RegistrationError::InvalidUsername)
        );
        // Surrounding whitespace is trimmed, not rejected.
        h.read.set_response("getPlayer", registered_player("alice"));
        settle().await;
        assert!(h.handle.register("  alice  ").await.is_ok());
    }
}
