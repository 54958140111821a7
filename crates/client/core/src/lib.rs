//! Wallet session and transaction orchestration core.
//!
//! Reconciles two independently-updating wallet providers into one canonical
//! session view, drives the player-registration protocol with idempotent
//! retry and fallback-timeout behavior, tracks the lifecycle of every
//! contract-mutating call uniformly across the five operation kinds, and
//! normalizes contract reads into stable domain records.
//!
//! # Architecture
//!
//! ```text
//! session      - dual-provider reconciliation -> Session view
//! registration - Unknown/NotRegistered/Registered orchestration
//! tx, ops      - generic lifecycle tracker + five operation adapters
//! normalize    - dual-shape result decoding into canonical records
//! reads        - {is_loading, error, data} accessors with refetch
//! auth         - explicitly-lifetimed host auth token cache
//! ```
//!
//! Everything here is single-logical-thread and event-driven; workers own
//! their state, suspend only at network boundaries, and re-check session
//! relevance after every suspension. Nothing in this crate is fatal to the
//! process; failures stay local to their operation and recover via user
//! retry or reconnection.

pub mod auth;
pub mod normalize;
pub mod ops;
pub mod reads;
pub mod registration;
pub mod session;
pub mod tx;

pub use auth::{AuthError, AuthTokenCache, TokenFetcher};
pub use normalize::{GameSession, GameStats, LeaderboardEntry, Player};
pub use ops::GameOperations;
pub use reads::{
    ContractReader, FlagKind, FlagQuery, LeaderboardQuery, LeaderboardScope, PlayerQuery,
    QueryCell, ReadState, StatsQuery,
};
pub use registration::{
    PlayerStatus, RegistrationError, RegistrationHandle, RegistrationOrchestrator,
    RegistrationPhase, RegistrationView,
};
pub use session::{Environment, Session, SessionHandle, SessionReconciler, WalletSource};
pub use tx::{TxPhase, TxState, TxTracker};
