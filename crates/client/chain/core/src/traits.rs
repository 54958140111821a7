//! Transport abstraction traits.
//!
//! This module defines the seams between the orchestration core and its
//! external collaborators:
//! - `WalletTransport`: signing-capable wallet provider (write side)
//! - `ReadTransport`: read-only contract access
//! - `EnvironmentProbe`: host capability detection

use async_trait::async_trait;
use tokio::sync::watch;

use crate::types::{Address, ChainId, ContractCall, ProviderState, RawValue, TxHash, TxReceipt};

// ============================================================================
// Error Types
// ============================================================================

/// Wallet-side (write path) errors.
#[derive(Debug, Clone, thiserror::Error)]
pub enum WalletError {
    /// No signer is available. Must be surfaced before any network call.
    #[error("no wallet connected")]
    NoWallet,

    #[error("switch to chain {target} failed: {reason}")]
    NetworkSwitch { target: ChainId, reason: String },

    /// Write call rejected (user cancellation, insufficient balance, revert).
    #[error("submission rejected: {0}")]
    Submission(String),

    /// Waiting for finality failed.
    #[error("confirmation failed: {0}")]
    Confirmation(String),
}

/// Read-side errors.
#[derive(Debug, Clone, thiserror::Error)]
pub enum ReadError {
    #[error("read call {function} failed: {reason}")]
    Call { function: String, reason: String },
}

impl ReadError {
    pub fn call(function: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Call {
            function: function.into(),
            reason: reason.into(),
        }
    }
}

/// Result-shape decoding errors.
///
/// An unrecognized shape is tolerated at the decoding layer (records fall
/// back to all-default fields); this kind exists so the fallback can be
/// observed and logged rather than passing silently.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum DecodeError {
    #[error("unrecognized result shape for {kind}")]
    AmbiguousShape { kind: &'static str },
}

// ============================================================================
// Transport Traits
// ============================================================================

/// Signing-capable wallet provider.
///
/// One implementation exists per wallet environment (embedded host bridge,
/// externally-connected browser wallet). The orchestration core never talks
/// to a concrete wallet library directly.
#[async_trait]
pub trait WalletTransport: Send + Sync {
    /// Snapshot of the provider's current account state.
    fn state(&self) -> ProviderState;

    /// Subscribe to account state changes.
    ///
    /// The receiver always holds the latest published state; consumers
    /// re-read the full snapshot on every change notification.
    fn subscribe(&self) -> watch::Receiver<ProviderState>;

    /// Ask the provider to establish a connection using its first available
    /// connector.
    async fn connect(&self) -> Result<(), WalletError>;

    /// Ask the signer to switch its configured network to `target`.
    async fn switch_chain(&self, target: ChainId) -> Result<(), WalletError>;

    /// Submit a contract-mutating call. Returns as soon as the transport
    /// hands back a transaction hash; finality is a separate wait.
    async fn write_call(
        &self,
        contract: Address,
        call: ContractCall,
    ) -> Result<TxHash, WalletError>;

    /// Wait until the transport reports the transaction finalized.
    ///
    /// Finality here is the transport's single confirmation; no deeper
    /// reorg-depth policy exists at this layer.
    async fn wait_for_receipt(&self, hash: &TxHash) -> Result<TxReceipt, WalletError>;
}

/// Read-only contract access.
#[async_trait]
pub trait ReadTransport: Send + Sync {
    /// Execute a read call and return the raw decoded result.
    async fn read_call(
        &self,
        contract: Address,
        call: ContractCall,
    ) -> Result<RawValue, ReadError>;
}

/// Host capability detection, evaluated once at startup.
pub trait EnvironmentProbe: Send + Sync {
    /// Whether the host exposes an embedded wallet bridge.
    fn embedded_wallet_available(&self) -> bool;
}
