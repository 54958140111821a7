//! Transaction lifecycle tracking.
//!
//! One [`TxTracker`] instance wraps one contract-mutating call at a time and
//! publishes its `{phase, hash, error}` through a watch channel. The five
//! operation adapters in [`crate::ops`] share this machine verbatim and
//! differ only in which contract function they encode.
//!
//! Phase machine:
//!
//! ```text
//! Idle → Pending → Confirming → Success → (3s) → Idle
//!          │            │
//!          └────────────┴──→ Error (retained for display)
//! ```

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use tokio::sync::watch;

use client_chain_core::{Address, ChainId, ContractCall, TxHash, WalletError, WalletTransport};

/// How long a completed call keeps showing `Success` before the tracker
/// returns to `Idle` for reuse.
pub const SUCCESS_DISPLAY_WINDOW: Duration = Duration::from_secs(3);

/// Lifecycle phase of one contract-mutating call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display)]
#[strum(serialize_all = "snake_case")]
pub enum TxPhase {
    Idle,
    Pending,
    Confirming,
    Success,
    Error,
}

/// Observable state of one in-flight operation.
#[derive(Debug, Clone)]
pub struct TxState {
    pub phase: TxPhase,
    pub hash: Option<TxHash>,
    pub error: Option<WalletError>,
}

impl TxState {
    fn idle() -> Self {
        Self {
            phase: TxPhase::Idle,
            hash: None,
            error: None,
        }
    }
}

impl Default for TxState {
    fn default() -> Self {
        Self::idle()
    }
}

/// Tracks the lifecycle of contract-mutating calls against one function's
/// adapter. Instances are fully isolated; concurrent trackers cannot
/// cross-contaminate phase, hash, or error.
pub struct TxTracker {
    label: &'static str,
    wallet: Arc<dyn WalletTransport>,
    contract: Address,
    target_chain: ChainId,
    state_tx: watch::Sender<TxState>,
    generation: Arc<AtomicU64>,
}

impl TxTracker {
    pub fn new(
        label: &'static str,
        wallet: Arc<dyn WalletTransport>,
        contract: Address,
        target_chain: ChainId,
    ) -> Self {
        let (state_tx, _) = watch::channel(TxState::idle());
        Self {
            label,
            wallet,
            contract,
            target_chain,
            state_tx,
            generation: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Subscribe to state changes.
    pub fn subscribe(&self) -> watch::Receiver<TxState> {
        self.state_tx.subscribe()
    }

    /// Snapshot of the current state.
    pub fn state(&self) -> TxState {
        self.state_tx.borrow().clone()
    }

    /// Drive one call through the full lifecycle.
    ///
    /// Requires an active signer before any network traffic and aligns the
    /// signer's network with the target chain first; failures of either
    /// leave the tracker in `Idle` and propagate to the caller. Submission
    /// and confirmation failures land in `Error` for display.
    pub async fn submit(&self, call: ContractCall) -> Result<TxHash, WalletError> {
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;

        // Fresh run: previous error and hash are cleared on invocation.
        self.set(TxState::idle());

        let provider = self.wallet.state();
        if !provider.connected || provider.address.is_none() {
            tracing::debug!(operation = self.label, "rejecting call, no signer");
            return Err(WalletError::NoWallet);
        }

        if provider.chain_id != Some(self.target_chain) {
            tracing::info!(
                operation = self.label,
                from = ?provider.chain_id,
                to = %self.target_chain,
                "switching signer network"
            );
            if let Err(error) = self.wallet.switch_chain(self.target_chain).await {
                tracing::warn!(operation = self.label, %error, "network switch failed");
                return Err(error);
            }
        }

        self.set(TxState {
            phase: TxPhase::Pending,
            hash: None,
            error: None,
        });

        let hash = match self.wallet.write_call(self.contract, call).await {
            Ok(hash) => hash,
            Err(error) => {
                tracing::warn!(operation = self.label, %error, "submission failed");
                self.set(TxState {
                    phase: TxPhase::Error,
                    hash: None,
                    error: Some(error.clone()),
                });
                return Err(error);
            }
        };

        // The handle exists from this point on and is retained for display.
        self.set(TxState {
            phase: TxPhase::Confirming,
            hash: Some(hash),
            error: None,
        });

        if let Err(error) = self.wallet.wait_for_receipt(&hash).await {
            tracing::warn!(operation = self.label, %hash, %error, "confirmation failed");
            self.set(TxState {
                phase: TxPhase::Error,
                hash: Some(hash),
                error: Some(error.clone()),
            });
            return Err(error);
        }

        // The wait suspended this flow; the session may be gone by now, in
        // which case no success state may be published for it.
        if !self.wallet.state().connected {
            tracing::debug!(
                operation = self.label,
                %hash,
                "wallet disconnected while awaiting confirmation"
            );
            self.set(TxState::idle());
            return Err(WalletError::Confirmation(
                "wallet disconnected while awaiting confirmation".into(),
            ));
        }

        tracing::info!(operation = self.label, %hash, "transaction confirmed");
        self.set(TxState {
            phase: TxPhase::Success,
            hash: Some(hash),
            error: None,
        });
        self.schedule_idle_reset(generation);

        Ok(hash)
    }

    fn set(&self, state: TxState) {
        tracing::debug!(operation = self.label, phase = %state.phase, "phase transition");
        self.state_tx.send_replace(state);
    }

    /// Return to `Idle` after the display window, unless a newer call has
    /// taken over the tracker in the meantime.
    fn schedule_idle_reset(&self, generation: u64) {
        let state_tx = self.state_tx.clone();
        let current = self.generation.clone();
        let label = self.label;
        tokio::spawn(async move {
            tokio::time::sleep(SUCCESS_DISPLAY_WINDOW).await;
            if current.load(Ordering::SeqCst) == generation {
                tracing::debug!(operation = label, "success display window elapsed");
                state_tx.send_replace(TxState::idle());
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use client_chain_core::mock::MockWallet;
    use client_chain_core::{CallArg, ProviderState};

    use super::*;

    const CHAIN: ChainId = ChainId(42220);

    fn addr(n: u8) -> Address {
        Address::new([n; 20])
    }

    fn call() -> ContractCall {
        ContractCall::new("claimTokens", vec![CallArg::Uint(1)])
    }

    fn tracker_on(wallet: Arc<MockWallet>) -> TxTracker {
        TxTracker::new("claim_tokens", wallet, addr(9), CHAIN)
    }

    #[tokio::test]
    async fn missing_signer_fails_before_any_network_call() {
        let wallet = Arc::new(MockWallet::disconnected());
        let tracker = tracker_on(wallet.clone());

        let result = tracker.submit(call()).await;
        assert!(matches!(result, Err(WalletError::NoWallet)));
        assert_eq!(tracker.state().phase, TxPhase::Idle);
        assert!(wallet.writes().is_empty());
    }

    #[tokio::test]
    async fn failed_network_switch_stays_idle() {
        let wallet = Arc::new(MockWallet::connected(addr(1), ChainId(1)));
        wallet.fail_switch(WalletError::NetworkSwitch {
            target: CHAIN,
            reason: "rejected".into(),
        });
        let tracker = tracker_on(wallet.clone());

        let result = tracker.submit(call()).await;
        assert!(matches!(result, Err(WalletError::NetworkSwitch { .. })));
        assert_eq!(tracker.state().phase, TxPhase::Idle);
        assert!(wallet.writes().is_empty());
    }

    #[tokio::test]
    async fn mismatched_chain_switches_before_submitting() {
        let wallet = Arc::new(MockWallet::connected(addr(1), ChainId(1)));
        let tracker = tracker_on(wallet.clone());

        tracker.submit(call()).await.unwrap();
        assert_eq!(wallet.state().chain_id, Some(CHAIN));
        assert_eq!(wallet.writes().len(), 1);
    }

    #[tokio::test]
    async fn submission_failure_lands_in_error_with_no_hash() {
        let wallet = Arc::new(MockWallet::connected(addr(1), CHAIN));
        wallet.push_write_outcome(Err(WalletError::Submission("user rejected".into())));
        let tracker = tracker_on(wallet);

        let result = tracker.submit(call()).await;
        assert!(matches!(result, Err(WalletError::Submission(_))));

        let state = tracker.state();
        assert_eq!(state.phase, TxPhase::Error);
        assert_eq!(state.hash, None);
        assert!(matches!(state.error, Some(WalletError::Submission(_))));
    }

    #[tokio::test(start_paused = true)]
    async fn success_resets_to_idle_after_display_window() {
        let wallet = Arc::new(MockWallet::connected(addr(1), CHAIN));
        let tracker = tracker_on(wallet);

        let hash = tracker.submit(call()).await.unwrap();
        let state = tracker.state();
        assert_eq!(state.phase, TxPhase::Success);
        assert_eq!(state.hash, Some(hash));

        tokio::time::sleep(SUCCESS_DISPLAY_WINDOW + Duration::from_millis(50)).await;
        let state = tracker.state();
        assert_eq!(state.phase, TxPhase::Idle);
        assert_eq!(state.hash, None);
    }

    #[tokio::test(start_paused = true)]
    async fn stale_display_reset_does_not_clobber_a_newer_call() {
        let wallet = Arc::new(MockWallet::connected(addr(1), CHAIN));
        let tracker = tracker_on(wallet);

        tracker.submit(call()).await.unwrap();
        tokio::time::sleep(Duration::from_secs(1)).await;

        // Second call takes over the tracker before the first reset fires.
        let second = tracker.submit(call()).await.unwrap();
        tokio::time::sleep(Duration::from_millis(2_500)).await;

        let state = tracker.state();
        assert_eq!(state.phase, TxPhase::Success);
        assert_eq!(state.hash, Some(second));
    }

    #[tokio::test]
    async fn concurrent_trackers_stay_isolated() {
        let wallet = Arc::new(MockWallet::connected(addr(1), CHAIN));
        wallet.push_write_outcome(Err(WalletError::Submission("insufficient funds".into())));

        let purchase = TxTracker::new("purchase_item", wallet.clone(), addr(9), CHAIN);
        let claim = TxTracker::new("claim_nft", wallet.clone(), addr(9), CHAIN);

        let (purchase_result, claim_result) =
            tokio::join!(purchase.submit(call()), claim.submit(call()));

        // Scripted failure hit exactly one tracker; the other completed.
        assert!(purchase_result.is_err());
        assert!(claim_result.is_ok());

        assert_eq!(purchase.state().phase, TxPhase::Error);
        assert!(purchase.state().hash.is_none());
        assert_eq!(claim.state().phase, TxPhase::Success);
        assert!(claim.state().hash.is_some());
        assert!(claim.state().error.is_none());
    }

    #[tokio::test]
    async fn disconnect_during_confirmation_suppresses_success() {
        let wallet = Arc::new(MockWallet::connected(addr(1), CHAIN));
        wallet.set_receipt_delay(Duration::from_millis(50));
        let tracker = Arc::new(tracker_on(wallet.clone()));

        let submit = {
            let tracker = tracker.clone();
            tokio::spawn(async move { tracker.submit(call()).await })
        };
        tokio::time::sleep(Duration::from_millis(10)).await;
        wallet.set_state(ProviderState::disconnected());

        let result = submit.await.unwrap();
        assert!(matches!(result, Err(WalletError::Confirmation(_))));
        assert_eq!(tracker.state().phase, TxPhase::Idle);
    }
}
