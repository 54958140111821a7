//! Dual-provider session reconciliation.
//!
//! Two wallet providers update independently (the embedded host bridge and
//! the externally-connected browser wallet); exactly one is authoritative
//! per process run, fixed at startup by the capability probe. The
//! reconciler merges the authoritative provider's signals into one canonical
//! session view that every other component treats as ground truth; nothing
//! downstream reads a raw provider.

use std::sync::Arc;

use tokio::sync::watch;
use tokio::task::JoinHandle;

use client_chain_core::{Address, ChainId, EnvironmentProbe, WalletTransport};

/// Which wallet environment this process runs in. Never re-evaluated
/// mid-session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display)]
#[strum(serialize_all = "snake_case")]
pub enum Environment {
    EmbeddedWallet,
    ExternalWallet,
}

/// The authoritative wallet source, selected once via the environment probe.
///
/// Downstream code never branches on the environment; the variant is the
/// only place where embedded and external behavior diverge (auto-connect).
#[derive(Clone)]
pub enum WalletSource {
    Embedded(Arc<dyn WalletTransport>),
    External(Arc<dyn WalletTransport>),
}

impl WalletSource {
    /// Pick the authoritative source for this run.
    pub fn detect(
        probe: &dyn EnvironmentProbe,
        embedded: Arc<dyn WalletTransport>,
        external: Arc<dyn WalletTransport>,
    ) -> Self {
        if probe.embedded_wallet_available() {
            WalletSource::Embedded(embedded)
        } else {
            WalletSource::External(external)
        }
    }

    pub fn environment(&self) -> Environment {
        match self {
            WalletSource::Embedded(_) => Environment::EmbeddedWallet,
            WalletSource::External(_) => Environment::ExternalWallet,
        }
    }

    pub fn transport(&self) -> &Arc<dyn WalletTransport> {
        match self {
            WalletSource::Embedded(transport) | WalletSource::External(transport) => transport,
        }
    }
}

/// Canonical connection view consumed by the orchestrator and the operation
/// adapters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub environment: Environment,
    pub connected: bool,
    pub address: Option<Address>,
    pub chain_id: Option<ChainId>,
}

impl Session {
    pub fn disconnected(environment: Environment) -> Self {
        Self {
            environment,
            connected: false,
            address: None,
            chain_id: None,
        }
    }
}

/// Merges provider signals into the canonical [`Session`] view.
pub struct SessionReconciler {
    source: WalletSource,
}

impl SessionReconciler {
    pub fn new(source: WalletSource) -> Self {
        Self { source }
    }

    /// Spawn the reconciliation worker.
    pub fn spawn(self) -> SessionHandle {
        let environment = self.source.environment();
        let (view_tx, view_rx) = watch::channel(Session::disconnected(environment));
        let task = tokio::spawn(run(self.source, view_tx));
        SessionHandle {
            view: view_rx,
            task,
        }
    }
}

/// Handle owning the merged session view. Dropping it stops reconciliation.
pub struct SessionHandle {
    view: watch::Receiver<Session>,
    task: JoinHandle<()>,
}

impl SessionHandle {
    pub fn subscribe(&self) -> watch::Receiver<Session> {
        self.view.clone()
    }

    pub fn current(&self) -> Session {
        self.view.borrow().clone()
    }
}

impl Drop for SessionHandle {
    fn drop(&mut self) {
        self.task.abort();
    }
}

async fn run(source: WalletSource, view_tx: watch::Sender<Session>) {
    let environment = source.environment();
    let transport = source.transport().clone();
    let mut provider_rx = transport.subscribe();

    // Embedded hosts get one automatic connect attempt per disconnected
    // period; repeated failures must not loop. External connections are
    // strictly user-initiated.
    let auto_connect = matches!(source, WalletSource::Embedded(_));
    let mut connect_attempted = false;

    loop {
        let provider = provider_rx.borrow_and_update().clone();

        let merged = if provider.connected {
            Session {
                environment,
                connected: true,
                address: provider.address,
                chain_id: provider.chain_id,
            }
        } else {
            Session::disconnected(environment)
        };

        view_tx.send_if_modified(|view| {
            if *view == merged {
                false
            } else {
                tracing::debug!(
                    %environment,
                    connected = merged.connected,
                    address = ?merged.address,
                    "session view updated"
                );
                *view = merged;
                true
            }
        });

        if provider.connected {
            connect_attempted = false;
        } else if auto_connect && !connect_attempted {
            connect_attempted = true;
            match transport.connect().await {
                Ok(()) => {
                    tracing::info!("embedded wallet auto-connect succeeded");
                    // Re-read immediately; the provider published its state.
                    continue;
                }
                Err(error) => {
                    tracing::warn!(%error, "embedded wallet auto-connect failed");
                }
            }
        }

        if provider_rx.changed().await.is_err() {
            tracing::debug!(%environment, "provider stream closed, stopping reconciler");
            return;
        }
    }
}
