//! Mock transports for testing without a network.

use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::watch;

use crate::traits::{EnvironmentProbe, ReadError, ReadTransport, WalletError, WalletTransport};
use crate::types::{Address, ChainId, ContractCall, ProviderState, RawValue, TxHash, TxReceipt};

// ============================================================================
// MockWallet
// ============================================================================

/// Scriptable in-memory wallet transport.
///
/// State changes are published through the same watch channel real providers
/// use, so reconciliation logic under test observes them identically.
pub struct MockWallet {
    state_tx: watch::Sender<ProviderState>,
    on_connect: Mutex<Option<ProviderState>>,
    connect_calls: AtomicU64,
    switch_error: Mutex<Option<WalletError>>,
    write_outcomes: Mutex<VecDeque<Result<TxHash, WalletError>>>,
    writes: Mutex<Vec<(Address, ContractCall)>>,
    receipt_outcomes: Mutex<VecDeque<Result<(), WalletError>>>,
    receipt_delay: Mutex<Option<Duration>>,
    tx_counter: AtomicU64,
}

impl MockWallet {
    pub fn disconnected() -> Self {
        Self::with_state(ProviderState::disconnected())
    }

    pub fn connected(address: Address, chain_id: ChainId) -> Self {
        Self::with_state(ProviderState::connected(address, chain_id))
    }

    fn with_state(state: ProviderState) -> Self {
        let (state_tx, _) = watch::channel(state);
        Self {
            state_tx,
            on_connect: Mutex::new(None),
            connect_calls: AtomicU64::new(0),
            switch_error: Mutex::new(None),
            write_outcomes: Mutex::new(VecDeque::new()),
            writes: Mutex::new(Vec::new()),
            receipt_outcomes: Mutex::new(VecDeque::new()),
            receipt_delay: Mutex::new(None),
            tx_counter: AtomicU64::new(0),
        }
    }

    /// Publish a new provider state, as an upstream account event would.
    pub fn set_state(&self, state: ProviderState) {
        self.state_tx.send_replace(state);
    }

    /// Make subsequent `connect()` calls succeed by adopting `state`.
    pub fn connect_into(&self, state: ProviderState) {
        *self.on_connect.lock().unwrap() = Some(state);
    }

    pub fn connect_calls(&self) -> u64 {
        self.connect_calls.load(Ordering::SeqCst)
    }

    /// Make subsequent `switch_chain()` calls fail with `error`.
    pub fn fail_switch(&self, error: WalletError) {
        *self.switch_error.lock().unwrap() = Some(error);
    }

    /// Queue the outcome of the next `write_call()`.
    pub fn push_write_outcome(&self, outcome: Result<TxHash, WalletError>) {
        self.write_outcomes.lock().unwrap().push_back(outcome);
    }

    /// Queue the outcome of the next `wait_for_receipt()`.
    pub fn push_receipt_outcome(&self, outcome: Result<(), WalletError>) {
        self.receipt_outcomes.lock().unwrap().push_back(outcome);
    }

    /// Delay every `wait_for_receipt()` by `delay` (paused-clock friendly).
    pub fn set_receipt_delay(&self, delay: Duration) {
        *self.receipt_delay.lock().unwrap() = Some(delay);
    }

    pub fn writes(&self) -> Vec<(Address, ContractCall)> {
        self.writes.lock().unwrap().clone()
    }

    fn next_hash(&self) -> TxHash {
        let n = self.tx_counter.fetch_add(1, Ordering::SeqCst) + 1;
        let mut bytes = [0u8; 32];
        bytes[24..].copy_from_slice(&n.to_be_bytes());
        TxHash::new(bytes)
    }
}

#[async_trait]
impl WalletTransport for MockWallet {
    fn state(&self) -> ProviderState {
        self.state_tx.borrow().clone()
    }

    fn subscribe(&self) -> watch::Receiver<ProviderState> {
        self.state_tx.subscribe()
    }

    async fn connect(&self) -> Result<(), WalletError> {
        self.connect_calls.fetch_add(1, Ordering::SeqCst);
        let target = self.on_connect.lock().unwrap().clone();
        match target {
            Some(state) => {
                self.state_tx.send_replace(state);
                Ok(())
            }
            None => Err(WalletError::Submission("no connector available".into())),
        }
    }

    async fn switch_chain(&self, target: ChainId) -> Result<(), WalletError> {
        if let Some(error) = self.switch_error.lock().unwrap().clone() {
            return Err(error);
        }
        self.state_tx.send_modify(|state| {
            state.chain_id = Some(target);
        });
        Ok(())
    }

    async fn write_call(
        &self,
        contract: Address,
        call: ContractCall,
    ) -> Result<TxHash, WalletError> {
        self.writes.lock().unwrap().push((contract, call));
        let scripted = self.write_outcomes.lock().unwrap().pop_front();
        match scripted {
            Some(outcome) => outcome,
            None => Ok(self.next_hash()),
        }
    }

    async fn wait_for_receipt(&self, hash: &TxHash) -> Result<TxReceipt, WalletError> {
        let delay = *self.receipt_delay.lock().unwrap();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        let scripted = self.receipt_outcomes.lock().unwrap().pop_front();
        match scripted {
            Some(Err(error)) => Err(error),
            _ => Ok(TxReceipt {
                hash: *hash,
                block_number: self.tx_counter.load(Ordering::SeqCst),
                success: true,
            }),
        }
    }
}

// ============================================================================
// MockReadClient
// ============================================================================

/// Scriptable in-memory read transport, keyed by contract function name.
pub struct MockReadClient {
    responses: Mutex<HashMap<&'static str, RawValue>>,
    one_shots: Mutex<HashMap<&'static str, VecDeque<Result<RawValue, ReadError>>>>,
    hanging: Mutex<HashSet<&'static str>>,
    calls: Mutex<Vec<ContractCall>>,
}

impl MockReadClient {
    pub fn new() -> Self {
        Self {
            responses: Mutex::new(HashMap::new()),
            one_shots: Mutex::new(HashMap::new()),
            hanging: Mutex::new(HashSet::new()),
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Fixed response for every call to `function`.
    pub fn set_response(&self, function: &'static str, value: RawValue) {
        self.responses.lock().unwrap().insert(function, value);
    }

    /// One-shot outcome consumed before any fixed response.
    pub fn push_response(&self, function: &'static str, outcome: Result<RawValue, ReadError>) {
        self.one_shots
            .lock()
            .unwrap()
            .entry(function)
            .or_default()
            .push_back(outcome);
    }

    /// Make calls to `function` suspend forever.
    pub fn hang(&self, function: &'static str) {
        self.hanging.lock().unwrap().insert(function);
    }

    pub fn call_count(&self, function: &str) -> usize {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|call| call.function == function)
            .count()
    }
}

impl Default for MockReadClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ReadTransport for MockReadClient {
    async fn read_call(
        &self,
        _contract: Address,
        call: ContractCall,
    ) -> Result<RawValue, ReadError> {
        let function = call.function;
        self.calls.lock().unwrap().push(call);

        if self.hanging.lock().unwrap().contains(function) {
            std::future::pending::<()>().await;
        }

        let one_shot = self
            .one_shots
            .lock()
            .unwrap()
            .get_mut(function)
            .and_then(|queue| queue.pop_front());
        if let Some(outcome) = one_shot {
            return outcome;
        }

        self.responses
            .lock()
            .unwrap()
            .get(function)
            .cloned()
            .ok_or_else(|| ReadError::call(function, "no response configured"))
    }
}

// ============================================================================
// MockProbe
// ============================================================================

/// Fixed-answer environment probe.
pub struct MockProbe {
    pub embedded: bool,
}

impl EnvironmentProbe for MockProbe {
    fn embedded_wallet_available(&self) -> bool {
        self.embedded
    }
}
