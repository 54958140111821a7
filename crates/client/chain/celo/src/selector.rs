//! Chain client selection.
//!
//! Maps an optional chain identifier to the network descriptor, contract
//! address book, and read-only client for that network. Selection is pure
//! with respect to its input; client construction is memoized by chain id so
//! repeated selection on every poll stays referentially stable.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use client_chain_core::{ChainId, ReadTransport};

use crate::config::{CeloNetwork, NetworkDescriptor};
use crate::contracts::ContractAddresses;

/// Everything a caller needs to talk to one network.
#[derive(Clone)]
pub struct ChainHandle {
    pub network: &'static NetworkDescriptor,
    pub contracts: &'static ContractAddresses,
    pub read: Arc<dyn ReadTransport>,
}

/// Builds a read client for a network. Injected so transport construction
/// stays outside this crate.
pub type ReadClientFactory =
    dyn Fn(&'static NetworkDescriptor) -> Arc<dyn ReadTransport> + Send + Sync;

/// Memoizing selector from chain identifier to [`ChainHandle`].
pub struct ChainSelector {
    factory: Box<ReadClientFactory>,
    cache: Mutex<HashMap<ChainId, ChainHandle>>,
}

impl ChainSelector {
    pub fn new<F>(factory: F) -> Self
    where
        F: Fn(&'static NetworkDescriptor) -> Arc<dyn ReadTransport> + Send + Sync + 'static,
    {
        Self {
            factory: Box::new(factory),
            cache: Mutex::new(HashMap::new()),
        }
    }

    /// Select the network for `chain_id`.
    ///
    /// The testnet is selected only for its exact identifier; every other
    /// value, including absence, selects production. Handles are cached per
    /// resolved network, so two calls with identifiers resolving to the same
    /// network return the same read client.
    pub fn select(&self, chain_id: Option<ChainId>) -> ChainHandle {
        let network = CeloNetwork::for_chain_id(chain_id);
        let descriptor = network.descriptor();

        let mut cache = self.cache.lock().unwrap();
        cache
            .entry(descriptor.chain_id)
            .or_insert_with(|| {
                tracing::debug!(network = descriptor.name, "constructing read client");
                ChainHandle {
                    network: descriptor,
                    contracts: ContractAddresses::for_network(network),
                    read: (self.factory)(descriptor),
                }
            })
            .clone()
    }
}
