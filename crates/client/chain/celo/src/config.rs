//! Celo network configuration.

use std::env;

use client_chain_core::ChainId;
use serde::{Deserialize, Serialize};

/// Celo network types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CeloNetwork {
    /// Celo mainnet
    Mainnet,
    /// Celo Sepolia testnet
    Sepolia,
}

/// Static description of a Celo network endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NetworkDescriptor {
    pub chain_id: ChainId,
    pub name: &'static str,
    pub rpc_url: &'static str,
    pub explorer_url: &'static str,
    pub currency_symbol: &'static str,
    pub currency_decimals: u8,
    pub testnet: bool,
}

static MAINNET: NetworkDescriptor = NetworkDescriptor {
    chain_id: ChainId(42220),
    name: "celo-mainnet",
    rpc_url: "https://forno.celo.org/",
    explorer_url: "https://explorer.celo.org",
    currency_symbol: "CELO",
    currency_decimals: 18,
    testnet: false,
};

static SEPOLIA: NetworkDescriptor = NetworkDescriptor {
    chain_id: ChainId(11142220),
    name: "celo-sepolia",
    rpc_url: "https://forno.celo-sepolia.celo-testnet.org/",
    explorer_url: "https://celo-sepolia.blockscout.com",
    currency_symbol: "CELO",
    currency_decimals: 18,
    testnet: true,
};

impl CeloNetwork {
    pub const fn chain_id(&self) -> ChainId {
        match self {
            CeloNetwork::Mainnet => ChainId(42220),
            CeloNetwork::Sepolia => ChainId(11142220),
        }
    }

    pub fn descriptor(&self) -> &'static NetworkDescriptor {
        match self {
            CeloNetwork::Mainnet => &MAINNET,
            CeloNetwork::Sepolia => &SEPOLIA,
        }
    }

    pub fn default_rpc_url(&self) -> &'static str {
        self.descriptor().rpc_url
    }

    /// Map an optional chain identifier to a network.
    ///
    /// The testnet is selected only for its exact identifier; every other
    /// value, including absence and unmapped chains, falls back to mainnet.
    pub fn for_chain_id(chain_id: Option<ChainId>) -> Self {
        match chain_id {
            Some(id) if id == CeloNetwork::Sepolia.chain_id() => CeloNetwork::Sepolia,
            _ => CeloNetwork::Mainnet,
        }
    }

    /// Whether `chain_id` names one of the two supported networks.
    pub fn is_known_chain_id(chain_id: ChainId) -> bool {
        chain_id == CeloNetwork::Mainnet.chain_id() || chain_id == CeloNetwork::Sepolia.chain_id()
    }
}

/// Celo-specific configuration.
#[derive(Debug, Clone)]
pub struct ChainConfig {
    /// Celo network to connect to
    pub network: CeloNetwork,

    /// Custom RPC endpoint URL (overrides network default)
    pub rpc_url: Option<String>,
}

impl ChainConfig {
    pub fn new(network: CeloNetwork) -> Self {
        Self {
            network,
            rpc_url: None,
        }
    }

    /// Load configuration from environment variables.
    ///
    /// Environment variables:
    /// - `CELO_NETWORK` - Network name (mainnet, sepolia) (default: mainnet)
    /// - `CELO_RPC_URL` - Custom RPC endpoint URL
    pub fn from_env() -> Result<Self, ConfigError> {
        let network = match env::var("CELO_NETWORK")
            .unwrap_or_else(|_| "mainnet".to_string())
            .to_lowercase()
            .as_str()
        {
            "mainnet" => CeloNetwork::Mainnet,
            "sepolia" | "testnet" => CeloNetwork::Sepolia,
            other => {
                return Err(ConfigError::UnknownNetwork(other.to_string()));
            }
        };

        let rpc_url = env::var("CELO_RPC_URL").ok();

        Ok(Self { network, rpc_url })
    }

    /// Set custom RPC URL.
    pub fn with_rpc_url(mut self, url: String) -> Self {
        self.rpc_url = Some(url);
        self
    }

    /// Get the RPC URL (custom or default for network).
    pub fn get_rpc_url(&self) -> &str {
        self.rpc_url
            .as_deref()
            .unwrap_or_else(|| self.network.default_rpc_url())
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let url = self.get_rpc_url();
        if !url.starts_with("http://") && !url.starts_with("https://") {
            return Err(ConfigError::InvalidRpcUrl(url.to_string()));
        }
        Ok(())
    }
}

impl Default for ChainConfig {
    fn default() -> Self {
        Self::new(CeloNetwork::Mainnet)
    }
}

/// Configuration errors.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid CELO_NETWORK: {0}. Must be mainnet or sepolia")]
    UnknownNetwork(String),

    #[error("invalid RPC URL format: {0}")]
    InvalidRpcUrl(String),
}
