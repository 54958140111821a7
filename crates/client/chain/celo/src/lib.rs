//! Celo network integration for the game client.
//!
//! Provides the network descriptor book (mainnet / Sepolia testnet), the
//! deployed contract address book, typed contract call builders, and the
//! memoizing chain client selector. Everything here is static data plus
//! selection logic; actual transports are injected from outside.

pub mod abi;
pub mod config;
pub mod contracts;
pub mod selector;

// Re-export commonly used items
pub use config::{CeloNetwork, ChainConfig, ConfigError, NetworkDescriptor};
pub use contracts::ContractAddresses;
pub use selector::{ChainHandle, ChainSelector};
