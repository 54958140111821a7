//! Transport abstraction layer for the game client.
//!
//! This crate defines the seams between the wallet/transaction orchestration
//! core and its external collaborators:
//!
//! ```text
//! WalletTransport    - signing provider: account state, connect, chain
//!                      switch, write calls, wait-for-finality
//! ReadTransport      - read-only contract access returning RawValue
//! EnvironmentProbe   - host capability detection (embedded wallet bridge?)
//! ```
//!
//! Concrete wallet-connector libraries and RPC clients live behind these
//! traits and are out of scope here; the `mock` feature provides scriptable
//! in-memory implementations for tests.

pub mod traits;
pub mod types;

#[cfg(any(test, feature = "mock"))]
pub mod mock;

// Re-export all traits
pub use traits::{
    DecodeError, EnvironmentProbe, ReadError, ReadTransport, WalletError, WalletTransport,
};

// Re-export all types
pub use types::{
    Address, CallArg, ChainId, ContractCall, ParseError, ProviderState, RawValue, TxHash,
    TxReceipt,
};

#[cfg(any(test, feature = "mock"))]
pub use mock::{MockProbe, MockReadClient, MockWallet};
