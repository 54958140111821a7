//! Common types for wallet and read transports.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// EVM account address (20 bytes).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Address([u8; 20]);

impl Address {
    /// The all-zero address, used as the default for absent address fields.
    pub const ZERO: Address = Address([0u8; 20]);

    pub const fn new(bytes: [u8; 20]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; 20] {
        &self.0
    }

    /// Parse a `0x`-prefixed (or bare) 40-digit hex string.
    pub fn from_hex(s: &str) -> Result<Self, ParseError> {
        let digits = s.strip_prefix("0x").unwrap_or(s);
        let raw = hex::decode(digits).map_err(|_| ParseError::InvalidHex)?;
        let bytes: [u8; 20] = raw
            .try_into()
            .map_err(|_| ParseError::WrongLength { expected: 20 })?;
        Ok(Self(bytes))
    }

    /// Abbreviated `0x1234…abcd` form for display surfaces.
    pub fn short(&self) -> String {
        let full = self.to_string();
        format!("{}…{}", &full[..6], &full[full.len() - 4..])
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.0))
    }
}

impl FromStr for Address {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_hex(s)
    }
}

/// Transaction hash (32 bytes).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TxHash([u8; 32]);

impl TxHash {
    pub const fn new(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    pub fn from_hex(s: &str) -> Result<Self, ParseError> {
        let digits = s.strip_prefix("0x").unwrap_or(s);
        let raw = hex::decode(digits).map_err(|_| ParseError::InvalidHex)?;
        let bytes: [u8; 32] = raw
            .try_into()
            .map_err(|_| ParseError::WrongLength { expected: 32 })?;
        Ok(Self(bytes))
    }
}

impl fmt::Display for TxHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.0))
    }
}

/// Hex parsing failures for [`Address`] and [`TxHash`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum ParseError {
    #[error("invalid hex digits")]
    InvalidHex,

    #[error("wrong byte length, expected {expected}")]
    WrongLength { expected: usize },
}

/// EVM chain identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ChainId(pub u64);

impl fmt::Display for ChainId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A provider's view of the current account, as published by its event stream.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderState {
    pub connected: bool,
    pub address: Option<Address>,
    pub chain_id: Option<ChainId>,
}

impl ProviderState {
    pub fn connected(address: Address, chain_id: ChainId) -> Self {
        Self {
            connected: true,
            address: Some(address),
            chain_id: Some(chain_id),
        }
    }

    pub fn disconnected() -> Self {
        Self::default()
    }
}

/// Argument to a contract call, in the encoding the transport expects.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum CallArg {
    Uint(u128),
    Bool(bool),
    Str(String),
    Address(Address),
}

/// A contract function invocation: name plus encoded arguments.
///
/// The same shape serves both write calls (through the wallet transport) and
/// read calls (through the read transport).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContractCall {
    pub function: &'static str,
    pub args: Vec<CallArg>,
}

impl ContractCall {
    pub fn new(function: &'static str, args: Vec<CallArg>) -> Self {
        Self { function, args }
    }
}

/// Receipt returned once the transport reports a transaction finalized.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TxReceipt {
    pub hash: TxHash,
    pub block_number: u64,
    pub success: bool,
}

/// Raw decoded result of a contract read.
///
/// Read transports are not guaranteed to encode struct returns consistently
/// across client library versions: the same struct may arrive as an ordered
/// sequence of fields or as a name-keyed mapping. `RawValue` preserves the
/// shape as received; decoding into domain records happens downstream.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum RawValue {
    Bool(bool),
    Uint(u128),
    Str(String),
    Address(Address),
    List(Vec<RawValue>),
    Map(Vec<(String, RawValue)>),
}

impl RawValue {
    /// Positional access for sequence-shaped values.
    pub fn item(&self, index: usize) -> Option<&RawValue> {
        match self {
            RawValue::List(items) => items.get(index),
            _ => None,
        }
    }

    /// Name-keyed access for map-shaped values.
    pub fn named(&self, key: &str) -> Option<&RawValue> {
        match self {
            RawValue::Map(pairs) => pairs.iter().find(|(k, _)| k == key).map(|(_, v)| v),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn address_hex_round_trip() {
        let addr = Address::from_hex("0x553efD80A0ADEd286Ed49F78Ba5051846db91B37").unwrap();
        assert_eq!(
            addr.to_string(),
            "0x553efd80a0aded286ed49f78ba5051846db91b37"
        );
        assert_eq!(addr.short(), "0x553e…1b37");
    }

    #[test]
    fn address_rejects_bad_input() {
        assert_eq!(Address::from_hex("0xzz"), Err(ParseError::InvalidHex));
        assert_eq!(
            Address::from_hex("0x1234"),
            Err(ParseError::WrongLength { expected: 20 })
        );
    }

    #[test]
    fn raw_value_accessors_respect_shape() {
        let seq = RawValue::List(vec![RawValue::Uint(7), RawValue::Bool(true)]);
        assert_eq!(seq.item(1), Some(&RawValue::Bool(true)));
        assert_eq!(seq.named("anything"), None);

        let map = RawValue::Map(vec![("score".into(), RawValue::Uint(9))]);
        assert_eq!(map.named("score"), Some(&RawValue::Uint(9)));
        assert_eq!(map.item(0), None);
    }
}
