//! Deployed contract addresses and game constants, per network.

use std::sync::OnceLock;

use client_chain_core::Address;

use crate::config::CeloNetwork;

/// Addresses of the deployed game contracts on one network.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContractAddresses {
    /// Main game contract (player registry, sessions, leaderboards)
    pub game: Address,

    /// Quest token (ERC-20 stage rewards)
    pub quest_token: Address,

    /// Runner badge (ERC-721 stage completion NFTs)
    pub runner_badge: Address,

    /// Marketplace (platform fee: 2.5%)
    pub marketplace: Address,

    /// cUSD stable token
    pub cusd_token: Address,
}

impl ContractAddresses {
    /// Address book for `network`.
    pub fn for_network(network: CeloNetwork) -> &'static ContractAddresses {
        match network {
            CeloNetwork::Mainnet => mainnet(),
            CeloNetwork::Sepolia => sepolia(),
        }
    }
}

fn parse(literal: &str) -> Address {
    Address::from_hex(literal).expect("valid address literal")
}

fn mainnet() -> &'static ContractAddresses {
    static BOOK: OnceLock<ContractAddresses> = OnceLock::new();
    BOOK.get_or_init(|| ContractAddresses {
        game: parse("0x553efD80A0ADEd286Ed49F78Ba5051846db91B37"),
        quest_token: parse("0x7B61f8EadD960a2e676f26E6968F5f65FebE1341"),
        runner_badge: parse("0xe0Aad78b3615ce64469518f4E406B580de5cABaA"),
        marketplace: parse("0x387998f2eA7f6f4F81cc583ba2bDB841d2bB77C6"),
        cusd_token: parse("0x765DE816845861e75A25fCA122bb6898B8B1282a"),
    })
}

fn sepolia() -> &'static ContractAddresses {
    static BOOK: OnceLock<ContractAddresses> = OnceLock::new();
    BOOK.get_or_init(|| ContractAddresses {
        game: parse("0x4588b0ff4016952e4391dea6dcc7f9a1484ac7b6"),
        quest_token: parse("0x48e2e16a5cfe127fbfc76f3fd85163bbae64a861"),
        runner_badge: parse("0x7b72c0e84012f868fe9a4164a8122593d0f38b84"),
        marketplace: parse("0x2d133d0E526193C17AA0Cb0ceD0D9081fbc6Ad73"),
        cusd_token: parse("0xdE9e4C3ce781b4bA68120d6261cbad65ce0aB00b"),
    })
}

/// Game economy constants mirrored from the deployed contract.
pub mod game {
    /// In-game coins granted on registration.
    pub const REGISTRATION_BONUS: u64 = 100;

    /// Score multiplier applied when a stage is completed.
    pub const COMPLETION_MULTIPLIER: u64 = 2;

    pub const TOTAL_STAGES: u64 = 3;

    /// Quest tokens earned for completing `stage`.
    pub fn stage_reward(stage: u64) -> u64 {
        match stage {
            1 => 20,
            2 => 50,
            3 => 100,
            _ => 0,
        }
    }

    /// Badge minted for completing `stage`.
    pub fn stage_badge(stage: u64) -> Option<&'static str> {
        match stage {
            1 => Some("Explorer Badge"),
            2 => Some("Adventurer Badge"),
            3 => Some("Master Badge"),
            _ => None,
        }
    }
}
