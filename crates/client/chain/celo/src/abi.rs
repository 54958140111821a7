//! CeloRunner contract call surface.
//!
//! Typed builders over the raw `(function, args)` call encoding the
//! transports consume. Argument order follows the contract's declared
//! signatures.
//!
//! ## Contract reference
//!
//! ```solidity
//! function registerPlayer(string username) external;
//! function saveGameSession(uint256 stage, uint256 finalScore,
//!     uint256 coinsCollected, uint256 questionsCorrect,
//!     bool stageCompleted) external;
//! function purchaseItem(string itemType, uint256 cost) external;
//! function claimTokens(uint256 stage) external;
//! function claimNFT(uint256 stage) external;
//!
//! function getPlayer(address player) external view returns (Player);
//! function getStageLeaderboard(uint256 stage, uint256 limit)
//!     external view returns (GameSession[]);
//! function getGeneralLeaderboard(uint256 limit)
//!     external view returns (GameSession[]);
//! function isStageCompleted(address player, uint256 stage)
//!     external view returns (bool);
//! function areTokensClaimed(address player, uint256 stage)
//!     external view returns (bool);
//! function isNFTClaimed(address player, uint256 stage)
//!     external view returns (bool);
//! function getGameStats() external view
//!     returns (uint256 totalPlayers, uint256 totalGamesPlayed);
//! ```

use client_chain_core::{Address, CallArg, ContractCall};

/// Contract function names.
pub mod functions {
    pub const REGISTER_PLAYER: &str = "registerPlayer";
    pub const SAVE_GAME_SESSION: &str = "saveGameSession";
    pub const PURCHASE_ITEM: &str = "purchaseItem";
    pub const CLAIM_TOKENS: &str = "claimTokens";
    pub const CLAIM_NFT: &str = "claimNFT";

    pub const GET_PLAYER: &str = "getPlayer";
    pub const GET_STAGE_LEADERBOARD: &str = "getStageLeaderboard";
    pub const GET_GENERAL_LEADERBOARD: &str = "getGeneralLeaderboard";
    pub const IS_STAGE_COMPLETED: &str = "isStageCompleted";
    pub const ARE_TOKENS_CLAIMED: &str = "areTokensClaimed";
    pub const IS_NFT_CLAIMED: &str = "isNFTClaimed";
    pub const GET_GAME_STATS: &str = "getGameStats";
}

// ============================================================================
// Write calls
// ============================================================================

pub fn register_player(username: &str) -> ContractCall {
    ContractCall::new(
        functions::REGISTER_PLAYER,
        vec![CallArg::Str(username.to_string())],
    )
}

pub fn save_game_session(
    stage: u64,
    score: u64,
    coins_collected: u64,
    correct_answers: u64,
    completed: bool,
) -> ContractCall {
    ContractCall::new(
        functions::SAVE_GAME_SESSION,
        vec![
            CallArg::Uint(stage.into()),
            CallArg::Uint(score.into()),
            CallArg::Uint(coins_collected.into()),
            CallArg::Uint(correct_answers.into()),
            CallArg::Bool(completed),
        ],
    )
}

pub fn purchase_item(item_type: &str, cost: u64) -> ContractCall {
    ContractCall::new(
        functions::PURCHASE_ITEM,
        vec![CallArg::Str(item_type.to_string()), CallArg::Uint(cost.into())],
    )
}

pub fn claim_tokens(stage: u64) -> ContractCall {
    ContractCall::new(functions::CLAIM_TOKENS, vec![CallArg::Uint(stage.into())])
}

pub fn claim_nft(stage: u64) -> ContractCall {
    ContractCall::new(functions::CLAIM_NFT, vec![CallArg::Uint(stage.into())])
}

// ============================================================================
// Read calls
// ============================================================================

pub fn get_player(player: Address) -> ContractCall {
    ContractCall::new(functions::GET_PLAYER, vec![CallArg::Address(player)])
}

pub fn get_stage_leaderboard(stage: u64, limit: u64) -> ContractCall {
    ContractCall::new(
        functions::GET_STAGE_LEADERBOARD,
        vec![CallArg::Uint(stage.into()), CallArg::Uint(limit.into())],
    )
}

pub fn get_general_leaderboard(limit: u64) -> ContractCall {
    ContractCall::new(
        functions::GET_GENERAL_LEADERBOARD,
        vec![CallArg::Uint(limit.into())],
    )
}

pub fn is_stage_completed(player: Address, stage: u64) -> ContractCall {
    ContractCall::new(
        functions::IS_STAGE_COMPLETED,
        vec![CallArg::Address(player), CallArg::Uint(stage.into())],
    )
}

pub fn are_tokens_claimed(player: Address, stage: u64) -> ContractCall {
    ContractCall::new(
        functions::ARE_TOKENS_CLAIMED,
        vec![CallArg::Address(player), CallArg::Uint(stage.into())],
    )
}

pub fn is_nft_claimed(player: Address, stage: u64) -> ContractCall {
    ContractCall::new(
        functions::IS_NFT_CLAIMED,
        vec![CallArg::Address(player), CallArg::Uint(stage.into())],
    )
}

pub fn get_game_stats() -> ContractCall {
    ContractCall::new(functions::GET_GAME_STATS, vec![])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn save_game_session_preserves_declared_argument_order() {
        let call = save_game_session(2, 900, 34, 5, true);
        assert_eq!(call.function, "saveGameSession");
        assert_eq!(
            call.args,
            vec![
                CallArg::Uint(2),
                CallArg::Uint(900),
                CallArg::Uint(34),
                CallArg::Uint(5),
                CallArg::Bool(true),
            ]
        );
    }

    #[test]
    fn read_calls_carry_query_arguments() {
        let player = Address::new([7u8; 20]);
        let call = are_tokens_claimed(player, 3);
        assert_eq!(
            call.args,
            vec![CallArg::Address(player), CallArg::Uint(3)]
        );
        assert!(get_game_stats().args.is_empty());
    }
}
