//! Canonical record decoding for contract reads.
//!
//! The read transport's response encoding is not stable across client
//! library versions: a struct return may arrive as an ordered field sequence
//! or as a name-keyed mapping. This module is the single point of defense
//! against that instability: shape is detected per value (sequence first,
//! then mapping), fields map by declared position or by name, and anything
//! missing decodes to its zero value.
//!
//! Counters are narrowed from the transport's wide integers to `u64`,
//! saturating on overflow. Scores and coin balances beyond `u64::MAX` are
//! out of scope.

use client_chain_core::{Address, DecodeError, RawValue};
use serde::{Deserialize, Serialize};

// ============================================================================
// Canonical records
// ============================================================================

/// On-chain player record.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Player {
    pub username: String,
    pub is_registered: bool,
    pub current_stage: u64,
    pub total_score: u64,
    pub in_game_coins: u64,
    pub quest_tokens_earned: u64,
    pub total_games_played: u64,
    pub registration_time: u64,
}

impl Player {
    /// Registration completeness: the explicit flag, or a non-empty
    /// username; either can lag the other during confirmation windows.
    pub fn is_complete(&self) -> bool {
        self.is_registered || !self.username.trim().is_empty()
    }
}

/// One recorded game session, immutable once read.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameSession {
    pub player: Address,
    pub stage: u64,
    pub score: u64,
    pub coins_collected: u64,
    pub stage_completed: bool,
    pub timestamp: u64,
}

/// A game session with its position in the returned ordering.
///
/// Rank is assigned by read order; the contract does not store it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeaderboardEntry {
    pub rank: u64,
    pub session: GameSession,
}

/// Aggregate game statistics.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameStats {
    pub total_players: u64,
    pub total_games_played: u64,
}

// ============================================================================
// Decoding
// ============================================================================

/// Look up a struct field by declared position or by name, depending on the
/// shape the transport delivered.
fn field<'a>(raw: &'a RawValue, index: usize, name: &str) -> Option<&'a RawValue> {
    match raw {
        RawValue::List(_) => raw.item(index),
        RawValue::Map(_) => raw.named(name),
        _ => None,
    }
}

fn ensure_struct(raw: &RawValue, kind: &'static str) -> Result<(), DecodeError> {
    match raw {
        RawValue::List(_) | RawValue::Map(_) => Ok(()),
        _ => Err(DecodeError::AmbiguousShape { kind }),
    }
}

fn narrow(wide: u128) -> u64 {
    u64::try_from(wide).unwrap_or_else(|_| {
        tracing::warn!(value = %wide, "counter exceeds u64, saturating");
        u64::MAX
    })
}

fn uint(value: Option<&RawValue>) -> u64 {
    match value {
        Some(RawValue::Uint(n)) => narrow(*n),
        _ => 0,
    }
}

fn text(value: Option<&RawValue>) -> String {
    match value {
        Some(RawValue::Str(s)) => s.trim().to_string(),
        _ => String::new(),
    }
}

fn flag(value: Option<&RawValue>) -> bool {
    match value {
        Some(RawValue::Bool(b)) => *b,
        Some(RawValue::Uint(n)) => *n != 0,
        _ => false,
    }
}

fn address(value: Option<&RawValue>) -> Address {
    match value {
        Some(RawValue::Address(a)) => *a,
        Some(RawValue::Str(s)) => s.parse().unwrap_or(Address::ZERO),
        _ => Address::ZERO,
    }
}

/// Decode a player record, failing on unrecognized shapes.
pub fn try_player(raw: &RawValue) -> Result<Player, DecodeError> {
    ensure_struct(raw, "Player")?;
    Ok(Player {
        username: text(field(raw, 0, "username")),
        is_registered: flag(field(raw, 1, "isRegistered")),
        current_stage: uint(field(raw, 2, "currentStage")),
        total_score: uint(field(raw, 3, "totalScore")),
        in_game_coins: uint(field(raw, 4, "inGameCoins")),
        quest_tokens_earned: uint(field(raw, 5, "questTokensEarned")),
        total_games_played: uint(field(raw, 6, "totalGamesPlayed")),
        registration_time: uint(field(raw, 7, "registrationTime")),
    })
}

/// Decode a player record; an unrecognized shape yields all defaults so the
/// caller stays usable.
pub fn player(raw: &RawValue) -> Player {
    try_player(raw).unwrap_or_else(|error| {
        tracing::warn!(%error, "decoding player as defaults");
        Player::default()
    })
}

/// Decode one game session record, failing on unrecognized shapes.
pub fn try_game_session(raw: &RawValue) -> Result<GameSession, DecodeError> {
    ensure_struct(raw, "GameSession")?;
    Ok(GameSession {
        player: address(field(raw, 0, "player")),
        stage: uint(field(raw, 1, "stage")),
        score: uint(field(raw, 2, "score")),
        coins_collected: uint(field(raw, 3, "coinsCollected")),
        stage_completed: flag(field(raw, 4, "stageCompleted")),
        timestamp: uint(field(raw, 5, "timestamp")),
    })
}

/// Decode one game session record; unrecognized shapes yield defaults.
pub fn game_session(raw: &RawValue) -> GameSession {
    try_game_session(raw).unwrap_or_else(|error| {
        tracing::warn!(%error, "decoding game session as defaults");
        GameSession::default()
    })
}

/// Decode a leaderboard, assigning ranks by read order (1-based).
///
/// A non-sequence result decodes as an empty board.
pub fn leaderboard(raw: &RawValue) -> Vec<LeaderboardEntry> {
    match raw {
        RawValue::List(items) => items
            .iter()
            .enumerate()
            .map(|(index, item)| LeaderboardEntry {
                rank: index as u64 + 1,
                session: game_session(item),
            })
            .collect(),
        _ => {
            tracing::warn!("leaderboard result is not a sequence, decoding as empty");
            Vec::new()
        }
    }
}

/// Decode aggregate game statistics.
pub fn game_stats(raw: &RawValue) -> GameStats {
    match ensure_struct(raw, "GameStats") {
        Ok(()) => GameStats {
            total_players: uint(field(raw, 0, "totalPlayers")),
            total_games_played: uint(field(raw, 1, "totalGamesPlayed")),
        },
        Err(error) => {
            tracing::warn!(%error, "decoding game stats as defaults");
            GameStats::default()
        }
    }
}

/// Decode a bare boolean read (claim/completion flags).
pub fn boolean(raw: &RawValue) -> bool {
    flag(Some(raw))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn player_positional() -> RawValue {
        RawValue::List(vec![
            RawValue::Str("  alice  ".into()),
            RawValue::Bool(true),
            RawValue::Uint(2),
            RawValue::Uint(900),
            RawValue::Uint(150),
            RawValue::Uint(70),
            RawValue::Uint(12),
            RawValue::Uint(1_700_000_000),
        ])
    }

    fn player_named() -> RawValue {
        RawValue::Map(vec![
            ("registrationTime".into(), RawValue::Uint(1_700_000_000)),
            ("username".into(), RawValue::Str("  alice  ".into())),
            ("isRegistered".into(), RawValue::Bool(true)),
            ("currentStage".into(), RawValue::Uint(2)),
            ("totalScore".into(), RawValue::Uint(900)),
            ("inGameCoins".into(), RawValue::Uint(150)),
            ("questTokensEarned".into(), RawValue::Uint(70)),
            ("totalGamesPlayed".into(), RawValue::Uint(12)),
        ])
    }

    #[test]
    fn both_shapes_decode_identically() {
        let from_positional = player(&player_positional());
        let from_named = player(&player_named());
        assert_eq!(from_positional, from_named);
        assert_eq!(from_positional.username, "alice");
        assert_eq!(from_positional.total_score, 900);
    }

    #[test]
    fn missing_fields_default_to_zero_values() {
        let sparse = RawValue::Map(vec![("username".into(), RawValue::Str("bob".into()))]);
        let decoded = player(&sparse);
        assert_eq!(decoded.username, "bob");
        assert!(!decoded.is_registered);
        assert_eq!(decoded.total_score, 0);

        let truncated = RawValue::List(vec![RawValue::Str("bob".into())]);
        assert_eq!(player(&truncated), decoded);
    }

    #[test]
    fn completeness_holds_for_either_signal() {
        let flag_only = Player {
            is_registered: true,
            ..Player::default()
        };
        assert!(flag_only.is_complete());

        let name_only = Player {
            username: "carol".into(),
            ..Player::default()
        };
        assert!(name_only.is_complete());

        let whitespace_name = Player {
            username: "   ".into(),
            ..Player::default()
        };
        assert!(!whitespace_name.is_complete());
    }

    #[test]
    fn narrowing_saturates_above_u64() {
        let raw = RawValue::Map(vec![(
            "totalScore".into(),
            RawValue::Uint(u128::from(u64::MAX) + 1),
        )]);
        assert_eq!(player(&raw).total_score, u64::MAX);
    }

    #[test]
    fn unrecognized_shape_decodes_as_defaults() {
        assert_eq!(player(&RawValue::Uint(7)), Player::default());
        assert_eq!(
            try_player(&RawValue::Bool(false)),
            Err(DecodeError::AmbiguousShape { kind: "Player" })
        );
    }

    #[test]
    fn leaderboard_ranks_follow_read_order() {
        let board = RawValue::List(vec![
            RawValue::List(vec![
                RawValue::Address(Address::new([1u8; 20])),
                RawValue::Uint(1),
                RawValue::Uint(500),
            ]),
            RawValue::Map(vec![
                ("player".into(), RawValue::Address(Address::new([2u8; 20]))),
                ("stage".into(), RawValue::Uint(1)),
                ("score".into(), RawValue::Uint(400)),
            ]),
        ]);

        let entries = leaderboard(&board);
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].rank, 1);
        assert_eq!(entries[0].session.score, 500);
        assert_eq!(entries[1].rank, 2);
        assert_eq!(entries[1].session.player, Address::new([2u8; 20]));

        assert!(leaderboard(&RawValue::Uint(0)).is_empty());
    }

    #[test]
    fn game_stats_decodes_both_shapes() {
        let positional = game_stats(&RawValue::List(vec![
            RawValue::Uint(31),
            RawValue::Uint(208),
        ]));
        let named = game_stats(&RawValue::Map(vec![
            ("totalGamesPlayed".into(), RawValue::Uint(208)),
            ("totalPlayers".into(), RawValue::Uint(31)),
        ]));
        assert_eq!(positional, named);
        assert_eq!(positional.total_players, 31);
    }

    #[test]
    fn boolean_reads_tolerate_numeric_encodings() {
        assert!(boolean(&RawValue::Bool(true)));
        assert!(boolean(&RawValue::Uint(1)));
        assert!(!boolean(&RawValue::Uint(0)));
        assert!(!boolean(&RawValue::Str("true".into())));
    }
}
