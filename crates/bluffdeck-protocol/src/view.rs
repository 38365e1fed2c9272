//! The sanitized session view sent to clients.
//!
//! This is the only shape in which session state ever leaves the core.
//! It deliberately omits other players' hands, the raw deck contents, and
//! all internal bookkeeping (rate limiters, vote latches, timer handles) —
//! only the deck *count* is exposed.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::{Card, GameMode, PlayerId, SessionId, Settings};

/// The lifecycle state of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SessionStatus {
    /// Waiting for the host to start; joinable.
    Lobby,
    /// A round is running; ordinary plays and bluff calls are accepted.
    InProgress,
    /// A bluff was called; waiting for the defender to answer.
    BluffChallenge,
    /// The defender produced a word; peers are voting on it.
    BluffVote,
}

impl SessionStatus {
    /// Whether new players may still join.
    pub fn is_joinable(&self) -> bool {
        matches!(self, Self::Lobby)
    }
}

impl std::fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Lobby => "lobby",
            Self::InProgress => "inProgress",
            Self::BluffChallenge => "bluffChallenge",
            Self::BluffVote => "bluffVote",
        };
        write!(f, "{s}")
    }
}

/// Public roster entry for one seated player.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerInfo {
    pub id: PlayerId,
    pub name: String,
    pub is_host: bool,
}

/// A snapshot of session state safe to broadcast to every member.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionView {
    pub id: SessionId,
    pub status: SessionStatus,
    pub host_id: PlayerId,
    /// Roster in seating order.
    pub players: Vec<PlayerInfo>,
    /// The shared table pile, oldest play first.
    pub table: Vec<Card>,
    /// Index into `players` of whoever acts next.
    pub current_turn: usize,
    pub scores: HashMap<PlayerId, u32>,
    pub last_player_played: Option<PlayerId>,
    pub challenger: Option<PlayerId>,
    /// Cards remaining in the deck. Never the cards themselves.
    pub deck_count: usize,
    pub settings: Settings,
    pub mode: GameMode,
    /// Shared score in cooperative mode, 0 otherwise.
    pub team_score: u32,
    /// Cooperative victory threshold, if the mode has one.
    pub target_score: Option<u32>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::GameMode;

    #[test]
    fn test_session_status_joinable_only_in_lobby() {
        assert!(SessionStatus::Lobby.is_joinable());
        assert!(!SessionStatus::InProgress.is_joinable());
        assert!(!SessionStatus::BluffChallenge.is_joinable());
        assert!(!SessionStatus::BluffVote.is_joinable());
    }

    #[test]
    fn test_session_view_round_trip() {
        let view = SessionView {
            id: SessionId("game_0011223344556677".into()),
            status: SessionStatus::InProgress,
            host_id: PlayerId(1),
            players: vec![
                PlayerInfo { id: PlayerId(1), name: "Ada".into(), is_host: true },
                PlayerInfo { id: PlayerId(2), name: "Bo".into(), is_host: false },
            ],
            table: vec![Card::Letter('E')],
            current_turn: 1,
            scores: HashMap::from([(PlayerId(1), 0), (PlayerId(2), 2)]),
            last_player_played: Some(PlayerId(1)),
            challenger: None,
            deck_count: 97,
            settings: Settings::for_mode(GameMode::Classic, None),
            mode: GameMode::Classic,
            team_score: 0,
            target_score: None,
        };
        let bytes = serde_json::to_vec(&view).unwrap();
        let decoded: SessionView = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(view, decoded);
    }

    #[test]
    fn test_session_view_exposes_deck_count_not_cards() {
        // The serialized view must not contain a "deck" or "hands" field.
        let view = SessionView {
            id: SessionId("game_x".into()),
            status: SessionStatus::Lobby,
            host_id: PlayerId(1),
            players: vec![],
            table: vec![],
            current_turn: 0,
            scores: HashMap::new(),
            last_player_played: None,
            challenger: None,
            deck_count: 109,
            settings: Settings::for_mode(GameMode::Classic, None),
            mode: GameMode::Classic,
            team_score: 0,
            target_score: None,
        };
        let json: serde_json::Value = serde_json::to_value(&view).unwrap();
        assert!(json.get("deck").is_none());
        assert!(json.get("hands").is_none());
        assert_eq!(json["deck_count"], 109);
    }
}
