//! Outbound events: everything the core asks the transport to deliver.
//!
//! Core operations return `(Recipient, Event)` pairs. The transport layer
//! only fans these out; it never inspects them.

use serde::{Deserialize, Serialize};

use crate::{
    Card, PlayerId, PowerUpCounts, PowerUpKind, SessionId, SessionView,
};

/// How a bluff round was resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum BluffOutcome {
    /// The vote accepted the defender's word (ties accept).
    Accepted,
    /// The vote rejected the word.
    Rejected,
    /// The defender conceded without submitting a word.
    Admitted,
}

/// Final vote tally attached to a voted bluff result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoteTally {
    pub valid: usize,
    pub invalid: usize,
}

/// A card revealed privately to the actor of a reveal-card power-up.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RevealedCard {
    /// Display name of the opponent whose card was exposed.
    pub player: String,
    pub card: Card,
}

/// An outbound notification.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Event {
    /// Unicast on connect: echoes the player's assigned id.
    Connected { player_id: PlayerId },

    /// Unicast to the creator of a new session.
    GameCreated {
        session_id: SessionId,
        player_id: PlayerId,
        is_host: bool,
        session: SessionView,
    },

    /// Unicast to a joiner.
    GameJoined {
        session_id: SessionId,
        player_id: PlayerId,
        is_host: bool,
        session: SessionView,
    },

    /// Broadcast: the sanitized session plus a human-readable note.
    GameUpdate {
        session: SessionView,
        message: String,
    },

    /// Unicast: the receiving player's private hand.
    HandUpdate { hand: Vec<Card> },

    /// Broadcast when the host starts the game.
    GameStarted {
        session: SessionView,
        timer_active: bool,
        powerups_enabled: bool,
    },

    /// Unicast: the receiving player's remaining power-up charges.
    PowerUpsUpdate { power_ups: PowerUpCounts },

    /// Unicast to the actor of a successful power-up.
    PowerUpUsed {
        kind: PowerUpKind,
        remaining: PowerUpCounts,
        /// Set for extra-draw.
        new_card: Option<Card>,
        /// Set for reveal-card; private to the actor.
        revealed: Option<RevealedCard>,
    },

    /// Broadcast description of a power-up's visible effect.
    PowerUpEffect { player: String, effect: String },

    /// Broadcast when a turn timer is (re)armed.
    TimerStart {
        duration_secs: u64,
        player_id: PlayerId,
    },

    /// Broadcast drift-correction notice while a timer runs.
    TimerSync {
        time_left_secs: u64,
        player_id: PlayerId,
    },

    /// Broadcast when a timer expires and a card is auto-played.
    TimerExpired { player: String, message: String },

    /// Broadcast when a bluff is called: the exposed letters to cover.
    BluffChallenge {
        defender_id: PlayerId,
        defender_name: String,
        challenger_id: PlayerId,
        challenger_name: String,
        /// Plain table letters plus one joker entry per joker on the table.
        table_letters: Vec<Card>,
    },

    /// Broadcast when the defender's word passes shape checks and goes
    /// to a vote.
    BluffVote {
        word: String,
        proposer_id: PlayerId,
    },

    /// Broadcast after each counted (non-final) vote.
    VoteUpdate { votes_remaining: usize },

    /// Broadcast when a bluff round is resolved.
    BluffResult {
        result: BluffOutcome,
        defender_name: String,
        challenger_name: String,
        /// The contested word; absent when the defender admitted.
        word: Option<String>,
        winner: String,
        votes: Option<VoteTally>,
        /// Set when a tie was resolved in the defender's favor.
        tie_break: bool,
    },

    /// Broadcast once when the cooperative target score is reached.
    CoopVictory { message: String, score: u32 },

    /// Broadcast chat line.
    ChatMessage {
        player: String,
        message: String,
        timestamp_ms: u64,
    },

    /// Broadcast when a player leaves or disconnects.
    PlayerLeft {
        player_id: PlayerId,
        player_name: String,
        players_remaining: usize,
    },

    /// Unicast to the actor whose command failed.
    Error { message: String },
}

impl Event {
    /// Convenience constructor for the uniform failure notification.
    pub fn error(message: impl Into<String>) -> Self {
        Self::Error {
            message: message.into(),
        }
    }
}
