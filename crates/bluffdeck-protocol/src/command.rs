//! Inbound commands: everything a connection can ask the core to do.

use serde::{Deserialize, Serialize};

use crate::{PowerUpKind, SessionId};

/// A command from one connection, delivered by the transport layer
/// together with that connection's [`PlayerId`](crate::PlayerId).
///
/// Internally tagged so the JSON reads `{ "type": "PlayCard", "card_index": 2 }`.
/// The game mode travels as a raw string — whitelist validation happens in
/// the core so an unknown mode yields a clean validation error instead of
/// a decode failure.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Command {
    /// Create a new session and seat the sender as host.
    CreateGame {
        player_name: String,
        game_mode: String,
        /// Explicit power-up opt-in/out; `None` uses the mode default.
        #[serde(default)]
        powerups: Option<bool>,
    },

    /// Join a specific session, or the first open lobby if no id is given.
    JoinGame {
        player_name: String,
        #[serde(default)]
        session_id: Option<SessionId>,
    },

    /// Host only: deal hands and begin the first round.
    StartGame,

    /// Play the card at `card_index` in the sender's hand.
    PlayCard { card_index: usize },

    /// Spend one power-up charge.
    UsePowerUp { kind: PowerUpKind },

    /// Challenge the last play as a bluff.
    CallBluff,

    /// Defender's answer to a bluff challenge.
    SubmitBluffWord { word: String },

    /// Peer vote on the defender's word.
    VoteBluffWord { is_valid: bool },

    /// Defender concedes the bluff.
    AdmitBluff,

    /// Session-wide chat.
    ChatMessage { text: String },

    /// Request a fresh snapshot plus the sender's private hand.
    RequestState,
}
