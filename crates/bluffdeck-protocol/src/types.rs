//! Core identity and card types.
//!
//! Everything in this module is visible to clients, so the serde shapes
//! here are the wire contract: ids serialize transparently, closed
//! vocabularies (modes, special cards) serialize as kebab/lowercase tags.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Identity types
// ---------------------------------------------------------------------------

/// A unique identifier for a player.
///
/// Newtype over the opaque connection identity assigned by the transport
/// layer. The id is stable for the lifetime of the connection; a player
/// who disconnects and returns is, from the core's point of view, a new
/// player.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PlayerId(pub u64);

impl fmt::Display for PlayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "P-{}", self.0)
    }
}

/// A unique identifier for a game session.
///
/// Format: `game_` followed by 16 hex characters (64 random bits), so a
/// session id cannot be guessed by probing.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(pub String);

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// Game modes
// ---------------------------------------------------------------------------

/// The closed set of game modes.
///
/// Inbound commands carry the mode as a raw string so that an unknown
/// mode is rejected with a validation error instead of a decode failure;
/// [`GameMode::from_str`] is that whitelist.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GameMode {
    Classic,
    Battle,
    Speed,
    Coop,
}

/// Returned when a mode string is not in the closed set.
#[derive(Debug, thiserror::Error)]
#[error("unknown game mode: {0}")]
pub struct UnknownGameMode(pub String);

impl FromStr for GameMode {
    type Err = UnknownGameMode;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "classic" => Ok(Self::Classic),
            "battle" => Ok(Self::Battle),
            "speed" => Ok(Self::Speed),
            "coop" => Ok(Self::Coop),
            other => Err(UnknownGameMode(other.to_string())),
        }
    }
}

impl fmt::Display for GameMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Classic => "classic",
            Self::Battle => "battle",
            Self::Speed => "speed",
            Self::Coop => "coop",
        };
        write!(f, "{s}")
    }
}

impl GameMode {
    /// Maximum seats for this mode. Battle is strictly head-to-head.
    pub fn max_players(&self) -> usize {
        match self {
            Self::Battle => 2,
            _ => 6,
        }
    }

    /// Whether the per-turn countdown runs in this mode.
    pub fn uses_timer(&self) -> bool {
        matches!(self, Self::Speed)
    }

    /// Turn duration in seconds when the timer is armed.
    pub fn timer_secs(&self) -> u64 {
        match self {
            Self::Speed => 15,
            _ => 30,
        }
    }

    /// Whether power-ups are on by default (battle only; other modes
    /// opt in through settings).
    pub fn default_powerups(&self) -> bool {
        matches!(self, Self::Battle)
    }

    /// Cards dealt to each player at round start.
    pub fn hand_size(&self) -> usize {
        match self {
            Self::Battle => 8,
            _ => 6,
        }
    }
}

/// Mode-derived session settings, fixed at creation time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settings {
    /// Turn timer on/off.
    pub timer: bool,
    /// Turn duration in seconds (only meaningful when `timer` is set).
    pub timer_secs: u64,
    /// Power-up economy on/off.
    pub powerups: bool,
    /// Seat cap for this session.
    pub max_players: usize,
    /// Shared team score instead of individual scoring.
    pub cooperative: bool,
}

impl Settings {
    /// Derives settings from a mode, with an optional explicit power-up
    /// override (e.g. classic mode with power-ups enabled).
    pub fn for_mode(mode: GameMode, powerups: Option<bool>) -> Self {
        Self {
            timer: mode.uses_timer(),
            timer_secs: mode.timer_secs(),
            powerups: powerups.unwrap_or_else(|| mode.default_powerups()),
            max_players: mode.max_players(),
            cooperative: matches!(mode, GameMode::Coop),
        }
    }
}

// ---------------------------------------------------------------------------
// Cards
// ---------------------------------------------------------------------------

/// A special (non-letter) card.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SpecialCard {
    /// Wildcard: counts toward minimum word length during a bluff, but
    /// does not require any particular letter.
    Joker,
    /// The turn pointer moves backward instead of forward.
    ReverseTurn,
    /// The turn pointer advances by two instead of one.
    SkipNext,
    /// Battle only: steal a random card from the next player's hand.
    StealCard,
    /// Battle only: exchange full hands with the next player.
    SwapHands,
    /// The next player draws up to three cards from the deck.
    DrawThree,
}

impl fmt::Display for SpecialCard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Joker => "joker",
            Self::ReverseTurn => "reverse-turn",
            Self::SkipNext => "skip-next",
            Self::StealCard => "steal-card",
            Self::SwapHands => "swap-hands",
            Self::DrawThree => "draw-three",
        };
        write!(f, "{s}")
    }
}

/// A single card: a letter or a special.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "lowercase")]
pub enum Card {
    /// An uppercase letter `A`–`Z`.
    Letter(char),
    Special(SpecialCard),
}

impl Card {
    /// The plain letter on this card, if it is a letter card.
    pub fn letter(&self) -> Option<char> {
        match self {
            Self::Letter(c) => Some(*c),
            Self::Special(_) => None,
        }
    }

    /// Whether this card is the joker wildcard.
    pub fn is_joker(&self) -> bool {
        matches!(self, Self::Special(SpecialCard::Joker))
    }
}

impl fmt::Display for Card {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Letter(c) => write!(f, "{c}"),
            Self::Special(s) => write!(f, "{s}"),
        }
    }
}

// ---------------------------------------------------------------------------
// Power-ups
// ---------------------------------------------------------------------------

/// The closed set of consumable power-ups.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PowerUpKind {
    /// Doubles the next bluff-round point this player scores.
    DoublePoints,
    /// Advances the turn pointer by one immediately.
    SkipTurn,
    /// Discloses one random opponent card to the actor only.
    RevealCard,
    /// Draws one extra card from the deck.
    ExtraDraw,
}

impl fmt::Display for PowerUpKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::DoublePoints => "double-points",
            Self::SkipTurn => "skip-turn",
            Self::RevealCard => "reveal-card",
            Self::ExtraDraw => "extra-draw",
        };
        write!(f, "{s}")
    }
}

/// Per-player remaining power-up charges.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PowerUpCounts {
    pub double_points: u8,
    pub skip_turn: u8,
    pub reveal_card: u8,
    pub extra_draw: u8,
}

impl Default for PowerUpCounts {
    /// The fixed starting allotment.
    fn default() -> Self {
        Self {
            double_points: 1,
            skip_turn: 1,
            reveal_card: 1,
            extra_draw: 2,
        }
    }
}

impl PowerUpCounts {
    /// Remaining charges for one kind.
    pub fn get(&self, kind: PowerUpKind) -> u8 {
        match kind {
            PowerUpKind::DoublePoints => self.double_points,
            PowerUpKind::SkipTurn => self.skip_turn,
            PowerUpKind::RevealCard => self.reveal_card,
            PowerUpKind::ExtraDraw => self.extra_draw,
        }
    }

    /// Consumes one charge. Returns `false` if none remain.
    pub fn consume(&mut self, kind: PowerUpKind) -> bool {
        let slot = match kind {
            PowerUpKind::DoublePoints => &mut self.double_points,
            PowerUpKind::SkipTurn => &mut self.skip_turn,
            PowerUpKind::RevealCard => &mut self.reveal_card,
            PowerUpKind::ExtraDraw => &mut self.extra_draw,
        };
        if *slot == 0 {
            return false;
        }
        *slot -= 1;
        true
    }
}

// ---------------------------------------------------------------------------
// Recipient — who should receive an event?
// ---------------------------------------------------------------------------

/// Specifies who should receive an outbound event.
///
/// Core operations return `(Recipient, Event)` pairs; the transport layer
/// fans them out. The core never holds a connection itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Recipient {
    /// Every player in the session.
    All,
    /// One specific player (private hand updates, reveal results, errors).
    Player(PlayerId),
    /// Everyone except the specified player.
    AllExcept(PlayerId),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_player_id_serializes_as_plain_number() {
        let json = serde_json::to_string(&PlayerId(42)).unwrap();
        assert_eq!(json, "42");
    }

    #[test]
    fn test_session_id_serializes_as_plain_string() {
        let id = SessionId("game_ab12".into());
        assert_eq!(serde_json::to_string(&id).unwrap(), "\"game_ab12\"");
    }

    #[test]
    fn test_game_mode_from_str_accepts_whitelist_only() {
        assert_eq!("classic".parse::<GameMode>().unwrap(), GameMode::Classic);
        assert_eq!("battle".parse::<GameMode>().unwrap(), GameMode::Battle);
        assert_eq!("speed".parse::<GameMode>().unwrap(), GameMode::Speed);
        assert_eq!("coop".parse::<GameMode>().unwrap(), GameMode::Coop);
        assert!("poker".parse::<GameMode>().is_err());
        assert!("CLASSIC".parse::<GameMode>().is_err());
    }

    #[test]
    fn test_settings_for_speed_mode_arms_timer() {
        let s = Settings::for_mode(GameMode::Speed, None);
        assert!(s.timer);
        assert_eq!(s.timer_secs, 15);
        assert!(!s.powerups);
        assert_eq!(s.max_players, 6);
    }

    #[test]
    fn test_settings_for_battle_mode_enables_powerups_and_caps_seats() {
        let s = Settings::for_mode(GameMode::Battle, None);
        assert!(s.powerups);
        assert_eq!(s.max_players, 2);
        assert!(!s.timer);
        assert_eq!(s.timer_secs, 30);
    }

    #[test]
    fn test_settings_explicit_powerup_override_wins() {
        let s = Settings::for_mode(GameMode::Classic, Some(true));
        assert!(s.powerups);
        let s = Settings::for_mode(GameMode::Battle, Some(false));
        assert!(!s.powerups);
    }

    #[test]
    fn test_card_letter_json_shape() {
        let json: serde_json::Value =
            serde_json::to_value(Card::Letter('E')).unwrap();
        assert_eq!(json["kind"], "letter");
        assert_eq!(json["value"], "E");
    }

    #[test]
    fn test_card_special_json_shape() {
        let json: serde_json::Value =
            serde_json::to_value(Card::Special(SpecialCard::ReverseTurn))
                .unwrap();
        assert_eq!(json["kind"], "special");
        assert_eq!(json["value"], "reverse-turn");
    }

    #[test]
    fn test_power_up_counts_consume_decrements_to_zero() {
        let mut counts = PowerUpCounts::default();
        assert!(counts.consume(PowerUpKind::SkipTurn));
        assert!(!counts.consume(PowerUpKind::SkipTurn));
        assert_eq!(counts.get(PowerUpKind::SkipTurn), 0);

        assert!(counts.consume(PowerUpKind::ExtraDraw));
        assert!(counts.consume(PowerUpKind::ExtraDraw));
        assert!(!counts.consume(PowerUpKind::ExtraDraw));
    }
}
