//! Stateless input checks and sanitization.
//!
//! Length limits are checked on the raw input, before stripping, so a
//! too-long name is rejected with a clear error instead of being silently
//! truncated. Sanitization removes angle brackets as a defense against
//! markup injection in whatever surface eventually renders these strings.

use std::str::FromStr;

use bluffdeck_protocol::GameMode;

use crate::GameError;

/// Minimum player name length (raw, before sanitization).
pub const NAME_MIN: usize = 2;
/// Maximum player name length.
pub const NAME_MAX: usize = 50;
/// Maximum chat message length.
pub const CHAT_MAX: usize = 200;

/// Strips `<`/`>`, trims surrounding whitespace, and truncates to
/// `max_chars` characters.
pub fn sanitize(input: &str, max_chars: usize) -> String {
    let stripped: String = input
        .chars()
        .filter(|c| *c != '<' && *c != '>')
        .collect();
    stripped.trim().chars().take(max_chars).collect()
}

/// Validates and sanitizes a player display name.
pub fn player_name(raw: &str) -> Result<String, GameError> {
    let len = raw.chars().count();
    if !(NAME_MIN..=NAME_MAX).contains(&len) {
        return Err(GameError::Validation(format!(
            "player name must be {NAME_MIN}-{NAME_MAX} characters"
        )));
    }
    let sanitized = sanitize(raw, NAME_MAX);
    if sanitized.chars().count() < NAME_MIN {
        return Err(GameError::Validation(
            "player name must contain at least 2 plain characters".into(),
        ));
    }
    Ok(sanitized)
}

/// Validates and sanitizes a chat message.
pub fn chat_message(raw: &str) -> Result<String, GameError> {
    if raw.chars().count() > CHAT_MAX {
        return Err(GameError::Validation(format!(
            "message too long (max {CHAT_MAX} characters)"
        )));
    }
    let sanitized = sanitize(raw, CHAT_MAX);
    if sanitized.is_empty() {
        return Err(GameError::Validation("empty message".into()));
    }
    Ok(sanitized)
}

/// Parses a mode string against the closed whitelist.
pub fn game_mode(raw: &str) -> Result<GameMode, GameError> {
    GameMode::from_str(raw)
        .map_err(|e| GameError::Validation(e.to_string()))
}
