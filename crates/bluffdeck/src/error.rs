//! Unified error type for the engine layer.

use bluffdeck_game::GameError;
use bluffdeck_protocol::SessionId;

/// Top-level error for engine operations.
///
/// Rule failures pass through as [`GameError`]; the engine adds only the
/// failure modes of the actor plumbing itself. Every variant ends up as a
/// unicast `Event::Error` for the acting player — nothing here is fatal.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// A rule-level rejection from the game core.
    #[error(transparent)]
    Game(#[from] GameError),

    /// The session's actor task is gone (shut down or crashed); the
    /// command could not be delivered.
    #[error("game {0} is no longer available")]
    SessionUnavailable(SessionId),
}
