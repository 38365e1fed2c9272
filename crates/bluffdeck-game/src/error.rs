//! Error taxonomy for the rules core.

/// Everything that can go wrong while applying a command to a session.
///
/// All variants are recoverable: the engine turns them into a single
/// unicast `Error` event for the acting player and the session carries
/// on. None of them ever tears down a session or the process.
#[derive(Debug, thiserror::Error)]
pub enum GameError {
    /// Bad input shape or content: name/message length, unknown mode,
    /// out-of-range card index, a bluff word that fails the letter checks.
    #[error("{0}")]
    Validation(String),

    /// The actor is seated but not allowed to do this: not the host,
    /// not their turn, challenging their own play, voting on their own word.
    #[error("{0}")]
    Unauthorized(String),

    /// The command is fine but the session is in the wrong status for it,
    /// e.g. playing a card while a bluff vote is pending.
    #[error("{0}")]
    InvalidState(String),

    /// The action budget for this window is spent.
    #[error("too many {action} actions, slow down")]
    RateLimited {
        /// Human-readable action label for the client message.
        action: &'static str,
    },

    /// No session or membership for the acting connection, or a lookup
    /// that should have succeeded came back empty. Treated defensively:
    /// one inconsistent session must never destabilize its siblings.
    #[error("{0}")]
    NotFound(String),
}
