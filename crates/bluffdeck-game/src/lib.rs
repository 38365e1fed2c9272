//! The synchronous rules core for Bluffdeck.
//!
//! Everything in this crate is pure, single-threaded game logic: the
//! session state machine ([`GameState`]), deck construction, input
//! validation, and rate limiting. No async, no I/O. Each rule operation
//! takes `&mut GameState` plus the acting player and returns either a
//! [`Transition`] (events to deliver, what to do with the turn timer,
//! whether to schedule a round reset) or a [`GameError`].
//!
//! The owning actor in the `bluffdeck` crate is responsible for
//! serializing calls per session and fanning the resulting events out.

mod bluff;
pub mod deck;
mod error;
pub mod limiter;
mod powerup;
mod state;
mod turn;
pub mod validate;

pub use error::GameError;
pub use limiter::{ActionKind, RateLimiter};
pub use state::{GameState, RemovedPlayer, TimerCmd, Transition};
pub use turn::COOP_TARGET_SCORE;
