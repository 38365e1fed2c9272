//! Wire-facing types for Bluffdeck.
//!
//! This crate defines the contract between the game core and the
//! transport layer:
//!
//! - **Commands** ([`Command`]) — what a connection can ask the core to do.
//! - **Events** ([`Event`], [`Recipient`]) — what the core asks the
//!   transport to deliver, and to whom.
//! - **Views** ([`SessionView`]) — the sanitized snapshot of session state
//!   that is safe to show clients.
//! - **Vocabulary** ([`Card`], [`GameMode`], [`PowerUpKind`], ids) — the
//!   closed sets the game is played with.
//!
//! The crate is deliberately passive: no I/O, no game rules, just shapes.
//! Rules live in `bluffdeck-game`; routing lives in `bluffdeck`.

mod command;
mod event;
mod types;
mod view;

pub use command::Command;
pub use event::{BluffOutcome, Event, RevealedCard, VoteTally};
pub use types::{
    Card, GameMode, PlayerId, PowerUpCounts, PowerUpKind, Recipient,
    SessionId, Settings, SpecialCard, UnknownGameMode,
};
pub use view::{PlayerInfo, SessionStatus, SessionView};
