//! # Bluffdeck
//!
//! Server-authoritative engine for a real-time multiplayer bluffing card
//! game. Each session runs as an isolated actor task that owns its game
//! state, its turn timer, and its deferred round resets; the [`Engine`]
//! is the single entry point a transport layer drives:
//!
//! ```rust,no_run
//! use bluffdeck::Engine;
//! use bluffdeck_protocol::{Command, PlayerId};
//! use tokio::sync::mpsc;
//!
//! # async fn example() {
//! let engine = Engine::new();
//! engine.spawn_maintenance();
//!
//! // For each accepted connection:
//! let (tx, mut rx) = mpsc::unbounded_channel();
//! let player = PlayerId(1);
//! engine.connect(player, tx).await;
//! engine
//!     .handle_command(
//!         player,
//!         Command::CreateGame {
//!             player_name: "Ada".into(),
//!             game_mode: "classic".into(),
//!             powerups: None,
//!         },
//!     )
//!     .await;
//! while let Some(event) = rx.recv().await {
//!     // serialize and deliver to the client
//!     let _ = serde_json::to_string(&event);
//! }
//! # }
//! ```

mod engine;
mod error;
mod registry;
mod session;

/// Installs a process-wide `tracing` subscriber filtered by `RUST_LOG`,
/// for binaries embedding the engine.
pub fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();
}

pub use engine::Engine;
pub use error::EngineError;
pub use registry::SessionRegistry;
pub use session::{EventSender, LeaveOutcome, SessionHandle, SessionInfo};
