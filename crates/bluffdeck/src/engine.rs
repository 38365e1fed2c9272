//! The engine: the single entry point the transport layer talks to.
//!
//! The engine owns the session registry, the rate limiter, and the map
//! of connected players' event channels. It resolves lifecycle commands
//! (create/join) itself and routes everything else to the owning session
//! actor. Commands, disconnects, and timer ticks for one session all end
//! up serialized in that session's actor loop.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use bluffdeck_game::{
    validate, ActionKind, GameError, GameState, RateLimiter,
};
use bluffdeck_protocol::{
    Command, Event, PlayerId, SessionId, SessionStatus, Settings,
};
use rand::Rng;
use tokio::sync::Mutex;
use tokio::time;

use crate::registry::SessionRegistry;
use crate::session::{spawn_session, EventSender, SessionHandle};
use crate::EngineError;

/// Command channel size for session actors.
const CHANNEL_SIZE: usize = 64;

/// How often the reaper scans for dead sessions.
const REAP_INTERVAL: Duration = Duration::from_secs(600);

/// Lobbies older than this are considered abandoned.
const LOBBY_MAX_AGE: Duration = Duration::from_secs(3600);

/// How often stale rate-limiter windows are swept.
const SWEEP_INTERVAL: Duration = Duration::from_secs(60);

struct EngineInner {
    registry: SessionRegistry,
    limiter: RateLimiter,
    /// Event channels of all connected players, seated or not.
    connections: HashMap<PlayerId, EventSender>,
}

/// The game engine. Cheap to clone; all clones share state.
#[derive(Clone)]
pub struct Engine {
    inner: Arc<Mutex<EngineInner>>,
}

impl Engine {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Mutex::new(EngineInner {
                registry: SessionRegistry::new(),
                limiter: RateLimiter::new(),
                connections: HashMap::new(),
            })),
        }
    }

    /// Spawns the background maintenance loops: the idle-session reaper
    /// and the rate-limiter sweep.
    pub fn spawn_maintenance(&self) {
        let engine = self.clone();
        tokio::spawn(async move {
            let mut interval = time::interval(REAP_INTERVAL);
            interval.tick().await;
            loop {
                interval.tick().await;
                engine.reap_idle_sessions().await;
            }
        });

        let engine = self.clone();
        tokio::spawn(async move {
            let mut interval = time::interval(SWEEP_INTERVAL);
            interval.tick().await;
            loop {
                interval.tick().await;
                engine.inner.lock().await.limiter.sweep();
            }
        });
    }

    /// Registers a new connection and greets it with its player id.
    pub async fn connect(&self, player_id: PlayerId, sender: EventSender) {
        let mut inner = self.inner.lock().await;
        let _ = sender.send(Event::Connected { player_id });
        inner.connections.insert(player_id, sender);
        tracing::debug!(%player_id, "player connected");
    }

    /// Tears down a connection: forgets its limiter windows and removes
    /// it from whatever session it was seated in, destroying the session
    /// if it empties.
    pub async fn disconnect(&self, player_id: PlayerId) {
        let handle = {
            let mut inner = self.inner.lock().await;
            inner.connections.remove(&player_id);
            inner.limiter.forget(player_id);
            let handle = inner.registry.session_of(player_id).cloned();
            inner.registry.unbind(player_id);
            handle
        };
        tracing::debug!(%player_id, "player disconnected");

        if let Some(handle) = handle {
            if let Ok(outcome) = handle.leave(player_id).await {
                if outcome.remaining == 0 {
                    self.destroy_session(&handle).await;
                }
            }
        }
    }

    /// Applies one command from a connection. Infallible from the
    /// caller's point of view: every failure becomes a unicast
    /// `Event::Error` on the player's own channel.
    pub async fn handle_command(&self, player_id: PlayerId, command: Command) {
        let result = match command {
            Command::CreateGame {
                player_name,
                game_mode,
                powerups,
            } => {
                self.create_game(player_id, &player_name, &game_mode, powerups)
                    .await
            }
            Command::JoinGame {
                player_name,
                session_id,
            } => self.join_game(player_id, &player_name, session_id).await,
            other => self.route(player_id, other).await,
        };

        if let Err(err) = result {
            self.notify_error(player_id, &err).await;
        }
    }

    /// Live sessions right now.
    pub async fn session_count(&self) -> usize {
        self.inner.lock().await.registry.session_count()
    }

    /// Destroys empty sessions and lobbies past their shelf life.
    /// Returns how many were reaped.
    pub async fn reap_idle_sessions(&self) -> usize {
        let handles = self.inner.lock().await.registry.handles();
        let mut reaped = 0;
        for handle in handles {
            let Ok(info) = handle.info().await else {
                continue;
            };
            let stale_lobby = info.status == SessionStatus::Lobby
                && info.age > LOBBY_MAX_AGE;
            if info.player_count == 0 || stale_lobby {
                self.destroy_session(&handle).await;
                reaped += 1;
            }
        }
        if reaped > 0 {
            tracing::info!(reaped, "idle sessions reaped");
        }
        reaped
    }

    async fn create_game(
        &self,
        player_id: PlayerId,
        name_raw: &str,
        mode_raw: &str,
        powerups: Option<bool>,
    ) -> Result<(), EngineError> {
        let name = validate::player_name(name_raw)?;
        let mode = validate::game_mode(mode_raw)?;

        let mut inner = self.inner.lock().await;
        if inner.registry.is_seated(player_id) {
            return Err(GameError::InvalidState(
                "already in a game".into(),
            )
            .into());
        }
        let sender = inner
            .connections
            .get(&player_id)
            .cloned()
            .ok_or_else(|| {
                GameError::NotFound("connection not registered".into())
            })?;

        let session_id = generate_session_id();
        let settings = Settings::for_mode(mode, powerups);
        let state = GameState::new(
            session_id.clone(),
            player_id,
            name,
            mode,
            settings,
        );
        let view = state.view();
        let handle = spawn_session(state, sender.clone(), CHANNEL_SIZE);
        inner.registry.insert(handle);
        // The seated check above holds the same lock, so this cannot race.
        let bound = inner.registry.bind(player_id, session_id.clone());
        debug_assert!(bound, "player seated between check and bind");
        tracing::info!(%session_id, %player_id, %mode, "session created");

        let _ = sender.send(Event::GameCreated {
            session_id,
            player_id,
            is_host: true,
            session: view,
        });
        Ok(())
    }

    async fn join_game(
        &self,
        player_id: PlayerId,
        name_raw: &str,
        session_id: Option<SessionId>,
    ) -> Result<(), EngineError> {
        let name = validate::player_name(name_raw)?;

        let (sender, target, candidates) = {
            let inner = self.inner.lock().await;
            if inner.registry.is_seated(player_id) {
                return Err(GameError::InvalidState(
                    "already in a game".into(),
                )
                .into());
            }
            let sender = inner
                .connections
                .get(&player_id)
                .cloned()
                .ok_or_else(|| {
                    GameError::NotFound("connection not registered".into())
                })?;
            match session_id {
                Some(id) => {
                    let handle =
                        inner.registry.handle(&id).cloned().ok_or_else(
                            || GameError::NotFound("game not found".into()),
                        )?;
                    (sender, Some(handle), Vec::new())
                }
                None => (sender, None, inner.registry.handles()),
            }
        };

        if let Some(handle) = target {
            handle.join(player_id, name, sender).await??;
            self.bind_or_back_out(player_id, &handle).await?;
            return Ok(());
        }

        // No explicit id: take the first lobby with a free seat. A seat
        // may fill between info() and join(); keep scanning on failure.
        for handle in candidates {
            let Ok(info) = handle.info().await else {
                continue;
            };
            if !info.status.is_joinable()
                || info.player_count >= info.max_players
            {
                continue;
            }
            if let Ok(Ok(_)) = handle
                .join(player_id, name.clone(), sender.clone())
                .await
            {
                self.bind_or_back_out(player_id, &handle).await?;
                return Ok(());
            }
        }
        Err(GameError::NotFound("no open games to join".into()).into())
    }

    /// Records a completed join in the registry. The seated check in
    /// `join_game` runs before the actor round-trip, so a concurrent
    /// command can win the registry in between; the late join is then
    /// undone so the player is only ever seated where the registry says.
    async fn bind_or_back_out(
        &self,
        player_id: PlayerId,
        handle: &SessionHandle,
    ) -> Result<(), EngineError> {
        let bound = {
            let mut inner = self.inner.lock().await;
            inner.registry.bind(player_id, handle.session_id().clone())
        };
        if bound {
            return Ok(());
        }
        tracing::warn!(
            %player_id,
            session_id = %handle.session_id(),
            "join lost the seat race, backing out"
        );
        let _ = handle.leave(player_id).await;
        Err(GameError::InvalidState("already in a game".into()).into())
    }

    /// Routes an in-session command: rate-limit gate first, then hand it
    /// to the owning actor.
    async fn route(
        &self,
        player_id: PlayerId,
        command: Command,
    ) -> Result<(), EngineError> {
        let kind = match &command {
            Command::PlayCard { .. } => Some(ActionKind::PlayCard),
            Command::CallBluff => Some(ActionKind::CallBluff),
            Command::UsePowerUp { .. } => Some(ActionKind::PowerUp),
            Command::ChatMessage { .. } => Some(ActionKind::Chat),
            _ => None,
        };

        let handle = {
            let mut inner = self.inner.lock().await;
            if let Some(kind) = kind {
                inner.limiter.check(player_id, kind)?;
            }
            inner
                .registry
                .session_of(player_id)
                .cloned()
                .ok_or_else(|| {
                    GameError::NotFound("you are not in a game".into())
                })?
        };
        handle.apply(player_id, command).await
    }

    async fn destroy_session(&self, handle: &SessionHandle) {
        let _ = handle.shutdown().await;
        let mut inner = self.inner.lock().await;
        inner.registry.remove_session(handle.session_id());
        tracing::info!(session_id = %handle.session_id(), "session destroyed");
    }

    async fn notify_error(&self, player_id: PlayerId, err: &EngineError) {
        tracing::debug!(%player_id, error = %err, "command failed");
        let inner = self.inner.lock().await;
        if let Some(sender) = inner.connections.get(&player_id) {
            let _ = sender.send(Event::error(err.to_string()));
        }
    }
}

impl Default for Engine {
    fn default() -> Self {
        Self::new()
    }
}

/// Generates an unguessable session id: `game_` plus 16 hex characters
/// (64 random bits).
fn generate_session_id() -> SessionId {
    let bytes: [u8; 8] = rand::rng().random();
    let hex: String = bytes.iter().map(|b| format!("{b:02x}")).collect();
    SessionId(format!("game_{hex}"))
}
