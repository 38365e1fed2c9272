//! Session actor: an isolated Tokio task that owns one game.
//!
//! Each session runs in its own task, communicating with the outside
//! world through an mpsc channel. This is the "actor model" — no shared
//! mutable state, just message passing. Because player commands, timer
//! ticks, and the deferred round reset are all branches of the same
//! `select!` loop, every state transition for a session is applied
//! strictly one at a time, and disarming the timer is synchronous with
//! whichever transition obsoletes it.

use std::collections::HashMap;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use bluffdeck_game::{validate, GameError, GameState, TimerCmd, Transition};
use bluffdeck_protocol::{
    Command, Event, PlayerId, Recipient, SessionId, SessionStatus,
    SessionView,
};
use bluffdeck_timer::{TimerTick, TurnTimer};
use tokio::sync::{mpsc, oneshot};
use tokio::time::{self, Instant};

use crate::EngineError;

/// Pause between a bluff outcome and the automatic round reset, so
/// clients can show the result before the table is wiped.
pub(crate) const RESET_DELAY: Duration = Duration::from_secs(3);

/// Channel sender for delivering events to a player's connection handler.
pub type EventSender = mpsc::UnboundedSender<Event>;

/// Commands sent to a session actor through its channel.
///
/// The `oneshot::Sender` in some variants is a reply channel — the
/// caller sends a command and waits for the response on it.
pub(crate) enum SessionCommand {
    /// Seat a new player.
    Join {
        player_id: PlayerId,
        name: String,
        sender: EventSender,
        reply: oneshot::Sender<Result<SessionView, GameError>>,
    },

    /// Remove a player (leave or disconnect).
    Leave {
        player_id: PlayerId,
        reply: oneshot::Sender<LeaveOutcome>,
    },

    /// Apply a validated, rate-limit-cleared game command.
    Apply {
        actor: PlayerId,
        command: Command,
    },

    /// Request session metadata.
    Info {
        reply: oneshot::Sender<SessionInfo>,
    },

    /// Shut down the session.
    Shutdown,
}

/// Result of removing a player, for the registry to act on.
#[derive(Debug, Clone, Copy)]
pub struct LeaveOutcome {
    /// Whether the player was actually seated here.
    pub removed: bool,
    /// Players still seated afterwards. Zero means the session should
    /// be destroyed.
    pub remaining: usize,
}

/// A snapshot of session metadata (not the game state itself).
#[derive(Debug, Clone)]
pub struct SessionInfo {
    pub session_id: SessionId,
    pub status: SessionStatus,
    pub player_count: usize,
    pub max_players: usize,
    /// Time since the session was created.
    pub age: Duration,
}

/// Handle to a running session actor. Cheap to clone — it's just an
/// `mpsc::Sender` wrapper. The registry holds one per session.
#[derive(Clone)]
pub struct SessionHandle {
    session_id: SessionId,
    sender: mpsc::Sender<SessionCommand>,
}

impl SessionHandle {
    pub fn session_id(&self) -> &SessionId {
        &self.session_id
    }

    fn unavailable(&self) -> EngineError {
        EngineError::SessionUnavailable(self.session_id.clone())
    }

    /// Seats a player, returning the view they should be greeted with.
    pub async fn join(
        &self,
        player_id: PlayerId,
        name: String,
        sender: EventSender,
    ) -> Result<Result<SessionView, GameError>, EngineError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.sender
            .send(SessionCommand::Join {
                player_id,
                name,
                sender,
                reply: reply_tx,
            })
            .await
            .map_err(|_| self.unavailable())?;
        reply_rx.await.map_err(|_| self.unavailable())
    }

    /// Removes a player.
    pub async fn leave(
        &self,
        player_id: PlayerId,
    ) -> Result<LeaveOutcome, EngineError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.sender
            .send(SessionCommand::Leave {
                player_id,
                reply: reply_tx,
            })
            .await
            .map_err(|_| self.unavailable())?;
        reply_rx.await.map_err(|_| self.unavailable())
    }

    /// Delivers a game command (fire-and-forget; failures come back to
    /// the actor's own event channel as `Event::Error`).
    pub async fn apply(
        &self,
        actor: PlayerId,
        command: Command,
    ) -> Result<(), EngineError> {
        self.sender
            .send(SessionCommand::Apply { actor, command })
            .await
            .map_err(|_| self.unavailable())
    }

    /// Requests session metadata.
    pub async fn info(&self) -> Result<SessionInfo, EngineError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.sender
            .send(SessionCommand::Info { reply: reply_tx })
            .await
            .map_err(|_| self.unavailable())?;
        reply_rx.await.map_err(|_| self.unavailable())
    }

    /// Tells the session to shut down.
    pub async fn shutdown(&self) -> Result<(), EngineError> {
        self.sender
            .send(SessionCommand::Shutdown)
            .await
            .map_err(|_| self.unavailable())
    }
}

/// The internal session actor state. Runs inside a Tokio task.
struct SessionActor {
    state: GameState,
    /// Per-player outbound channels.
    senders: HashMap<PlayerId, EventSender>,
    receiver: mpsc::Receiver<SessionCommand>,
    timer: TurnTimer,
    /// Deadline of a pending deferred round reset.
    reset_at: Option<Instant>,
}

impl SessionActor {
    async fn run(mut self) {
        tracing::info!(session_id = %self.state.id(), "session actor started");

        loop {
            let reset_at = self.reset_at;
            tokio::select! {
                cmd = self.receiver.recv() => {
                    match cmd {
                        Some(SessionCommand::Join { player_id, name, sender, reply }) => {
                            let result = self.handle_join(player_id, name, sender);
                            let _ = reply.send(result);
                        }
                        Some(SessionCommand::Leave { player_id, reply }) => {
                            let outcome = self.handle_leave(player_id);
                            let _ = reply.send(outcome);
                        }
                        Some(SessionCommand::Apply { actor, command }) => {
                            self.handle_apply(actor, command);
                        }
                        Some(SessionCommand::Info { reply }) => {
                            let _ = reply.send(self.info());
                        }
                        Some(SessionCommand::Shutdown) | None => break,
                    }
                }
                tick = self.timer.wait() => {
                    self.handle_tick(tick);
                }
                _ = time::sleep_until(reset_at.unwrap_or_else(Instant::now)),
                    if reset_at.is_some() =>
                {
                    self.reset_at = None;
                    let transition = self.state.reset_round();
                    self.apply_transition(transition);
                }
            }
        }

        tracing::info!(session_id = %self.state.id(), "session actor stopped");
    }

    fn handle_join(
        &mut self,
        player_id: PlayerId,
        name: String,
        sender: EventSender,
    ) -> Result<SessionView, GameError> {
        self.state.add_player(player_id, name.clone())?;
        self.senders.insert(player_id, sender);
        tracing::info!(
            session_id = %self.state.id(),
            %player_id,
            players = self.state.player_count(),
            "player joined"
        );

        let view = self.state.view();
        self.send_to(
            player_id,
            Event::GameJoined {
                session_id: self.state.id().clone(),
                player_id,
                is_host: false,
                session: view.clone(),
            },
        );
        self.dispatch(vec![(
            Recipient::AllExcept(player_id),
            Event::GameUpdate {
                session: view.clone(),
                message: format!("{name} joined the game"),
            },
        )]);
        Ok(view)
    }

    fn handle_leave(&mut self, player_id: PlayerId) -> LeaveOutcome {
        self.senders.remove(&player_id);
        let Some(removed) = self.state.remove_player(player_id) else {
            return LeaveOutcome {
                removed: false,
                remaining: self.state.player_count(),
            };
        };

        tracing::info!(
            session_id = %self.state.id(),
            %player_id,
            players = removed.remaining,
            "player left"
        );

        if removed.remaining > 0 {
            let mut events = vec![(
                Recipient::All,
                Event::PlayerLeft {
                    player_id,
                    player_name: removed.name.clone(),
                    players_remaining: removed.remaining,
                },
            )];
            let message = if removed.bluff_aborted {
                // The pending reset is obsolete along with the bluff round.
                self.reset_at = None;
                format!("{} left, bluff round cancelled", removed.name)
            } else {
                format!("{} left the game", removed.name)
            };
            events.push((
                Recipient::All,
                Event::GameUpdate {
                    session: self.state.view(),
                    message,
                },
            ));
            self.dispatch(events);

            // The departed player may have been the last pending voter;
            // the outcome then lands with the same deferred reset as a
            // cast vote would have produced.
            if let Some(transition) = removed.vote_resolved {
                self.apply_transition(transition);
            }

            // An aborted bluff unfreezes play, so the clock must come back.
            if removed.bluff_aborted && self.state.settings().timer {
                let secs = self.state.settings().timer_secs;
                self.timer.arm(Duration::from_secs(secs));
                if let Some(current) = self.state.current_player() {
                    self.dispatch(vec![(
                        Recipient::All,
                        Event::TimerStart {
                            duration_secs: secs,
                            player_id: current.id,
                        },
                    )]);
                }
            }
        } else {
            self.timer.disarm();
            self.reset_at = None;
        }

        LeaveOutcome {
            removed: true,
            remaining: removed.remaining,
        }
    }

    fn handle_apply(&mut self, actor: PlayerId, command: Command) {
        if !self.state.is_member(actor) {
            tracing::warn!(
                session_id = %self.state.id(),
                player_id = %actor,
                "command from non-member, ignoring"
            );
            return;
        }

        let result = match command {
            Command::StartGame => self.state.start_game(actor),
            Command::PlayCard { card_index } => {
                self.state.play_card(actor, card_index)
            }
            Command::CallBluff => self.state.call_bluff(actor),
            Command::SubmitBluffWord { word } => {
                self.state.submit_word(actor, &word)
            }
            Command::VoteBluffWord { is_valid } => {
                self.state.vote_word(actor, is_valid)
            }
            Command::AdmitBluff => self.state.admit_bluff(actor),
            Command::UsePowerUp { kind } => {
                self.state.use_power_up(actor, kind)
            }
            Command::ChatMessage { text } => self.chat(actor, &text),
            Command::RequestState => Ok(self.snapshot_for(actor)),
            // Lifecycle commands are resolved by the engine before a
            // session exists; reaching here means a routing bug.
            Command::CreateGame { .. } | Command::JoinGame { .. } => {
                Err(GameError::InvalidState(
                    "already in a game".into(),
                ))
            }
        };

        match result {
            Ok(transition) => self.apply_transition(transition),
            Err(err) => {
                tracing::debug!(
                    session_id = %self.state.id(),
                    player_id = %actor,
                    error = %err,
                    "command rejected"
                );
                self.send_to(actor, Event::error(err.to_string()));
            }
        }
    }

    fn chat(
        &self,
        actor: PlayerId,
        text: &str,
    ) -> Result<Transition, GameError> {
        let message = validate::chat_message(text)?;
        let timestamp_ms = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_millis() as u64;
        Ok(Transition::events(vec![(
            Recipient::All,
            Event::ChatMessage {
                player: self.state.player_name(actor),
                message,
                timestamp_ms,
            },
        )]))
    }

    /// A read-only refresh: the sanitized view plus the caller's hand.
    fn snapshot_for(&self, actor: PlayerId) -> Transition {
        Transition::events(vec![
            (
                Recipient::Player(actor),
                Event::GameUpdate {
                    session: self.state.view(),
                    message: String::new(),
                },
            ),
            (
                Recipient::Player(actor),
                Event::HandUpdate {
                    hand: self.state.hand(actor).to_vec(),
                },
            ),
        ])
    }

    fn handle_tick(&mut self, tick: TimerTick) {
        match tick {
            TimerTick::Sync { remaining_secs } => {
                if let Some(current) = self.state.current_player() {
                    self.dispatch(vec![(
                        Recipient::All,
                        Event::TimerSync {
                            time_left_secs: remaining_secs,
                            player_id: current.id,
                        },
                    )]);
                }
            }
            TimerTick::Expired => {
                tracing::debug!(
                    session_id = %self.state.id(),
                    "turn timer expired"
                );
                if let Some(transition) = self.state.auto_play_on_expiry() {
                    self.apply_transition(transition);
                }
            }
        }
    }

    fn apply_transition(&mut self, transition: Transition) {
        self.dispatch(transition.events);
        match transition.timer {
            TimerCmd::Keep => {}
            TimerCmd::Cancel => self.timer.disarm(),
            TimerCmd::Restart => {
                let secs = self.state.settings().timer_secs;
                self.timer.arm(Duration::from_secs(secs));
                if let Some(current) = self.state.current_player() {
                    self.dispatch(vec![(
                        Recipient::All,
                        Event::TimerStart {
                            duration_secs: secs,
                            player_id: current.id,
                        },
                    )]);
                }
            }
        }
        if transition.schedule_reset {
            self.reset_at = Some(Instant::now() + RESET_DELAY);
        }
    }

    /// Fans events out to their recipients.
    fn dispatch(&self, events: Vec<(Recipient, Event)>) {
        for (recipient, event) in events {
            match recipient {
                Recipient::All => {
                    for p in self.state.players() {
                        self.send_to(p.id, event.clone());
                    }
                }
                Recipient::Player(pid) => {
                    self.send_to(pid, event);
                }
                Recipient::AllExcept(excluded) => {
                    for p in self.state.players() {
                        if p.id != excluded {
                            self.send_to(p.id, event.clone());
                        }
                    }
                }
            }
        }
    }

    /// Sends an event to a single player. Silently drops if the
    /// receiver is gone (player disconnected).
    fn send_to(&self, player_id: PlayerId, event: Event) {
        if let Some(sender) = self.senders.get(&player_id) {
            let _ = sender.send(event);
        }
    }

    fn info(&self) -> SessionInfo {
        SessionInfo {
            session_id: self.state.id().clone(),
            status: self.state.status(),
            player_count: self.state.player_count(),
            max_players: self.state.settings().max_players,
            age: self.state.created_at().elapsed(),
        }
    }
}

/// Spawns a new session actor task and returns a handle to it.
///
/// The state arrives with the host already seated; `host_sender` is that
/// player's event channel. `channel_size` bounds the command queue.
pub(crate) fn spawn_session(
    state: GameState,
    host_sender: EventSender,
    channel_size: usize,
) -> SessionHandle {
    let session_id = state.id().clone();
    let (tx, rx) = mpsc::channel(channel_size);

    let mut senders = HashMap::new();
    senders.insert(state.host_id(), host_sender);

    let actor = SessionActor {
        state,
        senders,
        receiver: rx,
        timer: TurnTimer::new(),
        reset_at: None,
    };

    tokio::spawn(actor.run());

    SessionHandle {
        session_id,
        sender: tx,
    }
}
