//! The authoritative state of one game session.
//!
//! A `GameState` is owned by exactly one session actor and is only ever
//! touched from that actor's task, so no interior locking is needed. All
//! rule operations (`turn`, `bluff`, `powerup` modules) mutate it through
//! `&mut self` and describe their outward effects as a [`Transition`].

use std::collections::{HashMap, HashSet};
use std::time::Instant;

use bluffdeck_protocol::{
    Card, Event, GameMode, PlayerId, PlayerInfo, PowerUpCounts, Recipient,
    SessionId, SessionStatus, SessionView, Settings,
};

use crate::GameError;

/// What the actor should do with the turn timer after an operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerCmd {
    /// Leave the timer as it is.
    Keep,
    /// Re-arm the timer for the (new) current player.
    Restart,
    /// Disarm the timer (a bluff pauses the clock).
    Cancel,
}

/// The complete outward effect of one rule operation.
#[derive(Debug)]
pub struct Transition {
    /// Notifications to deliver, in order.
    pub events: Vec<(Recipient, Event)>,
    pub timer: TimerCmd,
    /// When set, the actor schedules a round reset after a short pause so
    /// clients can display the bluff outcome first.
    pub schedule_reset: bool,
}

impl Transition {
    /// A transition that only delivers events.
    pub fn events(events: Vec<(Recipient, Event)>) -> Self {
        Self {
            events,
            timer: TimerCmd::Keep,
            schedule_reset: false,
        }
    }
}

/// Outcome of removing a player, for the caller to report.
#[derive(Debug)]
pub struct RemovedPlayer {
    pub name: String,
    pub remaining: usize,
    /// Set when the departed player was mid-bluff and the round state
    /// had to be abandoned.
    pub bluff_aborted: bool,
    /// Set when the departure completed a pending vote tally; the caller
    /// must apply this transition like any other.
    pub vote_resolved: Option<Transition>,
}

/// One session's full authoritative state.
#[derive(Debug)]
pub struct GameState {
    id: SessionId,
    status: SessionStatus,
    host_id: PlayerId,
    players: Vec<PlayerInfo>,
    seat_index: HashMap<PlayerId, usize>,
    pub(crate) deck: Vec<Card>,
    pub(crate) table: Vec<Card>,
    pub(crate) hands: HashMap<PlayerId, Vec<Card>>,
    pub(crate) scores: HashMap<PlayerId, u32>,
    pub(crate) current_turn: usize,
    pub(crate) last_player_played: Option<PlayerId>,
    pub(crate) challenger: Option<PlayerId>,
    pub(crate) bluff_word: Option<String>,
    pub(crate) votes_valid: HashSet<PlayerId>,
    pub(crate) votes_invalid: HashSet<PlayerId>,
    /// Latch ensuring one vote resolution per bluff round.
    pub(crate) vote_processed: bool,
    settings: Settings,
    mode: GameMode,
    pub(crate) power_ups: HashMap<PlayerId, PowerUpCounts>,
    /// Players holding an armed double-points flag.
    pub(crate) double_points: HashSet<PlayerId>,
    pub(crate) team_score: u32,
    pub(crate) target_score: Option<u32>,
    created_at: Instant,
}

impl GameState {
    /// Creates a lobby with the host seated.
    pub fn new(
        id: SessionId,
        host_id: PlayerId,
        host_name: String,
        mode: GameMode,
        settings: Settings,
    ) -> Self {
        let players = vec![PlayerInfo {
            id: host_id,
            name: host_name,
            is_host: true,
        }];
        let seat_index = HashMap::from([(host_id, 0)]);
        Self {
            id,
            status: SessionStatus::Lobby,
            host_id,
            players,
            seat_index,
            deck: Vec::new(),
            table: Vec::new(),
            hands: HashMap::new(),
            scores: HashMap::from([(host_id, 0)]),
            current_turn: 0,
            last_player_played: None,
            challenger: None,
            bluff_word: None,
            votes_valid: HashSet::new(),
            votes_invalid: HashSet::new(),
            vote_processed: false,
            settings,
            mode,
            power_ups: HashMap::new(),
            double_points: HashSet::new(),
            team_score: 0,
            target_score: None,
            created_at: Instant::now(),
        }
    }

    // -- accessors ----------------------------------------------------------

    pub fn id(&self) -> &SessionId {
        &self.id
    }

    pub fn status(&self) -> SessionStatus {
        self.status
    }

    pub(crate) fn set_status(&mut self, status: SessionStatus) {
        self.status = status;
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn mode(&self) -> GameMode {
        self.mode
    }

    pub fn host_id(&self) -> PlayerId {
        self.host_id
    }

    pub fn created_at(&self) -> Instant {
        self.created_at
    }

    pub fn player_count(&self) -> usize {
        self.players.len()
    }

    pub fn players(&self) -> &[PlayerInfo] {
        &self.players
    }

    /// Whoever acts next, if anyone is seated.
    pub fn current_player(&self) -> Option<&PlayerInfo> {
        self.players.get(self.current_turn)
    }

    pub fn is_member(&self, player: PlayerId) -> bool {
        self.seat_index.contains_key(&player)
    }

    pub(crate) fn seat_of(&self, player: PlayerId) -> Option<usize> {
        self.seat_index.get(&player).copied()
    }

    /// Display name for a seated player; the id itself if somehow absent.
    pub fn player_name(&self, player: PlayerId) -> String {
        self.seat_of(player)
            .map(|i| self.players[i].name.clone())
            .unwrap_or_else(|| player.to_string())
    }

    pub fn hand(&self, player: PlayerId) -> &[Card] {
        self.hands.get(&player).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn hand_len(&self, player: PlayerId) -> usize {
        self.hands.get(&player).map(Vec::len).unwrap_or(0)
    }

    // -- membership ---------------------------------------------------------

    /// Seats a new player. Lobby only, capacity and duplicate-name checked.
    pub fn add_player(
        &mut self,
        player: PlayerId,
        name: String,
    ) -> Result<(), GameError> {
        if !self.status.is_joinable() {
            return Err(GameError::InvalidState(
                "game already in progress".into(),
            ));
        }
        if self.players.len() >= self.settings.max_players {
            return Err(GameError::Validation("game is full".into()));
        }
        if self.seat_index.contains_key(&player) {
            return Err(GameError::Validation("already in this game".into()));
        }
        if self.players.iter().any(|p| p.name == name) {
            return Err(GameError::Validation(
                "that name is already taken here".into(),
            ));
        }
        self.seat_index.insert(player, self.players.len());
        self.players.push(PlayerInfo {
            id: player,
            name,
            is_host: false,
        });
        self.scores.insert(player, 0);
        Ok(())
    }

    /// Removes a player, reassigning the host seat and clamping the turn
    /// pointer. Returns `None` if the player was not seated.
    pub fn remove_player(&mut self, player: PlayerId) -> Option<RemovedPlayer> {
        let seat = self.seat_of(player)?;
        let info = self.players.remove(seat);
        self.hands.remove(&player);
        self.scores.remove(&player);
        self.power_ups.remove(&player);
        self.double_points.remove(&player);
        self.votes_valid.remove(&player);
        self.votes_invalid.remove(&player);
        self.rebuild_seat_index();

        // A bluff round cannot outlive its defender or challenger.
        let mid_bluff = matches!(
            self.status,
            SessionStatus::BluffChallenge | SessionStatus::BluffVote
        );
        let was_party = self.last_player_played == Some(player)
            || self.challenger == Some(player);
        let bluff_aborted = mid_bluff && was_party;
        if bluff_aborted {
            self.clear_bluff_state();
            self.status = SessionStatus::InProgress;
        }
        if self.last_player_played == Some(player) {
            self.last_player_played = None;
        }
        if self.challenger == Some(player) {
            self.challenger = None;
        }

        if !self.players.is_empty() {
            if self.host_id == player {
                self.host_id = self.players[0].id;
                self.players[0].is_host = true;
            }
            if seat < self.current_turn {
                self.current_turn -= 1;
            }
            if self.current_turn >= self.players.len() {
                self.current_turn = 0;
            }
        }

        // The departed player may have been the last pending voter, in
        // which case the shrunken roster completes the tally right here.
        let vote_resolved =
            if bluff_aborted { None } else { self.try_resolve_vote() };

        Some(RemovedPlayer {
            name: info.name,
            remaining: self.players.len(),
            bluff_aborted,
            vote_resolved,
        })
    }

    fn rebuild_seat_index(&mut self) {
        self.seat_index = self
            .players
            .iter()
            .enumerate()
            .map(|(i, p)| (p.id, i))
            .collect();
    }

    pub(crate) fn clear_bluff_state(&mut self) {
        self.challenger = None;
        self.bluff_word = None;
        self.votes_valid.clear();
        self.votes_invalid.clear();
        self.vote_processed = false;
    }

    // -- view ---------------------------------------------------------------

    /// The sanitized snapshot broadcast to clients.
    pub fn view(&self) -> SessionView {
        SessionView {
            id: self.id.clone(),
            status: self.status,
            host_id: self.host_id,
            players: self.players.clone(),
            table: self.table.clone(),
            current_turn: self.current_turn,
            scores: self.scores.clone(),
            last_player_played: self.last_player_played,
            challenger: self.challenger,
            deck_count: self.deck.len(),
            settings: self.settings.clone(),
            mode: self.mode,
            team_score: self.team_score,
            target_score: self.target_score,
        }
    }
}


#[cfg(test)]
mod tests {
    use super::test_util::lobby;
    use super::*;

    #[test]
    fn test_new_session_starts_in_lobby_with_host_seated() {
        let state = lobby(GameMode::Classic, 1);
        assert_eq!(state.status(), SessionStatus::Lobby);
        assert_eq!(state.player_count(), 1);
        assert_eq!(state.host_id(), PlayerId(1));
        assert!(state.players()[0].is_host);
        assert_eq!(state.view().deck_count, 0);
    }

    #[test]
    fn test_add_player_enforces_capacity() {
        let mut state = lobby(GameMode::Battle, 2);
        let err = state.add_player(PlayerId(3), "Player3".into());
        assert!(matches!(err, Err(GameError::Validation(_))));
    }

    #[test]
    fn test_add_player_rejects_duplicate_name() {
        let mut state = lobby(GameMode::Classic, 2);
        let err = state.add_player(PlayerId(3), "Player2".into());
        assert!(matches!(err, Err(GameError::Validation(_))));
    }

    #[test]
    fn test_add_player_rejects_when_not_in_lobby() {
        let mut state = lobby(GameMode::Classic, 2);
        state.set_status(SessionStatus::InProgress);
        let err = state.add_player(PlayerId(3), "Player3".into());
        assert!(matches!(err, Err(GameError::InvalidState(_))));
    }

    #[test]
    fn test_remove_player_reassigns_host() {
        let mut state = lobby(GameMode::Classic, 3);
        let removed = state.remove_player(PlayerId(1)).unwrap();
        assert_eq!(removed.name, "Player1");
        assert_eq!(removed.remaining, 2);
        assert_eq!(state.host_id(), PlayerId(2));
        assert!(state.players()[0].is_host);
    }

    #[test]
    fn test_remove_player_clamps_turn_pointer() {
        let mut state = lobby(GameMode::Classic, 3);
        state.current_turn = 2;
        // Removing a seat before the pointer shifts it back by one.
        state.remove_player(PlayerId(1)).unwrap();
        assert_eq!(state.current_turn, 1);
        assert_eq!(state.current_player().unwrap().id, PlayerId(3));
        // Removing the pointed-at last seat wraps to zero.
        state.remove_player(PlayerId(3)).unwrap();
        assert_eq!(state.current_turn, 0);
    }

    #[test]
    fn test_remove_player_mid_bluff_aborts_the_round() {
        let mut state = lobby(GameMode::Classic, 3);
        state.set_status(SessionStatus::BluffVote);
        state.last_player_played = Some(PlayerId(2));
        state.challenger = Some(PlayerId(3));
        state.bluff_word = Some("TEA".into());
        let removed = state.remove_player(PlayerId(2)).unwrap();
        assert!(removed.bluff_aborted);
        assert!(removed.vote_resolved.is_none());
        assert_eq!(state.status(), SessionStatus::InProgress);
        assert!(state.challenger.is_none());
        assert!(state.bluff_word.is_none());
    }

    #[test]
    fn test_remove_unknown_player_is_none() {
        let mut state = lobby(GameMode::Classic, 2);
        assert!(state.remove_player(PlayerId(99)).is_none());
    }

    #[test]
    fn test_view_never_contains_hands_or_deck_cards() {
        let mut state = lobby(GameMode::Classic, 2);
        state.deck = vec![Card::Letter('E'); 5];
        state.hands.insert(PlayerId(1), vec![Card::Letter('A')]);
        let view = state.view();
        assert_eq!(view.deck_count, 5);
        // The view type itself has no hands field; deck is a count only.
        assert_eq!(view.table.len(), 0);
    }
}
