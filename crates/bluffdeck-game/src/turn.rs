//! The turn engine: game start, ordinary plays, special-card effects,
//! and round resets.

use bluffdeck_protocol::{
    Card, Event, GameMode, PlayerId, PowerUpCounts, Recipient, SessionStatus,
    SpecialCard,
};
use rand::Rng;

use crate::state::{GameState, TimerCmd, Transition};
use crate::{deck, GameError};

/// Shared score a cooperative table plays toward.
pub const COOP_TARGET_SCORE: u32 = 20;

impl GameState {
    /// Host-only: deals hands and moves the lobby into play.
    pub fn start_game(
        &mut self,
        actor: PlayerId,
    ) -> Result<Transition, GameError> {
        if self.status() != SessionStatus::Lobby {
            return Err(GameError::InvalidState(
                "game already started".into(),
            ));
        }
        if actor != self.host_id() {
            return Err(GameError::Unauthorized(
                "only the host can start the game".into(),
            ));
        }
        if self.player_count() < 2 {
            return Err(GameError::Validation(
                "need at least 2 players to start".into(),
            ));
        }
        if self.mode() == GameMode::Battle && self.player_count() != 2 {
            return Err(GameError::Validation(
                "battle mode needs exactly 2 players".into(),
            ));
        }

        self.deck = deck::build(self.mode());
        self.table.clear();
        self.current_turn = 0;
        self.last_player_played = None;
        self.clear_bluff_state();
        self.deal_hands();
        if self.settings().powerups {
            let ids: Vec<PlayerId> =
                self.players().iter().map(|p| p.id).collect();
            for id in ids {
                self.power_ups.insert(id, PowerUpCounts::default());
            }
        }
        if self.settings().cooperative {
            self.team_score = 0;
            self.target_score = Some(COOP_TARGET_SCORE);
        }
        self.set_status(SessionStatus::InProgress);
        tracing::info!(
            session_id = %self.id(),
            players = self.player_count(),
            mode = %self.mode(),
            "game started"
        );

        let mut events = vec![(
            Recipient::All,
            Event::GameStarted {
                session: self.view(),
                timer_active: self.settings().timer,
                powerups_enabled: self.settings().powerups,
            },
        )];
        for p in self.players() {
            events.push((
                Recipient::Player(p.id),
                Event::HandUpdate {
                    hand: self.hand(p.id).to_vec(),
                },
            ));
            if self.settings().powerups {
                events.push((
                    Recipient::Player(p.id),
                    Event::PowerUpsUpdate {
                        power_ups: self.power_ups[&p.id],
                    },
                ));
            }
        }

        Ok(Transition {
            events,
            timer: if self.settings().timer {
                TimerCmd::Restart
            } else {
                TimerCmd::Keep
            },
            schedule_reset: false,
        })
    }

    /// Plays the card at `index` from the current player's hand.
    pub fn play_card(
        &mut self,
        actor: PlayerId,
        index: usize,
    ) -> Result<Transition, GameError> {
        if self.status() != SessionStatus::InProgress {
            return Err(GameError::InvalidState(
                "cards can only be played while a round is running".into(),
            ));
        }
        let current = self
            .current_player()
            .ok_or_else(|| GameError::NotFound("no seated players".into()))?;
        if current.id != actor {
            return Err(GameError::Unauthorized("not your turn".into()));
        }
        if index >= self.hand_len(actor) {
            return Err(GameError::Validation("invalid card index".into()));
        }

        let card = self
            .hands
            .get_mut(&actor)
            .ok_or_else(|| GameError::NotFound("hand missing".into()))?
            .remove(index);
        self.table.push(card);
        self.last_player_played = Some(actor);

        // Replacement draw keeps the hand topped up while the deck lasts.
        if let Some(drawn) = self.deck.pop() {
            if let Some(hand) = self.hands.get_mut(&actor) {
                hand.push(drawn);
            }
        }

        let actor_name = self.player_name(actor);
        let mut message = format!("{actor_name} played a card");
        let mut events: Vec<(Recipient, Event)> = Vec::new();
        let mut advance: isize = 1;

        if let Card::Special(special) = card {
            match special {
                SpecialCard::Joker => {}
                SpecialCard::ReverseTurn => {
                    advance = -1;
                    message.push_str(" and reversed the turn order");
                }
                SpecialCard::SkipNext => {
                    advance = 2;
                    message.push_str(" and skipped the next player");
                }
                SpecialCard::StealCard => {
                    if let Some(victim) = self.next_player_id() {
                        if let Some(stolen) = self.take_random_card(victim) {
                            if let Some(hand) = self.hands.get_mut(&actor) {
                                hand.push(stolen);
                            }
                            let victim_name = self.player_name(victim);
                            message.push_str(&format!(
                                " and stole a card from {victim_name}"
                            ));
                            events.push((
                                Recipient::Player(victim),
                                Event::HandUpdate {
                                    hand: self.hand(victim).to_vec(),
                                },
                            ));
                        }
                    }
                }
                SpecialCard::SwapHands => {
                    if let Some(other) = self.next_player_id() {
                        self.swap_hands(actor, other);
                        let other_name = self.player_name(other);
                        message.push_str(&format!(
                            " and swapped hands with {other_name}"
                        ));
                        events.push((
                            Recipient::Player(other),
                            Event::HandUpdate {
                                hand: self.hand(other).to_vec(),
                            },
                        ));
                    }
                }
                SpecialCard::DrawThree => {
                    if let Some(target) = self.next_player_id() {
                        for _ in 0..3 {
                            match self.deck.pop() {
                                Some(c) => {
                                    if let Some(hand) =
                                        self.hands.get_mut(&target)
                                    {
                                        hand.push(c);
                                    }
                                }
                                None => break,
                            }
                        }
                        let target_name = self.player_name(target);
                        message.push_str(&format!(
                            " — {target_name} draws three"
                        ));
                        events.push((
                            Recipient::Player(target),
                            Event::HandUpdate {
                                hand: self.hand(target).to_vec(),
                            },
                        ));
                    }
                }
            }
        }

        let mut victory = None;
        if self.settings().cooperative && matches!(card, Card::Letter(_)) {
            self.team_score += 1;
            // Fires exactly once, at the moment the target is first reached.
            if self.target_score == Some(self.team_score) {
                victory = Some(Event::CoopVictory {
                    message: format!(
                        "Team victory! {} letters played together",
                        self.team_score
                    ),
                    score: self.team_score,
                });
            }
        }

        self.advance_turn(advance);

        let mut out = vec![(
            Recipient::All,
            Event::GameUpdate {
                session: self.view(),
                message,
            },
        )];
        out.push((
            Recipient::Player(actor),
            Event::HandUpdate {
                hand: self.hand(actor).to_vec(),
            },
        ));
        out.extend(events);
        if let Some(v) = victory {
            out.push((Recipient::All, v));
        }

        Ok(Transition {
            events: out,
            timer: if self.settings().timer {
                TimerCmd::Restart
            } else {
                TimerCmd::Keep
            },
            schedule_reset: false,
        })
    }

    /// Auto-plays a uniformly random card for the current player when the
    /// turn timer expires. No-op (empty transition) outside `InProgress`
    /// or with an empty hand.
    pub fn auto_play_on_expiry(&mut self) -> Option<Transition> {
        if self.status() != SessionStatus::InProgress {
            return None;
        }
        let current = self.current_player()?;
        let player = current.id;
        let name = current.name.clone();
        let len = self.hand_len(player);
        if len == 0 {
            return None;
        }
        let index = rand::rng().random_range(0..len);
        let mut transition = self.play_card(player, index).ok()?;
        transition.events.insert(
            0,
            (
                Recipient::All,
                Event::TimerExpired {
                    player: name.clone(),
                    message: format!(
                        "Time's up! A random card was played for {name}"
                    ),
                },
            ),
        );
        Some(transition)
    }

    /// Rebuilds deck and hands for a fresh round after a bluff outcome.
    pub fn reset_round(&mut self) -> Transition {
        self.deck = deck::build(self.mode());
        self.table.clear();
        self.last_player_played = None;
        self.clear_bluff_state();
        self.deal_hands();
        self.set_status(SessionStatus::InProgress);

        let mut events = vec![(
            Recipient::All,
            Event::GameUpdate {
                session: self.view(),
                message: "New round!".into(),
            },
        )];
        for p in self.players() {
            events.push((
                Recipient::Player(p.id),
                Event::HandUpdate {
                    hand: self.hand(p.id).to_vec(),
                },
            ));
        }

        Transition {
            events,
            timer: if self.settings().timer {
                TimerCmd::Restart
            } else {
                TimerCmd::Keep
            },
            schedule_reset: false,
        }
    }

    // -- internals ----------------------------------------------------------

    fn deal_hands(&mut self) {
        self.hands.clear();
        let hand_size = self.mode().hand_size();
        let ids: Vec<PlayerId> = self.players().iter().map(|p| p.id).collect();
        for id in ids {
            let mut hand = Vec::with_capacity(hand_size);
            for _ in 0..hand_size {
                match self.deck.pop() {
                    Some(card) => hand.push(card),
                    None => break,
                }
            }
            self.hands.insert(id, hand);
        }
    }

    /// The player one seat after the current turn, before any advance.
    fn next_player_id(&self) -> Option<PlayerId> {
        let n = self.player_count();
        if n < 2 {
            return None;
        }
        let next = (self.current_turn + 1) % n;
        Some(self.players()[next].id)
    }

    pub(crate) fn advance_turn(&mut self, delta: isize) {
        let n = self.player_count() as isize;
        if n == 0 {
            self.current_turn = 0;
            return;
        }
        let next = (self.current_turn as isize + delta).rem_euclid(n);
        self.current_turn = next as usize;
    }

    fn take_random_card(&mut self, from: PlayerId) -> Option<Card> {
        let hand = self.hands.get_mut(&from)?;
        if hand.is_empty() {
            return None;
        }
        let index = rand::rng().random_range(0..hand.len());
        Some(hand.remove(index))
    }

    fn swap_hands(&mut self, a: PlayerId, b: PlayerId) {
        let hand_a = self.hands.remove(&a).unwrap_or_default();
        let hand_b = self.hands.remove(&b).unwrap_or_default();
        self.hands.insert(a, hand_b);
        self.hands.insert(b, hand_a);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::test_util::lobby;

    fn started(mode: GameMode, n: usize) -> GameState {
        let mut state = lobby(mode, n);
        state.start_game(PlayerId(1)).unwrap();
        state
    }

    /// Forces a known card into the current player's hand at index 0.
    fn plant_card(state: &mut GameState, player: PlayerId, card: Card) {
        state.hands.get_mut(&player).unwrap().insert(0, card);
    }

    #[test]
    fn test_start_game_deals_hands_and_arms_state() {
        let mut state = lobby(GameMode::Classic, 3);
        let transition = state.start_game(PlayerId(1)).unwrap();
        assert_eq!(state.status(), SessionStatus::InProgress);
        for i in 1..=3 {
            assert_eq!(state.hand_len(PlayerId(i)), 6);
        }
        assert_eq!(state.view().deck_count, 109 - 18);
        assert_eq!(transition.timer, TimerCmd::Keep);
        assert!(matches!(
            transition.events[0],
            (Recipient::All, Event::GameStarted { .. })
        ));
    }

    #[test]
    fn test_start_game_speed_mode_restarts_timer() {
        let mut state = lobby(GameMode::Speed, 2);
        let transition = state.start_game(PlayerId(1)).unwrap();
        assert_eq!(transition.timer, TimerCmd::Restart);
    }

    #[test]
    fn test_start_game_battle_deals_eight_and_inits_powerups() {
        let mut state = lobby(GameMode::Battle, 2);
        state.start_game(PlayerId(1)).unwrap();
        assert_eq!(state.hand_len(PlayerId(1)), 8);
        assert_eq!(state.hand_len(PlayerId(2)), 8);
        assert_eq!(state.power_ups.len(), 2);
    }

    #[test]
    fn test_start_game_rejects_non_host_and_solo_lobby() {
        let mut state = lobby(GameMode::Classic, 2);
        assert!(matches!(
            state.start_game(PlayerId(2)),
            Err(GameError::Unauthorized(_))
        ));
        let mut solo = lobby(GameMode::Classic, 1);
        assert!(matches!(
            solo.start_game(PlayerId(1)),
            Err(GameError::Validation(_))
        ));
    }

    #[test]
    fn test_start_game_rejects_restart_mid_game() {
        let mut state = started(GameMode::Classic, 2);
        assert!(matches!(
            state.start_game(PlayerId(1)),
            Err(GameError::InvalidState(_))
        ));
    }

    #[test]
    fn test_play_card_moves_card_and_advances_turn() {
        let mut state = started(GameMode::Classic, 3);
        plant_card(&mut state, PlayerId(1), Card::Letter('E'));
        let before_deck = state.view().deck_count;
        state.play_card(PlayerId(1), 0).unwrap();
        assert_eq!(state.table, vec![Card::Letter('E')]);
        assert_eq!(state.current_turn, 1);
        assert_eq!(state.last_player_played, Some(PlayerId(1)));
        // Played one, drew one back.
        assert_eq!(state.hand_len(PlayerId(1)), 6);
        assert_eq!(state.view().deck_count, before_deck - 1);
    }

    #[test]
    fn test_play_card_rejects_out_of_turn_and_bad_index() {
        let mut state = started(GameMode::Classic, 2);
        assert!(matches!(
            state.play_card(PlayerId(2), 0),
            Err(GameError::Unauthorized(_))
        ));
        assert!(matches!(
            state.play_card(PlayerId(1), 99),
            Err(GameError::Validation(_))
        ));
    }

    #[test]
    fn test_play_reverse_turn_moves_pointer_backward() {
        let mut state = started(GameMode::Classic, 3);
        plant_card(
            &mut state,
            PlayerId(1),
            Card::Special(SpecialCard::ReverseTurn),
        );
        state.play_card(PlayerId(1), 0).unwrap();
        // From seat 0, backward wraps to the last seat.
        assert_eq!(state.current_turn, 2);
    }

    #[test]
    fn test_play_skip_next_advances_by_two() {
        let mut state = started(GameMode::Classic, 3);
        plant_card(
            &mut state,
            PlayerId(1),
            Card::Special(SpecialCard::SkipNext),
        );
        state.play_card(PlayerId(1), 0).unwrap();
        assert_eq!(state.current_turn, 2);
    }

    #[test]
    fn test_play_steal_card_moves_one_from_next_player() {
        let mut state = started(GameMode::Battle, 2);
        plant_card(
            &mut state,
            PlayerId(1),
            Card::Special(SpecialCard::StealCard),
        );
        let victim_before = state.hand_len(PlayerId(2));
        state.play_card(PlayerId(1), 0).unwrap();
        assert_eq!(state.hand_len(PlayerId(2)), victim_before - 1);
        // 8 planted+8 dealt, minus the played special, plus draw plus steal.
        assert_eq!(state.hand_len(PlayerId(1)), 10);
    }

    #[test]
    fn test_play_swap_hands_exchanges_hands() {
        let mut state = started(GameMode::Battle, 2);
        plant_card(
            &mut state,
            PlayerId(1),
            Card::Special(SpecialCard::SwapHands),
        );
        let expected = state.hand(PlayerId(1)).to_vec();
        // After removing the special and drawing, actor's hand goes to P2.
        state.play_card(PlayerId(1), 0).unwrap();
        let p2 = state.hand(PlayerId(2));
        // The swap happens after the replacement draw, so P2 now holds
        // whatever P1 held minus the special plus the drawn card.
        assert_eq!(p2.len(), expected.len());
    }

    #[test]
    fn test_play_draw_three_tops_up_next_player() {
        let mut state = started(GameMode::Battle, 2);
        plant_card(
            &mut state,
            PlayerId(1),
            Card::Special(SpecialCard::DrawThree),
        );
        state.play_card(PlayerId(1), 0).unwrap();
        assert_eq!(state.hand_len(PlayerId(2)), 11);
    }

    fn total_cards(state: &GameState, players: u64) -> usize {
        state.view().deck_count
            + state.table.len()
            + (1..=players)
                .map(|i| state.hand_len(PlayerId(i)))
                .sum::<usize>()
    }

    #[test]
    fn test_play_card_conserves_total_cards() {
        let mut state = started(GameMode::Classic, 3);
        assert_eq!(total_cards(&state, 3), 109);
        for _ in 0..6 {
            let current = state.current_player().unwrap().id;
            state.play_card(current, 0).unwrap();
            assert_eq!(total_cards(&state, 3), 109);
        }
    }

    #[test]
    fn test_battle_specials_conserve_total_cards() {
        let mut state = started(GameMode::Battle, 2);
        assert_eq!(total_cards(&state, 2), 113);
        // Enough plays to hit steal/swap/draw-three with high likelihood.
        for _ in 0..20 {
            let current = state.current_player().unwrap().id;
            if state.hand_len(current) == 0 {
                break;
            }
            state.play_card(current, 0).unwrap();
            assert_eq!(total_cards(&state, 2), 113);
        }
    }

    #[test]
    fn test_coop_letter_plays_raise_team_score_and_fire_victory_once() {
        let mut state = started(GameMode::Coop, 2);
        state.target_score = Some(2);

        plant_card(&mut state, PlayerId(1), Card::Letter('A'));
        let t = state.play_card(PlayerId(1), 0).unwrap();
        assert_eq!(state.team_score, 1);
        assert!(!t
            .events
            .iter()
            .any(|(_, e)| matches!(e, Event::CoopVictory { .. })));

        plant_card(&mut state, PlayerId(2), Card::Letter('B'));
        let t = state.play_card(PlayerId(2), 0).unwrap();
        assert_eq!(state.team_score, 2);
        assert!(t
            .events
            .iter()
            .any(|(_, e)| matches!(e, Event::CoopVictory { score: 2, .. })));
        assert_eq!(state.status(), SessionStatus::InProgress);

        // A third letter passes the target without re-firing.
        plant_card(&mut state, PlayerId(1), Card::Letter('C'));
        let t = state.play_card(PlayerId(1), 0).unwrap();
        assert_eq!(state.team_score, 3);
        assert!(!t
            .events
            .iter()
            .any(|(_, e)| matches!(e, Event::CoopVictory { .. })));
    }

    #[test]
    fn test_coop_special_plays_do_not_raise_team_score() {
        let mut state = started(GameMode::Coop, 2);
        plant_card(&mut state, PlayerId(1), Card::Special(SpecialCard::Joker));
        state.play_card(PlayerId(1), 0).unwrap();
        assert_eq!(state.team_score, 0);
    }

    #[test]
    fn test_auto_play_on_expiry_plays_for_current_player() {
        let mut state = started(GameMode::Speed, 2);
        let transition = state.auto_play_on_expiry().unwrap();
        assert_eq!(state.table.len(), 1);
        assert_eq!(state.current_turn, 1);
        assert!(matches!(
            transition.events[0],
            (Recipient::All, Event::TimerExpired { .. })
        ));
        assert_eq!(transition.timer, TimerCmd::Restart);
    }

    #[test]
    fn test_auto_play_on_expiry_noops_outside_in_progress() {
        let mut state = started(GameMode::Speed, 2);
        state.set_status(SessionStatus::BluffChallenge);
        assert!(state.auto_play_on_expiry().is_none());
    }

    #[test]
    fn test_reset_round_redeals_and_clears_table() {
        let mut state = started(GameMode::Classic, 2);
        plant_card(&mut state, PlayerId(1), Card::Letter('E'));
        state.play_card(PlayerId(1), 0).unwrap();
        state.scores.insert(PlayerId(2), 3);

        state.reset_round();
        assert!(state.table.is_empty());
        assert!(state.last_player_played.is_none());
        assert_eq!(state.hand_len(PlayerId(1)), 6);
        assert_eq!(state.hand_len(PlayerId(2)), 6);
        assert_eq!(state.view().deck_count, 109 - 12);
        // Scores persist across rounds.
        assert_eq!(state.scores[&PlayerId(2)], 3);
    }
}
