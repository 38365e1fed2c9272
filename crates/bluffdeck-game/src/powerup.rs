//! Consumable power-up effects.

use bluffdeck_protocol::{
    Event, PlayerId, PowerUpKind, Recipient, RevealedCard, SessionStatus,
};
use rand::prelude::IndexedRandom;
use rand::Rng;

use crate::state::{GameState, Transition};
use crate::GameError;

impl GameState {
    /// Spends one charge of `kind` and applies its effect.
    ///
    /// The revealed card from reveal-card goes to the actor alone; the
    /// broadcast only says that a card was revealed.
    pub fn use_power_up(
        &mut self,
        actor: PlayerId,
        kind: PowerUpKind,
    ) -> Result<Transition, GameError> {
        if !self.settings().powerups {
            return Err(GameError::InvalidState(
                "power-ups are disabled in this game".into(),
            ));
        }
        if self.status() != SessionStatus::InProgress {
            return Err(GameError::InvalidState(
                "power-ups can only be used while a round is running".into(),
            ));
        }
        let counts = self.power_ups.get_mut(&actor).ok_or_else(|| {
            GameError::NotFound("no power-ups for this player".into())
        })?;
        if !counts.consume(kind) {
            return Err(GameError::Validation(format!(
                "no {kind} power-ups left"
            )));
        }

        let actor_name = self.player_name(actor);
        let mut new_card = None;
        let mut revealed = None;
        let mut extra: Vec<(Recipient, Event)> = Vec::new();
        let effect = match kind {
            PowerUpKind::SkipTurn => {
                self.advance_turn(1);
                extra.push((
                    Recipient::All,
                    Event::GameUpdate {
                        session: self.view(),
                        message: format!("{actor_name} skipped the turn"),
                    },
                ));
                "skipped the turn".to_string()
            }
            PowerUpKind::ExtraDraw => {
                if let Some(card) = self.deck.pop() {
                    if let Some(hand) = self.hands.get_mut(&actor) {
                        hand.push(card);
                    }
                    new_card = Some(card);
                    extra.push((
                        Recipient::Player(actor),
                        Event::HandUpdate {
                            hand: self.hand(actor).to_vec(),
                        },
                    ));
                }
                "drew an extra card".to_string()
            }
            PowerUpKind::RevealCard => {
                revealed = self.reveal_random_card(actor);
                match &revealed {
                    Some(r) => {
                        format!("peeked at one of {}'s cards", r.player)
                    }
                    None => "peeked, but found nothing".to_string(),
                }
            }
            PowerUpKind::DoublePoints => {
                self.double_points.insert(actor);
                "armed double points for the next bluff win".to_string()
            }
        };

        let remaining = self.power_ups[&actor];
        let mut events = vec![
            (
                Recipient::Player(actor),
                Event::PowerUpUsed {
                    kind,
                    remaining,
                    new_card,
                    revealed,
                },
            ),
            (
                Recipient::All,
                Event::PowerUpEffect {
                    player: actor_name,
                    effect,
                },
            ),
        ];
        events.extend(extra);
        Ok(Transition::events(events))
    }

    /// A uniformly random card from a uniformly random opponent's
    /// non-empty hand.
    fn reveal_random_card(&self, actor: PlayerId) -> Option<RevealedCard> {
        let candidates: Vec<PlayerId> = self
            .players()
            .iter()
            .map(|p| p.id)
            .filter(|id| *id != actor && self.hand_len(*id) > 0)
            .collect();
        let mut rng = rand::rng();
        let target = *candidates.choose(&mut rng)?;
        let hand = self.hand(target);
        let card = hand[rng.random_range(0..hand.len())];
        Some(RevealedCard {
            player: self.player_name(target),
            card,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::test_util::lobby;
    use bluffdeck_protocol::GameMode;

    fn battle() -> GameState {
        let mut state = lobby(GameMode::Battle, 2);
        state.start_game(PlayerId(1)).unwrap();
        state
    }

    #[test]
    fn test_use_power_up_requires_enabled_and_in_progress() {
        let mut disabled = lobby(GameMode::Classic, 2);
        disabled.start_game(PlayerId(1)).unwrap();
        assert!(matches!(
            disabled.use_power_up(PlayerId(1), PowerUpKind::SkipTurn),
            Err(GameError::InvalidState(_))
        ));

        let mut state = battle();
        state.set_status(SessionStatus::BluffVote);
        assert!(matches!(
            state.use_power_up(PlayerId(1), PowerUpKind::SkipTurn),
            Err(GameError::InvalidState(_))
        ));
    }

    #[test]
    fn test_skip_turn_advances_pointer_and_spends_charge() {
        let mut state = battle();
        state.use_power_up(PlayerId(1), PowerUpKind::SkipTurn).unwrap();
        assert_eq!(state.current_turn, 1);
        assert!(matches!(
            state.use_power_up(PlayerId(1), PowerUpKind::SkipTurn),
            Err(GameError::Validation(_))
        ));
    }

    #[test]
    fn test_extra_draw_gives_one_card_twice_then_runs_out() {
        let mut state = battle();
        let before = state.hand_len(PlayerId(1));
        let t = state
            .use_power_up(PlayerId(1), PowerUpKind::ExtraDraw)
            .unwrap();
        assert_eq!(state.hand_len(PlayerId(1)), before + 1);
        match &t.events[0].1 {
            Event::PowerUpUsed { new_card, .. } => assert!(new_card.is_some()),
            other => panic!("unexpected event: {other:?}"),
        }
        state
            .use_power_up(PlayerId(1), PowerUpKind::ExtraDraw)
            .unwrap();
        assert!(state
            .use_power_up(PlayerId(1), PowerUpKind::ExtraDraw)
            .is_err());
    }

    #[test]
    fn test_reveal_card_is_private_to_the_actor() {
        let mut state = battle();
        let t = state
            .use_power_up(PlayerId(1), PowerUpKind::RevealCard)
            .unwrap();
        match &t.events[0] {
            (Recipient::Player(id), Event::PowerUpUsed { revealed, .. }) => {
                assert_eq!(*id, PlayerId(1));
                let revealed = revealed.as_ref().unwrap();
                assert_eq!(revealed.player, "Player2");
                assert!(state.hand(PlayerId(2)).contains(&revealed.card));
            }
            other => panic!("unexpected event: {other:?}"),
        }
        // The broadcast must not carry the card itself.
        match &t.events[1] {
            (Recipient::All, Event::PowerUpEffect { effect, .. }) => {
                assert!(effect.contains("peeked"));
            }
            other => panic!("unexpected event: {other:?}"),
        }
    }

    #[test]
    fn test_double_points_arms_flag() {
        let mut state = battle();
        state
            .use_power_up(PlayerId(1), PowerUpKind::DoublePoints)
            .unwrap();
        assert!(state.double_points.contains(&PlayerId(1)));
    }
}
