//! The bluff protocol: challenge, word submission, voting, admission.
//!
//! A bluff round pits the defender (whoever played last) against the
//! challenger. The exposed "letters to cover" are the table's plain
//! letters plus its jokers (wildcards). Vote resolution is driven purely
//! by the final tally, so vote arrival order never matters, and the
//! `vote_processed` latch makes resolution fire exactly once.

use std::collections::HashMap;

use bluffdeck_protocol::{
    BluffOutcome, Card, Event, PlayerId, Recipient, SessionStatus, VoteTally,
};

use crate::state::{GameState, TimerCmd, Transition};
use crate::GameError;

impl GameState {
    /// Challenges the last play. Pauses the turn clock.
    pub fn call_bluff(
        &mut self,
        actor: PlayerId,
    ) -> Result<Transition, GameError> {
        if self.status() != SessionStatus::InProgress {
            return Err(GameError::InvalidState(
                "no play to challenge right now".into(),
            ));
        }
        let defender = self.last_player_played.ok_or_else(|| {
            GameError::InvalidState("nobody has played yet".into())
        })?;
        if defender == actor {
            return Err(GameError::Unauthorized(
                "you cannot challenge your own play".into(),
            ));
        }
        if !self.is_member(actor) {
            return Err(GameError::NotFound("not in this game".into()));
        }

        self.challenger = Some(actor);
        self.set_status(SessionStatus::BluffChallenge);

        let table_letters: Vec<Card> = self
            .table
            .iter()
            .filter(|c| c.letter().is_some() || c.is_joker())
            .copied()
            .collect();

        Ok(Transition {
            events: vec![(
                Recipient::All,
                Event::BluffChallenge {
                    defender_id: defender,
                    defender_name: self.player_name(defender),
                    challenger_id: actor,
                    challenger_name: self.player_name(actor),
                    table_letters,
                },
            )],
            timer: TimerCmd::Cancel,
            schedule_reset: false,
        })
    }

    /// The defender answers the challenge with a word.
    ///
    /// Shape checks only (no dictionary): the word must be long enough to
    /// cover every exposed letter plus every joker, and must contain each
    /// exposed plain letter, each consumed at most once.
    pub fn submit_word(
        &mut self,
        actor: PlayerId,
        word: &str,
    ) -> Result<Transition, GameError> {
        if self.status() != SessionStatus::BluffChallenge {
            return Err(GameError::InvalidState(
                "no bluff challenge is pending".into(),
            ));
        }
        if self.last_player_played != Some(actor) {
            return Err(GameError::Unauthorized(
                "only the challenged player can answer".into(),
            ));
        }

        let word = word.trim().to_uppercase();
        if word.is_empty() || !word.chars().all(|c| c.is_ascii_alphabetic()) {
            return Err(GameError::Validation(
                "the word must be plain letters only".into(),
            ));
        }

        let plain: Vec<char> =
            self.table.iter().filter_map(|c| c.letter()).collect();
        let jokers = self.table.iter().filter(|c| c.is_joker()).count();
        let min_len = plain.len() + jokers;
        if word.chars().count() < min_len {
            return Err(GameError::Validation(format!(
                "word must be at least {min_len} letters long"
            )));
        }

        let mut available: HashMap<char, usize> = HashMap::new();
        for c in word.chars() {
            *available.entry(c).or_insert(0) += 1;
        }
        for letter in &plain {
            match available.get_mut(letter) {
                Some(n) if *n > 0 => *n -= 1,
                _ => {
                    return Err(GameError::Validation(format!(
                        "word must contain the letter {letter}"
                    )));
                }
            }
        }

        self.bluff_word = Some(word.clone());
        self.votes_valid.clear();
        self.votes_invalid.clear();
        self.vote_processed = false;
        self.set_status(SessionStatus::BluffVote);

        Ok(Transition::events(vec![(
            Recipient::All,
            Event::BluffVote {
                word,
                proposer_id: actor,
            },
        )]))
    }

    /// The defender concedes without a word. The challenger scores
    /// (flat, no double-points bonus) and the defender acts next round.
    pub fn admit_bluff(
        &mut self,
        actor: PlayerId,
    ) -> Result<Transition, GameError> {
        if self.status() != SessionStatus::BluffChallenge {
            return Err(GameError::InvalidState(
                "no bluff challenge is pending".into(),
            ));
        }
        if self.last_player_played != Some(actor) {
            return Err(GameError::Unauthorized(
                "only the challenged player can admit".into(),
            ));
        }
        let challenger = self.challenger.ok_or_else(|| {
            GameError::NotFound("challenger left the game".into())
        })?;

        *self.scores.entry(challenger).or_insert(0) += 1;
        if let Some(seat) = self.seat_of(actor) {
            self.current_turn = seat;
        }

        let defender_name = self.player_name(actor);
        let challenger_name = self.player_name(challenger);
        Ok(Transition {
            events: vec![(
                Recipient::All,
                Event::BluffResult {
                    result: BluffOutcome::Admitted,
                    defender_name,
                    challenger_name: challenger_name.clone(),
                    word: None,
                    winner: challenger_name,
                    votes: None,
                    tie_break: false,
                },
            )],
            timer: TimerCmd::Keep,
            schedule_reset: true,
        })
    }

    /// Records one peer vote on the submitted word; resolves the round
    /// once everyone but the defender has voted.
    pub fn vote_word(
        &mut self,
        actor: PlayerId,
        is_valid: bool,
    ) -> Result<Transition, GameError> {
        if self.status() != SessionStatus::BluffVote {
            return Err(GameError::InvalidState(
                "no word is up for a vote".into(),
            ));
        }
        if self.vote_processed {
            return Err(GameError::InvalidState(
                "this round has already been decided".into(),
            ));
        }
        if !self.is_member(actor) {
            return Err(GameError::NotFound("not in this game".into()));
        }
        let defender = self.last_player_played.ok_or_else(|| {
            GameError::NotFound("defender left the game".into())
        })?;
        if actor == defender {
            return Err(GameError::Unauthorized(
                "you cannot vote on your own word".into(),
            ));
        }
        if self.votes_valid.contains(&actor)
            || self.votes_invalid.contains(&actor)
        {
            return Err(GameError::Validation("you already voted".into()));
        }

        if is_valid {
            self.votes_valid.insert(actor);
        } else {
            self.votes_invalid.insert(actor);
        }

        if let Some(transition) = self.try_resolve_vote() {
            return Ok(transition);
        }

        let needed = self.player_count() - 1;
        let cast = self.votes_valid.len() + self.votes_invalid.len();
        Ok(Transition::events(vec![(
            Recipient::All,
            Event::VoteUpdate {
                votes_remaining: needed - cast,
            },
        )]))
    }

    /// Resolves the vote once everyone but the defender has voted.
    ///
    /// Checked after every cast vote and after a voter departs, since a
    /// shrinking roster can be what completes the tally.
    pub(crate) fn try_resolve_vote(&mut self) -> Option<Transition> {
        if self.status() != SessionStatus::BluffVote || self.vote_processed {
            return None;
        }
        let defender = self.last_player_played?;
        let challenger = self.challenger?;
        let needed = self.player_count().saturating_sub(1);
        let cast = self.votes_valid.len() + self.votes_invalid.len();
        if needed == 0 || cast < needed {
            return None;
        }

        self.vote_processed = true;
        let tally = VoteTally {
            valid: self.votes_valid.len(),
            invalid: self.votes_invalid.len(),
        };
        let accepted = tally.valid >= tally.invalid;

        tracing::info!(
            session_id = %self.id(),
            word = self.bluff_word.as_deref().unwrap_or(""),
            valid = tally.valid,
            invalid = tally.invalid,
            accepted,
            "bluff vote resolved"
        );

        let (scorer, next_actor) = if accepted {
            (defender, challenger)
        } else {
            (challenger, defender)
        };
        let mut points = 1;
        // An armed double-points flag pays out on vote outcomes only.
        if self.double_points.remove(&scorer) {
            points += 1;
        }
        *self.scores.entry(scorer).or_insert(0) += points;
        if let Some(seat) = self.seat_of(next_actor) {
            self.current_turn = seat;
        }

        Some(Transition {
            events: vec![(
                Recipient::All,
                Event::BluffResult {
                    result: if accepted {
                        BluffOutcome::Accepted
                    } else {
                        BluffOutcome::Rejected
                    },
                    defender_name: self.player_name(defender),
                    challenger_name: self.player_name(challenger),
                    word: self.bluff_word.clone(),
                    winner: self.player_name(scorer),
                    votes: Some(tally),
                    tie_break: accepted && tally.valid == tally.invalid,
                },
            )],
            timer: TimerCmd::Keep,
            schedule_reset: true,
        })
    }
}
