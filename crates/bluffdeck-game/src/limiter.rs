//! Sliding-window rate limiting for player actions.
//!
//! Each player has an independent window per action kind. Budgets are
//! checked before the command reaches a session, so auto-plays triggered
//! by the turn timer never touch them. A periodic sweep drops windows
//! older than [`SWEEP_AGE`] so departed players do not accumulate.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use bluffdeck_protocol::PlayerId;

use crate::GameError;

/// Age past which a player's stale timestamps are swept.
pub const SWEEP_AGE: Duration = Duration::from_secs(60);

/// The rate-limited action classes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ActionKind {
    PlayCard,
    CallBluff,
    PowerUp,
    Chat,
}

impl ActionKind {
    /// Budget for this action: (max actions, window length).
    fn budget(&self) -> (usize, Duration) {
        match self {
            Self::PlayCard => (5, Duration::from_secs(10)),
            Self::CallBluff => (3, Duration::from_secs(10)),
            Self::PowerUp => (3, Duration::from_secs(5)),
            Self::Chat => (5, Duration::from_secs(10)),
        }
    }

    /// Label used in the rate-limit error message.
    fn label(&self) -> &'static str {
        match self {
            Self::PlayCard => "play",
            Self::CallBluff => "bluff call",
            Self::PowerUp => "power-up",
            Self::Chat => "chat",
        }
    }
}

/// Per-player sliding windows of action timestamps.
#[derive(Debug, Default)]
pub struct RateLimiter {
    windows: HashMap<PlayerId, HashMap<ActionKind, Vec<Instant>>>,
}

impl RateLimiter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records one action if the budget allows it, else rejects.
    pub fn check(
        &mut self,
        player: PlayerId,
        kind: ActionKind,
    ) -> Result<(), GameError> {
        self.check_at(player, kind, Instant::now())
    }

    fn check_at(
        &mut self,
        player: PlayerId,
        kind: ActionKind,
        now: Instant,
    ) -> Result<(), GameError> {
        let (max, window) = kind.budget();
        let stamps = self
            .windows
            .entry(player)
            .or_default()
            .entry(kind)
            .or_default();
        stamps.retain(|t| now.duration_since(*t) < window);
        if stamps.len() >= max {
            return Err(GameError::RateLimited {
                action: kind.label(),
            });
        }
        stamps.push(now);
        Ok(())
    }

    /// Forgets a player entirely (on disconnect).
    pub fn forget(&mut self, player: PlayerId) {
        self.windows.remove(&player);
    }

    /// Drops timestamps older than [`SWEEP_AGE`] and empty entries.
    pub fn sweep(&mut self) {
        self.sweep_at(Instant::now());
    }

    fn sweep_at(&mut self, now: Instant) {
        for per_kind in self.windows.values_mut() {
            per_kind.retain(|_, stamps| {
                stamps.retain(|t| now.duration_since(*t) < SWEEP_AGE);
                !stamps.is_empty()
            });
        }
        self.windows.retain(|_, per_kind| !per_kind.is_empty());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_check_allows_up_to_budget_then_rejects() {
        let mut limiter = RateLimiter::new();
        let p = PlayerId(1);
        let now = Instant::now();
        for _ in 0..5 {
            assert!(limiter.check_at(p, ActionKind::PlayCard, now).is_ok());
        }
        assert!(matches!(
            limiter.check_at(p, ActionKind::PlayCard, now),
            Err(GameError::RateLimited { action: "play" })
        ));
    }

    #[test]
    fn test_budget_refills_after_window_elapses() {
        let mut limiter = RateLimiter::new();
        let p = PlayerId(1);
        let start = Instant::now();
        for _ in 0..3 {
            limiter.check_at(p, ActionKind::PowerUp, start).unwrap();
        }
        assert!(limiter.check_at(p, ActionKind::PowerUp, start).is_err());
        let later = start + Duration::from_secs(5);
        assert!(limiter.check_at(p, ActionKind::PowerUp, later).is_ok());
    }

    #[test]
    fn test_budgets_are_independent_per_player_and_kind() {
        let mut limiter = RateLimiter::new();
        let now = Instant::now();
        for _ in 0..5 {
            limiter.check_at(PlayerId(1), ActionKind::Chat, now).unwrap();
        }
        // Another player and another kind are unaffected.
        assert!(limiter.check_at(PlayerId(2), ActionKind::Chat, now).is_ok());
        assert!(limiter
            .check_at(PlayerId(1), ActionKind::CallBluff, now)
            .is_ok());
    }

    #[test]
    fn test_sweep_drops_stale_windows() {
        let mut limiter = RateLimiter::new();
        let start = Instant::now();
        limiter.check_at(PlayerId(1), ActionKind::Chat, start).unwrap();
        limiter.sweep_at(start + Duration::from_secs(61));
        assert!(limiter.windows.is_empty());
    }

    #[test]
    fn test_forget_clears_player_state() {
        let mut limiter = RateLimiter::new();
        let p = PlayerId(9);
        let now = Instant::now();
        for _ in 0..5 {
            limiter.check_at(p, ActionKind::PlayCard, now).unwrap();
        }
        limiter.forget(p);
        assert!(limiter.check_at(p, ActionKind::PlayCard, now).is_ok());
    }
}
