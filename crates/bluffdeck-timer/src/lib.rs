//! Per-session turn timer for Bluffdeck.
//!
//! One [`TurnTimer`] per session actor. While armed it yields periodic
//! [`TimerTick::Sync`] notices (so clients can correct display drift) and
//! a single [`TimerTick::Expired`] at the deadline, after which it
//! disarms itself. While disarmed, [`TurnTimer::wait`] pends forever.
//!
//! # Integration
//!
//! The timer is designed to sit inside a session actor's `tokio::select!`
//! loop, which serializes its ticks against player commands:
//!
//! ```ignore
//! loop {
//!     tokio::select! {
//!         Some(cmd) = cmd_rx.recv() => { /* handle commands */ }
//!         tick = timer.wait() => match tick {
//!             TimerTick::Sync { remaining_secs } => { /* broadcast */ }
//!             TimerTick::Expired => { /* auto-play a card */ }
//!         }
//!     }
//! }
//! ```
//!
//! Arming and disarming are synchronous, so a transition that obsoletes
//! a running timer (a bluff call, a round reset, session teardown) can
//! never race a stale expiry: the next `select!` iteration simply has
//! nothing to wait on.

use std::time::Duration;

use tokio::time::{self, Instant};
use tracing::debug;

/// Cadence of drift-correction sync ticks while a timer runs.
pub const SYNC_INTERVAL: Duration = Duration::from_secs(5);

/// What [`TurnTimer::wait`] resolved to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerTick {
    /// Periodic progress notice; the deadline has not passed.
    Sync { remaining_secs: u64 },
    /// The deadline passed. The timer is now disarmed.
    Expired,
}

/// A restartable single-deadline timer with periodic sync ticks.
#[derive(Debug, Default)]
pub struct TurnTimer {
    deadline: Option<Instant>,
    next_sync: Option<Instant>,
}

impl TurnTimer {
    /// Creates a disarmed timer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Arms (or re-arms) the timer for `duration` from now, replacing
    /// any previous deadline.
    pub fn arm(&mut self, duration: Duration) {
        let now = Instant::now();
        let deadline = now + duration;
        self.deadline = Some(deadline);
        let first_sync = now + SYNC_INTERVAL;
        self.next_sync = (first_sync < deadline).then_some(first_sync);
        debug!(duration_secs = duration.as_secs(), "turn timer armed");
    }

    /// Cancels the deadline and all pending sync ticks.
    pub fn disarm(&mut self) {
        if self.deadline.take().is_some() {
            debug!("turn timer disarmed");
        }
        self.next_sync = None;
    }

    pub fn is_armed(&self) -> bool {
        self.deadline.is_some()
    }

    /// Time left until expiry, if armed.
    pub fn remaining(&self) -> Option<Duration> {
        self.deadline
            .map(|d| d.saturating_duration_since(Instant::now()))
    }

    /// Waits for the next tick. Pends forever while disarmed, so it is
    /// always safe as a `select!` branch.
    pub async fn wait(&mut self) -> TimerTick {
        let Some(deadline) = self.deadline else {
            std::future::pending::<()>().await;
            unreachable!()
        };

        match self.next_sync {
            Some(sync) if sync < deadline => {
                time::sleep_until(sync).await;
                let remaining = deadline.saturating_duration_since(Instant::now());
                let next = sync + SYNC_INTERVAL;
                self.next_sync = (next < deadline).then_some(next);
                TimerTick::Sync {
                    remaining_secs: remaining.as_secs_f64().round() as u64,
                }
            }
            _ => {
                time::sleep_until(deadline).await;
                self.deadline = None;
                self.next_sync = None;
                TimerTick::Expired
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_timer_is_disarmed() {
        let timer = TurnTimer::new();
        assert!(!timer.is_armed());
        assert!(timer.remaining().is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_arm_then_disarm_clears_deadline() {
        let mut timer = TurnTimer::new();
        timer.arm(Duration::from_secs(30));
        assert!(timer.is_armed());
        assert!(timer.remaining().unwrap() <= Duration::from_secs(30));
        timer.disarm();
        assert!(!timer.is_armed());
        assert!(timer.remaining().is_none());
    }
}
