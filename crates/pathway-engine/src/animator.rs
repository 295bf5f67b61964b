//! Path reveal state machine consumed by the presentation layer.
//!
//! ```text
//! Idle --play()--> Revealing --advance(>= reveal duration)--> Revealed
//!   ^                                                            |
//!   +------------- load(schedule with a new fingerprint) -------+
//! ```
//!
//! At most one reveal happens per stop-list identity: `play` only fires
//! from `Idle`, and only `load` with a different fingerprint returns the
//! machine to `Idle`. The time-driven half is cosmetic; callers feed
//! elapsed time through [`PathAnimator::advance`].

use std::time::Duration;

use serde::Serialize;

use crate::schedule::Schedule;

/// Reveal state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RevealState {
    /// Nothing drawn yet.
    Idle,
    /// The path is being drawn.
    Revealing {
        /// Time spent revealing so far.
        elapsed: Duration,
    },
    /// The full path and every marker are drawn.
    Revealed,
}

/// Drives the reveal of one schedule's path.
#[derive(Debug, Clone)]
pub struct PathAnimator {
    state: RevealState,
    identity: Option<u64>,
    reveal_duration: Duration,
    reveals: u32,
}

impl Default for PathAnimator {
    fn default() -> Self {
        Self::new(Self::DEFAULT_REVEAL_DURATION)
    }
}

impl PathAnimator {
    /// Default time from `play` to fully revealed.
    pub const DEFAULT_REVEAL_DURATION: Duration = Duration::from_millis(1200);

    #[must_use]
    pub const fn new(reveal_duration: Duration) -> Self {
        Self {
            state: RevealState::Idle,
            identity: None,
            reveal_duration,
            reveals: 0,
        }
    }

    #[must_use]
    pub const fn state(&self) -> RevealState {
        self.state
    }

    /// Fingerprint of the loaded schedule.
    #[must_use]
    pub const fn identity(&self) -> Option<u64> {
        self.identity
    }

    /// Total `Idle -> Revealing` transitions since construction.
    #[must_use]
    pub const fn reveal_count(&self) -> u32 {
        self.reveals
    }

    /// Load a schedule. A different fingerprint resets to `Idle`; the same
    /// fingerprint changes nothing. Returns whether the machine was reset.
    pub fn load(&mut self, schedule: &Schedule) -> bool {
        let fingerprint = schedule.fingerprint();
        if self.identity == Some(fingerprint) {
            return false;
        }
        tracing::debug!(fingerprint, "new stop list, reveal reset");
        self.identity = Some(fingerprint);
        self.state = RevealState::Idle;
        true
    }

    /// Start the reveal. Fires only from `Idle` with a schedule loaded;
    /// otherwise a no-op. Returns whether the transition fired.
    pub fn play(&mut self) -> bool {
        if self.identity.is_none() || self.state != RevealState::Idle {
            return false;
        }
        self.state = RevealState::Revealing {
            elapsed: Duration::ZERO,
        };
        self.reveals += 1;
        tracing::debug!(reveals = self.reveals, "reveal started");
        true
    }

    /// Advance the reveal clock. Has no effect outside `Revealing`.
    pub fn advance(&mut self, delta: Duration) {
        if let RevealState::Revealing { elapsed } = self.state {
            let elapsed = elapsed.saturating_add(delta);
            self.state = if elapsed >= self.reveal_duration {
                RevealState::Revealed
            } else {
                RevealState::Revealing { elapsed }
            };
        }
    }

    /// Fraction of the path drawn, in `[0, 1]`.
    #[must_use]
    pub fn progress(&self) -> f64 {
        match self.state {
            RevealState::Idle => 0.0,
            RevealState::Revealing { elapsed } => {
                if self.reveal_duration.is_zero() {
                    1.0
                } else {
                    (elapsed.as_secs_f64() / self.reveal_duration.as_secs_f64()).clamp(0.0, 1.0)
                }
            }
            RevealState::Revealed => 1.0,
        }
    }

    /// Number of markers whose arc-length fraction the reveal has passed.
    #[must_use]
    pub fn revealed_markers(&self, fractions: &[f64]) -> usize {
        if self.state == RevealState::Idle {
            return 0;
        }
        let progress = self.progress();
        fractions.iter().filter(|&&f| f <= progress).count()
    }
}
