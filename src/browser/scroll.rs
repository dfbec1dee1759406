//! Scroll-until-quiet bookkeeping for lazy-loaded pages.
//!
//! The page is scrolled to the bottom repeatedly; once the document height
//! has not grown for `quiet_window` the content is considered complete.
//! `max_rounds` bounds the loop for pages that keep growing forever.

use std::time::{Duration, Instant};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScrollPolicy {
    pub quiet_window: Duration,
    /// Pause between scroll rounds
    pub poll_interval: Duration,
    pub max_rounds: u32,
}

impl Default for ScrollPolicy {
    fn default() -> Self {
        ScrollPolicy {
            quiet_window: Duration::from_secs(2),
            poll_interval: Duration::from_millis(250),
            max_rounds: 40,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScrollStep {
    /// Scroll again and wait `poll_interval`
    Continue,
    /// Height was stable for the quiet window
    Settled,
    /// Round budget used up while the page was still growing
    Exhausted,
}

#[derive(Debug)]
pub struct ScrollTracker {
    policy: ScrollPolicy,
    last_height: Option<u64>,
    last_growth: Option<Instant>,
    rounds: u32,
}

impl ScrollTracker {
    pub fn new(policy: ScrollPolicy) -> Self {
        ScrollTracker {
            policy,
            last_height: None,
            last_growth: None,
            rounds: 0,
        }
    }

    /// Feed the document height measured at `now`.
    pub fn observe(&mut self, height: u64, now: Instant) -> ScrollStep {
        self.rounds += 1;

        let grew = self.last_height.map_or(true, |last| height > last);
        if grew {
            self.last_height = Some(height);
            self.last_growth = Some(now);
        }

        let quiet_for = self
            .last_growth
            .map(|t| now.saturating_duration_since(t))
            .unwrap_or_default();

        if !grew && quiet_for >= self.policy.quiet_window {
            ScrollStep::Settled
        } else if self.rounds >= self.policy.max_rounds {
            ScrollStep::Exhausted
        } else {
            ScrollStep::Continue
        }
    }

    pub fn rounds(&self) -> u32 {
        self.rounds
    }
}
