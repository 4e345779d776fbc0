// SPDX-FileCopyrightText: 2026 Penny Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Schedule policies and the scheduled agent capability.

use async_trait::async_trait;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::debug;

/// Background work the scheduler can trigger.
#[async_trait]
pub trait ScheduledAgent: Send + Sync {
    /// Name used in logs.
    fn name(&self) -> &str;

    /// Runs one unit of work. Returns `true` if anything was done.
    async fn execute(&self) -> bool;
}

/// Decides, from the current idle time, when an agent should run.
pub trait Schedule: Send {
    /// Whether the agent should run now.
    fn should_run(&mut self, idle_secs: f64) -> bool;

    /// Called when new inbound activity starts a new idle period.
    fn reset(&mut self);

    /// Called after the agent ran.
    fn mark_complete(&mut self);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum IdleState {
    /// Not yet triggered this idle period. `armed` is false right after a
    /// reset until an idle value below the threshold has been observed.
    Waiting { armed: bool },
    /// Threshold reached; reports true until the agent completes.
    Latched,
    /// Already fired this idle period.
    Fired,
}

/// Fires once per idle period, as soon as idle time reaches a threshold.
#[derive(Debug, Clone)]
pub struct IdleSchedule {
    threshold_secs: f64,
    state: IdleState,
}

impl IdleSchedule {
    pub fn new(threshold_secs: f64) -> Self {
        Self {
            threshold_secs,
            state: IdleState::Waiting { armed: true },
        }
    }
}

impl Schedule for IdleSchedule {
    fn should_run(&mut self, idle_secs: f64) -> bool {
        match self.state {
            IdleState::Latched => true,
            IdleState::Fired => false,
            IdleState::Waiting { armed } => {
                if idle_secs < self.threshold_secs {
                    self.state = IdleState::Waiting { armed: true };
                    false
                } else if armed || self.threshold_secs <= 0.0 {
                    self.state = IdleState::Latched;
                    true
                } else {
                    // Stale reading from before the reset.
                    false
                }
            }
        }
    }

    fn reset(&mut self) {
        self.state = IdleState::Waiting { armed: false };
    }

    fn mark_complete(&mut self) {
        self.state = IdleState::Fired;
    }
}

/// Fires once per idle period at a random point inside `[min, max]` seconds.
///
/// The target is drawn the first time idle time crosses `min` and kept
/// until the next reset.
#[derive(Debug)]
pub struct TwoPhaseSchedule {
    min_secs: f64,
    max_secs: f64,
    target_secs: Option<f64>,
    fired: bool,
    rng: StdRng,
}

impl TwoPhaseSchedule {
    pub fn new(min_secs: f64, max_secs: f64) -> Self {
        Self::with_rng(min_secs, max_secs, StdRng::from_entropy())
    }

    /// Uses the given generator, for reproducible targets.
    pub fn with_rng(min_secs: f64, max_secs: f64, rng: StdRng) -> Self {
        let (min_secs, max_secs) = if max_secs < min_secs {
            (max_secs, min_secs)
        } else {
            (min_secs, max_secs)
        };
        Self {
            min_secs,
            max_secs,
            target_secs: None,
            fired: false,
            rng,
        }
    }

    /// The target drawn for the current idle period, if any.
    pub fn target_secs(&self) -> Option<f64> {
        self.target_secs
    }
}

impl Schedule for TwoPhaseSchedule {
    fn should_run(&mut self, idle_secs: f64) -> bool {
        if self.fired || idle_secs < self.min_secs {
            return false;
        }
        let target = match self.target_secs {
            Some(target) => target,
            None => {
                let target = if self.max_secs > self.min_secs {
                    self.rng.gen_range(self.min_secs..=self.max_secs)
                } else {
                    self.min_secs
                };
                debug!(target_secs = target, "drew idle target");
                self.target_secs = Some(target);
                target
            }
        };
        idle_secs >= target
    }

    fn reset(&mut self) {
        self.target_secs = None;
        self.fired = false;
    }

    fn mark_complete(&mut self) {
        self.fired = true;
    }
}
