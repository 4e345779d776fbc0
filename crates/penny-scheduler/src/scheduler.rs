// SPDX-FileCopyrightText: 2026 Penny Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The tick-driven background scheduler.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::schedule::{Schedule, ScheduledAgent};

/// Records when the conversation was last active.
///
/// Shared between the message handler, which calls [`notify`](Self::notify)
/// on every inbound message, and the scheduler, which reads idle time.
#[derive(Debug)]
pub struct ActivityTracker {
    last_activity: Mutex<Instant>,
    generation: AtomicU64,
}

impl ActivityTracker {
    pub fn new() -> Self {
        Self {
            last_activity: Mutex::new(Instant::now()),
            generation: AtomicU64::new(0),
        }
    }

    /// Marks inbound activity now.
    pub fn notify(&self) {
        *self
            .last_activity
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) = Instant::now();
        self.generation.fetch_add(1, Ordering::AcqRel);
    }

    /// Seconds since the last inbound activity.
    pub fn idle_secs(&self) -> f64 {
        self.last_activity
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .elapsed()
            .as_secs_f64()
    }

    /// Increments on every `notify`.
    pub fn generation(&self) -> u64 {
        self.generation.load(Ordering::Acquire)
    }
}

impl Default for ActivityTracker {
    fn default() -> Self {
        Self::new()
    }
}

struct Entry {
    schedule: Box<dyn Schedule>,
    agent: Arc<dyn ScheduledAgent>,
}

/// Evaluates schedules on a fixed tick and runs their agents.
///
/// Agents run one at a time inside the scheduler task, in registration order.
pub struct BackgroundScheduler {
    entries: Vec<Entry>,
    activity: Arc<ActivityTracker>,
    seen_generation: u64,
    tick_interval: Duration,
}

impl BackgroundScheduler {
    pub fn new(activity: Arc<ActivityTracker>, tick_interval: Duration) -> Self {
        let seen_generation = activity.generation();
        Self {
            entries: Vec::new(),
            activity,
            seen_generation,
            tick_interval,
        }
    }

    /// Pairs a schedule with the agent it triggers.
    pub fn register(&mut self, schedule: Box<dyn Schedule>, agent: Arc<dyn ScheduledAgent>) {
        info!(agent = agent.name(), "registered background agent");
        self.entries.push(Entry { schedule, agent });
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// One scheduler pass. Returns the names of the agents that ran to
    /// completion.
    ///
    /// A running agent is dropped as soon as `cancel` fires; it is not marked
    /// complete and the remaining agents are skipped.
    pub async fn tick(&mut self, cancel: &CancellationToken) -> Vec<String> {
        let generation = self.activity.generation();
        if generation != self.seen_generation {
            self.seen_generation = generation;
            for entry in &mut self.entries {
                entry.schedule.reset();
            }
            debug!("inbound activity, schedules reset");
        }

        let idle_secs = self.activity.idle_secs();
        let mut ran = Vec::new();
        for entry in &mut self.entries {
            if cancel.is_cancelled() {
                break;
            }
            if !entry.schedule.should_run(idle_secs) {
                continue;
            }
            let name = entry.agent.name().to_string();
            debug!(agent = %name, idle_secs, "running background agent");
            let did_work = tokio::select! {
                _ = cancel.cancelled() => {
                    info!(agent = %name, "background agent interrupted by shutdown");
                    break;
                }
                did_work = entry.agent.execute() => did_work,
            };
            entry.schedule.mark_complete();
            info!(agent = %name, did_work, "background agent finished");
            ran.push(name);
        }
        ran
    }

    /// Ticks until `cancel` fires.
    pub async fn run(mut self, cancel: CancellationToken) {
        let mut interval = tokio::time::interval(self.tick_interval);
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        info!(
            agents = self.entries.len(),
            tick_ms = self.tick_interval.as_millis() as u64,
            "scheduler started"
        );

        loop {
            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = interval.tick() => {
                    self.tick(&cancel).await;
                }
            }
        }
        info!("scheduler stopped");
    }
}
