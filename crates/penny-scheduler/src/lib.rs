// SPDX-FileCopyrightText: 2026 Penny Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Idle-triggered scheduling of background agents.
//!
//! A [`BackgroundScheduler`] ticks at a fixed interval, measures how long the
//! conversation has been idle, and asks each registered [`Schedule`] whether
//! its paired [`ScheduledAgent`] should run. Inbound activity is reported
//! through an [`ActivityTracker`] and resets every schedule.

pub mod schedule;
pub mod scheduler;

pub use schedule::{IdleSchedule, Schedule, ScheduledAgent, TwoPhaseSchedule};
pub use scheduler::{ActivityTracker, BackgroundScheduler};
