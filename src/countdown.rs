// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: (C) 2025 Cranky Kernel <crankykernel@proton.me>

use chrono::{DateTime, Utc};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::debug;

use crate::models::parse_timestamp;

pub const DEFAULT_TICK: Duration = Duration::from_millis(1000);

pub const AVAILABLE_NOW: &str = "Available now!";

const SECS_PER_MINUTE: i64 = 60;
const SECS_PER_HOUR: i64 = 60 * SECS_PER_MINUTE;
const SECS_PER_DAY: i64 = 24 * SECS_PER_HOUR;

pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TimeRemaining {
    pub days: u64,
    pub hours: u64,
    pub minutes: u64,
    pub seconds: u64,
}

impl TimeRemaining {
    pub fn total_seconds(&self) -> u64 {
        self.days * SECS_PER_DAY as u64
            + self.hours * SECS_PER_HOUR as u64
            + self.minutes * SECS_PER_MINUTE as u64
            + self.seconds
    }

    fn from_seconds(total: i64) -> Self {
        let total = total.max(0);
        Self {
            days: (total / SECS_PER_DAY) as u64,
            hours: ((total % SECS_PER_DAY) / SECS_PER_HOUR) as u64,
            minutes: ((total % SECS_PER_HOUR) / SECS_PER_MINUTE) as u64,
            seconds: (total % SECS_PER_MINUTE) as u64,
        }
    }
}

impl std::fmt::Display for TimeRemaining {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}d {:02}h {:02}m {:02}s",
            self.days, self.hours, self.minutes, self.seconds
        )
    }
}

/// Remaining time until `target`, or `None` once it has been reached.
/// Sub-second remainders are truncated.
pub fn time_remaining(target: DateTime<Utc>, now: DateTime<Utc>) -> Option<TimeRemaining> {
    let difference = target.signed_duration_since(now);
    if difference <= chrono::Duration::zero() {
        return None;
    }
    Some(TimeRemaining::from_seconds(difference.num_seconds()))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Countdown {
    Remaining(TimeRemaining),
    AvailableNow,
}

impl Countdown {
    pub fn at(target: Option<DateTime<Utc>>, now: DateTime<Utc>) -> Self {
        match target.and_then(|target| time_remaining(target, now)) {
            Some(remaining) => Countdown::Remaining(remaining),
            None => Countdown::AvailableNow,
        }
    }

    /// Missing or unparseable targets count as already available.
    pub fn for_target(raw: &str, now: DateTime<Utc>) -> Self {
        Self::at(parse_timestamp(raw), now)
    }

    pub fn is_available(&self) -> bool {
        matches!(self, Countdown::AvailableNow)
    }
}

impl std::fmt::Display for Countdown {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Countdown::Remaining(remaining) => write!(f, "{}", remaining),
            Countdown::AvailableNow => write!(f, "{}", AVAILABLE_NOW),
        }
    }
}

/// A live countdown for one target. Owns a single repeating task that
/// republishes the countdown every period until the timer is stopped or
/// dropped.
#[derive(Debug)]
pub struct CountdownTimer {
    receiver: watch::Receiver<Countdown>,
    task: Option<JoinHandle<()>>,
}

impl CountdownTimer {
    pub fn start(raw_target: &str, clock: Arc<dyn Clock>, period: Duration) -> Self {
        let target = parse_timestamp(raw_target);
        if target.is_none() {
            debug!("Countdown target {:?} is not a timestamp", raw_target);
        }

        let (sender, receiver) = watch::channel(Countdown::at(target, clock.now()));

        let mut interval = tokio::time::interval_at(Instant::now() + period, period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

        let task = tokio::spawn(async move {
            loop {
                interval.tick().await;
                let countdown = Countdown::at(target, clock.now());
                if sender.send(countdown).is_err() {
                    break;
                }
            }
        });

        Self {
            receiver,
            task: Some(task),
        }
    }

    pub fn latest(&self) -> Countdown {
        *self.receiver.borrow()
    }

    pub fn subscribe(&self) -> watch::Receiver<Countdown> {
        self.receiver.clone()
    }

    pub fn is_running(&self) -> bool {
        self.task.as_ref().is_some_and(|task| !task.is_finished())
    }

    pub fn stop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

impl Drop for CountdownTimer {
    fn drop(&mut self) {
        self.stop();
    }
}
