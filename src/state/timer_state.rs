//! Countdown state machine synchronized to an authoritative remaining time

use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::utils::display::{format_time, progress_percent};

pub const DEFAULT_WARNING_THRESHOLD: u64 = 30;
pub const DEFAULT_CRITICAL_THRESHOLD: u64 = 10;
pub const DEFAULT_REFERENCE_DURATION: u64 = 180;

/// Opaque token whose change forces a resync even when the authoritative
/// value repeats
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ResetKey(String);

impl From<&str> for ResetKey {
    fn from(key: &str) -> Self {
        Self(key.to_string())
    }
}

impl From<String> for ResetKey {
    fn from(key: String) -> Self {
        Self(key)
    }
}

impl From<u64> for ResetKey {
    fn from(key: u64) -> Self {
        Self(key.to_string())
    }
}

impl fmt::Display for ResetKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Thresholds and reference duration for a countdown
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimerOptions {
    /// Upper bound (inclusive) of the warning zone, in seconds
    pub warning_threshold: u64,
    /// Upper bound (inclusive) of the critical zone, in seconds
    pub critical_threshold: u64,
    /// Duration that maps to 100% progress
    pub reference_duration: u64,
}

impl Default for TimerOptions {
    fn default() -> Self {
        Self {
            warning_threshold: DEFAULT_WARNING_THRESHOLD,
            critical_threshold: DEFAULT_CRITICAL_THRESHOLD,
            reference_duration: DEFAULT_REFERENCE_DURATION,
        }
    }
}

/// One observation of the upstream time source
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthoritativeUpdate {
    pub time_remaining: Option<i64>,
    pub reset_key: Option<ResetKey>,
}

impl AuthoritativeUpdate {
    pub fn new(time_remaining: Option<i64>, reset_key: Option<ResetKey>) -> Self {
        Self { time_remaining, reset_key }
    }
}

/// One-shot notifications emitted by the countdown
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TimerEvent {
    Warning { remaining_seconds: u64 },
    Expired,
}

/// Where the countdown currently sits in its lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimerPhase {
    Unsynced,
    Counting,
    Paused,
    Expired,
}

impl TimerPhase {
    pub fn as_str(&self) -> &'static str {
        match self {
            TimerPhase::Unsynced => "unsynced",
            TimerPhase::Counting => "counting",
            TimerPhase::Paused => "paused",
            TimerPhase::Expired => "expired",
        }
    }
}

/// Raw countdown state with its one-shot guards
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TimerState {
    pub time_remaining_seconds: Option<u64>,
    pub warning_fired: bool,
    pub expired_fired: bool,
}

/// Result of feeding an authoritative update into the countdown
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncOutcome {
    /// Same value and same reset key as last time
    Unchanged,
    /// Something changed but no value was supplied; local time is kept
    Absent,
    /// Local time was replaced by the authoritative value
    Resynced(Vec<TimerEvent>),
}

/// Read-only view of the countdown handed to callers
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimerSnapshot {
    pub remaining_seconds: Option<u64>,
    pub formatted: String,
    pub is_warning: bool,
    pub is_critical: bool,
    pub is_expired: bool,
    pub progress: f64,
    pub is_active: bool,
    pub phase: TimerPhase,
    pub warning_threshold: u64,
}

/// Countdown that follows an authoritative time source
///
/// Authoritative values are treated as events: local time is only replaced
/// when the value or the reset key differs from the previous observation, so
/// repeated deliveries of the same figure never undo local ticks.
#[derive(Debug, Clone)]
pub struct Countdown {
    options: TimerOptions,
    state: TimerState,
    active: bool,
    last_value: Option<i64>,
    last_reset_key: Option<ResetKey>,
}

impl Countdown {
    pub fn new(options: TimerOptions) -> Self {
        Self {
            options,
            state: TimerState::default(),
            active: false,
            last_value: None,
            last_reset_key: None,
        }
    }

    pub fn options(&self) -> &TimerOptions {
        &self.options
    }

    pub fn state(&self) -> &TimerState {
        &self.state
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn reset_key(&self) -> Option<&ResetKey> {
        self.last_reset_key.as_ref()
    }

    pub fn phase(&self) -> TimerPhase {
        match self.state.time_remaining_seconds {
            None => TimerPhase::Unsynced,
            Some(0) => TimerPhase::Expired,
            Some(_) if self.active => TimerPhase::Counting,
            Some(_) => TimerPhase::Paused,
        }
    }

    /// Feed one observation of the upstream source
    pub fn observe(&mut self, update: AuthoritativeUpdate) -> SyncOutcome {
        let value_changed = update.time_remaining != self.last_value;
        let key_changed = update.reset_key != self.last_reset_key;

        self.last_value = update.time_remaining;
        self.last_reset_key = update.reset_key;

        if !value_changed && !key_changed {
            return SyncOutcome::Unchanged;
        }

        let Some(value) = update.time_remaining else {
            return SyncOutcome::Absent;
        };

        let seconds = value.max(0) as u64;
        debug!(
            "Resyncing countdown to {}s (value_changed={}, key_changed={})",
            seconds, value_changed, key_changed
        );

        self.state.time_remaining_seconds = Some(seconds);
        if seconds > self.options.warning_threshold {
            self.state.warning_fired = false;
        }
        if seconds > 0 {
            self.state.expired_fired = false;
        }

        SyncOutcome::Resynced(self.evaluate())
    }

    /// Open or close the countdown gate, returning whether it changed
    pub fn set_active(&mut self, active: bool) -> bool {
        let changed = self.active != active;
        self.active = active;
        changed
    }

    pub fn can_tick(&self) -> bool {
        self.active && matches!(self.state.time_remaining_seconds, Some(t) if t > 0)
    }

    /// Advance by one second; `None` when the countdown cannot move
    pub fn tick(&mut self) -> Option<Vec<TimerEvent>> {
        if !self.can_tick() {
            return None;
        }

        let remaining = self.state.time_remaining_seconds.unwrap_or(0);
        self.state.time_remaining_seconds = Some(remaining.saturating_sub(1));
        Some(self.evaluate())
    }

    fn evaluate(&mut self) -> Vec<TimerEvent> {
        let mut events = Vec::new();
        let Some(remaining) = self.state.time_remaining_seconds else {
            return events;
        };

        if remaining > 0
            && remaining <= self.options.warning_threshold
            && !self.state.warning_fired
        {
            self.state.warning_fired = true;
            events.push(TimerEvent::Warning { remaining_seconds: remaining });
        }

        if remaining == 0 && !self.state.expired_fired {
            self.state.expired_fired = true;
            events.push(TimerEvent::Expired);
        }

        events
    }

    pub fn snapshot(&self) -> TimerSnapshot {
        let remaining = self.state.time_remaining_seconds;
        let as_signed = remaining.map(|s| s as i64);
        let in_zone = |threshold: u64| matches!(remaining, Some(t) if t > 0 && t <= threshold);

        TimerSnapshot {
            remaining_seconds: remaining,
            formatted: format_time(as_signed),
            is_warning: in_zone(self.options.warning_threshold),
            is_critical: in_zone(self.options.critical_threshold),
            is_expired: remaining == Some(0),
            progress: progress_percent(as_signed, self.options.reference_duration),
            is_active: self.active,
            phase: self.phase(),
            warning_threshold: self.options.warning_threshold,
        }
    }
}

impl Default for Countdown {
    fn default() -> Self {
        Self::new(TimerOptions::default())
    }
}
