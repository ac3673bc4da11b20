//! Main application state management

use std::{
    sync::{Arc, Mutex},
    time::Instant,
};
use chrono::{DateTime, Utc};
use tracing::info;

use super::{ResetKey, TimerEvent, TimerOptions, TimerSnapshot};
use crate::{
    timer::{BattleTimer, TimerCallbacks},
    utils::format_uptime,
};

/// Main application state that owns the battle timer and server metadata
#[derive(Debug)]
pub struct AppState {
    /// The synchronized countdown
    pub timer: BattleTimer,
    /// Server metadata
    pub start_time: Instant,
    pub port: u16,
    pub host: String,
    /// Last action tracking
    pub last_action: Arc<Mutex<Option<String>>>,
    pub last_action_time: Arc<Mutex<Option<DateTime<Utc>>>>,
    /// Last timer event tracking
    pub last_event: Arc<Mutex<Option<TimerEvent>>>,
    pub last_event_time: Arc<Mutex<Option<DateTime<Utc>>>>,
}

impl AppState {
    /// Create a new AppState and spawn its timer
    pub fn new(port: u16, host: String, options: TimerOptions, callbacks: TimerCallbacks) -> Self {
        Self {
            timer: BattleTimer::spawn(options, callbacks),
            start_time: Instant::now(),
            port,
            host,
            last_action: Arc::new(Mutex::new(None)),
            last_action_time: Arc::new(Mutex::new(None)),
            last_event: Arc::new(Mutex::new(None)),
            last_event_time: Arc::new(Mutex::new(None)),
        }
    }

    fn record_action(&self, action: &str) {
        if let Ok(mut last_action) = self.last_action.lock() {
            *last_action = Some(action.to_string());
        }
        if let Ok(mut last_time) = self.last_action_time.lock() {
            *last_time = Some(Utc::now());
        }
    }

    /// Apply an authoritative value; a reset key forces a restart
    pub fn apply_sync(
        &self,
        time_remaining: Option<i64>,
        reset_key: Option<ResetKey>,
    ) -> Result<TimerSnapshot, String> {
        let snapshot = match reset_key {
            Some(key) => {
                self.record_action("reset");
                self.timer.reset(key, time_remaining)?
            }
            None => {
                self.record_action("sync");
                self.timer.sync(time_remaining)?
            }
        };

        info!(
            "Authoritative update applied: remaining={:?}, phase={}",
            snapshot.remaining_seconds,
            snapshot.phase.as_str()
        );
        Ok(snapshot)
    }

    /// Open the countdown gate
    pub fn start(&self) -> Result<TimerSnapshot, String> {
        info!("Starting countdown");
        self.record_action("start");
        self.timer.set_active(true)
    }

    /// Close the countdown gate
    pub fn pause(&self) -> Result<TimerSnapshot, String> {
        info!("Pausing countdown");
        self.record_action("pause");
        self.timer.set_active(false)
    }

    /// Remember the latest timer event for status reporting
    pub fn record_event(&self, event: TimerEvent) -> Result<(), String> {
        let mut last_event = self.last_event.lock()
            .map_err(|e| format!("Failed to lock last event: {}", e))?;
        *last_event = Some(event);
        drop(last_event);

        let mut last_time = self.last_event_time.lock()
            .map_err(|e| format!("Failed to lock last event time: {}", e))?;
        *last_time = Some(Utc::now());
        Ok(())
    }

    /// Calculate server uptime as a formatted string
    pub fn get_uptime(&self) -> String {
        format_uptime(self.start_time.elapsed())
    }

    /// Get last action information
    pub fn get_last_action(&self) -> (Option<String>, Option<DateTime<Utc>>) {
        let last_action = self.last_action.lock().ok().and_then(|a| a.clone());
        let last_action_time = self.last_action_time.lock().ok().and_then(|t| *t);
        (last_action, last_action_time)
    }

    /// Get last timer event information
    pub fn get_last_event(&self) -> (Option<TimerEvent>, Option<DateTime<Utc>>) {
        let last_event = self.last_event.lock().ok().and_then(|e| *e);
        let last_event_time = self.last_event_time.lock().ok().and_then(|t| *t);
        (last_event, last_event_time)
    }
}
