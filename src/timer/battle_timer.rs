//! Async handle that drives a countdown on the tokio runtime

use std::{
    fmt,
    sync::{Arc, Mutex},
};
use tokio::{
    sync::{broadcast, watch, Notify},
    task::JoinHandle,
};
use tracing::{debug, info, warn};

use crate::{
    state::timer_state::{
        AuthoritativeUpdate, Countdown, ResetKey, SyncOutcome, TimerEvent, TimerOptions,
        TimerSnapshot,
    },
    tasks::countdown_task,
};

type WarningCallback = Box<dyn Fn(u64) + Send + Sync>;
type ExpireCallback = Box<dyn Fn() + Send + Sync>;

/// Optional one-shot callbacks invoked by the countdown
#[derive(Default)]
pub struct TimerCallbacks {
    on_warning: Option<WarningCallback>,
    on_expire: Option<ExpireCallback>,
}

impl TimerCallbacks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Called with the remaining seconds on entry into the warning zone
    pub fn on_warning<F>(mut self, callback: F) -> Self
    where
        F: Fn(u64) + Send + Sync + 'static,
    {
        self.on_warning = Some(Box::new(callback));
        self
    }

    /// Called when the countdown reaches zero
    pub fn on_expire<F>(mut self, callback: F) -> Self
    where
        F: Fn() + Send + Sync + 'static,
    {
        self.on_expire = Some(Box::new(callback));
        self
    }

    fn dispatch(&self, event: TimerEvent) {
        match event {
            TimerEvent::Warning { remaining_seconds } => {
                if let Some(callback) = &self.on_warning {
                    callback(remaining_seconds);
                }
            }
            TimerEvent::Expired => {
                if let Some(callback) = &self.on_expire {
                    callback();
                }
            }
        }
    }
}

impl fmt::Debug for TimerCallbacks {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TimerCallbacks")
            .field("on_warning", &self.on_warning.is_some())
            .field("on_expire", &self.on_expire.is_some())
            .finish()
    }
}

/// State shared between the handle and its countdown task
#[derive(Debug)]
pub struct TimerCore {
    countdown: Mutex<Countdown>,
    callbacks: TimerCallbacks,
    /// Wakes the countdown task after a resync or gate change
    pub(crate) wake: Notify,
    snapshot_tx: watch::Sender<TimerSnapshot>,
    event_tx: broadcast::Sender<TimerEvent>,
}

impl TimerCore {
    fn new(options: TimerOptions, callbacks: TimerCallbacks) -> Self {
        let countdown = Countdown::new(options);
        let (snapshot_tx, _) = watch::channel(countdown.snapshot());
        let (event_tx, _) = broadcast::channel(32);

        Self {
            countdown: Mutex::new(countdown),
            callbacks,
            wake: Notify::new(),
            snapshot_tx,
            event_tx,
        }
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, Countdown>, String> {
        self.countdown
            .lock()
            .map_err(|e| format!("Failed to lock countdown state: {}", e))
    }

    pub(crate) fn can_tick(&self) -> Result<bool, String> {
        Ok(self.lock()?.can_tick())
    }

    /// Advance one second; returns whether the countdown can keep moving
    pub(crate) fn tick(&self) -> Result<bool, String> {
        let mut countdown = self.lock()?;
        let Some(events) = countdown.tick() else {
            return Ok(false);
        };
        let keep_going = countdown.can_tick();
        self.publish(&countdown.snapshot(), &events);
        drop(countdown);

        self.dispatch(events);
        Ok(keep_going)
    }

    /// Build and apply an update while holding the countdown lock
    fn observe_with<F>(&self, build: F) -> Result<TimerSnapshot, String>
    where
        F: FnOnce(&Countdown) -> AuthoritativeUpdate,
    {
        let mut countdown = self.lock()?;
        let update = build(&countdown);
        let outcome = countdown.observe(update);
        let snapshot = countdown.snapshot();

        let SyncOutcome::Resynced(events) = outcome else {
            return Ok(snapshot);
        };
        self.publish(&snapshot, &events);
        drop(countdown);

        self.wake.notify_one();
        self.dispatch(events);
        Ok(snapshot)
    }

    fn observe(&self, update: AuthoritativeUpdate) -> Result<TimerSnapshot, String> {
        self.observe_with(|_| update)
    }

    /// Apply a value under whatever reset key is current
    fn sync(&self, time_remaining: Option<i64>) -> Result<TimerSnapshot, String> {
        self.observe_with(|countdown| {
            AuthoritativeUpdate::new(time_remaining, countdown.reset_key().cloned())
        })
    }

    fn set_active(&self, active: bool) -> Result<TimerSnapshot, String> {
        let mut countdown = self.lock()?;
        if !countdown.set_active(active) {
            return Ok(countdown.snapshot());
        }
        let snapshot = countdown.snapshot();
        self.publish(&snapshot, &[]);
        drop(countdown);

        debug!("Countdown gate set to active={}", active);
        self.wake.notify_one();
        Ok(snapshot)
    }

    /// Fan out a state change; callers hold the countdown lock so
    /// subscribers see changes in the order they were made
    fn publish(&self, snapshot: &TimerSnapshot, events: &[TimerEvent]) {
        self.snapshot_tx.send_replace(snapshot.clone());

        for &event in events {
            if self.event_tx.send(event).is_err() {
                debug!("No subscribers for timer event {:?}", event);
            }
        }
    }

    /// Run user callbacks with the countdown lock released
    fn dispatch(&self, events: Vec<TimerEvent>) {
        for event in events {
            self.callbacks.dispatch(event);
        }
    }
}

/// A countdown synchronized to an authoritative remaining time
///
/// Dropping the handle stops the countdown task; no state changes are
/// published afterwards.
#[derive(Debug)]
pub struct BattleTimer {
    core: Arc<TimerCore>,
    task: Mutex<Option<JoinHandle<()>>>,
}

impl BattleTimer {
    /// Spawn the countdown task on the current tokio runtime
    pub fn spawn(options: TimerOptions, callbacks: TimerCallbacks) -> Self {
        let core = Arc::new(TimerCore::new(options, callbacks));
        let task = tokio::spawn(countdown_task(Arc::clone(&core)));

        info!(
            "Battle timer started (warning={}s, critical={}s, reference={}s)",
            options.warning_threshold, options.critical_threshold, options.reference_duration
        );

        Self { core, task: Mutex::new(Some(task)) }
    }

    /// Feed a raw observation of the upstream time source
    pub fn observe(&self, update: AuthoritativeUpdate) -> Result<TimerSnapshot, String> {
        self.core.observe(update)
    }

    /// Sync to an authoritative value, keeping the current reset key
    pub fn sync(&self, time_remaining: Option<i64>) -> Result<TimerSnapshot, String> {
        self.core.sync(time_remaining)
    }

    /// Sync to an authoritative value under a new reset key
    pub fn reset(
        &self,
        reset_key: impl Into<ResetKey>,
        time_remaining: Option<i64>,
    ) -> Result<TimerSnapshot, String> {
        let reset_key = reset_key.into();
        info!("Resetting timer under key {}", reset_key);
        self.observe(AuthoritativeUpdate::new(time_remaining, Some(reset_key)))
    }

    pub fn set_active(&self, active: bool) -> Result<TimerSnapshot, String> {
        self.core.set_active(active)
    }

    pub fn snapshot(&self) -> Result<TimerSnapshot, String> {
        Ok(self.core.lock()?.snapshot())
    }

    /// Watch every published snapshot
    pub fn subscribe(&self) -> watch::Receiver<TimerSnapshot> {
        self.core.snapshot_tx.subscribe()
    }

    /// Receive warning and expiry events
    pub fn events(&self) -> broadcast::Receiver<TimerEvent> {
        self.core.event_tx.subscribe()
    }

    /// Stop the countdown task and wait for it to finish
    pub async fn shutdown(&self) {
        let task = match self.task.lock() {
            Ok(mut task) => task.take(),
            Err(e) => {
                warn!("Failed to lock countdown task handle: {}", e);
                return;
            }
        };

        if let Some(task) = task {
            task.abort();
            if let Err(e) = task.await {
                if !e.is_cancelled() {
                    warn!("Countdown task ended abnormally: {}", e);
                }
            }
        }
        info!("Battle timer stopped");
    }
}

impl Drop for BattleTimer {
    fn drop(&mut self) {
        let task = match self.task.get_mut() {
            Ok(task) => task.take(),
            Err(poisoned) => poisoned.into_inner().take(),
        };
        if let Some(task) = task {
            task.abort();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resync_after_expiring_tick_is_the_published_state() {
        let core = TimerCore::new(TimerOptions::default(), TimerCallbacks::new());
        let snapshots = core.snapshot_tx.subscribe();
        let mut events = core.event_tx.subscribe();

        core.sync(Some(1)).unwrap();
        core.set_active(true).unwrap();
        assert!(!core.tick().unwrap());
        assert_eq!(snapshots.borrow().remaining_seconds, Some(0));

        core.set_active(false).unwrap();
        let synced = core.sync(Some(60)).unwrap();

        assert_eq!(synced.remaining_seconds, Some(60));
        assert_eq!(*snapshots.borrow(), synced);
        assert_eq!(*snapshots.borrow(), core.lock().unwrap().snapshot());
        assert_eq!(events.try_recv().unwrap(), TimerEvent::Warning { remaining_seconds: 1 });
        assert_eq!(events.try_recv().unwrap(), TimerEvent::Expired);
        assert!(events.try_recv().is_err());
    }

    #[test]
    fn callbacks_run_with_the_lock_released() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let log = Arc::clone(&seen);
        let core = Arc::new_cyclic(|weak: &std::sync::Weak<TimerCore>| {
            let weak = weak.clone();
            TimerCore::new(
                TimerOptions::default(),
                TimerCallbacks::new().on_expire(move || {
                    if let Some(core) = weak.upgrade() {
                        let snapshot = core.sync(Some(45)).unwrap();
                        log.lock().unwrap().push(snapshot.remaining_seconds);
                    }
                }),
            )
        });

        core.sync(Some(0)).unwrap();
        assert_eq!(*seen.lock().unwrap(), vec![Some(45)]);
        assert_eq!(core.snapshot_tx.borrow().remaining_seconds, Some(45));
    }

    #[test]
    fn plain_sync_keeps_the_latest_reset_key() {
        let core = TimerCore::new(TimerOptions::default(), TimerCallbacks::new());
        core.observe(AuthoritativeUpdate::new(Some(60), Some("first".into()))).unwrap();
        core.observe(AuthoritativeUpdate::new(Some(60), Some("second".into()))).unwrap();
        core.set_active(true).unwrap();
        core.tick().unwrap();

        let snapshot = core.sync(Some(60)).unwrap();
        assert_eq!(snapshot.remaining_seconds, Some(59));
        assert_eq!(core.lock().unwrap().reset_key(), Some(&ResetKey::from("second")));
    }
}
