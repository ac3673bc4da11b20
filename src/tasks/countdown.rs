//! One-second countdown background task

use std::{sync::Arc, time::Duration};
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::{debug, error, info};

use crate::timer::TimerCore;

const TICK: Duration = Duration::from_secs(1);

/// Background task that decrements the countdown once per elapsed second
pub async fn countdown_task(core: Arc<TimerCore>) {
    info!("Starting countdown task");

    loop {
        // Park until the countdown is active and has time left
        loop {
            match core.can_tick() {
                Ok(true) => break,
                Ok(false) => core.wake.notified().await,
                Err(e) => {
                    error!("Countdown task stopping: {}", e);
                    return;
                }
            }
        }

        // Fresh phase: the first decrement lands one full second from now
        let mut interval = interval_at(Instant::now() + TICK, TICK);
        interval.set_missed_tick_behavior(MissedTickBehavior::Burst);

        loop {
            tokio::select! {
                biased;

                _ = core.wake.notified() => {
                    debug!("Countdown resynced or gated, restarting tick phase");
                    break;
                }

                _ = interval.tick() => {
                    match core.tick() {
                        Ok(true) => {}
                        Ok(false) => {
                            debug!("Countdown cannot advance, parking");
                            break;
                        }
                        Err(e) => {
                            error!("Countdown task stopping: {}", e);
                            return;
                        }
                    }
                }
            }
        }
    }
}
