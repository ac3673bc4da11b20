//! Timer event logging background task

use std::sync::Arc;
use tokio::sync::broadcast::error::RecvError;
use tracing::{error, info, warn};

use crate::state::{AppState, TimerEvent};

/// Background task that logs timer events and records the latest one
pub async fn timer_event_task(state: Arc<AppState>) {
    info!("Starting timer event task");

    let mut events = state.timer.events();

    loop {
        match events.recv().await {
            Ok(event) => {
                match event {
                    TimerEvent::Warning { remaining_seconds } => {
                        warn!("Timer entered warning zone with {}s remaining", remaining_seconds);
                    }
                    TimerEvent::Expired => {
                        info!("Timer expired");
                    }
                }

                if let Err(e) = state.record_event(event) {
                    error!("Failed to record timer event: {}", e);
                }
            }
            Err(RecvError::Lagged(skipped)) => {
                warn!("Timer event task lagged, skipped {} events", skipped);
            }
            Err(RecvError::Closed) => {
                info!("Timer event channel closed, stopping event task");
                break;
            }
        }
    }
}
