//! State management module
//! 
//! This module contains the countdown state machine and the shared
//! application state of the daemon.

pub mod timer_state;
pub mod app_state;

// Re-export main types
pub use app_state::AppState;
pub use timer_state::{
    AuthoritativeUpdate, Countdown, ResetKey, SyncOutcome, TimerEvent, TimerOptions,
    TimerPhase, TimerSnapshot, TimerState,
};
