//! Timer runtime module
//!
//! This module wraps the countdown state machine in an async handle that
//! ticks on the tokio runtime and fans out snapshots and events.

pub mod battle_timer;

// Re-export main types
pub use battle_timer::{BattleTimer, TimerCallbacks, TimerCore};
