//! Battle Timer - A countdown synchronized to an authoritative remaining time
//! 
//! This library provides a countdown that follows a coarse, periodically
//! refreshed server value while ticking smoothly between refreshes, with
//! one-shot warning and expiry notifications.

pub mod config;
pub mod state;
pub mod timer;
pub mod api;
pub mod tasks;
pub mod utils;

// Re-export commonly used types
pub use config::Config;
pub use state::{AppState, AuthoritativeUpdate, ResetKey, TimerEvent, TimerOptions, TimerSnapshot};
pub use timer::{BattleTimer, TimerCallbacks};
pub use api::create_router;
pub use utils::signals::shutdown_signal;
