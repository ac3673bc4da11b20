//! Background tasks module
//! 
//! This module contains background tasks that run alongside the timer.

pub mod countdown;
pub mod event_log;

// Re-export main functions
pub use countdown::countdown_task;
pub use event_log::timer_event_task;
