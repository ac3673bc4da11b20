//! Utility functions module
//! 
//! This module contains utility functions used throughout the application.

pub mod display;
pub mod signals;

// Re-export main functions
pub use display::{format_time, format_uptime, progress_percent};
pub use signals::shutdown_signal;
