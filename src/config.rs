//! Configuration and CLI argument handling

use clap::Parser;

use crate::state::TimerOptions;

/// CLI argument parsing structure
#[derive(Parser, Debug)]
#[command(name = "battle-timer")]
#[command(about = "A server-synchronized countdown timer daemon")]
#[command(version)]
pub struct Config {
    /// Port to bind the server to
    #[arg(short, long, default_value = "20554")]
    pub port: u16,

    /// Host address to bind to
    #[arg(long, default_value = "0.0.0.0")]
    pub host: String,

    /// Remaining seconds at or below which the warning fires
    #[arg(short, long, default_value = "30")]
    pub warning_threshold: u64,

    /// Remaining seconds at or below which the timer counts as critical
    #[arg(long, default_value = "10")]
    pub critical_threshold: u64,

    /// Duration in seconds that corresponds to 100% progress
    #[arg(short, long, default_value = "180")]
    pub reference_duration: u64,

    /// Sync this many seconds and start counting immediately
    #[arg(long, value_name = "SECONDS")]
    pub start: Option<i64>,

    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,
}

impl Config {
    /// Parse configuration from command line arguments
    pub fn parse() -> Self {
        Parser::parse()
    }

    /// Get the server address as a formatted string
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Get the appropriate log level based on verbose flag
    pub fn log_level(&self) -> &'static str {
        if self.verbose { "debug" } else { "info" }
    }

    /// Timer thresholds taken from the command line
    pub fn timer_options(&self) -> TimerOptions {
        TimerOptions {
            warning_threshold: self.warning_threshold,
            critical_threshold: self.critical_threshold,
            reference_duration: self.reference_duration,
        }
    }
}
