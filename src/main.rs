//! Battle Timer - A server-synchronized countdown timer daemon
//!
//! This is the main entry point for the battle-timer application.

use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{info, warn};

use battle_timer::{
    api::create_router,
    config::Config,
    state::AppState,
    tasks::timer_event_task,
    timer::TimerCallbacks,
    utils::shutdown_signal,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::parse();

    // Initialize tracing with appropriate log level
    tracing_subscriber::fmt()
        .with_env_filter(format!("battle_timer={},tower_http=info", config.log_level()))
        .init();

    info!("Starting battle-timer server v{}", env!("CARGO_PKG_VERSION"));
    info!("Configuration: host={}, port={}, warning={}s, critical={}s, reference={}s",
          config.host, config.port, config.warning_threshold,
          config.critical_threshold, config.reference_duration);

    // Create application state, which spawns the countdown task
    let callbacks = TimerCallbacks::new()
        .on_warning(|remaining| info!("Warning threshold reached: {}s left", remaining))
        .on_expire(|| info!("Countdown reached zero"));
    let state = Arc::new(AppState::new(
        config.port,
        config.host.clone(),
        config.timer_options(),
        callbacks,
    ));

    // Start the timer event background task
    let event_state = Arc::clone(&state);
    let event_task = tokio::spawn(async move {
        timer_event_task(event_state).await;
    });

    if let Some(seconds) = config.start {
        info!("Starting countdown from {}s", seconds);
        state.apply_sync(Some(seconds), None).map_err(anyhow::Error::msg)?;
        state.start().map_err(anyhow::Error::msg)?;
    }

    // Create HTTP router with all endpoints
    let app = create_router(Arc::clone(&state));

    // Bind to the specified address
    let addr = config.address();
    let listener = TcpListener::bind(&addr).await?;

    info!("Server running on http://{}", addr);
    info!("Endpoints:");
    info!("  POST /sync   - Apply authoritative remaining time");
    info!("  POST /start  - Start the countdown");
    info!("  POST /pause  - Pause the countdown");
    info!("  GET  /status - Check timer status");
    info!("  GET  /health - Health check");

    // Setup graceful shutdown
    let server = axum::serve(listener, app);

    tokio::select! {
        result = server => {
            if let Err(e) = result {
                tracing::error!("Server error: {}", e);
            }
        }
        _ = shutdown_signal() => {
            info!("Shutdown signal received");
        }
    }

    event_task.abort();
    if let Err(e) = event_task.await {
        if !e.is_cancelled() {
            warn!("Timer event task ended abnormally: {}", e);
        }
    }
    state.timer.shutdown().await;

    info!("Server shutdown complete");
    Ok(())
}
