//! # batscope
//!
//! Client library and local dashboard for a bioacoustic bat-call
//! identification service.
//!
//! ## Design Philosophy
//!
//! batscope is designed to be:
//! - **Stream-first** - Batch progress is folded line by line from the backend's NDJSON stream
//! - **Sensible defaults** - Works against a local backend with zero configuration
//! - **Library-first** - The dashboard is a Rust type; the REST/SSE API is optional
//! - **Event-driven** - Consumers subscribe to events, no polling required
//!
//! ## Quick Start
//!
//! ```no_run
//! use batscope::{AnalysisParams, Config, Dashboard, UploadFile};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let mut config = Config::default();
//!     config.backend.base_url = "http://localhost:8000".to_string();
//!
//!     let dashboard = Dashboard::new(config)?;
//!
//!     // Subscribe to events
//!     let mut events = dashboard.subscribe();
//!     tokio::spawn(async move {
//!         while let Ok(event) = events.recv().await {
//!             println!("Event: {:?}", event);
//!         }
//!     });
//!
//!     let uploads = vec![UploadFile::from_path("recordings/pond_01.wav").await?];
//!     let outcome = dashboard
//!         .submit_batch(uploads, &AnalysisParams::default())
//!         .await?;
//!     println!("{outcome:?}");
//!
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::unwrap_used)]
#![warn(clippy::expect_used)]

/// Species filters, profiles, and chart data over stored results
pub mod analytics;
/// REST API module
pub mod api;
/// Batch store and stream consumer
pub mod batch;
/// Classification backend HTTP client
pub mod client;
/// Configuration types
pub mod config;
/// Dashboard facade (decomposed into focused submodules)
pub mod dashboard;
/// Error types
pub mod error;
/// NDJSON stream decoding
pub mod stream;
/// Core types and events
pub mod types;
/// Utility functions
pub mod utils;

// Re-export commonly used types
pub use batch::{BatchOutcome, BatchSnapshot, BatchStore, FoldOutcome, RefreshHandler};
pub use client::{ApiClient, UploadFile};
pub use config::{AnalysisParams, BackendConfig, Config};
pub use dashboard::{Dashboard, DashboardView};
pub use error::{ApiError, BatchError, Error, ErrorDetail, Result, ToHttpStatus};
pub use stream::{NdjsonReader, StreamEvent};
pub use types::{
    AnalysisResult, BatchPhase, BatchProgress, CallParameters, ChatMessage, ChatRole, Download,
    Event, ExportFormat, HealthStatus, InputType, LogLine, SpeciesDetected, SpectrogramTheme,
    Statistics,
};

/// Run the dashboard until a termination signal arrives.
///
/// Starts the health monitor and the local API server, waits for a signal
/// (or for the server to fail), then calls [`Dashboard::shutdown`].
///
/// - **Unix:** listens for SIGTERM and SIGINT, with fallbacks if signal registration fails.
/// - **Windows/other:** listens for Ctrl+C via `tokio::signal::ctrl_c()`.
///
/// # Errors
///
/// Returns the API server's error if it stopped before a signal arrived
/// (for example when the bind address is taken).
///
/// # Example
///
/// ```no_run
/// use batscope::{Dashboard, Config, run_with_shutdown};
/// use std::sync::Arc;
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let dashboard = Arc::new(Dashboard::new(Config::default())?);
///
///     // Serve until Ctrl+C
///     run_with_shutdown(dashboard).await?;
///
///     Ok(())
/// }
/// ```
pub async fn run_with_shutdown(dashboard: std::sync::Arc<Dashboard>) -> Result<()> {
    let monitor = dashboard.start_health_monitor();
    let mut server = dashboard.spawn_api_server();

    let served = tokio::select! {
        _ = wait_for_signal() => Ok(()),
        joined = &mut server => match joined {
            Ok(result) => result,
            Err(e) => Err(Error::ApiServerError(e.to_string())),
        },
    };

    if let Err(e) = &served {
        tracing::error!(error = %e, "API server stopped unexpectedly");
    }

    dashboard.shutdown().await;
    server.abort();
    if let Err(e) = monitor.await {
        tracing::warn!(error = %e, "health monitor task ended abnormally");
    }
    served
}

#[cfg(unix)]
async fn wait_for_signal() {
    use tokio::signal::unix::{SignalKind, signal};

    // Registration may fail in restricted environments (containers, tests)
    let sigterm_result = signal(SignalKind::terminate());
    let sigint_result = signal(SignalKind::interrupt());

    match (sigterm_result, sigint_result) {
        (Ok(mut sigterm), Ok(mut sigint)) => {
            tokio::select! {
                _ = sigterm.recv() => {
                    tracing::info!("Received SIGTERM signal");
                }
                _ = sigint.recv() => {
                    tracing::info!("Received SIGINT signal (Ctrl+C)");
                }
            }
        }
        (Err(e), _) => {
            tracing::warn!(error = %e, "Could not register SIGTERM handler, waiting for SIGINT only");
            if let Ok(mut sigint) = signal(SignalKind::interrupt()) {
                sigint.recv().await;
                tracing::info!("Received SIGINT signal (Ctrl+C)");
            } else {
                tracing::error!("Could not register any signal handlers, using ctrl_c fallback");
                tokio::signal::ctrl_c().await.ok();
            }
        }
        (_, Err(e)) => {
            tracing::warn!(error = %e, "Could not register SIGINT handler, waiting for SIGTERM only");
            if let Ok(mut sigterm) = signal(SignalKind::terminate()) {
                sigterm.recv().await;
                tracing::info!("Received SIGTERM signal");
            } else {
                tracing::error!("Could not register any signal handlers, using ctrl_c fallback");
                tokio::signal::ctrl_c().await.ok();
            }
        }
    }
}

#[cfg(not(unix))]
async fn wait_for_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => {
            tracing::info!("Received Ctrl+C signal");
        }
        Err(e) => {
            tracing::error!(error = %e, "Failed to listen for Ctrl+C signal");
        }
    }
}
