// Core modules
pub mod config;
pub mod confirmation;
pub mod error;
pub mod feed;
pub mod models;
pub mod risk;
pub mod signal;

// Re-export commonly used types
pub use config::EngineConfig;
pub use error::EngineError;
pub use models::*;
pub use signal::{Outcome, Rejection, RejectionReason, Signal, SignalEngine};

// Error handling
pub type Result<T> = std::result::Result<T, Box<dyn std::error::Error + Send + Sync>>;

/// `goldsignal=info` unless `RUST_LOG` says otherwise
pub fn setup_logging() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("goldsignal=info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}
