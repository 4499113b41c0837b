//! Ambient infrastructure shared by the aggregation engine.
//!
//! Errors, configuration and logging setup live here; the metric types and
//! aggregators themselves are in [`crate::metrics`].

pub mod config;
pub mod error;
pub mod logging;

// Re-export commonly used types
pub use config::{Config, ConfigBuilder, LogLevel, LoggingConfig};
pub use error::{MetricsError, Result};
pub use logging::init_logging;
