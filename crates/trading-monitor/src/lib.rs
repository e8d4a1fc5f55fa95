//! Logging set-up and cycle reporting.

mod logging;
mod report;

pub use logging::{setup_logging, LogFormat, LoggingConfig, LoggingError, LoggingOverrides};
pub use report::{log_outcome, log_risk_summary, OutcomeTally};
