//! Retry policy and configuration.
//!
//! [`RetryPolicy`] wraps one upstream call and retries it with exponential
//! backoff while the error is classified as transient capacity exhaustion.
//! [`ShotlistConfig`] loads the tunables from layered TOML files.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod config;
mod policy;

pub use config::{LoggingConfig, ModelConfig, QueueConfig, RetryConfig, ShotlistConfig};
pub use policy::RetryPolicy;
