//! # grantwatch-core
//!
//! Configuration types shared across all Grantwatch crates.
//!
//! The decision pipeline only ever sees a [`WatchConfig`]; the remaining
//! sections are consumed by the webhook server.

// Configuration types shared across all Grantwatch crates
pub mod config;

// Re-export commonly used config types for convenience
pub use config::{
    ConfigError,
    // Main config
    GrantwatchConfig,
    GrantsConfig,
    LoggingConfig,
    ServerConfig,
    WatchConfig,
};
