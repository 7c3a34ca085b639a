//! Configuration loading and management.
//!
//! This module is split into logical submodules:
//! - [`types`]: Config struct definitions and file loading
//! - [`defaults`]: serde default functions
//! - [`validation`]: startup checks that report every problem at once

mod defaults;
mod types;
pub mod validation;

pub use types::{
    BusConfig, Config, ConfigError, IrcConfig, LogConfig, LogFormat, RateLimitConfig,
    TokenBucketConfig, MAX_CONFIG_SIZE,
};
pub use validation::{validate, ValidationError};
