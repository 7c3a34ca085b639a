//! Default value functions for configuration.
//!
//! Separated into its own module for clarity and reuse.

// =============================================================================
// Top-level Defaults
// =============================================================================

pub fn default_forwards_max() -> u32 {
    5
}

pub fn default_log_level() -> String {
    "info".to_string()
}

// =============================================================================
// Bus Defaults
// =============================================================================

pub fn default_bus_server() -> String {
    "localhost".to_string()
}

pub fn default_bus_port() -> u16 {
    6379
}

// =============================================================================
// IRC Defaults
// =============================================================================

pub fn default_irc_server() -> String {
    "localhost".to_string()
}

pub fn default_irc_port() -> u16 {
    6667
}

// =============================================================================
// Rate Limit Defaults
// =============================================================================

pub fn default_rate_type() -> String {
    "none".to_string()
}

pub fn default_simple_delay() -> u64 {
    500
}

pub fn default_bucket_size() -> u32 {
    5
}

pub fn default_bucket_limit() -> u32 {
    1
}

pub fn default_bucket_expiration() -> u64 {
    2
}
