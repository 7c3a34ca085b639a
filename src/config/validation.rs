//! Configuration validation.
//!
//! Validates configuration at startup to catch common errors early.

use super::Config;
use thiserror::Error;

/// Validation errors for configuration.
#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("command_prefix is required")]
    MissingCommandPrefix,
    #[error("data_dir is required")]
    MissingDataDir,
    #[error("bus.channel is required")]
    MissingBusChannel,
    #[error("bus.my_channel is required")]
    MissingBusMyChannel,
    #[error("irc.nick is required")]
    MissingNick,
    #[error("irc.channels must list at least one channel")]
    NoChannels,
    #[error("irc.channels entry '{0}' is not a channel name")]
    InvalidChannel(String),
    #[error("irc.sasl is enabled but irc.password is empty")]
    SaslWithoutPassword,
    #[error("log.level '{0}' is not a valid filter")]
    InvalidLogLevel(String),
}

/// Validate a configuration, returning all errors found.
///
/// Expects [`Config::normalize`] to have run first.
pub fn validate(config: &Config) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.command_prefix.is_empty() {
        errors.push(ValidationError::MissingCommandPrefix);
    }
    if config.data_dir.as_os_str().is_empty() {
        errors.push(ValidationError::MissingDataDir);
    }

    // Bus
    if config.bus.channel.is_empty() {
        errors.push(ValidationError::MissingBusChannel);
    }
    if config.bus.my_channel.is_empty() {
        errors.push(ValidationError::MissingBusMyChannel);
    }

    // IRC
    if config.irc.nick.is_empty() {
        errors.push(ValidationError::MissingNick);
    }
    if config.irc.channels.is_empty() {
        errors.push(ValidationError::NoChannels);
    }
    for channel in &config.irc.channels {
        if !channel.starts_with(['#', '&', '+', '!']) || channel.contains([' ', ',', '\x07']) {
            errors.push(ValidationError::InvalidChannel(channel.clone()));
        }
    }
    if config.irc.sasl && config.irc.credential().is_none() {
        errors.push(ValidationError::SaslWithoutPassword);
    }

    if tracing_subscriber::EnvFilter::try_new(&config.log.level).is_err() {
        errors.push(ValidationError::InvalidLogLevel(config.log.level.clone()));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
