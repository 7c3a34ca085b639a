//! Unified error handling for slirc-bridge.
//!
//! Each concern owns a `thiserror` enum; [`BridgeError`] is the root that
//! startup code funnels them into.

use thiserror::Error;

use crate::config::{ConfigError, ValidationError};
use crate::settings::SettingsError;

/// Startup and wiring failures.
#[derive(Debug, Error)]
pub enum BridgeError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("invalid configuration: {}", join_errors(.0))]
    Invalid(Vec<ValidationError>),

    #[error(transparent)]
    Settings(#[from] SettingsError),
}

impl From<Vec<ValidationError>> for BridgeError {
    fn from(errors: Vec<ValidationError>) -> Self {
        Self::Invalid(errors)
    }
}

fn join_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_lists_every_problem() {
        let err = BridgeError::from(vec![
            ValidationError::MissingNick,
            ValidationError::NoChannels,
        ]);
        assert_eq!(
            err.to_string(),
            "invalid configuration: irc.nick is required; irc.channels must list at least one channel"
        );
    }
}
