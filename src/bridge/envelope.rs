//! Bus envelopes.

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum EnvelopeError {
    #[error("malformed envelope: {0}")]
    Json(#[from] serde_json::Error),
    #[error("envelope has no {0} field")]
    MissingField(&'static str),
}

/// Optional metadata carried alongside the text.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Misc {
    /// `0` means nobody should answer this message.
    #[serde(default)]
    pub answer: i64,
    #[serde(default)]
    pub bot_nick: String,
    /// Command prefix in effect for the sender.
    #[serde(default)]
    pub csign: String,
    /// How many hops this envelope has already been forwarded.
    #[serde(default)]
    pub fwd_cnt: i64,
    #[serde(default)]
    pub good_morning: i64,
    #[serde(default)]
    pub msg_format: i64,
    /// Nick the reply should address.
    #[serde(default)]
    pub username: String,
}

/// One message unit on the bus, in either direction.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BusEnvelope {
    #[serde(default)]
    pub from: String,
    #[serde(default)]
    pub chatid: String,
    #[serde(default)]
    pub userid: String,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub plugin: String,
    /// `public` or `private`.
    #[serde(default)]
    pub mode: String,
    #[serde(default, alias = "Misc")]
    pub misc: Misc,
}

impl BusEnvelope {
    /// Parse and check the required string fields.
    pub fn parse(line: &str) -> Result<Self, EnvelopeError> {
        let envelope: BusEnvelope = serde_json::from_str(line)?;
        envelope.validate()?;
        Ok(envelope)
    }

    pub fn validate(&self) -> Result<(), EnvelopeError> {
        let required = [
            ("from", &self.from),
            ("chatid", &self.chatid),
            ("userid", &self.userid),
            ("message", &self.message),
            ("plugin", &self.plugin),
            ("mode", &self.mode),
        ];
        match required.iter().find(|(_, value)| value.is_empty()) {
            Some((name, _)) => Err(EnvelopeError::MissingField(*name)),
            None => Ok(()),
        }
    }
}
