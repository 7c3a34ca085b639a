//! What the rate governor sends.

/// How the text is rendered on IRC.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Display {
    Message,
    /// CTCP ACTION, i.e. `/me`.
    Action,
}

/// One line bound for one destination. Consumed exactly once by a lane.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutboundEnvelope {
    pub destination: String,
    pub text: String,
    pub display: Display,
}

impl OutboundEnvelope {
    /// Text starting with `/me ` becomes an action with the marker stripped.
    pub fn new(destination: impl Into<String>, text: impl Into<String>) -> Self {
        let text = text.into();
        match text.strip_prefix("/me ") {
            Some(rest) => Self {
                destination: destination.into(),
                text: rest.to_owned(),
                display: Display::Action,
            },
            None => Self {
                destination: destination.into(),
                text,
                display: Display::Message,
            },
        }
    }
}
