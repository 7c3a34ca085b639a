//! Inbound protocol events.

use slirc_wire::{Message, Prefix};

/// Closed set of event tags the lifecycle dispatches on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventKind {
    Numeric(u16),
    Join,
    Part,
    Kick,
    Quit,
    Nick,
    Mode,
    Privmsg,
    Notice,
    Invite,
    Topic,
    Ping,
    Cap,
    Authenticate,
    Error,
    Other(String),
}

impl EventKind {
    fn from_command(command: &str) -> Self {
        if let Ok(code) = command.parse::<u16>() {
            if command.len() == 3 {
                return EventKind::Numeric(code);
            }
        }
        match command {
            "JOIN" => EventKind::Join,
            "PART" => EventKind::Part,
            "KICK" => EventKind::Kick,
            "QUIT" => EventKind::Quit,
            "NICK" => EventKind::Nick,
            "MODE" => EventKind::Mode,
            "PRIVMSG" => EventKind::Privmsg,
            "NOTICE" => EventKind::Notice,
            "INVITE" => EventKind::Invite,
            "TOPIC" => EventKind::Topic,
            "PING" => EventKind::Ping,
            "CAP" => EventKind::Cap,
            "AUTHENTICATE" => EventKind::Authenticate,
            "ERROR" => EventKind::Error,
            other => EventKind::Other(other.to_owned()),
        }
    }
}

/// Who sent an event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Source {
    pub nick: String,
    /// Username as the server sees it; empty for server sources.
    pub user: String,
    pub host: String,
}

impl From<&Prefix> for Source {
    fn from(prefix: &Prefix) -> Self {
        match prefix {
            Prefix::ServerName(name) => Source {
                nick: name.clone(),
                user: String::new(),
                host: String::new(),
            },
            Prefix::Nickname(nick, user, host) => Source {
                nick: nick.clone(),
                user: user.clone(),
                host: host.clone(),
            },
        }
    }
}

/// A parsed inbound line.
#[derive(Debug, Clone)]
pub struct Event {
    pub kind: EventKind,
    pub source: Option<Source>,
    pub args: Vec<String>,
    /// The line as received, for logging.
    pub raw: String,
}

impl Event {
    pub fn arg(&self, idx: usize) -> Option<&str> {
        self.args.get(idx).map(String::as_str)
    }

    /// Sender nickname, or `""` when the event has no source.
    pub fn nick(&self) -> &str {
        self.source.as_ref().map_or("", |s| s.nick.as_str())
    }

    /// Sender username, or `""`.
    pub fn user(&self) -> &str {
        self.source.as_ref().map_or("", |s| s.user.as_str())
    }

    /// The final argument, conventionally the trailing text.
    pub fn trailing(&self) -> &str {
        self.args.last().map_or("", String::as_str)
    }
}

impl From<Message> for Event {
    fn from(msg: Message) -> Self {
        let raw = msg.to_string();
        Event {
            kind: EventKind::from_command(&msg.command),
            source: msg.prefix.as_ref().map(Source::from),
            args: msg.params,
            raw,
        }
    }
}
