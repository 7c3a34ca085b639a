//! Per-connection state: lifecycle status, nickname drift and the mode
//! letters the server announced in 004.

use std::collections::HashSet;
use std::fmt;

use parking_lot::Mutex;
use slirc_wire::{irc_eq, irc_to_lower};

/// Where the current connection is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    Disconnected,
    Connecting,
    Registered,
    Joining,
    /// Every configured channel has been joined.
    Steady,
    ShuttingDown,
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Status::Disconnected => "disconnected",
            Status::Connecting => "connecting",
            Status::Registered => "registered",
            Status::Joining => "joining",
            Status::Steady => "steady",
            Status::ShuttingDown => "shutting-down",
        };
        f.write_str(s)
    }
}

/// User and channel mode letters from RPL_MYINFO (004).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AnnouncedModes {
    pub user: String,
    pub channel: String,
}

#[derive(Debug)]
struct Inner {
    status: Status,
    nick: String,
    nick_unavailable: bool,
    sasl_pending: bool,
    joined: HashSet<String>,
}

/// Shared connection state, reset at the start of every attempt.
///
/// Announced modes sit behind their own lock so the 004 handler can record
/// them atomically without touching the rest.
#[derive(Debug)]
pub struct ConnectionState {
    inner: Mutex<Inner>,
    modes: Mutex<AnnouncedModes>,
}

impl ConnectionState {
    pub fn new(nick: &str) -> Self {
        Self {
            inner: Mutex::new(Inner {
                status: Status::Disconnected,
                nick: nick.to_owned(),
                nick_unavailable: false,
                sasl_pending: false,
                joined: HashSet::new(),
            }),
            modes: Mutex::new(AnnouncedModes::default()),
        }
    }

    /// Forget everything from the previous connection.
    pub fn reset(&self, nick: &str) {
        {
            let mut inner = self.inner.lock();
            inner.status = Status::Disconnected;
            inner.nick = nick.to_owned();
            inner.nick_unavailable = false;
            inner.sasl_pending = false;
            inner.joined.clear();
        }
        *self.modes.lock() = AnnouncedModes::default();
    }

    pub fn status(&self) -> Status {
        self.inner.lock().status
    }

    /// Move to `status` unless shutdown has already begun.
    pub fn set_status(&self, status: Status) {
        let mut inner = self.inner.lock();
        if inner.status != Status::ShuttingDown {
            inner.status = status;
        }
    }

    /// Enter the terminal state.
    pub fn shut_down(&self) {
        self.inner.lock().status = Status::ShuttingDown;
    }

    /// Nickname the server currently knows us by.
    pub fn nick(&self) -> String {
        self.inner.lock().nick.clone()
    }

    pub fn set_nick(&self, nick: &str) {
        self.inner.lock().nick = nick.to_owned();
    }

    pub fn is_me(&self, nick: &str) -> bool {
        irc_eq(&self.inner.lock().nick, nick)
    }

    pub fn nick_unavailable(&self) -> bool {
        self.inner.lock().nick_unavailable
    }

    pub fn set_nick_unavailable(&self, unavailable: bool) {
        self.inner.lock().nick_unavailable = unavailable;
    }

    pub fn sasl_pending(&self) -> bool {
        self.inner.lock().sasl_pending
    }

    pub fn set_sasl_pending(&self, pending: bool) {
        self.inner.lock().sasl_pending = pending;
    }

    pub fn record_modes(&self, user: &str, channel: &str) {
        let mut modes = self.modes.lock();
        modes.user = user.to_owned();
        modes.channel = channel.to_owned();
    }

    pub fn announced_modes(&self) -> AnnouncedModes {
        self.modes.lock().clone()
    }

    /// Whether the server offers user mode `letter`.
    pub fn has_user_mode(&self, letter: char) -> bool {
        self.modes.lock().user.contains(letter)
    }

    /// Note our own JOIN.
    pub fn mark_joined(&self, channel: &str) {
        self.inner.lock().joined.insert(irc_to_lower(channel));
    }

    /// Note our own PART or KICK.
    pub fn mark_left(&self, channel: &str) {
        self.inner.lock().joined.remove(&irc_to_lower(channel));
    }

    pub fn is_joined(&self, channel: &str) -> bool {
        self.inner.lock().joined.contains(&irc_to_lower(channel))
    }
}
