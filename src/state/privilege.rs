//! Per-channel user privileges as observed on the wire.
//!
//! The cache is rebuilt from NAMES, WHOIS, JOIN and MODE traffic, all of which
//! can arrive partially and out of order. A user entry exists only while the
//! user is believed present; an unknown user simply has no flags.

use std::collections::{BTreeSet, HashMap};
use std::fmt;

use parking_lot::Mutex;
use slirc_wire::irc_to_lower;

/// Operator status.
pub const OP: char = 'o';
/// Voice status.
pub const VOICE: char = 'v';

/// Mode letters held by one user on one channel.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ModeFlags(BTreeSet<char>);

impl ModeFlags {
    pub fn contains(&self, flag: char) -> bool {
        self.0.contains(&flag)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Fold a `+abc`/`-abc` token (possibly mixed, e.g. `+o-v`) into the set.
    /// Letters before any sign are treated as additions.
    pub fn apply(&mut self, token: &str) {
        let mut adding = true;
        for ch in token.chars() {
            match ch {
                '+' => adding = true,
                '-' => adding = false,
                c if adding => {
                    self.0.insert(c);
                }
                c => {
                    self.0.remove(&c);
                }
            }
        }
    }
}

impl fmt::Display for ModeFlags {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.iter().try_for_each(|c| write!(f, "{c}"))
    }
}

type Members = HashMap<String, ModeFlags>;

/// Mode flags keyed by (channel, nickname), both RFC 1459 case-folded.
///
/// Only configured channels are tracked; updates for any other channel are
/// ignored. All operations take one short lock and never touch I/O.
#[derive(Debug)]
pub struct PrivilegeCache {
    channels: Vec<String>,
    inner: Mutex<HashMap<String, Members>>,
}

impl PrivilegeCache {
    pub fn new<I, S>(channels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            channels: channels
                .into_iter()
                .map(|c| irc_to_lower(c.as_ref()))
                .collect(),
            inner: Mutex::new(HashMap::new()),
        }
    }

    fn tracks(&self, channel_key: &str) -> bool {
        self.channels.iter().any(|c| c == channel_key)
    }

    /// Flags for `user` on `channel`; empty when unknown.
    pub fn get(&self, channel: &str, user: &str) -> ModeFlags {
        let inner = self.inner.lock();
        inner
            .get(&irc_to_lower(channel))
            .and_then(|members| members.get(&irc_to_lower(user)))
            .cloned()
            .unwrap_or_default()
    }

    /// Record `user` as present on `channel` and fold `token` into their flags.
    /// An empty token only marks presence.
    pub fn set(&self, channel: &str, user: &str, token: &str) {
        let channel_key = irc_to_lower(channel);
        if !self.tracks(&channel_key) {
            return;
        }
        let mut inner = self.inner.lock();
        inner
            .entry(channel_key)
            .or_default()
            .entry(irc_to_lower(user))
            .or_default()
            .apply(token);
    }

    /// Forget `user` on `channel`. Drops the channel once it has no members.
    pub fn delete_user(&self, channel: &str, user: &str) {
        let channel_key = irc_to_lower(channel);
        let mut inner = self.inner.lock();
        if let Some(members) = inner.get_mut(&channel_key) {
            members.remove(&irc_to_lower(user));
            if members.is_empty() {
                inner.remove(&channel_key);
            }
        }
    }

    /// Forget everyone on `channel`.
    pub fn delete_channel(&self, channel: &str) {
        self.inner.lock().remove(&irc_to_lower(channel));
    }

    /// Forget `user` on every configured channel.
    pub fn purge_user(&self, user: &str) {
        for channel in &self.channels {
            self.delete_user(channel, user);
        }
    }

    /// Drop everything; used when a new connection starts.
    pub fn clear(&self) {
        self.inner.lock().clear();
    }

    pub fn is_here(&self, channel: &str, user: &str) -> bool {
        let inner = self.inner.lock();
        inner
            .get(&irc_to_lower(channel))
            .is_some_and(|members| members.contains_key(&irc_to_lower(user)))
    }

    pub fn is_oped(&self, channel: &str, user: &str) -> bool {
        self.get(channel, user).contains(OP)
    }

    pub fn is_voiced(&self, channel: &str, user: &str) -> bool {
        self.get(channel, user).contains(VOICE)
    }

    /// Holds `o` or `v`: the unrestricted-lane test.
    pub fn is_privileged(&self, channel: &str, user: &str) -> bool {
        let flags = self.get(channel, user);
        flags.contains(OP) || flags.contains(VOICE)
    }

    /// Number of known members on `channel`.
    pub fn member_count(&self, channel: &str) -> usize {
        self.inner
            .lock()
            .get(&irc_to_lower(channel))
            .map_or(0, HashMap::len)
    }
}
