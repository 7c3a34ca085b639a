//! Message source prefixes.

use std::fmt;

use crate::error::MessageParseError;

/// Where a message came from: a server, or a `nick!user@host` mask.
#[derive(Clone, Eq, PartialEq, Debug, Hash)]
pub enum Prefix {
    /// A server name such as `irc.libera.chat`.
    ServerName(String),
    /// `(nick, user, host)`; user and host may be empty.
    Nickname(String, String, String),
}

impl Prefix {
    /// Parse a prefix without the leading `:`.
    ///
    /// A bare token containing a dot and no `!`/`@` is taken to be a server.
    pub fn parse(s: &str) -> Result<Self, MessageParseError> {
        if s.is_empty() || s.contains(' ') {
            return Err(MessageParseError::InvalidPrefix(s.to_owned()));
        }

        let (front, host) = match s.split_once('@') {
            Some((front, host)) => (front, host),
            None => (s, ""),
        };
        let (nick, user) = match front.split_once('!') {
            Some((nick, user)) => (nick, user),
            None => (front, ""),
        };

        if nick.is_empty() {
            return Err(MessageParseError::InvalidPrefix(s.to_owned()));
        }

        if user.is_empty() && host.is_empty() && nick.contains('.') {
            Ok(Prefix::ServerName(nick.to_owned()))
        } else {
            Ok(Prefix::Nickname(
                nick.to_owned(),
                user.to_owned(),
                host.to_owned(),
            ))
        }
    }

    /// Nickname, for user prefixes.
    pub fn nick(&self) -> Option<&str> {
        match self {
            Prefix::Nickname(nick, _, _) => Some(nick),
            Prefix::ServerName(_) => None,
        }
    }

    /// Username (ident), for user prefixes that carry one.
    pub fn user(&self) -> Option<&str> {
        match self {
            Prefix::Nickname(_, user, _) if !user.is_empty() => Some(user),
            _ => None,
        }
    }

    /// Hostname, for user prefixes that carry one.
    pub fn host(&self) -> Option<&str> {
        match self {
            Prefix::Nickname(_, _, host) if !host.is_empty() => Some(host),
            _ => None,
        }
    }
}

impl fmt::Display for Prefix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Prefix::ServerName(name) => f.write_str(name),
            Prefix::Nickname(nick, user, host) => {
                f.write_str(nick)?;
                if !user.is_empty() {
                    write!(f, "!{user}")?;
                }
                if !host.is_empty() {
                    write!(f, "@{host}")?;
                }
                Ok(())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_full_mask() {
        let p = Prefix::parse("alice!~al@host.example").unwrap();
        assert_eq!(p.nick(), Some("alice"));
        assert_eq!(p.user(), Some("~al"));
        assert_eq!(p.host(), Some("host.example"));
        assert_eq!(p.to_string(), "alice!~al@host.example");
    }

    #[test]
    fn test_server_name() {
        let p = Prefix::parse("irc.libera.chat").unwrap();
        assert_eq!(p, Prefix::ServerName("irc.libera.chat".into()));
        assert_eq!(p.nick(), None);
    }

    #[test]
    fn test_bare_nick() {
        let p = Prefix::parse("NickServ").unwrap();
        assert_eq!(p.nick(), Some("NickServ"));
        assert_eq!(p.user(), None);
    }

    #[test]
    fn test_rejects_empty_nick() {
        assert!(Prefix::parse("!user@host").is_err());
        assert!(Prefix::parse("").is_err());
    }
}
