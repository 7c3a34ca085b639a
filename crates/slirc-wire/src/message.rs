//! Owned IRC messages: parsing, serialization and constructors.
//!
//! IRCv3 tags are accepted on input and discarded; the bridge has no use for
//! them and never sends any.

use std::fmt;
use std::str::FromStr;

use nom::{
    bytes::complete::{take_until, take_while1},
    character::complete::{char, space0},
    combinator::opt,
    error::ErrorKind,
    sequence::preceded,
    IResult,
};

use crate::error::{MessageParseError, ProtocolError};
use crate::prefix::Prefix;

/// RFC 2812 parameter ceiling.
const MAX_PARAMS: usize = 15;

/// A single IRC line.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct Message {
    /// Source of the message, if the server supplied one.
    pub prefix: Option<Prefix>,
    /// Command name (upper-cased) or three-digit numeric.
    pub command: String,
    /// Parameters, trailing included as the last element.
    pub params: Vec<String>,
}

fn parse_tags(input: &str) -> IResult<&str, &str> {
    preceded(char('@'), take_until(" "))(input)
}

fn parse_prefix(input: &str) -> IResult<&str, &str> {
    preceded(char(':'), take_while1(|c| c != ' '))(input)
}

fn parse_command(input: &str) -> IResult<&str, &str> {
    let (rest, cmd) = take_while1(|c: char| c.is_ascii_alphanumeric())(input)?;
    let letters = cmd.chars().all(|c| c.is_ascii_alphabetic());
    let numeric = cmd.len() == 3 && cmd.chars().all(|c| c.is_ascii_digit());
    if letters || numeric {
        Ok((rest, cmd))
    } else {
        Err(nom::Err::Error(nom::error::Error::new(
            input,
            ErrorKind::AlphaNumeric,
        )))
    }
}

fn parse_params(mut rest: &str) -> Vec<String> {
    let mut params = Vec::new();

    while rest.starts_with(' ') && params.len() < MAX_PARAMS {
        rest = rest.trim_start_matches(' ');
        if rest.is_empty() {
            break;
        }
        if let Some(trailing) = rest.strip_prefix(':') {
            params.push(trailing.to_owned());
            break;
        }
        let end = rest.find(' ').unwrap_or(rest.len());
        params.push(rest[..end].to_owned());
        rest = &rest[end..];
    }

    params
}

impl FromStr for Message {
    type Err = ProtocolError;

    fn from_str(s: &str) -> Result<Message, Self::Err> {
        let line = s.trim_end_matches(['\r', '\n']);
        let invalid = |cause| ProtocolError::InvalidMessage {
            string: s.to_owned(),
            cause,
        };

        if line.trim().is_empty() {
            return Err(invalid(MessageParseError::EmptyMessage));
        }

        let position = |rest: &str| line.len() - rest.len();
        let (input, _tags) = opt(parse_tags)(line).map_err(|_| {
            invalid(MessageParseError::ParseContext {
                position: 0,
                context: "unterminated tags".into(),
            })
        })?;
        let (input, _) = space0::<_, nom::error::Error<&str>>(input).unwrap_or((input, ""));
        let (input, prefix) = opt(parse_prefix)(input).map_err(|_| {
            invalid(MessageParseError::ParseContext {
                position: position(input),
                context: "bad prefix".into(),
            })
        })?;
        let (input, _) = space0::<_, nom::error::Error<&str>>(input).unwrap_or((input, ""));
        let (rest, command) = parse_command(input)
            .map_err(|_| invalid(MessageParseError::InvalidCommand(input.to_owned())))?;

        let prefix = prefix.map(Prefix::parse).transpose().map_err(invalid)?;

        Ok(Message {
            prefix,
            command: command.to_ascii_uppercase(),
            params: parse_params(rest),
        })
    }
}

impl fmt::Display for Message {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(prefix) = &self.prefix {
            write!(f, ":{prefix} ")?;
        }
        f.write_str(&self.command)?;

        if let Some((last, init)) = self.params.split_last() {
            for param in init {
                write!(f, " {param}")?;
            }
            if last.is_empty() || last.contains(' ') || last.starts_with(':') {
                write!(f, " :{last}")?;
            } else {
                write!(f, " {last}")?;
            }
        }
        Ok(())
    }
}

impl Message {
    /// Build a message with no prefix.
    pub fn new<I, S>(command: &str, params: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Message {
            prefix: None,
            command: command.to_ascii_uppercase(),
            params: params.into_iter().map(Into::into).collect(),
        }
    }

    /// Nickname of the sender, when the prefix is a user mask.
    pub fn source_nickname(&self) -> Option<&str> {
        self.prefix.as_ref().and_then(Prefix::nick)
    }

    /// Parameter at `idx`, if present.
    pub fn arg(&self, idx: usize) -> Option<&str> {
        self.params.get(idx).map(String::as_str)
    }

    /// Numeric code for three-digit replies.
    pub fn numeric(&self) -> Option<u16> {
        if self.command.len() == 3 {
            self.command.parse().ok()
        } else {
            None
        }
    }

    /// `PRIVMSG target :text`
    pub fn privmsg(target: impl Into<String>, text: impl Into<String>) -> Self {
        Message::new("PRIVMSG", [target.into(), text.into()])
    }

    /// `PRIVMSG target :\x01ACTION text\x01`
    pub fn action(target: impl Into<String>, text: impl AsRef<str>) -> Self {
        let body = format!("\u{1}ACTION {}\u{1}", text.as_ref());
        Message::new("PRIVMSG", [target.into(), body])
    }

    /// `JOIN channel`
    pub fn join(channel: impl Into<String>) -> Self {
        Message::new("JOIN", [channel.into()])
    }

    /// `PART channel`
    pub fn part(channel: impl Into<String>) -> Self {
        Message::new("PART", [channel.into()])
    }

    /// `NICK nick`
    pub fn nick(nick: impl Into<String>) -> Self {
        Message::new("NICK", [nick.into()])
    }

    /// `USER user 0 * :realname`
    pub fn user(user: impl Into<String>, realname: impl Into<String>) -> Self {
        Message::new(
            "USER",
            [user.into(), "0".into(), "*".into(), realname.into()],
        )
    }

    /// `MODE target token`
    pub fn mode(target: impl Into<String>, token: impl Into<String>) -> Self {
        Message::new("MODE", [target.into(), token.into()])
    }

    /// `WHOIS nick`
    pub fn whois(nick: impl Into<String>) -> Self {
        Message::new("WHOIS", [nick.into()])
    }

    /// `PONG token`
    pub fn pong(token: impl Into<String>) -> Self {
        Message::new("PONG", [token.into()])
    }

    /// `CAP subcommand [arg]`
    pub fn cap(subcommand: &str, arg: Option<&str>) -> Self {
        let mut params = vec![subcommand.to_owned()];
        params.extend(arg.map(str::to_owned));
        Message::new("CAP", params)
    }

    /// `AUTHENTICATE data`
    pub fn authenticate(data: impl Into<String>) -> Self {
        Message::new("AUTHENTICATE", [data.into()])
    }

    /// `QUIT :reason`
    pub fn quit(reason: impl Into<String>) -> Self {
        Message::new("QUIT", [reason.into()])
    }
}
