//! Parsing the replies that tell us who holds which channel status.

use crate::state::{OP, VOICE};

/// Status prefixes a server may put in front of a member or channel name.
const STATUS_PREFIXES: &str = "~&@%+";
/// First characters of a channel name.
const CHANNEL_SIGILS: &str = "#&!+";

/// Split a NAMES entry like `@+alice` into its mode token (`+ov`) and the
/// bare nick. Prefixes other than `@` and `+` are dropped.
pub fn split_status_prefix(entry: &str) -> (String, &str) {
    let name = entry.trim_start_matches(|c: char| STATUS_PREFIXES.contains(c));
    (status_token(&entry[..entry.len() - name.len()]), name)
}

/// Split a WHOIS channel entry like `@#rust` into its mode token and the
/// channel name.
///
/// `&` and `+` are both status prefixes and channel sigils, so a prefix is
/// only taken off while what remains still starts with a sigil: `&local`
/// stays whole, `@&local` loses the `@`.
pub fn split_channel_status(entry: &str) -> (String, &str) {
    let mut channel = entry;
    while let Some(rest) = channel.strip_prefix(|c: char| STATUS_PREFIXES.contains(c)) {
        if !rest.starts_with(|c: char| CHANNEL_SIGILS.contains(c)) {
            break;
        }
        channel = rest;
    }
    (status_token(&entry[..entry.len() - channel.len()]), channel)
}

fn status_token(prefixes: &str) -> String {
    let mut token = String::new();
    if prefixes.contains('@') {
        token.push(OP);
    }
    if prefixes.contains('+') {
        token.push(VOICE);
    }
    if !token.is_empty() {
        token.insert(0, '+');
    }
    token
}

/// One user-affecting change from a channel MODE line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModeChange {
    pub nick: String,
    /// `+o`, `-v` and so on.
    pub token: String,
}

/// Channel modes that always take a parameter.
const ALWAYS_PARAM: &str = "beIkohvqa";
/// Channel modes that take a parameter only when set.
const SET_PARAM: &str = "lfjL";
/// Modes that address a member.
const MEMBER_MODES: &str = "ohvqa";

/// Pair the letters of `modes` with their parameters and keep the changes
/// that target a member (`+o alice`, `-v bob`).
pub fn member_changes(modes: &str, params: &[String]) -> Vec<ModeChange> {
    let mut changes = Vec::new();
    let mut params = params.iter();
    let mut adding = true;

    for letter in modes.chars() {
        match letter {
            '+' => adding = true,
            '-' => adding = false,
            c if ALWAYS_PARAM.contains(c) || (adding && SET_PARAM.contains(c)) => {
                let Some(param) = params.next() else {
                    break;
                };
                if MEMBER_MODES.contains(c) {
                    changes.push(ModeChange {
                        nick: param.clone(),
                        token: format!("{}{c}", if adding { '+' } else { '-' }),
                    });
                }
            }
            _ => {}
        }
    }
    changes
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_prefixes() {
        assert_eq!(split_status_prefix("@alice"), ("+o".to_owned(), "alice"));
        assert_eq!(split_status_prefix("+bob"), ("+v".to_owned(), "bob"));
        assert_eq!(split_status_prefix("@+carol"), ("+ov".to_owned(), "carol"));
        assert_eq!(split_status_prefix("%dave"), (String::new(), "dave"));
        assert_eq!(split_status_prefix("erin"), (String::new(), "erin"));
    }

    #[test]
    fn test_channel_status_keeps_sigils() {
        assert_eq!(split_channel_status("@#rust"), ("+o".to_owned(), "#rust"));
        assert_eq!(split_channel_status("#rust"), (String::new(), "#rust"));
        assert_eq!(split_channel_status("&local"), (String::new(), "&local"));
        assert_eq!(split_channel_status("@&local"), ("+o".to_owned(), "&local"));
        assert_eq!(split_channel_status("+modeless"), (String::new(), "+modeless"));
        assert_eq!(split_channel_status("@+#rust"), ("+ov".to_owned(), "#rust"));
        assert_eq!(split_channel_status("%#ops"), (String::new(), "#ops"));
    }

    #[test]
    fn test_member_changes_pairing() {
        let params: Vec<String> = ["key", "alice", "*!*@spam", "bob"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        let changes = member_changes("+kob-v", &params);
        assert_eq!(
            changes,
            vec![
                ModeChange {
                    nick: "alice".into(),
                    token: "+o".into()
                },
                ModeChange {
                    nick: "bob".into(),
                    token: "-v".into()
                },
            ]
        );
    }

    #[test]
    fn test_limit_only_takes_param_when_set() {
        let params = vec!["alice".to_string()];
        assert_eq!(member_changes("-l+o", &params)[0].token, "+o");
        assert!(member_changes("+l", &params).is_empty());
    }

    #[test]
    fn test_missing_params_stop_pairing() {
        assert!(member_changes("+oo", &[]).is_empty());
    }
}
