//! RFC 1459 case mapping.
//!
//! Nicknames and channel names compare case-insensitively with `[]\~`
//! folding onto `{}|^`. Every key the bridge stores by nick or channel goes
//! through [`irc_to_lower`] first.

/// Fold one character.
#[inline]
pub const fn irc_lower_char(c: char) -> char {
    match c {
        'A'..='Z' => (c as u8 + 32) as char,
        '[' => '{',
        ']' => '}',
        '\\' => '|',
        '~' => '^',
        _ => c,
    }
}

/// Fold a whole string.
pub fn irc_to_lower(s: &str) -> String {
    s.chars().map(irc_lower_char).collect()
}

/// Case-insensitive equality under RFC 1459 folding.
pub fn irc_eq(a: &str, b: &str) -> bool {
    a.len() == b.len()
        && a
            .chars()
            .zip(b.chars())
            .all(|(x, y)| irc_lower_char(x) == irc_lower_char(y))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_brackets_fold() {
        assert_eq!(irc_to_lower("Nick[Away]"), "nick{away}");
        assert_eq!(irc_to_lower("a\\b~c"), "a|b^c");
    }

    #[test]
    fn test_non_ascii_untouched() {
        assert_eq!(irc_to_lower("ÄBC"), "Äbc");
    }

    #[test]
    fn test_irc_eq() {
        assert!(irc_eq("#Rust", "#rust"));
        assert!(irc_eq("foo[1]", "FOO{1}"));
        assert!(!irc_eq("foo", "foobar"));
        assert!(!irc_eq("foo", "bar"));
    }
}
