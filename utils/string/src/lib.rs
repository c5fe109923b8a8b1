//! Small string helpers shared by the `ets` crates.

use std::borrow::Cow;
use std::sync::LazyLock;

use regex_lite::Regex;
use unicode_width::UnicodeWidthStr;

// Matches CSI/OSC style escape sequences as emitted by color-capable
// terminals, including the 8-bit CSI introducer (U+009B).
const ANSI_ESCAPE_PATTERN: &str = r"[\x1B\x{9B}][\[\]()#;?]*(?:(?:(?:[a-zA-Z\d]*(?:;[a-zA-Z\d]*)*)?\x07)|(?:(?:\d{1,4}(?:;\d{0,4})*)?[\dA-PRZcf-ntqry=><~]))";

static ANSI_ESCAPES: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(ANSI_ESCAPE_PATTERN).ok());

/// Remove ANSI escape sequences from `s`.
///
/// Returns the input unchanged (borrowed) when it contains no escapes.
pub fn strip_ansi_escapes(s: &str) -> Cow<'_, str> {
    match ANSI_ESCAPES.as_ref() {
        Some(re) => re.replace_all(s, ""),
        None => Cow::Borrowed(s),
    }
}

/// Number of terminal columns `s` occupies, counting East Asian wide
/// characters as two columns. Escape sequences are *not* stripped here; call
/// [`strip_ansi_escapes`] first for colorized input.
pub fn display_width(s: &str) -> usize {
    UnicodeWidthStr::width(s)
}

/// Convenience for the common "strip, then measure" case.
pub fn rendered_width(s: &str) -> usize {
    display_width(&strip_ansi_escapes(s))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn strips_sgr_color_codes() {
        let colored = "\x1b[32m[2023-06-01 12:00:00]\x1b[0m";
        assert_eq!(strip_ansi_escapes(colored), "[2023-06-01 12:00:00]");
    }

    #[test]
    fn strips_osc_sequences_terminated_by_bel() {
        let titled = "\x1b]0;title\x07text";
        assert_eq!(strip_ansi_escapes(titled), "text");
    }

    #[test]
    fn plain_text_is_borrowed() {
        let plain = "[00:00:01]";
        assert!(matches!(strip_ansi_escapes(plain), Cow::Borrowed(_)));
    }

    #[test]
    fn wide_characters_count_double() {
        assert_eq!(display_width("[时间 2023-06-01 12:00:00]"), 26);
        assert_eq!(display_width("[2023-06-01 12:00:00]"), 21);
    }

    #[test]
    fn rendered_width_ignores_escapes() {
        assert_eq!(rendered_width("\x1b[32m[12:00:00]\x1b[0m"), 10);
    }
}
