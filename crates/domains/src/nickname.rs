//! # Nickname Extraction
//!
//! OCR of a phone or monitor screen returns the nickname as one short clean
//! token surrounded by menu labels and instructions. The heuristic prefers the
//! first line that looks exactly like a nickname, then falls back to the
//! shortest line made only of nickname characters.

const MIN_LEN: usize = 2;
const MAX_LEN: usize = 15;

/// Hangul syllables, ASCII letters and ASCII digits.
fn is_nickname_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || ('\u{AC00}'..='\u{D7A3}').contains(&c)
}

fn is_clean(line: &str) -> bool {
    line.chars().all(is_nickname_char)
}

/// Whitespace plus the byte-order mark some OCR engines prefix to a line.
fn trim_line(line: &str) -> &str {
    line.trim_matches(|c: char| c.is_whitespace() || c == '\u{FEFF}')
}

/// Returns the best nickname candidate in `full_text`, or an empty string when
/// no line qualifies.
pub fn extract_nickname(full_text: &str) -> String {
    let lines: Vec<&str> = full_text
        .split('\n')
        .map(trim_line)
        .filter(|line| line.chars().count() > 1)
        .collect();

    let strict = lines.iter().find(|line| {
        let len = line.chars().count();
        (MIN_LEN..=MAX_LEN).contains(&len) && is_clean(line)
    });
    if let Some(line) = strict {
        return line.to_string();
    }

    // min_by_key returns the first of equal minima, so ties keep line order.
    lines
        .into_iter()
        .filter(|line| is_clean(line))
        .min_by_key(|line| line.chars().count())
        .map(str::to_string)
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn picks_hangul_nickname_among_noise() {
        assert_eq!(extract_nickname("EVENT LOGIN\n철수123\nPRESS OK"), "철수123");
    }

    #[test]
    fn first_strict_match_wins_over_shorter_later_one() {
        assert_eq!(extract_nickname("Welcome!\nlongname99\nab"), "longname99");
    }

    #[test]
    fn earliest_strict_match_beats_a_shorter_later_line() {
        // "bcde" already fits 2..=15, so the shorter "fg" is never considered.
        assert_eq!(extract_nickname("a\nbcde\nfg"), "bcde");
    }

    #[test]
    fn single_char_lines_are_dropped_before_fallback() {
        let text = "a\nabcdefghijklmnopq\nabcdefghijklmnop";
        assert_eq!(extract_nickname(text), "abcdefghijklmnop");
    }

    #[test]
    fn byte_order_mark_is_trimmed_like_whitespace() {
        assert_eq!(extract_nickname("\u{FEFF}bob2\n"), "bob2");
        assert_eq!(extract_nickname("LOGIN SCREEN\n \u{FEFF}영희\u{FEFF}"), "영희");
    }

    #[test]
    fn fallback_returns_shortest_clean_line_over_fifteen_chars() {
        let text = "Tap here to continue\nabcdefghijklmnopqrst\nabcdefghijklmnop";
        assert_eq!(extract_nickname(text), "abcdefghijklmnop");
    }

    #[test]
    fn fallback_ties_resolve_to_earliest_line() {
        let text = "no-match here\nqqqqqqqqqqqqqqqqA\nzzzzzzzzzzzzzzzzB";
        assert_eq!(extract_nickname(text), "qqqqqqqqqqqqqqqqA");
    }

    #[test]
    fn lines_are_trimmed_before_matching() {
        assert_eq!(extract_nickname("  Menu:  \r\n   영희  \r\n"), "영희");
    }

    #[test]
    fn punctuation_and_spaces_disqualify_a_line() {
        assert_eq!(extract_nickname("hello world\nuser_1\nfoo.bar\n,,"), "");
    }

    #[test]
    fn empty_and_whitespace_input_yield_empty() {
        assert_eq!(extract_nickname(""), "");
        assert_eq!(extract_nickname("\n \n\t\n"), "");
        assert_eq!(extract_nickname("x\ny\n1"), "");
    }

    #[test]
    fn length_counts_characters_not_bytes() {
        // Fifteen Hangul syllables are 45 bytes of UTF-8.
        let fifteen = "가".repeat(15);
        assert_eq!(extract_nickname(&format!("Sign in\n{fifteen}\nOK")), fifteen);
    }

    #[test]
    fn non_hangul_scripts_are_not_nickname_chars() {
        assert_eq!(extract_nickname("ñandú\nこんにちは"), "");
    }
}
