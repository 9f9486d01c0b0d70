//! Text normalization ahead of segmentation
//!
//! Canonicalizes raw extracted text so the segmenter's line-oriented
//! patterns see a predictable shape: LF newlines, ASCII spaces, no stray
//! control characters. Blank-line runs and form feeds are preserved because
//! the segmenter reads them as boundary cues.

/// Normalize raw document text
///
/// Pure and total: never fails, and normalizing twice equals normalizing
/// once. Removes BOM and zero-width characters, converts CRLF/CR to LF,
/// maps exotic Unicode spaces to ASCII space, strips control characters
/// other than `\n`, `\t`, and form feed, and trims trailing spaces and tabs
/// from every line.
pub fn normalize(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut chars = raw.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            // BOM and zero-width characters vanish entirely
            '\u{FEFF}' | '\u{200B}' | '\u{200C}' | '\u{200D}' => {}

            // CRLF and bare CR both become LF
            '\r' => {
                if chars.peek() == Some(&'\n') {
                    chars.next();
                }
                out.push('\n');
            }

            // Unicode space variants collapse to ASCII space
            '\u{A0}' | '\u{1680}' | '\u{2000}'..='\u{200A}' | '\u{202F}' | '\u{205F}'
            | '\u{3000}' => out.push(' '),

            // Newline, tab, and form feed survive; form feed is a page cue
            '\n' | '\t' | '\x0C' => out.push(c),

            c if c.is_control() => {}

            c => out.push(c),
        }
    }

    trim_line_ends(&out)
}

/// Strip trailing spaces and tabs from each line, preserving line structure
fn trim_line_ends(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for (i, line) in text.split('\n').enumerate() {
        if i > 0 {
            out.push('\n');
        }
        out.push_str(line.trim_end_matches([' ', '\t']));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_crlf_becomes_lf() {
        assert_eq!(normalize("a\r\nb\rc\nd"), "a\nb\nc\nd");
    }

    #[test]
    fn test_bom_and_zero_width_removed() {
        assert_eq!(normalize("\u{FEFF}hello\u{200B} world"), "hello world");
    }

    #[test]
    fn test_unicode_spaces_mapped() {
        assert_eq!(normalize("a\u{A0}b\u{2003}c"), "a b c");
    }

    #[test]
    fn test_control_chars_stripped_except_cues() {
        assert_eq!(normalize("a\x07b\tc\x0Cd\x7Fe"), "ab\tc\x0Cde");
    }

    #[test]
    fn test_trailing_whitespace_trimmed_per_line() {
        assert_eq!(normalize("line one   \nline two\t\n"), "line one\nline two\n");
    }

    #[test]
    fn test_blank_line_runs_preserved() {
        let text = "first\n\n\n\nsecond";
        assert_eq!(normalize(text), text);
    }

    #[test]
    fn test_whitespace_only_lines_become_blank() {
        assert_eq!(normalize("a\n   \nb"), "a\n\nb");
    }

    #[test]
    fn test_empty_input() {
        assert_eq!(normalize(""), "");
    }

    #[test]
    fn test_idempotent() {
        let raw = "\u{FEFF}Title\r\n\r\n  body text \u{A0} here\t\n";
        let once = normalize(raw);
        assert_eq!(normalize(&once), once);
    }
}
