//! Pre-compiled regex patterns for section boundary detection
//!
//! This module provides the line-shape patterns the boundary rules match
//! against. Patterns are compiled once and shared.

use once_cell::sync::Lazy;
use regex::Regex;

/// Line patterns used by the boundary rules
pub struct SectionPatterns;

impl SectionPatterns {
    /// Numbered headers: `1. Title`, `2.3.1. Nested Title`
    ///
    /// Every numeric group carries a trailing dot; a bare leading number is
    /// prose (e.g. `3 items were found`), not a header.
    pub fn numbered_header() -> &'static Regex {
        static PATTERN: Lazy<Regex> = Lazy::new(|| {
            Regex::new(r"^(\d+\.)+\s+\S.*$").expect("Valid numbered header regex")
        });
        &PATTERN
    }

    /// Roman-numeral headers: `IV. Title`, `ii. Subsection`
    pub fn roman_header() -> &'static Regex {
        static PATTERN: Lazy<Regex> = Lazy::new(|| {
            Regex::new(r"^[IVXivx]+\.\s+\S.*$").expect("Valid roman header regex")
        });
        &PATTERN
    }

    /// Single-letter headers: `A. Appendix`
    pub fn lettered_header() -> &'static Regex {
        static PATTERN: Lazy<Regex> = Lazy::new(|| {
            Regex::new(r"^[A-Z]\.\s+\S.*$").expect("Valid lettered header regex")
        });
        &PATTERN
    }

    /// Horizontal rule lines: `-----`, `=====`, `*****` (5 or more)
    pub fn rule_line() -> &'static Regex {
        static PATTERN: Lazy<Regex> =
            Lazy::new(|| Regex::new(r"^[-=*]{5,}$").expect("Valid rule line regex"));
        &PATTERN
    }

    /// A single Title-Case word: capital letter followed by lowercase
    pub fn title_case_word() -> &'static Regex {
        static PATTERN: Lazy<Regex> =
            Lazy::new(|| Regex::new(r"^[A-Z][a-z]+$").expect("Valid title case word regex"));
        &PATTERN
    }
}

/// Whether a trimmed line reads as a short ALL-CAPS heading
///
/// Requires at least 4 alphabetic characters and no lowercase anywhere;
/// digits and punctuation are allowed so `SECTION 2: RESULTS` qualifies.
/// Capped at 80 characters to keep shouted paragraphs out.
pub fn is_all_caps_heading(line: &str) -> bool {
    let char_len = line.chars().count();
    if char_len < 4 || char_len > 80 {
        return false;
    }
    let alphabetic = line.chars().filter(|c| c.is_alphabetic()).count();
    if alphabetic < 4 {
        return false;
    }
    !line.chars().any(|c| c.is_lowercase())
}

/// Whether a trimmed line reads as a short Title-Case heading
///
/// Every word must be `Xx...` shaped, 2 to 8 words, 10 to 100 characters
/// total. Terminal punctuation disqualifies the line, which keeps ordinary
/// sentences out.
pub fn is_title_case_heading(line: &str) -> bool {
    let char_len = line.chars().count();
    if !(10..=100).contains(&char_len) {
        return false;
    }
    let words: Vec<&str> = line.split_whitespace().collect();
    if !(2..=8).contains(&words.len()) {
        return false;
    }
    words
        .iter()
        .all(|w| SectionPatterns::title_case_word().is_match(w))
}
