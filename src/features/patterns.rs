//! Pre-compiled regex patterns for feature detection
//!
//! This module provides the content patterns the feature extractor counts:
//! currency amounts, percentages, dates, contact info, and list markers.
//! Patterns are compiled once and shared.

use once_cell::sync::Lazy;
use regex::Regex;

/// Content patterns counted during feature extraction
pub struct FeaturePatterns;

impl FeaturePatterns {
    /// Currency amounts: `$1,200`, `€ 45`, or bare two-decimal figures
    pub fn currency() -> &'static Regex {
        static PATTERN: Lazy<Regex> = Lazy::new(|| {
            Regex::new(r"[$£€¥₹]\s*\d+|\d+\.\d{2}").expect("Valid currency regex")
        });
        &PATTERN
    }

    /// Percentages: `12%`, `3.5 %`
    pub fn percentage() -> &'static Regex {
        static PATTERN: Lazy<Regex> =
            Lazy::new(|| Regex::new(r"\d+\.?\d*\s*%").expect("Valid percentage regex"));
        &PATTERN
    }

    /// Dates: `12/31/2024`, `2024-01-15`, `Mar 3, 2024`
    pub fn date() -> &'static Regex {
        static PATTERN: Lazy<Regex> = Lazy::new(|| {
            Regex::new(
                r"\d{1,2}[-/]\d{1,2}[-/]\d{2,4}|\d{4}[-/]\d{1,2}[-/]\d{1,2}|(?:Jan|Feb|Mar|Apr|May|Jun|Jul|Aug|Sep|Oct|Nov|Dec)[a-z]*\s+\d{1,2},?\s+\d{4}",
            )
            .expect("Valid date regex")
        });
        &PATTERN
    }

    /// Email addresses
    pub fn email() -> &'static Regex {
        static PATTERN: Lazy<Regex> = Lazy::new(|| {
            Regex::new(r"\b[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}\b")
                .expect("Valid email regex")
        });
        &PATTERN
    }

    /// URLs: http:// or https://
    pub fn url() -> &'static Regex {
        static PATTERN: Lazy<Regex> =
            Lazy::new(|| Regex::new(r"https?://[^\s<>]+").expect("Valid URL regex"));
        &PATTERN
    }

    /// North-American-style phone numbers
    pub fn phone() -> &'static Regex {
        static PATTERN: Lazy<Regex> = Lazy::new(|| {
            Regex::new(r"\(?\d{3}\)?[-.\s]?\d{3}[-.\s]?\d{4}").expect("Valid phone regex")
        });
        &PATTERN
    }

    /// Bulleted list items at line start
    pub fn bullet_item() -> &'static Regex {
        static PATTERN: Lazy<Regex> = Lazy::new(|| {
            Regex::new(r"(?m)^\s*[•\-*◦▪]\s+").expect("Valid bullet item regex")
        });
        &PATTERN
    }

    /// Numbered list items at line start: `1. item` or `2) item`
    pub fn numbered_item() -> &'static Regex {
        static PATTERN: Lazy<Regex> = Lazy::new(|| {
            Regex::new(r"(?m)^\s*\d+[.)]\s+").expect("Valid numbered item regex")
        });
        &PATTERN
    }

    /// Numeric literal tokens: `42`, `3.14`
    pub fn number_token() -> &'static Regex {
        static PATTERN: Lazy<Regex> =
            Lazy::new(|| Regex::new(r"\d+\.?\d*").expect("Valid number token regex"));
        &PATTERN
    }

    /// Word tokens
    pub fn word() -> &'static Regex {
        static PATTERN: Lazy<Regex> =
            Lazy::new(|| Regex::new(r"\b\w+\b").expect("Valid word regex"));
        &PATTERN
    }
}

/// Characters that mark a line as table-like
const TABLE_INDICATORS: [char; 5] = ['|', '┃', '─', '═', '│'];

/// Count lines containing a table indicator character
pub fn table_line_count(text: &str) -> usize {
    text.lines()
        .filter(|line| line.chars().any(|c| TABLE_INDICATORS.contains(&c)))
        .count()
}

/// Count sentences: segments between terminal punctuation runs
pub fn sentence_count(text: &str) -> usize {
    text.split(['.', '!', '?'])
        .filter(|s| !s.trim().is_empty())
        .count()
}
