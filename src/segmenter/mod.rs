//! Section boundary detection and assembly
//!
//! Splits normalized document text into contiguous, non-overlapping sections
//! using a prioritized set of boundary rules: explicit numbering schemes
//! first, then looser typographic shapes, then visual breaks. Sections that
//! come out below the minimum length merge into a neighbor rather than being
//! dropped, so every byte of the document stays covered.

mod patterns;

use tracing::debug;

use crate::config::SegmenterConfig;
use crate::types::{PageMap, Section, SectionId};

use patterns::{is_all_caps_heading, is_title_case_heading, SectionPatterns};

/// Which boundary rule recognized a header line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum HeaderKind {
    Numbered,
    Roman,
    Lettered,
    AllCaps,
    TitleCase,
}

/// One header-detection rule applied per line; first matching rule wins
trait HeaderRule: Send + Sync {
    fn kind(&self) -> HeaderKind;
    fn matches(&self, line: &str) -> bool;
}

struct NumberedRule;

impl HeaderRule for NumberedRule {
    fn kind(&self) -> HeaderKind {
        HeaderKind::Numbered
    }

    fn matches(&self, line: &str) -> bool {
        SectionPatterns::numbered_header().is_match(line)
    }
}

struct RomanRule;

impl HeaderRule for RomanRule {
    fn kind(&self) -> HeaderKind {
        HeaderKind::Roman
    }

    fn matches(&self, line: &str) -> bool {
        SectionPatterns::roman_header().is_match(line)
    }
}

struct LetteredRule;

impl HeaderRule for LetteredRule {
    fn kind(&self) -> HeaderKind {
        HeaderKind::Lettered
    }

    fn matches(&self, line: &str) -> bool {
        SectionPatterns::lettered_header().is_match(line)
    }
}

struct AllCapsRule;

impl HeaderRule for AllCapsRule {
    fn kind(&self) -> HeaderKind {
        HeaderKind::AllCaps
    }

    fn matches(&self, line: &str) -> bool {
        is_all_caps_heading(line)
    }
}

struct TitleCaseRule;

impl HeaderRule for TitleCaseRule {
    fn kind(&self) -> HeaderKind {
        HeaderKind::TitleCase
    }

    fn matches(&self, line: &str) -> bool {
        is_title_case_heading(line)
    }
}

/// A line of the normalized text with its byte span (newline excluded)
struct LineSpan<'a> {
    text: &'a str,
    start: usize,
    end: usize,
}

/// A detected section start before assembly
struct RawStart {
    line_idx: usize,
    title: Option<String>,
}

/// An assembled section before merging and ID assignment
struct RawSection {
    title: Option<String>,
    body: String,
    start: usize,
    end: usize,
}

impl RawSection {
    /// Title and body folded into one block, for merging into a neighbor
    fn flattened(&self) -> String {
        match &self.title {
            Some(title) => join_content(title, &self.body),
            None => self.body.clone(),
        }
    }

    /// Byte length of the flattened content, without building it
    fn content_len(&self) -> usize {
        match &self.title {
            Some(title) if self.body.is_empty() => title.len(),
            Some(title) => title.len() + 1 + self.body.len(),
            None => self.body.len(),
        }
    }
}

fn join_content(a: &str, b: &str) -> String {
    match (a.is_empty(), b.is_empty()) {
        (true, _) => b.to_string(),
        (_, true) => a.to_string(),
        _ => format!("{}\n{}", a, b),
    }
}

/// Splits normalized text into sections
///
/// Never fails and never returns an empty list: a document with no detected
/// boundaries is a single section, and empty input is a single empty section.
pub struct Segmenter {
    config: SegmenterConfig,
    rules: Vec<Box<dyn HeaderRule>>,
}

impl Segmenter {
    /// Create a segmenter with the standard rule set in priority order
    pub fn new(config: SegmenterConfig) -> Self {
        let rules: Vec<Box<dyn HeaderRule>> = vec![
            Box::new(NumberedRule),
            Box::new(RomanRule),
            Box::new(LetteredRule),
            Box::new(AllCapsRule),
            Box::new(TitleCaseRule),
        ];
        Self { config, rules }
    }

    /// Segment normalized text into contiguous sections
    ///
    /// Byte offsets refer to `text`; consecutive sections are contiguous and
    /// jointly span the whole document. Page numbers are attached when a
    /// page map is supplied.
    pub fn segment(&self, text: &str, page_map: Option<&PageMap>) -> Vec<Section> {
        let lines = collect_lines(text);
        let starts = self.find_starts(&lines);
        let raw = build_raw_sections(text, &lines, &starts);
        let merged = self.merge_short_sections(raw);
        let sections = finalize(merged, page_map);
        debug!("Segmented document into {} sections", sections.len());
        sections
    }

    fn match_header(&self, line: &str) -> Option<HeaderKind> {
        self.rules
            .iter()
            .find(|rule| rule.matches(line))
            .map(|rule| rule.kind())
    }

    /// Scan lines for section starts
    ///
    /// Header lines start a section at their own line. Rule lines, form
    /// feeds, and long blank runs attach to the previous section and force
    /// the next non-blank line to start a new one.
    fn find_starts(&self, lines: &[LineSpan<'_>]) -> Vec<RawStart> {
        let mut starts = Vec::new();
        let mut blank_run = 0usize;
        let mut pending_break = false;

        for (i, line) in lines.iter().enumerate() {
            if line.text.contains('\x0C') {
                blank_run = 0;
                pending_break = true;
                continue;
            }
            let trimmed = line.text.trim();
            if trimmed.is_empty() {
                blank_run += 1;
                if blank_run >= self.config.blank_run_threshold {
                    pending_break = true;
                }
                continue;
            }
            blank_run = 0;

            if SectionPatterns::rule_line().is_match(trimmed) {
                pending_break = true;
                continue;
            }
            if let Some(kind) = self.match_header(trimmed) {
                debug!("{:?} header boundary at byte {}", kind, line.start);
                starts.push(RawStart {
                    line_idx: i,
                    title: Some(trimmed.to_string()),
                });
                pending_break = false;
                continue;
            }
            if pending_break {
                starts.push(RawStart {
                    line_idx: i,
                    title: None,
                });
                pending_break = false;
            }
        }

        // Content before the first detected boundary is its own section
        if starts.first().map_or(true, |s| s.line_idx != 0) {
            starts.insert(
                0,
                RawStart {
                    line_idx: 0,
                    title: None,
                },
            );
        }
        starts
    }

    /// Merge sections whose content is shorter than the configured minimum
    ///
    /// Length is measured over the flattened content (title plus body).
    /// Short sections fold backward into their predecessor; a short leading
    /// section folds forward into its successor. A document shorter than the
    /// minimum still yields its single section.
    fn merge_short_sections(&self, raw: Vec<RawSection>) -> Vec<RawSection> {
        let min_len = self.config.min_section_length;
        let mut out: Vec<RawSection> = Vec::with_capacity(raw.len());
        let mut pending: Option<RawSection> = None;

        for mut section in raw {
            if let Some(p) = pending.take() {
                section.start = p.start;
                section.body = join_content(&p.flattened(), &section.body);
            }
            if section.content_len() < min_len {
                match out.last_mut() {
                    Some(prev) => {
                        prev.end = section.end;
                        prev.body = join_content(&prev.body, &section.flattened());
                    }
                    None => pending = Some(section),
                }
            } else {
                out.push(section);
            }
        }

        if let Some(p) = pending {
            out.push(p);
        }
        out
    }
}

impl Default for Segmenter {
    fn default() -> Self {
        Self::new(SegmenterConfig::default())
    }
}

fn collect_lines(text: &str) -> Vec<LineSpan<'_>> {
    let mut lines = Vec::new();
    let mut offset = 0;
    for part in text.split('\n') {
        lines.push(LineSpan {
            text: part,
            start: offset,
            end: offset + part.len(),
        });
        offset += part.len() + 1;
    }
    lines
}

fn build_raw_sections(
    text: &str,
    lines: &[LineSpan<'_>],
    starts: &[RawStart],
) -> Vec<RawSection> {
    let mut raw = Vec::with_capacity(starts.len());
    for (k, s) in starts.iter().enumerate() {
        let start = lines[s.line_idx].start;
        let end = starts
            .get(k + 1)
            .map_or(text.len(), |next| lines[next.line_idx].start);
        let body_from = if s.title.is_some() {
            // Body begins after the header line
            (lines[s.line_idx].end + 1).min(end)
        } else {
            start
        };
        let body = clean_body(&text[body_from..end]);
        raw.push(RawSection {
            title: s.title.clone(),
            body,
            start,
            end,
        });
    }
    raw
}

/// Body text of a span, with visual separator lines filtered out
///
/// Separators mark boundaries; they carry no content. The section's byte
/// span still covers them.
fn clean_body(slice: &str) -> String {
    let kept: Vec<&str> = slice
        .split('\n')
        .filter(|line| !SectionPatterns::rule_line().is_match(line.trim()))
        .collect();
    kept.join("\n").trim().to_string()
}

fn finalize(merged: Vec<RawSection>, page_map: Option<&PageMap>) -> Vec<Section> {
    merged
        .into_iter()
        .enumerate()
        .map(|(i, r)| Section {
            id: SectionId(i as u32 + 1),
            title: r
                .title
                .unwrap_or_else(|| format!("Untitled Section {}", i + 1)),
            body: r.body,
            start_offset: r.start,
            end_offset: r.end,
            page_number: page_map.and_then(|m| m.page_for_offset(r.start)),
            position_index: i,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn segment(text: &str) -> Vec<Section> {
        Segmenter::default().segment(text, None)
    }

    fn assert_contiguous(sections: &[Section], text_len: usize) {
        assert_eq!(sections[0].start_offset, 0);
        assert_eq!(sections.last().unwrap().end_offset, text_len);
        for pair in sections.windows(2) {
            assert_eq!(pair[0].end_offset, pair[1].start_offset);
        }
    }

    #[test]
    fn test_no_headers_yields_single_section() {
        let text = "just a plain paragraph of text without any heading structure at all";
        let sections = segment(text);
        assert_eq!(sections.len(), 1);
        assert_eq!(sections[0].title, "Untitled Section 1");
        assert_eq!(sections[0].body, text);
        assert_contiguous(&sections, text.len());
    }

    #[test]
    fn test_empty_input_yields_single_empty_section() {
        let sections = segment("");
        assert_eq!(sections.len(), 1);
        assert_eq!(sections[0].id, SectionId(1));
        assert!(sections[0].body.is_empty());
        assert_eq!(sections[0].start_offset, 0);
        assert_eq!(sections[0].end_offset, 0);
    }

    #[test]
    fn test_numbered_headers_split() {
        let text = "1. Introduction\nThis opening section describes the purpose of the document.\n2. Notes\nThese closing notes wrap up the remaining details cleanly.";
        let sections = segment(text);
        assert_eq!(sections.len(), 2);
        assert_eq!(sections[0].title, "1. Introduction");
        assert_eq!(sections[1].title, "2. Notes");
        assert_contiguous(&sections, text.len());
    }

    #[test]
    fn test_mixed_header_schemes() {
        let text = "I. Overview\nThe overview body is long enough to stand on its own here.\nA. Appendix\nThe appendix body is also long enough to stand on its own.\nEXECUTIVE SUMMARY\nA summary body with plenty of words to avoid any merging.\nFinancial Overview Details\nTitle case section body that is comfortably long enough too.";
        let sections = segment(text);
        let titles: Vec<&str> = sections.iter().map(|s| s.title.as_str()).collect();
        assert_eq!(
            titles,
            vec![
                "I. Overview",
                "A. Appendix",
                "EXECUTIVE SUMMARY",
                "Financial Overview Details"
            ]
        );
        assert_contiguous(&sections, text.len());
    }

    #[test]
    fn test_preamble_before_first_header() {
        let text = "Some preamble text appearing before any header, long enough to keep.\n1. First Real Section\nBody of the first real section with adequate length to survive.";
        let sections = segment(text);
        assert_eq!(sections.len(), 2);
        assert_eq!(sections[0].title, "Untitled Section 1");
        assert_eq!(sections[1].title, "1. First Real Section");
    }

    #[test]
    fn test_short_section_merges_backward() {
        let text = "1. Introduction\nA sufficiently long introduction body that easily clears the bar.\n2. Stub\nTiny.\n3. Conclusion\nA sufficiently long conclusion body that also clears the bar.";
        let sections = segment(text);
        assert_eq!(sections.len(), 2);
        assert_eq!(sections[0].title, "1. Introduction");
        assert!(sections[0].body.contains("2. Stub"));
        assert!(sections[0].body.contains("Tiny."));
        assert_eq!(sections[1].title, "3. Conclusion");
        assert_contiguous(&sections, text.len());
    }

    #[test]
    fn test_leading_short_section_merges_forward() {
        let text = "Tiny lead.\n1. Main Section\nThe main body is long enough to absorb the short leading text.";
        let sections = segment(text);
        assert_eq!(sections.len(), 1);
        assert_eq!(sections[0].title, "1. Main Section");
        assert!(sections[0].body.contains("Tiny lead."));
        assert_eq!(sections[0].start_offset, 0);
        assert_eq!(sections[0].end_offset, text.len());
    }

    #[test]
    fn test_minimum_counts_title_and_body_together() {
        // "2. Notes" + "See appendix." is 22 bytes flattened, over the
        // 20-byte minimum, so the section stands despite its short body
        let text = "1. Introduction\nThis report contains 45% growth and $2M revenue.\n2. Notes\nSee appendix.";
        let sections = segment(text);
        assert_eq!(sections.len(), 2);
        assert_eq!(sections[0].title, "1. Introduction");
        assert_eq!(sections[1].title, "2. Notes");
        assert_eq!(sections[1].body, "See appendix.");
        assert_contiguous(&sections, text.len());
    }

    #[test]
    fn test_document_shorter_than_minimum_kept() {
        let text = "tiny";
        let sections = segment(text);
        assert_eq!(sections.len(), 1);
        assert_eq!(sections[0].body, "tiny");
    }

    #[test]
    fn test_rule_line_break() {
        let text = "First block of content with enough words to stand alone here.\n==========\nSecond block of content, also with enough words to stand alone.";
        let sections = segment(text);
        assert_eq!(sections.len(), 2);
        assert_eq!(sections[0].title, "Untitled Section 1");
        assert_eq!(sections[1].title, "Untitled Section 2");
        // The rule line belongs to the span of the first section
        assert!(sections[0].end_offset > text.find("==========").unwrap());
        assert_contiguous(&sections, text.len());
    }

    #[test]
    fn test_blank_run_break() {
        let split = "First paragraph with a perfectly reasonable amount of text.\n\n\n\nSecond paragraph, separated by a long run of blank lines.";
        assert_eq!(segment(split).len(), 2);

        let unsplit = "First paragraph with a perfectly reasonable amount of text.\n\nSecond paragraph, separated by a short run of blank lines.";
        assert_eq!(segment(unsplit).len(), 1);
    }

    #[test]
    fn test_form_feed_break() {
        let text = "Content of the first page with enough words to stand alone.\n\x0C\nContent of the second page, also with enough words to stand.";
        let sections = segment(text);
        assert_eq!(sections.len(), 2);
        assert_contiguous(&sections, text.len());
    }

    #[test]
    fn test_bare_number_is_not_a_header() {
        let text = "3 items were found in the latest scan of the example corpus.\nAll of them were benign according to the reviewers involved.";
        let sections = segment(text);
        assert_eq!(sections.len(), 1);
    }

    #[test]
    fn test_ids_sequential_after_merge() {
        let text = "1. Introduction\nA sufficiently long introduction body that easily clears the bar.\n2. Stub\nTiny.\n3. Conclusion\nA sufficiently long conclusion body that also clears the bar.";
        let sections = segment(text);
        for (i, section) in sections.iter().enumerate() {
            assert_eq!(section.id, SectionId(i as u32 + 1));
            assert_eq!(section.position_index, i);
        }
    }

    #[test]
    fn test_page_numbers_attached() {
        let text = "1. First Part\nBody of the first part with enough length to stay separate.\n2. Second Part\nBody of the second part with enough length to stay separate.";
        let second_start = text.find("2. Second Part").unwrap();
        let page_map = PageMap::new(vec![0, second_start]);
        let sections = Segmenter::default().segment(text, Some(&page_map));
        assert_eq!(sections.len(), 2);
        assert_eq!(sections[0].page_number, Some(1));
        assert_eq!(sections[1].page_number, Some(2));
    }

    #[test]
    fn test_header_priority_roman_before_lettered() {
        let seg = Segmenter::default();
        assert_eq!(seg.match_header("I. Overview"), Some(HeaderKind::Roman));
        assert_eq!(seg.match_header("B. Appendix"), Some(HeaderKind::Lettered));
        assert_eq!(seg.match_header("1. Intro"), Some(HeaderKind::Numbered));
        assert_eq!(
            seg.match_header("EXECUTIVE SUMMARY"),
            Some(HeaderKind::AllCaps)
        );
        assert_eq!(
            seg.match_header("Financial Overview"),
            Some(HeaderKind::TitleCase)
        );
        assert_eq!(seg.match_header("plain prose line"), None);
    }
}
