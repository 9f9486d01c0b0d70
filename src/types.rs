//! Core data types for the pericope extraction pipeline
//!
//! This module defines the fundamental data structures shared across the
//! pipeline: sections, feature vectors, scored results, and the feedback
//! records that drive online retraining.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for processed documents
///
/// Wraps a UUID to provide type safety and prevent mixing document IDs
/// with other UUID-based identifiers in the system.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DocumentId(pub Uuid);

impl DocumentId {
    /// Create a new random document ID
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Parse a document ID from a string
    pub fn from_string(s: &str) -> Result<Self, uuid::Error> {
        Ok(Self(Uuid::parse_str(s)?))
    }
}

impl Default for DocumentId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for DocumentId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identifier for a section within a single document
///
/// Assigned 1-based in order of emission by the segmenter and stable across
/// re-scoring of the same document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SectionId(pub u32);

impl std::fmt::Display for SectionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Mapping from byte offsets in extracted text to page numbers
///
/// Supplied by the upstream text-extraction layer when the source format has
/// pages. Offsets are the byte positions where each page starts, in order.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PageMap {
    page_starts: Vec<usize>,
}

impl PageMap {
    /// Build a page map from per-page start offsets (sorted internally)
    pub fn new(mut page_starts: Vec<usize>) -> Self {
        page_starts.sort_unstable();
        Self { page_starts }
    }

    /// Resolve the 1-based page number containing the given byte offset
    pub fn page_for_offset(&self, offset: usize) -> Option<u32> {
        if self.page_starts.is_empty() {
            return None;
        }
        let idx = match self.page_starts.binary_search(&offset) {
            Ok(i) => i,
            Err(0) => 0,
            Err(i) => i - 1,
        };
        Some(idx as u32 + 1)
    }
}

/// A contiguous span of document text treated as one unit
///
/// Immutable once created by the segmenter. Offsets are byte positions into
/// the normalized text; consecutive sections are contiguous and
/// non-overlapping.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Section {
    /// Identifier, unique within the document
    pub id: SectionId,

    /// Detected header text, or a synthesized placeholder title
    pub title: String,

    /// Section body (text between this boundary and the next)
    pub body: String,

    /// Byte offset of the section start in the normalized text
    pub start_offset: usize,

    /// Byte offset one past the section end in the normalized text
    pub end_offset: usize,

    /// Source page number, when a page map was supplied
    pub page_number: Option<u32>,

    /// 0-based position of this section within the document
    pub position_index: usize,
}

impl Section {
    /// Whether the title was synthesized rather than detected
    pub fn is_untitled(&self) -> bool {
        self.title.starts_with("Untitled Section ")
    }
}

/// Informational content markers attached to a feature vector
///
/// Tags are surfaced to consumers for display and filtering; they are not
/// direct inputs to scoring.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SectionTag {
    /// Numeric content beyond incidental mentions
    Numbers,

    /// Date expressions or date entities present
    Dates,

    /// Named people or organizations present
    Entities,

    /// Table-like line structure detected
    Table,

    /// Bulleted or numbered list items present
    List,

    /// Currency amounts present
    Financial,

    /// Email addresses or phone numbers present
    ContactInfo,
}

impl std::fmt::Display for SectionTag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            SectionTag::Numbers => "numbers",
            SectionTag::Dates => "dates",
            SectionTag::Entities => "entities",
            SectionTag::Table => "table",
            SectionTag::List => "list",
            SectionTag::Financial => "financial",
            SectionTag::ContactInfo => "contact_info",
        };
        write!(f, "{}", s)
    }
}

/// Named slots of the feature vector, in storage order
///
/// The slot list is fixed for the lifetime of a trained model version; the
/// scorer rejects vectors whose length disagrees with [`FEATURE_SLOT_COUNT`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FeatureSlot {
    WordCount,
    SentenceCount,
    CharDensity,
    DigitTokenCount,
    DigitRatio,
    CurrencyCount,
    PercentCount,
    DateCount,
    PersonCount,
    OrgCount,
    LocationCount,
    DateEntityCount,
    BulletCount,
    NumberedItemCount,
    TableRowCount,
    EmailCount,
    UrlCount,
    PhoneCount,
    AvgWordLen,
    AvgSentenceLen,
    PositionRatio,
    TitleLenRatio,
}

/// Number of feature slots; the fixed shape of every feature vector
pub const FEATURE_SLOT_COUNT: usize = 22;

impl FeatureSlot {
    /// All slots in storage order
    pub const ALL: [FeatureSlot; FEATURE_SLOT_COUNT] = [
        FeatureSlot::WordCount,
        FeatureSlot::SentenceCount,
        FeatureSlot::CharDensity,
        FeatureSlot::DigitTokenCount,
        FeatureSlot::DigitRatio,
        FeatureSlot::CurrencyCount,
        FeatureSlot::PercentCount,
        FeatureSlot::DateCount,
        FeatureSlot::PersonCount,
        FeatureSlot::OrgCount,
        FeatureSlot::LocationCount,
        FeatureSlot::DateEntityCount,
        FeatureSlot::BulletCount,
        FeatureSlot::NumberedItemCount,
        FeatureSlot::TableRowCount,
        FeatureSlot::EmailCount,
        FeatureSlot::UrlCount,
        FeatureSlot::PhoneCount,
        FeatureSlot::AvgWordLen,
        FeatureSlot::AvgSentenceLen,
        FeatureSlot::PositionRatio,
        FeatureSlot::TitleLenRatio,
    ];

    /// Index of this slot within the vector
    pub fn index(self) -> usize {
        self as usize
    }

    /// Stable name of this slot, for diagnostics and exports
    pub fn name(self) -> &'static str {
        match self {
            FeatureSlot::WordCount => "word_count",
            FeatureSlot::SentenceCount => "sentence_count",
            FeatureSlot::CharDensity => "char_density",
            FeatureSlot::DigitTokenCount => "digit_token_count",
            FeatureSlot::DigitRatio => "digit_ratio",
            FeatureSlot::CurrencyCount => "currency_count",
            FeatureSlot::PercentCount => "percent_count",
            FeatureSlot::DateCount => "date_count",
            FeatureSlot::PersonCount => "person_count",
            FeatureSlot::OrgCount => "org_count",
            FeatureSlot::LocationCount => "location_count",
            FeatureSlot::DateEntityCount => "date_entity_count",
            FeatureSlot::BulletCount => "bullet_count",
            FeatureSlot::NumberedItemCount => "numbered_item_count",
            FeatureSlot::TableRowCount => "table_row_count",
            FeatureSlot::EmailCount => "email_count",
            FeatureSlot::UrlCount => "url_count",
            FeatureSlot::PhoneCount => "phone_count",
            FeatureSlot::AvgWordLen => "avg_word_len",
            FeatureSlot::AvgSentenceLen => "avg_sentence_len",
            FeatureSlot::PositionRatio => "position_ratio",
            FeatureSlot::TitleLenRatio => "title_len_ratio",
        }
    }
}

/// Fixed-shape numeric summary of one section
///
/// Produced deterministically by the feature extractor; the same section
/// always yields bit-identical values.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeatureVector {
    /// Section this vector describes
    pub section_id: SectionId,

    /// Slot values, in [`FeatureSlot::ALL`] order
    pub values: Vec<f32>,

    /// Informational tags derived during extraction
    pub tags: BTreeSet<SectionTag>,
}

impl FeatureVector {
    /// Build a vector from a complete slot array
    pub fn new(
        section_id: SectionId,
        values: [f32; FEATURE_SLOT_COUNT],
        tags: BTreeSet<SectionTag>,
    ) -> Self {
        Self {
            section_id,
            values: values.to_vec(),
            tags,
        }
    }

    /// Number of slots in this vector
    ///
    /// Always [`FEATURE_SLOT_COUNT`] for vectors built by the extractor;
    /// deserialized vectors may disagree and are rejected at the scorer.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Whether the vector carries no values
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Read one named slot (0.0 when the vector is malformed and short)
    pub fn get(&self, slot: FeatureSlot) -> f32 {
        self.values.get(slot.index()).copied().unwrap_or(0.0)
    }

    /// Whether a tag was attached during extraction
    pub fn has_tag(&self, tag: SectionTag) -> bool {
        self.tags.contains(&tag)
    }
}

/// Which scoring path produced a relevance score
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScoringMode {
    /// Rule-based weighted scoring, no training data required
    Heuristic,

    /// Classifier fitted on accumulated feedback
    Learned,
}

impl std::fmt::Display for ScoringMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ScoringMode::Heuristic => write!(f, "heuristic"),
            ScoringMode::Learned => write!(f, "learned"),
        }
    }
}

/// A section with its extracted features and relevance estimate
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoredSection {
    /// The underlying section
    pub section: Section,

    /// Features extracted from the section
    pub feature_vector: FeatureVector,

    /// Relevance estimate in [0.0, 1.0]
    pub relevance_score: f32,

    /// Path that produced the score
    pub scoring_mode: ScoringMode,
}

/// One user relevance judgment, the unit of training signal
///
/// Records are append-only: an opposite judgment for the same section is a
/// new record, never a rewrite.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeedbackRecord {
    /// Document the judged section belongs to
    pub document_id: DocumentId,

    /// The judged section
    pub section_id: SectionId,

    /// Feature vector captured at feedback time
    pub feature_vector: FeatureVector,

    /// User judgment: relevant (true) or boilerplate (false)
    pub is_relevant: bool,

    /// When the judgment was submitted
    pub submitted_at: DateTime<Utc>,
}

impl FeedbackRecord {
    /// Build a record stamped with the current time
    pub fn new(
        document_id: DocumentId,
        section_id: SectionId,
        feature_vector: FeatureVector,
        is_relevant: bool,
    ) -> Self {
        Self {
            document_id,
            section_id,
            feature_vector,
            is_relevant,
            submitted_at: Utc::now(),
        }
    }

    /// Identity triple used for duplicate rejection
    pub fn dedupe_key(&self) -> (DocumentId, SectionId, bool) {
        (self.document_id, self.section_id, self.is_relevant)
    }
}

/// Complete output of processing one document
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentResult {
    /// Identifier assigned to this document
    pub document_id: DocumentId,

    /// All sections in document order, scored
    pub sections: Vec<ScoredSection>,

    /// Total number of sections emitted
    pub total_sections: usize,

    /// Number of sections at or above the threshold
    pub relevant_count: usize,

    /// Threshold the relevant count was computed against
    pub threshold: f32,
}

impl DocumentResult {
    /// Sections at or above the threshold, in document order
    pub fn relevant_sections(&self) -> impl Iterator<Item = &ScoredSection> {
        self.sections
            .iter()
            .filter(move |s| s.relevance_score >= self.threshold)
    }
}

/// Metadata describing the currently fitted model, if any
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelInfo {
    /// Monotonic model version, starting at 1
    pub version: u32,

    /// When the model was fitted
    pub trained_at: DateTime<Utc>,

    /// Number of feedback records the fit consumed
    pub sample_count: usize,

    /// Best-effort holdout accuracy, when enough samples existed
    pub accuracy: Option<f32>,
}

/// Current scorer state as reported to callers
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModeReport {
    /// Active scoring mode
    pub mode: ScoringMode,

    /// Fitted model metadata, present once learned mode is reached
    pub model: Option<ModelInfo>,
}
