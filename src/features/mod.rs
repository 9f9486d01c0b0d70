//! Deterministic feature extraction from sections
//!
//! Converts each section into a fixed-shape numeric vector plus a set of
//! informational tags. Extraction is a pure function of the section text
//! and position: the same section always yields bit-identical values.
//! Entity features come from an optional analyzer and zero-fill when it is
//! absent or failing.

pub mod analyzer;
mod patterns;

pub use analyzer::{EntityAnalyzer, EntityCategory, EntityCounts, EntityMention};

use std::collections::BTreeSet;
use std::sync::Arc;

use tracing::warn;

use crate::config::ExtractorConfig;
use crate::types::{FeatureSlot, FeatureVector, Section, SectionTag, FEATURE_SLOT_COUNT};

use patterns::{sentence_count, table_line_count, FeaturePatterns};

/// Extracts feature vectors and tags from sections
pub struct FeatureExtractor {
    config: ExtractorConfig,
    analyzer: Option<Arc<dyn EntityAnalyzer>>,
}

impl FeatureExtractor {
    /// Create an extractor without entity analysis
    pub fn new(config: ExtractorConfig) -> Self {
        Self {
            config,
            analyzer: None,
        }
    }

    /// Attach an entity analyzer
    pub fn with_analyzer(mut self, analyzer: Arc<dyn EntityAnalyzer>) -> Self {
        self.analyzer = Some(analyzer);
        self
    }

    /// Extract the feature vector for one section
    ///
    /// `total_sections` is the number of sections in the document, used for
    /// the normalized position slot. Never fails: entity analysis problems
    /// degrade to zero-filled entity slots.
    pub fn extract(&self, section: &Section, total_sections: usize) -> FeatureVector {
        let content = section.body.as_str();

        let char_count = content.chars().count();
        let word_count = FeaturePatterns::word().find_iter(content).count();
        let sentences = sentence_count(content);
        let digit_chars = content.chars().filter(|c| c.is_ascii_digit()).count();
        let alnum_chars = content.chars().filter(|c| c.is_alphanumeric()).count();

        let digit_token_count = FeaturePatterns::number_token().find_iter(content).count();
        let currency_count = FeaturePatterns::currency().find_iter(content).count();
        let percent_count = FeaturePatterns::percentage().find_iter(content).count();
        let date_count = FeaturePatterns::date().find_iter(content).count();
        let email_count = FeaturePatterns::email().find_iter(content).count();
        let url_count = FeaturePatterns::url().find_iter(content).count();
        let phone_count = FeaturePatterns::phone().find_iter(content).count();
        let bullet_count = FeaturePatterns::bullet_item().find_iter(content).count();
        let numbered_item_count = FeaturePatterns::numbered_item().find_iter(content).count();
        let table_rows = table_line_count(content);

        let entities = self.entity_counts(content);

        let mut values = [0.0f32; FEATURE_SLOT_COUNT];
        values[FeatureSlot::WordCount.index()] = word_count as f32;
        values[FeatureSlot::SentenceCount.index()] = sentences as f32;
        values[FeatureSlot::CharDensity.index()] = ratio(alnum_chars, char_count);
        values[FeatureSlot::DigitTokenCount.index()] = digit_token_count as f32;
        values[FeatureSlot::DigitRatio.index()] = ratio(digit_chars, char_count);
        values[FeatureSlot::CurrencyCount.index()] = currency_count as f32;
        values[FeatureSlot::PercentCount.index()] = percent_count as f32;
        values[FeatureSlot::DateCount.index()] = date_count as f32;
        values[FeatureSlot::PersonCount.index()] = entities.person as f32;
        values[FeatureSlot::OrgCount.index()] = entities.organization as f32;
        values[FeatureSlot::LocationCount.index()] = entities.location as f32;
        values[FeatureSlot::DateEntityCount.index()] = entities.date as f32;
        values[FeatureSlot::BulletCount.index()] = bullet_count as f32;
        values[FeatureSlot::NumberedItemCount.index()] = numbered_item_count as f32;
        values[FeatureSlot::TableRowCount.index()] = table_rows as f32;
        values[FeatureSlot::EmailCount.index()] = email_count as f32;
        values[FeatureSlot::UrlCount.index()] = url_count as f32;
        values[FeatureSlot::PhoneCount.index()] = phone_count as f32;
        values[FeatureSlot::AvgWordLen.index()] = char_count as f32 / word_count.max(1) as f32;
        values[FeatureSlot::AvgSentenceLen.index()] =
            word_count as f32 / sentences.max(1) as f32;
        values[FeatureSlot::PositionRatio.index()] =
            section.position_index as f32 / total_sections.saturating_sub(1).max(1) as f32;
        values[FeatureSlot::TitleLenRatio.index()] =
            (section.title.chars().count() as f32 / 100.0).min(1.0);

        let tags = derive_tags(
            digit_token_count,
            table_rows,
            date_count,
            currency_count,
            bullet_count,
            numbered_item_count,
            email_count,
            phone_count,
            &entities,
        );

        FeatureVector::new(section.id, values, tags)
    }

    /// Run the entity analyzer over capped section text, zero-filling on
    /// absence or failure
    fn entity_counts(&self, content: &str) -> EntityCounts {
        let analyzer = match &self.analyzer {
            Some(analyzer) => analyzer,
            None => return EntityCounts::default(),
        };
        let capped = truncate_at_boundary(content, self.config.analyzer_text_cap);
        match analyzer.analyze(capped) {
            Ok(mentions) => EntityCounts::tally(&mentions),
            Err(e) => {
                warn!("Entity analysis unavailable, zero-filling entity features: {}", e);
                EntityCounts::default()
            }
        }
    }
}

fn ratio(part: usize, whole: usize) -> f32 {
    part as f32 / whole.max(1) as f32
}

/// Truncate to at most `max_bytes`, backing up to a char boundary
fn truncate_at_boundary(text: &str, max_bytes: usize) -> &str {
    if text.len() <= max_bytes {
        return text;
    }
    let mut end = max_bytes;
    while !text.is_char_boundary(end) {
        end -= 1;
    }
    &text[..end]
}

#[allow(clippy::too_many_arguments)]
fn derive_tags(
    digit_token_count: usize,
    table_rows: usize,
    date_count: usize,
    currency_count: usize,
    bullet_count: usize,
    numbered_item_count: usize,
    email_count: usize,
    phone_count: usize,
    entities: &EntityCounts,
) -> BTreeSet<SectionTag> {
    let mut tags = BTreeSet::new();
    if digit_token_count > 5 {
        tags.insert(SectionTag::Numbers);
    }
    if table_rows > 0 {
        tags.insert(SectionTag::Table);
    }
    if date_count > 0 || entities.date > 0 {
        tags.insert(SectionTag::Dates);
    }
    if currency_count > 0 {
        tags.insert(SectionTag::Financial);
    }
    if bullet_count > 0 || numbered_item_count > 0 {
        tags.insert(SectionTag::List);
    }
    if entities.person > 0 || entities.organization > 0 {
        tags.insert(SectionTag::Entities);
    }
    if email_count > 0 || phone_count > 0 {
        tags.insert(SectionTag::ContactInfo);
    }
    tags
}
