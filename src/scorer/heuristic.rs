//! Rule-based relevance scoring
//!
//! The zero-training scoring path: a weighted sum of normalized feature
//! signals, damped for boilerplate-length sections and boosted when several
//! independent content indicators co-occur. Always produces a score in
//! [0.0, 1.0] and never fails on a well-formed vector.

use crate::config::ScorerConfig;
use crate::types::{FeatureSlot, FeatureVector};

/// Damping applied to sections below the minimum content length
const SHORT_SECTION_DAMPING: f32 = 0.3;

/// Boost applied when three or more content indicators co-occur
const MULTI_INDICATOR_BOOST: f32 = 1.2;

/// Count above which a count signal saturates
const COUNT_SATURATION: f32 = 5.0;

/// Word count at which the length signal saturates
const WORD_COUNT_SATURATION: f32 = 200.0;

/// Weights applied to each normalized feature signal
///
/// The weights are tuned so that a section rich in tables, figures, and
/// named entities lands well above a prose-only section of the same length.
#[derive(Debug, Clone)]
pub struct HeuristicWeights {
    pub word_count: f32,
    pub digit_ratio: f32,
    pub currency: f32,
    pub percentage: f32,
    pub number_tokens: f32,
    pub dates: f32,
    pub entity_total: f32,
    pub persons: f32,
    pub organizations: f32,
    pub locations: f32,
    pub table: f32,
    pub bullets: f32,
    pub numbered_items: f32,
    pub char_density: f32,
}

impl Default for HeuristicWeights {
    fn default() -> Self {
        Self {
            word_count: 0.05,
            digit_ratio: 0.15,
            currency: 0.10,
            percentage: 0.08,
            number_tokens: 0.10,
            dates: 0.08,
            entity_total: 0.12,
            persons: 0.05,
            organizations: 0.05,
            locations: 0.03,
            table: 0.15,
            bullets: 0.08,
            numbered_items: 0.08,
            char_density: 0.05,
        }
    }
}

/// Scores feature vectors without any training data
#[derive(Debug, Clone)]
pub struct HeuristicScorer {
    config: ScorerConfig,
    weights: HeuristicWeights,
}

impl HeuristicScorer {
    pub fn new(config: ScorerConfig) -> Self {
        Self {
            config,
            weights: HeuristicWeights::default(),
        }
    }

    /// Score a feature vector, clamped to [0.0, 1.0]
    pub fn score(&self, features: &FeatureVector) -> f32 {
        let w = &self.weights;
        let entity_total = features.get(FeatureSlot::PersonCount)
            + features.get(FeatureSlot::OrgCount)
            + features.get(FeatureSlot::LocationCount)
            + features.get(FeatureSlot::DateEntityCount);

        let mut score = 0.0;
        score += length_signal(features.get(FeatureSlot::WordCount)) * w.word_count;
        score += (features.get(FeatureSlot::DigitRatio) * 5.0).min(1.0) * w.digit_ratio;
        score += count_signal(features.get(FeatureSlot::CurrencyCount)) * w.currency;
        score += count_signal(features.get(FeatureSlot::PercentCount)) * w.percentage;
        score += count_signal(features.get(FeatureSlot::DigitTokenCount)) * w.number_tokens;
        score += count_signal(features.get(FeatureSlot::DateCount)) * w.dates;
        score += count_signal(entity_total) * w.entity_total;
        score += count_signal(features.get(FeatureSlot::PersonCount)) * w.persons;
        score += count_signal(features.get(FeatureSlot::OrgCount)) * w.organizations;
        score += count_signal(features.get(FeatureSlot::LocationCount)) * w.locations;
        score += presence_signal(features.get(FeatureSlot::TableRowCount)) * w.table;
        score += count_signal(features.get(FeatureSlot::BulletCount)) * w.bullets;
        score += count_signal(features.get(FeatureSlot::NumberedItemCount)) * w.numbered_items;
        score += density_signal(features.get(FeatureSlot::CharDensity)) * w.char_density;

        // Boilerplate-length sections are damped hard
        if features.get(FeatureSlot::WordCount) < self.config.min_content_words as f32 {
            score *= SHORT_SECTION_DAMPING;
        }

        if self.indicator_count(features, entity_total) >= 3 {
            score *= MULTI_INDICATOR_BOOST;
        }

        score.clamp(0.0, 1.0)
    }

    /// How many independent content indicators are present
    fn indicator_count(&self, features: &FeatureVector, entity_total: f32) -> usize {
        [
            features.get(FeatureSlot::TableRowCount) > 0.0,
            features.get(FeatureSlot::DigitTokenCount) > 3.0,
            entity_total > 2.0,
            features.get(FeatureSlot::BulletCount) > 0.0,
            features.get(FeatureSlot::DateCount) > 0.0,
        ]
        .iter()
        .filter(|&&present| present)
        .count()
    }
}

/// Word count saturating at 200 words
fn length_signal(word_count: f32) -> f32 {
    (word_count / WORD_COUNT_SATURATION).min(1.0)
}

/// Count saturating at 5 occurrences
fn count_signal(count: f32) -> f32 {
    (count / COUNT_SATURATION).min(1.0)
}

/// 1.0 when present at all, else 0.0
fn presence_signal(count: f32) -> f32 {
    if count > 0.0 {
        1.0
    } else {
        0.0
    }
}

/// Full signal inside the 0.6..=0.9 band, falling off linearly outside it
fn density_signal(density: f32) -> f32 {
    if (0.6..=0.9).contains(&density) {
        1.0
    } else {
        (1.0 - (density - 0.75).abs() * 2.0).max(0.0)
    }
}
