//! Pluggable entity analysis capability
//!
//! Entity recognition is an optional collaborator supplied by the caller.
//! The feature extractor consumes this trait and degrades to zero-filled
//! entity slots when no analyzer is present or a call fails.

use std::ops::Range;

use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Category of a recognized entity mention
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityCategory {
    /// A named person
    Person,

    /// A company, agency, or institution
    Organization,

    /// A place or geopolitical entity
    Location,

    /// A date expression recognized as an entity
    Date,
}

impl std::fmt::Display for EntityCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EntityCategory::Person => write!(f, "person"),
            EntityCategory::Organization => write!(f, "organization"),
            EntityCategory::Location => write!(f, "location"),
            EntityCategory::Date => write!(f, "date"),
        }
    }
}

/// One entity mention found in section text
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntityMention {
    /// The mention text as it appears
    pub text: String,

    /// Assigned category
    pub category: EntityCategory,

    /// Byte span of the mention within the analyzed text
    pub span: Range<usize>,
}

/// Entity analysis capability consumed by the feature extractor
///
/// Implementations live outside this crate; any failure is treated as the
/// capability being unavailable for that call, never as a pipeline error.
pub trait EntityAnalyzer: Send + Sync {
    /// Recognize entity mentions in the given text
    fn analyze(&self, text: &str) -> Result<Vec<EntityMention>>;
}

/// Per-category totals derived from a list of mentions
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EntityCounts {
    pub person: usize,
    pub organization: usize,
    pub location: usize,
    pub date: usize,
}

impl EntityCounts {
    /// Tally mentions by category
    pub fn tally(mentions: &[EntityMention]) -> Self {
        let mut counts = Self::default();
        for mention in mentions {
            match mention.category {
                EntityCategory::Person => counts.person += 1,
                EntityCategory::Organization => counts.organization += 1,
                EntityCategory::Location => counts.location += 1,
                EntityCategory::Date => counts.date += 1,
            }
        }
        counts
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mention(text: &str, category: EntityCategory) -> EntityMention {
        EntityMention {
            text: text.to_string(),
            category,
            span: 0..text.len(),
        }
    }

    #[test]
    fn test_tally_counts_by_category() {
        let mentions = vec![
            mention("Acme Corp", EntityCategory::Organization),
            mention("Jane Doe", EntityCategory::Person),
            mention("Berlin", EntityCategory::Location),
            mention("John Roe", EntityCategory::Person),
            mention("March 2024", EntityCategory::Date),
        ];
        let counts = EntityCounts::tally(&mentions);
        assert_eq!(counts.person, 2);
        assert_eq!(counts.organization, 1);
        assert_eq!(counts.location, 1);
        assert_eq!(counts.date, 1);
    }

    #[test]
    fn test_category_serde_snake_case() {
        let json = serde_json::to_string(&EntityCategory::Organization).unwrap();
        assert_eq!(json, "\"organization\"");
    }
}
