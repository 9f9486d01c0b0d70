//! Pericope - Adaptive Document Section Extraction
//!
//! A text processing core that turns raw document text into scored,
//! structured sections:
//! - Text normalization (line endings, exotic whitespace, control bytes)
//! - Structure-based segmentation with layered header detection
//! - Fixed-width feature vectors with content tags per section
//! - Relevance scoring that starts rule-based and learns from feedback
//! - Append-only feedback store driving automatic model retraining
//!
//! # Architecture
//!
//! The pipeline is organized as independent stages behind one facade:
//! - **Types**: Core data structures (Section, FeatureVector, DocumentResult)
//! - **Segmenter**: Header rules, visual breaks, short-section merging
//! - **Features**: Pattern counting plus a pluggable entity analyzer
//! - **Scorer**: Heuristic path with an upgrade to a trained forest
//! - **Engine**: Processing, re-scoring, feedback, import/export
//!
//! # Example
//!
//! ```ignore
//! use pericope::{ExtractionEngine, PericopeConfig};
//!
//! fn main() -> pericope::Result<()> {
//!     let engine = ExtractionEngine::new(PericopeConfig::default());
//!
//!     // Score a document's sections
//!     let result = engine.process(&raw_text, 0.5, None)?;
//!     for scored in result.relevant_sections() {
//!         println!("{}: {:.2}", scored.section.title, scored.relevance_score);
//!     }
//!
//!     // Teach the scorer; it retrains itself once enough judgments accrue
//!     let first = result.sections[0].section.id;
//!     engine.submit_feedback(result.document_id, first, true)?;
//!
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod engine;
pub mod error;
pub mod features;
pub mod feedback;
pub mod normalize;
pub mod scorer;
pub mod segmenter;
pub mod types;

// Re-export commonly used types
pub use config::{PericopeConfig, RetrainPolicy};
pub use engine::ExtractionEngine;
pub use error::{PericopeError, Result, TrainingError};
pub use features::{EntityAnalyzer, EntityCategory, EntityMention, FeatureExtractor};
pub use feedback::{FeedbackStore, TrainingController};
pub use normalize::normalize;
pub use scorer::{RelevanceScorer, TrainedModel};
pub use segmenter::Segmenter;
pub use types::{
    DocumentId, DocumentResult, FeatureSlot, FeatureVector, FeedbackRecord, ModeReport, ModelInfo,
    PageMap, ScoredSection, ScoringMode, Section, SectionId, SectionTag, FEATURE_SLOT_COUNT,
};
