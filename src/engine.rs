//! Document processing facade
//!
//! One entry point owning the whole pipeline: normalization, segmentation,
//! feature extraction, scoring, feedback, and retraining. Processed
//! documents are kept in an in-memory registry so sections can be re-scored
//! and judged later without re-running the text stages.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use tracing::info;

use crate::config::PericopeConfig;
use crate::error::{PericopeError, Result};
use crate::features::{EntityAnalyzer, FeatureExtractor};
use crate::feedback::{FeedbackStore, TrainingController};
use crate::normalize::normalize;
use crate::scorer::{RelevanceScorer, TrainedModel};
use crate::segmenter::Segmenter;
use crate::types::{
    DocumentId, DocumentResult, FeatureVector, FeedbackRecord, ModeReport, ModelInfo, PageMap,
    ScoredSection, Section, SectionId,
};

/// Everything retained about a processed document
#[derive(Debug, Clone)]
struct ProcessedDocument {
    sections: Vec<Section>,
    vectors: Vec<FeatureVector>,
}

/// The document processing pipeline behind a single facade
///
/// All methods take `&self`; the engine is safe to share across threads.
pub struct ExtractionEngine {
    config: PericopeConfig,
    segmenter: Segmenter,
    extractor: FeatureExtractor,
    scorer: RelevanceScorer,
    feedback: FeedbackStore,
    trainer: TrainingController,
    documents: Mutex<HashMap<DocumentId, ProcessedDocument>>,
}

impl ExtractionEngine {
    /// Build an engine without entity analysis
    pub fn new(config: PericopeConfig) -> Self {
        Self::build(config, None)
    }

    /// Build an engine with a pluggable entity analyzer
    pub fn with_analyzer(config: PericopeConfig, analyzer: Arc<dyn EntityAnalyzer>) -> Self {
        Self::build(config, Some(analyzer))
    }

    fn build(config: PericopeConfig, analyzer: Option<Arc<dyn EntityAnalyzer>>) -> Self {
        let segmenter = Segmenter::new(config.segmenter.clone());
        let mut extractor = FeatureExtractor::new(config.extractor.clone());
        if let Some(analyzer) = analyzer {
            extractor = extractor.with_analyzer(analyzer);
        }
        let scorer = RelevanceScorer::new(config.scorer.clone());
        let trainer = TrainingController::new(config.training.clone());

        Self {
            config,
            segmenter,
            extractor,
            scorer,
            feedback: FeedbackStore::new(),
            trainer,
            documents: Mutex::new(HashMap::new()),
        }
    }

    pub fn config(&self) -> &PericopeConfig {
        &self.config
    }

    /// Run the full pipeline over raw text
    ///
    /// Sections come back in document order with scores from whichever
    /// scoring path is currently active. The document is registered for
    /// later re-scoring and feedback.
    pub fn process(
        &self,
        raw_text: &str,
        threshold: f32,
        page_map: Option<&PageMap>,
    ) -> Result<DocumentResult> {
        validate_threshold(threshold)?;

        let document_id = DocumentId::new();
        let normalized = normalize(raw_text);
        let sections = self.segmenter.segment(&normalized, page_map);
        let total_sections = sections.len();

        let vectors: Vec<FeatureVector> = sections
            .iter()
            .map(|section| self.extractor.extract(section, total_sections))
            .collect();

        let scored = self.score_sections(&sections, &vectors);
        let relevant_count = count_relevant(&scored, threshold);

        {
            let mut documents = self.lock_documents();
            documents.insert(
                document_id,
                ProcessedDocument { sections, vectors },
            );
        }

        info!(
            document = %document_id,
            sections = total_sections,
            relevant = relevant_count,
            "Processed document"
        );

        Ok(DocumentResult {
            document_id,
            sections: scored,
            total_sections,
            relevant_count,
            threshold,
        })
    }

    /// Re-score a processed document against the current scoring path
    ///
    /// Useful after the scorer has upgraded to learned mode: the stored
    /// feature vectors are re-scored without touching the text stages.
    pub fn rescore(&self, document_id: DocumentId, threshold: f32) -> Result<DocumentResult> {
        validate_threshold(threshold)?;

        let document = {
            let documents = self.lock_documents();
            documents
                .get(&document_id)
                .cloned()
                .ok_or_else(|| PericopeError::DocumentNotFound(document_id.to_string()))?
        };

        let scored = self.score_sections(&document.sections, &document.vectors);
        let relevant_count = count_relevant(&scored, threshold);
        let total_sections = scored.len();

        Ok(DocumentResult {
            document_id,
            sections: scored,
            total_sections,
            relevant_count,
            threshold,
        })
    }

    /// Record a user judgment for one section of a processed document
    ///
    /// Returns false when the identical judgment was already recorded.
    /// Accepted feedback may trigger a retrain; training failures never
    /// surface here.
    pub fn submit_feedback(
        &self,
        document_id: DocumentId,
        section_id: SectionId,
        is_relevant: bool,
    ) -> Result<bool> {
        let vector = {
            let documents = self.lock_documents();
            let document = documents
                .get(&document_id)
                .ok_or_else(|| PericopeError::DocumentNotFound(document_id.to_string()))?;
            document
                .vectors
                .iter()
                .find(|vector| vector.section_id == section_id)
                .cloned()
                .ok_or_else(|| {
                    PericopeError::InvalidInput(format!(
                        "no section {section_id} in document {document_id}"
                    ))
                })?
        };

        let record = FeedbackRecord::new(document_id, section_id, vector, is_relevant);
        let accepted = self.feedback.append(record);
        if accepted {
            self.trainer.maybe_retrain(&self.feedback, &self.scorer);
        }
        Ok(accepted)
    }

    /// Active scoring mode plus model metadata when learned
    pub fn current_mode(&self) -> ModeReport {
        self.scorer.mode_report()
    }

    pub fn feedback_count(&self) -> usize {
        self.feedback.len()
    }

    /// Serialize the trained model for use in another engine
    pub fn export_model(&self) -> Result<String> {
        let model = self.scorer.current_model().ok_or_else(|| {
            PericopeError::CapabilityUnavailable("no trained model to export".to_string())
        })?;
        Ok(serde_json::to_string_pretty(model.as_ref())?)
    }

    /// Install a previously exported model, switching to learned mode
    pub fn import_model(&self, json: &str) -> Result<ModelInfo> {
        let model: TrainedModel = serde_json::from_str(json)?;
        let info = model.info();
        self.scorer.install_model(model)?;
        self.trainer.observe_external_version(info.version);
        info!(version = info.version, "Imported relevance model");
        Ok(info)
    }

    /// Serialize the full feedback history
    pub fn export_feedback(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(&self.feedback.export())?)
    }

    /// Merge previously exported feedback, skipping known records
    ///
    /// Returns how many records were new. Crossing the retrain boundary
    /// through an import triggers training just as submissions do.
    pub fn import_feedback(&self, json: &str) -> Result<usize> {
        let records: Vec<FeedbackRecord> = serde_json::from_str(json)?;
        let added = self.feedback.import(records);
        if added > 0 {
            self.trainer.maybe_retrain(&self.feedback, &self.scorer);
        }
        Ok(added)
    }

    fn score_sections(
        &self,
        sections: &[Section],
        vectors: &[FeatureVector],
    ) -> Vec<ScoredSection> {
        sections
            .iter()
            .zip(vectors.iter())
            .map(|(section, vector)| {
                let (relevance_score, scoring_mode) = self.scorer.score(vector);
                ScoredSection {
                    section: section.clone(),
                    feature_vector: vector.clone(),
                    relevance_score,
                    scoring_mode,
                }
            })
            .collect()
    }

    fn lock_documents(
        &self,
    ) -> std::sync::MutexGuard<'_, HashMap<DocumentId, ProcessedDocument>> {
        self.documents.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

fn validate_threshold(threshold: f32) -> Result<()> {
    if !(0.0..=1.0).contains(&threshold) {
        return Err(PericopeError::InvalidInput(format!(
            "relevance threshold must be within 0.0..=1.0, got {threshold}"
        )));
    }
    Ok(())
}

fn count_relevant(sections: &[ScoredSection], threshold: f32) -> usize {
    sections
        .iter()
        .filter(|scored| scored.relevance_score >= threshold)
        .count()
}
