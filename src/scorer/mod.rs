//! Relevance scoring
//!
//! Scoring starts on the rule-based path and upgrades to a trained model
//! the moment one is installed. The switch is one-way at the scorer level:
//! nothing ever removes an installed model, later installs only replace it.
//! Readers take an `Arc` snapshot, so scoring in flight is never torn by a
//! concurrent model swap.

mod forest;
mod heuristic;

pub use forest::{FeatureScaler, RandomForest, TrainedModel};
pub use heuristic::{HeuristicScorer, HeuristicWeights};

use std::sync::{Arc, PoisonError, RwLock};

use tracing::{info, warn};

use crate::config::ScorerConfig;
use crate::error::{PericopeError, Result};
use crate::types::{FeatureVector, ModeReport, ModelInfo, ScoringMode, FEATURE_SLOT_COUNT};

/// Scores feature vectors, heuristically until a model is installed
#[derive(Debug)]
pub struct RelevanceScorer {
    heuristic: HeuristicScorer,
    model: RwLock<Option<Arc<TrainedModel>>>,
}

impl RelevanceScorer {
    pub fn new(config: ScorerConfig) -> Self {
        Self {
            heuristic: HeuristicScorer::new(config),
            model: RwLock::new(None),
        }
    }

    /// Score one vector, reporting which path produced the score
    ///
    /// Never fails. A vector whose width differs from the installed model's
    /// cannot take the learned path; that call is scored heuristically and
    /// logged. The heuristic reads absent slots as zero, so it accepts any
    /// width.
    pub fn score(&self, features: &FeatureVector) -> (f32, ScoringMode) {
        match self.snapshot() {
            Some(model) if features.len() == model.feature_len() => {
                (model.predict(&features.values), ScoringMode::Learned)
            }
            Some(model) => {
                warn!(
                    expected = model.feature_len(),
                    actual = features.len(),
                    section = %features.section_id,
                    "Feature vector width mismatch, scoring heuristically"
                );
                (self.heuristic.score(features), ScoringMode::Heuristic)
            }
            None => (self.heuristic.score(features), ScoringMode::Heuristic),
        }
    }

    pub fn mode(&self) -> ScoringMode {
        if self.snapshot().is_some() {
            ScoringMode::Learned
        } else {
            ScoringMode::Heuristic
        }
    }

    /// Mode and model metadata from a single consistent snapshot
    pub fn mode_report(&self) -> ModeReport {
        match self.snapshot() {
            Some(model) => ModeReport {
                mode: ScoringMode::Learned,
                model: Some(model.info()),
            },
            None => ModeReport {
                mode: ScoringMode::Heuristic,
                model: None,
            },
        }
    }

    pub fn model_info(&self) -> Option<ModelInfo> {
        self.snapshot().map(|model| model.info())
    }

    /// The installed model, if any, for persistence
    pub fn current_model(&self) -> Option<Arc<TrainedModel>> {
        self.snapshot()
    }

    /// Swap in a model, rejecting one fitted over a different vector width
    pub fn install_model(&self, model: TrainedModel) -> Result<()> {
        if model.feature_len() != FEATURE_SLOT_COUNT {
            return Err(PericopeError::FeatureShape {
                expected: FEATURE_SLOT_COUNT,
                actual: model.feature_len(),
            });
        }
        let version = model.version();
        let mut guard = self.model.write().unwrap_or_else(PoisonError::into_inner);
        *guard = Some(Arc::new(model));
        drop(guard);
        info!(version, "Installed relevance model");
        Ok(())
    }

    fn snapshot(&self) -> Option<Arc<TrainedModel>> {
        self.model
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::TrainingConfig;
    use crate::types::SectionId;
    use std::collections::BTreeSet;
    use std::thread;

    fn vector_with_lead(lead: f32) -> FeatureVector {
        let mut values = [0.0f32; FEATURE_SLOT_COUNT];
        values[0] = lead;
        values[1] = lead * 0.5;
        FeatureVector::new(SectionId(1), values, BTreeSet::new())
    }

    fn fitted_model(version: u32) -> TrainedModel {
        let mut samples = Vec::new();
        for i in 0..6 {
            let mut row = vec![0.0; FEATURE_SLOT_COUNT];
            row[0] = 10.0 + i as f32 * 0.2;
            row[1] = row[0] * 0.5;
            samples.push((row, true));
            let mut row = vec![0.0; FEATURE_SLOT_COUNT];
            row[0] = i as f32 * 0.1;
            row[1] = row[0] * 0.5;
            samples.push((row, false));
        }
        TrainedModel::fit(&samples, version, &TrainingConfig::default()).unwrap()
    }

    #[test]
    fn test_starts_on_heuristic_path() {
        let scorer = RelevanceScorer::new(ScorerConfig::default());
        assert_eq!(scorer.mode(), ScoringMode::Heuristic);
        assert!(scorer.model_info().is_none());

        let (score, mode) = scorer.score(&vector_with_lead(1.0));
        assert_eq!(mode, ScoringMode::Heuristic);
        assert!((0.0..=1.0).contains(&score));
    }

    #[test]
    fn test_installed_model_takes_over() {
        let scorer = RelevanceScorer::new(ScorerConfig::default());
        scorer.install_model(fitted_model(1)).unwrap();

        assert_eq!(scorer.mode(), ScoringMode::Learned);
        let (score, mode) = scorer.score(&vector_with_lead(11.0));
        assert_eq!(mode, ScoringMode::Learned);
        assert!(score > 0.5);
    }

    #[test]
    fn test_reinstall_replaces_model() {
        let scorer = RelevanceScorer::new(ScorerConfig::default());
        scorer.install_model(fitted_model(1)).unwrap();
        scorer.install_model(fitted_model(2)).unwrap();

        let report = scorer.mode_report();
        assert_eq!(report.mode, ScoringMode::Learned);
        assert_eq!(report.model.unwrap().version, 2);
    }

    #[test]
    fn test_mismatched_vector_falls_back_to_heuristic() {
        let scorer = RelevanceScorer::new(ScorerConfig::default());
        scorer.install_model(fitted_model(1)).unwrap();

        let short = FeatureVector {
            section_id: SectionId(1),
            values: vec![0.0; 3],
            tags: BTreeSet::new(),
        };
        let (score, mode) = scorer.score(&short);
        assert_eq!(mode, ScoringMode::Heuristic);
        assert!((0.0..=1.0).contains(&score));

        // Only that call degrades; well-shaped vectors still use the model
        let (_, mode) = scorer.score(&vector_with_lead(11.0));
        assert_eq!(mode, ScoringMode::Learned);
        assert_eq!(scorer.mode(), ScoringMode::Learned);
    }

    #[test]
    fn test_rejects_model_with_foreign_width() {
        let json = serde_json::json!({
            "version": 1,
            "trained_at": "2024-01-01T00:00:00Z",
            "sample_count": 2,
            "accuracy": null,
            "scaler": { "means": [0.0, 0.0], "scales": [1.0, 1.0] },
            "forest": {
                "trees": [ { "root": { "Leaf": { "positive_fraction": 0.5 } } } ],
                "feature_len": 2
            }
        });
        let model: TrainedModel = serde_json::from_value(json).unwrap();

        let scorer = RelevanceScorer::new(ScorerConfig::default());
        let err = scorer.install_model(model).unwrap_err();
        assert!(matches!(err, PericopeError::FeatureShape { actual: 2, .. }));
    }

    #[test]
    fn test_concurrent_scoring_survives_model_swap() {
        let scorer = Arc::new(RelevanceScorer::new(ScorerConfig::default()));

        let readers: Vec<_> = (0..4)
            .map(|reader| {
                let scorer = Arc::clone(&scorer);
                thread::spawn(move || {
                    for i in 0..50 {
                        let vector = vector_with_lead((reader * 50 + i) as f32 * 0.1);
                        let (score, _) = scorer.score(&vector);
                        assert!((0.0..=1.0).contains(&score));
                    }
                })
            })
            .collect();

        scorer.install_model(fitted_model(1)).unwrap();

        for reader in readers {
            reader.join().unwrap();
        }
        assert_eq!(scorer.mode(), ScoringMode::Learned);
    }
}
