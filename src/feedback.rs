//! Feedback collection and retraining control
//!
//! User judgments accumulate in an append-only store; nothing is ever
//! consumed or cleared by training, so every refit sees the full history.
//! The controller watches the record count and refits whenever the
//! configured boundary is crossed, installing the new model on success and
//! leaving the current scoring path untouched on failure.

use std::collections::HashSet;
use std::sync::{Mutex, PoisonError};

use tracing::{debug, info, warn};

use crate::config::{RetrainPolicy, TrainingConfig};
use crate::scorer::{RelevanceScorer, TrainedModel};
use crate::types::{DocumentId, FeedbackRecord, ModelInfo, SectionId};

/// Append-only log of user relevance judgments
///
/// A record is identified by its (document, section, label) triple;
/// resubmitting the same triple is a no-op, while an opposite label for
/// the same section is accepted as new signal.
#[derive(Debug, Default)]
pub struct FeedbackStore {
    inner: Mutex<StoreInner>,
}

#[derive(Debug, Default)]
struct StoreInner {
    records: Vec<FeedbackRecord>,
    seen: HashSet<(DocumentId, SectionId, bool)>,
}

impl FeedbackStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a record, returning false for an exact duplicate
    pub fn append(&self, record: FeedbackRecord) -> bool {
        let mut inner = self.lock();
        if !inner.seen.insert(record.dedupe_key()) {
            debug!(
                document = %record.document_id,
                section = %record.section_id,
                "Duplicate feedback ignored"
            );
            return false;
        }
        inner.records.push(record);
        true
    }

    /// Append many records at once, returning how many were new
    pub fn import(&self, records: Vec<FeedbackRecord>) -> usize {
        let mut inner = self.lock();
        let mut added = 0;
        for record in records {
            if inner.seen.insert(record.dedupe_key()) {
                inner.records.push(record);
                added += 1;
            }
        }
        added
    }

    pub fn len(&self) -> usize {
        self.lock().records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().records.is_empty()
    }

    /// Snapshot of all records, in submission order
    pub fn export(&self) -> Vec<FeedbackRecord> {
        self.lock().records.clone()
    }

    /// Training rows: one (values, label) pair per record
    pub fn samples(&self) -> Vec<(Vec<f32>, bool)> {
        self.lock()
            .records
            .iter()
            .map(|record| (record.feature_vector.values.clone(), record.is_relevant))
            .collect()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, StoreInner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Decides when the feedback store has grown enough to refit
///
/// Tracks the store length at the last successful fit, so a failed
/// attempt (for example a single-class store) is naturally retried on
/// the next accepted record.
#[derive(Debug)]
pub struct TrainingController {
    config: TrainingConfig,
    state: Mutex<ControllerState>,
}

#[derive(Debug)]
struct ControllerState {
    /// Store length when a model was last installed successfully
    last_trained_len: usize,
    /// Version the next successful fit will carry
    next_version: u32,
}

impl TrainingController {
    pub fn new(config: TrainingConfig) -> Self {
        Self {
            config,
            state: Mutex::new(ControllerState {
                last_trained_len: 0,
                next_version: 1,
            }),
        }
    }

    /// Refit and install a model if the store has crossed a boundary
    ///
    /// Training failures are contained here: the scorer keeps whatever
    /// path it was on and the boundary stays armed.
    pub fn maybe_retrain(
        &self,
        store: &FeedbackStore,
        scorer: &RelevanceScorer,
    ) -> Option<ModelInfo> {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        let count = store.len();
        if !self.due(&state, count) {
            return None;
        }

        let samples = store.samples();
        let model = match TrainedModel::fit(&samples, state.next_version, &self.config) {
            Ok(model) => model,
            Err(err) => {
                warn!(
                    feedback_count = count,
                    error = %err,
                    "Training attempt failed; keeping current scoring path"
                );
                return None;
            }
        };

        let info = model.info();
        if let Err(err) = scorer.install_model(model) {
            warn!(error = %err, "Fitted model was rejected at install");
            return None;
        }

        state.last_trained_len = count;
        state.next_version += 1;
        info!(
            version = info.version,
            samples = info.sample_count,
            accuracy = ?info.accuracy,
            "Relevance model retrained"
        );
        Some(info)
    }

    /// Keep version numbering ahead of an externally imported model
    pub fn observe_external_version(&self, version: u32) {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        state.next_version = state.next_version.max(version + 1);
    }

    fn due(&self, state: &ControllerState, count: usize) -> bool {
        let threshold = self.config.retrain_threshold;
        if count < threshold {
            return false;
        }
        match self.config.policy {
            RetrainPolicy::Once => state.last_trained_len == 0,
            RetrainPolicy::EveryMultiple => {
                count / threshold > state.last_trained_len / threshold
            }
        }
    }
}
