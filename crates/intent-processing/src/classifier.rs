//! Classifier seam and the per-cycle decision gate

use crate::table::FeatureTable;
use intent_core::{config_error, Decision, IntentError, IntentResult, Label, LabelMap};
use std::collections::BTreeMap;
use tracing::debug;

/// Pre-trained model mapping feature rows to class labels
pub trait Classifier: Send {
    /// Predict one label per row of `table`
    fn predict(&self, table: &FeatureTable) -> IntentResult<Vec<Label>>;

    /// Identifier for logs
    fn name(&self) -> &str;

    /// Columns the model was fitted on, in order, if it declares them
    fn expected_columns(&self) -> Option<&[String]> {
        None
    }
}

impl<T: Classifier + ?Sized> Classifier for Box<T> {
    fn predict(&self, table: &FeatureTable) -> IntentResult<Vec<Label>> {
        (**self).predict(table)
    }

    fn name(&self) -> &str {
        (**self).name()
    }

    fn expected_columns(&self) -> Option<&[String]> {
        (**self).expected_columns()
    }
}

/// Most frequent label and its count; ties go to the lowest label
pub fn majority_vote(labels: &[Label]) -> Option<(Label, usize)> {
    let mut counts: BTreeMap<Label, usize> = BTreeMap::new();
    for &label in labels {
        *counts.entry(label).or_insert(0) += 1;
    }

    let mut winner: Option<(Label, usize)> = None;
    for (label, count) in counts {
        // Ascending iteration, so only a strictly higher count replaces
        if winner.map_or(true, |(_, best)| count > best) {
            winner = Some((label, count));
        }
    }
    winner
}

/// Reduces a cycle's feature rows to at most one decision
#[derive(Debug, Clone)]
pub struct ClassificationGate {
    labels: LabelMap,
    vote_window: Option<usize>,
}

impl ClassificationGate {
    /// `vote_window = Some(n)` classifies only the latest `n` rows
    pub fn new(labels: LabelMap, vote_window: Option<usize>) -> IntentResult<Self> {
        if vote_window == Some(0) {
            return Err(config_error!("vote window must cover at least one row"));
        }
        Ok(Self { labels, vote_window })
    }

    /// Classify the selected rows in one batch and vote
    pub fn decide(
        &self,
        table: &FeatureTable,
        classifier: &dyn Classifier,
    ) -> IntentResult<Option<Decision>> {
        let selected = match self.vote_window {
            Some(n) => table.tail(n),
            None => table.clone(),
        };
        if selected.is_empty() {
            return Ok(None);
        }

        let predictions = classifier.predict(&selected)?;
        if predictions.len() != selected.len() {
            return Err(IntentError::ClassifierError {
                reason: format!(
                    "{} returned {} labels for {} rows",
                    classifier.name(),
                    predictions.len(),
                    selected.len()
                ),
            });
        }
        debug!(classifier = classifier.name(), ?predictions, "window predictions");

        let Some((label, votes)) = majority_vote(&predictions) else {
            return Ok(None);
        };
        let state = self
            .labels
            .state(label)
            .ok_or(IntentError::UnknownLabel { label })?;

        Ok(Some(Decision {
            label,
            state: state.to_string(),
            votes,
            total: predictions.len(),
        }))
    }
}
