//! Motor-intent labels and cycle decisions

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Numeric class label as produced by the classifier
pub type Label = i64;

/// Mapping from numeric label to human readable intent state
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LabelMap {
    states: BTreeMap<Label, String>,
}

impl LabelMap {
    /// Build from (label, state) pairs
    pub fn new<I, S>(entries: I) -> Self
    where
        I: IntoIterator<Item = (Label, S)>,
        S: Into<String>,
    {
        Self {
            states: entries
                .into_iter()
                .map(|(label, state)| (label, state.into()))
                .collect(),
        }
    }

    /// Four-state mapping used by the wheelchair firmware
    pub fn four_class() -> Self {
        Self::new([(0, "backward"), (1, "left"), (2, "right"), (3, "forward")])
    }

    /// Three-state mapping without a backward class
    pub fn three_class() -> Self {
        Self::new([(0, "forward"), (1, "left"), (2, "right")])
    }

    /// State name for a label
    pub fn state(&self, label: Label) -> Option<&str> {
        self.states.get(&label).map(String::as_str)
    }

    /// Label for a state name (case-insensitive)
    pub fn label_for(&self, state: &str) -> Option<Label> {
        self.states
            .iter()
            .find(|(_, name)| name.eq_ignore_ascii_case(state))
            .map(|(label, _)| *label)
    }

    pub fn len(&self) -> usize {
        self.states.len()
    }

    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }

    /// Entries in ascending label order
    pub fn iter(&self) -> impl Iterator<Item = (Label, &str)> {
        self.states.iter().map(|(label, state)| (*label, state.as_str()))
    }
}

impl Default for LabelMap {
    fn default() -> Self {
        Self::four_class()
    }
}

/// What gets written back to the link for a decision
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DecisionEncoding {
    /// Decimal label code, e.g. `2`
    #[default]
    Code,
    /// State name, e.g. `right`
    Name,
}

/// The single decision reduced from one cycle's predictions
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Decision {
    /// Winning label
    pub label: Label,
    /// State name of the winning label
    pub state: String,
    /// Windows that voted for the winning label
    pub votes: usize,
    /// Windows that voted in total
    pub total: usize,
}

impl Decision {
    /// Token to transmit for this decision
    pub fn encode(&self, encoding: DecisionEncoding) -> String {
        match encoding {
            DecisionEncoding::Code => self.label.to_string(),
            DecisionEncoding::Name => self.state.clone(),
        }
    }

    /// Fraction of windows agreeing with the decision
    pub fn agreement(&self) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            self.votes as f64 / self.total as f64
        }
    }
}

impl fmt::Display for Decision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({}) {}/{} windows", self.state, self.label, self.votes, self.total)
    }
}
