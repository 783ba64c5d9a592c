//! Pre-fitted multiclass linear classifier loaded from JSON

use anyhow::{Context, Result};
use intent_core::{config_error, IntentError, IntentResult, Label};
use intent_processing::{Classifier, FeatureTable};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Per-column centering and scaling applied before scoring
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Standardization {
    pub means: Vec<f64>,
    pub scales: Vec<f64>,
}

/// Model file layout
///
/// One weight vector and intercept per class; `weights[c][i]` multiplies
/// column `columns[i]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinearModel {
    #[serde(default)]
    pub name: Option<String>,
    pub columns: Vec<String>,
    pub classes: Vec<Label>,
    pub weights: Vec<Vec<f64>>,
    pub intercepts: Vec<f64>,
    #[serde(default)]
    pub standardization: Option<Standardization>,
}

impl LinearModel {
    pub fn validate(&self) -> IntentResult<()> {
        if self.columns.is_empty() {
            return Err(config_error!("model declares no input columns"));
        }
        if self.classes.is_empty() {
            return Err(config_error!("model declares no classes"));
        }
        if self.weights.len() != self.classes.len() || self.intercepts.len() != self.classes.len() {
            return Err(config_error!(
                "model has {} classes but {} weight rows and {} intercepts",
                self.classes.len(),
                self.weights.len(),
                self.intercepts.len()
            ));
        }
        if let Some(row) = self.weights.iter().find(|row| row.len() != self.columns.len()) {
            return Err(config_error!(
                "weight row of length {} for {} columns",
                row.len(),
                self.columns.len()
            ));
        }
        if let Some(standardization) = &self.standardization {
            if standardization.means.len() != self.columns.len()
                || standardization.scales.len() != self.columns.len()
            {
                return Err(config_error!("standardization does not match the column count"));
            }
            if standardization.scales.iter().any(|&s| s == 0.0 || !s.is_finite()) {
                return Err(config_error!("standardization scales must be finite and non-zero"));
            }
        }
        Ok(())
    }
}

/// Linear classifier scoring each row and taking the arg-max class
#[derive(Debug, Clone)]
pub struct LinearClassifier {
    model: LinearModel,
    name: String,
}

impl LinearClassifier {
    pub fn new(model: LinearModel) -> IntentResult<Self> {
        model.validate()?;
        let name = model
            .name
            .clone()
            .unwrap_or_else(|| format!("linear-{}x{}", model.classes.len(), model.columns.len()));
        Ok(Self { model, name })
    }

    pub fn from_json(json: &str) -> IntentResult<Self> {
        let model: LinearModel = serde_json::from_str(json)
            .map_err(|e| config_error!("failed to parse model: {}", e))?;
        Self::new(model)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path)
            .with_context(|| format!("reading model {}", path.display()))?;
        Self::from_json(&json).with_context(|| format!("loading model {}", path.display()))
    }

    pub fn model(&self) -> &LinearModel {
        &self.model
    }

    /// Class scores for one row of model inputs, in model column order
    pub fn scores(&self, inputs: &[f64]) -> Vec<f64> {
        let standardized: Vec<f64> = match &self.model.standardization {
            Some(s) => inputs
                .iter()
                .zip(s.means.iter().zip(&s.scales))
                .map(|(x, (mean, scale))| (x - mean) / scale)
                .collect(),
            None => inputs.to_vec(),
        };

        self.model
            .weights
            .iter()
            .zip(&self.model.intercepts)
            .map(|(weights, intercept)| {
                intercept + weights.iter().zip(&standardized).map(|(w, x)| w * x).sum::<f64>()
            })
            .collect()
    }

    fn classify(&self, inputs: &[f64]) -> Label {
        let scores = self.scores(inputs);
        let mut best = 0;
        for (i, score) in scores.iter().enumerate() {
            // First class wins ties
            if *score > scores[best] {
                best = i;
            }
        }
        self.model.classes[best]
    }
}

impl Classifier for LinearClassifier {
    fn predict(&self, table: &FeatureTable) -> IntentResult<Vec<Label>> {
        let mut indices = Vec::with_capacity(self.model.columns.len());
        let mut missing = Vec::new();
        for column in &self.model.columns {
            match table.column_index(column) {
                Some(index) => indices.push(index),
                None => missing.push(column.clone()),
            }
        }
        if !missing.is_empty() {
            return Err(IntentError::SchemaMismatch { missing });
        }

        Ok(table
            .rows()
            .iter()
            .map(|row| {
                let inputs: Vec<f64> = indices.iter().map(|&i| row[i]).collect();
                self.classify(&inputs)
            })
            .collect())
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn expected_columns(&self) -> Option<&[String]> {
        Some(&self.model.columns)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const MODEL: &str = r#"{
        "name": "alpha-vs-beta",
        "columns": ["Alpha Power", "Beta Power"],
        "classes": [1, 3],
        "weights": [[1.0, -1.0], [-1.0, 1.0]],
        "intercepts": [0.0, 0.0]
    }"#;

    fn table(rows: &[[f64; 3]]) -> FeatureTable {
        let mut table = FeatureTable::new(vec![
            "Beta Power".to_string(),
            "Mean".to_string(),
            "Alpha Power".to_string(),
        ]);
        for row in rows {
            table.push_row(row.to_vec()).unwrap();
        }
        table
    }

    #[test]
    fn test_predict_by_column_name() {
        let classifier = LinearClassifier::from_json(MODEL).unwrap();
        let labels = classifier
            .predict(&table(&[[10.0, 0.0, 50.0], [80.0, 0.0, 5.0]]))
            .unwrap();
        assert_eq!(labels, vec![1, 3]);
        assert_eq!(classifier.name(), "alpha-vs-beta");
        assert_eq!(classifier.expected_columns().map(|c| c.len()), Some(2));
    }

    #[test]
    fn test_ties_go_to_first_class() {
        let classifier = LinearClassifier::from_json(MODEL).unwrap();
        assert_eq!(classifier.predict(&table(&[[7.0, 1.0, 7.0]])).unwrap(), vec![1]);
    }

    #[test]
    fn test_standardization() {
        let model = LinearModel {
            name: None,
            columns: vec!["Mean".to_string()],
            classes: vec![0, 2],
            weights: vec![vec![-1.0], vec![1.0]],
            intercepts: vec![0.0, 0.0],
            standardization: Some(Standardization {
                means: vec![100.0],
                scales: vec![10.0],
            }),
        };
        let classifier = LinearClassifier::new(model).unwrap();
        assert_eq!(classifier.scores(&[120.0]), vec![-2.0, 2.0]);
        assert_eq!(classifier.name(), "linear-2x1");

        let labels = classifier
            .predict(&table(&[[0.0, 90.0, 0.0], [0.0, 110.0, 0.0]]))
            .unwrap();
        assert_eq!(labels, vec![0, 2]);
    }

    #[test]
    fn test_missing_columns() {
        let classifier = LinearClassifier::from_json(MODEL).unwrap();
        let mut narrow = FeatureTable::new(vec!["Alpha Power".to_string()]);
        narrow.push_row(vec![1.0]).unwrap();

        let err = classifier.predict(&narrow).unwrap_err();
        assert_eq!(
            err,
            IntentError::SchemaMismatch {
                missing: vec!["Beta Power".to_string()]
            }
        );
    }

    #[test]
    fn test_invalid_models() {
        let short_row = r#"{"columns": ["a", "b"], "classes": [0], "weights": [[1.0]], "intercepts": [0.0]}"#;
        assert!(LinearClassifier::from_json(short_row).is_err());

        let no_intercepts = r#"{"columns": ["a"], "classes": [0, 1], "weights": [[1.0], [2.0]], "intercepts": []}"#;
        assert!(LinearClassifier::from_json(no_intercepts).is_err());

        let zero_scale = r#"{"columns": ["a"], "classes": [0], "weights": [[1.0]], "intercepts": [0.0],
            "standardization": {"means": [0.0], "scales": [0.0]}}"#;
        assert!(LinearClassifier::from_json(zero_scale).is_err());

        assert!(LinearClassifier::from_json("[]").is_err());
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(MODEL.as_bytes()).unwrap();

        let classifier = LinearClassifier::load(file.path()).unwrap();
        assert_eq!(classifier.model().classes, vec![1, 3]);

        let err = LinearClassifier::load("/nonexistent/model.json").unwrap_err();
        assert!(err.to_string().contains("reading model"));
    }
}
