//! Serialized model artifacts and the inference math they support.
//!
//! An artifact is a JSON file produced by an offline training run. The
//! `schema` tag distinguishes the two fitted estimator kinds this service
//! knows how to drive; everything else in the file is inference parameters
//! only. Artifacts are loaded once at startup and never mutated.

use std::{fs, path::Path};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::{error::PredictError, features::FeatureRow};

/// A loaded, fitted estimator, tagged by capability.
///
/// Resolved once at load time so request handling never re-inspects what
/// the underlying model can do.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "schema", rename_all = "snake_case")]
pub enum ModelHandle {
    /// Binary classifier; exposes a decision label and, unless the artifact
    /// says otherwise, a positive-class probability.
    Classifier(LinearClassifier),
    /// Regressor; exposes a single continuous prediction.
    Regressor(LinearRegressor),
}

impl ModelHandle {
    /// Load an artifact from a JSON file.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read model artifact: {}", path.display()))?;

        let handle: ModelHandle = serde_json::from_str(&contents)
            .with_context(|| format!("Failed to parse model artifact: {}", path.display()))?;

        Ok(handle)
    }

    pub fn kind(&self) -> &'static str {
        match self {
            ModelHandle::Classifier(_) => "classifier",
            ModelHandle::Regressor(_) => "regressor",
        }
    }

    /// Ordered feature columns the estimator was fitted on.
    pub fn feature_names(&self) -> &[String] {
        match self {
            ModelHandle::Classifier(clf) => &clf.feature_names,
            ModelHandle::Regressor(reg) => &reg.feature_names,
        }
    }
}

/// Scale the regression target was trained on.
///
/// `Log1p` means the stored coefficients predict `ln(1 + y)` and serving
/// must invert with `exp_m1`. The default is no transform; the training
/// pipeline decides and records it in the artifact, serving never guesses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TargetTransform {
    #[default]
    None,
    Log1p,
}

impl TargetTransform {
    /// Map a raw model output back to the original target scale.
    pub fn invert(self, raw: f64) -> f64 {
        match self {
            TargetTransform::None => raw,
            TargetTransform::Log1p => raw.exp_m1(),
        }
    }
}

/// A fitted logistic-regression classifier.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LinearClassifier {
    pub feature_names: Vec<String>,
    pub coefficients: Vec<f64>,
    pub intercept: f64,
    /// Whether the artifact supports calibrated probabilities. When false
    /// the model yields hard labels only, and callers map the label to a
    /// probability of exactly 1.0 or 0.0.
    #[serde(default = "default_true")]
    pub probability: bool,
}

fn default_true() -> bool {
    true
}

impl LinearClassifier {
    fn decision_value(&self, row: &FeatureRow) -> Result<f64, PredictError> {
        dot(&self.coefficients, row).map(|d| d + self.intercept)
    }

    /// Probability of the positive class.
    pub fn predict_proba(&self, row: &FeatureRow) -> Result<f64, PredictError> {
        self.decision_value(row).map(sigmoid)
    }

    /// Hard class label: 1 for the positive class, 0 otherwise.
    pub fn predict(&self, row: &FeatureRow) -> Result<u8, PredictError> {
        self.decision_value(row).map(|d| u8::from(d >= 0.0))
    }
}

/// A fitted ridge-regression estimator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LinearRegressor {
    pub feature_names: Vec<String>,
    pub coefficients: Vec<f64>,
    pub intercept: f64,
    #[serde(default)]
    pub target_transform: TargetTransform,
}

impl LinearRegressor {
    /// Predicted value on the original target scale.
    pub fn predict(&self, row: &FeatureRow) -> Result<f64, PredictError> {
        let raw = dot(&self.coefficients, row)? + self.intercept;
        Ok(self.target_transform.invert(raw))
    }
}

fn dot(coefficients: &[f64], row: &FeatureRow) -> Result<f64, PredictError> {
    if coefficients.len() != row.width() {
        return Err(PredictError::WidthMismatch {
            expected: coefficients.len(),
            actual: row.width(),
        });
    }

    Ok(coefficients.iter().zip(row.values()).map(|(c, x)| c * x).sum())
}

fn sigmoid(z: f64) -> f64 {
    1.0 / (1.0 + (-z).exp())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn classifier(coefficients: Vec<f64>, intercept: f64) -> LinearClassifier {
        LinearClassifier {
            feature_names: (0..coefficients.len()).map(|i| format!("f{i}")).collect(),
            coefficients,
            intercept,
            probability: true,
        }
    }

    #[test]
    fn classifier_artifact_defaults_to_probability() {
        let json = r#"{
            "schema": "classifier",
            "feature_names": ["precipitation_sum", "temperature_mean"],
            "coefficients": [0.8, -0.1],
            "intercept": 0.05
        }"#;

        let handle: ModelHandle = serde_json::from_str(json).expect("artifact should parse");
        assert_eq!(handle.kind(), "classifier");
        assert_eq!(handle.feature_names().len(), 2);

        match handle {
            ModelHandle::Classifier(clf) => assert!(clf.probability),
            ModelHandle::Regressor(_) => panic!("expected a classifier"),
        }
    }

    #[test]
    fn regressor_artifact_defaults_to_no_transform() {
        let json = r#"{
            "schema": "regressor",
            "feature_names": ["precipitation_sum"],
            "coefficients": [1.5],
            "intercept": 0.2
        }"#;

        let handle: ModelHandle = serde_json::from_str(json).expect("artifact should parse");
        match handle {
            ModelHandle::Regressor(reg) => {
                assert_eq!(reg.target_transform, TargetTransform::None);
            }
            ModelHandle::Classifier(_) => panic!("expected a regressor"),
        }
    }

    #[test]
    fn unknown_schema_is_rejected() {
        let json = r#"{"schema": "forest", "feature_names": [], "coefficients": [], "intercept": 0.0}"#;
        assert!(serde_json::from_str::<ModelHandle>(json).is_err());
    }

    #[test]
    fn probability_is_bounded_and_matches_label() {
        let clf = classifier(vec![2.0, -1.0], 0.3);

        for row in [
            FeatureRow::new(vec![10.0, 0.0]),
            FeatureRow::new(vec![-10.0, 0.0]),
            FeatureRow::new(vec![0.1, 0.4]),
        ] {
            let prob = clf.predict_proba(&row).unwrap();
            assert!((0.0..=1.0).contains(&prob));

            let label = clf.predict(&row).unwrap();
            assert_eq!(label == 1, prob >= 0.5);
        }
    }

    #[test]
    fn zero_decision_value_is_the_positive_class() {
        let clf = classifier(vec![1.0], 0.0);
        let row = FeatureRow::new(vec![0.0]);

        assert_eq!(clf.predict(&row).unwrap(), 1);
        assert!((clf.predict_proba(&row).unwrap() - 0.5).abs() < 1e-12);
    }

    #[test]
    fn width_mismatch_is_reported() {
        let clf = classifier(vec![1.0, 2.0, 3.0], 0.0);
        let err = clf.predict_proba(&FeatureRow::new(vec![1.0])).unwrap_err();
        assert_eq!(err, PredictError::WidthMismatch { expected: 3, actual: 1 });
    }

    #[test]
    fn regressor_predicts_linear_combination() {
        let reg = LinearRegressor {
            feature_names: vec!["a".into(), "b".into()],
            coefficients: vec![2.0, 0.5],
            intercept: 1.0,
            target_transform: TargetTransform::None,
        };

        let value = reg.predict(&FeatureRow::new(vec![3.0, 4.0])).unwrap();
        assert!((value - 9.0).abs() < 1e-12);
    }

    #[test]
    fn log1p_transform_is_inverted_on_predict() {
        let reg = LinearRegressor {
            feature_names: vec!["a".into()],
            coefficients: vec![1.0],
            intercept: 0.0,
            target_transform: TargetTransform::Log1p,
        };

        // raw output 2.0 on the log1p scale maps back to e^2 - 1
        let value = reg.predict(&FeatureRow::new(vec![2.0])).unwrap();
        assert!((value - 2.0f64.exp_m1()).abs() < 1e-12);
    }
}
