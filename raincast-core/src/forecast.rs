//! The prediction service: loaded models plus a feature source.

use std::{fs, path::PathBuf};

use anyhow::{Context, Result, anyhow};
use chrono::{Duration, NaiveDate};

use crate::{
    artifact::{LinearClassifier, LinearRegressor, ModelHandle},
    error::PredictError,
    features::{FeatureMode, FeatureProvider, provider_for_mode},
    model::{PrecipPrediction, PrecipResponse, RainPrediction, RainResponse},
};

/// Probability at or above which the classifier's decision is "rain".
const RAIN_THRESHOLD: f64 = 0.5;

/// Locations of the artifacts consumed once at startup.
#[derive(Debug, Clone)]
pub struct ArtifactPaths {
    pub rain_model: PathBuf,
    pub precip_model: PathBuf,
    pub features_csv: PathBuf,
    /// Optional sidecar JSON array naming the expected feature columns.
    pub feature_columns: Option<PathBuf>,
}

/// Immutable prediction service built during startup.
///
/// Holds the two fitted models and the feature provider; read-only for the
/// process lifetime, so it can be shared across requests without locking.
#[derive(Debug)]
pub struct Forecaster {
    rain: LinearClassifier,
    precip: LinearRegressor,
    features: Box<dyn FeatureProvider>,
}

impl Forecaster {
    /// Assemble a forecaster from already-loaded parts.
    ///
    /// Fails if an artifact has the wrong capability for its task or if the
    /// two models disagree on feature columns; both are configuration
    /// errors that must refuse to serve.
    pub fn new(
        rain: ModelHandle,
        precip: ModelHandle,
        features: Box<dyn FeatureProvider>,
    ) -> Result<Self> {
        let rain = match rain {
            ModelHandle::Classifier(clf) => clf,
            other => {
                return Err(anyhow!(
                    "The rain model must be a classifier, got a {}",
                    other.kind()
                ));
            }
        };

        let precip = match precip {
            ModelHandle::Regressor(reg) => reg,
            other => {
                return Err(anyhow!(
                    "The precipitation model must be a regressor, got a {}",
                    other.kind()
                ));
            }
        };

        if rain.feature_names != precip.feature_names {
            return Err(anyhow!(
                "Models disagree on feature columns: rain expects {:?}, precipitation expects {:?}",
                rain.feature_names,
                precip.feature_names
            ));
        }

        if rain.coefficients.len() != rain.feature_names.len() {
            return Err(anyhow!(
                "Rain model has {} coefficients for {} feature columns",
                rain.coefficients.len(),
                rain.feature_names.len()
            ));
        }

        if precip.coefficients.len() != precip.feature_names.len() {
            return Err(anyhow!(
                "Precipitation model has {} coefficients for {} feature columns",
                precip.coefficients.len(),
                precip.feature_names.len()
            ));
        }

        Ok(Self { rain, precip, features })
    }

    /// Load everything the service needs from disk.
    pub fn load(paths: &ArtifactPaths, mode: FeatureMode) -> Result<Self> {
        let rain = ModelHandle::load(&paths.rain_model)
            .context("Could not load classification model")?;
        let precip = ModelHandle::load(&paths.precip_model)
            .context("Could not load regression model")?;

        let expected = rain.feature_names().to_vec();

        if let Some(columns_path) = &paths.feature_columns {
            let declared = load_feature_columns(columns_path)?;
            if declared != expected {
                return Err(anyhow!(
                    "Feature columns file {} declares {:?}, model artifacts expect {:?}",
                    columns_path.display(),
                    declared,
                    expected
                ));
            }
        }

        let features = provider_for_mode(mode, &paths.features_csv, &expected)?;
        tracing::debug!(mode = %mode, columns = expected.len(), "feature provider ready");

        Self::new(rain, precip, features)
    }

    /// Ordered feature columns the loaded models expect.
    pub fn feature_names(&self) -> &[String] {
        &self.rain.feature_names
    }

    /// Will it rain exactly seven days after `date`?
    pub fn rain_at(&self, date: NaiveDate) -> Result<RainResponse, PredictError> {
        let row = self.features.lookup(date)?;

        let prob = if self.rain.probability {
            self.rain.predict_proba(&row)?
        } else {
            // Hard labels only: the best we can report is certainty either way.
            match self.rain.predict(&row)? {
                1 => 1.0,
                _ => 0.0,
            }
        };

        Ok(RainResponse {
            input_date: date,
            prediction: RainPrediction {
                date: date + Duration::days(7),
                will_rain: prob >= RAIN_THRESHOLD,
                prob: round_to(prob, 4),
            },
        })
    }

    /// Cumulative precipitation over the three days following `date`.
    pub fn precipitation_at(&self, date: NaiveDate) -> Result<PrecipResponse, PredictError> {
        let row = self.features.lookup(date)?;
        let amount = self.precip.predict(&row)?;

        Ok(PrecipResponse {
            input_date: date,
            prediction: PrecipPrediction {
                start_date: date + Duration::days(1),
                end_date: date + Duration::days(3),
                precipitation_fall: round_to(amount, 2),
            },
        })
    }
}

fn load_feature_columns(path: &std::path::Path) -> Result<Vec<String>> {
    let contents = fs::read_to_string(path)
        .with_context(|| format!("Failed to read feature columns file: {}", path.display()))?;

    serde_json::from_str(&contents)
        .with_context(|| format!("Failed to parse feature columns file: {}", path.display()))
}

fn round_to(value: f64, places: u32) -> f64 {
    let factor = 10f64.powi(places as i32);
    (value * factor).round() / factor
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        artifact::TargetTransform,
        features::{dummy::ZeroFeatures, table::{FeatureTable, TableFeatures}},
    };

    const COLUMNS: [&str; 3] = ["precipitation_sum", "temperature_mean", "humidity_mean"];

    const CSV: &str = "\
time,precipitation_sum,temperature_mean,humidity_mean
2023-01-01,1.2,21.5,0.63
2023-01-02,0.0,24.1,0.48
";

    fn columns() -> Vec<String> {
        COLUMNS.map(String::from).to_vec()
    }

    fn rain_handle(probability: bool) -> ModelHandle {
        ModelHandle::Classifier(LinearClassifier {
            feature_names: columns(),
            coefficients: vec![1.4, -0.05, 2.0],
            intercept: -0.2,
            probability,
        })
    }

    fn precip_handle(target_transform: TargetTransform) -> ModelHandle {
        ModelHandle::Regressor(LinearRegressor {
            feature_names: columns(),
            coefficients: vec![2.5, 0.01, 1.0],
            intercept: 0.3,
            target_transform,
        })
    }

    fn table_provider() -> Box<dyn FeatureProvider> {
        let table = FeatureTable::parse(CSV.as_bytes()).expect("fixture should parse");
        Box::new(TableFeatures::new(table))
    }

    fn forecaster() -> Forecaster {
        Forecaster::new(
            rain_handle(true),
            precip_handle(TargetTransform::None),
            table_provider(),
        )
        .expect("fixture forecaster should assemble")
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn rain_targets_seven_days_out() {
        let response = forecaster().rain_at(date(2023, 1, 1)).unwrap();

        assert_eq!(response.input_date, date(2023, 1, 1));
        assert_eq!(response.prediction.date, date(2023, 1, 8));
        assert!((0.0..=1.0).contains(&response.prediction.prob));
        assert_eq!(response.prediction.will_rain, response.prediction.prob >= 0.5);
    }

    #[test]
    fn precipitation_window_is_one_through_three_days_out() {
        let response = forecaster().precipitation_at(date(2023, 1, 1)).unwrap();

        assert_eq!(response.prediction.start_date, date(2023, 1, 2));
        assert_eq!(response.prediction.end_date, date(2023, 1, 4));

        // rounded to two decimals
        let amount = response.prediction.precipitation_fall;
        assert!((amount * 100.0 - (amount * 100.0).round()).abs() < 1e-9);
    }

    #[test]
    fn absent_date_is_a_not_found_error() {
        let missing = date(1999, 12, 31);
        let err = forecaster().rain_at(missing).unwrap_err();
        assert_eq!(err, PredictError::NoFeatures(missing));
    }

    #[test]
    fn repeated_calls_are_identical() {
        let forecaster = forecaster();
        let d = date(2023, 1, 2);

        assert_eq!(forecaster.rain_at(d).unwrap(), forecaster.rain_at(d).unwrap());
        assert_eq!(
            forecaster.precipitation_at(d).unwrap(),
            forecaster.precipitation_at(d).unwrap()
        );
    }

    #[test]
    fn hard_label_fallback_reports_only_certainties() {
        let forecaster = Forecaster::new(
            rain_handle(false),
            precip_handle(TargetTransform::None),
            table_provider(),
        )
        .unwrap();

        for d in [date(2023, 1, 1), date(2023, 1, 2)] {
            let prob = forecaster.rain_at(d).unwrap().prediction.prob;
            assert!(prob == 0.0 || prob == 1.0);
        }
    }

    #[test]
    fn log1p_models_are_inverted_back_to_millimeters() {
        let forecaster = Forecaster::new(
            rain_handle(true),
            precip_handle(TargetTransform::Log1p),
            table_provider(),
        )
        .unwrap();

        let inverted =
            forecaster.precipitation_at(date(2023, 1, 1)).unwrap().prediction.precipitation_fall;

        // the 2023-01-01 row dotted with the regressor coefficients
        let raw = 2.5 * 1.2 + 0.01 * 21.5 + 1.0 * 0.63 + 0.3;
        let expected = round_to(f64::exp_m1(raw), 2);
        assert!((inverted - expected).abs() < 1e-9);
    }

    #[test]
    fn dummy_features_make_every_date_identical() {
        let forecaster = Forecaster::new(
            rain_handle(true),
            precip_handle(TargetTransform::None),
            Box::new(ZeroFeatures::new(3)),
        )
        .unwrap();

        let a = forecaster.rain_at(date(2023, 1, 1)).unwrap();
        let b = forecaster.rain_at(date(2001, 7, 19)).unwrap();
        assert_eq!(a.prediction.prob, b.prediction.prob);
        assert_eq!(a.prediction.will_rain, b.prediction.will_rain);

        // dates far outside the table still resolve
        assert!(forecaster.rain_at(date(1900, 1, 1)).is_ok());
    }

    #[test]
    fn swapped_artifacts_are_rejected() {
        let err = Forecaster::new(
            precip_handle(TargetTransform::None),
            rain_handle(true),
            table_provider(),
        )
        .unwrap_err();

        assert!(err.to_string().contains("must be a classifier"));
    }

    #[test]
    fn disagreeing_feature_columns_are_rejected() {
        let other = ModelHandle::Regressor(LinearRegressor {
            feature_names: vec!["wind_speed".into()],
            coefficients: vec![1.0],
            intercept: 0.0,
            target_transform: TargetTransform::None,
        });

        let err = Forecaster::new(rain_handle(true), other, table_provider()).unwrap_err();
        assert!(err.to_string().contains("disagree on feature columns"));
    }

    #[test]
    fn coefficient_count_must_match_columns() {
        let broken = ModelHandle::Classifier(LinearClassifier {
            feature_names: columns(),
            coefficients: vec![1.0],
            intercept: 0.0,
            probability: true,
        });

        let err = Forecaster::new(broken, precip_handle(TargetTransform::None), table_provider())
            .unwrap_err();
        assert!(err.to_string().contains("coefficients"));
    }

    #[test]
    fn rounding_helper_rounds_half_away_from_zero() {
        assert_eq!(round_to(0.73125, 4), 0.7313);
        assert_eq!(round_to(4.249, 2), 4.25);
        assert_eq!(round_to(-1.005, 2), -1.0);
    }
}
