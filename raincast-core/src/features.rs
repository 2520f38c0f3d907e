use std::{convert::TryFrom, fmt::Debug, path::Path};

use chrono::NaiveDate;

use crate::{
    error::PredictError,
    features::{dummy::ZeroFeatures, table::TableFeatures},
};

pub mod dummy;
pub mod table;

/// The fixed-width numeric input a model expects for one inference call.
///
/// Column names live on the feature table and the model artifacts; a row
/// carries values only, in the agreed column order.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureRow {
    values: Vec<f64>,
}

impl FeatureRow {
    pub fn new(values: Vec<f64>) -> Self {
        Self { values }
    }

    /// Zero-filled placeholder row of the given width.
    pub fn zeros(width: usize) -> Self {
        Self { values: vec![0.0; width] }
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    pub fn width(&self) -> usize {
        self.values.len()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FeatureMode {
    /// Exact-date lookup in the feature table.
    Table,
    /// Experimental: ignore the date and feed a zero-filled row. Every date
    /// maps to the same prediction; kept only so the degenerate behavior
    /// stays testable.
    Dummy,
}

impl FeatureMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            FeatureMode::Table => "table",
            FeatureMode::Dummy => "dummy",
        }
    }

    pub const fn all() -> &'static [FeatureMode] {
        &[FeatureMode::Table, FeatureMode::Dummy]
    }
}

impl std::fmt::Display for FeatureMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<&str> for FeatureMode {
    type Error = anyhow::Error;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        let lower = value.to_lowercase();

        match lower.as_str() {
            "table" => Ok(FeatureMode::Table),
            "dummy" => Ok(FeatureMode::Dummy),
            _ => Err(anyhow::anyhow!(
                "Unknown feature mode '{value}'. Supported modes: table, dummy."
            )),
        }
    }
}

/// Source of feature rows for inference. Pure lookup, no side effects.
pub trait FeatureProvider: Send + Sync + Debug {
    fn lookup(&self, date: NaiveDate) -> Result<FeatureRow, PredictError>;
}

/// Construct the feature provider for a mode.
///
/// `expected_columns` is the ordered column list the models were fitted on;
/// in table mode the CSV header must match it exactly, in dummy mode only
/// its length is used. Returns a fatal error on any mismatch, so a
/// misconfigured table can never reach request handling.
pub fn provider_for_mode(
    mode: FeatureMode,
    features_csv: &Path,
    expected_columns: &[String],
) -> anyhow::Result<Box<dyn FeatureProvider>> {
    let boxed: Box<dyn FeatureProvider> = match mode {
        FeatureMode::Table => {
            let table = table::FeatureTable::load(features_csv)?;
            table.validate_columns(expected_columns)?;
            Box::new(TableFeatures::new(table))
        }
        FeatureMode::Dummy => Box::new(ZeroFeatures::new(expected_columns.len())),
    };

    Ok(boxed)
}
