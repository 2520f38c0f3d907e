//! CSV-backed feature store indexed by date.

use std::{collections::BTreeMap, fs::File, io::BufReader, path::Path};

use anyhow::{Context, Result, anyhow};
use chrono::NaiveDate;

use super::{FeatureProvider, FeatureRow};
use crate::error::PredictError;

/// Name of the CSV column holding the row's date.
const TIME_COLUMN: &str = "time";

/// An immutable, date-indexed table of daily feature rows.
///
/// Built once at startup from `features_daily.csv`; the remaining columns,
/// in file order, are the feature columns the models expect.
#[derive(Debug, Clone)]
pub struct FeatureTable {
    columns: Vec<String>,
    rows: BTreeMap<NaiveDate, Vec<f64>>,
}

impl FeatureTable {
    /// Load the table from a CSV file with a header row.
    pub fn load(path: &Path) -> Result<Self> {
        let file = File::open(path)
            .with_context(|| format!("Failed to open features file: {}", path.display()))?;

        Self::parse(BufReader::new(file))
            .with_context(|| format!("Failed to load features file: {}", path.display()))
    }

    /// Parse the table from any reader producing CSV with a header row.
    pub fn parse<R: std::io::Read>(reader: R) -> Result<Self> {
        let mut csv = csv::Reader::from_reader(reader);

        let headers = csv.headers().context("Failed to read CSV header")?.clone();
        let time_index = headers
            .iter()
            .position(|h| h == TIME_COLUMN)
            .ok_or_else(|| anyhow!("Features table must include a '{TIME_COLUMN}' column."))?;

        let columns: Vec<String> = headers
            .iter()
            .enumerate()
            .filter(|(i, _)| *i != time_index)
            .map(|(_, h)| h.to_string())
            .collect();

        let mut rows = BTreeMap::new();
        for (line, record) in csv.records().enumerate() {
            let record = record.with_context(|| format!("Failed to read CSV record {line}"))?;

            let raw_date = record
                .get(time_index)
                .ok_or_else(|| anyhow!("Record {line} is missing the '{TIME_COLUMN}' column"))?;
            let date = NaiveDate::parse_from_str(raw_date, "%Y-%m-%d")
                .with_context(|| format!("Record {line} has an invalid date '{raw_date}'"))?;

            let mut values = Vec::with_capacity(columns.len());
            for (i, cell) in record.iter().enumerate() {
                if i == time_index {
                    continue;
                }
                let value: f64 = cell.parse().with_context(|| {
                    format!("Record for {date} has a non-numeric value '{cell}'")
                })?;
                values.push(value);
            }

            if values.len() != columns.len() {
                return Err(anyhow!(
                    "Record for {date} has {} values, header declares {}",
                    values.len(),
                    columns.len()
                ));
            }

            rows.insert(date, values);
        }

        Ok(Self { columns, rows })
    }

    /// Feature column names in table order, excluding the date column.
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Exact-date lookup; no interpolation or nearest-neighbor fallback.
    pub fn get(&self, date: NaiveDate) -> Option<FeatureRow> {
        self.rows.get(&date).map(|values| FeatureRow::new(values.clone()))
    }

    /// Check that the table's columns match what the models were fitted on,
    /// in the same order. A mismatch is a configuration error that must
    /// prevent the service from starting.
    pub fn validate_columns(&self, expected: &[String]) -> Result<()> {
        if self.columns != expected {
            return Err(anyhow!(
                "Feature table columns {:?} do not match the model's expected columns {:?}",
                self.columns,
                expected
            ));
        }

        Ok(())
    }
}

/// [`FeatureProvider`] that answers from a [`FeatureTable`].
#[derive(Debug)]
pub struct TableFeatures {
    table: FeatureTable,
}

impl TableFeatures {
    pub fn new(table: FeatureTable) -> Self {
        Self { table }
    }
}

impl FeatureProvider for TableFeatures {
    fn lookup(&self, date: NaiveDate) -> Result<FeatureRow, PredictError> {
        self.table.get(date).ok_or(PredictError::NoFeatures(date))
    }
}
