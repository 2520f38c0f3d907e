//! Zero-filled placeholder features.

use chrono::NaiveDate;

use super::{FeatureProvider, FeatureRow};
use crate::error::PredictError;

/// [`FeatureProvider`] that ignores the date and returns a zero-filled row
/// sized to the models' expected feature count.
///
/// Experimental. With this provider every date maps to the same prediction,
/// and no date ever fails lookup; it exists so that behavior can be covered
/// by tests rather than silently reintroduced.
#[derive(Debug)]
pub struct ZeroFeatures {
    width: usize,
}

impl ZeroFeatures {
    pub fn new(width: usize) -> Self {
        Self { width }
    }
}

impl FeatureProvider for ZeroFeatures {
    fn lookup(&self, _date: NaiveDate) -> Result<FeatureRow, PredictError> {
        Ok(FeatureRow::zeros(self.width))
    }
}
