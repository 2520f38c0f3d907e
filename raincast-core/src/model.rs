use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Rain forecast for a single target date, seven days after the input date.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RainPrediction {
    pub date: NaiveDate,
    pub will_rain: bool,
    pub prob: f64,
}

/// Envelope returned by the rain route.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RainResponse {
    pub input_date: NaiveDate,
    pub prediction: RainPrediction,
}

/// Cumulative precipitation forecast over a three-day window.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PrecipPrediction {
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub precipitation_fall: f64,
}

/// Envelope returned by the precipitation route.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PrecipResponse {
    pub input_date: NaiveDate,
    pub prediction: PrecipPrediction,
}
