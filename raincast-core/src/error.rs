use chrono::NaiveDate;
use thiserror::Error;

/// Errors that can occur while answering a single prediction request.
///
/// Startup problems (unreadable artifacts, column mismatches) are not
/// represented here; those are `anyhow` errors that abort the process
/// before it starts serving.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum PredictError {
    /// The requested date is not present in the feature index.
    #[error("No features found for {0}.")]
    NoFeatures(NaiveDate),

    /// The feature row does not match the width the model was fitted on.
    ///
    /// This indicates a serving-schema bug, not bad user input, and is
    /// reported as a server-side failure.
    #[error("feature row has {actual} values, but the model expects {expected}")]
    WidthMismatch { expected: usize, actual: usize },
}

impl PredictError {
    /// True for errors caused by the client's input rather than the service.
    pub fn is_client_error(&self) -> bool {
        matches!(self, PredictError::NoFeatures(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_found_message_names_the_date() {
        let date = NaiveDate::from_ymd_opt(2023, 1, 1).unwrap();
        let err = PredictError::NoFeatures(date);
        assert_eq!(err.to_string(), "No features found for 2023-01-01.");
        assert!(err.is_client_error());
    }

    #[test]
    fn width_mismatch_is_not_a_client_error() {
        let err = PredictError::WidthMismatch { expected: 3, actual: 0 };
        assert!(!err.is_client_error());
        assert!(err.to_string().contains("expects 3"));
    }
}
