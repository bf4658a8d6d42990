//! Error types for a single render request.

use thiserror::Error;

use crate::dataset::DatasetError;

/// Result type alias using ViewerError.
pub type ViewerResult<T> = Result<T, ViewerError>;

/// Failures of one render request.
///
/// Every variant ends the current request only; none of them poisons the
/// dataset cache or the process.
#[derive(Debug, Error)]
pub enum ViewerError {
    #[error("Failed to load data: {0}")]
    DataUnavailable(String),

    #[error("Parameter '{parameter}' not found in dataset (missing: {}). Available variables: {}", missing.join(", "), available.join(", "))]
    ParameterNotFound {
        parameter: String,
        missing: Vec<String>,
        available: Vec<String>,
    },

    #[error("Unknown parameter '{label}'. Known parameters: {}", known.join(", "))]
    UnknownParameter { label: String, known: Vec<String> },

    #[error("Forecast lead {lead} is out of range: dataset has {available} time steps (0..={})", available.saturating_sub(1))]
    LeadOutOfRange { lead: usize, available: usize },

    #[error("All values are missing for '{parameter}' at lead {lead}")]
    AllMissing { parameter: String, lead: usize },

    #[error("Failed to slice the region: {0}")]
    SliceFailure(String),

    #[error("Failed to render the map: {0}")]
    RenderFailure(String),
}

impl ViewerError {
    /// Short machine-friendly name of the failure class.
    pub fn kind(&self) -> &'static str {
        match self {
            ViewerError::DataUnavailable(_) => "DataUnavailable",
            ViewerError::ParameterNotFound { .. } => "ParameterNotFound",
            ViewerError::UnknownParameter { .. } => "UnknownParameter",
            ViewerError::LeadOutOfRange { .. } => "LeadOutOfRange",
            ViewerError::AllMissing { .. } => "AllMissing",
            ViewerError::SliceFailure(_) => "SliceFailure",
            ViewerError::RenderFailure(_) => "RenderFailure",
        }
    }

    /// Whether changing the request inputs can fix this failure.
    pub fn is_user_correctable(&self) -> bool {
        matches!(
            self,
            ViewerError::UnknownParameter { .. }
                | ViewerError::LeadOutOfRange { .. }
                | ViewerError::AllMissing { .. }
                | ViewerError::ParameterNotFound { .. }
        )
    }

    /// Suggestion shown to the user next to the message.
    pub fn hint(&self) -> Option<&'static str> {
        match self {
            ViewerError::DataUnavailable(_) => {
                Some("Check the run date and hour; recent runs may not be published yet.")
            }
            ViewerError::UnknownParameter { .. } => Some("Run `gfs-viewer parameters` to list accepted labels."),
            ViewerError::LeadOutOfRange { .. } => Some("Choose a smaller forecast lead."),
            ViewerError::AllMissing { .. } => Some("Try a different forecast lead or parameter."),
            ViewerError::ParameterNotFound { .. } => Some("This run does not publish the field; try another run."),
            ViewerError::SliceFailure(_) | ViewerError::RenderFailure(_) => None,
        }
    }
}

impl From<DatasetError> for ViewerError {
    fn from(err: DatasetError) -> Self {
        match err {
            DatasetError::Unavailable(_) | DatasetError::Timeout(_) => {
                ViewerError::DataUnavailable(err.to_string())
            }
            DatasetError::Malformed(_)
            | DatasetError::UnknownVariable(_)
            | DatasetError::OutOfBounds { .. } => ViewerError::SliceFailure(err.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parameter_not_found_lists_variables() {
        let err = ViewerError::ParameterNotFound {
            parameter: "tmp2m".into(),
            missing: vec!["tmp2m".into()],
            available: vec!["pratesfc".into(), "prmslmsl".into()],
        };
        let msg = err.to_string();
        assert!(msg.contains("pratesfc, prmslmsl"));
        assert!(err.is_user_correctable());
    }

    #[test]
    fn test_lead_out_of_range_message() {
        let err = ViewerError::LeadOutOfRange { lead: 250, available: 241 };
        assert!(err.to_string().contains("0..=240"));
        assert_eq!(err.kind(), "LeadOutOfRange");
    }

    #[test]
    fn test_dataset_error_mapping() {
        let err: ViewerError = DatasetError::Timeout(std::time::Duration::from_secs(5)).into();
        assert!(matches!(err, ViewerError::DataUnavailable(_)));

        let err: ViewerError = DatasetError::Malformed("bad axis".into()).into();
        assert!(matches!(err, ViewerError::SliceFailure(_)));
    }
}
