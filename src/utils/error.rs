use thiserror::Error;

/// A user-supplied value failed its field domain check.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Invalid value for '{field}': {reason}")]
pub struct ValidationError {
    pub field: String,
    pub reason: String,
}

impl ValidationError {
    pub fn new(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            reason: reason.into(),
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PredictionError {
    #[error("Model unavailable at '{path}': {reason}")]
    ModelUnavailable { path: String, reason: String },

    #[error("Schema mismatch: expected {expected}, got {actual}")]
    SchemaMismatch { expected: String, actual: String },

    #[error("Inference failed: {reason}")]
    InferenceFailure { reason: String },
}

#[derive(Error, Debug)]
pub enum ReportError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Prediction(#[from] PredictionError),

    #[error("CSV processing error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Invalid configuration value for '{field}' ({value}): {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Dataset error: {message}")]
    DatasetError { message: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Input,
    Model,
    Deployment,
    Inference,
    Data,
    Configuration,
    System,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl ReportError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            ReportError::Validation(_) => ErrorCategory::Input,
            ReportError::Prediction(PredictionError::ModelUnavailable { .. }) => {
                ErrorCategory::Model
            }
            ReportError::Prediction(PredictionError::SchemaMismatch { .. }) => {
                ErrorCategory::Deployment
            }
            ReportError::Prediction(PredictionError::InferenceFailure { .. }) => {
                ErrorCategory::Inference
            }
            ReportError::CsvError(_) | ReportError::DatasetError { .. } => ErrorCategory::Data,
            ReportError::ConfigError { .. } | ReportError::InvalidConfigValueError { .. } => {
                ErrorCategory::Configuration
            }
            ReportError::IoError(_) | ReportError::SerializationError(_) => ErrorCategory::System,
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self {
            ReportError::Validation(_) => ErrorSeverity::Low,
            ReportError::Prediction(PredictionError::InferenceFailure { .. }) => {
                ErrorSeverity::Medium
            }
            ReportError::Prediction(PredictionError::ModelUnavailable { .. })
            | ReportError::CsvError(_)
            | ReportError::DatasetError { .. }
            | ReportError::ConfigError { .. }
            | ReportError::InvalidConfigValueError { .. } => ErrorSeverity::High,
            ReportError::Prediction(PredictionError::SchemaMismatch { .. })
            | ReportError::IoError(_)
            | ReportError::SerializationError(_) => ErrorSeverity::Critical,
        }
    }

    /// Process exit code for the CLI, derived from severity.
    pub fn exit_code(&self) -> i32 {
        match self.severity() {
            ErrorSeverity::Low => 4,
            ErrorSeverity::Medium => 2,
            ErrorSeverity::High => 1,
            ErrorSeverity::Critical => 3,
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self {
            ReportError::Validation(e) => format!("Please check '{}': {}", e.field, e.reason),
            ReportError::Prediction(PredictionError::ModelUnavailable { .. }) => {
                "The prediction model could not be loaded, so no prediction is available."
                    .to_string()
            }
            ReportError::Prediction(PredictionError::SchemaMismatch { .. }) => {
                "The prediction model does not match this version of the application.".to_string()
            }
            ReportError::Prediction(PredictionError::InferenceFailure { .. }) => {
                "The prediction could not be computed.".to_string()
            }
            ReportError::CsvError(_) | ReportError::DatasetError { .. } => {
                "The donation dataset could not be read.".to_string()
            }
            ReportError::ConfigError { message } => format!("Configuration problem: {}", message),
            ReportError::InvalidConfigValueError { field, reason, .. } => {
                format!("Configuration value '{}' is invalid: {}", field, reason)
            }
            ReportError::IoError(e) => format!("File system error: {}", e),
            ReportError::SerializationError(e) => format!("Data format error: {}", e),
        }
    }

    pub fn recovery_suggestion(&self) -> &'static str {
        match self.category() {
            ErrorCategory::Input => "Enter a value inside the allowed range and try again",
            ErrorCategory::Model => {
                "Check that the model artifact exists and is a valid export, then reload"
            }
            ErrorCategory::Deployment => {
                "Re-export the model for the current feature schema or update the application"
            }
            ErrorCategory::Inference => "Try the prediction again",
            ErrorCategory::Data => "Check the dataset path and that the file is a valid CSV",
            ErrorCategory::Configuration => "Fix the configuration file or command line flags",
            ErrorCategory::System => "Check file permissions and available disk space",
        }
    }
}

pub type Result<T> = std::result::Result<T, ReportError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prediction_errors_are_categorized_distinctly() {
        let unavailable: ReportError = PredictionError::ModelUnavailable {
            path: "model.json".to_string(),
            reason: "not found".to_string(),
        }
        .into();
        let mismatch: ReportError = PredictionError::SchemaMismatch {
            expected: "7".to_string(),
            actual: "6".to_string(),
        }
        .into();
        let failure: ReportError = PredictionError::InferenceFailure {
            reason: "NaN".to_string(),
        }
        .into();

        assert_eq!(unavailable.category(), ErrorCategory::Model);
        assert_eq!(mismatch.category(), ErrorCategory::Deployment);
        assert_eq!(failure.category(), ErrorCategory::Inference);
        assert_eq!(mismatch.severity(), ErrorSeverity::Critical);
    }

    #[test]
    fn test_validation_error_is_low_severity() {
        let err: ReportError = ValidationError::new("adultVolunteers", "must be at least 1").into();
        assert_eq!(err.severity(), ErrorSeverity::Low);
        assert!(err.user_friendly_message().contains("adultVolunteers"));
    }

    #[test]
    fn test_exit_codes_follow_severity() {
        let validation: ReportError = ValidationError::new("adultVolunteers", "not a number").into();
        let failure: ReportError = PredictionError::InferenceFailure {
            reason: "timed out".to_string(),
        }
        .into();
        let unavailable: ReportError = PredictionError::ModelUnavailable {
            path: "model.json".to_string(),
            reason: "not found".to_string(),
        }
        .into();
        let mismatch: ReportError = PredictionError::SchemaMismatch {
            expected: "7 features".to_string(),
            actual: "6 features".to_string(),
        }
        .into();

        assert_eq!(validation.exit_code(), 4);
        assert_eq!(failure.exit_code(), 2);
        assert_eq!(unavailable.exit_code(), 1);
        assert_eq!(mismatch.exit_code(), 3);
    }
}
