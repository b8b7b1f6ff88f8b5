use thiserror::Error;

/// Trip processing error types
#[derive(Error, Debug)]
pub enum TripError {
    #[error("Missing input {path}: {reason}")]
    MissingInput { path: String, reason: String },

    #[error("{table} table is missing required column '{column}'")]
    MissingColumn { table: &'static str, column: &'static str },

    #[error("{table} series is empty after filtering incomplete rows")]
    EmptySeries { table: &'static str },

    #[error("Trajectory has no kinematics; run the kinematics step first")]
    MissingKinematics,

    #[error("Location and orientation must both be loaded first")]
    NotReady,

    #[error("Invalid command: {0}")]
    InvalidCommand(String),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for trip processing
pub type TripResult<T> = Result<T, TripError>;

impl TripError {
    /// Loading and validation failures abort the pipeline before alignment.
    pub fn is_input_error(&self) -> bool {
        matches!(
            self,
            TripError::MissingInput { .. }
                | TripError::MissingColumn { .. }
                | TripError::EmptySeries { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_diagnostic_names_input() {
        let err = TripError::MissingInput {
            path: "Location.csv".to_string(),
            reason: "No such file or directory".to_string(),
        };
        assert!(err.to_string().contains("Location.csv"));
        assert!(err.is_input_error());
    }

    #[test]
    fn test_missing_column_message() {
        let err = TripError::MissingColumn {
            table: "Orientation",
            column: "Yaw (°)",
        };
        assert_eq!(
            err.to_string(),
            "Orientation table is missing required column 'Yaw (°)'"
        );
    }

    #[test]
    fn test_numeric_errors_are_not_input_errors() {
        assert!(!TripError::MissingKinematics.is_input_error());
        assert!(!TripError::NotReady.is_input_error());
    }
}
