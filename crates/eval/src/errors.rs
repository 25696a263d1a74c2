use thiserror::Error;

/// Errors from scoring and from the stored prediction pair.
#[derive(Debug, Error)]
pub enum EvalError {
    /// Prediction and ground-truth lengths differ, or both are empty.
    #[error("shape error: {0}")]
    Shape(String),

    /// A ground-truth value is neither 0 nor 1.
    #[error("invalid label {value} at row {row}")]
    Label { row: usize, value: f64 },

    #[error("serialization error: {0}")]
    Serialization(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<bincode::Error> for EvalError {
    fn from(err: bincode::Error) -> Self {
        EvalError::Serialization(err.to_string())
    }
}

impl From<serde_json::Error> for EvalError {
    fn from(err: serde_json::Error) -> Self {
        EvalError::Serialization(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, EvalError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        let err = EvalError::Shape("2 predictions, 3 labels".to_string());
        assert_eq!(err.to_string(), "shape error: 2 predictions, 3 labels");

        let err = EvalError::Label { row: 4, value: 0.5 };
        assert_eq!(err.to_string(), "invalid label 0.5 at row 4");
    }

    #[test]
    fn test_json_error_conversion() {
        let err: EvalError = serde_json::from_str::<Vec<f64>>("[1,")
            .unwrap_err()
            .into();
        assert!(matches!(err, EvalError::Serialization(_)));
    }
}
