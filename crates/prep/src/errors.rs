use thiserror::Error;

/// Errors returned by the preparation pipeline. Every variant is fatal to
/// the run that produced it.
#[derive(Debug, Error)]
pub enum PrepError {
    /// An expected column is missing or has the wrong domain.
    #[error("schema error: {0}")]
    Schema(String),

    /// Vector or matrix lengths disagree.
    #[error("shape error: {0}")]
    Shape(String),

    /// The raw table could not be fetched or parsed.
    #[error("source error: {0}")]
    Source(String),

    /// The record schema rejected a value.
    #[error("serialization error: {0}")]
    Serialization(String),

    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<creditprep_schema::RecordError> for PrepError {
    fn from(err: creditprep_schema::RecordError) -> Self {
        PrepError::Serialization(err.to_string())
    }
}

impl From<csv::Error> for PrepError {
    fn from(err: csv::Error) -> Self {
        PrepError::Source(err.to_string())
    }
}

/// Result type for preparation operations
pub type Result<T> = std::result::Result<T, PrepError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        assert!(PrepError::Schema("AGE".into()).to_string().contains("schema error"));
        assert!(PrepError::Shape("3 != 4".into()).to_string().contains("shape error"));
        assert!(PrepError::Source("404".into()).to_string().contains("source error"));
    }

    #[test]
    fn test_record_error_maps_to_serialization() {
        let err: PrepError = creditprep_schema::RecordError::TargetLength { rows: 1, targets: 2 }.into();
        assert!(matches!(err, PrepError::Serialization(_)));
    }

    #[test]
    fn test_io_error_converts() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        let err: PrepError = io.into();
        assert!(matches!(err, PrepError::Io(_)));
    }
}
