use thiserror::Error;

/// Errors raised while building or decoding records.
#[derive(Debug, Error)]
pub enum RecordError {
    #[error("matrix shape mismatch: {rows}x{cols} needs {expected} values, got {got}")]
    MatrixShape {
        rows: usize,
        cols: usize,
        expected: usize,
        got: usize,
    },

    #[error("target length mismatch: {rows} input rows, {targets} targets")]
    TargetLength { rows: usize, targets: usize },

    #[error("decode error: {0}")]
    Decode(#[from] prost::DecodeError),
}
