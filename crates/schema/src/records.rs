//! Wire types.
//!
//! Field tags mirror the TensorFlow `Example` layout for the row records so
//! that generic example readers can consume the per-row batches unchanged.

use std::collections::BTreeMap;

use crate::errors::RecordError;

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct BytesList {
    #[prost(bytes = "vec", repeated, tag = "1")]
    pub value: Vec<Vec<u8>>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct FloatList {
    #[prost(float, repeated, tag = "1")]
    pub value: Vec<f32>,
}

/// A single typed feature value.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct Feature {
    #[prost(oneof = "feature::Kind", tags = "1, 2")]
    pub kind: Option<feature::Kind>,
}

pub mod feature {
    #[derive(Clone, PartialEq, ::prost::Oneof)]
    pub enum Kind {
        #[prost(message, tag = "1")]
        BytesList(super::BytesList),
        #[prost(message, tag = "2")]
        FloatList(super::FloatList),
    }
}

impl Feature {
    /// Single-element float list.
    pub fn float(value: f32) -> Self {
        Self {
            kind: Some(feature::Kind::FloatList(FloatList { value: vec![value] })),
        }
    }

    /// Single-element byte-string list.
    pub fn bytes(value: impl Into<Vec<u8>>) -> Self {
        Self {
            kind: Some(feature::Kind::BytesList(BytesList {
                value: vec![value.into()],
            })),
        }
    }

    /// First float value, if this is a float feature.
    pub fn as_float(&self) -> Option<f32> {
        match &self.kind {
            Some(feature::Kind::FloatList(list)) => list.value.first().copied(),
            _ => None,
        }
    }

    /// First byte string, if this is a bytes feature.
    pub fn as_bytes(&self) -> Option<&[u8]> {
        match &self.kind {
            Some(feature::Kind::BytesList(list)) => list.value.first().map(Vec::as_slice),
            _ => None,
        }
    }
}

/// Named features of one row. Ordered map, so encoding is deterministic.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct Features {
    #[prost(btree_map = "string, message", tag = "1")]
    pub feature: BTreeMap<String, Feature>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct Example {
    #[prost(message, optional, tag = "1")]
    pub features: Option<Features>,
}

impl Example {
    /// Look up a feature by name.
    pub fn get(&self, name: &str) -> Option<&Feature> {
        self.features.as_ref().and_then(|f| f.feature.get(name))
    }
}

/// Batch of row records.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct Examples {
    #[prost(message, repeated, tag = "1")]
    pub examples: Vec<Example>,
}

/// Dense row-major matrix with its shape header.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct Matrix {
    #[prost(uint64, tag = "1")]
    pub rows: u64,
    #[prost(uint64, tag = "2")]
    pub cols: u64,
    #[prost(double, repeated, tag = "3")]
    pub data: Vec<f64>,
}

impl Matrix {
    /// Build a matrix, checking that `data` holds exactly `rows * cols` values.
    pub fn from_row_major(rows: usize, cols: usize, data: Vec<f64>) -> Result<Self, RecordError> {
        let expected = rows * cols;
        if data.len() != expected {
            return Err(RecordError::MatrixShape {
                rows,
                cols,
                expected,
                got: data.len(),
            });
        }
        Ok(Self {
            rows: rows as u64,
            cols: cols as u64,
            data,
        })
    }

    pub fn shape(&self) -> (usize, usize) {
        (self.rows as usize, self.cols as usize)
    }

    /// Slice of row `i`. Panics if out of bounds.
    pub fn row(&self, i: usize) -> &[f64] {
        let cols = self.cols as usize;
        &self.data[i * cols..(i + 1) * cols]
    }

    /// Re-check the header against the payload (e.g. after decoding).
    pub fn validate(&self) -> Result<(), RecordError> {
        let (rows, cols) = self.shape();
        if self.data.len() != rows * cols {
            return Err(RecordError::MatrixShape {
                rows,
                cols,
                expected: rows * cols,
                got: self.data.len(),
            });
        }
        Ok(())
    }
}

/// Train/test matrices with their target vectors.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct Dataset {
    #[prost(message, optional, tag = "1")]
    pub train_inputs: Option<Matrix>,
    #[prost(double, repeated, tag = "2")]
    pub train_targets: Vec<f64>,
    #[prost(message, optional, tag = "3")]
    pub test_inputs: Option<Matrix>,
    #[prost(double, repeated, tag = "4")]
    pub test_targets: Vec<f64>,
}

impl Dataset {
    /// Assemble a dataset; each target vector must match its matrix height.
    pub fn new(
        train_inputs: Matrix,
        train_targets: Vec<f64>,
        test_inputs: Matrix,
        test_targets: Vec<f64>,
    ) -> Result<Self, RecordError> {
        for (inputs, targets) in [(&train_inputs, &train_targets), (&test_inputs, &test_targets)] {
            inputs.validate()?;
            if inputs.rows as usize != targets.len() {
                return Err(RecordError::TargetLength {
                    rows: inputs.rows as usize,
                    targets: targets.len(),
                });
            }
        }
        Ok(Self {
            train_inputs: Some(train_inputs),
            train_targets,
            test_inputs: Some(test_inputs),
            test_targets,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Record;

    #[test]
    fn test_feature_accessors() {
        let f = Feature::float(1.5);
        assert_eq!(f.as_float(), Some(1.5));
        assert_eq!(f.as_bytes(), None);

        let b = Feature::bytes("abc");
        assert_eq!(b.as_bytes(), Some(&b"abc"[..]));
        assert_eq!(b.as_float(), None);
    }

    #[test]
    fn test_matrix_shape_checked() {
        assert!(Matrix::from_row_major(2, 2, vec![1.0, 2.0, 3.0, 4.0]).is_ok());
        let err = Matrix::from_row_major(2, 3, vec![1.0; 5]).unwrap_err();
        assert!(matches!(err, RecordError::MatrixShape { expected: 6, got: 5, .. }));
    }

    #[test]
    fn test_matrix_row_slices() {
        let m = Matrix::from_row_major(2, 3, vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0]).unwrap();
        assert_eq!(m.row(0), &[1.0, 2.0, 3.0]);
        assert_eq!(m.row(1), &[4.0, 5.0, 6.0]);
    }

    #[test]
    fn test_dataset_target_length_checked() {
        let train = Matrix::from_row_major(2, 1, vec![0.0, 1.0]).unwrap();
        let test = Matrix::from_row_major(1, 1, vec![2.0]).unwrap();
        let err = Dataset::new(train, vec![1.0], test, vec![0.0]).unwrap_err();
        assert!(matches!(err, RecordError::TargetLength { rows: 2, targets: 1 }));
    }

    #[test]
    fn test_dataset_encoding_is_deterministic() {
        let build = || {
            let train = Matrix::from_row_major(2, 2, vec![0.5, 1.0, -1.0, 2.0]).unwrap();
            let test = Matrix::from_row_major(1, 2, vec![3.0, 4.0]).unwrap();
            Dataset::new(train, vec![0.0, 1.0], test, vec![1.0]).unwrap()
        };
        assert_eq!(build().to_bytes(), build().to_bytes());

        let decoded = Dataset::from_bytes(&build().to_bytes()).unwrap();
        assert_eq!(decoded, build());
    }

    #[test]
    fn test_decode_garbage_fails() {
        let err = Examples::from_bytes(&[0xff, 0xff, 0xff]).unwrap_err();
        assert!(matches!(err, RecordError::Decode(_)));
    }
}
