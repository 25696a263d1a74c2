//! Record schema for serialized credit-scoring datasets
//!
//! The wire types are defined statically and versioned with
//! [`SCHEMA_VERSION`], so producers and consumers agree on the layout at
//! build time. Two shapes are supported:
//! - `records`: per-row sparse feature records (`Examples`) and the dense
//!   train/test `Dataset`
//! - `builder`: typed constructors that keep the records well-formed

pub mod builder;
pub mod errors;
pub mod records;

pub use builder::ExampleBuilder;
pub use errors::RecordError;
pub use records::{
    feature, BytesList, Dataset, Example, Examples, Feature, Features, FloatList, Matrix,
};

/// Version tag of the record layout. Bump whenever a field is added,
/// removed or renumbered.
pub const SCHEMA_VERSION: u32 = 1;

/// Binary encoding shared by every record type.
pub trait Record: prost::Message + Default + Sized {
    /// Serialize into a self-contained byte sequence.
    fn to_bytes(&self) -> Vec<u8> {
        self.encode_to_vec()
    }

    /// Decode a byte sequence produced by [`Record::to_bytes`].
    fn from_bytes(bytes: &[u8]) -> Result<Self, RecordError> {
        Ok(Self::decode(bytes)?)
    }
}

impl<T: prost::Message + Default> Record for T {}
