use std::collections::BTreeMap;

use crate::records::{Example, Examples, Feature, Features};

/// Accumulates the named features of one row.
#[derive(Debug, Default, Clone)]
pub struct ExampleBuilder {
    features: BTreeMap<String, Feature>,
}

impl ExampleBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn float(mut self, name: impl Into<String>, value: f32) -> Self {
        self.features.insert(name.into(), Feature::float(value));
        self
    }

    pub fn bytes(mut self, name: impl Into<String>, value: impl Into<Vec<u8>>) -> Self {
        self.features.insert(name.into(), Feature::bytes(value));
        self
    }

    /// Insert an already-built feature, replacing any previous value.
    pub fn insert(&mut self, name: impl Into<String>, feature: Feature) {
        self.features.insert(name.into(), feature);
    }

    pub fn len(&self) -> usize {
        self.features.len()
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }

    pub fn build(self) -> Example {
        Example {
            features: Some(Features {
                feature: self.features,
            }),
        }
    }
}

impl FromIterator<Example> for Examples {
    fn from_iter<I: IntoIterator<Item = Example>>(iter: I) -> Self {
        Self {
            examples: iter.into_iter().collect(),
        }
    }
}
