//! Randomly-indexable dataset views over scp indexes.

mod audio;
mod feature;

pub use audio::{AudioScpDataset, AudioScpDatasetBuilder, DatasetItem};
pub use feature::{FeatureItem, FeatureScpDataset, FeatureScpDatasetBuilder};
