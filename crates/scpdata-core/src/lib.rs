pub mod backend;
pub mod dataset;
pub mod error;
pub mod scp;
pub mod verbose;

pub use backend::{ArchiveLoader, BackendKind, PlainArrayLoader, RawPayload, ScpLoader, classify, open_loader};
#[cfg(feature = "container")]
pub use backend::ContainerLoader;
pub use dataset::{
    AudioScpDataset, AudioScpDatasetBuilder, DatasetItem, FeatureItem, FeatureScpDataset,
    FeatureScpDatasetBuilder,
};
pub use error::{Result, ScpDataError};
pub use scp::{ScpEntry, ScpLocation, first_entry, read_scp};
pub use verbose::set_verbose;
