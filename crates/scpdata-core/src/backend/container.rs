//! Container backend: scp entries addressing datasets inside HDF5 files.
//!
//! Entries are `path.h5:dataset_key` or a bare `path.h5`, which defaults to
//! the `feats` dataset. Files are opened per access; nothing is cached here.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use super::{RawPayload, ScpLoader};
use crate::error::{Result, ScpDataError};
use crate::scp;

/// Dataset name used for whole-file addressing.
const DEFAULT_DATASET: &str = "feats";

/// Lazy loader over an scp index of HDF5-stored arrays.
#[derive(Debug)]
pub struct ContainerLoader {
    keys: Vec<String>,
    entries: HashMap<String, (PathBuf, String)>,
}

impl ContainerLoader {
    pub fn open(scp_path: &Path) -> Result<Self> {
        let mut keys = Vec::new();
        let mut entries = HashMap::new();
        for entry in scp::read_scp(scp_path)? {
            let dataset = entry
                .location
                .locator
                .clone()
                .unwrap_or_else(|| DEFAULT_DATASET.to_string());
            keys.push(entry.utt_id.clone());
            entries.insert(entry.utt_id, (entry.location.path, dataset));
        }
        Ok(Self { keys, entries })
    }
}

impl ScpLoader for ContainerLoader {
    fn keys(&self) -> &[String] {
        &self.keys
    }

    fn resolve(&self, key: &str) -> Result<RawPayload> {
        let (path, dataset) = self
            .entries
            .get(key)
            .ok_or_else(|| ScpDataError::KeyResolution(key.to_string()))?;
        let file = hdf5::File::open(path)?;
        let array = file.dataset(dataset)?.read_dyn::<f32>()?;
        Ok(RawPayload::Array(array))
    }
}
