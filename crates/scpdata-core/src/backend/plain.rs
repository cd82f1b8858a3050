//! Plain-array backend: one `.npy` file per key.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use ndarray::ArrayD;

use super::{RawPayload, ScpLoader};
use crate::error::{Result, ScpDataError};
use crate::scp;

/// Lazy loader over an scp index of plain array-on-disk files.
#[derive(Debug)]
pub struct PlainArrayLoader {
    keys: Vec<String>,
    entries: HashMap<String, PathBuf>,
}

impl PlainArrayLoader {
    pub fn open(scp_path: &Path) -> Result<Self> {
        let mut keys = Vec::new();
        let mut entries = HashMap::new();
        for entry in scp::read_scp(scp_path)? {
            // Plain-array entries are bare paths; a locator has no meaning here.
            if entry.location.locator.is_some() {
                return Err(ScpDataError::UnsupportedFormat {
                    value: entry.location.to_string(),
                });
            }
            keys.push(entry.utt_id.clone());
            entries.insert(entry.utt_id, entry.location.path);
        }
        Ok(Self { keys, entries })
    }
}

impl ScpLoader for PlainArrayLoader {
    fn keys(&self) -> &[String] {
        &self.keys
    }

    fn resolve(&self, key: &str) -> Result<RawPayload> {
        let path = self
            .entries
            .get(key)
            .ok_or_else(|| ScpDataError::KeyResolution(key.to_string()))?;
        let array: ArrayD<f32> = ndarray_npy::read_npy(path)?;
        Ok(RawPayload::Array(array))
    }
}
