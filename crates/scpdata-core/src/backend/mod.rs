//! Storage backends for scp-referenced data.
//!
//! Every backend exposes the same two operations: ordered key enumeration and
//! lazy key-based resolution. Which backend serves a given scp file is decided
//! by sniffing the first record only — scp files are assumed homogeneous.

mod archive;
#[cfg(feature = "container")]
mod container;
mod plain;

use std::path::Path;

use ndarray::ArrayD;

pub use archive::ArchiveLoader;
#[cfg(feature = "container")]
pub use container::ContainerLoader;
pub use plain::PlainArrayLoader;

use crate::error::{Result, ScpDataError};
use crate::scp::{self, ScpLocation};

/// The closed set of storage conventions an scp value can refer to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendKind {
    /// Binary archive addressed as `path.ark:offset` (or a bare RIFF file).
    Archive,
    /// Hierarchical container file; `keyed` distinguishes `path.h5:key`
    /// addressing from whole-file `path.h5` addressing.
    Container { keyed: bool },
    /// One plain binary array file per key (`path.npy`).
    PlainArray,
}

/// Classify an scp value by (has_colon, suffix).
///
/// Pure function of the location; performs no I/O.
pub fn classify(location: &ScpLocation) -> Result<BackendKind> {
    let ext = location.extension();
    match (location.locator.is_some(), ext.as_deref()) {
        (true, Some("ark")) => Ok(BackendKind::Archive),
        (true, Some("h5")) => Ok(BackendKind::Container { keyed: true }),
        (false, Some("h5")) => Ok(BackendKind::Container { keyed: false }),
        (false, Some("npy")) => Ok(BackendKind::PlainArray),
        _ => Err(ScpDataError::UnsupportedFormat {
            value: location.to_string(),
        }),
    }
}

/// Data resolved for one utterance key.
#[derive(Debug, Clone, PartialEq)]
pub enum RawPayload {
    /// Raw 16-bit PCM samples with their declared sample rate (archive backend).
    Pcm { sample_rate: u32, samples: Vec<i16> },
    /// A float array (container and plain-array backends).
    Array(ArrayD<f32>),
}

impl RawPayload {
    /// Length along the first axis: sample count for PCM, frame count for arrays.
    pub fn len(&self) -> usize {
        match self {
            RawPayload::Pcm { samples, .. } => samples.len(),
            RawPayload::Array(arr) => arr.shape().first().copied().unwrap_or(0),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Lazy mapping from utterance id to stored data.
///
/// Implementations hold only the parsed index; resolving a key is where
/// on-demand file I/O happens.
pub trait ScpLoader: Send + Sync + std::fmt::Debug {
    /// Enumeration domain, in scp file order.
    fn keys(&self) -> &[String];

    /// Resolve one key to its payload. May block on file I/O.
    fn resolve(&self, key: &str) -> Result<RawPayload>;
}

/// Sniff an scp file's format from its first record and open the matching
/// backend. No payload data is loaded eagerly beyond the index itself.
pub fn open_loader(scp_path: &Path) -> Result<Box<dyn ScpLoader>> {
    let first = scp::first_entry(scp_path)?;
    match classify(&first.location)? {
        BackendKind::Archive => Ok(Box::new(ArchiveLoader::open(scp_path, None)?)),
        #[cfg(feature = "container")]
        BackendKind::Container { .. } => Ok(Box::new(ContainerLoader::open(scp_path)?)),
        #[cfg(not(feature = "container"))]
        BackendKind::Container { .. } => Err(ScpDataError::ContainerDisabled),
        BackendKind::PlainArray => Ok(Box::new(PlainArrayLoader::open(scp_path)?)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kind(value: &str) -> Result<BackendKind> {
        classify(&ScpLocation::parse(value))
    }

    #[test]
    fn test_classify_archive_with_offset() {
        assert_eq!(kind("/data/a.ark:42").unwrap(), BackendKind::Archive);
    }

    #[test]
    fn test_classify_container_keyed() {
        assert_eq!(
            kind("/data/a.h5:feats").unwrap(),
            BackendKind::Container { keyed: true }
        );
    }

    #[test]
    fn test_classify_container_whole_file() {
        assert_eq!(
            kind("/data/a.h5").unwrap(),
            BackendKind::Container { keyed: false }
        );
    }

    #[test]
    fn test_classify_plain_array() {
        assert_eq!(kind("/data/a.npy").unwrap(), BackendKind::PlainArray);
    }

    #[test]
    fn test_classify_rejects_unknown_suffixes() {
        for value in ["/data/a.wav:3", "/data/a.npy:3", "/data/a.ark", "/data/a.txt"] {
            assert!(
                matches!(kind(value), Err(ScpDataError::UnsupportedFormat { .. })),
                "expected UnsupportedFormat for {value}"
            );
        }
    }
}
