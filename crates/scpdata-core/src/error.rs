//! Error types for scp parsing, backend selection, and dataset access.

use std::path::PathBuf;

use thiserror::Error;

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, ScpDataError>;

/// Unified error type for scp-backed dataset loading.
#[derive(Error, Debug)]
pub enum ScpDataError {
    /// The first scp value matched none of the recognized backend conventions.
    #[error("unsupported scp value format: {value:?}")]
    UnsupportedFormat { value: String },

    /// A key listed in the enumeration domain could not be resolved by the
    /// backing loader.
    #[error("utterance {0:?} cannot be resolved by the backing loader")]
    KeyResolution(String),

    /// An index line did not have the `<utt_id> <value>` two-column shape.
    #[error("malformed entry at {path}:{line}: expected `<utt_id> <value>`")]
    MalformedEntry { path: PathBuf, line: usize },

    /// The index file contained no entries.
    #[error("empty scp file: {0}")]
    EmptyScp(PathBuf),

    /// Dataset queried outside `0..len()`.
    #[error("index {index} out of range for dataset of length {len}")]
    IndexOutOfRange { index: usize, len: usize },

    /// An archive locator that should be a byte offset was not numeric.
    #[error("invalid archive offset {locator:?} for utterance {utt_id:?}")]
    InvalidOffset { utt_id: String, locator: String },

    /// A segments line did not have the `<utt_id> <recording_id> <start> <end>` shape.
    #[error("malformed segment at {path}:{line}")]
    MalformedSegment { path: PathBuf, line: usize },

    #[error("I/O error")]
    Io(#[from] std::io::Error),

    #[error("WAV decode error")]
    Wav(#[from] hound::Error),

    #[cfg(feature = "container")]
    #[error("HDF5 error")]
    Hdf5(#[from] hdf5::Error),

    #[cfg(not(feature = "container"))]
    #[error("scp refers to an .h5 container but the `container` feature is disabled")]
    ContainerDisabled,

    #[error("npy read error")]
    Npy(#[from] ndarray_npy::ReadNpyError),
}
