//! Randomly-indexable audio dataset backed by a Kaldi-style wav.scp index.

use std::path::{Path, PathBuf};

use ndarray::Array1;
use once_cell::sync::OnceCell;

use crate::backend::{ArchiveLoader, ScpLoader};
use crate::error::{Result, ScpDataError};

/// One queried item. Fields are populated exactly per the builder flags:
/// an unrequested field is `None`.
#[derive(Debug, Clone, PartialEq)]
pub struct DatasetItem {
    /// Utterance id, when requested.
    pub utt_id: Option<String>,
    /// Audio normalized to `[-1.0, 1.0)`.
    pub audio: Array1<f32>,
    /// Sample rate in Hz, when requested.
    pub sample_rate: Option<u32>,
}

/// Builder for [`AudioScpDataset`].
#[derive(Debug, Clone)]
pub struct AudioScpDatasetBuilder {
    wav_scp: PathBuf,
    segments: Option<PathBuf>,
    length_threshold: Option<usize>,
    return_utt_id: bool,
    return_sample_rate: bool,
    allow_cache: bool,
}

impl AudioScpDatasetBuilder {
    pub fn new(wav_scp: impl Into<PathBuf>) -> Self {
        Self {
            wav_scp: wav_scp.into(),
            segments: None,
            length_threshold: None,
            return_utt_id: false,
            return_sample_rate: false,
            allow_cache: false,
        }
    }

    /// Restrict loading with a Kaldi-style segments file.
    pub fn segments(mut self, path: impl Into<PathBuf>) -> Self {
        self.segments = Some(path.into());
        self
    }

    /// Drop utterances whose sample count does not exceed `threshold`.
    pub fn length_threshold(mut self, threshold: usize) -> Self {
        self.length_threshold = Some(threshold);
        self
    }

    /// Include the utterance id in queried items.
    pub fn return_utt_id(mut self) -> Self {
        self.return_utt_id = true;
        self
    }

    /// Include the sample rate in queried items.
    pub fn return_sample_rate(mut self) -> Self {
        self.return_sample_rate = true;
        self
    }

    /// Cache queried items so repeated accesses skip loading entirely.
    pub fn allow_cache(mut self) -> Self {
        self.allow_cache = true;
        self
    }

    pub fn build(self) -> Result<AudioScpDataset> {
        AudioScpDataset::new(self)
    }
}

/// Fixed-length, randomly-indexable view over the utterances of a wav.scp.
///
/// Construction either fully succeeds or fails; queries after that are pure
/// functions of the index. Workers share one dataset by cloning an
/// `Arc<AudioScpDataset>` at spawn time; cache slots are written at most once
/// and racing writers converge on one stored value, so no lock is needed.
pub struct AudioScpDataset {
    loader: ArchiveLoader,
    utt_ids: Vec<String>,
    return_utt_id: bool,
    return_sample_rate: bool,
    caches: Option<Vec<OnceCell<DatasetItem>>>,
}

impl AudioScpDataset {
    pub fn builder(wav_scp: impl Into<PathBuf>) -> AudioScpDatasetBuilder {
        AudioScpDatasetBuilder::new(wav_scp)
    }

    /// Open a wav.scp with default options.
    pub fn open(wav_scp: &Path) -> Result<Self> {
        Self::builder(wav_scp).build()
    }

    fn new(builder: AudioScpDatasetBuilder) -> Result<Self> {
        let loader = ArchiveLoader::open(&builder.wav_scp, builder.segments.as_deref())?;
        let mut utt_ids = loader.keys().to_vec();

        // Eager filtering: decoding every utterance up front is the accepted
        // cost of cutting on exact sample counts.
        if let Some(threshold) = builder.length_threshold {
            let before = utt_ids.len();
            let mut kept = Vec::with_capacity(before);
            for utt_id in utt_ids {
                let (_, samples) = loader.resolve_pcm(&utt_id)?;
                if samples.len() > threshold {
                    kept.push(utt_id);
                }
            }
            if kept.len() != before {
                crate::verbose!(
                    "Some files are filtered by audio length threshold ({} -> {}).",
                    before,
                    kept.len()
                );
            }
            utt_ids = kept;
        }

        let caches = builder
            .allow_cache
            .then(|| (0..utt_ids.len()).map(|_| OnceCell::new()).collect());

        Ok(Self {
            loader,
            utt_ids,
            return_utt_id: builder.return_utt_id,
            return_sample_rate: builder.return_sample_rate,
            caches,
        })
    }

    /// Number of utterances in the dataset.
    pub fn len(&self) -> usize {
        self.utt_ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.utt_ids.is_empty()
    }

    /// Utterance ids, in enumeration order.
    pub fn utt_ids(&self) -> &[String] {
        &self.utt_ids
    }

    /// Get the item at `idx`.
    ///
    /// A cache hit returns the stored item without touching the loader;
    /// otherwise the utterance is loaded, normalized, and (when caching is
    /// enabled) published into its slot exactly once.
    pub fn get(&self, idx: usize) -> Result<DatasetItem> {
        let utt_id = self
            .utt_ids
            .get(idx)
            .ok_or(ScpDataError::IndexOutOfRange {
                index: idx,
                len: self.utt_ids.len(),
            })?;
        match &self.caches {
            Some(caches) => caches[idx].get_or_try_init(|| self.load(utt_id)).cloned(),
            None => self.load(utt_id),
        }
    }

    fn load(&self, utt_id: &str) -> Result<DatasetItem> {
        let (sample_rate, samples) = self.loader.resolve_pcm(utt_id)?;
        // Assume 16-bit PCM: full scale maps onto [-1.0, 1.0).
        let audio = Array1::from_iter(samples.into_iter().map(|s| f32::from(s) / 32768.0));
        Ok(DatasetItem {
            utt_id: self.return_utt_id.then(|| utt_id.to_string()),
            audio,
            sample_rate: self.return_sample_rate.then_some(sample_rate),
        })
    }
}
