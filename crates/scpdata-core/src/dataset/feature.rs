//! Randomly-indexable feature dataset backed by a feats.scp index.
//!
//! Unlike the audio dataset, the backend here is not fixed: the scp file is
//! format-sniffed and may resolve through any of the storage backends.

use std::path::{Path, PathBuf};

use ndarray::ArrayD;
use once_cell::sync::OnceCell;

use crate::backend::{RawPayload, ScpLoader, open_loader};
use crate::error::{Result, ScpDataError};

/// One queried feature item.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureItem {
    /// Utterance id, when requested.
    pub utt_id: Option<String>,
    /// Feature array; first axis is time.
    pub feats: ArrayD<f32>,
}

/// Builder for [`FeatureScpDataset`].
#[derive(Debug, Clone)]
pub struct FeatureScpDatasetBuilder {
    feats_scp: PathBuf,
    length_threshold: Option<usize>,
    return_utt_id: bool,
    allow_cache: bool,
}

impl FeatureScpDatasetBuilder {
    pub fn new(feats_scp: impl Into<PathBuf>) -> Self {
        Self {
            feats_scp: feats_scp.into(),
            length_threshold: None,
            return_utt_id: false,
            allow_cache: false,
        }
    }

    /// Drop utterances whose frame count does not exceed `threshold`.
    pub fn length_threshold(mut self, threshold: usize) -> Self {
        self.length_threshold = Some(threshold);
        self
    }

    /// Include the utterance id in queried items.
    pub fn return_utt_id(mut self) -> Self {
        self.return_utt_id = true;
        self
    }

    /// Cache queried items so repeated accesses skip loading entirely.
    pub fn allow_cache(mut self) -> Self {
        self.allow_cache = true;
        self
    }

    pub fn build(self) -> Result<FeatureScpDataset> {
        FeatureScpDataset::new(self)
    }
}

/// Fixed-length, randomly-indexable view over the utterances of a feats.scp.
#[derive(Debug)]
pub struct FeatureScpDataset {
    loader: Box<dyn ScpLoader>,
    utt_ids: Vec<String>,
    return_utt_id: bool,
    caches: Option<Vec<OnceCell<FeatureItem>>>,
}

impl FeatureScpDataset {
    pub fn builder(feats_scp: impl Into<PathBuf>) -> FeatureScpDatasetBuilder {
        FeatureScpDatasetBuilder::new(feats_scp)
    }

    /// Open a feats.scp with default options.
    pub fn open(feats_scp: &Path) -> Result<Self> {
        Self::builder(feats_scp).build()
    }

    fn new(builder: FeatureScpDatasetBuilder) -> Result<Self> {
        let loader = open_loader(&builder.feats_scp)?;
        let mut utt_ids = loader.keys().to_vec();

        if let Some(threshold) = builder.length_threshold {
            let before = utt_ids.len();
            let mut kept = Vec::with_capacity(before);
            for utt_id in utt_ids {
                if loader.resolve(&utt_id)?.len() > threshold {
                    kept.push(utt_id);
                }
            }
            if kept.len() != before {
                crate::verbose!(
                    "Some files are filtered by frame length threshold ({} -> {}).",
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

    /// Get the item at `idx`, through the cache when enabled.
    pub fn get(&self, idx: usize) -> Result<FeatureItem> {
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

    fn load(&self, utt_id: &str) -> Result<FeatureItem> {
        let feats = match self.loader.resolve(utt_id)? {
            RawPayload::Array(array) => array,
            // Archive-stored entries come back as PCM; hand them out as
            // normalized sample vectors like the audio dataset would.
            RawPayload::Pcm { samples, .. } => ndarray::Array1::from_iter(
                samples.into_iter().map(|s| f32::from(s) / 32768.0),
            )
            .into_dyn(),
        };
        Ok(FeatureItem {
            utt_id: self.return_utt_id.then(|| utt_id.to_string()),
            feats,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::{Array2, array};
    use std::io::Write;

    /// feats.scp over npy files with the given frame counts (4-dim features).
    fn fixture_scp(dir: &Path, frames: &[usize]) -> PathBuf {
        let scp = dir.join("feats.scp");
        let mut f = std::fs::File::create(&scp).unwrap();
        for (i, &n) in frames.iter().enumerate() {
            let npy = dir.join(format!("u{i}.npy"));
            ndarray_npy::write_npy(&npy, &Array2::<f32>::zeros((n, 4))).unwrap();
            writeln!(f, "u{i} {}", npy.display()).unwrap();
        }
        scp
    }

    #[test]
    fn test_sniffs_npy_backend_and_reads_arrays() {
        let dir = tempfile::tempdir().unwrap();
        let npy = dir.path().join("u1.npy");
        ndarray_npy::write_npy(&npy, &array![[1.0f32, 2.0], [3.0, 4.0]]).unwrap();
        let scp = dir.path().join("feats.scp");
        writeln!(
            std::fs::File::create(&scp).unwrap(),
            "u1 {}",
            npy.display()
        )
        .unwrap();

        let ds = FeatureScpDataset::builder(&scp).return_utt_id().build().unwrap();
        assert_eq!(ds.len(), 1);
        let item = ds.get(0).unwrap();
        assert_eq!(item.utt_id.as_deref(), Some("u1"));
        assert_eq!(item.feats.shape(), &[2, 2]);
        assert_eq!(item.feats[[1, 1]], 4.0);
    }

    #[test]
    fn test_unsupported_suffix_fails_at_construction() {
        let dir = tempfile::tempdir().unwrap();
        let scp = dir.path().join("feats.scp");
        std::fs::write(&scp, "u1 /data/u1.mat\n").unwrap();
        assert!(matches!(
            FeatureScpDataset::open(&scp).unwrap_err(),
            ScpDataError::UnsupportedFormat { .. }
        ));
    }

    #[test]
    fn test_frame_threshold_filters_short_utterances() {
        let dir = tempfile::tempdir().unwrap();
        let scp = fixture_scp(dir.path(), &[5, 12, 8]);
        let ds = FeatureScpDataset::builder(&scp)
            .length_threshold(8)
            .build()
            .unwrap();
        assert_eq!(ds.utt_ids(), ["u1"]);
    }

    #[test]
    fn test_cached_items_survive_backing_file_removal() {
        let dir = tempfile::tempdir().unwrap();
        let scp = fixture_scp(dir.path(), &[6]);
        let ds = FeatureScpDataset::builder(&scp).allow_cache().build().unwrap();
        let first = ds.get(0).unwrap();
        std::fs::remove_file(dir.path().join("u0.npy")).unwrap();
        assert_eq!(first, ds.get(0).unwrap());
    }

    #[cfg(feature = "container")]
    #[test]
    fn test_sniffs_container_backend() {
        let dir = tempfile::tempdir().unwrap();
        let h5 = dir.path().join("u1.h5");
        let file = hdf5::File::create(&h5).unwrap();
        file.new_dataset_builder()
            .with_data(&array![[7.0f32], [8.0]])
            .create("feats")
            .unwrap();
        drop(file);
        let scp = dir.path().join("feats.scp");
        writeln!(
            std::fs::File::create(&scp).unwrap(),
            "u1 {}",
            h5.display()
        )
        .unwrap();

        let ds = FeatureScpDataset::open(&scp).unwrap();
        let item = ds.get(0).unwrap();
        assert_eq!(item.feats.shape(), &[2, 1]);
        assert_eq!(item.feats[[1, 0]], 8.0);
    }
}
