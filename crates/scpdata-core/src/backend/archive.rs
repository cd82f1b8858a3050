//! Binary-archive backend: wav.scp entries pointing into RIFF data.
//!
//! Entries are `path.ark:offset` (RIFF stream embedded in an archive at a
//! byte offset) or a bare path to a RIFF file. An optional Kaldi-style
//! segments file remaps the key domain from recordings to sub-utterances.

use std::collections::HashMap;
use std::fs::File;
use std::io::{BufRead, BufReader, Seek, SeekFrom};
use std::path::{Path, PathBuf};

use super::{RawPayload, ScpLoader};
use crate::error::{Result, ScpDataError};
use crate::scp;

#[derive(Debug, Clone)]
struct ArchiveEntry {
    path: PathBuf,
    offset: Option<u64>,
}

#[derive(Debug, Clone)]
struct Segment {
    recording_id: String,
    /// Start of the segment in seconds.
    start: f64,
    /// End of the segment in seconds; negative means end of recording.
    end: f64,
}

/// Lazy loader over a wav.scp index, optionally restricted by a segments file.
#[derive(Debug)]
pub struct ArchiveLoader {
    keys: Vec<String>,
    recordings: HashMap<String, ArchiveEntry>,
    segments: Option<HashMap<String, Segment>>,
}

impl ArchiveLoader {
    /// Parse the index (and segments, when given) without touching any audio
    /// data. With segments, the key domain becomes the segment utterance ids
    /// and every referenced recording must exist in the index.
    pub fn open(wav_scp: &Path, segments: Option<&Path>) -> Result<Self> {
        let mut keys = Vec::new();
        let mut recordings = HashMap::new();
        for entry in scp::read_scp(wav_scp)? {
            let offset = match &entry.location.locator {
                Some(locator) => {
                    Some(locator.parse::<u64>().map_err(|_| {
                        ScpDataError::InvalidOffset {
                            utt_id: entry.utt_id.clone(),
                            locator: locator.clone(),
                        }
                    })?)
                }
                None => None,
            };
            keys.push(entry.utt_id.clone());
            recordings.insert(
                entry.utt_id,
                ArchiveEntry {
                    path: entry.location.path,
                    offset,
                },
            );
        }

        let segments = match segments {
            Some(path) => {
                let (segment_keys, segment_map) = read_segments(path)?;
                for seg in segment_map.values() {
                    if !recordings.contains_key(&seg.recording_id) {
                        return Err(ScpDataError::KeyResolution(seg.recording_id.clone()));
                    }
                }
                keys = segment_keys;
                Some(segment_map)
            }
            None => None,
        };

        Ok(Self {
            keys,
            recordings,
            segments,
        })
    }

    /// Resolve one key to its sample rate and raw 16-bit samples.
    pub fn resolve_pcm(&self, key: &str) -> Result<(u32, Vec<i16>)> {
        match &self.segments {
            Some(segments) => {
                let seg = segments
                    .get(key)
                    .ok_or_else(|| ScpDataError::KeyResolution(key.to_string()))?;
                let (rate, samples) = self.load_recording(&seg.recording_id)?;
                let start = ((seg.start * rate as f64) as usize).min(samples.len());
                let end = if seg.end < 0.0 {
                    samples.len()
                } else {
                    ((seg.end * rate as f64) as usize).min(samples.len())
                };
                Ok((rate, samples[start..end.max(start)].to_vec()))
            }
            None => self.load_recording(key),
        }
    }

    fn load_recording(&self, recording_id: &str) -> Result<(u32, Vec<i16>)> {
        let entry = self
            .recordings
            .get(recording_id)
            .ok_or_else(|| ScpDataError::KeyResolution(recording_id.to_string()))?;
        read_riff(&entry.path, entry.offset)
    }
}

impl ScpLoader for ArchiveLoader {
    fn keys(&self) -> &[String] {
        &self.keys
    }

    fn resolve(&self, key: &str) -> Result<RawPayload> {
        let (sample_rate, samples) = self.resolve_pcm(key)?;
        Ok(RawPayload::Pcm {
            sample_rate,
            samples,
        })
    }
}

/// Decode a RIFF stream with hound, seeking to `offset` first when present.
///
/// Samples are read as i16; other bit depths surface hound's decode error.
fn read_riff(path: &Path, offset: Option<u64>) -> Result<(u32, Vec<i16>)> {
    let mut file = BufReader::new(File::open(path)?);
    if let Some(offset) = offset {
        file.seek(SeekFrom::Start(offset))?;
    }
    let mut reader = hound::WavReader::new(file)?;
    let sample_rate = reader.spec().sample_rate;
    let samples = reader
        .samples::<i16>()
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok((sample_rate, samples))
}

/// Parse a segments file: `<utt_id> <recording_id> <start> <end>` per line,
/// times in seconds, `end < 0` meaning end of recording.
fn read_segments(path: &Path) -> Result<(Vec<String>, HashMap<String, Segment>)> {
    let reader = BufReader::new(File::open(path)?);
    let mut keys = Vec::new();
    let mut map = HashMap::new();
    for (lineno, line) in reader.lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let malformed = || ScpDataError::MalformedSegment {
            path: path.to_path_buf(),
            line: lineno + 1,
        };
        let mut cols = line.split_whitespace();
        let (Some(utt_id), Some(recording_id), Some(start), Some(end), None) = (
            cols.next(),
            cols.next(),
            cols.next(),
            cols.next(),
            cols.next(),
        ) else {
            return Err(malformed());
        };
        let start = start.parse::<f64>().map_err(|_| malformed())?;
        let end = end.parse::<f64>().map_err(|_| malformed())?;
        keys.push(utt_id.to_string());
        map.insert(
            utt_id.to_string(),
            Segment {
                recording_id: recording_id.to_string(),
                start,
                end,
            },
        );
    }
    Ok((keys, map))
}
