//! Parsing of Kaldi-style scp index files.
//!
//! An scp file is whitespace-separated two-column text, one record per line:
//! `<utt_id> <value>`, where `<value>` is either a bare path or `path:locator`.
//! Index files are read-only inputs; this module never writes them.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};

use crate::error::{Result, ScpDataError};

/// One record of an scp index file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScpEntry {
    /// Unique utterance (or recording) id.
    pub utt_id: String,
    /// Where the referenced data lives.
    pub location: ScpLocation,
}

/// The value column of an scp record, split into path and optional locator.
///
/// `path:locator` form splits on the first colon; a bare value has no locator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScpLocation {
    pub path: PathBuf,
    pub locator: Option<String>,
}

impl ScpLocation {
    /// Parse the raw value column.
    pub fn parse(value: &str) -> Self {
        match value.split_once(':') {
            Some((path, locator)) => Self {
                path: PathBuf::from(path),
                locator: Some(locator.to_string()),
            },
            None => Self {
                path: PathBuf::from(value),
                locator: None,
            },
        }
    }

    /// Extension of the path component, lowercased.
    pub fn extension(&self) -> Option<String> {
        self.path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_lowercase())
    }
}

impl std::fmt::Display for ScpLocation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.locator {
            Some(locator) => write!(f, "{}:{locator}", self.path.display()),
            None => write!(f, "{}", self.path.display()),
        }
    }
}

/// Read a whole scp file, preserving record order. Blank lines are skipped;
/// anything other than two columns is a malformed entry.
pub fn read_scp(path: &Path) -> Result<Vec<ScpEntry>> {
    let reader = BufReader::new(File::open(path)?);
    let mut entries = Vec::new();
    for (lineno, line) in reader.lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        entries.push(parse_line(&line, path, lineno + 1)?);
    }
    Ok(entries)
}

/// Read only the first record of an scp file, for format sniffing.
pub fn first_entry(path: &Path) -> Result<ScpEntry> {
    let reader = BufReader::new(File::open(path)?);
    for (lineno, line) in reader.lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        return parse_line(&line, path, lineno + 1);
    }
    Err(ScpDataError::EmptyScp(path.to_path_buf()))
}

fn parse_line(line: &str, path: &Path, lineno: usize) -> Result<ScpEntry> {
    let mut cols = line.split_whitespace();
    let (Some(utt_id), Some(value), None) = (cols.next(), cols.next(), cols.next()) else {
        return Err(ScpDataError::MalformedEntry {
            path: path.to_path_buf(),
            line: lineno,
        });
    };
    Ok(ScpEntry {
        utt_id: utt_id.to_string(),
        location: ScpLocation::parse(value),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_scp(dir: &Path, name: &str, contents: &str) -> PathBuf {
        let path = dir.join(name);
        let mut f = File::create(&path).unwrap();
        f.write_all(contents.as_bytes()).unwrap();
        path
    }

    #[test]
    fn test_read_scp_preserves_order() {
        let dir = tempfile::tempdir().unwrap();
        let scp = write_scp(
            dir.path(),
            "wav.scp",
            "u1 /data/u1.ark:0\nu2 /data/u2.ark:123\n\nu3 /data/u3.wav\n",
        );
        let entries = read_scp(&scp).unwrap();
        assert_eq!(entries.len(), 3);
        assert_eq!(entries[0].utt_id, "u1");
        assert_eq!(entries[1].location.locator.as_deref(), Some("123"));
        assert_eq!(entries[2].location.locator, None);
        assert_eq!(entries[2].location.path, PathBuf::from("/data/u3.wav"));
    }

    #[test]
    fn test_location_splits_on_first_colon() {
        let loc = ScpLocation::parse("/data/feats.h5:mel:v2");
        assert_eq!(loc.path, PathBuf::from("/data/feats.h5"));
        assert_eq!(loc.locator.as_deref(), Some("mel:v2"));
    }

    #[test]
    fn test_malformed_line_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let scp = write_scp(dir.path(), "bad.scp", "u1 /data/u1.ark:0 extra\n");
        let err = read_scp(&scp).unwrap_err();
        assert!(matches!(
            err,
            ScpDataError::MalformedEntry { line: 1, .. }
        ));
    }

    #[test]
    fn test_first_entry_of_empty_file() {
        let dir = tempfile::tempdir().unwrap();
        let scp = write_scp(dir.path(), "empty.scp", "\n\n");
        assert!(matches!(
            first_entry(&scp).unwrap_err(),
            ScpDataError::EmptyScp(_)
        ));
    }
}
