use crate::{Entry, HarError, Result};
use log::warn;
use serde::Deserialize;
use std::fs;
use std::io::{BufRead, BufReader};
use std::path::Path;

/// Metadata key naming the capture source in the first LDJSON line.
const LDJSON_SOURCE_KEY: &str = "_source";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaptureFormat {
    /// A single HAR document (`{"log": {"entries": [...]}}`)
    Har,
    /// A metadata line followed by one entry per line
    Ldjson,
}

impl CaptureFormat {
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_ascii_lowercase();
        match ext.as_str() {
            "har" => Some(Self::Har),
            "ldjson" => Some(Self::Ldjson),
            _ => None,
        }
    }
}

/// Entries read from one capture file.
#[derive(Debug, Clone, Default)]
pub struct Capture {
    /// Source identity declared by the capture, if any
    pub source: Option<String>,
    pub entries: Vec<Entry>,
    /// Lines that could not be decoded as entries
    pub skipped: usize,
}

#[derive(Deserialize)]
struct HarDocument {
    log: HarLog,
}

#[derive(Deserialize)]
struct HarLog {
    #[serde(default)]
    entries: Vec<Entry>,
}

pub fn read_capture(path: &Path) -> Result<Capture> {
    match CaptureFormat::from_path(path) {
        Some(CaptureFormat::Har) => read_har(path),
        Some(CaptureFormat::Ldjson) => read_ldjson(path),
        None => Err(HarError::UnsupportedFile(path.display().to_string())),
    }
}

pub fn read_har(path: &Path) -> Result<Capture> {
    let data = fs::read(path)?;
    let document: HarDocument = serde_json::from_slice(&data)?;
    Ok(Capture {
        source: None,
        entries: document.log.entries,
        skipped: 0,
    })
}

pub fn read_ldjson(path: &Path) -> Result<Capture> {
    let reader = BufReader::new(fs::File::open(path)?);
    let mut capture = Capture::default();
    let mut meta_seen = false;

    for line in reader.lines() {
        let line = line?;
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }

        if !meta_seen {
            let meta: serde_json::Value = serde_json::from_str(trimmed)?;
            capture.source = meta
                .get(LDJSON_SOURCE_KEY)
                .and_then(|value| value.as_str())
                .map(str::to_string);
            meta_seen = true;
            continue;
        }

        match serde_json::from_str::<Entry>(trimmed) {
            Ok(entry) => capture.entries.push(entry),
            Err(err) => {
                warn!("Failed decoding entry in {}: {err}", path.display());
                capture.skipped += 1;
            }
        }
    }

    Ok(capture)
}
