use anyhow::{bail, Result};
use log::{debug, error, warn};
use oasgen_har::{read_capture, CaptureFormat, Peer, TaggedEntry};
use oasgen_pipeline::SpecPipeline;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ReplayStats {
    pub files: usize,
    pub failed_files: usize,
    pub entries: u64,
    /// LDJSON lines that did not decode as entries
    pub skipped_lines: usize,
}

/// Capture files under `inputs`, smallest first.
///
/// Files named explicitly are kept whatever their extension so that a
/// mistyped path is reported rather than silently ignored.
pub fn collect_capture_files(inputs: &[PathBuf]) -> Result<Vec<PathBuf>> {
    let mut found: Vec<(u64, PathBuf)> = Vec::new();

    for input in inputs {
        if input.is_file() {
            found.push((file_size(input), input.clone()));
            continue;
        }
        if !input.is_dir() {
            bail!("Input {} does not exist", input.display());
        }

        for entry in WalkDir::new(input).follow_links(true) {
            let entry = match entry {
                Ok(entry) => entry,
                Err(err) => {
                    warn!("Skipping unreadable path under {}: {err}", input.display());
                    continue;
                }
            };
            if !entry.file_type().is_file() || CaptureFormat::from_path(entry.path()).is_none() {
                continue;
            }
            let size = entry.metadata().map(|meta| meta.len()).unwrap_or(0);
            found.push((size, entry.into_path()));
        }
    }

    found.sort();
    found.dedup_by(|a, b| a.1 == b.1);
    Ok(found.into_iter().map(|(_, path)| path).collect())
}

fn file_size(path: &Path) -> u64 {
    path.metadata().map(|meta| meta.len()).unwrap_or(0)
}

pub fn sample_id(seq: u64) -> String {
    format!("{seq:024}")
}

/// Feeds every entry of `files` through `pipeline`, waiting for channel
/// capacity instead of dropping. Unreadable files are logged and skipped.
pub async fn replay_files(
    pipeline: &SpecPipeline,
    files: &[PathBuf],
    default_source: Option<&str>,
) -> Result<ReplayStats> {
    let mut stats = ReplayStats::default();

    for path in files {
        let capture = match read_capture(path) {
            Ok(capture) => capture,
            Err(err) => {
                error!("Skipping {}: {err}", path.display());
                stats.failed_files += 1;
                continue;
            }
        };

        let source = capture
            .source
            .clone()
            .or_else(|| default_source.map(str::to_string))
            .map(Peer::named);
        let count = capture.entries.len();

        for entry in capture.entries {
            stats.entries += 1;
            let mut tagged = TaggedEntry::new(entry).with_sample_id(sample_id(stats.entries));
            if let Some(source) = &source {
                tagged = tagged.with_source(source.clone());
            }
            pipeline.send(tagged).await?;
        }

        stats.files += 1;
        stats.skipped_lines += capture.skipped;
        debug!("Queued {count} entries from {}", path.display());
    }

    Ok(stats)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn sample_ids_are_zero_padded() {
        assert_eq!(sample_id(1), "000000000000000000000001");
        assert_eq!(sample_id(1234).len(), 24);
    }

    #[test]
    fn collects_captures_smallest_first() {
        let temp = tempdir().unwrap();
        let nested = temp.path().join("nested");
        fs::create_dir_all(&nested).unwrap();
        fs::write(temp.path().join("big.har"), "x".repeat(64)).unwrap();
        fs::write(nested.join("small.ldjson"), "x").unwrap();
        fs::write(temp.path().join("notes.txt"), "").unwrap();

        let files = collect_capture_files(&[temp.path().to_path_buf()]).unwrap();
        let names: Vec<_> = files
            .iter()
            .map(|path| path.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["small.ldjson", "big.har"]);
    }

    #[test]
    fn explicit_files_are_kept_once() {
        let temp = tempdir().unwrap();
        let path = temp.path().join("capture.har");
        fs::write(&path, "{}").unwrap();

        let files =
            collect_capture_files(&[path.clone(), temp.path().to_path_buf()]).unwrap();
        assert_eq!(files, vec![path]);
    }

    #[test]
    fn missing_input_is_an_error() {
        let temp = tempdir().unwrap();
        assert!(collect_capture_files(&[temp.path().join("absent")]).is_err());
    }
}
