use anyhow::{Context, Result};
use log::info;
use oasgen_spec::OpenApi;
use std::collections::BTreeMap;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

/// File a destination's spec is written to. Path separators cannot appear
/// in a file name and are replaced.
pub fn spec_path(dir: &Path, destination: &str) -> PathBuf {
    let name: String = destination
        .chars()
        .map(|c| if matches!(c, '/' | '\\') { '_' } else { c })
        .collect();
    dir.join(format!("{name}.json"))
}

pub fn write_specs(dir: &Path, specs: &BTreeMap<String, OpenApi>) -> Result<()> {
    fs::create_dir_all(dir)
        .with_context(|| format!("Failed to create output directory {}", dir.display()))?;

    for (destination, spec) in specs {
        let path = spec_path(dir, destination);
        let json = serde_json::to_string_pretty(spec)?;
        fs::write(&path, json).with_context(|| format!("Failed to write {}", path.display()))?;
        info!("Wrote {} ({} paths)", path.display(), spec.paths.len());
    }
    Ok(())
}

/// Prints `{destination: spec}` as one JSON document.
pub fn print_specs(specs: &BTreeMap<String, OpenApi>) -> Result<()> {
    let stdout = io::stdout();
    let mut out = stdout.lock();
    serde_json::to_writer_pretty(&mut out, specs)?;
    writeln!(out)?;
    out.flush()?;
    Ok(())
}
