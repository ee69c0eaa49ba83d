use anyhow::{Context, Result};
use log::{debug, warn};
use oasgen_pipeline::ServiceRegistry;
use oasgen_spec::OpenApi;
use std::fs;
use std::path::{Path, PathBuf};

/// Loads every `<destination>.json` directly under `dir` into `registry`.
/// Documents that do not parse are skipped with a warning.
pub fn load_specs(registry: &ServiceRegistry, dir: &Path) -> Result<usize> {
    let listing = fs::read_dir(dir)
        .with_context(|| format!("Failed to read spec directory {}", dir.display()))?;

    let mut paths: Vec<PathBuf> = listing
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| path.is_file() && path.extension().is_some_and(|ext| ext == "json"))
        .collect();
    paths.sort();

    let mut loaded = 0;
    for path in paths {
        let Some(destination) = path.file_stem().and_then(|stem| stem.to_str()) else {
            continue;
        };
        let spec = match read_spec(&path) {
            Ok(spec) => spec,
            Err(err) => {
                warn!("Skipping spec {}: {err:#}", path.display());
                continue;
            }
        };
        debug!(
            "Loading {} path(s) for {destination} from {}",
            spec.paths.len(),
            path.display()
        );
        registry.load_from_spec(destination, spec);
        loaded += 1;
    }

    Ok(loaded)
}

fn read_spec(path: &Path) -> Result<OpenApi> {
    let data = fs::read(path)?;
    let spec = serde_json::from_slice(&data).context("not an OpenAPI document")?;
    Ok(spec)
}

#[cfg(test)]
mod tests {
    use super::*;
    use oasgen_spec::GeneratorConfig;
    use pretty_assertions::assert_eq;
    use tempfile::tempdir;

    #[test]
    fn loads_json_documents_and_skips_the_rest() {
        let temp = tempdir().unwrap();
        let spec = OpenApi::skeleton("http://users.local");
        fs::write(
            temp.path().join("users.local.json"),
            serde_json::to_vec(&spec).unwrap(),
        )
        .unwrap();
        fs::write(temp.path().join("broken.json"), "{").unwrap();
        fs::write(temp.path().join("README.md"), "specs").unwrap();

        let registry = ServiceRegistry::new(GeneratorConfig::default());
        let loaded = load_specs(&registry, temp.path()).unwrap();

        assert_eq!(loaded, 1);
        let generator = registry.get_or_create("users.local");
        assert_eq!(generator.server_url(), "http://users.local");
    }

    #[test]
    fn missing_directory_is_an_error() {
        let temp = tempdir().unwrap();
        let registry = ServiceRegistry::default();
        assert!(load_specs(&registry, &temp.path().join("absent")).is_err());
    }
}
