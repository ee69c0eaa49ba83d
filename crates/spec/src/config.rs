use serde::{Deserialize, Serialize};

pub const DEFAULT_MAX_EXAMPLES: usize = 5;
pub const DEFAULT_COMPACTION_MIN_SIBLINGS: usize = 10;
pub const DEFAULT_MAX_EXAMPLE_LEN: usize = 1024;

const MAX_EXAMPLES_LIMIT: usize = 100;
const MAX_COMPACTION_MIN_SIBLINGS: usize = 10_000;

/// Tunables for one [`crate::SpecGenerator`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneratorConfig {
    /// Upper bound on examples kept per parameter, header and form field
    pub max_examples: usize,

    /// Constant siblings of identical shape needed before they fold into a
    /// path parameter
    pub compaction_min_siblings: usize,

    /// Example strings longer than this are truncated
    pub max_example_len: usize,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            max_examples: DEFAULT_MAX_EXAMPLES,
            compaction_min_siblings: DEFAULT_COMPACTION_MIN_SIBLINGS,
            max_example_len: DEFAULT_MAX_EXAMPLE_LEN,
        }
    }
}

impl GeneratorConfig {
    /// Defaults overridden by `OASGEN_MAX_EXAMPLES` and
    /// `OASGEN_COMPACTION_MIN_SIBLINGS`. Unparseable values are ignored.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            max_examples: parse_bounded(
                std::env::var("OASGEN_MAX_EXAMPLES").ok().as_deref(),
                defaults.max_examples,
                1,
                MAX_EXAMPLES_LIMIT,
            ),
            compaction_min_siblings: parse_bounded(
                std::env::var("OASGEN_COMPACTION_MIN_SIBLINGS")
                    .ok()
                    .as_deref(),
                defaults.compaction_min_siblings,
                2,
                MAX_COMPACTION_MIN_SIBLINGS,
            ),
            ..defaults
        }
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.max_examples == 0 {
            return Err("max_examples must be at least 1".to_string());
        }
        if self.compaction_min_siblings < 2 {
            return Err("compaction_min_siblings must be at least 2".to_string());
        }
        if self.max_example_len == 0 {
            return Err("max_example_len must be at least 1".to_string());
        }
        Ok(())
    }
}

pub fn parse_bounded(raw: Option<&str>, default_value: usize, min: usize, max: usize) -> usize {
    raw.map(str::trim)
        .filter(|v| !v.is_empty())
        .and_then(|v| v.parse::<usize>().ok())
        .unwrap_or(default_value)
        .clamp(min, max)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_bounded_defaults_and_clamps() {
        assert_eq!(parse_bounded(None, 5, 1, 100), 5);
        assert_eq!(parse_bounded(Some(""), 5, 1, 100), 5);
        assert_eq!(parse_bounded(Some("  7 "), 5, 1, 100), 7);
        assert_eq!(parse_bounded(Some("nope"), 5, 1, 100), 5);
        assert_eq!(parse_bounded(Some("0"), 5, 1, 100), 1);
        assert_eq!(parse_bounded(Some("5000"), 5, 1, 100), 100);
    }

    #[test]
    fn validate_rejects_degenerate_values() {
        assert!(GeneratorConfig::default().validate().is_ok());

        let config = GeneratorConfig {
            compaction_min_siblings: 1,
            ..GeneratorConfig::default()
        };
        assert!(config.validate().is_err());

        let config = GeneratorConfig {
            max_examples: 0,
            ..GeneratorConfig::default()
        };
        assert!(config.validate().is_err());
    }
}
