use oasgen_spec::{parse_bounded, GeneratorConfig};
use serde::{Deserialize, Serialize};

pub const DEFAULT_CHANNEL_CAPACITY: usize = 100;
const MAX_CHANNEL_CAPACITY: usize = 65_536;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Entries buffered between producers and the worker before `push` drops
    pub channel_capacity: usize,

    pub generator: GeneratorConfig,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            channel_capacity: DEFAULT_CHANNEL_CAPACITY,
            generator: GeneratorConfig::default(),
        }
    }
}

impl PipelineConfig {
    /// Defaults overridden by `OASGEN_CHANNEL_CAPACITY` and the generator's
    /// own environment variables.
    pub fn from_env() -> Self {
        Self {
            channel_capacity: parse_bounded(
                std::env::var("OASGEN_CHANNEL_CAPACITY").ok().as_deref(),
                DEFAULT_CHANNEL_CAPACITY,
                1,
                MAX_CHANNEL_CAPACITY,
            ),
            generator: GeneratorConfig::from_env(),
        }
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.channel_capacity == 0 {
            return Err("channel_capacity must be at least 1".to_string());
        }
        self.generator.validate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_valid() {
        let config = PipelineConfig::default();
        assert_eq!(config.channel_capacity, 100);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn zero_capacity_is_rejected() {
        let config = PipelineConfig {
            channel_capacity: 0,
            ..PipelineConfig::default()
        };
        assert!(config.validate().is_err());
    }
}
