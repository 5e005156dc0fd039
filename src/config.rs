use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

pub const DEFAULT_MAX_PASSES: usize = 100;
pub const DEFAULT_CLOCK_PERIOD: u64 = 2;

/// Tunables of the simulation engine. Missing fields take their defaults.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct EngineConfig {
    /// Cap on combinational passes per tick. Reaching it flags oscillation.
    pub max_passes: usize,
    /// Period used by clocks whose `period` param is missing.
    pub default_clock_period: u64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_passes: DEFAULT_MAX_PASSES,
            default_clock_period: DEFAULT_CLOCK_PERIOD,
        }
    }
}

impl EngineConfig {
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json(&text)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn partial_config_keeps_defaults() {
        let config = EngineConfig::from_json(r#"{ "maxPasses": 8 }"#).unwrap();
        assert_eq!(config.max_passes, 8);
        assert_eq!(config.default_clock_period, DEFAULT_CLOCK_PERIOD);
        assert_eq!(EngineConfig::from_json("{}").unwrap(), EngineConfig::default());
    }

    #[test]
    fn malformed_config_is_an_error() {
        assert!(matches!(
            EngineConfig::from_json("{ maxPasses: }"),
            Err(ConfigError::Json(_))
        ));
    }

    #[test]
    fn load_reads_a_file() {
        let path = std::env::temp_dir().join(format!(
            "circuitsim-config-{}.json",
            std::process::id()
        ));
        std::fs::write(&path, r#"{ "defaultClockPeriod": 5 }"#).unwrap();
        let config = EngineConfig::load(&path).unwrap();
        std::fs::remove_file(&path).unwrap();
        assert_eq!(config.default_clock_period, 5);
        assert_eq!(config.max_passes, DEFAULT_MAX_PASSES);
        assert!(matches!(EngineConfig::load(&path), Err(ConfigError::Io(_))));
    }
}
