//! Container configuration, loadable from YAML.

use crate::error::ConfigError;
use serde::Deserialize;
use std::fs::File;
use std::io;
use std::path::Path;

fn default_max_depth() -> usize {
  64
}

fn default_detect_cycles() -> bool {
  true
}

/// Tuning knobs for a [`Container`](crate::Container).
///
/// ```yaml
/// max_depth: 32
/// detect_cycles: true
/// ```
#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct ContainerConfig {
  /// Deepest chain of nested resolutions allowed before failing.
  #[serde(default = "default_max_depth")]
  pub max_depth: usize,
  /// Fail fast when a key is re-entered while it is being resolved. When
  /// disabled, cycles are stopped by `max_depth` instead.
  #[serde(default = "default_detect_cycles")]
  pub detect_cycles: bool,
}

impl Default for ContainerConfig {
  fn default() -> Self {
    Self {
      max_depth: default_max_depth(),
      detect_cycles: default_detect_cycles(),
    }
  }
}

impl ContainerConfig {
  pub fn from_yaml_str(yaml: &str) -> Result<Self, ConfigError> {
    let config: ContainerConfig =
      serde_yaml::from_str(yaml).map_err(|e| ConfigError::Parse(e.to_string()))?;
    config.validate()
  }

  pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
    let reader = io::BufReader::new(File::open(path)?);
    let config: ContainerConfig =
      serde_yaml::from_reader(reader).map_err(|e| ConfigError::Parse(e.to_string()))?;
    config.validate()
  }

  fn validate(self) -> Result<Self, ConfigError> {
    if self.max_depth == 0 {
      return Err(ConfigError::InvalidValue {
        field: "max_depth".to_owned(),
        message: "must be at least 1".to_owned(),
      });
    }
    Ok(self)
  }
}
