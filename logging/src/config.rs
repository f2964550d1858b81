//! Logging configuration: the raw YAML model and its validated form.
//!
//! ```yaml
//! version: 1
//! appenders:
//!   console:
//!     kind: console
//!     encoder: { format: compact, ansi: false }
//!   audit:
//!     kind: rolling_file
//!     directory: logs
//!     file_name_prefix: audit
//!     rotation: daily
//! loggers:
//!   root: { level: info, appenders: [console] }
//!   coop_ioc: { level: debug, appenders: [audit] }
//! ```

use crate::error::{Error, Result};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::PathBuf;
use tracing_core::metadata::LevelFilter;
use tracing_subscriber::filter::Targets;

/// Name of the logger whose level applies to every target without its own rule.
pub const ROOT_LOGGER: &str = "root";

// --- Top Level Config ---

#[derive(Debug, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct ConfigRaw {
  #[serde(default = "default_version")]
  pub version: u32,
  #[serde(default)]
  pub appenders: BTreeMap<String, AppenderConfigRaw>,
  #[serde(default)]
  pub loggers: BTreeMap<String, LoggerConfigRaw>,
}

fn default_version() -> u32 {
  1
}

impl Default for ConfigRaw {
  fn default() -> Self {
    Self {
      version: default_version(),
      appenders: BTreeMap::new(),
      loggers: BTreeMap::new(),
    }
  }
}

// --- Appender Config ---

#[derive(Debug, Deserialize, PartialEq)]
#[serde(tag = "kind", rename_all = "snake_case", deny_unknown_fields)]
pub enum AppenderConfigRaw {
  Console {
    #[serde(default)]
    encoder: EncoderConfig,
  },
  File {
    path: String,
    #[serde(default)]
    encoder: EncoderConfig,
  },
  RollingFile {
    directory: String,
    #[serde(default = "default_file_name_prefix")]
    file_name_prefix: String,
    #[serde(default = "default_file_name_suffix")]
    file_name_suffix: String,
    #[serde(default)]
    rotation: Rotation,
    #[serde(default)]
    encoder: EncoderConfig,
  },
}

fn default_file_name_prefix() -> String {
  "coop".to_string()
}

fn default_file_name_suffix() -> String {
  "log".to_string()
}

impl AppenderConfigRaw {
  pub fn encoder(&self) -> &EncoderConfig {
    match self {
      AppenderConfigRaw::Console { encoder }
      | AppenderConfigRaw::File { encoder, .. }
      | AppenderConfigRaw::RollingFile { encoder, .. } => encoder,
    }
  }
}

/// Time-based rotation for `rolling_file` appenders.
#[derive(Debug, Deserialize, PartialEq, Eq, Clone, Copy, Default)]
#[serde(rename_all = "snake_case")]
pub enum Rotation {
  Minutely,
  Hourly,
  #[default]
  Daily,
  Never,
}

impl From<Rotation> for tracing_appender::rolling::Rotation {
  fn from(rotation: Rotation) -> Self {
    match rotation {
      Rotation::Minutely => tracing_appender::rolling::Rotation::MINUTELY,
      Rotation::Hourly => tracing_appender::rolling::Rotation::HOURLY,
      Rotation::Daily => tracing_appender::rolling::Rotation::DAILY,
      Rotation::Never => tracing_appender::rolling::Rotation::NEVER,
    }
  }
}

// --- Encoder Config ---

#[derive(Debug, Deserialize, PartialEq, Eq, Clone, Copy, Default)]
#[serde(rename_all = "snake_case")]
pub enum Format {
  #[default]
  Full,
  Compact,
}

fn default_true() -> bool {
  true
}

#[derive(Debug, Deserialize, PartialEq, Clone)]
#[serde(deny_unknown_fields)]
pub struct EncoderConfig {
  #[serde(default)]
  pub format: Format,
  #[serde(default)]
  pub ansi: bool,
  #[serde(default = "default_true")]
  pub with_target: bool,
  #[serde(default)]
  pub with_thread_names: bool,
  /// An `EnvFilter` directive string (e.g. `"info,coop_ioc=trace"`). When set
  /// it replaces the filter derived from the loggers section for this appender.
  #[serde(default)]
  pub filter: Option<String>,
}

impl Default for EncoderConfig {
  fn default() -> Self {
    Self {
      format: Format::default(),
      ansi: false,
      with_target: true,
      with_thread_names: false,
      filter: None,
    }
  }
}

// --- Logger Config ---

#[derive(Debug, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct LoggerConfigRaw {
  pub level: String,
  #[serde(default)]
  pub appenders: Vec<String>,
}

// --- Processed Config ---

#[derive(Debug, Clone, PartialEq)]
pub enum AppenderKind {
  Console,
  File {
    path: PathBuf,
  },
  RollingFile {
    directory: PathBuf,
    file_name_prefix: String,
    file_name_suffix: String,
    rotation: Rotation,
  },
}

/// One validated appender, with the filter that decides what reaches it.
#[derive(Debug, Clone)]
pub struct AppenderInternal {
  pub name: String,
  pub kind: AppenderKind,
  pub encoder: EncoderConfig,
  pub targets: Targets,
}

#[derive(Debug, Clone)]
pub struct ConfigInternal {
  pub appenders: Vec<AppenderInternal>,
}

#[derive(Debug, Clone, PartialEq)]
struct LoggerInternal {
  name: String,
  min_level: LevelFilter,
  appender_names: Vec<String>,
}

/// Validates a raw configuration and computes each appender's filter.
///
/// Without a `root` logger, every appender receives `INFO` and above.
pub fn process_raw_config(raw: ConfigRaw) -> Result<ConfigInternal> {
  if raw.version != 1 {
    return Err(Error::InvalidConfigValue {
      field: "version".to_string(),
      message: format!("unsupported version {}", raw.version),
    });
  }

  let mut loggers = Vec::with_capacity(raw.loggers.len());
  for (name, logger) in &raw.loggers {
    let min_level = logger
      .level
      .parse::<LevelFilter>()
      .map_err(|e| Error::InvalidConfigValue {
        field: format!("loggers.{}.level", name),
        message: e.to_string(),
      })?;
    for appender in &logger.appenders {
      if !raw.appenders.contains_key(appender) {
        return Err(Error::InvalidConfigValue {
          field: format!("loggers.{}.appenders", name),
          message: format!("unknown appender '{}'", appender),
        });
      }
    }
    loggers.push(LoggerInternal {
      name: name.clone(),
      min_level,
      appender_names: logger.appenders.clone(),
    });
  }

  if !raw.loggers.contains_key(ROOT_LOGGER) {
    loggers.push(LoggerInternal {
      name: ROOT_LOGGER.to_string(),
      min_level: LevelFilter::INFO,
      appender_names: raw.appenders.keys().cloned().collect(),
    });
  }

  let appenders = raw
    .appenders
    .into_iter()
    .map(|(name, appender)| {
      let encoder = appender.encoder().clone();
      let kind = match appender {
        AppenderConfigRaw::Console { .. } => AppenderKind::Console,
        AppenderConfigRaw::File { path, .. } => AppenderKind::File { path: path.into() },
        AppenderConfigRaw::RollingFile {
          directory,
          file_name_prefix,
          file_name_suffix,
          rotation,
          ..
        } => AppenderKind::RollingFile {
          directory: directory.into(),
          file_name_prefix,
          file_name_suffix,
          rotation,
        },
      };
      let targets = build_targets_for_appender(&name, &loggers);
      AppenderInternal {
        name,
        kind,
        encoder,
        targets,
      }
    })
    .collect();

  Ok(ConfigInternal { appenders })
}

/// Builds the target filter for one appender from every logger that routes to it.
fn build_targets_for_appender(appender_name: &str, loggers: &[LoggerInternal]) -> Targets {
  let mut default_level = LevelFilter::OFF;
  let mut targets = Targets::new();

  for logger in loggers {
    if !logger.appender_names.iter().any(|a| a == appender_name) {
      continue;
    }
    if logger.name == ROOT_LOGGER {
      default_level = logger.min_level;
    } else {
      targets = targets.with_target(logger.name.clone(), logger.min_level);
    }
  }

  targets.with_default(default_level)
}

#[cfg(test)]
mod tests {
  use super::*;
  use pretty_assertions::assert_eq;
  use tracing_core::Level;

  const SAMPLE: &str = r#"
version: 1
appenders:
  console:
    kind: console
    encoder: { format: compact }
  main_file:
    kind: file
    path: logs/coop.log
loggers:
  root: { level: info, appenders: [console, main_file] }
  coop_ioc: { level: debug, appenders: [main_file] }
  hyper: { level: warn, appenders: [console] }
"#;

  #[test]
  fn parses_raw_config() {
    let raw: ConfigRaw = serde_yaml::from_str(SAMPLE).unwrap();

    assert_eq!(
      raw.appenders["console"],
      AppenderConfigRaw::Console {
        encoder: EncoderConfig {
          format: Format::Compact,
          ..EncoderConfig::default()
        }
      }
    );
    assert_eq!(
      raw.appenders["main_file"],
      AppenderConfigRaw::File {
        path: "logs/coop.log".to_string(),
        encoder: EncoderConfig::default(),
      }
    );
    assert_eq!(raw.loggers["coop_ioc"].appenders, vec!["main_file".to_string()]);
  }

  #[test]
  fn rolling_file_defaults() {
    let yaml = "appenders:\n  audit:\n    kind: rolling_file\n    directory: logs\n";
    let raw: ConfigRaw = serde_yaml::from_str(yaml).unwrap();

    let config = process_raw_config(raw).unwrap();

    assert_eq!(
      config.appenders[0].kind,
      AppenderKind::RollingFile {
        directory: PathBuf::from("logs"),
        file_name_prefix: "coop".to_string(),
        file_name_suffix: "log".to_string(),
        rotation: Rotation::Daily,
      }
    );
  }

  #[test]
  fn builds_per_appender_targets() {
    let raw: ConfigRaw = serde_yaml::from_str(SAMPLE).unwrap();
    let config = process_raw_config(raw).unwrap();
    let targets = |name: &str| {
      config
        .appenders
        .iter()
        .find(|a| a.name == name)
        .map(|a| a.targets.clone())
        .unwrap()
    };

    let console = targets("console");
    assert!(console.would_enable("hyper::client", &Level::WARN));
    assert!(!console.would_enable("hyper::client", &Level::INFO));
    assert!(console.would_enable("another_crate", &Level::INFO));
    assert!(!console.would_enable("coop_ioc::container", &Level::DEBUG));

    let file = targets("main_file");
    assert!(file.would_enable("coop_ioc::container", &Level::DEBUG));
    assert!(!file.would_enable("coop_ioc::container", &Level::TRACE));
    assert!(file.would_enable("hyper::server", &Level::INFO));
    assert!(!file.would_enable("hyper::server", &Level::DEBUG));
  }

  #[test]
  fn missing_root_defaults_to_info_everywhere() {
    let raw: ConfigRaw =
      serde_yaml::from_str("appenders:\n  console:\n    kind: console\n").unwrap();

    let config = process_raw_config(raw).unwrap();

    assert!(config.appenders[0].targets.would_enable("coop_ioc", &Level::INFO));
    assert!(!config.appenders[0].targets.would_enable("coop_ioc", &Level::DEBUG));
  }

  #[test]
  fn rejects_unknown_appender_and_bad_level() {
    let raw: ConfigRaw =
      serde_yaml::from_str("loggers:\n  root: { level: info, appenders: [nowhere] }\n").unwrap();
    assert!(matches!(
      process_raw_config(raw),
      Err(Error::InvalidConfigValue { field, .. }) if field == "loggers.root.appenders"
    ));

    let raw: ConfigRaw = serde_yaml::from_str("loggers:\n  root: { level: loud }\n").unwrap();
    assert!(matches!(
      process_raw_config(raw),
      Err(Error::InvalidConfigValue { field, .. }) if field == "loggers.root.level"
    ));
  }

  #[test]
  fn rejects_unknown_fields() {
    let result: std::result::Result<ConfigRaw, _> =
      serde_yaml::from_str("appenders:\n  console:\n    kind: console\n    colour: true\n");
    assert!(result.is_err());
  }
}
