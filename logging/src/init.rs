// Contains the primary public initialization functions for coop_logging.

use crate::{
  config::{process_raw_config, AppenderInternal, AppenderKind, ConfigInternal, ConfigRaw, Format},
  error::{Error, Result},
  InitResult,
};

use std::{
  env,
  fs::{self, OpenOptions},
  io,
  path::{Path, PathBuf},
};

use tracing_appender::rolling::RollingFileAppender;
use tracing_subscriber::{
  filter::EnvFilter,
  fmt::{self, MakeWriter},
  layer::Layered,
  prelude::*,
  Layer, Registry,
};

const DEFAULT_CONFIG_BASE_NAME: &str = "coop_logging";
const DEFAULT_CONFIG_EXTENSION: &str = "yaml";

/// A type-erased formatting layer bound to one appender.
pub type BoxedLayer = Box<dyn Layer<Registry> + Send + Sync + 'static>;

/// The subscriber assembled from a configuration.
pub type CoopSubscriber = Layered<Vec<BoxedLayer>, Registry>;

/// Finds the configuration file in the current directory, based on an
/// optional environment suffix.
pub fn find_config_file(environment_suffix: Option<&str>) -> Result<PathBuf> {
  find_config_file_in(Path::new("."), environment_suffix)
}

/// Finds the configuration file in `dir`.
///
/// Looks for `coop_logging.<env>.yaml` first, then `coop_logging.yaml`. The
/// environment comes from `environment_suffix`, then `COOP_ENV`, then `APP_ENV`.
pub fn find_config_file_in(dir: &Path, environment_suffix: Option<&str>) -> Result<PathBuf> {
  let base_name = DEFAULT_CONFIG_BASE_NAME;
  let extension = DEFAULT_CONFIG_EXTENSION;

  let env_from_var = environment_suffix
    .map(|s| s.to_string())
    .or_else(|| env::var("COOP_ENV").ok())
    .or_else(|| env::var("APP_ENV").ok());

  let mut files_to_check: Vec<String> = Vec::new();
  if let Some(env_str) = &env_from_var {
    if !env_str.is_empty() {
      files_to_check.push(format!("{}.{}.{}", base_name, env_str, extension));
    }
  }
  files_to_check.push(format!("{}.{}", base_name, extension));

  for file_name in &files_to_check {
    let path = dir.join(file_name);
    if path.is_file() {
      return Ok(path);
    }
  }

  Err(Error::ConfigNotFound(format!(
    "Searched for: {:?} in {:?}. Provide a config file or check COOP_ENV/APP_ENV.",
    files_to_check, dir
  )))
}

/// Initializes global logging from a configuration file path.
pub fn init_from_file(config_path: &Path) -> Result<InitResult> {
  println!(
    "[coop_logging] Initializing from config file: {:?}",
    config_path
  );
  let yaml = fs::read_to_string(config_path)?;
  init_from_str(&yaml)
}

/// Initializes global logging from YAML text.
///
/// Installs the `log` bridge and sets the global `tracing` subscriber, so it
/// can succeed only once per process.
pub fn init_from_str(yaml: &str) -> Result<InitResult> {
  let (subscriber, result) = build_subscriber(parse_config(yaml)?)?;

  tracing_log::LogTracer::init().map_err(|e| Error::LogBridgeInit(e.to_string()))?;
  tracing::subscriber::set_global_default(subscriber)
    .map_err(|e| Error::GlobalSubscriberSet(e.to_string()))?;

  println!("[coop_logging] Initialization complete.");
  Ok(result)
}

/// Parses and validates YAML text. Blank input yields the default configuration.
pub fn parse_config(yaml: &str) -> Result<ConfigInternal> {
  let raw: ConfigRaw = if yaml.trim().is_empty() {
    ConfigRaw::default()
  } else {
    serde_yaml::from_str(yaml).map_err(|e| Error::ConfigParse(e.to_string()))?
  };
  process_raw_config(raw)
}

/// Builds the subscriber for `config` without installing it.
///
/// Useful with `tracing::subscriber::with_default` in tests. The returned
/// `InitResult` owns the writer guards and must outlive the subscriber's use.
pub fn build_subscriber(config: ConfigInternal) -> Result<(CoopSubscriber, InitResult)> {
  let mut guards = Vec::new();
  let mut layers: Vec<BoxedLayer> = Vec::with_capacity(config.appenders.len());

  for appender in &config.appenders {
    let layer = match &appender.kind {
      AppenderKind::Console => build_layer(io::stdout, appender)?,
      AppenderKind::File { path } => {
        if let Some(parent_dir) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
          create_dir(&appender.name, parent_dir)?;
        }
        let file = OpenOptions::new()
          .create(true)
          .append(true)
          .open(path)
          .map_err(|e| Error::AppenderSetup {
            appender_name: appender.name.clone(),
            reason: format!("Failed to open file {:?}: {}", path, e),
          })?;
        let (writer, guard) = tracing_appender::non_blocking(file);
        guards.push(guard);
        build_layer(writer, appender)?
      }
      AppenderKind::RollingFile {
        directory,
        file_name_prefix,
        file_name_suffix,
        rotation,
      } => {
        create_dir(&appender.name, directory)?;
        let file_appender = RollingFileAppender::builder()
          .rotation((*rotation).into())
          .filename_prefix(file_name_prefix)
          .filename_suffix(file_name_suffix)
          .build(directory)
          .map_err(|e| Error::AppenderSetup {
            appender_name: appender.name.clone(),
            reason: e.to_string(),
          })?;
        let (writer, guard) = tracing_appender::non_blocking(file_appender);
        guards.push(guard);
        build_layer(writer, appender)?
      }
    };
    layers.push(layer);
  }

  let subscriber = tracing_subscriber::registry().with(layers);
  Ok((subscriber, InitResult::new(guards)))
}

fn create_dir(appender_name: &str, dir: &Path) -> Result<()> {
  if dir.exists() {
    return Ok(());
  }
  fs::create_dir_all(dir).map_err(|e| Error::AppenderSetup {
    appender_name: appender_name.to_string(),
    reason: format!("Failed to create directory {:?}: {}", dir, e),
  })
}

fn build_layer<W>(writer: W, appender: &AppenderInternal) -> Result<BoxedLayer>
where
  W: for<'w> MakeWriter<'w> + Send + Sync + 'static,
{
  let encoder = &appender.encoder;
  let layer = fmt::layer()
    .with_writer(writer)
    .with_ansi(encoder.ansi)
    .with_target(encoder.with_target)
    .with_thread_names(encoder.with_thread_names);

  match encoder.format {
    Format::Full => with_appender_filter(layer, appender),
    Format::Compact => with_appender_filter(layer.compact(), appender),
  }
}

fn with_appender_filter<L>(layer: L, appender: &AppenderInternal) -> Result<BoxedLayer>
where
  L: Layer<Registry> + Send + Sync + 'static,
{
  match &appender.encoder.filter {
    Some(directives) => {
      let filter = EnvFilter::try_new(directives).map_err(|e| Error::InvalidConfigValue {
        field: format!("appenders.{}.encoder.filter", appender.name),
        message: e.to_string(),
      })?;
      Ok(layer.with_filter(filter).boxed())
    }
    None => Ok(layer.with_filter(appender.targets.clone()).boxed()),
  }
}
