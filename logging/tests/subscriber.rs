use coop_logging::{build_subscriber, find_config_file_in, parse_config, Error};
use std::fs;
use tracing::{debug, info, warn};

fn file_config(path: &std::path::Path, extra_loggers: &str) -> String {
  format!(
    concat!(
      "appenders:\n  main_file:\n    kind: file\n    path: {}\n",
      "loggers:\n  root: {{ level: info, appenders: [main_file] }}\n{}",
    ),
    path.display(),
    extra_loggers
  )
}

#[test]
fn test_file_appender_receives_filtered_events() {
  let dir = tempfile::tempdir().unwrap();
  let log_path = dir.path().join("nested").join("coop.log");
  let config = parse_config(&file_config(
    &log_path,
    "  loans: { level: debug, appenders: [main_file] }\n",
  ))
  .unwrap();

  let (subscriber, guards) = build_subscriber(config).unwrap();
  assert_eq!(guards.writer_count(), 1);

  tracing::subscriber::with_default(subscriber, || {
    info!(target: "members", "member registered");
    debug!(target: "members", "member debug detail");
    debug!(target: "loans", "loan eligibility checked");
    warn!(target: "dividends", "dividend run delayed");
  });
  // Dropping the guards flushes the non-blocking writer.
  drop(guards);

  let written = fs::read_to_string(&log_path).unwrap();
  assert!(written.contains("member registered"));
  assert!(!written.contains("member debug detail"));
  assert!(written.contains("loan eligibility checked"));
  assert!(written.contains("dividend run delayed"));
}

#[test]
fn test_env_filter_directive_overrides_loggers() {
  let dir = tempfile::tempdir().unwrap();
  let log_path = dir.path().join("audit.log");
  let yaml = format!(
    concat!(
      "appenders:\n  audit:\n    kind: file\n    path: {}\n",
      "    encoder: {{ format: compact, filter: \"warn,audit=trace\" }}\n",
    ),
    log_path.display()
  );

  let (subscriber, guards) = build_subscriber(parse_config(&yaml).unwrap()).unwrap();
  tracing::subscriber::with_default(subscriber, || {
    debug!(target: "audit", "ledger entry posted");
    info!(target: "members", "member login");
  });
  drop(guards);

  let written = fs::read_to_string(&log_path).unwrap();
  assert!(written.contains("ledger entry posted"));
  assert!(!written.contains("member login"));
}

#[test]
fn test_invalid_env_filter_is_rejected() {
  let yaml = concat!(
    "appenders:\n  console:\n    kind: console\n",
    "    encoder: { filter: \"coop_ioc=loudest\" }\n",
  );

  let result = build_subscriber(parse_config(yaml).unwrap());

  assert!(matches!(result, Err(Error::InvalidConfigValue { .. })));
}

#[test]
fn test_rolling_file_appender_creates_directory() {
  let dir = tempfile::tempdir().unwrap();
  let log_dir = dir.path().join("rolling");
  let yaml = format!(
    concat!(
      "appenders:\n  audit:\n    kind: rolling_file\n    directory: {}\n",
      "    file_name_prefix: audit\n    rotation: never\n",
    ),
    log_dir.display()
  );

  let (subscriber, guards) = build_subscriber(parse_config(&yaml).unwrap()).unwrap();
  tracing::subscriber::with_default(subscriber, || info!("contribution recorded"));
  drop(guards);

  let files: Vec<_> = fs::read_dir(&log_dir).unwrap().collect();
  assert_eq!(files.len(), 1);
  let written = fs::read_to_string(files[0].as_ref().unwrap().path()).unwrap();
  assert!(written.contains("contribution recorded"));
}

#[test]
fn test_blank_config_has_no_appenders() {
  let config = parse_config("  \n").unwrap();

  assert!(config.appenders.is_empty());
}

#[test]
fn test_parse_errors_are_reported() {
  assert!(matches!(parse_config("appenders: [1, 2"), Err(Error::ConfigParse(_))));
  assert!(matches!(parse_config("version: 2\n"), Err(Error::InvalidConfigValue { .. })));
}

#[test]
fn test_find_config_file_prefers_environment_file() {
  let dir = tempfile::tempdir().unwrap();
  let base = dir.path().join("coop_logging.yaml");
  let staging = dir.path().join("coop_logging.staging.yaml");

  assert!(matches!(
    find_config_file_in(dir.path(), Some("staging")),
    Err(Error::ConfigNotFound(_))
  ));

  fs::write(&base, "version: 1").unwrap();
  assert_eq!(find_config_file_in(dir.path(), Some("staging")).unwrap(), base);

  fs::write(&staging, "version: 1").unwrap();
  assert_eq!(find_config_file_in(dir.path(), Some("staging")).unwrap(), staging);
}
