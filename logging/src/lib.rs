//! `coop_logging` - configuration-driven logging setup built on `tracing`.
//!
//! Appenders (console, plain file, rolling file) and per-target logger levels
//! are described in a YAML file, in the spirit of log4j/logback. Each appender
//! gets its own formatting layer and filter; file appenders write through
//! `tracing-appender`'s non-blocking workers.

pub mod config;
pub mod error;
pub mod init;

pub use error::{Error, Result};
pub use init::{
  build_subscriber, find_config_file, find_config_file_in, init_from_file, init_from_str,
  parse_config, BoxedLayer, CoopSubscriber,
};

use tracing_appender::non_blocking::WorkerGuard;

/// Returned by initialization. Dropping it flushes and stops the background
/// writers of every file appender.
#[must_use = "The InitResult and its guards must be kept alive for logging to work \
              correctly and flush on exit"]
pub struct InitResult {
  guards: Vec<WorkerGuard>,
}

impl InitResult {
  pub(crate) fn new(guards: Vec<WorkerGuard>) -> Self {
    Self { guards }
  }

  /// Number of non-blocking writers kept alive by this result.
  pub fn writer_count(&self) -> usize {
    self.guards.len()
  }
}

impl std::fmt::Debug for InitResult {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("InitResult")
      .field("writers", &self.guards.len())
      .finish()
  }
}
