//! Error types produced while resolving services.

use thiserror::Error;

/// A boxed, thread-safe error returned by user constructors and factories.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// The single error kind surfaced by [`Container::resolve`](crate::Container::resolve).
///
/// Every variant names the key (or type) whose resolution failed. Nested
/// failures keep the inner error as their `source()`, so the full cause chain
/// is available to the caller.
#[derive(Debug, Error)]
pub enum ResolutionError {
  #[error("target [{key}] does not exist")]
  NotFound { key: String },

  #[error("target [{key}] is not instantiable")]
  NotInstantiable { key: String },

  #[error("cannot resolve untyped parameter [{parameter}] of [{key}]")]
  UntypedParameter { key: String, parameter: String },

  #[error("union types unsupported for parameter [{parameter}] of [{key}]")]
  UnionParameter { key: String, parameter: String },

  #[error("unresolvable parameter [{parameter}: {declared}] of [{key}]")]
  BuiltinParameter {
    key: String,
    parameter: String,
    declared: String,
  },

  #[error("failed to resolve dependency [{parameter}] of [{key}]")]
  Dependency {
    key: String,
    parameter: String,
    #[source]
    source: Box<ResolutionError>,
  },

  #[error("circular dependency detected while resolving [{key}]: {}", .path.join(" -> "))]
  Cycle { key: String, path: Vec<String> },

  #[error("maximum resolution depth of {limit} exceeded while resolving [{key}]")]
  DepthExceeded { key: String, limit: usize },

  #[error("reflection failed for [{key}]: {reason}")]
  Reflection { key: String, reason: String },

  #[error("failed to construct [{key}]")]
  Construction {
    key: String,
    #[source]
    source: BoxError,
  },

  #[error("[{key}] resolved to an instance of {actual}, not {expected}")]
  TypeMismatch {
    key: String,
    expected: &'static str,
    actual: &'static str,
  },
}

impl ResolutionError {
  /// Wraps an arbitrary error raised while constructing `key`.
  pub fn construction(key: impl Into<String>, source: impl Into<BoxError>) -> Self {
    ResolutionError::Construction {
      key: key.into(),
      source: source.into(),
    }
  }

  /// The key or type name this error was raised for.
  pub fn key(&self) -> &str {
    match self {
      ResolutionError::NotFound { key }
      | ResolutionError::NotInstantiable { key }
      | ResolutionError::UntypedParameter { key, .. }
      | ResolutionError::UnionParameter { key, .. }
      | ResolutionError::BuiltinParameter { key, .. }
      | ResolutionError::Dependency { key, .. }
      | ResolutionError::Cycle { key, .. }
      | ResolutionError::DepthExceeded { key, .. }
      | ResolutionError::Reflection { key, .. }
      | ResolutionError::Construction { key, .. }
      | ResolutionError::TypeMismatch { key, .. } => key,
    }
  }

  /// Returns `true` if this error, or any error it wraps, is a cycle or
  /// depth-limit failure. Such failures are never replaced by a parameter's
  /// default or null value.
  pub fn is_fatal(&self) -> bool {
    match self {
      ResolutionError::Cycle { .. } | ResolutionError::DepthExceeded { .. } => true,
      ResolutionError::Dependency { source, .. } => source.is_fatal(),
      _ => false,
    }
  }

  /// Walks nested `Dependency` errors down to the failure that started it.
  pub fn root_cause(&self) -> &ResolutionError {
    match self {
      ResolutionError::Dependency { source, .. } => source.root_cause(),
      other => other,
    }
  }
}

/// Raised by [`Arguments`](crate::Arguments) accessors inside constructors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ArgumentError {
  #[error("argument [{0}] was not supplied")]
  Missing(String),

  #[error("argument [{name}] is {found}, expected {expected}")]
  Mismatch {
    name: String,
    expected: &'static str,
    found: &'static str,
  },
}

/// Raised when a [`ContainerConfig`](crate::ContainerConfig) cannot be loaded.
#[derive(Debug, Error)]
pub enum ConfigError {
  #[error("Failed to read container configuration: {0}")]
  Read(#[from] std::io::Error),

  #[error("Failed to parse container configuration: {0}")]
  Parse(String),

  #[error("Invalid configuration value for '{field}': {message}")]
  InvalidValue { field: String, message: String },
}
