//! The main `Container` struct and its associated methods.

use crate::config::ContainerConfig;
use crate::core::{Binding, GuardPolicy, Registry, ResolutionGuard, Strategy};
use crate::error::ResolutionError;
use crate::reflect::{validate_type_name, DeclaredType, Parameter, TypeDef};
use crate::value::{Arguments, Instance, Overrides, Value};
use dashmap::DashMap;
use parking_lot::RwLock;
use std::any::{type_name, Any};
use std::fmt;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tracing::{debug, trace};

static NEXT_CONTAINER_ID: AtomicUsize = AtomicUsize::new(1);

/// The dependency resolution container.
///
/// Maps abstract keys to construction strategies and caches the instances it
/// has built. Keys without a binding are treated as type names and built from
/// the [`TypeDef`]s registered with [`Container::define`], resolving each
/// constructor parameter recursively.
///
/// The container is thread-safe. Bindings, cached instances and the singleton
/// set share one lock, which is never held while a factory or constructor runs.
pub struct Container {
  id: usize,
  config: ContainerConfig,
  registry: RwLock<Registry>,
  types: DashMap<String, Arc<TypeDef>>,
}

impl Default for Container {
  fn default() -> Self {
    Self::with_config(ContainerConfig::default())
  }
}

impl Container {
  /// Creates a new, empty `Container`.
  pub fn new() -> Self {
    Self::default()
  }

  /// Creates an empty `Container` tuned by `config`.
  pub fn with_config(config: ContainerConfig) -> Self {
    Self {
      id: NEXT_CONTAINER_ID.fetch_add(1, Ordering::Relaxed),
      config,
      registry: RwLock::new(Registry::default()),
      types: DashMap::new(),
    }
  }

  pub fn config(&self) -> &ContainerConfig {
    &self.config
  }

  // --- Type Table ---

  /// Registers (or replaces) the description of a buildable type.
  ///
  /// Type descriptions are not container state: [`Container::flush`] keeps them.
  pub fn define(&self, def: TypeDef) {
    trace!(type_name = def.name(), "type defined");
    self.types.insert(def.name().to_owned(), Arc::new(def));
  }

  /// Returns `true` if a type with this name has been defined.
  pub fn defined(&self, type_name: &str) -> bool {
    self.types.contains_key(type_name)
  }

  // --- Registration ---

  /// Registers or replaces the binding for `key`.
  pub fn bind(&self, key: impl Into<String>, strategy: impl Into<Strategy>, singleton: bool) {
    let key = key.into();
    let strategy = strategy.into();
    debug!(key = %key, ?strategy, singleton, "binding registered");

    let mut registry = self.registry.write();
    if singleton {
      registry.singletons.insert(key.clone());
    } else {
      registry.singletons.remove(&key);
    }
    registry.bindings.insert(key, Binding::new(strategy, singleton));
  }

  /// Registers a binding whose instance is built once and then cached.
  pub fn singleton(&self, key: impl Into<String>, strategy: impl Into<Strategy>) {
    self.bind(key, strategy, true);
  }

  /// Stores a pre-built instance. It is returned for `key` from now on,
  /// regardless of any binding.
  pub fn register_instance(&self, key: impl Into<String>, instance: Instance) {
    let key = key.into();
    debug!(key = %key, type_name = instance.type_name(), "instance registered");
    self.registry.write().instances.insert(key, instance);
  }

  /// Wraps `value` and registers it under `key`, returning the shared instance.
  pub fn register_value<T: Any + Send + Sync>(&self, key: impl Into<String>, value: T) -> Instance {
    let instance = Instance::new(value);
    self.register_instance(key, instance.clone());
    instance
  }

  /// Returns `true` if `key` has a binding or a cached instance.
  pub fn bound(&self, key: &str) -> bool {
    let registry = self.registry.read();
    registry.bindings.contains_key(key) || registry.instances.contains_key(key)
  }

  /// Returns `true` if `key` is bound as a singleton.
  pub fn is_singleton(&self, key: &str) -> bool {
    self.registry.read().singletons.contains(key)
  }

  /// The keys currently bound as singletons, sorted.
  pub fn singletons(&self) -> Vec<String> {
    let mut keys: Vec<String> = self.registry.read().singletons.iter().cloned().collect();
    keys.sort();
    keys
  }

  /// Clears every binding, cached instance and singleton mark.
  ///
  /// Instances already handed out stay alive with their holders.
  pub fn flush(&self) {
    debug!("container flushed");
    self.registry.write().clear();
  }

  // --- Resolution ---

  /// Resolves `key` with no parameter overrides.
  pub fn resolve(&self, key: &str) -> Result<Instance, ResolutionError> {
    self.resolve_with(key, &Overrides::new())
  }

  /// Resolves `key`, using `overrides` for constructor parameters of the
  /// same name.
  ///
  /// A cached instance wins over everything and ignores the overrides. A
  /// binding runs its factory or builds its class. Otherwise the key is built
  /// directly as a type name.
  pub fn resolve_with(
    &self,
    key: &str,
    overrides: &Overrides,
  ) -> Result<Instance, ResolutionError> {
    let binding = {
      let registry = self.registry.read();
      if let Some(instance) = registry.instances.get(key) {
        trace!(key, "resolved from instance cache");
        return Ok(instance.clone());
      }
      registry.bindings.get(key).cloned()
    };

    let singleton = binding.as_ref().is_some_and(Binding::is_singleton);
    let _guard = ResolutionGuard::enter(self.id, key, singleton, self.guard_policy())?;

    match binding {
      Some(binding) => self.resolve_binding(key, &binding, overrides),
      None => {
        trace!(key, "no binding, building directly");
        self.build(key, overrides)
      }
    }
  }

  /// Resolves `key` and downcasts the instance to `T`.
  pub fn get<T: Any + Send + Sync>(&self, key: &str) -> Result<Arc<T>, ResolutionError> {
    let instance = self.resolve(key)?;
    instance
      .downcast::<T>()
      .ok_or_else(|| ResolutionError::TypeMismatch {
        key: key.to_owned(),
        expected: type_name::<T>(),
        actual: instance.type_name(),
      })
  }

  /// Resolves `key` and recovers a trait object, e.g. `get_trait::<dyn Logger>`.
  pub fn get_trait<I: ?Sized + Any + Send + Sync>(
    &self,
    key: &str,
  ) -> Result<Arc<I>, ResolutionError> {
    let instance = self.resolve(key)?;
    instance
      .downcast_trait::<I>()
      .ok_or_else(|| ResolutionError::TypeMismatch {
        key: key.to_owned(),
        expected: type_name::<I>(),
        actual: instance.type_name(),
      })
  }

  /// Builds a fresh instance of `type_name` from its [`TypeDef`], ignoring
  /// bindings and the instance cache for the type itself.
  pub fn build(&self, type_name: &str, overrides: &Overrides) -> Result<Instance, ResolutionError> {
    // Clone the Arc so the map shard is not locked during construction.
    let def = match self.types.get(type_name).map(|entry| Arc::clone(entry.value())) {
      Some(def) => def,
      None => {
        validate_type_name(type_name).map_err(|reason| ResolutionError::Reflection {
          key: type_name.to_owned(),
          reason,
        })?;
        return Err(ResolutionError::NotFound {
          key: type_name.to_owned(),
        });
      }
    };

    if !def.is_instantiable() {
      return Err(ResolutionError::NotInstantiable {
        key: type_name.to_owned(),
      });
    }

    let mut args = Arguments::new();
    if let Some(params) = def.parameters() {
      for param in params {
        let value = self.resolve_parameter(type_name, param, overrides)?;
        args.push(param.name(), value);
      }
    }

    debug!(type_name, arguments = args.len(), "building instance");
    def.instantiate(args)
  }

  // --- PRIVATE HELPERS ---

  fn guard_policy(&self) -> GuardPolicy {
    GuardPolicy {
      detect_cycles: self.config.detect_cycles,
      max_depth: self.config.max_depth,
    }
  }

  fn resolve_binding(
    &self,
    key: &str,
    binding: &Binding,
    overrides: &Overrides,
  ) -> Result<Instance, ResolutionError> {
    let Some(cell) = &binding.cell else {
      return self.construct(&binding.strategy, overrides);
    };

    let instance = cell
      .get_or_try_init(|| {
        debug!(key, "constructing singleton");
        self.construct(&binding.strategy, overrides)
      })?
      .clone();

    // Only cache if the binding was not replaced or flushed meanwhile.
    let mut registry = self.registry.write();
    let still_bound = registry
      .bindings
      .get(key)
      .and_then(|b| b.cell.as_ref())
      .is_some_and(|current| Arc::ptr_eq(current, cell));
    if still_bound {
      Ok(
        registry
          .instances
          .entry(key.to_owned())
          .or_insert(instance)
          .clone(),
      )
    } else {
      Ok(instance)
    }
  }

  fn construct(
    &self,
    strategy: &Strategy,
    overrides: &Overrides,
  ) -> Result<Instance, ResolutionError> {
    match strategy {
      Strategy::Factory(factory) => factory(self, overrides),
      Strategy::Class(class) => self.build(class, overrides),
    }
  }

  fn resolve_parameter(
    &self,
    owner: &str,
    param: &Parameter,
    overrides: &Overrides,
  ) -> Result<Value, ResolutionError> {
    if let Some(value) = overrides.get(param.name()) {
      return Ok(value.clone());
    }

    let declared = param.parse_type().map_err(|reason| ResolutionError::Reflection {
      key: owner.to_owned(),
      reason: format!("parameter [{}]: {}", param.name(), reason),
    })?;

    match declared {
      DeclaredType::Untyped => {
        param
          .default_value()
          .cloned()
          .ok_or_else(|| ResolutionError::UntypedParameter {
            key: owner.to_owned(),
            parameter: param.name().to_owned(),
          })
      }
      DeclaredType::Union(_) => Err(ResolutionError::UnionParameter {
        key: owner.to_owned(),
        parameter: param.name().to_owned(),
      }),
      DeclaredType::Builtin(_) => {
        param
          .default_value()
          .cloned()
          .ok_or_else(|| ResolutionError::BuiltinParameter {
            key: owner.to_owned(),
            parameter: param.name().to_owned(),
            declared: param.declared_type().to_owned(),
          })
      }
      DeclaredType::Named { name, nullable } => {
        let err = match self.resolve(&name) {
          Ok(instance) => return Ok(Value::Object(instance)),
          Err(err) => err,
        };

        if !err.is_fatal() {
          if let Some(default) = param.default_value() {
            debug!(
              owner,
              parameter = param.name(),
              error = %err,
              "dependency unresolved, using default"
            );
            return Ok(default.clone());
          }
          if nullable || param.is_nullable() {
            debug!(
              owner,
              parameter = param.name(),
              error = %err,
              "dependency unresolved, using null"
            );
            return Ok(Value::Null);
          }
        }

        Err(ResolutionError::Dependency {
          key: owner.to_owned(),
          parameter: param.name().to_owned(),
          source: Box::new(err),
        })
      }
    }
  }
}

impl fmt::Debug for Container {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let registry = self.registry.read();
    f.debug_struct("Container")
      .field("id", &self.id)
      .field("config", &self.config)
      .field("bindings", &registry.bindings.len())
      .field("instances", &registry.instances.len())
      .field("singletons", &registry.singletons.len())
      .field("types", &self.types.len())
      .finish()
  }
}
