//! Type-erased instances and the argument values passed to constructors.

use crate::error::ArgumentError;
use std::any::{type_name, Any};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// Parameter overrides for a single resolution, keyed by parameter name.
pub type Overrides = HashMap<String, Value>;

/// A shared, type-erased object produced by the container.
///
/// Cloning an `Instance` is cheap and keeps the identity of the underlying
/// object; use [`Instance::ptr_eq`] to compare identities.
#[derive(Clone)]
pub struct Instance {
  inner: Arc<dyn Any + Send + Sync>,
  type_name: &'static str,
}

impl Instance {
  /// Wraps a concrete value.
  pub fn new<T: Any + Send + Sync>(value: T) -> Self {
    Self::from_arc(Arc::new(value))
  }

  /// Wraps an already shared concrete value without re-allocating.
  pub fn from_arc<T: Any + Send + Sync>(value: Arc<T>) -> Self {
    Self {
      inner: value,
      type_name: type_name::<T>(),
    }
  }

  /// Wraps a trait object, e.g. `Arc<dyn Greeter>`.
  ///
  /// The instance can later be recovered with [`Instance::downcast_trait`].
  pub fn from_trait<I: ?Sized + Any + Send + Sync>(value: Arc<I>) -> Self {
    Self {
      inner: Arc::new(value),
      type_name: type_name::<I>(),
    }
  }

  /// Recovers the concrete value, or `None` if the instance holds another type.
  pub fn downcast<T: Any + Send + Sync>(&self) -> Option<Arc<T>> {
    self.inner.clone().downcast::<T>().ok()
  }

  /// Recovers a trait object registered through [`Instance::from_trait`].
  pub fn downcast_trait<I: ?Sized + Any + Send + Sync>(&self) -> Option<Arc<I>> {
    self.inner.downcast_ref::<Arc<I>>().cloned()
  }

  /// Returns `true` if the instance holds a concrete `T`.
  pub fn is<T: Any + Send + Sync>(&self) -> bool {
    self.inner.is::<T>()
  }

  /// The name of the type this instance was created from.
  pub fn type_name(&self) -> &'static str {
    self.type_name
  }

  /// Returns `true` if both instances point to the same object.
  pub fn ptr_eq(a: &Instance, b: &Instance) -> bool {
    Arc::ptr_eq(&a.inner, &b.inner)
  }
}

impl fmt::Debug for Instance {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "Instance({})", self.type_name)
  }
}

/// A constructor argument, an override, or a parameter default.
#[derive(Clone, Debug)]
pub enum Value {
  Null,
  Bool(bool),
  Int(i64),
  Float(f64),
  Str(String),
  Object(Instance),
}

impl Value {
  /// A short description of the variant, used in error messages.
  pub fn kind(&self) -> &'static str {
    match self {
      Value::Null => "null",
      Value::Bool(_) => "bool",
      Value::Int(_) => "int",
      Value::Float(_) => "float",
      Value::Str(_) => "string",
      Value::Object(_) => "object",
    }
  }

  pub fn is_null(&self) -> bool {
    matches!(self, Value::Null)
  }

  pub fn as_instance(&self) -> Option<&Instance> {
    match self {
      Value::Object(instance) => Some(instance),
      _ => None,
    }
  }
}

impl PartialEq for Value {
  fn eq(&self, other: &Self) -> bool {
    match (self, other) {
      (Value::Null, Value::Null) => true,
      (Value::Bool(a), Value::Bool(b)) => a == b,
      (Value::Int(a), Value::Int(b)) => a == b,
      (Value::Float(a), Value::Float(b)) => a == b,
      (Value::Str(a), Value::Str(b)) => a == b,
      (Value::Object(a), Value::Object(b)) => Instance::ptr_eq(a, b),
      _ => false,
    }
  }
}

impl From<bool> for Value {
  fn from(v: bool) -> Self {
    Value::Bool(v)
  }
}

impl From<i64> for Value {
  fn from(v: i64) -> Self {
    Value::Int(v)
  }
}

impl From<i32> for Value {
  fn from(v: i32) -> Self {
    Value::Int(i64::from(v))
  }
}

impl From<u32> for Value {
  fn from(v: u32) -> Self {
    Value::Int(i64::from(v))
  }
}

impl From<f64> for Value {
  fn from(v: f64) -> Self {
    Value::Float(v)
  }
}

impl From<&str> for Value {
  fn from(v: &str) -> Self {
    Value::Str(v.to_owned())
  }
}

impl From<String> for Value {
  fn from(v: String) -> Self {
    Value::Str(v)
  }
}

impl From<Instance> for Value {
  fn from(v: Instance) -> Self {
    Value::Object(v)
  }
}

impl<T: Into<Value>> From<Option<T>> for Value {
  fn from(v: Option<T>) -> Self {
    v.map_or(Value::Null, Into::into)
  }
}

/// The ordered, named argument list handed to a type's constructor.
#[derive(Clone, Debug, Default)]
pub struct Arguments {
  values: Vec<(String, Value)>,
}

impl Arguments {
  pub(crate) fn new() -> Self {
    Self::default()
  }

  pub(crate) fn push(&mut self, name: &str, value: Value) {
    self.values.push((name.to_owned(), value));
  }

  pub fn len(&self) -> usize {
    self.values.len()
  }

  pub fn is_empty(&self) -> bool {
    self.values.is_empty()
  }

  /// Looks an argument up by parameter name.
  pub fn get(&self, name: &str) -> Option<&Value> {
    self
      .values
      .iter()
      .find(|(n, _)| n == name)
      .map(|(_, v)| v)
  }

  /// Looks an argument up by position.
  pub fn at(&self, index: usize) -> Option<&Value> {
    self.values.get(index).map(|(_, v)| v)
  }

  pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
    self.values.iter().map(|(n, v)| (n.as_str(), v))
  }

  fn require(&self, name: &str) -> Result<&Value, ArgumentError> {
    self
      .get(name)
      .ok_or_else(|| ArgumentError::Missing(name.to_owned()))
  }

  fn mismatch(name: &str, expected: &'static str, found: &Value) -> ArgumentError {
    ArgumentError::Mismatch {
      name: name.to_owned(),
      expected,
      found: found.kind(),
    }
  }

  /// A required object argument of concrete type `T`.
  pub fn object<T: Any + Send + Sync>(&self, name: &str) -> Result<Arc<T>, ArgumentError> {
    self
      .optional_object(name)?
      .ok_or_else(|| Self::mismatch(name, type_name::<T>(), &Value::Null))
  }

  /// An object argument that may be null.
  pub fn optional_object<T: Any + Send + Sync>(
    &self,
    name: &str,
  ) -> Result<Option<Arc<T>>, ArgumentError> {
    match self.require(name)? {
      Value::Null => Ok(None),
      Value::Object(instance) => instance
        .downcast::<T>()
        .map(Some)
        .ok_or(ArgumentError::Mismatch {
          name: name.to_owned(),
          expected: type_name::<T>(),
          found: instance.type_name(),
        }),
      other => Err(Self::mismatch(name, type_name::<T>(), other)),
    }
  }

  /// A required trait-object argument.
  pub fn trait_object<I: ?Sized + Any + Send + Sync>(
    &self,
    name: &str,
  ) -> Result<Arc<I>, ArgumentError> {
    self
      .optional_trait_object(name)?
      .ok_or_else(|| Self::mismatch(name, type_name::<I>(), &Value::Null))
  }

  /// A trait-object argument that may be null.
  pub fn optional_trait_object<I: ?Sized + Any + Send + Sync>(
    &self,
    name: &str,
  ) -> Result<Option<Arc<I>>, ArgumentError> {
    match self.require(name)? {
      Value::Null => Ok(None),
      Value::Object(instance) => instance
        .downcast_trait::<I>()
        .map(Some)
        .ok_or(ArgumentError::Mismatch {
          name: name.to_owned(),
          expected: type_name::<I>(),
          found: instance.type_name(),
        }),
      other => Err(Self::mismatch(name, type_name::<I>(), other)),
    }
  }

  pub fn string(&self, name: &str) -> Result<String, ArgumentError> {
    match self.require(name)? {
      Value::Str(s) => Ok(s.clone()),
      other => Err(Self::mismatch(name, "string", other)),
    }
  }

  pub fn int(&self, name: &str) -> Result<i64, ArgumentError> {
    match self.require(name)? {
      Value::Int(i) => Ok(*i),
      other => Err(Self::mismatch(name, "int", other)),
    }
  }

  /// A float argument; integers are widened.
  pub fn float(&self, name: &str) -> Result<f64, ArgumentError> {
    match self.require(name)? {
      Value::Float(f) => Ok(*f),
      Value::Int(i) => Ok(*i as f64),
      other => Err(Self::mismatch(name, "float", other)),
    }
  }

  pub fn bool(&self, name: &str) -> Result<bool, ArgumentError> {
    match self.require(name)? {
      Value::Bool(b) => Ok(*b),
      other => Err(Self::mismatch(name, "bool", other)),
    }
  }
}
