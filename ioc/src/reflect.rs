//! Type descriptions used by the container to auto-wire constructors.
//!
//! Rust has no runtime reflection over constructors, so every type the
//! container may build registers a [`TypeDef`]: its name, its declared
//! constructor parameters, and a function that instantiates it from the
//! resolved [`Arguments`].

use crate::error::{BoxError, ResolutionError};
use crate::value::{Arguments, Instance, Value};
use std::any::Any;
use std::fmt;
use std::sync::Arc;

/// Type names that denote built-in values rather than buildable types.
const BUILTIN_TYPES: &[&str] = &[
  "bool", "int", "float", "string", "array", "iterable", "callable", "mixed", "object",
];

pub(crate) type Instantiator = Arc<dyn Fn(Arguments) -> Result<Instance, BoxError> + Send + Sync>;

/// A parsed parameter type declaration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum DeclaredType {
  Untyped,
  Builtin(String),
  Named { name: String, nullable: bool },
  Union(Vec<String>),
}

impl DeclaredType {
  /// Parses declarations such as `""`, `"int"`, `"?Logger"`, `"Logger|null"`
  /// or `"A|B"`.
  pub(crate) fn parse(decl: &str) -> Result<Self, String> {
    let decl = decl.trim();
    if decl.is_empty() {
      return Ok(DeclaredType::Untyped);
    }

    if let Some(inner) = decl.strip_prefix('?') {
      return match DeclaredType::parse_single(inner)? {
        DeclaredType::Named { name, .. } => Ok(DeclaredType::Named {
          name,
          nullable: true,
        }),
        other => Ok(other),
      };
    }

    if !decl.contains('|') {
      return DeclaredType::parse_single(decl);
    }

    let members = decl
      .split('|')
      .map(str::trim)
      .map(|m| {
        if m.is_empty() {
          Err(format!("empty member in union type `{}`", decl))
        } else {
          Ok(m.to_owned())
        }
      })
      .collect::<Result<Vec<_>, _>>()?;

    let without_null: Vec<&String> = members
      .iter()
      .filter(|m| !m.eq_ignore_ascii_case("null"))
      .collect();

    // `T|null` is the nullable spelling of `T`, not a union.
    if without_null.len() == 1 && members.len() == 2 {
      return match DeclaredType::parse_single(without_null[0])? {
        DeclaredType::Named { name, .. } => Ok(DeclaredType::Named {
          name,
          nullable: true,
        }),
        other => Ok(other),
      };
    }

    for member in &members {
      DeclaredType::parse_single(member)?;
    }
    Ok(DeclaredType::Union(members))
  }

  fn parse_single(decl: &str) -> Result<Self, String> {
    if BUILTIN_TYPES.contains(&decl) {
      return Ok(DeclaredType::Builtin(decl.to_owned()));
    }
    validate_type_name(decl)?;
    Ok(DeclaredType::Named {
      name: decl.to_owned(),
      nullable: false,
    })
  }
}

/// Checks that `name` is a well-formed type reference: identifier segments
/// separated by `\` or `::`.
pub(crate) fn validate_type_name(name: &str) -> Result<(), String> {
  let name = name.strip_prefix('\\').unwrap_or(name);
  if name.is_empty() {
    return Err("empty type name".to_owned());
  }
  for segment in name.split('\\').flat_map(|s| s.split("::")) {
    let mut chars = segment.chars();
    let valid = match chars.next() {
      Some(first) if first.is_alphabetic() || first == '_' => {
        chars.all(|c| c.is_alphanumeric() || c == '_')
      }
      _ => false,
    };
    if !valid {
      return Err(format!("malformed type reference `{}`", name));
    }
  }
  Ok(())
}

/// A declared constructor parameter.
#[derive(Clone, Debug)]
pub struct Parameter {
  name: String,
  declared: String,
  default: Option<Value>,
  nullable: bool,
}

impl Parameter {
  /// A parameter with a type declaration: `""` (untyped), a built-in such as
  /// `"string"`, a type name such as `"Database"`, a nullable type such as
  /// `"?Logger"`, or a union such as `"Sms|Email"`.
  pub fn new(name: impl Into<String>, declared: impl Into<String>) -> Self {
    Self {
      name: name.into(),
      declared: declared.into(),
      default: None,
      nullable: false,
    }
  }

  /// A parameter with no declared type.
  pub fn untyped(name: impl Into<String>) -> Self {
    Self::new(name, "")
  }

  /// Sets the declared default value.
  pub fn with_default(mut self, value: impl Into<Value>) -> Self {
    self.default = Some(value.into());
    self
  }

  /// Marks the parameter as accepting null.
  pub fn nullable(mut self) -> Self {
    self.nullable = true;
    self
  }

  pub fn name(&self) -> &str {
    &self.name
  }

  pub fn declared_type(&self) -> &str {
    &self.declared
  }

  pub fn default_value(&self) -> Option<&Value> {
    self.default.as_ref()
  }

  pub fn is_nullable(&self) -> bool {
    self.nullable
  }

  pub(crate) fn parse_type(&self) -> Result<DeclaredType, String> {
    DeclaredType::parse(&self.declared)
  }
}

/// Describes one type the container knows how to build.
#[derive(Clone)]
pub struct TypeDef {
  name: String,
  constructor: Option<Vec<Parameter>>,
  instantiate: Option<Instantiator>,
}

impl TypeDef {
  /// Starts describing a concrete type.
  pub fn class(name: impl Into<String>) -> TypeDefBuilder {
    TypeDefBuilder {
      name: name.into(),
      constructor: None,
    }
  }

  /// Describes an abstract type (an interface) that can only be resolved
  /// through a binding.
  pub fn interface(name: impl Into<String>) -> TypeDef {
    TypeDef {
      name: name.into(),
      constructor: None,
      instantiate: None,
    }
  }

  pub fn name(&self) -> &str {
    &self.name
  }

  pub fn is_instantiable(&self) -> bool {
    self.instantiate.is_some()
  }

  /// The declared constructor parameters, or `None` if the type declares no
  /// constructor.
  pub fn parameters(&self) -> Option<&[Parameter]> {
    self.constructor.as_deref()
  }

  pub(crate) fn instantiator(&self) -> Option<&Instantiator> {
    self.instantiate.as_ref()
  }
}

impl fmt::Debug for TypeDef {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("TypeDef")
      .field("name", &self.name)
      .field("constructor", &self.constructor)
      .field("instantiable", &self.is_instantiable())
      .finish()
  }
}

/// Builder returned by [`TypeDef::class`].
#[derive(Debug)]
pub struct TypeDefBuilder {
  name: String,
  constructor: Option<Vec<Parameter>>,
}

impl TypeDefBuilder {
  /// Appends a constructor parameter. Declaration order is resolution order.
  pub fn param(mut self, parameter: Parameter) -> Self {
    self.constructor.get_or_insert_with(Vec::new).push(parameter);
    self
  }

  /// Declares an explicit constructor that takes no parameters.
  pub fn empty_constructor(mut self) -> Self {
    self.constructor.get_or_insert_with(Vec::new);
    self
  }

  /// Finishes the description with a function building a concrete `T`.
  pub fn build<T, F, E>(self, instantiate: F) -> TypeDef
  where
    T: Any + Send + Sync,
    F: Fn(Arguments) -> Result<T, E> + Send + Sync + 'static,
    E: Into<BoxError>,
  {
    self.finish(Arc::new(move |args: Arguments| -> Result<Instance, BoxError> {
      instantiate(args).map(Instance::new).map_err(Into::into)
    }))
  }

  /// Finishes the description with a function building a trait object.
  pub fn build_trait<I, F, E>(self, instantiate: F) -> TypeDef
  where
    I: ?Sized + Any + Send + Sync,
    F: Fn(Arguments) -> Result<Arc<I>, E> + Send + Sync + 'static,
    E: Into<BoxError>,
  {
    self.finish(Arc::new(move |args: Arguments| -> Result<Instance, BoxError> {
      instantiate(args).map(Instance::from_trait).map_err(Into::into)
    }))
  }

  fn finish(self, instantiate: Instantiator) -> TypeDef {
    TypeDef {
      name: self.name,
      constructor: self.constructor,
      instantiate: Some(instantiate),
    }
  }
}

impl TypeDef {
  pub(crate) fn instantiate(&self, args: Arguments) -> Result<Instance, ResolutionError> {
    let instantiate = self
      .instantiator()
      .ok_or_else(|| ResolutionError::NotInstantiable {
        key: self.name.clone(),
      })?;
    instantiate(args).map_err(|source| ResolutionError::Construction {
      key: self.name.clone(),
      source,
    })
  }
}
