//! # Coop IoC
//!
//! The dependency resolution container behind the cooperative society
//! information system.
//!
//! Services are registered under abstract string keys and resolved on demand.
//! Keys without a binding are treated as type names: the container looks up
//! the type's [`TypeDef`], resolves each declared constructor parameter
//! (recursively, for class-typed parameters) and instantiates it.
//!
//! ## Core Concepts
//!
//! - **Container**: the registry of bindings, cached instances and type
//!   descriptions. It is an explicit context object; there is no global one.
//! - **Binding**: a key mapped to a [`Strategy`] (a factory or a class name),
//!   optionally as a singleton.
//! - **Instance registration**: pre-built objects that always win over bindings.
//! - **Overrides**: per-call values for constructor parameters, by name.
//!
//! ## Quick Start
//!
//! ```
//! use coop_ioc::{overrides, Container, Parameter, TypeDef};
//!
//! struct Database;
//! struct LoanService {
//!   _db: std::sync::Arc<Database>,
//!   branch: String,
//! }
//!
//! let container = Container::new();
//! container.define(
//!   TypeDef::class("Database").build(|_| Ok::<_, std::convert::Infallible>(Database)),
//! );
//! container.define(
//!   TypeDef::class("LoanService")
//!     .param(Parameter::new("db", "Database"))
//!     .param(Parameter::new("branch", "string").with_default("head-office"))
//!     .build(|args| -> Result<_, coop_ioc::ArgumentError> {
//!       Ok(LoanService {
//!         _db: args.object("db")?,
//!         branch: args.string("branch")?,
//!       })
//!     }),
//! );
//!
//! let service = container.get::<LoanService>("LoanService").unwrap();
//! assert_eq!(service.branch, "head-office");
//!
//! let north = container
//!   .resolve_with("LoanService", &overrides! { "branch" => "north" })
//!   .unwrap();
//! assert_eq!(north.downcast::<LoanService>().unwrap().branch, "north");
//! ```

mod config;
mod container;
mod core;
mod error;
mod macros;
mod reflect;
mod value;

pub use config::ContainerConfig;
pub use container::Container;
pub use core::{FactoryFn, Strategy};
pub use error::{ArgumentError, BoxError, ConfigError, ResolutionError};
pub use reflect::{Parameter, TypeDef, TypeDefBuilder};
pub use value::{Arguments, Instance, Overrides, Value};
