// ioc/tests/macros.rs

//! Tests specifically for the exported macros:
//! - `resolve!` for concrete and trait services
//! - `overrides!` for per-call parameter values

use coop_ioc::{overrides, resolve, Container, Parameter, Strategy, TypeDef, Value};
use std::sync::Arc;

// --- Test Fixtures ---

struct MacroTestService {
  value: i32,
}
trait MacroTestTrait: Send + Sync {
  fn value(&self) -> i32;
}
impl MacroTestTrait for MacroTestService {
  fn value(&self) -> i32 {
    self.value
  }
}

fn container() -> Container {
  let container = Container::new();
  container.singleton("service", Strategy::factory(|_, _| Ok(MacroTestService { value: 42 })));
  container.singleton(
    "service_trait",
    Strategy::trait_factory(|_, _| {
      Ok(Arc::new(MacroTestService { value: 44 }) as Arc<dyn MacroTestTrait>)
    }),
  );
  container
}

// --- resolve! ---

#[test]
fn test_resolve_concrete_and_trait() {
  let container = container();

  assert_eq!(resolve!(container, MacroTestService, "service").value, 42);
  assert_eq!(resolve!(container, trait MacroTestTrait, "service_trait").value(), 44);

  // Singleton identity is preserved through the macro.
  let a = resolve!(container, MacroTestService, "service");
  let b = resolve!(container, MacroTestService, "service");
  assert!(Arc::ptr_eq(&a, &b));
}

#[test]
fn test_resolve_accepts_container_reference() {
  let container = container();
  let by_ref = &container;

  assert_eq!(resolve!(by_ref, MacroTestService, "service").value, 42);
}

#[test]
#[should_panic(expected = "Failed to resolve required service 'missing'")]
fn test_resolve_panics_on_missing_concrete_service() {
  let container = container();
  resolve!(container, MacroTestService, "missing");
}

#[test]
#[should_panic(expected = "Failed to resolve required trait service 'service'")]
fn test_resolve_panics_on_wrong_trait() {
  // "service" holds a concrete value, not a trait object.
  let container = container();
  resolve!(container, trait MacroTestTrait, "service");
}

// --- overrides! ---

#[test]
fn test_overrides_builds_named_values() {
  let o = overrides! {
    "rate" => 0.05,
    "periods" => 12,
    "branch" => "north",
    "audited" => true,
    "guarantor" => Value::Null,
  };

  assert_eq!(o.len(), 5);
  assert_eq!(o["rate"], Value::Float(0.05));
  assert_eq!(o["periods"], Value::Int(12));
  assert_eq!(o["branch"], Value::Str("north".to_string()));
  assert_eq!(o["audited"], Value::Bool(true));
  assert!(o["guarantor"].is_null());
  assert!(overrides!().is_empty());
}

#[test]
fn test_overrides_feed_constructor_parameters() {
  struct Dividend {
    rate: f64,
  }
  let container = Container::new();
  container.define(
    TypeDef::class("Dividend")
      .param(Parameter::new("rate", "float"))
      .build(|args| -> Result<_, coop_ioc::ArgumentError> {
        Ok(Dividend {
          rate: args.float("rate")?,
        })
      }),
  );

  let dividend = container
    .resolve_with("Dividend", &overrides! { "rate" => 7 })
    .unwrap()
    .downcast::<Dividend>()
    .unwrap();

  // Integers are widened for float parameters.
  assert_eq!(dividend.rate, 7.0);
}
