use coop_ioc::{resolve, Container, Parameter, TypeDef};
use std::error::Error;
use std::panic;

struct UnregisteredService;

fn main() {
  let container = Container::new();
  container.define(
    TypeDef::class("StatementService")
      .param(Parameter::new("ledger", "LedgerRepository"))
      .build(|_| Ok::<_, std::convert::Infallible>(UnregisteredService)),
  );

  // --- Using the panicking `resolve!` macro ---
  println!("Attempting to resolve a service that was never registered...");

  let result = panic::catch_unwind(panic::AssertUnwindSafe(|| {
    // This line will panic!
    let _service = resolve!(container, UnregisteredService, "StatementService");
  }));

  assert!(result.is_err(), "resolve! should have panicked.");
  println!("Successfully caught the expected panic from resolve!.");

  // --- Using the fallible `resolve()` method ---
  println!("\nNow, attempting to resolve using the fallible `resolve()` method...");

  match container.resolve("StatementService") {
    Ok(_) => panic!("Should not have resolved the service!"),
    Err(err) => {
      println!("Resolution failed: {}", err);
      let mut source = err.source();
      while let Some(cause) = source {
        println!("  caused by: {}", cause);
        source = cause.source();
      }
    }
  }
}
