//! Public macros for ergonomic service resolution.

/// Resolves a typed service from a container.
///
/// This macro is meant for application wiring code where a missing service
/// is a programming error. It panics with the full resolution error if the
/// service cannot be resolved or has a different type. For a non-panicking
/// version, use [`Container::get`](crate::Container::get) directly.
///
/// # Panics
///
/// Panics if the service cannot be resolved.
///
/// # Examples
///
/// ```
/// use coop_ioc::{resolve, Container, Strategy};
///
/// struct Clock;
/// struct Ledger { name: String }
///
/// let container = Container::new();
/// container.singleton("clock", Strategy::factory(|_, _| Ok(Clock)));
/// container.register_value("ledger", Ledger { name: "main".into() });
///
/// let _clock = resolve!(container, Clock, "clock");
/// let ledger = resolve!(container, Ledger, "ledger");
/// assert_eq!(ledger.name, "main");
/// ```
///
/// ```
/// use coop_ioc::{resolve, Container, Strategy};
/// use std::sync::Arc;
///
/// trait Greeter: Send + Sync { fn greet(&self) -> String; }
/// struct EnglishGreeter;
/// impl Greeter for EnglishGreeter { fn greet(&self) -> String { "Hello!".to_string() } }
///
/// let container = Container::new();
/// container.singleton(
///   "greeter",
///   Strategy::trait_factory(|_, _| Ok(Arc::new(EnglishGreeter) as Arc<dyn Greeter>)),
/// );
///
/// let greeter = resolve!(container, trait Greeter, "greeter");
/// assert_eq!(greeter.greet(), "Hello!");
/// ```
#[macro_export]
macro_rules! resolve {
    // Arm for resolving a trait object: resolve!(container, trait MyTrait, "key")
    ($container:expr, trait $trait_ident:ident, $key:expr) => {
        match $container.get_trait::<dyn $trait_ident>($key) {
            Ok(service) => service,
            Err(err) => panic!(
                "Failed to resolve required trait service '{}': {}",
                $key, err
            ),
        }
    };

    // Arm for resolving a concrete type: resolve!(container, MyService, "key")
    ($container:expr, $type:ty, $key:expr) => {
        match $container.get::<$type>($key) {
            Ok(service) => service,
            Err(err) => panic!(
                "Failed to resolve required service '{}': {}",
                $key, err
            ),
        }
    };
}

/// Builds an [`Overrides`](crate::Overrides) map from `name => value` pairs.
///
/// ```
/// use coop_ioc::{overrides, Value};
///
/// let o = overrides! { "rate" => 0.05, "branch" => "north" };
/// assert_eq!(o.get("branch"), Some(&Value::Str("north".into())));
/// assert!(overrides!().is_empty());
/// ```
#[macro_export]
macro_rules! overrides {
    () => {
        $crate::Overrides::new()
    };
    ($($name:expr => $value:expr),+ $(,)?) => {{
        let mut map = $crate::Overrides::new();
        $(
            map.insert(::std::string::String::from($name), $crate::Value::from($value));
        )+
        map
    }};
}
