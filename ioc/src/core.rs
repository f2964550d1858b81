//! Core data structures for the container: strategies, bindings, the shared
//! registry and the resolution guard.

use crate::container::Container;
use crate::error::ResolutionError;
use crate::value::{Instance, Overrides};
use once_cell::sync::OnceCell;
use std::any::Any;
use std::cell::RefCell;
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::Arc;

thread_local! {
  // Keys currently being resolved on this thread, tagged with the id of the
  // container resolving them. Re-entering a key that is already on the stack
  // is a dependency cycle.
  static RESOLVING_STACK: RefCell<Vec<(usize, String)>> = const { RefCell::new(Vec::new()) };
}

/// Limits applied by a [`ResolutionGuard`].
#[derive(Debug, Clone, Copy)]
pub(crate) struct GuardPolicy {
  pub(crate) detect_cycles: bool,
  pub(crate) max_depth: usize,
}

/// An RAII guard that tracks in-progress resolutions.
///
/// Entering pushes the key onto the thread-local stack and fails if the key is
/// already being resolved by the same container, or if the stack is deeper
/// than the configured limit. Dropping the guard pops the key.
///
/// Re-entering a singleton key is always a cycle, even with detection turned
/// off: the thread would otherwise wait on a cell it is initializing itself.
pub(crate) struct ResolutionGuard {
  container_id: usize,
}

impl ResolutionGuard {
  pub(crate) fn enter(
    container_id: usize,
    key: &str,
    singleton: bool,
    policy: GuardPolicy,
  ) -> Result<Self, ResolutionError> {
    RESOLVING_STACK.with(|stack| {
      let mut stack = stack.borrow_mut();
      let in_progress: Vec<&str> = stack
        .iter()
        .filter(|(id, _)| *id == container_id)
        .map(|(_, k)| k.as_str())
        .collect();

      if policy.detect_cycles || singleton {
        if let Some(start) = in_progress.iter().position(|k| *k == key) {
          let mut path: Vec<String> =
            in_progress[start..].iter().map(|k| (*k).to_owned()).collect();
          path.push(key.to_owned());
          return Err(ResolutionError::Cycle {
            key: key.to_owned(),
            path,
          });
        }
      }

      if in_progress.len() >= policy.max_depth {
        return Err(ResolutionError::DepthExceeded {
          key: key.to_owned(),
          limit: policy.max_depth,
        });
      }

      stack.push((container_id, key.to_owned()));
      Ok(Self { container_id })
    })
  }
}

impl Drop for ResolutionGuard {
  fn drop(&mut self) {
    RESOLVING_STACK.with(|stack| {
      let mut stack = stack.borrow_mut();
      if let Some(pos) = stack.iter().rposition(|(id, _)| *id == self.container_id) {
        stack.remove(pos);
      }
    });
  }
}

/// The shared function behind [`Strategy::Factory`].
pub type FactoryFn =
  Arc<dyn Fn(&Container, &Overrides) -> Result<Instance, ResolutionError> + Send + Sync>;

/// How a binding produces its instance.
#[derive(Clone)]
pub enum Strategy {
  /// A caller-supplied function given the container and the overrides.
  Factory(FactoryFn),
  /// A named type built from its [`TypeDef`](crate::TypeDef).
  Class(String),
}

impl Strategy {
  /// A factory producing a concrete `T`.
  pub fn factory<T, F>(factory: F) -> Self
  where
    T: Any + Send + Sync,
    F: Fn(&Container, &Overrides) -> Result<T, ResolutionError> + Send + Sync + 'static,
  {
    Strategy::Factory(Arc::new(move |c: &Container, o: &Overrides| {
      factory(c, o).map(Instance::new)
    }))
  }

  /// A factory producing a trait object, resolved later with
  /// [`Container::get_trait`].
  pub fn trait_factory<I, F>(factory: F) -> Self
  where
    I: ?Sized + Any + Send + Sync,
    F: Fn(&Container, &Overrides) -> Result<Arc<I>, ResolutionError> + Send + Sync + 'static,
  {
    Strategy::Factory(Arc::new(move |c: &Container, o: &Overrides| {
      factory(c, o).map(Instance::from_trait)
    }))
  }

  /// A factory that already produces a type-erased [`Instance`].
  pub fn instance_factory<F>(factory: F) -> Self
  where
    F: Fn(&Container, &Overrides) -> Result<Instance, ResolutionError> + Send + Sync + 'static,
  {
    Strategy::Factory(Arc::new(factory))
  }

  /// A reference to a type registered with [`Container::define`].
  pub fn class(name: impl Into<String>) -> Self {
    Strategy::Class(name.into())
  }
}

impl fmt::Debug for Strategy {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Strategy::Factory(_) => write!(f, "Factory"),
      Strategy::Class(name) => write!(f, "Class({})", name),
    }
  }
}

impl From<&str> for Strategy {
  fn from(name: &str) -> Self {
    Strategy::Class(name.to_owned())
  }
}

impl From<String> for Strategy {
  fn from(name: String) -> Self {
    Strategy::Class(name)
  }
}

/// A registered rule for one abstract key.
#[derive(Clone)]
pub(crate) struct Binding {
  pub(crate) strategy: Strategy,
  // Present only for singleton bindings; guarantees a single construction.
  pub(crate) cell: Option<Arc<OnceCell<Instance>>>,
}

impl Binding {
  pub(crate) fn new(strategy: Strategy, singleton: bool) -> Self {
    Self {
      strategy,
      cell: singleton.then(|| Arc::new(OnceCell::new())),
    }
  }

  pub(crate) fn is_singleton(&self) -> bool {
    self.cell.is_some()
  }
}

/// The three collections guarded together by the container's lock.
#[derive(Default)]
pub(crate) struct Registry {
  pub(crate) bindings: HashMap<String, Binding>,
  pub(crate) instances: HashMap<String, Instance>,
  pub(crate) singletons: HashSet<String>,
}

impl Registry {
  pub(crate) fn clear(&mut self) {
    self.bindings.clear();
    self.instances.clear();
    self.singletons.clear();
  }
}
