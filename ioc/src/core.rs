//! Core, non-public data structures for the IoC container.

use std::any::{Any, TypeId};
use std::cell::RefCell;
use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

use crate::container::Injector;
use crate::error::IocError;

thread_local! {
  // This thread-local variable holds the set of bindings currently being
  // resolved on this specific thread. This is the key to detecting circular
  // dependencies. Entries carry the owning container's id so that independent
  // containers resolving on the same thread never collide.
  static RESOLVING_STACK: RefCell<HashSet<BindingId>> = RefCell::new(HashSet::new());
}

/// The identity of a bindable value: its type plus an optional qualifier.
///
/// Two keys are identical iff both the type and the qualifier match, so the
/// same type may be bound several times under different qualifiers.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct Key {
  type_id: TypeId,
  type_name: &'static str,
  qualifier: Option<String>,
}

impl Key {
  pub(crate) fn of<T: ?Sized + Any>(qualifier: Option<&str>) -> Self {
    Self {
      type_id: TypeId::of::<T>(),
      type_name: std::any::type_name::<T>(),
      qualifier: qualifier.map(str::to_owned),
    }
  }

  /// The `std::any::type_name` of the bound type.
  pub fn type_name(&self) -> &'static str {
    self.type_name
  }

  /// The qualifier this key was bound under, if any.
  pub fn qualifier(&self) -> Option<&str> {
    self.qualifier.as_deref()
  }
}

impl fmt::Debug for Key {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match &self.qualifier {
      Some(q) => write!(f, "Key({}, \"{}\")", self.type_name, q),
      None => write!(f, "Key({})", self.type_name),
    }
  }
}

/// Identifies one binding inside one container: the owning environment's
/// arena index plus the key it is bound under.
#[derive(Clone, PartialEq, Eq, Hash)]
pub(crate) struct BindingId {
  pub(crate) container: u64,
  pub(crate) env: usize,
  pub(crate) key: Key,
}

/// A type-erased shared value. The inner concrete type is always `Arc<T>`
/// for the bound `T`, so cached values can be cloned out cheaply.
pub(crate) type Shared = Arc<dyn Any + Send + Sync>;

/// A provisioning function. It receives an [`Injector`] pinned to the
/// binding's owning environment, so it can resolve private siblings.
pub(crate) type FactoryFn =
  Box<dyn Fn(&Injector<'_>) -> Result<Shared, IocError> + Send + Sync>;

/// A binding's provisioning strategy. The variant is the binding's scope
/// tag; dispatch is a plain `match`, there is no virtual dispatch here.
pub(crate) enum Provider {
  /// Construct once per container, on first request. The cell doubles as the
  /// per-binding lock: concurrent first requests block until one winner has
  /// constructed the value.
  Singleton {
    cell: once_cell::sync::OnceCell<Shared>,
    factory: FactoryFn,
  },
  /// Construct on every request, no caching.
  Transient { factory: FactoryFn },
  /// Construct at most once per entered request scope.
  RequestScoped { factory: FactoryFn },
}

impl Provider {
  pub(crate) fn singleton(factory: FactoryFn) -> Self {
    Self::Singleton {
      cell: once_cell::sync::OnceCell::new(),
      factory,
    }
  }

  pub(crate) fn transient(factory: FactoryFn) -> Self {
    Self::Transient { factory }
  }

  pub(crate) fn request_scoped(factory: FactoryFn) -> Self {
    Self::RequestScoped { factory }
  }
}

/// Recovers a typed `Arc<T>` from a type-erased shared value.
///
/// The erased value was produced by a factory registered under `key`, which in
/// turn was built from `TypeId::of::<T>()`, so the downcast cannot fail for a
/// correctly constructed container.
pub(crate) fn downcast_shared<T: ?Sized + Any + Send + Sync>(key: &Key, shared: &Shared) -> Arc<T> {
  shared
    .downcast_ref::<Arc<T>>()
    .cloned()
    .unwrap_or_else(|| panic!("binding for {:?} holds a value of an unexpected type", key))
}

/// An RAII guard that detects circular dependencies.
///
/// Acquiring the guard records the binding on the thread-local resolution
/// stack; a binding already on the stack means resolution has looped back to
/// itself. Dropping the guard removes the entry.
pub(crate) struct ResolutionGuard {
  id: BindingId,
}

impl ResolutionGuard {
  pub(crate) fn acquire(id: BindingId) -> Result<Self, IocError> {
    let fresh = RESOLVING_STACK.with(|stack| stack.borrow_mut().insert(id.clone()));
    if fresh {
      Ok(Self { id })
    } else {
      Err(IocError::CircularDependency { key: id.key })
    }
  }
}

impl Drop for ResolutionGuard {
  fn drop(&mut self) {
    RESOLVING_STACK.with(|stack| {
      stack.borrow_mut().remove(&self.id);
    });
  }
}
