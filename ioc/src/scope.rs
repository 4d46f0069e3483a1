//! Request-scope lifecycle management.
//!
//! A request scope is entered and exited by the surrounding unit-of-work
//! layer (an HTTP server, a job runner) around each piece of work. While a
//! scope is active on an execution context, every request-scoped binding is
//! constructed at most once for that context and torn down when the scope
//! exits. The execution context is the current thread: the scope table is
//! keyed by [`ThreadId`], so concurrent requests on different threads never
//! contend over each other's caches.

use std::collections::HashMap;
use std::marker::PhantomData;
use std::thread::{self, ThreadId};

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;

use crate::container::Container;
use crate::core::{BindingId, Shared};
use crate::error::IocError;

/// The value cache for one entered scope on one execution context.
///
/// Values are keyed by the full binding identity, not just the key: two
/// environments privately binding the same key each get their own slot, while
/// still sharing the one scope instance of the enclosing request.
#[derive(Default)]
struct ScopeInstance {
  values: HashMap<BindingId, Shared>,
}

/// Tracks active scope instances per execution context.
pub(crate) struct ScopeManager {
  active: DashMap<ThreadId, ScopeInstance>,
}

impl ScopeManager {
  pub(crate) fn new() -> Self {
    Self {
      active: DashMap::new(),
    }
  }

  /// Opens a scope on the current context. Nesting is not permitted.
  pub(crate) fn enter(&self) -> Result<(), IocError> {
    let ctx = thread::current().id();
    match self.active.entry(ctx) {
      Entry::Occupied(_) => Err(IocError::ReentrantScope),
      Entry::Vacant(slot) => {
        slot.insert(ScopeInstance::default());
        tracing::trace!(context = ?ctx, "request scope entered");
        Ok(())
      }
    }
  }

  /// Closes the scope on the current context, dropping every cached value.
  /// Cleanup beyond dropping the references is the caller's responsibility.
  pub(crate) fn exit(&self) -> Result<(), IocError> {
    let ctx = thread::current().id();
    match self.active.remove(&ctx) {
      Some(_) => {
        tracing::trace!(context = ?ctx, "request scope exited");
        Ok(())
      }
      None => Err(IocError::ScopeLifecycle),
    }
  }

  /// Returns the cached value for the binding, constructing it via `make` on
  /// first request within the active scope.
  pub(crate) fn get_or_create(
    &self,
    id: BindingId,
    make: impl FnOnce() -> Result<Shared, IocError>,
  ) -> Result<Shared, IocError> {
    let ctx = thread::current().id();

    // The shard guard must not be held across `make`: factories recurse back
    // into this map when they resolve further request-scoped dependencies.
    {
      let instance = self.active.get(&ctx).ok_or(IocError::NoActiveScope)?;
      if let Some(value) = instance.values.get(&id) {
        return Ok(value.clone());
      }
    }

    let value = make()?;

    // Only the current thread writes to its own scope instance, so nothing
    // can have raced the miss above; `entry` keeps the insert idempotent all
    // the same.
    let mut instance = self.active.get_mut(&ctx).ok_or(IocError::NoActiveScope)?;
    Ok(instance.values.entry(id).or_insert(value).clone())
  }
}

/// An RAII handle for a request scope: entering returns the guard, dropping
/// it exits the scope.
///
/// ```
/// use warren_ioc::Container;
///
/// # fn main() -> Result<(), warren_ioc::IocError> {
/// let mut container = Container::new();
/// container.seal()?;
/// {
///   let _scope = container.scope()?;
///   // request-scoped bindings are live here
/// } // scope exits
/// # Ok(())
/// # }
/// ```
///
/// The scope lives on the execution context that entered it, so the guard is
/// pinned to that thread and cannot be sent to another one:
///
/// ```compile_fail
/// use warren_ioc::Container;
///
/// fn require_send<T: Send>(_: T) {}
///
/// let mut container = Container::new();
/// container.seal().unwrap();
/// require_send(container.scope().unwrap());
/// ```
pub struct ScopeGuard<'a> {
  container: &'a Container,
  // Exit must run on the entering thread; a guard moved across threads would
  // close the wrong context's scope and strand this one's instance.
  _not_send: PhantomData<*const ()>,
}

impl<'a> ScopeGuard<'a> {
  pub(crate) fn new(container: &'a Container) -> Self {
    Self {
      container,
      _not_send: PhantomData,
    }
  }
}

impl Drop for ScopeGuard<'_> {
  fn drop(&mut self) {
    // The guard entered the scope, so exit can only fail if the caller also
    // exited by hand underneath it.
    if self.container.exit_scope().is_err() {
      tracing::warn!("scope guard dropped after the scope was already exited");
    }
  }
}
