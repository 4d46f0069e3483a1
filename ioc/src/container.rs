//! The `Container` facade and the `Injector` resolution handle.

use std::any::Any;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use crate::core::{downcast_shared, BindingId, Key, Provider, ResolutionGuard};
use crate::env::{EnvNode, Environment};
use crate::error::IocError;
use crate::resolver;
use crate::scope::{ScopeGuard, ScopeManager};

/// Arena index of the root namespace.
const ROOT: usize = 0;

// Distinguishes containers on the shared thread-local resolution stack, so
// independent containers in one process never interfere.
static NEXT_CONTAINER_ID: AtomicU64 = AtomicU64::new(0);

/// The Inversion of Control (IoC) container.
///
/// A container is built in two phases. During configuration, environments are
/// [`register`](Container::register)ed; [`seal`](Container::seal) then
/// validates the whole graph and freezes it. After sealing, the container is
/// read-only and [`get_instance`](Container::get_instance) may be called from
/// any number of threads concurrently.
///
/// All state lives on the instance itself, so multiple containers coexist in
/// one process without interference.
pub struct Container {
  id: u64,
  envs: Vec<EnvNode>,
  scopes: ScopeManager,
  sealed: bool,
}

impl Default for Container {
  fn default() -> Self {
    Self::new()
  }
}

impl Container {
  /// Creates a new, empty `Container`.
  pub fn new() -> Self {
    Self {
      id: NEXT_CONTAINER_ID.fetch_add(1, Ordering::Relaxed),
      envs: vec![EnvNode::root()],
      scopes: ScopeManager::new(),
      sealed: false,
    }
  }

  // --- CONFIGURATION ---

  /// Registers a root-level environment.
  ///
  /// The environment's exposed keys enter the container's global namespace;
  /// everything else it binds stays private to it. Exposed keys colliding
  /// across registered environments are reported by [`seal`](Container::seal).
  pub fn register(&mut self, env: Environment) -> Result<(), IocError> {
    if self.sealed {
      return Err(IocError::Sealed);
    }
    self.attach(env, ROOT);
    Ok(())
  }

  // Flattens an environment tree into the arena, preorder, wiring parent
  // indices as it goes.
  fn attach(&mut self, env: Environment, parent: usize) {
    let (name, locals, exposed, expose_all, requires, children) = env.into_parts();
    let idx = self.envs.len();
    self.envs.push(EnvNode {
      name,
      parent: Some(parent),
      locals,
      exposed,
      expose_all,
      requires,
      layer: Default::default(),
    });
    for child in children {
      self.attach(child, idx);
    }
  }

  /// Validates the binding graph and freezes the container.
  ///
  /// Builds every environment's visibility layer (surfacing
  /// [`IocError::ConflictingBinding`]) and checks each environment's declared
  /// requirements (surfacing [`IocError::UnresolvedKey`] now rather than at
  /// first use). Sealing an already-sealed container is a no-op.
  pub fn seal(&mut self) -> Result<(), IocError> {
    if self.sealed {
      return Ok(());
    }
    resolver::build_layers(&mut self.envs)?;
    for idx in 0..self.envs.len() {
      for key in &self.envs[idx].requires {
        resolver::resolve(&self.envs, idx, key)?;
      }
    }
    self.sealed = true;
    tracing::debug!(
      environments = self.envs.len() - 1,
      bindings = self.envs.iter().map(|e| e.locals.len()).sum::<usize>(),
      "container sealed"
    );
    Ok(())
  }

  // --- RESOLUTION ---

  /// Resolves an instance from the container's global namespace.
  ///
  /// Only keys bound by (or exposed into) the root namespace are reachable
  /// here; an environment's private bindings fail with
  /// [`IocError::UnresolvedKey`] no matter what they contain.
  pub fn get_instance<T: ?Sized + Any + Send + Sync>(
    &self,
    qualifier: Option<&str>,
  ) -> Result<Arc<T>, IocError> {
    if !self.sealed {
      return Err(IocError::NotSealed);
    }
    self.resolve_from(ROOT, Key::of::<T>(qualifier))
  }

  pub(crate) fn resolve_from<T: ?Sized + Any + Send + Sync>(
    &self,
    from: usize,
    key: Key,
  ) -> Result<Arc<T>, IocError> {
    let (owner, provider) = resolver::resolve(&self.envs, from, &key)?;
    let id = BindingId {
      container: self.id,
      env: owner,
      key: key.clone(),
    };
    // The guard must be in place before any factory can run, including the
    // one inside the singleton cell, or a cycle would deadlock there instead
    // of erroring.
    let _guard = ResolutionGuard::acquire(id.clone())?;

    let injector = Injector {
      container: self,
      env: owner,
    };
    let shared = match provider {
      Provider::Transient { factory } => factory(&injector)?,
      Provider::Singleton { cell, factory } => {
        Arc::clone(cell.get_or_try_init(|| factory(&injector))?)
      }
      Provider::RequestScoped { factory } => {
        self.scopes.get_or_create(id, || factory(&injector))?
      }
    };
    Ok(downcast_shared::<T>(&key, &shared))
  }

  // --- SCOPE LIFECYCLE ---

  /// Opens a request scope on the current execution context. Called by the
  /// surrounding unit-of-work layer at the start of each inbound request.
  pub fn enter_scope(&self) -> Result<(), IocError> {
    self.scopes.enter()
  }

  /// Closes the request scope on the current execution context, dropping all
  /// values cached for it.
  pub fn exit_scope(&self) -> Result<(), IocError> {
    self.scopes.exit()
  }

  /// Opens a request scope and returns a guard that closes it on drop.
  pub fn scope(&self) -> Result<ScopeGuard<'_>, IocError> {
    self.enter_scope()?;
    Ok(ScopeGuard::new(self))
  }
}

/// The resolution handle passed to provisioning functions.
///
/// An `Injector` is pinned to the environment that owns the binding being
/// constructed, so a factory sees exactly what its own environment sees:
/// private siblings first, then whatever ancestors expose to it.
pub struct Injector<'a> {
  container: &'a Container,
  env: usize,
}

impl Injector<'_> {
  /// Resolves a dependency relative to the owning environment.
  pub fn get<T: ?Sized + Any + Send + Sync>(
    &self,
    qualifier: Option<&str>,
  ) -> Result<Arc<T>, IocError> {
    self.container.resolve_from(self.env, Key::of::<T>(qualifier))
  }
}
