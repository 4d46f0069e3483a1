//! Configuration-phase binding environments.
//!
//! An [`Environment`] is an isolated namespace of bindings: everything bound
//! here is visible to other bindings in the same environment, but invisible
//! to the rest of the object graph unless explicitly exposed. Environments
//! nest via [`Environment::install`] and are handed to
//! [`Container::register`](crate::Container::register), which consumes them;
//! once the container is sealed the whole tree is immutable.

use std::any::Any;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use crate::container::Injector;
use crate::core::{FactoryFn, Key, Provider, Shared};
use crate::error::IocError;

/// A named, isolated collection of bindings under configuration.
///
/// ```
/// use warren_ioc::{Environment, IocError};
///
/// struct Credentials(&'static str);
/// struct Client { creds: std::sync::Arc<Credentials> }
///
/// # fn main() -> Result<(), IocError> {
/// let mut env = Environment::new("backend");
/// env.bind_singleton(None, |_| Ok(Credentials("hunter2")))?;
/// env.bind_singleton(None, |inj| {
///   Ok(Client { creds: inj.get::<Credentials>(None)? })
/// })?;
/// // Only the client leaves this environment; the credentials stay private.
/// env.expose::<Client>(None)?;
/// # Ok(())
/// # }
/// ```
pub struct Environment {
  name: String,
  bindings: HashMap<Key, Provider>,
  exposed: HashSet<Key>,
  expose_all: bool,
  requires: Vec<Key>,
  children: Vec<Environment>,
}

impl Environment {
  /// Creates a new, empty environment. The name only appears in error
  /// messages and logs.
  pub fn new(name: impl Into<String>) -> Self {
    Self {
      name: name.into(),
      bindings: HashMap::new(),
      exposed: HashSet::new(),
      expose_all: false,
      requires: Vec::new(),
      children: Vec::new(),
    }
  }

  /// The environment's name.
  pub fn name(&self) -> &str {
    &self.name
  }

  // --- PRIVATE HELPERS ---

  fn bind_internal(&mut self, key: Key, provider: Provider) -> Result<(), IocError> {
    if self.bindings.contains_key(&key) {
      return Err(IocError::DuplicateBinding {
        env: self.name.clone(),
        key,
      });
    }
    self.bindings.insert(key, provider);
    Ok(())
  }

  // Factories produce `Arc<Arc<T>>` erased to `Arc<dyn Any>`: the outer Arc
  // makes the erased value cloneable for the caches, the inner one is what
  // callers receive.
  fn erase<T: Any + Send + Sync>(
    factory: impl Fn(&Injector<'_>) -> Result<T, IocError> + Send + Sync + 'static,
  ) -> FactoryFn {
    Box::new(move |inj| {
      let shared: Shared = Arc::new(Arc::new(factory(inj)?));
      Ok(shared)
    })
  }

  fn erase_trait<I: ?Sized + Any + Send + Sync>(
    factory: impl Fn(&Injector<'_>) -> Result<Arc<I>, IocError> + Send + Sync + 'static,
  ) -> FactoryFn {
    Box::new(move |inj| {
      let shared: Shared = Arc::new(factory(inj)?);
      Ok(shared)
    })
  }

  // --- BINDING REGISTRATION ---

  /// Binds `T` with transient lifecycle: the factory runs on every request.
  pub fn bind_transient<T: Any + Send + Sync>(
    &mut self,
    qualifier: Option<&str>,
    factory: impl Fn(&Injector<'_>) -> Result<T, IocError> + Send + Sync + 'static,
  ) -> Result<(), IocError> {
    self.bind_internal(Key::of::<T>(qualifier), Provider::transient(Self::erase(factory)))
  }

  /// Binds `T` with singleton lifecycle: the factory runs at most once per
  /// container, on first request.
  pub fn bind_singleton<T: Any + Send + Sync>(
    &mut self,
    qualifier: Option<&str>,
    factory: impl Fn(&Injector<'_>) -> Result<T, IocError> + Send + Sync + 'static,
  ) -> Result<(), IocError> {
    self.bind_internal(Key::of::<T>(qualifier), Provider::singleton(Self::erase(factory)))
  }

  /// Binds `T` with request-scoped lifecycle: the factory runs at most once
  /// per entered scope, and the value is dropped when the scope exits.
  pub fn bind_request_scoped<T: Any + Send + Sync>(
    &mut self,
    qualifier: Option<&str>,
    factory: impl Fn(&Injector<'_>) -> Result<T, IocError> + Send + Sync + 'static,
  ) -> Result<(), IocError> {
    self.bind_internal(
      Key::of::<T>(qualifier),
      Provider::request_scoped(Self::erase(factory)),
    )
  }

  /// Binds a trait object `I` with transient lifecycle. The factory returns
  /// `Arc<I>`, so any concrete implementor can be registered against the
  /// trait.
  pub fn bind_transient_trait<I: ?Sized + Any + Send + Sync>(
    &mut self,
    qualifier: Option<&str>,
    factory: impl Fn(&Injector<'_>) -> Result<Arc<I>, IocError> + Send + Sync + 'static,
  ) -> Result<(), IocError> {
    self.bind_internal(
      Key::of::<I>(qualifier),
      Provider::transient(Self::erase_trait(factory)),
    )
  }

  /// Binds a trait object `I` with singleton lifecycle.
  pub fn bind_singleton_trait<I: ?Sized + Any + Send + Sync>(
    &mut self,
    qualifier: Option<&str>,
    factory: impl Fn(&Injector<'_>) -> Result<Arc<I>, IocError> + Send + Sync + 'static,
  ) -> Result<(), IocError> {
    self.bind_internal(
      Key::of::<I>(qualifier),
      Provider::singleton(Self::erase_trait(factory)),
    )
  }

  /// Binds a trait object `I` with request-scoped lifecycle.
  pub fn bind_request_scoped_trait<I: ?Sized + Any + Send + Sync>(
    &mut self,
    qualifier: Option<&str>,
    factory: impl Fn(&Injector<'_>) -> Result<Arc<I>, IocError> + Send + Sync + 'static,
  ) -> Result<(), IocError> {
    self.bind_internal(
      Key::of::<I>(qualifier),
      Provider::request_scoped(Self::erase_trait(factory)),
    )
  }

  // --- VISIBILITY ---

  /// Marks a locally bound key as visible to the parent environment.
  ///
  /// Exposure propagates exactly one level: a key exposed here enters the
  /// parent's namespace layer, and reaches the grandparent only if the parent
  /// re-exposes it. The key must already be bound locally.
  pub fn expose<T: ?Sized + Any>(&mut self, qualifier: Option<&str>) -> Result<(), IocError> {
    let key = Key::of::<T>(qualifier);
    if !self.bindings.contains_key(&key) {
      return Err(IocError::UnboundExposure {
        env: self.name.clone(),
        key,
      });
    }
    self.exposed.insert(key);
    Ok(())
  }

  /// Marks every local binding as exposed, making this a fully public
  /// environment. Useful for the ordinary, non-isolating module case.
  pub fn expose_all(&mut self) {
    self.expose_all = true;
  }

  /// Declares that factories in this environment resolve the given key from
  /// outside the environment. Declared requirements are verified when the
  /// container is sealed, so a broken cross-environment reference fails fast
  /// at seal time instead of on first use.
  pub fn require<T: ?Sized + Any>(&mut self, qualifier: Option<&str>) {
    self.requires.push(Key::of::<T>(qualifier));
  }

  /// Nests a child environment. The child's unexposed bindings stay invisible
  /// here; its exposed keys enter this environment's namespace layer.
  pub fn install(&mut self, child: Environment) {
    self.children.push(child);
  }

  pub(crate) fn into_parts(
    self,
  ) -> (
    String,
    HashMap<Key, Provider>,
    HashSet<Key>,
    bool,
    Vec<Key>,
    Vec<Environment>,
  ) {
    (
      self.name,
      self.bindings,
      self.exposed,
      self.expose_all,
      self.requires,
      self.children,
    )
  }
}

/// A sealed environment record inside the container's arena. Parent links are
/// arena indices; index 0 is always the root namespace.
pub(crate) struct EnvNode {
  pub(crate) name: String,
  pub(crate) parent: Option<usize>,
  pub(crate) locals: HashMap<Key, Provider>,
  pub(crate) exposed: HashSet<Key>,
  pub(crate) expose_all: bool,
  pub(crate) requires: Vec<Key>,
  /// Everything visible at this environment's level: own locals plus keys
  /// exposed into it by direct children. Maps each key to the arena index of
  /// the environment that owns the binding. Built once, at seal.
  pub(crate) layer: HashMap<Key, usize>,
}

impl EnvNode {
  pub(crate) fn root() -> Self {
    Self {
      name: "<root>".to_owned(),
      parent: None,
      locals: HashMap::new(),
      exposed: HashSet::new(),
      expose_all: false,
      requires: Vec::new(),
      layer: HashMap::new(),
    }
  }

  /// The keys this environment contributes to its parent's layer.
  pub(crate) fn exported_keys(&self) -> Vec<Key> {
    if self.expose_all {
      self.locals.keys().cloned().collect()
    } else {
      self.exposed.iter().cloned().collect()
    }
  }
}
