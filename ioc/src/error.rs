//! The error type shared by configuration, resolution, and scope handling.

use thiserror::Error;

use crate::core::Key;

/// Everything that can go wrong while configuring or using a container.
///
/// Configuration errors (`DuplicateBinding`, `UnboundExposure`, `Sealed`,
/// `ConflictingBinding`) surface no later than [`Container::seal`]; resolution
/// and scope errors surface synchronously from the call that triggered them.
///
/// [`Container::seal`]: crate::Container::seal
#[derive(Debug, PartialEq, Eq, Error)]
pub enum IocError {
  /// The environment already holds a binding for this key. A key may be bound
  /// at most once per environment.
  #[error("environment `{env}` already has a binding for {key:?}")]
  DuplicateBinding { env: String, key: Key },

  /// `expose` named a key the environment has no local binding for.
  #[error("environment `{env}` cannot expose {key:?}: no local binding")]
  UnboundExposure { env: String, key: Key },

  /// The container is sealed; no further registration is allowed.
  #[error("container is sealed; registration is no longer allowed")]
  Sealed,

  /// `get_instance` was called before the container was sealed.
  #[error("container has not been sealed yet")]
  NotSealed,

  /// Two bindings for the same key ended up visible in the same environment's
  /// namespace layer, e.g. two sibling environments exposing the same key.
  #[error(
    "conflicting bindings for {key:?} visible in environment `{env}`: \
     provided by both `{first}` and `{second}`"
  )]
  ConflictingBinding {
    env: String,
    key: Key,
    first: String,
    second: String,
  },

  /// No binding for the key is visible from the starting environment.
  #[error("no binding for {key:?} is visible from environment `{env}`")]
  UnresolvedKey { env: String, key: Key },

  /// `enter_scope` was called while a request scope was already active on the
  /// current execution context. Scope nesting is not permitted.
  #[error("a request scope is already active on this execution context")]
  ReentrantScope,

  /// A request-scoped binding was resolved outside of any entered scope.
  #[error("no request scope is active on this execution context")]
  NoActiveScope,

  /// `exit_scope` was called without a matching `enter_scope`.
  #[error("request scope exited without a matching enter")]
  ScopeLifecycle,

  /// The resolution chain looped back onto a binding it is already
  /// constructing.
  #[error("circular dependency detected while resolving {key:?}")]
  CircularDependency { key: Key },
}
