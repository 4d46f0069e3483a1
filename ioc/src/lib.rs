//! # Warren IoC
//!
//! A thread-safe Inversion of Control (IoC) container with private,
//! isolating binding environments and request-scoped lifecycles.
//!
//! Warren IoC is built around two ideas. First, bindings live in named
//! [`Environment`]s: everything an environment binds is visible to its own
//! bindings, but invisible to the rest of the graph unless explicitly
//! [`expose`](Environment::expose)d. Two environments can privately bind the
//! very same type to different providers without ever conflicting. Second,
//! bindings carry a lifecycle: transient (fresh per request), singleton
//! (once per container), or request-scoped (once per entered scope, torn
//! down when the surrounding unit of work completes).
//!
//! ## Core Concepts
//!
//! - **Container**: owns the environment graph and all lifecycle state.
//!   Sealed once, then read-only and freely shared across threads.
//! - **Environment**: an isolated namespace of bindings with an exposed
//!   subset. Environments nest; exposure travels one level at a time.
//! - **Injector**: the handle a factory uses to resolve its own
//!   dependencies, pinned to the factory's environment so private siblings
//!   stay reachable.
//! - **Request scope**: entered and exited by the surrounding request layer;
//!   request-scoped values are constructed at most once per scope.
//!
//! ## Quick Start
//!
//! ```
//! use warren_ioc::{Container, Environment, IocError};
//! use std::sync::Arc;
//!
//! struct ApiToken(String);
//!
//! struct BillingClient {
//!   token: Arc<ApiToken>,
//! }
//!
//! fn main() -> Result<(), IocError> {
//!   let mut billing = Environment::new("billing");
//!
//!   // Private to the billing environment.
//!   billing.bind_singleton(None, |_| Ok(ApiToken("tok-123".to_owned())))?;
//!
//!   // Depends on the private token; only the client is exposed.
//!   billing.bind_singleton(None, |inj| {
//!     Ok(BillingClient { token: inj.get::<ApiToken>(None)? })
//!   })?;
//!   billing.expose::<BillingClient>(None)?;
//!
//!   let mut container = Container::new();
//!   container.register(billing)?;
//!   container.seal()?;
//!
//!   let client = container.get_instance::<BillingClient>(None)?;
//!   assert_eq!(client.token.0, "tok-123");
//!
//!   // The token never left its environment.
//!   assert!(matches!(
//!     container.get_instance::<ApiToken>(None),
//!     Err(IocError::UnresolvedKey { .. })
//!   ));
//!   Ok(())
//! }
//! ```

mod container;
mod core;
mod env;
mod error;
mod resolver;
mod scope;

pub use crate::container::{Container, Injector};
pub use crate::core::Key;
pub use crate::env::Environment;
pub use crate::error::IocError;
pub use crate::scope::ScopeGuard;
