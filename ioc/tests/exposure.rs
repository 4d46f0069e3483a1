use std::sync::Arc;

use warren_ioc::{Container, Environment, IocError};

// --- Test Fixtures ---

// The abstract value both private environments bind for themselves.
struct Token {
  issuer: String,
}

// Wrappers that carry their environment's private token outward.
struct AuthService {
  token: Arc<Token>,
}
struct MetricsService {
  token: Arc<Token>,
}

fn auth_env() -> Environment {
  let mut env = Environment::new("auth");
  env
    .bind_singleton(None, |_| {
      Ok(Token {
        issuer: "auth".to_string(),
      })
    })
    .unwrap();
  env
    .bind_singleton(None, |inj| {
      Ok(AuthService {
        token: inj.get::<Token>(None)?,
      })
    })
    .unwrap();
  env.expose::<AuthService>(None).unwrap();
  env
}

fn metrics_env() -> Environment {
  let mut env = Environment::new("metrics");
  env
    .bind_singleton(None, |_| {
      Ok(Token {
        issuer: "metrics".to_string(),
      })
    })
    .unwrap();
  env
    .bind_singleton(None, |inj| {
      Ok(MetricsService {
        token: inj.get::<Token>(None)?,
      })
    })
    .unwrap();
  env.expose::<MetricsService>(None).unwrap();
  env
}

// --- Exposure Tests ---

#[test]
fn test_private_bindings_of_the_same_key_do_not_conflict() {
  // Arrange: both environments bind `Token` privately; neither exposes it.
  let mut container = Container::new();
  container.register(auth_env()).unwrap();
  container.register(metrics_env()).unwrap();
  container.seal().unwrap();

  // Act: each exposed service wraps its own environment's token.
  let auth = container.get_instance::<AuthService>(None).unwrap();
  let metrics = container.get_instance::<MetricsService>(None).unwrap();

  // Assert
  assert_eq!(auth.token.issuer, "auth");
  assert_eq!(metrics.token.issuer, "metrics");

  // The private tokens never entered the global namespace.
  assert!(matches!(
    container.get_instance::<Token>(None),
    Err(IocError::UnresolvedKey { .. })
  ));
}

#[test]
fn test_unexposed_binding_is_invisible_even_without_competition() {
  // Arrange: a single environment, no conflicting binding anywhere, and the
  // key still must not leak out. Absence of exposure is absolute.
  let mut env = Environment::new("auth");
  env
    .bind_singleton(None, |_| {
      Ok(Token {
        issuer: "auth".to_string(),
      })
    })
    .unwrap();
  let mut container = Container::new();
  container.register(env).unwrap();
  container.seal().unwrap();

  // Act & Assert
  assert!(matches!(
    container.get_instance::<Token>(None),
    Err(IocError::UnresolvedKey { .. })
  ));
}

#[test]
fn test_exposing_makes_a_binding_visible_one_level_up() {
  // Arrange: identical environment, with the one difference that the token
  // is exposed. The same resolution that failed above now succeeds.
  let mut env = Environment::new("auth");
  env
    .bind_singleton(None, |_| {
      Ok(Token {
        issuer: "auth".to_string(),
      })
    })
    .unwrap();
  env.expose::<Token>(None).unwrap();
  let mut container = Container::new();
  container.register(env).unwrap();
  container.seal().unwrap();

  // Act
  let token = container.get_instance::<Token>(None).unwrap();

  // Assert
  assert_eq!(token.issuer, "auth");
}

#[test]
fn test_exposure_does_not_skip_levels() {
  // Arrange: grandchild exposes `Token` to its parent, but the parent does
  // not publish anything derived from it to the root. A sibling binding
  // inside the parent can see the token; the root cannot.
  struct ParentReport {
    issuer: String,
  }

  let mut grandchild = Environment::new("grandchild");
  grandchild
    .bind_singleton(None, |_| {
      Ok(Token {
        issuer: "grandchild".to_string(),
      })
    })
    .unwrap();
  grandchild.expose::<Token>(None).unwrap();

  let mut parent = Environment::new("parent");
  parent.install(grandchild);
  parent
    .bind_singleton(None, |inj| {
      // Visible here: the grandchild exposed it into this layer.
      let token = inj.get::<Token>(None)?;
      Ok(ParentReport {
        issuer: token.issuer.clone(),
      })
    })
    .unwrap();
  parent.expose::<ParentReport>(None).unwrap();

  let mut container = Container::new();
  container.register(parent).unwrap();
  container.seal().unwrap();

  // Act & Assert: the report proves the parent could see the token.
  let report = container.get_instance::<ParentReport>(None).unwrap();
  assert_eq!(report.issuer, "grandchild");

  // One level of exposure does not reach the root.
  assert!(matches!(
    container.get_instance::<Token>(None),
    Err(IocError::UnresolvedKey { .. })
  ));
}

#[test]
fn test_exposing_an_unbound_key_is_a_configuration_error() {
  // Arrange
  let mut env = Environment::new("auth");

  // Act
  let err = env.expose::<Token>(None).unwrap_err();

  // Assert
  assert!(matches!(err, IocError::UnboundExposure { .. }));
}

#[test]
fn test_colliding_exposures_are_rejected_at_seal() {
  // Arrange: two sibling environments both expose `Token` into the root
  // namespace. Each env alone is fine; the combination is not.
  let mut first = Environment::new("first");
  first
    .bind_singleton(None, |_| {
      Ok(Token {
        issuer: "first".to_string(),
      })
    })
    .unwrap();
  first.expose::<Token>(None).unwrap();

  let mut second = Environment::new("second");
  second
    .bind_singleton(None, |_| {
      Ok(Token {
        issuer: "second".to_string(),
      })
    })
    .unwrap();
  second.expose::<Token>(None).unwrap();

  let mut container = Container::new();
  container.register(first).unwrap();
  container.register(second).unwrap();

  // Act
  let err = container.seal().unwrap_err();

  // Assert
  assert!(matches!(err, IocError::ConflictingBinding { .. }));
}

#[test]
fn test_local_binding_shadows_an_ancestor_visible_binding() {
  // Arrange: the root namespace carries a public token, and a private
  // environment carries its own. This is shadowing across layers, not a
  // conflict within one layer, so sealing succeeds and the nearest binding
  // wins.
  let mut public_env = Environment::new("public");
  public_env
    .bind_singleton(None, |_| {
      Ok(Token {
        issuer: "public".to_string(),
      })
    })
    .unwrap();
  public_env.expose_all();

  let mut container = Container::new();
  container.register(public_env).unwrap();
  container.register(auth_env()).unwrap();
  container.seal().unwrap();

  // Act
  let auth = container.get_instance::<AuthService>(None).unwrap();
  let global_token = container.get_instance::<Token>(None).unwrap();

  // Assert: the service saw its own private token, not the public one.
  assert_eq!(auth.token.issuer, "auth");
  assert_eq!(global_token.issuer, "public");
}

#[test]
fn test_private_environment_falls_back_to_exposed_ancestors() {
  // Arrange: the auth environment binds no `Token` of its own this time, so
  // its service resolves the one visible at the root.
  struct LoneService {
    token: Arc<Token>,
  }

  let mut public_env = Environment::new("public");
  public_env
    .bind_singleton(None, |_| {
      Ok(Token {
        issuer: "public".to_string(),
      })
    })
    .unwrap();
  public_env.expose_all();

  let mut lone = Environment::new("lone");
  lone
    .bind_singleton(None, |inj| {
      Ok(LoneService {
        token: inj.get::<Token>(None)?,
      })
    })
    .unwrap();
  lone.expose::<LoneService>(None).unwrap();
  lone.require::<Token>(None);

  let mut container = Container::new();
  container.register(public_env).unwrap();
  container.register(lone).unwrap();
  container.seal().unwrap();

  // Act
  let service = container.get_instance::<LoneService>(None).unwrap();

  // Assert
  assert_eq!(service.token.issuer, "public");
}

#[test]
fn test_unsatisfied_requirement_fails_at_seal_not_first_use() {
  // Arrange: the environment declares that its factories need a `Token` from
  // outside, but nobody provides one.
  let mut lone = Environment::new("lone");
  lone
    .bind_singleton(None, |inj| {
      Ok(AuthService {
        token: inj.get::<Token>(None)?,
      })
    })
    .unwrap();
  lone.expose::<AuthService>(None).unwrap();
  lone.require::<Token>(None);

  let mut container = Container::new();
  container.register(lone).unwrap();

  // Act: the broken reference surfaces at seal, before any resolution.
  let err = container.seal().unwrap_err();

  // Assert
  assert!(matches!(err, IocError::UnresolvedKey { .. }));
}
