use std::sync::Arc;

use warren_ioc::{Container, Environment, IocError};

// Two backends each keep their own connection details private and publish
// only a typed client. Both bind the same `Credentials` key; neither leaks.

struct Credentials {
  secret: String,
}

struct PaymentsClient {
  creds: Arc<Credentials>,
}

struct SearchClient {
  creds: Arc<Credentials>,
}

fn payments() -> Result<Environment, IocError> {
  let mut env = Environment::new("payments");
  env.bind_singleton(None, |_| {
    Ok(Credentials {
      secret: "payments-secret".to_string(),
    })
  })?;
  env.bind_singleton(None, |inj| {
    Ok(PaymentsClient {
      creds: inj.get::<Credentials>(None)?,
    })
  })?;
  env.expose::<PaymentsClient>(None)?;
  Ok(env)
}

fn search() -> Result<Environment, IocError> {
  let mut env = Environment::new("search");
  env.bind_singleton(None, |_| {
    Ok(Credentials {
      secret: "search-secret".to_string(),
    })
  })?;
  env.bind_singleton(None, |inj| {
    Ok(SearchClient {
      creds: inj.get::<Credentials>(None)?,
    })
  })?;
  env.expose::<SearchClient>(None)?;
  Ok(env)
}

fn main() -> Result<(), IocError> {
  let mut container = Container::new();
  container.register(payments()?)?;
  container.register(search()?)?;
  container.seal()?;

  // Each client wraps its own environment's credentials.
  let payments = container.get_instance::<PaymentsClient>(None)?;
  let search = container.get_instance::<SearchClient>(None)?;
  println!("payments client uses: {}", payments.creds.secret);
  println!("search client uses:   {}", search.creds.secret);

  // The credentials themselves are not reachable from the outside.
  match container.get_instance::<Credentials>(None) {
    Err(IocError::UnresolvedKey { .. }) => {
      println!("credentials stayed private, as intended")
    }
    other => panic!("expected an unresolved key, got {:?}", other.map(|_| ())),
  }
  Ok(())
}
