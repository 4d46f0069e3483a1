use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use warren_ioc::{Container, Environment, IocError};

static NEXT_REQUEST_ID: AtomicUsize = AtomicUsize::new(1);

// One of these exists per handled request and is shared by every service
// that participates in that request.
struct RequestId(usize);

struct Handler {
  request: Arc<RequestId>,
}

fn main() -> Result<(), IocError> {
  let mut env = Environment::new("web");
  env.bind_request_scoped(None, |_| {
    Ok(RequestId(NEXT_REQUEST_ID.fetch_add(1, Ordering::SeqCst)))
  })?;
  env.bind_request_scoped(None, |inj| {
    Ok(Handler {
      request: inj.get::<RequestId>(None)?,
    })
  })?;
  env.expose_all();

  let mut container = Container::new();
  container.register(env)?;
  container.seal()?;

  // A request-handling layer would wrap each unit of work like this.
  for _ in 0..3 {
    let _scope = container.scope()?;
    let handler = container.get_instance::<Handler>(None)?;
    let id = container.get_instance::<RequestId>(None)?;
    // Within one scope, the handler and the direct lookup share the value.
    assert!(Arc::ptr_eq(&handler.request, &id));
    println!("handled request {}", id.0);
  } // the guard exits the scope here, dropping the cached values

  // Outside of any scope, request-scoped bindings refuse to resolve.
  assert!(matches!(
    container.get_instance::<RequestId>(None),
    Err(IocError::NoActiveScope)
  ));
  println!("no scope active outside a request, as intended");
  Ok(())
}
