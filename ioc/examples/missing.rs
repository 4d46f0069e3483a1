use warren_ioc::{Container, IocError};

struct UnregisteredService;

fn main() -> Result<(), IocError> {
  let mut container = Container::new();
  container.seal()?;

  println!("Attempting to resolve a service that was never registered...");

  match container.get_instance::<UnregisteredService>(None) {
    Ok(_) => panic!("Should not have found the service!"),
    Err(err @ IocError::UnresolvedKey { .. }) => {
      println!("Correctly failed to resolve: {err}");
    }
    Err(other) => panic!("Unexpected error: {other}"),
  }
  Ok(())
}
