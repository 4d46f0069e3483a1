//! Binding resolution over the sealed environment arena.
//!
//! Resolution is a read-only walk: the starting environment's namespace layer
//! first, then each ancestor's layer in turn. A binding crosses an
//! environment boundary only by being exposed, one level at a time, so all
//! visibility rules reduce to layer membership computed once at seal.

use crate::core::{Key, Provider};
use crate::env::EnvNode;
use crate::error::IocError;

/// Finds the binding for `key` visible from environment `from`.
///
/// The nearest layer wins: a local binding shadows anything an ancestor can
/// see, which is how two sibling environments each keep their own private
/// binding for the same key.
pub(crate) fn resolve<'a>(
  envs: &'a [EnvNode],
  from: usize,
  key: &Key,
) -> Result<(usize, &'a Provider), IocError> {
  let mut cursor = Some(from);
  while let Some(idx) = cursor {
    if let Some(&owner) = envs[idx].layer.get(key) {
      let provider = envs[owner]
        .locals
        .get(key)
        .unwrap_or_else(|| panic!("layer entry for {:?} has no backing binding", key));
      return Ok((owner, provider));
    }
    cursor = envs[idx].parent;
  }
  Err(IocError::UnresolvedKey {
    env: envs[from].name.clone(),
    key: key.clone(),
  })
}

/// Builds every environment's namespace layer: its own locals, plus the keys
/// its direct children expose into it.
///
/// Two bindings for the same key landing in one layer is a configuration
/// error, whether they come from two children or from a child colliding with
/// a local binding. A child shadowing an *ancestor's* visible binding is
/// fine; only same-layer duplicates conflict.
pub(crate) fn build_layers(envs: &mut [EnvNode]) -> Result<(), IocError> {
  for idx in 0..envs.len() {
    let layer = envs[idx]
      .locals
      .keys()
      .cloned()
      .map(|key| (key, idx))
      .collect();
    envs[idx].layer = layer;
  }

  // The arena is laid out preorder, so every child has a higher index than
  // its parent; each layer aggregates direct children only, making the visit
  // order irrelevant.
  for child in 1..envs.len() {
    let parent = match envs[child].parent {
      Some(parent) => parent,
      None => continue,
    };
    for key in envs[child].exported_keys() {
      if let Some(prev) = envs[parent].layer.insert(key.clone(), child) {
        return Err(IocError::ConflictingBinding {
          env: envs[parent].name.clone(),
          key,
          first: envs[prev].name.clone(),
          second: envs[child].name.clone(),
        });
      }
    }
  }
  Ok(())
}
