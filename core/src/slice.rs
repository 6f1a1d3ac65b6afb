use std::collections::HashSet;

use serde_json::Value;

use crate::{
  models::{MatchedOn, NodeKind, Slice},
  path::Path,
  search::{Hit, Walker},
};

/// Reduce every match of `query` in `root` to the smallest subtree that shows it in context.
///
/// - key hit on a container: the container itself;
/// - key hit on a primitive: the object holding the key;
/// - primitive hit inside an array: just that element;
/// - primitive hit inside an object: the object;
/// - primitive root: the root, at the empty path.
///
/// Slices are unique by dotted path; the first occurrence in document order wins.
pub fn extract(root: &Value, query: &str) -> Vec<Slice> {
  let mut seen: HashSet<String> = HashSet::new();
  let mut out = Vec::new();
  for hit in Walker::new(root, query) {
    let (path, value) = slice_of(&hit);
    if seen.insert(path.to_dotted()) {
      out.push(Slice {
        path,
        value: value.clone(),
      });
    }
  }
  tracing::debug!(query, slices = out.len(), "extracted slices");
  out
}

fn slice_of<'a>(hit: &Hit<'a>) -> (Path, &'a Value) {
  match (hit.matched_on, hit.parent) {
    (MatchedOn::Key, _) if NodeKind::of(hit.value).is_container() => (hit.path.clone(), hit.value),
    (MatchedOn::Key, Some(object)) => (hit.path.parent(), object),
    (MatchedOn::Value, Some(Value::Array(_))) => (hit.path.clone(), hit.value),
    (MatchedOn::Value, Some(object)) => (hit.path.parent(), object),
    (_, None) => (hit.path.clone(), hit.value),
  }
}
