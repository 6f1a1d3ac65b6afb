use serde_json::{Map, Value};
use tracing::debug;

use crate::{
  navigate::resolve,
  path::{is_index_like, parse_index, Path},
};

/// Indices above this are refused when building; padding up to them would allocate without bound.
pub const MAX_ARRAY_INDEX: usize = 1_000_000;

/// Build a fresh object holding only the given paths of `root`, each at its original location.
///
/// Paths that do not resolve, the root path, and paths whose shape conflicts with what is already
/// built (a key below an array) are skipped. Exact collisions: the later path wins.
pub fn build<'p, I>(root: &Value, paths: I) -> Value
where
  I: IntoIterator<Item = &'p Path>,
{
  let mut out = Value::Object(Map::new());
  for path in paths {
    if path.is_root() {
      continue;
    }
    let Some(node) = resolve(root, path) else {
      debug!(path = %path, "selected path not found, skipped");
      continue;
    };
    if !insertable(&out, path.segments()) || !insert_at(&mut out, path.segments(), node.clone()) {
      debug!(path = %path, "selected path conflicts with built shape, skipped");
    }
  }
  out
}

/// Combine the values found at several source paths into one value.
///
/// Missing entries are dropped. All arrays concatenate, all objects merge shallowly (later keys
/// win), anything else comes back as a plain array of the values.
pub fn merge_siblings<I>(nodes: I) -> Option<Value>
where
  I: IntoIterator<Item = Option<Value>>,
{
  let existing: Vec<Value> = nodes.into_iter().flatten().collect();
  if existing.is_empty() {
    return None;
  }
  if existing.iter().all(Value::is_array) {
    let mut out = Vec::new();
    for v in existing {
      if let Value::Array(items) = v {
        out.extend(items);
      }
    }
    return Some(Value::Array(out));
  }
  if existing.iter().all(Value::is_object) {
    let mut out = Map::new();
    for v in existing {
      if let Value::Object(map) = v {
        for (k, v) in map {
          out.insert(k, v);
        }
      }
    }
    return Some(Value::Object(out));
  }
  Some(Value::Array(existing))
}

/// Resolve every path of a category against `root` and merge what was found.
pub fn merge_category(root: &Value, paths: &[Path]) -> Option<Value> {
  merge_siblings(paths.iter().map(|p| resolve(root, p).cloned()))
}

/// Dry run of [`insert_at`] so a refused path leaves no half-built containers behind.
fn insertable(target: &Value, segments: &[String]) -> bool {
  let mut node = Some(target);
  for seg in segments {
    node = match node {
      Some(Value::Array(items)) => match parse_index(seg) {
        Some(i) if i <= MAX_ARRAY_INDEX => items.get(i),
        _ => return false,
      },
      Some(Value::Object(map)) => map.get(seg),
      // Missing, null or primitive: replaced by a fresh container shaped for `seg`.
      _ => {
        if is_index_like(seg) && !parse_index(seg).is_some_and(|i| i <= MAX_ARRAY_INDEX) {
          return false;
        }
        None
      }
    };
  }
  true
}

fn insert_at(target: &mut Value, segments: &[String], value: Value) -> bool {
  let Some((last, init)) = segments.split_last() else {
    return false;
  };
  let mut node = target;
  for (i, seg) in init.iter().enumerate() {
    let Some(slot) = slot_mut(node, seg) else {
      return false;
    };
    if !matches!(slot, Value::Object(_) | Value::Array(_)) {
      // The container kind is only known from the segment after this one.
      *slot = if is_index_like(&segments[i + 1]) {
        Value::Array(Vec::new())
      } else {
        Value::Object(Map::new())
      };
    }
    node = slot;
  }
  match slot_mut(node, last) {
    Some(slot) => {
      *slot = value;
      true
    }
    None => false,
  }
}

/// Slot for `segment` inside a container, created as null when missing.
fn slot_mut<'a>(node: &'a mut Value, segment: &str) -> Option<&'a mut Value> {
  match node {
    Value::Object(map) => Some(map.entry(segment.to_string()).or_insert(Value::Null)),
    Value::Array(items) => {
      let i = parse_index(segment)?;
      if i >= items.len() {
        items.resize(i + 1, Value::Null);
      }
      items.get_mut(i)
    }
    _ => None,
  }
}
