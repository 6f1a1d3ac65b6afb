use serde_json::Value;

use crate::path::{parse_index, Path};

/// Resolve `path` against `root`. `None` is the not-found signal; this never panics.
///
/// On arrays a segment must be index-like and in range. On objects every segment, index-like or
/// not, is a key lookup. Primitives and null have no children.
pub fn resolve<'a>(root: &'a Value, path: &Path) -> Option<&'a Value> {
  resolve_segments(root, path.segments())
}

pub(crate) fn resolve_segments<'a, S: AsRef<str>>(root: &'a Value, segments: &[S]) -> Option<&'a Value> {
  let mut node = root;
  for seg in segments {
    node = child(node, seg.as_ref())?;
  }
  Some(node)
}

/// One navigation step.
pub fn child<'a>(node: &'a Value, segment: &str) -> Option<&'a Value> {
  match node {
    Value::Array(items) => items.get(parse_index(segment)?),
    Value::Object(map) => map.get(segment),
    Value::Null | Value::Bool(_) | Value::Number(_) | Value::String(_) => None,
  }
}

/// Navigable child identifiers: object keys in insertion order, or `"0".."len-1"` for arrays.
pub fn options_at(node: &Value) -> Vec<String> {
  match node {
    Value::Object(map) => map.keys().cloned().collect(),
    Value::Array(items) => (0..items.len()).map(|i| i.to_string()).collect(),
    Value::Null | Value::Bool(_) | Value::Number(_) | Value::String(_) => Vec::new(),
  }
}

/// Number of direct children, `None` for primitives.
pub fn child_count(node: &Value) -> Option<u64> {
  match node {
    Value::Object(map) => Some(map.len() as u64),
    Value::Array(items) => Some(items.len() as u64),
    _ => None,
  }
}

/// Whether `segment` is one of `options_at(node)`, without building the list.
pub fn is_option(node: &Value, segment: &str) -> bool {
  child(node, segment).is_some()
    && match node {
      // "007" resolves to element 7 but is not the canonical option "7".
      Value::Array(_) => parse_index(segment).map(|i| i.to_string()).as_deref() == Some(segment),
      _ => true,
    }
}
