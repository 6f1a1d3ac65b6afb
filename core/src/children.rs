use serde_json::Value;

use crate::{
  cursor::{decode_cursor, encode_cursor, Cursor},
  engine::CoreError,
  models::{ChildItem, ChildrenPage, NodeKind},
  navigate::child_count,
};

/// Page size used when a caller passes `limit == 0`.
pub const DEFAULT_PAGE_SIZE: usize = 50;

/// List direct children of `node` starting at `cursor`, at most `limit` of them
/// (`0` means [`DEFAULT_PAGE_SIZE`]).
///
/// Primitives have no children and return an empty, finished page.
pub fn list_children_page(
  node: &Value,
  cursor: Option<&str>,
  limit: usize,
  preview_max_chars: usize,
) -> Result<ChildrenPage, CoreError> {
  let limit = if limit == 0 { DEFAULT_PAGE_SIZE } else { limit };
  let start = decode_cursor(cursor)?.offset as usize;
  let total = child_count(node).unwrap_or(0) as usize;

  let entries: Box<dyn Iterator<Item = (String, &Value)> + '_> = match node {
    Value::Object(map) => Box::new(map.iter().map(|(k, v)| (k.clone(), v))),
    Value::Array(items) => Box::new(items.iter().enumerate().map(|(i, v)| (i.to_string(), v))),
    _ => Box::new(std::iter::empty()),
  };

  let items: Vec<ChildItem> = entries
    .skip(start)
    .take(limit)
    .map(|(id, v)| ChildItem {
      id,
      kind: NodeKind::of(v),
      preview: preview(v, preview_max_chars),
      child_count: child_count(v),
    })
    .collect();

  let end = start.saturating_add(items.len());
  let reached_end = end >= total;
  let next_cursor = if reached_end {
    None
  } else {
    Some(encode_cursor(Cursor { offset: end as u64 }))
  };
  Ok(ChildrenPage {
    items,
    next_cursor,
    reached_end,
  })
}

fn preview(v: &Value, max_chars: usize) -> String {
  let text = match v {
    Value::String(s) => s.clone(),
    other => serde_json::to_string(other).unwrap_or_default(),
  };
  truncate_chars(&text, max_chars)
}

fn truncate_chars(s: &str, max: usize) -> String {
  if max == 0 {
    return String::new();
  }
  let mut out = String::new();
  for (i, ch) in s.chars().enumerate() {
    if i >= max {
      out.push('…');
      break;
    }
    out.push(ch);
  }
  out
}
