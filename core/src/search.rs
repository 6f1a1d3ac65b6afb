//! Deep, case-insensitive substring search over keys and primitive values.

use serde_json::Value;

use crate::{
  models::{Match, MatchedOn},
  path::Path,
  search_match::PreparedQuery,
};

/// A raw hit from the walk, borrowing from the searched document.
#[derive(Debug, Clone)]
pub(crate) struct Hit<'a> {
  pub path: Path,
  pub value: &'a Value,
  pub matched_on: MatchedOn,
  /// Container holding `value` (for key hits: the object owning the key). `None` at the root.
  pub parent: Option<&'a Value>,
}

enum Work<'a> {
  Node {
    value: &'a Value,
    path: Path,
    parent: Option<&'a Value>,
  },
  /// An object entry; `path` already ends with the key.
  Entry {
    value: &'a Value,
    path: Path,
    object: &'a Value,
  },
}

/// Pre-order walk with an explicit stack, so deep documents cannot overflow the call stack.
pub(crate) struct Walker<'a> {
  query: Option<PreparedQuery>,
  stack: Vec<Work<'a>>,
}

impl<'a> Walker<'a> {
  pub(crate) fn new(root: &'a Value, query: &str) -> Self {
    let query = PreparedQuery::new(query);
    let stack = match query {
      Some(_) => vec![Work::Node {
        value: root,
        path: Path::root(),
        parent: None,
      }],
      None => Vec::new(),
    };
    Self { query, stack }
  }
}

impl<'a> Iterator for Walker<'a> {
  type Item = Hit<'a>;

  fn next(&mut self) -> Option<Hit<'a>> {
    let Self { query, stack } = self;
    let query = query.as_ref()?;

    while let Some(work) = stack.pop() {
      match work {
        Work::Node { value, path, parent } => match value {
          Value::Array(items) => {
            for (i, item) in items.iter().enumerate().rev() {
              stack.push(Work::Node {
                value: item,
                path: path.child(i.to_string()),
                parent: Some(value),
              });
            }
          }
          Value::Object(map) => {
            for (k, v) in map.iter().rev() {
              stack.push(Work::Entry {
                value: v,
                path: path.child(k.as_str()),
                object: value,
              });
            }
          }
          Value::Null | Value::Bool(_) | Value::Number(_) | Value::String(_) => {
            if query.matches_value(value) {
              return Some(Hit {
                path,
                value,
                matched_on: MatchedOn::Value,
                parent,
              });
            }
          }
        },
        Work::Entry { value, path, object } => {
          let key_hit = path.last().is_some_and(|k| query.matches_text(k));
          // The value is always walked, after the key hit (if any) is reported.
          stack.push(Work::Node {
            value,
            path: path.clone(),
            parent: Some(object),
          });
          if key_hit {
            return Some(Hit {
              path,
              value,
              matched_on: MatchedOn::Key,
              parent: Some(object),
            });
          }
        }
      }
    }
    None
  }
}

/// Lazy sequence of [`Match`]es in document order.
pub struct Matches<'a> {
  walker: Walker<'a>,
}

impl Iterator for Matches<'_> {
  type Item = Match;

  fn next(&mut self) -> Option<Match> {
    self.walker.next().map(|hit| Match {
      path: hit.path,
      value: hit.value.clone(),
      matched_on: hit.matched_on,
    })
  }
}

/// Search `root` for `query`. An empty query yields nothing and no walk happens.
pub fn search<'a>(root: &'a Value, query: &str) -> Matches<'a> {
  Matches {
    walker: Walker::new(root, query),
  }
}

/// Number of matches, without cloning matched values.
pub fn count_matches(root: &Value, query: &str) -> usize {
  Walker::new(root, query).count()
}
