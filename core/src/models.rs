use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{
  cascade::CascadeLevel,
  path::{self, Path},
};

/// One loaded JSON document.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Dataset {
  /// File name without the `.json` extension.
  pub name: String,
  pub file: String,
  pub raw: Value,
}

/// Dataset listing entry without the document itself.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DatasetInfo {
  pub name: String,
  pub file: String,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum NodeKind {
  Object,
  Array,
  String,
  Number,
  Boolean,
  Null,
}

impl NodeKind {
  pub fn of(value: &Value) -> Self {
    match value {
      Value::Object(_) => NodeKind::Object,
      Value::Array(_) => NodeKind::Array,
      Value::String(_) => NodeKind::String,
      Value::Number(_) => NodeKind::Number,
      Value::Bool(_) => NodeKind::Boolean,
      Value::Null => NodeKind::Null,
    }
  }

  pub fn is_container(self) -> bool {
    matches!(self, NodeKind::Object | NodeKind::Array)
  }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum MatchedOn {
  Key,
  Value,
}

/// A deep-search hit. For key hits `value` is the value stored under the matching key.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Match {
  pub path: Path,
  pub value: Value,
  pub matched_on: MatchedOn,
}

/// A search result unit: a subtree and where it lives.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Slice {
  #[serde(with = "path::dotted")]
  pub path: Path,
  pub value: Value,
}

/// Which datasets a search runs over.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Option<String>", into = "String")]
pub enum SearchScope {
  #[default]
  All,
  Dataset(String),
}

impl From<Option<String>> for SearchScope {
  fn from(s: Option<String>) -> Self {
    match s {
      None => SearchScope::All,
      Some(s) => SearchScope::from(s.as_str()),
    }
  }
}

impl From<&str> for SearchScope {
  fn from(s: &str) -> Self {
    let t = s.trim();
    if t.is_empty() || t.eq_ignore_ascii_case("all") {
      SearchScope::All
    } else {
      SearchScope::Dataset(t.to_string())
    }
  }
}

impl From<SearchScope> for String {
  fn from(s: SearchScope) -> Self {
    match s {
      SearchScope::All => "all".into(),
      SearchScope::Dataset(name) => name,
    }
  }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SearchRequest {
  pub query: String,
  #[serde(default)]
  pub scope: SearchScope,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "snake_case", tag = "mode")]
pub enum DatasetSearchResult {
  /// The only match across all scoped datasets: the whole document is returned.
  Full { name: String, file: String, raw: Value },
  Slices {
    name: String,
    file: String,
    slices: Vec<Slice>,
  },
}

impl DatasetSearchResult {
  pub fn file(&self) -> &str {
    match self {
      DatasetSearchResult::Full { file, .. } | DatasetSearchResult::Slices { file, .. } => file,
    }
  }

  pub fn is_full(&self) -> bool {
    matches!(self, DatasetSearchResult::Full { .. })
  }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SearchResponse {
  pub query: String,
  /// Total number of matches (keys and values) across scoped datasets.
  pub count: usize,
  pub datasets: Vec<DatasetSearchResult>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SubmitRequest {
  pub dataset_file: String,
  #[serde(default)]
  pub paths: Vec<Path>,
  #[serde(default)]
  pub categories: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionInfo {
  pub session_id: String,
  pub dataset_file: String,
  pub created_at_ms: i64,
}

/// Snapshot of a session after a transition: cursor levels plus what is selected so far.
#[derive(Debug, Clone, Serialize)]
pub struct SessionView {
  pub session_id: String,
  pub dataset_file: String,
  pub path: Path,
  pub display_path: String,
  pub kind: Option<NodeKind>,
  pub is_leaf: bool,
  /// Level 0 is the root; the last level lists the current node's options.
  pub levels: Vec<CascadeLevel>,
  pub selected_paths: Vec<Path>,
  pub categories: Vec<String>,
  pub include_current: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ChildItem {
  /// Object key, or stringified array index.
  pub id: String,
  pub kind: NodeKind,
  pub preview: String,
  /// Direct children of this child (containers only).
  pub child_count: Option<u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ChildrenPage {
  pub items: Vec<ChildItem>,
  pub next_cursor: Option<String>,
  pub reached_end: bool,
}

/// Tagged result for boundary adapters: `{"ok":true,...}` or `{"ok":false,"error":"..."}`.
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum Envelope<T: Serialize> {
  Ok {
    ok: bool,
    #[serde(flatten)]
    payload: T,
  },
  Err {
    ok: bool,
    error: String,
  },
}

impl<T: Serialize> Envelope<T> {
  pub fn ok(payload: T) -> Self {
    Envelope::Ok { ok: true, payload }
  }

  pub fn err(error: impl ToString) -> Self {
    Envelope::Err {
      ok: false,
      error: error.to_string(),
    }
  }
}

impl<T: Serialize, E: ToString> From<Result<T, E>> for Envelope<T> {
  fn from(r: Result<T, E>) -> Self {
    match r {
      Ok(v) => Envelope::ok(v),
      Err(e) => Envelope::err(e),
    }
  }
}
