use std::{collections::HashSet, fmt};

use serde::{Deserialize, Serialize};

/// Separator for selection dedup keys (`.` may occur inside keys, NUL does not in practice).
const KEY_SEP: char = '\u{0}';

/// A location inside a JSON value: an ordered list of string segments.
///
/// Segments that are non-empty and all ASCII digits are "index-like": applied to an array they
/// address an element. Applied to an object they are plain keys.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Path(Vec<String>);

impl Path {
  pub fn root() -> Self {
    Self(Vec::new())
  }

  pub fn new<I, S>(segments: I) -> Self
  where
    I: IntoIterator<Item = S>,
    S: Into<String>,
  {
    Self(segments.into_iter().map(Into::into).collect())
  }

  /// Parse the dot-joined wire form. The empty string is the root.
  pub fn from_dotted(s: &str) -> Self {
    if s.is_empty() {
      return Self::root();
    }
    Self(s.split('.').map(str::to_string).collect())
  }

  pub fn segments(&self) -> &[String] {
    &self.0
  }

  pub fn len(&self) -> usize {
    self.0.len()
  }

  pub fn is_root(&self) -> bool {
    self.0.is_empty()
  }

  pub fn last(&self) -> Option<&str> {
    self.0.last().map(String::as_str)
  }

  /// New path with one more segment.
  pub fn child(&self, segment: impl Into<String>) -> Self {
    let mut out = self.0.clone();
    out.push(segment.into());
    Self(out)
  }

  /// New path without the last segment (root stays root).
  pub fn parent(&self) -> Self {
    let mut out = self.0.clone();
    out.pop();
    Self(out)
  }

  /// New path with the first `n` segments.
  pub fn truncated(&self, n: usize) -> Self {
    Self(self.0.iter().take(n).cloned().collect())
  }

  pub fn push(&mut self, segment: impl Into<String>) {
    self.0.push(segment.into());
  }

  pub fn pop(&mut self) -> Option<String> {
    self.0.pop()
  }

  /// Wire/display form: segments joined with `.`.
  pub fn to_dotted(&self) -> String {
    self.0.join(".")
  }

  /// Dedup key used by [`SelectionSet`].
  pub fn selection_key(&self) -> String {
    let mut out = String::new();
    for (i, seg) in self.0.iter().enumerate() {
      if i > 0 {
        out.push(KEY_SEP);
      }
      out.push_str(seg);
    }
    out
  }
}

impl fmt::Display for Path {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    if self.0.is_empty() {
      return f.write_str("<root>");
    }
    f.write_str(&self.to_dotted())
  }
}

impl From<Vec<String>> for Path {
  fn from(v: Vec<String>) -> Self {
    Self(v)
  }
}

/// `^\d+$` over ASCII digits.
pub fn is_index_like(segment: &str) -> bool {
  !segment.is_empty() && segment.bytes().all(|b| b.is_ascii_digit())
}

/// Parse an index-like segment. `None` when the segment is not index-like or does not fit `usize`.
pub fn parse_index(segment: &str) -> Option<usize> {
  if !is_index_like(segment) {
    return None;
  }
  segment.parse().ok()
}

/// Serde helpers to carry a [`Path`] as its dot-joined string.
pub mod dotted {
  use serde::{Deserialize, Deserializer, Serializer};

  use super::Path;

  pub fn serialize<S: Serializer>(path: &Path, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_str(&path.to_dotted())
  }

  pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Path, D::Error> {
    let s = String::deserialize(d)?;
    Ok(Path::from_dotted(&s))
  }
}

/// Ordered set of distinct, non-root paths.
#[derive(Debug, Clone, Default)]
pub struct SelectionSet {
  paths: Vec<Path>,
  keys: HashSet<String>,
}

impl SelectionSet {
  pub fn new() -> Self {
    Self::default()
  }

  /// Returns false when the path is the root or already selected.
  pub fn add(&mut self, path: Path) -> bool {
    if path.is_root() {
      return false;
    }
    if !self.keys.insert(path.selection_key()) {
      return false;
    }
    self.paths.push(path);
    true
  }

  /// Remove by position. Out of range yields `None`.
  pub fn remove(&mut self, index: usize) -> Option<Path> {
    if index >= self.paths.len() {
      return None;
    }
    let p = self.paths.remove(index);
    self.keys.remove(&p.selection_key());
    Some(p)
  }

  pub fn contains(&self, path: &Path) -> bool {
    self.keys.contains(&path.selection_key())
  }

  pub fn clear(&mut self) {
    self.paths.clear();
    self.keys.clear();
  }

  pub fn len(&self) -> usize {
    self.paths.len()
  }

  pub fn is_empty(&self) -> bool {
    self.paths.is_empty()
  }

  pub fn iter(&self) -> impl Iterator<Item = &Path> {
    self.paths.iter()
  }

  pub fn paths(&self) -> &[Path] {
    &self.paths
  }

  /// Copy of this set with `extra` appended when non-root and not already present.
  pub fn with_extra(&self, extra: &Path) -> Self {
    let mut out = self.clone();
    out.add(extra.clone());
    out
  }
}

impl FromIterator<Path> for SelectionSet {
  fn from_iter<T: IntoIterator<Item = Path>>(iter: T) -> Self {
    let mut out = Self::new();
    for p in iter {
      out.add(p);
    }
    out
  }
}

impl<'a> IntoIterator for &'a SelectionSet {
  type Item = &'a Path;
  type IntoIter = std::slice::Iter<'a, Path>;

  fn into_iter(self) -> Self::IntoIter {
    self.paths.iter()
  }
}

impl Serialize for SelectionSet {
  fn serialize<S: serde::Serializer>(&self, s: S) -> Result<S::Ok, S::Error> {
    self.paths.serialize(s)
  }
}

impl<'de> Deserialize<'de> for SelectionSet {
  fn deserialize<D: serde::Deserializer<'de>>(d: D) -> Result<Self, D::Error> {
    let paths = Vec::<Path>::deserialize(d)?;
    Ok(paths.into_iter().collect())
  }
}
