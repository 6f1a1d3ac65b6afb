use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{
  engine::CoreError,
  models::NodeKind,
  navigate::{is_option, options_at, resolve, resolve_segments},
  path::Path,
};

/// Drill-down cursor over one document. Transitions return a new state and never touch the document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CascadeState {
  path: Path,
}

/// One selector row: the options at a level and the one currently chosen there.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct CascadeLevel {
  pub level: usize,
  pub selected: Option<String>,
  pub options: Vec<String>,
}

/// What a renderer needs after every transition.
#[derive(Debug, Clone, Serialize)]
pub struct CascadeView<'a> {
  pub path: Path,
  /// `<root>` or the dot-joined path.
  pub display_path: String,
  pub node: Option<&'a Value>,
  pub kind: Option<NodeKind>,
  pub options: Vec<String>,
  pub levels: Vec<CascadeLevel>,
}

impl CascadeState {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn path(&self) -> &Path {
    &self.path
  }

  /// Step into `segment`, which must be one of the current node's options.
  pub fn descend(&self, root: &Value, segment: &str) -> Result<Self, CoreError> {
    let node = resolve(root, &self.path);
    if !node.is_some_and(|n| is_option(n, segment)) {
      return Err(CoreError::NotAnOption {
        segment: segment.to_string(),
        path: self.path.to_string(),
      });
    }
    Ok(Self {
      path: self.path.child(segment),
    })
  }

  /// Step back one level. At the root this is a no-op.
  pub fn ascend(&self) -> Self {
    Self {
      path: self.path.parent(),
    }
  }

  /// Choose `segment` in the selector at `level`, dropping everything deeper.
  /// `None` clears that level (the path is cut to its first `level` segments).
  pub fn select_at(&self, root: &Value, level: usize, segment: Option<&str>) -> Result<Self, CoreError> {
    if level > self.path.len() {
      return Err(CoreError::InvalidArg(format!(
        "level {} beyond current depth {}",
        level,
        self.path.len()
      )));
    }
    let base = Self {
      path: self.path.truncated(level),
    };
    match segment {
      None | Some("") => Ok(base),
      Some(seg) => base.descend(root, seg),
    }
  }

  /// Jump to `path`; every step has to be a valid option.
  pub fn set_path(&self, root: &Value, path: &Path) -> Result<Self, CoreError> {
    let mut state = Self::new();
    for seg in path.segments() {
      state = state.descend(root, seg)?;
    }
    Ok(state)
  }

  /// True when the current node has nothing to descend into.
  pub fn is_leaf(&self, root: &Value) -> bool {
    resolve(root, &self.path).map_or(true, |n| options_at(n).is_empty())
  }

  pub fn view<'a>(&self, root: &'a Value) -> CascadeView<'a> {
    let segments = self.path.segments();
    let mut levels = Vec::with_capacity(segments.len() + 1);
    for level in 0..=segments.len() {
      let options = resolve_segments(root, &segments[..level])
        .map(options_at)
        .unwrap_or_default();
      levels.push(CascadeLevel {
        level,
        selected: segments.get(level).cloned(),
        options,
      });
    }
    let node = resolve(root, &self.path);
    CascadeView {
      path: self.path.clone(),
      display_path: self.path.to_string(),
      node,
      kind: node.map(NodeKind::of),
      options: levels.last().map(|l| l.options.clone()).unwrap_or_default(),
      levels,
    }
  }
}
