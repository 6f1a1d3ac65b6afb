use std::{
  collections::HashMap,
  path::PathBuf,
  sync::Arc,
  time::{SystemTime, UNIX_EPOCH},
};

use parking_lot::{Mutex, RwLock};
use serde_json::{Map, Value};
use thiserror::Error;
use tracing::{debug, info};
use uuid::Uuid;

use crate::{
  cascade::CascadeState,
  categories::{category_key, CategoryPathTable},
  children::{list_children_page, DEFAULT_PAGE_SIZE},
  formats,
  merge,
  models::{
    ChildrenPage, Dataset, DatasetInfo, DatasetSearchResult, SearchRequest,
    SearchResponse, SearchScope, SessionInfo, SessionView, SubmitRequest,
  },
  navigate::resolve,
  path::{Path, SelectionSet},
  search::count_matches,
  slice,
};

#[derive(Debug, Error)]
pub enum CoreError {
  #[error("io error: {0}")]
  Io(#[from] std::io::Error),
  #[error("json error: {0}")]
  Json(#[from] serde_json::Error),
  #[error("source unavailable: {0}")]
  SourceUnavailable(String),
  #[error("unknown dataset: {0}")]
  UnknownDataset(String),
  #[error("unknown session: {0}")]
  UnknownSession(String),
  #[error("bad cursor token: {0}")]
  BadCursor(String),
  #[error("invalid argument: {0}")]
  InvalidArg(String),
  #[error("{segment:?} is not an option at {path}")]
  NotAnOption { segment: String, path: String },
}

#[derive(Debug, Clone)]
pub struct CoreOptions {
  /// Directory scanned for `*.json` datasets.
  pub data_dir: PathBuf,
  /// Category table file; `None` means no categories.
  pub categories_path: Option<PathBuf>,
  pub children_page_size: usize,
  pub preview_max_chars: usize,
  /// Initial value of a new session's `include_current` flag.
  pub include_current_on_submit: bool,
}

impl Default for CoreOptions {
  fn default() -> Self {
    Self {
      data_dir: PathBuf::from("data"),
      categories_path: None,
      children_page_size: DEFAULT_PAGE_SIZE,
      preview_max_chars: 120,
      include_current_on_submit: true,
    }
  }
}

#[derive(Debug, Clone)]
struct SessionState {
  info: SessionInfo,
  dataset: Arc<Dataset>,
  cascade: CascadeState,
  selection: SelectionSet,
  categories: Vec<String>,
  include_current: bool,
}

impl SessionState {
  /// Selected paths plus the cursor path when `include_current` is on.
  fn effective_selection(&self) -> SelectionSet {
    if self.include_current {
      self.selection.with_extra(self.cascade.path())
    } else {
      self.selection.clone()
    }
  }
}

#[derive(Clone)]
pub struct CoreEngine {
  options: CoreOptions,
  catalog: Arc<RwLock<Vec<Arc<Dataset>>>>,
  categories: Arc<RwLock<Arc<CategoryPathTable>>>,
  sessions: Arc<Mutex<HashMap<String, SessionState>>>,
}

impl CoreEngine {
  /// Load datasets from `options.data_dir` and the category table, if one is configured.
  pub fn new(options: CoreOptions) -> Result<Self, CoreError> {
    let datasets = formats::load_dir(&options.data_dir)?;
    let categories = load_categories(&options)?;
    Ok(Self::from_parts(options, datasets, categories))
  }

  /// Build an engine over already loaded documents.
  pub fn from_parts(
    options: CoreOptions,
    datasets: Vec<Dataset>,
    categories: CategoryPathTable,
  ) -> Self {
    Self {
      options,
      catalog: Arc::new(RwLock::new(datasets.into_iter().map(Arc::new).collect())),
      categories: Arc::new(RwLock::new(Arc::new(categories))),
      sessions: Arc::new(Mutex::new(HashMap::new())),
    }
  }

  pub fn options(&self) -> &CoreOptions {
    &self.options
  }

  /// Re-read the data directory and category table. Open sessions keep the documents they started with.
  pub fn reload(&self) -> Result<usize, CoreError> {
    let datasets = formats::load_dir(&self.options.data_dir)?;
    let categories = load_categories(&self.options)?;
    let count = datasets.len();
    *self.catalog.write() = datasets.into_iter().map(Arc::new).collect();
    *self.categories.write() = Arc::new(categories);
    info!(count, "catalog reloaded");
    Ok(count)
  }

  pub fn list_datasets(&self) -> Vec<DatasetInfo> {
    self
      .catalog
      .read()
      .iter()
      .map(|d| DatasetInfo {
        name: d.name.clone(),
        file: d.file.clone(),
      })
      .collect()
  }

  pub fn datasets(&self) -> Vec<Arc<Dataset>> {
    self.catalog.read().clone()
  }

  /// Look a dataset up by file name, falling back to its name.
  pub fn dataset(&self, key: &str) -> Result<Arc<Dataset>, CoreError> {
    let catalog = self.catalog.read();
    catalog
      .iter()
      .find(|d| d.file == key)
      .or_else(|| catalog.iter().find(|d| d.name == key))
      .cloned()
      .ok_or_else(|| CoreError::UnknownDataset(key.to_string()))
  }

  pub fn category_names(&self) -> Vec<String> {
    self.categories.read().names()
  }

  /// Search the scoped datasets.
  ///
  /// When exactly one match exists across all of them, the dataset holding it comes back whole.
  /// Datasets without matches are left out.
  pub fn search(&self, req: &SearchRequest) -> SearchResponse {
    let query = req.query.trim().to_string();
    if query.is_empty() {
      return SearchResponse {
        query,
        count: 0,
        datasets: Vec::new(),
      };
    }

    let scoped: Vec<Arc<Dataset>> = self
      .datasets()
      .into_iter()
      .filter(|d| match &req.scope {
        SearchScope::All => true,
        SearchScope::Dataset(name) => d.name == *name || d.file == *name,
      })
      .collect();

    let counted: Vec<(Arc<Dataset>, usize)> = scoped
      .into_iter()
      .map(|d| {
        let n = count_matches(&d.raw, &query);
        (d, n)
      })
      .filter(|(_, n)| *n > 0)
      .collect();
    let count: usize = counted.iter().map(|(_, n)| n).sum();

    let datasets = counted
      .into_iter()
      .map(|(d, _)| {
        if count == 1 {
          DatasetSearchResult::Full {
            name: d.name.clone(),
            file: d.file.clone(),
            raw: d.raw.clone(),
          }
        } else {
          DatasetSearchResult::Slices {
            name: d.name.clone(),
            file: d.file.clone(),
            slices: slice::extract(&d.raw, &query),
          }
        }
      })
      .collect::<Vec<_>>();

    debug!(query = %query, count, datasets = datasets.len(), "search done");
    SearchResponse {
      query,
      count,
      datasets,
    }
  }

  /// Composite of the requested paths, plus each known category merged under its lower-cased name.
  pub fn submit(&self, req: &SubmitRequest) -> Result<Value, CoreError> {
    let dataset = self.dataset(&req.dataset_file)?;
    let selection: SelectionSet = req.paths.iter().cloned().collect();
    Ok(self.compose(&dataset.raw, &selection, &req.categories))
  }

  /// `{ "<category>": merged }`, or `{}` when none of its paths resolve.
  pub fn submit_category(&self, dataset_file: &str, category: &str) -> Result<Value, CoreError> {
    let dataset = self.dataset(dataset_file)?;
    Ok(self.compose(&dataset.raw, &SelectionSet::new(), &[category.to_string()]))
  }

  // ---- sessions ----

  pub fn open_session(&self, dataset_file: &str) -> Result<SessionInfo, CoreError> {
    let dataset = self.dataset(dataset_file)?;
    let info = SessionInfo {
      session_id: Uuid::new_v4().to_string(),
      dataset_file: dataset.file.clone(),
      created_at_ms: now_ms(),
    };
    let state = SessionState {
      info: info.clone(),
      dataset,
      cascade: CascadeState::new(),
      selection: SelectionSet::new(),
      categories: Vec::new(),
      include_current: self.options.include_current_on_submit,
    };
    self.sessions.lock().insert(info.session_id.clone(), state);
    debug!(session = %info.session_id, dataset = %info.dataset_file, "session opened");
    Ok(info)
  }

  /// Point the session at another dataset; cursor, selection and categories start over.
  pub fn switch_dataset(&self, session_id: &str, dataset_file: &str) -> Result<SessionView, CoreError> {
    let dataset = self.dataset(dataset_file)?;
    self.update(session_id, |s| {
      s.info.dataset_file = dataset.file.clone();
      s.dataset = dataset;
      s.cascade = CascadeState::new();
      s.selection.clear();
      s.categories.clear();
      Ok(())
    })?;
    self.cascade_view(session_id)
  }

  pub fn close_session(&self, session_id: &str) -> Result<(), CoreError> {
    self
      .sessions
      .lock()
      .remove(session_id)
      .map(|_| ())
      .ok_or_else(|| CoreError::UnknownSession(session_id.to_string()))
  }

  pub fn cascade_view(&self, session_id: &str) -> Result<SessionView, CoreError> {
    let s = self.snapshot(session_id)?;
    let root = &s.dataset.raw;
    let view = s.cascade.view(root);
    Ok(SessionView {
      session_id: s.info.session_id.clone(),
      dataset_file: s.info.dataset_file.clone(),
      is_leaf: s.cascade.is_leaf(root),
      path: view.path,
      display_path: view.display_path,
      kind: view.kind,
      levels: view.levels,
      selected_paths: s.selection.paths().to_vec(),
      categories: s.categories.clone(),
      include_current: s.include_current,
    })
  }

  pub fn descend(&self, session_id: &str, segment: &str) -> Result<SessionView, CoreError> {
    self.update(session_id, |s| {
      s.cascade = s.cascade.descend(&s.dataset.raw, segment)?;
      Ok(())
    })?;
    self.cascade_view(session_id)
  }

  pub fn ascend(&self, session_id: &str) -> Result<SessionView, CoreError> {
    self.update(session_id, |s| {
      s.cascade = s.cascade.ascend();
      Ok(())
    })?;
    self.cascade_view(session_id)
  }

  pub fn select_at(
    &self,
    session_id: &str,
    level: usize,
    segment: Option<&str>,
  ) -> Result<SessionView, CoreError> {
    self.update(session_id, |s| {
      s.cascade = s.cascade.select_at(&s.dataset.raw, level, segment)?;
      Ok(())
    })?;
    self.cascade_view(session_id)
  }

  pub fn set_path(&self, session_id: &str, path: &Path) -> Result<SessionView, CoreError> {
    self.update(session_id, |s| {
      s.cascade = s.cascade.set_path(&s.dataset.raw, path)?;
      Ok(())
    })?;
    self.cascade_view(session_id)
  }

  /// Value under the session's cursor.
  pub fn current_node(&self, session_id: &str) -> Result<Option<Value>, CoreError> {
    let s = self.snapshot(session_id)?;
    Ok(resolve(&s.dataset.raw, s.cascade.path()).cloned())
  }

  /// Add the cursor path to the selection. Returns false for the root or a duplicate.
  pub fn add_current_path(&self, session_id: &str) -> Result<bool, CoreError> {
    self.update(session_id, |s| {
      let path = s.cascade.path().clone();
      Ok(s.selection.add(path))
    })
  }

  /// Add an arbitrary path. It must resolve in the session's dataset.
  pub fn add_path(&self, session_id: &str, path: Path) -> Result<bool, CoreError> {
    self.update(session_id, |s| {
      if resolve(&s.dataset.raw, &path).is_none() {
        return Err(CoreError::InvalidArg(format!("path not found: {}", path)));
      }
      Ok(s.selection.add(path))
    })
  }

  pub fn remove_path(&self, session_id: &str, index: usize) -> Result<Path, CoreError> {
    self.update(session_id, |s| {
      let len = s.selection.len();
      s.selection
        .remove(index)
        .ok_or_else(|| CoreError::InvalidArg(format!("index {} out of range ({} selected)", index, len)))
    })
  }

  pub fn clear_paths(&self, session_id: &str) -> Result<(), CoreError> {
    self.update(session_id, |s| {
      s.selection.clear();
      Ok(())
    })
  }

  pub fn selected_paths(&self, session_id: &str) -> Result<Vec<Path>, CoreError> {
    Ok(self.snapshot(session_id)?.selection.paths().to_vec())
  }

  /// Returns false when the category was already chosen.
  pub fn add_category(&self, session_id: &str, name: &str) -> Result<bool, CoreError> {
    if !self.categories.read().contains(name) {
      return Err(CoreError::InvalidArg(format!("unknown category: {}", name)));
    }
    self.update(session_id, |s| {
      if s.categories.iter().any(|c| c == name) {
        return Ok(false);
      }
      s.categories.push(name.to_string());
      Ok(true)
    })
  }

  pub fn remove_category(&self, session_id: &str, name: &str) -> Result<bool, CoreError> {
    self.update(session_id, |s| {
      let before = s.categories.len();
      s.categories.retain(|c| c != name);
      Ok(s.categories.len() != before)
    })
  }

  pub fn set_include_current(&self, session_id: &str, include: bool) -> Result<(), CoreError> {
    self.update(session_id, |s| {
      s.include_current = include;
      Ok(())
    })
  }

  /// Composite of the selected paths only; `None` when there is nothing to combine.
  pub fn preview(&self, session_id: &str) -> Result<Option<Value>, CoreError> {
    let s = self.snapshot(session_id)?;
    let selection = s.effective_selection();
    if selection.is_empty() {
      return Ok(None);
    }
    Ok(Some(merge::build(&s.dataset.raw, &selection)))
  }

  /// Composite of the selected paths and the chosen categories.
  pub fn submit_session(&self, session_id: &str) -> Result<Value, CoreError> {
    let s = self.snapshot(session_id)?;
    let out = self.compose(&s.dataset.raw, &s.effective_selection(), &s.categories);
    info!(
      session = %session_id,
      dataset = %s.info.dataset_file,
      paths = s.selection.len(),
      categories = s.categories.len(),
      "session submitted"
    );
    Ok(out)
  }

  /// Page through the direct children of the node under the cursor. `limit == 0` uses the configured page size.
  pub fn list_children(
    &self,
    session_id: &str,
    cursor: Option<&str>,
    limit: usize,
  ) -> Result<ChildrenPage, CoreError> {
    let s = self.snapshot(session_id)?;
    let limit = if limit == 0 {
      self.options.children_page_size
    } else {
      limit
    };
    let node = resolve(&s.dataset.raw, s.cascade.path()).unwrap_or(&Value::Null);
    list_children_page(node, cursor, limit, self.options.preview_max_chars)
  }

  fn compose(&self, root: &Value, selection: &SelectionSet, categories: &[String]) -> Value {
    let mut out = merge::build(root, selection);
    let table: Arc<CategoryPathTable> = self.categories.read().clone();
    let mut extra = Map::new();
    for name in categories {
      let Some(paths) = table.get(name) else {
        debug!(category = %name, "unknown category ignored");
        continue;
      };
      if let Some(merged) = merge::merge_category(root, paths) {
        extra.insert(category_key(name), merged);
      }
    }
    if let Value::Object(map) = &mut out {
      for (k, v) in extra {
        map.insert(k, v);
      }
    }
    out
  }

  fn snapshot(&self, session_id: &str) -> Result<SessionState, CoreError> {
    self
      .sessions
      .lock()
      .get(session_id)
      .cloned()
      .ok_or_else(|| CoreError::UnknownSession(session_id.to_string()))
  }

  fn update<R>(
    &self,
    session_id: &str,
    f: impl FnOnce(&mut SessionState) -> Result<R, CoreError>,
  ) -> Result<R, CoreError> {
    let mut sessions = self.sessions.lock();
    let s = sessions
      .get_mut(session_id)
      .ok_or_else(|| CoreError::UnknownSession(session_id.to_string()))?;
    f(s)
  }
}

fn load_categories(options: &CoreOptions) -> Result<CategoryPathTable, CoreError> {
  match &options.categories_path {
    Some(p) => {
      let table = CategoryPathTable::from_json_file(p)?;
      info!(file = %p.display(), count = table.len(), "loaded categories");
      Ok(table)
    }
    None => Ok(CategoryPathTable::new()),
  }
}

fn now_ms() -> i64 {
  SystemTime::now()
    .duration_since(UNIX_EPOCH)
    .unwrap_or_default()
    .as_millis() as i64
}
