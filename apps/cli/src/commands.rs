use lens_core::{
  ChildrenPage, CoreEngine, DatasetInfo, Path, SearchRequest, SearchResponse, SearchScope,
  SessionView, SubmitRequest,
};
use serde::Serialize;
use serde_json::Value;

#[derive(Debug, Clone, Serialize)]
pub struct ListResponse {
  pub datasets: Vec<DatasetInfo>,
  pub categories: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SubmitResponse {
  pub dataset_file: String,
  pub result: Value,
}

#[derive(Debug, Clone, Serialize)]
pub struct BrowseResponse {
  pub view: SessionView,
  pub children: ChildrenPage,
  /// Composite of the selection, present when something was selected.
  pub preview: Option<Value>,
  /// Full submit output, present with `--submit`.
  pub result: Option<Value>,
}

#[derive(Debug, Clone, Default)]
pub struct BrowseArgs {
  pub dataset: String,
  pub path: Option<String>,
  pub cursor: Option<String>,
  pub limit: usize,
  pub add: Vec<String>,
  pub categories: Vec<String>,
  pub include_current: Option<bool>,
  pub submit: bool,
}

/// `a.b.0` or a JSON array of segments (`["a.b", "0"]`) for keys containing dots.
pub fn parse_path(s: &str) -> Result<Path, String> {
  let t = s.trim();
  if t.starts_with('[') {
    return serde_json::from_str::<Path>(t).map_err(|e| format!("bad path {t}: {e}"));
  }
  Ok(Path::from_dotted(t))
}

pub fn list(engine: &CoreEngine) -> Result<ListResponse, String> {
  Ok(ListResponse {
    datasets: engine.list_datasets(),
    categories: engine.category_names(),
  })
}

pub fn search(engine: &CoreEngine, query: String, scope: Option<String>) -> Result<SearchResponse, String> {
  let req = SearchRequest {
    query,
    scope: SearchScope::from(scope),
  };
  Ok(engine.search(&req))
}

pub fn submit(
  engine: &CoreEngine,
  dataset_file: String,
  paths: Vec<String>,
  categories: Vec<String>,
) -> Result<SubmitResponse, String> {
  let paths = paths
    .iter()
    .map(|p| parse_path(p))
    .collect::<Result<Vec<_>, _>>()?;
  let req = SubmitRequest {
    dataset_file,
    paths,
    categories,
  };
  let result = engine.submit(&req).map_err(|e| e.to_string())?;
  Ok(SubmitResponse {
    dataset_file: req.dataset_file,
    result,
  })
}

pub fn category(engine: &CoreEngine, dataset_file: String, name: String) -> Result<SubmitResponse, String> {
  let result = engine
    .submit_category(&dataset_file, &name)
    .map_err(|e| e.to_string())?;
  Ok(SubmitResponse { dataset_file, result })
}

/// One pass of the drill-down flow: open a session, walk to `path`, select, and report.
pub fn browse(engine: &CoreEngine, args: BrowseArgs) -> Result<BrowseResponse, String> {
  let session = engine.open_session(&args.dataset).map_err(|e| e.to_string())?;
  let id = session.session_id.as_str();
  let out = browse_in(engine, id, &args);
  // One-shot process: the session never outlives the command.
  let _ = engine.close_session(id);
  out
}

fn browse_in(engine: &CoreEngine, id: &str, args: &BrowseArgs) -> Result<BrowseResponse, String> {
  if let Some(p) = &args.path {
    let path = parse_path(p)?;
    engine.set_path(id, &path).map_err(|e| e.to_string())?;
  }
  if let Some(include) = args.include_current {
    engine.set_include_current(id, include).map_err(|e| e.to_string())?;
  }
  for p in &args.add {
    let path = parse_path(p)?;
    engine.add_path(id, path).map_err(|e| e.to_string())?;
  }
  for c in &args.categories {
    engine.add_category(id, c).map_err(|e| e.to_string())?;
  }

  let view = engine.cascade_view(id).map_err(|e| e.to_string())?;
  let children = engine
    .list_children(id, args.cursor.as_deref(), args.limit)
    .map_err(|e| e.to_string())?;
  let preview = engine.preview(id).map_err(|e| e.to_string())?;
  let result = if args.submit {
    Some(engine.submit_session(id).map_err(|e| e.to_string())?)
  } else {
    None
  };
  Ok(BrowseResponse {
    view,
    children,
    preview,
    result,
  })
}
