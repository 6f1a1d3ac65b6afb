use std::{cmp::Ordering, fs, path::Path};

use tracing::{debug, info, warn};

use crate::{engine::CoreError, models::Dataset};

mod json;

pub use json::parse_tolerant;

const DATASET_EXT: &str = ".json";

pub(crate) fn is_dataset_file(path: &Path) -> bool {
  path
    .file_name()
    .and_then(|s| s.to_str())
    .map(|s| s.to_ascii_lowercase().ends_with(DATASET_EXT))
    .unwrap_or(false)
}

/// Load every `*.json` file directly under `dir`, sorted by dataset name.
///
/// A missing directory is an empty catalog. Files that cannot be read or parsed are skipped.
pub fn load_dir(dir: &Path) -> Result<Vec<Dataset>, CoreError> {
  if !dir.exists() {
    warn!(dir = %dir.display(), "data directory not found");
    return Ok(Vec::new());
  }
  let entries = fs::read_dir(dir)
    .map_err(|e| CoreError::SourceUnavailable(format!("{}: {}", dir.display(), e)))?;

  let mut out = Vec::new();
  for ent in entries.filter_map(Result::ok) {
    let p = ent.path();
    if !p.is_file() || !is_dataset_file(&p) {
      continue;
    }
    match load_file(&p) {
      Ok(ds) => out.push(ds),
      Err(e) => warn!(file = %p.display(), error = %e, "skipping dataset"),
    }
  }

  out.sort_by(|a, b| match a.name.to_lowercase().cmp(&b.name.to_lowercase()) {
    Ordering::Equal => a.name.cmp(&b.name),
    o => o,
  });
  info!(dir = %dir.display(), count = out.len(), "loaded datasets");
  Ok(out)
}

/// Load one dataset file.
pub fn load_file(path: &Path) -> Result<Dataset, CoreError> {
  let file = path
    .file_name()
    .and_then(|s| s.to_str())
    .ok_or_else(|| CoreError::InvalidArg(format!("not a file path: {}", path.display())))?
    .to_string();
  let name = if file.to_ascii_lowercase().ends_with(DATASET_EXT) {
    file[..file.len() - DATASET_EXT.len()].to_string()
  } else {
    file.clone()
  };

  let bytes = fs::read(path)?;
  let text = String::from_utf8_lossy(&bytes);
  let raw = parse_tolerant(&text)?;
  debug!(file = %file, "parsed dataset");
  Ok(Dataset { name, file, raw })
}
