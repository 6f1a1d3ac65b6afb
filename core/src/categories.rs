use std::{fs, path::Path as FsPath};

use serde::{ser::SerializeMap, Serialize, Serializer};
use serde_json::Value;

use crate::{engine::CoreError, formats::parse_tolerant, path::Path};

/// A named group of source paths whose values are combined under one key.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct Category {
  pub name: String,
  pub paths: Vec<Path>,
}

/// Category name -> source paths, in the order the table was written.
///
/// On disk: `{ "Email": [["apps", "6", "app_state", "folders"]], ... }`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CategoryPathTable {
  categories: Vec<Category>,
}

impl CategoryPathTable {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn from_value(value: Value) -> Result<Self, CoreError> {
    let Value::Object(map) = value else {
      return Err(CoreError::InvalidArg("category table must be a JSON object".into()));
    };
    let mut table = Self::new();
    for (name, paths) in map {
      let paths: Vec<Path> = serde_json::from_value(paths)?;
      table.insert(name, paths);
    }
    Ok(table)
  }

  pub fn from_json_str(text: &str) -> Result<Self, CoreError> {
    Self::from_value(parse_tolerant(text)?)
  }

  pub fn from_json_file(path: &FsPath) -> Result<Self, CoreError> {
    let text = fs::read_to_string(path)?;
    Self::from_json_str(&text)
  }

  /// Add a category, or replace the paths of an existing one in place.
  pub fn insert(&mut self, name: impl Into<String>, paths: Vec<Path>) {
    let name = name.into();
    match self.categories.iter_mut().find(|c| c.name == name) {
      Some(c) => c.paths = paths,
      None => self.categories.push(Category { name, paths }),
    }
  }

  pub fn get(&self, name: &str) -> Option<&[Path]> {
    self
      .categories
      .iter()
      .find(|c| c.name == name)
      .map(|c| c.paths.as_slice())
  }

  pub fn contains(&self, name: &str) -> bool {
    self.get(name).is_some()
  }

  pub fn names(&self) -> Vec<String> {
    self.categories.iter().map(|c| c.name.clone()).collect()
  }

  pub fn len(&self) -> usize {
    self.categories.len()
  }

  pub fn is_empty(&self) -> bool {
    self.categories.is_empty()
  }
}

impl Serialize for CategoryPathTable {
  fn serialize<S: Serializer>(&self, s: S) -> Result<S::Ok, S::Error> {
    let mut map = s.serialize_map(Some(self.categories.len()))?;
    for c in &self.categories {
      map.serialize_entry(&c.name, &c.paths)?;
    }
    map.end()
  }
}

/// Key a category's merged value is stored under in a composite document.
pub fn category_key(name: &str) -> String {
  name.to_lowercase()
}
