mod cascade;
mod categories;
mod children;
mod cursor;
mod engine;
mod formats;
mod merge;
mod models;
mod navigate;
mod path;
mod search;
mod search_match;
mod slice;

pub use crate::cascade::{CascadeLevel, CascadeState, CascadeView};
pub use crate::categories::{category_key, Category, CategoryPathTable};
pub use crate::children::{list_children_page, DEFAULT_PAGE_SIZE};
pub use crate::engine::{CoreEngine, CoreOptions};
pub use crate::formats::{load_dir, load_file, parse_tolerant};
pub use crate::merge::{build, merge_category, merge_siblings, MAX_ARRAY_INDEX};
pub use crate::models::{
  ChildItem, ChildrenPage, Dataset, DatasetInfo, DatasetSearchResult, Envelope, Match, MatchedOn,
  NodeKind, SearchRequest, SearchResponse, SearchScope, SessionInfo, SessionView, Slice,
  SubmitRequest,
};
pub use crate::navigate::{child, child_count, is_option, options_at, resolve};
pub use crate::path::{is_index_like, parse_index, Path, SelectionSet};
pub use crate::search::{count_matches, search, Matches};
pub use crate::slice::extract;

pub use crate::engine::CoreError;
