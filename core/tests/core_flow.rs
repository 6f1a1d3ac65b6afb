use std::path::Path as FsPath;

use lens_core::{
  CoreEngine, CoreError, CoreOptions, DatasetSearchResult, Envelope, NodeKind, Path, SearchRequest,
  SearchResponse, SearchScope, SubmitRequest,
};
use serde_json::json;

const USERS: &str = r#"{
  "users": [
    {"name": "alice", "email": "alice@x"},
    {"name": "bob", "email": "bob@x"}
  ]
}"#;

const OTHER: &str = r#"{"x": [1, 2, 3], "note": "zz-unique"}"#;

const CATEGORIES: &str = r#"{
  // merged under "emails"
  "Emails": [["users", "0", "email"], ["users", "1", "email"]],
  "Missing": [["nope"]],
}"#;

fn write(dir: &FsPath, name: &str, text: &str) {
  std::fs::write(dir.join(name), text).unwrap();
}

fn engine_in(dir: &FsPath) -> CoreEngine {
  write(dir, "users.json", USERS);
  write(dir, "other.json", OTHER);
  write(dir, "categories.jsonc", CATEGORIES);
  CoreEngine::new(CoreOptions {
    data_dir: dir.to_path_buf(),
    categories_path: Some(dir.join("categories.jsonc")),
    ..CoreOptions::default()
  })
  .unwrap()
}

fn req(query: &str, scope: &str) -> SearchRequest {
  SearchRequest {
    query: query.into(),
    scope: SearchScope::from(scope),
  }
}

fn p(s: &str) -> Path {
  Path::from_dotted(s)
}

#[test]
fn loader_skips_bad_files_and_sorts() {
  let dir = tempfile::tempdir().unwrap();
  write(dir.path(), "b.json", "// header\n{\"k\": [1, 2,],}\n");
  write(dir.path(), "A.JSON", "\u{feff}{\"k\": 1}\0\0");
  write(dir.path(), "events.json", "{\"e\": 1}\n{\"e\": 2}\n");
  write(dir.path(), "bad.json", "{nope");
  write(dir.path(), "notes.txt", "{}");

  let eng = CoreEngine::new(CoreOptions {
    data_dir: dir.path().to_path_buf(),
    ..CoreOptions::default()
  })
  .unwrap();
  let names: Vec<String> = eng.list_datasets().into_iter().map(|d| d.name).collect();
  assert_eq!(names, vec!["A", "b", "events"]);

  assert_eq!(eng.dataset("b.json").unwrap().raw, json!({"k": [1, 2]}));
  assert_eq!(eng.dataset("events").unwrap().raw, json!([{"e": 1}, {"e": 2}]));
  assert!(matches!(eng.dataset("bad.json"), Err(CoreError::UnknownDataset(_))));
}

#[test]
fn missing_data_dir_is_an_empty_catalog() {
  let dir = tempfile::tempdir().unwrap();
  let eng = CoreEngine::new(CoreOptions {
    data_dir: dir.path().join("nope"),
    ..CoreOptions::default()
  })
  .unwrap();
  assert!(eng.list_datasets().is_empty());
  assert_eq!(eng.search(&req("x", "all")).count, 0);
}

#[test]
fn unreadable_data_dir_is_source_unavailable() {
  let dir = tempfile::tempdir().unwrap();
  let file = dir.path().join("not-a-dir.json");
  write(dir.path(), "not-a-dir.json", "{}");
  let res = CoreEngine::new(CoreOptions {
    data_dir: file,
    ..CoreOptions::default()
  });
  assert!(matches!(res, Err(CoreError::SourceUnavailable(_))));
}

#[test]
fn single_match_returns_whole_document() {
  let dir = tempfile::tempdir().unwrap();
  let eng = engine_in(dir.path());

  let res = eng.search(&req("zz-unique", "all"));
  assert_eq!(res.count, 1);
  assert_eq!(res.datasets.len(), 1);
  match &res.datasets[0] {
    DatasetSearchResult::Full { file, raw, .. } => {
      assert_eq!(file, "other.json");
      assert_eq!(raw, &serde_json::from_str::<serde_json::Value>(OTHER).unwrap());
    }
    other => panic!("expected full mode, got {:?}", other),
  }

  let wire = serde_json::to_value(&res).unwrap();
  assert_eq!(wire["datasets"][0]["mode"], json!("full"));
}

#[test]
fn several_matches_return_slices() {
  let dir = tempfile::tempdir().unwrap();
  let eng = engine_in(dir.path());

  // "bob" and "bob@x" both sit in users.1.
  let res = eng.search(&req("BOB", "all"));
  assert_eq!(res.count, 2);
  assert_eq!(res.datasets.len(), 1);
  assert!(!res.datasets[0].is_full());
  let wire = serde_json::to_value(&res).unwrap();
  assert_eq!(wire["datasets"][0]["mode"], json!("slices"));
  assert_eq!(wire["datasets"][0]["file"], json!("users.json"));
  assert_eq!(
    wire["datasets"][0]["slices"],
    json!([{"path": "users.1", "value": {"name": "bob", "email": "bob@x"}}])
  );
}

#[test]
fn scope_limits_datasets_and_changes_mode() {
  let dir = tempfile::tempdir().unwrap();
  let eng = engine_in(dir.path());

  let all = eng.search(&req("x", "ALL"));
  assert_eq!(all.count, 3);
  let files: Vec<&str> = all.datasets.iter().map(|d| d.file()).collect();
  assert_eq!(files, vec!["other.json", "users.json"]);

  let scoped = eng.search(&req("x", "other"));
  assert_eq!(scoped.count, 1);
  assert!(scoped.datasets[0].is_full());
  assert_eq!(eng.search(&req("x", "other.json")).count, 1);
  assert!(eng.search(&req("x", "nope")).datasets.is_empty());
}

#[test]
fn empty_query_short_circuits() {
  let dir = tempfile::tempdir().unwrap();
  let eng = engine_in(dir.path());
  let res = eng.search(&req("   ", "all"));
  assert_eq!(res.query, "");
  assert_eq!(res.count, 0);
  assert!(res.datasets.is_empty());
}

#[test]
fn search_request_scope_defaults_to_all() {
  let r: SearchRequest = serde_json::from_value(json!({"query": "x"})).unwrap();
  assert_eq!(r.scope, SearchScope::All);
  let r: SearchRequest = serde_json::from_value(json!({"query": "x", "scope": null})).unwrap();
  assert_eq!(r.scope, SearchScope::All);
  let r: SearchRequest = serde_json::from_value(json!({"query": "x", "scope": "users"})).unwrap();
  assert_eq!(r.scope, SearchScope::Dataset("users".into()));
}

#[test]
fn submit_builds_paths_and_categories() {
  let dir = tempfile::tempdir().unwrap();
  let eng = engine_in(dir.path());
  assert_eq!(eng.category_names(), vec!["Emails", "Missing"]);

  let out = eng
    .submit(&SubmitRequest {
      dataset_file: "users.json".into(),
      paths: vec![p("users.1.name"), p("users.0")],
      categories: vec!["Emails".into(), "Missing".into(), "Unknown".into()],
    })
    .unwrap();
  assert_eq!(
    out,
    json!({
      "users": [{"name": "alice", "email": "alice@x"}, {"name": "bob"}],
      "emails": ["alice@x", "bob@x"]
    })
  );

  let err = eng.submit(&SubmitRequest {
    dataset_file: "ghost.json".into(),
    ..SubmitRequest::default()
  });
  assert!(matches!(err, Err(CoreError::UnknownDataset(_))));
}

#[test]
fn submit_request_reads_segment_arrays() {
  let r: SubmitRequest = serde_json::from_value(json!({
    "dataset_file": "users.json",
    "paths": [["users", "0", "name"]]
  }))
  .unwrap();
  assert_eq!(r.paths, vec![p("users.0.name")]);
  assert!(r.categories.is_empty());
}

#[test]
fn category_submit_alone() {
  let dir = tempfile::tempdir().unwrap();
  let eng = engine_in(dir.path());
  assert_eq!(
    eng.submit_category("users", "Emails").unwrap(),
    json!({"emails": ["alice@x", "bob@x"]})
  );
  assert_eq!(eng.submit_category("users.json", "Missing").unwrap(), json!({}));
}

#[test]
fn session_drill_down_and_selection() {
  let dir = tempfile::tempdir().unwrap();
  let eng = engine_in(dir.path());
  let sid = eng.open_session("users.json").unwrap().session_id;

  let root = eng.cascade_view(&sid).unwrap();
  assert_eq!(root.display_path, "<root>");
  assert_eq!(root.levels.len(), 1);
  assert_eq!(root.levels[0].options, vec!["users"]);
  assert!(!root.is_leaf);
  assert!(root.include_current);

  // Root cannot be selected.
  assert!(!eng.add_current_path(&sid).unwrap());

  eng.descend(&sid, "users").unwrap();
  let v = eng.descend(&sid, "1").unwrap();
  assert_eq!(v.display_path, "users.1");
  assert_eq!(v.kind, Some(NodeKind::Object));
  assert!(eng.add_current_path(&sid).unwrap());
  assert!(!eng.add_current_path(&sid).unwrap());

  assert!(matches!(eng.descend(&sid, "zzz"), Err(CoreError::NotAnOption { .. })));

  let v = eng.ascend(&sid).unwrap();
  assert_eq!(v.path, p("users"));
  assert!(eng.add_path(&sid, p("users.0.name")).unwrap());
  assert!(matches!(eng.add_path(&sid, p("nope")), Err(CoreError::InvalidArg(_))));
  assert_eq!(
    eng.selected_paths(&sid).unwrap(),
    vec![p("users.1"), p("users.0.name")]
  );

  eng.set_include_current(&sid, false).unwrap();
  assert_eq!(
    eng.preview(&sid).unwrap(),
    Some(json!({"users": [{"name": "alice"}, {"name": "bob", "email": "bob@x"}]}))
  );

  assert!(eng.add_category(&sid, "Emails").unwrap());
  assert!(!eng.add_category(&sid, "Emails").unwrap());
  assert!(matches!(eng.add_category(&sid, "Nope"), Err(CoreError::InvalidArg(_))));
  let submitted = eng.submit_session(&sid).unwrap();
  assert_eq!(submitted["emails"], json!(["alice@x", "bob@x"]));
  assert_eq!(submitted["users"][0], json!({"name": "alice"}));

  // Categories are not part of the preview.
  assert!(eng.preview(&sid).unwrap().unwrap().get("emails").is_none());
  assert!(eng.remove_category(&sid, "Emails").unwrap());
  assert!(!eng.remove_category(&sid, "Emails").unwrap());

  assert_eq!(eng.remove_path(&sid, 0).unwrap(), p("users.1"));
  assert!(matches!(eng.remove_path(&sid, 5), Err(CoreError::InvalidArg(_))));
  eng.clear_paths(&sid).unwrap();
  assert_eq!(eng.preview(&sid).unwrap(), None);

  // With include_current the cursor path joins the composite.
  eng.set_include_current(&sid, true).unwrap();
  let users = eng.current_node(&sid).unwrap().unwrap();
  assert_eq!(eng.preview(&sid).unwrap(), Some(json!({ "users": users })));
}

#[test]
fn session_select_at_and_set_path() {
  let dir = tempfile::tempdir().unwrap();
  let eng = engine_in(dir.path());
  let sid = eng.open_session("users").unwrap().session_id;

  let v = eng.set_path(&sid, &p("users.1.email")).unwrap();
  assert!(v.is_leaf);
  assert_eq!(v.levels.len(), 4);
  assert_eq!(v.levels[2].options, vec!["name", "email"]);

  let v = eng.select_at(&sid, 1, Some("0")).unwrap();
  assert_eq!(v.path, p("users.0"));
  let v = eng.select_at(&sid, 0, None).unwrap();
  assert!(v.path.is_root());
  assert!(eng.set_path(&sid, &p("users.9")).is_err());
  // A failed transition leaves the cursor where it was.
  assert!(eng.cascade_view(&sid).unwrap().path.is_root());
}

#[test]
fn switch_and_close_session() {
  let dir = tempfile::tempdir().unwrap();
  let eng = engine_in(dir.path());
  let sid = eng.open_session("users.json").unwrap().session_id;
  eng.set_path(&sid, &p("users.0")).unwrap();
  eng.add_current_path(&sid).unwrap();
  eng.add_category(&sid, "Emails").unwrap();

  let v = eng.switch_dataset(&sid, "other.json").unwrap();
  assert_eq!(v.dataset_file, "other.json");
  assert!(v.path.is_root());
  assert!(v.selected_paths.is_empty());
  assert!(v.categories.is_empty());
  assert_eq!(v.levels[0].options, vec!["x", "note"]);

  eng.close_session(&sid).unwrap();
  assert!(matches!(eng.cascade_view(&sid), Err(CoreError::UnknownSession(_))));
  assert!(matches!(eng.close_session(&sid), Err(CoreError::UnknownSession(_))));
  assert!(matches!(eng.open_session("ghost"), Err(CoreError::UnknownDataset(_))));
}

#[test]
fn children_are_paged_with_cursor() {
  let dir = tempfile::tempdir().unwrap();
  write(dir.path(), "other.json", OTHER);
  let eng = CoreEngine::new(CoreOptions {
    data_dir: dir.path().to_path_buf(),
    preview_max_chars: 4,
    ..CoreOptions::default()
  })
  .unwrap();
  let sid = eng.open_session("other.json").unwrap().session_id;

  let root = eng.list_children(&sid, None, 0).unwrap();
  assert!(root.reached_end);
  assert_eq!(root.items.len(), 2);
  assert_eq!(root.items[0].id, "x");
  assert_eq!(root.items[0].kind, NodeKind::Array);
  assert_eq!(root.items[0].child_count, Some(3));
  assert_eq!(root.items[0].preview, "[1,2…");
  assert_eq!(root.items[1].preview, "zz-u…");
  assert_eq!(root.items[1].child_count, None);

  eng.descend(&sid, "x").unwrap();
  let p1 = eng.list_children(&sid, None, 2).unwrap();
  let ids: Vec<&str> = p1.items.iter().map(|c| c.id.as_str()).collect();
  assert_eq!(ids, vec!["0", "1"]);
  assert!(!p1.reached_end);
  let p2 = eng.list_children(&sid, p1.next_cursor.as_deref(), 2).unwrap();
  assert_eq!(p2.items.len(), 1);
  assert_eq!(p2.items[0].id, "2");
  assert!(p2.reached_end);
  assert!(p2.next_cursor.is_none());

  assert!(matches!(
    eng.list_children(&sid, Some("!!"), 2),
    Err(CoreError::BadCursor(_))
  ));

  eng.ascend(&sid).unwrap();
  eng.descend(&sid, "note").unwrap();
  let leaf = eng.list_children(&sid, None, 2).unwrap();
  assert!(leaf.items.is_empty());
  assert!(leaf.reached_end);
}

#[test]
fn reload_keeps_open_sessions_on_their_snapshot() {
  let dir = tempfile::tempdir().unwrap();
  let eng = engine_in(dir.path());
  let sid = eng.open_session("other.json").unwrap().session_id;

  write(dir.path(), "other.json", r#"{"y": 1}"#);
  write(dir.path(), "third.json", "[]");
  assert_eq!(eng.reload().unwrap(), 3);
  assert_eq!(eng.dataset("other.json").unwrap().raw, json!({"y": 1}));
  assert_eq!(eng.cascade_view(&sid).unwrap().levels[0].options, vec!["x", "note"]);
}

#[test]
fn reload_swaps_category_table_for_later_submits() {
  let dir = tempfile::tempdir().unwrap();
  let eng = engine_in(dir.path());
  let before = eng.submit_category("users", "Emails").unwrap();

  write(
    dir.path(),
    "categories.jsonc",
    r#"{"Emails": [["users", "1", "email"]], "Names": [["users", "0", "name"]]}"#,
  );
  eng.reload().unwrap();
  assert_eq!(eng.category_names(), vec!["Emails", "Names"]);
  assert_eq!(before, json!({"emails": ["alice@x", "bob@x"]}));
  assert_eq!(eng.submit_category("users", "Emails").unwrap(), json!({"emails": ["bob@x"]}));
  assert_eq!(eng.submit_category("users", "Names").unwrap(), json!({"names": ["alice"]}));
}

#[test]
fn envelope_shapes() {
  let dir = tempfile::tempdir().unwrap();
  let eng = engine_in(dir.path());
  let ok: Result<SearchResponse, CoreError> = Ok(eng.search(&req("bob", "all")));
  let ok = serde_json::to_value(Envelope::from(ok)).unwrap();
  assert_eq!(ok["ok"], json!(true));
  assert_eq!(ok["count"], json!(2));

  let err: Result<SearchResponse, CoreError> = Err(eng.dataset("ghost").unwrap_err());
  assert_eq!(
    serde_json::to_value(Envelope::from(err)).unwrap(),
    json!({"ok": false, "error": "unknown dataset: ghost"})
  );
}
