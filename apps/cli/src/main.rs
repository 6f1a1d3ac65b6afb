mod commands;

use std::{path::PathBuf, process::exit};

use clap::{Parser, Subcommand};
use lens_core::{CoreEngine, CoreOptions, Envelope};
use serde::Serialize;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(author, version, about = "Search, browse and compose JSON datasets", long_about = None)]
#[command(after_help = "ENVIRONMENT VARIABLES:
    LENS_DATA_DIR      Dataset directory (default: ./data)
    LENS_CATEGORIES    Category table JSON file
    RUST_LOG           Log filter, logs go to stderr (default: warn)

EXAMPLES:
    lens list
    lens search bob --scope users
    lens submit users.json --path users.1 --category Email
    lens browse users.json --path users --limit 10")]
struct Args {
  /// Directory holding `*.json` datasets
  #[arg(long, env = "LENS_DATA_DIR", default_value = "data")]
  data_dir: PathBuf,

  /// Category table: `{ "Name": [["seg", ...], ...] }`
  #[arg(long, env = "LENS_CATEGORIES")]
  categories: Option<PathBuf>,

  /// Characters kept in child previews
  #[arg(long, default_value_t = 120)]
  preview_chars: usize,

  #[command(subcommand)]
  command: Cmd,
}

#[derive(Subcommand)]
enum Cmd {
  /// List datasets and categories
  List,
  /// Deep search keys and values
  Search {
    query: String,
    /// Dataset name, or "all"
    #[arg(long)]
    scope: Option<String>,
  },
  /// Build a composite document from paths and categories
  Submit {
    dataset: String,
    /// Dotted path, or a JSON array of segments; repeatable
    #[arg(long = "path")]
    paths: Vec<String>,
    /// Category name; repeatable
    #[arg(long = "category")]
    categories: Vec<String>,
  },
  /// Merge one category of a dataset
  Category { dataset: String, name: String },
  /// Walk to a node, list its children and optionally compose a selection
  Browse {
    dataset: String,
    #[arg(long)]
    path: Option<String>,
    #[arg(long)]
    cursor: Option<String>,
    /// Page size, 0 for the default
    #[arg(long, default_value_t = 0)]
    limit: usize,
    /// Extra path to select; repeatable
    #[arg(long)]
    add: Vec<String>,
    /// Category to add to the selection; repeatable
    #[arg(long = "category")]
    categories: Vec<String>,
    /// Whether the browsed path joins the selection
    #[arg(long)]
    include_current: Option<bool>,
    /// Also print the full composite with categories
    #[arg(long)]
    submit: bool,
  },
}

fn main() {
  let args = Args::parse();

  let _ = tracing_subscriber::fmt()
    .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
    .with_writer(std::io::stderr)
    .try_init();

  let options = CoreOptions {
    data_dir: args.data_dir,
    categories_path: args.categories,
    preview_max_chars: args.preview_chars,
    ..CoreOptions::default()
  };
  let engine = match CoreEngine::new(options) {
    Ok(e) => e,
    Err(e) => {
      emit::<(), _>(Err(e));
      exit(1);
    }
  };

  let ok = match args.command {
    Cmd::List => emit(commands::list(&engine)),
    Cmd::Search { query, scope } => emit(commands::search(&engine, query, scope)),
    Cmd::Submit {
      dataset,
      paths,
      categories,
    } => emit(commands::submit(&engine, dataset, paths, categories)),
    Cmd::Category { dataset, name } => emit(commands::category(&engine, dataset, name)),
    Cmd::Browse {
      dataset,
      path,
      cursor,
      limit,
      add,
      categories,
      include_current,
      submit,
    } => emit(
      commands::browse(
        &engine,
        commands::BrowseArgs {
          dataset,
          path,
          cursor,
          limit,
          add,
          categories,
          include_current,
          submit,
        },
      ),
    ),
  };
  if !ok {
    exit(1);
  }
}

/// Print the result envelope as one JSON document on stdout. Returns whether it was a success.
fn emit<T: Serialize, E: ToString>(r: Result<T, E>) -> bool {
  let ok = r.is_ok();
  let env: Envelope<T> = r.into();
  match serde_json::to_string_pretty(&env) {
    Ok(s) => println!("{s}"),
    Err(e) => {
      tracing::error!(error = %e, "failed to serialize response");
      return false;
    }
  }
  ok
}
