//! FileSearch CLI - index directories, then find, tag and categorize what is in them

mod commands;

use clap::{Parser, Subcommand, ValueEnum};
use serde::Serialize;
use std::path::PathBuf;
use filesearch::config;
use filesearch::confirm::TerminalConfirm;
use filesearch::settings::CURRENT_SCHEMA_VERSION;
use filesearch::storage::{open_and_migrate, SchemaState, SqliteStore};
use filesearch::ui;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Parser)]
#[command(name = "filesearch")]
#[command(version)]
#[command(about = "Lightweight path index with tags, categories and fuzzy name search")]
#[command(long_about = r#"
FileSearch keeps a small SQLite index of your files and folders:
  • Exact, prefix, substring and typo-tolerant (fuzzy) name search
  • Tags, with a guard against near-duplicate tag names
  • Categories (Games, Music, Photos, Documents, Uncategorized, ...)
  • Combined filters by category, tag and name

Example usage:
  filesearch add ~/Games
  filesearch fuzzy zelad --distance 2
  filesearch tag ~/Games/zelda.sav savefile
  filesearch find --category Games --tag savefile
"#)]
struct Cli {
    /// Database file (overrides the config file)
    #[arg(long, global = true)]
    db: Option<PathBuf>,

    /// Config file [default: ./filesearch.toml]
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Output format
    #[arg(long, global = true, value_enum, default_value_t = OutputMode::Human)]
    format: OutputMode,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Index a directory and everything below it
    Add {
        /// Directory to scan
        dir: PathBuf,
    },

    /// Remove a path from the index
    Remove { path: String },

    /// Show a path with its categories and tags
    Info { path: String },

    /// Run exact, prefix, substring and fuzzy name search together
    Search { query: String },

    /// Names equal to the query (ignoring case)
    Exact { query: String },

    /// Names starting with the query
    Prefix { query: String },

    /// Names containing the query
    Substring { query: String },

    /// Names within an edit distance of the query
    Fuzzy {
        query: String,

        /// Maximum edit distance, clamped to 0..=10 [default: fuzzy_default_distance]
        #[arg(short, long, allow_negative_numbers = true)]
        distance: Option<i64>,
    },

    /// Paths matching every given filter
    Find {
        #[arg(short, long)]
        category: Option<String>,

        #[arg(short, long)]
        tag: Option<String>,

        /// Text the name must contain
        #[arg(short, long)]
        name: Option<String>,
    },

    /// Tag a path, creating the tag if needed
    Tag { path: String, tag: String },

    /// Remove a tag from a path
    Untag { path: String, tag: String },

    /// List all tags, or the tags of one path
    Tags { path: Option<String> },

    /// Search tag names
    Tagsearch {
        query: String,

        #[arg(short, long, value_enum, default_value_t = TagSearchMode::All)]
        mode: TagSearchMode,
    },

    /// Put a path in an existing category
    Categorize { path: String, category: String },

    /// Take a path out of a category
    Uncategorize { path: String, category: String },

    /// List all categories, or the categories of one path
    Categories { path: Option<String> },

    /// Create a new category
    CreateCategory { name: String },

    /// Set a setting
    Set { key: String, value: String },

    /// Show one setting
    Get { key: String },

    /// Show all settings
    Settings,

    /// Show index statistics
    Stats,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum OutputMode {
    Human,
    Json,
}

impl OutputMode {
    pub fn is_human(self) -> bool {
        self == OutputMode::Human
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum TagSearchMode {
    All,
    Exact,
    Substring,
    Fuzzy,
}

/// Print a JSON envelope for `command`. Does nothing in human mode.
pub fn emit_success(mode: OutputMode, command: &str, data: impl Serialize) -> anyhow::Result<()> {
    if mode == OutputMode::Json {
        let envelope = serde_json::json!({
            "ok": true,
            "command": command,
            "data": data,
        });
        println!("{}", serde_json::to_string_pretty(&envelope)?);
    }
    Ok(())
}

fn emit_error(mode: OutputMode, err: &anyhow::Error) {
    match mode {
        OutputMode::Human => ui::error(&format!("{err:#}")),
        OutputMode::Json => {
            let envelope = serde_json::json!({ "ok": false, "error": format!("{err:#}") });
            println!("{envelope}");
        }
    }
}

fn main() {
    let cli = Cli::parse();

    // Initialize logging
    let level = if cli.verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();

    let mode = cli.format;
    if let Err(err) = run(cli) {
        emit_error(mode, &err);
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> anyhow::Result<()> {
    let file_config = config::load_config(cli.config.as_deref())?;
    let database = config::resolve_database(cli.db, file_config.as_ref());
    let excludes = file_config.map(|c| c.exclude).unwrap_or_default();
    let mode = cli.format;

    config::ensure_db_dir(&database)?;
    let mut store = open_store(&database, mode)?;

    match cli.command {
        Commands::Add { dir } => commands::run_add(&mut store, &dir, excludes, mode),
        Commands::Remove { path } => commands::run_remove(&store, &path, mode),
        Commands::Info { path } => commands::run_info(&store, &path, mode),
        Commands::Search { query } => commands::run_search(&store, &query, mode),
        Commands::Exact { query } => commands::run_name_search(&store, commands::NameMode::Exact, &query, mode),
        Commands::Prefix { query } => commands::run_name_search(&store, commands::NameMode::Prefix, &query, mode),
        Commands::Substring { query } => {
            commands::run_name_search(&store, commands::NameMode::Substring, &query, mode)
        }
        Commands::Fuzzy { query, distance } => commands::run_fuzzy(&store, &query, distance, mode),
        Commands::Find { category, tag, name } => commands::run_find(&store, category, tag, name, mode),
        Commands::Tag { path, tag } => commands::run_tag(&store, &path, &tag, &mut TerminalConfirm::new(), mode),
        Commands::Untag { path, tag } => commands::run_untag(&store, &path, &tag, mode),
        Commands::Tags { path } => commands::run_tags(&store, path.as_deref(), mode),
        Commands::Tagsearch { query, mode: search } => commands::run_tag_search(&store, &query, search, mode),
        Commands::Categorize { path, category } => commands::run_categorize(&store, &path, &category, mode),
        Commands::Uncategorize { path, category } => commands::run_uncategorize(&store, &path, &category, mode),
        Commands::Categories { path } => commands::run_categories(&store, path.as_deref(), mode),
        Commands::CreateCategory { name } => commands::run_create_category(&store, &name, mode),
        Commands::Set { key, value } => commands::run_set(&store, &key, &value, mode),
        Commands::Get { key } => commands::run_get(&store, &key, mode),
        Commands::Settings => commands::run_settings(&store, mode),
        Commands::Stats => commands::run_stats(&store, mode),
    }
}

/// Open the database, bringing its schema up to date first
fn open_store(database: &std::path::Path, mode: OutputMode) -> anyhow::Result<SqliteStore> {
    tracing::debug!("Opening {}", database.display());
    let (store, state) = open_and_migrate(database, &mut TerminalConfirm::new())?;

    if mode.is_human() {
        match state {
            SchemaState::Uninitialized => {
                ui::info("Created database", &database.display().to_string());
            }
            SchemaState::LegacyUnversioned => {
                ui::success("Migration completed. Existing paths are in 'Uncategorized'.");
            }
            SchemaState::Versioned(v) if v < CURRENT_SCHEMA_VERSION => {
                ui::success(&format!("Schema updated to version {CURRENT_SCHEMA_VERSION}."));
            }
            SchemaState::Versioned(_) => {}
        }
    }
    Ok(store)
}
