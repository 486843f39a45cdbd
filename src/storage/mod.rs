//! Storage Layer - SQLite-backed persistence
//!
//! System of record is SQLite with tables:
//! - paths(path, name, is_directory, size, parent_path)
//! - categories(name), tags(name)
//! - path_categories(path_id, category_id), path_tags(path_id, tag_id)
//! - settings(key, value)

pub mod schema;
pub mod sqlite;
pub mod migrate;

pub use sqlite::{SqliteStore, PathEntry, NewPath, Tag, Category, DbStats};
pub use migrate::{SchemaMigrator, SchemaState, open_and_migrate};
