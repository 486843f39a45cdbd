//! SQLite storage implementation

use std::path::Path;
use rusqlite::functions::FunctionFlags;
use rusqlite::{Connection, OptionalExtension, params, params_from_iter};
use serde::Serialize;
use crate::{Result, Error};
use crate::distance;
use crate::query::{NameMatch, StructuredQuery};
use crate::settings::SettingKey;
use super::schema;

const PATH_COLUMNS: &str = "p.id, p.path, p.name, p.is_directory, p.size, p.parent_path";

/// An indexed filesystem entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PathEntry {
    pub id: i64,
    pub path: String,
    pub name: String,
    pub is_directory: bool,
    pub size: Option<i64>,
    pub parent_path: Option<String>,
}

/// A filesystem entry about to be indexed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewPath {
    pub path: String,
    pub name: String,
    pub is_directory: bool,
    pub size: Option<i64>,
    pub parent_path: Option<String>,
}

impl NewPath {
    /// Describe `path`, taking the display name and parent from the path itself.
    /// Directories never carry a size.
    pub fn new(path: &Path, is_directory: bool, size: Option<i64>) -> Self {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        let parent_path = path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .map(|p| p.display().to_string());
        Self {
            path: path.display().to_string(),
            name,
            is_directory,
            size: if is_directory { None } else { size },
            parent_path,
        }
    }

    /// Drop the parent, as for the root of a scan
    pub fn without_parent(mut self) -> Self {
        self.parent_path = None;
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Tag {
    pub id: i64,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Category {
    pub id: i64,
    pub name: String,
}

/// SQLite-backed storage for paths, tags, categories and settings
pub struct SqliteStore {
    conn: Connection,
}

impl SqliteStore {
    /// Open a database file without touching its schema.
    ///
    /// Callers normally go through [`open_and_migrate`](super::migrate::open_and_migrate),
    /// which runs the schema migrator before handing the store out.
    pub(crate) fn connect(path: &Path) -> Result<Self> {
        let conn = Connection::open(path)?;
        Self::configure(conn)
    }

    /// Open an in-memory database with a fresh schema (for testing)
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        let store = Self::configure(conn)?;
        store.create_schema()?;
        store.seed_defaults()?;
        Ok(store)
    }

    /// Per-connection setup; nothing here writes to the database file.
    fn configure(conn: Connection) -> Result<Self> {
        conn.pragma_update(None, "foreign_keys", true)?;
        conn.create_scalar_function(
            schema::LEVENSHTEIN_FN,
            2,
            FunctionFlags::SQLITE_UTF8 | FunctionFlags::SQLITE_DETERMINISTIC,
            |ctx| {
                let a: Option<String> = ctx.get(0)?;
                let b: Option<String> = ctx.get(1)?;
                match (a, b) {
                    (Some(a), Some(b)) => distance::distance(&a, &b)
                        .map(|d| Some(d as i64))
                        .map_err(|e| rusqlite::Error::UserFunctionError(Box::new(e))),
                    _ => Ok(None),
                }
            },
        )?;
        Ok(Self { conn })
    }

    pub fn table_exists(&self, table: &str) -> Result<bool> {
        let found = self
            .conn
            .query_row(
                "SELECT 1 FROM sqlite_master WHERE type = 'table' AND name = ?1",
                [table],
                |_| Ok(()),
            )
            .optional()?;
        Ok(found.is_some())
    }

    /// Create every version 1 table and index that is missing
    pub(crate) fn create_schema(&self) -> Result<()> {
        for stmt in schema::all_schema_statements() {
            self.conn.execute(stmt, [])?;
        }
        tracing::debug!("schema statements applied");
        Ok(())
    }

    /// Seed default settings and categories, keeping any existing values
    pub(crate) fn seed_defaults(&self) -> Result<()> {
        for key in SettingKey::ALL {
            self.conn.execute(
                "INSERT OR IGNORE INTO settings (key, value) VALUES (?1, ?2)",
                params![key.as_str(), key.default_value().to_string()],
            )?;
        }
        let mut stmt = self.conn.prepare("INSERT OR IGNORE INTO categories (name) VALUES (?1)")?;
        for name in schema::DEFAULT_CATEGORIES {
            stmt.execute([name])?;
        }
        Ok(())
    }

    // ========== Path Operations ==========

    /// Insert a path unless it is already indexed. Returns whether a row was added.
    pub fn add_path(&self, entry: &NewPath) -> Result<bool> {
        let inserted = self.conn.execute(
            r#"
            INSERT OR IGNORE INTO paths (path, name, is_directory, size, parent_path)
            VALUES (?1, ?2, ?3, ?4, ?5)
            "#,
            params![
                entry.path,
                entry.name,
                entry.is_directory,
                entry.size,
                entry.parent_path,
            ],
        )?;
        Ok(inserted > 0)
    }

    /// Look up a path by its exact path string
    pub fn find_path(&self, path: &str) -> Result<Option<PathEntry>> {
        self.conn
            .query_row(
                &format!("SELECT {PATH_COLUMNS} FROM paths p WHERE p.path = ?1"),
                [path],
                row_to_path,
            )
            .optional()
            .map_err(Into::into)
    }

    pub fn require_path(&self, path: &str) -> Result<PathEntry> {
        self.find_path(path)?
            .ok_or_else(|| Error::not_found("Path", path))
    }

    /// Delete a path; its tag and category memberships go with it
    pub fn remove_path(&self, path: &str) -> Result<PathEntry> {
        let entry = self.require_path(path)?;
        self.conn.execute("DELETE FROM paths WHERE id = ?1", [entry.id])?;
        Ok(entry)
    }

    /// Paths whose name satisfies `pattern`, in store order
    pub fn find_paths_by_name(&self, pattern: &NameMatch<'_>, limit: usize) -> Result<Vec<PathEntry>> {
        let (predicate, arg) = pattern.predicate("p.name");
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {PATH_COLUMNS} FROM paths p WHERE {predicate} ORDER BY p.id LIMIT ?2"
        ))?;
        let paths = stmt
            .query_map(params![arg, limit as i64], row_to_path)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(paths)
    }

    /// Every path whose name is within `max_distance` edits of `query`, unsorted
    pub fn paths_within_distance(&self, query: &str, max_distance: usize) -> Result<Vec<(PathEntry, usize)>> {
        let mut stmt = self.conn.prepare(&format!(
            r#"
            SELECT * FROM (
                SELECT {PATH_COLUMNS}, levenshtein(p.name, ?1) AS dist FROM paths p
            ) WHERE dist <= ?2 ORDER BY id
            "#
        ))?;
        let paths = stmt
            .query_map(params![query, max_distance as i64], |row| {
                let dist: i64 = row.get(6)?;
                Ok((row_to_path(row)?, dist as usize))
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(paths)
    }

    /// Paths satisfying every filter in `query`, distinct and ordered by path
    pub fn structured_search(&self, query: &StructuredQuery, limit: usize) -> Result<Vec<PathEntry>> {
        let (sql, args) = query.to_sql(PATH_COLUMNS, limit);
        tracing::debug!(%sql, "structured search");
        let mut stmt = self.conn.prepare(&sql)?;
        let paths = stmt
            .query_map(params_from_iter(args), row_to_path)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(paths)
    }

    // ========== Category Operations ==========

    pub fn list_categories(&self) -> Result<Vec<Category>> {
        let mut stmt = self.conn.prepare("SELECT id, name FROM categories ORDER BY name")?;
        let categories = stmt
            .query_map([], row_to_category)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(categories)
    }

    /// Case-insensitive category lookup
    pub fn find_category(&self, name: &str) -> Result<Option<Category>> {
        self.conn
            .query_row(
                "SELECT id, name FROM categories WHERE name = ?1 COLLATE NOCASE",
                [name],
                row_to_category,
            )
            .optional()
            .map_err(Into::into)
    }

    pub fn require_category(&self, name: &str) -> Result<Category> {
        self.find_category(name)?
            .ok_or_else(|| Error::not_found("Category", name))
    }

    pub fn create_category(&self, name: &str) -> Result<Category> {
        if self.find_category(name)?.is_some() {
            return Err(Error::DuplicateName { kind: "Category", name: name.to_string() });
        }
        self.conn.execute("INSERT INTO categories (name) VALUES (?1)", [name])?;
        Ok(Category { id: self.conn.last_insert_rowid(), name: name.to_string() })
    }

    pub fn categories_for_path(&self, path_id: i64) -> Result<Vec<Category>> {
        let mut stmt = self.conn.prepare(
            r#"
            SELECT c.id, c.name FROM categories c
            JOIN path_categories pc ON c.id = pc.category_id
            WHERE pc.path_id = ?1 ORDER BY c.name
            "#,
        )?;
        let categories = stmt
            .query_map([path_id], row_to_category)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(categories)
    }

    /// Put `path` in `category`. Returns false when it was already there.
    pub fn add_path_category(&self, path: &str, category: &str) -> Result<bool> {
        let entry = self.require_path(path)?;
        let category = self.require_category(category)?;
        let inserted = self.conn.execute(
            "INSERT OR IGNORE INTO path_categories (path_id, category_id) VALUES (?1, ?2)",
            [entry.id, category.id],
        )?;
        Ok(inserted > 0)
    }

    /// Take `path` out of `category`. Returns false when it was not there.
    pub fn remove_path_category(&self, path: &str, category: &str) -> Result<bool> {
        let entry = self.require_path(path)?;
        let category = self.require_category(category)?;
        let removed = self.conn.execute(
            "DELETE FROM path_categories WHERE path_id = ?1 AND category_id = ?2",
            [entry.id, category.id],
        )?;
        Ok(removed > 0)
    }

    /// Assign every path to `category` (used by the legacy upgrade)
    pub(crate) fn assign_all_paths(&self, category: &str) -> Result<usize> {
        let assigned = self.conn.execute(
            r#"
            INSERT OR IGNORE INTO path_categories (path_id, category_id)
            SELECT p.id, c.id FROM paths p, categories c WHERE c.name = ?1 COLLATE NOCASE
            "#,
            [category],
        )?;
        Ok(assigned)
    }

    // ========== Tag Operations ==========

    pub fn list_tags(&self) -> Result<Vec<Tag>> {
        let mut stmt = self.conn.prepare("SELECT id, name FROM tags ORDER BY name")?;
        let tags = stmt
            .query_map([], row_to_tag)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(tags)
    }

    /// Case-insensitive tag lookup
    pub fn find_tag(&self, name: &str) -> Result<Option<Tag>> {
        self.conn
            .query_row(
                "SELECT id, name FROM tags WHERE name = ?1 COLLATE NOCASE",
                [name],
                row_to_tag,
            )
            .optional()
            .map_err(Into::into)
    }

    /// Insert a tag row. New tags are created through the similarity guard.
    pub(crate) fn insert_tag(&self, name: &str) -> Result<Tag> {
        let inserted = self.conn.execute("INSERT INTO tags (name) VALUES (?1)", [name]);
        match inserted {
            Ok(_) => Ok(Tag { id: self.conn.last_insert_rowid(), name: name.to_string() }),
            Err(e) if e.sqlite_error_code() == Some(rusqlite::ErrorCode::ConstraintViolation) => {
                Err(Error::DuplicateName { kind: "Tag", name: name.to_string() })
            }
            Err(e) => Err(e.into()),
        }
    }

    pub fn tags_for_path(&self, path_id: i64) -> Result<Vec<Tag>> {
        let mut stmt = self.conn.prepare(
            r#"
            SELECT t.id, t.name FROM tags t
            JOIN path_tags pt ON t.id = pt.tag_id
            WHERE pt.path_id = ?1 ORDER BY t.name
            "#,
        )?;
        let tags = stmt
            .query_map([path_id], row_to_tag)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(tags)
    }

    /// Attach `tag` to `path`. Returns false when it was already attached.
    pub fn add_path_tag(&self, path: &PathEntry, tag: &Tag) -> Result<bool> {
        let inserted = self.conn.execute(
            "INSERT OR IGNORE INTO path_tags (path_id, tag_id) VALUES (?1, ?2)",
            [path.id, tag.id],
        )?;
        Ok(inserted > 0)
    }

    /// Detach a tag from a path. Returns false when it was not attached.
    pub fn remove_path_tag(&self, path: &str, tag: &str) -> Result<bool> {
        let entry = self.require_path(path)?;
        let tag = self.find_tag(tag)?.ok_or_else(|| Error::not_found("Tag", tag))?;
        let removed = self.conn.execute(
            "DELETE FROM path_tags WHERE path_id = ?1 AND tag_id = ?2",
            [entry.id, tag.id],
        )?;
        Ok(removed > 0)
    }

    /// Tags whose name satisfies `pattern`, in store order
    pub fn find_tags_by_name(&self, pattern: &NameMatch<'_>, limit: usize) -> Result<Vec<Tag>> {
        let (predicate, arg) = pattern.predicate("name");
        let mut stmt = self.conn.prepare(&format!(
            "SELECT id, name FROM tags WHERE {predicate} ORDER BY id LIMIT ?2"
        ))?;
        let tags = stmt
            .query_map(params![arg, limit as i64], row_to_tag)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(tags)
    }

    /// Every tag whose name is within `max_distance` edits of `query`, unsorted
    pub fn tags_within_distance(&self, query: &str, max_distance: usize) -> Result<Vec<(Tag, usize)>> {
        let mut stmt = self.conn.prepare(
            r#"
            SELECT * FROM (
                SELECT id, name, levenshtein(name, ?1) AS dist FROM tags
            ) WHERE dist <= ?2 ORDER BY id
            "#,
        )?;
        let tags = stmt
            .query_map(params![query, max_distance as i64], |row| {
                let dist: i64 = row.get(2)?;
                Ok((row_to_tag(row)?, dist as usize))
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(tags)
    }

    // ========== Settings Operations ==========

    /// Raw setting value, `None` when the key was never set
    pub fn setting_value(&self, key: &str) -> Result<Option<String>> {
        let value: Option<Option<String>> = self
            .conn
            .query_row("SELECT value FROM settings WHERE key = ?1", [key], |row| row.get(0))
            .optional()?;
        Ok(value.flatten())
    }

    pub fn get_string_setting(&self, key: &str, default: &str) -> Result<String> {
        Ok(self.setting_value(key)?.unwrap_or_else(|| default.to_string()))
    }

    pub fn get_int_setting(&self, key: &str, default: i64) -> Result<i64> {
        match self.setting_value(key)? {
            Some(raw) => Ok(raw.trim().parse().unwrap_or_else(|_| {
                tracing::warn!(key, value = %raw, "setting is not an integer, using default");
                default
            })),
            None => Ok(default),
        }
    }

    /// A recognized setting, falling back to its documented default
    pub fn setting(&self, key: SettingKey) -> Result<i64> {
        self.get_int_setting(key.as_str(), key.default_value())
    }

    pub fn set_string_setting(&self, key: &str, value: &str) -> Result<()> {
        self.conn.execute(
            "INSERT OR REPLACE INTO settings (key, value) VALUES (?1, ?2)",
            params![key, value],
        )?;
        Ok(())
    }

    pub fn set_int_setting(&self, key: &str, value: i64) -> Result<()> {
        self.set_string_setting(key, &value.to_string())
    }

    /// All settings rows, ordered by key
    pub fn list_settings(&self) -> Result<Vec<(String, Option<String>)>> {
        let mut stmt = self.conn.prepare("SELECT key, value FROM settings ORDER BY key")?;
        let rows = stmt
            .query_map([], |row| Ok((row.get(0)?, row.get(1)?)))?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
    }

    // ========== Bulk Operations ==========

    /// Begin a transaction for bulk operations
    pub fn begin_transaction(&mut self) -> Result<()> {
        self.conn.execute("BEGIN TRANSACTION", [])?;
        Ok(())
    }

    /// Commit a transaction
    pub fn commit(&mut self) -> Result<()> {
        self.conn.execute("COMMIT", [])?;
        Ok(())
    }

    /// Rollback a transaction
    pub fn rollback(&mut self) -> Result<()> {
        self.conn.execute("ROLLBACK", [])?;
        Ok(())
    }

    fn count(&self, sql: &str) -> Result<usize> {
        let count: i64 = self.conn.query_row(sql, [], |row| row.get(0))?;
        Ok(count as usize)
    }

    /// Get database statistics
    pub fn stats(&self) -> Result<DbStats> {
        Ok(DbStats {
            paths: self.count("SELECT COUNT(*) FROM paths")?,
            directories: self.count("SELECT COUNT(*) FROM paths WHERE is_directory = 1")?,
            files: self.count("SELECT COUNT(*) FROM paths WHERE is_directory = 0")?,
            tags: self.count("SELECT COUNT(*) FROM tags")?,
            categories: self.count("SELECT COUNT(*) FROM categories")?,
            categories_in_use: self.count("SELECT COUNT(DISTINCT category_id) FROM path_categories")?,
        })
    }
}

fn row_to_path(row: &rusqlite::Row) -> rusqlite::Result<PathEntry> {
    Ok(PathEntry {
        id: row.get(0)?,
        path: row.get(1)?,
        name: row.get(2)?,
        is_directory: row.get(3)?,
        size: row.get(4)?,
        parent_path: row.get(5)?,
    })
}

fn row_to_tag(row: &rusqlite::Row) -> rusqlite::Result<Tag> {
    Ok(Tag { id: row.get(0)?, name: row.get(1)? })
}

fn row_to_category(row: &rusqlite::Row) -> rusqlite::Result<Category> {
    Ok(Category { id: row.get(0)?, name: row.get(1)? })
}

/// Database statistics
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DbStats {
    pub paths: usize,
    pub directories: usize,
    pub files: usize,
    pub tags: usize,
    pub categories: usize,
    pub categories_in_use: usize,
}
