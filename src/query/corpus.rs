//! Searchable name corpora
//!
//! The match engine does not know whether it is looking at path names or
//! tag names. A [`Corpus`] hands it candidates; the SQLite-backed corpora
//! push the exact/prefix/substring predicates and the distance cut-off down
//! into SQL.

use crate::Result;
use crate::storage::{PathEntry, SqliteStore, Tag};

/// Case-insensitive name predicate
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NameMatch<'q> {
    Exact(&'q str),
    Prefix(&'q str),
    Substring(&'q str),
}

impl NameMatch<'_> {
    /// SQL predicate over `column` bound to `?1`, and the value to bind
    pub(crate) fn predicate(&self, column: &str) -> (String, String) {
        match self {
            NameMatch::Exact(q) => (format!("{column} = ?1 COLLATE NOCASE"), q.to_string()),
            NameMatch::Prefix(q) => (
                format!("{column} LIKE ?1 ESCAPE '\\'"),
                format!("{}%", escape_like(q)),
            ),
            NameMatch::Substring(q) => (
                format!("{column} LIKE ?1 ESCAPE '\\'"),
                format!("%{}%", escape_like(q)),
            ),
        }
    }
}

/// Escape LIKE wildcards so the query is matched literally
pub(crate) fn escape_like(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        if matches!(c, '%' | '_' | '\\') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

/// Anything a match engine can rank by name
pub trait Named {
    fn name(&self) -> &str;
}

impl Named for PathEntry {
    fn name(&self) -> &str {
        &self.name
    }
}

impl Named for Tag {
    fn name(&self) -> &str {
        &self.name
    }
}

pub trait Corpus {
    type Record: Named;

    /// Records whose name satisfies `pattern`, at most `limit` of them
    fn matching(&self, pattern: NameMatch<'_>, limit: usize) -> Result<Vec<Self::Record>>;

    /// Every record within `max_distance` edits of `query`, in any order
    fn within_distance(&self, query: &str, max_distance: usize) -> Result<Vec<(Self::Record, usize)>>;
}

/// Path names in the store
pub struct PathNames<'a> {
    store: &'a SqliteStore,
}

impl<'a> PathNames<'a> {
    pub fn new(store: &'a SqliteStore) -> Self {
        Self { store }
    }
}

impl Corpus for PathNames<'_> {
    type Record = PathEntry;

    fn matching(&self, pattern: NameMatch<'_>, limit: usize) -> Result<Vec<PathEntry>> {
        self.store.find_paths_by_name(&pattern, limit)
    }

    fn within_distance(&self, query: &str, max_distance: usize) -> Result<Vec<(PathEntry, usize)>> {
        self.store.paths_within_distance(query, max_distance)
    }
}

/// Tag names in the store
pub struct TagNames<'a> {
    store: &'a SqliteStore,
}

impl<'a> TagNames<'a> {
    pub fn new(store: &'a SqliteStore) -> Self {
        Self { store }
    }
}

impl Corpus for TagNames<'_> {
    type Record = Tag;

    fn matching(&self, pattern: NameMatch<'_>, limit: usize) -> Result<Vec<Tag>> {
        self.store.find_tags_by_name(&pattern, limit)
    }

    fn within_distance(&self, query: &str, max_distance: usize) -> Result<Vec<(Tag, usize)>> {
        self.store.tags_within_distance(query, max_distance)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escape_like() {
        assert_eq!(escape_like("100%_done\\"), "100\\%\\_done\\\\");
        assert_eq!(escape_like("plain"), "plain");
    }

    #[test]
    fn test_predicates() {
        let (sql, arg) = NameMatch::Prefix("ze").predicate("p.name");
        assert_eq!(sql, "p.name LIKE ?1 ESCAPE '\\'");
        assert_eq!(arg, "ze%");

        let (sql, arg) = NameMatch::Exact("Zelda").predicate("name");
        assert_eq!(sql, "name = ?1 COLLATE NOCASE");
        assert_eq!(arg, "Zelda");

        let (_, arg) = NameMatch::Substring("").predicate("name");
        assert_eq!(arg, "%%");
    }
}
