//! Structured search filters
//!
//! A [`StructuredQuery`] is a conjunction of optional constraints. Each
//! present filter narrows the result; absent filters impose nothing. All
//! comparisons are case-insensitive.

use rusqlite::types::Value;
use super::corpus::escape_like;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Filter {
    Category(String),
    Tag(String),
    NameContains(String),
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StructuredQuery {
    category: Option<String>,
    tag: Option<String>,
    name: Option<String>,
}

impl StructuredQuery {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a filter. Empty values are ignored; a repeated kind replaces the earlier one.
    pub fn with(mut self, filter: Filter) -> Self {
        match filter {
            Filter::Category(c) => self.category = non_empty(c),
            Filter::Tag(t) => self.tag = non_empty(t),
            Filter::NameContains(n) => self.name = non_empty(n),
        }
        self
    }

    pub fn category(self, name: impl Into<String>) -> Self {
        self.with(Filter::Category(name.into()))
    }

    pub fn tag(self, name: impl Into<String>) -> Self {
        self.with(Filter::Tag(name.into()))
    }

    pub fn name_contains(self, text: impl Into<String>) -> Self {
        self.with(Filter::NameContains(text.into()))
    }

    pub fn is_empty(&self) -> bool {
        self.filters().is_empty()
    }

    pub fn filters(&self) -> Vec<Filter> {
        let mut filters = Vec::new();
        if let Some(c) = &self.category {
            filters.push(Filter::Category(c.clone()));
        }
        if let Some(t) = &self.tag {
            filters.push(Filter::Tag(t.clone()));
        }
        if let Some(n) = &self.name {
            filters.push(Filter::NameContains(n.clone()));
        }
        filters
    }

    /// Parameterized SQL selecting `columns` from `paths p`, with the bound values in order
    pub(crate) fn to_sql(&self, columns: &str, limit: usize) -> (String, Vec<Value>) {
        let mut sql = format!("SELECT DISTINCT {columns} FROM paths p");
        let mut clauses = Vec::new();
        let mut args = Vec::new();

        if let Some(category) = &self.category {
            sql.push_str(" JOIN path_categories pc ON p.id = pc.path_id");
            sql.push_str(" JOIN categories c ON pc.category_id = c.id");
            clauses.push("c.name = ? COLLATE NOCASE");
            args.push(Value::Text(category.clone()));
        }
        if let Some(tag) = &self.tag {
            sql.push_str(" JOIN path_tags pt ON p.id = pt.path_id");
            sql.push_str(" JOIN tags t ON pt.tag_id = t.id");
            clauses.push("t.name = ? COLLATE NOCASE");
            args.push(Value::Text(tag.clone()));
        }
        if let Some(name) = &self.name {
            clauses.push("p.name LIKE ? ESCAPE '\\'");
            args.push(Value::Text(format!("%{}%", escape_like(name))));
        }

        if !clauses.is_empty() {
            sql.push_str(" WHERE ");
            sql.push_str(&clauses.join(" AND "));
        }
        sql.push_str(" ORDER BY p.path LIMIT ?");
        args.push(Value::Integer(limit as i64));

        (sql, args)
    }
}

fn non_empty(s: String) -> Option<String> {
    if s.trim().is_empty() { None } else { Some(s) }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;
    use crate::guard::SimilarityGuard;
    use crate::storage::{NewPath, SqliteStore};

    #[test]
    fn test_builder_ignores_empty_filters() {
        let query = StructuredQuery::new().category("").tag("  ").name_contains("zel");
        assert_eq!(query.filters(), vec![Filter::NameContains("zel".into())]);
        assert!(!query.is_empty());
        assert!(StructuredQuery::new().is_empty());
    }

    #[test]
    fn test_sql_shape() {
        let (sql, args) = StructuredQuery::new().category("Games").to_sql("p.path", 10);
        assert_eq!(
            sql,
            "SELECT DISTINCT p.path FROM paths p \
             JOIN path_categories pc ON p.id = pc.path_id \
             JOIN categories c ON pc.category_id = c.id \
             WHERE c.name = ? COLLATE NOCASE ORDER BY p.path LIMIT ?"
        );
        assert_eq!(args, vec![Value::Text("Games".into()), Value::Integer(10)]);

        let (sql, args) = StructuredQuery::new().to_sql("p.path", 3);
        assert_eq!(sql, "SELECT DISTINCT p.path FROM paths p ORDER BY p.path LIMIT ?");
        assert_eq!(args, vec![Value::Integer(3)]);
    }

    fn fixture() -> SqliteStore {
        let store = SqliteStore::open_in_memory().unwrap();
        for path in [
            "/games/zelda/zelda.sav",
            "/games/zelda/Zelda Notes.txt",
            "/games/metroid.sav",
            "/docs/zelda-guide.pdf",
        ] {
            store.add_path(&NewPath::new(Path::new(path), false, Some(10))).unwrap();
        }
        for path in ["/games/zelda/zelda.sav", "/games/zelda/Zelda Notes.txt", "/games/metroid.sav"] {
            store.add_path_category(path, "Games").unwrap();
        }
        store.add_path_category("/games/zelda/zelda.sav", "Documents").unwrap();
        store.add_path_category("/docs/zelda-guide.pdf", "Documents").unwrap();

        let guard = SimilarityGuard::new(&store);
        let mut no = |_: &str| false;
        let save = guard.resolve("savefile", &mut no).unwrap().tag().cloned().unwrap();
        let entry = store.require_path("/games/zelda/zelda.sav").unwrap();
        store.add_path_tag(&entry, &save).unwrap();
        let entry = store.require_path("/games/metroid.sav").unwrap();
        store.add_path_tag(&entry, &save).unwrap();
        store
    }

    fn paths(store: &SqliteStore, query: &StructuredQuery) -> Vec<String> {
        store
            .structured_search(query, 20)
            .unwrap()
            .into_iter()
            .map(|p| p.path)
            .collect()
    }

    #[test]
    fn test_category_and_name() {
        let store = fixture();
        let query = StructuredQuery::new().category("games").name_contains("ZEL");
        assert_eq!(
            paths(&store, &query),
            vec!["/games/zelda/Zelda Notes.txt", "/games/zelda/zelda.sav"]
        );
    }

    #[test]
    fn test_all_three_filters() {
        let store = fixture();
        let query = StructuredQuery::new().category("Games").tag("SAVEFILE").name_contains("zel");
        assert_eq!(paths(&store, &query), vec!["/games/zelda/zelda.sav"]);
    }

    #[test]
    fn test_tag_only() {
        let store = fixture();
        let query = StructuredQuery::new().tag("savefile");
        assert_eq!(paths(&store, &query), vec!["/games/metroid.sav", "/games/zelda/zelda.sav"]);
    }

    #[test]
    fn test_no_filters_returns_bounded_set() {
        let store = fixture();
        let all = store.structured_search(&StructuredQuery::new(), 2).unwrap();
        assert_eq!(all.len(), 2);
        assert_eq!(all[0].path, "/docs/zelda-guide.pdf");
    }

    #[test]
    fn test_unknown_category_yields_nothing() {
        let store = fixture();
        let query = StructuredQuery::new().category("Nope");
        assert!(paths(&store, &query).is_empty());
    }
}
