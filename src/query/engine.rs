//! Match engine
//!
//! Provides the four name retrieval modes over any [`Corpus`]:
//! - Exact: case-insensitive equality
//! - Prefix: case-insensitive "starts with"
//! - Substring: case-insensitive "contains"
//! - Fuzzy: edit distance within a threshold, closest first
//!
//! Each mode is bounded by `max_results` on its own.

use serde::Serialize;
use crate::Result;
use crate::settings::SettingKey;
use crate::storage::SqliteStore;
use super::corpus::{Corpus, NameMatch, Named, PathNames, TagNames};

/// Result bounds read from the settings table
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SearchLimits {
    pub max_results: usize,
    pub fuzzy_distance: usize,
}

impl Default for SearchLimits {
    fn default() -> Self {
        Self {
            max_results: SettingKey::MaxResults.default_value() as usize,
            fuzzy_distance: SettingKey::FuzzyDefaultDistance.default_value() as usize,
        }
    }
}

impl SearchLimits {
    /// Load limits from the store. A non-positive `max_results` or a negative
    /// `fuzzy_default_distance` falls back to the documented default.
    pub fn from_store(store: &SqliteStore) -> Result<Self> {
        let defaults = Self::default();
        let max_results = store.setting(SettingKey::MaxResults)?;
        let fuzzy_distance = store.setting(SettingKey::FuzzyDefaultDistance)?;
        Ok(Self {
            max_results: if max_results > 0 { max_results as usize } else { defaults.max_results },
            fuzzy_distance: usize::try_from(fuzzy_distance).unwrap_or(defaults.fuzzy_distance),
        })
    }
}

/// A fuzzy hit and its edit distance from the query
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Scored<R> {
    pub record: R,
    pub distance: usize,
}

/// The four result sets of a combined search, kept apart
#[derive(Debug, Clone, Serialize)]
pub struct SearchResults<R> {
    pub exact: Vec<R>,
    pub prefix: Vec<R>,
    pub substring: Vec<R>,
    pub fuzzy: Vec<Scored<R>>,
    pub fuzzy_distance: usize,
}

impl<R> SearchResults<R> {
    pub fn is_empty(&self) -> bool {
        self.exact.is_empty() && self.prefix.is_empty() && self.substring.is_empty() && self.fuzzy.is_empty()
    }
}

pub struct MatchEngine<C> {
    corpus: C,
    limits: SearchLimits,
}

impl<'a> MatchEngine<PathNames<'a>> {
    /// Engine over path names, bounded by the store's settings
    pub fn paths(store: &'a SqliteStore) -> Result<Self> {
        Ok(Self::new(PathNames::new(store), SearchLimits::from_store(store)?))
    }
}

impl<'a> MatchEngine<TagNames<'a>> {
    /// Engine over tag names, bounded by the store's settings
    pub fn tags(store: &'a SqliteStore) -> Result<Self> {
        Ok(Self::new(TagNames::new(store), SearchLimits::from_store(store)?))
    }
}

impl<C: Corpus> MatchEngine<C> {
    pub fn new(corpus: C, limits: SearchLimits) -> Self {
        Self { corpus, limits }
    }

    pub fn limits(&self) -> SearchLimits {
        self.limits
    }

    pub fn exact(&self, query: &str) -> Result<Vec<C::Record>> {
        self.corpus.matching(NameMatch::Exact(query), self.limits.max_results)
    }

    /// An empty query matches everything
    pub fn prefix(&self, query: &str) -> Result<Vec<C::Record>> {
        self.corpus.matching(NameMatch::Prefix(query), self.limits.max_results)
    }

    /// An empty query matches everything
    pub fn substring(&self, query: &str) -> Result<Vec<C::Record>> {
        self.corpus.matching(NameMatch::Substring(query), self.limits.max_results)
    }

    /// Threshold for a fuzzy search. `None` or a negative value means the
    /// configured default; range checks are up to the caller.
    pub fn resolve_distance(&self, max_distance: Option<i64>) -> usize {
        max_distance
            .and_then(|d| usize::try_from(d).ok())
            .unwrap_or(self.limits.fuzzy_distance)
    }

    /// Records within the threshold, sorted by distance and then by
    /// case-folded name, truncated to `max_results`
    pub fn fuzzy(&self, query: &str, max_distance: Option<i64>) -> Result<Vec<Scored<C::Record>>> {
        let threshold = self.resolve_distance(max_distance);
        let mut hits: Vec<Scored<C::Record>> = self
            .corpus
            .within_distance(query, threshold)?
            .into_iter()
            .map(|(record, distance)| Scored { record, distance })
            .collect();

        hits.sort_by_cached_key(|hit| (hit.distance, hit.record.name().to_ascii_lowercase()));
        hits.truncate(self.limits.max_results);
        Ok(hits)
    }

    /// Run all four modes independently. Nothing is merged or deduplicated.
    pub fn search_all(&self, query: &str) -> Result<SearchResults<C::Record>> {
        Ok(SearchResults {
            exact: self.exact(query)?,
            prefix: self.prefix(query)?,
            substring: self.substring(query)?,
            fuzzy: self.fuzzy(query, None)?,
            fuzzy_distance: self.limits.fuzzy_distance,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;
    use crate::guard::SimilarityGuard;
    use crate::storage::NewPath;

    fn store_with(names: &[&str]) -> SqliteStore {
        let store = SqliteStore::open_in_memory().unwrap();
        for (i, name) in names.iter().enumerate() {
            let path = format!("/data/{i}/{name}");
            store.add_path(&NewPath::new(Path::new(&path), false, Some(1))).unwrap();
        }
        store
    }

    fn names<R: Named>(records: &[R]) -> Vec<&str> {
        records.iter().map(|r| r.name()).collect()
    }

    #[test]
    fn test_exact_prefix_substring() {
        let store = store_with(&["Zelda", "zelda", "Zelda II", "Metroid", "A Link to the Past"]);
        let engine = MatchEngine::paths(&store).unwrap();

        assert_eq!(names(&engine.exact("ZELDA").unwrap()), vec!["Zelda", "zelda"]);
        assert_eq!(names(&engine.prefix("zel").unwrap()), vec!["Zelda", "zelda", "Zelda II"]);
        assert_eq!(names(&engine.substring("LINK").unwrap()), vec!["A Link to the Past"]);
        assert!(engine.exact("Zeld").unwrap().is_empty());
    }

    #[test]
    fn test_empty_query_matches_everything() {
        let store = store_with(&["a", "b", "c"]);
        let engine = MatchEngine::paths(&store).unwrap();
        assert_eq!(engine.prefix("").unwrap().len(), 3);
        assert_eq!(engine.substring("").unwrap().len(), 3);
    }

    #[test]
    fn test_wildcards_are_literal() {
        let store = store_with(&["100%", "1000", "a_b", "axb"]);
        let engine = MatchEngine::paths(&store).unwrap();
        assert_eq!(names(&engine.substring("0%").unwrap()), vec!["100%"]);
        assert_eq!(names(&engine.prefix("a_").unwrap()), vec!["a_b"]);
    }

    #[test]
    fn test_fuzzy_ordering_and_threshold() {
        let store = store_with(&["muse", "Musik", "magic", "mosaic", "music", "melodic"]);
        let engine = MatchEngine::paths(&store).unwrap();

        let hits = engine.fuzzy("music", Some(2)).unwrap();
        let got: Vec<_> = hits.iter().map(|h| (h.record.name.as_str(), h.distance)).collect();
        assert_eq!(
            got,
            vec![("music", 0), ("Musik", 1), ("magic", 2), ("mosaic", 2), ("muse", 2)]
        );
        assert!(hits.windows(2).all(|w| w[0].distance <= w[1].distance));
    }

    #[test]
    fn test_fuzzy_negative_threshold_uses_default() {
        let store = store_with(&["abcdef", "abcxyz", "zzzzzz"]);
        let engine = MatchEngine::paths(&store).unwrap();
        assert_eq!(engine.resolve_distance(Some(-1)), 3);
        assert_eq!(engine.resolve_distance(None), 3);
        assert_eq!(engine.resolve_distance(Some(0)), 0);

        let hits = engine.fuzzy("abcdef", Some(-5)).unwrap();
        assert_eq!(hits.len(), 2);
    }

    #[test]
    fn test_results_are_bounded() {
        let many: Vec<String> = (0..30).map(|i| format!("file{i:02}")).collect();
        let refs: Vec<&str> = many.iter().map(String::as_str).collect();
        let store = store_with(&refs);
        store.set_int_setting("max_results", 5).unwrap();
        let engine = MatchEngine::paths(&store).unwrap();

        assert_eq!(engine.prefix("file").unwrap().len(), 5);
        assert_eq!(engine.substring("ile").unwrap().len(), 5);
        let fuzzy = engine.fuzzy("file00", Some(2)).unwrap();
        assert_eq!(fuzzy.len(), 5);
        assert_eq!(fuzzy[0].record.name, "file00");
    }

    #[test]
    fn test_non_positive_max_results_falls_back() {
        let store = store_with(&[]);
        store.set_int_setting("max_results", 0).unwrap();
        store.set_int_setting("fuzzy_default_distance", -2).unwrap();
        assert_eq!(SearchLimits::from_store(&store).unwrap(), SearchLimits::default());
    }

    #[test]
    fn test_search_all_keeps_sections_apart() {
        let store = store_with(&["notes", "notes.txt", "my notes", "nodes"]);
        let engine = MatchEngine::paths(&store).unwrap();
        let all = engine.search_all("notes").unwrap();

        assert_eq!(names(&all.exact), vec!["notes"]);
        assert_eq!(names(&all.prefix), vec!["notes", "notes.txt"]);
        assert_eq!(names(&all.substring), vec!["notes", "notes.txt", "my notes"]);
        let fuzzy: Vec<_> = all.fuzzy.iter().map(|h| h.record.name.as_str()).collect();
        assert_eq!(fuzzy, vec!["notes", "nodes", "my notes"]);
        assert!(!all.is_empty());
    }

    #[test]
    fn test_fuzzy_tag_search() {
        let store = SqliteStore::open_in_memory().unwrap();
        let guard = SimilarityGuard::new(&store);
        let mut never = |_: &str| -> bool { panic!("no prompt expected") };
        guard.resolve("Finance", &mut never).unwrap();
        guard.resolve("Holiday", &mut never).unwrap();

        let engine = MatchEngine::tags(&store).unwrap();
        let hits = engine.fuzzy("finanse", None).unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].record.name, "Finance");
        assert_eq!(hits[0].distance, 1);
    }
}
