//! Directory walking and bulk indexing
//!
//! `add <dir>` walks a directory tree and inserts every entry in a single
//! transaction. Paths already in the index are left as they are. Nothing is
//! filtered by default; `.gitignore` files are not consulted, only the
//! user's own `exclude` patterns.

use std::path::{Path, PathBuf, is_separator};
use ignore::WalkBuilder;
use ignore::gitignore::{Gitignore, GitignoreBuilder};
use serde::Serialize;
use crate::storage::{NewPath, SqliteStore};
use crate::{Error, Result};

/// Deepest level below the root that is descended into
pub const MAX_DEPTH: usize = 100;

/// Gitignore-style patterns the user asked to skip
#[derive(Clone)]
pub struct ExcludeFilter {
    inner: Gitignore,
}

impl ExcludeFilter {
    pub fn new(root: &Path, patterns: &[String]) -> Self {
        let mut builder = GitignoreBuilder::new(root);
        for pattern in patterns {
            if let Err(e) = builder.add_line(None, pattern) {
                tracing::warn!("Skipping exclude pattern {:?}: {}", pattern, e);
            }
        }

        let inner = builder.build().unwrap_or_else(|e| {
            tracing::warn!("Exclude patterns unusable, scanning everything: {}", e);
            Gitignore::empty()
        });
        Self { inner }
    }

    pub fn is_excluded(&self, path: &Path, is_dir: bool) -> bool {
        self.inner.matched(path, is_dir).is_ignore()
    }
}

/// Counts reported after a scan. The root itself counts as a directory.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ScanSummary {
    pub files: usize,
    pub directories: usize,
    /// Entries that were not yet indexed
    pub added: usize,
    /// Entries that could not be read
    pub skipped: usize,
}

#[derive(Debug, Clone, Default)]
pub struct Indexer {
    excludes: Vec<String>,
}

impl Indexer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_excludes(mut self, patterns: Vec<String>) -> Self {
        self.excludes = patterns;
        self
    }

    /// Index `root` and everything below it.
    ///
    /// `progress` is called after each entry with the running totals. On any
    /// storage error the whole scan is rolled back.
    pub fn index(
        &self,
        store: &mut SqliteStore,
        root: &Path,
        mut progress: impl FnMut(&Path, &ScanSummary),
    ) -> Result<ScanSummary> {
        let root = normalize_root(root);
        if !root.is_dir() {
            return Err(Error::NotADirectory(root));
        }

        tracing::info!("Scanning {}", root.display());
        store.begin_transaction()?;
        match self.walk_into(store, &root, &mut progress) {
            Ok(summary) => {
                store.commit()?;
                tracing::info!(
                    files = summary.files,
                    directories = summary.directories,
                    added = summary.added,
                    "Scan of {} complete",
                    root.display()
                );
                Ok(summary)
            }
            Err(e) => {
                if let Err(rollback) = store.rollback() {
                    tracing::warn!("Rollback after failed scan also failed: {}", rollback);
                }
                Err(e)
            }
        }
    }

    fn walk_into(
        &self,
        store: &SqliteStore,
        root: &Path,
        progress: &mut impl FnMut(&Path, &ScanSummary),
    ) -> Result<ScanSummary> {
        let mut summary = ScanSummary::default();

        let mut builder = WalkBuilder::new(root);
        builder
            .standard_filters(false)
            .follow_links(false)
            .max_depth(Some(MAX_DEPTH));
        if !self.excludes.is_empty() {
            let filter = ExcludeFilter::new(root, &self.excludes);
            builder.filter_entry(move |entry| {
                let is_dir = entry.file_type().is_some_and(|t| t.is_dir());
                entry.depth() == 0 || !filter.is_excluded(entry.path(), is_dir)
            });
        }

        for result in builder.build() {
            let entry = match result {
                Ok(entry) => entry,
                Err(e) => {
                    tracing::warn!("Cannot read entry: {}", e);
                    summary.skipped += 1;
                    continue;
                }
            };

            let is_dir = entry.depth() == 0 || entry.file_type().is_some_and(|t| t.is_dir());
            let new_path = if entry.depth() == 0 {
                NewPath::new(root, true, None).without_parent()
            } else {
                let size = if is_dir {
                    None
                } else {
                    match entry.metadata() {
                        Ok(meta) => Some(i64::try_from(meta.len()).unwrap_or(i64::MAX)),
                        Err(e) => {
                            tracing::warn!("Cannot stat {}: {}", entry.path().display(), e);
                            summary.skipped += 1;
                            continue;
                        }
                    }
                };
                NewPath::new(entry.path(), is_dir, size)
            };

            if store.add_path(&new_path)? {
                summary.added += 1;
            }
            if is_dir {
                summary.directories += 1;
            } else {
                summary.files += 1;
            }
            progress(entry.path(), &summary);
        }

        Ok(summary)
    }
}

/// Strip trailing separators, keeping a bare root separator intact
pub fn normalize_root(root: &Path) -> PathBuf {
    let raw = root.to_string_lossy();
    let trimmed = raw.trim_end_matches(is_separator);
    if trimmed.is_empty() && !raw.is_empty() {
        PathBuf::from(&raw[..1])
    } else {
        PathBuf::from(trimmed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn sample_tree() -> TempDir {
        let dir = TempDir::new().unwrap();
        fs::create_dir_all(dir.path().join("games/saves")).unwrap();
        fs::create_dir_all(dir.path().join("music")).unwrap();
        fs::write(dir.path().join("games/zelda.rom"), b"rom").unwrap();
        fs::write(dir.path().join("games/saves/slot1.sav"), b"12345").unwrap();
        fs::write(dir.path().join("music/song.mp3"), b"").unwrap();
        fs::write(dir.path().join(".hidden"), b"x").unwrap();
        dir
    }

    fn no_progress(_: &Path, _: &ScanSummary) {}

    #[test]
    fn test_normalize_root() {
        assert_eq!(normalize_root(Path::new("/data/games///")), PathBuf::from("/data/games"));
        assert_eq!(normalize_root(Path::new("/")), PathBuf::from("/"));
        assert_eq!(normalize_root(Path::new("rel")), PathBuf::from("rel"));
    }

    #[test]
    fn test_index_counts_and_rows() {
        let dir = sample_tree();
        let mut store = SqliteStore::open_in_memory().unwrap();

        let summary = Indexer::new().index(&mut store, dir.path(), no_progress).unwrap();
        // root, games, games/saves, music
        assert_eq!(summary.directories, 4);
        // zelda.rom, slot1.sav, song.mp3, .hidden
        assert_eq!(summary.files, 4);
        assert_eq!(summary.added, 8);

        let root = dir.path().display().to_string();
        let root_entry = store.require_path(&root).unwrap();
        assert!(root_entry.is_directory);
        assert_eq!(root_entry.parent_path, None);

        let save = dir.path().join("games/saves/slot1.sav");
        let save = store.require_path(&save.display().to_string()).unwrap();
        assert_eq!(save.name, "slot1.sav");
        assert_eq!(save.size, Some(5));
        assert_eq!(
            save.parent_path.as_deref(),
            Some(dir.path().join("games/saves").display().to_string().as_str())
        );

        let games = store.require_path(&dir.path().join("games").display().to_string()).unwrap();
        assert_eq!(games.size, None);
    }

    #[test]
    fn test_rescan_adds_nothing() {
        let dir = sample_tree();
        let mut store = SqliteStore::open_in_memory().unwrap();
        let indexer = Indexer::new();
        indexer.index(&mut store, dir.path(), no_progress).unwrap();

        let trailing = PathBuf::from(format!("{}/", dir.path().display()));
        let again = indexer.index(&mut store, &trailing, no_progress).unwrap();
        assert_eq!(again.added, 0);
        assert_eq!(again.files, 4);
        assert_eq!(store.stats().unwrap().paths, 8);
    }

    #[test]
    fn test_not_a_directory() {
        let dir = sample_tree();
        let mut store = SqliteStore::open_in_memory().unwrap();
        let file = dir.path().join("music/song.mp3");
        let err = Indexer::new().index(&mut store, &file, no_progress).unwrap_err();
        assert!(matches!(err, Error::NotADirectory(p) if p == file));

        let missing = dir.path().join("nope");
        assert!(Indexer::new().index(&mut store, &missing, no_progress).is_err());
        assert_eq!(store.stats().unwrap().paths, 0);
    }

    #[test]
    fn test_excludes_skip_subtrees() {
        let dir = sample_tree();
        let mut store = SqliteStore::open_in_memory().unwrap();
        let indexer = Indexer::new().with_excludes(vec!["saves/".into(), "*.mp3".into()]);

        let summary = indexer.index(&mut store, dir.path(), no_progress).unwrap();
        assert_eq!(summary.directories, 3);
        assert_eq!(summary.files, 2);
        let saves = dir.path().join("games/saves");
        assert!(store.find_path(&saves.display().to_string()).unwrap().is_none());
    }

    #[test]
    fn test_progress_sees_every_entry() {
        let dir = sample_tree();
        let mut store = SqliteStore::open_in_memory().unwrap();
        let mut seen = 0;
        let summary = Indexer::new()
            .index(&mut store, dir.path(), |_, _| seen += 1)
            .unwrap();
        assert_eq!(seen, summary.files + summary.directories);
    }
}
