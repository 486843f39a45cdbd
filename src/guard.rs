//! Near-duplicate guard for tag creation
//!
//! Getting a tag by name goes through [`SimilarityGuard::resolve`]:
//!
//! 1. A tag with the same name (ignoring case) is returned as is.
//! 2. Otherwise existing tags are scanned for one that contains, or is
//!    contained in, the new name. The first such tag wins outright.
//! 3. Failing that, the tag with the smallest non-zero edit distance within
//!    `similarity_threshold` is the similar one.
//! 4. With nothing similar the tag is created. With a similar tag the user
//!    decides: create anyway, use the existing tag, or cancel.

use std::fmt;
use crate::confirm::Confirm;
use crate::distance::{distance, is_substring_match};
use crate::settings::SettingKey;
use crate::storage::{SqliteStore, Tag};
use crate::Result;

/// Why an existing tag was flagged
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Similarity {
    /// One name contains the other; carries the difference in length
    Substring { length_difference: usize },
    EditDistance(usize),
}

impl fmt::Display for Similarity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Similarity::Substring { .. } => f.write_str("substring match"),
            Similarity::EditDistance(d) => write!(f, "distance: {d}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SimilarTag {
    pub tag: Tag,
    pub similarity: Similarity,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TagResolution {
    /// A tag with this name already existed; the guard did not run
    Existing(Tag),
    /// Nothing similar existed, so the tag was created
    Created(Tag),
    /// The user chose to create the tag despite a similar one
    CreatedAnyway { tag: Tag, similar: SimilarTag },
    /// The user chose the similar tag instead; nothing was created
    UsedSimilar(SimilarTag),
    /// The user declined both options
    Cancelled { similar: SimilarTag },
}

impl TagResolution {
    /// The tag to use, or `None` when cancelled
    pub fn tag(&self) -> Option<&Tag> {
        match self {
            TagResolution::Existing(tag)
            | TagResolution::Created(tag)
            | TagResolution::CreatedAnyway { tag, .. } => Some(tag),
            TagResolution::UsedSimilar(similar) => Some(&similar.tag),
            TagResolution::Cancelled { .. } => None,
        }
    }
}

pub struct SimilarityGuard<'a> {
    store: &'a SqliteStore,
    threshold: Option<usize>,
}

impl<'a> SimilarityGuard<'a> {
    pub fn new(store: &'a SqliteStore) -> Self {
        Self { store, threshold: None }
    }

    /// Use `threshold` instead of the `similarity_threshold` setting
    pub fn with_threshold(mut self, threshold: usize) -> Self {
        self.threshold = Some(threshold);
        self
    }

    fn threshold(&self) -> Result<usize> {
        if let Some(t) = self.threshold {
            return Ok(t);
        }
        let configured = self.store.setting(SettingKey::SimilarityThreshold)?;
        Ok(usize::try_from(configured).unwrap_or(0))
    }

    /// The single tag most likely to duplicate `name`, if any
    pub fn find_similar(&self, name: &str) -> Result<Option<SimilarTag>> {
        let threshold = self.threshold()?;
        let mut best: Option<SimilarTag> = None;

        for tag in self.store.list_tags()? {
            if is_substring_match(name, &tag.name) {
                let length_difference = name.chars().count().abs_diff(tag.name.chars().count());
                return Ok(Some(SimilarTag {
                    tag,
                    similarity: Similarity::Substring { length_difference },
                }));
            }

            let d = distance(name, &tag.name)?;
            let closer = match &best {
                Some(SimilarTag { similarity: Similarity::EditDistance(b), .. }) => d < *b,
                _ => true,
            };
            if d > 0 && d <= threshold && closer {
                best = Some(SimilarTag { tag, similarity: Similarity::EditDistance(d) });
            }
        }

        Ok(best)
    }

    /// Get the tag called `name`, creating it if the user agrees
    pub fn resolve(&self, name: &str, confirm: &mut dyn Confirm) -> Result<TagResolution> {
        if let Some(existing) = self.store.find_tag(name)? {
            return Ok(TagResolution::Existing(existing));
        }

        let Some(similar) = self.find_similar(name)? else {
            let tag = self.store.insert_tag(name)?;
            tracing::debug!(tag = %tag.name, "created tag");
            return Ok(TagResolution::Created(tag));
        };

        tracing::debug!(new = name, existing = %similar.tag.name, "similar tag found");
        let create_prompt = format!(
            "Similar tag exists: '{}' ({}).\nCreate new tag '{}' anyway?",
            similar.tag.name, similar.similarity, name
        );
        if confirm.confirm(&create_prompt) {
            let tag = self.store.insert_tag(name)?;
            return Ok(TagResolution::CreatedAnyway { tag, similar });
        }

        if confirm.confirm(&format!("Use '{}' instead?", similar.tag.name)) {
            return Ok(TagResolution::UsedSimilar(similar));
        }

        Ok(TagResolution::Cancelled { similar })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn never(_: &str) -> bool {
        panic!("no confirmation expected")
    }

    fn scripted(answers: &[bool]) -> impl FnMut(&str) -> bool + '_ {
        let mut answers = answers.iter().copied();
        move |_| answers.next().expect("unexpected prompt")
    }

    fn seeded(names: &[&str]) -> SqliteStore {
        let store = SqliteStore::open_in_memory().unwrap();
        for name in names {
            store.insert_tag(name).unwrap();
        }
        store
    }

    #[test]
    fn test_existing_tag_skips_guard() {
        let store = seeded(&["Urgent"]);
        let guard = SimilarityGuard::new(&store);
        let resolution = guard.resolve("URGENT", &mut never).unwrap();
        assert!(matches!(&resolution, TagResolution::Existing(t) if t.name == "Urgent"));
        assert_eq!(store.list_tags().unwrap().len(), 1);
    }

    #[test]
    fn test_no_conflict_creates() {
        let store = seeded(&["Holiday"]);
        let guard = SimilarityGuard::new(&store);
        let resolution = guard.resolve("Finance", &mut never).unwrap();
        assert!(matches!(&resolution, TagResolution::Created(t) if t.name == "Finance"));
        assert!(store.find_tag("finance").unwrap().is_some());
    }

    #[test]
    fn test_use_existing_returns_similar_id() {
        let store = seeded(&["Urgent"]);
        let urgent = store.find_tag("Urgent").unwrap().unwrap();
        let guard = SimilarityGuard::new(&store);

        let resolution = guard.resolve("Urgant", &mut scripted(&[false, true])).unwrap();
        match &resolution {
            TagResolution::UsedSimilar(similar) => {
                assert_eq!(similar.similarity, Similarity::EditDistance(1));
            }
            other => panic!("unexpected resolution: {other:?}"),
        }
        assert_eq!(resolution.tag().unwrap().id, urgent.id);
        assert_eq!(store.list_tags().unwrap().len(), 1);
    }

    #[test]
    fn test_create_anyway() {
        let store = seeded(&["Urgent"]);
        let guard = SimilarityGuard::new(&store);
        let resolution = guard.resolve("Urgant", &mut scripted(&[true])).unwrap();
        assert!(matches!(resolution, TagResolution::CreatedAnyway { .. }));
        assert_eq!(store.list_tags().unwrap().len(), 2);
    }

    #[test]
    fn test_cancel_creates_nothing() {
        let store = seeded(&["Urgent"]);
        let guard = SimilarityGuard::new(&store);
        let resolution = guard.resolve("Urgant", &mut scripted(&[false, false])).unwrap();
        assert!(matches!(resolution, TagResolution::Cancelled { .. }));
        assert!(resolution.tag().is_none());
        assert_eq!(store.list_tags().unwrap().len(), 1);
    }

    #[test]
    fn test_substring_beats_closer_edit_distance() {
        // "Fork" is scanned first and is one edit away, but "Homework" contains "work".
        let store = seeded(&["Homework", "Fork"]);
        let guard = SimilarityGuard::new(&store);
        let similar = guard.find_similar("work").unwrap().unwrap();
        assert_eq!(similar.tag.name, "Homework");
        assert_eq!(similar.similarity, Similarity::Substring { length_difference: 4 });
    }

    #[test]
    fn test_minimum_distance_wins() {
        let store = seeded(&["Travels", "Travel"]);
        let guard = SimilarityGuard::new(&store).with_threshold(3);
        let similar = guard.find_similar("Traval").unwrap().unwrap();
        assert_eq!(similar.tag.name, "Travel");
        assert_eq!(similar.similarity, Similarity::EditDistance(1));
    }

    #[test]
    fn test_threshold_from_settings() {
        let store = seeded(&["Urgent"]);
        store.set_int_setting("similarity_threshold", 0).unwrap();
        let guard = SimilarityGuard::new(&store);
        assert!(guard.find_similar("Urgant").unwrap().is_none());

        store.set_int_setting("similarity_threshold", 1).unwrap();
        assert!(guard.find_similar("Urgant").unwrap().is_some());
    }

    #[test]
    fn test_prompts_name_both_tags() {
        let store = seeded(&["Urgent"]);
        let guard = SimilarityGuard::new(&store);
        let mut prompts = Vec::new();
        let mut record = |prompt: &str| {
            prompts.push(prompt.to_string());
            false
        };
        guard.resolve("Urgant", &mut record).unwrap();
        assert_eq!(prompts.len(), 2);
        assert!(prompts[0].contains("'Urgent' (distance: 1)"));
        assert!(prompts[0].contains("'Urgant' anyway?"));
        assert_eq!(prompts[1], "Use 'Urgent' instead?");
    }
}
