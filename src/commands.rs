use crate::{emit_success, OutputMode, TagSearchMode};
use filesearch::confirm::Confirm;
use filesearch::guard::{SimilarityGuard, TagResolution};
use filesearch::query::{MatchEngine, Named, SearchLimits, SearchResults, StructuredQuery};
use filesearch::settings::SettingKey;
use filesearch::storage::{SqliteStore, Tag};
use filesearch::ui::{self, Icons, Spinner};
use filesearch::walker::{normalize_root, Indexer};
use owo_colors::OwoColorize;
use std::path::Path;

/// Largest edit distance accepted from the command line
pub const MAX_FUZZY_DISTANCE: i64 = 10;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NameMode {
    Exact,
    Prefix,
    Substring,
}

impl NameMode {
    fn label(self) -> &'static str {
        match self {
            NameMode::Exact => "Exact Match",
            NameMode::Prefix => "Prefix Match",
            NameMode::Substring => "Substring Match",
        }
    }
}

pub fn run_add(
    store: &mut SqliteStore,
    dir: &Path,
    excludes: Vec<String>,
    mode: OutputMode,
) -> anyhow::Result<()> {
    let root = normalize_root(dir);
    if mode.is_human() {
        ui::status(Icons::FOLDER, "Scanning directory", &root.display().to_string());
    }

    let spinner = mode.is_human().then(|| Spinner::new("Scanning"));
    let result = Indexer::new().with_excludes(excludes).index(store, &root, |path, so_far| {
        if let Some(spinner) = &spinner {
            spinner.set_position((so_far.files + so_far.directories) as u64);
            spinner.set_message(&path.display().to_string());
        }
    });
    if let Some(spinner) = &spinner {
        spinner.finish_and_clear();
    }
    let summary = result?;

    if mode.is_human() {
        ui::success(&format!(
            "Added {} files and {} directories.",
            summary.files, summary.directories
        ));
        let seen = summary.files + summary.directories;
        if summary.added < seen {
            ui::summary_row("Already indexed:", &(seen - summary.added).to_string());
        }
        if summary.skipped > 0 {
            ui::warn(&format!("{} entries could not be read", summary.skipped));
        }
    }
    emit_success(mode, "add", summary)
}

pub fn run_remove(store: &SqliteStore, path: &str, mode: OutputMode) -> anyhow::Result<()> {
    let removed = store.remove_path(path)?;
    if mode.is_human() {
        ui::success(&format!("Removed: {}", removed.path));
    }
    emit_success(mode, "remove", removed)
}

pub fn run_info(store: &SqliteStore, path: &str, mode: OutputMode) -> anyhow::Result<()> {
    let entry = store.require_path(path)?;
    let categories = store.categories_for_path(entry.id)?;
    let tags = store.tags_for_path(entry.id)?;

    if mode.is_human() {
        ui::section(" Path Info ");
        ui::summary_row("Path:      ", &entry.path);
        ui::summary_row("Name:      ", &entry.name);
        let kind = if entry.is_directory { "Directory" } else { "File" };
        ui::summary_row("Type:      ", kind);
        if let Some(size) = entry.size.filter(|_| !entry.is_directory) {
            ui::summary_row("Size:      ", &format!("{size} bytes"));
        }
        ui::summary_row("Categories:", &ui::name_list(categories.iter().map(|c| c.name.as_str())));
        ui::summary_row("Tags:      ", &ui::name_list(tags.iter().map(|t| t.name.as_str())));
    }
    emit_success(
        mode,
        "info",
        serde_json::json!({ "path": entry, "categories": categories, "tags": tags }),
    )
}

pub fn run_search(store: &SqliteStore, query: &str, mode: OutputMode) -> anyhow::Result<()> {
    let engine = MatchEngine::paths(store)?;
    let results = engine.search_all(query)?;

    if mode.is_human() {
        ui::header(&format!("Search results for '{query}'"));
        print_sections(&results, |entry, distance| ui::path_line(entry, distance));
    }
    emit_success(mode, "search", results)
}

pub fn run_name_search(
    store: &SqliteStore,
    name_mode: NameMode,
    query: &str,
    mode: OutputMode,
) -> anyhow::Result<()> {
    let engine = MatchEngine::paths(store)?;
    let hits = match name_mode {
        NameMode::Exact => engine.exact(query)?,
        NameMode::Prefix => engine.prefix(query)?,
        NameMode::Substring => engine.substring(query)?,
    };

    if mode.is_human() {
        ui::section(&format!(" {}: '{}' ", name_mode.label(), query));
        ui::print_paths(&hits);
    }
    emit_success(mode, "search", hits)
}

/// Cap a command-line distance at [`MAX_FUZZY_DISTANCE`]. Negative values
/// pass through and select the configured default.
pub fn clamp_distance(distance: Option<i64>) -> Option<i64> {
    distance.map(|d| {
        if d > MAX_FUZZY_DISTANCE {
            tracing::warn!("Distance {} capped at {}", d, MAX_FUZZY_DISTANCE);
            MAX_FUZZY_DISTANCE
        } else {
            d
        }
    })
}

pub fn run_fuzzy(
    store: &SqliteStore,
    query: &str,
    distance: Option<i64>,
    mode: OutputMode,
) -> anyhow::Result<()> {
    let engine = MatchEngine::paths(store)?;
    let distance = clamp_distance(distance);
    let threshold = engine.resolve_distance(distance);
    let hits = engine.fuzzy(query, distance)?;

    if mode.is_human() {
        ui::section(&format!(" Fuzzy Match: '{query}' (distance <= {threshold}) "));
        if hits.is_empty() {
            println!("  {}", ui::muted(&format!("(no fuzzy matches within distance {threshold})")));
        }
        for hit in &hits {
            println!("  {}", ui::path_line(&hit.record, Some(hit.distance)));
        }
    }
    emit_success(mode, "fuzzy", serde_json::json!({ "distance": threshold, "matches": hits }))
}

pub fn build_find_query(
    category: Option<String>,
    tag: Option<String>,
    name: Option<String>,
) -> anyhow::Result<StructuredQuery> {
    let mut query = StructuredQuery::new();
    if let Some(category) = category {
        query = query.category(category);
    }
    if let Some(tag) = tag {
        query = query.tag(tag);
    }
    if let Some(name) = name {
        query = query.name_contains(name);
    }
    if query.is_empty() {
        anyhow::bail!("find needs at least one of --category, --tag or --name");
    }
    Ok(query)
}

pub fn run_find(
    store: &SqliteStore,
    category: Option<String>,
    tag: Option<String>,
    name: Option<String>,
    mode: OutputMode,
) -> anyhow::Result<()> {
    let query = build_find_query(category, tag, name)?;
    let limits = SearchLimits::from_store(store)?;
    let hits = store.structured_search(&query, limits.max_results)?;

    if mode.is_human() {
        ui::section(" Find Results ");
        ui::print_paths(&hits);
    }
    emit_success(mode, "find", hits)
}

pub fn run_tag(
    store: &SqliteStore,
    path: &str,
    tag: &str,
    confirm: &mut dyn Confirm,
    mode: OutputMode,
) -> anyhow::Result<()> {
    let tag = tag.trim();
    if tag.is_empty() {
        anyhow::bail!("tag name cannot be empty");
    }
    let entry = store.require_path(path)?;
    let resolution = SimilarityGuard::new(store).resolve(tag, confirm)?;

    let Some(resolved) = resolution.tag() else {
        if mode.is_human() {
            ui::warn("Cancelled.");
        }
        return emit_success(mode, "tag", serde_json::json!({ "cancelled": true }));
    };

    if mode.is_human() {
        match &resolution {
            TagResolution::Created(t) | TagResolution::CreatedAnyway { tag: t, .. } => {
                ui::status(Icons::NEW, "Created tag", &t.name);
            }
            TagResolution::UsedSimilar(similar) => {
                ui::status(Icons::TAG, "Using existing tag", &similar.tag.name);
            }
            TagResolution::Existing(_) | TagResolution::Cancelled { .. } => {}
        }
    }

    let attached = store.add_path_tag(&entry, resolved)?;
    if mode.is_human() {
        if attached {
            ui::success(&format!("Tagged: {} [{}]", entry.path, resolved.name));
        } else {
            ui::warn(&format!("Path already has tag '{}'.", resolved.name));
        }
    }
    emit_success(
        mode,
        "tag",
        serde_json::json!({ "path": entry, "tag": resolved, "attached": attached }),
    )
}

pub fn run_untag(store: &SqliteStore, path: &str, tag: &str, mode: OutputMode) -> anyhow::Result<()> {
    let removed = store.remove_path_tag(path, tag)?;
    if mode.is_human() {
        if removed {
            ui::success(&format!("Removed tag '{tag}' from {path}"));
        } else {
            ui::warn(&format!("Path does not have tag '{tag}'."));
        }
    }
    emit_success(mode, "untag", serde_json::json!({ "removed": removed }))
}

pub fn run_tags(store: &SqliteStore, path: Option<&str>, mode: OutputMode) -> anyhow::Result<()> {
    let (title, tags) = match path {
        Some(path) => {
            let entry = store.require_path(path)?;
            (format!(" Tags for {} ", entry.path), store.tags_for_path(entry.id)?)
        }
        None => (" All Tags ".to_string(), store.list_tags()?),
    };

    if mode.is_human() {
        ui::section(&title);
        print_tags(&tags);
        println!("\n  {}", ui::dim(&format!("Total: {} tags", tags.len())));
    }
    emit_success(mode, "tags", tags)
}

pub fn run_tag_search(
    store: &SqliteStore,
    query: &str,
    search: TagSearchMode,
    mode: OutputMode,
) -> anyhow::Result<()> {
    let engine = MatchEngine::tags(store)?;

    match search {
        TagSearchMode::All => {
            let results = engine.search_all(query)?;
            if mode.is_human() {
                ui::header(&format!("Tag search for '{query}'"));
                print_sections(&results, |tag, distance| ui::tag_line(tag, distance));
            }
            emit_success(mode, "tagsearch", results)
        }
        TagSearchMode::Exact | TagSearchMode::Substring => {
            let (label, tags) = if search == TagSearchMode::Exact {
                ("Exact Match - Tags", engine.exact(query)?)
            } else {
                ("Substring Match - Tags", engine.substring(query)?)
            };
            if mode.is_human() {
                ui::section(&format!(" {label}: '{query}' "));
                print_tags(&tags);
            }
            emit_success(mode, "tagsearch", tags)
        }
        TagSearchMode::Fuzzy => {
            let hits = engine.fuzzy(query, None)?;
            if mode.is_human() {
                let threshold = engine.limits().fuzzy_distance;
                ui::section(&format!(" Fuzzy Match - Tags (distance <= {threshold}) "));
                if hits.is_empty() {
                    ui::none_found("tags");
                }
                for hit in &hits {
                    println!("  {}", ui::tag_line(&hit.record, Some(hit.distance)));
                }
            }
            emit_success(mode, "tagsearch", hits)
        }
    }
}

pub fn run_categorize(
    store: &SqliteStore,
    path: &str,
    category: &str,
    mode: OutputMode,
) -> anyhow::Result<()> {
    let entry = store.require_path(path)?;
    let Some(found) = store.find_category(category)? else {
        anyhow::bail!("Category not found: {category} (create it first with `create-category`)");
    };

    let added = store.add_path_category(&entry.path, &found.name)?;
    if mode.is_human() {
        if added {
            ui::success(&format!("Categorized: {} -> {}", entry.path, found.name));
        } else {
            ui::warn(&format!("Path is already in category '{}'.", found.name));
        }
    }
    emit_success(mode, "categorize", serde_json::json!({ "category": found, "added": added }))
}

pub fn run_uncategorize(
    store: &SqliteStore,
    path: &str,
    category: &str,
    mode: OutputMode,
) -> anyhow::Result<()> {
    let removed = store.remove_path_category(path, category)?;
    if mode.is_human() {
        if removed {
            ui::success(&format!("Removed {path} from category '{category}'"));
        } else {
            ui::warn(&format!("Path is not in category '{category}'."));
        }
    }
    emit_success(mode, "uncategorize", serde_json::json!({ "removed": removed }))
}

pub fn run_categories(store: &SqliteStore, path: Option<&str>, mode: OutputMode) -> anyhow::Result<()> {
    let (title, categories) = match path {
        Some(path) => {
            let entry = store.require_path(path)?;
            (format!(" Categories for {} ", entry.path), store.categories_for_path(entry.id)?)
        }
        None => (" All Categories ".to_string(), store.list_categories()?),
    };

    if mode.is_human() {
        ui::section(&title);
        if categories.is_empty() {
            ui::none_found("categories");
        }
        for category in &categories {
            println!("  {} {}", Icons::CATEGORY, category.name);
        }
    }
    emit_success(mode, "categories", categories)
}

pub fn run_create_category(store: &SqliteStore, name: &str, mode: OutputMode) -> anyhow::Result<()> {
    let name = name.trim();
    if name.is_empty() {
        anyhow::bail!("category name cannot be empty");
    }
    let category = store.create_category(name)?;
    if mode.is_human() {
        ui::success(&format!("Created category: {}", category.name));
    }
    emit_success(mode, "create-category", category)
}

pub fn run_set(store: &SqliteStore, key: &str, value: &str, mode: OutputMode) -> anyhow::Result<()> {
    match key.parse::<SettingKey>() {
        Ok(SettingKey::SchemaVersion) => {
            anyhow::bail!("schema_version is managed by the migrator and cannot be set by hand");
        }
        Ok(known) => {
            if value.trim().parse::<i64>().is_err() {
                anyhow::bail!("{} expects an integer, got '{}'", known, value);
            }
        }
        Err(_) => tracing::warn!("{} is not a recognized setting", key),
    }

    store.set_string_setting(key, value)?;
    if mode.is_human() {
        ui::success(&format!("Set {key} = {value}"));
    }
    emit_success(mode, "set", serde_json::json!({ "key": key, "value": value }))
}

pub fn run_get(store: &SqliteStore, key: &str, mode: OutputMode) -> anyhow::Result<()> {
    let value = store.setting_value(key)?;
    if mode.is_human() {
        println!("{} = {}", key, value.as_deref().unwrap_or("(not set)"));
    }
    emit_success(mode, "get", serde_json::json!({ "key": key, "value": value }))
}

pub fn run_settings(store: &SqliteStore, mode: OutputMode) -> anyhow::Result<()> {
    let settings = store.list_settings()?;
    if mode.is_human() {
        ui::section(" Settings ");
        println!("{}", ui::settings_table(&settings));
    }
    let map: serde_json::Map<String, serde_json::Value> = settings
        .into_iter()
        .map(|(k, v)| (k, v.map_or(serde_json::Value::Null, serde_json::Value::String)))
        .collect();
    emit_success(mode, "settings", map)
}

pub fn run_stats(store: &SqliteStore, mode: OutputMode) -> anyhow::Result<()> {
    let stats = store.stats()?;
    if mode.is_human() {
        println!(
            "{} {}",
            Icons::STATS,
            "Database Statistics".style(ui::theme().header.clone())
        );
        println!("{}", ui::stats_table(&stats));
    }
    emit_success(mode, "stats", stats)
}

fn print_tags(tags: &[Tag]) {
    if tags.is_empty() {
        println!("  {}", ui::muted("(no tags)"));
    }
    for tag in tags {
        println!("  {}", ui::tag_line(tag, None));
    }
}

/// Print the four sections of a combined search
fn print_sections<R: Named>(results: &SearchResults<R>, line: impl Fn(&R, Option<usize>) -> String) {
    let plain = [
        ("Exact Match", &results.exact),
        ("Prefix Match", &results.prefix),
        ("Substring Match", &results.substring),
    ];
    for (label, records) in plain {
        ui::section(&format!(" {label} "));
        if records.is_empty() {
            println!("  {}", ui::muted("(no matches)"));
        }
        for record in records {
            println!("  {}", line(record, None));
        }
    }

    ui::section(&format!(" Fuzzy Match (distance <= {}) ", results.fuzzy_distance));
    if results.fuzzy.is_empty() {
        println!("  {}", ui::muted("(no matches)"));
    }
    for hit in &results.fuzzy {
        println!("  {}", line(&hit.record, Some(hit.distance)));
    }
}
