//! Database schema definitions

/// SQL to create the paths table
///
/// This is also the only table a legacy (unversioned) database carries.
pub const CREATE_PATHS_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS paths (
    id INTEGER PRIMARY KEY,
    path TEXT UNIQUE NOT NULL,
    name TEXT NOT NULL,
    is_directory INTEGER NOT NULL,
    size INTEGER,
    parent_path TEXT
)
"#;

/// SQL to create the categories table
pub const CREATE_CATEGORIES_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS categories (
    id INTEGER PRIMARY KEY,
    name TEXT UNIQUE NOT NULL COLLATE NOCASE
)
"#;

/// SQL to create the path/category junction table
pub const CREATE_PATH_CATEGORIES_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS path_categories (
    path_id INTEGER NOT NULL,
    category_id INTEGER NOT NULL,
    PRIMARY KEY (path_id, category_id),
    FOREIGN KEY (path_id) REFERENCES paths(id) ON DELETE CASCADE,
    FOREIGN KEY (category_id) REFERENCES categories(id) ON DELETE CASCADE
)
"#;

/// SQL to create the tags table
pub const CREATE_TAGS_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS tags (
    id INTEGER PRIMARY KEY,
    name TEXT UNIQUE NOT NULL COLLATE NOCASE
)
"#;

/// SQL to create the path/tag junction table
pub const CREATE_PATH_TAGS_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS path_tags (
    path_id INTEGER NOT NULL,
    tag_id INTEGER NOT NULL,
    PRIMARY KEY (path_id, tag_id),
    FOREIGN KEY (path_id) REFERENCES paths(id) ON DELETE CASCADE,
    FOREIGN KEY (tag_id) REFERENCES tags(id) ON DELETE CASCADE
)
"#;

/// SQL to create the settings table
pub const CREATE_SETTINGS_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS settings (
    key TEXT PRIMARY KEY,
    value TEXT
)
"#;

/// SQL to create indexes
pub const CREATE_INDEXES: &[&str] = &[
    "CREATE INDEX IF NOT EXISTS idx_path_name ON paths(name)",
    "CREATE INDEX IF NOT EXISTS idx_path_parent ON paths(parent_path)",
    "CREATE INDEX IF NOT EXISTS idx_path_is_dir ON paths(is_directory)",
    "CREATE INDEX IF NOT EXISTS idx_path_categories_cat ON path_categories(category_id)",
    "CREATE INDEX IF NOT EXISTS idx_path_tags_tag ON path_tags(tag_id)",
];

/// Categories every initialized store starts with
pub const DEFAULT_CATEGORIES: &[&str] = &["Games", "Music", "Photos", "Documents", "Uncategorized"];

/// Category that legacy paths are assigned to on upgrade
pub const UNCATEGORIZED: &str = "Uncategorized";

/// Name of the scalar function exposing edit distance to SQL
pub const LEVENSHTEIN_FN: &str = "levenshtein";

/// All schema creation statements for version 1
pub fn all_schema_statements() -> Vec<&'static str> {
    let mut stmts = vec![
        CREATE_PATHS_TABLE,
        CREATE_CATEGORIES_TABLE,
        CREATE_PATH_CATEGORIES_TABLE,
        CREATE_TAGS_TABLE,
        CREATE_PATH_TAGS_TABLE,
        CREATE_SETTINGS_TABLE,
    ];
    stmts.extend(CREATE_INDEXES.iter().copied());
    stmts
}
