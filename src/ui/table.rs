use tabled::{settings::Style, Table, Tabled};
use crate::storage::DbStats;

#[derive(Tabled)]
pub struct TableRow {
    #[tabled(rename = "Metric")]
    pub metric: String,
    #[tabled(rename = "Value")]
    pub value: String,
}

#[derive(Tabled)]
pub struct SettingRow {
    #[tabled(rename = "Key")]
    pub key: String,
    #[tabled(rename = "Value")]
    pub value: String,
}

pub struct TableBuilder {
    rows: Vec<TableRow>,
}

impl TableBuilder {
    pub fn new() -> Self {
        Self { rows: Vec::new() }
    }

    pub fn add_row(&mut self, label: &str, value: impl ToString) {
        self.rows.push(TableRow {
            metric: label.to_string(),
            value: value.to_string(),
        });
    }

    pub fn build(&self) -> String {
        if self.rows.is_empty() {
            return String::new();
        }
        Table::new(&self.rows).with(Style::rounded()).to_string()
    }
}

impl Default for TableBuilder {
    fn default() -> Self {
        Self::new()
    }
}

pub fn stats_table(stats: &DbStats) -> String {
    let mut builder = TableBuilder::new();
    builder.add_row("Total paths", stats.paths);
    builder.add_row("Directories", stats.directories);
    builder.add_row("Files", stats.files);
    builder.add_row("Tags", stats.tags);
    builder.add_row("Categories", stats.categories);
    builder.add_row("Categories in use", stats.categories_in_use);
    builder.build()
}

/// Unset values show as `(not set)`
pub fn settings_table(settings: &[(String, Option<String>)]) -> String {
    let rows: Vec<SettingRow> = settings
        .iter()
        .map(|(key, value)| SettingRow {
            key: key.clone(),
            value: value.clone().unwrap_or_else(|| "(not set)".to_string()),
        })
        .collect();
    Table::new(&rows).with(Style::rounded()).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stats_table_lists_every_count() {
        let stats = DbStats { paths: 7, directories: 2, files: 5, tags: 3, categories: 5, categories_in_use: 1 };
        let table = stats_table(&stats);
        for label in ["Total paths", "Directories", "Files", "Tags", "Categories in use"] {
            assert!(table.contains(label), "missing {label}");
        }
        assert!(table.contains('7'));
    }

    #[test]
    fn test_settings_table_marks_unset() {
        let rows = vec![
            ("max_results".to_string(), Some("20".to_string())),
            ("schema_version".to_string(), None),
        ];
        let table = settings_table(&rows);
        assert!(table.contains("max_results"));
        assert!(table.contains("(not set)"));
    }

    #[test]
    fn test_empty_builder() {
        assert!(TableBuilder::new().build().is_empty());
    }
}
