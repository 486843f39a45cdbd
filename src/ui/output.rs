use crate::storage::{PathEntry, Tag};
use crate::ui::{theme, Icons};
use owo_colors::OwoColorize;

pub fn header(text: &str) {
    println!("{} {}", Icons::SEARCH, text.style(theme().header.clone()));
}

pub fn status(icon: &str, label: &str, value: &str) {
    println!("{} {}: {}", icon, label.style(theme().dim.clone()), value);
}

pub fn success(label: &str) {
    println!("{} {}", Icons::CHECK, label.style(theme().success.clone()));
}

pub fn error(label: &str) {
    eprintln!("{} {}", Icons::CROSS, label.style(theme().error.clone()));
}

pub fn warn(label: &str) {
    eprintln!("{} {}", Icons::WARN, label.style(theme().warn.clone()));
}

pub fn info(label: &str, value: &str) {
    println!(
        "{} {}: {}",
        Icons::INFO.style(theme().info.clone()),
        label.style(theme().dim.clone()),
        value
    );
}

pub fn section(title: &str) {
    println!();
    println!("━{}━", title.style(theme().header.clone()));
}

pub fn dim(text: &str) -> String {
    text.style(theme().dim.clone()).to_string()
}

pub fn muted(text: &str) -> String {
    text.style(theme().muted.clone()).to_string()
}

pub fn summary_row(label: &str, value: &str) {
    println!("  {} {}", label.style(theme().dim.clone()), value);
}

/// Printed in place of an empty result list
pub fn none_found(what: &str) {
    println!("  {}", format!("No {what} found.").style(theme().muted.clone()));
}

/// `[DIR]  /path` or `[FILE] /path (N bytes)`, with the edit distance when given
pub fn path_line(entry: &PathEntry, distance: Option<usize>) -> String {
    let mut line = if entry.is_directory {
        format!("[DIR]  {}", entry.path.style(theme().directory.clone()))
    } else {
        match entry.size {
            Some(size) => format!("[FILE] {} {}", entry.path, muted(&format!("({size} bytes)"))),
            None => format!("[FILE] {}", entry.path),
        }
    };
    if let Some(d) = distance {
        line.push_str(&format!(" {}", dim(&format!("(distance: {d})"))));
    }
    line
}

pub fn tag_line(tag: &Tag, distance: Option<usize>) -> String {
    let mut line = format!("{} {}", Icons::TAG, tag.name.style(theme().tag.clone()));
    if let Some(d) = distance {
        line.push_str(&format!(" {}", dim(&format!("(distance: {d})"))));
    }
    line
}

pub fn print_paths<'a>(entries: impl IntoIterator<Item = &'a PathEntry>) {
    let mut any = false;
    for entry in entries {
        println!("  {}", path_line(entry, None));
        any = true;
    }
    if !any {
        none_found("paths");
    }
}

/// A bracketed, comma separated name list such as `[Games, Music]`
pub fn name_list<'a>(names: impl IntoIterator<Item = &'a str>) -> String {
    let names: Vec<&str> = names.into_iter().collect();
    format!("[{}]", names.join(", "))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(path: &str, is_directory: bool, size: Option<i64>) -> PathEntry {
        PathEntry {
            id: 1,
            path: path.into(),
            name: path.rsplit('/').next().unwrap_or(path).into(),
            is_directory,
            size,
            parent_path: None,
        }
    }

    #[test]
    fn test_path_line_marks_kind() {
        let dir = path_line(&entry("/data/games", true, None), None);
        assert!(dir.starts_with("[DIR]  "));
        assert!(dir.contains("/data/games"));

        let file = path_line(&entry("/data/a.txt", false, Some(42)), Some(2));
        assert!(file.starts_with("[FILE] "));
        assert!(file.contains("42 bytes"));
        assert!(file.contains("distance: 2"));
    }

    #[test]
    fn test_name_list() {
        assert_eq!(name_list(["Games", "Music"]), "[Games, Music]");
        assert_eq!(name_list(Vec::<&str>::new()), "[]");
    }
}
