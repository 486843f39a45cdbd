pub mod icons;
pub mod output;
pub mod progress;
pub mod table;
pub mod theme;

pub use icons::Icons;
pub use output::{
    dim, error, header, info, muted, name_list, none_found, path_line, print_paths, section,
    status, success, summary_row, tag_line, warn,
};
pub use progress::Spinner;
pub use table::{settings_table, stats_table, TableBuilder};
pub use theme::{theme, Theme};
