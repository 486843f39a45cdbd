use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;

/// Spinner on stderr. Hidden when stdout is not a terminal so piped output stays clean.
pub struct Spinner {
    pb: ProgressBar,
}

impl Spinner {
    pub fn new(message: &str) -> Self {
        let pb = if console::Term::stdout().is_term() {
            let pb = ProgressBar::new_spinner();
            if let Ok(style) = ProgressStyle::with_template("{spinner} {msg} ({pos} entries)") {
                pb.set_style(style);
            }
            pb.enable_steady_tick(Duration::from_millis(100));
            pb
        } else {
            ProgressBar::hidden()
        };
        pb.set_message(message.to_string());
        Self { pb }
    }

    pub fn set_message(&self, msg: &str) {
        self.pb.set_message(msg.to_string());
    }

    pub fn set_position(&self, pos: u64) {
        self.pb.set_position(pos);
    }

    pub fn finish_and_clear(&self) {
        self.pb.finish_and_clear();
    }
}
