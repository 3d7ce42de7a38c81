//! Progress display for commands that wait on a task

use indicatif::{ProgressBar, ProgressStyle};

use crate::cli::OutputFormat;
use crate::client::models::TaskUpdate;

/// Progress bar fed by poll updates
///
/// Hidden for JSON output so stdout stays machine-readable; indicatif also
/// hides it when stderr is not a terminal.
pub struct TaskProgress {
    bar: ProgressBar,
    label: String,
    max_attempts: u32,
}

impl TaskProgress {
    pub fn new(label: &str, max_attempts: u32, format: OutputFormat) -> Self {
        let bar = if format == OutputFormat::Json {
            ProgressBar::hidden()
        } else {
            ProgressBar::new(100)
        };

        let style =
            ProgressStyle::with_template("{spinner:.cyan} {msg} [{bar:30.cyan/blue}] {pos:>3}%")
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("=> ");
        bar.set_style(style);
        bar.set_message(label.to_string());

        Self {
            bar,
            label: label.to_string(),
            max_attempts,
        }
    }

    /// Record one poll attempt
    pub fn update(&self, update: &TaskUpdate) {
        if let Some(progress) = update.progress {
            self.bar.set_position(u64::from(progress));
        }
        self.bar.set_message(format!(
            "{} ({}, poll {}/{})",
            self.label, update.status, update.attempt, self.max_attempts
        ));
        self.bar.tick();
    }

    pub fn finish(&self) {
        self.bar.finish_and_clear();
    }
}
