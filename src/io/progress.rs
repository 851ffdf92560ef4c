//! Progress display for batch ingestion and mosaic composition

use crate::io::configuration::PROGRESS_BAR_WIDTH;
use indicatif::{ProgressBar, ProgressStyle};
use std::path::Path;
use std::sync::LazyLock;

static PHASE_STYLE: LazyLock<ProgressStyle> = LazyLock::new(|| {
    ProgressStyle::default_bar()
        .template(&format!(
            "[{{elapsed_precise}}] {{prefix}} [{{bar:{PROGRESS_BAR_WIDTH}.cyan/blue}}] {{pos}}/{{len}} {{msg}}"
        ))
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("█▉▊▋▌▍▎▏ ")
});

/// Tracks one phase of work (batch files, photos) with a single bar
///
/// A manager created with [`ProgressManager::hidden`] accepts the same calls
/// and draws nothing.
pub struct ProgressManager {
    bar: Option<ProgressBar>,
    visible: bool,
}

impl Default for ProgressManager {
    fn default() -> Self {
        Self::new()
    }
}

impl ProgressManager {
    /// Create a manager that draws to the terminal
    pub const fn new() -> Self {
        Self {
            bar: None,
            visible: true,
        }
    }

    /// Create a manager that draws nothing
    pub const fn hidden() -> Self {
        Self {
            bar: None,
            visible: false,
        }
    }

    /// Whether bars are drawn
    pub const fn is_visible(&self) -> bool {
        self.visible
    }

    /// Start a new phase of `total` items, replacing any unfinished one
    pub fn begin(&mut self, phase: &str, total: usize) {
        if let Some(previous) = self.bar.take() {
            previous.finish_and_clear();
        }

        let bar = if self.visible {
            ProgressBar::new(total as u64)
        } else {
            ProgressBar::hidden()
        };
        bar.set_style(PHASE_STYLE.clone());
        bar.set_prefix(phase.to_string());
        self.bar = Some(bar);
    }

    /// Mark one item of the current phase as done
    pub fn advance(&self, item: &Path) {
        if let Some(ref bar) = self.bar {
            let name = item
                .file_name()
                .unwrap_or_default()
                .to_string_lossy()
                .to_string();
            bar.set_message(name);
            bar.inc(1);
        }
    }

    /// Items completed in the current phase
    pub fn position(&self) -> u64 {
        self.bar.as_ref().map_or(0, ProgressBar::position)
    }

    /// Close the current phase with a summary message
    pub fn finish(&mut self, message: &str) {
        if let Some(bar) = self.bar.take() {
            bar.finish_with_message(message.to_string());
        }
    }
}
