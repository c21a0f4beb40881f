// ABOUTME: Batch result tracking for the mdslides application
// ABOUTME: Counts successes and failures across a per-file conversion loop

use crate::errors::Result;
use log::{error, info};
use std::path::{Path, PathBuf};

/// Outcome of a batch conversion.
#[derive(Debug, Default)]
pub struct ConversionSummary {
    pub outputs: Vec<PathBuf>,
    pub failures: Vec<(PathBuf, String)>,
}

impl ConversionSummary {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the result of converting `input`, logging it with the file name.
    pub fn record(&mut self, input: &Path, result: Result<PathBuf>) {
        let name = display_name(input);
        match result {
            Ok(output) => {
                info!("✓ Converted: {} -> {}", name, display_name(&output));
                self.outputs.push(output);
            }
            Err(e) => {
                error!("✗ Error converting {}: {}", name, e);
                self.failures.push((input.to_path_buf(), e.to_string()));
            }
        }
    }

    pub fn total(&self) -> usize {
        self.outputs.len() + self.failures.len()
    }

    pub fn succeeded(&self) -> usize {
        self.outputs.len()
    }

    /// Every discovered file converted, and there was at least one.
    pub fn is_complete(&self) -> bool {
        self.total() > 0 && self.failures.is_empty()
    }

    pub fn summary_line(&self) -> String {
        format!(
            "Conversion completed: {}/{} files successful",
            self.succeeded(),
            self.total()
        )
    }
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.to_string_lossy().into_owned())
}
