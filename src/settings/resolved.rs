use std::path::PathBuf;

use bedscan::{ScanTuning, SearchRequest};

use crate::cli::OutputFormat;

/// Which engine the workflow binds.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum EngineChoice {
    Scan(ScanTuning),
    Native(PathBuf),
}

/// Application-ready configuration derived from user input, config files and
/// defaults.
#[derive(Debug)]
pub(crate) struct ResolvedConfig {
    /// Seed exactly as the user wrote it.
    pub(crate) seed_text: String,
    pub(crate) request: SearchRequest,
    pub(crate) range: i32,
    pub(crate) engine: EngineChoice,
    pub(crate) format: OutputFormat,
    /// `None` leaves the decision to whether stdout is a terminal.
    pub(crate) view: Option<bool>,
}

impl ResolvedConfig {
    /// Print a human readable summary of the effective configuration.
    pub(crate) fn print_summary(&self) {
        for line in self.summary_lines() {
            println!("{line}");
        }
    }

    fn summary_lines(&self) -> Vec<String> {
        let mut lines = vec![
            "Effective configuration:".to_string(),
            format!("  Seed: {} ({})", self.seed_text, self.request.seed),
            format!("  Floor: {}", self.request.floor),
            format!("  Range: {}", self.range),
            format!("  From: {}", self.request.min),
            format!("  To: {}", self.request.max),
        ];
        match &self.engine {
            EngineChoice::Scan(tuning) => {
                lines.push("  Engine: scan".to_string());
                lines.push(format!("  Columns per step: {}", tuning.columns_per_step));
                lines.push(format!("  Density: {}", tuning.density));
            }
            EngineChoice::Native(path) => {
                lines.push("  Engine: native".to_string());
                lines.push(format!("  Library: {}", path.display()));
            }
        }
        lines.push(format!("  Output: {}", self.format.as_str()));
        lines.push(format!(
            "  Live view: {}",
            match self.view {
                Some(true) => "on",
                Some(false) => "off",
                None => "(auto)",
            }
        ));
        lines
    }
}
