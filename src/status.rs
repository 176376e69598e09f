use std::fmt;

use serde::Serialize;

/// User-visible state of the most recent search activity.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
#[serde(tag = "state", rename_all = "lowercase")]
pub enum SearchStatus {
    /// Nothing has been published yet.
    #[default]
    Idle,
    /// A session is running; `fraction` is the engine's progress in `[0, 1]`.
    Searching { fraction: f64 },
    Done,
}

impl SearchStatus {
    /// Build a running status, clamping the engine's fraction into `[0, 1]`.
    #[must_use]
    pub fn searching(fraction: f64) -> Self {
        let fraction = if fraction.is_nan() {
            0.0
        } else {
            fraction.clamp(0.0, 1.0)
        };
        Self::Searching { fraction }
    }

    #[must_use]
    pub fn percent(&self) -> Option<f64> {
        match self {
            Self::Searching { fraction } => Some(fraction * 100.0),
            Self::Done => Some(100.0),
            Self::Idle => None,
        }
    }
}

impl fmt::Display for SearchStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Idle => Ok(()),
            Self::Searching { fraction } => write!(f, "Searching... ({:.2}%)", fraction * 100.0),
            Self::Done => f.write_str("Done"),
        }
    }
}

/// Where sessions publish their progress.
pub trait StatusSurface {
    fn publish(&mut self, status: SearchStatus);
}

/// Status surface that keeps the latest status.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StatusLine {
    current: SearchStatus,
    updates: usize,
}

impl StatusLine {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn current(&self) -> SearchStatus {
        self.current
    }

    /// How many times the status has been published.
    #[must_use]
    pub fn updates(&self) -> usize {
        self.updates
    }

    #[must_use]
    pub fn text(&self) -> String {
        self.current.to_string()
    }
}

impl StatusSurface for StatusLine {
    fn publish(&mut self, status: SearchStatus) {
        self.current = status;
        self.updates += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn formats_percentages_with_two_decimals() {
        assert_eq!(SearchStatus::searching(0.0).to_string(), "Searching... (0.00%)");
        assert_eq!(SearchStatus::searching(0.5).to_string(), "Searching... (50.00%)");
        assert_eq!(SearchStatus::searching(0.12346).to_string(), "Searching... (12.35%)");
        assert_eq!(SearchStatus::Done.to_string(), "Done");
        assert_eq!(SearchStatus::Idle.to_string(), "");
    }

    #[test]
    fn clamps_out_of_range_fractions() {
        assert_eq!(SearchStatus::searching(1.5).percent(), Some(100.0));
        assert_eq!(SearchStatus::searching(-0.5).percent(), Some(0.0));
        assert_eq!(SearchStatus::searching(f64::NAN).percent(), Some(0.0));
    }

    #[test]
    fn status_line_tracks_latest_update() {
        let mut line = StatusLine::new();
        assert_eq!(line.text(), "");
        line.publish(SearchStatus::searching(0.25));
        line.publish(SearchStatus::Done);
        assert_eq!(line.current(), SearchStatus::Done);
        assert_eq!(line.updates(), 2);
    }
}
