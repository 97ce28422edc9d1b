//! Shared payload types exchanged between the CLI, the batch processor and
//! lookup backends.
//!
//! This module defines the record, range and outcome values every other
//! component agrees on, plus the run summary returned to the entry point.

use std::path::PathBuf;

use crate::config::FailurePolicy;

/// Label written when the catalog has no entry for an identifier.
pub const NO_CATEGORY_LABEL: &str = "No Category Found";
/// Label written when a catalog entry exists but carries no category.
pub const UNKNOWN_CATEGORY_LABEL: &str = "Unknown";

/// One input line split into fields. The first field is the identifier.
pub type Record = Vec<String>;

/// Result of one remote category query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LookupOutcome {
    /// A matching entry was found; carries its first category label.
    Found(String),
    /// The service answered but had no matching entry.
    NotFound,
    /// Network, status or payload failure. Retryable.
    TransientError(String),
}

impl LookupOutcome {
    /// Label to append for terminal outcomes, `None` when the attempt should be retried.
    pub fn label(&self) -> Option<&str> {
        match self {
            Self::Found(category) => Some(category.as_str()),
            Self::NotFound => Some(NO_CATEGORY_LABEL),
            Self::TransientError(_) => None,
        }
    }
}

/// Half-open `[start, end)` interval of zero-based record indices.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RowRange {
    pub start: usize,
    pub end: usize,
}

impl RowRange {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    /// Returns the range with `end` limited to `record_count`, and whether it changed.
    pub fn clamped_to(self, record_count: usize) -> (Self, bool) {
        if self.end > record_count {
            (
                Self {
                    start: self.start,
                    end: record_count,
                },
                true,
            )
        } else {
            (self, false)
        }
    }

    pub fn contains(&self, index: usize) -> bool {
        index >= self.start && index < self.end
    }
}

/// Operator-supplied inputs for one run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunParameters {
    pub source_path: PathBuf,
    pub dest_path: PathBuf,
    pub range: RowRange,
    /// Present only when the failure policy is `quarantine`.
    pub quarantine_path: Option<PathBuf>,
}

/// In-range record whose lookups never produced a terminal outcome.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FailedRecord {
    pub index: usize,
    pub identifier: String,
}

/// Totals reported when a run finishes without a structural failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunSummary {
    pub total_records: usize,
    /// Range after clamping to `total_records`.
    pub effective_range: RowRange,
    pub enriched: usize,
    pub passed_through: usize,
    pub failed: Vec<FailedRecord>,
    pub failure_policy: FailurePolicy,
}

impl RunSummary {
    /// True when no record exhausted its retries.
    pub fn is_clean(&self) -> bool {
        self.failed.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::{LookupOutcome, RowRange, NO_CATEGORY_LABEL};

    #[test]
    fn test_row_range_clamps_end_to_record_count() {
        let (range, adjusted) = RowRange::new(2, 50).clamped_to(10);
        assert_eq!(range, RowRange::new(2, 10));
        assert!(adjusted);

        let (range, adjusted) = RowRange::new(2, 5).clamped_to(10);
        assert_eq!(range, RowRange::new(2, 5));
        assert!(!adjusted);
    }

    #[test]
    fn test_row_range_is_half_open() {
        let range = RowRange::new(1, 3);
        assert!(!range.contains(0));
        assert!(range.contains(1));
        assert!(range.contains(2));
        assert!(!range.contains(3));
    }

    #[test]
    fn test_inverted_range_selects_nothing() {
        let range = RowRange::new(4, 2);
        assert!((0..10).all(|index| !range.contains(index)));
    }

    #[test]
    fn test_lookup_outcome_labels() {
        assert_eq!(
            LookupOutcome::Found("Fiction".to_string()).label(),
            Some("Fiction")
        );
        assert_eq!(LookupOutcome::NotFound.label(), Some(NO_CATEGORY_LABEL));
        assert_eq!(
            LookupOutcome::TransientError("timeout".to_string()).label(),
            None
        );
    }
}
