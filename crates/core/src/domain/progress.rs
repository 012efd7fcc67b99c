use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::events::lenient;

/// Progress payload pushed by the server during a background update.
///
/// Every field is optional: the server may stream partial updates and only
/// send what changed. A field of the wrong type reads as absent instead of
/// rejecting the whole update. The same shape doubles as the aggregated snapshot.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressUpdate {
    #[serde(default, deserialize_with = "lenient")]
    pub repo: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub path: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub current_file: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub status: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub progress_percent: Option<f64>,
    #[serde(default, deserialize_with = "lenient")]
    pub files_processed: Option<u64>,
    #[serde(default, deserialize_with = "lenient")]
    pub files_total: Option<u64>,
    #[serde(default, deserialize_with = "lenient")]
    pub hashed_processed: Option<u64>,
    #[serde(default, deserialize_with = "lenient")]
    pub hashed_total: Option<u64>,
    #[serde(default, deserialize_with = "lenient")]
    pub unchanged_processed: Option<u64>,
    #[serde(default, deserialize_with = "lenient")]
    pub unchanged_total: Option<u64>,
    #[serde(default, deserialize_with = "lenient")]
    pub directories_processed: Option<u64>,
    #[serde(default, deserialize_with = "lenient")]
    pub directories_total: Option<u64>,
    #[serde(default, deserialize_with = "lenient")]
    pub deleted_processed: Option<u64>,
    #[serde(default, deserialize_with = "lenient")]
    pub deleted_total: Option<u64>,
    #[serde(default, deserialize_with = "lenient")]
    pub duration: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub eta: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub errors: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub mime_distribution: Option<BTreeMap<String, u64>>,
}

/// The single authoritative view of one in-flight operation
pub type ProgressSnapshot = ProgressUpdate;

macro_rules! overlay_fields {
    ($target:expr, $source:expr, $($field:ident),+ $(,)?) => {
        $(
            if let Some(value) = $source.$field {
                $target.$field = Some(value);
            }
        )+
    };
}

impl ProgressUpdate {
    /// Overwrite every field present in `update`, keep the rest
    pub fn overlay(&mut self, update: ProgressUpdate) {
        overlay_fields!(
            self,
            update,
            repo,
            path,
            current_file,
            status,
            progress_percent,
            files_processed,
            files_total,
            hashed_processed,
            hashed_total,
            unchanged_processed,
            unchanged_total,
            directories_processed,
            directories_total,
            deleted_processed,
            deleted_total,
            duration,
            eta,
            errors,
            mime_distribution,
        );
    }

    /// Percent clamped to [0, 100] and rounded. The stored value stays raw.
    pub fn display_percent(&self) -> Option<u16> {
        self.progress_percent
            .filter(|p| !p.is_nan())
            .map(|p| p.clamp(0.0, 100.0).round() as u16)
    }

    pub fn files(&self) -> Counter {
        Counter::new(self.files_processed, self.files_total)
    }

    pub fn hashed(&self) -> Counter {
        Counter::new(self.hashed_processed, self.hashed_total)
    }

    pub fn unchanged(&self) -> Counter {
        Counter::new(self.unchanged_processed, self.unchanged_total)
    }

    pub fn directories(&self) -> Counter {
        Counter::new(self.directories_processed, self.directories_total)
    }

    pub fn deleted(&self) -> Counter {
        Counter::new(self.deleted_processed, self.deleted_total)
    }
}

/// A processed/total pair for display
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Counter {
    pub processed: Option<u64>,
    pub total: Option<u64>,
}

impl Counter {
    pub fn new(processed: Option<u64>, total: Option<u64>) -> Self {
        Self { processed, total }
    }

    pub fn is_empty(&self) -> bool {
        self.processed.is_none() && self.total.is_none()
    }
}

impl std::fmt::Display for Counter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match (self.processed, self.total) {
            (Some(done), Some(total)) => write!(f, "{}/{}", done, total),
            (Some(done), None) => write!(f, "{}/?", done),
            (None, Some(total)) => write!(f, "-/{}", total),
            (None, None) => write!(f, "-"),
        }
    }
}

/// What an incoming progress payload did to the snapshot
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProgressTransition {
    /// No operation was being tracked
    Started,
    /// Same repo, fields overlaid
    Merged,
    /// The payload omitted `repo` and was overlaid onto whatever is active
    MergedWithoutRepo,
    /// A different repo took over; prior fields were discarded
    Replaced,
}

/// Holds at most one progress snapshot, partitioned by repo
#[derive(Debug, Default, Clone)]
pub struct ProgressAggregator {
    current: Option<ProgressSnapshot>,
}

impl ProgressAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn snapshot(&self) -> Option<&ProgressSnapshot> {
        self.current.as_ref()
    }

    pub fn apply(&mut self, update: ProgressUpdate) -> ProgressTransition {
        let transition = match (&self.current, update.repo.as_deref()) {
            (None, _) => ProgressTransition::Started,
            (Some(current), Some(repo)) if current.repo.as_deref() != Some(repo) => {
                ProgressTransition::Replaced
            }
            (Some(_), Some(_)) => ProgressTransition::Merged,
            (Some(_), None) => ProgressTransition::MergedWithoutRepo,
        };

        match (transition, self.current.as_mut()) {
            (ProgressTransition::Merged | ProgressTransition::MergedWithoutRepo, Some(current)) => {
                current.overlay(update);
            }
            _ => self.current = Some(update),
        }
        transition
    }

    /// Live counters stop meaning anything once an operation ends
    pub fn finish(&mut self) -> Option<ProgressSnapshot> {
        self.current.take()
    }
}
