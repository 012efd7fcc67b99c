use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// How long a toast stays up without interaction
pub const TOAST_LIFETIME_MS: i64 = 5_000;

/// Message used when neither the push payload nor the server response says what went wrong
pub const FALLBACK_ERROR_MESSAGE: &str = "An unknown error occurred";

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ErrorId(pub String);

impl ErrorId {
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }
}

impl std::fmt::Display for ErrorId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One entry in the error history
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorRecord {
    pub id: ErrorId,
    /// Unix milliseconds
    pub timestamp: i64,
    pub repo: Option<String>,
    pub message: String,
    pub read: bool,
}

/// The single transient notification
#[derive(Debug, Clone, PartialEq)]
pub struct Toast {
    pub record: ErrorId,
    pub expires_at: i64,
}

/// Durable error history plus at most one toast.
///
/// The log is ordered newest-first. Unread counts are always derived from the
/// log itself.
#[derive(Debug, Clone, Default)]
pub struct ErrorCenter {
    log: Vec<ErrorRecord>,
    toast: Option<Toast>,
    history_open: bool,
}

impl ErrorCenter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a failure and make it the active toast
    pub fn push(&mut self, repo: Option<String>, message: Option<String>, now: i64) -> &ErrorRecord {
        let message = message
            .map(|m| m.trim().to_string())
            .filter(|m| !m.is_empty())
            .unwrap_or_else(|| FALLBACK_ERROR_MESSAGE.to_string());

        let record = ErrorRecord {
            id: ErrorId::generate(),
            timestamp: now,
            repo,
            message,
            read: false,
        };
        self.toast = Some(Toast {
            record: record.id.clone(),
            expires_at: now + TOAST_LIFETIME_MS,
        });
        self.log.insert(0, record);
        &self.log[0]
    }

    pub fn records(&self) -> &[ErrorRecord] {
        &self.log
    }

    pub fn len(&self) -> usize {
        self.log.len()
    }

    pub fn is_empty(&self) -> bool {
        self.log.is_empty()
    }

    pub fn unread_count(&self) -> usize {
        self.log.iter().filter(|r| !r.read).count()
    }

    pub fn toast(&self) -> Option<&Toast> {
        self.toast.as_ref()
    }

    /// The record behind the active toast
    pub fn toast_record(&self) -> Option<&ErrorRecord> {
        let toast = self.toast.as_ref()?;
        self.log.iter().find(|r| r.id == toast.record)
    }

    pub fn next_deadline(&self) -> Option<i64> {
        self.toast.as_ref().map(|t| t.expires_at)
    }

    pub fn is_history_open(&self) -> bool {
        self.history_open
    }

    /// Clicking the toast body jumps to the full history
    pub fn click_toast(&mut self) {
        if self.toast.is_some() {
            self.open_history();
        }
    }

    pub fn dismiss_toast(&mut self) {
        self.toast = None;
    }

    /// Drop the toast once its deadline has passed. Returns true if it expired.
    pub fn expire(&mut self, now: i64) -> bool {
        match &self.toast {
            Some(toast) if now >= toast.expires_at => {
                self.toast = None;
                true
            }
            _ => false,
        }
    }

    /// Opening the history, however it happens, marks everything read
    pub fn open_history(&mut self) {
        self.history_open = true;
        self.toast = None;
        for record in &mut self.log {
            record.read = true;
        }
    }

    pub fn close_history(&mut self) {
        self.history_open = false;
    }

    pub fn clear_all(&mut self) {
        self.log.clear();
        self.toast = None;
    }

    /// Remove one record. Returns false if no record had that id.
    pub fn delete(&mut self, id: &ErrorId) -> bool {
        let before = self.log.len();
        self.log.retain(|r| &r.id != id);
        if self.toast.as_ref().is_some_and(|t| &t.record == id) {
            self.toast = None;
        }
        self.log.len() != before
    }

    /// Stop the toast timer without touching the log
    pub fn cancel_timers(&mut self) {
        self.toast = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_push_prepends_and_installs_toast() {
        let mut center = ErrorCenter::new();
        center.push(Some("photos".into()), Some("disk unreadable".into()), 1_000);
        center.push(Some("videos".into()), Some("permission denied".into()), 1_001);

        assert_eq!(center.len(), 2);
        assert_eq!(center.records()[0].message, "permission denied");
        assert_eq!(center.records()[1].message, "disk unreadable");
        assert_eq!(center.unread_count(), 2);

        let toast = center.toast_record().unwrap();
        assert_eq!(toast.repo.as_deref(), Some("videos"));
        assert_eq!(center.toast().unwrap().expires_at, 6_001);
    }

    #[test]
    fn test_n_errors_are_kept_newest_first() {
        let mut center = ErrorCenter::new();
        for i in 0..12 {
            center.push(None, Some(format!("failure {}", i)), i);
        }
        assert_eq!(center.len(), 12);
        let timestamps: Vec<_> = center.records().iter().map(|r| r.timestamp).collect();
        let mut sorted = timestamps.clone();
        sorted.sort_by(|a, b| b.cmp(a));
        assert_eq!(timestamps, sorted);
    }

    #[test]
    fn test_ids_are_unique() {
        let mut center = ErrorCenter::new();
        for _ in 0..100 {
            center.push(None, None, 0);
        }
        let ids: std::collections::HashSet<_> = center.records().iter().map(|r| r.id.clone()).collect();
        assert_eq!(ids.len(), 100);
    }

    #[test]
    fn test_fallback_message() {
        let mut center = ErrorCenter::new();
        assert_eq!(center.push(None, None, 0).message, FALLBACK_ERROR_MESSAGE);
        assert_eq!(center.push(None, Some("  ".into()), 0).message, FALLBACK_ERROR_MESSAGE);
    }

    #[test]
    fn test_new_error_resets_toast_deadline() {
        let mut center = ErrorCenter::new();
        center.push(None, Some("first".into()), 0);
        center.push(None, Some("second".into()), 4_000);

        assert!(!center.expire(5_000));
        assert_eq!(center.toast_record().unwrap().message, "second");
        assert!(center.expire(9_000));
    }

    #[test]
    fn test_untouched_toast_expires_without_side_effects() {
        let mut center = ErrorCenter::new();
        center.push(None, Some("boom".into()), 0);

        assert!(!center.expire(4_999));
        assert!(center.toast().is_some());
        assert!(center.expire(5_000));

        assert!(center.toast().is_none());
        assert_eq!(center.len(), 1);
        assert_eq!(center.unread_count(), 1);
        assert!(!center.is_history_open());
    }

    #[test]
    fn test_click_toast_marks_everything_read() {
        let mut center = ErrorCenter::new();
        center.push(None, Some("a".into()), 0);
        center.push(None, Some("b".into()), 1);
        center.click_toast();

        assert!(center.toast().is_none());
        assert!(center.is_history_open());
        assert_eq!(center.unread_count(), 0);
        assert!(center.records().iter().all(|r| r.read));
    }

    #[test]
    fn test_dismiss_leaves_read_flags_alone() {
        let mut center = ErrorCenter::new();
        center.push(None, Some("a".into()), 0);
        center.dismiss_toast();

        assert!(center.toast().is_none());
        assert_eq!(center.unread_count(), 1);
        assert!(!center.is_history_open());
    }

    #[test]
    fn test_open_history_zeroes_unread() {
        let mut center = ErrorCenter::new();
        center.open_history();
        assert_eq!(center.unread_count(), 0);

        center.close_history();
        center.push(None, Some("a".into()), 0);
        center.push(None, Some("b".into()), 0);
        assert_eq!(center.unread_count(), 2);

        center.open_history();
        assert_eq!(center.unread_count(), 0);
    }

    #[test]
    fn test_unread_tracks_new_records_after_reading() {
        let mut center = ErrorCenter::new();
        center.push(None, Some("a".into()), 0);
        center.open_history();
        center.push(None, Some("b".into()), 1);
        assert_eq!(center.unread_count(), 1);
    }

    #[test]
    fn test_delete_removes_exactly_one() {
        let mut center = ErrorCenter::new();
        center.push(None, Some("a".into()), 0);
        center.push(None, Some("b".into()), 1);
        center.push(None, Some("c".into()), 2);
        let middle = center.records()[1].id.clone();

        assert!(center.delete(&middle));
        assert_eq!(center.len(), 2);
        assert!(center.records().iter().all(|r| r.id != middle));
        assert!(!center.delete(&middle));
        assert!(center.toast().is_some(), "toast for 'c' is unaffected");
    }

    #[test]
    fn test_deleting_toasted_record_clears_toast() {
        let mut center = ErrorCenter::new();
        let id = center.push(None, Some("a".into()), 0).id.clone();
        center.delete(&id);
        assert!(center.toast().is_none());
    }

    #[test]
    fn test_clear_all() {
        let mut center = ErrorCenter::new();
        center.push(None, Some("a".into()), 0);
        center.push(None, Some("b".into()), 0);
        center.clear_all();

        assert!(center.is_empty());
        assert_eq!(center.unread_count(), 0);
        assert!(center.toast().is_none());
    }
}
