//! Append-only audit trail of authorization decisions.

use crate::models::AccessLogEntry;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::Mutex;

/// Bounded ring buffer of audit entries. Appends evict the oldest entry once
/// capacity is reached, so memory stays bounded under sustained load; the
/// total counter keeps counting across evictions.
#[derive(Debug)]
pub struct AccessLog {
    entries: Mutex<VecDeque<AccessLogEntry>>,
    capacity: usize,
    total: AtomicU64,
}

impl AccessLog {
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: Mutex::new(VecDeque::with_capacity(capacity)),
            capacity,
            total: AtomicU64::new(0),
        }
    }

    /// Append is the only mutation; entries are never edited or removed
    /// within the retained window.
    pub async fn append(&self, entry: AccessLogEntry) {
        self.total.fetch_add(1, Ordering::Relaxed);

        let mut entries = self.entries.lock().await;
        if entries.len() == self.capacity {
            entries.pop_front();
        }
        entries.push_back(entry);
    }

    /// Most recent `limit` entries, newest first.
    pub async fn recent(&self, limit: usize) -> Vec<AccessLogEntry> {
        let entries = self.entries.lock().await;
        entries.iter().rev().take(limit).cloned().collect()
    }

    /// Historical count of appended entries, including evicted ones.
    pub fn total(&self) -> u64 {
        self.total.load(Ordering::Relaxed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{AccessAction, AccessOutcome};

    fn entry(identity: &str) -> AccessLogEntry {
        AccessLogEntry::new(
            AccessAction::IdentityCheck,
            identity,
            AccessOutcome::Authorized,
            "test",
        )
    }

    #[tokio::test]
    async fn recent_returns_newest_first() {
        let log = AccessLog::new(10);
        log.append(entry("first")).await;
        log.append(entry("second")).await;
        log.append(entry("third")).await;

        let recent = log.recent(2).await;
        assert_eq!(recent.len(), 2);
        assert_eq!(recent[0].identity, "third");
        assert_eq!(recent[1].identity, "second");
    }

    #[tokio::test]
    async fn capacity_evicts_oldest_but_total_keeps_counting() {
        let log = AccessLog::new(3);
        for i in 0..5 {
            log.append(entry(&format!("id-{i}"))).await;
        }

        let recent = log.recent(10).await;
        assert_eq!(recent.len(), 3);
        assert_eq!(recent[0].identity, "id-4");
        assert_eq!(recent[2].identity, "id-2");
        assert_eq!(log.total(), 5);
    }

    #[tokio::test]
    async fn window_bounds_the_response() {
        let log = AccessLog::new(100);
        for i in 0..51 {
            log.append(entry(&format!("id-{i}"))).await;
        }

        let recent = log.recent(50).await;
        assert_eq!(recent.len(), 50);
        assert_eq!(recent[0].identity, "id-50");
    }

    #[tokio::test]
    async fn concurrent_appends_are_all_counted() {
        let log = std::sync::Arc::new(AccessLog::new(1000));
        let mut handles = Vec::new();
        for i in 0..20 {
            let log = log.clone();
            handles.push(tokio::spawn(async move {
                for j in 0..10 {
                    log.append(entry(&format!("id-{i}-{j}"))).await;
                }
            }));
        }
        for handle in handles {
            handle.await.expect("append task panicked");
        }
        assert_eq!(log.total(), 200);
        assert_eq!(log.recent(1000).await.len(), 200);
    }
}
