use std::sync::atomic::{AtomicU64, Ordering};

/// Thread-safe counters describing store activity.
#[derive(Default)]
pub struct ServiceMetrics {
    legacy_reads: AtomicU64,
    legacy_updates: AtomicU64,
    documents_written: AtomicU64,
}

impl ServiceMetrics {
    /// Create an empty metrics accumulator.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one read against the legacy flat file.
    pub fn record_legacy_read(&self) {
        self.legacy_reads.fetch_add(1, Ordering::Relaxed);
    }

    /// Record one successful rewrite of the legacy flat file.
    pub fn record_legacy_update(&self) {
        self.legacy_updates.fetch_add(1, Ordering::Relaxed);
    }

    /// Record documents written to the document store.
    pub fn record_documents_written(&self, count: u64) {
        self.documents_written.fetch_add(count, Ordering::Relaxed);
    }

    /// Return a snapshot of the current counters.
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            legacy_reads: self.legacy_reads.load(Ordering::Relaxed),
            legacy_updates: self.legacy_updates.load(Ordering::Relaxed),
            documents_written: self.documents_written.load(Ordering::Relaxed),
        }
    }
}

/// Immutable view of the service counters used for reporting.
#[derive(Debug, Clone, Copy, serde::Serialize)]
pub struct MetricsSnapshot {
    /// Reads served from the legacy flat file since startup.
    pub legacy_reads: u64,
    /// Legacy flat-file rewrites applied since startup.
    pub legacy_updates: u64,
    /// Documents written to the document store since startup.
    pub documents_written: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn records_store_activity() {
        let metrics = ServiceMetrics::new();
        metrics.record_legacy_read();
        metrics.record_legacy_read();
        metrics.record_legacy_update();
        metrics.record_documents_written(3);

        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.legacy_reads, 2);
        assert_eq!(snapshot.legacy_updates, 1);
        assert_eq!(snapshot.documents_written, 3);
    }

    #[test]
    fn snapshot_starts_at_zero() {
        let metrics = ServiceMetrics::new();
        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.legacy_reads, 0);
        assert_eq!(snapshot.legacy_updates, 0);
        assert_eq!(snapshot.documents_written, 0);
    }
}
