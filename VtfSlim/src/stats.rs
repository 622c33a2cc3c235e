//! Process-wide session counters
//!
//! Informational only: nothing reads these to make a decision.

use std::sync::atomic::{AtomicI64, AtomicUsize, Ordering};

use serde::Serialize;

static FILES_PROCESSED: AtomicUsize = AtomicUsize::new(0);
static FILES_REMOVED: AtomicUsize = AtomicUsize::new(0);
static BYTES_SAVED: AtomicI64 = AtomicI64::new(0);

/// Snapshot of the session counters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct SessionStats {
    pub files_processed: usize,
    pub files_removed: usize,
    /// Negative when outputs grew
    pub bytes_saved: i64,
}

/// Record one processed file and its size change.
pub fn record_file(input_size: u64, output_size: u64) {
    FILES_PROCESSED.fetch_add(1, Ordering::Relaxed);
    BYTES_SAVED.fetch_add(input_size as i64 - output_size as i64, Ordering::Relaxed);
}

/// Record one deleted file of `size` bytes.
pub fn record_removed(size: u64) {
    FILES_REMOVED.fetch_add(1, Ordering::Relaxed);
    BYTES_SAVED.fetch_add(size as i64, Ordering::Relaxed);
}

#[must_use]
pub fn snapshot() -> SessionStats {
    SessionStats {
        files_processed: FILES_PROCESSED.load(Ordering::Relaxed),
        files_removed: FILES_REMOVED.load(Ordering::Relaxed),
        bytes_saved: BYTES_SAVED.load(Ordering::Relaxed),
    }
}

/// Zero every counter. Called once at process start.
pub fn reset() {
    FILES_PROCESSED.store(0, Ordering::Relaxed);
    FILES_REMOVED.store(0, Ordering::Relaxed);
    BYTES_SAVED.store(0, Ordering::Relaxed);
}

#[cfg(test)]
mod tests {
    use super::*;

    // Other tests record concurrently, so only check monotonic growth.
    #[test]
    fn test_counters_accumulate() {
        let before = snapshot();
        record_file(100, 40);
        record_removed(10);
        let after = snapshot();
        assert!(after.files_processed > before.files_processed);
        assert!(after.files_removed > before.files_removed);
    }
}
