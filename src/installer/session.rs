//! Per-run install bookkeeping

use std::collections::HashSet;
use std::sync::{Mutex, MutexGuard};

/// State shared by every step of one boss invocation
///
/// `processed` is reset at the start of each install pass. `refreshed`
/// lives as long as the session, so a remote is fetched at most once per
/// run however many passes touch it.
#[derive(Debug, Default)]
pub struct InstallSession {
    processed: Mutex<HashSet<String>>,
    refreshed: Mutex<HashSet<String>>,
}

fn guard(set: &Mutex<HashSet<String>>) -> MutexGuard<'_, HashSet<String>> {
    set.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

impl InstallSession {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a new install pass
    pub fn begin(&self) {
        guard(&self.processed).clear();
    }

    /// Claim a dependency for this pass, false when already claimed
    pub fn mark_processed(&self, key: &str) -> bool {
        guard(&self.processed).insert(key.to_string())
    }

    pub fn is_processed(&self, key: &str) -> bool {
        guard(&self.processed).contains(key)
    }

    /// Claim the remote refresh of a dependency, false when already done
    pub fn mark_refreshed(&self, key: &str) -> bool {
        guard(&self.refreshed).insert(key.to_string())
    }
}
