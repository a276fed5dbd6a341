//! Process-wide punishment counters.

use std::sync::atomic::{AtomicU64, Ordering};

use crate::check::CheckKind;

/// Number of kicks and bans issued, per check kind.
#[derive(Debug, Default)]
pub struct KickStats {
    counts: [AtomicU64; CheckKind::ALL.len()],
}

impl KickStats {
    /// Counts one punishment issued by `kind`.
    pub fn record(&self, kind: CheckKind) {
        self.counts[Self::slot(kind)].fetch_add(1, Ordering::Relaxed);
    }

    /// Punishments issued by `kind` so far.
    pub fn get(&self, kind: CheckKind) -> u64 {
        self.counts[Self::slot(kind)].load(Ordering::Relaxed)
    }

    /// Punishments issued by all checks.
    pub fn total(&self) -> u64 {
        self.counts.iter().map(|c| c.load(Ordering::Relaxed)).sum()
    }

    const fn slot(kind: CheckKind) -> usize {
        match kind {
            CheckKind::InvalidMove => 0,
        }
    }
}
