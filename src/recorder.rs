use log::debug;
use parking_lot::RwLock;
use std::collections::BTreeMap;
use std::sync::Arc;

use crate::counts::{CategoryKey, ErrorBreakdown, SuccessCount};
use crate::snapshot::Snapshot;

struct Counts<K> {
    successes: u64,
    uncategorized: u64,
    by_category: BTreeMap<K, u64>,
}

/// Thread-safe recorder of task outcomes.
///
/// Counters wrap on overflow, the same as [`Snapshot::merge_with`].
///
/// Every record call takes the write lock and [`Recorder::take_snapshot`]
/// takes the read lock, so a snapshot always reflects a whole number of
/// recorded events.
///
/// The category map is unbounded: each distinct key passed to
/// [`Recorder::record_error`] stays for the life of the recorder. Keys should
/// come from a small, fixed classification (an error kind, not a message).
pub struct Recorder<K: CategoryKey> {
    counts: Arc<RwLock<Counts<K>>>,
}

impl<K: CategoryKey> Recorder<K> {
    pub fn new() -> Self {
        Self {
            counts: Arc::new(RwLock::new(Counts {
                successes: 0,
                uncategorized: 0,
                by_category: BTreeMap::new(),
            })),
        }
    }

    /// Starts from the values in `seed`; an immediate snapshot equals it.
    pub fn seeded(seed: &Snapshot<K>) -> Self {
        Self {
            counts: Arc::new(RwLock::new(Counts {
                successes: seed.success_count(),
                uncategorized: seed.uncategorized_error_count(),
                by_category: seed.errors().by_category().clone(),
            })),
        }
    }

    #[inline]
    pub fn record_success(&self) {
        let mut counts = self.counts.write();
        counts.successes = counts.successes.wrapping_add(1);
    }

    #[inline]
    pub fn record_uncategorized_error(&self) {
        let mut counts = self.counts.write();
        counts.uncategorized = counts.uncategorized.wrapping_add(1);
    }

    pub fn record_error(&self, category: K) {
        let mut counts = self.counts.write();
        let count = counts.by_category.entry(category).or_insert_with_key(|key| {
            debug!("recording first error in category {:?}", key);
            0
        });
        *count = count.wrapping_add(1);
    }

    pub fn take_snapshot(&self) -> Snapshot<K> {
        let counts = self.counts.read();
        Snapshot::new(
            SuccessCount::from_raw(counts.successes),
            ErrorBreakdown::from_raw(counts.uncategorized, counts.by_category.clone()),
        )
    }

    pub fn distinct_categories(&self) -> usize {
        self.counts.read().by_category.len()
    }

    /// Another handle onto the same counters.
    pub fn clone_handle(&self) -> Self {
        Self {
            counts: Arc::clone(&self.counts),
        }
    }
}

impl<K: CategoryKey> Default for Recorder<K> {
    fn default() -> Self {
        Self::new()
    }
}
