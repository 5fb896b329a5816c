use serde::{Deserialize, Serialize};

use crate::counts::{CategoryKey, ErrorBreakdown, SuccessCount};
use crate::error::StatsError;

/// Point-in-time copy of the statistics held by a [`Recorder`](crate::Recorder).
///
/// A snapshot keeps no reference back to the recorder that produced it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(
    try_from = "SnapshotRepr<K>",
    bound(
        serialize = "K: CategoryKey + Serialize",
        deserialize = "K: CategoryKey + Deserialize<'de>"
    )
)]
pub struct Snapshot<K: CategoryKey> {
    successes: SuccessCount,
    errors: ErrorBreakdown<K>,
}

impl<K: CategoryKey> Snapshot<K> {
    pub fn new(successes: SuccessCount, errors: ErrorBreakdown<K>) -> Self {
        Self { successes, errors }
    }

    /// Rebuilds a snapshot from parts that may be missing.
    pub fn from_parts(
        successes: Option<SuccessCount>,
        errors: Option<ErrorBreakdown<K>>,
    ) -> Result<Self, StatsError> {
        let successes = successes.ok_or(StatsError::MissingComponent("successes"))?;
        let errors = errors.ok_or(StatsError::MissingComponent("errors"))?;
        Ok(Self::new(successes, errors))
    }

    pub const fn empty() -> Self {
        Self {
            successes: SuccessCount::empty(),
            errors: ErrorBreakdown::empty(),
        }
    }

    pub fn merge_with(&self, other: &Snapshot<K>) -> Snapshot<K> {
        Self::new(
            self.successes.merge_with(&other.successes),
            self.errors.merge_with(&other.errors),
        )
    }

    #[inline]
    pub fn successes(&self) -> &SuccessCount {
        &self.successes
    }

    #[inline]
    pub fn errors(&self) -> &ErrorBreakdown<K> {
        &self.errors
    }

    #[inline]
    pub fn success_count(&self) -> u64 {
        self.successes.count()
    }

    /// Errors recorded without a category.
    #[inline]
    pub fn uncategorized_error_count(&self) -> u64 {
        self.errors.uncategorized_count()
    }

    /// All errors, categorized or not.
    #[inline]
    pub fn total_error_count(&self) -> u64 {
        self.errors.total_count()
    }

    pub fn error_count_for(&self, key: &K) -> u64 {
        self.errors.count_for(key)
    }

    pub fn event_count(&self) -> u64 {
        self.success_count().wrapping_add(self.total_error_count())
    }
}

impl<K: CategoryKey> Default for Snapshot<K> {
    fn default() -> Self {
        Self::empty()
    }
}

#[derive(Deserialize)]
#[serde(bound(deserialize = "K: CategoryKey + Deserialize<'de>"))]
struct SnapshotRepr<K: CategoryKey> {
    successes: Option<SuccessCount>,
    errors: Option<ErrorBreakdown<K>>,
}

impl<K: CategoryKey> TryFrom<SnapshotRepr<K>> for Snapshot<K> {
    type Error = StatsError;

    fn try_from(repr: SnapshotRepr<K>) -> Result<Self, Self::Error> {
        Self::from_parts(repr.successes, repr.errors)
    }
}
