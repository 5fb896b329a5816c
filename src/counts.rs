//! Immutable success and error counts.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt::Debug;

use crate::error::{non_negative, StatsError};

/// Anything usable as an error category: ordered so breakdowns hash and
/// print deterministically, debuggable so new categories can be logged.
pub trait CategoryKey: Ord + Clone + Debug {}

impl<K: Ord + Clone + Debug> CategoryKey for K {}

/// Number of successes recorded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "RawCount", into = "u64")]
pub struct SuccessCount {
    count: u64,
}

impl SuccessCount {
    const EMPTY: SuccessCount = SuccessCount { count: 0 };

    pub fn for_count(count: i64) -> Result<Self, StatsError> {
        Ok(Self {
            count: non_negative("success count", count)?,
        })
    }

    #[inline]
    pub const fn empty() -> Self {
        Self::EMPTY
    }

    pub(crate) const fn from_raw(count: u64) -> Self {
        Self { count }
    }

    /// Sums both counts. Overflow is not guarded against.
    pub fn merge_with(&self, other: &SuccessCount) -> SuccessCount {
        Self::from_raw(self.count.wrapping_add(other.count))
    }

    #[inline]
    pub fn count(&self) -> u64 {
        self.count
    }
}

impl TryFrom<RawCount> for SuccessCount {
    type Error = StatsError;

    fn try_from(count: RawCount) -> Result<Self, Self::Error> {
        Ok(Self::from_raw(count.non_negative("success count")?))
    }
}

impl From<SuccessCount> for u64 {
    fn from(value: SuccessCount) -> Self {
        value.count
    }
}

/// Errors recorded, split into an uncategorized count and per-category counts.
///
/// The category map is owned by the breakdown: constructors copy the caller's
/// map and [`ErrorBreakdown::by_category`] only hands out a shared borrow.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(
    try_from = "BreakdownRepr<K>",
    bound(
        serialize = "K: CategoryKey + Serialize",
        deserialize = "K: CategoryKey + Deserialize<'de>"
    )
)]
pub struct ErrorBreakdown<K: CategoryKey> {
    uncategorized: u64,
    by_category: BTreeMap<K, u64>,
}

impl<K: CategoryKey> ErrorBreakdown<K> {
    pub const fn empty() -> Self {
        Self {
            uncategorized: 0,
            by_category: BTreeMap::new(),
        }
    }

    /// Uncategorized-only breakdown.
    pub fn for_failure_count(uncategorized: i64) -> Result<Self, StatsError> {
        Ok(Self::from_raw(
            non_negative("uncategorized error count", uncategorized)?,
            BTreeMap::new(),
        ))
    }

    pub fn for_failures(
        uncategorized: i64,
        by_category: &BTreeMap<K, u64>,
    ) -> Result<Self, StatsError> {
        let uncategorized = non_negative("uncategorized error count", uncategorized)?;
        Ok(Self::from_raw(uncategorized, by_category.clone()))
    }

    pub(crate) fn from_raw(uncategorized: u64, by_category: BTreeMap<K, u64>) -> Self {
        Self {
            uncategorized,
            by_category,
        }
    }

    /// Sums the uncategorized counts and each category key-wise.
    /// Overflow is not guarded against.
    pub fn merge_with(&self, other: &ErrorBreakdown<K>) -> ErrorBreakdown<K> {
        let mut by_category = self.by_category.clone();
        for (key, count) in &other.by_category {
            let entry = by_category.entry(key.clone()).or_insert(0);
            *entry = entry.wrapping_add(*count);
        }
        Self::from_raw(
            self.uncategorized.wrapping_add(other.uncategorized),
            by_category,
        )
    }

    #[inline]
    pub fn uncategorized_count(&self) -> u64 {
        self.uncategorized
    }

    #[inline]
    pub fn by_category(&self) -> &BTreeMap<K, u64> {
        &self.by_category
    }

    pub fn count_for(&self, key: &K) -> u64 {
        self.by_category.get(key).copied().unwrap_or(0)
    }

    pub fn category_count(&self) -> usize {
        self.by_category.len()
    }

    pub fn total_count(&self) -> u64 {
        self.by_category
            .values()
            .fold(self.uncategorized, |total, count| total.wrapping_add(*count))
    }
}

impl<K: CategoryKey> Default for ErrorBreakdown<K> {
    fn default() -> Self {
        Self::empty()
    }
}

/// A count as read from serialized input: anything up to `u64::MAX`, or a
/// negative value that validation rejects.
#[derive(Deserialize)]
#[serde(untagged)]
enum RawCount {
    Unsigned(u64),
    Signed(i64),
}

impl RawCount {
    fn non_negative(self, field: &'static str) -> Result<u64, StatsError> {
        match self {
            RawCount::Unsigned(count) => Ok(count),
            RawCount::Signed(count) => non_negative(field, count),
        }
    }
}

#[derive(Deserialize)]
struct BreakdownRepr<K: Ord> {
    uncategorized: RawCount,
    by_category: Option<BTreeMap<K, u64>>,
}

impl<K: CategoryKey> TryFrom<BreakdownRepr<K>> for ErrorBreakdown<K> {
    type Error = StatsError;

    fn try_from(repr: BreakdownRepr<K>) -> Result<Self, Self::Error> {
        let by_category = repr.by_category.ok_or(StatsError::MissingCategoryMap)?;
        let uncategorized = repr.uncategorized.non_negative("uncategorized error count")?;
        Ok(Self::from_raw(uncategorized, by_category))
    }
}
