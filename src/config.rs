//! Sorter configuration.

use crate::core::DigitWidth;
use crate::error::{Result, SortError};

/// Default insertion-sort cutover.
pub const SMALL_SORT_THRESHOLD: usize = 32;

/// What the derived sequential threshold is computed from.
///
/// The threshold is `max(small_sort_threshold, size / worker_count)`. Ranges above it are
/// split across workers, ranges at or below it are sorted by a single worker.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum ThresholdPolicy {
    /// Size of the whole input. Deterministic for a given input length.
    #[default]
    TotalSize,
    /// Number of elements not yet in their final position. Shrinks as buckets resolve,
    /// so late ranges are handed to single workers sooner.
    RemainingSize,
}

/// Tunable options of a [`RadixSorter`](crate::RadixSorter).
///
/// # Examples
///
/// ```
/// use pradix::{DigitWidth, SortConfig, ThresholdPolicy};
///
/// let config = SortConfig::default()
///     .with_worker_count(4)
///     .with_digit_width(DigitWidth::Short)
///     .with_threshold_policy(ThresholdPolicy::RemainingSize);
/// assert!(config.validate().is_ok());
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SortConfig {
    /// Number of worker threads.
    pub worker_count: usize,
    /// Fixed sequential threshold. `None` derives it from [`ThresholdPolicy`].
    pub sequential_threshold: Option<usize>,
    /// Ranges shorter than this are sorted by comparison instead of radix steps.
    pub small_sort_threshold: usize,
    /// Digit width used by radix steps.
    pub digit_width: DigitWidth,
    /// Base of the derived sequential threshold.
    pub threshold_policy: ThresholdPolicy,
    /// Lets sequential jobs hand unprocessed buckets to idle workers.
    pub work_sharing: bool,
}

impl Default for SortConfig {
    fn default() -> Self {
        Self {
            worker_count: std::thread::available_parallelism().map_or(1, |n| n.get()),
            sequential_threshold: None,
            small_sort_threshold: SMALL_SORT_THRESHOLD,
            digit_width: DigitWidth::default(),
            threshold_policy: ThresholdPolicy::default(),
            work_sharing: true,
        }
    }
}

impl SortConfig {
    #[must_use]
    pub fn with_worker_count(mut self, worker_count: usize) -> Self {
        self.worker_count = worker_count;
        self
    }

    #[must_use]
    pub fn with_sequential_threshold(mut self, threshold: usize) -> Self {
        self.sequential_threshold = Some(threshold);
        self
    }

    #[must_use]
    pub fn with_small_sort_threshold(mut self, threshold: usize) -> Self {
        self.small_sort_threshold = threshold;
        self
    }

    #[must_use]
    pub fn with_digit_width(mut self, width: DigitWidth) -> Self {
        self.digit_width = width;
        self
    }

    /// Sets the digit width from a bit count.
    ///
    /// # Errors
    ///
    /// Returns [`SortError::UnsupportedDigitWidth`] unless `bits` is 4, 8 or 16.
    pub fn with_digit_bits(self, bits: u32) -> Result<Self> {
        Ok(self.with_digit_width(DigitWidth::from_bits(bits)?))
    }

    #[must_use]
    pub fn with_threshold_policy(mut self, policy: ThresholdPolicy) -> Self {
        self.threshold_policy = policy;
        self
    }

    #[must_use]
    pub fn with_work_sharing(mut self, enabled: bool) -> Self {
        self.work_sharing = enabled;
        self
    }

    /// Checks the configuration.
    ///
    /// # Errors
    ///
    /// Returns [`SortError::InvalidParameter`] for a zero worker count or a zero
    /// sequential threshold.
    pub fn validate(&self) -> Result<()> {
        if self.worker_count == 0 {
            return Err(SortError::InvalidParameter {
                parameter: "worker_count",
                reason: "must be >= 1".to_string(),
            });
        }
        if self.sequential_threshold == Some(0) {
            return Err(SortError::InvalidParameter {
                parameter: "sequential_threshold",
                reason: "must be >= 1".to_string(),
            });
        }
        Ok(())
    }

    /// Sequential threshold for a base size of `size` elements.
    pub(crate) fn threshold_for(&self, size: usize) -> usize {
        match self.sequential_threshold {
            Some(fixed) => fixed,
            None => self.small_sort_threshold.max(1).max(size / self.worker_count),
        }
    }
}
