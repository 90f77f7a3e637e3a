//! Digit histograms and the prefix sums that turn them into write offsets.
//!
//! A radix step counts digits first, then plans where every bucket goes:
//! - sequentially, a prefix sum over just the digits that occur gives bucket starts;
//! - in parallel, every part has its own histogram and the "snake" scan orders the write
//!   regions by digit first and part second, so that part 0's region for digit `d`
//!   directly follows part `P-1`'s region for digit `d-1`.

use crate::core::Digits;

/// Per-part counting state: one histogram plus the digit of every counted element.
///
/// After planning, `counts` holds the part's write cursors instead of its counts.
#[derive(Debug, Default)]
pub(crate) struct PartScratch {
    pub counts: Vec<usize>,
    pub digits: Vec<u32>,
}

impl PartScratch {
    /// Counts the digits of `items` at `depth`, caching every digit for the scatter pass.
    pub fn count<T, D: Digits<T> + ?Sized>(&mut self, digits: &D, items: &[T], depth: usize) {
        self.digits.clear();
        self.digits
            .extend(items.iter().map(|item| digits.digit(item, depth) as u32));

        self.counts.clear();
        self.counts.resize(digits.buckets(), 0);
        for &d in &self.digits {
            self.counts[d as usize] += 1;
        }
    }

    /// Drops the scratch buffers.
    pub fn release(&mut self) {
        self.counts = Vec::new();
        self.digits = Vec::new();
    }
}

/// A non-empty bucket of a sequential partition, relative to the partitioned range.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct Bucket {
    pub digit: u32,
    pub start: usize,
    pub len: usize,
}

/// Counting state of a sequential job.
///
/// Only the digits that occur are visited, so planning a range costs time linear in the
/// range instead of in the number of buckets. `cursors` is kept all zero between plans.
#[derive(Debug, Default)]
pub(crate) struct SparseHistogram {
    pub cursors: Vec<usize>,
    pub digits: Vec<u32>,
    present: Vec<u32>,
}

impl SparseHistogram {
    /// Counts the digits of `items` at `depth` and returns the non-empty buckets in
    /// digit order.
    ///
    /// Afterwards `cursors[d]` is the start of bucket `d` and `digits` caches the digit of
    /// every item. Call [`SparseHistogram::reset`] with the plan once the cursors are used.
    pub fn plan<T, D: Digits<T> + ?Sized>(
        &mut self,
        digits: &D,
        items: &[T],
        depth: usize,
    ) -> Vec<Bucket> {
        self.digits.clear();
        self.digits
            .extend(items.iter().map(|item| digits.digit(item, depth) as u32));

        let buckets = digits.buckets();
        if self.cursors.len() != buckets {
            self.cursors.clear();
            self.cursors.resize(buckets, 0);
        }

        self.present.clear();
        for &d in &self.digits {
            let count = &mut self.cursors[d as usize];
            if *count == 0 {
                self.present.push(d);
            }
            *count += 1;
        }
        self.present.sort_unstable();

        let mut start = 0;
        let mut plan = Vec::with_capacity(self.present.len());
        for &digit in &self.present {
            let len = std::mem::replace(&mut self.cursors[digit as usize], start);
            plan.push(Bucket { digit, start, len });
            start += len;
        }
        plan
    }

    /// Zeroes the cursors touched by `plan`.
    pub fn reset(&mut self, plan: &[Bucket]) {
        for bucket in plan {
            self.cursors[bucket.digit as usize] = 0;
        }
    }
}

/// Snake scan over per-part histograms.
///
/// Rewrites every table in place from counts to write cursors and returns the bucket
/// boundaries (length `buckets + 1`). Panics if the counts do not add up to `expected`.
pub(crate) fn snake_scan(tables: &mut [&mut [usize]], expected: usize) -> Vec<usize> {
    let buckets = tables.first().map_or(0, |t| t.len());
    debug_assert!(tables.iter().all(|t| t.len() == buckets));

    let mut bounds = Vec::with_capacity(buckets + 1);
    let mut sum = 0;
    for d in 0..buckets {
        bounds.push(sum);
        for table in tables.iter_mut() {
            let count = table[d];
            table[d] = sum;
            sum += count;
        }
    }
    bounds.push(sum);

    assert_eq!(sum, expected, "digit counts do not cover the range");
    bounds
}
