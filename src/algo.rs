//! Sorting entry points.
//!
//! Every call runs the same engine: a most-significant-digit radix sort whose ranges are
//! either split across a pool of workers (parallel steps) or sorted by one worker with an
//! in-place radix stack (sequential jobs), with insertion sort for tiny ranges.
//!
//! The main entry points are [`RadixSorter`] and the free functions [`radix_sort`],
//! [`radix_sort_by_key`], [`radix_sort_strings`] and [`radix_sort_indices`], which use the
//! default configuration.

use crate::buffer::{DoubleBuffer, Span};
use crate::config::SortConfig;
use crate::context::{Context, Join, SortStats};
use crate::core::{
    AsBytes, Digits, FixedDigits, Indexed, KeyAccessor, KeyDigits, RadixKey, StringDigits,
};
use crate::error::Result;
use crate::lsd::sort_lsd;
use crate::small::insertion_sort;
use std::mem::MaybeUninit;
use std::thread;

/// A configured radix sorter.
///
/// The sorter only holds its configuration; worker threads live for the duration of a
/// single call.
///
/// # Examples
///
/// ```
/// use pradix::{RadixSorter, SortConfig};
///
/// let sorter = RadixSorter::new(SortConfig::default().with_worker_count(2)).unwrap();
///
/// let mut values = vec![5u32, 3, 1, 4, 1, 5, 9, 2, 6];
/// sorter.sort(&mut values);
/// assert_eq!(values, vec![1, 1, 2, 3, 4, 5, 5, 6, 9]);
///
/// let mut words = vec!["banana", "ban", "bandana", "apple"];
/// sorter.sort_strings(&mut words);
/// assert_eq!(words, vec!["apple", "ban", "banana", "bandana"]);
/// ```
#[derive(Clone, Debug, Default)]
pub struct RadixSorter {
    config: SortConfig,
}

impl RadixSorter {
    /// Creates a sorter.
    ///
    /// # Errors
    ///
    /// Returns [`SortError::InvalidParameter`](crate::SortError::InvalidParameter) if
    /// `config` does not validate.
    pub fn new(config: SortConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    #[must_use]
    pub fn config(&self) -> &SortConfig {
        &self.config
    }

    /// Sorts fixed-width keys in ascending order.
    pub fn sort<K: RadixKey + Send>(&self, data: &mut [K]) -> SortStats {
        self.sort_by_key(data, |k: &K| *k)
    }

    /// Sorts `data` by a fixed-width key extracted from every element.
    ///
    /// The order of elements with equal keys is unspecified.
    ///
    /// # Examples
    ///
    /// ```
    /// use pradix::RadixSorter;
    ///
    /// let mut points = vec![(3i16, 'c'), (-7, 'a'), (0, 'b')];
    /// RadixSorter::default().sort_by_key(&mut points, |p| p.0);
    /// assert_eq!(points, vec![(-7, 'a'), (0, 'b'), (3, 'c')]);
    /// ```
    pub fn sort_by_key<T, K, F>(&self, data: &mut [T], key: F) -> SortStats
    where
        T: Send,
        K: RadixKey,
        F: Fn(&T) -> K + Sync,
    {
        let digits = KeyDigits::new(key, self.config.digit_width);
        self.sort_with(data, &digits)
    }

    /// Sorts `data` by `key_width` digits produced by `extract(item, depth)`.
    ///
    /// Depth 0 is the most significant digit. Every digit must be below the radix of
    /// the configured [`DigitWidth`](crate::DigitWidth).
    ///
    /// # Examples
    ///
    /// ```
    /// use pradix::RadixSorter;
    ///
    /// // Sort by the second and then the first byte of each pair.
    /// let mut pairs = vec![[2u8, 1], [1, 9], [0, 1], [5, 0]];
    /// RadixSorter::default().sort_by_digits(&mut pairs, |p, depth| p[1 - depth] as usize, 2);
    /// assert_eq!(pairs, vec![[5, 0], [0, 1], [2, 1], [1, 9]]);
    /// ```
    pub fn sort_by_digits<T, F>(&self, data: &mut [T], extract: F, key_width: usize) -> SortStats
    where
        T: Send,
        F: Fn(&T, usize) -> usize + Sync,
    {
        if key_width == 0 {
            return SortStats::default();
        }
        let digits = FixedDigits::new(extract, key_width, self.config.digit_width);
        self.sort_with(data, &digits)
    }

    /// Sorts `data` by the digits of a custom [`Digits`] implementation.
    pub fn sort_with<T, D>(&self, data: &mut [T], digits: &D) -> SortStats
    where
        T: Send,
        D: Digits<T> + ?Sized,
    {
        run(&self.config, data, digits, 0)
    }

    /// Sorts byte strings lexicographically; a proper prefix sorts first.
    pub fn sort_strings<S: AsRef<[u8]> + Send>(&self, data: &mut [S]) -> SortStats {
        self.sort_strings_from(data, 0)
    }

    /// Sorts byte strings that all share their first `start_depth` bytes.
    ///
    /// Only the bytes from `start_depth` on are examined.
    pub fn sort_strings_from<S: AsRef<[u8]> + Send>(
        &self,
        data: &mut [S],
        start_depth: usize,
    ) -> SortStats {
        let digits = StringDigits::new(AsBytes, self.config.digit_width, start_depth);
        self.sort_with(data, &digits)
    }

    /// Returns the indices that order `keys` by their byte keys.
    ///
    /// The collection itself is not modified.
    ///
    /// # Examples
    ///
    /// ```
    /// use pradix::RadixSorter;
    ///
    /// let data = vec!["banana", "apple", "cherry"];
    /// let indices = RadixSorter::default().sort_indices(&data);
    ///
    /// assert_eq!(indices, vec![1, 0, 2]); // apple, banana, cherry
    /// ```
    pub fn sort_indices<A: KeyAccessor + Sync + ?Sized>(&self, keys: &A) -> Vec<usize> {
        let mut indices: Vec<usize> = (0..keys.len()).collect();
        let digits = StringDigits::new(Indexed(keys), self.config.digit_width, 0);
        self.sort_with(&mut indices, &digits);
        indices
    }

    /// Stable sort by a fixed-width key, one full pass per digit from the least
    /// significant one.
    ///
    /// # Examples
    ///
    /// ```
    /// use pradix::RadixSorter;
    ///
    /// let mut pairs = vec![(2u8, 'a'), (1, 'b'), (2, 'c'), (1, 'd')];
    /// RadixSorter::default().sort_lsd_by_key(&mut pairs, |p| p.0);
    /// assert_eq!(pairs, vec![(1, 'b'), (1, 'd'), (2, 'a'), (2, 'c')]);
    /// ```
    pub fn sort_lsd_by_key<T, K, F>(&self, data: &mut [T], key: F) -> SortStats
    where
        T: Send,
        K: RadixKey,
        F: Fn(&T) -> K + Sync,
    {
        let digits = KeyDigits::new(key, self.config.digit_width);
        sort_lsd(&self.config, data, &digits, digits.key_len())
    }
}

/// Runs the MSD engine over `data` from `depth` on.
fn run<T, D>(config: &SortConfig, data: &mut [T], digits: &D, depth: usize) -> SortStats
where
    T: Send,
    D: Digits<T> + ?Sized,
{
    let n = data.len();
    let mut stats = SortStats::default();
    if n <= 1 {
        return stats;
    }
    if n <= config.small_sort_threshold {
        insertion_sort(data, digits, depth);
        stats.base_sorts = 1;
        return stats;
    }

    let workers = config.worker_count;
    let mut shadow: Vec<MaybeUninit<T>> = Vec::new();
    if needs_shadow(config, n) {
        shadow.reserve_exact(n);
        shadow.resize_with(n, MaybeUninit::uninit);
    }

    let completed = {
        let ctx = Context::new(digits, DoubleBuffer::new(data, &mut shadow), config, n);
        log::debug!(
            "radix sort of {n} elements on {workers} workers, sequential threshold {}",
            ctx.sequential_threshold()
        );

        let completed = thread::scope(|s| {
            let ctx = &ctx;
            for w in 0..workers {
                let spawned = thread::Builder::new()
                    .name(format!("radix-worker-{w}"))
                    .spawn_scoped(s, move || ctx.work());
                if let Err(err) = spawned {
                    log::warn!("failed to spawn radix worker {w}: {err}");
                    ctx.queue.stop(w);
                    return false;
                }
            }

            let (tx, rx) = crossbeam_channel::bounded(1);
            let root = Join::root(tx);
            ctx.enqueue(Span::primary(0, n), depth, &root);
            root.release();
            let _ = rx.recv();
            ctx.queue.stop(workers);
            true
        });

        if completed {
            debug_assert_eq!(ctx.remaining(), 0);
            debug_assert_eq!(ctx.live_steps(), 0);
            stats = ctx.stats();
            log::debug!("radix sort of {n} elements finished: {stats:?}");
        }
        completed
    };

    if !completed {
        log::warn!("sorting {n} elements on the calling thread");
        data.sort_unstable_by(|a, b| digits.compare(a, b, depth));
    }
    stats
}

/// Whether a sort of `n` elements can create a parallel step, which is the only user
/// of the shadow buffer.
///
/// The remaining-size threshold never exceeds the total-size one, so checking the
/// whole input is enough.
fn needs_shadow(config: &SortConfig, n: usize) -> bool {
    config.worker_count > 1 && config.threshold_for(n) < n
}

/// Sorts fixed-width keys with the default configuration.
///
/// # Examples
///
/// ```
/// use pradix::radix_sort;
///
/// let mut data = vec![-3i64, 10, 0, -200];
/// radix_sort(&mut data);
/// assert_eq!(data, vec![-200, -3, 0, 10]);
/// ```
pub fn radix_sort<K: RadixKey + Send>(data: &mut [K]) {
    RadixSorter::default().sort(data);
}

/// Sorts `data` by a fixed-width key with the default configuration.
pub fn radix_sort_by_key<T, K, F>(data: &mut [T], key: F)
where
    T: Send,
    K: RadixKey,
    F: Fn(&T) -> K + Sync,
{
    RadixSorter::default().sort_by_key(data, key);
}

/// Sorts byte strings with the default configuration.
///
/// # Examples
///
/// ```
/// use pradix::radix_sort_strings;
///
/// let mut data = vec!["banana", "apple", "cherry", "date"];
/// radix_sort_strings(&mut data);
///
/// assert_eq!(data, vec!["apple", "banana", "cherry", "date"]);
/// ```
pub fn radix_sort_strings<S: AsRef<[u8]> + Send>(data: &mut [S]) {
    RadixSorter::default().sort_strings(data);
}

/// Returns the sorting permutation of `keys` with the default configuration.
pub fn radix_sort_indices<A: KeyAccessor + Sync + ?Sized>(keys: &A) -> Vec<usize> {
    RadixSorter::default().sort_indices(keys)
}
