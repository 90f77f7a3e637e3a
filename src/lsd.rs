//! Stable least-significant-digit sort for fixed-width keys.
//!
//! Every pass partitions the whole input by one digit, from the last digit to the first.
//! Parts are counted and scattered in parallel on one rayon pool per call, sized to the
//! number of parts; the snake scan keeps each
//! pass stable because part `p` writes every bucket before part `p + 1` does. Passes
//! ping-pong between the caller's slice and a shadow buffer, so after an odd number of
//! passes the result is copied back once at the end.

use crate::buffer::{AbortOnPanic, DoubleBuffer, Span};
use crate::config::SortConfig;
use crate::context::SortStats;
use crate::core::Digits;
use crate::histogram::{PartScratch, snake_scan};
use crate::job::Part;
use crate::small::insertion_sort;
use parking_lot::MutexGuard;
use rayon::prelude::*;
use rayon::{ThreadPool, ThreadPoolBuilder};
use std::mem::MaybeUninit;

/// Sorts `data` by the first `passes` digits of `digits`, keeping equal keys in order.
pub(crate) fn sort_lsd<T: Send, D: Digits<T> + ?Sized>(
    config: &SortConfig,
    data: &mut [T],
    digits: &D,
    passes: usize,
) -> SortStats {
    let n = data.len();
    let mut stats = SortStats::default();
    if n <= 1 || passes == 0 {
        return stats;
    }
    if n <= config.small_sort_threshold {
        insertion_sort(data, digits, 0);
        stats.base_sorts = 1;
        return stats;
    }

    let part_count = n
        .div_ceil(config.threshold_for(n))
        .clamp(1, config.worker_count);
    let parts: Vec<Part> = (0..part_count).map(|_| Part::new()).collect();
    log::debug!("LSD sort of {n} elements: {passes} passes in {part_count} parts");
    let pool = if part_count > 1 {
        ThreadPoolBuilder::new()
            .num_threads(part_count)
            .thread_name(|i| format!("radix-lsd-{i}"))
            .build()
            .inspect_err(|err| {
                log::warn!("failed to build LSD thread pool: {err}; running parts inline");
            })
            .ok()
    } else {
        None
    };
    let pool = pool.as_ref();

    let mut shadow: Vec<MaybeUninit<T>> = Vec::with_capacity(n);
    shadow.resize_with(n, MaybeUninit::uninit);
    let buffers = DoubleBuffer::new(data, &mut shadow);
    let mut span = Span::primary(0, n);
    let _guard = AbortOnPanic;

    for depth in (0..passes).rev() {
        for_each_part(pool, &parts, |p, scratch| {
            // SAFETY: counting only reads the live side.
            let items = unsafe { buffers.slice(span.part(p, part_count)) };
            scratch.count(digits, items, depth);
        });

        {
            let mut scratch: Vec<MutexGuard<'_, PartScratch>> =
                parts.iter().map(|p| p.scratch.lock()).collect();
            let single_bucket = (0..digits.buckets())
                .any(|d| scratch.iter().map(|s| s.counts[d]).sum::<usize>() == n);
            if single_bucket {
                log::trace!("LSD pass at depth {depth} skipped: one bucket");
                continue;
            }
            let mut tables: Vec<&mut [usize]> =
                scratch.iter_mut().map(|s| s.counts.as_mut_slice()).collect();
            snake_scan(&mut tables, n);
        }

        for_each_part(pool, &parts, |p, scratch| {
            let PartScratch { counts, digits: cached } = scratch;
            // SAFETY: the snake scan gave every part disjoint destination slots.
            unsafe { buffers.scatter(span.part(p, part_count), cached, counts, 0) };
        });
        span = span.flipped(0, n);
        if part_count > 1 {
            stats.parallel_steps += 1;
        }
    }

    // SAFETY: all passes are finished and no other thread is running.
    unsafe { buffers.copy_back(span) };
    stats
}

/// Runs `work` once per part, on `pool` if there is one and inline otherwise.
fn for_each_part<F>(pool: Option<&ThreadPool>, parts: &[Part], work: F)
where
    F: Fn(usize, &mut PartScratch) + Sync,
{
    match pool {
        Some(pool) => pool.install(|| {
            parts
                .par_iter()
                .enumerate()
                .for_each(|(p, part)| work(p, &mut part.scratch.lock()));
        }),
        None => {
            for (p, part) in parts.iter().enumerate() {
                work(p, &mut part.scratch.lock());
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{DigitWidth, FixedDigits, KeyDigits};

    #[test]
    fn test_lsd_is_stable() {
        let mut pairs: Vec<(u16, usize)> = (0..5000).map(|i| ((i * 31 % 97) as u16, i)).collect();
        let mut expected = pairs.clone();
        expected.sort_by_key(|p| p.0);

        let config = SortConfig::default().with_worker_count(4);
        let digits = KeyDigits::new(|p: &(u16, usize)| p.0, DigitWidth::Byte);
        let stats = sort_lsd(&config, &mut pairs, &digits, digits.key_len());
        assert_eq!(pairs, expected);
        // Keys below 256 share their high byte, so only the low byte pass runs.
        assert_eq!(stats.parallel_steps, 1);
    }

    #[test]
    fn test_lsd_digit_widths() {
        for width in [DigitWidth::Nibble, DigitWidth::Byte, DigitWidth::Short] {
            let mut values: Vec<u32> = (0..3000u32).map(|i| i.wrapping_mul(2_654_435_761)).collect();
            let mut expected = values.clone();
            expected.sort_unstable();

            let config = SortConfig::default().with_worker_count(3);
            let digits = KeyDigits::new(|v: &u32| *v, width);
            sort_lsd(&config, &mut values, &digits, digits.key_len());
            assert_eq!(values, expected, "width {width:?}");
        }
    }

    #[test]
    fn test_lsd_odd_pass_count_copies_back() {
        let mut keys: Vec<[u8; 3]> = (0..4000u32)
            .map(|i| {
                let v = i.wrapping_mul(40_503);
                [(v >> 16) as u8, (v >> 8) as u8, v as u8]
            })
            .collect();
        let mut expected = keys.clone();
        expected.sort();

        let config = SortConfig::default().with_worker_count(2);
        let digits = FixedDigits::new(|k: &[u8; 3], d: usize| k[d] as usize, 3, DigitWidth::Byte);
        let stats = sort_lsd(&config, &mut keys, &digits, 3);
        assert_eq!(keys, expected);
        assert_eq!(stats.parallel_steps, 3);
    }

    #[test]
    fn test_for_each_part_runs_every_part_once() {
        let parts: Vec<Part> = (0..5).map(|_| Part::new()).collect();
        let pool = ThreadPoolBuilder::new().num_threads(3).build().unwrap();
        for pool in [Some(&pool), None] {
            for_each_part(pool, &parts, |p, scratch| {
                scratch.digits.clear();
                scratch.digits.push(p as u32);
            });
            let seen: Vec<Vec<u32>> = parts
                .iter()
                .map(|part| part.scratch.lock().digits.clone())
                .collect();
            assert_eq!(seen, vec![vec![0], vec![1], vec![2], vec![3], vec![4]]);
        }
    }

    #[test]
    fn test_lsd_nibble_u64_many_passes() {
        let mut values: Vec<u64> = (0..20_000u64)
            .map(|i| i.wrapping_mul(0x9e37_79b9_7f4a_7c15))
            .collect();
        let mut expected = values.clone();
        expected.sort_unstable();

        let config = SortConfig::default().with_worker_count(8);
        let digits = KeyDigits::new(|v: &u64| *v, DigitWidth::Nibble);
        let stats = sort_lsd(&config, &mut values, &digits, digits.key_len());
        assert_eq!(values, expected);
        assert_eq!(stats.parallel_steps, 16);
    }

    #[test]
    fn test_lsd_tiny_input_uses_insertion_sort() {
        let mut values = vec![3i8, -1, 2];
        let digits = KeyDigits::new(|v: &i8| *v, DigitWidth::Byte);
        let stats = sort_lsd(&SortConfig::default(), &mut values, &digits, 1);
        assert_eq!(values, vec![-1, 2, 3]);
        assert_eq!(stats.base_sorts, 1);
    }
}
