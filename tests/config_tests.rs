use pradix::prelude::*;
use pradix::{SMALL_SORT_THRESHOLD, SortError};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

fn random_u32(count: usize, seed: u64) -> Vec<u32> {
    let mut rng = StdRng::seed_from_u64(seed);
    (0..count).map(|_| rng.random()).collect()
}

fn random_strings(count: usize, seed: u64) -> Vec<Vec<u8>> {
    let mut rng = StdRng::seed_from_u64(seed);
    (0..count)
        .map(|_| {
            let len = rng.random_range(0..24);
            (0..len).map(|_| rng.random_range(b'a'..=b'h')).collect()
        })
        .collect()
}

#[test]
fn test_threshold_above_input_stays_sequential() {
    let input = random_u32(100_000, 1);
    let mut expected = input.clone();
    expected.sort_unstable();

    let sorter = RadixSorter::new(
        SortConfig::default()
            .with_worker_count(8)
            .with_sequential_threshold(input.len() + 1)
            .with_work_sharing(false),
    )
    .unwrap();

    let mut actual = input;
    let stats = sorter.sort(&mut actual);
    assert_eq!(actual, expected);
    assert_eq!(stats.parallel_steps, 0);
    assert_eq!(stats.sequential_jobs, 1);
    assert_eq!(stats.shared_jobs, 0);
}

#[test]
fn test_threshold_above_input_with_work_sharing() {
    // Shared buckets become sequential jobs too; no parallel step is ever created.
    let input = random_strings(50_000, 2);
    let mut expected = input.clone();
    expected.sort();

    let sorter = RadixSorter::new(
        SortConfig::default()
            .with_worker_count(4)
            .with_sequential_threshold(usize::MAX),
    )
    .unwrap();

    let mut actual = input;
    let stats = sorter.sort_strings(&mut actual);
    assert_eq!(actual, expected);
    assert_eq!(stats.parallel_steps, 0);
    assert_eq!(stats.sequential_jobs, 1 + stats.shared_jobs);
}

#[test]
fn test_small_threshold_forces_parallel_steps() {
    let input = random_u32(20_000, 3);
    let mut expected = input.clone();
    expected.sort_unstable();

    let sorter = RadixSorter::new(
        SortConfig::default()
            .with_worker_count(4)
            .with_sequential_threshold(64),
    )
    .unwrap();

    let mut actual = input;
    let stats = sorter.sort(&mut actual);
    assert_eq!(actual, expected);
    // The root and every bucket above 64 elements are split across workers.
    assert!(stats.parallel_steps > 1);
}

#[test]
fn test_digit_widths() {
    let numbers = random_u32(30_000, 4);
    let strings = random_strings(30_000, 5);

    for width in [DigitWidth::Nibble, DigitWidth::Byte, DigitWidth::Short] {
        let sorter = RadixSorter::new(
            SortConfig::default()
                .with_worker_count(4)
                .with_digit_width(width),
        )
        .unwrap();

        let mut actual = numbers.clone();
        let mut expected = numbers.clone();
        expected.sort_unstable();
        sorter.sort(&mut actual);
        assert_eq!(actual, expected, "numbers, width {width:?}");

        let mut actual = strings.clone();
        let mut expected = strings.clone();
        expected.sort();
        sorter.sort_strings(&mut actual);
        assert_eq!(actual, expected, "strings, width {width:?}");
    }
}

#[test]
fn test_threshold_policies_agree() {
    let input = random_strings(40_000, 6);
    let mut expected = input.clone();
    expected.sort();

    for policy in [ThresholdPolicy::TotalSize, ThresholdPolicy::RemainingSize] {
        let sorter = RadixSorter::new(
            SortConfig::default()
                .with_worker_count(6)
                .with_threshold_policy(policy),
        )
        .unwrap();
        let mut actual = input.clone();
        sorter.sort_strings(&mut actual);
        assert_eq!(actual, expected, "policy {policy:?}");
    }
}

#[test]
fn test_worker_counts() {
    let input = random_u32(25_000, 7);
    let mut expected = input.clone();
    expected.sort_unstable();

    for workers in [1, 2, 3, 8, 16] {
        let sorter = RadixSorter::new(SortConfig::default().with_worker_count(workers)).unwrap();
        let mut actual = input.clone();
        let stats = sorter.sort(&mut actual);
        assert_eq!(actual, expected, "workers = {workers}");
        if workers == 1 {
            assert_eq!(stats.parallel_steps, 0);
        }
    }
}

#[test]
fn test_tiny_input_is_one_base_sort() {
    let mut input: Vec<u64> = (0..SMALL_SORT_THRESHOLD as u64).rev().collect();
    let stats = RadixSorter::default().sort(&mut input);
    assert_eq!(stats.base_sorts, 1);
    assert_eq!(stats.sequential_jobs, 0);
    assert!(input.windows(2).all(|w| w[0] < w[1]));
}

#[test]
fn test_invalid_configurations() {
    assert!(matches!(
        RadixSorter::new(SortConfig::default().with_worker_count(0)),
        Err(SortError::InvalidParameter {
            parameter: "worker_count",
            ..
        })
    ));
    assert!(matches!(
        RadixSorter::new(SortConfig::default().with_sequential_threshold(0)),
        Err(SortError::InvalidParameter {
            parameter: "sequential_threshold",
            ..
        })
    ));
    assert_eq!(
        SortConfig::default().with_digit_bits(32).unwrap_err(),
        SortError::UnsupportedDigitWidth { bits: 32 }
    );
}
