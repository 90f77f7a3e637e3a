use pradix::prelude::*;
use proptest::prelude::*;

fn sorter(workers: usize, width: DigitWidth, small: usize) -> RadixSorter {
    RadixSorter::new(
        SortConfig::default()
            .with_worker_count(workers)
            .with_digit_width(width)
            .with_small_sort_threshold(small),
    )
    .unwrap()
}

fn digit_width() -> impl Strategy<Value = DigitWidth> {
    prop::sample::select(vec![DigitWidth::Nibble, DigitWidth::Byte, DigitWidth::Short])
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    // Output is the input permuted into non-decreasing order.
    #[test]
    fn prop_integers_match_std(
        mut values in prop::collection::vec(any::<i64>(), 0..3000),
        workers in 1usize..6,
        width in digit_width(),
        small in 0usize..40,
    ) {
        let mut expected = values.clone();
        expected.sort_unstable();
        sorter(workers, width, small).sort(&mut values);
        prop_assert_eq!(values, expected);
    }

    #[test]
    fn prop_strings_match_std(
        mut keys in prop::collection::vec(
            prop::collection::vec(prop::sample::select(vec![0u8, 1, b'a', b'b', 255]), 0..12),
            0..2000,
        ),
        workers in 1usize..6,
        width in digit_width(),
        small in 0usize..40,
    ) {
        let mut expected = keys.clone();
        expected.sort();
        sorter(workers, width, small).sort_strings(&mut keys);
        prop_assert_eq!(keys, expected);
    }

    #[test]
    fn prop_indices_are_sorting_permutation(
        keys in prop::collection::vec(prop::collection::vec(any::<u8>(), 0..8), 0..1500),
        workers in 1usize..6,
    ) {
        let indices = sorter(workers, DigitWidth::Byte, 16).sort_indices(&keys);

        let mut seen = indices.clone();
        seen.sort_unstable();
        prop_assert_eq!(seen, (0..keys.len()).collect::<Vec<_>>());
        prop_assert!(indices.windows(2).all(|w| keys[w[0]] <= keys[w[1]]));
    }

    // Sorting sorted input yields the same sequence.
    #[test]
    fn prop_idempotent(
        mut values in prop::collection::vec(any::<u32>(), 0..3000),
        workers in 1usize..6,
    ) {
        let sorter = sorter(workers, DigitWidth::Byte, 32);
        sorter.sort(&mut values);
        let once = values.clone();
        sorter.sort(&mut values);
        prop_assert_eq!(values, once);
    }

    #[test]
    fn prop_lsd_is_stable(
        keys in prop::collection::vec(any::<u16>(), 0..3000),
        workers in 1usize..6,
        width in digit_width(),
    ) {
        let mut pairs: Vec<(u16, usize)> = keys.into_iter().enumerate().map(|(i, k)| (k, i)).collect();
        let mut expected = pairs.clone();
        expected.sort_by_key(|p| p.0);
        sorter(workers, width, 32).sort_lsd_by_key(&mut pairs, |p| p.0);
        prop_assert_eq!(pairs, expected);
    }
}
