//! # Pradix
//!
//! `pradix` is a parallel, cache-aware radix sorting library for fixed-width keys
//! (integers, `char`s, custom digit sequences) and variable-length byte strings.
//!
//! It implements a most-significant-digit radix sort that partitions a range into 16, 256
//! or 65536 buckets by one digit, moves every element into its bucket and recurses into
//! the buckets whose order is not yet decided. Large ranges are split across a pool of
//! worker threads; small ones are finished by a single worker in place.
//!
//! ## Key Features
//!
//! - **Parallel radix steps**: Every worker counts digits of its own part, the last one to
//!   finish plans disjoint write regions for all of them, and all parts are scattered at
//!   once into a shadow buffer. No locks are taken on the hot path.
//! - **Work sharing**: A worker sorting a range on its own hands its unvisited buckets to
//!   the pool as soon as another worker runs idle.
//! - **Strings without sentinels**: Exhausted strings land in a dedicated terminator bucket,
//!   so keys may contain any byte including `0x00`.
//! - **Zero-Copy abstractions**: The [`KeyAccessor`] trait orders arbitrary collections
//!   (e.g., Arrow-style offset buffers, `Vec<Vec<u8>>`) by returning the sorting permutation.
//! - **Stable LSD variant**: [`RadixSorter::sort_lsd_by_key`] for fixed-width keys when the
//!   order of equal keys matters.
//!
//! ## Usage
//!
//! ### Basic Usage
//!
//! ```rust
//! use pradix::{radix_sort, radix_sort_strings};
//!
//! let mut numbers = vec![5u32, 3, 1, 4, 1, 5, 9, 2, 6];
//! radix_sort(&mut numbers);
//! assert_eq!(numbers, vec![1, 1, 2, 3, 4, 5, 5, 6, 9]);
//!
//! let mut words = vec!["banana", "ban", "bandana", "apple"];
//! radix_sort_strings(&mut words);
//! assert_eq!(words, vec!["apple", "ban", "banana", "bandana"]);
//! ```
//!
//! ### Configuration
//!
//! ```rust
//! use pradix::{DigitWidth, RadixSorter, SortConfig, ThresholdPolicy};
//!
//! let sorter = RadixSorter::new(
//!     SortConfig::default()
//!         .with_worker_count(8)
//!         .with_digit_width(DigitWidth::Short)
//!         .with_threshold_policy(ThresholdPolicy::RemainingSize),
//! )
//! .unwrap();
//!
//! let mut data: Vec<u64> = (0..100_000u64).rev().collect();
//! let stats = sorter.sort(&mut data);
//! assert!(data.windows(2).all(|w| w[0] <= w[1]));
//! assert!(stats.parallel_steps > 0);
//! ```
//!
//! ### Custom Types
//!
//! To order custom collections without creating intermediate strings,
//! implement the [`KeyAccessor`] trait.
//!
//! ```rust
//! use pradix::{radix_sort_indices, KeyAccessor};
//!
//! struct User {
//!     username: String,
//! }
//!
//! // Wrapper struct to avoid orphan rule violation (impl foreign trait on foreign type).
//! struct Users(Vec<User>);
//!
//! impl KeyAccessor for Users {
//!     fn get_key(&self, index: usize) -> &[u8] {
//!         self.0[index].username.as_bytes()
//!     }
//!
//!     fn len(&self) -> usize {
//!         self.0.len()
//!     }
//! }
//!
//! let users = Users(vec![
//!     User { username: "Bob".to_string() },
//!     User { username: "Alice".to_string() },
//! ]);
//!
//! // Returns indices: [1, 0] (Alice, Bob)
//! let indices = radix_sort_indices(&users);
//! assert_eq!(indices, vec![1, 0]);
//! ```
//!
//! ## Performance Characteristics
//!
//! - **Fixed-width keys**: O(N * W) for keys of W digits, usually far fewer passes because
//!   buckets that shrink to a single element stop recursing.
//! - **Strings**: O(D) character inspections, where D is the total length of the
//!   distinguishing prefixes.
//! - **Memory Overhead**: One shadow buffer of the input's size when ranges can be split
//!   across workers, plus one cached digit (`4 bytes`) per element of every range
//!   currently being partitioned.
//!
//! Equal keys may be reordered, except by [`RadixSorter::sort_lsd_by_key`].

pub mod algo;
mod buffer;
pub mod config;
mod context;
pub mod core;
pub mod error;
mod histogram;
mod job;
mod lsd;
mod pool;
mod small;

pub use algo::{RadixSorter, radix_sort, radix_sort_by_key, radix_sort_indices, radix_sort_strings};
pub use config::{SMALL_SORT_THRESHOLD, SortConfig, ThresholdPolicy};
pub use context::SortStats;
pub use crate::core::{
    AsBytes, ByteKeys, DigitWidth, Digits, FixedDigits, Indexed, KeyAccessor, KeyDigits, RadixKey,
    StringDigits, TERMINATOR,
};
pub use error::{Result, SortError};

pub mod prelude {
    pub use crate::algo::{
        RadixSorter, radix_sort, radix_sort_by_key, radix_sort_indices, radix_sort_strings,
    };
    pub use crate::config::{SortConfig, ThresholdPolicy};
    pub use crate::context::SortStats;
    pub use crate::core::{DigitWidth, Digits, KeyAccessor, RadixKey};
}
