//! Core traits and types for key extraction.
//!
//! This module defines:
//! - [`Digits`]: The trait the engine partitions by. It maps an element and a depth to a bucket.
//! - [`KeyDigits`], [`FixedDigits`], [`StringDigits`]: The stock digit extractors.
//! - [`DigitWidth`]: Nibble, byte or short digits.
//! - [`RadixKey`]: Fixed-width keys with an order-preserving bit representation.
//! - [`KeyAccessor`] and [`ByteKeys`]: Byte-string access for collections and elements.

use crate::error::{Result, SortError};
use std::cmp::Ordering;
use std::collections::VecDeque;
use std::marker::PhantomData;

/// Digit value reported for a string that is exhausted at the current depth.
///
/// Real bytes map to `byte + 1`, so the terminator sorts below every byte, `0x00` included.
pub const TERMINATOR: usize = 0;

/// Number of distinct digit values of one string character (256 bytes plus the terminator).
const CHAR_BUCKETS: usize = 257;

/// Width of a single radix digit.
///
/// Wider digits need fewer passes but bigger histograms: 16, 256 or 65536 buckets per step.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum DigitWidth {
    /// 4-bit digits.
    Nibble,
    /// 8-bit digits.
    #[default]
    Byte,
    /// 16-bit digits.
    Short,
}

impl DigitWidth {
    /// Builds a digit width from a bit count.
    ///
    /// # Errors
    ///
    /// Returns [`SortError::UnsupportedDigitWidth`] for anything but 4, 8 or 16.
    ///
    /// # Examples
    ///
    /// ```
    /// use pradix::DigitWidth;
    ///
    /// assert_eq!(DigitWidth::from_bits(16).unwrap(), DigitWidth::Short);
    /// assert!(DigitWidth::from_bits(12).is_err());
    /// ```
    pub fn from_bits(bits: u32) -> Result<Self> {
        match bits {
            4 => Ok(Self::Nibble),
            8 => Ok(Self::Byte),
            16 => Ok(Self::Short),
            _ => Err(SortError::UnsupportedDigitWidth { bits }),
        }
    }

    /// Bits per digit.
    #[inline]
    #[must_use]
    pub const fn bits(self) -> u32 {
        match self {
            Self::Nibble => 4,
            Self::Byte => 8,
            Self::Short => 16,
        }
    }

    /// Number of distinct digit values.
    #[inline]
    #[must_use]
    pub const fn radix(self) -> usize {
        1 << self.bits()
    }

    /// Number of digits needed to cover a key of `key_bits` bits.
    #[inline]
    #[must_use]
    pub const fn digits_for(self, key_bits: u32) -> usize {
        key_bits.div_ceil(self.bits()) as usize
    }

    #[inline]
    const fn mask(self) -> u128 {
        (self.radix() - 1) as u128
    }
}

impl TryFrom<u32> for DigitWidth {
    type Error = SortError;

    fn try_from(bits: u32) -> Result<Self> {
        Self::from_bits(bits)
    }
}

/// Maps elements to radix digits.
///
/// `digit` must be a pure function of `(item, depth)`: workers call it concurrently
/// on disjoint elements.
pub trait Digits<T>: Sync {
    /// Number of buckets a radix step partitions into.
    fn buckets(&self) -> usize;

    /// Bucket of `item` at `depth`, in `0..self.buckets()`.
    fn digit(&self, item: &T, depth: usize) -> usize;

    /// Returns `true` when the elements of `bucket` at `depth` are fully ordered
    /// and take no part in further recursion.
    fn settled(&self, bucket: usize, depth: usize) -> bool;

    /// Orders two items that agree on every digit before `depth`.
    ///
    /// Used by the comparison sort that takes over for tiny ranges.
    fn compare(&self, a: &T, b: &T, depth: usize) -> Ordering;
}

/// Fixed-width keys with an order-preserving unsigned representation.
pub trait RadixKey: Copy {
    /// Width of the key in bits.
    const BITS: u32;

    /// Unsigned bits that compare the same way the key does.
    fn to_radix_bits(self) -> u128;
}

macro_rules! impl_unsigned_key {
    ($($t:ty),*) => {
        $(
            impl RadixKey for $t {
                const BITS: u32 = <$t>::BITS;

                #[inline(always)]
                fn to_radix_bits(self) -> u128 {
                    self as u128
                }
            }
        )*
    };
}

// Signed keys flip the sign bit so negatives order below positives.
macro_rules! impl_signed_key {
    ($($t:ty => $u:ty),*) => {
        $(
            impl RadixKey for $t {
                const BITS: u32 = <$t>::BITS;

                #[inline(always)]
                fn to_radix_bits(self) -> u128 {
                    ((self as $u) ^ !(<$u>::MAX >> 1)) as u128
                }
            }
        )*
    };
}

impl_unsigned_key!(u8, u16, u32, u64, u128, usize);
impl_signed_key!(i8 => u8, i16 => u16, i32 => u32, i64 => u64, i128 => u128, isize => usize);

impl RadixKey for char {
    const BITS: u32 = 32;

    #[inline(always)]
    fn to_radix_bits(self) -> u128 {
        u32::from(self) as u128
    }
}

/// Digit `depth` of a key, most significant first.
#[inline(always)]
fn key_digit(bits: u128, key_bits: u32, width: DigitWidth, depth: usize) -> usize {
    let aligned = bits << (128 - key_bits);
    let shift = 128 - width.bits() * (depth as u32 + 1);
    ((aligned >> shift) & width.mask()) as usize
}

/// Digits of a [`RadixKey`] produced by a key function.
pub struct KeyDigits<F, K> {
    key: F,
    width: DigitWidth,
    len: usize,
    _key: PhantomData<fn() -> K>,
}

impl<F, K: RadixKey> KeyDigits<F, K> {
    /// Creates the extractor. The key width in digits follows from `K::BITS`.
    pub fn new<T>(key: F, width: DigitWidth) -> Self
    where
        F: Fn(&T) -> K,
    {
        Self {
            key,
            width,
            len: width.digits_for(K::BITS),
            _key: PhantomData,
        }
    }

    /// Key width in digits.
    #[must_use]
    pub fn key_len(&self) -> usize {
        self.len
    }
}

impl<T, K, F> Digits<T> for KeyDigits<F, K>
where
    F: Fn(&T) -> K + Sync,
    K: RadixKey,
{
    #[inline]
    fn buckets(&self) -> usize {
        self.width.radix()
    }

    #[inline(always)]
    fn digit(&self, item: &T, depth: usize) -> usize {
        key_digit((self.key)(item).to_radix_bits(), K::BITS, self.width, depth)
    }

    #[inline]
    fn settled(&self, _bucket: usize, depth: usize) -> bool {
        depth + 1 >= self.len
    }

    fn compare(&self, a: &T, b: &T, _depth: usize) -> Ordering {
        (self.key)(a)
            .to_radix_bits()
            .cmp(&(self.key)(b).to_radix_bits())
    }
}

/// Digits produced by a caller-supplied extractor over a key of fixed width.
///
/// # Examples
///
/// ```
/// use pradix::{Digits, DigitWidth, FixedDigits};
///
/// // Two bytes, most significant first.
/// let digits = FixedDigits::new(
///     |v: &u16, depth: usize| (*v >> (8 - 8 * depth)) as usize & 0xff,
///     2,
///     DigitWidth::Byte,
/// );
/// assert_eq!(digits.digit(&0x1234u16, 0), 0x12);
/// assert_eq!(digits.digit(&0x1234u16, 1), 0x34);
/// ```
pub struct FixedDigits<F> {
    extract: F,
    len: usize,
    width: DigitWidth,
}

impl<F> FixedDigits<F> {
    /// `len` is the key width in digits; every digit must be below `width.radix()`.
    pub fn new(extract: F, len: usize, width: DigitWidth) -> Self {
        Self {
            extract,
            len,
            width,
        }
    }

    /// Key width in digits.
    #[must_use]
    pub fn key_len(&self) -> usize {
        self.len
    }
}

impl<T, F> Digits<T> for FixedDigits<F>
where
    F: Fn(&T, usize) -> usize + Sync,
{
    #[inline]
    fn buckets(&self) -> usize {
        self.width.radix()
    }

    #[inline(always)]
    fn digit(&self, item: &T, depth: usize) -> usize {
        (self.extract)(item, depth)
    }

    #[inline]
    fn settled(&self, _bucket: usize, depth: usize) -> bool {
        depth + 1 >= self.len
    }

    fn compare(&self, a: &T, b: &T, depth: usize) -> Ordering {
        (depth..self.len)
            .map(|d| (self.extract)(a, d).cmp(&(self.extract)(b, d)))
            .find(|ord| ord.is_ne())
            .unwrap_or(Ordering::Equal)
    }
}

/// Digits of byte-string keys with an explicit terminator.
///
/// Depth counts digits from `origin`, a character offset every key is assumed to share a
/// prefix up to.
pub struct StringDigits<A> {
    keys: A,
    width: DigitWidth,
    origin: usize,
}

impl<A> StringDigits<A> {
    pub fn new(keys: A, width: DigitWidth, origin: usize) -> Self {
        Self {
            keys,
            width,
            origin,
        }
    }

    /// Character offset of the first character covered by `depth`.
    #[inline]
    fn char_offset(&self, depth: usize) -> usize {
        self.origin
            + match self.width {
                DigitWidth::Nibble => depth / 2,
                DigitWidth::Byte => depth,
                DigitWidth::Short => 2 * depth,
            }
    }
}

#[inline(always)]
fn char_digit(key: &[u8], pos: usize) -> usize {
    key.get(pos).map_or(TERMINATOR, |&b| b as usize + 1)
}

#[inline]
fn tail(key: &[u8], offset: usize) -> &[u8] {
    key.get(offset..).unwrap_or(&[])
}

impl<T, A: ByteKeys<T>> Digits<T> for StringDigits<A> {
    #[inline]
    fn buckets(&self) -> usize {
        match self.width {
            DigitWidth::Nibble => 17,
            DigitWidth::Byte => CHAR_BUCKETS,
            DigitWidth::Short => CHAR_BUCKETS * CHAR_BUCKETS,
        }
    }

    #[inline(always)]
    fn digit(&self, item: &T, depth: usize) -> usize {
        let key = self.keys.bytes(item);
        let pos = self.char_offset(depth);
        match self.width {
            DigitWidth::Nibble => match key.get(pos) {
                None => TERMINATOR,
                Some(&b) if depth % 2 == 0 => (b >> 4) as usize + 1,
                Some(&b) => (b & 0x0f) as usize + 1,
            },
            DigitWidth::Byte => char_digit(key, pos),
            DigitWidth::Short => match char_digit(key, pos) {
                TERMINATOR => TERMINATOR,
                hi => hi * CHAR_BUCKETS + char_digit(key, pos + 1),
            },
        }
    }

    #[inline]
    fn settled(&self, bucket: usize, _depth: usize) -> bool {
        match self.width {
            // Either character may be the terminator.
            DigitWidth::Short => bucket % CHAR_BUCKETS == TERMINATOR,
            _ => bucket == TERMINATOR,
        }
    }

    fn compare(&self, a: &T, b: &T, depth: usize) -> Ordering {
        let offset = self.char_offset(depth);
        tail(self.keys.bytes(a), offset).cmp(tail(self.keys.bytes(b), offset))
    }
}

/// Byte-string view of individual elements.
pub trait ByteKeys<T>: Sync {
    fn bytes<'a>(&'a self, item: &'a T) -> &'a [u8];
}

/// Uses the element's own `AsRef<[u8]>` bytes as its key.
#[derive(Clone, Copy, Debug, Default)]
pub struct AsBytes;

impl<T: AsRef<[u8]>> ByteKeys<T> for AsBytes {
    #[inline(always)]
    fn bytes<'a>(&'a self, item: &'a T) -> &'a [u8] {
        item.as_ref()
    }
}

/// Treats elements as indices into a [`KeyAccessor`].
pub struct Indexed<'p, A: ?Sized>(pub &'p A);

impl<A: KeyAccessor + Sync + ?Sized> ByteKeys<usize> for Indexed<'_, A> {
    #[inline(always)]
    fn bytes<'a>(&'a self, index: &'a usize) -> &'a [u8] {
        self.0.get_key(*index)
    }
}

/// A trait for accessing key data from a collection without copying.
///
/// This trait allows [`sort_indices`](crate::RadixSorter::sort_indices) to order any
/// collection whose elements can be represented as byte slices (e.g., `Vec<String>`,
/// `Vec<Vec<u8>>`, or custom columnar storage).
///
/// # Examples
///
/// Implementing for a custom struct:
///
/// ```
/// use pradix::KeyAccessor;
///
/// struct MyCollection {
///     data: Vec<String>,
/// }
///
/// impl KeyAccessor for MyCollection {
///     fn get_key(&self, index: usize) -> &[u8] {
///         self.data[index].as_bytes()
///     }
///
///     fn len(&self) -> usize {
///         self.data.len()
///     }
/// }
/// ```
pub trait KeyAccessor {
    /// Returns a byte slice representing the key at the given index.
    fn get_key(&self, index: usize) -> &[u8];

    /// Returns the number of items in the collection.
    fn len(&self) -> usize;

    /// Returns `true` if the collection is empty.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

// Blanket implementation for indexable slices of byte-ref types.
impl<T: AsRef<[u8]>> KeyAccessor for [T] {
    fn get_key(&self, index: usize) -> &[u8] {
        self[index].as_ref()
    }

    fn len(&self) -> usize {
        self.len()
    }
}

// Explicit Vec impl to improve ergonomics (avoiding .as_slice()).
impl<T: AsRef<[u8]>> KeyAccessor for Vec<T> {
    fn get_key(&self, index: usize) -> &[u8] {
        self[index].as_ref()
    }

    fn len(&self) -> usize {
        self.len()
    }
}

impl<T: AsRef<[u8]>> KeyAccessor for VecDeque<T> {
    fn get_key(&self, index: usize) -> &[u8] {
        self[index].as_ref()
    }

    fn len(&self) -> usize {
        self.len()
    }
}
