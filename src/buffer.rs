//! Primary/shadow storage pair and the moves between them.
//!
//! A radix step scatters a range out of place, from whichever side currently holds it
//! into the other side at the same offsets. For every position exactly one side holds a
//! live element at any time; [`Span::side`] records which one for a given sub-range.
//! Elements are moved bitwise, never cloned or dropped, so a slot left behind on the
//! other side is dead memory until something is moved back into it.

use std::marker::PhantomData;
use std::mem::MaybeUninit;
use std::ptr::NonNull;

/// Which buffer holds the live elements of a span.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Side {
    Primary,
    Shadow,
}

impl Side {
    #[inline]
    pub fn other(self) -> Self {
        match self {
            Self::Primary => Self::Shadow,
            Self::Shadow => Self::Primary,
        }
    }
}

/// A sub-range of the sort input together with the side holding it.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct Span {
    pub offset: usize,
    pub len: usize,
    pub side: Side,
}

impl Span {
    pub fn primary(offset: usize, len: usize) -> Self {
        Self {
            offset,
            len,
            side: Side::Primary,
        }
    }

    /// Sub-span on the same side; `offset` is relative to this span.
    #[inline]
    pub fn sub(self, offset: usize, len: usize) -> Self {
        debug_assert!(offset + len <= self.len);
        Self {
            offset: self.offset + offset,
            len,
            side: self.side,
        }
    }

    /// Sub-span on the other side, where a scatter out of this span wrote it.
    #[inline]
    pub fn flipped(self, offset: usize, len: usize) -> Self {
        let sub = self.sub(offset, len);
        Self {
            side: self.side.other(),
            ..sub
        }
    }

    /// Part `p` of `parts` equally sized parts (the last ones may be short or empty).
    pub fn part(self, p: usize, parts: usize) -> Self {
        let part_len = self.len.div_ceil(parts);
        let start = (p * part_len).min(self.len);
        let end = ((p + 1) * part_len).min(self.len);
        self.sub(start, end - start)
    }
}

/// The caller's slice plus an engine-owned shadow of equal length.
///
/// The shadow may be left out (empty) when nothing will ever be scattered; only
/// primary spans are valid then.
pub(crate) struct DoubleBuffer<'a, T> {
    primary: NonNull<T>,
    shadow: NonNull<T>,
    len: usize,
    has_shadow: bool,
    _marker: PhantomData<&'a mut [T]>,
}

// SAFETY: the buffer hands out access to disjoint spans only; sharing it between threads
// amounts to moving `T`s between them.
unsafe impl<T: Send> Send for DoubleBuffer<'_, T> {}
unsafe impl<T: Send> Sync for DoubleBuffer<'_, T> {}

impl<'a, T> DoubleBuffer<'a, T> {
    pub fn new(primary: &'a mut [T], shadow: &'a mut [MaybeUninit<T>]) -> Self {
        let has_shadow = !shadow.is_empty();
        assert!(
            !has_shadow || primary.len() == shadow.len(),
            "shadow must match the input length"
        );
        let len = primary.len();
        Self {
            primary: NonNull::from(primary).cast(),
            shadow: NonNull::from(shadow).cast(),
            len,
            has_shadow,
            _marker: PhantomData,
        }
    }

    /// Whether spans may be scattered to the shadow side.
    #[inline]
    pub fn has_shadow(&self) -> bool {
        self.has_shadow
    }

    #[inline]
    fn base(&self, side: Side) -> *mut T {
        match side {
            Side::Primary => self.primary.as_ptr(),
            Side::Shadow => {
                debug_assert!(self.has_shadow, "shadow side used without a shadow buffer");
                self.shadow.as_ptr()
            }
        }
    }

    /// Shared view of a span.
    ///
    /// # Safety
    ///
    /// `span.side` must hold the live elements of the span and nobody may write them
    /// while the view exists.
    #[inline]
    pub unsafe fn slice(&self, span: Span) -> &[T] {
        debug_assert!(span.offset + span.len <= self.len);
        unsafe { std::slice::from_raw_parts(self.base(span.side).add(span.offset), span.len) }
    }

    /// Exclusive view of a span.
    ///
    /// # Safety
    ///
    /// `span.side` must hold the live elements of the span and the caller must be the
    /// only one accessing it on either side.
    #[inline]
    #[allow(clippy::mut_from_ref)]
    pub unsafe fn slice_mut(&self, span: Span) -> &mut [T] {
        debug_assert!(span.offset + span.len <= self.len);
        unsafe { std::slice::from_raw_parts_mut(self.base(span.side).add(span.offset), span.len) }
    }

    /// Moves a span back into the primary buffer if it lives in the shadow.
    ///
    /// # Safety
    ///
    /// Same as [`DoubleBuffer::slice_mut`].
    pub unsafe fn copy_back(&self, span: Span) -> Span {
        if span.side == Side::Shadow && span.len > 0 {
            unsafe {
                std::ptr::copy_nonoverlapping(
                    self.base(Side::Shadow).add(span.offset),
                    self.base(Side::Primary).add(span.offset),
                    span.len,
                );
            }
        }
        Span {
            side: Side::Primary,
            ..span
        }
    }

    /// Moves every element of `src` to the other side at `origin + cursors[digit]`,
    /// advancing the cursor of its digit.
    ///
    /// `digits` holds the digit of every element of `src`, in order.
    ///
    /// # Safety
    ///
    /// `src` must hold live elements owned by the caller, and the destination slots
    /// named by the cursors must be dead slots no one else writes.
    pub unsafe fn scatter(&self, src: Span, digits: &[u32], cursors: &mut [usize], origin: usize) {
        debug_assert_eq!(src.len, digits.len());
        let from = unsafe { self.base(src.side).add(src.offset) };
        let to = unsafe { self.base(src.side.other()).add(origin) };
        for (i, &d) in digits.iter().enumerate() {
            let slot = &mut cursors[d as usize];
            debug_assert!(origin + *slot < self.len);
            unsafe { std::ptr::copy_nonoverlapping(from.add(i), to.add(*slot), 1) };
            *slot += 1;
        }
    }
}

/// Aborts the process if dropped during a panic.
///
/// Held while elements may be split across both buffers: unwinding from there would
/// drop moved-out slots twice.
pub(crate) struct AbortOnPanic;

impl Drop for AbortOnPanic {
    fn drop(&mut self) {
        if std::thread::panicking() {
            log::error!("panic while elements were partially moved; aborting");
            std::process::abort();
        }
    }
}
