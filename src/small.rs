//! Sequential sorting of ranges a single worker owns.
//!
//! A [`RadixStack`] sorts in place with an explicit stack of partition frames instead
//! of call recursion. Frames keep only their non-empty buckets, and a range whose
//! elements all share a digit moves on to the next depth without a frame. After each
//! bucket the stack checks for idle workers and, if there are any, hands the unvisited
//! buckets of its oldest frame to the pool.

use crate::buffer::Span;
use crate::context::{Context, Join};
use crate::core::Digits;
use crate::histogram::{Bucket, SparseHistogram};
use std::cmp::Ordering;
use std::sync::Arc;

/// Binary insertion sort of items that agree on every digit before `depth`.
///
/// Equal items keep their order.
pub(crate) fn insertion_sort<T, D: Digits<T> + ?Sized>(items: &mut [T], digits: &D, depth: usize) {
    for i in 1..items.len() {
        let (sorted, rest) = items.split_at(i);
        let insert_pos =
            sorted.partition_point(|x| digits.compare(x, &rest[0], depth) != Ordering::Greater);

        if insert_pos < i {
            items[insert_pos..=i].rotate_right(1);
        }
    }
}

/// In-place permutation into bucket order (American flag sort).
///
/// `digits[i]` is the digit of `items[i]` and is permuted along with it; `cursors[d]`
/// starts at the start of bucket `d` for every bucket in `plan`.
fn permute<T>(items: &mut [T], digits: &mut [u32], cursors: &mut [usize], plan: &[Bucket]) {
    for bucket in plan {
        let home = bucket.digit as usize;
        let end = bucket.start + bucket.len;
        while cursors[home] < end {
            let i = cursors[home];
            let mut d = digits[i] as usize;
            while d != home {
                let j = cursors[d];
                cursors[d] += 1;
                items.swap(i, j);
                digits.swap(i, j);
                d = digits[i] as usize;
            }
            cursors[home] += 1;
        }
    }
}

/// A partitioned range and the next bucket to visit.
struct Frame {
    span: Span,
    depth: usize,
    buckets: Vec<Bucket>,
    next: usize,
}

impl Frame {
    /// Next bucket and its range.
    fn next_bucket(&mut self) -> Option<(usize, Span)> {
        let bucket = *self.buckets.get(self.next)?;
        self.next += 1;
        Some((
            bucket.digit as usize,
            self.span.sub(bucket.start, bucket.len),
        ))
    }
}

/// Explicit recursion state for the sequential jobs of one worker.
///
/// Frames below `bottom` were handed to other workers and are never visited again.
#[derive(Default)]
pub(crate) struct RadixStack {
    frames: Vec<Frame>,
    bottom: usize,
    histogram: SparseHistogram,
}

impl RadixStack {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sorts `span` from `depth` on. Shared work holds `join`.
    pub fn sort<T: Send, D: Digits<T> + ?Sized>(
        &mut self,
        ctx: &Context<'_, T, D>,
        span: Span,
        depth: usize,
        join: &Arc<Join>,
    ) {
        // SAFETY: the job owns `span` on both sides.
        let span = unsafe { ctx.buffers.copy_back(span) };
        self.visit(ctx, span, depth);

        while self.frames.len() > self.bottom {
            let Some(frame) = self.frames.last_mut() else {
                break;
            };
            let depth = frame.depth;
            let Some((bucket, sub)) = frame.next_bucket() else {
                self.frames.pop();
                continue;
            };

            if sub.len == 1 || ctx.digits.settled(bucket, depth) {
                ctx.done(sub.len);
            } else {
                self.visit(ctx, sub, depth + 1);
            }

            if ctx.config.work_sharing && ctx.queue.has_idle() {
                self.share(ctx, join);
            }
        }

        self.frames.clear();
        self.bottom = 0;
    }

    /// Sorts a small range directly or pushes its partition frame.
    fn visit<T: Send, D: Digits<T> + ?Sized>(
        &mut self,
        ctx: &Context<'_, T, D>,
        span: Span,
        mut depth: usize,
    ) {
        if span.len <= 1 {
            ctx.done(span.len);
            return;
        }
        // SAFETY: the job owns `span`; detached buckets never overlap a frame still on
        // the stack above `bottom`.
        let items = unsafe { ctx.buffers.slice_mut(span) };

        if span.len <= ctx.config.small_sort_threshold {
            insertion_sort(items, ctx.digits, depth);
            ctx.note_base_sort();
            ctx.done(span.len);
            return;
        }

        loop {
            let plan = self.histogram.plan(ctx.digits, items, depth);
            if let &[only] = plan.as_slice() {
                self.histogram.reset(&plan);
                if ctx.digits.settled(only.digit as usize, depth) {
                    ctx.done(span.len);
                    return;
                }
                depth += 1;
                continue;
            }

            debug_assert_eq!(
                plan.last().map(|b| b.start + b.len),
                Some(span.len),
                "digit counts do not cover the range"
            );
            let SparseHistogram {
                cursors, digits, ..
            } = &mut self.histogram;
            permute(items, digits, cursors, &plan);
            self.histogram.reset(&plan);
            self.frames.push(Frame {
                span,
                depth,
                buckets: plan,
                next: 0,
            });
            return;
        }
    }

    /// Turns the unvisited buckets of the bottom frame into jobs of their own.
    fn share<T: Send, D: Digits<T> + ?Sized>(&mut self, ctx: &Context<'_, T, D>, join: &Arc<Join>) {
        let Some(frame) = self.frames.get_mut(self.bottom) else {
            return;
        };
        let depth = frame.depth;
        let mut shared = 0;
        while let Some((bucket, sub)) = frame.next_bucket() {
            if sub.len == 1 || ctx.digits.settled(bucket, depth) {
                ctx.done(sub.len);
            } else {
                ctx.enqueue(sub, depth + 1, join);
                ctx.note_shared_job();
                shared += 1;
            }
        }
        self.bottom += 1;
        log::trace!("shared {shared} buckets at depth {depth}");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::buffer::DoubleBuffer;
    use crate::config::SortConfig;
    use crate::core::{AsBytes, DigitWidth, KeyDigits, StringDigits};
    use crossbeam_channel::bounded;
    use std::mem::MaybeUninit;

    fn shadow<T>(len: usize) -> Vec<MaybeUninit<T>> {
        (0..len).map(|_| MaybeUninit::uninit()).collect()
    }

    #[test]
    fn test_insertion_sort_is_stable() {
        let mut pairs = vec![(3u8, 'a'), (1, 'b'), (3, 'c'), (0, 'd'), (1, 'e')];
        let digits = KeyDigits::new(|p: &(u8, char)| p.0, DigitWidth::Byte);
        insertion_sort(&mut pairs, &digits, 0);
        assert_eq!(pairs, vec![(0, 'd'), (1, 'b'), (1, 'e'), (3, 'a'), (3, 'c')]);
    }

    #[test]
    fn test_permute_groups_buckets() {
        let mut items = vec!['e', 'a', 'c', 'a', 'e', 'e'];
        let mut digits: Vec<u32> = items.iter().map(|&c| c as u32 - 'a' as u32).collect();
        let plan = [
            Bucket { digit: 0, start: 0, len: 2 },
            Bucket { digit: 2, start: 2, len: 1 },
            Bucket { digit: 4, start: 3, len: 3 },
        ];
        let mut cursors = vec![0, 0, 2, 0, 3];
        permute(&mut items, &mut digits, &mut cursors, &plan);
        assert_eq!(items, vec!['a', 'a', 'c', 'e', 'e', 'e']);
        assert_eq!(digits, vec![0, 0, 2, 4, 4, 4]);
    }

    #[test]
    fn test_stack_sorts_strings_in_place() {
        let mut data: Vec<String> = (0..500)
            .map(|i| format!("{:x}", (i * 2654435761u64) % 100_003))
            .collect();
        let mut expected = data.clone();
        expected.sort();

        let config = SortConfig::default()
            .with_small_sort_threshold(4)
            .with_work_sharing(false);
        let digits = StringDigits::new(AsBytes, DigitWidth::Byte, 0);
        let mut shadow = shadow(data.len());
        let len = data.len();
        {
            let ctx = Context::new(&digits, DoubleBuffer::new(&mut data, &mut shadow), &config, len);
            let (tx, _rx) = bounded(1);
            let root = Join::root(tx);
            RadixStack::new().sort(&ctx, Span::primary(0, len), 0, &root);
            assert_eq!(ctx.remaining(), 0);
            assert!(ctx.stats().base_sorts > 0);
        }
        assert_eq!(data, expected);
    }

    #[test]
    fn test_shared_prefix_pushes_one_frame() {
        let prefix = "p".repeat(301);
        let mut data: Vec<String> = (0..64).map(|i| format!("{prefix}{:02}", 63 - i)).collect();
        let mut expected = data.clone();
        expected.sort();

        let config = SortConfig::default()
            .with_digit_width(DigitWidth::Short)
            .with_small_sort_threshold(4)
            .with_work_sharing(false);
        let digits = StringDigits::new(AsBytes, DigitWidth::Short, 0);
        let mut shadow: Vec<MaybeUninit<String>> = Vec::new();
        let len = data.len();
        {
            let ctx = Context::new(&digits, DoubleBuffer::new(&mut data, &mut shadow), &config, len);
            let mut stack = RadixStack::new();
            stack.visit(&ctx, Span::primary(0, len), 0);

            // Digits 0..150 are all "pp"; digit 150 pairs the last 'p' with the tens digit.
            assert_eq!(stack.frames.len(), 1);
            assert_eq!(stack.frames[0].depth, 150);
            assert_eq!(stack.frames[0].buckets.len(), 7);
            assert!(stack.histogram.cursors.iter().all(|&c| c == 0));

            let (tx, _rx) = bounded(1);
            let root = Join::root(tx);
            stack.frames.clear();
            stack.sort(&ctx, Span::primary(0, len), 0, &root);
            assert_eq!(ctx.remaining(), 0);
        }
        assert_eq!(data, expected);
    }

    #[test]
    fn test_share_detaches_bottom_frame() {
        let mut data: Vec<u16> = (0..2000u32).map(|i| (i * 7919 % 65_536) as u16).collect();
        let mut expected = data.clone();
        expected.sort_unstable();

        let config = SortConfig::default()
            .with_worker_count(2)
            .with_sequential_threshold(usize::MAX)
            .with_small_sort_threshold(8);
        let digits = KeyDigits::new(|v: &u16| *v, DigitWidth::Byte);
        let mut shadow = shadow(data.len());
        let len = data.len();
        {
            let ctx = Context::new(&digits, DoubleBuffer::new(&mut data, &mut shadow), &config, len);
            let (tx, rx) = bounded(1);
            let root = Join::root(tx);

            let mut stack = RadixStack::new();
            stack.visit(&ctx, Span::primary(0, len), 0);
            assert_eq!(stack.frames.len(), 1);
            stack.share(&ctx, &root);
            assert_eq!(stack.bottom, 1);
            assert!(ctx.stats().shared_jobs > 0);
            assert_eq!(ctx.stats().shared_jobs, ctx.stats().sequential_jobs);

            // Run the detached jobs on this thread.
            ctx.queue.stop(1);
            ctx.work();
            root.release();
            assert!(rx.try_recv().is_ok());
            assert_eq!(ctx.remaining(), 0);
        }
        assert_eq!(data, expected);
    }
}
