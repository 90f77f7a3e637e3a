//! Per-call shared state of a parallel sort and the tasks workers run against it.
//!
//! A [`Context`] lives for exactly one sort call. Every worker holds a reference to it;
//! jobs reach the buffers, the queue and the thresholds only through it.

use crate::buffer::{AbortOnPanic, DoubleBuffer, Span};
use crate::config::{SortConfig, ThresholdPolicy};
use crate::core::Digits;
use crate::histogram::{PartScratch, snake_scan};
use crate::job::{BigStep, JobArena, JobId, Phase};
use crate::pool::WorkQueue;
use crate::small::RadixStack;
use crossbeam_channel::Sender;
use parking_lot::MutexGuard;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Counters describing how a sort call was executed.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SortStats {
    /// Radix steps split across several workers.
    pub parallel_steps: usize,
    /// Ranges handed to a single worker.
    pub sequential_jobs: usize,
    /// Sequential jobs created by a busy worker for an idle one.
    pub shared_jobs: usize,
    /// Ranges finished by insertion sort.
    pub base_sorts: usize,
}

#[derive(Default)]
struct Counters {
    parallel_steps: AtomicUsize,
    sequential_jobs: AtomicUsize,
    shared_jobs: AtomicUsize,
    base_sorts: AtomicUsize,
}

/// Counting join barrier.
///
/// Every holder releases exactly once. The release that brings the count to zero
/// releases the parent, or signals the caller for the root.
pub(crate) struct Join {
    pending: AtomicUsize,
    parent: Option<Arc<Join>>,
    signal: Option<Sender<()>>,
}

impl Join {
    /// Root barrier held once by the caller.
    pub fn root(signal: Sender<()>) -> Arc<Self> {
        Arc::new(Self {
            pending: AtomicUsize::new(1),
            parent: None,
            signal: Some(signal),
        })
    }

    /// Barrier held once by its creator and completing into one hold on `parent`.
    pub fn child(parent: &Arc<Join>) -> Arc<Self> {
        parent.acquire();
        Arc::new(Self {
            pending: AtomicUsize::new(1),
            parent: Some(Arc::clone(parent)),
            signal: None,
        })
    }

    pub fn acquire(&self) {
        let previous = self.pending.fetch_add(1, Ordering::AcqRel);
        assert!(previous > 0, "join acquired after completion");
    }

    pub fn release(&self) {
        let previous = self.pending.fetch_sub(1, Ordering::AcqRel);
        assert!(previous > 0, "join released more often than acquired");
        if previous > 1 {
            return;
        }
        if let Some(parent) = &self.parent {
            parent.release();
        }
        if let Some(signal) = &self.signal {
            // The caller may only stop listening after the signal arrived.
            let _ = signal.send(());
        }
    }

    #[cfg(test)]
    fn pending(&self) -> usize {
        self.pending.load(Ordering::Acquire)
    }
}

/// Work items of the pool.
pub(crate) enum Task {
    Count { id: JobId, part: usize },
    Distribute { id: JobId, part: usize },
    Small { span: Span, depth: usize, join: Arc<Join> },
}

pub(crate) struct Context<'a, T, D: ?Sized> {
    pub digits: &'a D,
    pub buffers: DoubleBuffer<'a, T>,
    pub config: &'a SortConfig,
    pub queue: WorkQueue<Task>,
    arena: JobArena,
    total: usize,
    rest: AtomicUsize,
    counters: Counters,
}

impl<'a, T: Send, D: Digits<T> + ?Sized> Context<'a, T, D> {
    pub fn new(
        digits: &'a D,
        buffers: DoubleBuffer<'a, T>,
        config: &'a SortConfig,
        total: usize,
    ) -> Self {
        Self {
            digits,
            buffers,
            config,
            queue: WorkQueue::new(),
            arena: JobArena::default(),
            total,
            rest: AtomicUsize::new(total),
            counters: Counters::default(),
        }
    }

    /// Largest range a single worker sorts on its own.
    pub fn sequential_threshold(&self) -> usize {
        let base = match self.config.threshold_policy {
            ThresholdPolicy::TotalSize => self.total,
            ThresholdPolicy::RemainingSize => self.rest.load(Ordering::Relaxed),
        };
        self.config.threshold_for(base)
    }

    /// Records `n` elements as being in their final position.
    pub fn done(&self, n: usize) {
        let previous = self.rest.fetch_sub(n, Ordering::AcqRel);
        assert!(previous >= n, "more elements settled than were sorted");
    }

    pub fn remaining(&self) -> usize {
        self.rest.load(Ordering::Acquire)
    }

    pub fn live_steps(&self) -> usize {
        self.arena.live()
    }

    pub fn note_base_sort(&self) {
        self.counters.base_sorts.fetch_add(1, Ordering::Relaxed);
    }

    pub fn note_shared_job(&self) {
        self.counters.shared_jobs.fetch_add(1, Ordering::Relaxed);
    }

    pub fn stats(&self) -> SortStats {
        SortStats {
            parallel_steps: self.counters.parallel_steps.load(Ordering::Relaxed),
            sequential_jobs: self.counters.sequential_jobs.load(Ordering::Relaxed),
            shared_jobs: self.counters.shared_jobs.load(Ordering::Relaxed),
            base_sorts: self.counters.base_sorts.load(Ordering::Relaxed),
        }
    }

    /// Schedules `span` for sorting from `depth` on, holding `parent` until it is done.
    ///
    /// Ranges above the sequential threshold get a parallel step, the rest a
    /// sequential job. Without a shadow buffer every range is a sequential job.
    pub fn enqueue(&self, span: Span, depth: usize, parent: &Arc<Join>) {
        let threshold = self.sequential_threshold();
        let parts = span
            .len
            .div_ceil(threshold)
            .clamp(1, self.config.worker_count);

        if span.len > threshold && parts > 1 && self.buffers.has_shadow() {
            let step = Arc::new(BigStep::new(span, depth, parts, Join::child(parent)));
            let id = self.arena.insert(Arc::clone(&step));
            self.counters.parallel_steps.fetch_add(1, Ordering::Relaxed);
            log::debug!(
                "parallel step {id:?}: {} elements at depth {depth} in {parts} parts",
                span.len
            );
            step.begin(Phase::Created, Phase::Counting);
            for part in 0..parts {
                self.queue.submit(Task::Count { id, part });
            }
        } else {
            parent.acquire();
            self.counters.sequential_jobs.fetch_add(1, Ordering::Relaxed);
            self.queue.submit(Task::Small {
                span,
                depth,
                join: Arc::clone(parent),
            });
        }
    }

    /// Runs tasks until the queue is stopped.
    ///
    /// The worker keeps one [`RadixStack`] for all of its sequential jobs.
    pub fn work(&self) {
        let mut stack = RadixStack::new();
        while let Some(task) = self.queue.next() {
            let _guard = AbortOnPanic;
            self.execute(task, &mut stack);
        }
    }

    fn execute(&self, task: Task, stack: &mut RadixStack) {
        match task {
            Task::Count { id, part } => self.count(id, part),
            Task::Distribute { id, part } => self.distribute(id, part),
            Task::Small { span, depth, join } => {
                stack.sort(self, span, depth, &join);
                join.release();
            }
        }
    }

    fn count(&self, id: JobId, part: usize) {
        let step = self.arena.get(id);
        log::trace!("{id:?}: counting part {part}");
        {
            // SAFETY: during counting every part of the step is only read.
            let items = unsafe { self.buffers.slice(step.part_span(part)) };
            step.parts[part]
                .scratch
                .lock()
                .count(self.digits, items, step.depth);
        }
        if step.finish_part() {
            self.plan(id, &step);
        }
    }

    /// Merges the part histograms into write cursors. Runs on the last counter.
    fn plan(&self, id: JobId, step: &BigStep) {
        step.advance(Phase::Counting, Phase::Merged);
        {
            let mut scratch: Vec<MutexGuard<'_, PartScratch>> =
                step.parts.iter().map(|p| p.scratch.lock()).collect();
            let mut tables: Vec<&mut [usize]> =
                scratch.iter_mut().map(|s| s.counts.as_mut_slice()).collect();
            *step.bounds.lock() = snake_scan(&mut tables, step.span.len);
        }
        step.begin(Phase::Merged, Phase::Distributing);
        for part in 0..step.parts.len() {
            self.queue.submit(Task::Distribute { id, part });
        }
    }

    fn distribute(&self, id: JobId, part: usize) {
        let step = self.arena.get(id);
        log::trace!("{id:?}: distributing part {part}");
        {
            let mut scratch = step.parts[part].scratch.lock();
            let PartScratch { counts, digits } = &mut *scratch;
            // SAFETY: the snake scan gave every part disjoint destination slots inside
            // the step's range on the other side.
            unsafe {
                self.buffers
                    .scatter(step.part_span(part), digits, counts, step.span.offset);
            }
            scratch.release();
        }
        if step.finish_part() {
            self.recurse(id, &step);
        }
    }

    /// Schedules the buckets of a distributed step and retires it.
    fn recurse(&self, id: JobId, step: &BigStep) {
        step.advance(Phase::Distributing, Phase::Distributed);
        let bounds = std::mem::take(&mut *step.bounds.lock());
        for (bucket, window) in bounds.windows(2).enumerate() {
            let len = window[1] - window[0];
            if len == 0 {
                continue;
            }
            let child = step.span.flipped(window[0], len);
            if len == 1 || self.digits.settled(bucket, step.depth) {
                // SAFETY: the bucket was just written by this step and nobody else owns it.
                unsafe { self.buffers.copy_back(child) };
                self.done(len);
            } else {
                self.enqueue(child, step.depth + 1, &step.join);
            }
        }
        step.advance(Phase::Distributed, Phase::Completed);
        self.arena.retire(id);
        log::debug!("parallel step {id:?} completed");
        step.join.release();
    }
}
