//! Parallel radix steps and the arena that owns them while they run.
//!
//! A [`BigStep`] sorts one range by one digit using every worker:
//!
//! ```text
//! Created -> Counting -> Merged -> Distributing -> Distributed -> Completed
//! ```
//!
//! Counting and distributing each fan out to one task per part. Tasks find their step
//! through a [`JobId`]; the arena keeps the step alive until the task that finishes the
//! last phase retires it.

use crate::buffer::Span;
use crate::context::Join;
use crate::histogram::PartScratch;
use cuneiform::cuneiform;
use parking_lot::Mutex;
use std::sync::Arc;
use std::sync::atomic::{AtomicU8, AtomicUsize, Ordering};

/// Lifecycle of a [`BigStep`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(u8)]
pub(crate) enum Phase {
    Created,
    Counting,
    Merged,
    Distributing,
    Distributed,
    Completed,
}

impl Phase {
    fn from_u8(value: u8) -> Self {
        match value {
            0 => Self::Created,
            1 => Self::Counting,
            2 => Self::Merged,
            3 => Self::Distributing,
            4 => Self::Distributed,
            _ => Self::Completed,
        }
    }
}

/// Per-part scratch, padded to its own cache line so neighbouring parts do not contend.
#[cuneiform]
pub(crate) struct Part {
    pub scratch: Mutex<PartScratch>,
}

impl Part {
    pub fn new() -> Self {
        Part {
            scratch: Mutex::new(PartScratch::default()),
        }
    }
}

/// One parallel radix step over `span` at `depth`.
pub(crate) struct BigStep {
    pub span: Span,
    pub depth: usize,
    pub parts: Vec<Part>,
    /// Bucket boundaries relative to `span`, set once counting is merged.
    pub bounds: Mutex<Vec<usize>>,
    /// Released when every bucket of this step has been sorted.
    pub join: Arc<Join>,
    pending: AtomicUsize,
    phase: AtomicU8,
}

impl BigStep {
    pub fn new(span: Span, depth: usize, parts: usize, join: Arc<Join>) -> Self {
        Self {
            span,
            depth,
            parts: (0..parts).map(|_| Part::new()).collect(),
            bounds: Mutex::new(Vec::new()),
            join,
            pending: AtomicUsize::new(0),
            phase: AtomicU8::new(Phase::Created as u8),
        }
    }

    /// Range of part `p`.
    pub fn part_span(&self, p: usize) -> Span {
        self.span.part(p, self.parts.len())
    }

    pub fn phase(&self) -> Phase {
        Phase::from_u8(self.phase.load(Ordering::Acquire))
    }

    /// Moves from `from` to its successor `to`. Panics if the step is not in `from`.
    pub fn advance(&self, from: Phase, to: Phase) {
        assert_eq!(
            to as u8,
            from as u8 + 1,
            "step phase transition {from:?} -> {to:?} skips a phase"
        );
        let result = self.phase.compare_exchange(
            from as u8,
            to as u8,
            Ordering::AcqRel,
            Ordering::Acquire,
        );
        assert!(
            result.is_ok(),
            "step phase transition {from:?} -> {to:?} from {:?}",
            self.phase()
        );
    }

    /// Starts a fan-out phase of one task per part.
    pub fn begin(&self, from: Phase, to: Phase) {
        self.pending.store(self.parts.len(), Ordering::Release);
        self.advance(from, to);
    }

    /// Marks one part task of the current phase done. Returns `true` for the last one.
    pub fn finish_part(&self) -> bool {
        let previous = self.pending.fetch_sub(1, Ordering::AcqRel);
        assert!(previous > 0, "step completion counter underflow");
        previous == 1
    }
}

/// Stable handle of a step in the [`JobArena`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub(crate) struct JobId(usize);

/// Owns every running [`BigStep`]. Slots are reused after retirement.
#[derive(Default)]
pub(crate) struct JobArena {
    inner: Mutex<Slots>,
}

#[derive(Default)]
struct Slots {
    steps: Vec<Option<Arc<BigStep>>>,
    free: Vec<usize>,
}

impl JobArena {
    pub fn insert(&self, step: Arc<BigStep>) -> JobId {
        let mut slots = self.inner.lock();
        match slots.free.pop() {
            Some(slot) => {
                slots.steps[slot] = Some(step);
                JobId(slot)
            }
            None => {
                slots.steps.push(Some(step));
                JobId(slots.steps.len() - 1)
            }
        }
    }

    /// Looks up a live step. Panics on a retired handle.
    pub fn get(&self, id: JobId) -> Arc<BigStep> {
        match self.inner.lock().steps.get(id.0) {
            Some(Some(step)) => Arc::clone(step),
            _ => panic!("no live step for {id:?}"),
        }
    }

    /// Removes a step that has reached [`Phase::Completed`].
    pub fn retire(&self, id: JobId) -> Arc<BigStep> {
        let mut slots = self.inner.lock();
        let step = slots
            .steps
            .get_mut(id.0)
            .and_then(Option::take)
            .unwrap_or_else(|| panic!("no live step for {id:?}"));
        assert_eq!(step.phase(), Phase::Completed, "retiring an unfinished step");
        slots.free.push(id.0);
        step
    }

    pub fn live(&self) -> usize {
        let slots = self.inner.lock();
        slots.steps.len() - slots.free.len()
    }
}
