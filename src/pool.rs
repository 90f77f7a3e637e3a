//! Unordered task queue shared by a fixed set of worker threads.
//!
//! Submitting never blocks. Workers block in [`WorkQueue::next`] until a task or a stop
//! message arrives; while blocked they count as idle, which is what
//! [`WorkQueue::has_idle`] reports to jobs looking for someone to hand work to.

use crossbeam_channel::{Receiver, Sender, unbounded};
use std::sync::atomic::{AtomicUsize, Ordering};

enum Message<J> {
    Run(J),
    Stop,
}

pub(crate) struct WorkQueue<J> {
    tx: Sender<Message<J>>,
    rx: Receiver<Message<J>>,
    idle: AtomicUsize,
}

impl<J: Send> WorkQueue<J> {
    pub fn new() -> Self {
        let (tx, rx) = unbounded();
        Self {
            tx,
            rx,
            idle: AtomicUsize::new(0),
        }
    }

    pub fn submit(&self, job: J) {
        // The queue owns a receiver, so the channel cannot be disconnected.
        let _ = self.tx.send(Message::Run(job));
    }

    /// Blocks until a task is available. Returns `None` once the worker is told to stop.
    pub fn next(&self) -> Option<J> {
        self.idle.fetch_add(1, Ordering::AcqRel);
        let message = self.rx.recv();
        self.idle.fetch_sub(1, Ordering::AcqRel);
        match message {
            Ok(Message::Run(job)) => Some(job),
            Ok(Message::Stop) | Err(_) => None,
        }
    }

    /// Whether some worker is waiting with nothing queued for it.
    pub fn has_idle(&self) -> bool {
        self.idle.load(Ordering::Acquire) > 0 && self.rx.is_empty()
    }

    /// Tells `workers` workers to exit once the tasks queued before this call are taken.
    pub fn stop(&self, workers: usize) {
        for _ in 0..workers {
            let _ = self.tx.send(Message::Stop);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicU64;
    use std::time::{Duration, Instant};

    #[test]
    fn test_workers_drain_queue_then_stop() {
        let queue = WorkQueue::new();
        let total = AtomicU64::new(0);
        for i in 1..=100u64 {
            queue.submit(i);
        }
        std::thread::scope(|s| {
            for _ in 0..4 {
                s.spawn(|| {
                    while let Some(i) = queue.next() {
                        total.fetch_add(i, Ordering::Relaxed);
                    }
                });
            }
            queue.stop(4);
        });
        assert_eq!(total.load(Ordering::Relaxed), 5050);
    }

    #[test]
    fn test_has_idle_reports_waiting_worker() {
        let queue: WorkQueue<u32> = WorkQueue::new();
        assert!(!queue.has_idle());
        std::thread::scope(|s| {
            s.spawn(|| while queue.next().is_some() {});

            let deadline = Instant::now() + Duration::from_secs(10);
            while !queue.has_idle() && Instant::now() < deadline {
                std::thread::sleep(Duration::from_millis(1));
            }
            assert!(queue.has_idle());
            queue.stop(1);
        });
    }
}
