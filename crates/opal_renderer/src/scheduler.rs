//! Work queue for the scan-line scheduler.
//!
//! The queue is the only mutable state the render workers share. Workers
//! block on a condition variable instead of polling, and a closed, drained
//! queue releases them for good.

use std::collections::VecDeque;
use std::num::NonZeroUsize;
use std::sync::{Condvar, Mutex};
use std::thread;

struct QueueState<T> {
    jobs: VecDeque<T>,
    closed: bool,
}

/// A FIFO job queue shared between one producer and a pool of workers.
pub struct JobQueue<T> {
    state: Mutex<QueueState<T>>,
    ready: Condvar,
}

impl<T> JobQueue<T> {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(QueueState {
                jobs: VecDeque::new(),
                closed: false,
            }),
            ready: Condvar::new(),
        }
    }

    /// Enqueue a job and wake one waiting worker.
    pub fn push(&self, job: T) {
        let mut state = self.state.lock().expect("job queue lock poisoned");
        state.jobs.push_back(job);
        drop(state);
        self.ready.notify_one();
    }

    /// Mark the queue complete: workers drain what is queued and then see
    /// `None`.
    pub fn close(&self) {
        let mut state = self.state.lock().expect("job queue lock poisoned");
        state.closed = true;
        drop(state);
        self.ready.notify_all();
    }

    /// Abandon all queued jobs and close. Returns how many jobs were
    /// dropped. In-flight jobs run to completion; this only cancels work
    /// that never started.
    pub fn cancel(&self) -> usize {
        let mut state = self.state.lock().expect("job queue lock poisoned");
        let dropped = state.jobs.len();
        state.jobs.clear();
        state.closed = true;
        drop(state);
        self.ready.notify_all();
        dropped
    }

    /// Take the next job, blocking while the queue is open but empty.
    /// Returns `None` once the queue is closed and drained.
    pub fn next_job(&self) -> Option<T> {
        let mut state = self.state.lock().expect("job queue lock poisoned");
        loop {
            if let Some(job) = state.jobs.pop_front() {
                return Some(job);
            }
            if state.closed {
                return None;
            }
            state = self.ready.wait(state).expect("job queue lock poisoned");
        }
    }

    /// Number of jobs currently waiting.
    pub fn len(&self) -> usize {
        self.state.lock().expect("job queue lock poisoned").jobs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<T> Default for JobQueue<T> {
    fn default() -> Self {
        Self::new()
    }
}

/// Resolve a requested worker count; zero asks for the host's processor
/// count.
pub fn worker_count(requested: usize) -> usize {
    if requested > 0 {
        requested
    } else {
        thread::available_parallelism()
            .map(NonZeroUsize::get)
            .unwrap_or(1)
    }
}
