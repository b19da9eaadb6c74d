//! Time-ordered wait structure for delayed jobs.

use std::cmp::Ordering;
use std::collections::BinaryHeap;
use std::time::{Duration, Instant};

use crate::core::{Job, JobDelay};

/// Start time for a job delayed by `delay`, capped far in the future.
pub(crate) fn start_time(delay: JobDelay) -> Instant {
    const FAR_FUTURE: Duration = Duration::from_secs(60 * 60 * 24 * 365 * 30);
    let now = Instant::now();
    now.checked_add(delay.as_duration())
        .unwrap_or_else(|| now + FAR_FUTURE)
}

/// A job waiting for its start time.
struct TimerEntry {
    when: Instant,
    seq: u64,
    job: Job,
}

impl PartialEq for TimerEntry {
    fn eq(&self, other: &Self) -> bool {
        self.when == other.when && self.seq == other.seq
    }
}

impl Eq for TimerEntry {}

impl PartialOrd for TimerEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for TimerEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        // Earliest first (reversed for max-heap), FIFO for equal start times
        other
            .when
            .cmp(&self.when)
            .then_with(|| other.seq.cmp(&self.seq))
    }
}

/// Min-heap of delayed jobs keyed by start time.
#[derive(Default)]
pub(crate) struct TimerHeap {
    entries: BinaryHeap<TimerEntry>,
    next_seq: u64,
}

impl TimerHeap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, when: Instant, job: Job) {
        let seq = self.next_seq;
        self.next_seq += 1;
        self.entries.push(TimerEntry { when, seq, job });
    }

    /// Start time of the earliest waiting job.
    pub fn next_deadline(&self) -> Option<Instant> {
        self.entries.peek().map(|e| e.when)
    }

    /// Remove the earliest job if its start time is at or before `now`.
    pub fn pop_due(&mut self, now: Instant) -> Option<Job> {
        if self.entries.peek()?.when <= now {
            self.entries.pop().map(|e| e.job)
        } else {
            None
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[cfg(test)]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
