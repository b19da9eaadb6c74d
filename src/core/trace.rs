//! Structured trace events emitted by the enqueue entry points.
//!
//! Every enqueue logs one `tracing` event on target
//! [`TRACE_TARGET`](crate::util::telemetry::TRACE_TARGET) and, if a [`TraceSink`] is attached, records a
//! [`TraceEvent`] there as well.

use std::collections::VecDeque;
use std::fmt;

use parking_lot::Mutex;
use tracing::trace;

use crate::util::telemetry::TRACE_TARGET;

use super::job::{Job, JobId, JobPriority};
use super::time::{ClockId, Deadline, JobDelay};

/// Which entry point produced an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EnqueueKind {
    /// Immediate global enqueue.
    Global,
    /// Delayed global enqueue.
    GlobalWithDelay,
    /// Deadline global enqueue.
    GlobalWithDeadline,
    /// Main executor enqueue.
    Main,
}

impl EnqueueKind {
    /// Stable name used in log fields.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Global => "job_enqueue_global",
            Self::GlobalWithDelay => "job_enqueue_global_with_delay",
            Self::GlobalWithDeadline => "job_enqueue_global_with_deadline",
            Self::Main => "job_enqueue_main_executor",
        }
    }
}

impl fmt::Display for EnqueueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One enqueue, as seen by the trace sink.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TraceEvent {
    /// Entry point.
    pub kind: EnqueueKind,
    /// Enqueued job.
    pub job_id: JobId,
    /// Job priority.
    pub priority: JobPriority,
    /// Delay, for delayed enqueues.
    pub delay: Option<JobDelay>,
    /// Clock, for deadline enqueues.
    pub clock: Option<ClockId>,
}

/// Destination for trace events.
pub trait TraceSink: Send + Sync {
    /// Record an event.
    fn record(&self, event: TraceEvent);
}

/// Bounded in-memory sink for testing and dev.
pub struct InMemoryTraceSink {
    events: Mutex<VecDeque<TraceEvent>>,
    max_events: usize,
}

impl InMemoryTraceSink {
    /// Sink keeping at most `max_events` most recent events.
    #[must_use]
    pub fn new(max_events: usize) -> Self {
        Self {
            events: Mutex::new(VecDeque::with_capacity(max_events)),
            max_events,
        }
    }

    /// Snapshot of stored events.
    #[must_use]
    pub fn events(&self) -> Vec<TraceEvent> {
        self.events.lock().iter().cloned().collect()
    }
}

impl TraceSink for InMemoryTraceSink {
    fn record(&self, event: TraceEvent) {
        if self.max_events == 0 {
            return;
        }
        let mut events = self.events.lock();
        if events.len() >= self.max_events {
            events.pop_front();
        }
        events.push_back(event);
    }
}

pub(crate) fn job_enqueue_global(sink: Option<&dyn TraceSink>, job: &Job) {
    trace!(target: TRACE_TARGET, kind = EnqueueKind::Global.as_str(), job_id = job.id());
    emit(sink, EnqueueKind::Global, job, None, None);
}

pub(crate) fn job_enqueue_global_with_delay(
    sink: Option<&dyn TraceSink>,
    delay: JobDelay,
    job: &Job,
) {
    trace!(
        target: TRACE_TARGET,
        kind = EnqueueKind::GlobalWithDelay.as_str(),
        job_id = job.id(),
        delay_ns = delay.as_nanos(),
    );
    emit(sink, EnqueueKind::GlobalWithDelay, job, Some(delay), None);
}

pub(crate) fn job_enqueue_global_with_deadline(
    sink: Option<&dyn TraceSink>,
    deadline: &Deadline,
    job: &Job,
) {
    trace!(
        target: TRACE_TARGET,
        kind = EnqueueKind::GlobalWithDeadline.as_str(),
        job_id = job.id(),
        clock = ?deadline.clock,
        target_sec = deadline.target.seconds,
        target_nsec = deadline.target.nanoseconds,
    );
    emit(sink, EnqueueKind::GlobalWithDeadline, job, None, Some(deadline.clock));
}

pub(crate) fn job_enqueue_main_executor(sink: Option<&dyn TraceSink>, job: &Job) {
    trace!(target: TRACE_TARGET, kind = EnqueueKind::Main.as_str(), job_id = job.id());
    emit(sink, EnqueueKind::Main, job, None, None);
}

fn emit(
    sink: Option<&dyn TraceSink>,
    kind: EnqueueKind,
    job: &Job,
    delay: Option<JobDelay>,
    clock: Option<ClockId>,
) {
    if let Some(sink) = sink {
        sink.record(TraceEvent {
            kind,
            job_id: job.id(),
            priority: job.priority(),
            delay,
            clock,
        });
    }
}
