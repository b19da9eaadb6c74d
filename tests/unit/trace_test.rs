//! Tests for the trace sink

use global_executor::core::{EnqueueKind, InMemoryTraceSink, JobPriority, TraceEvent, TraceSink};

fn event(job_id: u64) -> TraceEvent {
    TraceEvent {
        kind: EnqueueKind::Main,
        job_id,
        priority: JobPriority::Default,
        delay: None,
        clock: None,
    }
}

#[test]
fn test_in_memory_trace_sink() {
    let sink = InMemoryTraceSink::new(10);
    sink.record(event(1));
    let events = sink.events();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].job_id, 1);
    assert_eq!(events[0].kind.to_string(), "job_enqueue_main_executor");
}

#[test]
fn test_trace_sink_overflow() {
    let sink = InMemoryTraceSink::new(2);
    sink.record(event(1));
    sink.record(event(2));
    sink.record(event(3));

    let events = sink.events();
    assert_eq!(events.len(), 2);
    assert_eq!(events[0].job_id, 2); // Oldest dropped
    assert_eq!(events[1].job_id, 3);
}

#[test]
fn test_zero_capacity_trace_sink() {
    let sink = InMemoryTraceSink::new(0);
    sink.record(event(1));
    sink.record(event(2));
    assert!(sink.events().is_empty());
}

#[test]
fn test_kind_names() {
    assert_eq!(EnqueueKind::Global.as_str(), "job_enqueue_global");
    assert_eq!(EnqueueKind::GlobalWithDelay.as_str(), "job_enqueue_global_with_delay");
    assert_eq!(EnqueueKind::GlobalWithDeadline.as_str(), "job_enqueue_global_with_deadline");
}
