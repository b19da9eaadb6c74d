//! Tests for jobs and executor references

use global_executor::core::{ExecutorIdentity, ExecutorRef, Job, JobPriority};
use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

#[test]
fn test_job_ids_are_unique() {
    let ids: HashSet<_> = (0..100).map(|_| Job::new(|| {}).id()).collect();
    assert_eq!(ids.len(), 100);
}

#[test]
fn test_dropping_unrun_job_releases_captures() {
    let state = Arc::new(AtomicBool::new(false));
    let captured = Arc::clone(&state);
    let job = Job::new(move || captured.store(true, Ordering::SeqCst));
    assert_eq!(Arc::strong_count(&state), 2);
    drop(job);
    assert_eq!(Arc::strong_count(&state), 1);
    assert!(!state.load(Ordering::SeqCst));
}

#[test]
fn test_priority_ordering() {
    assert!(JobPriority::UserInteractive > JobPriority::UserInitiated);
    assert!(JobPriority::Utility > JobPriority::Background);
    assert_eq!(JobPriority::Unspecified.effective(), JobPriority::Default);
    assert_eq!(JobPriority::default(), JobPriority::Unspecified);
}

#[test]
fn test_unspecified_priority_ranks_as_default() {
    use std::cmp::Ordering;
    use std::collections::HashSet;

    assert_eq!(JobPriority::Unspecified.cmp(&JobPriority::Default), Ordering::Equal);
    assert!(JobPriority::Unspecified > JobPriority::Utility);
    assert!(JobPriority::Unspecified > JobPriority::Background);
    assert!(JobPriority::Unspecified < JobPriority::UserInitiated);

    let mut sorted = vec![
        JobPriority::UserInteractive,
        JobPriority::Unspecified,
        JobPriority::Background,
        JobPriority::Utility,
    ];
    sorted.sort();
    assert_eq!(
        sorted,
        vec![
            JobPriority::Background,
            JobPriority::Utility,
            JobPriority::Default,
            JobPriority::UserInteractive,
        ]
    );

    let set: HashSet<JobPriority> = [JobPriority::Unspecified, JobPriority::Default].into_iter().collect();
    assert_eq!(set.len(), 1);
}

#[test]
fn test_job_carries_executor() {
    let id = ExecutorIdentity::unique();
    let job = Job::new(|| {}).on_executor(ExecutorRef::generic());
    assert!(job.metadata().executor.as_ref().is_some_and(ExecutorRef::is_generic));
    assert_ne!(id, ExecutorIdentity::GENERIC);
}

#[test]
fn test_executor_ref_equality_is_by_identity() {
    assert_eq!(ExecutorRef::generic(), ExecutorRef::generic());
    assert_eq!(ExecutorRef::generic().identity(), ExecutorIdentity::GENERIC);
    assert!(ExecutorRef::generic().capabilities().is_none());
}
