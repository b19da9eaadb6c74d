//! Telemetry helpers for structured logging and tracing.

/// Target of the per-enqueue trace events.
pub const TRACE_TARGET: &str = "global_executor::trace";

/// Install a default env-filtered fmt subscriber unless the host already set
/// one. Enqueue trace events are emitted at `trace` level on
/// [`TRACE_TARGET`], e.g. `RUST_LOG=global_executor::trace=trace`.
pub fn init_tracing() {
    if tracing::dispatcher::has_been_set() {
        return;
    }
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_thread_names(true)
        .try_init();
}
