//! Human-readable progress channel.
//!
//! Long-running operations accept an optional sink for status strings. This
//! is an observability hook for callers (a UI, a test), not a control
//! interface — absence never changes behavior. Structured logging stays on
//! `tracing` regardless.

/// A callback receiving one progress message at a time.
pub type StatusSink<'a> = dyn Fn(&str) + Send + Sync + 'a;

/// Sends a message to the sink if one is attached.
pub fn report(sink: Option<&StatusSink<'_>>, message: &str) {
    if let Some(sink) = sink {
        sink(message);
    }
}
