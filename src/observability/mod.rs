//! Observability for the storage engine
//!
//! Per OBSERVABILITY.md, the engine itself never logs directly: every
//! noteworthy occurrence (corruption recovery, compaction, growth, mapping
//! fallback) is handed to an injected [`StoreObserver`]. The default
//! observer forwards events to the structured JSON [`Logger`]; tests and
//! embedders can substitute their own sink.
//!
//! # Principles
//!
//! 1. Observability is read-only: observers must not mutate store state
//! 2. Synchronous, no buffering, no background threads
//! 3. Deterministic output (one line per event, sorted fields)
//! 4. Observer failure must never abort a store operation

mod events;
mod logger;

pub use events::StoreEvent;
pub use logger::{Logger, Severity};

/// Sink for store lifecycle and corruption events.
///
/// Implementations must be cheap and infallible; the engine calls them
/// inline on the mutation path.
pub trait StoreObserver {
    /// Called once per event, synchronously, on the engine's thread.
    fn observe(&self, event: &StoreEvent);
}

/// Default observer: renders each event as one structured log line.
///
/// Corruption and fallback events go to stderr at WARN/ERROR severity,
/// routine lifecycle events to stdout at INFO.
#[derive(Debug, Default)]
pub struct LogObserver;

impl StoreObserver for LogObserver {
    fn observe(&self, event: &StoreEvent) {
        let fields = event.fields();
        let pairs: Vec<(&str, &str)> = fields
            .iter()
            .map(|(k, v)| (*k, v.as_str()))
            .collect();
        Logger::emit(event.severity(), event.name(), &pairs);
    }
}

/// Observer that discards every event. Useful for embedders that treat the
/// store as a silent component.
#[derive(Debug, Default)]
pub struct NullObserver;

impl StoreObserver for NullObserver {
    fn observe(&self, _event: &StoreEvent) {}
}
