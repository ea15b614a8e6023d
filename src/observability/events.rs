//! Observable store events
//!
//! Per OBSERVABILITY.md §2, events are explicit and typed: an observer can
//! match on the variant instead of parsing log lines. Corruption events are
//! reported, never thrown; recovery is the engine's job.

use super::Severity;

/// Everything the engine reports to its observer.
#[derive(Debug, Clone, PartialEq)]
pub enum StoreEvent {
    /// Store finished opening (after load, verification, and the initial
    /// compaction pass).
    Opened { name: String, entries: usize },
    /// Header-block checksum mismatch or unparseable entry sequence on
    /// load; the index was reset to empty.
    HeaderCorruption { reason: String },
    /// A value failed checksum verification on load; the whole in-memory
    /// index was wiped and the on-disk entry count reset.
    ValueCorruption { key: String },
    /// Memory-mapping a backing file failed; the store fell back to the
    /// bounds-checked file-I/O region.
    MappingFallback { path: String, reason: String },
    /// Compaction physically reclaimed tombstoned bytes.
    Compacted { reclaimed: usize, live: usize },
    /// The header file was grown and remapped.
    HeaderGrown { from: usize, to: usize },
    /// The content file was grown and remapped.
    ContentGrown { from: usize, to: usize },
}

impl StoreEvent {
    /// Stable event name used as the log line's `event` field.
    pub fn name(&self) -> &'static str {
        match self {
            StoreEvent::Opened { .. } => "STORE_OPENED",
            StoreEvent::HeaderCorruption { .. } => "HEADER_CORRUPTION",
            StoreEvent::ValueCorruption { .. } => "VALUE_CORRUPTION",
            StoreEvent::MappingFallback { .. } => "MAPPING_FALLBACK",
            StoreEvent::Compacted { .. } => "COMPACTED",
            StoreEvent::HeaderGrown { .. } => "HEADER_GROWN",
            StoreEvent::ContentGrown { .. } => "CONTENT_GROWN",
        }
    }

    /// Severity the default observer logs this event at.
    pub fn severity(&self) -> Severity {
        match self {
            StoreEvent::HeaderCorruption { .. } | StoreEvent::ValueCorruption { .. } => {
                Severity::Error
            }
            StoreEvent::MappingFallback { .. } => Severity::Warn,
            _ => Severity::Info,
        }
    }

    /// Event payload as key/value pairs for structured logging.
    pub fn fields(&self) -> Vec<(&'static str, String)> {
        match self {
            StoreEvent::Opened { name, entries } => vec![
                ("name", name.clone()),
                ("entries", entries.to_string()),
            ],
            StoreEvent::HeaderCorruption { reason } => vec![("reason", reason.clone())],
            StoreEvent::ValueCorruption { key } => vec![("key", key.clone())],
            StoreEvent::MappingFallback { path, reason } => vec![
                ("path", path.clone()),
                ("reason", reason.clone()),
            ],
            StoreEvent::Compacted { reclaimed, live } => vec![
                ("reclaimed_bytes", reclaimed.to_string()),
                ("live_entries", live.to_string()),
            ],
            StoreEvent::HeaderGrown { from, to } | StoreEvent::ContentGrown { from, to } => vec![
                ("from_bytes", from.to_string()),
                ("to_bytes", to.to_string()),
            ],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_corruption_events_are_errors() {
        let header = StoreEvent::HeaderCorruption {
            reason: "checksum mismatch".to_string(),
        };
        let value = StoreEvent::ValueCorruption {
            key: "player_score".to_string(),
        };
        assert_eq!(header.severity(), Severity::Error);
        assert_eq!(value.severity(), Severity::Error);
    }

    #[test]
    fn test_fallback_is_warn() {
        let event = StoreEvent::MappingFallback {
            path: "/tmp/store.idx".to_string(),
            reason: "mmap failed".to_string(),
        };
        assert_eq!(event.severity(), Severity::Warn);
    }

    #[test]
    fn test_event_names_are_stable() {
        let event = StoreEvent::Compacted {
            reclaimed: 9,
            live: 4,
        };
        assert_eq!(event.name(), "COMPACTED");
        let fields = event.fields();
        assert!(fields.iter().any(|(k, v)| *k == "reclaimed_bytes" && v == "9"));
    }
}
