//! Structured JSON logger
//!
//! Per OBSERVABILITY.md §3:
//! - One log line = one event
//! - Structured JSON with deterministic key ordering
//! - Synchronous, no buffering
//! - INFO to stdout, WARN and above to stderr

use std::fmt;
use std::io::{self, Write};

/// Log severity levels
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    /// Routine lifecycle events
    Info,
    /// Degraded but functional (e.g. mapping fallback)
    Warn,
    /// Corruption detected and recovered from
    Error,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Info => "INFO",
            Severity::Warn => "WARN",
            Severity::Error => "ERROR",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Renders events as single-line JSON objects.
pub struct Logger;

impl Logger {
    /// Emit one event. The `event` field always comes first, then
    /// `severity`, then the remaining fields sorted by key.
    pub fn emit(severity: Severity, event: &str, fields: &[(&str, &str)]) {
        if severity == Severity::Info {
            Self::emit_to(severity, event, fields, &mut io::stdout());
        } else {
            Self::emit_to(severity, event, fields, &mut io::stderr());
        }
    }

    fn emit_to<W: Write>(severity: Severity, event: &str, fields: &[(&str, &str)], writer: &mut W) {
        let mut line = String::with_capacity(128);

        line.push_str("{\"event\":\"");
        Self::escape_into(&mut line, event);
        line.push_str("\",\"severity\":\"");
        line.push_str(severity.as_str());
        line.push('"');

        let mut sorted: Vec<_> = fields.iter().collect();
        sorted.sort_by_key(|(k, _)| *k);
        for (key, value) in sorted {
            line.push_str(",\"");
            Self::escape_into(&mut line, key);
            line.push_str("\":\"");
            Self::escape_into(&mut line, value);
            line.push('"');
        }

        line.push_str("}\n");

        // One write_all per line; log failure is never propagated
        let _ = writer.write_all(line.as_bytes());
        let _ = writer.flush();
    }

    fn escape_into(out: &mut String, s: &str) {
        for c in s.chars() {
            match c {
                '"' => out.push_str("\\\""),
                '\\' => out.push_str("\\\\"),
                '\n' => out.push_str("\\n"),
                '\r' => out.push_str("\\r"),
                '\t' => out.push_str("\\t"),
                c if c.is_control() => {
                    out.push_str(&format!("\\u{:04x}", c as u32));
                }
                c => out.push(c),
            }
        }
    }
}

#[cfg(test)]
fn capture(severity: Severity, event: &str, fields: &[(&str, &str)]) -> String {
    let mut buffer = Vec::new();
    Logger::emit_to(severity, event, fields, &mut buffer);
    String::from_utf8(buffer).unwrap()
}
