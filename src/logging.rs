//! Structured event logging for the CLI.
//!
//! One JSON object per line, written synchronously. Field order is
//! deterministic: `event` first, then `severity`, then the remaining
//! fields sorted by key. Library code never logs; only the CLI emits
//! events, and only when asked to be verbose.

use std::fmt;
use std::io::{self, Write};

/// Event severity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    Info,
    Warn,
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

/// Synchronous line logger.
pub struct Logger;

impl Logger {
    /// Log an INFO event to stdout.
    pub fn info(event: &str, fields: &[(&str, &str)]) {
        Self::write_to(&mut io::stdout(), Severity::Info, event, fields);
    }

    /// Log a WARN event to stderr.
    pub fn warn(event: &str, fields: &[(&str, &str)]) {
        Self::write_to(&mut io::stderr(), Severity::Warn, event, fields);
    }

    /// Log an ERROR event to stderr.
    pub fn error(event: &str, fields: &[(&str, &str)]) {
        Self::write_to(&mut io::stderr(), Severity::Error, event, fields);
    }

    fn write_to<W: Write>(writer: &mut W, severity: Severity, event: &str, fields: &[(&str, &str)]) {
        let mut line = String::with_capacity(128);
        line.push_str("{\"event\":\"");
        escape_into(&mut line, event);
        line.push_str("\",\"severity\":\"");
        line.push_str(severity.as_str());
        line.push('"');

        let mut sorted: Vec<_> = fields.iter().collect();
        sorted.sort_by_key(|(k, _)| *k);
        for (key, value) in sorted {
            line.push_str(",\"");
            escape_into(&mut line, key);
            line.push_str("\":\"");
            escape_into(&mut line, value);
            line.push('"');
        }
        line.push_str("}\n");

        let _ = writer.write_all(line.as_bytes());
        let _ = writer.flush();
    }
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

#[cfg(test)]
mod tests {
    use super::*;

    fn capture(severity: Severity, event: &str, fields: &[(&str, &str)]) -> String {
        let mut buffer = Vec::new();
        Logger::write_to(&mut buffer, severity, event, fields);
        String::from_utf8(buffer).unwrap()
    }

    #[test]
    fn test_valid_json_one_line() {
        let line = capture(Severity::Info, "VALIDATE_OK", &[("file", "data.json")]);
        assert!(line.ends_with('\n'));
        let parsed: serde_json::Value = serde_json::from_str(&line).unwrap();
        assert_eq!(parsed["event"], "VALIDATE_OK");
        assert_eq!(parsed["severity"], "INFO");
        assert_eq!(parsed["file"], "data.json");
    }

    #[test]
    fn test_fields_sorted_deterministically() {
        let a = capture(Severity::Info, "E", &[("z", "1"), ("a", "2")]);
        let b = capture(Severity::Info, "E", &[("a", "2"), ("z", "1")]);
        assert_eq!(a, b);
        assert!(a.find("\"a\"").unwrap() < a.find("\"z\"").unwrap());
    }

    #[test]
    fn test_escaping() {
        let line = capture(Severity::Error, "E", &[("msg", "say \"hi\"\nnewline")]);
        let parsed: serde_json::Value = serde_json::from_str(&line).unwrap();
        assert_eq!(parsed["msg"], "say \"hi\"\nnewline");
    }
}
