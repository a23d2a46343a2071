//! Diagnostic accumulation and formatting.
//!
//! Every syntax violation reported during a parse becomes one line of the
//! form `<file>:<line>:<column>: error: <message>`.  The format is stable:
//! build tooling greps for it, so nothing may be inserted before the
//! message and line/column are plain decimal integers.

use std::fmt;
use std::io::{self, Write};

use super::position::SourceLocation;

/// Accumulates formatted diagnostics and the running error count for one
/// parse.
///
/// Reporting is infallible: a sink that cannot write a diagnostic has no
/// sane fallback, so write errors on the output stream are swallowed and
/// the in-memory copy is kept regardless.  The count is read at
/// end-of-parse to decide the session verdict.
#[derive(Debug, Default)]
pub struct DiagnosticSink {
    messages: Vec<String>,
}

impl DiagnosticSink {
    pub fn new() -> Self {
        Self {
            messages: Vec::new(),
        }
    }

    /// Format and record one diagnostic, incrementing the error count by
    /// exactly one.  The message template plus arguments come in as
    /// [`fmt::Arguments`], built with `format_args!` at the call site.
    pub fn report(&mut self, file: &str, location: SourceLocation, args: fmt::Arguments<'_>) {
        let line = format!(
            "{}:{}:{}: error: {}",
            file, location.line, location.column, args
        );
        let _ = writeln!(io::stdout(), "{}", line);
        self.messages.push(line);
    }

    /// Number of diagnostics reported since the last reset.  Monotonically
    /// non-decreasing within a session.
    pub fn error_count(&self) -> usize {
        self.messages.len()
    }

    /// The recorded diagnostics, in emission order.
    pub fn messages(&self) -> &[String] {
        &self.messages
    }

    /// Drop all recorded diagnostics.  Only valid at session (re)start.
    pub fn clear(&mut self) {
        self.messages.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fresh_sink_is_empty() {
        let sink = DiagnosticSink::new();
        assert_eq!(sink.error_count(), 0);
        assert!(sink.messages().is_empty());
    }

    #[test]
    fn test_count_tracks_reports() {
        let mut sink = DiagnosticSink::new();
        for n in 1..=5 {
            sink.report(
                "main.c",
                SourceLocation::new(n, 1),
                format_args!("error number {}", n),
            );
            assert_eq!(sink.error_count(), n);
        }
    }

    #[test]
    fn test_message_format_is_exact() {
        let mut sink = DiagnosticSink::new();
        sink.report(
            "src/main.c",
            SourceLocation::new(3, 17),
            format_args!("Expected ';' after expression, found '}}'"),
        );
        assert_eq!(
            sink.messages(),
            &["src/main.c:3:17: error: Expected ';' after expression, found '}'".to_owned()]
        );
    }

    #[test]
    fn test_messages_keep_emission_order() {
        let mut sink = DiagnosticSink::new();
        sink.report("a.c", SourceLocation::new(1, 1), format_args!("first"));
        sink.report("a.c", SourceLocation::new(2, 9), format_args!("second"));
        assert_eq!(sink.messages()[0], "a.c:1:1: error: first");
        assert_eq!(sink.messages()[1], "a.c:2:9: error: second");
    }

    #[test]
    fn test_clear_resets_count_and_messages() {
        let mut sink = DiagnosticSink::new();
        sink.report("a.c", SourceLocation::new(1, 1), format_args!("oops"));
        sink.clear();
        assert_eq!(sink.error_count(), 0);
        assert!(sink.messages().is_empty());
    }
}
