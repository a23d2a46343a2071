//! Parse-session driver
//!
//! This module owns the stateful services a grammar engine needs to parse
//! one C file, and the verdict logic that decides whether the parse
//! passed:
//! - [`typedefs`]: the typedef-name table (the "lexer hack" side channel)
//! - [`position`]: 1-based line/column tracking for diagnostics
//! - [`diagnostics`]: formatted error accumulation and counting
//! - [`session`]: the per-file session that owns all of the above and
//!   lends the engine a capability view while it runs
//!
//! [`load_and_parse`] is the outermost entry: it binds one input path,
//! runs one fresh session with the default engine, and maps the outcome
//! to a process exit status.

pub mod diagnostics;
pub mod position;
pub mod session;
pub mod typedefs;

pub use diagnostics::DiagnosticSink;
pub use position::{PositionCursor, SourceLocation};
pub use session::{Context, GrammarEngine, ParseSession};
pub use typedefs::TypedefTable;

use std::fs;
use std::io::{self, Write};
use std::path::Path;

use crate::parser::parse::Parser;

/// Final outcome of one input's parse.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    /// The engine completed and no diagnostics were recorded.
    Succeeded,
    /// The engine aborted, or at least one diagnostic was recorded.
    FailedSyntax,
    /// The input could not be opened; the parse never started.
    FailedToOpen,
}

impl Verdict {
    /// Process exit code: 0 success, 1 syntax failure, 2 unreadable input.
    pub fn exit_code(self) -> u8 {
        match self {
            Verdict::Succeeded => 0,
            Verdict::FailedSyntax => 1,
            Verdict::FailedToOpen => 2,
        }
    }
}

/// Sentinel line emitted on stdout when a parse fails, so build tooling
/// can detect failure without interpreting exit codes.
pub const FAILURE_SENTINEL: &str = "ERROR";

/// Open `path`, run one parse session over it with the default engine,
/// and report the verdict.
///
/// Exactly one input is processed per call; batching is the caller's
/// concern and every file gets a fresh session.  The file is read in full
/// before the session starts, so no handle is held during the parse and
/// nothing leaks on the failed-to-open path.
pub fn load_and_parse(path: &Path) -> Verdict {
    let mut session = ParseSession::new();

    let source = match fs::read_to_string(path) {
        Ok(source) => source,
        Err(err) => {
            eprintln!("Cannot open '{}': {}", path.display(), err);
            return session.fail_to_open();
        }
    };

    let name = path.display().to_string();
    log::debug!("parsing {}", name);
    session.start(&name);

    let mut engine = Parser::new(&source);
    let verdict = session.run(&mut engine);

    if verdict == Verdict::FailedSyntax {
        let _ = writeln!(io::stdout(), "{}", FAILURE_SENTINEL);
    }
    log::debug!(
        "{}: {:?} with {} error(s)",
        name,
        verdict,
        session.error_count()
    );

    verdict
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exit_codes_are_distinct() {
        assert_eq!(Verdict::Succeeded.exit_code(), 0);
        assert_eq!(Verdict::FailedSyntax.exit_code(), 1);
        assert_eq!(Verdict::FailedToOpen.exit_code(), 2);
    }
}
