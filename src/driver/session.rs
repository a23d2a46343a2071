//! Parse-session lifecycle and the capability seam between the driver and
//! the grammar engine.
//!
//! A [`ParseSession`] owns the mutable state of exactly one input's parse:
//! the typedef table, the position cursor, and the diagnostic sink.  None
//! of that state is global; concurrent parses of different inputs just use
//! independent sessions.
//!
//! The grammar engine never touches the session directly.  For the
//! duration of [`ParseSession::run`] it is lent a [`Context`], which
//! exposes exactly the operations an engine may call (typedef query and
//! registration, position advancement, diagnostic reporting) and
//! nothing else.  Tests exploit the same seam to inject fake engines and
//! observe which capability calls occur.

use std::fmt;

use super::diagnostics::DiagnosticSink;
use super::position::{PositionCursor, SourceLocation};
use super::typedefs::TypedefTable;
use super::Verdict;

/// Session lifecycle: `Idle → Running → Finished(verdict)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
enum State {
    #[default]
    Idle,
    Running,
    Finished(Verdict),
}

/// A grammar engine drives tokenization and reduction to completion over
/// the capability view lent by the session.
///
/// The return value follows the yacc convention: 0 means the engine ran to
/// grammatical completion (possibly after local error recovery), non-zero
/// means it aborted in an unrecoverable state.  The session does not trust
/// this code alone; see [`ParseSession::finish`].
///
/// Implemented for closures, so a test can write
/// `session.run(&mut |ctx: &mut Context<'_>| { ...; 0 })`.
pub trait GrammarEngine {
    fn run(&mut self, ctx: &mut Context<'_>) -> i32;
}

impl<F> GrammarEngine for F
where
    F: FnMut(&mut Context<'_>) -> i32,
{
    fn run(&mut self, ctx: &mut Context<'_>) -> i32 {
        self(ctx)
    }
}

/// Capability view over one session's state, lent to the grammar engine
/// for the duration of one parse.
pub struct Context<'a> {
    file: &'a str,
    typedefs: &'a mut TypedefTable,
    cursor: &'a mut PositionCursor,
    sink: &'a mut DiagnosticSink,
}

impl Context<'_> {
    /// Whether `name` has been registered as a typedef name in this parse.
    pub fn is_type_name(&self, name: &str) -> bool {
        self.typedefs.is_type_name(name)
    }

    /// Register `name` as a typedef name.  Idempotent.
    pub fn register_type_name(&mut self, name: &str) {
        self.typedefs.register_type_name(name);
    }

    /// Advance the position cursor past consumed text.  Called by the
    /// tokenizer once per lexical unit, including whitespace and comments.
    pub fn advance(&mut self, consumed: &str) {
        self.cursor.advance(consumed);
    }

    /// Current cursor position.
    pub fn position(&self) -> SourceLocation {
        self.cursor.current()
    }

    /// Report a diagnostic at the current cursor position.
    pub fn report(&mut self, args: fmt::Arguments<'_>) {
        let location = self.cursor.current();
        self.sink.report(self.file, location, args);
    }

    /// Report a diagnostic at an explicit position, e.g. the start of the
    /// offending token.
    pub fn report_at(&mut self, location: SourceLocation, args: fmt::Arguments<'_>) {
        self.sink.report(self.file, location, args);
    }

    /// Number of diagnostics reported so far in this parse.
    pub fn error_count(&self) -> usize {
        self.sink.error_count()
    }

    /// Display name of the input being parsed.
    pub fn file(&self) -> &str {
        self.file
    }
}

/// Orchestrates one parse of one input.
///
/// The session resets its members on [`start`], lends them to the grammar
/// engine through [`run`], and combines the engine's return code with the
/// diagnostic count into a final [`Verdict`].  Terminal states are final
/// for that input; parsing another input requires `start` again, which
/// fully resets member state; nothing leaks between inputs.
///
/// [`start`]: ParseSession::start
/// [`run`]: ParseSession::run
#[derive(Debug, Default)]
pub struct ParseSession {
    file: String,
    state: State,
    typedefs: TypedefTable,
    cursor: PositionCursor,
    sink: DiagnosticSink,
}

impl ParseSession {
    pub fn new() -> Self {
        Self {
            file: String::new(),
            state: State::Idle,
            typedefs: TypedefTable::new(),
            cursor: PositionCursor::new(),
            sink: DiagnosticSink::new(),
        }
    }

    /// Bind a new input and reset all per-parse state: the typedef table
    /// empties, the cursor returns to (1, 1), and the diagnostic count
    /// drops to zero.
    pub fn start(&mut self, input_name: &str) {
        self.file.clear();
        self.file.push_str(input_name);
        self.typedefs.clear();
        self.cursor.reset();
        self.sink.clear();
        self.state = State::Running;
    }

    /// The caller could not open the underlying resource.  The session
    /// moves straight to its terminal [`Verdict::FailedToOpen`] state
    /// without ever running; no diagnostics are emitted.
    pub fn fail_to_open(&mut self) -> Verdict {
        self.state = State::Finished(Verdict::FailedToOpen);
        Verdict::FailedToOpen
    }

    /// Lend the engine a capability view and finalize with its return
    /// code.  Must follow [`start`].
    ///
    /// [`start`]: ParseSession::start
    pub fn run<E: GrammarEngine + ?Sized>(&mut self, engine: &mut E) -> Verdict {
        debug_assert_eq!(self.state, State::Running, "run() requires start()");
        let code = engine.run(&mut Context {
            file: &self.file,
            typedefs: &mut self.typedefs,
            cursor: &mut self.cursor,
            sink: &mut self.sink,
        });
        self.finish(code)
    }

    /// Transition out of `Running` with the engine's raw completion code.
    ///
    /// The verdict is a dual check: the parse failed if the engine aborted
    /// (non-zero) OR if any diagnostics were recorded.  An engine may
    /// resynchronize through local error productions and still return 0,
    /// so the return code alone must never be believed.
    pub fn finish(&mut self, engine_return_code: i32) -> Verdict {
        let verdict = if engine_return_code != 0 || self.sink.error_count() > 0 {
            Verdict::FailedSyntax
        } else {
            Verdict::Succeeded
        };
        self.state = State::Finished(verdict);
        verdict
    }

    /// The final verdict, once the session has left `Running`.
    pub fn verdict(&self) -> Option<Verdict> {
        match self.state {
            State::Finished(verdict) => Some(verdict),
            _ => None,
        }
    }

    pub fn error_count(&self) -> usize {
        self.sink.error_count()
    }

    /// Formatted diagnostics recorded by the current (or last) parse.
    pub fn diagnostics(&self) -> &[String] {
        self.sink.messages()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clean_engine_succeeds() {
        let mut session = ParseSession::new();
        session.start("clean.c");
        let verdict = session.run(&mut |_ctx: &mut Context<'_>| 0);
        assert_eq!(verdict, Verdict::Succeeded);
        assert_eq!(session.verdict(), Some(Verdict::Succeeded));
        assert_eq!(session.error_count(), 0);
    }

    #[test]
    fn test_engine_abort_fails_even_without_diagnostics() {
        let mut session = ParseSession::new();
        session.start("abort.c");
        let verdict = session.run(&mut |_ctx: &mut Context<'_>| 1);
        assert_eq!(verdict, Verdict::FailedSyntax);
        assert_eq!(session.error_count(), 0);
    }

    #[test]
    fn test_diagnostics_fail_even_when_engine_returns_zero() {
        // An engine that recovers locally reports the error but still
        // completes; the dual check must not believe the zero.
        let mut session = ParseSession::new();
        session.start("recovered.c");
        let verdict = session.run(&mut |ctx: &mut Context<'_>| {
            ctx.report(format_args!("syntax error"));
            0
        });
        assert_eq!(verdict, Verdict::FailedSyntax);
        assert_eq!(session.error_count(), 1);
    }

    #[test]
    fn test_capability_calls_are_observable() {
        let mut session = ParseSession::new();
        session.start("caps.c");
        session.run(&mut |ctx: &mut Context<'_>| {
            assert!(!ctx.is_type_name("Foo"));
            ctx.register_type_name("Foo");
            assert!(ctx.is_type_name("Foo"));

            assert_eq!(ctx.position(), SourceLocation::new(1, 1));
            ctx.advance("typedef int Foo;\n");
            assert_eq!(ctx.position(), SourceLocation::new(2, 1));

            assert_eq!(ctx.file(), "caps.c");
            0
        });
    }

    #[test]
    fn test_report_count_across_interleavings() {
        let mut session = ParseSession::new();
        session.start("mixed.c");
        session.run(&mut |ctx: &mut Context<'_>| {
            ctx.register_type_name("A");
            ctx.report(format_args!("one"));
            assert!(ctx.is_type_name("A"));
            ctx.report(format_args!("two"));
            ctx.register_type_name("B");
            ctx.report_at(SourceLocation::new(9, 4), format_args!("three"));
            assert_eq!(ctx.error_count(), 3);
            0
        });
        assert_eq!(session.error_count(), 3);
        assert_eq!(session.diagnostics()[2], "mixed.c:9:4: error: three");
    }

    #[test]
    fn test_restart_clears_all_state() {
        let mut session = ParseSession::new();
        session.start("first.c");
        let verdict = session.run(&mut |ctx: &mut Context<'_>| {
            ctx.register_type_name("Leak");
            ctx.advance("some\ntext");
            ctx.report(format_args!("bad"));
            1
        });
        assert_eq!(verdict, Verdict::FailedSyntax);

        // A failed session must not affect the next input's verdict.
        session.start("second.c");
        let verdict = session.run(&mut |ctx: &mut Context<'_>| {
            assert!(!ctx.is_type_name("Leak"));
            assert_eq!(ctx.position(), SourceLocation::new(1, 1));
            assert_eq!(ctx.error_count(), 0);
            0
        });
        assert_eq!(verdict, Verdict::Succeeded);
        assert_eq!(session.error_count(), 0);
        assert!(session.diagnostics().is_empty());
    }

    #[test]
    fn test_fail_to_open_is_terminal_with_no_diagnostics() {
        let mut session = ParseSession::new();
        let verdict = session.fail_to_open();
        assert_eq!(verdict, Verdict::FailedToOpen);
        assert_eq!(session.verdict(), Some(Verdict::FailedToOpen));
        assert_eq!(session.error_count(), 0);
    }

    #[test]
    fn test_verdict_is_none_while_running() {
        let mut session = ParseSession::new();
        assert_eq!(session.verdict(), None);
        session.start("pending.c");
        assert_eq!(session.verdict(), None);
    }
}
