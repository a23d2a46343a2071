//! # Introduction
//!
//! cfront parses a single C99 translation unit per invocation.  Its core is
//! the state a context-free C grammar needs in order to consume a
//! context-sensitive token stream: a table of `typedef` names consulted by
//! the tokenizer (the classic "lexer hack"), a line/column cursor, and a
//! diagnostic sink that decides overall pass/fail at the end of the parse.
//!
//! ## Parse pipeline
//!
//! ```text
//! Source → Lexer ⇄ TypedefTable → Parser → AST
//!            ↓                       ↓
//!      PositionCursor         DiagnosticSink → Verdict
//! ```
//!
//! 1. [`driver`]: per-file parse sessions: [`driver::TypedefTable`],
//!    [`driver::PositionCursor`], [`driver::DiagnosticSink`], and
//!    [`driver::ParseSession`], which lends the grammar engine a capability
//!    view ([`driver::Context`]) over all three.
//! 2. [`parser`]: the default grammar engine: a streaming tokenizer that
//!    classifies identifiers through the typedef table, and a recursive
//!    descent parser over a C99 declaration/statement/expression subset
//!    with local error recovery.
//!
//! Any other engine can be driven in place of [`parser::parse::Parser`] by
//! implementing [`driver::GrammarEngine`].

pub mod driver;
pub mod parser;
