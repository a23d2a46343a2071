//! Main parser coordinator
//!
//! This module provides the [`Parser`] struct and core parsing
//! infrastructure: the error type, token-buffer helpers, and the engine
//! entry point with its error-recovery loop.
//!
//! # Parser Architecture
//!
//! The Parser uses a recursive descent approach with the following
//! organization:
//! - This module: Parser struct, helper methods, recovery, and the
//!   [`GrammarEngine`] implementation
//! - `declarations`: declaration specifiers, declarators, typedefs
//! - `statements`: statement parsing (if, while, for, etc.)
//! - `expressions`: expression parsing with precedence climbing
//!
//! Parser methods are split across multiple files using `impl Parser`
//! blocks, allowing each module to extend the Parser with related
//! functionality while maintaining access to the shared parser state.
//!
//! # Error recovery
//!
//! Tokenization is pulled one token at a time through the session
//! [`Context`], so typedef registrations made while reducing one
//! declaration affect classification of the very next token.  Syntax
//! errors are reported through the context and recovered locally by
//! skipping to the next declaration or statement boundary; the engine
//! only aborts (non-zero return) when the error count passes
//! [`MAX_ERRORS`].

use std::collections::VecDeque;

use thiserror::Error;

use crate::driver::{Context, GrammarEngine, SourceLocation};
use crate::parser::ast::TranslationUnit;
use crate::parser::lexer::{LexError, Lexer, Token};

/// Parser error type
#[derive(Error, Debug, Clone)]
#[error("{location}: {message}")]
pub struct SyntaxError {
    pub message: String,
    pub location: SourceLocation,
}

impl From<LexError> for SyntaxError {
    fn from(err: LexError) -> Self {
        SyntaxError {
            message: err.message,
            location: err.location,
        }
    }
}

/// Placeholder location for discriminant-only token comparisons.
pub(crate) const NOWHERE: SourceLocation = SourceLocation { line: 0, column: 0 };

/// Diagnostic budget: past this many errors the engine gives up instead
/// of producing a cascade of follow-on noise.
pub(crate) const MAX_ERRORS: usize = 20;

/// Expression nesting bound, guarding the recursive descent against
/// stack overflow on pathological input.
pub(crate) const MAX_EXPR_DEPTH: usize = 256;

/// Recursive descent parser for a C99 subset, usable as the default
/// grammar engine of a parse session.
///
/// One instance parses its source once; create a new `Parser` for another
/// run.
pub struct Parser {
    pub(crate) lexer: Lexer,
    pub(crate) lookahead: VecDeque<Token>,
    pub(crate) last_location: SourceLocation,
    pub(crate) depth: usize,
    unit: TranslationUnit,
}

impl GrammarEngine for Parser {
    fn run(&mut self, ctx: &mut Context<'_>) -> i32 {
        self.depth = 0;
        let mut nodes = Vec::new();
        let code = self.run_to_completion(ctx, &mut nodes);
        self.unit = TranslationUnit { nodes };
        code
    }
}

impl Parser {
    pub fn new(source: &str) -> Self {
        Self {
            lexer: Lexer::new(source),
            lookahead: VecDeque::new(),
            last_location: SourceLocation::new(1, 1),
            depth: 0,
            unit: TranslationUnit::new(),
        }
    }

    /// The AST built by the last run; partial if the parse failed.
    pub fn unit(&self) -> &TranslationUnit {
        &self.unit
    }

    /// Parse external declarations until end of input, recovering from
    /// syntax errors at declaration boundaries.
    fn run_to_completion(
        &mut self,
        ctx: &mut Context<'_>,
        nodes: &mut Vec<crate::parser::ast::AstNode>,
    ) -> i32 {
        loop {
            match self.peek_token(ctx) {
                Ok(Token::Eof(_)) => return 0,
                Ok(_) => {}
                Err(err) => {
                    self.report(ctx, &err);
                    if ctx.error_count() >= MAX_ERRORS {
                        return 1;
                    }
                    continue;
                }
            }

            match self.parse_external_declaration(ctx) {
                Ok(mut decls) => nodes.append(&mut decls),
                Err(err) => {
                    // An error bubbling up after the budget is spent was
                    // already reported at a lower recovery level.
                    if ctx.error_count() >= MAX_ERRORS {
                        return 1;
                    }
                    self.report(ctx, &err);
                    if ctx.error_count() >= MAX_ERRORS {
                        return 1;
                    }
                    self.synchronize(ctx);
                }
            }
        }
    }

    /// Emit one syntax error through the session's diagnostic sink.
    pub(crate) fn report(&mut self, ctx: &mut Context<'_>, err: &SyntaxError) {
        ctx.report_at(err.location, format_args!("{}", err.message));
    }

    /// Panic-mode recovery at the top level: skip to the end of the
    /// current declaration, past the next ';' or past the '}' closing
    /// a brace block we ran into.
    pub(crate) fn synchronize(&mut self, ctx: &mut Context<'_>) {
        let mut depth = 0usize;
        loop {
            let token = match self.peek_token(ctx) {
                Ok(token) => token,
                // Malformed text inside panic mode: the lexer already
                // consumed it, keep skipping without further reports.
                Err(_) => continue,
            };
            match token {
                Token::Eof(_) => return,
                Token::Semicolon(_) if depth == 0 => {
                    let _ = self.advance(ctx);
                    return;
                }
                Token::LBrace(_) => {
                    depth += 1;
                    let _ = self.advance(ctx);
                }
                Token::RBrace(_) => {
                    let _ = self.advance(ctx);
                    if depth <= 1 {
                        return;
                    }
                    depth -= 1;
                }
                _ => {
                    let _ = self.advance(ctx);
                }
            }
        }
    }

    /// Statement-level recovery: skip past the next ';', or stop just
    /// before the '}' that closes the enclosing block.
    pub(crate) fn synchronize_in_block(&mut self, ctx: &mut Context<'_>) {
        let mut depth = 0usize;
        loop {
            let token = match self.peek_token(ctx) {
                Ok(token) => token,
                Err(_) => continue,
            };
            match token {
                Token::Eof(_) => return,
                Token::Semicolon(_) if depth == 0 => {
                    let _ = self.advance(ctx);
                    return;
                }
                Token::LBrace(_) => {
                    depth += 1;
                    let _ = self.advance(ctx);
                }
                Token::RBrace(_) => {
                    if depth == 0 {
                        return;
                    }
                    depth -= 1;
                    let _ = self.advance(ctx);
                }
                _ => {
                    let _ = self.advance(ctx);
                }
            }
        }
    }

    // ===== Token buffer helpers =====

    fn fill(&mut self, ctx: &mut Context<'_>, n: usize) -> Result<(), SyntaxError> {
        while self.lookahead.len() < n {
            let token = self.lexer.next_token(ctx)?;
            self.lookahead.push_back(token);
        }
        Ok(())
    }

    pub(crate) fn peek_token(&mut self, ctx: &mut Context<'_>) -> Result<Token, SyntaxError> {
        self.fill(ctx, 1)?;
        Ok(self.lookahead[0].clone())
    }

    pub(crate) fn peek_ahead(
        &mut self,
        ctx: &mut Context<'_>,
        n: usize,
    ) -> Result<Token, SyntaxError> {
        self.fill(ctx, n + 1)?;
        Ok(self.lookahead[n].clone())
    }

    /// Consume and return the next token.  End of file is never consumed;
    /// it is returned again on every subsequent call.
    pub(crate) fn advance(&mut self, ctx: &mut Context<'_>) -> Result<Token, SyntaxError> {
        self.fill(ctx, 1)?;
        let token = if matches!(self.lookahead[0], Token::Eof(_)) {
            self.lookahead[0].clone()
        } else {
            self.lookahead.pop_front().unwrap()
        };
        self.last_location = token.location();
        Ok(token)
    }

    pub(crate) fn check(
        &mut self,
        ctx: &mut Context<'_>,
        sample: &Token,
    ) -> Result<bool, SyntaxError> {
        let token = self.peek_token(ctx)?;
        Ok(std::mem::discriminant(&token) == std::mem::discriminant(sample))
    }

    pub(crate) fn match_token(
        &mut self,
        ctx: &mut Context<'_>,
        sample: &Token,
    ) -> Result<bool, SyntaxError> {
        if self.check(ctx, sample)? {
            self.advance(ctx)?;
            Ok(true)
        } else {
            Ok(false)
        }
    }

    /// Location of the next buffered token, or of the last consumed one
    /// when the buffer is empty.
    pub(crate) fn current_location(&self) -> SourceLocation {
        self.lookahead
            .front()
            .map(|token| token.location())
            .unwrap_or(self.last_location)
    }

    /// Location of the most recently consumed token.
    pub(crate) fn previous_location(&self) -> SourceLocation {
        self.last_location
    }

    pub(crate) fn expect_token(
        &mut self,
        ctx: &mut Context<'_>,
        sample: &Token,
        message: &str,
    ) -> Result<(), SyntaxError> {
        if self.check(ctx, sample)? {
            self.advance(ctx)?;
            Ok(())
        } else {
            let found = self.peek_token(ctx)?;
            Err(SyntaxError {
                message: format!("{}, found {}", message, found),
                location: found.location(),
            })
        }
    }

    /// Consume an identifier and return its name.  Type names are
    /// accepted too: member, label, and declarator namespaces are
    /// separate from the typedef namespace, so `typedef int Foo;` must
    /// not make `Foo` unusable as, say, a struct member.
    pub(crate) fn expect_identifier(
        &mut self,
        ctx: &mut Context<'_>,
        what: &str,
    ) -> Result<String, SyntaxError> {
        match self.peek_token(ctx)? {
            Token::Ident(name, _) | Token::TypeName(name, _) => {
                self.advance(ctx)?;
                Ok(name)
            }
            found => Err(SyntaxError {
                message: format!("Expected {}, found {}", what, found),
                location: found.location(),
            }),
        }
    }

    pub(crate) fn expect_semicolon(
        &mut self,
        ctx: &mut Context<'_>,
        what: &str,
    ) -> Result<(), SyntaxError> {
        self.expect_token(
            ctx,
            &Token::Semicolon(NOWHERE),
            &format!("Expected ';' {what}"),
        )
    }

    pub(crate) fn expect_lparen(
        &mut self,
        ctx: &mut Context<'_>,
        what: &str,
    ) -> Result<(), SyntaxError> {
        self.expect_token(ctx, &Token::LParen(NOWHERE), &format!("Expected '(' {what}"))
    }

    pub(crate) fn expect_rparen(
        &mut self,
        ctx: &mut Context<'_>,
        what: &str,
    ) -> Result<(), SyntaxError> {
        self.expect_token(ctx, &Token::RParen(NOWHERE), &format!("Expected ')' {what}"))
    }

    pub(crate) fn expect_lbrace(
        &mut self,
        ctx: &mut Context<'_>,
        what: &str,
    ) -> Result<(), SyntaxError> {
        self.expect_token(ctx, &Token::LBrace(NOWHERE), &format!("Expected '{{' {what}"))
    }

    pub(crate) fn expect_rbrace(
        &mut self,
        ctx: &mut Context<'_>,
        what: &str,
    ) -> Result<(), SyntaxError> {
        self.expect_token(ctx, &Token::RBrace(NOWHERE), &format!("Expected '}}' {what}"))
    }

    pub(crate) fn expect_rbracket(
        &mut self,
        ctx: &mut Context<'_>,
        what: &str,
    ) -> Result<(), SyntaxError> {
        self.expect_token(
            ctx,
            &Token::RBracket(NOWHERE),
            &format!("Expected ']' {what}"),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::driver::{ParseSession, Verdict};
    use crate::parser::ast::{AstNode, BaseType, BinOp};

    /// Run the default engine over `source` in a fresh session, capturing
    /// the raw engine return code alongside the session verdict.
    fn parse(source: &str) -> (Verdict, i32, ParseSession, Parser) {
        let mut session = ParseSession::new();
        session.start("test.c");
        let mut parser = Parser::new(source);
        let mut code = 0;
        {
            let parser_ref = &mut parser;
            let code_ref = &mut code;
            session.run(&mut |ctx: &mut Context<'_>| {
                *code_ref = parser_ref.run(ctx);
                *code_ref
            });
        }
        let verdict = session.verdict().unwrap();
        (verdict, code, session, parser)
    }

    #[test]
    fn test_parse_simple_function() {
        let (verdict, code, session, parser) = parse("int main(void) { return 0; }");

        assert_eq!(verdict, Verdict::Succeeded);
        assert_eq!(code, 0);
        assert_eq!(session.error_count(), 0);

        assert_eq!(parser.unit().nodes.len(), 1);
        match &parser.unit().nodes[0] {
            AstNode::FunctionDef {
                name,
                params,
                return_type,
                body,
                ..
            } => {
                assert_eq!(name, "main");
                assert!(params.is_empty());
                assert_eq!(return_type.base, BaseType::Int);
                assert_eq!(body.len(), 1);
                assert!(matches!(body[0], AstNode::Return { .. }));
            }
            other => panic!("Expected function definition, got {:?}", other),
        }
    }

    #[test]
    fn test_typedef_then_pointer_declaration() {
        let (verdict, _, session, parser) = parse("typedef int Foo;\nFoo * x;");

        assert_eq!(verdict, Verdict::Succeeded);
        assert_eq!(session.error_count(), 0);

        let nodes = &parser.unit().nodes;
        assert_eq!(nodes.len(), 2);
        match &nodes[0] {
            AstNode::TypedefDecl { name, aliased, .. } => {
                assert_eq!(name, "Foo");
                assert_eq!(aliased.base, BaseType::Int);
            }
            other => panic!("Expected typedef declaration, got {:?}", other),
        }
        match &nodes[1] {
            AstNode::VarDecl { name, var_type, .. } => {
                assert_eq!(name, "x");
                assert_eq!(var_type.base, BaseType::Named("Foo".to_owned()));
                assert_eq!(var_type.pointer_depth, 1);
            }
            other => panic!("Expected variable declaration, got {:?}", other),
        }
    }

    #[test]
    fn test_unregistered_name_is_not_a_declaration() {
        let (verdict, code, session, _) = parse("Foo * x;");

        assert_eq!(verdict, Verdict::FailedSyntax);
        assert_eq!(code, 0);
        assert_eq!(session.error_count(), 1);
        assert!(session.diagnostics()[0]
            .starts_with("test.c:1:1: error: Expected declaration, found identifier 'Foo'"));
    }

    #[test]
    fn test_star_is_multiplication_without_typedef() {
        let source = "int main(void) {\n  int Foo;\n  int x;\n  Foo * x;\n  return 0;\n}\n";
        let (verdict, _, _, parser) = parse(source);

        assert_eq!(verdict, Verdict::Succeeded);
        let body = match &parser.unit().nodes[0] {
            AstNode::FunctionDef { body, .. } => body,
            other => panic!("Expected function definition, got {:?}", other),
        };
        match &body[2] {
            AstNode::ExpressionStatement { expr, .. } => match expr.as_ref() {
                AstNode::BinaryOp {
                    op, left, right, ..
                } => {
                    assert_eq!(*op, BinOp::Mul);
                    assert!(matches!(left.as_ref(), AstNode::Variable(n, _) if n == "Foo"));
                    assert!(matches!(right.as_ref(), AstNode::Variable(n, _) if n == "x"));
                }
                other => panic!("Expected multiplication, got {:?}", other),
            },
            other => panic!("Expected expression statement, got {:?}", other),
        }
    }

    #[test]
    fn test_star_is_declaration_with_typedef() {
        let source = "typedef int Foo;\nint main(void) {\n  Foo * x;\n  return 0;\n}\n";
        let (verdict, _, _, parser) = parse(source);

        assert_eq!(verdict, Verdict::Succeeded);
        let body = match &parser.unit().nodes[1] {
            AstNode::FunctionDef { body, .. } => body,
            other => panic!("Expected function definition, got {:?}", other),
        };
        match &body[0] {
            AstNode::VarDecl { name, var_type, .. } => {
                assert_eq!(name, "x");
                assert_eq!(var_type.base, BaseType::Named("Foo".to_owned()));
                assert_eq!(var_type.pointer_depth, 1);
            }
            other => panic!("Expected variable declaration, got {:?}", other),
        }
    }

    #[test]
    fn test_recovery_reports_once_and_continues() {
        let source = "int main(void) {\n  int x = ;\n  return 0;\n}\n";
        let (verdict, code, session, parser) = parse(source);

        // The engine recovers locally and completes, but the session's
        // dual check still fails the parse.
        assert_eq!(code, 0);
        assert_eq!(session.error_count(), 1);
        assert_eq!(verdict, Verdict::FailedSyntax);
        assert_eq!(
            session.diagnostics()[0],
            "test.c:2:11: error: Unexpected token: ';'"
        );

        // The statement after the bad one survived recovery.
        match &parser.unit().nodes[0] {
            AstNode::FunctionDef { body, .. } => {
                assert_eq!(body.len(), 1);
                assert!(matches!(body[0], AstNode::Return { .. }));
            }
            other => panic!("Expected function definition, got {:?}", other),
        }
    }

    #[test]
    fn test_error_cascade_aborts_the_engine() {
        let source = "@ ".repeat(25);
        let (verdict, code, session, _) = parse(&source);

        assert_eq!(code, 1);
        assert_eq!(session.error_count(), MAX_ERRORS);
        assert_eq!(verdict, Verdict::FailedSyntax);
    }

    #[test]
    fn test_multiple_typedef_declarators() {
        let source = "typedef unsigned long size_t, *size_p;\nsize_t n;\nsize_p p;";
        let (verdict, _, _, parser) = parse(source);

        assert_eq!(verdict, Verdict::Succeeded);
        let nodes = &parser.unit().nodes;
        assert_eq!(nodes.len(), 4);
        match &nodes[0] {
            AstNode::TypedefDecl { name, aliased, .. } => {
                assert_eq!(name, "size_t");
                assert_eq!(aliased.base, BaseType::Long);
                assert!(aliased.is_unsigned);
                assert_eq!(aliased.pointer_depth, 0);
            }
            other => panic!("Expected typedef declaration, got {:?}", other),
        }
        match &nodes[1] {
            AstNode::TypedefDecl { name, aliased, .. } => {
                assert_eq!(name, "size_p");
                assert_eq!(aliased.pointer_depth, 1);
            }
            other => panic!("Expected typedef declaration, got {:?}", other),
        }
        assert!(
            matches!(&nodes[2], AstNode::VarDecl { var_type, .. } if var_type.base == BaseType::Named("size_t".to_owned()))
        );
        assert!(
            matches!(&nodes[3], AstNode::VarDecl { var_type, .. } if var_type.base == BaseType::Named("size_p".to_owned()))
        );
    }

    #[test]
    fn test_typedef_registration_is_file_scoped() {
        // Block scoping is intentionally not modeled: a typedef inside a
        // function stays registered for the rest of the file.
        let source =
            "int main(void) {\n  typedef int Foo;\n  Foo x;\n  return x;\n}\nFoo y;\n";
        let (verdict, _, session, parser) = parse(source);

        assert_eq!(verdict, Verdict::Succeeded);
        assert_eq!(session.error_count(), 0);
        match parser.unit().nodes.last().unwrap() {
            AstNode::VarDecl { name, var_type, .. } => {
                assert_eq!(name, "y");
                assert_eq!(var_type.base, BaseType::Named("Foo".to_owned()));
            }
            other => panic!("Expected variable declaration, got {:?}", other),
        }
    }

    #[test]
    fn test_cast_uses_typedef_name() {
        let source = "typedef int Foo;\nint main(void) {\n  int y;\n  y = (Foo)0;\n  return y;\n}\n";
        let (verdict, _, _, parser) = parse(source);

        assert_eq!(verdict, Verdict::Succeeded);
        let body = match &parser.unit().nodes[1] {
            AstNode::FunctionDef { body, .. } => body,
            other => panic!("Expected function definition, got {:?}", other),
        };
        match &body[1] {
            AstNode::ExpressionStatement { expr, .. } => match expr.as_ref() {
                AstNode::Assignment { rhs, .. } => match rhs.as_ref() {
                    AstNode::Cast { target_type, .. } => {
                        assert_eq!(target_type.base, BaseType::Named("Foo".to_owned()));
                    }
                    other => panic!("Expected cast, got {:?}", other),
                },
                other => panic!("Expected assignment, got {:?}", other),
            },
            other => panic!("Expected expression statement, got {:?}", other),
        }
    }

    #[test]
    fn test_struct_and_enum_definitions() {
        let source = "struct Point { int x; int y; };\nenum Color { RED, GREEN = 2, };";
        let (verdict, _, _, parser) = parse(source);

        assert_eq!(verdict, Verdict::Succeeded);
        let nodes = &parser.unit().nodes;
        match &nodes[0] {
            AstNode::StructDef { name, fields, .. } => {
                assert_eq!(name.as_deref(), Some("Point"));
                assert_eq!(fields.len(), 2);
                assert_eq!(fields[0].name, "x");
                assert_eq!(fields[1].name, "y");
            }
            other => panic!("Expected struct definition, got {:?}", other),
        }
        match &nodes[1] {
            AstNode::EnumDef {
                name, enumerators, ..
            } => {
                assert_eq!(name.as_deref(), Some("Color"));
                assert_eq!(enumerators.len(), 2);
                assert_eq!(enumerators[0].name, "RED");
                assert!(enumerators[0].value.is_none());
                assert!(enumerators[1].value.is_some());
            }
            other => panic!("Expected enum definition, got {:?}", other),
        }
    }

    #[test]
    fn test_function_prototype() {
        let (verdict, _, _, parser) = parse("int add(int a, int b);");

        assert_eq!(verdict, Verdict::Succeeded);
        match &parser.unit().nodes[0] {
            AstNode::FunctionProto { name, params, .. } => {
                assert_eq!(name, "add");
                assert_eq!(params.len(), 2);
                assert_eq!(params[0].name.as_deref(), Some("a"));
                assert_eq!(params[1].name.as_deref(), Some("b"));
            }
            other => panic!("Expected function prototype, got {:?}", other),
        }
    }

    #[test]
    fn test_unterminated_comment_fails_the_parse() {
        let (verdict, code, session, _) = parse("int x; /* open");

        assert_eq!(code, 0);
        assert_eq!(session.error_count(), 1);
        assert_eq!(verdict, Verdict::FailedSyntax);
        assert!(session.diagnostics()[0].contains("Unterminated block comment"));
    }

    #[test]
    fn test_sizeof_type_vs_expression() {
        let source = "int main(void) { int x; x = sizeof(int); x = sizeof x; return x; }";
        let (verdict, _, _, parser) = parse(source);

        assert_eq!(verdict, Verdict::Succeeded);
        let body = match &parser.unit().nodes[0] {
            AstNode::FunctionDef { body, .. } => body,
            other => panic!("Expected function definition, got {:?}", other),
        };
        let rhs_of = |stmt: &AstNode| -> AstNode {
            match stmt {
                AstNode::ExpressionStatement { expr, .. } => match expr.as_ref() {
                    AstNode::Assignment { rhs, .. } => rhs.as_ref().clone(),
                    other => panic!("Expected assignment, got {:?}", other),
                },
                other => panic!("Expected expression statement, got {:?}", other),
            }
        };
        assert!(matches!(rhs_of(&body[1]), AstNode::SizeofType { .. }));
        assert!(matches!(rhs_of(&body[2]), AstNode::SizeofExpr { .. }));
    }

    #[test]
    fn test_for_loop_with_declaration() {
        let source =
            "int main(void) { int s; s = 0; for (int i = 0; i < 10; ++i) s += i; return s; }";
        let (verdict, _, session, parser) = parse(source);

        assert_eq!(verdict, Verdict::Succeeded);
        assert_eq!(session.error_count(), 0);
        let body = match &parser.unit().nodes[0] {
            AstNode::FunctionDef { body, .. } => body,
            other => panic!("Expected function definition, got {:?}", other),
        };
        match &body[2] {
            AstNode::For {
                init,
                condition,
                increment,
                ..
            } => {
                assert_eq!(init.len(), 1);
                assert!(matches!(init[0], AstNode::VarDecl { .. }));
                assert!(condition.is_some());
                assert!(increment.is_some());
            }
            other => panic!("Expected for statement, got {:?}", other),
        }
    }

    #[test]
    fn test_pathological_nesting_is_rejected() {
        let mut expr = String::new();
        for _ in 0..300 {
            expr.push('(');
        }
        expr.push('1');
        for _ in 0..300 {
            expr.push(')');
        }
        let source = format!("int main(void) {{ return {}; }}", expr);
        let (verdict, _, session, _) = parse(&source);

        assert_eq!(verdict, Verdict::FailedSyntax);
        assert!(session
            .diagnostics()
            .iter()
            .any(|d| d.contains("Expression nesting too deep")));
    }
}
