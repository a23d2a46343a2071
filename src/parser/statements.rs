//! Statement parsing implementation
//!
//! This module handles parsing of C99 statements:
//!
//! - Control flow: `if`, `while`, `do-while`, `for`, `switch`
//! - Jumps: `break`, `continue`, `return`, `goto`, labels
//! - Local declarations, which C99 allows anywhere in a block
//! - Expression statements
//!
//! Statement boundaries are also where error recovery happens inside a
//! function body: a failed statement is reported through the session and
//! the parser skips to the next ';' or to the enclosing '}' before
//! continuing.
//!
//! All parsing methods are implemented as `pub(crate)` methods on the
//! [`Parser`] struct.

use crate::driver::Context;
use crate::parser::ast::{AstNode, CaseNode};
use crate::parser::lexer::Token;
use crate::parser::parse::{Parser, SyntaxError, MAX_ERRORS, NOWHERE};

impl Parser {
    /// Parse statements until the '}' that closes the enclosing block,
    /// reporting and recovering at statement boundaries.
    pub(crate) fn parse_block_statements(
        &mut self,
        ctx: &mut Context<'_>,
    ) -> Result<Vec<AstNode>, SyntaxError> {
        let mut statements = Vec::new();
        loop {
            if matches!(self.peek_token(ctx)?, Token::RBrace(_) | Token::Eof(_)) {
                return Ok(statements);
            }
            match self.parse_statement(ctx, &mut statements) {
                Ok(()) => {}
                Err(err) => {
                    self.report(ctx, &err);
                    if ctx.error_count() >= MAX_ERRORS {
                        // Already reported; let the caller abort.
                        return Err(err);
                    }
                    self.synchronize_in_block(ctx);
                }
            }
        }
    }

    /// Parse one statement, appending its node(s) to `out`.  A local
    /// declaration may contribute several nodes (one per declarator) and
    /// an empty statement contributes none.
    pub(crate) fn parse_statement(
        &mut self,
        ctx: &mut Context<'_>,
        out: &mut Vec<AstNode>,
    ) -> Result<(), SyntaxError> {
        let token = self.peek_token(ctx)?;
        let loc = token.location();

        // Labels first: the label namespace is separate, so even a
        // typedef name followed by ':' labels a statement.
        if matches!(token, Token::Ident(_, _) | Token::TypeName(_, _))
            && matches!(self.peek_ahead(ctx, 1)?, Token::Colon(_))
        {
            let name = self.expect_identifier(ctx, "label name")?;
            self.advance(ctx)?; // ':'
            out.push(AstNode::Label {
                name,
                location: loc,
            });
            return Ok(());
        }

        if Self::starts_declaration(&token) {
            let mut decls = self.parse_local_declaration(ctx)?;
            out.append(&mut decls);
            return Ok(());
        }

        if self.match_token(ctx, &Token::Return(NOWHERE))? {
            out.push(self.parse_return_statement(ctx)?);
            return Ok(());
        }

        if self.match_token(ctx, &Token::If(NOWHERE))? {
            out.push(self.parse_if_statement(ctx)?);
            return Ok(());
        }

        if self.match_token(ctx, &Token::While(NOWHERE))? {
            out.push(self.parse_while_statement(ctx)?);
            return Ok(());
        }

        if self.match_token(ctx, &Token::Do(NOWHERE))? {
            out.push(self.parse_do_while_statement(ctx)?);
            return Ok(());
        }

        if self.match_token(ctx, &Token::For(NOWHERE))? {
            out.push(self.parse_for_statement(ctx)?);
            return Ok(());
        }

        if self.match_token(ctx, &Token::Switch(NOWHERE))? {
            out.push(self.parse_switch_statement(ctx)?);
            return Ok(());
        }

        if self.match_token(ctx, &Token::Break(NOWHERE))? {
            self.expect_semicolon(ctx, "after 'break'")?;
            out.push(AstNode::Break { location: loc });
            return Ok(());
        }

        if self.match_token(ctx, &Token::Continue(NOWHERE))? {
            self.expect_semicolon(ctx, "after 'continue'")?;
            out.push(AstNode::Continue { location: loc });
            return Ok(());
        }

        if self.match_token(ctx, &Token::Goto(NOWHERE))? {
            let label = self.expect_identifier(ctx, "label name")?;
            self.expect_semicolon(ctx, "after 'goto'")?;
            out.push(AstNode::Goto {
                label,
                location: loc,
            });
            return Ok(());
        }

        // Free-standing block: the statements are kept, the scope is not
        if self.match_token(ctx, &Token::LBrace(NOWHERE))? {
            let mut statements = self.parse_block_statements(ctx)?;
            self.expect_rbrace(ctx, "after block")?;
            out.append(&mut statements);
            return Ok(());
        }

        // Empty statement
        if self.match_token(ctx, &Token::Semicolon(NOWHERE))? {
            return Ok(());
        }

        // Otherwise, an expression statement
        let expr = self.parse_expression(ctx)?;
        self.expect_semicolon(ctx, "after expression")?;
        out.push(AstNode::ExpressionStatement {
            expr: Box::new(expr),
            location: loc,
        });
        Ok(())
    }

    /// Parse return statement
    fn parse_return_statement(&mut self, ctx: &mut Context<'_>) -> Result<AstNode, SyntaxError> {
        let loc = self.previous_location();

        let expr = if self.check(ctx, &Token::Semicolon(NOWHERE))? {
            None
        } else {
            Some(Box::new(self.parse_expression(ctx)?))
        };

        self.expect_semicolon(ctx, "after return")?;

        Ok(AstNode::Return {
            expr,
            location: loc,
        })
    }

    /// Parse if statement
    fn parse_if_statement(&mut self, ctx: &mut Context<'_>) -> Result<AstNode, SyntaxError> {
        let loc = self.previous_location();

        self.expect_lparen(ctx, "after 'if'")?;
        let condition = Box::new(self.parse_expression(ctx)?);
        self.expect_rparen(ctx, "after if condition")?;

        let then_branch = self.parse_statement_or_block(ctx)?;

        let else_branch = if self.match_token(ctx, &Token::Else(NOWHERE))? {
            Some(self.parse_statement_or_block(ctx)?)
        } else {
            None
        };

        Ok(AstNode::If {
            condition,
            then_branch,
            else_branch,
            location: loc,
        })
    }

    /// Parse while statement
    fn parse_while_statement(&mut self, ctx: &mut Context<'_>) -> Result<AstNode, SyntaxError> {
        let loc = self.previous_location();

        self.expect_lparen(ctx, "after 'while'")?;
        let condition = Box::new(self.parse_expression(ctx)?);
        self.expect_rparen(ctx, "after while condition")?;

        let body = self.parse_statement_or_block(ctx)?;

        Ok(AstNode::While {
            condition,
            body,
            location: loc,
        })
    }

    /// Parse do-while statement
    fn parse_do_while_statement(&mut self, ctx: &mut Context<'_>) -> Result<AstNode, SyntaxError> {
        let loc = self.previous_location();

        let body = self.parse_statement_or_block(ctx)?;

        self.expect_token(ctx, &Token::While(NOWHERE), "Expected 'while' after do body")?;
        self.expect_lparen(ctx, "after 'while'")?;
        let condition = Box::new(self.parse_expression(ctx)?);
        self.expect_rparen(ctx, "after do-while condition")?;
        self.expect_semicolon(ctx, "after do-while")?;

        Ok(AstNode::DoWhile {
            body,
            condition,
            location: loc,
        })
    }

    /// Parse for statement.  C99 allows a declaration in the init clause.
    fn parse_for_statement(&mut self, ctx: &mut Context<'_>) -> Result<AstNode, SyntaxError> {
        let loc = self.previous_location();

        self.expect_lparen(ctx, "after 'for'")?;

        let init = if self.match_token(ctx, &Token::Semicolon(NOWHERE))? {
            Vec::new()
        } else if Self::starts_declaration(&self.peek_token(ctx)?) {
            // Declaration includes its semicolon
            self.parse_local_declaration(ctx)?
        } else {
            let expr = self.parse_expression(ctx)?;
            self.expect_semicolon(ctx, "after for init")?;
            vec![expr]
        };

        let condition = if self.check(ctx, &Token::Semicolon(NOWHERE))? {
            None
        } else {
            Some(Box::new(self.parse_expression(ctx)?))
        };
        self.expect_semicolon(ctx, "after for condition")?;

        let increment = if self.check(ctx, &Token::RParen(NOWHERE))? {
            None
        } else {
            Some(Box::new(self.parse_expression(ctx)?))
        };

        self.expect_rparen(ctx, "after for clauses")?;

        let body = self.parse_statement_or_block(ctx)?;

        Ok(AstNode::For {
            init,
            condition,
            increment,
            body,
            location: loc,
        })
    }

    /// Parse switch statement
    fn parse_switch_statement(&mut self, ctx: &mut Context<'_>) -> Result<AstNode, SyntaxError> {
        let loc = self.previous_location();

        self.expect_lparen(ctx, "after 'switch'")?;
        let expr = Box::new(self.parse_expression(ctx)?);
        self.expect_rparen(ctx, "after switch expression")?;
        self.expect_lbrace(ctx, "before switch body")?;

        let mut cases = Vec::new();

        while !self.check(ctx, &Token::RBrace(NOWHERE))? {
            if matches!(self.peek_token(ctx)?, Token::Eof(_)) {
                break;
            }
            if self.match_token(ctx, &Token::Case(NOWHERE))? {
                let case_loc = self.previous_location();
                let value = self.parse_expression(ctx)?;
                self.expect_token(ctx, &Token::Colon(NOWHERE), "Expected ':' after case value")?;

                let statements = self.parse_case_statements(ctx)?;
                cases.push(CaseNode::Case {
                    value: Box::new(value),
                    statements,
                    location: case_loc,
                });
            } else if self.match_token(ctx, &Token::Default(NOWHERE))? {
                let default_loc = self.previous_location();
                self.expect_token(ctx, &Token::Colon(NOWHERE), "Expected ':' after 'default'")?;

                let statements = self.parse_case_statements(ctx)?;
                cases.push(CaseNode::Default {
                    statements,
                    location: default_loc,
                });
            } else {
                let found = self.peek_token(ctx)?;
                return Err(SyntaxError {
                    message: format!(
                        "Expected 'case' or 'default' in switch body, found {}",
                        found
                    ),
                    location: found.location(),
                });
            }
        }

        self.expect_rbrace(ctx, "after switch body")?;

        Ok(AstNode::Switch {
            expr,
            cases,
            location: loc,
        })
    }

    /// Statements of one case arm, up to the next label or the end of
    /// the switch body.
    fn parse_case_statements(
        &mut self,
        ctx: &mut Context<'_>,
    ) -> Result<Vec<AstNode>, SyntaxError> {
        let mut statements = Vec::new();
        loop {
            let token = self.peek_token(ctx)?;
            if matches!(
                token,
                Token::Case(_) | Token::Default(_) | Token::RBrace(_) | Token::Eof(_)
            ) {
                return Ok(statements);
            }
            self.parse_statement(ctx, &mut statements)?;
        }
    }

    /// Parse statement or block (for if/while/for bodies)
    pub(crate) fn parse_statement_or_block(
        &mut self,
        ctx: &mut Context<'_>,
    ) -> Result<Vec<AstNode>, SyntaxError> {
        if self.match_token(ctx, &Token::LBrace(NOWHERE))? {
            let statements = self.parse_block_statements(ctx)?;
            self.expect_rbrace(ctx, "after block")?;
            Ok(statements)
        } else {
            let mut statements = Vec::new();
            self.parse_statement(ctx, &mut statements)?;
            Ok(statements)
        }
    }
}
