//! Expression parsing implementation
//!
//! Precedence climbing, one method per level:
//!
//! ```text
//! assignment → ternary → logical-or → logical-and → bitwise-or →
//! bitwise-xor → bitwise-and → equality → relational → shift →
//! additive → multiplicative → cast → unary → postfix → primary
//! ```
//!
//! Cast detection needs no backtracking: `(` followed by a token that can
//! begin a type is decisive, because typedef names have already been
//! classified by the tokenizer.  `(Foo)x` arrives here with a type-name
//! token while `(foo)` stays an ordinary parenthesized expression.  This
//! is the payoff of typedef-aware tokenization.
//!
//! All parsing methods are implemented as `pub(crate)` methods on the
//! [`Parser`] struct.

use crate::driver::Context;
use crate::parser::ast::{AstNode, BinOp, UnOp};
use crate::parser::lexer::Token;
use crate::parser::parse::{Parser, SyntaxError, MAX_EXPR_DEPTH, NOWHERE};

impl Parser {
    /// Parse expression (top-level entry point)
    pub(crate) fn parse_expression(
        &mut self,
        ctx: &mut Context<'_>,
    ) -> Result<AstNode, SyntaxError> {
        if self.depth >= MAX_EXPR_DEPTH {
            return Err(SyntaxError {
                message: "Expression nesting too deep".to_string(),
                location: self.current_location(),
            });
        }
        self.depth += 1;
        let result = self.parse_assignment(ctx);
        self.depth -= 1;
        result
    }

    /// Parse assignment (right-associative), including the compound forms
    pub(crate) fn parse_assignment(
        &mut self,
        ctx: &mut Context<'_>,
    ) -> Result<AstNode, SyntaxError> {
        let expr = self.parse_ternary(ctx)?;

        if self.match_token(ctx, &Token::Eq(NOWHERE))? {
            let location = self.previous_location();
            let rhs = Box::new(self.parse_assignment(ctx)?);
            return Ok(AstNode::Assignment {
                lhs: Box::new(expr),
                rhs,
                location,
            });
        }

        let token = self.peek_token(ctx)?;
        let compound_op = match token {
            Token::PlusEq(_) => Some(BinOp::AddAssign),
            Token::MinusEq(_) => Some(BinOp::SubAssign),
            Token::StarEq(_) => Some(BinOp::MulAssign),
            Token::SlashEq(_) => Some(BinOp::DivAssign),
            Token::PercentEq(_) => Some(BinOp::ModAssign),
            Token::AmpEq(_) => Some(BinOp::AndAssign),
            Token::PipeEq(_) => Some(BinOp::OrAssign),
            Token::CaretEq(_) => Some(BinOp::XorAssign),
            Token::LtLtEq(_) => Some(BinOp::ShlAssign),
            Token::GtGtEq(_) => Some(BinOp::ShrAssign),
            _ => None,
        };

        if let Some(op) = compound_op {
            self.advance(ctx)?;
            let location = self.previous_location();
            let rhs = Box::new(self.parse_assignment(ctx)?);
            return Ok(AstNode::CompoundAssignment {
                lhs: Box::new(expr),
                op,
                rhs,
                location,
            });
        }

        Ok(expr)
    }

    /// Parse ternary: condition ? true_expr : false_expr
    pub(crate) fn parse_ternary(&mut self, ctx: &mut Context<'_>) -> Result<AstNode, SyntaxError> {
        let expr = self.parse_logical_or(ctx)?;

        if self.match_token(ctx, &Token::Question(NOWHERE))? {
            let location = self.previous_location();
            let true_expr = Box::new(self.parse_expression(ctx)?);
            self.expect_token(
                ctx,
                &Token::Colon(NOWHERE),
                "Expected ':' in ternary expression",
            )?;
            let false_expr = Box::new(self.parse_ternary(ctx)?);

            return Ok(AstNode::TernaryOp {
                condition: Box::new(expr),
                true_expr,
                false_expr,
                location,
            });
        }

        Ok(expr)
    }

    /// Parse logical OR (||)
    fn parse_logical_or(&mut self, ctx: &mut Context<'_>) -> Result<AstNode, SyntaxError> {
        let mut left = self.parse_logical_and(ctx)?;

        while self.match_token(ctx, &Token::OrOr(NOWHERE))? {
            let location = self.previous_location();
            let right = Box::new(self.parse_logical_and(ctx)?);
            left = AstNode::BinaryOp {
                op: BinOp::Or,
                left: Box::new(left),
                right,
                location,
            };
        }

        Ok(left)
    }

    /// Parse logical AND (&&)
    fn parse_logical_and(&mut self, ctx: &mut Context<'_>) -> Result<AstNode, SyntaxError> {
        let mut left = self.parse_bitwise_or(ctx)?;

        while self.match_token(ctx, &Token::AndAnd(NOWHERE))? {
            let location = self.previous_location();
            let right = Box::new(self.parse_bitwise_or(ctx)?);
            left = AstNode::BinaryOp {
                op: BinOp::And,
                left: Box::new(left),
                right,
                location,
            };
        }

        Ok(left)
    }

    /// Parse bitwise OR (|)
    fn parse_bitwise_or(&mut self, ctx: &mut Context<'_>) -> Result<AstNode, SyntaxError> {
        let mut left = self.parse_bitwise_xor(ctx)?;

        while self.match_token(ctx, &Token::Pipe(NOWHERE))? {
            let location = self.previous_location();
            let right = Box::new(self.parse_bitwise_xor(ctx)?);
            left = AstNode::BinaryOp {
                op: BinOp::BitOr,
                left: Box::new(left),
                right,
                location,
            };
        }

        Ok(left)
    }

    /// Parse bitwise XOR (^)
    fn parse_bitwise_xor(&mut self, ctx: &mut Context<'_>) -> Result<AstNode, SyntaxError> {
        let mut left = self.parse_bitwise_and(ctx)?;

        while self.match_token(ctx, &Token::Caret(NOWHERE))? {
            let location = self.previous_location();
            let right = Box::new(self.parse_bitwise_and(ctx)?);
            left = AstNode::BinaryOp {
                op: BinOp::BitXor,
                left: Box::new(left),
                right,
                location,
            };
        }

        Ok(left)
    }

    /// Parse bitwise AND (&)
    fn parse_bitwise_and(&mut self, ctx: &mut Context<'_>) -> Result<AstNode, SyntaxError> {
        let mut left = self.parse_equality(ctx)?;

        while self.match_token(ctx, &Token::Amp(NOWHERE))? {
            let location = self.previous_location();
            let right = Box::new(self.parse_equality(ctx)?);
            left = AstNode::BinaryOp {
                op: BinOp::BitAnd,
                left: Box::new(left),
                right,
                location,
            };
        }

        Ok(left)
    }

    /// Parse equality (== !=)
    fn parse_equality(&mut self, ctx: &mut Context<'_>) -> Result<AstNode, SyntaxError> {
        let mut left = self.parse_relational(ctx)?;

        loop {
            let op = if self.match_token(ctx, &Token::EqEq(NOWHERE))? {
                BinOp::Eq
            } else if self.match_token(ctx, &Token::NotEq(NOWHERE))? {
                BinOp::Ne
            } else {
                break;
            };

            let location = self.previous_location();
            let right = Box::new(self.parse_relational(ctx)?);
            left = AstNode::BinaryOp {
                op,
                left: Box::new(left),
                right,
                location,
            };
        }

        Ok(left)
    }

    /// Parse relational (< <= > >=)
    fn parse_relational(&mut self, ctx: &mut Context<'_>) -> Result<AstNode, SyntaxError> {
        let mut left = self.parse_shift(ctx)?;

        loop {
            let op = if self.match_token(ctx, &Token::Lt(NOWHERE))? {
                BinOp::Lt
            } else if self.match_token(ctx, &Token::Le(NOWHERE))? {
                BinOp::Le
            } else if self.match_token(ctx, &Token::Gt(NOWHERE))? {
                BinOp::Gt
            } else if self.match_token(ctx, &Token::Ge(NOWHERE))? {
                BinOp::Ge
            } else {
                break;
            };

            let location = self.previous_location();
            let right = Box::new(self.parse_shift(ctx)?);
            left = AstNode::BinaryOp {
                op,
                left: Box::new(left),
                right,
                location,
            };
        }

        Ok(left)
    }

    /// Parse bitwise shift (<< >>)
    fn parse_shift(&mut self, ctx: &mut Context<'_>) -> Result<AstNode, SyntaxError> {
        let mut left = self.parse_additive(ctx)?;

        loop {
            let op = if self.match_token(ctx, &Token::LtLt(NOWHERE))? {
                BinOp::BitShl
            } else if self.match_token(ctx, &Token::GtGt(NOWHERE))? {
                BinOp::BitShr
            } else {
                break;
            };

            let location = self.previous_location();
            let right = Box::new(self.parse_additive(ctx)?);
            left = AstNode::BinaryOp {
                op,
                left: Box::new(left),
                right,
                location,
            };
        }

        Ok(left)
    }

    /// Parse additive (+ -)
    fn parse_additive(&mut self, ctx: &mut Context<'_>) -> Result<AstNode, SyntaxError> {
        let mut left = self.parse_multiplicative(ctx)?;

        loop {
            let op = if self.match_token(ctx, &Token::Plus(NOWHERE))? {
                BinOp::Add
            } else if self.match_token(ctx, &Token::Minus(NOWHERE))? {
                BinOp::Sub
            } else {
                break;
            };

            let location = self.previous_location();
            let right = Box::new(self.parse_multiplicative(ctx)?);
            left = AstNode::BinaryOp {
                op,
                left: Box::new(left),
                right,
                location,
            };
        }

        Ok(left)
    }

    /// Parse multiplicative (* / %)
    fn parse_multiplicative(&mut self, ctx: &mut Context<'_>) -> Result<AstNode, SyntaxError> {
        let mut left = self.parse_cast(ctx)?;

        loop {
            let op = if self.match_token(ctx, &Token::Star(NOWHERE))? {
                BinOp::Mul
            } else if self.match_token(ctx, &Token::Slash(NOWHERE))? {
                BinOp::Div
            } else if self.match_token(ctx, &Token::Percent(NOWHERE))? {
                BinOp::Mod
            } else {
                break;
            };

            let location = self.previous_location();
            let right = Box::new(self.parse_cast(ctx)?);
            left = AstNode::BinaryOp {
                op,
                left: Box::new(left),
                right,
                location,
            };
        }

        Ok(left)
    }

    /// Parse cast: (type)expr, or fall through to unary
    fn parse_cast(&mut self, ctx: &mut Context<'_>) -> Result<AstNode, SyntaxError> {
        if self.check(ctx, &Token::LParen(NOWHERE))? {
            let ahead = self.peek_ahead(ctx, 1)?;
            if Self::starts_type_name(&ahead) {
                let location = self.current_location();
                self.advance(ctx)?; // '('
                let target_type = self.parse_type_name(ctx)?;
                self.expect_rparen(ctx, "after cast type")?;
                let expr = Box::new(self.parse_cast(ctx)?);

                return Ok(AstNode::Cast {
                    target_type,
                    expr,
                    location,
                });
            }
        }

        self.parse_unary(ctx)
    }

    /// Parse unary (! ~ - + & * ++ -- sizeof)
    fn parse_unary(&mut self, ctx: &mut Context<'_>) -> Result<AstNode, SyntaxError> {
        if self.depth >= MAX_EXPR_DEPTH {
            return Err(SyntaxError {
                message: "Expression nesting too deep".to_string(),
                location: self.current_location(),
            });
        }
        self.depth += 1;
        let result = self.parse_unary_inner(ctx);
        self.depth -= 1;
        result
    }

    fn parse_unary_inner(&mut self, ctx: &mut Context<'_>) -> Result<AstNode, SyntaxError> {
        let prefix_op = match self.peek_token(ctx)? {
            Token::Bang(_) => Some(UnOp::Not),
            Token::Tilde(_) => Some(UnOp::BitNot),
            Token::Minus(_) => Some(UnOp::Neg),
            Token::Amp(_) => Some(UnOp::AddrOf),
            Token::Star(_) => Some(UnOp::Deref),
            Token::PlusPlus(_) => Some(UnOp::PreInc),
            Token::MinusMinus(_) => Some(UnOp::PreDec),
            _ => None,
        };

        if let Some(op) = prefix_op {
            self.advance(ctx)?;
            let location = self.previous_location();
            let operand = Box::new(self.parse_unary(ctx)?);
            return Ok(AstNode::UnaryOp {
                op,
                operand,
                location,
            });
        }

        // Unary plus: just return the operand
        if self.match_token(ctx, &Token::Plus(NOWHERE))? {
            return self.parse_unary(ctx);
        }

        if self.match_token(ctx, &Token::Sizeof(NOWHERE))? {
            let location = self.previous_location();

            if self.check(ctx, &Token::LParen(NOWHERE))? {
                let ahead = self.peek_ahead(ctx, 1)?;
                if Self::starts_type_name(&ahead) {
                    self.advance(ctx)?; // '('
                    let target_type = self.parse_type_name(ctx)?;
                    self.expect_rparen(ctx, "after sizeof type")?;
                    return Ok(AstNode::SizeofType {
                        target_type,
                        location,
                    });
                }
            }

            let expr = Box::new(self.parse_unary(ctx)?);
            return Ok(AstNode::SizeofExpr {
                expr,
                location,
            });
        }

        self.parse_postfix(ctx)
    }

    /// Parse postfix (++ -- [] . -> ())
    fn parse_postfix(&mut self, ctx: &mut Context<'_>) -> Result<AstNode, SyntaxError> {
        let mut expr = self.parse_primary(ctx)?;

        loop {
            if self.match_token(ctx, &Token::PlusPlus(NOWHERE))? {
                expr = AstNode::UnaryOp {
                    op: UnOp::PostInc,
                    operand: Box::new(expr),
                    location: self.previous_location(),
                };
            } else if self.match_token(ctx, &Token::MinusMinus(NOWHERE))? {
                expr = AstNode::UnaryOp {
                    op: UnOp::PostDec,
                    operand: Box::new(expr),
                    location: self.previous_location(),
                };
            } else if self.match_token(ctx, &Token::LBracket(NOWHERE))? {
                let location = self.previous_location();
                let index = Box::new(self.parse_expression(ctx)?);
                self.expect_rbracket(ctx, "after array index")?;
                expr = AstNode::ArrayAccess {
                    array: Box::new(expr),
                    index,
                    location,
                };
            } else if self.match_token(ctx, &Token::Dot(NOWHERE))? {
                let location = self.previous_location();
                let member = self.expect_identifier(ctx, "member name")?;
                expr = AstNode::MemberAccess {
                    object: Box::new(expr),
                    member,
                    location,
                };
            } else if self.match_token(ctx, &Token::Arrow(NOWHERE))? {
                let location = self.previous_location();
                let member = self.expect_identifier(ctx, "member name")?;
                expr = AstNode::PointerMemberAccess {
                    object: Box::new(expr),
                    member,
                    location,
                };
            } else if self.match_token(ctx, &Token::LParen(NOWHERE))? {
                let location = self.previous_location();
                let args = self.parse_argument_list(ctx)?;
                self.expect_rparen(ctx, "after function arguments")?;

                // Function designators are plain identifiers here; calls
                // through pointer expressions are not supported
                let name = if let AstNode::Variable(name, _) = expr {
                    name
                } else {
                    return Err(SyntaxError {
                        message: "Function call must be on an identifier".to_string(),
                        location,
                    });
                };

                expr = AstNode::FunctionCall {
                    name,
                    args,
                    location,
                };
            } else {
                break;
            }
        }

        Ok(expr)
    }

    /// Parse argument list: (expr, expr, ...)
    fn parse_argument_list(&mut self, ctx: &mut Context<'_>) -> Result<Vec<AstNode>, SyntaxError> {
        let mut args = Vec::new();

        if self.check(ctx, &Token::RParen(NOWHERE))? {
            return Ok(args);
        }

        loop {
            args.push(self.parse_assignment(ctx)?);

            if !self.match_token(ctx, &Token::Comma(NOWHERE))? {
                break;
            }
        }

        Ok(args)
    }

    /// Parse primary (literals, variables, parenthesized expressions)
    fn parse_primary(&mut self, ctx: &mut Context<'_>) -> Result<AstNode, SyntaxError> {
        let token = self.peek_token(ctx)?;

        match token {
            Token::IntLiteral(n, loc) => {
                self.advance(ctx)?;
                Ok(AstNode::IntLiteral(n, loc))
            }
            Token::FloatLiteral(x, loc) => {
                self.advance(ctx)?;
                Ok(AstNode::FloatLiteral(x, loc))
            }
            Token::CharLiteral(c, loc) => {
                self.advance(ctx)?;
                Ok(AstNode::CharLiteral(c, loc))
            }
            Token::StringLiteral(s, loc) => {
                self.advance(ctx)?;
                Ok(AstNode::StringLiteral(s, loc))
            }
            Token::Ident(name, loc) => {
                self.advance(ctx)?;
                Ok(AstNode::Variable(name, loc))
            }
            Token::LParen(_) => {
                self.advance(ctx)?;
                let expr = self.parse_expression(ctx)?;
                self.expect_rparen(ctx, "after expression")?;
                Ok(expr)
            }
            Token::TypeName(name, loc) => Err(SyntaxError {
                message: format!("Expected expression, found type name '{}'", name),
                location: loc,
            }),
            found => Err(SyntaxError {
                message: format!("Unexpected token: {}", found),
                location: found.location(),
            }),
        }
    }
}
