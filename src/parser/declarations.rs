//! Declaration parsing implementation
//!
//! This module handles parsing of C99 declarations:
//!
//! - Declaration specifiers: storage classes, qualifiers, and type
//!   specifiers, including struct/union/enum specifiers and typedef names
//! - Declarators: pointers, arrays, and function parameter lists
//! - External declarations: variables, prototypes, function definitions
//! - `typedef` declarations, registered with the session at reduction
//!   time so the very next token classifies correctly
//!
//! # Grammar
//!
//! ```text
//! external_decl ::= decl_specifiers ";"
//!                 | decl_specifiers declarator "{" stmts "}"
//!                 | decl_specifiers init_declarator ("," init_declarator)* ";"
//! decl_specifiers ::= (storage_class | qualifier | type_specifier)+
//! declarator    ::= "*"* name ("[" const_expr? "]")* | "*"* name "(" params ")"
//! ```
//!
//! All parsing methods are implemented as `pub(crate)` methods on the
//! [`Parser`] struct.

use crate::driver::{Context, SourceLocation};
use crate::parser::ast::{AstNode, BaseType, Enumerator, Field, Param, StorageClass, Type};
use crate::parser::lexer::Token;
use crate::parser::parse::{Parser, SyntaxError, NOWHERE};

/// Parsed declaration specifiers: one base type plus flags, and any
/// struct/union/enum definition that appeared inline.
pub(crate) struct DeclSpecs {
    pub storage: Option<StorageClass>,
    pub base: BaseType,
    pub is_const: bool,
    pub is_unsigned: bool,
    pub defined: Option<AstNode>,
    pub location: SourceLocation,
}

/// One parsed declarator: `* const name[10]` or `name(params)`.
pub(crate) struct Declarator {
    pub name: String,
    pub pointer_depth: usize,
    pub array_dims: Vec<Option<usize>>,
    pub params: Option<Vec<Param>>,
    pub location: SourceLocation,
}

impl Parser {
    /// True when `token` can begin a declaration.
    pub(crate) fn starts_declaration(token: &Token) -> bool {
        matches!(
            token,
            Token::Typedef(_)
                | Token::Static(_)
                | Token::Extern(_)
                | Token::Const(_)
                | Token::Volatile(_)
                | Token::Void(_)
                | Token::Char(_)
                | Token::Short(_)
                | Token::Int(_)
                | Token::Long(_)
                | Token::Float(_)
                | Token::Double(_)
                | Token::Signed(_)
                | Token::Unsigned(_)
                | Token::Struct(_)
                | Token::Union(_)
                | Token::Enum(_)
                | Token::TypeName(_, _)
        )
    }

    /// True when `token` can begin a type name (cast or sizeof operand).
    pub(crate) fn starts_type_name(token: &Token) -> bool {
        matches!(
            token,
            Token::Const(_)
                | Token::Volatile(_)
                | Token::Void(_)
                | Token::Char(_)
                | Token::Short(_)
                | Token::Int(_)
                | Token::Long(_)
                | Token::Float(_)
                | Token::Double(_)
                | Token::Signed(_)
                | Token::Unsigned(_)
                | Token::Struct(_)
                | Token::Union(_)
                | Token::Enum(_)
                | Token::TypeName(_, _)
        )
    }

    /// Parse one external declaration: a type-only declaration
    /// (`struct S { ... };`), a function definition, or a declarator list.
    pub(crate) fn parse_external_declaration(
        &mut self,
        ctx: &mut Context<'_>,
    ) -> Result<Vec<AstNode>, SyntaxError> {
        let token = self.peek_token(ctx)?;
        if !Self::starts_declaration(&token) {
            return Err(SyntaxError {
                message: format!("Expected declaration, found {}", token),
                location: token.location(),
            });
        }

        let specs = self.parse_declaration_specifiers(ctx)?;
        let mut nodes = Vec::new();
        if let Some(defined) = &specs.defined {
            nodes.push(defined.clone());
        }

        // A bare `struct S { ... };` or `enum E { ... };`
        if self.match_token(ctx, &Token::Semicolon(NOWHERE))? {
            return Ok(nodes);
        }

        let declarator = self.parse_declarator(ctx)?;

        if declarator.params.is_some() && self.check(ctx, &Token::LBrace(NOWHERE))? {
            if specs.storage == Some(StorageClass::Typedef) {
                return Err(SyntaxError {
                    message: "'typedef' cannot be used in a function definition".to_string(),
                    location: declarator.location,
                });
            }
            nodes.push(self.parse_function_definition(ctx, &specs, declarator)?);
            return Ok(nodes);
        }

        self.parse_init_declarator_list(ctx, &specs, declarator, &mut nodes)?;
        self.expect_semicolon(ctx, "after declaration")?;
        Ok(nodes)
    }

    /// Parse a declaration inside a function body.  Same shape as an
    /// external declaration except that function definitions cannot nest.
    pub(crate) fn parse_local_declaration(
        &mut self,
        ctx: &mut Context<'_>,
    ) -> Result<Vec<AstNode>, SyntaxError> {
        let specs = self.parse_declaration_specifiers(ctx)?;
        let mut nodes = Vec::new();
        if let Some(defined) = &specs.defined {
            nodes.push(defined.clone());
        }

        if self.match_token(ctx, &Token::Semicolon(NOWHERE))? {
            return Ok(nodes);
        }

        let declarator = self.parse_declarator(ctx)?;
        if declarator.params.is_some() && self.check(ctx, &Token::LBrace(NOWHERE))? {
            return Err(SyntaxError {
                message: "Function definitions cannot be nested".to_string(),
                location: declarator.location,
            });
        }

        self.parse_init_declarator_list(ctx, &specs, declarator, &mut nodes)?;
        self.expect_semicolon(ctx, "after declaration")?;
        Ok(nodes)
    }

    fn parse_init_declarator_list(
        &mut self,
        ctx: &mut Context<'_>,
        specs: &DeclSpecs,
        first: Declarator,
        nodes: &mut Vec<AstNode>,
    ) -> Result<(), SyntaxError> {
        let mut declarator = first;
        loop {
            nodes.push(self.finish_declarator(ctx, specs, declarator)?);
            if !self.match_token(ctx, &Token::Comma(NOWHERE))? {
                return Ok(());
            }
            declarator = self.parse_declarator(ctx)?;
        }
    }

    /// Turn one declarator into its AST node.  Typedef names are
    /// registered with the session here, at reduction time: the name may
    /// be used as a type specifier by the very next declaration, so the
    /// registration must precede the next token fetch.
    fn finish_declarator(
        &mut self,
        ctx: &mut Context<'_>,
        specs: &DeclSpecs,
        declarator: Declarator,
    ) -> Result<AstNode, SyntaxError> {
        let var_type = Self::declared_type(specs, &declarator);

        if specs.storage == Some(StorageClass::Typedef) {
            if declarator.params.is_some() {
                return Err(SyntaxError {
                    message: "Function typedefs are not supported".to_string(),
                    location: declarator.location,
                });
            }
            if self.check(ctx, &Token::Eq(NOWHERE))? {
                return Err(SyntaxError {
                    message: "'typedef' declaration cannot have an initializer".to_string(),
                    location: declarator.location,
                });
            }
            ctx.register_type_name(&declarator.name);
            return Ok(AstNode::TypedefDecl {
                name: declarator.name,
                aliased: var_type,
                location: declarator.location,
            });
        }

        if let Some(params) = declarator.params {
            return Ok(AstNode::FunctionProto {
                name: declarator.name,
                params,
                return_type: var_type,
                location: declarator.location,
            });
        }

        let init = if self.match_token(ctx, &Token::Eq(NOWHERE))? {
            Some(Box::new(self.parse_initializer(ctx)?))
        } else {
            None
        };

        Ok(AstNode::VarDecl {
            name: declarator.name,
            var_type,
            init,
            location: declarator.location,
        })
    }

    fn declared_type(specs: &DeclSpecs, declarator: &Declarator) -> Type {
        Type {
            base: specs.base.clone(),
            is_const: specs.is_const,
            is_unsigned: specs.is_unsigned,
            pointer_depth: declarator.pointer_depth,
            array_dims: declarator.array_dims.clone(),
        }
    }

    fn parse_function_definition(
        &mut self,
        ctx: &mut Context<'_>,
        specs: &DeclSpecs,
        declarator: Declarator,
    ) -> Result<AstNode, SyntaxError> {
        let return_type = Type {
            base: specs.base.clone(),
            is_const: specs.is_const,
            is_unsigned: specs.is_unsigned,
            pointer_depth: declarator.pointer_depth,
            array_dims: Vec::new(),
        };

        self.expect_lbrace(ctx, "before function body")?;
        let body = self.parse_block_statements(ctx)?;
        self.expect_rbrace(ctx, "after function body")?;

        Ok(AstNode::FunctionDef {
            name: declarator.name,
            params: declarator.params.unwrap_or_default(),
            return_type,
            body,
            location: declarator.location,
        })
    }

    /// Parse declaration specifiers: any mix of storage classes,
    /// qualifiers, and type specifiers, folded into a single base type.
    ///
    /// A typedef name only acts as a type specifier when no other type
    /// specifier has been seen; in `unsigned Foo;` a registered `Foo` is
    /// the declarator name, exactly as in C.
    pub(crate) fn parse_declaration_specifiers(
        &mut self,
        ctx: &mut Context<'_>,
    ) -> Result<DeclSpecs, SyntaxError> {
        let location = self.current_location();
        let mut storage: Option<StorageClass> = None;
        let mut is_const = false;
        let mut is_unsigned = false;
        let mut seen_signed = false;
        let mut seen_short = false;
        let mut seen_int = false;
        let mut long_count = 0usize;
        let mut explicit: Option<BaseType> = None;
        let mut defined: Option<AstNode> = None;

        loop {
            let token = self.peek_token(ctx)?;
            match token {
                Token::Typedef(loc) | Token::Static(loc) | Token::Extern(loc) => {
                    let class = match token {
                        Token::Typedef(_) => StorageClass::Typedef,
                        Token::Static(_) => StorageClass::Static,
                        _ => StorageClass::Extern,
                    };
                    if storage.is_some() {
                        return Err(SyntaxError {
                            message: "Multiple storage classes in declaration".to_string(),
                            location: loc,
                        });
                    }
                    storage = Some(class);
                    self.advance(ctx)?;
                }
                Token::Const(_) => {
                    is_const = true;
                    self.advance(ctx)?;
                }
                Token::Volatile(_) => {
                    // accepted and dropped; the front end does not model it
                    self.advance(ctx)?;
                }
                Token::Signed(loc) => {
                    if is_unsigned {
                        return Err(SyntaxError {
                            message: "Cannot combine 'signed' and 'unsigned'".to_string(),
                            location: loc,
                        });
                    }
                    seen_signed = true;
                    self.advance(ctx)?;
                }
                Token::Unsigned(loc) => {
                    if seen_signed {
                        return Err(SyntaxError {
                            message: "Cannot combine 'signed' and 'unsigned'".to_string(),
                            location: loc,
                        });
                    }
                    is_unsigned = true;
                    self.advance(ctx)?;
                }
                Token::Short(loc) => {
                    if long_count > 0 {
                        return Err(SyntaxError {
                            message: "Cannot combine 'short' and 'long'".to_string(),
                            location: loc,
                        });
                    }
                    seen_short = true;
                    self.advance(ctx)?;
                }
                Token::Long(loc) => {
                    if seen_short {
                        return Err(SyntaxError {
                            message: "Cannot combine 'short' and 'long'".to_string(),
                            location: loc,
                        });
                    }
                    long_count += 1;
                    if long_count > 2 {
                        return Err(SyntaxError {
                            message: "Too many 'long' specifiers".to_string(),
                            location: loc,
                        });
                    }
                    self.advance(ctx)?;
                }
                Token::Int(loc) => {
                    if explicit.is_some() {
                        return Err(SyntaxError {
                            message: "Invalid type specifier combination".to_string(),
                            location: loc,
                        });
                    }
                    seen_int = true;
                    self.advance(ctx)?;
                }
                Token::Void(_) | Token::Char(_) | Token::Float(_) | Token::Double(_) => {
                    let base = match token {
                        Token::Void(_) => BaseType::Void,
                        Token::Char(_) => BaseType::Char,
                        Token::Float(_) => BaseType::Float,
                        _ => BaseType::Double,
                    };
                    if explicit.is_some() || seen_int {
                        return Err(SyntaxError {
                            message: "Invalid type specifier combination".to_string(),
                            location: token.location(),
                        });
                    }
                    explicit = Some(base);
                    self.advance(ctx)?;
                }
                Token::Struct(_) | Token::Union(_) => {
                    if explicit.is_some() || seen_int {
                        return Err(SyntaxError {
                            message: "Invalid type specifier combination".to_string(),
                            location: token.location(),
                        });
                    }
                    let is_union = matches!(token, Token::Union(_));
                    self.advance(ctx)?;
                    let (base, definition) = self.parse_struct_or_union_spec(ctx, is_union)?;
                    explicit = Some(base);
                    defined = definition;
                }
                Token::Enum(_) => {
                    if explicit.is_some() || seen_int {
                        return Err(SyntaxError {
                            message: "Invalid type specifier combination".to_string(),
                            location: token.location(),
                        });
                    }
                    self.advance(ctx)?;
                    let (base, definition) = self.parse_enum_spec(ctx)?;
                    explicit = Some(base);
                    defined = definition;
                }
                Token::TypeName(name, _) => {
                    // Only a type specifier while no other one is in play;
                    // otherwise this token is the declarator name.
                    let modified = seen_short
                        || seen_int
                        || seen_signed
                        || is_unsigned
                        || long_count > 0
                        || explicit.is_some();
                    if modified {
                        break;
                    }
                    explicit = Some(BaseType::Named(name));
                    self.advance(ctx)?;
                }
                _ => break,
            }
        }

        let base = match explicit {
            Some(BaseType::Double) if long_count == 1 && !seen_short => BaseType::Double,
            Some(base) => {
                if seen_short || long_count > 0 {
                    return Err(SyntaxError {
                        message: "Invalid type specifier combination".to_string(),
                        location,
                    });
                }
                if (seen_signed || is_unsigned) && !matches!(base, BaseType::Char) {
                    return Err(SyntaxError {
                        message: "Invalid type specifier combination".to_string(),
                        location,
                    });
                }
                base
            }
            None => {
                if seen_short {
                    BaseType::Short
                } else if long_count > 0 {
                    BaseType::Long
                } else if seen_int || seen_signed || is_unsigned {
                    BaseType::Int
                } else {
                    return Err(SyntaxError {
                        message: "Expected type specifier".to_string(),
                        location: self.current_location(),
                    });
                }
            }
        };

        Ok(DeclSpecs {
            storage,
            base,
            is_const,
            is_unsigned,
            defined,
            location,
        })
    }

    /// Parse what follows the `struct` or `union` keyword: an optional
    /// tag, and an optional brace-enclosed member list.
    fn parse_struct_or_union_spec(
        &mut self,
        ctx: &mut Context<'_>,
        is_union: bool,
    ) -> Result<(BaseType, Option<AstNode>), SyntaxError> {
        let location = self.previous_location();
        let keyword = if is_union { "union" } else { "struct" };

        let name = match self.peek_token(ctx)? {
            Token::Ident(name, _) | Token::TypeName(name, _) => {
                self.advance(ctx)?;
                Some(name)
            }
            _ => None,
        };

        if !self.check(ctx, &Token::LBrace(NOWHERE))? {
            let Some(name) = name else {
                return Err(SyntaxError {
                    message: format!("Expected {} tag or member list", keyword),
                    location: self.current_location(),
                });
            };
            let base = if is_union {
                BaseType::Union(Some(name))
            } else {
                BaseType::Struct(Some(name))
            };
            return Ok((base, None));
        }

        self.advance(ctx)?; // '{'
        let fields = self.parse_member_list(ctx, keyword)?;
        self.expect_rbrace(ctx, &format!("after {} members", keyword))?;

        let base = if is_union {
            BaseType::Union(name.clone())
        } else {
            BaseType::Struct(name.clone())
        };
        let definition = if is_union {
            AstNode::UnionDef {
                name,
                fields,
                location,
            }
        } else {
            AstNode::StructDef {
                name,
                fields,
                location,
            }
        };
        Ok((base, Some(definition)))
    }

    fn parse_member_list(
        &mut self,
        ctx: &mut Context<'_>,
        keyword: &str,
    ) -> Result<Vec<Field>, SyntaxError> {
        let mut fields = Vec::new();

        while !self.check(ctx, &Token::RBrace(NOWHERE))? {
            if matches!(self.peek_token(ctx)?, Token::Eof(_)) {
                break;
            }
            let specs = self.parse_declaration_specifiers(ctx)?;
            if specs.storage.is_some() {
                return Err(SyntaxError {
                    message: format!("Storage class not allowed in {} member", keyword),
                    location: specs.location,
                });
            }
            loop {
                let declarator = self.parse_declarator(ctx)?;
                if declarator.params.is_some() {
                    return Err(SyntaxError {
                        message: format!("Function declarators are not allowed in {} members", keyword),
                        location: declarator.location,
                    });
                }
                fields.push(Field {
                    field_type: Self::declared_type(&specs, &declarator),
                    name: declarator.name,
                });
                if !self.match_token(ctx, &Token::Comma(NOWHERE))? {
                    break;
                }
            }
            self.expect_semicolon(ctx, &format!("after {} member", keyword))?;
        }

        Ok(fields)
    }

    /// Parse what follows the `enum` keyword.
    fn parse_enum_spec(
        &mut self,
        ctx: &mut Context<'_>,
    ) -> Result<(BaseType, Option<AstNode>), SyntaxError> {
        let location = self.previous_location();

        let name = match self.peek_token(ctx)? {
            Token::Ident(name, _) | Token::TypeName(name, _) => {
                self.advance(ctx)?;
                Some(name)
            }
            _ => None,
        };

        if !self.check(ctx, &Token::LBrace(NOWHERE))? {
            let Some(name) = name else {
                return Err(SyntaxError {
                    message: "Expected enum tag or enumerator list".to_string(),
                    location: self.current_location(),
                });
            };
            return Ok((BaseType::Enum(Some(name)), None));
        }

        self.advance(ctx)?; // '{'
        let mut enumerators = Vec::new();
        loop {
            let enum_name = self.expect_identifier(ctx, "enumerator name")?;
            let value = if self.match_token(ctx, &Token::Eq(NOWHERE))? {
                Some(Box::new(self.parse_ternary(ctx)?))
            } else {
                None
            };
            enumerators.push(Enumerator {
                name: enum_name,
                value,
            });
            if !self.match_token(ctx, &Token::Comma(NOWHERE))? {
                break;
            }
            if self.check(ctx, &Token::RBrace(NOWHERE))? {
                break; // trailing comma
            }
        }
        self.expect_rbrace(ctx, "after enumerators")?;

        Ok((
            BaseType::Enum(name.clone()),
            Some(AstNode::EnumDef {
                name,
                enumerators,
                location,
            }),
        ))
    }

    /// Parse one declarator: pointers, a name, and array or parameter
    /// suffixes.
    pub(crate) fn parse_declarator(
        &mut self,
        ctx: &mut Context<'_>,
    ) -> Result<Declarator, SyntaxError> {
        let pointer_depth = self.parse_pointer_prefix(ctx)?;
        let name = self.expect_identifier(ctx, "declarator name")?;
        let location = self.previous_location();

        if self.match_token(ctx, &Token::LParen(NOWHERE))? {
            let params = self.parse_parameter_list(ctx)?;
            self.expect_rparen(ctx, "after parameters")?;
            return Ok(Declarator {
                name,
                pointer_depth,
                array_dims: Vec::new(),
                params: Some(params),
                location,
            });
        }

        let array_dims = self.parse_array_dims(ctx)?;
        Ok(Declarator {
            name,
            pointer_depth,
            array_dims,
            params: None,
            location,
        })
    }

    /// Consume `*` and interleaved qualifiers, returning pointer depth.
    pub(crate) fn parse_pointer_prefix(
        &mut self,
        ctx: &mut Context<'_>,
    ) -> Result<usize, SyntaxError> {
        let mut depth = 0;
        while self.match_token(ctx, &Token::Star(NOWHERE))? {
            depth += 1;
            while self.match_token(ctx, &Token::Const(NOWHERE))?
                || self.match_token(ctx, &Token::Volatile(NOWHERE))?
            {}
        }
        Ok(depth)
    }

    /// Parse `[N]` and `[]` suffixes.
    pub(crate) fn parse_array_dims(
        &mut self,
        ctx: &mut Context<'_>,
    ) -> Result<Vec<Option<usize>>, SyntaxError> {
        let mut dims = Vec::new();
        while self.match_token(ctx, &Token::LBracket(NOWHERE))? {
            if self.check(ctx, &Token::RBracket(NOWHERE))? {
                dims.push(None);
                self.advance(ctx)?;
                continue;
            }
            let size_expr = self.parse_ternary(ctx)?;
            if let AstNode::IntLiteral(n, _) = size_expr {
                dims.push(Some(n as usize));
            } else {
                return Err(SyntaxError {
                    message: "Array size must be a constant integer".to_string(),
                    location: self.current_location(),
                });
            }
            self.expect_rbracket(ctx, "after array size")?;
        }
        Ok(dims)
    }

    /// Parse parameter list: `(type declarator, ...)`, `()`, or `(void)`.
    pub(crate) fn parse_parameter_list(
        &mut self,
        ctx: &mut Context<'_>,
    ) -> Result<Vec<Param>, SyntaxError> {
        let mut params = Vec::new();

        if self.check(ctx, &Token::RParen(NOWHERE))? {
            return Ok(params);
        }

        // (void) means no parameters, but `void *p` is a real one
        if self.check(ctx, &Token::Void(NOWHERE))?
            && matches!(self.peek_ahead(ctx, 1)?, Token::RParen(_))
        {
            self.advance(ctx)?;
            return Ok(params);
        }

        loop {
            let specs = self.parse_declaration_specifiers(ctx)?;
            if specs.storage.is_some() {
                return Err(SyntaxError {
                    message: "Storage class not allowed on a parameter".to_string(),
                    location: specs.location,
                });
            }
            let pointer_depth = self.parse_pointer_prefix(ctx)?;
            let name = match self.peek_token(ctx)? {
                Token::Ident(name, _) | Token::TypeName(name, _) => {
                    self.advance(ctx)?;
                    Some(name)
                }
                _ => None,
            };
            let array_dims = self.parse_array_dims(ctx)?;

            params.push(Param {
                name,
                param_type: Type {
                    base: specs.base.clone(),
                    is_const: specs.is_const,
                    is_unsigned: specs.is_unsigned,
                    pointer_depth,
                    array_dims,
                },
            });

            if !self.match_token(ctx, &Token::Comma(NOWHERE))? {
                break;
            }
        }

        Ok(params)
    }

    /// Parse a type name as used in casts and `sizeof`: specifiers plus
    /// an abstract declarator (no name).
    pub(crate) fn parse_type_name(&mut self, ctx: &mut Context<'_>) -> Result<Type, SyntaxError> {
        let specs = self.parse_declaration_specifiers(ctx)?;
        if specs.storage.is_some() {
            return Err(SyntaxError {
                message: "Storage class not allowed in a type name".to_string(),
                location: specs.location,
            });
        }
        let pointer_depth = self.parse_pointer_prefix(ctx)?;
        let array_dims = self.parse_array_dims(ctx)?;
        Ok(Type {
            base: specs.base,
            is_const: specs.is_const,
            is_unsigned: specs.is_unsigned,
            pointer_depth,
            array_dims,
        })
    }

    /// Parse an initializer: an assignment expression or a brace list.
    pub(crate) fn parse_initializer(
        &mut self,
        ctx: &mut Context<'_>,
    ) -> Result<AstNode, SyntaxError> {
        if self.check(ctx, &Token::LBrace(NOWHERE))? {
            let location = self.current_location();
            self.advance(ctx)?;
            let mut items = Vec::new();
            if !self.check(ctx, &Token::RBrace(NOWHERE))? {
                loop {
                    items.push(self.parse_initializer(ctx)?);
                    if !self.match_token(ctx, &Token::Comma(NOWHERE))? {
                        break;
                    }
                    if self.check(ctx, &Token::RBrace(NOWHERE))? {
                        break; // trailing comma
                    }
                }
            }
            self.expect_rbrace(ctx, "after initializer list")?;
            return Ok(AstNode::InitList { items, location });
        }
        self.parse_assignment(ctx)
    }
}
