//! Streaming tokenizer for C99 source text
//!
//! Tokens are produced one at a time, on demand, because classification is
//! stateful: after the parser reduces `typedef int Foo;`, the very next
//! occurrence of `Foo` must come back as [`Token::TypeName`] rather than
//! [`Token::Ident`].  Identifier classification goes through
//! [`Context::is_type_name`], and every consumed lexical unit (tokens,
//! whitespace, comments, skipped preprocessor lines) is pushed through
//! [`Context::advance`] so the session's cursor always matches the input.
//!
//! Preprocessor directives are skipped to end of line rather than parsed;
//! the front end expects preprocessed input.

use thiserror::Error;

use crate::driver::{Context, SourceLocation};
use std::fmt;

/// All token variants produced by the lexer.
///
/// Every variant carries a [`SourceLocation`] so that parse errors can
/// report an accurate line and column without a separate token→location
/// table.
#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    // Literals
    IntLiteral(i64, SourceLocation),
    FloatLiteral(f64, SourceLocation),
    CharLiteral(i8, SourceLocation),
    StringLiteral(String, SourceLocation),

    // Identifiers; a name registered in the typedef table lexes as
    // TypeName, everything else as Ident
    Ident(String, SourceLocation),
    TypeName(String, SourceLocation),

    // Keywords
    Typedef(SourceLocation),
    Void(SourceLocation),
    Char(SourceLocation),
    Short(SourceLocation),
    Int(SourceLocation),
    Long(SourceLocation),
    Float(SourceLocation),
    Double(SourceLocation),
    Signed(SourceLocation),
    Unsigned(SourceLocation),
    Struct(SourceLocation),
    Union(SourceLocation),
    Enum(SourceLocation),
    Const(SourceLocation),
    Volatile(SourceLocation),
    Static(SourceLocation),
    Extern(SourceLocation),
    If(SourceLocation),
    Else(SourceLocation),
    While(SourceLocation),
    Do(SourceLocation),
    For(SourceLocation),
    Switch(SourceLocation),
    Case(SourceLocation),
    Default(SourceLocation),
    Break(SourceLocation),
    Continue(SourceLocation),
    Return(SourceLocation),
    Goto(SourceLocation),
    Sizeof(SourceLocation),

    // Arithmetic
    Plus(SourceLocation),    // +
    Minus(SourceLocation),   // -
    Star(SourceLocation),    // *
    Slash(SourceLocation),   // /
    Percent(SourceLocation), // %

    // Comparison
    EqEq(SourceLocation),  // ==
    NotEq(SourceLocation), // !=
    Lt(SourceLocation),    // <
    Le(SourceLocation),    // <=
    Gt(SourceLocation),    // >
    Ge(SourceLocation),    // >=

    // Logical
    AndAnd(SourceLocation), // &&
    OrOr(SourceLocation),   // ||
    Bang(SourceLocation),   // !

    // Bitwise
    Amp(SourceLocation),   // &
    Pipe(SourceLocation),  // |
    Caret(SourceLocation), // ^
    Tilde(SourceLocation), // ~
    LtLt(SourceLocation),  // <<
    GtGt(SourceLocation),  // >>

    // Assignment
    Eq(SourceLocation),        // =
    PlusEq(SourceLocation),    // +=
    MinusEq(SourceLocation),   // -=
    StarEq(SourceLocation),    // *=
    SlashEq(SourceLocation),   // /=
    PercentEq(SourceLocation), // %=
    AmpEq(SourceLocation),     // &=
    PipeEq(SourceLocation),    // |=
    CaretEq(SourceLocation),   // ^=
    LtLtEq(SourceLocation),    // <<=
    GtGtEq(SourceLocation),    // >>=

    // Increment/Decrement
    PlusPlus(SourceLocation),   // ++
    MinusMinus(SourceLocation), // --

    // Member access
    Dot(SourceLocation),   // .
    Arrow(SourceLocation), // ->

    // Ternary
    Question(SourceLocation), // ?
    Colon(SourceLocation),    // :

    // Punctuation
    LParen(SourceLocation),    // (
    RParen(SourceLocation),    // )
    LBrace(SourceLocation),    // {
    RBrace(SourceLocation),    // }
    LBracket(SourceLocation),  // [
    RBracket(SourceLocation),  // ]
    Semicolon(SourceLocation), // ;
    Comma(SourceLocation),     // ,

    // End of file
    Eof(SourceLocation),
}

impl Token {
    /// Returns the source location where this token appears.
    pub fn location(&self) -> SourceLocation {
        match self {
            Token::IntLiteral(_, loc)
            | Token::FloatLiteral(_, loc)
            | Token::CharLiteral(_, loc)
            | Token::StringLiteral(_, loc)
            | Token::Ident(_, loc)
            | Token::TypeName(_, loc)
            | Token::Typedef(loc)
            | Token::Void(loc)
            | Token::Char(loc)
            | Token::Short(loc)
            | Token::Int(loc)
            | Token::Long(loc)
            | Token::Float(loc)
            | Token::Double(loc)
            | Token::Signed(loc)
            | Token::Unsigned(loc)
            | Token::Struct(loc)
            | Token::Union(loc)
            | Token::Enum(loc)
            | Token::Const(loc)
            | Token::Volatile(loc)
            | Token::Static(loc)
            | Token::Extern(loc)
            | Token::If(loc)
            | Token::Else(loc)
            | Token::While(loc)
            | Token::Do(loc)
            | Token::For(loc)
            | Token::Switch(loc)
            | Token::Case(loc)
            | Token::Default(loc)
            | Token::Break(loc)
            | Token::Continue(loc)
            | Token::Return(loc)
            | Token::Goto(loc)
            | Token::Sizeof(loc)
            | Token::Plus(loc)
            | Token::Minus(loc)
            | Token::Star(loc)
            | Token::Slash(loc)
            | Token::Percent(loc)
            | Token::EqEq(loc)
            | Token::NotEq(loc)
            | Token::Lt(loc)
            | Token::Le(loc)
            | Token::Gt(loc)
            | Token::Ge(loc)
            | Token::AndAnd(loc)
            | Token::OrOr(loc)
            | Token::Bang(loc)
            | Token::Amp(loc)
            | Token::Pipe(loc)
            | Token::Caret(loc)
            | Token::Tilde(loc)
            | Token::LtLt(loc)
            | Token::GtGt(loc)
            | Token::Eq(loc)
            | Token::PlusEq(loc)
            | Token::MinusEq(loc)
            | Token::StarEq(loc)
            | Token::SlashEq(loc)
            | Token::PercentEq(loc)
            | Token::AmpEq(loc)
            | Token::PipeEq(loc)
            | Token::CaretEq(loc)
            | Token::LtLtEq(loc)
            | Token::GtGtEq(loc)
            | Token::PlusPlus(loc)
            | Token::MinusMinus(loc)
            | Token::Dot(loc)
            | Token::Arrow(loc)
            | Token::Question(loc)
            | Token::Colon(loc)
            | Token::LParen(loc)
            | Token::RParen(loc)
            | Token::LBrace(loc)
            | Token::RBrace(loc)
            | Token::LBracket(loc)
            | Token::RBracket(loc)
            | Token::Semicolon(loc)
            | Token::Comma(loc)
            | Token::Eof(loc) => *loc,
        }
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::IntLiteral(n, _) => write!(f, "integer literal {}", n),
            Token::FloatLiteral(x, _) => write!(f, "floating literal {}", x),
            Token::CharLiteral(c, _) => {
                let byte = *c as u8;
                if byte.is_ascii_graphic() || byte == b' ' {
                    write!(f, "character literal '{}'", byte as char)
                } else {
                    write!(f, "character literal '\\x{:02x}'", byte)
                }
            }
            Token::StringLiteral(s, _) => write!(f, "string literal \"{}\"", s),
            Token::Ident(s, _) => write!(f, "identifier '{}'", s),
            Token::TypeName(s, _) => write!(f, "type name '{}'", s),
            Token::Typedef(_) => write!(f, "'typedef'"),
            Token::Void(_) => write!(f, "'void'"),
            Token::Char(_) => write!(f, "'char'"),
            Token::Short(_) => write!(f, "'short'"),
            Token::Int(_) => write!(f, "'int'"),
            Token::Long(_) => write!(f, "'long'"),
            Token::Float(_) => write!(f, "'float'"),
            Token::Double(_) => write!(f, "'double'"),
            Token::Signed(_) => write!(f, "'signed'"),
            Token::Unsigned(_) => write!(f, "'unsigned'"),
            Token::Struct(_) => write!(f, "'struct'"),
            Token::Union(_) => write!(f, "'union'"),
            Token::Enum(_) => write!(f, "'enum'"),
            Token::Const(_) => write!(f, "'const'"),
            Token::Volatile(_) => write!(f, "'volatile'"),
            Token::Static(_) => write!(f, "'static'"),
            Token::Extern(_) => write!(f, "'extern'"),
            Token::If(_) => write!(f, "'if'"),
            Token::Else(_) => write!(f, "'else'"),
            Token::While(_) => write!(f, "'while'"),
            Token::Do(_) => write!(f, "'do'"),
            Token::For(_) => write!(f, "'for'"),
            Token::Switch(_) => write!(f, "'switch'"),
            Token::Case(_) => write!(f, "'case'"),
            Token::Default(_) => write!(f, "'default'"),
            Token::Break(_) => write!(f, "'break'"),
            Token::Continue(_) => write!(f, "'continue'"),
            Token::Return(_) => write!(f, "'return'"),
            Token::Goto(_) => write!(f, "'goto'"),
            Token::Sizeof(_) => write!(f, "'sizeof'"),
            Token::Plus(_) => write!(f, "'+'"),
            Token::Minus(_) => write!(f, "'-'"),
            Token::Star(_) => write!(f, "'*'"),
            Token::Slash(_) => write!(f, "'/'"),
            Token::Percent(_) => write!(f, "'%'"),
            Token::EqEq(_) => write!(f, "'=='"),
            Token::NotEq(_) => write!(f, "'!='"),
            Token::Lt(_) => write!(f, "'<'"),
            Token::Le(_) => write!(f, "'<='"),
            Token::Gt(_) => write!(f, "'>'"),
            Token::Ge(_) => write!(f, "'>='"),
            Token::AndAnd(_) => write!(f, "'&&'"),
            Token::OrOr(_) => write!(f, "'||'"),
            Token::Bang(_) => write!(f, "'!'"),
            Token::Amp(_) => write!(f, "'&'"),
            Token::Pipe(_) => write!(f, "'|'"),
            Token::Caret(_) => write!(f, "'^'"),
            Token::Tilde(_) => write!(f, "'~'"),
            Token::LtLt(_) => write!(f, "'<<'"),
            Token::GtGt(_) => write!(f, "'>>'"),
            Token::Eq(_) => write!(f, "'='"),
            Token::PlusEq(_) => write!(f, "'+='"),
            Token::MinusEq(_) => write!(f, "'-='"),
            Token::StarEq(_) => write!(f, "'*='"),
            Token::SlashEq(_) => write!(f, "'/='"),
            Token::PercentEq(_) => write!(f, "'%='"),
            Token::AmpEq(_) => write!(f, "'&='"),
            Token::PipeEq(_) => write!(f, "'|='"),
            Token::CaretEq(_) => write!(f, "'^='"),
            Token::LtLtEq(_) => write!(f, "'<<='"),
            Token::GtGtEq(_) => write!(f, "'>>='"),
            Token::PlusPlus(_) => write!(f, "'++'"),
            Token::MinusMinus(_) => write!(f, "'--'"),
            Token::Dot(_) => write!(f, "'.'"),
            Token::Arrow(_) => write!(f, "'->'"),
            Token::Question(_) => write!(f, "'?'"),
            Token::Colon(_) => write!(f, "':'"),
            Token::LParen(_) => write!(f, "'('"),
            Token::RParen(_) => write!(f, "')'"),
            Token::LBrace(_) => write!(f, "'{{'"),
            Token::RBrace(_) => write!(f, "'}}'"),
            Token::LBracket(_) => write!(f, "'['"),
            Token::RBracket(_) => write!(f, "']'"),
            Token::Semicolon(_) => write!(f, "';'"),
            Token::Comma(_) => write!(f, "','"),
            Token::Eof(_) => write!(f, "end of file"),
        }
    }
}

/// Lexer error type
#[derive(Error, Debug, Clone)]
#[error("{location}: {message}")]
pub struct LexError {
    pub message: String,
    pub location: SourceLocation,
}

/// Pull lexer over C source text.
///
/// Holds no line/column state of its own; the session's cursor is the one
/// source of truth for positions, advanced through the [`Context`] passed
/// to [`next_token`].
///
/// [`next_token`]: Lexer::next_token
pub struct Lexer {
    input: Vec<char>,
    position: usize,
}

impl Lexer {
    /// Create a new lexer for the given source string.
    pub fn new(source: &str) -> Self {
        Self {
            input: source.chars().collect(),
            position: 0,
        }
    }

    /// Produce the next token.
    ///
    /// On a lexical error the offending text has already been consumed and
    /// the cursor advanced past it, so the caller can report and keep
    /// pulling tokens without getting stuck.
    pub fn next_token(&mut self, ctx: &mut Context<'_>) -> Result<Token, LexError> {
        self.skip_insignificant(ctx)?;

        let loc = ctx.position();
        if self.is_at_end() {
            return Ok(Token::Eof(loc));
        }

        let start = self.position;
        let result = self.lex_token(loc);
        let consumed: String = self.input[start..self.position].iter().collect();
        ctx.advance(&consumed);

        match result? {
            Token::Ident(name, loc) if ctx.is_type_name(&name) => Ok(Token::TypeName(name, loc)),
            token => Ok(token),
        }
    }

    /// Scan one raw token starting at the current input position.  The
    /// cursor is advanced by the caller once the consumed length is known.
    fn lex_token(&mut self, loc: SourceLocation) -> Result<Token, LexError> {
        let ch = match self.bump() {
            Some(ch) => ch,
            None => return Ok(Token::Eof(loc)),
        };

        match ch {
            '"' => self.string_literal(loc),
            '\'' => self.char_literal(loc),
            '0'..='9' => self.number_literal(ch, loc),
            'a'..='z' | 'A'..='Z' | '_' => Ok(self.identifier_or_keyword(ch, loc)),

            '+' => {
                if self.eat('+') {
                    Ok(Token::PlusPlus(loc))
                } else if self.eat('=') {
                    Ok(Token::PlusEq(loc))
                } else {
                    Ok(Token::Plus(loc))
                }
            }
            '-' => {
                if self.eat('-') {
                    Ok(Token::MinusMinus(loc))
                } else if self.eat('=') {
                    Ok(Token::MinusEq(loc))
                } else if self.eat('>') {
                    Ok(Token::Arrow(loc))
                } else {
                    Ok(Token::Minus(loc))
                }
            }
            '*' => {
                if self.eat('=') {
                    Ok(Token::StarEq(loc))
                } else {
                    Ok(Token::Star(loc))
                }
            }
            '/' => {
                if self.eat('=') {
                    Ok(Token::SlashEq(loc))
                } else {
                    Ok(Token::Slash(loc))
                }
            }
            '%' => {
                if self.eat('=') {
                    Ok(Token::PercentEq(loc))
                } else {
                    Ok(Token::Percent(loc))
                }
            }
            '=' => {
                if self.eat('=') {
                    Ok(Token::EqEq(loc))
                } else {
                    Ok(Token::Eq(loc))
                }
            }
            '!' => {
                if self.eat('=') {
                    Ok(Token::NotEq(loc))
                } else {
                    Ok(Token::Bang(loc))
                }
            }
            '<' => {
                if self.eat('=') {
                    Ok(Token::Le(loc))
                } else if self.eat('<') {
                    if self.eat('=') {
                        Ok(Token::LtLtEq(loc))
                    } else {
                        Ok(Token::LtLt(loc))
                    }
                } else {
                    Ok(Token::Lt(loc))
                }
            }
            '>' => {
                if self.eat('=') {
                    Ok(Token::Ge(loc))
                } else if self.eat('>') {
                    if self.eat('=') {
                        Ok(Token::GtGtEq(loc))
                    } else {
                        Ok(Token::GtGt(loc))
                    }
                } else {
                    Ok(Token::Gt(loc))
                }
            }
            '&' => {
                if self.eat('&') {
                    Ok(Token::AndAnd(loc))
                } else if self.eat('=') {
                    Ok(Token::AmpEq(loc))
                } else {
                    Ok(Token::Amp(loc))
                }
            }
            '|' => {
                if self.eat('|') {
                    Ok(Token::OrOr(loc))
                } else if self.eat('=') {
                    Ok(Token::PipeEq(loc))
                } else {
                    Ok(Token::Pipe(loc))
                }
            }
            '^' => {
                if self.eat('=') {
                    Ok(Token::CaretEq(loc))
                } else {
                    Ok(Token::Caret(loc))
                }
            }
            '~' => Ok(Token::Tilde(loc)),
            '.' => Ok(Token::Dot(loc)),
            '?' => Ok(Token::Question(loc)),
            ':' => Ok(Token::Colon(loc)),
            '(' => Ok(Token::LParen(loc)),
            ')' => Ok(Token::RParen(loc)),
            '{' => Ok(Token::LBrace(loc)),
            '}' => Ok(Token::RBrace(loc)),
            '[' => Ok(Token::LBracket(loc)),
            ']' => Ok(Token::RBracket(loc)),
            ';' => Ok(Token::Semicolon(loc)),
            ',' => Ok(Token::Comma(loc)),

            _ => Err(LexError {
                message: format!("Unexpected character: '{}'", ch),
                location: loc,
            }),
        }
    }

    /// Parse string literal
    fn string_literal(&mut self, loc: SourceLocation) -> Result<Token, LexError> {
        let mut string = String::new();

        while let Some(ch) = self.peek() {
            if ch == '"' {
                self.bump(); // consume closing quote
                return Ok(Token::StringLiteral(string, loc));
            }

            if ch == '\n' {
                break; // string literals do not span lines
            }

            if ch == '\\' {
                self.bump();
                let escaped = match self.bump() {
                    Some(e) => e,
                    None => break,
                };
                string.push(self.unescape(escaped, loc)?);
            } else {
                string.push(ch);
                self.bump();
            }
        }

        Err(LexError {
            message: "Unterminated string literal".to_string(),
            location: loc,
        })
    }

    fn unescape(&mut self, escaped: char, loc: SourceLocation) -> Result<char, LexError> {
        match escaped {
            'n' => Ok('\n'),
            't' => Ok('\t'),
            'r' => Ok('\r'),
            '\\' => Ok('\\'),
            '"' => Ok('"'),
            '\'' => Ok('\''),
            '0' => Ok('\0'),
            _ => Err(LexError {
                message: format!("Unknown escape sequence: \\{}", escaped),
                location: loc,
            }),
        }
    }

    /// Parse character literal
    fn char_literal(&mut self, loc: SourceLocation) -> Result<Token, LexError> {
        let ch = self.bump().ok_or_else(|| LexError {
            message: "Unterminated character literal".to_string(),
            location: loc,
        })?;

        let value = if ch == '\\' {
            let escaped = self.bump().ok_or_else(|| LexError {
                message: "Unterminated character literal".to_string(),
                location: loc,
            })?;

            if escaped == 'x' {
                // Hex escape: \xHH
                let mut hex = String::new();
                for _ in 0..2 {
                    match self.bump() {
                        Some(h) => hex.push(h),
                        None => {
                            return Err(LexError {
                                message: "Incomplete hex escape sequence".to_string(),
                                location: loc,
                            });
                        }
                    }
                }
                u8::from_str_radix(&hex, 16).map(|v| v as i8).map_err(|_| LexError {
                    message: format!("Invalid hex escape sequence: \\x{}", hex),
                    location: loc,
                })?
            } else {
                self.unescape(escaped, loc)? as i8
            }
        } else {
            ch as i8
        };

        if self.bump() != Some('\'') {
            return Err(LexError {
                message: "Expected closing quote in character literal".to_string(),
                location: loc,
            });
        }

        Ok(Token::CharLiteral(value, loc))
    }

    /// Parse a numeric literal: decimal, octal, or hex integers with
    /// optional u/l suffixes, or a decimal floating literal.
    fn number_literal(&mut self, first: char, loc: SourceLocation) -> Result<Token, LexError> {
        // Hex: 0x...
        if first == '0' && matches!(self.peek(), Some('x') | Some('X')) {
            self.bump();
            let mut digits = String::new();
            while let Some(ch) = self.peek() {
                if ch.is_ascii_hexdigit() {
                    digits.push(ch);
                    self.bump();
                } else {
                    break;
                }
            }
            if digits.is_empty() {
                return Err(LexError {
                    message: "Missing digits in hex literal".to_string(),
                    location: loc,
                });
            }
            self.skip_int_suffix();
            let value = i64::from_str_radix(&digits, 16).map_err(|_| LexError {
                message: format!("Integer literal too large: 0x{}", digits),
                location: loc,
            })?;
            return Ok(Token::IntLiteral(value, loc));
        }

        let mut digits = String::new();
        digits.push(first);
        while let Some(ch) = self.peek() {
            if ch.is_ascii_digit() {
                digits.push(ch);
                self.bump();
            } else {
                break;
            }
        }

        // Floating literal: fractional part and/or exponent
        let has_fraction =
            self.peek() == Some('.') && self.peek_ahead(1).is_some_and(|c| c.is_ascii_digit());
        let has_exponent = matches!(self.peek(), Some('e') | Some('E'));
        if has_fraction || has_exponent {
            if has_fraction {
                digits.push('.');
                self.bump();
                while let Some(ch) = self.peek() {
                    if ch.is_ascii_digit() {
                        digits.push(ch);
                        self.bump();
                    } else {
                        break;
                    }
                }
            }
            if matches!(self.peek(), Some('e') | Some('E')) {
                digits.push('e');
                self.bump();
                if matches!(self.peek(), Some('+') | Some('-')) {
                    digits.push(self.bump().unwrap());
                }
                let mut exponent_digits = false;
                while let Some(ch) = self.peek() {
                    if ch.is_ascii_digit() {
                        digits.push(ch);
                        self.bump();
                        exponent_digits = true;
                    } else {
                        break;
                    }
                }
                if !exponent_digits {
                    return Err(LexError {
                        message: "Missing digits in floating exponent".to_string(),
                        location: loc,
                    });
                }
            }
            while matches!(self.peek(), Some('f') | Some('F') | Some('l') | Some('L')) {
                self.bump();
            }
            let value = digits.parse::<f64>().map_err(|_| LexError {
                message: format!("Invalid floating literal: {}", digits),
                location: loc,
            })?;
            return Ok(Token::FloatLiteral(value, loc));
        }

        self.skip_int_suffix();

        // A leading zero makes the literal octal
        let (radix, body) = if digits.len() > 1 && digits.starts_with('0') {
            (8, &digits[1..])
        } else {
            (10, digits.as_str())
        };
        let value = i64::from_str_radix(body, radix).map_err(|_| LexError {
            message: format!("Invalid integer literal: {}", digits),
            location: loc,
        })?;

        Ok(Token::IntLiteral(value, loc))
    }

    fn skip_int_suffix(&mut self) {
        while matches!(self.peek(), Some('u') | Some('U') | Some('l') | Some('L')) {
            self.bump();
        }
    }

    /// Parse identifier or keyword.  Typedef-name classification happens
    /// in [`next_token`] once the cursor has been advanced.
    ///
    /// [`next_token`]: Lexer::next_token
    fn identifier_or_keyword(&mut self, first: char, loc: SourceLocation) -> Token {
        let mut ident = String::new();
        ident.push(first);

        while let Some(ch) = self.peek() {
            if ch.is_ascii_alphanumeric() || ch == '_' {
                ident.push(ch);
                self.bump();
            } else {
                break;
            }
        }

        match ident.as_str() {
            "typedef" => Token::Typedef(loc),
            "void" => Token::Void(loc),
            "char" => Token::Char(loc),
            "short" => Token::Short(loc),
            "int" => Token::Int(loc),
            "long" => Token::Long(loc),
            "float" => Token::Float(loc),
            "double" => Token::Double(loc),
            "signed" => Token::Signed(loc),
            "unsigned" => Token::Unsigned(loc),
            "struct" => Token::Struct(loc),
            "union" => Token::Union(loc),
            "enum" => Token::Enum(loc),
            "const" => Token::Const(loc),
            "volatile" => Token::Volatile(loc),
            "static" => Token::Static(loc),
            "extern" => Token::Extern(loc),
            "if" => Token::If(loc),
            "else" => Token::Else(loc),
            "while" => Token::While(loc),
            "do" => Token::Do(loc),
            "for" => Token::For(loc),
            "switch" => Token::Switch(loc),
            "case" => Token::Case(loc),
            "default" => Token::Default(loc),
            "break" => Token::Break(loc),
            "continue" => Token::Continue(loc),
            "return" => Token::Return(loc),
            "goto" => Token::Goto(loc),
            "sizeof" => Token::Sizeof(loc),
            _ => Token::Ident(ident, loc),
        }
    }

    /// Skip whitespace, comments, and preprocessor lines, advancing the
    /// cursor once per skipped run.
    fn skip_insignificant(&mut self, ctx: &mut Context<'_>) -> Result<(), LexError> {
        loop {
            match self.peek() {
                Some(' ') | Some('\t') | Some('\r') | Some('\n') => {
                    let start = self.position;
                    while matches!(
                        self.peek(),
                        Some(' ') | Some('\t') | Some('\r') | Some('\n')
                    ) {
                        self.bump();
                    }
                    self.advance_ctx(ctx, start);
                }
                Some('/') if self.peek_ahead(1) == Some('/') => {
                    let start = self.position;
                    self.skip_to_end_of_line();
                    self.advance_ctx(ctx, start);
                }
                Some('/') if self.peek_ahead(1) == Some('*') => {
                    let loc = ctx.position();
                    let start = self.position;
                    let closed = self.skip_block_comment();
                    self.advance_ctx(ctx, start);
                    if !closed {
                        return Err(LexError {
                            message: "Unterminated block comment".to_string(),
                            location: loc,
                        });
                    }
                }
                Some('#') => {
                    // Preprocessor directives are skipped, not parsed
                    let start = self.position;
                    self.skip_to_end_of_line();
                    self.advance_ctx(ctx, start);
                }
                _ => return Ok(()),
            }
        }
    }

    fn advance_ctx(&self, ctx: &mut Context<'_>, start: usize) {
        let consumed: String = self.input[start..self.position].iter().collect();
        ctx.advance(&consumed);
    }

    /// Skip through the next newline (or to end of input).
    fn skip_to_end_of_line(&mut self) {
        while let Some(ch) = self.bump() {
            if ch == '\n' {
                break;
            }
        }
    }

    /// Skip a `/* ... */` comment.  Returns false if the comment ran off
    /// the end of the input.
    fn skip_block_comment(&mut self) -> bool {
        self.bump(); // skip '/'
        self.bump(); // skip '*'

        while !self.is_at_end() {
            if self.peek() == Some('*') && self.peek_ahead(1) == Some('/') {
                self.bump();
                self.bump();
                return true;
            }
            self.bump();
        }

        false
    }

    /// Peek at current character without consuming
    fn peek(&self) -> Option<char> {
        self.input.get(self.position).copied()
    }

    /// Peek ahead n characters
    fn peek_ahead(&self, n: usize) -> Option<char> {
        self.input.get(self.position + n).copied()
    }

    /// Consume one character
    fn bump(&mut self) -> Option<char> {
        let ch = self.peek()?;
        self.position += 1;
        Some(ch)
    }

    /// Consume the next character if it matches
    fn eat(&mut self, expected: char) -> bool {
        if self.peek() == Some(expected) {
            self.position += 1;
            true
        } else {
            false
        }
    }

    fn is_at_end(&self) -> bool {
        self.position >= self.input.len()
    }
}
