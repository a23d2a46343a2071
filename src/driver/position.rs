//! Line/column tracking for diagnostic locations.

use std::fmt;

/// Source location information for error reporting
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SourceLocation {
    pub line: usize,
    pub column: usize,
}

impl SourceLocation {
    pub fn new(line: usize, column: usize) -> Self {
        Self { line, column }
    }
}

impl fmt::Display for SourceLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

/// Current position in the input, advanced by the tokenizer as text is
/// consumed.
///
/// Both counters are 1-based and only ever move forward within one parse;
/// the tokenizer makes a single pass and never rewinds.  [`advance`] is
/// called once per lexical unit, including whitespace and comments, so that
/// error locations stay accurate even inside skipped text.
///
/// [`advance`]: PositionCursor::advance
#[derive(Debug)]
pub struct PositionCursor {
    line: usize,
    column: usize,
}

impl PositionCursor {
    pub fn new() -> Self {
        Self { line: 1, column: 1 }
    }

    /// Update line and column for the text just consumed.
    pub fn advance(&mut self, consumed: &str) {
        for ch in consumed.chars() {
            if ch == '\n' {
                self.line += 1;
                self.column = 1;
            } else {
                self.column += 1;
            }
        }
    }

    pub fn current(&self) -> SourceLocation {
        SourceLocation::new(self.line, self.column)
    }

    /// Back to (1, 1).  Only valid at session (re)start.
    pub fn reset(&mut self) {
        self.line = 1;
        self.column = 1;
    }
}

impl Default for PositionCursor {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_starts_at_one_one() {
        let cursor = PositionCursor::new();
        assert_eq!(cursor.current(), SourceLocation::new(1, 1));
    }

    #[test]
    fn test_advance_within_line() {
        let mut cursor = PositionCursor::new();
        cursor.advance("int");
        assert_eq!(cursor.current(), SourceLocation::new(1, 4));
        cursor.advance(" ");
        assert_eq!(cursor.current(), SourceLocation::new(1, 5));
    }

    #[test]
    fn test_newline_resets_column() {
        let mut cursor = PositionCursor::new();
        cursor.advance("int x;\n");
        assert_eq!(cursor.current(), SourceLocation::new(2, 1));
        cursor.advance("  y");
        assert_eq!(cursor.current(), SourceLocation::new(2, 4));
    }

    #[test]
    fn test_multiline_advance() {
        let mut cursor = PositionCursor::new();
        cursor.advance("/* a\nmultiline\ncomment */");
        assert_eq!(cursor.current(), SourceLocation::new(3, 11));
    }

    #[test]
    fn test_reset() {
        let mut cursor = PositionCursor::new();
        cursor.advance("a\nb\nc");
        cursor.reset();
        assert_eq!(cursor.current(), SourceLocation::new(1, 1));
    }
}
