// ABOUTME: Error types and stderr diagnostic formatting

use crate::token::{Token, TokenKind};
use thiserror::Error;

/// A runtime fault carrying the source line of the offending token.
/// Rendering matches the interpreter's stderr contract: the message,
/// then the line marker.
#[derive(Error, Debug, Clone)]
#[error("{message}\n[line {line}]")]
pub struct RuntimeError {
    pub message: String,
    pub line: usize,
}

impl RuntimeError {
    pub fn new(token: &Token, message: impl Into<String>) -> Self {
        RuntimeError {
            message: message.into(),
            line: token.line,
        }
    }
}

/// Marker for a parse failure. The diagnostic has already been written
/// to stderr by the time this is raised; the parser unwinds to a
/// statement boundary and synchronizes.
#[derive(Error, Debug)]
#[error("parse error")]
pub struct ParseError;

/// Lexical diagnostic: `[line N] Error: MESSAGE`
pub fn lexical(line: usize, message: &str) {
    eprintln!("[line {line}] Error: {message}");
}

/// Parse diagnostic: `[line N] Error at 'LEX': MESSAGE`, with `at end`
/// in place of the lexeme for EOF.
pub fn at_token(token: &Token, message: &str) {
    if token.kind == TokenKind::Eof {
        eprintln!("[line {}] Error at end: {message}", token.line);
    } else {
        eprintln!("[line {}] Error at '{}': {message}", token.line, token.lexeme);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_runtime_error_display() {
        let token = Token::new(TokenKind::Plus, "+", None, 12);
        let err = RuntimeError::new(&token, "Operands must be numbers.");
        assert_eq!(format!("{}", err), "Operands must be numbers.\n[line 12]");
    }
}
