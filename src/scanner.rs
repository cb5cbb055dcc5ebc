// ABOUTME: Single-pass character scanner producing the token stream

use crate::error;
use crate::token::{keyword, Token, TokenKind};

pub struct Scanner {
    chars: Vec<char>,
    start: usize,
    current: usize,
    line: usize,
    tokens: Vec<Token>,
    had_error: bool,
}

impl Scanner {
    pub fn new(source: &str) -> Self {
        Scanner {
            chars: source.chars().collect(),
            start: 0,
            current: 0,
            line: 1,
            tokens: Vec::new(),
            had_error: false,
        }
    }

    /// Consumes the scanner, returning the token stream terminated by an
    /// EOF token, plus whether any lexical error was reported. Errors do
    /// not abort the scan.
    pub fn scan_tokens(mut self) -> (Vec<Token>, bool) {
        while !self.is_at_end() {
            self.start = self.current;
            self.scan_token();
        }
        self.tokens
            .push(Token::new(TokenKind::Eof, "", None, self.line));
        (self.tokens, self.had_error)
    }

    fn scan_token(&mut self) {
        let c = self.advance();
        match c {
            '(' => self.add_token(TokenKind::LeftParen),
            ')' => self.add_token(TokenKind::RightParen),
            '{' => self.add_token(TokenKind::LeftBrace),
            '}' => self.add_token(TokenKind::RightBrace),
            ',' => self.add_token(TokenKind::Comma),
            '.' => self.add_token(TokenKind::Dot),
            '-' => self.add_token(TokenKind::Minus),
            '+' => self.add_token(TokenKind::Plus),
            ';' => self.add_token(TokenKind::Semicolon),
            '*' => self.add_token(TokenKind::Star),
            '!' => {
                let kind = if self.matches('=') {
                    TokenKind::BangEqual
                } else {
                    TokenKind::Bang
                };
                self.add_token(kind);
            }
            '=' => {
                let kind = if self.matches('=') {
                    TokenKind::EqualEqual
                } else {
                    TokenKind::Equal
                };
                self.add_token(kind);
            }
            '<' => {
                let kind = if self.matches('=') {
                    TokenKind::LessEqual
                } else {
                    TokenKind::Less
                };
                self.add_token(kind);
            }
            '>' => {
                let kind = if self.matches('=') {
                    TokenKind::GreaterEqual
                } else {
                    TokenKind::Greater
                };
                self.add_token(kind);
            }
            '/' => {
                if self.matches('/') {
                    // Comment runs to the end of the line, exclusive
                    while self.peek() != '\n' && !self.is_at_end() {
                        self.current += 1;
                    }
                } else {
                    self.add_token(TokenKind::Slash);
                }
            }
            ' ' | '\t' | '\r' => {}
            '\n' => self.line += 1,
            '"' => self.string(),
            c if c.is_ascii_digit() => self.number(),
            c if c.is_ascii_alphabetic() || c == '_' => self.identifier(),
            other => {
                error::lexical(self.line, &format!("Unexpected character: {other}"));
                self.had_error = true;
            }
        }
    }

    fn string(&mut self) {
        while self.peek() != '"' && !self.is_at_end() {
            if self.peek() == '\n' {
                self.line += 1;
            }
            self.current += 1;
        }

        if self.is_at_end() {
            error::lexical(self.line, "Unterminated string.");
            self.had_error = true;
            return;
        }

        self.current += 1; // closing quote
        let literal: String = self.chars[self.start + 1..self.current - 1].iter().collect();
        self.add_literal_token(TokenKind::String, Some(literal));
    }

    fn number(&mut self) {
        while self.peek().is_ascii_digit() || self.peek() == '.' {
            self.current += 1;
        }
        let lexeme: String = self.chars[self.start..self.current].iter().collect();
        let literal = canonical_number(&lexeme);
        self.add_literal_token(TokenKind::Number, Some(literal));
    }

    fn identifier(&mut self) {
        while self.peek().is_ascii_alphanumeric() || self.peek() == '_' {
            self.current += 1;
        }
        let lexeme: String = self.chars[self.start..self.current].iter().collect();
        match keyword(&lexeme) {
            Some(kind) => self.add_token(kind),
            None => self.add_token(TokenKind::Identifier),
        }
    }

    fn add_token(&mut self, kind: TokenKind) {
        self.add_literal_token(kind, None);
    }

    fn add_literal_token(&mut self, kind: TokenKind, literal: Option<String>) {
        let lexeme: String = self.chars[self.start..self.current].iter().collect();
        self.tokens.push(Token::new(kind, lexeme, literal, self.line));
    }

    fn advance(&mut self) -> char {
        let c = self.chars[self.current];
        self.current += 1;
        c
    }

    /// Conditionally consumes the next character (two-character operators)
    fn matches(&mut self, expected: char) -> bool {
        if self.is_at_end() || self.chars[self.current] != expected {
            return false;
        }
        self.current += 1;
        true
    }

    fn peek(&self) -> char {
        if self.is_at_end() {
            '\0'
        } else {
            self.chars[self.current]
        }
    }

    fn is_at_end(&self) -> bool {
        self.current >= self.chars.len()
    }
}

/// Canonical decimal form of a NUMBER lexeme: trailing zeros after the
/// fractional part are trimmed but one fractional digit always remains;
/// integer lexemes get a `.0` suffix.
fn canonical_number(lexeme: &str) -> String {
    match lexeme.find('.') {
        None => format!("{lexeme}.0"),
        Some(dot) => {
            let trimmed = lexeme.trim_end_matches('0');
            if trimmed.len() <= dot + 1 {
                format!("{}0", &lexeme[..dot + 1])
            } else {
                trimmed.to_string()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(source: &str) -> Vec<TokenKind> {
        let (tokens, _) = Scanner::new(source).scan_tokens();
        tokens.into_iter().map(|t| t.kind).collect()
    }

    #[test]
    fn test_empty_source_yields_only_eof() {
        let (tokens, had_error) = Scanner::new("").scan_tokens();
        assert_eq!(tokens.len(), 1);
        assert_eq!(tokens[0].kind, TokenKind::Eof);
        assert_eq!(tokens[0].lexeme, "");
        assert!(!had_error);
    }

    #[test]
    fn test_single_character_tokens() {
        assert_eq!(
            kinds("(){},.+-;*/"),
            vec![
                TokenKind::LeftParen,
                TokenKind::RightParen,
                TokenKind::LeftBrace,
                TokenKind::RightBrace,
                TokenKind::Comma,
                TokenKind::Dot,
                TokenKind::Plus,
                TokenKind::Minus,
                TokenKind::Semicolon,
                TokenKind::Star,
                TokenKind::Slash,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn test_two_character_operators() {
        assert_eq!(
            kinds("== != <= >= = ! < >"),
            vec![
                TokenKind::EqualEqual,
                TokenKind::BangEqual,
                TokenKind::LessEqual,
                TokenKind::GreaterEqual,
                TokenKind::Equal,
                TokenKind::Bang,
                TokenKind::Less,
                TokenKind::Greater,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn test_comment_runs_to_newline() {
        let (tokens, had_error) = Scanner::new("// nothing here\n42").scan_tokens();
        assert!(!had_error);
        assert_eq!(tokens.len(), 2);
        assert_eq!(tokens[0].kind, TokenKind::Number);
        assert_eq!(tokens[0].line, 2);
    }

    #[test]
    fn test_string_literal_strips_quotes() {
        let (tokens, _) = Scanner::new("\"hello\"").scan_tokens();
        assert_eq!(tokens[0].kind, TokenKind::String);
        assert_eq!(tokens[0].lexeme, "\"hello\"");
        assert_eq!(tokens[0].literal.as_deref(), Some("hello"));
    }

    #[test]
    fn test_unterminated_string_reports_and_emits_no_token() {
        let (tokens, had_error) = Scanner::new("\"oops").scan_tokens();
        assert!(had_error);
        assert_eq!(tokens.len(), 1);
        assert_eq!(tokens[0].kind, TokenKind::Eof);
    }

    #[test]
    fn test_multiline_string_tracks_lines() {
        let (tokens, _) = Scanner::new("\"a\nb\"\nx").scan_tokens();
        assert_eq!(tokens[0].kind, TokenKind::String);
        assert_eq!(tokens[1].lexeme, "x");
        assert_eq!(tokens[1].line, 3);
    }

    #[test]
    fn test_number_literals_are_canonicalized() {
        let (tokens, _) = Scanner::new("100 200.00 1234.1234 10.10").scan_tokens();
        let literals: Vec<_> = tokens[..4]
            .iter()
            .map(|t| t.literal.clone().unwrap())
            .collect();
        assert_eq!(literals, vec!["100.0", "200.0", "1234.1234", "10.1"]);
    }

    #[test]
    fn test_trailing_dot_keeps_a_fractional_digit() {
        assert_eq!(canonical_number("123."), "123.0");
        assert_eq!(canonical_number("0.000"), "0.0");
    }

    #[test]
    fn test_keywords_and_identifiers() {
        assert_eq!(
            kinds("var x while foo_bar _tmp"),
            vec![
                TokenKind::Var,
                TokenKind::Identifier,
                TokenKind::While,
                TokenKind::Identifier,
                TokenKind::Identifier,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn test_unexpected_character_continues_scanning() {
        let (tokens, had_error) = Scanner::new("@ 1").scan_tokens();
        assert!(had_error);
        assert_eq!(tokens[0].kind, TokenKind::Number);
        assert_eq!(tokens.len(), 2);
    }

    #[test]
    fn test_scanning_is_idempotent() {
        let source = "var a = (1.50 + 2) * \"x\"; // tail";
        let (first, _) = Scanner::new(source).scan_tokens();
        let (second, _) = Scanner::new(source).scan_tokens();
        let render = |tokens: &[Token]| {
            tokens
                .iter()
                .map(|t| format!("{t}"))
                .collect::<Vec<_>>()
                .join("\n")
        };
        assert_eq!(render(&first), render(&second));
    }
}
