// ABOUTME: Syntax highlighter for the REPL prompt
// Implements rustyline's Highlighter trait to colorize Lox syntax
// while preserving display width

use crate::token::keyword;
use rustyline::highlight::{CmdKind, Highlighter};
use rustyline_derive::{Completer, Helper, Hinter, Validator};
use std::borrow::Cow;

// ANSI color codes (3-bit/4-bit for maximum terminal compatibility)
const COLOR_RESET: &str = "\x1b[0m";
const COLOR_KEYWORD: &str = "\x1b[1;35m"; // Bold magenta
const COLOR_NUMBER: &str = "\x1b[33m"; // Yellow
const COLOR_STRING: &str = "\x1b[32m"; // Green
const COLOR_COMMENT: &str = "\x1b[90m"; // Bright black (gray)
const COLOR_BRACKET: &str = "\x1b[1;34m"; // Bold blue

/// REPL helper providing syntax-aware highlighting for Lox input
#[derive(Completer, Helper, Hinter, Validator)]
pub struct LoxHelper;

impl Highlighter for LoxHelper {
    fn highlight<'l>(&self, line: &'l str, _pos: usize) -> Cow<'l, str> {
        let highlighted = highlight_line(line);
        if highlighted == line {
            Cow::Borrowed(line)
        } else {
            Cow::Owned(highlighted)
        }
    }

    fn highlight_char(&self, _line: &str, _pos: usize, _kind: CmdKind) -> bool {
        true
    }
}

/// Walk the line once, wrapping strings, numbers, comments, reserved
/// words, and brackets in color codes.
fn highlight_line(line: &str) -> String {
    let chars: Vec<char> = line.chars().collect();
    let mut out = String::with_capacity(line.len());
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];

        if c == '/' && chars.get(i + 1) == Some(&'/') {
            out.push_str(COLOR_COMMENT);
            out.extend(&chars[i..]);
            out.push_str(COLOR_RESET);
            break;
        }

        if c == '"' {
            let start = i;
            i += 1;
            while i < chars.len() && chars[i] != '"' {
                i += 1;
            }
            if i < chars.len() {
                i += 1; // closing quote
            }
            out.push_str(COLOR_STRING);
            out.extend(&chars[start..i]);
            out.push_str(COLOR_RESET);
            continue;
        }

        if c.is_ascii_digit() {
            let start = i;
            while i < chars.len() && (chars[i].is_ascii_digit() || chars[i] == '.') {
                i += 1;
            }
            out.push_str(COLOR_NUMBER);
            out.extend(&chars[start..i]);
            out.push_str(COLOR_RESET);
            continue;
        }

        if c.is_ascii_alphabetic() || c == '_' {
            let start = i;
            while i < chars.len() && (chars[i].is_ascii_alphanumeric() || chars[i] == '_') {
                i += 1;
            }
            let word: String = chars[start..i].iter().collect();
            if keyword(&word).is_some() {
                out.push_str(COLOR_KEYWORD);
                out.push_str(&word);
                out.push_str(COLOR_RESET);
            } else {
                out.push_str(&word);
            }
            continue;
        }

        if matches!(c, '(' | ')' | '{' | '}') {
            out.push_str(COLOR_BRACKET);
            out.push(c);
            out.push_str(COLOR_RESET);
            i += 1;
            continue;
        }

        out.push(c);
        i += 1;
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keywords_are_colored() {
        let out = highlight_line("var x");
        assert!(out.starts_with(COLOR_KEYWORD));
        assert!(out.contains("var"));
        assert!(out.ends_with("x"));
    }

    #[test]
    fn test_plain_identifiers_pass_through() {
        assert_eq!(highlight_line("foo bar"), "foo bar");
    }

    #[test]
    fn test_comment_swallows_rest_of_line() {
        let out = highlight_line("1 // var x");
        let comment_at = out.find(COLOR_COMMENT).expect("comment colored");
        assert!(!out[comment_at..].contains(COLOR_KEYWORD));
    }

    #[test]
    fn test_string_contents_are_not_keyword_colored() {
        let out = highlight_line("\"while\"");
        assert!(out.starts_with(COLOR_STRING));
        assert!(!out.contains(COLOR_KEYWORD));
    }
}
