// ABOUTME: Recursive-descent parser over the token stream

use crate::ast::{Expr, FunctionDecl, Literal, Stmt};
use crate::error::{self, ParseError};
use crate::token::{Token, TokenKind};
use std::rc::Rc;

/// Argument and parameter lists are capped; overflow is reported but
/// does not abort the parse.
const MAX_CALL_ARGS: usize = 255;

type ExprResult = Result<Expr, ParseError>;
type StmtResult = Result<Stmt, ParseError>;

pub struct Parser {
    tokens: Vec<Token>,
    current: usize,
    had_error: bool,
}

impl Parser {
    /// Expects a stream terminated by an EOF token, as the scanner
    /// produces.
    pub fn new(tokens: Vec<Token>) -> Self {
        Parser {
            tokens,
            current: 0,
            had_error: false,
        }
    }

    /// Parses `declaration* EOF`, recovering at statement boundaries so
    /// that later errors still surface.
    pub fn parse(&mut self) -> Vec<Stmt> {
        let mut statements = Vec::new();
        while !self.is_at_end() {
            if let Some(statement) = self.declaration() {
                statements.push(statement);
            }
        }
        statements
    }

    /// Parses the first expression of the input (`parse` and `evaluate`
    /// modes); trailing tokens are left unconsumed.
    pub fn parse_expression(&mut self) -> Option<Expr> {
        self.expression().ok()
    }

    pub fn had_error(&self) -> bool {
        self.had_error
    }

    // ===== Statements =====

    fn declaration(&mut self) -> Option<Stmt> {
        let result = if self.matches(TokenKind::Fun) {
            self.function_declaration()
        } else if self.matches(TokenKind::Var) {
            self.var_declaration()
        } else {
            self.statement()
        };
        match result {
            Ok(statement) => Some(statement),
            Err(_) => {
                self.synchronize();
                None
            }
        }
    }

    fn function_declaration(&mut self) -> StmtResult {
        let name = self
            .consume(TokenKind::Identifier, "Expect function name.")?
            .clone();
        self.consume(TokenKind::LeftParen, "Expect '(' after function name.")?;

        let mut params = Vec::new();
        if !self.check(TokenKind::RightParen) {
            loop {
                if params.len() >= MAX_CALL_ARGS {
                    let token = self.peek().clone();
                    self.error(&token, "Can't have more than 255 parameters.");
                }
                params.push(
                    self.consume(TokenKind::Identifier, "Expect parameter name.")?
                        .clone(),
                );
                if !self.matches(TokenKind::Comma) {
                    break;
                }
            }
        }
        self.consume(TokenKind::RightParen, "Expect ')' after parameters.")?;

        self.consume(TokenKind::LeftBrace, "Expect '{' before function body.")?;
        let body = self.block()?;
        Ok(Stmt::Function(Rc::new(FunctionDecl { name, params, body })))
    }

    fn var_declaration(&mut self) -> StmtResult {
        let name = self
            .consume(TokenKind::Identifier, "Expect variable name.")?
            .clone();
        let initializer = if self.matches(TokenKind::Equal) {
            Some(self.expression()?)
        } else {
            None
        };
        self.consume(TokenKind::Semicolon, "Expect ';' after variable declaration.")?;
        Ok(Stmt::Var { name, initializer })
    }

    fn statement(&mut self) -> StmtResult {
        if self.matches(TokenKind::For) {
            return self.for_statement();
        }
        if self.matches(TokenKind::If) {
            return self.if_statement();
        }
        if self.matches(TokenKind::Print) {
            return self.print_statement();
        }
        if self.matches(TokenKind::Return) {
            return self.return_statement();
        }
        if self.matches(TokenKind::While) {
            return self.while_statement();
        }
        if self.matches(TokenKind::LeftBrace) {
            return Ok(Stmt::Block(self.block()?));
        }
        self.expression_statement()
    }

    /// Desugars `for (init; cond; inc) body` into an initializer block
    /// wrapping a while loop whose body appends the increment.
    fn for_statement(&mut self) -> StmtResult {
        self.consume(TokenKind::LeftParen, "Expect '(' after 'for'.")?;

        let initializer = if self.matches(TokenKind::Semicolon) {
            None
        } else if self.matches(TokenKind::Var) {
            Some(self.var_declaration()?)
        } else {
            Some(self.expression_statement()?)
        };

        let condition = if self.check(TokenKind::Semicolon) {
            None
        } else {
            Some(self.expression()?)
        };
        self.consume(TokenKind::Semicolon, "Expect ';' after loop condition.")?;

        let increment = if self.check(TokenKind::RightParen) {
            None
        } else {
            Some(self.expression()?)
        };
        self.consume(TokenKind::RightParen, "Expect ')' after for clauses.")?;

        let mut body = self.statement()?;
        if let Some(increment) = increment {
            body = Stmt::Block(vec![body, Stmt::Expression(increment)]);
        }
        let condition = condition.unwrap_or(Expr::Literal(Literal::Bool(true)));
        body = Stmt::While {
            condition,
            body: Box::new(body),
        };
        if let Some(initializer) = initializer {
            body = Stmt::Block(vec![initializer, body]);
        }
        Ok(body)
    }

    fn if_statement(&mut self) -> StmtResult {
        self.consume(TokenKind::LeftParen, "Expect '(' after 'if'.")?;
        let condition = self.expression()?;
        self.consume(TokenKind::RightParen, "Expect ')' after if condition.")?;

        let then_branch = Box::new(self.statement()?);
        let else_branch = if self.matches(TokenKind::Else) {
            Some(Box::new(self.statement()?))
        } else {
            None
        };
        Ok(Stmt::If {
            condition,
            then_branch,
            else_branch,
        })
    }

    fn while_statement(&mut self) -> StmtResult {
        self.consume(TokenKind::LeftParen, "Expect '(' after 'while'.")?;
        let condition = self.expression()?;
        self.consume(TokenKind::RightParen, "Expect ')' after condition.")?;
        let body = Box::new(self.statement()?);
        Ok(Stmt::While { condition, body })
    }

    fn print_statement(&mut self) -> StmtResult {
        let expr = self.expression()?;
        self.consume(TokenKind::Semicolon, "Expect ';' after value.")?;
        Ok(Stmt::Print(expr))
    }

    fn return_statement(&mut self) -> StmtResult {
        let keyword = self.previous().clone();
        let value = if self.check(TokenKind::Semicolon) {
            None
        } else {
            Some(self.expression()?)
        };
        self.consume(TokenKind::Semicolon, "Expect ';' after return value.")?;
        Ok(Stmt::Return { keyword, value })
    }

    fn expression_statement(&mut self) -> StmtResult {
        let expr = self.expression()?;
        self.consume(TokenKind::Semicolon, "Expect ';' after expression.")?;
        Ok(Stmt::Expression(expr))
    }

    fn block(&mut self) -> Result<Vec<Stmt>, ParseError> {
        let mut statements = Vec::new();
        while !self.check(TokenKind::RightBrace) && !self.is_at_end() {
            if let Some(statement) = self.declaration() {
                statements.push(statement);
            }
        }
        self.consume(TokenKind::RightBrace, "Expect '}' after block.")?;
        Ok(statements)
    }

    // ===== Expressions, lowest to highest precedence =====

    fn expression(&mut self) -> ExprResult {
        self.assignment()
    }

    fn assignment(&mut self) -> ExprResult {
        let expr = self.logic_or()?;

        if self.matches(TokenKind::Equal) {
            let equals = self.previous().clone();
            let value = self.assignment()?;

            if let Expr::Variable { name } = expr {
                return Ok(Expr::Assign {
                    name,
                    value: Box::new(value),
                });
            }
            // Reported without entering panic mode; parsing continues
            self.error(&equals, "Invalid assignment target.");
        }
        Ok(expr)
    }

    fn logic_or(&mut self) -> ExprResult {
        let mut expr = self.logic_and()?;
        while self.matches(TokenKind::Or) {
            let op = self.previous().clone();
            let right = self.logic_and()?;
            expr = Expr::Logical {
                left: Box::new(expr),
                op,
                right: Box::new(right),
            };
        }
        Ok(expr)
    }

    fn logic_and(&mut self) -> ExprResult {
        let mut expr = self.equality()?;
        while self.matches(TokenKind::And) {
            let op = self.previous().clone();
            let right = self.equality()?;
            expr = Expr::Logical {
                left: Box::new(expr),
                op,
                right: Box::new(right),
            };
        }
        Ok(expr)
    }

    fn equality(&mut self) -> ExprResult {
        let mut expr = self.comparison()?;
        while self.matches_any(&[TokenKind::BangEqual, TokenKind::EqualEqual]) {
            let op = self.previous().clone();
            let right = self.comparison()?;
            expr = Expr::Binary {
                left: Box::new(expr),
                op,
                right: Box::new(right),
            };
        }
        Ok(expr)
    }

    fn comparison(&mut self) -> ExprResult {
        let mut expr = self.term()?;
        while self.matches_any(&[
            TokenKind::Greater,
            TokenKind::GreaterEqual,
            TokenKind::Less,
            TokenKind::LessEqual,
        ]) {
            let op = self.previous().clone();
            let right = self.term()?;
            expr = Expr::Binary {
                left: Box::new(expr),
                op,
                right: Box::new(right),
            };
        }
        Ok(expr)
    }

    fn term(&mut self) -> ExprResult {
        let mut expr = self.factor()?;
        while self.matches_any(&[TokenKind::Minus, TokenKind::Plus]) {
            let op = self.previous().clone();
            let right = self.factor()?;
            expr = Expr::Binary {
                left: Box::new(expr),
                op,
                right: Box::new(right),
            };
        }
        Ok(expr)
    }

    fn factor(&mut self) -> ExprResult {
        let mut expr = self.unary()?;
        while self.matches_any(&[TokenKind::Slash, TokenKind::Star]) {
            let op = self.previous().clone();
            let right = self.unary()?;
            expr = Expr::Binary {
                left: Box::new(expr),
                op,
                right: Box::new(right),
            };
        }
        Ok(expr)
    }

    fn unary(&mut self) -> ExprResult {
        if self.matches_any(&[TokenKind::Bang, TokenKind::Minus]) {
            let op = self.previous().clone();
            let right = self.unary()?;
            return Ok(Expr::Unary {
                op,
                right: Box::new(right),
            });
        }
        self.call()
    }

    fn call(&mut self) -> ExprResult {
        let mut expr = self.primary()?;
        while self.matches(TokenKind::LeftParen) {
            expr = self.finish_call(expr)?;
        }
        Ok(expr)
    }

    fn finish_call(&mut self, callee: Expr) -> ExprResult {
        let mut arguments = Vec::new();
        if !self.check(TokenKind::RightParen) {
            loop {
                if arguments.len() >= MAX_CALL_ARGS {
                    let token = self.peek().clone();
                    self.error(&token, "Can't have more than 255 arguments.");
                }
                arguments.push(self.expression()?);
                if !self.matches(TokenKind::Comma) {
                    break;
                }
            }
        }
        let paren = self
            .consume(TokenKind::RightParen, "Expect ')' after arguments.")?
            .clone();
        Ok(Expr::Call {
            callee: Box::new(callee),
            paren,
            arguments,
        })
    }

    fn primary(&mut self) -> ExprResult {
        if self.matches(TokenKind::False) {
            return Ok(Expr::Literal(Literal::Bool(false)));
        }
        if self.matches(TokenKind::True) {
            return Ok(Expr::Literal(Literal::Bool(true)));
        }
        if self.matches(TokenKind::Nil) {
            return Ok(Expr::Literal(Literal::Nil));
        }
        if self.matches(TokenKind::Number) {
            let token = self.previous();
            let text = token
                .literal
                .clone()
                .unwrap_or_else(|| token.lexeme.clone());
            return Ok(Expr::Literal(Literal::Number(text)));
        }
        if self.matches(TokenKind::String) {
            let text = self.previous().literal.clone().unwrap_or_default();
            return Ok(Expr::Literal(Literal::String(text)));
        }
        if self.matches(TokenKind::Identifier) {
            return Ok(Expr::Variable {
                name: self.previous().clone(),
            });
        }
        if self.matches(TokenKind::LeftParen) {
            let expr = self.expression()?;
            self.consume(TokenKind::RightParen, "Expect ')' after expression.")?;
            return Ok(Expr::Grouping(Box::new(expr)));
        }

        let token = self.peek().clone();
        Err(self.error(&token, "Expect expression."))
    }

    // ===== Plumbing =====

    fn matches(&mut self, kind: TokenKind) -> bool {
        if self.check(kind) {
            self.advance();
            return true;
        }
        false
    }

    fn matches_any(&mut self, kinds: &[TokenKind]) -> bool {
        kinds.iter().any(|&kind| self.matches(kind))
    }

    fn check(&self, kind: TokenKind) -> bool {
        self.peek().kind == kind
    }

    fn consume(&mut self, kind: TokenKind, message: &str) -> Result<&Token, ParseError> {
        if self.check(kind) {
            return Ok(self.advance());
        }
        let token = self.peek().clone();
        Err(self.error(&token, message))
    }

    fn advance(&mut self) -> &Token {
        if !self.is_at_end() {
            self.current += 1;
        }
        self.previous()
    }

    fn is_at_end(&self) -> bool {
        self.peek().kind == TokenKind::Eof
    }

    fn peek(&self) -> &Token {
        &self.tokens[self.current]
    }

    fn previous(&self) -> &Token {
        &self.tokens[self.current - 1]
    }

    /// Reports the diagnostic, latches the error flag, and hands back a
    /// ParseError for the caller to raise (or discard, for the
    /// non-fatal diagnostics).
    fn error(&mut self, token: &Token, message: &str) -> ParseError {
        error::at_token(token, message);
        self.had_error = true;
        ParseError
    }

    /// Panic-mode recovery: discard tokens until just past a `;` or just
    /// before a token that begins a statement.
    fn synchronize(&mut self) {
        self.advance();
        while !self.is_at_end() {
            if self.previous().kind == TokenKind::Semicolon {
                return;
            }
            match self.peek().kind {
                TokenKind::Class
                | TokenKind::Fun
                | TokenKind::Var
                | TokenKind::For
                | TokenKind::If
                | TokenKind::While
                | TokenKind::Print
                | TokenKind::Return => return,
                _ => {}
            }
            self.advance();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scanner::Scanner;

    fn parse_program(source: &str) -> (Vec<Stmt>, bool) {
        let (tokens, _) = Scanner::new(source).scan_tokens();
        let mut parser = Parser::new(tokens);
        let statements = parser.parse();
        (statements, parser.had_error())
    }

    fn parse_expr(source: &str) -> (Option<Expr>, bool) {
        let (tokens, _) = Scanner::new(source).scan_tokens();
        let mut parser = Parser::new(tokens);
        let expr = parser.parse_expression();
        (expr, parser.had_error())
    }

    #[test]
    fn test_statement_kinds() {
        let (statements, had_error) = parse_program(
            "var a = 1; print a; { a = 2; } if (a > 1) print a; while (false) a = 3; fun f() { return; }",
        );
        assert!(!had_error);
        assert_eq!(statements.len(), 6);
        assert!(matches!(statements[0], Stmt::Var { .. }));
        assert!(matches!(statements[1], Stmt::Print(_)));
        assert!(matches!(statements[2], Stmt::Block(_)));
        assert!(matches!(statements[3], Stmt::If { .. }));
        assert!(matches!(statements[4], Stmt::While { .. }));
        assert!(matches!(statements[5], Stmt::Function(_)));
    }

    #[test]
    fn test_for_desugars_to_block_and_while() {
        let (statements, had_error) = parse_program("for (var i = 0; i < 3; i = i + 1) print i;");
        assert!(!had_error);
        assert_eq!(statements.len(), 1);
        match &statements[0] {
            Stmt::Block(parts) => {
                assert_eq!(parts.len(), 2);
                assert!(matches!(parts[0], Stmt::Var { .. }));
                assert!(matches!(parts[1], Stmt::While { .. }));
            }
            other => panic!("expected block, got {other:?}"),
        }
    }

    #[test]
    fn test_for_with_empty_clauses_loops_on_true() {
        let (statements, had_error) = parse_program("for (;;) print 1;");
        assert!(!had_error);
        match &statements[0] {
            Stmt::While { condition, .. } => {
                assert!(matches!(condition, Expr::Literal(Literal::Bool(true))))
            }
            other => panic!("expected while, got {other:?}"),
        }
    }

    #[test]
    fn test_assignment_is_right_associative() {
        let (expr, had_error) = parse_expr("a = b = 1");
        assert!(!had_error);
        match expr {
            Some(Expr::Assign { value, .. }) => assert!(matches!(*value, Expr::Assign { .. })),
            other => panic!("expected assignment, got {other:?}"),
        }
    }

    #[test]
    fn test_invalid_assignment_target_reports_without_aborting() {
        let (expr, had_error) = parse_expr("1 = 2");
        assert!(had_error);
        assert!(expr.is_some());
    }

    #[test]
    fn test_missing_expression_is_an_error() {
        let (expr, had_error) = parse_expr("+");
        assert!(had_error);
        assert!(expr.is_none());
    }

    #[test]
    fn test_synchronize_recovers_at_statement_boundary() {
        let (statements, had_error) = parse_program("var = 1; print 2;");
        assert!(had_error);
        // The bad declaration is dropped, the print statement survives
        assert_eq!(statements.len(), 1);
        assert!(matches!(statements[0], Stmt::Print(_)));
    }

    #[test]
    fn test_call_chains_and_arguments() {
        let (expr, had_error) = parse_expr("f(1)(2, 3)");
        assert!(!had_error);
        match expr {
            Some(Expr::Call {
                callee, arguments, ..
            }) => {
                assert_eq!(arguments.len(), 2);
                assert!(matches!(*callee, Expr::Call { .. }));
            }
            other => panic!("expected call, got {other:?}"),
        }
    }

    #[test]
    fn test_trailing_tokens_are_ignored_in_expression_mode() {
        let (expr, had_error) = parse_expr("(1 + 2) * 3; print 4;");
        assert!(!had_error);
        assert!(expr.is_some());
    }

    #[test]
    fn test_return_without_value() {
        let (statements, had_error) = parse_program("fun f() { return; }");
        assert!(!had_error);
        match &statements[0] {
            Stmt::Function(decl) => match &decl.body[0] {
                Stmt::Return { value, .. } => assert!(value.is_none()),
                other => panic!("expected return, got {other:?}"),
            },
            other => panic!("expected function, got {other:?}"),
        }
    }
}
