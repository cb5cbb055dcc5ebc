// ABOUTME: Statement executor and expression evaluator over the syntax tree

use crate::ast::{Expr, Literal, Stmt};
use crate::builtins;
use crate::env::Environment;
use crate::error::RuntimeError;
use crate::token::{Token, TokenKind};
use crate::value::{LoxFunction, Value};
use std::rc::Rc;

/// Non-local exit raised during execution. `Return` unwinds to the
/// innermost call frame; `Fault` unwinds to the top level.
pub enum Unwind {
    Return(Value),
    Fault(RuntimeError),
}

impl From<RuntimeError> for Unwind {
    fn from(err: RuntimeError) -> Self {
        Unwind::Fault(err)
    }
}

#[derive(Debug)]
pub struct Interpreter {
    globals: Rc<Environment>,
    environment: Rc<Environment>,
}

impl Interpreter {
    pub fn new() -> Self {
        let globals = Environment::new();
        builtins::register(&globals);
        Interpreter {
            environment: globals.clone(),
            globals,
        }
    }

    /// The global scope, also the closure of top-level functions
    #[allow(dead_code)]
    pub fn globals(&self) -> Rc<Environment> {
        self.globals.clone()
    }

    /// Executes a whole program. A `return` outside any function ends the
    /// program normally.
    pub fn interpret(&mut self, statements: &[Stmt]) -> Result<(), RuntimeError> {
        for statement in statements {
            match self.execute(statement) {
                Ok(()) => {}
                Err(Unwind::Return(_)) => return Ok(()),
                Err(Unwind::Fault(err)) => return Err(err),
            }
        }
        Ok(())
    }

    /// Evaluates a single expression (`evaluate` mode).
    pub fn interpret_expr(&mut self, expr: &Expr) -> Result<Value, RuntimeError> {
        match self.evaluate(expr) {
            Ok(value) => Ok(value),
            Err(Unwind::Fault(err)) => Err(err),
            // Calls absorb Return before it can reach an expression root
            Err(Unwind::Return(value)) => Ok(value),
        }
    }

    fn execute(&mut self, statement: &Stmt) -> Result<(), Unwind> {
        match statement {
            Stmt::Expression(expr) => {
                self.evaluate(expr)?;
            }
            Stmt::Print(expr) => {
                let value = self.evaluate(expr)?;
                println!("{value}");
            }
            Stmt::Var { name, initializer } => {
                let value = match initializer {
                    Some(expr) => self.evaluate(expr)?,
                    None => Value::Nil,
                };
                self.environment.define(name.lexeme.clone(), value);
            }
            Stmt::Block(statements) => {
                let scope = Environment::with_enclosing(self.environment.clone());
                self.execute_block(statements, scope)?;
            }
            Stmt::If {
                condition,
                then_branch,
                else_branch,
            } => {
                if self.evaluate(condition)?.is_truthy() {
                    self.execute(then_branch)?;
                } else if let Some(else_branch) = else_branch {
                    self.execute(else_branch)?;
                }
            }
            Stmt::While { condition, body } => {
                while self.evaluate(condition)?.is_truthy() {
                    self.execute(body)?;
                }
            }
            Stmt::Function(declaration) => {
                let function = LoxFunction {
                    declaration: declaration.clone(),
                    closure: self.environment.clone(),
                };
                self.environment
                    .define(declaration.name.lexeme.clone(), Value::Function(Rc::new(function)));
            }
            Stmt::Return { value, .. } => {
                let value = match value {
                    Some(expr) => self.evaluate(expr)?,
                    None => Value::Nil,
                };
                return Err(Unwind::Return(value));
            }
        }
        Ok(())
    }

    /// Runs `statements` inside `scope`, restoring the previous
    /// environment on every exit path, return and fault included.
    fn execute_block(&mut self, statements: &[Stmt], scope: Rc<Environment>) -> Result<(), Unwind> {
        let previous = std::mem::replace(&mut self.environment, scope);
        let result = statements
            .iter()
            .try_for_each(|statement| self.execute(statement));
        self.environment = previous;
        result
    }

    fn evaluate(&mut self, expr: &Expr) -> Result<Value, Unwind> {
        match expr {
            Expr::Literal(literal) => Ok(materialize(literal)),
            Expr::Grouping(inner) => self.evaluate(inner),
            Expr::Unary { op, right } => {
                let right = self.evaluate(right)?;
                match op.kind {
                    TokenKind::Bang => Ok(Value::Bool(!right.is_truthy())),
                    _ => {
                        let n = check_number_operand(op, &right)?;
                        Ok(Value::Number(-n))
                    }
                }
            }
            Expr::Binary { left, op, right } => {
                let left = self.evaluate(left)?;
                let right = self.evaluate(right)?;
                binary_operation(op, &left, &right)
            }
            Expr::Logical { left, op, right } => {
                let left = self.evaluate(left)?;
                let take_left = if op.kind == TokenKind::Or {
                    left.is_truthy()
                } else {
                    !left.is_truthy()
                };
                if take_left {
                    Ok(left)
                } else {
                    self.evaluate(right)
                }
            }
            Expr::Variable { name } => self.look_up(name),
            Expr::Assign { name, value } => {
                let value = self.evaluate(value)?;
                if self.environment.assign(&name.lexeme, value.clone()) {
                    Ok(value)
                } else {
                    Err(undefined_variable(name).into())
                }
            }
            Expr::Call {
                callee,
                paren,
                arguments,
            } => {
                let callee = self.evaluate(callee)?;
                let mut args = Vec::with_capacity(arguments.len());
                for argument in arguments {
                    args.push(self.evaluate(argument)?);
                }
                self.call_value(callee, args, paren)
            }
        }
    }

    fn look_up(&self, name: &Token) -> Result<Value, Unwind> {
        self.environment
            .get(&name.lexeme)
            .ok_or_else(|| undefined_variable(name).into())
    }

    fn call_value(&mut self, callee: Value, args: Vec<Value>, paren: &Token) -> Result<Value, Unwind> {
        match callee {
            Value::Function(function) => {
                check_arity(function.arity(), args.len(), paren)?;
                let frame = Environment::with_enclosing(function.closure.clone());
                for (param, arg) in function.declaration.params.iter().zip(args) {
                    frame.define(param.lexeme.clone(), arg);
                }
                match self.execute_block(&function.declaration.body, frame) {
                    Ok(()) => Ok(Value::Nil),
                    Err(Unwind::Return(value)) => Ok(value),
                    Err(fault) => Err(fault),
                }
            }
            Value::Native(native) => {
                check_arity(native.arity, args.len(), paren)?;
                (native.handler)(&args).map_err(|message| {
                    Unwind::Fault(RuntimeError {
                        message,
                        line: paren.line,
                    })
                })
            }
            _ => Err(RuntimeError::new(paren, "Can only call functions and classes.").into()),
        }
    }
}

impl Default for Interpreter {
    fn default() -> Self {
        Self::new()
    }
}

fn materialize(literal: &Literal) -> Value {
    match literal {
        Literal::Number(text) => Value::Number(text.parse().unwrap_or(f64::NAN)),
        Literal::String(text) => Value::String(text.clone()),
        Literal::Bool(b) => Value::Bool(*b),
        Literal::Nil => Value::Nil,
    }
}

fn binary_operation(op: &Token, left: &Value, right: &Value) -> Result<Value, Unwind> {
    match op.kind {
        TokenKind::Plus => match (left, right) {
            (Value::Number(a), Value::Number(b)) => Ok(Value::Number(a + b)),
            (Value::String(a), Value::String(b)) => Ok(Value::String(format!("{a}{b}"))),
            _ => Err(RuntimeError::new(op, "Operands must be two numbers or two strings.").into()),
        },
        TokenKind::Minus => {
            let (a, b) = check_number_operands(op, left, right)?;
            Ok(Value::Number(a - b))
        }
        TokenKind::Star => {
            let (a, b) = check_number_operands(op, left, right)?;
            Ok(Value::Number(a * b))
        }
        TokenKind::Slash => {
            // Division by zero is not special-cased; f64 semantics apply
            let (a, b) = check_number_operands(op, left, right)?;
            Ok(Value::Number(a / b))
        }
        TokenKind::Greater => {
            let (a, b) = check_number_operands(op, left, right)?;
            Ok(Value::Bool(a > b))
        }
        TokenKind::GreaterEqual => {
            let (a, b) = check_number_operands(op, left, right)?;
            Ok(Value::Bool(a >= b))
        }
        TokenKind::Less => {
            let (a, b) = check_number_operands(op, left, right)?;
            Ok(Value::Bool(a < b))
        }
        TokenKind::LessEqual => {
            let (a, b) = check_number_operands(op, left, right)?;
            Ok(Value::Bool(a <= b))
        }
        TokenKind::BangEqual => Ok(Value::Bool(!left.equals(right))),
        _ => Ok(Value::Bool(left.equals(right))),
    }
}

fn check_number_operand(op: &Token, operand: &Value) -> Result<f64, Unwind> {
    match operand {
        Value::Number(n) => Ok(*n),
        _ => Err(RuntimeError::new(op, "Operand must be a number.").into()),
    }
}

fn check_number_operands(op: &Token, left: &Value, right: &Value) -> Result<(f64, f64), Unwind> {
    match (left, right) {
        (Value::Number(a), Value::Number(b)) => Ok((*a, *b)),
        _ => Err(RuntimeError::new(op, "Operands must be numbers.").into()),
    }
}

fn check_arity(expected: usize, got: usize, paren: &Token) -> Result<(), Unwind> {
    if expected == got {
        Ok(())
    } else {
        Err(RuntimeError::new(
            paren,
            format!("Expected {expected} arguments but got {got}."),
        )
        .into())
    }
}

fn undefined_variable(name: &Token) -> RuntimeError {
    RuntimeError::new(name, format!("Undefined variable '{}'.", name.lexeme))
}
