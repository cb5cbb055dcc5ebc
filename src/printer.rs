// ABOUTME: Parenthesized s-expression rendering of the syntax tree

use crate::ast::{Expr, Literal};

/// Renders an expression in the parenthesized form used by `parse` mode.
pub fn print(expr: &Expr) -> String {
    match expr {
        Expr::Literal(literal) => match literal {
            Literal::Number(text) => text.clone(),
            Literal::String(text) => text.clone(),
            Literal::Bool(true) => "true".to_string(),
            Literal::Bool(false) => "false".to_string(),
            Literal::Nil => "nil".to_string(),
        },
        Expr::Grouping(inner) => format!("(group {})", print(inner)),
        Expr::Unary { op, right } => format!("({} {})", op.lexeme, print(right)),
        Expr::Binary { left, op, right } => {
            format!("({} {} {})", op.lexeme, print(left), print(right))
        }
        Expr::Logical { left, op, right } => {
            format!("({} {} {})", op.lexeme, print(left), print(right))
        }
        Expr::Variable { name } => name.lexeme.clone(),
        Expr::Assign { name, value } => format!("(= {} {})", name.lexeme, print(value)),
        Expr::Call {
            callee, arguments, ..
        } => {
            let mut out = format!("(call {}", print(callee));
            for argument in arguments {
                out.push(' ');
                out.push_str(&print(argument));
            }
            out.push(')');
            out
        }
    }
}
