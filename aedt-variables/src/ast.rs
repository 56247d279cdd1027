//! Abstract Syntax Tree

use std::fmt;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Expr {
    /// Number with an optional unit suffix: `2`, `3.5mm`, `1e-3GHz`
    Literal { value: f64, units: String },
    Variable(String),
    BinaryOp(Box<Expr>, BinOp, Box<Expr>),
    UnaryOp(UnaryOp, Box<Expr>),
    FunctionCall(String, Vec<Expr>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BinOp { Add, Sub, Mul, Div, Pow }

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum UnaryOp { Neg }

impl Expr {
    /// Variable names referenced by the expression, in order of first use
    pub fn variables(&self) -> Vec<String> {
        let mut names = Vec::new();
        self.collect_variables(&mut names);
        names
    }

    fn collect_variables(&self, names: &mut Vec<String>) {
        match self {
            Expr::Literal { .. } => {}
            Expr::Variable(name) => {
                if !names.contains(name) {
                    names.push(name.clone());
                }
            }
            Expr::BinaryOp(left, _, right) => {
                left.collect_variables(names);
                right.collect_variables(names);
            }
            Expr::UnaryOp(_, inner) => inner.collect_variables(names),
            Expr::FunctionCall(_, args) => {
                for arg in args {
                    arg.collect_variables(names);
                }
            }
        }
    }
}

impl fmt::Display for BinOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let symbol = match self {
            BinOp::Add => "+",
            BinOp::Sub => "-",
            BinOp::Mul => "*",
            BinOp::Div => "/",
            BinOp::Pow => "^",
        };
        write!(f, "{}", symbol)
    }
}

/// Fully parenthesized form, mainly for diagnostics
impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expr::Literal { value, units } => write!(f, "{}{}", value, units),
            Expr::Variable(name) => write!(f, "{}", name),
            Expr::BinaryOp(left, op, right) => write!(f, "({} {} {})", left, op, right),
            Expr::UnaryOp(UnaryOp::Neg, inner) => write!(f, "-{}", inner),
            Expr::FunctionCall(name, args) => {
                write!(f, "{}(", name)?;
                for (i, arg) in args.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", arg)?;
                }
                write!(f, ")")
            }
        }
    }
}
