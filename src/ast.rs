//! Syntax tree produced by the parser and walked by the evaluator.

use std::fmt;

/// A parsed formula expression.
#[derive(Clone, Debug, PartialEq)]
pub enum Expr {
    /// A numeric literal such as `5000` or `0.25`.
    Number(f64),
    /// A `{key}` reference to a pricing variable, stored without braces.
    Variable(String),
    /// Unary negation: `-operand`.
    Negate(Box<Expr>),
    /// A binary arithmetic operation.
    Binary {
        op: BinaryOp,
        left: Box<Expr>,
        right: Box<Expr>,
    },
}

/// The four arithmetic operators of the formula language.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum BinaryOp {
    Add,
    Subtract,
    Multiply,
    Divide,
}

impl BinaryOp {
    pub fn symbol(self) -> char {
        match self {
            BinaryOp::Add => '+',
            BinaryOp::Subtract => '-',
            BinaryOp::Multiply => '*',
            BinaryOp::Divide => '/',
        }
    }
}

impl Expr {
    pub fn binary(op: BinaryOp, left: Expr, right: Expr) -> Self {
        Expr::Binary {
            op,
            left: Box::new(left),
            right: Box::new(right),
        }
    }

    pub fn negate(operand: Expr) -> Self {
        Expr::Negate(Box::new(operand))
    }

    /// Collects variable keys in left-to-right order, duplicates included.
    pub fn variable_keys(&self) -> Vec<&str> {
        let mut keys = Vec::new();
        self.collect_keys(&mut keys);
        keys
    }

    fn collect_keys<'a>(&'a self, keys: &mut Vec<&'a str>) {
        match self {
            Expr::Number(_) => {}
            Expr::Variable(key) => keys.push(key),
            Expr::Negate(operand) => operand.collect_keys(keys),
            Expr::Binary { left, right, .. } => {
                left.collect_keys(keys);
                right.collect_keys(keys);
            }
        }
    }
}

/// Renders the expression fully parenthesized, e.g. `(2 + (3 * {a}))`.
impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expr::Number(n) => write!(f, "{}", n),
            Expr::Variable(key) => write!(f, "{{{}}}", key),
            Expr::Negate(operand) => write!(f, "-{}", operand),
            Expr::Binary { op, left, right } => {
                write!(f, "({} {} {})", left, op.symbol(), right)
            }
        }
    }
}
