//! Walks a parsed formula against a set of variable bindings.

use std::collections::{BTreeMap, HashMap};

use crate::ast::{BinaryOp, Expr};
use crate::error::{PricingError, Result};

/// Read access to variable values by key.
///
/// Implemented for [`BindingTable`](crate::bindings::BindingTable) and the
/// standard map types so callers can evaluate against whatever they hold.
pub trait VariableLookup {
    fn lookup(&self, key: &str) -> Option<f64>;
}

impl VariableLookup for HashMap<String, f64> {
    fn lookup(&self, key: &str) -> Option<f64> {
        self.get(key).copied()
    }
}

impl VariableLookup for BTreeMap<String, f64> {
    fn lookup(&self, key: &str) -> Option<f64> {
        self.get(key).copied()
    }
}

impl<T: VariableLookup + ?Sized> VariableLookup for &T {
    fn lookup(&self, key: &str) -> Option<f64> {
        (**self).lookup(key)
    }
}

/// Evaluates `expr`, substituting bound values for variable references.
///
/// Unbound variables evaluate to `0` so that formulas can be written before
/// every variable exists. A divisor of exactly zero and a non-finite result
/// are errors.
pub fn evaluate<L: VariableLookup + ?Sized>(expr: &Expr, bindings: &L) -> Result<f64> {
    let value = eval_node(expr, bindings)?;
    if value.is_finite() {
        Ok(value)
    } else {
        Err(PricingError::NonFiniteResult)
    }
}

fn eval_node<L: VariableLookup + ?Sized>(expr: &Expr, bindings: &L) -> Result<f64> {
    match expr {
        Expr::Number(value) => Ok(*value),
        Expr::Variable(key) => Ok(bindings.lookup(key).unwrap_or(0.0)),
        Expr::Negate(operand) => Ok(-eval_node(operand, bindings)?),
        Expr::Binary { op, left, right } => {
            let lhs = eval_node(left, bindings)?;
            let rhs = eval_node(right, bindings)?;
            match op {
                BinaryOp::Add => Ok(lhs + rhs),
                BinaryOp::Subtract => Ok(lhs - rhs),
                BinaryOp::Multiply => Ok(lhs * rhs),
                BinaryOp::Divide if rhs == 0.0 => Err(PricingError::DivisionByZero),
                BinaryOp::Divide => Ok(lhs / rhs),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;

    use super::*;
    use crate::parser::parse;

    fn eval_str(formula: &str, bindings: &HashMap<String, f64>) -> Result<f64> {
        evaluate(&parse(formula)?, bindings)
    }

    fn bindings(pairs: &[(&str, f64)]) -> HashMap<String, f64> {
        pairs.iter().map(|(k, v)| (k.to_string(), *v)).collect()
    }

    #[test]
    fn literal_arithmetic_follows_precedence() {
        let empty = HashMap::new();
        assert_eq!(eval_str("2 + 3 * 4", &empty), Ok(14.0));
        assert_eq!(eval_str("(2 + 3) * 4", &empty), Ok(20.0));
        assert_eq!(eval_str("-5 + 2", &empty), Ok(-3.0));
        assert_eq!(eval_str("10 - 4 - 3", &empty), Ok(3.0));
        assert_relative_eq!(eval_str("1 / 3 * 3", &empty).unwrap(), 1.0);
    }

    #[test]
    fn substitutes_variables() {
        let vars = bindings(&[("a", 3.0), ("b", 4.0)]);
        assert_eq!(eval_str("{a} * {b}", &vars), Ok(12.0));

        let vars = bindings(&[("videos", 2.0), ("hours", 10.0)]);
        assert_eq!(
            eval_str("{videos} * 5000 + {hours} * 1200", &vars),
            Ok(22_000.0)
        );
    }

    #[test]
    fn missing_variables_are_zero() {
        assert_eq!(eval_str("{undefined_var} + 5", &HashMap::new()), Ok(5.0));
    }

    #[test]
    fn lookup_is_case_sensitive() {
        let vars = bindings(&[("Rate", 10.0)]);
        assert_eq!(eval_str("{rate} + 1", &vars), Ok(1.0));
    }

    #[test]
    fn division_by_zero_is_an_error() {
        let vars = bindings(&[("x", 10.0), ("y", 0.0)]);
        assert_eq!(eval_str("{x} / {y}", &vars), Err(PricingError::DivisionByZero));
        assert_eq!(
            eval_str("1 / -0", &HashMap::new()),
            Err(PricingError::DivisionByZero)
        );
        assert_eq!(
            eval_str("1 / {missing}", &HashMap::new()),
            Err(PricingError::DivisionByZero)
        );
    }

    #[test]
    fn overflow_is_not_finite() {
        let huge = format!("1{} * 1{}", "0".repeat(200), "0".repeat(200));
        assert_eq!(
            eval_str(&huge, &HashMap::new()),
            Err(PricingError::NonFiniteResult)
        );
    }

    #[test]
    fn works_with_btree_maps() {
        let mut vars = BTreeMap::new();
        vars.insert("a".to_string(), 1.5);
        let expr = parse("{a} * 2").unwrap();
        assert_eq!(evaluate(&expr, &vars), Ok(3.0));
    }
}
