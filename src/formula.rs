//! Parsed formulas.
//!
//! A [`Formula`] keeps the text the user typed next to its syntax tree, so a
//! host can parse once and evaluate against many variable sets. The text is
//! what gets persisted; the tree is always rebuilt from it.

use std::str::FromStr;

use indexmap::IndexSet;

use crate::ast::Expr;
use crate::error::{PricingError, Result};
use crate::evaluator::{evaluate, VariableLookup};
use crate::options::EngineOptions;
use crate::parser::parse_with;

/// A syntactically valid formula.
#[derive(Clone, Debug, PartialEq)]
pub struct Formula {
    source: String,
    expr: Expr,
    variables: Vec<String>,
}

impl Formula {
    /// Parses `source` with the default options.
    pub fn parse(source: impl Into<String>) -> Result<Self> {
        Self::parse_with(source, &EngineOptions::default())
    }

    /// Parses `source` using the limits from `options`.
    pub fn parse_with(source: impl Into<String>, options: &EngineOptions) -> Result<Self> {
        let source = source.into();
        let expr = parse_with(&source, options)?;

        let variables = expr
            .variable_keys()
            .into_iter()
            .collect::<IndexSet<_>>()
            .into_iter()
            .map(str::to_string)
            .collect();

        Ok(Self {
            source,
            expr,
            variables,
        })
    }

    /// Returns the original formula text.
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Returns the syntax tree.
    pub fn expr(&self) -> &Expr {
        &self.expr
    }

    /// Referenced keys, first occurrence first.
    pub fn variables(&self) -> &[String] {
        &self.variables
    }

    /// Evaluates the formula; unbound variables count as zero.
    pub fn evaluate<L: VariableLookup + ?Sized>(&self, bindings: &L) -> Result<f64> {
        evaluate(&self.expr, bindings)
    }
}

impl FromStr for Formula {
    type Err = PricingError;

    fn from_str(source: &str) -> Result<Self> {
        Self::parse(source)
    }
}

impl TryFrom<&str> for Formula {
    type Error = PricingError;

    fn try_from(value: &str) -> Result<Self> {
        Self::parse(value)
    }
}

impl TryFrom<String> for Formula {
    type Error = PricingError;

    fn try_from(value: String) -> Result<Self> {
        Self::parse(value)
    }
}
