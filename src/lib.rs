//! Formula-driven pricing for proposal cost line items.
//!
//! A cost item's unit rate can be written as a small arithmetic formula over
//! named pricing variables, e.g. `{videos} * 5000 + {hours} * 1200`, instead
//! of a fixed number. This crate parses, validates and evaluates those
//! formulas:
//!
//! - tokenize and parse formula text into a syntax tree (`lexer`, `parser`, `ast`),
//! - evaluate the tree against variable bindings (`evaluator`, `bindings`),
//! - scan formulas for referenced keys and validate keys (`variables`), and
//! - compute item rates and costing totals that never fail outright (`costing`).
//!
//! The language is deliberately minimal: numbers, `{key}` references, the
//! four arithmetic operators, unary minus and parentheses. Undefined
//! variables evaluate to zero, dividing by zero is an error, and negative
//! formula rates are floored to zero.
//!
//! # Quick start
//!
//! ```
//! use pricing_engine::{calculate_item_rate, extract_variables, CostItem, PricingVariable};
//!
//! let variables = vec![
//!     PricingVariable::new("1", "Videos", "videos", 2.0),
//!     PricingVariable::new("2", "Hours", "hours", 10.0),
//! ];
//! let formula = "{videos} * 5000 + {hours} * 1200";
//! let item = CostItem::with_formula("line-1", "Production", 1.0, formula);
//!
//! let result = calculate_item_rate(&item, &variables);
//! assert_eq!(result.rate, 22_000.0);
//! assert!(result.error.is_none());
//!
//! assert_eq!(extract_variables("{hours} * {rate} + {hours}"), vec!["hours", "rate"]);
//!
//! let broken = CostItem::with_formula("line-2", "Broken", 1.0, "(5 + 3");
//! let result = calculate_item_rate(&broken, &variables);
//! assert_eq!(result.rate, 0.0);
//! assert_eq!(result.error.as_deref(), Some("Mismatched parentheses"));
//! ```

pub mod ast;
pub mod bindings;
pub mod cache;
pub mod costing;
pub mod error;
pub mod evaluator;
pub mod formula;
pub mod lexer;
pub mod options;
pub mod parser;
pub mod variables;

pub use bindings::BindingTable;
pub use cache::FormulaCache;
pub use costing::{
    calculate_item_rate, calculate_item_rate_with, effective_rate, line_total, CostItem,
    CostingSheet, CostingSummary, EvaluationResult, ItemError,
};
pub use error::{ErrorKind, PricingError, Result};
pub use evaluator::{evaluate, VariableLookup};
pub use formula::Formula;
pub use options::EngineOptions;
pub use parser::{
    parse, parse_with, validate_formula_syntax, validate_formula_syntax_with, SyntaxReport,
};
pub use variables::{
    extract_variables, generate_key_from_name, is_valid_identifier, referenced_variables,
    undefined_variables, validate_key, PricingVariable, VariableReference,
};
