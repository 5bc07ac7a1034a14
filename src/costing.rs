//! Cost line items and the rate calculations the costing form performs.
//!
//! Everything here is safe to call on every render: failures come back as
//! data next to a numeric fallback, so totals stay computable while the user
//! is still typing a formula.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::bindings::BindingTable;
use crate::cache::FormulaCache;
use crate::error::{ErrorKind, PricingError, Result};
use crate::evaluator::VariableLookup;
use crate::formula::Formula;
use crate::options::EngineOptions;
use crate::variables::{extract_variables, PricingVariable};

fn default_quantity() -> f64 {
    1.0
}

/// A line of the costing table.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CostItem {
    pub id: String,
    #[serde(default)]
    pub description: String,
    #[serde(default = "default_quantity")]
    pub quantity: f64,
    /// Manually entered unit rate; the fallback while formula mode is on.
    pub rate: f64,
    #[serde(default)]
    pub use_formula: bool,
    /// Kept while formula mode is off so it survives a re-toggle.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub formula: Option<String>,
    /// Last formula-derived rate written by [`CostingSheet::recompute`].
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub calculated_rate: Option<f64>,
}

impl CostItem {
    /// A line priced at a fixed unit rate.
    pub fn fixed(
        id: impl Into<String>,
        description: impl Into<String>,
        quantity: f64,
        rate: f64,
    ) -> Self {
        Self {
            id: id.into(),
            description: description.into(),
            quantity,
            rate,
            use_formula: false,
            formula: None,
            calculated_rate: None,
        }
    }

    /// A line whose unit rate comes from `formula`.
    pub fn with_formula(
        id: impl Into<String>,
        description: impl Into<String>,
        quantity: f64,
        formula: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            description: description.into(),
            quantity,
            rate: 0.0,
            use_formula: true,
            formula: Some(formula.into()),
            calculated_rate: None,
        }
    }
}

/// Rate computed for a formula item, with the message to show when it failed.
///
/// `rate` is `0` whenever `error` is set.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct EvaluationResult {
    pub rate: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl EvaluationResult {
    pub fn success(rate: f64) -> Self {
        Self { rate, error: None }
    }

    pub fn failure(error: &PricingError) -> Self {
        Self {
            rate: 0.0,
            error: Some(error.to_string()),
        }
    }

    /// Applies the rate policy to an evaluation outcome.
    pub fn from_outcome(outcome: Result<f64>, options: &EngineOptions) -> Self {
        match outcome {
            Ok(value) => Self::success(options.apply_rate_policy(value)),
            Err(error) => Self::failure(&error),
        }
    }

    pub fn is_ok(&self) -> bool {
        self.error.is_none()
    }
}

/// Computes the formula-derived rate of `item` from the variable list.
///
/// Only meaningful while `item.use_formula` is set; callers branch on that
/// first. A blank formula reports "Formula cannot be empty". Negative results
/// floor to zero and failures yield a zero rate with the error message.
pub fn calculate_item_rate(item: &CostItem, variables: &[PricingVariable]) -> EvaluationResult {
    let bindings = BindingTable::from_variables(variables);
    calculate_item_rate_with(item, &bindings, &EngineOptions::default())
}

/// [`calculate_item_rate`] against a prepared binding lookup and explicit options.
pub fn calculate_item_rate_with<L: VariableLookup + ?Sized>(
    item: &CostItem,
    bindings: &L,
    options: &EngineOptions,
) -> EvaluationResult {
    let outcome = match item.formula.as_deref() {
        Some(source) => {
            Formula::parse_with(source, options).and_then(|formula| formula.evaluate(bindings))
        }
        None => Err(PricingError::EmptyFormula),
    };
    if let Err(error) = &outcome {
        log::debug!("rate formula for item `{}` failed: {}", item.id, error);
    }
    EvaluationResult::from_outcome(outcome, options)
}

/// The unit rate used in totals.
///
/// Formula items use the clamped formula rate (zero when it fails); other
/// items use their manual rate as entered, negative values included.
pub fn effective_rate<L: VariableLookup + ?Sized>(
    item: &CostItem,
    bindings: &L,
    options: &EngineOptions,
) -> f64 {
    if item.use_formula {
        calculate_item_rate_with(item, bindings, options).rate
    } else {
        item.rate
    }
}

/// `quantity * effective_rate`.
pub fn line_total<L: VariableLookup + ?Sized>(
    item: &CostItem,
    bindings: &L,
    options: &EngineOptions,
) -> f64 {
    item.quantity * effective_rate(item, bindings, options)
}

/// An item whose rate or line total failed during [`CostingSheet::recompute`].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemError {
    pub index: usize,
    pub item_id: String,
    pub kind: ErrorKind,
    pub message: String,
}

/// Totals and per-item failures from a recompute pass.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CostingSummary {
    pub subtotal: f64,
    pub item_errors: Vec<ItemError>,
}

impl CostingSummary {
    pub fn has_errors(&self) -> bool {
        !self.item_errors.is_empty()
    }

    fn push_error(&mut self, index: usize, item: &CostItem, error: &PricingError) {
        self.item_errors.push(ItemError {
            index,
            item_id: item.id.clone(),
            kind: error.kind(),
            message: error.to_string(),
        });
    }
}

/// The variables and line items of one proposal's costing section.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CostingSheet {
    #[serde(default)]
    pub variables: Vec<PricingVariable>,
    #[serde(default)]
    pub items: Vec<CostItem>,
    #[serde(skip)]
    cache: FormulaCache,
}

impl CostingSheet {
    pub fn new(variables: Vec<PricingVariable>, items: Vec<CostItem>) -> Self {
        Self {
            variables,
            items,
            cache: FormulaCache::new(),
        }
    }

    /// Replaces the engine options; cached parses are discarded.
    pub fn with_options(mut self, options: EngineOptions) -> Self {
        self.cache = FormulaCache::with_options(options);
        self
    }

    pub fn options(&self) -> &EngineOptions {
        self.cache.options()
    }

    /// Recomputes every formula item against the current variables.
    ///
    /// Writes `calculated_rate` on formula items (clearing it elsewhere) and
    /// returns the subtotal with one [`ItemError`] per failing item. A line
    /// whose total overflows is reported and left out of the subtotal. Cached
    /// parses of formula text no longer on the sheet are dropped.
    pub fn recompute(&mut self) -> CostingSummary {
        let bindings = BindingTable::from_variables(&self.variables);
        let mut summary = CostingSummary::default();

        for (index, item) in self.items.iter_mut().enumerate() {
            let rate = if item.use_formula {
                let outcome = match item.formula.as_deref() {
                    Some(source) => self.cache.evaluate(source, &bindings),
                    None => Err(PricingError::EmptyFormula),
                };
                if let Err(error) = &outcome {
                    log::debug!("rate formula for item `{}` failed: {}", item.id, error);
                    summary.push_error(index, item, error);
                }
                let result = EvaluationResult::from_outcome(outcome, self.cache.options());
                item.calculated_rate = Some(result.rate);
                result.rate
            } else {
                item.calculated_rate = None;
                item.rate
            };

            let line = item.quantity * rate;
            let subtotal = summary.subtotal + line;
            if subtotal.is_finite() {
                summary.subtotal = subtotal;
            } else {
                log::debug!("line total for item `{}` is not finite", item.id);
                summary.push_error(index, item, &PricingError::NonFiniteTotal);
            }
        }

        let live: HashSet<&str> = self
            .items
            .iter()
            .filter(|item| item.use_formula)
            .filter_map(|item| item.formula.as_deref())
            .collect();
        self.cache.retain(|source| live.contains(source));

        summary
    }

    /// Indices of formula items whose formula references `key`.
    pub fn items_using_variable(&self, key: &str) -> Vec<usize> {
        self.items
            .iter()
            .enumerate()
            .filter(|(_, item)| item.use_formula)
            .filter(|(_, item)| {
                item.formula
                    .as_deref()
                    .is_some_and(|source| extract_variables(source).iter().any(|k| k == key))
            })
            .map(|(index, _)| index)
            .collect()
    }
}
