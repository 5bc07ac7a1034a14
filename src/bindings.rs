//! Binding table assembled from the active pricing-variable set.

use indexmap::IndexMap;

use crate::error::{PricingError, Result};
use crate::evaluator::VariableLookup;
use crate::variables::{is_valid_identifier, PricingVariable};

/// Insertion-ordered map from variable key to value.
///
/// Keys are validated identifiers and appear at most once; this replaces
/// scanning the variable list by key on every lookup.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct BindingTable {
    values: IndexMap<String, f64>,
}

impl BindingTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a table from the host's variable list, keeping the first
    /// definition of each key. Later duplicates and invalid keys are skipped
    /// with a warning so evaluation can still proceed.
    pub fn from_variables(variables: &[PricingVariable]) -> Self {
        let mut table = Self::new();
        for variable in variables {
            if let Err(error) = table.insert(&variable.key, variable.value) {
                log::warn!("ignoring pricing variable `{}`: {}", variable.id, error);
            }
        }
        table
    }

    /// Builds a table from the host's variable list, failing on the first
    /// invalid or duplicate key.
    pub fn try_from_variables(variables: &[PricingVariable]) -> Result<Self> {
        let mut table = Self::new();
        for variable in variables {
            table.insert(&variable.key, variable.value)?;
        }
        Ok(table)
    }

    /// Adds a binding. The key must be a valid identifier not already bound.
    pub fn insert(&mut self, key: &str, value: f64) -> Result<()> {
        if key.is_empty() {
            return Err(PricingError::EmptyKey);
        }
        if !is_valid_identifier(key) {
            return Err(PricingError::invalid_key(key));
        }
        if self.values.contains_key(key) {
            return Err(PricingError::duplicate_key(key));
        }
        self.values.insert(key.to_string(), value);
        Ok(())
    }

    pub fn get(&self, key: &str) -> Option<f64> {
        self.values.get(key).copied()
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Keys in insertion order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.values.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.values.iter().map(|(key, value)| (key.as_str(), *value))
    }
}

impl VariableLookup for BindingTable {
    fn lookup(&self, key: &str) -> Option<f64> {
        self.get(key)
    }
}

impl From<&[PricingVariable]> for BindingTable {
    fn from(variables: &[PricingVariable]) -> Self {
        Self::from_variables(variables)
    }
}
