//! Memoization of parsed formulas keyed by their text.

use std::collections::HashMap;

use crate::error::Result;
use crate::evaluator::VariableLookup;
use crate::formula::Formula;
use crate::options::EngineOptions;

/// Caches parse results, failures included, by formula text.
///
/// Edited text is a different key, so a changed formula always misses.
#[derive(Clone, Debug, Default)]
pub struct FormulaCache {
    options: EngineOptions,
    entries: HashMap<String, Result<Formula>>,
}

impl FormulaCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a cache whose parses use `options`.
    pub fn with_options(options: EngineOptions) -> Self {
        Self {
            options,
            entries: HashMap::new(),
        }
    }

    pub fn options(&self) -> &EngineOptions {
        &self.options
    }

    /// Returns the cached parse of `source`, parsing it on a miss.
    pub fn get_or_parse(&mut self, source: &str) -> &Result<Formula> {
        if !self.entries.contains_key(source) {
            log::debug!("formula cache miss for `{}`", source);
            let parsed = Formula::parse_with(source, &self.options);
            self.entries.insert(source.to_string(), parsed);
        }
        &self.entries[source]
    }

    /// Parses (or reuses) `source` and evaluates it against `bindings`.
    pub fn evaluate<L: VariableLookup + ?Sized>(
        &mut self,
        source: &str,
        bindings: &L,
    ) -> Result<f64> {
        match self.get_or_parse(source) {
            Ok(formula) => formula.evaluate(bindings),
            Err(error) => Err(error.clone()),
        }
    }

    /// Drops the entry for `source`, returning whether one existed.
    pub fn invalidate(&mut self, source: &str) -> bool {
        self.entries.remove(source).is_some()
    }

    /// Keeps only the entries whose formula text satisfies `keep`.
    pub fn retain<F>(&mut self, mut keep: F)
    where
        F: FnMut(&str) -> bool,
    {
        self.entries.retain(|source, _| keep(source));
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bindings::BindingTable;
    use crate::error::PricingError;

    #[test]
    fn reuses_parses_across_evaluations() {
        let mut cache = FormulaCache::new();
        let mut bindings = BindingTable::new();
        bindings.insert("x", 4.0).unwrap();

        assert_eq!(cache.evaluate("{x} * 2", &bindings), Ok(8.0));
        assert_eq!(cache.evaluate("{x} * 2", &BindingTable::new()), Ok(0.0));
        assert_eq!(cache.len(), 1);

        assert_eq!(cache.evaluate("{x} * 3", &bindings), Ok(12.0));
        assert_eq!(cache.len(), 2);
    }

    #[test]
    fn caches_failures_too() {
        let mut cache = FormulaCache::new();
        let empty = BindingTable::new();
        assert_eq!(cache.evaluate("5 +", &empty), Err(PricingError::UnexpectedEnd));
        assert_eq!(cache.evaluate("5 +", &empty), Err(PricingError::UnexpectedEnd));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn invalidation_and_clear() {
        let mut cache = FormulaCache::with_options(EngineOptions::default());
        assert!(cache.get_or_parse("1 + 1").is_ok());
        assert!(cache.invalidate("1 + 1"));
        assert!(!cache.invalidate("1 + 1"));
        assert!(cache.is_empty());

        assert!(cache.get_or_parse("2").is_ok());
        assert!(cache.get_or_parse("3").is_ok());
        cache.retain(|source| source == "3");
        assert_eq!(cache.len(), 1);
        assert!(cache.invalidate("3"));

        assert!(cache.get_or_parse("2").is_ok());
        cache.clear();
        assert!(cache.is_empty());
    }
}
