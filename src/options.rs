//! Configuration for parsing limits and the rate policy applied to formula results.

/// Engine-wide configuration shared by the parser, the evaluator and the costing helpers.
#[derive(Clone, Debug, PartialEq)]
pub struct EngineOptions {
    /// Maximum number of characters accepted in a single formula.
    pub max_formula_length: usize,
    /// Maximum nesting of parentheses and unary minus.
    pub max_nesting_depth: usize,
    /// Whether negative formula-derived rates are floored to zero.
    ///
    /// Manually entered rates are never clamped, whatever this flag says.
    pub clamp_negative_rates: bool,
}

impl Default for EngineOptions {
    fn default() -> Self {
        Self {
            max_formula_length: 4_096,
            max_nesting_depth: 64,
            clamp_negative_rates: true,
        }
    }
}

impl EngineOptions {
    /// Override the maximum formula length while preserving other defaults.
    pub fn with_max_formula_length(mut self, max_formula_length: usize) -> Self {
        self.max_formula_length = max_formula_length.max(1);
        self
    }

    /// Override the maximum nesting depth while preserving other defaults.
    pub fn with_max_nesting_depth(mut self, max_nesting_depth: usize) -> Self {
        self.max_nesting_depth = max_nesting_depth.max(1);
        self
    }

    /// Enable or disable flooring negative formula results to zero.
    pub fn with_negative_clamping(mut self, clamp: bool) -> Self {
        self.clamp_negative_rates = clamp;
        self
    }

    /// Applies the rate policy to a successfully evaluated formula value.
    pub fn apply_rate_policy(&self, value: f64) -> f64 {
        if self.clamp_negative_rates {
            value.max(0.0)
        } else {
            value
        }
    }
}
