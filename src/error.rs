use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Unified error type for `pricing_engine` operations.
///
/// The `Display` output of each variant is the message shown inline next to a
/// formula input, so it is kept short and free of internal detail.
#[derive(Clone, Debug, Error, PartialEq)]
pub enum PricingError {
    /// Raised when formula mode is active but no formula text was entered.
    #[error("Formula cannot be empty")]
    EmptyFormula,

    /// Raised for an extra `)` or an unclosed `(`.
    #[error("Mismatched parentheses")]
    MismatchedParentheses,

    /// Raised for an unclosed `{`, an empty `{}` or braces around a non-identifier.
    #[error("Invalid variable reference: {fragment}")]
    InvalidVariableReference {
        /// The offending slice of the formula, braces included.
        fragment: String,
    },

    /// Raised when an operator or `)` appears where an operand is required.
    #[error("Invalid syntax: unexpected '{token}'")]
    InvalidSyntax {
        /// Source text of the misplaced token.
        token: String,
    },

    /// Raised when the formula ends where an operand is required.
    #[error("Unexpected end of formula")]
    UnexpectedEnd,

    /// Raised when input remains after a complete expression.
    #[error("Unexpected token '{token}'")]
    UnexpectedToken {
        /// Source text of the first leftover token.
        token: String,
    },

    /// Raised by the lexer for characters outside the formula alphabet.
    #[error("Invalid character '{character}' at position {position}")]
    InvalidCharacter {
        /// The rejected character.
        character: char,
        /// Zero-based character offset into the formula.
        position: usize,
    },

    /// Raised for numeric literals such as `1.2.3` or a lone `.`.
    #[error("Invalid number '{literal}'")]
    InvalidNumber {
        /// The malformed literal as written.
        literal: String,
    },

    /// Raised when the formula is longer than the configured limit.
    #[error("Formula exceeds the maximum length of {limit} characters")]
    FormulaTooLong {
        /// Configured `max_formula_length`.
        limit: usize,
    },

    /// Raised when parentheses or unary minus nest beyond the configured limit.
    #[error("Formula is nested too deeply (limit {limit})")]
    NestingTooDeep {
        /// Configured `max_nesting_depth`.
        limit: usize,
    },

    /// Raised when a `/` divisor evaluates to exactly zero.
    #[error("Division by zero")]
    DivisionByZero,

    /// Raised when evaluation overflows to infinity or NaN.
    #[error("Formula result is not a finite number")]
    NonFiniteResult,

    /// Raised when a line total, or the running subtotal, overflows.
    #[error("Line total is not a finite number")]
    NonFiniteTotal,

    /// Raised when a variable key is blank.
    #[error("Key cannot be empty")]
    EmptyKey,

    /// Raised when a variable key does not match `[A-Za-z_][A-Za-z0-9_]*`.
    #[error(
        "Key `{key}` must start with a letter or underscore and contain only letters, numbers, and underscores"
    )]
    InvalidKey {
        /// The rejected key.
        key: String,
    },

    /// Raised when a variable key is already used in the variable set.
    #[error("Key `{key}` is already in use")]
    DuplicateKey {
        /// The key already present in the variable set.
        key: String,
    },
}

/// Coarse classification of a [`PricingError`], for hosts that branch on the
/// failure class rather than on message text.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ErrorKind {
    Empty,
    Syntax,
    DivisionByZero,
    Numeric,
    Key,
}

impl PricingError {
    /// Helper for [`InvalidVariableReference`](PricingError::InvalidVariableReference).
    pub fn invalid_reference(fragment: impl Into<String>) -> Self {
        Self::InvalidVariableReference {
            fragment: fragment.into(),
        }
    }

    /// Helper for [`InvalidSyntax`](PricingError::InvalidSyntax).
    pub fn invalid_syntax(token: impl Into<String>) -> Self {
        Self::InvalidSyntax {
            token: token.into(),
        }
    }

    /// Helper for [`UnexpectedToken`](PricingError::UnexpectedToken).
    pub fn unexpected_token(token: impl Into<String>) -> Self {
        Self::UnexpectedToken {
            token: token.into(),
        }
    }

    /// Helper for [`InvalidKey`](PricingError::InvalidKey).
    pub fn invalid_key(key: impl Into<String>) -> Self {
        Self::InvalidKey { key: key.into() }
    }

    /// Helper for [`DuplicateKey`](PricingError::DuplicateKey).
    pub fn duplicate_key(key: impl Into<String>) -> Self {
        Self::DuplicateKey { key: key.into() }
    }

    /// Classifies the error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::EmptyFormula => ErrorKind::Empty,
            Self::MismatchedParentheses
            | Self::InvalidVariableReference { .. }
            | Self::InvalidSyntax { .. }
            | Self::UnexpectedEnd
            | Self::UnexpectedToken { .. }
            | Self::InvalidCharacter { .. }
            | Self::InvalidNumber { .. }
            | Self::FormulaTooLong { .. }
            | Self::NestingTooDeep { .. } => ErrorKind::Syntax,
            Self::DivisionByZero => ErrorKind::DivisionByZero,
            Self::NonFiniteResult | Self::NonFiniteTotal => ErrorKind::Numeric,
            Self::EmptyKey | Self::InvalidKey { .. } | Self::DuplicateKey { .. } => ErrorKind::Key,
        }
    }

    /// Returns `true` for errors raised before evaluation starts.
    pub fn is_syntax(&self) -> bool {
        matches!(self.kind(), ErrorKind::Empty | ErrorKind::Syntax)
    }
}

/// Type alias for results returned by this crate.
pub type Result<T> = std::result::Result<T, PricingError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_match_inline_feedback() {
        assert_eq!(
            PricingError::EmptyFormula.to_string(),
            "Formula cannot be empty"
        );
        assert_eq!(PricingError::DivisionByZero.to_string(), "Division by zero");
        assert_eq!(
            PricingError::invalid_reference("{abc").to_string(),
            "Invalid variable reference: {abc"
        );
        assert_eq!(
            PricingError::unexpected_token("x").to_string(),
            "Unexpected token 'x'"
        );
    }

    #[test]
    fn kinds_group_syntax_failures() {
        assert_eq!(PricingError::UnexpectedEnd.kind(), ErrorKind::Syntax);
        assert_eq!(PricingError::duplicate_key("a").kind(), ErrorKind::Key);
        assert!(PricingError::EmptyFormula.is_syntax());
        assert!(!PricingError::DivisionByZero.is_syntax());
    }

    #[test]
    fn overflow_errors_are_numeric() {
        assert_eq!(PricingError::NonFiniteResult.kind(), ErrorKind::Numeric);
        assert_eq!(PricingError::NonFiniteTotal.kind(), ErrorKind::Numeric);
        assert_eq!(
            PricingError::NonFiniteTotal.to_string(),
            "Line total is not a finite number"
        );
    }
}
