//! Pricing variables and the lexical helpers built around their keys.

use std::sync::OnceLock;

use indexmap::IndexSet;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::{PricingError, Result};
use crate::evaluator::VariableLookup;

/// A named, reusable numeric value referenced from formulas as `{key}`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PricingVariable {
    /// Opaque identifier assigned by the host.
    pub id: String,
    /// Display name shown in the variable editor.
    pub name: String,
    /// Identifier used inside formula braces.
    pub key: String,
    pub value: f64,
}

impl PricingVariable {
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        key: impl Into<String>,
        value: f64,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            key: key.into(),
            value,
        }
    }
}

/// A variable referenced by a formula, and whether the current set defines it.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct VariableReference {
    pub key: String,
    pub defined: bool,
}

/// Returns `true` if `key` matches `[A-Za-z_][A-Za-z0-9_]*`.
pub fn is_valid_identifier(key: &str) -> bool {
    let mut chars = key.chars();
    match chars.next() {
        Some(first) if first.is_ascii_alphabetic() || first == '_' => {
            chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
        }
        _ => false,
    }
}

fn reference_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"\{([A-Za-z_][A-Za-z0-9_]*)\}").expect("reference pattern is valid")
    })
}

/// Lists the `{key}` references in a formula, first occurrence first, without
/// duplicates. Keys are case-sensitive.
///
/// This is a lexical scan: it still finds well-formed references when the rest
/// of the formula does not parse, which lets badges follow the user's typing.
pub fn extract_variables(formula: &str) -> Vec<String> {
    reference_pattern()
        .captures_iter(formula)
        .map(|captures| captures[1].to_string())
        .collect::<IndexSet<_>>()
        .into_iter()
        .collect()
}

/// Pairs every extracted reference with whether `lookup` defines it.
pub fn referenced_variables<L: VariableLookup + ?Sized>(
    formula: &str,
    lookup: &L,
) -> Vec<VariableReference> {
    extract_variables(formula)
        .into_iter()
        .map(|key| {
            let defined = lookup.lookup(&key).is_some();
            VariableReference { key, defined }
        })
        .collect()
}

/// Extracted references that `lookup` does not define. These evaluate as `0`.
pub fn undefined_variables<L: VariableLookup + ?Sized>(formula: &str, lookup: &L) -> Vec<String> {
    extract_variables(formula)
        .into_iter()
        .filter(|key| lookup.lookup(key).is_none())
        .collect()
}

/// Suggests a variable key from its display name.
///
/// Lowercases, drops everything outside `[a-z0-9_]` and whitespace, turns
/// whitespace runs into single underscores and prefixes `_` when the result
/// would start with a digit. The output is either empty or a valid key.
pub fn generate_key_from_name(display_name: &str) -> String {
    let lowered = display_name.to_lowercase();

    let mut key = String::with_capacity(lowered.len());
    let mut in_whitespace = false;
    for ch in lowered.chars() {
        if ch.is_whitespace() {
            in_whitespace = true;
            continue;
        }
        // Stripped characters vanish before runs are collapsed, so they do
        // not split a whitespace run.
        if !(ch.is_ascii_lowercase() || ch.is_ascii_digit() || ch == '_') {
            continue;
        }
        if in_whitespace {
            key.push('_');
        }
        in_whitespace = false;
        key.push(ch);
    }
    if in_whitespace {
        key.push('_');
    }

    if key.starts_with(|c: char| c.is_ascii_digit()) {
        key.insert(0, '_');
    }
    key
}

/// Checks a candidate key against the identifier rules and the keys already
/// in use. The error describes the first rule that failed.
pub fn validate_key<I, S>(key: &str, existing_keys: I) -> Result<()>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    if key.trim().is_empty() {
        return Err(PricingError::EmptyKey);
    }
    if !is_valid_identifier(key) {
        return Err(PricingError::invalid_key(key));
    }
    if existing_keys.into_iter().any(|existing| existing.as_ref() == key) {
        return Err(PricingError::duplicate_key(key));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    #[test]
    fn extraction_preserves_order_and_deduplicates() {
        assert_eq!(extract_variables("{b} * {a} + {b}"), vec!["b", "a"]);
        assert_eq!(extract_variables("{A} + {a}"), vec!["A", "a"]);
        assert!(extract_variables("5 * 3").is_empty());
    }

    #[test]
    fn extraction_tolerates_broken_formulas() {
        assert_eq!(extract_variables("{hours} * (  {rate"), vec!["hours"]);
        assert_eq!(extract_variables("{} + {1x} + {ok_2} +"), vec!["ok_2"]);
    }

    #[test]
    fn undefined_references_are_reported() {
        let mut defined = HashMap::new();
        defined.insert("hours".to_string(), 12.0);

        assert_eq!(
            undefined_variables("{hours} * {rate} + {fee}", &defined),
            vec!["rate", "fee"]
        );
        assert_eq!(
            referenced_variables("{rate} * {hours}", &defined),
            vec![
                VariableReference {
                    key: "rate".into(),
                    defined: false
                },
                VariableReference {
                    key: "hours".into(),
                    defined: true
                },
            ]
        );
    }

    #[test]
    fn key_generation_slugifies_names() {
        assert_eq!(generate_key_from_name("Number of Videos"), "number_of_videos");
        assert_eq!(generate_key_from_name("Hourly   Rate"), "hourly_rate");
        assert_eq!(generate_key_from_name("3D Renders"), "_3d_renders");
        assert_eq!(generate_key_from_name("already_snake"), "already_snake");
        assert_eq!(generate_key_from_name("Café Crème"), "caf_crme");
        assert_eq!(generate_key_from_name(""), "");
        assert_eq!(generate_key_from_name("$%^&"), "");
    }

    #[test]
    fn key_generation_keeps_edge_whitespace_as_underscores() {
        assert_eq!(generate_key_from_name(" Rate ($) "), "_rate_");
        assert_eq!(generate_key_from_name("Hourly Rate "), "hourly_rate_");
        assert_eq!(generate_key_from_name("  Hourly   Rate ($) "), "_hourly_rate_");
        assert_eq!(generate_key_from_name("a - b"), "a_b");
        assert_eq!(generate_key_from_name("   "), "_");
    }

    #[test]
    fn key_generation_drops_trailing_symbols() {
        assert_eq!(generate_key_from_name("Cost (USD)"), "cost_usd");
        assert_eq!(generate_key_from_name("Margin %"), "margin_");
        assert_eq!(generate_key_from_name("9 lives!!"), "_9_lives");
    }

    #[test]
    fn generated_keys_are_always_identifiers() {
        let names = [
            "",
            " ",
            "!!!",
            "123",
            "9 lives",
            "a - b",
            "Tab\tSeparated\nName",
            "__x__",
            "ÅÄÖ 42",
            "-- 7 --",
        ];
        for name in names {
            let key = generate_key_from_name(name);
            assert!(
                key.is_empty() || is_valid_identifier(&key),
                "{name:?} produced {key:?}"
            );
        }
    }

    #[test]
    fn key_validation_enforces_rules() {
        let existing = ["hours", "rate"];
        assert_eq!(validate_key("videos", existing), Ok(()));
        assert_eq!(validate_key("_v2", existing), Ok(()));
        assert_eq!(validate_key("", existing), Err(PricingError::EmptyKey));
        assert_eq!(
            validate_key("2fast", existing),
            Err(PricingError::invalid_key("2fast"))
        );
        assert_eq!(
            validate_key("has space", existing),
            Err(PricingError::invalid_key("has space"))
        );
        assert_eq!(
            validate_key("rate", existing),
            Err(PricingError::duplicate_key("rate"))
        );
        assert_eq!(validate_key("Rate", existing), Ok(()));
    }

    #[test]
    fn identifier_rules() {
        assert!(is_valid_identifier("a"));
        assert!(is_valid_identifier("_"));
        assert!(is_valid_identifier("snake_Case_9"));
        assert!(!is_valid_identifier(""));
        assert!(!is_valid_identifier("9a"));
        assert!(!is_valid_identifier("a-b"));
        assert!(!is_valid_identifier("ünï"));
    }
}
