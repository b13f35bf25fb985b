//! Validation rule grammar.

use regex::Regex;
use serde_json::Value;
use std::fmt;
use std::sync::OnceLock;

static LENGTH_RULE: OnceLock<Regex> = OnceLock::new();

fn length_rule() -> &'static Regex {
    LENGTH_RULE
        .get_or_init(|| Regex::new(r"^length\s*>\s*(\d+)$").expect("LENGTH_RULE is valid"))
}

/// A parsed validation rule. Matching is on the whole rule text, so
/// `"password length > 8"` is not a length rule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Rule {
    LengthGreaterThan(usize),
    NotEmpty,
    Positive,
    Unrecognized(String),
}

impl Rule {
    pub fn parse(text: &str) -> Self {
        let normalized = text.trim().to_lowercase();
        match normalized.as_str() {
            "not empty" => return Rule::NotEmpty,
            "positive" => return Rule::Positive,
            _ => {}
        }
        length_rule()
            .captures(&normalized)
            .and_then(|caps| caps.get(1))
            .and_then(|n| n.as_str().parse().ok())
            .map(Rule::LengthGreaterThan)
            .unwrap_or_else(|| Rule::Unrecognized(text.trim().to_string()))
    }

    /// `None` when the rule is not understood.
    pub fn check(&self, value: &Value) -> Option<bool> {
        match self {
            Rule::LengthGreaterThan(n) => Some(text_length(value) > *n),
            Rule::NotEmpty => Some(is_truthy(value)),
            Rule::Positive => Some(value.as_f64().is_some_and(|v| v > 0.0)),
            Rule::Unrecognized(_) => None,
        }
    }

    pub fn is_recognized(&self) -> bool {
        !matches!(self, Rule::Unrecognized(_))
    }
}

impl fmt::Display for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Rule::LengthGreaterThan(n) => write!(f, "length > {n}"),
            Rule::NotEmpty => f.write_str("not empty"),
            Rule::Positive => f.write_str("positive"),
            Rule::Unrecognized(text) => f.write_str(text),
        }
    }
}

/// Strings count their characters; everything else its compact JSON text.
fn text_length(value: &Value) -> usize {
    match value {
        Value::String(s) => s.chars().count(),
        other => other.to_string().chars().count(),
    }
}

fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|v| v != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(a) => !a.is_empty(),
        Value::Object(o) => !o.is_empty(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_known_rules() {
        assert_eq!(Rule::parse("length > 8"), Rule::LengthGreaterThan(8));
        assert_eq!(Rule::parse("  Length>3 "), Rule::LengthGreaterThan(3));
        assert_eq!(Rule::parse("NOT EMPTY"), Rule::NotEmpty);
        assert_eq!(Rule::parse("positive"), Rule::Positive);
    }

    #[test]
    fn test_rule_must_match_whole_text() {
        assert_eq!(
            Rule::parse("password length > 8"),
            Rule::Unrecognized("password length > 8".into())
        );
        assert_eq!(Rule::parse("must be positive").check(&json!(-1)), None);
    }

    #[test]
    fn test_length_uses_text_form() {
        let rule = Rule::LengthGreaterThan(3);
        assert_eq!(rule.check(&json!("abcd")), Some(true));
        assert_eq!(rule.check(&json!("abc")), Some(false));
        // [1,2] is 5 characters of compact JSON
        assert_eq!(rule.check(&json!([1, 2])), Some(true));
    }

    #[test]
    fn test_not_empty_and_positive() {
        assert_eq!(Rule::NotEmpty.check(&json!("")), Some(false));
        assert_eq!(Rule::NotEmpty.check(&json!({})), Some(false));
        assert_eq!(Rule::NotEmpty.check(&json!(0)), Some(false));
        assert_eq!(Rule::NotEmpty.check(&json!("x")), Some(true));
        assert_eq!(Rule::Positive.check(&json!(0.5)), Some(true));
        assert_eq!(Rule::Positive.check(&json!(0)), Some(false));
        assert_eq!(Rule::Positive.check(&json!("5")), Some(false));
    }
}
