//! Value decomposition - split literals like "3.123456mm" into magnitude and unit

use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::LazyLock;
use regex::Regex;
use serde::{Serialize, Deserialize};

static NUMBER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[+-]?(?:\d+\.?\d*|\.\d+)(?:[eE][+-]?\d+)?$").expect("number pattern")
});

static LITERAL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*(?P<number>[+-]?(?:\d+\.?\d*|\.\d+)(?:[eE][+-]?\d+)?)\s*(?P<units>[A-Za-z_].*?)\s*$")
        .expect("literal pattern")
});

static IDENTIFIER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"[A-Za-z_$][A-Za-z0-9_]*").expect("identifier pattern")
});

/// Characters that turn a unit suffix into an expression
const EXPRESSION_CHARS: &[char] = &['+', '*', '/', '(', ')', '[', ']'];

/// Characters after which an identifier is a variable reference
const REFERENCE_PRECEDERS: &[char] = &['+', '-', '*', '/', '^', '(', '[', ','];

/// Numeric part of a decomposed value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value")]
pub enum Magnitude {
    Integer(i64),
    Float(f64),
    /// The input was not a literal; kept verbatim
    Text(String),
}

impl Magnitude {
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Magnitude::Integer(i) => Some(*i as f64),
            Magnitude::Float(f) => Some(*f),
            Magnitude::Text(_) => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Magnitude::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn is_number(&self) -> bool {
        !matches!(self, Magnitude::Text(_))
    }
}

impl PartialEq<f64> for Magnitude {
    fn eq(&self, other: &f64) -> bool {
        self.as_f64() == Some(*other)
    }
}

impl fmt::Display for Magnitude {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Magnitude::Integer(i) => write!(f, "{}", i),
            Magnitude::Float(x) => write!(f, "{}", x),
            Magnitude::Text(s) => write!(f, "{}", s),
        }
    }
}

/// Parse a bare numeric literal; integers stay integers
pub fn parse_number(s: &str) -> Option<Magnitude> {
    let s = s.trim();
    if !NUMBER.is_match(s) {
        return None;
    }
    if !s.contains(['.', 'e', 'E']) {
        if let Ok(i) = s.parse::<i64>() {
            return Some(Magnitude::Integer(i));
        }
    }
    s.parse::<f64>().ok().map(Magnitude::Float)
}

/// True if the whole string is a numeric literal without units
pub fn is_number(s: &str) -> bool {
    parse_number(s).is_some()
}

/// Split a value into its magnitude and trailing unit symbol
///
/// - `"3.123456m"` → `(Float(3.123456), "m")`
/// - `"3"` → `(Integer(3), "")`
/// - `"3.123456Nm-2"` → `(Float(3.123456), "Nm-2")`
///
/// The unit is everything from the first letter after the number; its
/// structure is not interpreted. Anything that is not a literal comes back
/// as `Magnitude::Text` with an empty unit.
pub fn decompose_variable_value(value: &str) -> (Magnitude, String) {
    decompose_with_variables(value, &HashMap::new())
}

/// Like [`decompose_variable_value`], but for non-literals the unit is taken
/// from the variables the expression references
pub fn decompose_with_variables(value: &str, variables: &HashMap<String, String>) -> (Magnitude, String) {
    if let Some(magnitude) = parse_number(value) {
        return (magnitude, String::new());
    }

    if let Some(caps) = LITERAL.captures(value) {
        let units = &caps["units"];
        let is_plain_suffix = !units.contains(EXPRESSION_CHARS)
            && !units.contains(char::is_whitespace);
        if is_plain_suffix {
            if let Some(magnitude) = parse_number(&caps["number"]) {
                return (magnitude, units.to_string());
            }
        }
    }

    tracing::trace!(value, "not a literal, kept as text");
    let units = find_units_in_dependent_variables(value, variables);
    (Magnitude::Text(value.to_string()), units)
}

/// Names referenced by an expression, in order of first appearance
///
/// Unit suffixes of literals ("2mm") and exponents ("1e3") are not
/// references: a reference starts the expression or follows an operator.
pub fn referenced_names(expression: &str) -> Vec<String> {
    let mut names: Vec<String> = Vec::new();
    for m in IDENTIFIER.find_iter(expression) {
        let preceding = expression[..m.start()].trim_end().chars().next_back();
        let is_reference = match preceding {
            None => true,
            Some(c) => REFERENCE_PRECEDERS.contains(&c),
        };
        // A match glued to a digit ("2mm") is a unit suffix even after trimming
        let glued = expression[..m.start()]
            .chars()
            .next_back()
            .is_some_and(|c| c.is_ascii_digit() || c == '.');
        if is_reference && !glued && !names.iter().any(|n| n == m.as_str()) {
            names.push(m.as_str().to_string());
        }
    }
    names
}

/// Unit of the first referenced variable whose definition carries one
///
/// Definitions that are expressions themselves are followed recursively.
/// Returns an empty string when no unit can be found.
pub fn find_units_in_dependent_variables(expression: &str, variables: &HashMap<String, String>) -> String {
    let mut visited = HashSet::new();
    units_from_references(expression, variables, &mut visited)
}

fn units_from_references(
    expression: &str,
    variables: &HashMap<String, String>,
    visited: &mut HashSet<String>,
) -> String {
    for name in referenced_names(expression) {
        let Some(definition) = variables.get(&name) else {
            continue;
        };
        if !visited.insert(name) {
            continue;
        }
        let (magnitude, units) = decompose_variable_value(definition);
        if magnitude.is_number() {
            if !units.is_empty() {
                return units;
            }
        } else {
            let nested = units_from_references(definition, variables, visited);
            if !nested.is_empty() {
                return nested;
            }
        }
    }
    String::new()
}
