//! Number formatting for variable values
//!
//! Format specs have the form `[width][.precision][f|e|g]`; exponents are
//! written with a sign and at least two digits (`1.5e+03`).

use std::sync::LazyLock;
use regex::Regex;
use crate::VariableError;

static SPEC: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?P<width>\d+)?(?:\.(?P<precision>\d+))?(?P<kind>[feg])?$").expect("format spec pattern")
});

const DEFAULT_PRECISION: usize = 6;
const CLEAN_PRECISION: usize = 15;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormatKind {
    /// Shortest representation, float noise trimmed
    Default,
    Fixed,
    Exponent,
    General,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FormatSpec {
    pub width: Option<usize>,
    pub precision: Option<usize>,
    pub kind: FormatKind,
}

impl FormatSpec {
    pub fn parse(spec: &str) -> Result<Self, VariableError> {
        let caps = SPEC
            .captures(spec.trim())
            .ok_or_else(|| VariableError::InvalidFormat(spec.to_string()))?;
        let number = |name: &str| -> Result<Option<usize>, VariableError> {
            caps.name(name)
                .map(|m| m.as_str().parse::<usize>())
                .transpose()
                .map_err(|_| VariableError::InvalidFormat(spec.to_string()))
        };
        let kind = match caps.name("kind").map(|m| m.as_str()) {
            Some("f") => FormatKind::Fixed,
            Some("e") => FormatKind::Exponent,
            Some("g") => FormatKind::General,
            _ if caps.name("precision").is_some() => FormatKind::General,
            _ => FormatKind::Default,
        };
        Ok(FormatSpec {
            width: number("width")?,
            precision: number("precision")?,
            kind,
        })
    }

    pub fn apply(&self, value: f64) -> String {
        let body = match self.kind {
            FormatKind::Default => clean_number(value),
            FormatKind::Fixed => format!("{:.*}", self.precision.unwrap_or(DEFAULT_PRECISION), value),
            FormatKind::Exponent => exponent(value, self.precision.unwrap_or(DEFAULT_PRECISION)),
            FormatKind::General => general(value, self.precision.unwrap_or(DEFAULT_PRECISION)),
        };
        match self.width {
            Some(width) => format!("{:>width$}", body, width = width),
            None => body,
        }
    }
}

/// Shortest representation after rounding to 15 significant digits
///
/// `0.003 * 40` prints as `0.12` rather than `0.12000000000000001`.
/// Magnitudes below `1e-4` or from `1e15` up switch to exponent notation.
pub fn clean_number(value: f64) -> String {
    general(value, CLEAN_PRECISION)
}

/// Exponent notation with a signed, two-digit exponent (`1.500e+03`)
fn exponent(value: f64, precision: usize) -> String {
    if !value.is_finite() {
        return value.to_string();
    }
    let raw = format!("{:.*e}", precision, value);
    match raw.split_once('e') {
        Some((mantissa, exp)) => {
            let exp: i32 = exp.parse().unwrap_or(0);
            let sign = if exp < 0 { '-' } else { '+' };
            format!("{}e{}{:02}", mantissa, sign, exp.abs())
        }
        None => raw,
    }
}

/// General format: fixed or exponent depending on magnitude, trailing zeros removed
fn general(value: f64, precision: usize) -> String {
    if !value.is_finite() {
        return value.to_string();
    }
    let precision = precision.max(1);
    if value == 0.0 {
        return "0".to_string();
    }
    let raw = format!("{:.*e}", precision - 1, value);
    let exp: i32 = raw
        .split_once('e')
        .and_then(|(_, e)| e.parse().ok())
        .unwrap_or(0);

    if exp < -4 || exp >= precision as i32 {
        let formatted = exponent(value, precision - 1);
        match formatted.split_once('e') {
            Some((mantissa, rest)) => format!("{}e{}", trim_zeros(mantissa), rest),
            None => formatted,
        }
    } else {
        let decimals = (precision as i32 - 1 - exp).max(0) as usize;
        trim_zeros(&format!("{:.*}", decimals, value)).to_string()
    }
}

fn trim_zeros(s: &str) -> &str {
    if s.contains('.') {
        s.trim_end_matches('0').trim_end_matches('.')
    } else {
        s
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clean_number() {
        assert_eq!(clean_number(0.003 * 40.0), "0.12");
        assert_eq!(clean_number(4.0), "4");
        assert_eq!(clean_number(-0.0), "0");
        assert_eq!(clean_number(1.0 / 3.0), "0.333333333333333");
        assert_eq!(clean_number(25.4), "25.4");
        assert_eq!(clean_number(0.0001), "0.0001");
        assert_eq!(clean_number(123456789012345.0), "123456789012345");
    }

    #[test]
    fn test_clean_number_switches_to_exponent() {
        assert_eq!(clean_number(1e-20), "1e-20");
        assert_eq!(clean_number(-2.5e-7), "-2.5e-07");
        assert_eq!(clean_number(1e20), "1e+20");
        assert_eq!(clean_number(1e15), "1e+15");
    }

    #[test]
    fn test_parse_spec() {
        let spec = FormatSpec::parse("8.3f").unwrap();
        assert_eq!(spec, FormatSpec { width: Some(8), precision: Some(3), kind: FormatKind::Fixed });
        assert_eq!(FormatSpec::parse("").unwrap().kind, FormatKind::Default);
        assert_eq!(FormatSpec::parse(".4").unwrap().kind, FormatKind::General);
    }

    #[test]
    fn test_invalid_spec() {
        assert_eq!(FormatSpec::parse("x").unwrap_err(), VariableError::InvalidFormat("x".to_string()));
        assert!(FormatSpec::parse(".f3").is_err());
    }

    #[test]
    fn test_fixed_and_width() {
        assert_eq!(FormatSpec::parse(".2f").unwrap().apply(3.14159), "3.14");
        assert_eq!(FormatSpec::parse("7.2f").unwrap().apply(3.14159), "   3.14");
    }

    #[test]
    fn test_exponent() {
        assert_eq!(FormatSpec::parse(".3e").unwrap().apply(1500.0), "1.500e+03");
        assert_eq!(FormatSpec::parse(".1e").unwrap().apply(0.00025), "2.5e-04");
    }

    #[test]
    fn test_general() {
        let g = FormatSpec::parse("g").unwrap();
        assert_eq!(g.apply(0.5), "0.5");
        assert_eq!(g.apply(1234567.0), "1.23457e+06");
        assert_eq!(g.apply(0.00001), "1e-05");
        assert_eq!(FormatSpec::parse(".3g").unwrap().apply(2.0), "2");
    }
}
