//! Variable - a numeric value tagged with an AEDT unit
//!
//! The value is stored in the SI unit of its unit system; the display unit
//! only affects how the value is reported. Arithmetic resolves the unit
//! system of the result from the combination table in `aedt_units` and
//! expresses products and quotients in the SI unit of that system.

use std::fmt;
use std::str::FromStr;
use serde::{Serialize, Deserialize};
use aedt_units::{
    combine, decompose_variable_value, CombinationPolicy, Operation, Unit, UnitError, UnitSystem,
    UNITS,
};
use crate::format::{clean_number, FormatSpec};
use crate::VariableError;

#[derive(Clone, Copy, Serialize, Deserialize)]
#[serde(try_from = "VariableRepr", into = "VariableRepr")]
pub struct Variable {
    /// Value in the SI unit of the unit system
    value: f64,
    unit: &'static Unit,
}

/// Serialized form: the SI value and the display unit symbol
#[derive(Serialize, Deserialize)]
struct VariableRepr {
    value: f64,
    units: String,
}

impl TryFrom<VariableRepr> for Variable {
    type Error = VariableError;

    fn try_from(repr: VariableRepr) -> Result<Self, Self::Error> {
        Variable::from_si(repr.value, &repr.units)
    }
}

impl From<Variable> for VariableRepr {
    fn from(variable: Variable) -> Self {
        VariableRepr { value: variable.value, units: variable.unit.symbol.to_string() }
    }
}

impl Variable {
    /// Create a variable from a value expressed in `units`
    pub fn new(numeric_value: f64, units: &str) -> Result<Self, VariableError> {
        Ok(Variable::with_unit(numeric_value, UNITS.lookup(units)?))
    }

    /// Create a variable from a value expressed in a known unit
    pub fn with_unit(numeric_value: f64, unit: &'static Unit) -> Self {
        Variable { value: unit.to_si(numeric_value), unit }
    }

    /// Create a variable from an SI value, displayed in `units`
    pub fn from_si(value: f64, units: &str) -> Result<Self, VariableError> {
        let unit = UNITS.lookup(units)?;
        Ok(Variable { value, unit })
    }

    /// Variable in the SI unit of a unit system
    pub fn in_si(value: f64, system: UnitSystem) -> Self {
        Variable { value, unit: UNITS.si_unit(system) }
    }

    /// A pure number
    pub fn dimensionless(value: f64) -> Self {
        Variable::in_si(value, UnitSystem::Dimensionless)
    }

    /// Parse a literal such as `"4mm"`, `"10dBm"` or `"1e-3"`
    ///
    /// Expressions are rejected; evaluate them through
    /// [`Expression::evaluate`](crate::Expression::evaluate).
    pub fn parse(text: &str) -> Result<Self, VariableError> {
        let (magnitude, units) = decompose_variable_value(text);
        let numeric_value = magnitude
            .as_f64()
            .ok_or_else(|| VariableError::NotNumeric(text.to_string()))?;
        Variable::new(numeric_value, &units)
    }

    /// Parse a literal whose unit is given separately
    ///
    /// A unit inside `text` must agree with `units`.
    pub fn parse_with_units(text: &str, units: &str) -> Result<Self, VariableError> {
        let (magnitude, found) = decompose_variable_value(text);
        let numeric_value = magnitude
            .as_f64()
            .ok_or_else(|| VariableError::NotNumeric(text.to_string()))?;
        if !found.is_empty() && found != units {
            return Err(VariableError::InconsistentUnits {
                specified: units.to_string(),
                found,
            });
        }
        Variable::new(numeric_value, units)
    }

    /// Value in the SI unit of the unit system
    pub fn value(&self) -> f64 {
        self.value
    }

    /// Value expressed in the display unit
    pub fn numeric_value(&self) -> f64 {
        self.unit.from_si(self.value)
    }

    pub fn units(&self) -> &'static str {
        self.unit.symbol
    }

    pub fn unit(&self) -> &'static Unit {
        self.unit
    }

    pub fn unit_system(&self) -> UnitSystem {
        self.unit.system
    }

    /// SI unit symbol of the unit system
    pub fn si_units(&self) -> &'static str {
        self.unit.system.si_unit()
    }

    pub fn is_dimensionless(&self) -> bool {
        self.unit.system.is_dimensionless()
    }

    /// Numeric value and display unit
    pub fn decompose(&self) -> (f64, &'static str) {
        (self.numeric_value(), self.unit.symbol)
    }

    /// Value as AEDT writes it, e.g. `"0.12W"`
    pub fn evaluated_value(&self) -> String {
        format!("{}{}", clean_number(self.numeric_value()), self.unit.symbol)
    }

    /// Format the numeric value with `[width][.precision][f|e|g]` and append the unit
    pub fn format(&self, spec: &str) -> Result<String, VariableError> {
        let spec = FormatSpec::parse(spec)?;
        Ok(format!("{}{}", spec.apply(self.numeric_value()), self.unit.symbol))
    }

    /// Change the display unit; the unit must belong to the same unit system
    pub fn rescale_to(&mut self, units: &str) -> Result<&mut Self, VariableError> {
        let unit = UNITS.lookup(units)?;
        if unit.system != self.unit.system {
            return Err(UnitError::IncompatibleSystems {
                from: self.unit.symbol.to_string(),
                from_system: self.unit.system,
                to: unit.symbol.to_string(),
                to_system: unit.system,
            }
            .into());
        }
        self.unit = unit;
        Ok(self)
    }

    /// Copy of this variable displayed in `units`
    pub fn rescaled(mut self, units: &str) -> Result<Self, VariableError> {
        self.rescale_to(units)?;
        Ok(self)
    }

    /// Multiply the numeric value (in the display unit) by a scalar
    fn scaled(&self, factor: f64) -> Self {
        Variable { value: self.unit.to_si(self.numeric_value() * factor), unit: self.unit }
    }

    pub fn mul(&self, other: &Variable) -> Result<Self, VariableError> {
        self.mul_with(other, CombinationPolicy::Strict)
    }

    pub fn div(&self, other: &Variable) -> Result<Self, VariableError> {
        self.div_with(other, CombinationPolicy::Strict)
    }

    /// Product of two variables
    ///
    /// A dimensionless operand acts as a scalar and keeps the other unit.
    /// Otherwise the result is in the SI unit of the resolved unit system.
    pub fn mul_with(&self, other: &Variable, policy: CombinationPolicy) -> Result<Self, VariableError> {
        if other.is_dimensionless() {
            return Ok(self.scaled(other.value));
        }
        if self.is_dimensionless() {
            return Ok(other.scaled(self.value));
        }
        let system = combine(self.unit_system(), other.unit_system(), Operation::Multiply, policy)?;
        Ok(Variable::in_si(self.value * other.value, system))
    }

    /// Quotient of two variables
    pub fn div_with(&self, other: &Variable, policy: CombinationPolicy) -> Result<Self, VariableError> {
        if other.value == 0.0 {
            return Err(VariableError::DivisionByZero);
        }
        if other.is_dimensionless() {
            return Ok(self.scaled(1.0 / other.value));
        }
        let system = combine(self.unit_system(), other.unit_system(), Operation::Divide, policy)?;
        Ok(Variable::in_si(self.value / other.value, system))
    }

    /// `numerator / self`, e.g. `1 / 2ns` is `500000000Hz`
    pub fn divide_into(&self, numerator: f64) -> Result<Self, VariableError> {
        Variable::dimensionless(numerator).div(self)
    }

    /// Sum of two variables of the same unit system, in the unit of `self`
    pub fn add(&self, other: &Variable) -> Result<Self, VariableError> {
        self.add_signed(other, 1.0, "add")
    }

    pub fn sub(&self, other: &Variable) -> Result<Self, VariableError> {
        self.add_signed(other, -1.0, "subtract")
    }

    fn add_signed(&self, other: &Variable, sign: f64, operation: &'static str) -> Result<Self, VariableError> {
        if self.unit_system() != other.unit_system() {
            return Err(VariableError::UnitSystemMismatch {
                operation,
                left: self.unit_system(),
                right: other.unit_system(),
            });
        }
        if self.unit.symbol == other.unit.symbol {
            // Same unit: add in that unit, so 10cel + 5cel is 15cel
            let numeric_value = self.numeric_value() + sign * other.numeric_value();
            return Ok(Variable { value: self.unit.to_si(numeric_value), unit: self.unit });
        }
        Ok(Variable { value: self.value + sign * other.value, unit: self.unit })
    }

    /// Raise to a power; only pure numbers have a defined result
    pub fn pow(&self, exponent: f64) -> Result<Self, VariableError> {
        if exponent == 1.0 {
            return Ok(*self);
        }
        if !self.is_dimensionless() {
            return Err(VariableError::Domain(format!(
                "cannot raise {} ({}) to the power {}",
                self.evaluated_value(),
                self.unit_system(),
                exponent
            )));
        }
        let result = self.value.powf(exponent);
        if result.is_nan() {
            return Err(VariableError::Domain(format!(
                "{} ^ {} is not a real number",
                self.value, exponent
            )));
        }
        Ok(Variable::dimensionless(result))
    }
}

impl PartialEq for Variable {
    fn eq(&self, other: &Self) -> bool {
        self.value == other.value && self.unit.symbol == other.unit.symbol
    }
}

impl fmt::Debug for Variable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Variable")
            .field("value", &self.value)
            .field("units", &self.unit.symbol)
            .field("unit_system", &self.unit.system)
            .finish()
    }
}

impl fmt::Display for Variable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.evaluated_value())
    }
}

impl FromStr for Variable {
    type Err = VariableError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Variable::parse(s)
    }
}

impl From<f64> for Variable {
    fn from(value: f64) -> Self {
        Variable::dimensionless(value)
    }
}

impl From<i64> for Variable {
    fn from(value: i64) -> Self {
        Variable::dimensionless(value as f64)
    }
}

impl std::ops::Mul<f64> for Variable {
    type Output = Variable;

    fn mul(self, rhs: f64) -> Variable {
        self.scaled(rhs)
    }
}

impl std::ops::Mul<Variable> for f64 {
    type Output = Variable;

    fn mul(self, rhs: Variable) -> Variable {
        rhs.scaled(self)
    }
}

impl std::ops::Div<f64> for Variable {
    type Output = Variable;

    fn div(self, rhs: f64) -> Variable {
        self.scaled(1.0 / rhs)
    }
}

impl std::ops::Neg for Variable {
    type Output = Variable;

    fn neg(self) -> Variable {
        self.scaled(-1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() <= 1e-9 * b.abs().max(1.0)
    }

    #[test]
    fn test_new_stores_si_value() {
        let v = Variable::new(4.0, "mm").unwrap();
        assert!(approx(v.numeric_value(), 4.0));
        assert_eq!(v.units(), "mm");
        assert_eq!(v.unit_system(), UnitSystem::Length);
        assert!(approx(v.value(), 0.004));
        assert_eq!(v.si_units(), "meter");
    }

    #[test]
    fn test_parse_literal() {
        let v = Variable::parse("4mm").unwrap();
        let (numeric_value, units) = v.decompose();
        assert!(approx(numeric_value, 4.0));
        assert_eq!(units, "mm");
        let v: Variable = "2.5GHz".parse().unwrap();
        assert!(approx(v.value(), 2.5e9));
        assert_eq!(Variable::parse("7").unwrap(), Variable::dimensionless(7.0));
    }

    #[test]
    fn test_parse_rejects_expressions_and_unknown_units() {
        assert_eq!(Variable::parse("2*x").unwrap_err(), VariableError::NotNumeric("2*x".to_string()));
        assert_eq!(
            Variable::parse("3furlong").unwrap_err(),
            VariableError::Unit(UnitError::UnknownUnit("furlong".to_string()))
        );
    }

    #[test]
    fn test_parse_with_units() {
        let v = Variable::parse_with_units("4", "mm").unwrap();
        assert_eq!(v.evaluated_value(), "4mm");
        assert!(Variable::parse_with_units("4mm", "mm").is_ok());
        let err = Variable::parse_with_units("4mm", "in").unwrap_err();
        assert_eq!(
            err,
            VariableError::InconsistentUnits { specified: "in".to_string(), found: "mm".to_string() }
        );
    }

    #[test]
    fn test_temperature_conversion() {
        let v = Variable::new(100.0, "cel").unwrap();
        assert!(approx(v.value(), 373.15));
        let f = v.rescaled("fah").unwrap();
        assert!(approx(f.numeric_value(), 212.0));
        assert!(approx(f.value(), 373.15));
    }

    #[test]
    fn test_rescale_round_trip() {
        let mut v = Variable::new(1.0, "in").unwrap();
        v.rescale_to("mm").unwrap();
        assert!(approx(v.numeric_value(), 25.4));
        v.rescale_to("in").unwrap();
        assert!(approx(v.numeric_value(), 1.0));
    }

    #[test]
    fn test_rescale_round_trip_every_unit_pair() {
        let mut failures = Vec::new();
        for system in UnitSystem::ALL {
            let units = UNITS.by_system(system);
            for from in &units {
                for to in &units {
                    let original = Variable::new(1.5, from.symbol).unwrap();
                    let mut v = original;
                    v.rescale_to(to.symbol).unwrap();
                    assert_eq!(v.units(), to.symbol);
                    v.rescale_to(from.symbol).unwrap();
                    if !approx(v.numeric_value(), 1.5) || !approx(v.value(), original.value()) {
                        failures.push((from.symbol, to.symbol, v.numeric_value()));
                    }
                }
            }
        }
        assert!(failures.is_empty(), "round trip failed for {failures:?}");
    }

    #[test]
    fn test_rescale_to_other_system_fails() {
        let mut v = Variable::new(1.0, "mm").unwrap();
        let err = v.rescale_to("s").unwrap_err();
        assert!(matches!(err, VariableError::Unit(UnitError::IncompatibleSystems { .. })));
        assert_eq!(v.units(), "mm");
    }

    #[test]
    fn test_multiply_voltage_and_current() {
        let i = Variable::parse("3mA").unwrap();
        let v = Variable::parse("40V").unwrap();
        let p = i.mul(&v).unwrap();
        assert_eq!(p.unit_system(), UnitSystem::Power);
        assert_eq!(p.units(), "W");
        assert!(approx(p.numeric_value(), 0.12));
        assert_eq!(p.evaluated_value(), "0.12W");
    }

    #[test]
    fn test_divide_resolves_unit_system() {
        let length = Variable::parse("10meter").unwrap();
        let time = Variable::parse("2s").unwrap();
        let speed = length.div(&time).unwrap();
        assert_eq!(speed.unit_system(), UnitSystem::Speed);
        assert_eq!(speed.evaluated_value(), "5m_per_sec");

        let ratio = Variable::parse("3mm").unwrap().div(&Variable::parse("1mm").unwrap()).unwrap();
        assert!(ratio.is_dimensionless());
        assert!(approx(ratio.value(), 3.0));
    }

    #[test]
    fn test_unknown_combination() {
        let m = Variable::parse("2kg").unwrap();
        let l = Variable::parse("3mm").unwrap();
        assert!(matches!(
            m.mul(&l).unwrap_err(),
            VariableError::Unit(UnitError::UnsupportedCombination { .. })
        ));
        let lenient = m.mul_with(&l, CombinationPolicy::Dimensionless).unwrap();
        assert!(lenient.is_dimensionless());
        assert!(approx(lenient.value(), 0.006));
    }

    #[test]
    fn test_dimensionless_operand_scales() {
        let l = Variable::parse("3mm").unwrap();
        let doubled = l.mul(&Variable::dimensionless(2.0)).unwrap();
        assert_eq!(doubled.evaluated_value(), "6mm");
        let halved = l.div(&Variable::dimensionless(2.0)).unwrap();
        assert_eq!(halved.evaluated_value(), "1.5mm");
    }

    #[test]
    fn test_divide_into_scalar() {
        let period = Variable::parse("2ns").unwrap();
        let freq = period.divide_into(1.0).unwrap();
        assert_eq!(freq.unit_system(), UnitSystem::Freq);
        assert!(approx(freq.value(), 5e8));
    }

    #[test]
    fn test_division_by_zero() {
        let l = Variable::parse("3mm").unwrap();
        assert_eq!(l.div(&Variable::parse("0s").unwrap()).unwrap_err(), VariableError::DivisionByZero);
    }

    #[test]
    fn test_add_requires_same_unit_system() {
        let err = Variable::parse("10mm").unwrap().add(&Variable::parse("3").unwrap()).unwrap_err();
        assert_eq!(
            err,
            VariableError::UnitSystemMismatch {
                operation: "add",
                left: UnitSystem::Length,
                right: UnitSystem::Dimensionless,
            }
        );
    }

    #[test]
    fn test_add_keeps_left_unit() {
        let sum = Variable::parse("1mm").unwrap().add(&Variable::parse("1cm").unwrap()).unwrap();
        assert_eq!(sum.units(), "mm");
        assert!(approx(sum.numeric_value(), 11.0));

        let diff = Variable::parse("1cm").unwrap().sub(&Variable::parse("1mm").unwrap()).unwrap();
        assert_eq!(diff.units(), "cm");
        assert!(approx(diff.numeric_value(), 0.9));
    }

    #[test]
    fn test_add_same_nonlinear_unit() {
        let sum = Variable::parse("10cel").unwrap().add(&Variable::parse("5cel").unwrap()).unwrap();
        assert!(approx(sum.numeric_value(), 15.0));
    }

    #[test]
    fn test_scalar_operators() {
        let l = Variable::parse("3mm").unwrap();
        assert_eq!((l * 2.0).evaluated_value(), "6mm");
        assert_eq!((2.0 * l).evaluated_value(), "6mm");
        assert_eq!((l / 3.0).evaluated_value(), "1mm");
        assert_eq!((-l).evaluated_value(), "-3mm");
    }

    #[test]
    fn test_pow() {
        assert!(approx(Variable::dimensionless(3.0).pow(2.0).unwrap().value(), 9.0));
        assert_eq!(Variable::parse("3mm").unwrap().pow(1.0).unwrap().units(), "mm");
        assert!(matches!(Variable::parse("3mm").unwrap().pow(2.0), Err(VariableError::Domain(_))));
        assert!(matches!(Variable::dimensionless(-1.0).pow(0.5), Err(VariableError::Domain(_))));
    }

    #[test]
    fn test_display_and_format() {
        let v = Variable::parse("3.14159mm").unwrap();
        assert_eq!(v.to_string(), "3.14159mm");
        assert_eq!(v.format(".2f").unwrap(), "3.14mm");
        assert_eq!(v.format("8.3f").unwrap(), "   3.142mm");
        assert!(v.format("q").is_err());
    }

    #[test]
    fn test_display_extreme_magnitudes() {
        let tiny = Variable::parse("1e-20F").unwrap();
        assert_eq!(tiny.to_string(), "1e-20F");
        assert_eq!(tiny.to_string().parse::<Variable>().unwrap(), tiny);
        assert_eq!(Variable::dimensionless(1e20).to_string(), "1e+20");
    }

    #[test]
    fn test_from_numbers() {
        assert_eq!(Variable::from(2.5).evaluated_value(), "2.5");
        assert_eq!(Variable::from(3_i64).decompose(), (3.0, ""));
    }

    #[test]
    fn test_serde_round_trip() {
        let v = Variable::parse("4mm").unwrap();
        let json = serde_json::to_string(&v).unwrap();
        assert_eq!(json, r#"{"value":0.004,"units":"mm"}"#);
        let back: Variable = serde_json::from_str(&json).unwrap();
        assert_eq!(back, v);
        assert!(serde_json::from_str::<Variable>(r#"{"value":1.0,"units":"furlong"}"#).is_err());
    }
}
