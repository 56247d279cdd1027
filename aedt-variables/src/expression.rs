//! Expression - a design variable defined by text such as `"2*width + 1mm"`

use std::collections::HashMap;
use std::fmt;
use serde::{Serialize, Deserialize};
use aedt_units::{decompose_with_variables, referenced_names, UnitSystem, UNITS};
use crate::eval::{dependencies, Bindings, Evaluator};
use crate::parser::parse_expr;
use crate::{Variable, VariableError};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Expression {
    expression: String,
    variable: Variable,
}

impl Expression {
    /// Pair an expression with a value computed elsewhere (e.g. by AEDT)
    ///
    /// The unit is taken from the expression itself when it is a literal;
    /// otherwise it is left empty.
    pub fn new(expression: &str, numeric_value: f64) -> Result<Self, VariableError> {
        Self::with_variables(expression, numeric_value, &HashMap::new())
    }

    /// Like [`new`](Self::new), but the unit may also come from the
    /// definitions of the variables the expression references
    pub fn with_variables(
        expression: &str,
        numeric_value: f64,
        variables: &HashMap<String, String>,
    ) -> Result<Self, VariableError> {
        let (_, units) = decompose_with_variables(expression, variables);
        let variable = match UNITS.get(&units) {
            Some(_) => Variable::new(numeric_value, &units)?,
            None => {
                tracing::debug!(expression, units = %units, "unrecognized unit, value kept dimensionless");
                Variable::dimensionless(numeric_value)
            }
        };
        Ok(Expression { expression: expression.to_string(), variable })
    }

    /// Evaluate an expression against bound variables
    pub fn evaluate(expression: &str, bindings: &dyn Bindings) -> Result<Self, VariableError> {
        Self::evaluate_with(expression, bindings, &Evaluator::new())
    }

    pub fn evaluate_with(
        expression: &str,
        bindings: &dyn Bindings,
        evaluator: &Evaluator,
    ) -> Result<Self, VariableError> {
        let variable = evaluator.evaluate(expression, bindings)?;
        Ok(Expression { expression: expression.trim().to_string(), variable })
    }

    pub(crate) fn from_parts(expression: &str, variable: Variable) -> Self {
        Expression { expression: expression.to_string(), variable }
    }

    pub fn expression(&self) -> &str {
        &self.expression
    }

    pub fn variable(&self) -> &Variable {
        &self.variable
    }

    pub fn value(&self) -> f64 {
        self.variable.value()
    }

    pub fn numeric_value(&self) -> f64 {
        self.variable.numeric_value()
    }

    pub fn units(&self) -> &'static str {
        self.variable.units()
    }

    pub fn unit_system(&self) -> UnitSystem {
        self.variable.unit_system()
    }

    pub fn evaluated_value(&self) -> String {
        self.variable.evaluated_value()
    }

    pub fn decompose(&self) -> (f64, &'static str) {
        self.variable.decompose()
    }

    /// Change the display unit of the evaluated value
    pub fn rescale_to(&mut self, units: &str) -> Result<&mut Self, VariableError> {
        self.variable.rescale_to(units)?;
        Ok(self)
    }

    /// Names of the variables the expression references
    ///
    /// Unparsable text falls back to a lexical scan.
    pub fn dependencies(&self) -> Vec<String> {
        match parse_expr(&self.expression) {
            Ok(expr) => dependencies(&expr),
            Err(_) => referenced_names(&self.expression),
        }
    }
}

impl fmt::Display for Expression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.expression)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() <= 1e-9 * b.abs().max(1.0)
    }

    #[test]
    fn test_new_takes_units_from_literal() {
        let e = Expression::new("4mm", 4.0).unwrap();
        assert_eq!(e.units(), "mm");
        assert!(approx(e.value(), 0.004));
        assert_eq!(e.expression(), "4mm");
    }

    #[test]
    fn test_new_expression_without_units() {
        let e = Expression::new("width*2", 6.0).unwrap();
        assert!(e.variable().is_dimensionless());
        assert_eq!(e.numeric_value(), 6.0);
    }

    #[test]
    fn test_units_from_referenced_definitions() {
        let variables: HashMap<String, String> =
            [("width".to_string(), "3mm".to_string())].into_iter().collect();
        let e = Expression::with_variables("width*2", 6.0, &variables).unwrap();
        assert_eq!(e.units(), "mm");
        assert_eq!(e.evaluated_value(), "6mm");
    }

    #[test]
    fn test_unrecognized_unit_is_dimensionless() {
        let e = Expression::new("3.123456Nm-2", 3.123456).unwrap();
        assert!(e.variable().is_dimensionless());
        assert_eq!(e.decompose(), (3.123456, ""));
    }

    #[test]
    fn test_evaluate() {
        let bindings: HashMap<String, Variable> =
            [("f".to_string(), Variable::parse("2GHz").unwrap())].into_iter().collect();
        let e = Expression::evaluate("1/f", &bindings).unwrap();
        assert_eq!(e.unit_system(), UnitSystem::Time);
        assert!(approx(e.value(), 0.5e-9));
        assert_eq!(e.to_string(), "1/f");
    }

    #[test]
    fn test_rescale() {
        let bindings: HashMap<String, Variable> =
            [("f".to_string(), Variable::parse("2GHz").unwrap())].into_iter().collect();
        let mut e = Expression::evaluate("1/f", &bindings).unwrap();
        e.rescale_to("ns").unwrap();
        assert!(approx(e.numeric_value(), 0.5));
        assert!(e.rescale_to("mm").is_err());
    }

    #[test]
    fn test_dependencies() {
        let e = Expression::new("$w*2 + sin(theta) + $w", 0.0).unwrap();
        assert_eq!(e.dependencies(), vec!["$w", "theta"]);
        let e = Expression::new("a + (b", 0.0).unwrap();
        assert_eq!(e.dependencies(), vec!["a", "b"]);
    }
}
