//! Expression evaluator
//!
//! Walks the parsed expression and combines operands as [`Variable`]s, so
//! units are tracked through every operation.

use std::collections::HashMap;
use std::f64::consts::PI;
use aedt_units::{CombinationPolicy, UnitSystem};
use crate::ast::{BinOp, Expr, UnaryOp};
use crate::parser::parse_expr;
use crate::{Variable, VariableError};

/// Built-in functions
pub const FUNCTIONS: &[&str] = &[
    "abs", "sqrt", "exp", "ln", "log10", "sin", "cos", "tan", "asin", "acos", "atan", "min", "max",
];

/// Built-in constants, used when no variable of that name is bound
pub const CONSTANTS: &[&str] = &["pi"];

/// Variables an expression needs bound, in order of first use
///
/// Built-in constants are not dependencies.
pub fn dependencies(expr: &Expr) -> Vec<String> {
    expr.variables()
        .into_iter()
        .filter(|name| !CONSTANTS.contains(&name.as_str()))
        .collect()
}

/// Source of variable values during evaluation
pub trait Bindings {
    fn lookup(&self, name: &str) -> Option<Variable>;
}

impl Bindings for HashMap<String, Variable> {
    fn lookup(&self, name: &str) -> Option<Variable> {
        self.get(name).copied()
    }
}

/// No variables; only literals and constants evaluate
pub struct NoBindings;

impl Bindings for NoBindings {
    fn lookup(&self, _name: &str) -> Option<Variable> {
        None
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct Evaluator {
    policy: CombinationPolicy,
}

impl Evaluator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_policy(policy: CombinationPolicy) -> Self {
        Evaluator { policy }
    }

    pub fn policy(&self) -> CombinationPolicy {
        self.policy
    }

    /// Parse and evaluate an expression
    pub fn evaluate(&self, text: &str, bindings: &dyn Bindings) -> Result<Variable, VariableError> {
        let expr = parse_expr(text)?;
        self.eval_expr(&expr, bindings)
    }

    pub fn eval_expr(&self, expr: &Expr, bindings: &dyn Bindings) -> Result<Variable, VariableError> {
        match expr {
            Expr::Literal { value, units } => Variable::new(*value, units),

            Expr::Variable(name) => bindings
                .lookup(name)
                .or_else(|| constant(name))
                .ok_or_else(|| VariableError::UndefinedVariable(name.clone())),

            Expr::BinaryOp(left, op, right) => {
                let l = self.eval_expr(left, bindings)?;
                let r = self.eval_expr(right, bindings)?;
                self.eval_binary_op(l, *op, r)
            }

            Expr::UnaryOp(UnaryOp::Neg, inner) => Ok(-self.eval_expr(inner, bindings)?),

            Expr::FunctionCall(name, args) => {
                let evaluated_args = args
                    .iter()
                    .map(|a| self.eval_expr(a, bindings))
                    .collect::<Result<Vec<_>, _>>()?;
                call_function(name, &evaluated_args)
            }
        }
    }

    fn eval_binary_op(&self, left: Variable, op: BinOp, right: Variable) -> Result<Variable, VariableError> {
        match op {
            BinOp::Add => left.add(&right),
            BinOp::Sub => left.sub(&right),
            BinOp::Mul => left.mul_with(&right, self.policy),
            BinOp::Div => left.div_with(&right, self.policy),
            BinOp::Pow => {
                if !right.is_dimensionless() {
                    return Err(VariableError::Domain(format!(
                        "exponent must be dimensionless, got {}",
                        right
                    )));
                }
                left.pow(right.value())
            }
        }
    }
}

fn constant(name: &str) -> Option<Variable> {
    match name {
        "pi" => Some(Variable::dimensionless(PI)),
        _ => None,
    }
}

fn call_function(name: &str, args: &[Variable]) -> Result<Variable, VariableError> {
    match name {
        "abs" => {
            let x = single(name, args)?;
            Variable::new(x.numeric_value().abs(), x.units())
        }
        "sqrt" => {
            let x = pure(name, single(name, args)?)?;
            if x < 0.0 {
                return Err(VariableError::Domain(format!("sqrt of negative number {}", x)));
            }
            Ok(Variable::dimensionless(x.sqrt()))
        }
        "exp" => Ok(Variable::dimensionless(pure(name, single(name, args)?)?.exp())),
        "ln" | "log10" => {
            let x = pure(name, single(name, args)?)?;
            if x <= 0.0 {
                return Err(VariableError::Domain(format!("{} of non-positive number {}", name, x)));
            }
            let result = if name == "ln" { x.ln() } else { x.log10() };
            Ok(Variable::dimensionless(result))
        }
        "sin" | "cos" | "tan" => {
            let x = single(name, args)?;
            if !matches!(x.unit_system(), UnitSystem::Angle | UnitSystem::Dimensionless) {
                return Err(VariableError::Domain(format!("{}() expects an angle, got {}", name, x)));
            }
            // SI value of an angle is in radians
            let radians = x.value();
            let result = match name {
                "sin" => radians.sin(),
                "cos" => radians.cos(),
                _ => radians.tan(),
            };
            Ok(Variable::dimensionless(result))
        }
        "asin" | "acos" => {
            let x = pure(name, single(name, args)?)?;
            if !(-1.0..=1.0).contains(&x) {
                return Err(VariableError::Domain(format!("{} of {} is outside [-1, 1]", name, x)));
            }
            let result = if name == "asin" { x.asin() } else { x.acos() };
            Ok(Variable::in_si(result, UnitSystem::Angle))
        }
        "atan" => Ok(Variable::in_si(pure(name, single(name, args)?)?.atan(), UnitSystem::Angle)),
        "min" | "max" => extremum(name, args),
        _ => Err(VariableError::UnknownFunction(name.to_string())),
    }
}

fn single(name: &str, args: &[Variable]) -> Result<Variable, VariableError> {
    match args {
        [x] => Ok(*x),
        _ => Err(VariableError::ArgCount {
            function: name.to_string(),
            expected: "1".to_string(),
            got: args.len(),
        }),
    }
}

fn pure(name: &str, x: Variable) -> Result<f64, VariableError> {
    if !x.is_dimensionless() {
        return Err(VariableError::Domain(format!(
            "{}() expects a dimensionless argument, got {}",
            name, x
        )));
    }
    Ok(x.value())
}

fn extremum(name: &str, args: &[Variable]) -> Result<Variable, VariableError> {
    let (first, rest) = args.split_first().ok_or_else(|| VariableError::ArgCount {
        function: name.to_string(),
        expected: "at least 1".to_string(),
        got: 0,
    })?;
    let mut best = *first;
    for x in rest {
        if x.unit_system() != best.unit_system() {
            return Err(VariableError::UnitSystemMismatch {
                operation: "compare",
                left: best.unit_system(),
                right: x.unit_system(),
            });
        }
        let better = if name == "min" { x.value() < best.value() } else { x.value() > best.value() };
        if better {
            best = *x;
        }
    }
    Ok(best)
}

#[cfg(test)]
mod tests {
    use super::*;
    use aedt_units::UnitError;

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() <= 1e-9 * b.abs().max(1.0)
    }

    fn bindings(pairs: &[(&str, &str)]) -> HashMap<String, Variable> {
        pairs
            .iter()
            .map(|(name, value)| (name.to_string(), Variable::parse(value).unwrap()))
            .collect()
    }

    fn eval(text: &str, vars: &HashMap<String, Variable>) -> Result<Variable, VariableError> {
        Evaluator::new().evaluate(text, vars)
    }

    #[test]
    fn test_arithmetic_with_units() {
        let vars = bindings(&[("width", "3mm"), ("gap", "0.5mm")]);
        let v = eval("2*width + gap", &vars).unwrap();
        assert_eq!(v.units(), "mm");
        assert!(approx(v.numeric_value(), 6.5));
    }

    #[test]
    fn test_power_from_voltage_and_current() {
        let vars = bindings(&[("i", "3mA"), ("u", "40V")]);
        let p = eval("i*u", &vars).unwrap();
        assert_eq!(p.unit_system(), UnitSystem::Power);
        assert_eq!(p.evaluated_value(), "0.12W");
    }

    #[test]
    fn test_literal_units_in_expression() {
        let v = eval("1GHz * 2ns", &HashMap::new()).unwrap();
        assert!(v.is_dimensionless());
        assert!(approx(v.value(), 2.0));
    }

    #[test]
    fn test_add_dimensionless_to_length_fails() {
        let err = eval("10mm + 3", &HashMap::new()).unwrap_err();
        assert!(matches!(err, VariableError::UnitSystemMismatch { operation: "add", .. }));
    }

    #[test]
    fn test_undefined_variable_and_unknown_unit() {
        assert_eq!(
            eval("a + 1", &HashMap::new()).unwrap_err(),
            VariableError::UndefinedVariable("a".to_string())
        );
        assert_eq!(
            eval("3furlong", &HashMap::new()).unwrap_err(),
            VariableError::Unit(UnitError::UnknownUnit("furlong".to_string()))
        );
    }

    #[test]
    fn test_policy_controls_unknown_combinations() {
        let vars = bindings(&[("m", "2kg"), ("l", "3meter")]);
        assert!(matches!(
            eval("m*l", &vars).unwrap_err(),
            VariableError::Unit(UnitError::UnsupportedCombination { .. })
        ));
        let lenient = Evaluator::with_policy(CombinationPolicy::Dimensionless)
            .evaluate("m*l", &vars)
            .unwrap();
        assert!(lenient.is_dimensionless());
        assert!(approx(lenient.value(), 6.0));
    }

    #[test]
    fn test_pow_and_negation() {
        let v = eval("-2^2", &HashMap::new()).unwrap();
        assert!(approx(v.value(), -4.0));
        let v = eval("2^-1", &HashMap::new()).unwrap();
        assert!(approx(v.value(), 0.5));
        assert!(matches!(eval("2^1mm", &HashMap::new()), Err(VariableError::Domain(_))));
    }

    #[test]
    fn test_trig_takes_angles() {
        let v = eval("sin(90deg)", &HashMap::new()).unwrap();
        assert!(approx(v.value(), 1.0));
        let v = eval("cos(pi)", &HashMap::new()).unwrap();
        assert!(approx(v.value(), -1.0));
        let angle = eval("atan(1)", &HashMap::new()).unwrap();
        assert_eq!(angle.unit_system(), UnitSystem::Angle);
        assert!(approx(angle.value(), PI / 4.0));
        assert!(matches!(eval("sin(1mm)", &HashMap::new()), Err(VariableError::Domain(_))));
    }

    #[test]
    fn test_functions_check_domain_and_arity() {
        assert!(approx(eval("sqrt(16)", &HashMap::new()).unwrap().value(), 4.0));
        assert!(matches!(eval("sqrt(-1)", &HashMap::new()), Err(VariableError::Domain(_))));
        assert!(matches!(eval("ln(0)", &HashMap::new()), Err(VariableError::Domain(_))));
        assert!(matches!(eval("asin(2)", &HashMap::new()), Err(VariableError::Domain(_))));
        assert_eq!(
            eval("sqrt(1, 2)", &HashMap::new()).unwrap_err(),
            VariableError::ArgCount { function: "sqrt".to_string(), expected: "1".to_string(), got: 2 }
        );
        assert_eq!(
            eval("frobnicate(1)", &HashMap::new()).unwrap_err(),
            VariableError::UnknownFunction("frobnicate".to_string())
        );
    }

    #[test]
    fn test_min_max_compare_in_si() {
        let v = eval("max(1in, 20mm)", &HashMap::new()).unwrap();
        assert_eq!(v.units(), "in");
        let v = eval("min(1in, 20mm, 3cm)", &HashMap::new()).unwrap();
        assert_eq!(v.units(), "mm");
        assert!(matches!(
            eval("max(1in, 2s)", &HashMap::new()),
            Err(VariableError::UnitSystemMismatch { operation: "compare", .. })
        ));
    }

    #[test]
    fn test_abs_keeps_units() {
        assert_eq!(eval("abs(-3mm)", &HashMap::new()).unwrap().evaluated_value(), "3mm");
    }

    #[test]
    fn test_dependencies_skip_constants() {
        let expr = parse_expr("2*pi*r + max(r, $h)").unwrap();
        assert_eq!(dependencies(&expr), vec!["r", "$h"]);
    }

    #[test]
    fn test_bound_name_shadows_constant() {
        let vars = bindings(&[("pi", "3")]);
        assert!(approx(eval("pi", &vars).unwrap().value(), 3.0));
        assert!(approx(Evaluator::new().evaluate("pi", &NoBindings).unwrap().value(), PI));
    }
}
