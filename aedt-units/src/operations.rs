//! Unit system algebra for multiplication and division
//!
//! Multiplying or dividing two quantities yields a quantity whose unit
//! system comes from a fixed table of physical relations
//! (Power / Voltage = Current, Speed * Time = Length, ...).

use std::fmt;
use serde::{Serialize, Deserialize};
use crate::{UnitError, UnitSystem};
use crate::UnitSystem::*;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Operation {
    Multiply,
    Divide,
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operation::Multiply => write!(f, "*"),
            Operation::Divide => write!(f, "/"),
        }
    }
}

/// What to do when two unit systems combine into nothing the table knows
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum CombinationPolicy {
    /// Report [`UnitError::UnsupportedCombination`]
    #[default]
    Strict,
    /// Treat the result as a pure number
    Dimensionless,
}

const MULTIPLY: &[(UnitSystem, UnitSystem, UnitSystem)] = &[
    (Voltage, Current, Power),
    (Torque, AngularSpeed, Power),
    (AngularSpeed, Time, Angle),
    (Current, Resistance, Voltage),
    (AngularSpeed, Inductance, Resistance),
    (Speed, Time, Length),
    (Freq, Time, Dimensionless),
    (Voltage, Conductance, Current),
    (Resistance, Conductance, Dimensionless),
    (Force, Length, Torque),
    (Length, Freq, Speed),
];

const DIVIDE: &[(UnitSystem, UnitSystem, UnitSystem)] = &[
    (Power, Voltage, Current),
    (Power, Current, Voltage),
    (Power, AngularSpeed, Torque),
    (Power, Torque, AngularSpeed),
    (Angle, AngularSpeed, Time),
    (Angle, Time, AngularSpeed),
    (Voltage, Current, Resistance),
    (Voltage, Resistance, Current),
    (Current, Voltage, Conductance),
    (Resistance, AngularSpeed, Inductance),
    (Resistance, Inductance, AngularSpeed),
    (Dimensionless, Freq, Time),
    (Dimensionless, Time, Freq),
    (Length, Time, Speed),
    (Length, Speed, Time),
    (Torque, Length, Force),
    (Torque, Force, Length),
];

/// Unit system resulting from `left <operation> right`, if any
pub fn resolve_unit_system(left: UnitSystem, right: UnitSystem, operation: Operation) -> Option<UnitSystem> {
    match operation {
        Operation::Multiply => {
            if left == Dimensionless {
                return Some(right);
            }
            if right == Dimensionless {
                return Some(left);
            }
            MULTIPLY
                .iter()
                .find(|(a, b, _)| (*a == left && *b == right) || (*a == right && *b == left))
                .map(|(_, _, result)| *result)
        }
        Operation::Divide => {
            if left == right {
                return Some(Dimensionless);
            }
            if right == Dimensionless {
                return Some(left);
            }
            DIVIDE
                .iter()
                .find(|(a, b, _)| *a == left && *b == right)
                .map(|(_, _, result)| *result)
        }
    }
}

/// SI unit symbol of the resolved unit system
pub fn resolve_si_unit(left: UnitSystem, right: UnitSystem, operation: Operation) -> Option<&'static str> {
    resolve_unit_system(left, right, operation).map(|system| system.si_unit())
}

/// Resolve under a policy; `Strict` turns a missing rule into an error
pub fn combine(
    left: UnitSystem,
    right: UnitSystem,
    operation: Operation,
    policy: CombinationPolicy,
) -> Result<UnitSystem, UnitError> {
    match (resolve_unit_system(left, right, operation), policy) {
        (Some(system), _) => Ok(system),
        (None, CombinationPolicy::Dimensionless) => {
            tracing::debug!(%left, %operation, %right, "no unit system rule, result is dimensionless");
            Ok(Dimensionless)
        }
        (None, CombinationPolicy::Strict) => Err(UnitError::UnsupportedCombination {
            left,
            operation,
            right,
        }),
    }
}
