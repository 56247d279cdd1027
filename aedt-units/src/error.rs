//! Errors raised while resolving or converting units

use thiserror::Error;
use crate::UnitSystem;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum UnitError {
    #[error("unknown unit: '{0}'")]
    UnknownUnit(String),

    #[error("unknown unit system: '{0}'")]
    UnknownUnitSystem(String),

    #[error("cannot convert {from} ({from_system}) to {to} ({to_system}): unit systems differ")]
    IncompatibleSystems {
        from: String,
        from_system: UnitSystem,
        to: String,
        to_system: UnitSystem,
    },

    #[error("no unit system results from {left} {operation} {right}")]
    UnsupportedCombination {
        left: UnitSystem,
        operation: crate::Operation,
        right: UnitSystem,
    },
}
