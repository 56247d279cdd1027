//! Unit representation with conversion to and from SI

use std::fmt;
use crate::{UnitError, UnitSystem};

/// How a unit maps onto the SI unit of its system
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Scale {
    /// value_si = value * factor
    Factor(f64),
    /// Non-linear units (temperature offsets, decibels)
    Function {
        to_si: fn(f64) -> f64,
        from_si: fn(f64) -> f64,
    },
}

/// A unit symbol together with its unit system and SI conversion
#[derive(Debug, Clone, PartialEq)]
pub struct Unit {
    /// The unit symbol as AEDT writes it (e.g. "mm", "dBm", "cel")
    pub symbol: &'static str,
    /// Human-readable name
    pub name: &'static str,
    pub system: UnitSystem,
    pub scale: Scale,
}

impl Unit {
    /// Create a unit with a multiplicative SI factor
    pub fn new(symbol: &'static str, name: &'static str, system: UnitSystem, factor: f64) -> Self {
        Unit { symbol, name, system, scale: Scale::Factor(factor) }
    }

    /// Create a unit converted through a forward/inverse function pair
    pub fn with_functions(
        symbol: &'static str,
        name: &'static str,
        system: UnitSystem,
        to_si: fn(f64) -> f64,
        from_si: fn(f64) -> f64,
    ) -> Self {
        Unit { symbol, name, system, scale: Scale::Function { to_si, from_si } }
    }

    /// Check if this is the SI unit of its system
    pub fn is_si(&self) -> bool {
        self.symbol == self.system.si_unit()
    }

    /// Check if conversion is a plain multiplication
    pub fn is_linear(&self) -> bool {
        matches!(self.scale, Scale::Factor(_))
    }

    pub fn is_compatible(&self, other: &Unit) -> bool {
        self.system == other.system
    }

    /// Convert a value expressed in this unit to the SI unit
    pub fn to_si(&self, value: f64) -> f64 {
        match self.scale {
            Scale::Factor(factor) => value * factor,
            Scale::Function { to_si, .. } => to_si(value),
        }
    }

    /// Convert an SI value to this unit
    pub fn from_si(&self, value_si: f64) -> f64 {
        match self.scale {
            Scale::Factor(factor) => value_si / factor,
            Scale::Function { from_si, .. } => from_si(value_si),
        }
    }

    /// Convert a value from this unit to another unit of the same system
    pub fn convert_to(&self, value: f64, target: &Unit) -> Result<f64, UnitError> {
        if !self.is_compatible(target) {
            return Err(UnitError::IncompatibleSystems {
                from: self.symbol.to_string(),
                from_system: self.system,
                to: target.symbol.to_string(),
                to_system: target.system,
            });
        }
        Ok(target.from_si(self.to_si(value)))
    }
}

impl fmt::Display for Unit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.symbol)
    }
}
