//! AEDT Units - engineering unit systems for design variables
//!
//! Every unit symbol AEDT understands belongs to exactly one unit system
//! and maps onto the SI unit of that system, either by a scale factor or,
//! for temperatures and decibels, by a pair of conversion functions.
//!
//! Unit systems:
//! - Length (meter, mm, mil, in, ...)
//! - Time, Freq, Angle, AngularSpeed, Speed
//! - Mass, Force, Torque, Pressure
//! - Voltage, Current, Power (including dBV, dBA, dBm, dBW)
//! - Resistance, Conductance, Capacitance, Inductance
//! - Temperature (kel, cel, fah)
//! - None (pure numbers with engineering prefixes)

mod error;
mod system;
mod unit;
mod units;
mod operations;
mod decompose;
pub mod convert;

pub use error::UnitError;
pub use system::UnitSystem;
pub use unit::{Unit, Scale};
pub use units::{UNITS, UnitRegistry, unit_system};
pub use operations::{
    Operation, CombinationPolicy, resolve_unit_system, resolve_si_unit, combine,
};
pub use decompose::{
    Magnitude, decompose_variable_value, decompose_with_variables,
    find_units_in_dependent_variables, referenced_names, parse_number, is_number,
};
