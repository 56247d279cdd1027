//! Non-linear conversions and symbol-level conversion helpers
//!
//! Temperature and decibel units cannot be expressed as an SI factor. Each
//! one is a forward (to SI) / inverse (from SI) function pair registered in
//! the unit tables.

use crate::units::UNITS;
use crate::UnitError;

const KELVIN_OFFSET: f64 = 273.15;

pub fn cel_to_kel(value: f64) -> f64 {
    value + KELVIN_OFFSET
}

pub fn kel_to_cel(value: f64) -> f64 {
    value - KELVIN_OFFSET
}

pub fn fah_to_kel(value: f64) -> f64 {
    (value - 32.0) * 5.0 / 9.0 + KELVIN_OFFSET
}

pub fn kel_to_fah(value: f64) -> f64 {
    (value - KELVIN_OFFSET) * 9.0 / 5.0 + 32.0
}

/// dBm -> W
pub fn dbm_to_watt(value: f64) -> f64 {
    10f64.powf(value / 10.0) / 1000.0
}

/// W -> dBm
pub fn watt_to_dbm(value: f64) -> f64 {
    10.0 * value.log10() + 30.0
}

/// Power ratio in dB -> linear
pub fn db10_to_linear(value: f64) -> f64 {
    10f64.powf(value / 10.0)
}

pub fn linear_to_db10(value: f64) -> f64 {
    10.0 * value.log10()
}

/// Field (voltage, current) ratio in dB -> linear
pub fn db20_to_linear(value: f64) -> f64 {
    10f64.powf(value / 20.0)
}

pub fn linear_to_db20(value: f64) -> f64 {
    20.0 * value.log10()
}

/// Convert a value between two unit symbols of the same unit system
pub fn convert(value: f64, from: &str, to: &str) -> Result<f64, UnitError> {
    let from_unit = UNITS.lookup(from)?;
    let to_unit = UNITS.lookup(to)?;
    from_unit.convert_to(value, to_unit)
}

/// Express a value given in `units` in the SI unit of its system
pub fn to_si(value: f64, units: &str) -> Result<f64, UnitError> {
    Ok(UNITS.lookup(units)?.to_si(value))
}
