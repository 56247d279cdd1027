//! Unit systems
//!
//! A unit system is the category of physical quantity a unit measures
//! (Length, Power, Temperature, ...). Every quantity is stored internally in
//! the SI unit of its system.

use std::fmt;
use std::str::FromStr;
use serde::{Serialize, Deserialize};
use crate::UnitError;

/// Category of physical quantity, named as AEDT names it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum UnitSystem {
    AngularSpeed,
    Angle,
    Capacitance,
    Conductance,
    Current,
    Force,
    Freq,
    Inductance,
    Length,
    Mass,
    /// Pure numbers, optionally with an engineering prefix ("k", "meg", ...)
    #[serde(rename = "None")]
    Dimensionless,
    Power,
    Pressure,
    Resistance,
    Speed,
    Temperature,
    Time,
    Torque,
    Voltage,
}

impl UnitSystem {
    pub const ALL: [UnitSystem; 19] = [
        UnitSystem::AngularSpeed,
        UnitSystem::Angle,
        UnitSystem::Capacitance,
        UnitSystem::Conductance,
        UnitSystem::Current,
        UnitSystem::Force,
        UnitSystem::Freq,
        UnitSystem::Inductance,
        UnitSystem::Length,
        UnitSystem::Mass,
        UnitSystem::Dimensionless,
        UnitSystem::Power,
        UnitSystem::Pressure,
        UnitSystem::Resistance,
        UnitSystem::Speed,
        UnitSystem::Temperature,
        UnitSystem::Time,
        UnitSystem::Torque,
        UnitSystem::Voltage,
    ];

    /// Name used by AEDT for this unit system
    pub fn name(&self) -> &'static str {
        match self {
            UnitSystem::AngularSpeed => "AngularSpeed",
            UnitSystem::Angle => "Angle",
            UnitSystem::Capacitance => "Capacitance",
            UnitSystem::Conductance => "Conductance",
            UnitSystem::Current => "Current",
            UnitSystem::Force => "Force",
            UnitSystem::Freq => "Freq",
            UnitSystem::Inductance => "Inductance",
            UnitSystem::Length => "Length",
            UnitSystem::Mass => "Mass",
            UnitSystem::Dimensionless => "None",
            UnitSystem::Power => "Power",
            UnitSystem::Pressure => "Pressure",
            UnitSystem::Resistance => "Resistance",
            UnitSystem::Speed => "Speed",
            UnitSystem::Temperature => "Temperature",
            UnitSystem::Time => "Time",
            UnitSystem::Torque => "Torque",
            UnitSystem::Voltage => "Voltage",
        }
    }

    /// Symbol of the SI unit every magnitude of this system is stored in
    pub fn si_unit(&self) -> &'static str {
        match self {
            UnitSystem::AngularSpeed => "rad_per_sec",
            UnitSystem::Angle => "rad",
            UnitSystem::Capacitance => "F",
            UnitSystem::Conductance => "Sie",
            UnitSystem::Current => "A",
            UnitSystem::Force => "newton",
            UnitSystem::Freq => "Hz",
            UnitSystem::Inductance => "H",
            UnitSystem::Length => "meter",
            UnitSystem::Mass => "kg",
            UnitSystem::Dimensionless => "",
            UnitSystem::Power => "W",
            UnitSystem::Pressure => "n_per_meter_sq",
            UnitSystem::Resistance => "ohm",
            UnitSystem::Speed => "m_per_sec",
            UnitSystem::Temperature => "kel",
            UnitSystem::Time => "s",
            UnitSystem::Torque => "NewtonMeter",
            UnitSystem::Voltage => "V",
        }
    }

    pub fn is_dimensionless(&self) -> bool {
        matches!(self, UnitSystem::Dimensionless)
    }
}

impl fmt::Display for UnitSystem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl FromStr for UnitSystem {
    type Err = UnitError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s == "Dimensionless" {
            return Ok(UnitSystem::Dimensionless);
        }
        UnitSystem::ALL
            .iter()
            .find(|system| system.name() == s)
            .copied()
            .ok_or_else(|| UnitError::UnknownUnitSystem(s.to_string()))
    }
}

impl Default for UnitSystem {
    fn default() -> Self {
        UnitSystem::Dimensionless
    }
}
