//! Unit tables: every AEDT unit symbol, grouped by unit system

use std::collections::HashMap;
use std::f64::consts::PI;
use std::sync::LazyLock;
use crate::convert::{
    cel_to_kel, db10_to_linear, db20_to_linear, dbm_to_watt, fah_to_kel, kel_to_cel, kel_to_fah,
    linear_to_db10, linear_to_db20, watt_to_dbm,
};
use crate::{Unit, UnitError, UnitSystem};

const DEG: f64 = PI / 180.0;
const INCH: f64 = 0.0254;

/// Global unit registry
pub static UNITS: LazyLock<UnitRegistry> = LazyLock::new(UnitRegistry::new);

/// Registry of all known units
pub struct UnitRegistry {
    units: HashMap<&'static str, Unit>,
    aliases: HashMap<&'static str, &'static str>,
    /// Registration order, for stable listings
    order: Vec<&'static str>,
    duplicates: Vec<&'static str>,
}

impl UnitRegistry {
    pub fn new() -> Self {
        let mut registry = UnitRegistry {
            units: HashMap::new(),
            aliases: HashMap::new(),
            order: Vec::new(),
            duplicates: Vec::new(),
        };
        registry.register_all_units();
        if !registry.duplicates.is_empty() {
            tracing::warn!(symbols = ?registry.duplicates, "unit symbols registered in more than one unit system");
        }
        registry
    }

    /// Get a unit by symbol or alias
    pub fn get(&self, symbol: &str) -> Option<&Unit> {
        if let Some(unit) = self.units.get(symbol) {
            return Some(unit);
        }
        self.aliases.get(symbol).and_then(|canonical| self.units.get(canonical))
    }

    /// Like [`get`](Self::get), but unknown symbols are an error
    pub fn lookup(&self, symbol: &str) -> Result<&Unit, UnitError> {
        self.get(symbol).ok_or_else(|| UnitError::UnknownUnit(symbol.to_string()))
    }

    /// Unit system a symbol belongs to
    pub fn system_of(&self, symbol: &str) -> Option<UnitSystem> {
        self.get(symbol).map(|unit| unit.system)
    }

    /// All units of a unit system, in table order
    pub fn by_system(&self, system: UnitSystem) -> Vec<&Unit> {
        self.order
            .iter()
            .filter_map(|symbol| self.units.get(symbol))
            .filter(|unit| unit.system == system)
            .collect()
    }

    /// SI unit of a unit system
    pub fn si_unit(&self, system: UnitSystem) -> &Unit {
        // Every system registers its SI symbol; checked by tests.
        &self.units[system.si_unit()]
    }

    /// All canonical unit symbols, in table order
    pub fn symbols(&self) -> Vec<&'static str> {
        self.order.clone()
    }

    /// Symbols that were registered twice (must be empty)
    pub fn duplicates(&self) -> &[&'static str] {
        &self.duplicates
    }

    fn register(&mut self, unit: Unit) {
        let symbol = unit.symbol;
        if self.units.insert(symbol, unit).is_some() {
            self.duplicates.push(symbol);
        } else {
            self.order.push(symbol);
        }
    }

    fn scaled(&mut self, system: UnitSystem, table: &[(&'static str, &'static str, f64)]) {
        for &(symbol, name, factor) in table {
            self.register(Unit::new(symbol, name, system, factor));
        }
    }

    fn alias(&mut self, alias: &'static str, symbol: &'static str) {
        self.aliases.insert(alias, symbol);
    }

    fn register_all_units(&mut self) {
        self.register_angular_speed_units();
        self.register_angle_units();
        self.register_capacitance_units();
        self.register_conductance_units();
        self.register_current_units();
        self.register_force_units();
        self.register_frequency_units();
        self.register_inductance_units();
        self.register_length_units();
        self.register_mass_units();
        self.register_dimensionless_units();
        self.register_power_units();
        self.register_pressure_units();
        self.register_resistance_units();
        self.register_speed_units();
        self.register_temperature_units();
        self.register_time_units();
        self.register_torque_units();
        self.register_voltage_units();
    }

    fn register_angular_speed_units(&mut self) {
        self.scaled(UnitSystem::AngularSpeed, &[
            ("deg_per_hr", "degree per hour", DEG / 3600.0),
            ("rad_per_hr", "radian per hour", 1.0 / 3600.0),
            ("deg_per_min", "degree per minute", DEG / 60.0),
            ("rad_per_min", "radian per minute", 1.0 / 60.0),
            ("deg_per_sec", "degree per second", DEG),
            ("rad_per_sec", "radian per second", 1.0),
            ("rev_per_sec", "revolution per second", 2.0 * PI),
            ("rpm", "revolution per minute", 2.0 * PI / 60.0),
        ]);
    }

    fn register_angle_units(&mut self) {
        self.scaled(UnitSystem::Angle, &[
            ("deg", "degree", DEG),
            ("rad", "radian", 1.0),
            ("degmin", "arcminute", DEG / 60.0),
            ("degsec", "arcsecond", DEG / 3600.0),
        ]);
    }

    fn register_capacitance_units(&mut self) {
        self.scaled(UnitSystem::Capacitance, &[
            ("fF", "femtofarad", 1e-15),
            ("pF", "picofarad", 1e-12),
            ("nF", "nanofarad", 1e-9),
            ("uF", "microfarad", 1e-6),
            ("mF", "millifarad", 1e-3),
            ("F", "farad", 1.0),
        ]);
    }

    fn register_conductance_units(&mut self) {
        self.scaled(UnitSystem::Conductance, &[
            ("fSie", "femtosiemens", 1e-15),
            ("pSie", "picosiemens", 1e-12),
            ("nSie", "nanosiemens", 1e-9),
            ("uSie", "microsiemens", 1e-6),
            ("mSie", "millisiemens", 1e-3),
            ("Sie", "siemens", 1.0),
            ("kSie", "kilosiemens", 1e3),
            ("megSie", "megasiemens", 1e6),
        ]);
        self.alias("S", "Sie");
    }

    fn register_current_units(&mut self) {
        self.scaled(UnitSystem::Current, &[
            ("fA", "femtoampere", 1e-15),
            ("pA", "picoampere", 1e-12),
            ("nA", "nanoampere", 1e-9),
            ("uA", "microampere", 1e-6),
            ("mA", "milliampere", 1e-3),
            ("A", "ampere", 1.0),
            ("kA", "kiloampere", 1e3),
            ("MegA", "megaampere", 1e6),
            ("gA", "gigaampere", 1e9),
        ]);
        self.register(Unit::with_functions(
            "dBA", "decibel ampere", UnitSystem::Current, db20_to_linear, linear_to_db20,
        ));
    }

    fn register_force_units(&mut self) {
        self.scaled(UnitSystem::Force, &[
            ("fNewton", "femtonewton", 1e-15),
            ("pNewton", "piconewton", 1e-12),
            ("nNewton", "nanonewton", 1e-9),
            ("uNewton", "micronewton", 1e-6),
            ("mNewton", "millinewton", 1e-3),
            ("newton", "newton", 1.0),
            ("kNewton", "kilonewton", 1e3),
            ("megNewton", "meganewton", 1e6),
            ("gNewton", "giganewton", 1e9),
            ("LbForce", "pound-force", 4.4482216152605),
            ("dyne", "dyne", 1e-5),
        ]);
        self.alias("N", "newton");
    }

    fn register_frequency_units(&mut self) {
        self.scaled(UnitSystem::Freq, &[
            ("Hz", "hertz", 1.0),
            ("kHz", "kilohertz", 1e3),
            ("MHz", "megahertz", 1e6),
            ("GHz", "gigahertz", 1e9),
            ("THz", "terahertz", 1e12),
            ("rps", "revolution per second", 1.0),
            ("per_sec", "per second", 1.0),
        ]);
    }

    fn register_inductance_units(&mut self) {
        self.scaled(UnitSystem::Inductance, &[
            ("fH", "femtohenry", 1e-15),
            ("pH", "picohenry", 1e-12),
            ("nH", "nanohenry", 1e-9),
            ("uH", "microhenry", 1e-6),
            ("mH", "millihenry", 1e-3),
            ("H", "henry", 1.0),
        ]);
    }

    fn register_length_units(&mut self) {
        self.scaled(UnitSystem::Length, &[
            ("fm", "femtometer", 1e-15),
            ("pm", "picometer", 1e-12),
            ("nm", "nanometer", 1e-9),
            ("um", "micrometer", 1e-6),
            ("mm", "millimeter", 1e-3),
            ("cm", "centimeter", 1e-2),
            ("dm", "decimeter", 1e-1),
            ("meter", "meter", 1.0),
            ("km", "kilometer", 1e3),
            ("uin", "microinch", INCH * 1e-6),
            ("mil", "mil", INCH * 1e-3),
            ("in", "inch", INCH),
            ("ft", "foot", INCH * 12.0),
            ("yd", "yard", INCH * 36.0),
        ]);
    }

    fn register_mass_units(&mut self) {
        self.scaled(UnitSystem::Mass, &[
            ("ug", "microgram", 1e-9),
            ("mg", "milligram", 1e-6),
            ("g", "gram", 1e-3),
            ("kg", "kilogram", 1.0),
            ("ton", "metric ton", 1e3),
            ("oz", "ounce", 0.028349523125),
            ("lb", "pound", 0.45359237),
        ]);
    }

    fn register_dimensionless_units(&mut self) {
        // Engineering prefixes on a pure number; "m" is milli, lengths use "meter".
        self.scaled(UnitSystem::Dimensionless, &[
            ("f", "femto", 1e-15),
            ("p", "pico", 1e-12),
            ("n", "nano", 1e-9),
            ("u", "micro", 1e-6),
            ("m", "milli", 1e-3),
            ("", "unitless", 1.0),
            ("k", "kilo", 1e3),
            ("meg", "mega", 1e6),
            ("G", "giga", 1e9),
            ("T", "tera", 1e12),
        ]);
    }

    fn register_power_units(&mut self) {
        self.scaled(UnitSystem::Power, &[
            ("fW", "femtowatt", 1e-15),
            ("pW", "picowatt", 1e-12),
            ("nW", "nanowatt", 1e-9),
            ("uW", "microwatt", 1e-6),
            ("mW", "milliwatt", 1e-3),
            ("W", "watt", 1.0),
            ("kW", "kilowatt", 1e3),
            ("megW", "megawatt", 1e6),
            ("gW", "gigawatt", 1e9),
            ("HP", "horsepower", 745.69987158227),
            ("Btu_per_hr", "BTU per hour", 0.29307107017222),
            ("Btu_per_sec", "BTU per second", 1055.05585262),
            ("erg_per_sec", "erg per second", 1e-7),
            ("ft_lb_per_sec", "foot-pound per second", 1.3558179483314),
            ("ft_lb_per_min", "foot-pound per minute", 1.3558179483314 / 60.0),
        ]);
        self.register(Unit::with_functions(
            "dBm", "decibel milliwatt", UnitSystem::Power, dbm_to_watt, watt_to_dbm,
        ));
        self.register(Unit::with_functions(
            "dBW", "decibel watt", UnitSystem::Power, db10_to_linear, linear_to_db10,
        ));
    }

    fn register_pressure_units(&mut self) {
        self.scaled(UnitSystem::Pressure, &[
            ("n_per_meter_sq", "pascal", 1.0),
            ("kn_per_meter_sq", "kilopascal", 1e3),
            ("megn_per_meter_sq", "megapascal", 1e6),
            ("gn_per_meter_sq", "gigapascal", 1e9),
            ("mbar", "millibar", 1e2),
            ("bar", "bar", 1e5),
            ("atm", "standard atmosphere", 101325.0),
            ("mTorr", "millitorr", 101325.0 / 760.0 / 1000.0),
            ("Torr", "torr", 101325.0 / 760.0),
            ("psi", "pound per square inch", 6894.757293168),
            ("kpsi", "kilopound per square inch", 6894757.293168),
        ]);
        self.alias("Pa", "n_per_meter_sq");
        self.alias("kPa", "kn_per_meter_sq");
        self.alias("MPa", "megn_per_meter_sq");
        self.alias("GPa", "gn_per_meter_sq");
    }

    fn register_resistance_units(&mut self) {
        self.scaled(UnitSystem::Resistance, &[
            ("uOhm", "microohm", 1e-6),
            ("mOhm", "milliohm", 1e-3),
            ("ohm", "ohm", 1.0),
            ("kOhm", "kiloohm", 1e3),
            ("megohm", "megaohm", 1e6),
            ("GOhm", "gigaohm", 1e9),
        ]);
        self.alias("Ohm", "ohm");
        self.alias("MOhm", "megohm");
    }

    fn register_speed_units(&mut self) {
        self.scaled(UnitSystem::Speed, &[
            ("mm_per_sec", "millimeter per second", 1e-3),
            ("cm_per_sec", "centimeter per second", 1e-2),
            ("m_per_sec", "meter per second", 1.0),
            ("km_per_sec", "kilometer per second", 1e3),
            ("inches_per_sec", "inch per second", INCH),
            ("feet_per_sec", "foot per second", INCH * 12.0),
            ("feet_per_min", "foot per minute", INCH * 12.0 / 60.0),
            ("km_per_min", "kilometer per minute", 1e3 / 60.0),
            ("m_per_h", "meter per hour", 1.0 / 3600.0),
            ("km_per_hr", "kilometer per hour", 1e3 / 3600.0),
            ("miles_per_hour", "mile per hour", 0.44704),
            ("miles_per_minute", "mile per minute", 26.8224),
            ("miles_per_sec", "mile per second", 1609.344),
        ]);
    }

    fn register_temperature_units(&mut self) {
        // Kelvin is the SI unit
        self.register(Unit::new("kel", "kelvin", UnitSystem::Temperature, 1.0));
        self.register(Unit::with_functions(
            "cel", "celsius", UnitSystem::Temperature, cel_to_kel, kel_to_cel,
        ));
        self.register(Unit::with_functions(
            "fah", "fahrenheit", UnitSystem::Temperature, fah_to_kel, kel_to_fah,
        ));
    }

    fn register_time_units(&mut self) {
        self.scaled(UnitSystem::Time, &[
            ("fs", "femtosecond", 1e-15),
            ("ps", "picosecond", 1e-12),
            ("ns", "nanosecond", 1e-9),
            ("us", "microsecond", 1e-6),
            ("ms", "millisecond", 1e-3),
            ("s", "second", 1.0),
            ("min", "minute", 60.0),
            ("hour", "hour", 3600.0),
            ("day", "day", 86400.0),
            ("week", "week", 604800.0),
        ]);
        self.alias("sec", "s");
    }

    fn register_torque_units(&mut self) {
        self.scaled(UnitSystem::Torque, &[
            ("fNewtonMeter", "femtonewton meter", 1e-15),
            ("pNewtonMeter", "piconewton meter", 1e-12),
            ("nNewtonMeter", "nanonewton meter", 1e-9),
            ("uNewtonMeter", "micronewton meter", 1e-6),
            ("mNewtonMeter", "millinewton meter", 1e-3),
            ("cNewtonMeter", "centinewton meter", 1e-2),
            ("NewtonMeter", "newton meter", 1.0),
            ("kNewtonMeter", "kilonewton meter", 1e3),
            ("megNewtonMeter", "meganewton meter", 1e6),
            ("gNewtonMeter", "giganewton meter", 1e9),
            ("OzInch", "ounce-force inch", 0.00706155183333),
            ("LbFoot", "pound-force foot", 1.3558179483314),
            ("LbInch", "pound-force inch", 0.1129848290276),
        ]);
    }

    fn register_voltage_units(&mut self) {
        self.scaled(UnitSystem::Voltage, &[
            ("fV", "femtovolt", 1e-15),
            ("pV", "picovolt", 1e-12),
            ("nV", "nanovolt", 1e-9),
            ("uV", "microvolt", 1e-6),
            ("mV", "millivolt", 1e-3),
            ("V", "volt", 1.0),
            ("kV", "kilovolt", 1e3),
            ("MegV", "megavolt", 1e6),
            ("gV", "gigavolt", 1e9),
        ]);
        self.register(Unit::with_functions(
            "dBV", "decibel volt", UnitSystem::Voltage, db20_to_linear, linear_to_db20,
        ));
    }
}

impl Default for UnitRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// Unit system of a unit symbol, `None` if the symbol is unknown
pub fn unit_system(symbol: &str) -> Option<UnitSystem> {
    UNITS.system_of(symbol)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_symbols_are_unique() {
        assert!(UNITS.duplicates().is_empty(), "duplicated: {:?}", UNITS.duplicates());
    }

    #[test]
    fn test_every_system_registers_its_si_unit() {
        for system in UnitSystem::ALL {
            let unit = UNITS.get(system.si_unit())
                .unwrap_or_else(|| panic!("missing SI unit for {}", system));
            assert_eq!(unit.system, system);
            assert!(unit.is_si());
            assert_eq!(unit.to_si(7.0), 7.0);
        }
    }

    #[test]
    fn test_aliases_do_not_shadow_symbols() {
        for alias in UNITS.aliases.keys() {
            assert!(!UNITS.units.contains_key(alias), "alias {} shadows a symbol", alias);
        }
    }

    #[test]
    fn test_unit_system_lookup() {
        assert_eq!(unit_system("mm"), Some(UnitSystem::Length));
        assert_eq!(unit_system("dBm"), Some(UnitSystem::Power));
        assert_eq!(unit_system("cel"), Some(UnitSystem::Temperature));
        assert_eq!(unit_system("m"), Some(UnitSystem::Dimensionless));
        assert_eq!(unit_system(""), Some(UnitSystem::Dimensionless));
        assert_eq!(unit_system("g"), Some(UnitSystem::Mass));
        assert_eq!(unit_system("furlong"), None);
    }

    #[test]
    fn test_alias_lookup() {
        assert_eq!(UNITS.get("Ohm").unwrap().symbol, "ohm");
        assert_eq!(UNITS.get("kPa").unwrap().symbol, "kn_per_meter_sq");
    }

    #[test]
    fn test_by_system_keeps_table_order() {
        let caps: Vec<&str> = UNITS.by_system(UnitSystem::Capacitance)
            .iter()
            .map(|u| u.symbol)
            .collect();
        assert_eq!(caps, vec!["fF", "pF", "nF", "uF", "mF", "F"]);
    }

    #[test]
    fn test_lookup_unknown() {
        assert_eq!(UNITS.lookup("xyz").unwrap_err(), UnitError::UnknownUnit("xyz".to_string()));
    }

    #[test]
    fn test_imperial_lengths() {
        let mil = UNITS.get("mil").unwrap();
        assert!((mil.to_si(1000.0) - 0.0254).abs() < 1e-15);
        let ft = UNITS.get("ft").unwrap();
        assert!((ft.to_si(1.0) - 0.3048).abs() < 1e-15);
    }

    #[test]
    fn test_si_unit_accessor() {
        assert_eq!(UNITS.si_unit(UnitSystem::Power).symbol, "W");
        assert_eq!(UNITS.si_unit(UnitSystem::Dimensionless).symbol, "");
    }
}
