//! AEDT Variables - unit-aware design variables and expressions
//!
//! A [`Variable`] is a number with an AEDT unit (`"4mm"`, `"10dBm"`,
//! `"2.5GHz"`). Arithmetic between variables tracks unit systems, so a
//! current times a voltage is a power. [`Expression`]s are evaluated
//! locally against named variables, and a [`VariableManager`] keeps a set
//! of definitions consistent as they change.
//!
//! ```
//! use aedt_variables::{Variable, UnitSystem};
//!
//! let current: Variable = "3mA".parse().unwrap();
//! let voltage: Variable = "40V".parse().unwrap();
//! let power = current.mul(&voltage).unwrap();
//! assert_eq!(power.unit_system(), UnitSystem::Power);
//! assert_eq!(power.evaluated_value(), "0.12W");
//! ```

mod error;
mod format;
mod variable;
mod expression;
pub mod ast;
pub mod parser;
pub mod eval;
mod manager;
mod dataset;

pub use error::{VariableError, DatasetError};
pub use format::{FormatSpec, FormatKind, clean_number};
pub use variable::Variable;
pub use expression::Expression;
pub use eval::{Bindings, Evaluator, NoBindings};
pub use manager::{
    VariableManager, ManagerSettings, VariableOptions, VariableEntry, Definition, Snapshot,
};
pub use dataset::{CsvDataset, CsvOptions};

pub use aedt_units::{CombinationPolicy, Operation, Unit, UnitError, UnitSystem, UNITS};
