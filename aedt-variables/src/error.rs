//! Errors for variables, expressions and the variable manager

use std::path::PathBuf;
use aedt_units::{UnitError, UnitSystem};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum VariableError {
    #[error(transparent)]
    Unit(#[from] UnitError),

    #[error("'{0}' is not a numeric literal")]
    NotNumeric(String),

    #[error("unit '{specified}' is inconsistent with the unit '{found}' found in the value")]
    InconsistentUnits { specified: String, found: String },

    #[error("cannot {operation} {left} and {right}: unit systems differ")]
    UnitSystemMismatch {
        operation: &'static str,
        left: UnitSystem,
        right: UnitSystem,
    },

    #[error("division by zero")]
    DivisionByZero,

    #[error("domain error: {0}")]
    Domain(String),

    #[error("parse error at {position}: {message}")]
    Parse { position: usize, message: String },

    #[error("undefined variable: {0}")]
    UndefinedVariable(String),

    #[error("unknown function: {0}")]
    UnknownFunction(String),

    #[error("{function}() expects {expected} arguments, got {got}")]
    ArgCount { function: String, expected: String, got: usize },

    #[error("circular reference: {}", .0.join(" -> "))]
    CircularReference(Vec<String>),

    #[error("invalid variable name: '{0}'")]
    InvalidName(String),

    #[error("project variable '{name}' cannot reference design variable '{dependency}'")]
    ScopeViolation { name: String, dependency: String },

    #[error("variable '{0}' is read-only")]
    ReadOnly(String),

    #[error("variable '{name}' is used by {}", .dependents.join(", "))]
    InUse { name: String, dependents: Vec<String> },

    #[error("invalid format spec: '{0}'")]
    InvalidFormat(String),
}

impl VariableError {
    pub(crate) fn parse(position: usize, message: impl Into<String>) -> Self {
        VariableError::Parse { position, message: message.into() }
    }
}

#[derive(Debug, Error)]
pub enum DatasetError {
    #[error("cannot read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("dataset has no header row")]
    MissingHeader,

    #[error("line {line} has {found} fields, expected {expected}")]
    ColumnCount { line: usize, expected: usize, found: usize },

    #[error("unknown column: '{0}'")]
    UnknownColumn(String),

    #[error("row {row} out of range ({rows} rows)")]
    RowOutOfRange { row: usize, rows: usize },

    #[error("headers differ: {left:?} vs {right:?}")]
    HeaderMismatch { left: Vec<String>, right: Vec<String> },

    #[error(transparent)]
    Unit(#[from] UnitError),
}
