//! CSV datasets of swept variables and results
//!
//! Header cells carry the unit in brackets (`"freq [GHz]"`); every other
//! line is a row of numbers. Columns are stored in the unit of the header.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;
use regex::Regex;
use serde::{Serialize, Deserialize};
use aedt_units::UNITS;
use crate::{DatasetError, Variable};

static HEADER_CELL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?P<name>.*?)\s*\[(?P<units>[^\]]*)\]\s*$").expect("header cell pattern")
});

const SEPARATORS: &[char] = &[',', ';', '\t'];

/// Options for reading a dataset
#[derive(Debug, Clone)]
pub struct CsvOptions {
    /// Field separator; detected from the header line when `None`
    pub separator: Option<char>,
    /// Column units that replace the ones in the header
    pub units: HashMap<String, String>,
    /// Keep rows where every field is a number
    pub valid_solutions: bool,
    /// Keep rows with empty or non-numeric fields (read as NaN)
    pub invalid_solutions: bool,
}

impl Default for CsvOptions {
    fn default() -> Self {
        CsvOptions {
            separator: None,
            units: HashMap::new(),
            valid_solutions: true,
            invalid_solutions: false,
        }
    }
}

impl CsvOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn separator(mut self, separator: char) -> Self {
        self.separator = Some(separator);
        self
    }

    pub fn units(mut self, column: impl Into<String>, units: impl Into<String>) -> Self {
        self.units.insert(column.into(), units.into());
        self
    }

    pub fn valid_solutions(mut self, keep: bool) -> Self {
        self.valid_solutions = keep;
        self
    }

    pub fn invalid_solutions(mut self, keep: bool) -> Self {
        self.invalid_solutions = keep;
        self
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CsvDataset {
    path: Option<PathBuf>,
    header: Vec<String>,
    units: Vec<String>,
    columns: Vec<Vec<f64>>,
}

fn clean_field(field: &str) -> &str {
    field.trim().trim_matches('"').trim_matches('\'').trim()
}

fn detect_separator(line: &str) -> char {
    SEPARATORS
        .iter()
        .copied()
        .max_by_key(|sep| line.matches(*sep).count())
        .filter(|sep| line.contains(*sep))
        .unwrap_or(',')
}

fn parse_header_cell(cell: &str) -> (String, String) {
    let cell = clean_field(cell);
    match HEADER_CELL.captures(cell) {
        Some(caps) => (caps["name"].trim().to_string(), caps["units"].trim().to_string()),
        None => (cell.to_string(), String::new()),
    }
}

impl CsvDataset {
    /// Read a dataset from a file
    pub fn from_path(path: impl AsRef<Path>, options: &CsvOptions) -> Result<Self, DatasetError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| DatasetError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let mut dataset = Self::parse(&text, options)?;
        dataset.path = Some(path.to_path_buf());
        tracing::debug!(
            path = %path.display(),
            rows = dataset.number_of_rows(),
            columns = dataset.number_of_columns(),
            "dataset loaded"
        );
        Ok(dataset)
    }

    /// Parse dataset text
    pub fn parse(text: &str, options: &CsvOptions) -> Result<Self, DatasetError> {
        let mut lines = text
            .lines()
            .enumerate()
            .filter(|(_, line)| !line.trim().is_empty());

        let (_, header_line) = lines.next().ok_or(DatasetError::MissingHeader)?;
        let separator = options.separator.unwrap_or_else(|| detect_separator(header_line));

        let mut header = Vec::new();
        let mut units = Vec::new();
        for cell in header_line.split(separator) {
            let (name, cell_units) = parse_header_cell(cell);
            let cell_units = options.units.get(&name).cloned().unwrap_or(cell_units);
            UNITS.lookup(&cell_units)?;
            header.push(name);
            units.push(cell_units);
        }

        let mut columns = vec![Vec::new(); header.len()];
        let mut skipped = 0;
        for (index, line) in lines {
            let fields: Vec<&str> = line.split(separator).map(clean_field).collect();
            if fields.len() != header.len() {
                return Err(DatasetError::ColumnCount {
                    line: index + 1,
                    expected: header.len(),
                    found: fields.len(),
                });
            }
            let values: Vec<Option<f64>> = fields.iter().map(|f| f.parse::<f64>().ok()).collect();
            let valid = values.iter().all(Option::is_some);
            let keep = if valid { options.valid_solutions } else { options.invalid_solutions };
            if !keep {
                skipped += 1;
                continue;
            }
            for (column, value) in columns.iter_mut().zip(values) {
                column.push(value.unwrap_or(f64::NAN));
            }
        }
        if skipped > 0 {
            tracing::trace!(skipped, "rows filtered out");
        }

        Ok(CsvDataset { path: None, header, units, columns })
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn header(&self) -> &[String] {
        &self.header
    }

    pub fn number_of_columns(&self) -> usize {
        self.header.len()
    }

    pub fn number_of_rows(&self) -> usize {
        self.columns.first().map_or(0, Vec::len)
    }

    pub fn is_empty(&self) -> bool {
        self.header.is_empty()
    }

    fn index_of(&self, column: &str) -> Result<usize, DatasetError> {
        self.header
            .iter()
            .position(|name| name == column)
            .ok_or_else(|| DatasetError::UnknownColumn(column.to_string()))
    }

    /// Values of a column, in the column unit
    pub fn column(&self, column: &str) -> Result<&[f64], DatasetError> {
        Ok(&self.columns[self.index_of(column)?])
    }

    pub fn units_of(&self, column: &str) -> Result<&str, DatasetError> {
        Ok(&self.units[self.index_of(column)?])
    }

    /// One cell as a [`Variable`]
    pub fn variable_at(&self, column: &str, row: usize) -> Result<Variable, DatasetError> {
        let index = self.index_of(column)?;
        let value = self.columns[index]
            .get(row)
            .copied()
            .ok_or(DatasetError::RowOutOfRange { row, rows: self.number_of_rows() })?;
        let unit = UNITS.lookup(&self.units[index])?;
        Ok(Variable::with_unit(value, unit))
    }

    /// Convert a column to another unit of the same unit system
    pub fn rescale_column(&mut self, column: &str, units: &str) -> Result<(), DatasetError> {
        let index = self.index_of(column)?;
        let from = UNITS.lookup(&self.units[index])?;
        let to = UNITS.lookup(units)?;
        // Fails on a system mismatch before any value is touched
        from.convert_to(0.0, to)?;
        for value in self.columns[index].iter_mut() {
            *value = to.from_si(from.to_si(*value));
        }
        self.units[index] = to.symbol.to_string();
        Ok(())
    }

    /// Append the rows of another dataset with the same column names
    ///
    /// Values are converted to this dataset's column units. An empty
    /// dataset takes over the other one's columns.
    pub fn extend(&mut self, other: &CsvDataset) -> Result<(), DatasetError> {
        if self.is_empty() {
            let path = self.path.take();
            *self = other.clone();
            self.path = path.or_else(|| other.path.clone());
            return Ok(());
        }
        if self.header != other.header {
            return Err(DatasetError::HeaderMismatch {
                left: self.header.clone(),
                right: other.header.clone(),
            });
        }
        let mut converted = Vec::with_capacity(self.header.len());
        for index in 0..self.header.len() {
            let from = UNITS.lookup(&other.units[index])?;
            let to = UNITS.lookup(&self.units[index])?;
            let column = other.columns[index]
                .iter()
                .map(|value| from.convert_to(*value, to))
                .collect::<Result<Vec<_>, _>>()?;
            converted.push(column);
        }
        for (column, rows) in self.columns.iter_mut().zip(converted) {
            column.extend(rows);
        }
        Ok(())
    }

    pub fn concat(mut self, other: &CsvDataset) -> Result<Self, DatasetError> {
        self.extend(other)?;
        Ok(self)
    }
}

impl std::ops::Mul<f64> for CsvDataset {
    type Output = CsvDataset;

    /// Scale every value of every column
    fn mul(mut self, rhs: f64) -> CsvDataset {
        for column in self.columns.iter_mut() {
            for value in column.iter_mut() {
                *value *= rhs;
            }
        }
        self
    }
}
