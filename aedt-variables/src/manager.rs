//! Variable manager
//!
//! Holds the design and project variables of a design. Project variables
//! are named with a leading `$`. A variable is either independent (a
//! literal such as `4mm`) or dependent (an expression over other
//! variables). Updating a variable re-evaluates everything that depends on
//! it, in dependency order; a failing update leaves the manager unchanged.

use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet, VecDeque};
use std::sync::LazyLock;
use regex::Regex;
use serde::{Serialize, Deserialize};
use aedt_units::{decompose_variable_value, CombinationPolicy, UnitError};
use crate::eval::{dependencies, Bindings, Evaluator, CONSTANTS, FUNCTIONS};
use crate::parser::parse_expr;
use crate::{Expression, Variable, VariableError};

static NAME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\$?[A-Za-z_][A-Za-z0-9_]*$").expect("variable name pattern")
});

/// Manager configuration
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManagerSettings {
    /// How unit systems without a combination rule are treated
    pub policy: CombinationPolicy,
}

impl ManagerSettings {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_policy(mut self, policy: CombinationPolicy) -> Self {
        self.policy = policy;
        self
    }
}

/// Per-variable attributes
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VariableOptions {
    pub description: Option<String>,
    pub read_only: bool,
    pub hidden: bool,
}

impl VariableOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn read_only(mut self, read_only: bool) -> Self {
        self.read_only = read_only;
        self
    }

    pub fn hidden(mut self, hidden: bool) -> Self {
        self.hidden = hidden;
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Definition {
    /// A literal value
    Independent { text: String, variable: Variable },
    /// An expression and the variables it references
    Dependent { expression: Expression, dependencies: Vec<String> },
}

impl Definition {
    pub fn text(&self) -> &str {
        match self {
            Definition::Independent { text, .. } => text,
            Definition::Dependent { expression, .. } => expression.expression(),
        }
    }

    pub fn variable(&self) -> &Variable {
        match self {
            Definition::Independent { variable, .. } => variable,
            Definition::Dependent { expression, .. } => expression.variable(),
        }
    }

    pub fn dependencies(&self) -> &[String] {
        match self {
            Definition::Independent { .. } => &[],
            Definition::Dependent { dependencies, .. } => dependencies,
        }
    }

    pub fn is_independent(&self) -> bool {
        matches!(self, Definition::Independent { .. })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VariableEntry {
    pub name: String,
    pub definition: Definition,
    #[serde(flatten)]
    pub options: VariableOptions,
}

impl VariableEntry {
    pub fn is_project(&self) -> bool {
        is_project_name(&self.name)
    }

    pub fn variable(&self) -> &Variable {
        self.definition.variable()
    }

    /// Definition text, e.g. `"4mm"` or `"2*width"`
    pub fn expression(&self) -> &str {
        self.definition.text()
    }

    pub fn evaluated_value(&self) -> String {
        self.variable().evaluated_value()
    }
}

/// Serializable view of all variables
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    pub settings: ManagerSettings,
    pub variables: Vec<VariableEntry>,
}

#[derive(Debug, Clone, Default)]
pub struct VariableManager {
    entries: BTreeMap<String, VariableEntry>,
    settings: ManagerSettings,
}

fn is_project_name(name: &str) -> bool {
    name.starts_with('$')
}

/// Error for text that failed both as a literal and as an expression
fn literal_error(expression_error: VariableError, literal_error: VariableError) -> VariableError {
    match expression_error {
        VariableError::Parse { .. } | VariableError::Unit(UnitError::UnknownUnit(_)) => literal_error,
        other => other,
    }
}

fn validate_name(name: &str) -> Result<(), VariableError> {
    let bare = name.trim_start_matches('$');
    if !NAME.is_match(name) || FUNCTIONS.contains(&bare) || CONSTANTS.contains(&bare) {
        return Err(VariableError::InvalidName(name.to_string()));
    }
    Ok(())
}

impl VariableManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_settings(settings: ManagerSettings) -> Self {
        VariableManager { entries: BTreeMap::new(), settings }
    }

    pub fn settings(&self) -> ManagerSettings {
        self.settings
    }

    fn evaluator(&self) -> Evaluator {
        Evaluator::with_policy(self.settings.policy)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    pub fn get(&self, name: &str) -> Option<&VariableEntry> {
        self.entries.get(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &VariableEntry> {
        self.entries.values()
    }

    /// Evaluated value of a variable
    pub fn variable(&self, name: &str) -> Result<Variable, VariableError> {
        self.entries
            .get(name)
            .map(|entry| *entry.variable())
            .ok_or_else(|| VariableError::UndefinedVariable(name.to_string()))
    }

    /// Numeric value and unit of a variable
    pub fn decompose(&self, name: &str) -> Result<(f64, &'static str), VariableError> {
        Ok(self.variable(name)?.decompose())
    }

    /// Evaluate a literal or an expression over the current variables
    pub fn evaluate(&self, text: &str) -> Result<Variable, VariableError> {
        let (magnitude, _) = decompose_variable_value(text);
        if magnitude.is_number() {
            match Variable::parse(text) {
                // "2mm-1mm" decomposes as a number with unit "mm-1mm"
                Err(err @ VariableError::Unit(UnitError::UnknownUnit(_))) => {
                    return self.evaluator().evaluate(text, self).map_err(|e| literal_error(e, err));
                }
                result => return result,
            }
        }
        self.evaluator().evaluate(text, self)
    }

    /// Create or update a variable, keeping the options of an existing one
    pub fn set_variable(&mut self, name: &str, definition: &str) -> Result<&VariableEntry, VariableError> {
        let options = self
            .entries
            .get(name)
            .map(|entry| entry.options.clone())
            .unwrap_or_default();
        self.set_variable_with(name, definition, options)
    }

    pub fn set_variable_with(
        &mut self,
        name: &str,
        definition: &str,
        options: VariableOptions,
    ) -> Result<&VariableEntry, VariableError> {
        validate_name(name)?;
        if self.entries.get(name).is_some_and(|entry| entry.options.read_only) {
            return Err(VariableError::ReadOnly(name.to_string()));
        }

        let definition = self.define(name, definition)?;
        let entry = VariableEntry { name: name.to_string(), definition, options };

        let previous = self.entries.clone();
        self.entries.insert(name.to_string(), entry);
        if let Err(err) = self.reevaluate_dependents(name) {
            tracing::debug!(variable = name, error = %err, "update rejected, dependents failed to evaluate");
            self.entries = previous;
            return Err(err);
        }

        let entry = &self.entries[name];
        tracing::debug!(
            variable = name,
            definition = entry.expression(),
            value = %entry.evaluated_value(),
            "variable set"
        );
        Ok(entry)
    }

    fn define(&self, name: &str, text: &str) -> Result<Definition, VariableError> {
        let text = text.trim();
        let (magnitude, _) = decompose_variable_value(text);
        if magnitude.is_number() {
            match Variable::parse(text) {
                Ok(variable) => return Ok(Definition::Independent { text: text.to_string(), variable }),
                // Unspaced subtraction such as "3mm-w" reads as an unknown unit
                Err(err @ VariableError::Unit(UnitError::UnknownUnit(_))) => {
                    return self.define_dependent(name, text).map_err(|e| literal_error(e, err));
                }
                Err(err) => return Err(err),
            }
        }
        self.define_dependent(name, text)
    }

    fn define_dependent(&self, name: &str, text: &str) -> Result<Definition, VariableError> {
        let expr = parse_expr(text)?;
        let dependencies = dependencies(&expr);
        for dependency in &dependencies {
            if dependency == name {
                return Err(VariableError::CircularReference(vec![name.to_string(), dependency.clone()]));
            }
            if !self.entries.contains_key(dependency) {
                return Err(VariableError::UndefinedVariable(dependency.clone()));
            }
            if is_project_name(name) && !is_project_name(dependency) {
                return Err(VariableError::ScopeViolation {
                    name: name.to_string(),
                    dependency: dependency.clone(),
                });
            }
        }

        if let Some(cycle) = self.find_cycle(name, &dependencies) {
            return Err(VariableError::CircularReference(cycle));
        }

        let variable = self.evaluator().eval_expr(&expr, self)?;
        Ok(Definition::Dependent {
            expression: Expression::from_parts(text, variable),
            dependencies,
        })
    }

    /// Path `name -> ... -> name` if one of `dependencies` reaches `name`
    fn find_cycle(&self, name: &str, dependencies: &[String]) -> Option<Vec<String>> {
        let mut visited = HashSet::new();
        for dependency in dependencies {
            let mut path = vec![name.to_string()];
            if self.reaches(dependency, name, &mut path, &mut visited) {
                return Some(path);
            }
        }
        None
    }

    fn reaches(&self, from: &str, target: &str, path: &mut Vec<String>, visited: &mut HashSet<String>) -> bool {
        path.push(from.to_string());
        if from == target {
            return true;
        }
        if visited.insert(from.to_string()) {
            if let Some(entry) = self.entries.get(from) {
                for next in entry.definition.dependencies() {
                    if self.reaches(next, target, path, visited) {
                        return true;
                    }
                }
            }
        }
        path.pop();
        false
    }

    /// Variables whose definition references `name` directly
    pub fn dependents_of(&self, name: &str) -> Vec<String> {
        self.entries
            .values()
            .filter(|entry| entry.definition.dependencies().iter().any(|d| d == name))
            .map(|entry| entry.name.clone())
            .collect()
    }

    /// Re-evaluate every variable that depends on `name`, directly or not
    fn reevaluate_dependents(&mut self, name: &str) -> Result<(), VariableError> {
        let mut affected: BTreeSet<String> = BTreeSet::new();
        let mut queue: VecDeque<String> = self.dependents_of(name).into();
        while let Some(next) = queue.pop_front() {
            if affected.insert(next.clone()) {
                queue.extend(self.dependents_of(&next));
            }
        }
        if affected.is_empty() {
            return Ok(());
        }

        let dependencies: BTreeMap<String, Vec<String>> = affected
            .iter()
            .map(|n| {
                let within: Vec<String> = self.entries[n]
                    .definition
                    .dependencies()
                    .iter()
                    .filter(|d| affected.contains(*d))
                    .cloned()
                    .collect();
                (n.clone(), within)
            })
            .collect();
        let order = topological_sort(&dependencies).map_err(VariableError::CircularReference)?;

        for dependent in order {
            let text = self.entries[&dependent].expression().to_string();
            let variable = self.evaluator().evaluate(&text, self)?;
            if let Some(entry) = self.entries.get_mut(&dependent) {
                if let Definition::Dependent { expression, .. } = &mut entry.definition {
                    *expression = Expression::from_parts(&text, variable);
                }
            }
            tracing::trace!(variable = %dependent, value = %variable, "re-evaluated");
        }
        Ok(())
    }

    /// Remove a variable that nothing depends on
    pub fn delete_variable(&mut self, name: &str) -> Result<VariableEntry, VariableError> {
        let entry = self
            .entries
            .get(name)
            .ok_or_else(|| VariableError::UndefinedVariable(name.to_string()))?;
        if entry.options.read_only {
            return Err(VariableError::ReadOnly(name.to_string()));
        }
        let dependents = self.dependents_of(name);
        if !dependents.is_empty() {
            return Err(VariableError::InUse { name: name.to_string(), dependents });
        }
        tracing::debug!(variable = name, "variable deleted");
        self.entries
            .remove(name)
            .ok_or_else(|| VariableError::UndefinedVariable(name.to_string()))
    }

    /// Delete independent variables no other variable references
    ///
    /// Read-only variables are kept. Returns the deleted names.
    pub fn delete_unused_variables(&mut self) -> Vec<String> {
        let used: HashSet<String> = self
            .entries
            .values()
            .flat_map(|entry| entry.definition.dependencies().iter().cloned())
            .collect();
        let unused: Vec<String> = self
            .entries
            .values()
            .filter(|entry| entry.definition.is_independent())
            .filter(|entry| !entry.options.read_only && !used.contains(&entry.name))
            .map(|entry| entry.name.clone())
            .collect();
        for name in &unused {
            self.entries.remove(name);
        }
        if !unused.is_empty() {
            tracing::debug!(deleted = ?unused, "unused variables deleted");
        }
        unused
    }

    fn names_where(&self, predicate: impl Fn(&VariableEntry) -> bool) -> Vec<String> {
        self.entries
            .values()
            .filter(|entry| predicate(entry))
            .map(|entry| entry.name.clone())
            .collect()
    }

    pub fn variable_names(&self) -> Vec<String> {
        self.entries.keys().cloned().collect()
    }

    pub fn project_variable_names(&self) -> Vec<String> {
        self.names_where(|entry| entry.is_project())
    }

    pub fn design_variable_names(&self) -> Vec<String> {
        self.names_where(|entry| !entry.is_project())
    }

    pub fn independent_variable_names(&self) -> Vec<String> {
        self.names_where(|entry| entry.definition.is_independent())
    }

    pub fn dependent_variable_names(&self) -> Vec<String> {
        self.names_where(|entry| !entry.definition.is_independent())
    }

    /// Definition texts by name, as used for unit lookup in [`Expression::with_variables`]
    pub fn definitions(&self) -> HashMap<String, String> {
        self.entries
            .values()
            .map(|entry| (entry.name.clone(), entry.expression().to_string()))
            .collect()
    }

    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            settings: self.settings,
            variables: self.entries.values().cloned().collect(),
        }
    }

    /// Rebuild a manager from a snapshot, re-evaluating every definition
    pub fn from_snapshot(snapshot: &Snapshot) -> Result<Self, VariableError> {
        let mut manager = VariableManager::with_settings(snapshot.settings);
        let mut pending: Vec<&VariableEntry> = snapshot.variables.iter().collect();
        while !pending.is_empty() {
            let mut deferred = Vec::new();
            let mut last_error = None;
            for entry in pending.iter().copied() {
                match manager.set_variable_with(&entry.name, entry.expression(), entry.options.clone()) {
                    Ok(_) => {}
                    Err(err @ VariableError::UndefinedVariable(_)) => {
                        deferred.push(entry);
                        last_error = Some(err);
                    }
                    Err(err) => return Err(err),
                }
            }
            if deferred.len() == pending.len() {
                if let Some(err) = last_error {
                    return Err(err);
                }
            }
            pending = deferred;
        }
        Ok(manager)
    }
}

impl Bindings for VariableManager {
    fn lookup(&self, name: &str) -> Option<Variable> {
        self.entries.get(name).map(|entry| *entry.variable())
    }
}

/// Topological sort using Kahn's algorithm
/// Returns Ok(ordered names) or Err(names left in a cycle)
fn topological_sort(dependencies: &BTreeMap<String, Vec<String>>) -> Result<Vec<String>, Vec<String>> {
    let mut in_degree: BTreeMap<&str, usize> = BTreeMap::new();
    let mut reverse_deps: BTreeMap<&str, Vec<&str>> = BTreeMap::new();

    for name in dependencies.keys() {
        in_degree.entry(name).or_insert(0);
    }
    for (name, deps) in dependencies {
        for dep in deps {
            *in_degree.entry(name).or_insert(0) += 1;
            reverse_deps.entry(dep).or_default().push(name);
        }
    }

    let mut queue: VecDeque<&str> = in_degree
        .iter()
        .filter(|(_, &deg)| deg == 0)
        .map(|(name, _)| *name)
        .collect();

    let mut result = Vec::new();
    while let Some(node) = queue.pop_front() {
        result.push(node.to_string());
        if let Some(dependents) = reverse_deps.get(node) {
            for dependent in dependents {
                if let Some(deg) = in_degree.get_mut(dependent) {
                    *deg -= 1;
                    if *deg == 0 {
                        queue.push_back(dependent);
                    }
                }
            }
        }
    }

    if result.len() < dependencies.len() {
        let cycle = in_degree
            .iter()
            .filter(|(_, &deg)| deg > 0)
            .map(|(name, _)| name.to_string())
            .collect();
        Err(cycle)
    } else {
        Ok(result)
    }
}
