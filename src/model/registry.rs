use super::error::ModelError;
use super::types::*;
use crate::units::{UnitDefinition, UnitKind};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;

fn default_level() -> u32 {
    3
}

fn default_version() -> u32 {
    2
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Slot {
    Compartment(usize),
    Species(usize),
    Parameter(usize),
    Reaction(usize),
}

/// Lookup tables keyed by identifier.
#[derive(Debug, Clone, Default)]
struct ModelIndex {
    symbols: HashMap<String, Slot>,
    rules: HashMap<String, usize>,
    initial_assignments: HashMap<String, usize>,
    functions: HashMap<String, usize>,
    unit_definitions: HashMap<String, usize>,
}

/// The model store that expressions are evaluated against.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Model {
    #[serde(default)]
    pub id: String,
    #[serde(default = "default_level")]
    pub level: u32,
    #[serde(default = "default_version")]
    pub version: u32,
    #[serde(default)]
    pub time_units: Option<String>,
    #[serde(default)]
    pub extent_units: Option<String>,

    #[serde(default)]
    pub unit_definitions: Vec<UnitDefinitionDecl>,
    #[serde(default)]
    pub compartments: Vec<Quantity>,
    #[serde(default)]
    pub species: Vec<Quantity>,
    #[serde(default)]
    pub parameters: Vec<Quantity>,
    #[serde(default)]
    pub reactions: Vec<Reaction>,
    #[serde(default)]
    pub assignment_rules: Vec<AssignmentRule>,
    #[serde(default)]
    pub initial_assignments: Vec<InitialAssignment>,
    #[serde(default)]
    pub function_definitions: Vec<FunctionDefinition>,

    // Ephemeral lookup state (Not serialized, rebuilt on load)
    #[serde(skip)]
    index: ModelIndex,
}

impl Default for Model {
    fn default() -> Self {
        Self::new(default_level(), default_version())
    }
}

impl Model {
    pub fn new(level: u32, version: u32) -> Self {
        Self {
            id: String::new(),
            level,
            version,
            time_units: None,
            extent_units: None,
            unit_definitions: Vec::new(),
            compartments: Vec::new(),
            species: Vec::new(),
            parameters: Vec::new(),
            reactions: Vec::new(),
            assignment_rules: Vec::new(),
            initial_assignments: Vec::new(),
            function_definitions: Vec::new(),
            index: ModelIndex::default(),
        }
    }

    pub fn from_json_str(json: &str) -> Result<Self, ModelError> {
        let mut model: Model = serde_json::from_str(json)?;
        model.rebuild_index()?;
        Ok(model)
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ModelError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }

    /// Rebuilds the lookup tables after deserialization or mutation.
    ///
    /// Fails on duplicate identifiers and on equations whose target is not declared.
    pub fn rebuild_index(&mut self) -> Result<(), ModelError> {
        let mut index = ModelIndex::default();

        let slots = self
            .compartments
            .iter()
            .enumerate()
            .map(|(i, q)| (&q.id, Slot::Compartment(i)))
            .chain(self.species.iter().enumerate().map(|(i, q)| (&q.id, Slot::Species(i))))
            .chain(self.parameters.iter().enumerate().map(|(i, q)| (&q.id, Slot::Parameter(i))))
            .chain(self.reactions.iter().enumerate().map(|(i, r)| (&r.id, Slot::Reaction(i))));
        for (id, slot) in slots {
            if index.symbols.insert(id.clone(), slot).is_some() {
                return Err(ModelError::DuplicateId(id.clone()));
            }
        }

        for (i, rule) in self.assignment_rules.iter().enumerate() {
            if !index.symbols.contains_key(&rule.variable) {
                return Err(ModelError::UnknownVariable(rule.variable.clone()));
            }
            if index.rules.insert(rule.variable.clone(), i).is_some() {
                return Err(ModelError::DuplicateId(rule.variable.clone()));
            }
        }
        for (i, ia) in self.initial_assignments.iter().enumerate() {
            if !index.symbols.contains_key(&ia.symbol) {
                return Err(ModelError::UnknownVariable(ia.symbol.clone()));
            }
            if index.initial_assignments.insert(ia.symbol.clone(), i).is_some() {
                return Err(ModelError::DuplicateId(ia.symbol.clone()));
            }
        }
        for (i, f) in self.function_definitions.iter().enumerate() {
            if index.symbols.contains_key(&f.id) || index.functions.insert(f.id.clone(), i).is_some() {
                return Err(ModelError::DuplicateId(f.id.clone()));
            }
        }
        for (i, u) in self.unit_definitions.iter().enumerate() {
            if index.unit_definitions.insert(u.id.clone(), i).is_some() {
                return Err(ModelError::DuplicateId(u.id.clone()));
            }
        }

        self.index = index;
        Ok(())
    }

    pub fn symbol(&self, id: &str) -> Option<Symbol<'_>> {
        let slot = self.index.symbols.get(id)?;
        Some(match *slot {
            Slot::Compartment(i) => Symbol::Quantity(&self.compartments[i]),
            Slot::Species(i) => Symbol::Quantity(&self.species[i]),
            Slot::Parameter(i) => Symbol::Quantity(&self.parameters[i]),
            Slot::Reaction(i) => Symbol::Reaction(&self.reactions[i]),
        })
    }

    pub fn quantity(&self, id: &str) -> Option<&Quantity> {
        match self.symbol(id)? {
            Symbol::Quantity(q) => Some(q),
            Symbol::Reaction(_) => None,
        }
    }

    pub fn reaction(&self, id: &str) -> Option<&Reaction> {
        match self.symbol(id)? {
            Symbol::Reaction(r) => Some(r),
            Symbol::Quantity(_) => None,
        }
    }

    pub fn assignment_rule(&self, variable: &str) -> Option<&AssignmentRule> {
        self.index.rules.get(variable).map(|&i| &self.assignment_rules[i])
    }

    pub fn initial_assignment(&self, symbol: &str) -> Option<&InitialAssignment> {
        self.index
            .initial_assignments
            .get(symbol)
            .map(|&i| &self.initial_assignments[i])
    }

    pub fn function_definition(&self, id: &str) -> Option<&FunctionDefinition> {
        self.index.functions.get(id).map(|&i| &self.function_definitions[i])
    }

    pub fn unit_definition(&self, id: &str) -> Option<&UnitDefinition> {
        self.index
            .unit_definitions
            .get(id)
            .map(|&i| &self.unit_definitions[i].units)
    }

    /// Resolves a unit token: built-in kinds first, then the model's own unit definitions.
    pub fn resolve_units(&self, token: &str) -> Option<UnitDefinition> {
        if let Some(kind) = UnitKind::from_token(token, self.level, self.version) {
            return Some(UnitDefinition::of_kind(kind));
        }
        self.unit_definition(token.trim()).map(UnitDefinition::simplify)
    }

    /// The model's declared time unit, `second` when none is declared or it cannot be resolved.
    pub fn time_units_definition(&self) -> UnitDefinition {
        self.time_units
            .as_deref()
            .and_then(|t| self.resolve_units(t))
            .unwrap_or_else(|| UnitDefinition::of_kind(UnitKind::Second))
    }

    /// The unit of a quantity or reaction rate, `None` when it cannot be determined.
    pub fn derived_units(&self, id: &str) -> Option<UnitDefinition> {
        match self.symbol(id)? {
            Symbol::Quantity(q) => q.units.as_deref().and_then(|u| self.resolve_units(u)),
            Symbol::Reaction(r) => self.reaction_units(r),
        }
    }

    fn reaction_units(&self, reaction: &Reaction) -> Option<UnitDefinition> {
        if let Some(token) = reaction.units.as_deref() {
            return self.resolve_units(token);
        }
        let extent = self.resolve_units(self.extent_units.as_deref()?)?;
        Some(extent.divide(&self.time_units_definition()))
    }

    /// Every definition equation in the model as `(target, math, locals)`.
    ///
    /// Assignment rules first, then initial assignments, then kinetic laws keyed by
    /// reaction id. Only kinetic laws carry local parameters.
    pub fn equations(&self) -> Vec<(&str, &crate::ast::MathNode, &[LocalParameter])> {
        let rules = self
            .assignment_rules
            .iter()
            .map(|r| (r.variable.as_str(), &r.math, &[][..]));
        let initials = self
            .initial_assignments
            .iter()
            .map(|ia| (ia.symbol.as_str(), &ia.math, &[][..]));
        let laws = self.reactions.iter().filter_map(|r| {
            r.kinetic_law
                .as_ref()
                .map(|k| (r.id.as_str(), &k.math, k.local_parameters.as_slice()))
        });
        rules.chain(initials).chain(laws).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const MODEL: &str = r#"{
        "id": "m",
        "time_units": "hour",
        "extent_units": "mole",
        "unit_definitions": [
            {"id": "hour", "units": [{"kind": "second", "multiplier": 3600}]},
            {"id": "mM", "units": [{"kind": "mole", "scale": -3}, {"kind": "litre", "exponent": -1}]}
        ],
        "compartments": [{"id": "cell", "value": 1.0, "units": "litre"}],
        "species": [{"id": "S", "units": "mM"}],
        "parameters": [{"id": "k", "value": 0.1, "units": "hour"}],
        "reactions": [{"id": "R1", "kinetic_law": {"math": {"kind": "name", "id": "k"}}}],
        "assignment_rules": [{"variable": "S", "math": {"kind": "real", "value": 1.0}}]
    }"#;

    #[test]
    fn test_index_lookups() {
        let model = Model::from_json_str(MODEL).unwrap();
        assert_eq!(model.level, 3);
        assert_eq!(model.version, 2);
        assert!(model.quantity("cell").is_some());
        assert!(model.reaction("R1").is_some());
        assert!(model.quantity("R1").is_none());
        assert!(model.assignment_rule("S").is_some());
        assert!(model.initial_assignment("S").is_none());
        let equations = model.equations();
        assert_eq!(equations.len(), 2);
        assert_eq!((equations[1].0, equations[1].2.len()), ("R1", 0));
    }

    #[test]
    fn test_unit_resolution() {
        let model = Model::from_json_str(MODEL).unwrap();
        assert_eq!(model.resolve_units("litre").unwrap().to_string(), "litre");
        assert_eq!(model.resolve_units("hour").unwrap().to_string(), "(3600 second)");
        assert!(model.resolve_units("furlong").is_none());
        assert_eq!(model.time_units_definition().to_string(), "(3600 second)");
        assert_eq!(model.derived_units("S").unwrap().to_string(), "litre^-1*(10^-3 mole)");
    }

    #[test]
    fn test_reaction_units_default_to_extent_per_time() {
        let model = Model::from_json_str(MODEL).unwrap();
        assert_eq!(model.derived_units("R1").unwrap().to_string(), "mole*(3600 second)^-1");
    }

    #[test]
    fn test_duplicate_id_rejected() {
        let json = r#"{"parameters": [{"id": "a"}], "species": [{"id": "a"}]}"#;
        assert!(matches!(Model::from_json_str(json), Err(ModelError::DuplicateId(id)) if id == "a"));
    }

    #[test]
    fn test_unknown_rule_target_rejected() {
        let json = r#"{"assignment_rules": [{"variable": "ghost", "math": {"kind": "integer", "value": 1}}]}"#;
        assert!(matches!(Model::from_json_str(json), Err(ModelError::UnknownVariable(_))));
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(MODEL.as_bytes()).unwrap();
        let model = Model::from_path(file.path()).unwrap();
        assert_eq!(model.id, "m");
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let result = Model::from_path(dir.path().join("absent.json"));
        assert!(matches!(result, Err(ModelError::Io(_))));
    }
}
