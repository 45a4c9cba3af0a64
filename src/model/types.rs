use crate::ast::MathNode;
use crate::units::UnitDefinition;
use serde::{Deserialize, Serialize};

/// A compartment, species, parameter or kinetic-law local parameter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Quantity {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub units: Option<String>,
}

pub type LocalParameter = Quantity;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KineticLaw {
    pub math: MathNode,
    #[serde(default)]
    pub local_parameters: Vec<LocalParameter>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reaction {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kinetic_law: Option<KineticLaw>,
    /// Explicit rate units; otherwise extent per time.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub units: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssignmentRule {
    pub variable: String,
    pub math: MathNode,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InitialAssignment {
    pub symbol: String,
    pub math: MathNode,
}

/// `math` is expected to be a `MathNode::Lambda`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunctionDefinition {
    pub id: String,
    pub math: MathNode,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnitDefinitionDecl {
    pub id: String,
    pub units: UnitDefinition,
}

/// Anything a `Name` node can refer to in the model.
#[derive(Debug, Clone, Copy)]
pub enum Symbol<'m> {
    Quantity(&'m Quantity),
    Reaction(&'m Reaction),
}

