//! Model-wide unit consistency checking.
use super::dependencies::DefinitionGraph;
use super::error::{ValidationError, ValidationErrorType};
use crate::compiler::{CompileError, CompiledValue, DimensionalAnalyzer};
use crate::config::EngineOptions;
use crate::model::{AssignmentRule, InitialAssignment, Model, Reaction};
use rayon::prelude::*;
use tracing::{debug, info_span};

/// One defining equation of the model.
#[derive(Debug, Clone, Copy)]
enum Equation<'m> {
    Rule(&'m AssignmentRule),
    Initial(&'m InitialAssignment),
    KineticLaw(&'m Reaction),
}

impl<'m> Equation<'m> {
    fn target(&self) -> &'m str {
        match self {
            Equation::Rule(r) => &r.variable,
            Equation::Initial(ia) => &ia.symbol,
            Equation::KineticLaw(r) => &r.id,
        }
    }

    fn describe(&self) -> &'static str {
        match self {
            Equation::Rule(_) => "assignment rule",
            Equation::Initial(_) => "initial assignment",
            Equation::KineticLaw(_) => "kinetic law",
        }
    }
}

/// Derives the unit of every equation in a model and compares it with the unit
/// declared for the equation's target.
///
/// Each equation is analysed by its own engine, so equations are checked in parallel.
pub struct UnitChecker<'m> {
    model: &'m Model,
    options: EngineOptions,
}

impl<'m> UnitChecker<'m> {
    pub fn new(model: &'m Model, options: EngineOptions) -> Self {
        Self { model, options }
    }

    fn equations(&self) -> Vec<Equation<'m>> {
        let model = self.model;
        model
            .assignment_rules
            .iter()
            .map(Equation::Rule)
            .chain(model.initial_assignments.iter().map(Equation::Initial))
            .chain(
                model
                    .reactions
                    .iter()
                    .filter(|r| r.kinetic_law.is_some())
                    .map(Equation::KineticLaw),
            )
            .collect()
    }

    fn derive(&self, equation: Equation<'m>) -> Result<CompiledValue, CompileError> {
        let mut engine = DimensionalAnalyzer::for_model(self.model, self.options);
        match equation {
            Equation::Rule(r) => engine.compile_definition(&r.variable, &r.math),
            Equation::Initial(ia) => engine.compile_definition(&ia.symbol, &ia.math),
            Equation::KineticLaw(r) => engine.compile_kinetic_law(r),
        }
    }

    /// The derived unit of every equation, in model order, as `(target, result)`.
    pub fn derive_all(&self) -> Vec<(String, Result<CompiledValue, CompileError>)> {
        self.equations()
            .par_iter()
            .map(|eq| (eq.target().to_string(), self.derive(*eq)))
            .collect()
    }

    /// Runs the check and collects every problem found.
    pub fn check(&self) -> Result<(), Vec<ValidationError>> {
        let span = info_span!("check_units", model = %self.model.id);
        let _entered = span.enter();

        // --- PHASE 1: STRUCTURE ---
        // Circular definitions are reported once per cycle; their equations have no
        // meaningful unit and are skipped below.
        let graph = DefinitionGraph::from_model(self.model);
        let mut errors: Vec<ValidationError> = graph
            .cycles()
            .iter()
            .map(|members| ValidationError::from_cycle(members))
            .collect();

        // --- PHASE 2: INFERENCE ---
        let equations = self.equations();
        let outcomes: Vec<Result<CompiledValue, CompileError>> =
            equations.par_iter().map(|eq| self.derive(*eq)).collect();

        // --- PHASE 3: VERIFICATION ---
        for (equation, outcome) in equations.into_iter().zip(outcomes) {
            let target = equation.target();
            if graph.is_cyclic(target) {
                continue;
            }
            match outcome {
                Ok(value) => {
                    if let Some(err) = self.verify(equation, &value) {
                        errors.push(err);
                    }
                }
                Err(CompileError::Unit(e)) => errors.push(
                    ValidationError::new(
                        ValidationErrorType::UnitError,
                        format!("In {}: {}", equation.describe(), e),
                    )
                    .at_target(target),
                ),
                Err(e) => errors.push(
                    ValidationError::new(
                        ValidationErrorType::Structural,
                        format!("In {}: {}", equation.describe(), e),
                    )
                    .at_target(target),
                ),
            }
        }

        debug!(errors = errors.len(), "Unit check finished");
        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }

    fn verify(&self, equation: Equation<'m>, value: &CompiledValue) -> Option<ValidationError> {
        let target = equation.target();
        let Some(declared) = self.model.derived_units(target) else {
            debug!(symbol = target, "No declared unit, nothing to verify");
            return None;
        };
        let derived = value.unit().filter(|u| !u.is_invalid())?;
        if declared.is_equivalent(derived) {
            return None;
        }
        let msg = format!(
            "Declared unit '{}' does not match the unit '{}' derived from its {}.",
            declared,
            derived,
            equation.describe()
        );
        Some(ValidationError::new(ValidationErrorType::UnitMismatch, msg).at_target(target))
    }
}
