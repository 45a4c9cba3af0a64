//! The dimensional-analysis engine.
//!
//! Evaluates value and derived unit together for every node, resolves model symbols
//! through their defining equations and cuts circular definitions short with the
//! `CycleGuard`.
use super::error::{CompileError, UnitError};
use super::guard::CycleGuard;
use super::rules::{arithmetic, functions, logical, relational, Policy};
use super::value::{CompiledValue, Payload, SymbolResolver, DEFAULT_LEVEL, DEFAULT_VERSION};
use super::visitor::{Literal, MathCompiler};
use crate::analysis::DefinitionGraph;
use crate::ast::{ArithOp, Constant, FunctionOp, LogicOp, MathNode, Piece, RelOp};
use crate::config::EngineOptions;
use crate::model::{LocalParameter, Model, Quantity, Reaction, Symbol};
use crate::units::{UnitDefinition, UnitKind};
use std::collections::HashMap;
use tracing::{debug, debug_span, trace, warn};

const AVOGADRO_2019: f64 = 6.022_140_76e23;
const AVOGADRO_2006: f64 = 6.022_141_79e23;

/// The Avogadro constant as defined for the given level/version.
pub fn avogadro(level: u32, version: u32) -> f64 {
    if level > 3 || (level == 3 && version >= 2) {
        AVOGADRO_2019
    } else {
        AVOGADRO_2006
    }
}

pub struct DimensionalAnalyzer<'m> {
    model: Option<&'m Model>,
    level: u32,
    version: u32,
    options: EngineOptions,
    /// Function arguments bound while a function body is evaluated.
    symbols: HashMap<String, CompiledValue>,
    /// Local parameters of the kinetic law being evaluated.
    locals: Option<&'m [LocalParameter]>,
    guard: CycleGuard,
    definitions: Option<DefinitionGraph>,
}

impl<'m> DimensionalAnalyzer<'m> {
    pub fn new(model: Option<&'m Model>, options: EngineOptions) -> Self {
        let (level, version) = model.map_or((DEFAULT_LEVEL, DEFAULT_VERSION), |m| (m.level, m.version));
        Self {
            model,
            level,
            version,
            options,
            symbols: HashMap::new(),
            locals: None,
            guard: CycleGuard::new(),
            definitions: None,
        }
    }

    pub fn for_model(model: &'m Model, options: EngineOptions) -> Self {
        Self::new(Some(model), options)
    }

    pub fn standalone(options: EngineOptions) -> Self {
        Self::new(None, options)
    }

    pub fn options(&self) -> &EngineOptions {
        &self.options
    }

    /// The cycle record of the last compilation.
    pub fn cycle_guard(&self) -> &CycleGuard {
        &self.guard
    }

    fn policy(&self) -> Policy {
        Policy {
            strict: self.options.is_strict(),
            level: self.level,
            version: self.version,
        }
    }

    fn reset(&mut self) {
        self.guard.clear();
        self.symbols.clear();
        self.locals = None;
    }

    /// Evaluates `root`, returning its value and derived unit.
    ///
    /// Per-call state (symbol table, cycle guard) is reset on entry, so an engine
    /// can be reused for any number of sequential compilations.
    pub fn compile(&mut self, root: &MathNode) -> Result<CompiledValue, CompileError> {
        let span = debug_span!("compile", root = %root.tag(), strict = self.options.is_strict());
        let _entered = span.enter();
        self.reset();
        self.visit(root)
    }

    /// Compiles `math` as the defining equation of `target`; a reference back to
    /// `target` is treated as a cycle.
    pub fn compile_definition(&mut self, target: &str, math: &MathNode) -> Result<CompiledValue, CompileError> {
        let span = debug_span!("compile_definition", symbol = target);
        let _entered = span.enter();
        self.reset();
        self.guard.enter(target);
        let result = self.visit(math);
        self.guard.leave(target);
        result
    }

    /// Compiles a reaction's kinetic law with its local parameters in scope.
    pub fn compile_kinetic_law(&mut self, reaction: &'m Reaction) -> Result<CompiledValue, CompileError> {
        let Some(law) = reaction.kinetic_law.as_ref() else {
            return Ok(self.policy().undefined());
        };
        let span = debug_span!("compile_kinetic_law", reaction = %reaction.id);
        let _entered = span.enter();
        self.reset();
        self.guard.enter(&reaction.id);
        let result = self.with_scope(Some(law.local_parameters.as_slice()), HashMap::new(), |e| e.visit(&law.math));
        self.guard.leave(&reaction.id);
        result
    }

    /// Runs `f` with a fresh symbol table and local scope, restoring the previous ones afterwards.
    fn with_scope<T>(
        &mut self,
        locals: Option<&'m [LocalParameter]>,
        symbols: HashMap<String, CompiledValue>,
        f: impl FnOnce(&mut Self) -> T,
    ) -> T {
        let saved_symbols = std::mem::replace(&mut self.symbols, symbols);
        let saved_locals = std::mem::replace(&mut self.locals, locals);
        let out = f(self);
        self.symbols = saved_symbols;
        self.locals = saved_locals;
        out
    }

    /// Compiles a child and resolves a bare symbolic reference to a number.
    fn operand(&mut self, node: &MathNode) -> Result<CompiledValue, CompileError> {
        let mut value = self.visit(node)?;
        if value.as_reference().is_some() {
            let n = value.to_number_with(self);
            value.set_value(Payload::Number(n));
        }
        Ok(value)
    }

    fn operands(&mut self, nodes: &[MathNode]) -> Result<Vec<CompiledValue>, CompileError> {
        nodes.iter().map(|n| self.operand(n)).collect()
    }

    /// Unit token lookup: built-in kinds, then the model's unit definitions.
    fn resolve_token(&self, token: &str) -> Option<UnitDefinition> {
        match self.model {
            Some(model) => model.resolve_units(token),
            None => UnitKind::from_token(token, self.level, self.version).map(UnitDefinition::of_kind),
        }
    }

    fn time_units(&self) -> UnitDefinition {
        self.model
            .map_or_else(|| UnitDefinition::of_kind(UnitKind::Second), Model::time_units_definition)
    }

    /// A quantity's stored value (or a reference when unset) with its declared unit.
    /// Quantities without a resolvable unit carry the invalid sentinel.
    fn base_value(&self, quantity: &Quantity) -> CompiledValue {
        let payload = match quantity.value {
            Some(v) => Payload::Number(v),
            None => Payload::Reference(quantity.id.clone()),
        };
        let unit = quantity
            .units
            .as_deref()
            .and_then(|t| self.resolve_token(t))
            .unwrap_or_else(UnitDefinition::invalid);
        self.policy().value(payload, Some(unit))
    }

    fn on_definition_cycle(&mut self, id: &str) -> bool {
        let Some(model) = self.model else {
            return false;
        };
        self.definitions
            .get_or_insert_with(|| DefinitionGraph::from_model(model))
            .is_cyclic(id)
    }

    /// Lookup order: function arguments, kinetic-law locals, model symbols.
    fn resolve_name(&mut self, id: &str) -> Result<CompiledValue, CompileError> {
        if let Some(bound) = self.symbols.get(id) {
            trace!(symbol = id, "Resolved from function arguments");
            return Ok(bound.clone());
        }
        if let Some(local) = self.locals.and_then(|ps| ps.iter().find(|p| p.id == id)) {
            trace!(symbol = id, "Resolved from kinetic law locals");
            return Ok(self.base_value(local));
        }
        let Some(model) = self.model else {
            trace!(symbol = id, "No model attached, symbol is undefined");
            return Ok(self.policy().undefined());
        };
        match model.symbol(id) {
            Some(Symbol::Quantity(q)) => self.resolve_quantity(model, q),
            Some(Symbol::Reaction(r)) => self.resolve_reaction(model, r),
            None => {
                trace!(symbol = id, "Unknown symbol");
                Ok(self.policy().undefined())
            }
        }
    }

    fn resolve_quantity(&mut self, model: &'m Model, quantity: &'m Quantity) -> Result<CompiledValue, CompileError> {
        let mut value = self.base_value(quantity);
        let equation = model
            .assignment_rule(&quantity.id)
            .map(|r| &r.math)
            .or_else(|| model.initial_assignment(&quantity.id).map(|ia| &ia.math));
        let Some(math) = equation else {
            trace!(symbol = %quantity.id, "Resolved from stored value");
            return Ok(value);
        };

        match self.evaluate_guarded(&quantity.id, math, None)? {
            Some(n) => {
                value.set_value(Payload::Number(n));
                Ok(value)
            }
            None => Ok(self.policy().invalid()),
        }
    }

    fn resolve_reaction(&mut self, model: &'m Model, reaction: &'m Reaction) -> Result<CompiledValue, CompileError> {
        let unit = model
            .derived_units(&reaction.id)
            .unwrap_or_else(UnitDefinition::invalid);
        let mut value = self
            .policy()
            .value(Payload::Reference(reaction.id.clone()), Some(unit));
        let Some(law) = reaction.kinetic_law.as_ref() else {
            return Ok(value);
        };

        match self.evaluate_guarded(&reaction.id, &law.math, Some(law.local_parameters.as_slice()))? {
            Some(n) => {
                value.set_value(Payload::Number(n));
                Ok(value)
            }
            None => Ok(self.policy().invalid()),
        }
    }

    /// Evaluates the defining equation of `id` under the cycle guard.
    ///
    /// Returns `None` when `id` is on a circular definition. Confirmed identifiers
    /// stay confirmed for the rest of the compilation.
    fn evaluate_guarded(
        &mut self,
        id: &str,
        math: &'m MathNode,
        locals: Option<&'m [LocalParameter]>,
    ) -> Result<Option<f64>, CompileError> {
        if self.guard.is_confirmed(id) || self.guard.in_progress(id) || self.on_definition_cycle(id) {
            self.guard.confirm(id);
            debug!(symbol = id, "Circular definition, resolving to invalid");
            return Ok(None);
        }

        self.guard.enter(id);
        let result = self.with_scope(locals, HashMap::new(), |e| e.visit(math));
        self.guard.leave(id);

        let evaluated = result?;
        Ok(Some(evaluated.to_number_with(self)))
    }
}

/// Tracks the first valid branch unit and reports whether `value` disagrees with it.
fn check_branch(
    policy: &Policy,
    first: &mut Option<UnitDefinition>,
    value: &CompiledValue,
) -> Result<bool, UnitError> {
    let Some(unit) = value.unit().filter(|u| !u.is_invalid()) else {
        return Ok(false);
    };
    match first {
        None => {
            *first = Some(unit.clone());
            Ok(false)
        }
        Some(f) if f.is_equivalent(unit) => Ok(false),
        Some(f) => {
            policy.reject(UnitError::PiecewiseMismatch {
                first: f.to_string(),
                other: unit.to_string(),
            })?;
            Ok(true)
        }
    }
}

impl<'m> SymbolResolver for DimensionalAnalyzer<'m> {
    fn resolve_symbol(&mut self, id: &str) -> Option<CompiledValue> {
        self.resolve_name(id).ok()
    }
}

impl<'m> MathCompiler for DimensionalAnalyzer<'m> {
    type Output = CompiledValue;
    type Error = CompileError;

    fn literal(&mut self, literal: Literal, units: Option<&str>) -> Result<CompiledValue, CompileError> {
        let unit = units.and_then(|t| self.resolve_token(t));
        Ok(self.policy().number(literal.value(), unit))
    }

    fn rational(&mut self, numerator: i64, denominator: i64) -> Result<CompiledValue, CompileError> {
        Ok(self.policy().number(numerator as f64 / denominator as f64, None))
    }

    fn constant(&mut self, constant: Constant) -> Result<CompiledValue, CompileError> {
        let p = self.policy();
        let dimensionless = || Some(UnitDefinition::dimensionless());
        Ok(match constant {
            Constant::Pi => p.number(std::f64::consts::PI, dimensionless()),
            Constant::ExponentialE => p.number(std::f64::consts::E, dimensionless()),
            Constant::True => p.boolean(true),
            Constant::False => p.boolean(false),
            Constant::Infinity => p.number(f64::INFINITY, dimensionless()),
            Constant::NegativeInfinity => p.number(f64::NEG_INFINITY, dimensionless()),
            Constant::Avogadro => p.number(
                avogadro(self.level, self.version),
                Some(UnitDefinition::of_kind(UnitKind::Mole).raise_to(-1.0)),
            ),
        })
    }

    fn name(&mut self, id: &str) -> Result<CompiledValue, CompileError> {
        self.resolve_name(id)
    }

    fn time(&mut self, _name: &str) -> Result<CompiledValue, CompileError> {
        Ok(self.policy().number(self.options.current_time, Some(self.time_units())))
    }

    fn arithmetic(&mut self, op: ArithOp, args: &[MathNode]) -> Result<CompiledValue, CompileError> {
        let p = self.policy();
        let values = self.operands(args)?;
        let result = match op {
            ArithOp::Plus => arithmetic::plus(&p, &values)?,
            ArithOp::Minus => arithmetic::minus(&p, &values)?,
            ArithOp::Times => arithmetic::times(&p, &values),
            ArithOp::Divide => arithmetic::divide(&p, &values),
            ArithOp::Power => match values.as_slice() {
                [base, exponent] => arithmetic::power(&p, base, exponent)?,
                _ => p.undefined(),
            },
            ArithOp::Quotient => arithmetic::quotient(&p, &values),
            ArithOp::Rem => arithmetic::rem(&p, &values),
            ArithOp::Max => arithmetic::max(&p, &values)?,
            ArithOp::Min => arithmetic::min(&p, &values)?,
        };
        Ok(result)
    }

    fn relational(&mut self, op: RelOp, left: &MathNode, right: &MathNode) -> Result<CompiledValue, CompileError> {
        let p = self.policy();
        let l = self.operand(left)?;
        let r = self.operand(right)?;
        Ok(relational::compare(&p, op, l, r)?)
    }

    fn logical(&mut self, op: LogicOp, args: &[MathNode]) -> Result<CompiledValue, CompileError> {
        let p = self.policy();
        let mut flags = Vec::with_capacity(args.len());
        for arg in args {
            flags.push(self.operand(arg)?.to_boolean());
        }
        Ok(logical::connective(&p, op, &flags))
    }

    fn function(&mut self, op: FunctionOp, args: &[MathNode]) -> Result<CompiledValue, CompileError> {
        let p = self.policy();
        match (op, args) {
            (FunctionOp::Root, [degree, radicand]) => {
                let gate_degree = !matches!(
                    degree,
                    MathNode::Integer { units: None, .. } | MathNode::Rational { .. }
                );
                let d = self.operand(degree)?;
                let r = self.operand(radicand)?;
                Ok(functions::root(&p, &d, gate_degree, &r)?)
            }
            (FunctionOp::Root | FunctionOp::Sqrt, [radicand]) => {
                let r = self.operand(radicand)?;
                Ok(functions::sqrt(&p, &r)?)
            }
            (FunctionOp::Log, [base, x]) => {
                let b = self.operand(base)?;
                let v = self.operand(x)?;
                Ok(functions::log(&p, Some(&b), &v)?)
            }
            (FunctionOp::Log, [x]) => {
                let v = self.operand(x)?;
                Ok(functions::log(&p, None, &v)?)
            }
            (FunctionOp::Abs | FunctionOp::Ceiling | FunctionOp::Floor, [x]) => {
                let v = self.operand(x)?;
                Ok(functions::rounding(&p, op, &v))
            }
            (FunctionOp::Root | FunctionOp::Sqrt | FunctionOp::Log, _) => Ok(p.undefined()),
            (_, [x]) => {
                let v = self.operand(x)?;
                Ok(functions::transcendental(&p, op, &v)?)
            }
            _ => Ok(p.undefined()),
        }
    }

    /// Expands a model function definition with its parameters bound to the argument values.
    fn call(&mut self, name: &str, args: &[MathNode]) -> Result<CompiledValue, CompileError> {
        let p = self.policy();
        let Some(definition) = self.model.and_then(|m| m.function_definition(name)) else {
            trace!(function = name, "Unknown function, result is undefined");
            return Ok(p.undefined());
        };
        let MathNode::Lambda { params, body } = &definition.math else {
            warn!(function = name, "Function definition is not a lambda");
            return Ok(p.undefined());
        };

        let values = self.operands(args)?;
        let key = format!("function:{}", name);
        if self.guard.in_progress(&key) {
            self.guard.confirm(&key);
            debug!(function = name, "Recursive function definition, resolving to invalid");
            return Ok(p.invalid());
        }

        let table: HashMap<String, CompiledValue> = params.iter().cloned().zip(values).collect();
        self.guard.enter(&key);
        let result = self.with_scope(None, table, |e| e.visit(body));
        self.guard.leave(&key);
        result
    }

    /// A bare lambda yields its body's unit; parameters are bound to undefined values.
    fn lambda(&mut self, params: &[String], body: &MathNode) -> Result<CompiledValue, CompileError> {
        let p = self.policy();
        let table = params.iter().map(|name| (name.clone(), p.undefined())).collect();
        let locals = self.locals;
        let result = self.with_scope(locals, table, |e| e.visit(body))?;
        Ok(p.number(f64::NAN, result.unit().cloned()))
    }

    /// Value branches are checked for unit equivalence when there is more than one;
    /// conditions are then evaluated in order, stopping at the first true one.
    fn piecewise(&mut self, pieces: &[Piece], otherwise: Option<&MathNode>) -> Result<CompiledValue, CompileError> {
        let p = self.policy();
        let branch_count = pieces.len() + usize::from(otherwise.is_some());
        if branch_count == 0 {
            return Ok(p.undefined());
        }

        let mut compiled: Vec<Option<CompiledValue>> = vec![None; pieces.len()];
        let mut compiled_otherwise = None;
        let mut mismatch = false;
        if branch_count > 1 {
            let mut first = None;
            for (slot, piece) in compiled.iter_mut().zip(pieces) {
                let v = self.operand(&piece.value)?;
                mismatch |= check_branch(&p, &mut first, &v)?;
                *slot = Some(v);
            }
            if let Some(o) = otherwise {
                let v = self.operand(o)?;
                mismatch |= check_branch(&p, &mut first, &v)?;
                compiled_otherwise = Some(v);
            }
        }

        let mut chosen = None;
        for (i, piece) in pieces.iter().enumerate() {
            if self.operand(&piece.condition)?.to_boolean() {
                chosen = Some(match compiled[i].take() {
                    Some(v) => v,
                    None => self.operand(&piece.value)?,
                });
                break;
            }
        }

        let mut result = match (chosen, compiled_otherwise, otherwise) {
            (Some(v), _, _) => v,
            (None, Some(v), _) => v,
            (None, None, Some(o)) => self.operand(o)?,
            (None, None, None) => {
                let last = pieces.len() - 1;
                match compiled[last].take() {
                    Some(v) => v,
                    None => self.operand(&pieces[last].value)?,
                }
            }
        };
        if mismatch {
            result.set_units(UnitDefinition::invalid());
        }
        Ok(result)
    }

    fn selector(&mut self, args: &[MathNode]) -> Result<CompiledValue, CompileError> {
        self.operands(args)?;
        Ok(self.policy().undefined())
    }

    fn vector(&mut self, args: &[MathNode]) -> Result<CompiledValue, CompileError> {
        self.operands(args)?;
        Ok(self.policy().undefined())
    }

    /// The value and unit of `value`; the delay must be in model time units when
    /// the model declares them.
    fn delay(&mut self, value: &MathNode, delay: &MathNode) -> Result<CompiledValue, CompileError> {
        let p = self.policy();
        let mut x = self.operand(value)?;
        let d = self.operand(delay)?;
        let timed_model = self.model.filter(|m| m.time_units.is_some());
        if let (Some(model), Some(given)) = (timed_model, d.unit().filter(|u| !u.is_invalid())) {
            let model_time = model.time_units_definition();
            if !model_time.is_equivalent(given) {
                p.reject(UnitError::DelayTimeMismatch {
                    model_time: model_time.to_string(),
                    given: given.to_string(),
                })?;
                x.set_units(UnitDefinition::invalid());
            }
        }
        Ok(x)
    }

    /// Unit of the target per model time unit; the value is the target's current value.
    fn rate_of(&mut self, target: &str) -> Result<CompiledValue, CompileError> {
        let quantity = self.resolve_name(target)?;
        let n = quantity.to_number_with(self);
        let unit = match quantity.unit() {
            Some(u) if !u.is_invalid() => u.divide(&self.time_units()),
            _ => UnitDefinition::invalid(),
        };
        Ok(self.policy().number(n, Some(unit)))
    }

    fn unknown(&mut self, tag: &str) -> Result<CompiledValue, CompileError> {
        if self.options.is_strict() {
            return Err(CompileError::UnsupportedNode { tag: tag.to_string() });
        }
        warn!(tag, "Unsupported node evaluated as invalid");
        Ok(self.policy().invalid())
    }
}
