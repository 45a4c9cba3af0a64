use crate::analysis::{DefinitionGraph, UnitChecker};
use crate::ast::MathNode;
use crate::compiler::DimensionalAnalyzer;
use crate::config::EngineOptions;
use crate::display::{format_unit_trace, to_infix};
use crate::model::Model;
use pyo3::exceptions::PyValueError;
use pyo3::prelude::*;

fn parse_model(json: &str) -> PyResult<Model> {
    Model::from_json_str(json).map_err(|e| PyValueError::new_err(e.to_string()))
}

fn parse_math(json: &str) -> PyResult<MathNode> {
    serde_json::from_str(json).map_err(|e| PyValueError::new_err(format!("Invalid expression: {}", e)))
}

fn options(allow_invalid_model: bool, current_time: f64) -> EngineOptions {
    EngineOptions {
        allow_invalid_model,
        current_time,
    }
}

#[pyclass(name = "_Model")]
#[derive(Debug, Clone)]
pub struct PyModel {
    inner: Model,
}

#[pymethods]
impl PyModel {
    #[new]
    pub fn new(model_json: &str) -> PyResult<Self> {
        Ok(Self { inner: parse_model(model_json)? })
    }

    /// Returns `(value, unit)` for an expression evaluated against this model.
    #[pyo3(signature = (math_json, allow_invalid_model=false, current_time=0.0))]
    pub fn derive_units(&self, math_json: &str, allow_invalid_model: bool, current_time: f64) -> PyResult<(f64, String)> {
        let math = parse_math(math_json)?;
        let mut engine = DimensionalAnalyzer::for_model(&self.inner, options(allow_invalid_model, current_time));
        let value = engine
            .compile(&math)
            .map_err(|e| PyValueError::new_err(e.to_string()))?;
        Ok((value.to_number(), value.unit_string()))
    }

    /// Raises `ValueError` listing every unit problem in the model.
    #[pyo3(signature = (allow_invalid_model=false))]
    pub fn validate(&self, allow_invalid_model: bool) -> PyResult<()> {
        UnitChecker::new(&self.inner, options(allow_invalid_model, 0.0))
            .check()
            .map_err(|errs| {
                let msg = errs.iter().map(|e| e.to_string()).collect::<Vec<_>>().join("\n");
                PyValueError::new_err(msg)
            })
    }

    pub fn definition_cycles(&self) -> Vec<Vec<String>> {
        DefinitionGraph::from_model(&self.inner).cycles()
    }

    #[pyo3(signature = (math_json, allow_invalid_model=false))]
    pub fn trace(&self, math_json: &str, allow_invalid_model: bool) -> PyResult<String> {
        let math = parse_math(math_json)?;
        Ok(format_unit_trace(Some(&self.inner), options(allow_invalid_model, 0.0), &math))
    }

    pub fn symbol_count(&self) -> usize {
        self.inner.compartments.len() + self.inner.species.len() + self.inner.parameters.len() + self.inner.reactions.len()
    }
}

/// One-shot unit derivation without keeping a model object around.
#[pyfunction]
#[pyo3(signature = (model_json, math_json, allow_invalid_model=false))]
pub fn derive_units(model_json: &str, math_json: &str, allow_invalid_model: bool) -> PyResult<(f64, String)> {
    PyModel::new(model_json)?.derive_units(math_json, allow_invalid_model, 0.0)
}

/// Every unit problem in the model as a message; empty when the model is consistent.
#[pyfunction]
#[pyo3(signature = (model_json, allow_invalid_model=false))]
pub fn check_model_units(model_json: &str, allow_invalid_model: bool) -> PyResult<Vec<String>> {
    let model = parse_model(model_json)?;
    Ok(match UnitChecker::new(&model, options(allow_invalid_model, 0.0)).check() {
        Ok(()) => Vec::new(),
        Err(errs) => errs.iter().map(|e| e.to_string()).collect(),
    })
}

#[pyfunction]
pub fn definition_cycles(model_json: &str) -> PyResult<Vec<Vec<String>>> {
    Ok(DefinitionGraph::from_model(&parse_model(model_json)?).cycles())
}

#[pyfunction]
pub fn format_formula(math_json: &str) -> PyResult<String> {
    Ok(to_infix(&parse_math(math_json)?))
}

#[pyfunction]
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
