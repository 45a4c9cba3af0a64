// FFI Facade: The main entry point for Python.
// This file declares the crate's modules and uses `pyo3` to define the
// `_core` Python module on top of them.

pub mod analysis;
pub mod ast;
pub mod bindings;
pub mod compiler;
pub mod config;
pub mod display;
pub mod model;
pub mod units;

use bindings::python;
use pyo3::prelude::*;

// --- Module Definition ---
/// This function defines the `mathunits._core` Python module.
#[pymodule]
fn _core(_py: Python, m: &Bound<'_, PyModule>) -> PyResult<()> {
    m.add_class::<python::PyModel>()?;
    m.add_function(wrap_pyfunction!(python::derive_units, m)?)?;
    m.add_function(wrap_pyfunction!(python::check_model_units, m)?)?;
    m.add_function(wrap_pyfunction!(python::definition_cycles, m)?)?;
    m.add_function(wrap_pyfunction!(python::format_formula, m)?)?;
    m.add_function(wrap_pyfunction!(python::version, m)?)?;
    Ok(())
}
