//! Rational type expressions.
//!
//! A [`TypeDesignator`] classifies single values; an [`Rte`] is a regular
//! expression whose symbols are designators, and so classifies sequences of
//! values. Expressions compile to deterministic symbolic automata ([`Dfa`])
//! either through Brzozowski derivatives ([`Rte::to_dfa`]) or through a
//! Thompson ε-NFA ([`Rte::to_dfa_thompson`]).
//!
//! Questions about designators, such as subtyping or disjointness, are
//! answered in three-valued logic: `Some(true)`, `Some(false)`, or `None`
//! when they cannot be decided.

pub mod automaton;
pub mod error;
pub mod fixpoint;
pub mod genus;
pub mod log;
pub mod rte;
#[cfg(test)]
mod testing;
pub mod value;

pub use automaton::{Dfa, ExitValue, intersection, sxp, union, xor};
pub use error::RteError;
pub use fixpoint::NormalForm;
pub use genus::{MdtdAtom, Predicate, TypeDesignator, TypeKind, mdtd};
pub use rte::{Rte, RteKind};
pub use value::{AtomicKind, Value};

#[cfg(feature = "python")]
use pyo3::prelude::*;

#[cfg(feature = "python")]
fn import_submodule<'py>(
    py: Python<'py>,
    m: &Bound<'py, PyModule>,
    package: &str,
    name: &str,
    import_func: impl FnOnce(&Bound<'py, PyModule>) -> PyResult<()>,
) -> PyResult<()> {
    let submodule = PyModule::new(py, name)?;
    import_func(&submodule)?;

    // Add the submodule to sys.modules
    let sys_modules = PyModule::import(py, "sys")?.getattr("modules")?;
    sys_modules.set_item(format!("{package}.{name}"), submodule.clone())?;

    m.add_submodule(&submodule)?;
    Ok(())
}

#[cfg(feature = "python")]
#[pymodule]
fn rtelib(m: &Bound<'_, PyModule>) -> PyResult<()> {
    import_submodule(m.py(), m, "rtelib", "automaton", automaton::automaton)
}
