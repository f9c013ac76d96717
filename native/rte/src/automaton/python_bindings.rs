//! PyO3 bindings for the automaton module.
//!
//! Designators, expressions and automata are exposed as opaque handles.
//! Python values are converted to [`Value`]s on the way in; exit values are
//! Python integers.

use std::collections::BTreeMap;
use std::hash::{DefaultHasher, Hash, Hasher};

use pyo3::exceptions::{PyTypeError, PyValueError};
use pyo3::prelude::*;
use pyo3::types::{PyBool, PyDict, PyFloat, PyInt, PyList, PyString, PyTuple};

use crate::automaton::dfa::Dfa;
use crate::automaton::product::{intersection, union, xor};
use crate::fixpoint::NormalForm;
use crate::genus::{TypeDesignator, mdtd};
use crate::rte::Rte;
use crate::value::{AtomicKind, Value};

/// Convert a Python object to a [`Value`].
fn value_from_py(obj: &Bound<'_, PyAny>) -> PyResult<Value> {
    if obj.is_none() {
        Ok(Value::Null)
    } else if obj.is_instance_of::<PyBool>() {
        Ok(Value::Bool(obj.extract()?))
    } else if obj.is_instance_of::<PyInt>() {
        Ok(Value::Int(obj.extract()?))
    } else if obj.is_instance_of::<PyFloat>() {
        Ok(Value::Float(obj.extract()?))
    } else if obj.is_instance_of::<PyString>() {
        Ok(Value::from(obj.extract::<String>()?))
    } else if obj.is_instance_of::<PyList>() || obj.is_instance_of::<PyTuple>() {
        Ok(Value::from(values_from_py(obj)?))
    } else {
        Err(PyTypeError::new_err(format!(
            "cannot classify a value of type {}",
            obj.get_type().name()?
        )))
    }
}

fn values_from_py(sequence: &Bound<'_, PyAny>) -> PyResult<Vec<Value>> {
    sequence
        .try_iter()?
        .map(|item| value_from_py(&item?))
        .collect()
}

fn normal_form(name: &str) -> PyResult<NormalForm> {
    match name {
        "none" => Ok(NormalForm::None),
        "dnf" => Ok(NormalForm::Dnf),
        "cnf" => Ok(NormalForm::Cnf),
        _ => Err(PyValueError::new_err(format!("unknown normal form {name:?}"))),
    }
}

/// A type designator.
#[pyclass(name = "TypeDesignator", module = "rtelib.automaton", unsendable, frozen)]
pub struct PyTypeDesignator {
    td: TypeDesignator,
}

impl From<TypeDesignator> for PyTypeDesignator {
    fn from(td: TypeDesignator) -> Self {
        Self { td }
    }
}

fn designators(operands: Vec<PyRef<'_, PyTypeDesignator>>) -> Vec<TypeDesignator> {
    operands.iter().map(|op| op.td.clone()).collect()
}

#[pymethods]
impl PyTypeDesignator {
    #[staticmethod]
    fn top() -> Self {
        TypeDesignator::top().into()
    }

    #[staticmethod]
    fn empty() -> Self {
        TypeDesignator::empty().into()
    }

    /// A native category by name, e.g. `"Int"` or `"Number"`.
    #[staticmethod]
    fn atomic(name: &str) -> PyResult<Self> {
        AtomicKind::ALL
            .into_iter()
            .find(|kind| kind.name() == name)
            .map(|kind| TypeDesignator::atomic(kind).into())
            .ok_or_else(|| PyValueError::new_err(format!("unknown category {name:?}")))
    }

    #[staticmethod]
    fn eql(value: &Bound<'_, PyAny>) -> PyResult<Self> {
        Ok(TypeDesignator::eql(value_from_py(value)?).into())
    }

    #[staticmethod]
    fn member(values: &Bound<'_, PyAny>) -> PyResult<Self> {
        Ok(TypeDesignator::member(values_from_py(values)?).into())
    }

    #[staticmethod]
    #[pyo3(name = "and_")]
    fn and(operands: Vec<PyRef<'_, PyTypeDesignator>>) -> Self {
        TypeDesignator::and(designators(operands)).into()
    }

    #[staticmethod]
    #[pyo3(name = "or_")]
    fn or(operands: Vec<PyRef<'_, PyTypeDesignator>>) -> Self {
        TypeDesignator::or(designators(operands)).into()
    }

    #[staticmethod]
    #[pyo3(name = "not_")]
    fn not(operand: PyRef<'_, PyTypeDesignator>) -> Self {
        TypeDesignator::not(operand.td.clone()).into()
    }

    fn typep(&self, value: &Bound<'_, PyAny>) -> PyResult<bool> {
        Ok(self.td.typep(&value_from_py(value)?))
    }

    /// `True`, `False`, or `None` when undecidable.
    fn inhabited(&self) -> Option<bool> {
        self.td.inhabited()
    }

    fn disjoint(&self, other: PyRef<'_, PyTypeDesignator>) -> Option<bool> {
        self.td.disjoint(&other.td)
    }

    fn subtypep(&self, other: PyRef<'_, PyTypeDesignator>) -> Option<bool> {
        self.td.subtypep(&other.td)
    }

    #[pyo3(signature = (nf = "none"))]
    fn canonicalize(&self, nf: &str) -> PyResult<Self> {
        Ok(self.td.canonicalize(normal_form(nf)?).into())
    }

    fn __repr__(&self) -> String {
        self.td.to_string()
    }

    fn __eq__(&self, other: &Bound<'_, PyAny>) -> bool {
        other
            .extract::<PyRef<PyTypeDesignator>>()
            .is_ok_and(|other| other.td == self.td)
    }

    fn __hash__(&self) -> u64 {
        let mut hasher = DefaultHasher::new();
        self.td.hash(&mut hasher);
        hasher.finish()
    }
}

/// Maximal disjoint type decomposition of `designators`.
#[pyfunction(name = "mdtd")]
fn py_mdtd(designators: Vec<PyRef<'_, PyTypeDesignator>>) -> Vec<PyTypeDesignator> {
    let tds: Vec<TypeDesignator> = designators.iter().map(|d| d.td.clone()).collect();
    mdtd(&tds).into_iter().map(|atom| atom.td.into()).collect()
}

/// A rational type expression.
#[pyclass(name = "Rte", module = "rtelib.automaton", unsendable, frozen)]
pub struct PyRte {
    rte: Rte,
}

impl From<Rte> for PyRte {
    fn from(rte: Rte) -> Self {
        Self { rte }
    }
}

fn expressions(operands: Vec<PyRef<'_, PyRte>>) -> Vec<Rte> {
    operands.iter().map(|op| op.rte.clone()).collect()
}

#[pymethods]
impl PyRte {
    #[staticmethod]
    fn empty_set() -> Self {
        Rte::empty_set().into()
    }

    #[staticmethod]
    fn epsilon() -> Self {
        Rte::epsilon().into()
    }

    #[staticmethod]
    fn sigma() -> Self {
        Rte::sigma().into()
    }

    #[staticmethod]
    fn singleton(td: PyRef<'_, PyTypeDesignator>) -> Self {
        Rte::singleton(td.td.clone()).into()
    }

    #[staticmethod]
    fn star(operand: PyRef<'_, PyRte>) -> Self {
        Rte::star(operand.rte.clone()).into()
    }

    #[staticmethod]
    fn cat(operands: Vec<PyRef<'_, PyRte>>) -> Self {
        Rte::cat(expressions(operands)).into()
    }

    #[staticmethod]
    #[pyo3(name = "not_")]
    fn not(operand: PyRef<'_, PyRte>) -> Self {
        Rte::not(operand.rte.clone()).into()
    }

    #[staticmethod]
    #[pyo3(name = "and_")]
    fn and(operands: Vec<PyRef<'_, PyRte>>) -> Self {
        Rte::and(expressions(operands)).into()
    }

    #[staticmethod]
    #[pyo3(name = "or_")]
    fn or(operands: Vec<PyRef<'_, PyRte>>) -> Self {
        Rte::or(expressions(operands)).into()
    }

    fn nullable(&self) -> bool {
        self.rte.nullable()
    }

    fn canonicalize(&self) -> Self {
        self.rte.canonicalize().into()
    }

    fn derivative(&self, wrt: PyRef<'_, PyTypeDesignator>) -> PyResult<Self> {
        self.rte
            .derivative(&wrt.td, &[], &[])
            .map(Self::from)
            .map_err(|e| PyValueError::new_err(e.to_string()))
    }

    /// Build an automaton from derivatives.
    #[pyo3(signature = (exit = 1))]
    fn to_dfa(&self, exit: i64) -> PyResult<PyDfa> {
        self.rte
            .to_dfa(exit)
            .map(|dfa| PyDfa { dfa })
            .map_err(|e| PyValueError::new_err(e.to_string()))
    }

    /// Build an automaton by Thompson construction.
    #[pyo3(signature = (exit = 1))]
    fn to_dfa_thompson(&self, exit: i64) -> PyDfa {
        PyDfa {
            dfa: self.rte.to_dfa_thompson(exit),
        }
    }

    fn matches(&self, sequence: &Bound<'_, PyAny>) -> PyResult<bool> {
        self.rte
            .matches(&values_from_py(sequence)?)
            .map_err(|e| PyValueError::new_err(e.to_string()))
    }

    fn __repr__(&self) -> String {
        self.rte.to_string()
    }

    fn __eq__(&self, other: &Bound<'_, PyAny>) -> bool {
        other
            .extract::<PyRef<PyRte>>()
            .is_ok_and(|other| other.rte == self.rte)
    }
}

/// A deterministic symbolic finite automaton with integer exit values.
#[pyclass(name = "Dfa", module = "rtelib.automaton", unsendable, frozen)]
pub struct PyDfa {
    dfa: Dfa<i64>,
}

#[pymethods]
impl PyDfa {
    #[getter]
    fn num_states(&self) -> usize {
        self.dfa.num_states()
    }

    /// The exit value for `sequence`, or `None` when it is rejected.
    fn simulate(&self, sequence: &Bound<'_, PyAny>) -> PyResult<Option<i64>> {
        Ok(self.dfa.simulate(&values_from_py(sequence)?))
    }

    fn is_empty(&self) -> bool {
        self.dfa.is_empty()
    }

    fn vacuous(&self) -> Option<bool> {
        self.dfa.vacuous()
    }

    fn trim(&self) -> PyDfa {
        PyDfa { dfa: self.dfa.trim() }
    }

    /// Minimize the DFA (returns a new minimized DFA).
    fn minimize(&self) -> PyDfa {
        PyDfa {
            dfa: self.dfa.minimize(),
        }
    }

    #[pyo3(signature = (exit = 1))]
    fn complement(&self, exit: i64) -> PyDfa {
        PyDfa {
            dfa: self.dfa.complement(exit),
        }
    }

    fn union(&self, other: PyRef<'_, PyDfa>) -> PyDfa {
        PyDfa {
            dfa: union(&self.dfa, &other.dfa),
        }
    }

    fn intersection(&self, other: PyRef<'_, PyDfa>) -> PyDfa {
        PyDfa {
            dfa: intersection(&self.dfa, &other.dfa),
        }
    }

    fn xor(&self, other: PyRef<'_, PyDfa>) -> PyDfa {
        PyDfa {
            dfa: xor(&self.dfa, &other.dfa),
        }
    }

    fn equivalent(&self, other: PyRef<'_, PyDfa>) -> Option<bool> {
        self.dfa.equivalent(&other.dfa)
    }

    /// One expression per exit value.
    fn to_rte(&self) -> BTreeMap<i64, PyRte> {
        self.dfa
            .to_rte()
            .into_iter()
            .map(|(exit, rte)| (exit, rte.into()))
            .collect()
    }

    /// Convert to a NetworkX MultiDiGraph.
    fn to_networkx<'py>(&self, py: Python<'py>) -> PyResult<Bound<'py, PyAny>> {
        let nx = py.import("networkx")?;
        let graph = nx.call_method0("MultiDiGraph")?;

        for state in self.dfa.states() {
            let kwargs = PyDict::new(py);
            kwargs.set_item("exit", self.dfa.exit_value(state.index()))?;
            graph.call_method("add_node", (state.index(),), Some(&kwargs))?;
        }

        for (src, dst, label) in self.dfa.to_graph() {
            let kwargs = PyDict::new(py);
            kwargs.set_item("label", label.to_string())?;
            graph.call_method("add_edge", (src, dst), Some(&kwargs))?;
        }

        Ok(graph)
    }
}

/// Register the automaton submodule.
pub fn automaton(m: &Bound<'_, PyModule>) -> PyResult<()> {
    m.add_class::<PyTypeDesignator>()?;
    m.add_class::<PyRte>()?;
    m.add_class::<PyDfa>()?;
    m.add_function(wrap_pyfunction!(py_mdtd, m)?)?;
    Ok(())
}
