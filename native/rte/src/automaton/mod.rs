//! Symbolic finite automata over type designators.
//!
//! This module provides:
//! - Derivative-based construction from an [`Rte`](crate::rte::Rte)
//! - Thompson ε-NFA construction, epsilon removal and subset construction
//! - Completion, complement and synchronized products
//! - Partition refinement minimization
//! - Rte extraction by state elimination
//! - PyO3 bindings for Python interoperability (`python` feature)

mod dfa;
mod epsilon_nfa;
mod extract;
mod minimize;
mod product;
#[cfg(feature = "python")]
mod python_bindings;
mod state;
mod subset_construction;
mod symbol;
mod trace;

pub use dfa::{Dfa, ExitValue, GraphEdge, State};
pub use epsilon_nfa::EpsilonNfa;
pub use product::{intersection, sxp, union, xor};
#[cfg(feature = "python")]
pub use python_bindings::automaton;
pub use state::{StateId, StateSet};
pub use subset_construction::subset_construction;
pub use symbol::{Alphabet, EPSILON, SymbolId};
