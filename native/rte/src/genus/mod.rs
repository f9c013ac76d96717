//! Type designators: a symbolic algebra of value sets with three-valued
//! queries, canonicalization, and maximal disjoint decomposition.

mod canonical;
mod designator;
pub mod mdtd;
mod queries;

pub use designator::{Predicate, TypeDesignator, TypeKind};
pub use mdtd::{MdtdAtom, mdtd};
