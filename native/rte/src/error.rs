//! Error types for Rte operations.
//!
//! Three-valued answers are not errors: an Unknown (`None`) subtype or
//! disjointness result is a legitimate outcome and is reported as such.
//! Only a derivative that cannot be computed at all surfaces here.

use crate::genus::TypeDesignator;
use crate::rte::Rte;

/// Errors returned by derivative-based operations.
#[derive(Debug, Clone, thiserror::Error)]
pub enum RteError {
    /// A `Singleton` could not be classified against the derivative's type,
    /// even after canonicalizing both.
    #[error(
        "cannot compute derivative of {rte} with respect to {wrt} (factors: [{}], disjoints: [{}])",
        join(.factors),
        join(.disjoints)
    )]
    CannotComputeDerivative {
        rte: Rte,
        wrt: TypeDesignator,
        factors: Vec<TypeDesignator>,
        disjoints: Vec<TypeDesignator>,
    },
}

fn join(tds: &[TypeDesignator]) -> String {
    tds.iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}
