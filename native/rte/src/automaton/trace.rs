//! Automaton construction by tracing derivatives.

use std::collections::BTreeMap;

use indexmap::IndexSet;

use crate::automaton::dfa::{Dfa, ExitValue};
use crate::automaton::state::StateId;
use crate::error::RteError;
use crate::genus::{TypeDesignator, mdtd};
use crate::log::targets;
use crate::rte::Rte;

impl Rte {
    /// Build a [`Dfa`] whose states are the canonical derivatives of this
    /// expression. Accepting states report `exit`.
    pub fn to_dfa<E: ExitValue>(&self, exit: E) -> Result<Dfa<E>, RteError> {
        let mut residuals: IndexSet<Rte> = IndexSet::from([self.canonicalize()]);
        let mut edges: Vec<Vec<(TypeDesignator, StateId)>> = Vec::new();
        let mut next = 0;
        while let Some(rte) = residuals.get_index(next).cloned() {
            let first_types: Vec<TypeDesignator> = rte.first_types().iter().cloned().collect();
            let mut out = Vec::new();
            for atom in mdtd(&first_types) {
                let residual = rte
                    .derivative(&atom.td, &atom.factors, &atom.disjoints)?
                    .canonicalize();
                if residual.is_empty_set() {
                    continue;
                }
                let target = residuals.insert_full(residual).0 as StateId;
                // Parallel atoms are merged into one label by `Dfa::new`.
                out.push((atom.td, target));
            }
            edges.push(out);
            next += 1;
        }
        let exit_map: BTreeMap<StateId, E> = residuals
            .iter()
            .enumerate()
            .filter(|(_, rte)| rte.nullable())
            .map(|(state, _)| (state as StateId, exit.clone()))
            .collect();
        log::debug!(
            target: targets::DERIVATIVE,
            "{self} traced to {} states, {} accepting",
            residuals.len(),
            exit_map.len()
        );
        Ok(Dfa::new(edges, exit_map))
    }
}
