//! Subset construction algorithm for converting ε-NFA to DFA.
//!
//! Unlike a classic powerset construction, the symbols leaving a set of
//! NFA states may overlap, so they are first split into disjoint pieces with
//! [`mdtd`]. Each piece leads to the union of the moves over the symbols it
//! refines.

use std::collections::BTreeMap;

use indexmap::IndexMap;

use crate::automaton::dfa::{Dfa, ExitValue};
use crate::automaton::epsilon_nfa::EpsilonNfa;
use crate::automaton::state::{StateId, StateSet};
use crate::automaton::symbol::SymbolId;
use crate::genus::{TypeDesignator, mdtd};
use crate::log::targets;
use crate::rte::Rte;

/// Convert an epsilon-NFA to a DFA whose accepting states report `exit`.
pub fn subset_construction<E: ExitValue>(nfa: &EpsilonNfa, exit: E) -> Dfa<E> {
    // Each DFA state corresponds to a set of NFA states, numbered in
    // discovery order so the start set is state 0
    let start = StateSet::singleton(nfa.start_state(), nfa.num_states() as usize);
    let initial_set = nfa.epsilon_closure(&start);
    let mut state_mapping: IndexMap<Vec<StateId>, StateSet> =
        IndexMap::from([(initial_set.to_vec(), initial_set)]);
    let mut edges: Vec<Vec<(TypeDesignator, StateId)>> = Vec::new();

    let mut next = 0;
    while let Some(current_nfa_set) = state_mapping.get_index(next).map(|(_, set)| set.clone()) {
        let moves: Vec<(SymbolId, &TypeDesignator, StateSet)> = nfa
            .alphabet()
            .symbols()
            .filter_map(|symbol| {
                let label = nfa.alphabet().label(symbol)?;
                let reached = nfa.move_on_symbol(&current_nfa_set, symbol);
                (!reached.is_empty()).then_some((symbol, label, reached))
            })
            .collect();
        let labels: Vec<TypeDesignator> =
            moves.iter().map(|(_, label, _)| (*label).clone()).collect();

        let mut out = Vec::new();
        for atom in mdtd(&labels) {
            let mut next_nfa_set = StateSet::with_capacity(nfa.num_states() as usize);
            for (_, label, reached) in &moves {
                if atom.factors.contains(label) {
                    next_nfa_set.union_with(reached);
                }
            }
            if next_nfa_set.is_empty() {
                continue;
            }
            let (next_dfa_state, _) =
                state_mapping.insert_full(next_nfa_set.to_vec(), next_nfa_set);
            out.push((atom.td, next_dfa_state as StateId));
        }
        edges.push(out);
        next += 1;
    }

    let exit_map: BTreeMap<StateId, E> = state_mapping
        .values()
        .enumerate()
        .filter(|(_, set)| set.intersects(nfa.final_states()))
        .map(|(state, _)| (state as StateId, exit.clone()))
        .collect();
    log::debug!(
        target: targets::DETERMINIZE,
        "{} NFA states determinized into {} DFA states",
        nfa.num_states(),
        state_mapping.len()
    );
    Dfa::new(edges, exit_map)
}

impl Rte {
    /// Build a [`Dfa`] by Thompson construction, epsilon removal and subset
    /// construction. Accepting states report `exit`.
    ///
    /// Unlike [`Rte::to_dfa`] this never computes a derivative, so it works
    /// on expressions whose derivatives cannot be decided.
    pub fn to_dfa_thompson<E: ExitValue>(&self, exit: E) -> Dfa<E> {
        let nfa = EpsilonNfa::thompson(self).remove_epsilons().trim();
        subset_construction(&nfa, exit).trim()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing;
    use crate::value::{AtomicKind, Value};

    fn td(kind: AtomicKind) -> TypeDesignator {
        TypeDesignator::atomic(kind)
    }

    #[test]
    fn test_overlapping_symbols_are_split() {
        // 0 -Int-> 1(final), 0 -Number-> 2 -Str-> 3(final)
        let mut nfa = EpsilonNfa::new();
        nfa.add_transition(0, td(AtomicKind::Int), 1);
        nfa.add_transition(0, td(AtomicKind::Number), 2);
        nfa.add_transition(2, td(AtomicKind::Str), 3);
        nfa.add_final_state(1);
        nfa.add_final_state(3);

        let dfa = subset_construction(&nfa, true);
        assert_eq!(dfa.simulate(&[Value::from(1)]), Some(true));
        assert_eq!(dfa.simulate(&[Value::from(1.5)]), None);
        assert_eq!(dfa.simulate(&[Value::from(1), Value::from("a")]), Some(true));
        assert_eq!(dfa.simulate(&[Value::from(1.5), Value::from("a")]), Some(true));
        // {0}, {1, 2}, {2}, {3}
        assert_eq!(dfa.num_states(), 4);
    }

    #[test]
    fn test_to_dfa_thompson() {
        let int = Rte::singleton(td(AtomicKind::Int));
        let text = Rte::singleton(td(AtomicKind::Str));
        let dfa = Rte::cat(vec![Rte::star(int.clone()), text]).to_dfa_thompson(1u8);
        assert_eq!(dfa.simulate(&[Value::from("a")]), Some(1));
        assert_eq!(dfa.simulate(&[Value::from(1), Value::from(2), Value::from("a")]), Some(1));
        assert_eq!(dfa.simulate(&[Value::from(1)]), None);
    }

    #[test]
    fn test_to_dfa_thompson_not_and() {
        let int = Rte::singleton(td(AtomicKind::Int));
        let number = Rte::singleton(td(AtomicKind::Number));
        let r = Rte::and(vec![Rte::star(number), Rte::not(Rte::star(int))]);
        let dfa = r.to_dfa_thompson(true);
        assert_eq!(dfa.simulate(&[Value::from(1), Value::from(2)]), None);
        assert_eq!(dfa.simulate(&[Value::from(1), Value::from(2.5)]), Some(true));
        assert_eq!(dfa.simulate(&[]), None);
        assert_eq!(dfa.simulate(&[Value::from(2.5), Value::from("x")]), None);
    }

    #[test]
    fn test_thompson_agrees_with_derivatives() {
        let _ = env_logger::builder().is_test(true).try_init();
        let mut rng = testing::rng(23);
        let mut compared = 0;
        for _ in 0..60 {
            let r = testing::random_rte(&mut rng, 3);
            let thompson = r.to_dfa_thompson(true);
            // Derivatives of predicate singletons may be undecidable.
            let Ok(traced) = r.to_dfa(true) else {
                continue;
            };
            compared += 1;
            assert_ne!(thompson.equivalent(&traced), Some(false), "{r}");
            for _ in 0..10 {
                let sequence = testing::random_sequence(&mut rng, 4);
                assert_eq!(
                    thompson.simulate(&sequence),
                    traced.simulate(&sequence),
                    "{r} on {sequence:?}"
                );
            }
        }
        assert!(compared > 30, "only {compared} expressions had derivatives");
    }
}
