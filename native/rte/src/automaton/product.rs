//! Synchronized products of automata.

use std::collections::BTreeMap;

use indexmap::IndexSet;

use crate::automaton::dfa::{Dfa, ExitValue};
use crate::automaton::state::StateId;
use crate::fixpoint::NormalForm;
use crate::genus::TypeDesignator;
use crate::log::targets;

/// The synchronized cross product of `a` and `b`.
///
/// Both automata are completed first, so a product state exists for every
/// pair of states reachable together. `accept` decides from the acceptance of
/// the two components whether a product state accepts, and `exit` computes its
/// exit value from theirs; a state `accept` admits but `exit` gives no value
/// for is non-accepting. The result is trimmed.
pub fn sxp<E, A, X>(a: &Dfa<E>, b: &Dfa<E>, accept: A, exit: X) -> Dfa<E>
where
    E: ExitValue,
    A: Fn(bool, bool) -> bool,
    X: Fn(Option<&E>, Option<&E>) -> Option<E>,
{
    let (a, b) = (a.complete(), b.complete());
    let mut pairs: IndexSet<(StateId, StateId)> = IndexSet::from([(0, 0)]);
    let mut edges: Vec<Vec<(TypeDesignator, StateId)>> = Vec::new();

    let mut next = 0;
    while let Some(&(sa, sb)) = pairs.get_index(next) {
        let mut out = Vec::new();
        for (la, &ta) in a.states()[sa as usize].transitions() {
            for (lb, &tb) in b.states()[sb as usize].transitions() {
                if la.disjoint(lb) == Some(true) {
                    continue;
                }
                let label = TypeDesignator::and(vec![la.clone(), lb.clone()])
                    .canonicalize(NormalForm::None);
                if label.inhabited() == Some(false) {
                    continue;
                }
                let (target, _) = pairs.insert_full((ta, tb));
                log::trace!(target: targets::PRODUCT, "({sa}, {sb}) -> ({ta}, {tb}) on {label}");
                out.push((label, target as StateId));
            }
        }
        edges.push(out);
        next += 1;
    }

    let exit_map: BTreeMap<StateId, E> = pairs
        .iter()
        .enumerate()
        .filter_map(|(state, &(sa, sb))| {
            let (ea, eb) = (a.exit_value(sa), b.exit_value(sb));
            if !accept(ea.is_some(), eb.is_some()) {
                return None;
            }
            Some((state as StateId, exit(ea, eb)?))
        })
        .collect();
    log::debug!(
        target: targets::PRODUCT,
        "product of {} and {} states explored {} pairs",
        a.num_states(),
        b.num_states(),
        pairs.len()
    );
    Dfa::new(edges, exit_map).trim()
}

/// Sequences accepted by either automaton. Where both accept, the exit value
/// of `a` wins.
pub fn union<E: ExitValue>(a: &Dfa<E>, b: &Dfa<E>) -> Dfa<E> {
    sxp(a, b, |x, y| x || y, |ea, eb| ea.or(eb).cloned())
}

/// Sequences accepted by both automata, reporting the exit value of `a`.
pub fn intersection<E: ExitValue>(a: &Dfa<E>, b: &Dfa<E>) -> Dfa<E> {
    sxp(a, b, |x, y| x && y, |ea, eb| ea.or(eb).cloned())
}

/// Sequences accepted by exactly one of the automata.
pub fn xor<E: ExitValue>(a: &Dfa<E>, b: &Dfa<E>) -> Dfa<E> {
    sxp(a, b, |x, y| x != y, |ea, eb| ea.or(eb).cloned())
}

impl<E: ExitValue> Dfa<E> {
    /// Do the two automata accept the same sequences?
    ///
    /// Exit values are not compared. `None` when the symmetric difference
    /// can neither be shown empty nor shown inhabited.
    pub fn equivalent(&self, other: &Dfa<E>) -> Option<bool> {
        xor(self, other).vacuous()
    }
}
