//! Partition refinement minimization of symbolic automata.

use std::collections::BTreeMap;

use crate::automaton::dfa::{Dfa, ExitValue};
use crate::automaton::state::{StateId, StateSet};
use crate::fixpoint::NormalForm;
use crate::genus::TypeDesignator;
use crate::log::targets;

/// For each block reached from a state, the union of the labels reaching it.
type Signature = Vec<(usize, TypeDesignator)>;

impl<E: ExitValue> Dfa<E> {
    /// Merge states that cannot be told apart, preserving the language and
    /// the exit values.
    ///
    /// Labels are compared semantically, so two states whose edges into the
    /// same blocks are written differently still merge when the algebra can
    /// show the labels equal. When it cannot, the states stay apart, which is
    /// always safe but may leave the result short of minimal.
    pub fn minimize(&self) -> Dfa<E> {
        let dfa = self.trim();
        let num_states = dfa.num_states();

        // Initial partition: non-final states, then final states by exit value
        let mut partitions: Vec<StateSet> = Vec::new();
        let non_final: StateSet = (0..num_states as StateId)
            .filter(|state| dfa.exit_value(*state).is_none())
            .collect();
        if !non_final.is_empty() {
            partitions.push(non_final);
        }
        let mut by_exit: BTreeMap<&E, StateSet> = BTreeMap::new();
        for (&state, exit) in dfa.exit_map() {
            by_exit
                .entry(exit)
                .or_insert_with(|| StateSet::with_capacity(num_states))
                .insert(state);
        }
        partitions.extend(by_exit.into_values());

        loop {
            let block_of = block_index(&partitions, num_states);
            let mut refined: Vec<StateSet> = Vec::with_capacity(partitions.len());
            for partition in &partitions {
                let mut groups: Vec<(Signature, StateSet)> = Vec::new();
                for state in partition.iter() {
                    let signature = signature(&dfa, state, &block_of);
                    match groups.iter_mut().find(|(other, _)| same_signature(other, &signature)) {
                        Some((_, group)) => {
                            group.insert(state);
                        }
                        None => groups.push((signature, StateSet::singleton(state, num_states))),
                    }
                }
                refined.extend(groups.into_iter().map(|(_, group)| group));
            }
            log::trace!(
                target: targets::MINIMIZE,
                "refined {} blocks into {}",
                partitions.len(),
                refined.len()
            );
            let stable = refined.len() == partitions.len();
            partitions = refined;
            if stable {
                break;
            }
        }

        // The block holding the start becomes state 0
        let block_of = block_index(&partitions, num_states);
        let start_block = block_of[0];
        let renumber = |block: usize| -> StateId {
            match block {
                b if b == start_block => 0,
                b if b < start_block => b as StateId + 1,
                b => b as StateId,
            }
        };
        let mut edges: Vec<Vec<(TypeDesignator, StateId)>> = vec![Vec::new(); partitions.len()];
        let mut exit_map: BTreeMap<StateId, E> = BTreeMap::new();
        for (block, partition) in partitions.iter().enumerate() {
            let Some(representative) = partition.first() else {
                continue;
            };
            let state = renumber(block);
            edges[state as usize] = signature(&dfa, representative, &block_of)
                .into_iter()
                .map(|(target, label)| (label, renumber(target)))
                .collect();
            if let Some(exit) = dfa.exit_value(representative) {
                exit_map.insert(state, exit.clone());
            }
        }
        log::debug!(
            target: targets::MINIMIZE,
            "minimized {} states to {}",
            self.num_states(),
            partitions.len()
        );
        Dfa::new(edges, exit_map)
    }
}

fn block_index(partitions: &[StateSet], num_states: usize) -> Vec<usize> {
    let mut block_of = vec![0; num_states];
    for (block, partition) in partitions.iter().enumerate() {
        for state in partition.iter() {
            block_of[state as usize] = block;
        }
    }
    block_of
}

fn signature<E: ExitValue>(dfa: &Dfa<E>, state: StateId, block_of: &[usize]) -> Signature {
    let mut by_block: BTreeMap<usize, Vec<TypeDesignator>> = BTreeMap::new();
    for (label, &target) in dfa.states()[state as usize].transitions() {
        by_block.entry(block_of[target as usize]).or_default().push(label.clone());
    }
    by_block
        .into_iter()
        .map(|(block, mut labels)| {
            let label = if labels.len() == 1 {
                labels.remove(0)
            } else {
                TypeDesignator::or(labels).canonicalize(NormalForm::None)
            };
            (block, label)
        })
        .collect()
}

fn same_signature(a: &Signature, b: &Signature) -> bool {
    a.len() == b.len()
        && a.iter().zip(b).all(|((block_a, label_a), (block_b, label_b))| {
            block_a == block_b
                && (label_a == label_b
                    || (label_a.subtypep(label_b) == Some(true)
                        && label_b.subtypep(label_a) == Some(true)))
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rte::Rte;
    use crate::value::{AtomicKind, Value};

    fn atomic(kind: AtomicKind) -> TypeDesignator {
        TypeDesignator::atomic(kind)
    }

    #[test]
    fn test_merges_equivalent_states() {
        // Int Int | Str Int
        let dfa = Dfa::new(
            vec![
                vec![(atomic(AtomicKind::Int), 1), (atomic(AtomicKind::Str), 2)],
                vec![(atomic(AtomicKind::Int), 3)],
                vec![(atomic(AtomicKind::Int), 3)],
                vec![],
            ],
            BTreeMap::from([(3, true)]),
        );
        let min = dfa.minimize();
        assert_eq!(min.num_states(), 3);
        assert_eq!(min.simulate(&[Value::from("a"), Value::from(1)]), Some(true));
        assert_eq!(min.simulate(&[Value::from(1), Value::from(1)]), Some(true));
        assert_eq!(min.simulate(&[Value::from(1)]), None);
        assert_eq!(min.equivalent(&dfa), Some(true));
    }

    #[test]
    fn test_exit_values_are_kept_apart() {
        let dfa = Dfa::new(
            vec![
                vec![(atomic(AtomicKind::Int), 1), (atomic(AtomicKind::Str), 2)],
                vec![],
                vec![],
            ],
            BTreeMap::from([(1, 10), (2, 20)]),
        );
        let min = dfa.minimize();
        assert_eq!(min.num_states(), 3);
        assert_eq!(min.simulate(&[Value::from(1)]), Some(10));
        assert_eq!(min.simulate(&[Value::from("a")]), Some(20));
    }

    #[test]
    fn test_labels_compared_semantically() {
        let one_or_two = TypeDesignator::or(vec![TypeDesignator::eql(1), TypeDesignator::eql(2)]);
        let dfa = Dfa::new(
            vec![
                vec![(atomic(AtomicKind::Int), 1), (atomic(AtomicKind::Str), 2)],
                vec![(one_or_two, 3)],
                vec![(TypeDesignator::member([1, 2]), 3)],
                vec![],
            ],
            BTreeMap::from([(3, true)]),
        );
        assert_eq!(dfa.minimize().num_states(), 3);
    }

    #[test]
    fn test_minimize_derivative_automaton() {
        let int = Rte::singleton(atomic(AtomicKind::Int));
        let r = Rte::or(vec![
            Rte::cat(vec![int.clone(), Rte::star(int.clone())]),
            Rte::cat(vec![int.clone(), int.clone(), Rte::star(int)]),
        ]);
        let dfa = r.to_dfa(true).unwrap();
        let min = dfa.minimize();
        assert!(min.num_states() <= dfa.num_states());
        assert_eq!(min.equivalent(&dfa), Some(true));
        assert_eq!(min.num_states(), 2);
    }

    #[test]
    fn test_minimize_empty_language() {
        let dfa = Rte::empty_set().to_dfa(true).unwrap();
        let min = dfa.minimize();
        assert_eq!(min.num_states(), 1);
        assert!(min.is_empty());
    }
}
