//! Deterministic symbolic finite automata.
//!
//! Transition labels are type designators. A state's outgoing labels are
//! pairwise not provably overlapping, so at most one of them admits any given
//! value when the automaton is used as intended. State `0` is the start.

use std::collections::{BTreeMap, VecDeque};
use std::fmt::Debug;
use std::hash::Hash;

use indexmap::IndexMap;

use crate::automaton::state::{StateId, StateSet};
use crate::fixpoint::NormalForm;
use crate::genus::TypeDesignator;
use crate::log::targets;
use crate::value::Value;

/// A value reported when an automaton accepts.
pub trait ExitValue: Clone + Eq + Hash + Ord + Debug {}

impl<T> ExitValue for T where T: Clone + Eq + Hash + Ord + Debug {}

/// A labeled edge in the graph representation: (source, destination, label).
pub type GraphEdge = (StateId, StateId, TypeDesignator);

/// One state of a [`Dfa`].
#[derive(Clone, Debug)]
pub struct State {
    index: StateId,
    accepting: bool,
    transitions: IndexMap<TypeDesignator, StateId>,
}

impl State {
    pub fn index(&self) -> StateId {
        self.index
    }

    pub fn is_initial(&self) -> bool {
        self.index == 0
    }

    pub fn is_accepting(&self) -> bool {
        self.accepting
    }

    pub fn transitions(&self) -> &IndexMap<TypeDesignator, StateId> {
        &self.transitions
    }
}

/// A deterministic symbolic finite automaton with exit values.
#[derive(Clone, Debug)]
pub struct Dfa<E> {
    states: Vec<State>,
    exit_map: BTreeMap<StateId, E>,
}

impl<E: ExitValue> Dfa<E> {
    /// Build an automaton from one edge list per state.
    ///
    /// Parallel edges to the same target are merged into one `Or` label and
    /// edges with an `Empty` label are dropped. The accepting states are the
    /// keys of `exit_map`. An empty edge list yields a single dead state.
    ///
    /// # Panics
    ///
    /// Panics if an edge or exit value names a missing state, or if two
    /// labels of one state provably overlap.
    pub fn new(edges: Vec<Vec<(TypeDesignator, StateId)>>, exit_map: BTreeMap<StateId, E>) -> Self {
        let num_states = edges.len().max(1);
        if let Some((&state, _)) = exit_map.range(num_states as StateId..).next() {
            log::error!(target: targets::AUTOMATON, "Exit value for missing state {state}");
            panic!("exit value for state {state} of a {num_states}-state automaton");
        }
        let mut states: Vec<State> = edges
            .into_iter()
            .enumerate()
            .map(|(index, edges)| {
                let index = index as StateId;
                State {
                    index,
                    accepting: exit_map.contains_key(&index),
                    transitions: merge_edges(index, edges, num_states),
                }
            })
            .collect();
        if states.is_empty() {
            states.push(State {
                index: 0,
                accepting: exit_map.contains_key(&0),
                transitions: IndexMap::new(),
            });
        }
        Self { states, exit_map }
    }

    pub fn num_states(&self) -> usize {
        self.states.len()
    }

    pub fn states(&self) -> &[State] {
        &self.states
    }

    pub fn state(&self, index: StateId) -> Option<&State> {
        self.states.get(index as usize)
    }

    pub fn exit_value(&self, state: StateId) -> Option<&E> {
        self.exit_map.get(&state)
    }

    pub fn exit_map(&self) -> &BTreeMap<StateId, E> {
        &self.exit_map
    }

    /// The per-state edge lists, in the form [`Dfa::new`] accepts.
    pub(crate) fn edges(&self) -> Vec<Vec<(TypeDesignator, StateId)>> {
        self.states
            .iter()
            .map(|state| {
                state
                    .transitions
                    .iter()
                    .map(|(label, &target)| (label.clone(), target))
                    .collect()
            })
            .collect()
    }

    /// Every edge as (source, destination, label).
    pub fn to_graph(&self) -> Vec<GraphEdge> {
        self.states
            .iter()
            .flat_map(|state| {
                state
                    .transitions
                    .iter()
                    .map(move |(label, &target)| (state.index, target, label.clone()))
            })
            .collect()
    }

    /// The state reached from `state` on `value`, if any.
    pub fn successor(&self, state: StateId, value: &Value) -> Option<StateId> {
        self.state(state)?
            .transitions
            .iter()
            .find_map(|(label, &target)| label.typep(value).then_some(target))
    }

    /// Run the automaton over `sequence`, returning the exit value of the
    /// final state when it is accepting.
    pub fn simulate(&self, sequence: &[Value]) -> Option<E> {
        let mut state = 0;
        for value in sequence {
            state = self.successor(state, value)?;
        }
        self.exit_map.get(&state).cloned()
    }

    /// States reachable from the start through edges `usable` admits.
    fn reachable_by(&self, usable: impl Fn(&TypeDesignator) -> bool) -> StateSet {
        let mut reached = StateSet::singleton(0, self.states.len());
        let mut queue = VecDeque::from([0]);
        while let Some(state) = queue.pop_front() {
            for (label, &target) in &self.states[state as usize].transitions {
                if usable(label) && reached.insert(target) {
                    queue.push_back(target);
                }
            }
        }
        reached
    }

    /// States from which some accepting state is reachable.
    fn coreachable(&self) -> StateSet {
        let mut predecessors: Vec<Vec<StateId>> = vec![Vec::new(); self.states.len()];
        for state in &self.states {
            for &target in state.transitions.values() {
                predecessors[target as usize].push(state.index);
            }
        }
        let mut reached: StateSet = self.exit_map.keys().copied().collect();
        let mut stack: Vec<StateId> = reached.to_vec();
        while let Some(state) = stack.pop() {
            for &source in &predecessors[state as usize] {
                if reached.insert(source) {
                    stack.push(source);
                }
            }
        }
        reached
    }

    /// Keep only the states in `keep` reachable from the start through
    /// kept states, renumbered in breadth-first order. The start is always
    /// kept.
    pub(crate) fn restrict(&self, keep: &StateSet) -> Self {
        let mut renumbered: IndexMap<StateId, StateId> = IndexMap::from([(0, 0)]);
        let mut edges: Vec<Vec<(TypeDesignator, StateId)>> = Vec::new();
        let mut next = 0;
        while let Some((&old, _)) = renumbered.get_index(next) {
            let mut out = Vec::new();
            for (label, &target) in &self.states[old as usize].transitions {
                if !keep.contains(target) {
                    continue;
                }
                let len = renumbered.len() as StateId;
                let new_target = *renumbered.entry(target).or_insert(len);
                out.push((label.clone(), new_target));
            }
            edges.push(out);
            next += 1;
        }
        let exit_map = renumbered
            .iter()
            .filter_map(|(old, &new)| Some((new, self.exit_map.get(old)?.clone())))
            .collect();
        Self::new(edges, exit_map)
    }

    /// Drop states not reachable from the start or unable to reach an
    /// accepting state.
    pub fn trim(&self) -> Self {
        let mut keep = self.reachable_by(|_| true);
        let coreachable = self.coreachable();
        keep = keep.iter().filter(|&s| s == 0 || coreachable.contains(s)).collect();
        self.restrict(&keep)
    }

    /// Give every state an edge for every value, routing the values no label
    /// covers to a shared sink that loops on `Top`.
    ///
    /// The residual edge is skipped only when it is provably uninhabited.
    pub fn complete(&self) -> Self {
        let sink = self.states.len() as StateId;
        let mut edges = self.edges();
        let mut needs_sink = false;
        for state_edges in &mut edges {
            let labels = state_edges.iter().map(|(label, _)| label.clone()).collect();
            let residual = TypeDesignator::not(TypeDesignator::or(labels))
                .canonicalize(NormalForm::None);
            if residual.inhabited() == Some(false) {
                continue;
            }
            state_edges.push((residual, sink));
            needs_sink = true;
        }
        if needs_sink {
            edges.push(vec![(TypeDesignator::top(), sink)]);
        }
        Self::new(edges, self.exit_map.clone())
    }

    /// The automaton accepting exactly the sequences this one rejects, all
    /// reporting `exit`.
    pub fn complement(&self, exit: E) -> Self {
        let complete = self.complete();
        let exit_map = (0..complete.states.len() as StateId)
            .filter(|state| !complete.exit_map.contains_key(state))
            .map(|state| (state, exit.clone()))
            .collect();
        Self::new(complete.edges(), exit_map)
    }

    /// Is the language empty?
    ///
    /// `Some(false)` when an accepting state is reachable through provably
    /// inhabited labels, `None` when it is only reachable through labels of
    /// unknown inhabitation.
    pub fn vacuous(&self) -> Option<bool> {
        let accepts = |reached: StateSet| self.exit_map.keys().any(|&s| reached.contains(s));
        if accepts(self.reachable_by(|label| label.inhabited() == Some(true))) {
            Some(false)
        } else if accepts(self.reachable_by(|label| label.inhabited() != Some(false))) {
            None
        } else {
            Some(true)
        }
    }

    /// Does the language contain some sequence?
    pub fn inhabited(&self) -> Option<bool> {
        self.vacuous().map(|vacuous| !vacuous)
    }

    /// Is the language provably empty?
    pub fn is_empty(&self) -> bool {
        self.vacuous() == Some(true)
    }
}

/// Merge `edges` of state `index` by target and check them for overlap.
fn merge_edges(
    index: StateId,
    edges: Vec<(TypeDesignator, StateId)>,
    num_states: usize,
) -> IndexMap<TypeDesignator, StateId> {
    let mut by_target: IndexMap<StateId, Vec<TypeDesignator>> = IndexMap::new();
    for (label, target) in edges {
        if target as usize >= num_states {
            log::error!(
                target: targets::AUTOMATON,
                "Edge {index} -> {target} leaves the automaton"
            );
            panic!("edge from state {index} to missing state {target}");
        }
        if !label.is_empty() {
            by_target.entry(target).or_default().push(label);
        }
    }
    let mut transitions: IndexMap<TypeDesignator, StateId> =
        IndexMap::with_capacity(by_target.len());
    for (target, mut labels) in by_target {
        let label = if labels.len() == 1 {
            labels.remove(0)
        } else {
            TypeDesignator::or(labels).canonicalize(NormalForm::None)
        };
        if label.is_empty() {
            continue;
        }
        for (other, other_target) in &transitions {
            let overlap = if *other == label {
                label.inhabited() != Some(false)
            } else {
                label.disjoint(other) == Some(false)
            };
            if overlap {
                log::error!(
                    target: targets::AUTOMATON,
                    "State {index}: {label} -> {target} overlaps {other} -> {other_target}"
                );
                panic!("state {index} has overlapping transitions on {label} and {other}");
            }
        }
        transitions.insert(label, target);
    }
    transitions
}
