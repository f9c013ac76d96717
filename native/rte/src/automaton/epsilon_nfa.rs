//! Epsilon Non-deterministic Finite Automaton (ε-NFA) with designator labels,
//! and its Thompson construction from an [`Rte`].

use std::collections::{HashMap, VecDeque};

use crate::automaton::dfa::{Dfa, ExitValue};
use crate::automaton::product::intersection;
use crate::automaton::state::{StateId, StateSet};
use crate::automaton::symbol::{Alphabet, EPSILON, SymbolId, is_epsilon};
use crate::genus::TypeDesignator;
use crate::log::targets;
use crate::rte::{Rte, RteKind};

/// An Epsilon Non-deterministic Finite Automaton with a single start state.
#[derive(Debug, Clone)]
pub struct EpsilonNfa {
    /// Number of states (states are numbered 0..num_states)
    num_states: StateId,
    start_state: StateId,
    final_states: StateSet,
    /// Transitions: (source, symbol) -> set of destination states.
    /// For epsilon transitions, symbol == EPSILON
    transitions: HashMap<(StateId, SymbolId), StateSet>,
    alphabet: Alphabet,
    /// Cached epsilon closures for each state
    epsilon_closures: Option<Vec<StateSet>>,
}

impl EpsilonNfa {
    /// Create an ε-NFA with a single start state `0` and no transitions.
    pub fn new() -> Self {
        Self {
            num_states: 1,
            start_state: 0,
            final_states: StateSet::with_capacity(16),
            transitions: HashMap::new(),
            alphabet: Alphabet::default(),
            epsilon_closures: None,
        }
    }

    /// Allocate a fresh state.
    pub fn add_state(&mut self) -> StateId {
        let state = self.num_states;
        self.num_states += 1;
        self.epsilon_closures = None;
        state
    }

    fn ensure_state(&mut self, state: StateId) {
        if state >= self.num_states {
            self.num_states = state + 1;
            self.epsilon_closures = None;
        }
    }

    fn add_symbol_transition(&mut self, source: StateId, symbol: SymbolId, destination: StateId) {
        self.ensure_state(source);
        self.ensure_state(destination);
        let capacity = self.num_states as usize;
        self.transitions
            .entry((source, symbol))
            .or_insert_with(|| StateSet::with_capacity(capacity))
            .insert(destination);
        self.epsilon_closures = None;
    }

    /// Add a transition from source to destination on values of `label`.
    pub fn add_transition(&mut self, source: StateId, label: TypeDesignator, destination: StateId) {
        let symbol = self.alphabet.intern(label);
        self.add_symbol_transition(source, symbol, destination);
    }

    /// Add an epsilon transition from source to destination.
    pub fn add_epsilon_transition(&mut self, source: StateId, destination: StateId) {
        self.add_symbol_transition(source, EPSILON, destination);
    }

    /// Set the start state. [`trim`](Self::trim) moves it to state `0`.
    pub fn set_start_state(&mut self, state: StateId) {
        self.ensure_state(state);
        self.start_state = state;
    }

    /// Add a final (accepting) state.
    pub fn add_final_state(&mut self, state: StateId) {
        self.ensure_state(state);
        self.final_states.insert(state);
    }

    pub fn num_states(&self) -> StateId {
        self.num_states
    }

    pub fn start_state(&self) -> StateId {
        self.start_state
    }

    pub fn final_states(&self) -> &StateSet {
        &self.final_states
    }

    /// The labels in use, excluding epsilon.
    pub fn alphabet(&self) -> &Alphabet {
        &self.alphabet
    }

    /// Compute the epsilon closure of a single state using DFS.
    fn epsilon_closure_single(&self, state: StateId) -> StateSet {
        let mut closure = StateSet::with_capacity(self.num_states as usize);
        let mut stack = vec![state];

        while let Some(s) = stack.pop() {
            if !closure.insert(s) {
                continue;
            }
            if let Some(destinations) = self.transitions.get(&(s, EPSILON)) {
                stack.extend(destinations.iter().filter(|&d| !closure.contains(d)));
            }
        }

        closure
    }

    /// Compute epsilon closures for all states (cached).
    pub fn compute_epsilon_closures(&mut self) {
        if self.epsilon_closures.is_some() {
            return;
        }
        let closures = (0..self.num_states)
            .map(|state| self.epsilon_closure_single(state))
            .collect();
        self.epsilon_closures = Some(closures);
    }

    /// Get the epsilon closure of a set of states.
    pub fn epsilon_closure(&self, states: &StateSet) -> StateSet {
        let mut closure = StateSet::with_capacity(self.num_states as usize);
        match &self.epsilon_closures {
            Some(cached) => {
                for state in states.iter() {
                    if let Some(single) = cached.get(state as usize) {
                        closure.union_with(single);
                    }
                }
            }
            None => {
                for state in states.iter() {
                    closure.union_with(&self.epsilon_closure_single(state));
                }
            }
        }
        closure
    }

    /// The states reachable from `states` on `symbol`, closed under epsilon.
    pub fn move_on_symbol(&self, states: &StateSet, symbol: SymbolId) -> StateSet {
        assert!(!is_epsilon(symbol), "Use epsilon_closure for epsilon moves");

        let mut reached = StateSet::with_capacity(self.num_states as usize);
        for state in states.iter() {
            if let Some(destinations) = self.transitions.get(&(state, symbol)) {
                reached.union_with(destinations);
            }
        }

        self.epsilon_closure(&reached)
    }

    /// All transitions as (source, symbol, destination).
    pub fn transitions(&self) -> impl Iterator<Item = (StateId, SymbolId, StateId)> + '_ {
        self.transitions
            .iter()
            .flat_map(|(&(src, sym), dests)| dests.iter().map(move |dst| (src, sym, dst)))
    }

    /// An equivalent automaton without epsilon transitions: every state takes
    /// over the labeled transitions of its epsilon closure, and is final if
    /// its closure holds a final state.
    pub fn remove_epsilons(&mut self) -> EpsilonNfa {
        self.compute_epsilon_closures();
        let mut out = EpsilonNfa {
            num_states: self.num_states,
            start_state: self.start_state,
            final_states: StateSet::with_capacity(self.num_states as usize),
            transitions: HashMap::new(),
            alphabet: self.alphabet.clone(),
            epsilon_closures: None,
        };
        for state in 0..self.num_states {
            let closure =
                self.epsilon_closure(&StateSet::singleton(state, self.num_states as usize));
            if closure.intersects(&self.final_states) {
                out.add_final_state(state);
            }
            for through in closure.iter() {
                for symbol in self.alphabet.symbols() {
                    if let Some(destinations) = self.transitions.get(&(through, symbol)) {
                        for destination in destinations.iter() {
                            out.add_symbol_transition(state, symbol, destination);
                        }
                    }
                }
            }
        }
        out
    }

    /// Keep only states reachable from the start and able to reach a final
    /// state. The start keeps its place as state `0` of the result.
    pub fn trim(&self) -> EpsilonNfa {
        let n = self.num_states as usize;
        let mut successors: Vec<Vec<StateId>> = vec![Vec::new(); n];
        let mut predecessors: Vec<Vec<StateId>> = vec![Vec::new(); n];
        for (src, _, dst) in self.transitions() {
            successors[src as usize].push(dst);
            predecessors[dst as usize].push(src);
        }
        let search = |roots: Vec<StateId>, links: &[Vec<StateId>]| -> StateSet {
            let mut seen: StateSet = roots.iter().copied().collect();
            let mut queue: VecDeque<StateId> = roots.into();
            while let Some(state) = queue.pop_front() {
                for &next in &links[state as usize] {
                    if seen.insert(next) {
                        queue.push_back(next);
                    }
                }
            }
            seen
        };
        let reachable = search(vec![self.start_state], &successors[..]);
        let coreachable = search(self.final_states.to_vec(), &predecessors[..]);

        let mut renumber: HashMap<StateId, StateId> = HashMap::from([(self.start_state, 0)]);
        for state in reachable.iter() {
            if state != self.start_state && coreachable.contains(state) {
                let next = renumber.len() as StateId;
                renumber.insert(state, next);
            }
        }
        let mut out = EpsilonNfa::new();
        out.alphabet = self.alphabet.clone();
        for (src, symbol, dst) in self.transitions() {
            if let (Some(&src), Some(&dst)) = (renumber.get(&src), renumber.get(&dst)) {
                out.add_symbol_transition(src, symbol, dst);
            }
        }
        for state in self.final_states.iter() {
            if let Some(&state) = renumber.get(&state) {
                out.add_final_state(state);
            }
        }
        out
    }

    /// Build an ε-NFA recognizing `rte` from structural fragments.
    ///
    /// `And` and `Not` have no fragment of their own; their operands are
    /// compiled to automata, combined by product or complement, and embedded.
    pub fn thompson(rte: &Rte) -> EpsilonNfa {
        let mut nfa = EpsilonNfa::new();
        let (ini, out) = nfa.fragment(rte);
        nfa.add_epsilon_transition(0, ini);
        nfa.add_final_state(out);
        log::debug!(target: targets::THOMPSON, "{rte} built into {} ε-NFA states", nfa.num_states);
        nfa
    }

    /// Add the fragment for `rte`, returning its entry and exit states.
    fn fragment(&mut self, rte: &Rte) -> (StateId, StateId) {
        match rte.kind() {
            RteKind::EmptySet => (self.add_state(), self.add_state()),
            RteKind::Epsilon => self.labeled_fragment(None),
            RteKind::Sigma => self.labeled_fragment(Some(TypeDesignator::top())),
            RteKind::Singleton(td) => self.labeled_fragment(Some(td.clone())),
            RteKind::Cat(rs) => {
                let ini = self.add_state();
                let mut out = ini;
                for r in rs {
                    let (i, o) = self.fragment(r);
                    self.add_epsilon_transition(out, i);
                    out = o;
                }
                (ini, out)
            }
            RteKind::Star(r) => {
                let (ini, out) = (self.add_state(), self.add_state());
                let (i, o) = self.fragment(r);
                self.add_epsilon_transition(ini, i);
                self.add_epsilon_transition(o, out);
                self.add_epsilon_transition(ini, out);
                self.add_epsilon_transition(o, i);
                (ini, out)
            }
            RteKind::Or(rs) => {
                let (ini, out) = (self.add_state(), self.add_state());
                for r in rs {
                    let (i, o) = self.fragment(r);
                    self.add_epsilon_transition(ini, i);
                    self.add_epsilon_transition(o, out);
                }
                (ini, out)
            }
            RteKind::And(rs) => {
                let dfa = rs
                    .iter()
                    .map(|r| r.to_dfa_thompson(true))
                    .reduce(|a, b| intersection(&a, &b))
                    .unwrap_or_else(|| Rte::universe().to_dfa_thompson(true));
                self.embed(&dfa)
            }
            RteKind::Not(r) => self.embed(&r.to_dfa_thompson(true).complement(true)),
        }
    }

    fn labeled_fragment(&mut self, label: Option<TypeDesignator>) -> (StateId, StateId) {
        let (ini, out) = (self.add_state(), self.add_state());
        match label {
            Some(label) => self.add_transition(ini, label, out),
            None => self.add_epsilon_transition(ini, out),
        }
        (ini, out)
    }

    /// Copy the states of `dfa` in as a fragment whose exit is reached by
    /// epsilon from every accepting state.
    fn embed<E: ExitValue>(&mut self, dfa: &Dfa<E>) -> (StateId, StateId) {
        let offset = self.num_states;
        for _ in 0..dfa.num_states() {
            self.add_state();
        }
        let out = self.add_state();
        for (src, dst, label) in dfa.to_graph() {
            self.add_transition(offset + src, label, offset + dst);
        }
        for &accepting in dfa.exit_map().keys() {
            self.add_epsilon_transition(offset + accepting, out);
        }
        (offset, out)
    }
}

impl Default for EpsilonNfa {
    fn default() -> Self {
        Self::new()
    }
}
