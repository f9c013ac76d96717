//! Recovering an [`Rte`] from an automaton by state elimination.

use std::collections::{BTreeMap, BTreeSet};

use indexmap::IndexMap;

use crate::automaton::dfa::{Dfa, ExitValue};
use crate::log::targets;
use crate::rte::Rte;

/// Edges of the elimination graph, parallel edges merged with `Or`.
#[derive(Default)]
struct Graph {
    edges: IndexMap<(usize, usize), Rte>,
}

impl Graph {
    fn add(&mut self, src: usize, dst: usize, rte: Rte) {
        let merged = match self.edges.swap_remove(&(src, dst)) {
            Some(existing) => Rte::or(vec![existing, rte]).canonicalize(),
            None => rte,
        };
        self.edges.insert((src, dst), merged);
    }

    /// Remove `node`, bridging every path through it.
    fn eliminate(&mut self, node: usize) {
        let self_loop = match self.edges.swap_remove(&(node, node)) {
            Some(rte) => Rte::star(rte),
            None => Rte::epsilon(),
        };
        let mut incoming = Vec::new();
        let mut outgoing = Vec::new();
        self.edges.retain(|&(src, dst), rte| {
            if dst == node {
                incoming.push((src, rte.clone()));
                false
            } else if src == node {
                outgoing.push((dst, rte.clone()));
                false
            } else {
                true
            }
        });
        for (src, into) in &incoming {
            for (dst, out) in &outgoing {
                let bridge =
                    Rte::cat(vec![into.clone(), self_loop.clone(), out.clone()]).canonicalize();
                log::trace!(target: targets::EXTRACT, "{src} -> {dst} through {node}: {bridge}");
                self.add(*src, *dst, bridge);
            }
        }
    }
}

impl<E: ExitValue> Dfa<E> {
    /// One expression per exit value, denoting the sequences for which the
    /// automaton reports that value.
    ///
    /// A synthetic start node leads to state 0 and every accepting state
    /// leads to a synthetic final node for its exit value; the numbered states
    /// are then eliminated one by one, leaving the answers on the edges from
    /// the start to the finals.
    pub fn to_rte(&self) -> BTreeMap<E, Rte> {
        let dfa = self.trim();
        let num_states = dfa.num_states();
        let start = num_states;
        let finals: BTreeMap<&E, usize> = self
            .exit_map()
            .values()
            .collect::<BTreeSet<_>>()
            .into_iter()
            .enumerate()
            .map(|(i, exit)| (exit, start + 1 + i))
            .collect();

        let mut graph = Graph::default();
        graph.add(start, 0, Rte::epsilon());
        for (src, dst, label) in dfa.to_graph() {
            graph.add(src as usize, dst as usize, Rte::singleton(label));
        }
        for (&state, exit) in dfa.exit_map() {
            if let Some(&fin) = finals.get(exit) {
                graph.add(state as usize, fin, Rte::epsilon());
            }
        }
        for node in 0..num_states {
            graph.eliminate(node);
        }

        let extracted: BTreeMap<E, Rte> = finals
            .into_iter()
            .map(|(exit, fin)| {
                let rte = graph
                    .edges
                    .get(&(start, fin))
                    .map_or_else(Rte::empty_set, Rte::canonicalize);
                (exit.clone(), rte)
            })
            .collect();
        log::debug!(
            target: targets::EXTRACT,
            "extracted {} expressions from {num_states} states",
            extracted.len()
        );
        extracted
    }
}
