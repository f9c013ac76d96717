//! Rewrite-to-fixed-point engine shared by designator and Rte canonicalization.
//!
//! A term is rewritten by an ordered list of rules. The first rule that
//! produces a replacement wins and the whole list is retried on the new
//! term. A term no rule changes is a fixed point.

use std::collections::HashSet;
use std::fmt::{Debug, Display};
use std::hash::Hash;

use crate::log::targets;

/// Requested normal form of a canonicalization.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum NormalForm {
    /// Simplified, without forcing a DNF/CNF shape.
    None = 0,
    /// Disjunctive normal form: an `Or` of `And`s of literals.
    Dnf = 1,
    /// Conjunctive normal form: an `And` of `Or`s of literals.
    Cnf = 2,
}

impl NormalForm {
    pub const ALL: [NormalForm; 3] = [NormalForm::None, NormalForm::Dnf, NormalForm::Cnf];

    pub(crate) fn index(self) -> usize {
        self as usize
    }
}

/// A rewrite rule: a replacement for the term, or `None` to pass.
pub type Rule<T> = fn(&T, NormalForm) -> Option<T>;

/// Apply the first rule of `rules` that rewrites `term`.
///
/// Returns `None` when `term` is a fixed point of every rule.
pub fn find_simplifier<T>(term: &T, nf: NormalForm, rules: &[Rule<T>]) -> Option<T>
where
    T: PartialEq,
{
    rules
        .iter()
        .find_map(|rule| rule(term, nf).filter(|next| next != term))
}

/// Iterate `step` from `term` until it returns `None`.
///
/// # Panics
///
/// Panics if the iteration revisits a term, which means two rules undo each
/// other. That is an internal defect and must not be hidden by looping.
pub fn fixed_point<T, F>(term: T, mut step: F) -> T
where
    T: Clone + Eq + Hash + Display,
    F: FnMut(&T) -> Option<T>,
{
    let mut seen: HashSet<T> = HashSet::new();
    let mut current = term;
    loop {
        let Some(next) = step(&current) else {
            return current;
        };
        log::trace!(target: targets::CANONICALIZE, "{current} => {next}");
        if !seen.insert(current.clone()) || seen.contains(&next) {
            log::error!(target: targets::CANONICALIZE, "Rewrite cycle through {next}");
            panic!("canonicalization revisited {next}: rewrite rules do not terminate");
        }
        current = next;
    }
}

/// Reorder `items` and drop duplicates.
pub(crate) fn sorted_unique<T: Ord + Clone>(items: &[T]) -> Vec<T> {
    let mut out = items.to_vec();
    out.sort();
    out.dedup();
    out
}

/// Drop later duplicates, preserving first-occurrence order.
pub(crate) fn remove_duplicates<T: Eq + Hash + Clone>(items: &[T]) -> Vec<T> {
    let mut seen = HashSet::new();
    items
        .iter()
        .filter(|item| seen.insert((*item).clone()))
        .cloned()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Clone, Debug, PartialEq, Eq, Hash)]
    struct Num(i32);

    impl Display for Num {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            write!(f, "{}", self.0)
        }
    }

    fn halve(n: &Num, _: NormalForm) -> Option<Num> {
        (n.0 % 2 == 0 && n.0 != 0).then(|| Num(n.0 / 2))
    }

    fn decrement(n: &Num, _: NormalForm) -> Option<Num> {
        (n.0 > 1).then(|| Num(n.0 - 1))
    }

    const RULES: [Rule<Num>; 2] = [halve, decrement];

    #[test]
    fn test_first_rule_wins() {
        assert_eq!(find_simplifier(&Num(8), NormalForm::None, &RULES), Some(Num(4)));
        assert_eq!(find_simplifier(&Num(7), NormalForm::None, &RULES), Some(Num(6)));
        assert_eq!(find_simplifier(&Num(1), NormalForm::None, &RULES), None);
    }

    #[test]
    fn test_fixed_point_terminates() {
        let result = fixed_point(Num(37), |n| find_simplifier(n, NormalForm::None, &RULES));
        assert_eq!(result, Num(1));
    }

    #[test]
    #[should_panic(expected = "revisited")]
    fn test_cycle_aborts() {
        fixed_point(Num(0), |n| Some(Num(1 - n.0)));
    }

    #[test]
    fn test_duplicate_helpers() {
        assert_eq!(remove_duplicates(&[3, 1, 3, 2, 1]), vec![3, 1, 2]);
        assert_eq!(sorted_unique(&[3, 1, 3, 2, 1]), vec![1, 2, 3]);
    }
}
