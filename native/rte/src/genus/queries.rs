//! Membership and the three-valued inhabited / disjoint / subtype queries.
//!
//! `Some(true)` and `Some(false)` are proofs; `None` means the rules at hand
//! cannot decide. `None` is never turned into a guess.

use std::cell::RefCell;
use std::collections::HashSet;

use super::designator::{TypeDesignator, TypeKind};
use crate::fixpoint::{NormalForm, sorted_unique};
use crate::value::{LeafSet, Value, finite_extent_of};

/// A query in flight on the current thread.
#[derive(Clone, PartialEq, Eq, Hash)]
pub(crate) enum Activity {
    Inhabited(TypeDesignator),
    Disjoint(TypeDesignator, TypeDesignator),
    Subtype(TypeDesignator, TypeDesignator),
    Canonicalize(TypeDesignator, NormalForm),
}

thread_local! {
    static ACTIVE: RefCell<HashSet<Activity>> = RefCell::new(HashSet::new());
}

/// Run `compute` unless the same activity is already running further up the
/// stack, in which case `None` is returned and nothing is computed.
pub(crate) fn guarded<R>(activity: Activity, compute: impl FnOnce() -> R) -> Option<R> {
    if !ACTIVE.with(|active| active.borrow_mut().insert(activity.clone())) {
        return None;
    }
    let result = compute();
    ACTIVE.with(|active| active.borrow_mut().remove(&activity));
    Some(result)
}

/// `Some(true)` if every answer is `Some(true)`, `Some(false)` if any is
/// `Some(false)`, otherwise Unknown.
fn conjunction(answers: impl IntoIterator<Item = Option<bool>>) -> Option<bool> {
    let mut all = Some(true);
    for answer in answers {
        match answer {
            Some(false) => return Some(false),
            None => all = None,
            Some(true) => {}
        }
    }
    all
}

/// `Some(true)` if any answer is `Some(true)`, `Some(false)` if all are
/// `Some(false)`, otherwise Unknown.
fn disjunction(answers: impl IntoIterator<Item = Option<bool>>) -> Option<bool> {
    conjunction(answers.into_iter().map(|a| a.map(|b| !b))).map(|b| !b)
}

impl TypeDesignator {
    /// Is `value` a member of the designated set?
    pub fn typep(&self, value: &Value) -> bool {
        match self.kind() {
            TypeKind::Empty => false,
            TypeKind::Top => true,
            TypeKind::Atomic(kind) => kind.contains(value),
            TypeKind::Eql(v) => v == value,
            TypeKind::Member(vs) => vs.contains(value),
            TypeKind::Satisfies(p) => p.test(value),
            TypeKind::Not(td) => !td.typep(value),
            TypeKind::And(tds) => tds.iter().all(|td| td.typep(value)),
            TypeKind::Or(tds) => tds.iter().any(|td| td.typep(value)),
        }
    }

    /// The leaf categories of a tree built only from `Top`, `Empty`,
    /// `Atomic`, `And`, `Or` and `Not`. Such trees are decided exactly.
    pub(crate) fn leaf_extent(&self) -> Option<LeafSet> {
        match self.kind() {
            TypeKind::Empty => Some(LeafSet::EMPTY),
            TypeKind::Top => Some(LeafSet::ALL),
            TypeKind::Atomic(kind) => Some(kind.leaves()),
            TypeKind::Not(td) => td.leaf_extent().map(LeafSet::complement),
            TypeKind::And(tds) => tds
                .iter()
                .try_fold(LeafSet::ALL, |acc, td| Some(acc.intersection(td.leaf_extent()?))),
            TypeKind::Or(tds) => tds
                .iter()
                .try_fold(LeafSet::EMPTY, |acc, td| Some(acc.union(td.leaf_extent()?))),
            _ => None,
        }
    }

    /// A finite superset of the designated values, when one is known.
    fn enumeration(&self) -> Option<Vec<Value>> {
        if let Some(values) = self.enumerated() {
            return Some(values);
        }
        match self.kind() {
            TypeKind::Empty => Some(Vec::new()),
            TypeKind::And(tds) => tds.iter().find_map(TypeDesignator::enumeration),
            TypeKind::Or(tds) => tds
                .iter()
                .map(TypeDesignator::enumeration)
                .collect::<Option<Vec<_>>>()
                .map(|parts| parts.concat()),
            _ => finite_extent_of(self.leaf_extent()?),
        }
    }

    /// Exactly the designated values, when the set is known to be finite.
    pub(crate) fn exact_extent(&self) -> Option<Vec<Value>> {
        let values: Vec<Value> = self
            .enumeration()?
            .into_iter()
            .filter(|v| self.typep(v))
            .collect();
        Some(sorted_unique(&values))
    }

    /// Is the designated set provably infinite?
    fn is_infinite(&self) -> bool {
        let infinite_leaves = |leaves: LeafSet| finite_extent_of(leaves).is_none();
        if let Some(leaves) = self.leaf_extent() {
            return infinite_leaves(leaves);
        }
        match self.kind() {
            TypeKind::Not(td) => td.enumeration().is_some(),
            TypeKind::Or(tds) => tds.iter().any(TypeDesignator::is_infinite),
            // A union of categories minus finitely many values.
            TypeKind::And(tds) => {
                let mut leaves = LeafSet::ALL;
                for td in tds {
                    match (td.leaf_extent(), td.kind()) {
                        (Some(extent), _) => leaves = leaves.intersection(extent),
                        (None, TypeKind::Not(inner)) if inner.enumeration().is_some() => {}
                        _ => return false,
                    }
                }
                infinite_leaves(leaves)
            }
            _ => false,
        }
    }

    /// Is the designated set non-empty?
    pub fn inhabited(&self) -> Option<bool> {
        if let Some(&known) = self.memo().inhabited.get() {
            return known;
        }
        let computed = guarded(Activity::Inhabited(self.clone()), || self.inhabited_down())?;
        let _ = self.memo().inhabited.set(computed);
        computed
    }

    fn inhabited_down(&self) -> Option<bool> {
        match self.kind() {
            TypeKind::Empty => return Some(false),
            TypeKind::Top | TypeKind::Atomic(_) | TypeKind::Eql(_) => return Some(true),
            TypeKind::Member(vs) => return Some(!vs.is_empty()),
            TypeKind::Satisfies(_) => return None,
            _ => {}
        }
        if let Some(leaves) = self.leaf_extent() {
            return Some(!leaves.is_empty());
        }
        if let Some(values) = self.exact_extent() {
            return Some(!values.is_empty());
        }
        if self.is_infinite() {
            return Some(true);
        }
        let structural = match self.kind() {
            TypeKind::Not(td) => match td.kind() {
                TypeKind::Not(inner) => inner.inhabited(),
                _ if td.inhabited() == Some(false) => Some(true),
                TypeKind::And(tds) => tds
                    .iter()
                    .any(|td| TypeDesignator::not(td.clone()).inhabited() == Some(true))
                    .then_some(true),
                _ => None,
            },
            TypeKind::And(tds) => {
                let empty_operand = tds.iter().any(|td| td.inhabited() == Some(false));
                let disjoint_pair = tds.iter().enumerate().any(|(i, a)| {
                    tds[i + 1..].iter().any(|b| a.disjoint(b) == Some(true))
                });
                (empty_operand || disjoint_pair).then_some(false)
            }
            TypeKind::Or(tds) => disjunction(tds.iter().map(TypeDesignator::inhabited)),
            _ => None,
        };
        structural.or_else(|| {
            let dnf = self.canonicalize(NormalForm::Dnf);
            if dnf == *self { None } else { dnf.inhabited() }
        })
    }

    fn cached_pair(&self, other: &TypeDesignator, disjoint: bool) -> Option<Option<bool>> {
        let cache = |td: &TypeDesignator, key: &TypeDesignator| {
            if disjoint {
                td.memo().disjoint.get(key)
            } else {
                td.memo().subtypep.get(key)
            }
        };
        if disjoint {
            cache(self, other).or_else(|| cache(other, self))
        } else {
            cache(self, other)
        }
    }

    /// Are the two designated sets disjoint? Always symmetric.
    pub fn disjoint(&self, other: &TypeDesignator) -> Option<bool> {
        if self == other {
            return self.inhabited().map(|inhabited| !inhabited);
        }
        if let Some(known) = self.cached_pair(other, true) {
            return known;
        }
        let (low, high) = if self < other {
            (self, other)
        } else {
            (other, self)
        };
        let computed = guarded(Activity::Disjoint(low.clone(), high.clone()), || {
            self.disjoint_down(other)
                .or_else(|| other.disjoint_down(self))
                .or_else(|| {
                    let c1 = self.canonicalize(NormalForm::None);
                    let c2 = other.canonicalize(NormalForm::None);
                    if c1 == *self && c2 == *other {
                        None
                    } else if c1 == c2 {
                        c1.inhabited().map(|inhabited| !inhabited)
                    } else {
                        c1.disjoint_down(&c2).or_else(|| c2.disjoint_down(&c1))
                    }
                })
        })?;
        for (td, key) in [(self, other), (other, self)] {
            if !td.is_registered() {
                td.memo().disjoint.insert(key, computed);
            }
        }
        computed
    }

    /// Local disjointness rules, looking at `self`'s variant.
    fn disjoint_down(&self, t: &TypeDesignator) -> Option<bool> {
        if let (Some(l1), Some(l2)) = (self.leaf_extent(), t.leaf_extent()) {
            return Some(l1.intersection(l2).is_empty());
        }
        if let Some(values) = self.exact_extent() {
            return Some(!values.iter().any(|v| t.typep(v)));
        }
        let local = match self.kind() {
            TypeKind::Empty => Some(true),
            TypeKind::Top => t.inhabited().map(|inhabited| !inhabited),
            // Not(x) misses t exactly when t is inside x.
            TypeKind::Not(x) => t.subtypep(x),
            TypeKind::And(tds) => tds
                .iter()
                .any(|td| td.disjoint(t) == Some(true))
                .then_some(true),
            TypeKind::Or(tds) => conjunction(tds.iter().map(|td| td.disjoint(t))),
            _ => None,
        };
        local.or_else(|| {
            (self.inhabited() == Some(true) && self.subtypep(t) == Some(true)).then_some(false)
        })
    }

    /// Is every value of `self` also a value of `t`?
    pub fn subtypep(&self, t: &TypeDesignator) -> Option<bool> {
        if self == t {
            return Some(true);
        }
        if let Some(known) = self.cached_pair(t, false) {
            return known;
        }
        let computed = guarded(Activity::Subtype(self.clone(), t.clone()), || {
            self.subtypep_compute(t)
        })?;
        if !self.is_registered() {
            self.memo().subtypep.insert(t, computed);
        }
        computed
    }

    fn subtypep_compute(&self, t: &TypeDesignator) -> Option<bool> {
        if let (Some(l1), Some(l2)) = (self.leaf_extent(), t.leaf_extent()) {
            return Some(l1.is_subset(l2));
        }
        if let Some(values) = self.exact_extent() {
            return Some(values.iter().all(|v| t.typep(v)));
        }
        if t.is_top() || self.inhabited() == Some(false) {
            return Some(true);
        }
        if self.inhabited() == Some(true) && t.inhabited() == Some(false) {
            return Some(false);
        }
        if self.is_infinite() && t.exact_extent().is_some() {
            return Some(false);
        }
        let right = match t.kind() {
            // x <: Not(y) exactly when x and y are disjoint.
            TypeKind::Not(y) => self.disjoint(y),
            TypeKind::And(ys) => conjunction(ys.iter().map(|y| self.subtypep(y))),
            TypeKind::Or(ys) => ys
                .iter()
                .any(|y| self.subtypep(y) == Some(true))
                .then_some(true),
            _ => None,
        };
        right
            .or_else(|| self.subtypep_down(t))
            .or_else(|| {
                (self.inhabited() == Some(true) && self.disjoint(t) == Some(true)).then_some(false)
            })
            .or_else(|| {
                let c1 = self.canonicalize(NormalForm::None);
                let c2 = t.canonicalize(NormalForm::None);
                if c1 == *self && c2 == *t {
                    None
                } else {
                    c1.subtypep(&c2)
                }
            })
    }

    /// Local subtype rules, looking at `self`'s variant.
    fn subtypep_down(&self, t: &TypeDesignator) -> Option<bool> {
        match self.kind() {
            TypeKind::Top => TypeDesignator::not(t.clone())
                .inhabited()
                .map(|inhabited| !inhabited),
            TypeKind::Not(x) => match t.kind() {
                TypeKind::Not(y) => y.subtypep(x),
                // The complement of a finite set is not inside a set whose
                // own complement is infinite.
                _ if x.enumeration().is_some()
                    && TypeDesignator::not(t.clone()).is_infinite() =>
                {
                    Some(false)
                }
                _ => None,
            },
            TypeKind::And(tds) => tds
                .iter()
                .any(|td| td.subtypep(t) == Some(true))
                .then_some(true),
            TypeKind::Or(tds) => conjunction(tds.iter().map(|td| td.subtypep(t))),
            _ => None,
        }
    }
}
