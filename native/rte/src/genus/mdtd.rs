//! Maximal disjoint type decomposition.

use super::designator::TypeDesignator;
use crate::fixpoint::{NormalForm, remove_duplicates};
use crate::log::targets;

/// One piece of a decomposition.
///
/// `td` is the intersection of every designator in `factors` with the
/// complement of every designator in `disjoints`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MdtdAtom {
    pub td: TypeDesignator,
    pub factors: Vec<TypeDesignator>,
    pub disjoints: Vec<TypeDesignator>,
}

impl MdtdAtom {
    fn with_factor(&self, td: TypeDesignator, t: &TypeDesignator) -> Self {
        let mut factors = self.factors.clone();
        factors.push(t.clone());
        Self {
            td,
            factors,
            disjoints: self.disjoints.clone(),
        }
    }

    fn with_disjoint(&self, td: TypeDesignator, t: &TypeDesignator) -> Self {
        let mut disjoints = self.disjoints.clone();
        disjoints.push(t.clone());
        Self {
            td,
            factors: self.factors.clone(),
            disjoints,
        }
    }
}

/// Split the universe into pieces that are pairwise disjoint and each a
/// subset or complement-subset of every input designator.
///
/// Pieces proven uninhabited are dropped. Pieces whose emptiness is Unknown
/// are kept, so the union of the result is always everything.
pub fn mdtd(tds: &[TypeDesignator]) -> Vec<MdtdAtom> {
    let mut atoms = vec![MdtdAtom {
        td: TypeDesignator::top(),
        factors: Vec::new(),
        disjoints: Vec::new(),
    }];
    for t in remove_duplicates(tds) {
        let not_t = TypeDesignator::not(t.clone()).canonicalize(NormalForm::None);
        let mut next = Vec::with_capacity(atoms.len() * 2);
        for atom in &atoms {
            if atom.td.disjoint(&t) == Some(true) {
                next.push(atom.with_disjoint(atom.td.clone(), &t));
                continue;
            }
            if atom.td.subtypep(&t) == Some(true) {
                next.push(atom.with_factor(atom.td.clone(), &t));
                continue;
            }
            let inside = TypeDesignator::and(vec![atom.td.clone(), t.clone()])
                .canonicalize(NormalForm::None);
            if inside.inhabited() != Some(false) {
                next.push(atom.with_factor(inside, &t));
            }
            let outside = TypeDesignator::and(vec![atom.td.clone(), not_t.clone()])
                .canonicalize(NormalForm::None);
            if outside.inhabited() != Some(false) {
                next.push(atom.with_disjoint(outside, &t));
            }
        }
        atoms = next;
    }
    log::debug!(
        target: targets::MDTD,
        "{} designators split into {} pieces",
        tds.len(),
        atoms.len()
    );
    atoms
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::Rng;

    use crate::testing;
    use crate::value::{AtomicKind, Value};

    fn witnesses() -> Vec<Value> {
        vec![
            Value::Null,
            Value::from(true),
            Value::from(0),
            Value::from(1),
            Value::from(2),
            Value::from(7),
            Value::from(1.5),
            Value::from('c'),
            Value::from("a"),
            Value::from("b"),
            Value::from(vec![Value::from(1)]),
        ]
    }

    fn check_partition(tds: &[TypeDesignator]) -> Vec<MdtdAtom> {
        let atoms = mdtd(tds);
        for value in witnesses() {
            let owners: Vec<&MdtdAtom> = atoms.iter().filter(|a| a.td.typep(&value)).collect();
            assert_eq!(owners.len(), 1, "{value} lands in {owners:?}");
            for t in tds {
                let owner = owners[0];
                assert_eq!(owner.factors.contains(t), t.typep(&value), "{value} vs {t}");
                assert_eq!(owner.disjoints.contains(t), !t.typep(&value), "{value} vs {t}");
            }
        }
        atoms
    }

    #[test]
    fn test_empty_input() {
        let atoms = mdtd(&[]);
        assert_eq!(atoms.len(), 1);
        assert!(atoms[0].td.is_top());
    }

    #[test]
    fn test_nested_categories() {
        let atoms = check_partition(&[
            TypeDesignator::atomic(AtomicKind::Int),
            TypeDesignator::atomic(AtomicKind::Number),
        ]);
        // Int, Float, and everything that is not a number.
        assert_eq!(atoms.len(), 3);
    }

    #[test]
    fn test_values_and_predicates() {
        let even = TypeDesignator::satisfies("even", |v| matches!(v, Value::Int(i) if i % 2 == 0));
        check_partition(&[
            TypeDesignator::member([1, 2]),
            even.clone(),
            TypeDesignator::atomic(AtomicKind::Str),
            even,
            TypeDesignator::eql("a"),
        ]);
    }

    #[test]
    fn test_pieces_are_disjoint() {
        let atoms = mdtd(&[
            TypeDesignator::atomic(AtomicKind::Text),
            TypeDesignator::atomic(AtomicKind::Str),
            TypeDesignator::member([Value::from("a"), Value::from(3)]),
        ]);
        for (i, a) in atoms.iter().enumerate() {
            for b in &atoms[i + 1..] {
                assert_ne!(a.td.disjoint(&b.td), Some(false), "{} / {}", a.td, b.td);
            }
        }
    }

    #[test]
    fn test_random_decompositions_partition() {
        let mut rng = testing::rng(3);
        let samples = testing::sample_values();
        for _ in 0..50 {
            let count = rng.random_range(1..4);
            let tds: Vec<TypeDesignator> = (0..count)
                .map(|_| testing::random_designator(&mut rng, 1))
                .collect();
            let atoms = mdtd(&tds);
            for v in &samples {
                let holders: Vec<&MdtdAtom> =
                    atoms.iter().filter(|atom| atom.td.typep(v)).collect();
                assert_eq!(holders.len(), 1, "{v:?} not in exactly one piece of {atoms:?}");
                for atom in holders {
                    for td in &atom.factors {
                        assert!(td.typep(v), "{v:?} in {} but not in factor {td}", atom.td);
                    }
                    for td in &atom.disjoints {
                        assert!(!td.typep(v), "{v:?} in {} and in disjoint {td}", atom.td);
                    }
                }
            }
        }
    }
}
