//! Rewrite rules that bring a designator to a canonical form.
//!
//! Every rule preserves the designated set. Rules that consult the
//! three-valued queries only fire on `Some(..)` answers.

use super::designator::{TypeDesignator, TypeKind};
use super::queries::{Activity, guarded};
use crate::fixpoint::{
    NormalForm, Rule, find_simplifier, fixed_point, remove_duplicates, sorted_unique,
};
use crate::value::Value;

impl TypeDesignator {
    /// Rewrite to a fixed point of the simplification rules.
    ///
    /// With `NormalForm::Dnf` the result is an `Or` of `And`s of literals,
    /// with `NormalForm::Cnf` an `And` of `Or`s. Results are memoized.
    pub fn canonicalize(&self, nf: NormalForm) -> TypeDesignator {
        if let Some(canonical) = self.cached_canonical(nf) {
            return canonical;
        }
        // Re-entered through a query: answer with the term itself.
        let Some(canonical) = guarded(Activity::Canonicalize(self.clone(), nf), || {
            fixed_point(self.clone(), |td| td.canonicalize_once(nf))
        }) else {
            return self.clone();
        };
        self.store_canonical(nf, &canonical);
        canonical
    }

    fn canonicalize_once(&self, nf: NormalForm) -> Option<TypeDesignator> {
        if self.cached_canonical(nf).as_ref() == Some(self) {
            return None;
        }
        let rules: &[Rule<TypeDesignator>] = match self.kind() {
            TypeKind::Member(_) => &MEMBER_RULES,
            TypeKind::Not(_) => &NOT_RULES,
            TypeKind::And(_) | TypeKind::Or(_) => &COMBINATION_RULES,
            _ => &[],
        };
        find_simplifier(self, nf, rules)
    }
}

const MEMBER_RULES: [Rule<TypeDesignator>; 2] = [member_sorted, member_trivial];

const NOT_RULES: [Rule<TypeDesignator>; 4] = [not_constant, not_not, not_de_morgan, not_operand];

const COMBINATION_RULES: [Rule<TypeDesignator>; 13] = [
    combination_trivial,
    combination_zero,
    combination_unit,
    combination_flatten,
    combination_duplicates,
    combination_complementary,
    combination_operands,
    combination_sort,
    combination_merge_enumerations,
    combination_filter_enumerations,
    combination_subsumption,
    combination_disjoint_or_covering,
    combination_distribute,
];

fn member_sorted(td: &TypeDesignator, _: NormalForm) -> Option<TypeDesignator> {
    let TypeKind::Member(vs) = td.kind() else {
        return None;
    };
    let sorted = sorted_unique(vs);
    (sorted != *vs).then(|| TypeDesignator::member(sorted))
}

fn member_trivial(td: &TypeDesignator, _: NormalForm) -> Option<TypeDesignator> {
    match td.kind() {
        TypeKind::Member(vs) if vs.is_empty() => Some(TypeDesignator::empty()),
        TypeKind::Member(vs) if vs.len() == 1 => Some(TypeDesignator::eql(vs[0].clone())),
        _ => None,
    }
}

fn negated(td: &TypeDesignator) -> Option<&TypeDesignator> {
    match td.kind() {
        TypeKind::Not(inner) => Some(inner),
        _ => None,
    }
}

fn not_constant(td: &TypeDesignator, _: NormalForm) -> Option<TypeDesignator> {
    let inner = negated(td)?;
    match inner.kind() {
        TypeKind::Top => Some(TypeDesignator::empty()),
        TypeKind::Empty => Some(TypeDesignator::top()),
        _ => None,
    }
}

fn not_not(td: &TypeDesignator, _: NormalForm) -> Option<TypeDesignator> {
    negated(negated(td)?).cloned()
}

fn not_de_morgan(td: &TypeDesignator, nf: NormalForm) -> Option<TypeDesignator> {
    if nf == NormalForm::None {
        return None;
    }
    let inner = negated(td)?;
    let flip = |tds: &[TypeDesignator]| -> Vec<TypeDesignator> {
        tds.iter().cloned().map(TypeDesignator::not).collect()
    };
    match inner.kind() {
        TypeKind::And(tds) => Some(TypeDesignator::or(flip(tds))),
        TypeKind::Or(tds) => Some(TypeDesignator::and(flip(tds))),
        _ => None,
    }
}

fn not_operand(td: &TypeDesignator, nf: NormalForm) -> Option<TypeDesignator> {
    Some(TypeDesignator::not(negated(td)?.canonicalize(nf)))
}

/// `And` or `Or`, as seen by the rules that treat them dually.
#[derive(Clone, Copy, PartialEq, Eq)]
enum Combinator {
    And,
    Or,
}

impl Combinator {
    fn of(td: &TypeDesignator) -> Option<(Combinator, &[TypeDesignator])> {
        match td.kind() {
            TypeKind::And(tds) => Some((Combinator::And, tds)),
            TypeKind::Or(tds) => Some((Combinator::Or, tds)),
            _ => None,
        }
    }

    fn create(self, operands: Vec<TypeDesignator>) -> TypeDesignator {
        match self {
            Combinator::And => TypeDesignator::and(operands),
            Combinator::Or => TypeDesignator::or(operands),
        }
    }

    fn unit(self) -> TypeDesignator {
        match self {
            Combinator::And => TypeDesignator::top(),
            Combinator::Or => TypeDesignator::empty(),
        }
    }

    fn zero(self) -> TypeDesignator {
        match self {
            Combinator::And => TypeDesignator::empty(),
            Combinator::Or => TypeDesignator::top(),
        }
    }

    fn dual(self) -> Combinator {
        match self {
            Combinator::And => Combinator::Or,
            Combinator::Or => Combinator::And,
        }
    }
}

fn combination_trivial(td: &TypeDesignator, _: NormalForm) -> Option<TypeDesignator> {
    let (combinator, tds) = Combinator::of(td)?;
    match tds {
        [] => Some(combinator.unit()),
        [single] => Some(single.clone()),
        _ => None,
    }
}

fn combination_zero(td: &TypeDesignator, _: NormalForm) -> Option<TypeDesignator> {
    let (combinator, tds) = Combinator::of(td)?;
    let zero = combinator.zero();
    tds.contains(&zero).then_some(zero)
}

fn combination_unit(td: &TypeDesignator, _: NormalForm) -> Option<TypeDesignator> {
    let (combinator, tds) = Combinator::of(td)?;
    let unit = combinator.unit();
    tds.contains(&unit)
        .then(|| combinator.create(tds.iter().filter(|x| **x != unit).cloned().collect()))
}

fn combination_flatten(td: &TypeDesignator, _: NormalForm) -> Option<TypeDesignator> {
    let (combinator, tds) = Combinator::of(td)?;
    let nested = |x: &TypeDesignator| matches!(Combinator::of(x), Some((c, _)) if c == combinator);
    if !tds.iter().any(nested) {
        return None;
    }
    let mut flat = Vec::with_capacity(tds.len());
    for x in tds {
        match Combinator::of(x) {
            Some((c, inner)) if c == combinator => flat.extend_from_slice(inner),
            _ => flat.push(x.clone()),
        }
    }
    Some(combinator.create(flat))
}

fn combination_duplicates(td: &TypeDesignator, _: NormalForm) -> Option<TypeDesignator> {
    let (combinator, tds) = Combinator::of(td)?;
    let unique = remove_duplicates(tds);
    (unique.len() != tds.len()).then(|| combinator.create(unique))
}

fn combination_complementary(td: &TypeDesignator, _: NormalForm) -> Option<TypeDesignator> {
    let (combinator, tds) = Combinator::of(td)?;
    tds.iter()
        .filter_map(negated)
        .any(|x| tds.contains(x))
        .then(|| combinator.zero())
}

fn combination_operands(td: &TypeDesignator, nf: NormalForm) -> Option<TypeDesignator> {
    let (combinator, tds) = Combinator::of(td)?;
    Some(combinator.create(tds.iter().map(|x| x.canonicalize(nf)).collect()))
}

fn combination_sort(td: &TypeDesignator, _: NormalForm) -> Option<TypeDesignator> {
    let (combinator, tds) = Combinator::of(td)?;
    let sorted = sorted_unique(tds);
    (sorted != tds).then(|| combinator.create(sorted))
}

/// Replace the operands picked by `select` with `merged`, placed where the
/// first of them stood.
fn replace_operands(
    tds: &[TypeDesignator],
    select: impl Fn(&TypeDesignator) -> bool,
    merged: TypeDesignator,
) -> Vec<TypeDesignator> {
    let mut out = Vec::with_capacity(tds.len());
    let mut merged = Some(merged);
    for x in tds {
        if !select(x) {
            out.push(x.clone());
        } else if let Some(m) = merged.take() {
            out.push(m);
        }
    }
    out
}

/// Combine several `Member`s (or several `Not(Member)`s) into one.
fn combination_merge_enumerations(td: &TypeDesignator, _: NormalForm) -> Option<TypeDesignator> {
    let (combinator, tds) = Combinator::of(td)?;
    let positive = |x: &TypeDesignator| x.enumerated().is_some();
    let negative = |x: &TypeDesignator| negated(x).is_some_and(positive);
    let intersect = |sets: Vec<Vec<Value>>| -> Vec<Value> {
        let mut sets = sets.into_iter();
        let first = sets.next().unwrap_or_default();
        sets.fold(first, |acc, set| acc.into_iter().filter(|v| set.contains(v)).collect())
    };
    let union = |sets: Vec<Vec<Value>>| -> Vec<Value> { sets.concat() };

    let positives: Vec<Vec<Value>> = tds.iter().filter_map(TypeDesignator::enumerated).collect();
    if positives.len() >= 2 {
        let values = match combinator {
            Combinator::And => intersect(positives),
            Combinator::Or => union(positives),
        };
        let merged = TypeDesignator::member(sorted_unique(&values));
        return Some(combinator.create(replace_operands(tds, positive, merged)));
    }
    let negatives: Vec<Vec<Value>> = tds
        .iter()
        .filter_map(|x| negated(x)?.enumerated())
        .collect();
    if negatives.len() >= 2 {
        let values = match combinator {
            Combinator::And => union(negatives),
            Combinator::Or => intersect(negatives),
        };
        let merged = TypeDesignator::not(TypeDesignator::member(sorted_unique(&values)));
        return Some(combinator.create(replace_operands(tds, negative, merged)));
    }
    None
}

/// Drop enumerated values that the other operands already decide.
fn combination_filter_enumerations(td: &TypeDesignator, _: NormalForm) -> Option<TypeDesignator> {
    let (combinator, tds) = Combinator::of(td)?;
    for (i, x) in tds.iter().enumerate() {
        let others = || tds.iter().enumerate().filter(move |(j, _)| *j != i).map(|(_, y)| y);
        if let Some(values) = x.enumerated() {
            // And: exactly the listed values that pass every operand.
            // Or: listed values another operand admits are redundant.
            let kept: Vec<Value> = match combinator {
                Combinator::And => {
                    return Some(TypeDesignator::member(
                        values.into_iter().filter(|v| td.typep(v)).collect::<Vec<_>>(),
                    ));
                }
                Combinator::Or => values
                    .iter()
                    .filter(|v| !others().any(|y| y.typep(v)))
                    .cloned()
                    .collect(),
            };
            if kept.len() != values.len() {
                let mut out: Vec<TypeDesignator> = tds.to_vec();
                out[i] = TypeDesignator::member(kept);
                return Some(combinator.create(out));
            }
        } else if let Some(values) = negated(x).and_then(TypeDesignator::enumerated) {
            // And: excluding a value the others reject anyway is redundant.
            // Or: excluding a value another operand admits is ineffective.
            let kept: Vec<Value> = values
                .iter()
                .filter(|v| match combinator {
                    Combinator::And => others().all(|y| y.typep(v)),
                    Combinator::Or => !others().any(|y| y.typep(v)),
                })
                .cloned()
                .collect();
            if kept.len() != values.len() {
                let mut out: Vec<TypeDesignator> = tds.to_vec();
                out[i] = TypeDesignator::not(TypeDesignator::member(kept));
                return Some(combinator.create(out));
            }
        }
    }
    None
}

/// And: drop an operand some other operand is a subtype of.
/// Or: drop an operand that is a subtype of some other operand.
fn combination_subsumption(td: &TypeDesignator, _: NormalForm) -> Option<TypeDesignator> {
    let (combinator, tds) = Combinator::of(td)?;
    let redundant = tds.iter().enumerate().position(|(i, x)| {
        tds.iter().enumerate().any(|(j, y)| {
            j != i
                && match combinator {
                    Combinator::And => y.subtypep(x),
                    Combinator::Or => x.subtypep(y),
                } == Some(true)
        })
    })?;
    let mut out = tds.to_vec();
    out.remove(redundant);
    Some(combinator.create(out))
}

/// And of two disjoint operands is empty; Or of two operands whose union is
/// everything is `Top`.
fn combination_disjoint_or_covering(td: &TypeDesignator, _: NormalForm) -> Option<TypeDesignator> {
    let (combinator, tds) = Combinator::of(td)?;
    let found = tds.iter().enumerate().any(|(i, x)| {
        tds[i + 1..].iter().any(|y| match combinator {
            Combinator::And => x.disjoint(y) == Some(true),
            Combinator::Or => TypeDesignator::not(x.clone()).subtypep(y) == Some(true),
        })
    });
    found.then(|| combinator.zero())
}

/// DNF: distribute `And` over its first `Or` operand. CNF: the dual.
fn combination_distribute(td: &TypeDesignator, nf: NormalForm) -> Option<TypeDesignator> {
    let (combinator, tds) = Combinator::of(td)?;
    let outer = match (nf, combinator) {
        (NormalForm::Dnf, Combinator::And) | (NormalForm::Cnf, Combinator::Or) => combinator.dual(),
        _ => return None,
    };
    let (k, spread) = tds.iter().enumerate().find_map(|(k, x)| match Combinator::of(x) {
        Some((c, inner)) if c == outer => Some((k, inner)),
        _ => None,
    })?;
    let terms = spread
        .iter()
        .map(|y| {
            let mut operands = tds.to_vec();
            operands[k] = y.clone();
            combinator.create(operands)
        })
        .collect();
    Some(outer.create(terms))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing;
    use crate::value::AtomicKind;

    fn atomic(kind: AtomicKind) -> TypeDesignator {
        TypeDesignator::atomic(kind)
    }

    fn even() -> TypeDesignator {
        TypeDesignator::satisfies("even", |v| matches!(v, Value::Int(i) if i % 2 == 0))
    }

    fn odd() -> TypeDesignator {
        TypeDesignator::satisfies("odd", |v| matches!(v, Value::Int(i) if i % 2 != 0))
    }

    fn canonical(td: TypeDesignator) -> String {
        td.canonicalize(NormalForm::None).to_string()
    }

    #[test]
    fn test_trivial_combinations() {
        assert_eq!(canonical(TypeDesignator::and(vec![TypeDesignator::top()])), "Top");
        assert_eq!(canonical(TypeDesignator::or(vec![])), "Empty");
        assert_eq!(canonical(TypeDesignator::and(vec![])), "Top");
        assert_eq!(
            canonical(TypeDesignator::and(vec![even(), TypeDesignator::empty()])),
            "Empty"
        );
        assert_eq!(
            canonical(TypeDesignator::or(vec![even(), TypeDesignator::not(even())])),
            "Top"
        );
    }

    #[test]
    fn test_members() {
        assert_eq!(canonical(TypeDesignator::member([3, 1, 3])), "Member(1, 3)");
        assert_eq!(canonical(TypeDesignator::member([2, 2])), "Eql(2)");
        assert_eq!(canonical(TypeDesignator::member(Vec::<Value>::new())), "Empty");
        let both = TypeDesignator::and(vec![
            TypeDesignator::member([1, 2, 3]),
            TypeDesignator::member([2, 3, 4]),
        ]);
        assert_eq!(canonical(both), "Member(2, 3)");
        let filtered = TypeDesignator::and(vec![
            TypeDesignator::member([Value::from(1), Value::from("a")]),
            atomic(AtomicKind::Int),
        ]);
        assert_eq!(canonical(filtered), "Eql(1)");
        let redundant = TypeDesignator::or(vec![
            TypeDesignator::member([1, 2]),
            atomic(AtomicKind::Int),
        ]);
        assert_eq!(canonical(redundant), "Int");
    }

    #[test]
    fn test_not() {
        assert_eq!(canonical(TypeDesignator::not(TypeDesignator::not(even()))), "Satisfies(even)");
        assert_eq!(canonical(TypeDesignator::not(TypeDesignator::top())), "Empty");
        let de_morgan = TypeDesignator::not(TypeDesignator::and(vec![even(), odd()]));
        assert_eq!(
            de_morgan.canonicalize(NormalForm::Dnf).to_string(),
            "Or(Not(Satisfies(even)), Not(Satisfies(odd)))"
        );
        assert_eq!(
            de_morgan.canonicalize(NormalForm::None).to_string(),
            "Not(And(Satisfies(even), Satisfies(odd)))"
        );
    }

    #[test]
    fn test_subsumption() {
        let td = TypeDesignator::or(vec![
            atomic(AtomicKind::Int),
            atomic(AtomicKind::Number),
            even(),
        ]);
        assert_eq!(canonical(td), "Or(Number, Satisfies(even))");
        let td = TypeDesignator::and(vec![
            atomic(AtomicKind::Int),
            atomic(AtomicKind::Number),
            even(),
        ]);
        assert_eq!(canonical(td), "And(Int, Satisfies(even))");
        let td = TypeDesignator::and(vec![
            atomic(AtomicKind::Int),
            atomic(AtomicKind::Str),
            even(),
        ]);
        assert_eq!(canonical(td), "Empty");
    }

    #[test]
    fn test_dnf_and_cnf() {
        let td = TypeDesignator::and(vec![
            TypeDesignator::or(vec![even(), odd()]),
            TypeDesignator::satisfies("small", |_| true),
        ]);
        let dnf = td.canonicalize(NormalForm::Dnf);
        assert_eq!(
            dnf.to_string(),
            "Or(And(Satisfies(even), Satisfies(small)), And(Satisfies(odd), Satisfies(small)))"
        );
        let cnf = dnf.canonicalize(NormalForm::Cnf);
        for value in [Value::from(1), Value::from(2), Value::from("x")] {
            assert_eq!(td.typep(&value), cnf.typep(&value));
        }
        assert!(matches!(cnf.kind(), TypeKind::And(_)));
    }

    #[test]
    fn test_canonicalize_is_idempotent() {
        let tds = vec![
            TypeDesignator::and(vec![
                atomic(AtomicKind::Number),
                TypeDesignator::not(TypeDesignator::member([1, 2])),
                TypeDesignator::not(TypeDesignator::eql(3)),
            ]),
            TypeDesignator::or(vec![
                TypeDesignator::and(vec![even(), atomic(AtomicKind::Int)]),
                TypeDesignator::member([Value::from("a"), Value::from(4)]),
            ]),
            TypeDesignator::not(TypeDesignator::or(vec![even(), TypeDesignator::eql("z")])),
        ];
        let witnesses = [
            Value::from(1),
            Value::from(2),
            Value::from(3),
            Value::from(4),
            Value::from(2.5),
            Value::from("a"),
            Value::from("z"),
            Value::Null,
        ];
        for td in tds {
            for nf in NormalForm::ALL {
                let once = td.canonicalize(nf);
                assert_eq!(once.canonicalize(nf), once, "{td} in {nf:?}");
                for value in &witnesses {
                    assert_eq!(td.typep(value), once.typep(value), "{td} at {value}");
                }
            }
        }
    }

    #[test]
    fn test_random_canonicalization() {
        let mut rng = testing::rng(5);
        let samples = testing::sample_values();
        for _ in 0..300 {
            let td = testing::random_designator(&mut rng, 3);
            for nf in NormalForm::ALL {
                let canonical = td.canonicalize(nf);
                assert_eq!(canonical.canonicalize(nf), canonical, "{td} in {nf:?}");
                for v in &samples {
                    assert_eq!(td.typep(v), canonical.typep(v), "{td} -> {canonical} on {v:?}");
                }
            }
        }
    }
}
