//! Rewrite rules for Rte canonicalization.

use super::{Rte, RteKind};
use crate::fixpoint::{
    NormalForm, Rule, find_simplifier, fixed_point, remove_duplicates, sorted_unique,
};
use crate::genus::TypeDesignator;

impl Rte {
    /// Rewrite to a fixed point of the simplification rules. Memoized.
    pub fn canonicalize(&self) -> Rte {
        if let Some(canonical) = self.cached_canonical() {
            return canonical;
        }
        let canonical = fixed_point(self.clone(), Rte::canonicalize_once);
        self.store_canonical(&canonical);
        canonical
    }

    fn canonicalize_once(&self) -> Option<Rte> {
        if self.cached_canonical().as_ref() == Some(self) {
            return None;
        }
        let rules: &[Rule<Rte>] = match self.kind() {
            RteKind::Singleton(_) => &SINGLETON_RULES,
            RteKind::Star(_) => &STAR_RULES,
            RteKind::Cat(_) => &CAT_RULES,
            RteKind::Not(_) => &NOT_RULES,
            RteKind::And(_) | RteKind::Or(_) => &COMBINATION_RULES,
            RteKind::EmptySet | RteKind::Epsilon | RteKind::Sigma => &[],
        };
        find_simplifier(self, NormalForm::None, rules)
    }
}

const SINGLETON_RULES: [Rule<Rte>; 1] = [singleton_designator];

const STAR_RULES: [Rule<Rte>; 4] = [star_trivial, star_star, star_cat, star_operand];

const CAT_RULES: [Rule<Rte>; 7] = [
    cat_trivial,
    cat_empty_set,
    cat_epsilon,
    cat_flatten,
    cat_adjacent_stars,
    cat_star_absorbs,
    cat_operands,
];

const NOT_RULES: [Rule<Rte>; 4] = [not_primitive, not_not, not_de_morgan, not_operand];

const COMBINATION_RULES: [Rule<Rte>; 12] = [
    combination_trivial,
    combination_zero,
    combination_unit,
    combination_flatten,
    combination_duplicates,
    combination_complementary,
    combination_operands,
    combination_sort,
    combination_singletons,
    or_star_subsumes,
    combination_epsilon,
    or_not_epsilon,
];

/// `Singleton(Top)` is `Sigma`, an uninhabited `Singleton` is `EmptySet`.
fn singleton_designator(r: &Rte, _: NormalForm) -> Option<Rte> {
    let RteKind::Singleton(td) = r.kind() else {
        return None;
    };
    let td = td.canonicalize(NormalForm::None);
    Some(if td.is_top() {
        Rte::sigma()
    } else if td.inhabited() == Some(false) {
        Rte::empty_set()
    } else {
        Rte::singleton(td)
    })
}

fn star_trivial(r: &Rte, _: NormalForm) -> Option<Rte> {
    let RteKind::Star(inner) = r.kind() else {
        return None;
    };
    match inner.kind() {
        RteKind::EmptySet | RteKind::Epsilon => Some(Rte::epsilon()),
        _ => None,
    }
}

fn star_star(r: &Rte, _: NormalForm) -> Option<Rte> {
    let RteKind::Star(inner) = r.kind() else {
        return None;
    };
    matches!(inner.kind(), RteKind::Star(_)).then(|| inner.clone())
}

/// `Star(Cat(x, Star x))`, `Star(Cat(Star x, x))` and `Star(Cat(Star x, Star x))`
/// are all `Star(x)`.
fn star_cat(r: &Rte, _: NormalForm) -> Option<Rte> {
    let RteKind::Star(inner) = r.kind() else {
        return None;
    };
    let RteKind::Cat(rs) = inner.kind() else {
        return None;
    };
    let [a, b] = rs.as_slice() else {
        return None;
    };
    let starred = |r: &Rte| match r.kind() {
        RteKind::Star(x) => Some(x.clone()),
        _ => None,
    };
    match (starred(a), starred(b)) {
        (Some(x), Some(y)) if x == y => Some(Rte::star(x)),
        (Some(x), None) if x == *b => Some(Rte::star(x)),
        (None, Some(y)) if y == *a => Some(Rte::star(y)),
        _ => None,
    }
}

fn star_operand(r: &Rte, _: NormalForm) -> Option<Rte> {
    let RteKind::Star(inner) = r.kind() else {
        return None;
    };
    Some(Rte::star(inner.canonicalize()))
}

fn cat_operands_of(r: &Rte) -> Option<&[Rte]> {
    match r.kind() {
        RteKind::Cat(rs) => Some(rs),
        _ => None,
    }
}

fn cat_trivial(r: &Rte, _: NormalForm) -> Option<Rte> {
    match cat_operands_of(r)? {
        [] => Some(Rte::epsilon()),
        [single] => Some(single.clone()),
        _ => None,
    }
}

fn cat_empty_set(r: &Rte, _: NormalForm) -> Option<Rte> {
    cat_operands_of(r)?
        .iter()
        .any(Rte::is_empty_set)
        .then(Rte::empty_set)
}

fn cat_epsilon(r: &Rte, _: NormalForm) -> Option<Rte> {
    let rs = cat_operands_of(r)?;
    rs.iter()
        .any(Rte::is_epsilon)
        .then(|| Rte::cat(rs.iter().filter(|x| !x.is_epsilon()).cloned().collect()))
}

fn cat_flatten(r: &Rte, _: NormalForm) -> Option<Rte> {
    let rs = cat_operands_of(r)?;
    if !rs.iter().any(|x| matches!(x.kind(), RteKind::Cat(_))) {
        return None;
    }
    let mut flat = Vec::with_capacity(rs.len());
    for x in rs {
        match x.kind() {
            RteKind::Cat(inner) => flat.extend_from_slice(inner),
            _ => flat.push(x.clone()),
        }
    }
    Some(Rte::cat(flat))
}

/// `Star(x) Star(x)` is `Star(x)`.
fn cat_adjacent_stars(r: &Rte, _: NormalForm) -> Option<Rte> {
    let rs = cat_operands_of(r)?;
    let i = rs
        .windows(2)
        .position(|pair| pair[0] == pair[1] && matches!(pair[0].kind(), RteKind::Star(_)))?;
    let mut out = rs.to_vec();
    out.remove(i + 1);
    Some(Rte::cat(out))
}

/// `x Star(x)` and `Star(x) x` are `Star(x)` when `x` is nullable.
fn cat_star_absorbs(r: &Rte, _: NormalForm) -> Option<Rte> {
    let rs = cat_operands_of(r)?;
    let absorbs = |star: &Rte, other: &Rte| {
        matches!(star.kind(), RteKind::Star(x) if x == other && other.nullable())
    };
    let i = rs
        .windows(2)
        .position(|pair| absorbs(&pair[1], &pair[0]) || absorbs(&pair[0], &pair[1]))?;
    let star = if matches!(rs[i].kind(), RteKind::Star(_)) {
        rs[i].clone()
    } else {
        rs[i + 1].clone()
    };
    let mut out = rs.to_vec();
    out[i] = star;
    out.remove(i + 1);
    Some(Rte::cat(out))
}

fn cat_operands(r: &Rte, _: NormalForm) -> Option<Rte> {
    Some(Rte::cat(cat_operands_of(r)?.iter().map(Rte::canonicalize).collect()))
}

fn negated(r: &Rte) -> Option<&Rte> {
    match r.kind() {
        RteKind::Not(inner) => Some(inner),
        _ => None,
    }
}

/// Complements of the primitive languages.
fn not_primitive(r: &Rte, _: NormalForm) -> Option<Rte> {
    let inner = negated(r)?;
    let two_or_more = || Rte::cat(vec![Rte::sigma(), Rte::sigma(), Rte::universe()]);
    match inner.kind() {
        RteKind::EmptySet => Some(Rte::universe()),
        RteKind::Epsilon => Some(Rte::plus(Rte::sigma())),
        RteKind::Sigma => Some(Rte::or(vec![Rte::epsilon(), two_or_more()])),
        RteKind::Singleton(td) => Some(Rte::or(vec![
            Rte::epsilon(),
            Rte::singleton(TypeDesignator::not(td.clone())),
            two_or_more(),
        ])),
        _ if inner.is_universe() => Some(Rte::empty_set()),
        _ => None,
    }
}

fn not_not(r: &Rte, _: NormalForm) -> Option<Rte> {
    negated(negated(r)?).cloned()
}

fn not_de_morgan(r: &Rte, _: NormalForm) -> Option<Rte> {
    let flip = |rs: &[Rte]| -> Vec<Rte> { rs.iter().cloned().map(Rte::not).collect() };
    match negated(r)?.kind() {
        RteKind::And(rs) => Some(Rte::or(flip(rs))),
        RteKind::Or(rs) => Some(Rte::and(flip(rs))),
        _ => None,
    }
}

fn not_operand(r: &Rte, _: NormalForm) -> Option<Rte> {
    Some(Rte::not(negated(r)?.canonicalize()))
}

/// `And` or `Or` of languages.
#[derive(Clone, Copy, PartialEq, Eq)]
enum Combinator {
    And,
    Or,
}

impl Combinator {
    fn of(r: &Rte) -> Option<(Combinator, &[Rte])> {
        match r.kind() {
            RteKind::And(rs) => Some((Combinator::And, rs)),
            RteKind::Or(rs) => Some((Combinator::Or, rs)),
            _ => None,
        }
    }

    fn create(self, operands: Vec<Rte>) -> Rte {
        match self {
            Combinator::And => Rte::and(operands),
            Combinator::Or => Rte::or(operands),
        }
    }

    fn unit(self) -> Rte {
        match self {
            Combinator::And => Rte::universe(),
            Combinator::Or => Rte::empty_set(),
        }
    }

    fn zero(self) -> Rte {
        match self {
            Combinator::And => Rte::empty_set(),
            Combinator::Or => Rte::universe(),
        }
    }
}

fn combination_trivial(r: &Rte, _: NormalForm) -> Option<Rte> {
    let (combinator, rs) = Combinator::of(r)?;
    match rs {
        [] => Some(combinator.unit()),
        [single] => Some(single.clone()),
        _ => None,
    }
}

fn combination_zero(r: &Rte, _: NormalForm) -> Option<Rte> {
    let (combinator, rs) = Combinator::of(r)?;
    let zero = combinator.zero();
    rs.contains(&zero).then_some(zero)
}

fn combination_unit(r: &Rte, _: NormalForm) -> Option<Rte> {
    let (combinator, rs) = Combinator::of(r)?;
    let unit = combinator.unit();
    rs.contains(&unit)
        .then(|| combinator.create(rs.iter().filter(|x| **x != unit).cloned().collect()))
}

fn combination_flatten(r: &Rte, _: NormalForm) -> Option<Rte> {
    let (combinator, rs) = Combinator::of(r)?;
    let nested = |x: &Rte| matches!(Combinator::of(x), Some((c, _)) if c == combinator);
    if !rs.iter().any(nested) {
        return None;
    }
    let mut flat = Vec::with_capacity(rs.len());
    for x in rs {
        match Combinator::of(x) {
            Some((c, inner)) if c == combinator => flat.extend_from_slice(inner),
            _ => flat.push(x.clone()),
        }
    }
    Some(combinator.create(flat))
}

fn combination_duplicates(r: &Rte, _: NormalForm) -> Option<Rte> {
    let (combinator, rs) = Combinator::of(r)?;
    let unique = remove_duplicates(rs);
    (unique.len() != rs.len()).then(|| combinator.create(unique))
}

fn combination_complementary(r: &Rte, _: NormalForm) -> Option<Rte> {
    let (combinator, rs) = Combinator::of(r)?;
    rs.iter()
        .filter_map(negated)
        .any(|x| rs.contains(x))
        .then(|| combinator.zero())
}

fn combination_operands(r: &Rte, _: NormalForm) -> Option<Rte> {
    let (combinator, rs) = Combinator::of(r)?;
    Some(combinator.create(rs.iter().map(Rte::canonicalize).collect()))
}

fn combination_sort(r: &Rte, _: NormalForm) -> Option<Rte> {
    let (combinator, rs) = Combinator::of(r)?;
    let sorted = sorted_unique(rs);
    (sorted != rs).then(|| combinator.create(sorted))
}

/// Several single-value operands become one `Singleton` of the union or
/// intersection of their designators. `Sigma` counts as `Singleton(Top)`.
fn combination_singletons(r: &Rte, _: NormalForm) -> Option<Rte> {
    let (combinator, rs) = Combinator::of(r)?;
    let designator = |x: &Rte| match x.kind() {
        RteKind::Singleton(td) => Some(td.clone()),
        RteKind::Sigma => Some(TypeDesignator::top()),
        _ => None,
    };
    let tds: Vec<TypeDesignator> = rs.iter().filter_map(designator).collect();
    if tds.len() < 2 {
        return None;
    }
    let merged = Rte::singleton(match combinator {
        Combinator::And => TypeDesignator::and(tds),
        Combinator::Or => TypeDesignator::or(tds),
    });
    let mut out: Vec<Rte> = rs.iter().filter(|x| designator(x).is_none()).cloned().collect();
    out.push(merged);
    Some(combinator.create(out))
}

/// `Or(x, Star(x))` is `Star(x)`.
fn or_star_subsumes(r: &Rte, _: NormalForm) -> Option<Rte> {
    let (Combinator::Or, rs) = Combinator::of(r)? else {
        return None;
    };
    let i = rs
        .iter()
        .position(|x| rs.iter().any(|y| matches!(y.kind(), RteKind::Star(inner) if inner == x)))?;
    let mut out = rs.to_vec();
    out.remove(i);
    Some(Rte::or(out))
}

/// Or: `Epsilon` beside a nullable operand is redundant.
/// And: with `Epsilon` the result is `Epsilon` or `EmptySet` by nullability.
fn combination_epsilon(r: &Rte, _: NormalForm) -> Option<Rte> {
    let (combinator, rs) = Combinator::of(r)?;
    if !rs.iter().any(Rte::is_epsilon) {
        return None;
    }
    match combinator {
        Combinator::Or => rs
            .iter()
            .any(|x| !x.is_epsilon() && x.nullable())
            .then(|| Rte::or(rs.iter().filter(|x| !x.is_epsilon()).cloned().collect())),
        Combinator::And => Some(if rs.iter().all(Rte::nullable) {
            Rte::epsilon()
        } else {
            Rte::empty_set()
        }),
    }
}

/// `Or(Not(Epsilon), x)` with `x` nullable is every sequence. `Not(Epsilon)`
/// may already have been rewritten to `Cat(Sigma, Star(Sigma))`.
fn or_not_epsilon(r: &Rte, _: NormalForm) -> Option<Rte> {
    let (Combinator::Or, rs) = Combinator::of(r)? else {
        return None;
    };
    let non_empty = Rte::plus(Rte::sigma());
    let not_epsilon = rs
        .iter()
        .any(|x| *x == non_empty || negated(x).is_some_and(Rte::is_epsilon));
    (not_epsilon && rs.iter().any(Rte::nullable)).then(Rte::universe)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing;
    use crate::value::AtomicKind;

    fn int() -> Rte {
        Rte::singleton(TypeDesignator::atomic(AtomicKind::Int))
    }

    fn number() -> Rte {
        Rte::singleton(TypeDesignator::atomic(AtomicKind::Number))
    }

    fn canonical(r: Rte) -> String {
        r.canonicalize().to_string()
    }

    #[test]
    fn test_identities() {
        assert_eq!(canonical(Rte::cat(vec![])), "Epsilon");
        assert_eq!(canonical(Rte::or(vec![])), "EmptySet");
        assert_eq!(canonical(Rte::and(vec![])), "Star(Sigma)");
        assert_eq!(canonical(Rte::cat(vec![int(), Rte::empty_set()])), "EmptySet");
        assert_eq!(
            canonical(Rte::cat(vec![Rte::epsilon(), int(), Rte::epsilon()])),
            "Singleton(Int)"
        );
        assert_eq!(canonical(Rte::or(vec![int(), Rte::not(int())])), "Star(Sigma)");
        assert_eq!(canonical(Rte::and(vec![int(), Rte::not(int())])), "EmptySet");
        assert_eq!(
            canonical(Rte::singleton(TypeDesignator::or(vec![
                TypeDesignator::top(),
                TypeDesignator::eql(1)
            ]))),
            "Sigma"
        );
    }

    #[test]
    fn test_stars() {
        assert_eq!(canonical(Rte::star(Rte::star(int()))), "Star(Singleton(Int))");
        assert_eq!(canonical(Rte::star(Rte::epsilon())), "Epsilon");
        assert_eq!(canonical(Rte::star(Rte::plus(int()))), "Star(Singleton(Int))");
        assert_eq!(
            canonical(Rte::cat(vec![Rte::star(int()), Rte::star(int())])),
            "Star(Singleton(Int))"
        );
        // int is not nullable, so Cat(int, Star(int)) keeps its shape.
        assert_eq!(
            canonical(Rte::plus(int())),
            "Cat(Singleton(Int), Star(Singleton(Int)))"
        );
        let nullable = Rte::optional(int());
        assert_eq!(
            canonical(Rte::cat(vec![nullable.clone(), Rte::star(nullable)])),
            "Star(Or(Epsilon, Singleton(Int)))"
        );
    }

    #[test]
    fn test_singletons_merge() {
        assert_eq!(canonical(Rte::or(vec![int(), number()])), "Singleton(Number)");
        assert_eq!(canonical(Rte::and(vec![int(), number()])), "Singleton(Int)");
        let text = Rte::singleton(TypeDesignator::atomic(AtomicKind::Str));
        assert_eq!(canonical(Rte::and(vec![int(), text])), "EmptySet");
        assert_eq!(canonical(Rte::or(vec![int(), Rte::sigma()])), "Sigma");
    }

    #[test]
    fn test_epsilon_rules() {
        assert_eq!(
            canonical(Rte::or(vec![Rte::epsilon(), Rte::star(int())])),
            "Star(Singleton(Int))"
        );
        assert_eq!(canonical(Rte::and(vec![Rte::epsilon(), Rte::star(int())])), "Epsilon");
        assert_eq!(canonical(Rte::and(vec![Rte::epsilon(), int()])), "EmptySet");
        assert_eq!(
            canonical(Rte::or(vec![Rte::not(Rte::epsilon()), Rte::star(int())])),
            "Star(Sigma)"
        );
    }

    #[test]
    fn test_not() {
        assert_eq!(canonical(Rte::not(Rte::not(int()))), "Singleton(Int)");
        assert_eq!(canonical(Rte::not(Rte::empty_set())), "Star(Sigma)");
        assert_eq!(canonical(Rte::not(Rte::universe())), "EmptySet");
        assert_eq!(canonical(Rte::not(Rte::epsilon())), "Cat(Sigma, Star(Sigma))");
    }

    #[test]
    fn test_idempotent() {
        let r = Rte::and(vec![
            Rte::not(Rte::or(vec![int(), Rte::star(number())])),
            Rte::cat(vec![Rte::sigma(), Rte::star(Rte::sigma())]),
        ]);
        let once = r.canonicalize();
        assert_eq!(once.canonicalize(), once);
    }

    #[test]
    fn test_random_canonicalization_preserves_language() {
        let mut rng = testing::rng(7);
        for _ in 0..60 {
            let r = testing::random_rte(&mut rng, 3);
            let canonical = r.canonicalize();
            assert_eq!(canonical.canonicalize(), canonical, "{r}");
            let raw = r.to_dfa_thompson(true);
            let simplified = canonical.to_dfa_thompson(true);
            assert_ne!(raw.equivalent(&simplified), Some(false), "{r} -> {canonical}");
            for _ in 0..10 {
                let sequence = testing::random_sequence(&mut rng, 4);
                assert_eq!(
                    raw.simulate(&sequence),
                    simplified.simulate(&sequence),
                    "{r} on {sequence:?}"
                );
            }
        }
    }
}
