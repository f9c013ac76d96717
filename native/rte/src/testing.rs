//! Random designators, expressions and values for property tests.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::genus::{Predicate, TypeDesignator};
use crate::rte::Rte;
use crate::value::{AtomicKind, Value};

/// A generator seeded for reproducible runs.
pub fn rng(seed: u64) -> StdRng {
    StdRng::seed_from_u64(seed)
}

thread_local! {
    /// Labelled predicates used as `Satisfies` leaves. Their emptiness and
    /// overlap with other designators can only be answered Unknown.
    static PREDICATES: [Predicate; 2] = [
        Predicate::new("even", |v| matches!(v, Value::Int(i) if i % 2 == 0)),
        Predicate::new("pos", |v| match v {
            Value::Int(i) => *i > 0,
            Value::Float(f) => *f > 0.0,
            _ => false,
        }),
    ];
}

/// One of the shared `Satisfies` leaves.
pub fn random_predicate(rng: &mut StdRng) -> TypeDesignator {
    let index = rng.random_range(0..2);
    PREDICATES.with(|predicates| TypeDesignator::from_predicate(predicates[index].clone()))
}

/// Values drawn from a small pool, so that `Eql` and `Member` designators
/// generated alongside them are often hit.
pub fn random_value(rng: &mut StdRng) -> Value {
    match rng.random_range(0..8) {
        0 => Value::Null,
        1 => Value::Bool(rng.random_bool(0.5)),
        2 | 3 => Value::Int(rng.random_range(-2..4)),
        4 => Value::Float([0.5, -1.5, 2.0][rng.random_range(0..3)]),
        5 => Value::Char(['a', 'b'][rng.random_range(0..2)]),
        6 => Value::from(["a", "b", ""][rng.random_range(0..3)]),
        _ => Value::from(vec![Value::Int(1)]),
    }
}

/// Values covering every leaf category.
pub fn sample_values() -> Vec<Value> {
    let mut values = vec![
        Value::Null,
        Value::Bool(false),
        Value::Bool(true),
        Value::Float(0.5),
        Value::Float(-1.5),
        Value::Float(2.0),
        Value::Char('a'),
        Value::Char('z'),
        Value::from("a"),
        Value::from("b"),
        Value::from("zz"),
        Value::from(vec![Value::Int(1)]),
        Value::from(Vec::<Value>::new()),
    ];
    values.extend((-2..6).map(Value::Int));
    values
}

/// A designator of at most `depth` nested `And`/`Or`/`Not` levels. Leaves
/// include `Satisfies` predicates.
pub fn random_designator(rng: &mut StdRng, depth: usize) -> TypeDesignator {
    let choice = if depth == 0 {
        rng.random_range(0..6)
    } else {
        rng.random_range(0..9)
    };
    match choice {
        0 => TypeDesignator::top(),
        1 => TypeDesignator::empty(),
        2 => {
            let kind = AtomicKind::ALL[rng.random_range(0..AtomicKind::ALL.len())];
            TypeDesignator::atomic(kind)
        }
        3 => TypeDesignator::eql(random_value(rng)),
        4 => {
            let count = rng.random_range(1..4);
            TypeDesignator::member((0..count).map(|_| random_value(rng)).collect::<Vec<_>>())
        }
        5 => random_predicate(rng),
        6 => TypeDesignator::not(random_designator(rng, depth - 1)),
        7 => TypeDesignator::and(vec![
            random_designator(rng, depth - 1),
            random_designator(rng, depth - 1),
        ]),
        _ => TypeDesignator::or(vec![
            random_designator(rng, depth - 1),
            random_designator(rng, depth - 1),
        ]),
    }
}

/// An expression of at most `depth` nested operator levels whose
/// singletons are shallow designators.
pub fn random_rte(rng: &mut StdRng, depth: usize) -> Rte {
    let choice = if depth == 0 {
        rng.random_range(0..4)
    } else {
        rng.random_range(0..9)
    };
    match choice {
        0 => Rte::epsilon(),
        1 => Rte::sigma(),
        2 | 3 => Rte::singleton(random_designator(rng, 1)),
        4 => Rte::star(random_rte(rng, depth - 1)),
        5 => Rte::not(random_rte(rng, depth - 1)),
        6 => Rte::cat(vec![random_rte(rng, depth - 1), random_rte(rng, depth - 1)]),
        7 => Rte::and(vec![random_rte(rng, depth - 1), random_rte(rng, depth - 1)]),
        _ => Rte::or(vec![random_rte(rng, depth - 1), random_rte(rng, depth - 1)]),
    }
}

/// A sequence of up to `max_len` random values.
pub fn random_sequence(rng: &mut StdRng, max_len: usize) -> Vec<Value> {
    let len = rng.random_range(0..=max_len);
    (0..len).map(|_| random_value(rng)).collect()
}
