//! Brzozowski derivatives with respect to a designator.

use super::{Rte, RteKind};
use crate::error::RteError;
use crate::fixpoint::NormalForm;
use crate::genus::TypeDesignator;
use crate::log::targets;

impl Rte {
    /// The residual language after consuming one value of type `wrt`.
    ///
    /// `wrt` is expected to be a piece of a decomposition: `factors` are the
    /// designators known to contain it and `disjoints` those known to miss
    /// it. Every `Singleton` must be decidable against `wrt`, through those
    /// lists or the subtype/disjoint queries, otherwise the derivative is
    /// refused with [`RteError::CannotComputeDerivative`].
    pub fn derivative(
        &self,
        wrt: &TypeDesignator,
        factors: &[TypeDesignator],
        disjoints: &[TypeDesignator],
    ) -> Result<Rte, RteError> {
        let derive = |r: &Rte| r.derivative(wrt, factors, disjoints);
        let result = match self.kind() {
            RteKind::EmptySet | RteKind::Epsilon => Rte::empty_set(),
            RteKind::Sigma => Rte::epsilon(),
            RteKind::Singleton(td) => {
                if singleton_accepts(td, wrt, factors, disjoints).ok_or_else(|| {
                    RteError::CannotComputeDerivative {
                        rte: self.clone(),
                        wrt: wrt.clone(),
                        factors: factors.to_vec(),
                        disjoints: disjoints.to_vec(),
                    }
                })? {
                    Rte::epsilon()
                } else {
                    Rte::empty_set()
                }
            }
            RteKind::Star(r) => Rte::cat(vec![derive(r)?, self.clone()]),
            RteKind::Cat(rs) => match rs.split_first() {
                None => Rte::empty_set(),
                Some((head, tail)) => {
                    let mut through_head = vec![derive(head)?];
                    through_head.extend_from_slice(tail);
                    let through_head = Rte::cat(through_head);
                    if head.nullable() {
                        let skip_head = derive(&Rte::cat(tail.to_vec()))?;
                        Rte::or(vec![through_head, skip_head])
                    } else {
                        through_head
                    }
                }
            },
            RteKind::Not(r) => Rte::not(derive(r)?),
            RteKind::And(rs) => Rte::and(rs.iter().map(derive).collect::<Result<_, _>>()?),
            RteKind::Or(rs) => Rte::or(rs.iter().map(derive).collect::<Result<_, _>>()?),
        };
        log::trace!(target: targets::DERIVATIVE, "d/d{wrt} {self} = {result}");
        Ok(result)
    }
}

/// Does every value of `wrt` satisfy `td`? `None` when neither containment
/// nor disjointness can be shown.
fn singleton_accepts(
    td: &TypeDesignator,
    wrt: &TypeDesignator,
    factors: &[TypeDesignator],
    disjoints: &[TypeDesignator],
) -> Option<bool> {
    if factors.contains(td) {
        return Some(true);
    }
    if disjoints.contains(td) {
        return Some(false);
    }
    let decide = |td: &TypeDesignator, wrt: &TypeDesignator| {
        if wrt.subtypep(td) == Some(true) {
            Some(true)
        } else if wrt.disjoint(td) == Some(true) {
            Some(false)
        } else {
            None
        }
    };
    decide(td, wrt).or_else(|| {
        decide(
            &td.canonicalize(NormalForm::Dnf),
            &wrt.canonicalize(NormalForm::Dnf),
        )
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::{AtomicKind, Value};

    fn atomic(kind: AtomicKind) -> TypeDesignator {
        TypeDesignator::atomic(kind)
    }

    #[test]
    fn test_singleton_derivative() {
        let r = Rte::singleton(atomic(AtomicKind::Number));
        assert!(r.derivative(&atomic(AtomicKind::Int), &[], &[]).unwrap().is_epsilon());
        assert!(r.derivative(&atomic(AtomicKind::Str), &[], &[]).unwrap().is_empty_set());
        assert!(Rte::sigma().derivative(&atomic(AtomicKind::Str), &[], &[]).unwrap().is_epsilon());
    }

    #[test]
    fn test_factor_lists_decide_first() {
        let even = TypeDesignator::satisfies("even", |v| matches!(v, Value::Int(i) if i % 2 == 0));
        let r = Rte::singleton(even.clone());
        let wrt = TypeDesignator::and(vec![atomic(AtomicKind::Int), even.clone()]);
        assert!(r.derivative(&wrt, &[even.clone()], &[]).unwrap().is_epsilon());
        let outside = TypeDesignator::not(even.clone());
        assert!(r.derivative(&outside, &[], &[even]).unwrap().is_empty_set());
    }

    #[test]
    fn test_undecidable_singleton_is_an_error() {
        let even = TypeDesignator::satisfies("even", |v| matches!(v, Value::Int(i) if i % 2 == 0));
        let r = Rte::cat(vec![Rte::singleton(even), Rte::sigma()]);
        let err = r.derivative(&atomic(AtomicKind::Int), &[], &[]).unwrap_err();
        let RteError::CannotComputeDerivative { rte, wrt, .. } = &err;
        assert_eq!(rte.to_string(), "Singleton(Satisfies(even))");
        assert_eq!(*wrt, atomic(AtomicKind::Int));
        assert!(err.to_string().contains("Satisfies(even)"));
    }

    #[test]
    fn test_cat_through_nullable_head() {
        let int = Rte::singleton(atomic(AtomicKind::Int));
        let text = Rte::singleton(atomic(AtomicKind::Str));
        let r = Rte::cat(vec![Rte::star(int), text]);
        let d = r
            .derivative(&atomic(AtomicKind::Str), &[], &[])
            .unwrap()
            .canonicalize();
        assert!(d.is_epsilon(), "{d}");
    }
}
