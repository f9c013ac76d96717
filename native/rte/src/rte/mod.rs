//! Rational type expressions: regular expressions over sequences of values,
//! one designator per position.

mod canonical;
mod derivative;

use std::cell::{Cell, OnceCell};
use std::cmp::Ordering;
use std::collections::BTreeSet;
use std::collections::hash_map::DefaultHasher;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::rc::Rc;

use crate::error::RteError;
use crate::genus::TypeDesignator;
use crate::value::Value;

/// The variants of an [`Rte`].
///
/// Declaration order is the canonical order of `And`/`Or` operands.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum RteKind {
    /// The empty language.
    EmptySet,
    /// Only the empty sequence.
    Epsilon,
    /// Exactly one arbitrary value.
    Sigma,
    /// Exactly one value of the designated type.
    Singleton(TypeDesignator),
    Star(Rte),
    Cat(Vec<Rte>),
    Not(Rte),
    And(Vec<Rte>),
    Or(Vec<Rte>),
}

#[derive(Default)]
struct RteMemo {
    canonical: OnceCell<Rte>,
    is_canonical: Cell<bool>,
    nullable: OnceCell<bool>,
    first_types: OnceCell<BTreeSet<TypeDesignator>>,
}

struct RteNode {
    kind: RteKind,
    hash: u64,
    memo: RteMemo,
}

/// A rational type expression. Cheap to clone and immutable.
#[derive(Clone)]
pub struct Rte(Rc<RteNode>);

impl Rte {
    fn build(kind: RteKind) -> Self {
        let mut hasher = DefaultHasher::new();
        kind.hash(&mut hasher);
        Rte(Rc::new(RteNode {
            hash: hasher.finish(),
            kind,
            memo: RteMemo::default(),
        }))
    }

    pub fn empty_set() -> Self {
        Self::build(RteKind::EmptySet)
    }

    pub fn epsilon() -> Self {
        Self::build(RteKind::Epsilon)
    }

    pub fn sigma() -> Self {
        Self::build(RteKind::Sigma)
    }

    pub fn singleton(td: TypeDesignator) -> Self {
        Self::build(RteKind::Singleton(td))
    }

    pub fn star(operand: Rte) -> Self {
        Self::build(RteKind::Star(operand))
    }

    pub fn cat(operands: Vec<Rte>) -> Self {
        Self::build(RteKind::Cat(operands))
    }

    pub fn not(operand: Rte) -> Self {
        Self::build(RteKind::Not(operand))
    }

    pub fn and(operands: Vec<Rte>) -> Self {
        Self::build(RteKind::And(operands))
    }

    pub fn or(operands: Vec<Rte>) -> Self {
        Self::build(RteKind::Or(operands))
    }

    /// One or more repetitions of `operand`.
    pub fn plus(operand: Rte) -> Self {
        Self::cat(vec![operand.clone(), Self::star(operand)])
    }

    /// Zero or one occurrence of `operand`.
    pub fn optional(operand: Rte) -> Self {
        Self::or(vec![Self::epsilon(), operand])
    }

    /// Every sequence, `Star(Sigma)`.
    pub fn universe() -> Self {
        Self::star(Self::sigma())
    }

    pub fn kind(&self) -> &RteKind {
        &self.0.kind
    }

    pub fn is_empty_set(&self) -> bool {
        matches!(self.kind(), RteKind::EmptySet)
    }

    pub fn is_epsilon(&self) -> bool {
        matches!(self.kind(), RteKind::Epsilon)
    }

    pub fn is_universe(&self) -> bool {
        matches!(self.kind(), RteKind::Star(r) if matches!(r.kind(), RteKind::Sigma))
    }

    /// Does the language contain the empty sequence?
    pub fn nullable(&self) -> bool {
        *self.0.memo.nullable.get_or_init(|| match self.kind() {
            RteKind::EmptySet | RteKind::Sigma | RteKind::Singleton(_) => false,
            RteKind::Epsilon | RteKind::Star(_) => true,
            RteKind::Cat(rs) | RteKind::And(rs) => rs.iter().all(Rte::nullable),
            RteKind::Or(rs) => rs.iter().any(Rte::nullable),
            RteKind::Not(r) => !r.nullable(),
        })
    }

    /// Designators that may classify the first value of a matching sequence.
    pub fn first_types(&self) -> &BTreeSet<TypeDesignator> {
        self.0.memo.first_types.get_or_init(|| {
            let mut types = BTreeSet::new();
            match self.kind() {
                RteKind::EmptySet | RteKind::Epsilon => {}
                RteKind::Sigma => {
                    types.insert(TypeDesignator::top());
                }
                RteKind::Singleton(td) => {
                    types.insert(td.clone());
                }
                RteKind::Star(r) | RteKind::Not(r) => types.extend(r.first_types().iter().cloned()),
                RteKind::Cat(rs) => {
                    for r in rs {
                        types.extend(r.first_types().iter().cloned());
                        if !r.nullable() {
                            break;
                        }
                    }
                }
                RteKind::And(rs) | RteKind::Or(rs) => {
                    for r in rs {
                        types.extend(r.first_types().iter().cloned());
                    }
                }
            }
            types
        })
    }

    /// Does the language contain `sequence`?
    pub fn matches(&self, sequence: &[Value]) -> Result<bool, RteError> {
        Ok(self.to_dfa(true)?.simulate(sequence).is_some())
    }

    pub(crate) fn cached_canonical(&self) -> Option<Rte> {
        if self.0.memo.is_canonical.get() {
            return Some(self.clone());
        }
        self.0.memo.canonical.get().cloned()
    }

    pub(crate) fn store_canonical(&self, canonical: &Rte) {
        canonical.0.memo.is_canonical.set(true);
        if canonical == self {
            self.0.memo.is_canonical.set(true);
        } else {
            let _ = self.0.memo.canonical.set(canonical.clone());
        }
    }
}

impl PartialEq for Rte {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
            || (self.0.hash == other.0.hash && self.0.kind == other.0.kind)
    }
}

impl Eq for Rte {}

impl PartialOrd for Rte {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Rte {
    fn cmp(&self, other: &Self) -> Ordering {
        if Rc::ptr_eq(&self.0, &other.0) {
            return Ordering::Equal;
        }
        self.0.kind.cmp(&other.0.kind)
    }
}

impl Hash for Rte {
    fn hash<H: Hasher>(&self, state: &mut H) {
        state.write_u64(self.0.hash);
    }
}

fn write_operands(f: &mut fmt::Formatter<'_>, name: &str, rs: &[Rte]) -> fmt::Result {
    write!(f, "{name}(")?;
    for (i, r) in rs.iter().enumerate() {
        if i > 0 {
            write!(f, ", ")?;
        }
        write!(f, "{r}")?;
    }
    write!(f, ")")
}

impl fmt::Display for Rte {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind() {
            RteKind::EmptySet => write!(f, "EmptySet"),
            RteKind::Epsilon => write!(f, "Epsilon"),
            RteKind::Sigma => write!(f, "Sigma"),
            RteKind::Singleton(td) => write!(f, "Singleton({td})"),
            RteKind::Star(r) => write!(f, "Star({r})"),
            RteKind::Not(r) => write!(f, "Not({r})"),
            RteKind::Cat(rs) => write_operands(f, "Cat", rs),
            RteKind::And(rs) => write_operands(f, "And", rs),
            RteKind::Or(rs) => write_operands(f, "Or", rs),
        }
    }
}

impl fmt::Debug for Rte {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}

impl From<TypeDesignator> for Rte {
    fn from(td: TypeDesignator) -> Self {
        Rte::singleton(td)
    }
}
