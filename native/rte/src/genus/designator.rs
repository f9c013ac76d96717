//! The type designator tree and its per-instance memo tables.

use std::cell::{Cell, OnceCell, RefCell};
use std::cmp::Ordering;
use std::collections::HashMap;
use std::collections::hash_map::DefaultHasher;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::rc::{Rc, Weak};

use crate::fixpoint::NormalForm;
use crate::value::{AtomicKind, Value};

/// An opaque predicate over one value, identified by its label.
///
/// Two predicates with the same label are considered the same predicate.
#[derive(Clone)]
pub struct Predicate {
    label: Rc<str>,
    test: Rc<dyn Fn(&Value) -> bool>,
}

impl Predicate {
    pub fn new(label: &str, test: impl Fn(&Value) -> bool + 'static) -> Self {
        Self {
            label: Rc::from(label),
            test: Rc::new(test),
        }
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn test(&self, value: &Value) -> bool {
        (self.test)(value)
    }
}

impl PartialEq for Predicate {
    fn eq(&self, other: &Self) -> bool {
        self.label == other.label
    }
}

impl Eq for Predicate {}

impl PartialOrd for Predicate {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Predicate {
    fn cmp(&self, other: &Self) -> Ordering {
        self.label.cmp(&other.label)
    }
}

impl Hash for Predicate {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.label.hash(state);
    }
}

impl fmt::Debug for Predicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Predicate({})", self.label)
    }
}

/// The variants of a type designator.
///
/// Declaration order is the canonical order of variants when operands are
/// sorted.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum TypeKind {
    Empty,
    Top,
    Atomic(AtomicKind),
    Eql(Value),
    Member(Vec<Value>),
    Satisfies(Predicate),
    Not(TypeDesignator),
    And(Vec<TypeDesignator>),
    Or(Vec<TypeDesignator>),
}

/// Memoized three-valued answers keyed by the other designator.
///
/// Keys are held weakly: a cached answer never keeps its argument alive, so
/// two designators that were compared do not leak each other.
#[derive(Default)]
pub(crate) struct PairCache(RefCell<HashMap<u64, Vec<(Weak<Node>, Option<bool>)>>>);

impl PairCache {
    pub(crate) fn get(&self, key: &TypeDesignator) -> Option<Option<bool>> {
        let map = self.0.borrow();
        map.get(&key.0.hash)?.iter().find_map(|(weak, result)| {
            let node = weak.upgrade()?;
            (TypeDesignator(node) == *key).then_some(*result)
        })
    }

    pub(crate) fn insert(&self, key: &TypeDesignator, result: Option<bool>) {
        let mut map = self.0.borrow_mut();
        let bucket = map.entry(key.0.hash).or_default();
        bucket.retain(|(weak, _)| weak.strong_count() > 0);
        bucket.push((Rc::downgrade(&key.0), result));
    }
}

#[derive(Default)]
pub(crate) struct Memo {
    pub(crate) inhabited: OnceCell<Option<bool>>,
    pub(crate) subtypep: PairCache,
    pub(crate) disjoint: PairCache,
    pub(crate) canonical: [OnceCell<TypeDesignator>; 3],
    pub(crate) is_canonical: [Cell<bool>; 3],
}

pub(crate) struct Node {
    kind: TypeKind,
    hash: u64,
    pub(crate) memo: Memo,
}

/// A designator of a set of values.
///
/// Cloning is cheap; the tree is immutable and shared.
#[derive(Clone)]
pub struct TypeDesignator(Rc<Node>);

thread_local! {
    static TOP: TypeDesignator = TypeDesignator::build(TypeKind::Top);
    static EMPTY: TypeDesignator = TypeDesignator::build(TypeKind::Empty);
    static ATOMICS: Vec<TypeDesignator> = AtomicKind::ALL
        .iter()
        .map(|&kind| TypeDesignator::build(TypeKind::Atomic(kind)))
        .collect();
}

impl TypeDesignator {
    fn build(kind: TypeKind) -> Self {
        let mut hasher = DefaultHasher::new();
        kind.hash(&mut hasher);
        TypeDesignator(Rc::new(Node {
            hash: hasher.finish(),
            kind,
            memo: Memo::default(),
        }))
    }

    /// The universal set.
    pub fn top() -> Self {
        TOP.with(Clone::clone)
    }

    /// The empty set.
    pub fn empty() -> Self {
        EMPTY.with(Clone::clone)
    }

    /// All instances of a native category. One shared instance per kind.
    pub fn atomic(kind: AtomicKind) -> Self {
        ATOMICS.with(|atomics| atomics[kind as usize].clone())
    }

    /// The singleton set `{value}`.
    pub fn eql(value: impl Into<Value>) -> Self {
        Self::build(TypeKind::Eql(value.into()))
    }

    /// A finite set of values.
    pub fn member<I, V>(values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        Self::build(TypeKind::Member(values.into_iter().map(Into::into).collect()))
    }

    /// The values satisfying an opaque predicate.
    pub fn satisfies(label: &str, test: impl Fn(&Value) -> bool + 'static) -> Self {
        Self::build(TypeKind::Satisfies(Predicate::new(label, test)))
    }

    /// The values satisfying a predicate that may be shared between
    /// designators.
    pub fn from_predicate(predicate: Predicate) -> Self {
        Self::build(TypeKind::Satisfies(predicate))
    }

    pub fn and(operands: Vec<TypeDesignator>) -> Self {
        Self::build(TypeKind::And(operands))
    }

    pub fn or(operands: Vec<TypeDesignator>) -> Self {
        Self::build(TypeKind::Or(operands))
    }

    pub fn not(operand: TypeDesignator) -> Self {
        Self::build(TypeKind::Not(operand))
    }

    pub fn kind(&self) -> &TypeKind {
        &self.0.kind
    }

    pub(crate) fn memo(&self) -> &Memo {
        &self.0.memo
    }

    /// Top, Empty and Atomic live in the thread registry for the whole
    /// thread; they do not accumulate pairwise memo entries.
    pub(crate) fn is_registered(&self) -> bool {
        matches!(
            self.kind(),
            TypeKind::Top | TypeKind::Empty | TypeKind::Atomic(_)
        )
    }

    pub fn is_top(&self) -> bool {
        matches!(self.kind(), TypeKind::Top)
    }

    pub fn is_empty(&self) -> bool {
        matches!(self.kind(), TypeKind::Empty)
    }

    /// Operands of an `And`/`Or`, or `None` for other variants.
    pub fn operands(&self) -> Option<&[TypeDesignator]> {
        match self.kind() {
            TypeKind::And(tds) | TypeKind::Or(tds) => Some(tds),
            _ => None,
        }
    }

    /// The enumerated values of an `Eql` or `Member`.
    pub(crate) fn enumerated(&self) -> Option<Vec<Value>> {
        match self.kind() {
            TypeKind::Eql(v) => Some(vec![v.clone()]),
            TypeKind::Member(vs) => Some(vs.clone()),
            _ => None,
        }
    }

    pub(crate) fn cached_canonical(&self, nf: NormalForm) -> Option<TypeDesignator> {
        if self.memo().is_canonical[nf.index()].get() {
            return Some(self.clone());
        }
        self.memo().canonical[nf.index()].get().cloned()
    }

    pub(crate) fn store_canonical(&self, nf: NormalForm, canonical: &TypeDesignator) {
        canonical.memo().is_canonical[nf.index()].set(true);
        if canonical == self {
            self.memo().is_canonical[nf.index()].set(true);
        } else {
            let _ = self.memo().canonical[nf.index()].set(canonical.clone());
        }
    }
}

impl PartialEq for TypeDesignator {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
            || (self.0.hash == other.0.hash && self.0.kind == other.0.kind)
    }
}

impl Eq for TypeDesignator {}

impl PartialOrd for TypeDesignator {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for TypeDesignator {
    fn cmp(&self, other: &Self) -> Ordering {
        if Rc::ptr_eq(&self.0, &other.0) {
            return Ordering::Equal;
        }
        self.0.kind.cmp(&other.0.kind)
    }
}

impl Hash for TypeDesignator {
    fn hash<H: Hasher>(&self, state: &mut H) {
        state.write_u64(self.0.hash);
    }
}

fn write_list<T: fmt::Display>(f: &mut fmt::Formatter<'_>, name: &str, items: &[T]) -> fmt::Result {
    write!(f, "{name}(")?;
    for (i, item) in items.iter().enumerate() {
        if i > 0 {
            write!(f, ", ")?;
        }
        write!(f, "{item}")?;
    }
    write!(f, ")")
}

impl fmt::Display for TypeDesignator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind() {
            TypeKind::Empty => write!(f, "Empty"),
            TypeKind::Top => write!(f, "Top"),
            TypeKind::Atomic(kind) => write!(f, "{kind}"),
            TypeKind::Eql(v) => write!(f, "Eql({v})"),
            TypeKind::Member(vs) => write_list(f, "Member", vs),
            TypeKind::Satisfies(p) => write!(f, "Satisfies({})", p.label()),
            TypeKind::Not(td) => write!(f, "Not({td})"),
            TypeKind::And(tds) => write_list(f, "And", tds),
            TypeKind::Or(tds) => write_list(f, "Or", tds),
        }
    }
}

impl fmt::Debug for TypeDesignator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_registry_shares_instances() {
        let a = TypeDesignator::atomic(AtomicKind::Int);
        let b = TypeDesignator::atomic(AtomicKind::Int);
        assert!(Rc::ptr_eq(&a.0, &b.0));
        assert!(Rc::ptr_eq(&TypeDesignator::top().0, &TypeDesignator::top().0));
        assert_ne!(a, TypeDesignator::atomic(AtomicKind::Str));
    }

    #[test]
    fn test_structural_equality() {
        let a = TypeDesignator::and(vec![
            TypeDesignator::atomic(AtomicKind::Int),
            TypeDesignator::not(TypeDesignator::eql(3)),
        ]);
        let b = TypeDesignator::and(vec![
            TypeDesignator::atomic(AtomicKind::Int),
            TypeDesignator::not(TypeDesignator::eql(3)),
        ]);
        assert_eq!(a, b);
        assert_eq!(a.cmp(&b), Ordering::Equal);
        assert_eq!(a.to_string(), "And(Int, Not(Eql(3)))");
    }

    #[test]
    fn test_predicates_compare_by_label() {
        let even = TypeDesignator::satisfies("even", |v| matches!(v, Value::Int(i) if i % 2 == 0));
        let same = TypeDesignator::satisfies("even", |_| false);
        assert_eq!(even, same);
        assert_eq!(even.to_string(), "Satisfies(even)");
    }

    #[test]
    fn test_variant_order() {
        let mut tds = vec![
            TypeDesignator::or(vec![]),
            TypeDesignator::eql(1),
            TypeDesignator::atomic(AtomicKind::Str),
            TypeDesignator::empty(),
        ];
        tds.sort();
        assert_eq!(
            tds.iter().map(ToString::to_string).collect::<Vec<_>>(),
            vec!["Empty", "Str", "Eql(1)", "Or()"]
        );
    }

    #[test]
    fn test_pair_cache_does_not_retain_keys() {
        let cache = PairCache::default();
        let key = TypeDesignator::eql(1);
        cache.insert(&key, Some(true));
        assert_eq!(cache.get(&TypeDesignator::eql(1)), Some(Some(true)));
        drop(key);
        assert_eq!(cache.get(&TypeDesignator::eql(1)), None);
    }
}
