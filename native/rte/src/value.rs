//! Runtime values classified by type designators, and the native categories
//! an [`Atomic`](crate::genus::TypeDesignator::atomic) designator names.

use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

/// A runtime value.
///
/// Floats compare by `total_cmp` and hash by bit pattern so that values can
/// live in `Member` sets and be sorted into a canonical order.
#[derive(Clone, Debug)]
pub enum Value {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Char(char),
    Str(Arc<str>),
    List(Arc<[Value]>),
}

impl Value {
    /// The leaf category this value belongs to.
    pub fn kind(&self) -> AtomicKind {
        match self {
            Value::Null => AtomicKind::Null,
            Value::Bool(_) => AtomicKind::Bool,
            Value::Int(_) => AtomicKind::Int,
            Value::Float(_) => AtomicKind::Float,
            Value::Char(_) => AtomicKind::Char,
            Value::Str(_) => AtomicKind::Str,
            Value::List(_) => AtomicKind::List,
        }
    }

    fn rank(&self) -> u8 {
        self.kind() as u8
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Value {}

impl PartialOrd for Value {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Value {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (Value::Null, Value::Null) => Ordering::Equal,
            (Value::Bool(a), Value::Bool(b)) => a.cmp(b),
            (Value::Int(a), Value::Int(b)) => a.cmp(b),
            (Value::Float(a), Value::Float(b)) => a.total_cmp(b),
            (Value::Char(a), Value::Char(b)) => a.cmp(b),
            (Value::Str(a), Value::Str(b)) => a.cmp(b),
            (Value::List(a), Value::List(b)) => a.iter().cmp(b.iter()),
            _ => self.rank().cmp(&other.rank()),
        }
    }
}

impl Hash for Value {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.rank().hash(state);
        match self {
            Value::Null => {}
            Value::Bool(b) => b.hash(state),
            Value::Int(i) => i.hash(state),
            Value::Float(f) => f.to_bits().hash(state),
            Value::Char(c) => c.hash(state),
            Value::Str(s) => s.hash(state),
            Value::List(items) => items.hash(state),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "null"),
            Value::Bool(b) => write!(f, "{b}"),
            Value::Int(i) => write!(f, "{i}"),
            Value::Float(x) => write!(f, "{x:?}"),
            Value::Char(c) => write!(f, "{c:?}"),
            Value::Str(s) => write!(f, "{:?}", &**s),
            Value::List(items) => {
                write!(f, "[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{item}")?;
                }
                write!(f, "]")
            }
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Int(i)
    }
}

impl From<i32> for Value {
    fn from(i: i32) -> Self {
        Value::Int(i64::from(i))
    }
}

impl From<f64> for Value {
    fn from(x: f64) -> Self {
        Value::Float(x)
    }
}

impl From<char> for Value {
    fn from(c: char) -> Self {
        Value::Char(c)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Str(Arc::from(s))
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Str(Arc::from(s))
    }
}

impl From<Vec<Value>> for Value {
    fn from(items: Vec<Value>) -> Self {
        Value::List(Arc::from(items))
    }
}

/// A set of leaf categories, one bit per leaf [`AtomicKind`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct LeafSet(u8);

impl LeafSet {
    pub const EMPTY: LeafSet = LeafSet(0);
    pub const ALL: LeafSet = LeafSet((1 << AtomicKind::LEAVES.len()) - 1);

    pub fn of(kind: AtomicKind) -> LeafSet {
        match kind {
            AtomicKind::Number => {
                LeafSet::of(AtomicKind::Int).union(LeafSet::of(AtomicKind::Float))
            }
            AtomicKind::Text => LeafSet::of(AtomicKind::Char).union(LeafSet::of(AtomicKind::Str)),
            leaf => LeafSet(1 << leaf as u8),
        }
    }

    pub fn union(self, other: LeafSet) -> LeafSet {
        LeafSet(self.0 | other.0)
    }

    pub fn intersection(self, other: LeafSet) -> LeafSet {
        LeafSet(self.0 & other.0)
    }

    pub fn complement(self) -> LeafSet {
        LeafSet(!self.0 & LeafSet::ALL.0)
    }

    pub fn is_empty(self) -> bool {
        self.0 == 0
    }

    pub fn is_subset(self, other: LeafSet) -> bool {
        self.0 & !other.0 == 0
    }
}

/// A native category of values.
///
/// The first seven variants are leaves and partition every [`Value`];
/// `Number` and `Text` are unions of leaves.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum AtomicKind {
    Null = 0,
    Bool = 1,
    Int = 2,
    Float = 3,
    Char = 4,
    Str = 5,
    List = 6,
    Number = 7,
    Text = 8,
}

impl AtomicKind {
    pub const LEAVES: [AtomicKind; 7] = [
        AtomicKind::Null,
        AtomicKind::Bool,
        AtomicKind::Int,
        AtomicKind::Float,
        AtomicKind::Char,
        AtomicKind::Str,
        AtomicKind::List,
    ];

    pub const ALL: [AtomicKind; 9] = [
        AtomicKind::Null,
        AtomicKind::Bool,
        AtomicKind::Int,
        AtomicKind::Float,
        AtomicKind::Char,
        AtomicKind::Str,
        AtomicKind::List,
        AtomicKind::Number,
        AtomicKind::Text,
    ];

    pub fn leaves(self) -> LeafSet {
        LeafSet::of(self)
    }

    /// Is `value` an instance of this category?
    pub fn contains(self, value: &Value) -> bool {
        LeafSet::of(value.kind()).is_subset(self.leaves())
    }

    /// Every value of the category, when there are finitely many.
    pub fn finite_extent(self) -> Option<Vec<Value>> {
        match self {
            AtomicKind::Null => Some(vec![Value::Null]),
            AtomicKind::Bool => Some(vec![Value::Bool(false), Value::Bool(true)]),
            _ => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            AtomicKind::Null => "Null",
            AtomicKind::Bool => "Bool",
            AtomicKind::Int => "Int",
            AtomicKind::Float => "Float",
            AtomicKind::Char => "Char",
            AtomicKind::Str => "Str",
            AtomicKind::List => "List",
            AtomicKind::Number => "Number",
            AtomicKind::Text => "Text",
        }
    }
}

/// Every value whose leaf category is in `leaves`, or `None` when one of
/// those leaves is infinite.
pub fn finite_extent_of(leaves: LeafSet) -> Option<Vec<Value>> {
    let mut values = Vec::new();
    for leaf in AtomicKind::LEAVES {
        if !LeafSet::of(leaf).is_subset(leaves) {
            continue;
        }
        values.extend(leaf.finite_extent()?);
    }
    Some(values)
}

impl fmt::Display for AtomicKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_value_order_is_total() {
        let mut values = vec![
            Value::from("b"),
            Value::from(2),
            Value::Null,
            Value::from(1.5),
            Value::from(true),
            Value::from("a"),
            Value::from(-3),
        ];
        values.sort();
        assert_eq!(
            values,
            vec![
                Value::Null,
                Value::from(true),
                Value::from(-3),
                Value::from(2),
                Value::from(1.5),
                Value::from("a"),
                Value::from("b"),
            ]
        );
    }

    #[test]
    fn test_nan_equals_itself() {
        assert_eq!(Value::from(f64::NAN), Value::from(f64::NAN));
    }

    #[test]
    fn test_leaf_sets() {
        assert!(AtomicKind::Int.leaves().is_subset(AtomicKind::Number.leaves()));
        assert!(!AtomicKind::Number.leaves().is_subset(AtomicKind::Int.leaves()));
        assert!(
            AtomicKind::Str
                .leaves()
                .intersection(AtomicKind::Number.leaves())
                .is_empty()
        );
        assert!(AtomicKind::Number.contains(&Value::from(3)));
        assert!(AtomicKind::Number.contains(&Value::from(3.0)));
        assert!(!AtomicKind::Number.contains(&Value::from("3")));
        assert!(AtomicKind::Text.contains(&Value::from('x')));
    }

    #[test]
    fn test_finite_extent() {
        let leaves = AtomicKind::Null.leaves().union(AtomicKind::Bool.leaves());
        assert_eq!(finite_extent_of(leaves).map(|v| v.len()), Some(3));
        assert_eq!(finite_extent_of(AtomicKind::Number.leaves()), None);
    }
}
