//! Interned transition labels for ε-NFAs.

use indexmap::IndexSet;

use crate::genus::TypeDesignator;

/// A symbol identifier represented as a u32.
/// The special value `EPSILON` represents an epsilon (empty) transition.
pub type SymbolId = u32;

/// Special symbol ID representing epsilon (empty) transitions.
pub const EPSILON: SymbolId = u32::MAX;

#[inline]
pub fn is_epsilon(symbol: SymbolId) -> bool {
    symbol == EPSILON
}

/// Designator labels numbered in order of first use.
#[derive(Clone, Debug, Default)]
pub struct Alphabet {
    labels: IndexSet<TypeDesignator>,
}

impl Alphabet {
    /// The symbol for `label`, allocating one on first use.
    pub fn intern(&mut self, label: TypeDesignator) -> SymbolId {
        self.labels.insert_full(label).0 as SymbolId
    }

    pub fn label(&self, symbol: SymbolId) -> Option<&TypeDesignator> {
        self.labels.get_index(symbol as usize)
    }

    pub fn symbols(&self) -> impl Iterator<Item = SymbolId> + '_ {
        (0..self.labels.len()).map(|i| i as SymbolId)
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::AtomicKind;

    #[test]
    fn test_epsilon() {
        assert!(is_epsilon(EPSILON));
        assert!(!is_epsilon(0));
        assert!(!is_epsilon(100));
    }

    #[test]
    fn test_intern_reuses_symbols() {
        let mut alphabet = Alphabet::default();
        let int = alphabet.intern(TypeDesignator::atomic(AtomicKind::Int));
        let text = alphabet.intern(TypeDesignator::atomic(AtomicKind::Str));
        assert_eq!(alphabet.intern(TypeDesignator::atomic(AtomicKind::Int)), int);
        assert_ne!(int, text);
        assert_eq!(alphabet.len(), 2);
        assert_eq!(alphabet.label(text), Some(&TypeDesignator::atomic(AtomicKind::Str)));
        assert_eq!(alphabet.label(EPSILON), None);
    }
}
