//! Ordered sets of grammar symbols.

use crate::grammar::SymbolId;
use std::{cmp::Ordering, fmt, hash::Hash};

/// An ordered, duplicate-free set of symbols backed by a bit set.
///
/// Iteration always yields symbols in ascending id order.
#[derive(Default, Clone)]
pub struct SymbolSet {
    inner: bit_set::BitSet,
}

impl SymbolSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn from_bits(inner: bit_set::BitSet) -> Self {
        Self { inner }
    }

    pub(crate) fn bits(&self) -> &bit_set::BitSet {
        &self.inner
    }

    pub fn contains(&self, id: SymbolId) -> bool {
        self.inner.contains(id.index())
    }

    /// Insert a symbol, returning `true` if it was not present.
    pub fn insert(&mut self, id: SymbolId) -> bool {
        self.inner.insert(id.index())
    }

    /// Add every member of `other`, returning `true` if the set grew.
    pub fn union_with(&mut self, other: &Self) -> bool {
        let before = self.inner.len();
        self.inner.union_with(&other.inner);
        self.inner.len() != before
    }

    pub fn intersect_with(&mut self, other: &Self) {
        self.inner.intersect_with(&other.inner)
    }

    pub fn difference_with(&mut self, other: &Self) {
        self.inner.difference_with(&other.inner)
    }

    /// The members of `universe` that are not in this set.
    pub fn complement(&self, universe: &Self) -> Self {
        let mut inner = universe.inner.clone();
        inner.difference_with(&self.inner);
        Self { inner }
    }

    pub fn is_subset(&self, other: &Self) -> bool {
        self.inner.is_subset(&other.inner)
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = SymbolId> + '_ {
        self.inner.iter().map(SymbolId::from_index)
    }
}

impl PartialEq for SymbolSet {
    fn eq(&self, other: &Self) -> bool {
        self.iter().eq(other.iter())
    }
}

impl Eq for SymbolSet {}

impl Hash for SymbolSet {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        for id in self.iter() {
            id.hash(state);
        }
    }
}

impl PartialOrd for SymbolSet {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for SymbolSet {
    fn cmp(&self, other: &Self) -> Ordering {
        self.iter().cmp(other.iter())
    }
}

impl fmt::Debug for SymbolSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.iter()).finish()
    }
}

impl FromIterator<SymbolId> for SymbolSet {
    fn from_iter<I>(iter: I) -> Self
    where
        I: IntoIterator<Item = SymbolId>,
    {
        Self {
            inner: iter.into_iter().map(SymbolId::index).collect(),
        }
    }
}

impl Extend<SymbolId> for SymbolSet {
    fn extend<I: IntoIterator<Item = SymbolId>>(&mut self, iter: I) {
        for id in iter {
            self.insert(id);
        }
    }
}
