//! Equivalence bookkeeping for provisional blob labels.
//!
//! During the forward scan a blob that is not simply connected can pick
//! up several provisional labels before the scan discovers they belong
//! together. The [`EquivalenceRegistry`] records those discoveries as a
//! collection of label sets that is kept pairwise disjoint at all times:
//! inserting a new set merges it with every existing set it touches,
//! transitively, before it lands in the registry.

use std::cmp::Ordering;
use std::collections::BTreeSet;

use crate::types::Label;

/// A disjoint collection of sets of provisional labels.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EquivalenceRegistry {
    sets: Vec<BTreeSet<Label>>,
}

impl EquivalenceRegistry {
    /// Create an empty registry.
    #[must_use]
    pub const fn new() -> Self {
        Self { sets: Vec::new() }
    }

    /// Number of equivalence sets currently held.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.sets.len()
    }

    /// Whether the registry holds no sets.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.sets.is_empty()
    }

    /// Record that all labels in `labels` are equivalent.
    ///
    /// Every existing set sharing at least one member with the (growing)
    /// working set is absorbed into it and removed, and passes over the
    /// registry repeat until one makes no merges. Iterating to a fixed
    /// point closes the equivalence transitively within this call, so
    /// callers never need a separate global merge pass.
    pub fn insert_and_merge(&mut self, labels: BTreeSet<Label>) {
        let mut working = labels;
        loop {
            let mut absorbed_any = false;
            let mut index = 0;
            while index < self.sets.len() {
                if sets_intersect(&working, &self.sets[index]) {
                    working.extend(self.sets.remove(index));
                    absorbed_any = true;
                } else {
                    index += 1;
                }
            }
            if !absorbed_any {
                break;
            }
        }
        self.sets.push(working);
    }

    /// The set containing `label`, if any.
    #[must_use]
    pub fn class_of(&self, label: Label) -> Option<&BTreeSet<Label>> {
        self.sets.iter().find(|set| set.contains(&label))
    }

    /// Remove and return the set containing `label`, if any.
    ///
    /// Consolidation consumes the partition destructively through this.
    pub fn take_class_of(&mut self, label: Label) -> Option<BTreeSet<Label>> {
        let index = self.sets.iter().position(|set| set.contains(&label))?;
        Some(self.sets.remove(index))
    }

    /// Iterate over the held sets.
    pub fn iter(&self) -> std::slice::Iter<'_, BTreeSet<Label>> {
        self.sets.iter()
    }
}

impl<'a> IntoIterator for &'a EquivalenceRegistry {
    type Item = &'a BTreeSet<Label>;
    type IntoIter = std::slice::Iter<'a, BTreeSet<Label>>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Whether two ordered label sets share a member.
///
/// Walks both sorted sequences with one cursor each, always advancing
/// the cursor at the smaller value; equal values mean an intersection.
fn sets_intersect(a: &BTreeSet<Label>, b: &BTreeSet<Label>) -> bool {
    let mut a_iter = a.iter().peekable();
    let mut b_iter = b.iter().peekable();
    while let (Some(&a_val), Some(&b_val)) = (a_iter.peek(), b_iter.peek()) {
        match a_val.cmp(b_val) {
            Ordering::Less => {
                a_iter.next();
            }
            Ordering::Greater => {
                b_iter.next();
            }
            Ordering::Equal => return true,
        }
    }
    false
}
