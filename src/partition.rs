//! Partition and partition group data model (§3).

use serde::{Deserialize, Serialize};

/// An opaque, heap-owned container of elements of type `T`.
///
/// `is_empty()` is true iff the partition holds zero elements. `fit()`
/// normalizes internal storage and is idempotent.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Partition<T> {
    elements: Vec<T>,
}

impl<T> Partition<T> {
    pub fn new(elements: Vec<T>) -> Self {
        Self { elements }
    }

    pub fn empty() -> Self {
        Self { elements: Vec::new() }
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn as_slice(&self) -> &[T] {
        &self.elements
    }

    pub fn into_vec(self) -> Vec<T> {
        self.elements
    }

    /// Normalize internal storage. Idempotent.
    pub fn fit(&mut self) {
        self.elements.shrink_to_fit();
    }
}

impl<T> From<Vec<T>> for Partition<T> {
    fn from(elements: Vec<T>) -> Self {
        Self::new(elements)
    }
}

/// Ordered, mutable sequence of partitions over element type `T`.
///
/// A slot is `None` only transiently during exchange; callers never observe
/// a `None` slot once a public operation on the group has returned.
#[derive(Debug, Default)]
pub struct PartitionGroup<T> {
    slots: Vec<Option<Partition<T>>>,
}

impl<T> PartitionGroup<T> {
    pub fn new() -> Self {
        Self { slots: Vec::new() }
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self { slots: Vec::with_capacity(capacity) }
    }

    /// Append a partition to the end of the group.
    pub fn add(&mut self, partition: Partition<T>) {
        self.slots.push(Some(partition));
    }

    /// Number of slots currently in the group, including any transient `None`s.
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Borrow the partition at index `i`, if the slot is occupied.
    pub fn get(&self, i: usize) -> Option<&Partition<T>> {
        self.slots[i].as_ref()
    }

    pub fn get_mut(&mut self, i: usize) -> Option<&mut Partition<T>> {
        self.slots[i].as_mut()
    }

    /// Drain the slot at index `i`, leaving `None` behind.
    pub fn take(&mut self, i: usize) -> Option<Partition<T>> {
        self.slots[i].take()
    }

    /// Set the slot at index `i` directly (used when a remote gather/receive
    /// produces a fresh partition for this rank).
    pub fn set(&mut self, i: usize, partition: Option<Partition<T>>) {
        self.slots[i] = partition;
    }

    /// Remove all slots.
    pub fn clear(&mut self) {
        self.slots.clear();
    }

    /// Iterate over occupied slots in order.
    pub fn iter(&self) -> impl Iterator<Item = &Partition<T>> {
        self.slots.iter().filter_map(|s| s.as_ref())
    }

    /// True iff the group holds no occupied, non-empty partitions.
    pub fn all_empty(&self) -> bool {
        self.iter().all(|p| p.is_empty())
    }

    /// Count of occupied slots whose partition is non-empty.
    pub fn non_empty_count(&self) -> usize {
        self.iter().filter(|p| !p.is_empty()).count()
    }

    /// Move every non-empty occupied slot, in index order, into `out`, then
    /// clear `self`. Used as the harvest phase of both exchange strategies.
    pub fn harvest_into(&mut self, out: &mut PartitionGroup<T>) {
        for slot in self.slots.drain(..) {
            if let Some(partition) = slot {
                if !partition.is_empty() {
                    out.add(partition);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fit_is_idempotent() {
        let mut p = Partition::new(vec![1, 2, 3]);
        p.fit();
        let first = p.as_slice().to_vec();
        p.fit();
        assert_eq!(first, p.as_slice());
    }

    #[test]
    fn empty_iff_zero_elements() {
        assert!(Partition::<u8>::empty().is_empty());
        assert!(!Partition::new(vec![1]).is_empty());
    }

    #[test]
    fn harvest_drops_empty_and_clears_source() {
        let mut in_group = PartitionGroup::new();
        in_group.add(Partition::new(vec![1, 2]));
        in_group.add(Partition::<i32>::empty());
        in_group.add(Partition::new(vec![3]));

        let mut out = PartitionGroup::new();
        in_group.harvest_into(&mut out);

        assert_eq!(in_group.len(), 0);
        assert_eq!(out.len(), 2);
        assert_eq!(out.get(0).unwrap().as_slice(), &[1, 2]);
        assert_eq!(out.get(1).unwrap().as_slice(), &[3]);
    }

    #[test]
    fn take_leaves_slot_drained() {
        let mut g = PartitionGroup::new();
        g.add(Partition::new(vec![9]));
        let taken = g.take(0);
        assert!(taken.is_some());
        assert!(g.get(0).is_none());
    }
}
