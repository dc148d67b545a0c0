//! A keyed priority queue which serves its *lowest*-priority entry
//! first.
//!
//! The interrupt subsystem queues pending machine interrupts keyed by
//! class, where a numerically lower class code means a more urgent
//! condition; wrapping [`KeyedPriorityQueue`] (a max-queue) with a
//! reversed ordering gives exactly that service order.  Pushing a key
//! which is already queued replaces its priority, which matches the
//! at-most-one-pending-per-class rule.

use std::cmp::Ordering;
use std::fmt::{self, Debug, Formatter};
use std::hash::Hash;

use keyed_priority_queue::KeyedPriorityQueue;

#[derive(Debug)]
struct ReverseOrdered<T> {
    inner: T,
}

impl<T> From<T> for ReverseOrdered<T> {
    fn from(inner: T) -> ReverseOrdered<T> {
        ReverseOrdered { inner }
    }
}

impl<T: Ord> PartialOrd for ReverseOrdered<T> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<T: Eq> Eq for ReverseOrdered<T> {}

impl<T: Eq> PartialEq for ReverseOrdered<T> {
    fn eq(&self, other: &Self) -> bool {
        self.inner == other.inner
    }
}

impl<T: Ord> Ord for ReverseOrdered<T> {
    fn cmp(&self, other: &Self) -> Ordering {
        self.inner.cmp(&other.inner).reverse()
    }
}

pub struct KeyedReversePriorityQueue<K: Hash + Eq + Ord, P: Ord> {
    items: KeyedPriorityQueue<K, ReverseOrdered<P>>,
}

impl<K, P> KeyedReversePriorityQueue<K, P>
where
    K: Hash + Eq + Ord,
    P: Ord,
{
    pub fn new() -> KeyedReversePriorityQueue<K, P> {
        KeyedReversePriorityQueue {
            items: KeyedPriorityQueue::<K, ReverseOrdered<P>>::new(),
        }
    }

    /// The entry with the lowest priority value.
    pub fn peek(&self) -> Option<(&K, &P)> {
        self.items.peek().map(|(k, p)| (k, &p.inner))
    }

    /// Remove and return the entry with the lowest priority value.
    pub fn pop(&mut self) -> Option<(K, P)> {
        self.items.pop().map(|(k, p)| (k, p.inner))
    }

    /// Insert an entry, replacing (and returning) the priority of an
    /// existing entry with the same key.
    pub fn push(&mut self, key: K, priority: P) -> Option<P> {
        self.items
            .push(key, ReverseOrdered::from(priority))
            .map(|rd| rd.inner)
    }

    pub fn remove(&mut self, key: &K) -> Option<P> {
        self.items.remove_entry(key).map(|(_, p)| p.inner)
    }

    pub fn contains_key(&self, key: &K) -> bool {
        self.items.get_priority(key).is_some()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn clear(&mut self) {
        self.items.clear();
    }
}

impl<K, P> Default for KeyedReversePriorityQueue<K, P>
where
    K: Hash + Eq + Ord,
    P: Ord,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<K, P> Debug for KeyedReversePriorityQueue<K, P>
where
    K: Hash + Eq + Ord + Debug,
    P: Ord + Debug,
{
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeyedReversePriorityQueue")
            .field("items", &self.items)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lowest_priority_pops_first() {
        let mut q: KeyedReversePriorityQueue<&str, u8> = KeyedReversePriorityQueue::new();
        q.push("quantum-timer", 0o24);
        q.push("hardware-check", 0o01);
        q.push("invalid-instruction", 0o16);
        assert_eq!(q.pop(), Some(("hardware-check", 0o01)));
        assert_eq!(q.pop(), Some(("invalid-instruction", 0o16)));
        assert_eq!(q.pop(), Some(("quantum-timer", 0o24)));
        assert_eq!(q.pop(), None);
    }

    #[test]
    fn test_push_replaces_same_key() {
        let mut q: KeyedReversePriorityQueue<&str, u8> = KeyedReversePriorityQueue::new();
        assert_eq!(q.push("k", 5), None);
        assert_eq!(q.push("k", 3), Some(5));
        assert_eq!(q.len(), 1);
        assert_eq!(q.pop(), Some(("k", 3)));
    }
}
