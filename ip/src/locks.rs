//! The storage-lock arbitration service shared by all instruction
//! processors on a storage complex.
//!
//! Before an instruction mutates shared storage, its processor
//! acquires a lock covering exactly the absolute addresses it will
//! touch.  Acquisition is all-or-nothing and never blocks: if any
//! requested address is held by another processor the caller gets
//! [`LockContention`] back, abandons the attempt with no state
//! changed, and retries the instruction after yielding.

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

use crate::storage::AbsoluteAddress;

/// Unique processor identifier within the storage complex.
pub type UpiId = u16;

/// Another processor holds one of the requested addresses.  The
/// instruction retries; this never reaches the executive layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LockContention;

#[derive(Debug, Default)]
pub struct StorageLocks {
    held: Mutex<HashMap<UpiId, HashSet<AbsoluteAddress>>>,
}

impl StorageLocks {
    #[must_use]
    pub fn new() -> StorageLocks {
        StorageLocks::default()
    }

    /// Acquire every address in `addresses` for `upi`, or none of
    /// them.  Addresses the processor already holds are fine.
    pub fn acquire(
        &self,
        upi: UpiId,
        addresses: &[AbsoluteAddress],
    ) -> Result<(), LockContention> {
        let mut held = self.held.lock().expect("storage lock table poisoned");
        for (owner, addrs) in held.iter() {
            if *owner == upi {
                continue;
            }
            if addresses.iter().any(|a| addrs.contains(a)) {
                return Err(LockContention);
            }
        }
        held.entry(upi).or_default().extend(addresses.iter().copied());
        Ok(())
    }

    /// Drop every lock held by `upi`; called when its current
    /// instruction completes or aborts.
    pub fn release_all(&self, upi: UpiId) {
        let mut held = self.held.lock().expect("storage lock table poisoned");
        held.remove(&upi);
    }

    #[must_use]
    pub fn held_count(&self, upi: UpiId) -> usize {
        let held = self.held.lock().expect("storage lock table poisoned");
        held.get(&upi).map_or(0, HashSet::len)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn addr(offset: u32) -> AbsoluteAddress {
        AbsoluteAddress::new(0, offset)
    }

    #[test]
    fn test_overlapping_ranges_contend() {
        let locks = StorageLocks::new();
        assert_eq!(locks.acquire(1, &[addr(10), addr(11)]), Ok(()));
        assert_eq!(locks.acquire(2, &[addr(11), addr(12)]), Err(LockContention));
        // The loser acquired nothing.
        assert_eq!(locks.held_count(2), 0);
        locks.release_all(1);
        assert_eq!(locks.acquire(2, &[addr(11), addr(12)]), Ok(()));
    }

    #[test]
    fn test_disjoint_ranges_do_not_contend() {
        let locks = StorageLocks::new();
        assert_eq!(locks.acquire(1, &[addr(10)]), Ok(()));
        assert_eq!(locks.acquire(2, &[addr(20)]), Ok(()));
    }

    #[test]
    fn test_reacquire_own_addresses() {
        let locks = StorageLocks::new();
        assert_eq!(locks.acquire(1, &[addr(10)]), Ok(()));
        assert_eq!(locks.acquire(1, &[addr(10), addr(11)]), Ok(()));
        assert_eq!(locks.held_count(1), 2);
    }

    #[test]
    fn test_release_all_clears_everything() {
        let locks = StorageLocks::new();
        assert_eq!(locks.acquire(1, &[addr(10), addr(11)]), Ok(()));
        locks.release_all(1);
        assert_eq!(locks.held_count(1), 0);
        assert_eq!(locks.acquire(2, &[addr(10)]), Ok(()));
    }
}
