//! Main storage shared between instruction processors.
//!
//! Storage is a collection of independently allocated segments of
//! 36-bit words.  An [`AbsoluteAddress`] names a word by segment and
//! offset; base registers map bank-relative addresses into this
//! space.  Bounds are always validated against base-register limits
//! before storage is touched, so an out-of-range absolute address
//! here is an implementation defect and panics.

use std::sync::{Arc, RwLock};

use serde::Serialize;

use base::prelude::*;

use crate::regfile::{AccessInfo, AccessPermissions, BaseRegister};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize)]
pub struct AbsoluteAddress {
    pub segment: u16,
    pub offset: u32,
}

impl AbsoluteAddress {
    #[must_use]
    pub const fn new(segment: u16, offset: u32) -> AbsoluteAddress {
        AbsoluteAddress { segment, offset }
    }

    #[must_use]
    pub const fn offset_by(self, words: u32) -> AbsoluteAddress {
        AbsoluteAddress {
            segment: self.segment,
            offset: self.offset + words,
        }
    }

    /// Segment in the upper 12 bits, offset in the lower 24.
    #[must_use]
    pub const fn to_word(self) -> Word36 {
        Word36::from_bits(((self.segment as u64) << 24) | (self.offset as u64 & 0o77_777_777))
    }
}

impl std::fmt::Display for AbsoluteAddress {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:o}:{:08o}", self.segment, self.offset)
    }
}

/// A bank-relative memory image produced by the (external) linker,
/// ready to be placed into storage and based on a register.
#[derive(Debug, Clone, Serialize)]
pub struct BankImage {
    pub lower_limit: u32,
    pub upper_limit: u32,
    pub large_size: bool,
    pub access_lock: AccessInfo,
    pub general_permissions: AccessPermissions,
    pub special_permissions: AccessPermissions,
    pub words: Vec<Word36>,
}

impl BankImage {
    /// A convenience for building code/data banks in tests and
    /// bootstrap paths: limits `0..words.len()-1`, fully permissive.
    #[must_use]
    pub fn with_words(words: Vec<Word36>) -> BankImage {
        BankImage {
            lower_limit: 0,
            upper_limit: words.len().saturating_sub(1) as u32,
            large_size: false,
            access_lock: AccessInfo::default(),
            general_permissions: AccessPermissions::all(),
            special_permissions: AccessPermissions::all(),
            words,
        }
    }
}

/// Handle on the shared main storage.  Clones refer to the same
/// underlying segments.
#[derive(Debug, Clone, Default)]
pub struct MainStorage {
    segments: Arc<RwLock<Vec<Vec<Word36>>>>,
}

impl MainStorage {
    #[must_use]
    pub fn new() -> MainStorage {
        MainStorage::default()
    }

    /// Allocate a zero-filled segment, returning its index.
    pub fn allocate(&self, words: usize) -> u16 {
        let mut segments = self.segments.write().expect("main storage poisoned");
        segments.push(vec![Word36::ZERO; words]);
        (segments.len() - 1) as u16
    }

    #[must_use]
    pub fn read(&self, address: AbsoluteAddress) -> Word36 {
        let segments = self.segments.read().expect("main storage poisoned");
        segments[address.segment as usize][address.offset as usize]
    }

    pub fn write(&self, address: AbsoluteAddress, value: Word36) {
        let mut segments = self.segments.write().expect("main storage poisoned");
        segments[address.segment as usize][address.offset as usize] = value;
    }

    #[must_use]
    pub fn read_range(&self, address: AbsoluteAddress, count: usize) -> Vec<Word36> {
        let segments = self.segments.read().expect("main storage poisoned");
        let segment = &segments[address.segment as usize];
        segment[address.offset as usize..address.offset as usize + count].to_vec()
    }

    /// Place a bank image into a fresh segment and return the base
    /// register describing it.
    pub fn load_image(&self, image: &BankImage) -> BaseRegister {
        let size = (image.upper_limit - image.lower_limit + 1) as usize;
        let segment = self.allocate(size);
        let base = AbsoluteAddress::new(segment, 0);
        for (i, word) in image.words.iter().take(size).enumerate() {
            self.write(base.offset_by(i as u32), *word);
        }
        BaseRegister::new(
            base,
            image.large_size,
            image.lower_limit,
            image.upper_limit,
            image.access_lock,
            image.general_permissions,
            image.special_permissions,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_back_written_word() {
        let storage = MainStorage::new();
        let segment = storage.allocate(0o100);
        let addr = AbsoluteAddress::new(segment, 0o42);
        storage.write(addr, Word36::from_bits(0o123_456_654_321));
        assert_eq!(storage.read(addr), Word36::from_bits(0o123_456_654_321));
    }

    #[test]
    fn test_clones_share_segments() {
        let storage = MainStorage::new();
        let segment = storage.allocate(4);
        let other = storage.clone();
        let addr = AbsoluteAddress::new(segment, 1);
        storage.write(addr, Word36::from_bits(7));
        assert_eq!(other.read(addr), Word36::from_bits(7));
    }

    #[test]
    fn test_load_image_builds_base_register() {
        let storage = MainStorage::new();
        let image = BankImage {
            lower_limit: 0o100,
            upper_limit: 0o103,
            large_size: false,
            access_lock: AccessInfo::default(),
            general_permissions: AccessPermissions::all(),
            special_permissions: AccessPermissions::all(),
            words: vec![
                Word36::from_bits(1),
                Word36::from_bits(2),
                Word36::from_bits(3),
                Word36::from_bits(4),
            ],
        };
        let bank = storage.load_image(&image);
        assert!(!bank.is_void());
        assert!(bank.contains(0o101));
        assert_eq!(storage.read(bank.absolute_address(0o100)), Word36::from_bits(1));
        assert_eq!(storage.read(bank.absolute_address(0o103)), Word36::from_bits(4));
    }
}
