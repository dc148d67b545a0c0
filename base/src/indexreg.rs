//! Index-register view of a machine word.
//!
//! An index register holds an increment field ("XI") and a modifier
//! field ("XM").  In the standard layout XI is the upper half and XM
//! the lower half; executive 24-bit indexing narrows XI to 12 bits
//! and widens XM to 24.  Increment and decrement add the signed
//! increment into the modifier with one's-complement wrap confined to
//! the modifier field; the increment field is never disturbed.

use std::fmt::{self, Debug, Formatter};

use serde::Serialize;

use crate::word36::{add_ones_complement, negate_field, sign_extend, Word36};

const MASK_24: u64 = 0o77_777_777;

#[derive(Clone, Copy, PartialEq, Eq, Serialize, Default)]
pub struct IndexRegister {
    word: Word36,
}

impl IndexRegister {
    #[must_use]
    pub const fn new(word: Word36) -> IndexRegister {
        IndexRegister { word }
    }

    #[must_use]
    pub const fn word(self) -> Word36 {
        self.word
    }

    /// 18-bit increment field.
    #[must_use]
    pub const fn xi(self) -> u64 {
        self.word.h1()
    }

    /// 12-bit increment field (executive 24-bit indexing).
    #[must_use]
    pub const fn xi12(self) -> u64 {
        self.word.t1()
    }

    /// 18-bit modifier field.
    #[must_use]
    pub const fn xm(self) -> u64 {
        self.word.h2()
    }

    /// 24-bit modifier field (executive 24-bit indexing).
    #[must_use]
    pub const fn xm24(self) -> u64 {
        self.word.bits() & MASK_24
    }

    /// Modifier sign-extended to the full word width.
    #[must_use]
    pub const fn signed_xm(self) -> u64 {
        sign_extend(self.xm(), 18)
    }

    #[must_use]
    pub const fn signed_xm24(self) -> u64 {
        sign_extend(self.xm24(), 24)
    }

    #[must_use]
    pub fn with_xm(self, value: u64) -> IndexRegister {
        let mut word = self.word;
        word.set_h2(value);
        IndexRegister { word }
    }

    #[must_use]
    pub fn with_xm24(self, value: u64) -> IndexRegister {
        IndexRegister {
            word: Word36::from_bits((self.word.bits() & !MASK_24) | (value & MASK_24)),
        }
    }

    /// XM += XI, both as signed 18-bit fields.
    #[must_use]
    pub fn incremented_18(self) -> IndexRegister {
        self.with_xm(add_ones_complement(self.xm(), self.xi(), 18))
    }

    /// XM -= XI, both as signed 18-bit fields.
    #[must_use]
    pub fn decremented_18(self) -> IndexRegister {
        self.with_xm(add_ones_complement(self.xm(), negate_field(self.xi(), 18), 18))
    }

    /// XM24 += XI12, the increment sign-extended from 12 to 24 bits.
    #[must_use]
    pub fn incremented_24(self) -> IndexRegister {
        let xi = sign_extend(self.xi12(), 12) & MASK_24;
        self.with_xm24(add_ones_complement(self.xm24(), xi, 24))
    }
}

impl From<Word36> for IndexRegister {
    fn from(word: Word36) -> IndexRegister {
        IndexRegister { word }
    }
}

impl Debug for IndexRegister {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        write!(f, "IndexRegister{{xi: {:#o}, xm: {:#o}}}", self.xi(), self.xm())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_strategy::proptest;

    fn xreg(bits: u64) -> IndexRegister {
        IndexRegister::new(Word36::from_bits(bits))
    }

    #[test]
    fn test_increment_18() {
        // XI = 2, XM = 010: 010 + 2 = 012.
        let x = xreg(0o000_002_000_010).incremented_18();
        assert_eq!(x.xm(), 0o12);
        assert_eq!(x.xi(), 2);
    }

    #[test]
    fn test_increment_18_negative() {
        // XI = -1 (one's complement 0o777776), XM = 5.
        let x = xreg(0o777_776_000_005).incremented_18();
        assert_eq!(x.xm(), 4);
        assert_eq!(x.xi(), 0o777_776);
    }

    #[test]
    fn test_decrement_18() {
        let x = xreg(0o000_002_000_010).decremented_18();
        assert_eq!(x.xm(), 0o6);
    }

    #[test]
    fn test_increment_wraps_in_field() {
        // XM at the most positive 18-bit value; adding 1 overflows
        // into the sign, wrapping within the field only.
        let x = xreg(0o000_001_377_777).incremented_18();
        assert_eq!(x.xm(), 0o400_000);
        assert_eq!(x.xi(), 1);
        assert_eq!(x.word().h1(), 1);
    }

    #[test]
    fn test_increment_24() {
        // XI12 = 3, XM24 = 0o77_000_000 | 5 pattern.
        let x = xreg(0o0003_00_000_005).incremented_24();
        assert_eq!(x.xm24(), 8);
        assert_eq!(x.xi12(), 3);
    }

    #[test]
    fn test_increment_24_negative_increment() {
        // XI12 = -2 (0o7775).
        let x = xreg(0o7775_00_000_005).incremented_24();
        assert_eq!(x.xm24(), 3);
        assert_eq!(x.xi12(), 0o7775);
    }

    #[proptest]
    fn prop_increment_never_touches_increment_field(
        #[strategy(0_u64..=crate::prelude::MASK_36)] bits: u64,
    ) {
        let x = xreg(bits);
        assert_eq!(x.incremented_18().xi(), x.xi());
        assert_eq!(x.decremented_18().xi(), x.xi());
        assert_eq!(x.incremented_24().xi12(), x.xi12());
    }

    #[proptest]
    fn prop_increment_then_decrement_is_identity_on_xm(
        #[strategy(0_u64..=crate::prelude::MASK_36)] bits: u64,
    ) {
        let x = xreg(bits);
        // One's-complement wrap is symmetric, up to the two zero
        // encodings of the modifier field.
        let round = x.incremented_18().decremented_18();
        let same = round.xm() == x.xm()
            || (round.xm() == 0 && x.xm() == 0o777_777)
            || (round.xm() == 0o777_777 && x.xm() == 0);
        assert!(same);
    }
}
