//! Instruction-word field layout.
//!
//! A fetched instruction is split into fixed fields:
//!
//! ```text
//!  35    30 29  26 25  22 21  18 17 16 15         0
//! +--------+------+------+------+--+--+-------------+
//! |   f    |  j   |  a   |  x   |h |i |      u      |   basic mode
//! +--------+------+------+------+--+--+------+------+
//! |   f    |  j   |  a   |  x   |h |i |  b   |  d   |   extended mode
//! +--------+------+------+------+--+--+------+------+
//!                                      15  12 11   0
//! ```
//!
//! The same word is interpreted in whichever mode the designator
//! register currently selects; only the low 16 bits differ.

use std::fmt::{self, Debug, Display, Formatter};

use serde::Serialize;

use crate::word36::Word36;

/// Mask covering the x, h, i and u fields (bits 0-21), the part of an
/// instruction replaced by each basic-mode indirect-addressing hop.
const XHIU_MASK: u64 = 0o000_017_777_777;

#[derive(Clone, Copy, PartialEq, Eq, Serialize, Default)]
pub struct InstructionWord {
    word: Word36,
}

impl InstructionWord {
    #[must_use]
    pub const fn new(word: Word36) -> InstructionWord {
        InstructionWord { word }
    }

    #[must_use]
    pub const fn word(self) -> Word36 {
        self.word
    }

    /// Function code, bits 30-35.
    #[must_use]
    pub const fn f(self) -> u8 {
        ((self.word.bits() >> 30) & 0o77) as u8
    }

    /// Partial-word / immediate designator, bits 26-29.
    #[must_use]
    pub const fn j(self) -> u8 {
        ((self.word.bits() >> 26) & 0o17) as u8
    }

    /// Register (or minor function) field, bits 22-25.
    #[must_use]
    pub const fn a(self) -> u8 {
        ((self.word.bits() >> 22) & 0o17) as u8
    }

    /// Index register selector, bits 18-21.
    #[must_use]
    pub const fn x(self) -> u8 {
        ((self.word.bits() >> 18) & 0o17) as u8
    }

    /// Index-increment bit, bit 17.
    #[must_use]
    pub const fn h(self) -> bool {
        self.word.bits() & (1 << 17) != 0
    }

    /// Indirect bit (basic mode), bit 16.
    #[must_use]
    pub const fn i(self) -> bool {
        self.word.bits() & (1 << 16) != 0
    }

    /// Basic-mode displacement, bits 0-15.
    #[must_use]
    pub const fn u(self) -> u64 {
        self.word.bits() & 0o177_777
    }

    /// The combined h, i and u fields, bits 0-17; the immediate
    /// operand source when no index register is named.
    #[must_use]
    pub const fn hiu(self) -> u64 {
        self.word.bits() & 0o777_777
    }

    /// Extended-mode base register selector, bits 12-15.
    #[must_use]
    pub const fn b(self) -> u8 {
        ((self.word.bits() >> 12) & 0o17) as u8
    }

    /// Extended-mode base selector widened by the i bit, giving
    /// privileged code access to B16-B31.
    #[must_use]
    pub const fn b_extended(self) -> u8 {
        ((self.word.bits() >> 12) & 0o17) as u8 | if self.i() { 0o20 } else { 0 }
    }

    /// Extended-mode displacement, bits 0-11.
    #[must_use]
    pub const fn d(self) -> u64 {
        self.word.bits() & 0o7777
    }

    /// Replace the x, h, i and u fields from an indirect word fetched
    /// during basic-mode address resolution.
    pub fn splice_xhiu(&mut self, indirect: Word36) {
        self.word = Word36::from_bits(
            (self.word.bits() & !XHIU_MASK) | (indirect.bits() & XHIU_MASK),
        );
    }
}

impl From<Word36> for InstructionWord {
    fn from(word: Word36) -> InstructionWord {
        InstructionWord { word }
    }
}

impl Display for InstructionWord {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:02o} {:02o} {:02o} {:02o} {:o} {:o} {:06o}",
            self.f(),
            self.j(),
            self.a(),
            self.x(),
            u8::from(self.h()),
            u8::from(self.i()),
            self.u(),
        )
    }
}

impl Debug for InstructionWord {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        write!(f, "InstructionWord{{{}}}", self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // f=010 j=016 a=05 x=03 h=1 i=0 u=012345
    const SAMPLE: u64 = 0o107_123_412_345;

    #[test]
    fn test_field_extraction() {
        let iw = InstructionWord::new(Word36::from_bits(SAMPLE));
        assert_eq!(iw.f(), 0o10);
        assert_eq!(iw.j(), 0o16);
        assert_eq!(iw.a(), 0o05);
        assert_eq!(iw.x(), 0o03);
        assert!(iw.h());
        assert!(!iw.i());
        assert_eq!(iw.u(), 0o012_345);
        assert_eq!(iw.hiu(), 0o412_345);
    }

    #[test]
    fn test_extended_fields() {
        let iw = InstructionWord::new(Word36::from_bits(SAMPLE));
        assert_eq!(iw.b(), 0o01);
        assert_eq!(iw.d(), 0o2345);
        assert_eq!(iw.b_extended(), 0o01);

        let privileged = InstructionWord::new(Word36::from_bits(SAMPLE | (1 << 16)));
        assert_eq!(privileged.b_extended(), 0o21);
    }

    #[test]
    fn test_splice_preserves_major_fields() {
        let mut iw = InstructionWord::new(Word36::from_bits(SAMPLE));
        iw.splice_xhiu(Word36::from_bits(0o777_774_454_321));
        assert_eq!(iw.f(), 0o10);
        assert_eq!(iw.j(), 0o16);
        assert_eq!(iw.a(), 0o05);
        assert_eq!(iw.x(), 0o14);
        assert!(iw.h());
        assert!(!iw.i());
        assert_eq!(iw.u(), 0o054_321);
    }

    #[test]
    fn test_display() {
        let iw = InstructionWord::new(Word36::from_bits(SAMPLE));
        assert_eq!(iw.to_string(), "10 16 05 03 1 0 012345");
    }
}
