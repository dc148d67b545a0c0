//! The one's-complement 36-bit machine word.
//!
//! Values are held in a `u64`; every mutating operation masks the
//! result back down to 36 bits, so bits above bit 35 are always zero.
//! One's-complement representation means zero has two encodings
//! (all-zeros and all-ones) and negation is bitwise complement.
//!
//! Bit numbering follows the hardware convention: bit 35 is the
//! leftmost (sign) bit, bit 0 the rightmost.  Partial-word fields are
//! numbered left to right, so S1/Q1/T1/H1 are the most-significant
//! sixth/quarter/third/half.

use std::fmt::{self, Debug, Display, Formatter, Octal};
use std::ops::{BitAnd, BitOr, BitXor, Not};

use serde::Serialize;

/// All 36 value bits set; also the negative-zero encoding.
pub const MASK_36: u64 = 0o777_777_777_777;
const SIGN_BIT: u64 = 1 << 35;

/// Sign-extend a `bits`-wide field out to the full 36-bit width.
pub const fn sign_extend(value: u64, bits: u32) -> u64 {
    let sign = 1_u64 << (bits - 1);
    if value & sign != 0 {
        (value | (MASK_36 << bits)) & MASK_36
    } else {
        value
    }
}

/// One's-complement addition confined to a field of `bits` width,
/// with end-around carry.  Both operands must already fit the field.
pub const fn add_ones_complement(lhs: u64, rhs: u64, bits: u32) -> u64 {
    let mask = (1_u64 << bits) - 1;
    let raw = (lhs & mask) + (rhs & mask);
    ((raw & mask) + (raw >> bits)) & mask
}

/// One's-complement negation confined to a field of `bits` width.
pub const fn negate_field(value: u64, bits: u32) -> u64 {
    let mask = (1_u64 << bits) - 1;
    !value & mask
}

#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Default)]
pub struct Word36 {
    bits: u64,
}

/// Outcome of a full-width one's-complement addition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Sum36 {
    pub value: Word36,
    /// End-around carry occurred.
    pub carry: bool,
    /// Operand signs agreed and the result sign differs.
    pub overflow: bool,
}

macro_rules! field_accessors {
    ($(($getter:ident, $setter:ident, $shift:expr, $width:expr)),* $(,)?) => {
        $(
            #[must_use]
            pub const fn $getter(self) -> u64 {
                (self.bits >> $shift) & ((1_u64 << $width) - 1)
            }

            pub fn $setter(&mut self, value: u64) {
                let mask = ((1_u64 << $width) - 1) << $shift;
                self.bits = (self.bits & !mask) | ((value << $shift) & mask);
            }
        )*
    };
}

impl Word36 {
    pub const ZERO: Word36 = Word36 { bits: 0 };
    pub const NEGATIVE_ZERO: Word36 = Word36 { bits: MASK_36 };

    // This will always fail at compile time if N is out of range, so
    // no need to hide it.  It's pub so that it can be used in w36!().
    pub const fn new<const N: u64>() -> Word36 {
        struct Helper<const M: u64>;
        impl<const M: u64> Helper<M> {
            const W: Word36 = {
                if M > MASK_36 {
                    panic!("input value is out of range")
                } else {
                    Word36 { bits: M }
                }
            };
        }
        Helper::<N>::W
    }

    /// Construct from raw bits, discarding anything above bit 35.
    #[must_use]
    pub const fn from_bits(bits: u64) -> Word36 {
        Word36 {
            bits: bits & MASK_36,
        }
    }

    #[must_use]
    pub const fn bits(self) -> u64 {
        self.bits
    }

    /// True for both zero encodings.
    #[must_use]
    pub const fn is_zero(self) -> bool {
        self.bits == 0 || self.bits == MASK_36
    }

    #[must_use]
    pub const fn is_negative(self) -> bool {
        self.bits & SIGN_BIT != 0
    }

    #[must_use]
    pub const fn is_positive(self) -> bool {
        self.bits & SIGN_BIT == 0
    }

    #[must_use]
    pub const fn is_negative_zero(self) -> bool {
        self.bits == MASK_36
    }

    /// Bitwise complement, which is one's-complement negation.
    #[must_use]
    pub const fn negate(self) -> Word36 {
        Word36 {
            bits: !self.bits & MASK_36,
        }
    }

    #[must_use]
    pub const fn magnitude(self) -> Word36 {
        if self.is_negative() {
            self.negate()
        } else {
            self
        }
    }

    /// The numeric value; both zero encodings map to 0.
    #[must_use]
    pub const fn as_i64(self) -> i64 {
        if self.is_negative() {
            -((!self.bits & MASK_36) as i64)
        } else {
            self.bits as i64
        }
    }

    /// Encode a native signed value which must fit in 35 magnitude bits.
    #[must_use]
    pub const fn from_i64(value: i64) -> Word36 {
        if value < 0 {
            Word36 {
                bits: !((-value) as u64) & MASK_36,
            }
        } else {
            Word36 {
                bits: value as u64 & MASK_36,
            }
        }
    }

    /// Full-width one's-complement addition with end-around carry.
    #[must_use]
    pub fn add_ones(self, rhs: Word36) -> Sum36 {
        let raw = self.bits + rhs.bits;
        let carry = raw > MASK_36;
        let value = Word36 {
            bits: ((raw & MASK_36) + (raw >> 36)) & MASK_36,
        };
        let overflow =
            self.is_negative() == rhs.is_negative() && value.is_negative() != self.is_negative();
        Sum36 {
            value,
            carry,
            overflow,
        }
    }

    /// One's-complement subtraction (addition of the complement).
    #[must_use]
    pub fn sub_ones(self, rhs: Word36) -> Sum36 {
        self.add_ones(rhs.negate())
    }

    #[must_use]
    pub fn left_shift_circular(self, count: u32) -> Word36 {
        let c = count % 36;
        if c == 0 {
            self
        } else {
            Word36::from_bits((self.bits << c) | (self.bits >> (36 - c)))
        }
    }

    #[must_use]
    pub fn right_shift_circular(self, count: u32) -> Word36 {
        let c = count % 36;
        if c == 0 {
            self
        } else {
            Word36::from_bits((self.bits >> c) | (self.bits << (36 - c)))
        }
    }

    #[must_use]
    pub fn left_shift_logical(self, count: u32) -> Word36 {
        if count >= 36 {
            Word36::ZERO
        } else {
            Word36::from_bits(self.bits << count)
        }
    }

    #[must_use]
    pub fn right_shift_logical(self, count: u32) -> Word36 {
        if count >= 36 {
            Word36::ZERO
        } else {
            Word36 {
                bits: self.bits >> count,
            }
        }
    }

    /// Right shift which fills with copies of the sign bit.
    #[must_use]
    pub fn right_shift_algebraic(self, count: u32) -> Word36 {
        if count == 0 {
            self
        } else if !self.is_negative() {
            self.right_shift_logical(count)
        } else if count >= 35 {
            Word36::NEGATIVE_ZERO
        } else {
            let fill = MASK_36 & !(MASK_36 >> count);
            Word36 {
                bits: (self.bits >> count) | fill,
            }
        }
    }

    /// Rotate left until bit 35 and bit 34 differ, reporting the
    /// number of shifts taken.  The only operands which never produce
    /// a sign/bit-34 difference are the two zero encodings; those (and
    /// any operand needing the maximum) report a count of 35.
    #[must_use]
    pub fn left_shift_until_sign_change(self) -> (Word36, u32) {
        let mut word = self;
        let mut count = 0;
        while count < 35 {
            let bit35 = (word.bits >> 35) & 1;
            let bit34 = (word.bits >> 34) & 1;
            if bit35 != bit34 {
                break;
            }
            word = word.left_shift_circular(1);
            count += 1;
        }
        (word, count)
    }

    field_accessors!(
        (h1, set_h1, 18, 18),
        (h2, set_h2, 0, 18),
        (q1, set_q1, 27, 9),
        (q2, set_q2, 18, 9),
        (q3, set_q3, 9, 9),
        (q4, set_q4, 0, 9),
        (t1, set_t1, 24, 12),
        (t2, set_t2, 12, 12),
        (t3, set_t3, 0, 12),
        (s1, set_s1, 30, 6),
        (s2, set_s2, 24, 6),
        (s3, set_s3, 18, 6),
        (s4, set_s4, 12, 6),
        (s5, set_s5, 6, 6),
        (s6, set_s6, 0, 6),
    );

    /// Sign-extended half-word fields.
    #[must_use]
    pub const fn xh1(self) -> u64 {
        sign_extend((self.bits >> 18) & 0o777_777, 18)
    }

    #[must_use]
    pub const fn xh2(self) -> u64 {
        sign_extend(self.bits & 0o777_777, 18)
    }

    /// Sign-extended third-word fields.
    #[must_use]
    pub const fn xt1(self) -> u64 {
        sign_extend((self.bits >> 24) & 0o7777, 12)
    }

    #[must_use]
    pub const fn xt2(self) -> u64 {
        sign_extend((self.bits >> 12) & 0o7777, 12)
    }

    #[must_use]
    pub const fn xt3(self) -> u64 {
        sign_extend(self.bits & 0o7777, 12)
    }

    // Work-alikes for the std::ops traits, callable in const context.
    pub const fn and(self, mask: u64) -> Word36 {
        Word36 {
            bits: self.bits & mask,
        }
    }

    pub const fn or(self, mask: u64) -> Word36 {
        Word36 {
            bits: (self.bits | mask) & MASK_36,
        }
    }
}

impl Display for Word36 {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result<(), fmt::Error> {
        write!(f, "{:012o}", self.bits)
    }
}

impl Octal for Word36 {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result<(), fmt::Error> {
        Octal::fmt(&self.bits, f)
    }
}

impl Debug for Word36 {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        write!(f, "Word36{{bits: {:#o}}}", self.bits)
    }
}

impl From<u8> for Word36 {
    fn from(n: u8) -> Word36 {
        Word36 { bits: u64::from(n) }
    }
}

impl From<u16> for Word36 {
    fn from(n: u16) -> Word36 {
        Word36 { bits: u64::from(n) }
    }
}

impl From<u32> for Word36 {
    fn from(n: u32) -> Word36 {
        Word36 { bits: u64::from(n) }
    }
}

impl From<Word36> for u64 {
    fn from(w: Word36) -> u64 {
        w.bits
    }
}

impl TryFrom<u64> for Word36 {
    type Error = ConversionFailed;

    fn try_from(n: u64) -> Result<Word36, ConversionFailed> {
        if n > MASK_36 {
            Err(ConversionFailed::TooLarge)
        } else {
            Ok(Word36 { bits: n })
        }
    }
}

/// Error type for conversions into [`Word36`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConversionFailed {
    TooLarge,
}

impl Display for ConversionFailed {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            ConversionFailed::TooLarge => f.write_str("value does not fit in 36 bits"),
        }
    }
}

impl std::error::Error for ConversionFailed {}

impl BitAnd for Word36 {
    type Output = Word36;
    fn bitand(self, rhs: Word36) -> Word36 {
        Word36 {
            bits: self.bits & rhs.bits,
        }
    }
}

impl BitOr for Word36 {
    type Output = Word36;
    fn bitor(self, rhs: Word36) -> Word36 {
        Word36 {
            bits: self.bits | rhs.bits,
        }
    }
}

impl BitXor for Word36 {
    type Output = Word36;
    fn bitxor(self, rhs: Word36) -> Word36 {
        Word36 {
            bits: self.bits ^ rhs.bits,
        }
    }
}

impl Not for Word36 {
    type Output = Word36;
    fn not(self) -> Word36 {
        self.negate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_strategy::proptest;

    macro_rules! assert_octal_eq {
        ($left:expr, $right:expr $(,)?) => {{
            match (&$left, &$right) {
                (left_val, right_val) => {
                    if !(*left_val == *right_val) {
                        panic!(
                            "Assertion failed: {:>#012o} != {:>#012o}",
                            left_val, right_val
                        );
                    }
                }
            }
        }};
    }

    #[test]
    fn test_two_zero_encodings() {
        assert!(Word36::ZERO.is_zero());
        assert!(Word36::NEGATIVE_ZERO.is_zero());
        assert!(Word36::NEGATIVE_ZERO.is_negative());
        assert_octal_eq!(Word36::ZERO.negate(), Word36::NEGATIVE_ZERO);
        assert_octal_eq!(Word36::NEGATIVE_ZERO.negate(), Word36::ZERO);
    }

    #[test]
    fn test_negate() {
        assert_octal_eq!(
            Word36::from_bits(0o000_000_000_001).negate(),
            Word36::from_bits(0o777_777_777_776)
        );
        assert_eq!(Word36::from_i64(-1).as_i64(), -1);
    }

    #[test]
    fn test_add_end_around_carry() {
        // -2 + 3 = 1 requires the end-around carry.
        let sum = Word36::from_i64(-2).add_ones(Word36::from_i64(3));
        assert_octal_eq!(sum.value, Word36::from_i64(1));
        assert!(sum.carry);
        assert!(!sum.overflow);
    }

    #[test]
    fn test_add_overflow() {
        let big = Word36::from_bits(0o377_777_777_777);
        let sum = big.add_ones(Word36::from_i64(1));
        assert!(sum.overflow);
    }

    #[test]
    fn test_add_negative_zero() {
        // (-0) + (+0) keeps the negative encoding.
        let sum = Word36::NEGATIVE_ZERO.add_ones(Word36::ZERO);
        assert_octal_eq!(sum.value, Word36::NEGATIVE_ZERO);
    }

    #[test]
    fn test_circular_shift_identity() {
        let w = Word36::from_bits(0o112_233_445_566);
        assert_octal_eq!(w.left_shift_circular(0), w);
        assert_octal_eq!(w.left_shift_circular(36), w);
    }

    #[test]
    fn test_circular_shift() {
        let w = Word36::from_bits(0o400_000_000_001);
        assert_octal_eq!(w.left_shift_circular(1), Word36::from_bits(0o000_000_000_003));
        assert_octal_eq!(w.right_shift_circular(1), Word36::from_bits(0o600_000_000_000));
    }

    #[test]
    fn test_logical_shift() {
        let w = Word36::from_bits(0o400_000_000_001);
        assert_octal_eq!(w.left_shift_logical(1), Word36::from_bits(0o000_000_000_002));
        assert_octal_eq!(w.right_shift_logical(1), Word36::from_bits(0o200_000_000_000));
        assert_octal_eq!(w.left_shift_logical(36), Word36::ZERO);
    }

    #[test]
    fn test_algebraic_shift() {
        let neg = Word36::from_bits(0o700_000_000_070);
        assert_octal_eq!(
            neg.right_shift_algebraic(3),
            Word36::from_bits(0o770_000_000_007)
        );
        assert_octal_eq!(neg.right_shift_algebraic(35), Word36::NEGATIVE_ZERO);
        let pos = Word36::from_bits(0o300_000_000_000);
        assert_octal_eq!(
            pos.right_shift_algebraic(33),
            Word36::from_bits(0o000_000_000_003)
        );
    }

    #[test]
    fn test_shift_until_sign_change_zero_operands() {
        let (w, count) = Word36::ZERO.left_shift_until_sign_change();
        assert_octal_eq!(w, Word36::ZERO);
        assert_eq!(count, 35);
        let (w, count) = Word36::NEGATIVE_ZERO.left_shift_until_sign_change();
        assert_octal_eq!(w, Word36::NEGATIVE_ZERO);
        assert_eq!(count, 35);
    }

    #[test]
    fn test_shift_until_sign_change() {
        // Already normalized: bit 35 clear, bit 34 set.
        let normalized = Word36::from_bits(0o200_000_000_000);
        assert_eq!(normalized.left_shift_until_sign_change(), (normalized, 0));
        // One bit, far right: takes 34 shifts to reach bit 34.
        let one = Word36::from_bits(1);
        let (w, count) = one.left_shift_until_sign_change();
        assert_eq!(count, 34);
        assert_octal_eq!(w, Word36::from_bits(0o200_000_000_000));
    }

    #[test]
    fn test_partial_fields() {
        let w = Word36::from_bits(0o123_456_702_345);
        assert_eq!(w.h1(), 0o123_456);
        assert_eq!(w.h2(), 0o702_345);
        assert_eq!(w.s1(), 0o12);
        assert_eq!(w.s6(), 0o45);
        assert_eq!(w.q1(), 0o123);
        assert_eq!(w.q4(), 0o345);
        assert_eq!(w.t1(), 0o1234);
        assert_eq!(w.t3(), 0o2345);
    }

    #[test]
    fn test_partial_field_injection() {
        let mut w = Word36::from_bits(0o123_456_702_345);
        w.set_h2(0o000_007);
        assert_octal_eq!(w, Word36::from_bits(0o123_456_000_007));
        w.set_s1(0o77);
        assert_octal_eq!(w, Word36::from_bits(0o773_456_000_007));
        w.set_q3(0o123);
        assert_octal_eq!(w, Word36::from_bits(0o773_456_123_007));
    }

    #[test]
    fn test_sign_extended_fields() {
        let w = Word36::from_bits(0o000_000_700_000);
        assert_eq!(w.xh2(), 0o777_777_700_000);
        assert_eq!(w.xh1(), 0);
        let t = Word36::from_bits(0o700_012_340_000);
        assert_eq!(t.xt1(), 0o777_777_777_000);
        assert_eq!(t.xt2(), 0o1234);
    }

    #[proptest]
    fn prop_double_negation_is_identity(#[strategy(0_u64..=MASK_36)] bits: u64) {
        let w = Word36::from_bits(bits);
        assert_eq!(w.negate().negate(), w);
    }

    #[proptest]
    fn prop_circular_shifts_invert(
        #[strategy(0_u64..=MASK_36)] bits: u64,
        #[strategy(0_u32..72)] count: u32,
    ) {
        let w = Word36::from_bits(bits);
        assert_eq!(w.left_shift_circular(count).right_shift_circular(count), w);
    }

    #[proptest]
    fn prop_addition_commutes(
        #[strategy(0_u64..=MASK_36)] a: u64,
        #[strategy(0_u64..=MASK_36)] b: u64,
    ) {
        let x = Word36::from_bits(a);
        let y = Word36::from_bits(b);
        assert_eq!(x.add_ones(y).value, y.add_ones(x).value);
    }

    #[proptest]
    fn prop_masking_invariant_holds(
        #[strategy(0_u64..=MASK_36)] a: u64,
        #[strategy(0_u32..80)] count: u32,
    ) {
        let w = Word36::from_bits(a);
        assert!(w.left_shift_circular(count).bits() <= MASK_36);
        assert!(w.left_shift_logical(count).bits() <= MASK_36);
        assert!(w.negate().bits() <= MASK_36);
    }
}
