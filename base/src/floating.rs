//! Single-precision floating-point characteristic arithmetic.
//!
//! The machine format packs a sign bit (bit 35), an 8-bit
//! characteristic (bits 27-34, exponent biased by 0200) and a 27-bit
//! normalized fraction (bits 0-26).  Negative values store the
//! one's-complement of the entire word.
//!
//! Overflow and underflow of the characteristic, and division by
//! zero, are reported as typed errors; they never panic and are never
//! folded into the raw integer operations.

use std::fmt::{self, Display, Formatter};

use serde::Serialize;

use crate::word36::Word36;

const CHARACTERISTIC_BIAS: i32 = 0o200;
const MANTISSA_BITS: u32 = 27;
const MANTISSA_MASK: u64 = (1 << MANTISSA_BITS) - 1;
const MANTISSA_TOP_BIT: u64 = 1 << (MANTISSA_BITS - 1);

/// Conditions surfaced by characteristic arithmetic.  The instruction
/// handlers translate these into designator-register bits and, where
/// the architecture calls for it, an arithmetic-exception interrupt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ArithmeticCondition {
    CharacteristicOverflow,
    CharacteristicUnderflow,
    DivideCheck,
}

impl Display for ArithmeticCondition {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            ArithmeticCondition::CharacteristicOverflow => {
                f.write_str("characteristic overflow")
            }
            ArithmeticCondition::CharacteristicUnderflow => {
                f.write_str("characteristic underflow")
            }
            ArithmeticCondition::DivideCheck => f.write_str("divide check"),
        }
    }
}

impl std::error::Error for ArithmeticCondition {}

/// An unpacked floating-point value: sign, unbiased exponent, and the
/// fraction left-aligned in the low 27 bits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FloatingPoint {
    negative: bool,
    exponent: i32,
    mantissa: u64,
}

impl FloatingPoint {
    #[must_use]
    pub fn unpack(word: Word36) -> FloatingPoint {
        let negative = word.is_negative();
        let magnitude = word.magnitude().bits();
        FloatingPoint {
            negative,
            exponent: ((magnitude >> MANTISSA_BITS) & 0o377) as i32 - CHARACTERISTIC_BIAS,
            mantissa: magnitude & MANTISSA_MASK,
        }
    }

    pub fn pack(mut self) -> Result<Word36, ArithmeticCondition> {
        if self.mantissa == 0 {
            return Ok(Word36::ZERO);
        }
        self.normalize();
        let characteristic = self.exponent + CHARACTERISTIC_BIAS;
        if characteristic > 0o377 {
            return Err(ArithmeticCondition::CharacteristicOverflow);
        }
        if characteristic < 0 {
            return Err(ArithmeticCondition::CharacteristicUnderflow);
        }
        let magnitude =
            Word36::from_bits(((characteristic as u64) << MANTISSA_BITS) | self.mantissa);
        Ok(if self.negative {
            magnitude.negate()
        } else {
            magnitude
        })
    }

    #[must_use]
    pub const fn is_zero(&self) -> bool {
        self.mantissa == 0
    }

    /// Shift the mantissa so its top fraction bit is set, adjusting
    /// the exponent to match.  A zero mantissa is left alone.
    fn normalize(&mut self) {
        if self.mantissa == 0 {
            return;
        }
        while self.mantissa > MANTISSA_MASK {
            self.mantissa >>= 1;
            self.exponent += 1;
        }
        while self.mantissa & MANTISSA_TOP_BIT == 0 {
            self.mantissa <<= 1;
            self.exponent -= 1;
        }
    }

    /// Signed mantissa as a native value, for magnitude arithmetic.
    fn signed_mantissa(&self) -> i64 {
        if self.negative {
            -(self.mantissa as i64)
        } else {
            self.mantissa as i64
        }
    }

    fn from_signed_mantissa(value: i64, exponent: i32) -> FloatingPoint {
        FloatingPoint {
            negative: value < 0,
            exponent,
            mantissa: value.unsigned_abs(),
        }
    }
}

/// Floating add; the operand with the smaller characteristic is
/// aligned rightward before the mantissas combine.
pub fn add_floating(lhs: Word36, rhs: Word36) -> Result<Word36, ArithmeticCondition> {
    let a = FloatingPoint::unpack(lhs);
    let b = FloatingPoint::unpack(rhs);
    if a.is_zero() {
        return b.pack();
    }
    if b.is_zero() {
        return a.pack();
    }
    let exponent = a.exponent.max(b.exponent);
    let align = |fp: &FloatingPoint| -> i64 {
        let shift = exponent - fp.exponent;
        if shift >= MANTISSA_BITS as i32 {
            0
        } else {
            fp.signed_mantissa() >> shift
        }
    };
    FloatingPoint::from_signed_mantissa(align(&a) + align(&b), exponent).pack()
}

pub fn subtract_floating(lhs: Word36, rhs: Word36) -> Result<Word36, ArithmeticCondition> {
    add_floating(lhs, rhs.negate())
}

pub fn multiply_floating(lhs: Word36, rhs: Word36) -> Result<Word36, ArithmeticCondition> {
    let a = FloatingPoint::unpack(lhs);
    let b = FloatingPoint::unpack(rhs);
    if a.is_zero() || b.is_zero() {
        return Ok(Word36::ZERO);
    }
    let product = (a.mantissa as u128 * b.mantissa as u128) >> MANTISSA_BITS;
    FloatingPoint {
        negative: a.negative != b.negative,
        exponent: a.exponent + b.exponent,
        mantissa: product as u64,
    }
    .pack()
}

/// Floating divide; a zero divisor is a divide check.
pub fn divide_floating(lhs: Word36, rhs: Word36) -> Result<Word36, ArithmeticCondition> {
    let a = FloatingPoint::unpack(lhs);
    let b = FloatingPoint::unpack(rhs);
    if b.is_zero() {
        return Err(ArithmeticCondition::DivideCheck);
    }
    if a.is_zero() {
        return Ok(Word36::ZERO);
    }
    let quotient = ((a.mantissa as u128) << MANTISSA_BITS) / b.mantissa as u128;
    FloatingPoint {
        negative: a.negative != b.negative,
        exponent: a.exponent - b.exponent,
        mantissa: quotient as u64,
    }
    .pack()
}

#[cfg(test)]
mod tests {
    use super::*;

    // 0.5 * 2^1 = 1.0
    const ONE: u64 = 0o201_400_000_000;
    // 0.5 * 2^2 = 2.0
    const TWO: u64 = 0o202_400_000_000;

    #[test]
    fn test_unpack_pack_round_trip() {
        let w = Word36::from_bits(ONE);
        assert_eq!(FloatingPoint::unpack(w).pack(), Ok(w));
        let neg = w.negate();
        assert_eq!(FloatingPoint::unpack(neg).pack(), Ok(neg));
    }

    #[test]
    fn test_add_one_and_one() {
        let one = Word36::from_bits(ONE);
        assert_eq!(add_floating(one, one), Ok(Word36::from_bits(TWO)));
    }

    #[test]
    fn test_add_cancels_to_zero() {
        let one = Word36::from_bits(ONE);
        assert_eq!(add_floating(one, one.negate()), Ok(Word36::ZERO));
    }

    #[test]
    fn test_multiply() {
        let two = Word36::from_bits(TWO);
        // 2.0 * 2.0 = 4.0 = 0.5 * 2^3
        assert_eq!(
            multiply_floating(two, two),
            Ok(Word36::from_bits(0o203_400_000_000))
        );
    }

    #[test]
    fn test_divide_by_zero_is_divide_check() {
        let one = Word36::from_bits(ONE);
        assert_eq!(
            divide_floating(one, Word36::ZERO),
            Err(ArithmeticCondition::DivideCheck)
        );
        assert_eq!(
            divide_floating(one, Word36::NEGATIVE_ZERO),
            Err(ArithmeticCondition::DivideCheck)
        );
    }

    #[test]
    fn test_characteristic_overflow() {
        // The largest characteristic times itself must overflow.
        let huge = Word36::from_bits(0o377_400_000_000);
        assert_eq!(
            multiply_floating(huge, huge),
            Err(ArithmeticCondition::CharacteristicOverflow)
        );
    }

    #[test]
    fn test_characteristic_underflow() {
        let tiny = Word36::from_bits(0o000_400_000_000);
        assert_eq!(
            multiply_floating(tiny, tiny),
            Err(ArithmeticCondition::CharacteristicUnderflow)
        );
    }
}
