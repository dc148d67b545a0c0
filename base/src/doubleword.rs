//! 72-bit double-word values, held as an ordered pair of [`Word36`]
//! with the more-significant word first.

use std::fmt::{self, Debug, Display, Formatter};

use serde::Serialize;

use crate::word36::{Word36, MASK_36};

const MASK_72: u128 = (1_u128 << 72) - 1;
const SIGN_BIT_72: u128 = 1 << 71;

#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Default)]
pub struct DoubleWord36 {
    msw: Word36,
    lsw: Word36,
}

impl DoubleWord36 {
    pub const ZERO: DoubleWord36 = DoubleWord36 {
        msw: Word36::ZERO,
        lsw: Word36::ZERO,
    };

    #[must_use]
    pub const fn from_words(msw: Word36, lsw: Word36) -> DoubleWord36 {
        DoubleWord36 { msw, lsw }
    }

    #[must_use]
    pub const fn from_bits(bits: u128) -> DoubleWord36 {
        DoubleWord36 {
            msw: Word36::from_bits(((bits & MASK_72) >> 36) as u64),
            lsw: Word36::from_bits((bits & MASK_36 as u128) as u64),
        }
    }

    #[must_use]
    pub const fn msw(self) -> Word36 {
        self.msw
    }

    #[must_use]
    pub const fn lsw(self) -> Word36 {
        self.lsw
    }

    #[must_use]
    pub const fn bits(self) -> u128 {
        ((self.msw.bits() as u128) << 36) | self.lsw.bits() as u128
    }

    #[must_use]
    pub const fn is_negative(self) -> bool {
        self.msw.is_negative()
    }

    /// True for both 72-bit zero encodings.
    #[must_use]
    pub const fn is_zero(self) -> bool {
        let bits = self.bits();
        bits == 0 || bits == MASK_72
    }

    #[must_use]
    pub const fn negate(self) -> DoubleWord36 {
        DoubleWord36 {
            msw: self.msw.negate(),
            lsw: self.lsw.negate(),
        }
    }

    /// The numeric value; both zero encodings map to 0.
    #[must_use]
    pub const fn as_i128(self) -> i128 {
        let bits = self.bits();
        if bits & SIGN_BIT_72 != 0 {
            -((!bits & MASK_72) as i128)
        } else {
            bits as i128
        }
    }

    #[must_use]
    pub const fn from_i128(value: i128) -> DoubleWord36 {
        if value < 0 {
            DoubleWord36::from_bits(!((-value) as u128) & MASK_72)
        } else {
            DoubleWord36::from_bits(value as u128 & MASK_72)
        }
    }

    #[must_use]
    pub fn left_shift_circular(self, count: u32) -> DoubleWord36 {
        let c = count % 72;
        if c == 0 {
            self
        } else {
            let bits = self.bits();
            DoubleWord36::from_bits((bits << c) | (bits >> (72 - c)))
        }
    }

    #[must_use]
    pub fn right_shift_circular(self, count: u32) -> DoubleWord36 {
        let c = count % 72;
        if c == 0 {
            self
        } else {
            let bits = self.bits();
            DoubleWord36::from_bits((bits >> c) | (bits << (72 - c)))
        }
    }

    #[must_use]
    pub fn left_shift_logical(self, count: u32) -> DoubleWord36 {
        if count >= 72 {
            DoubleWord36::ZERO
        } else {
            DoubleWord36::from_bits(self.bits() << count)
        }
    }

    #[must_use]
    pub fn right_shift_logical(self, count: u32) -> DoubleWord36 {
        if count >= 72 {
            DoubleWord36::ZERO
        } else {
            DoubleWord36::from_bits(self.bits() >> count)
        }
    }

    /// Right shift which fills with copies of the sign bit.
    #[must_use]
    pub fn right_shift_algebraic(self, count: u32) -> DoubleWord36 {
        if count == 0 {
            self
        } else if !self.is_negative() {
            self.right_shift_logical(count)
        } else if count >= 71 {
            DoubleWord36::from_bits(MASK_72)
        } else {
            let fill = MASK_72 & !(MASK_72 >> count);
            DoubleWord36::from_bits((self.bits() >> count) | fill)
        }
    }

    /// 72-bit analogue of [`Word36::left_shift_until_sign_change`];
    /// the maximum count is 71.
    #[must_use]
    pub fn left_shift_until_sign_change(self) -> (DoubleWord36, u32) {
        let mut dw = self;
        let mut count = 0;
        while count < 71 {
            let bit71 = (dw.bits() >> 71) & 1;
            let bit70 = (dw.bits() >> 70) & 1;
            if bit71 != bit70 {
                break;
            }
            dw = dw.left_shift_circular(1);
            count += 1;
        }
        (dw, count)
    }
}

impl Display for DoubleWord36 {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result<(), fmt::Error> {
        write!(f, "{}:{}", self.msw, self.lsw)
    }
}

impl Debug for DoubleWord36 {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        write!(
            f,
            "DoubleWord36{{msw: {:#o}, lsw: {:#o}}}",
            self.msw, self.lsw
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_encodings() {
        assert!(DoubleWord36::ZERO.is_zero());
        assert!(DoubleWord36::ZERO.negate().is_zero());
        assert!(DoubleWord36::ZERO.negate().is_negative());
    }

    #[test]
    fn test_negate_round_trip() {
        let dw = DoubleWord36::from_words(
            Word36::from_bits(0o123_456_701_234),
            Word36::from_bits(0o555_444_333_222),
        );
        assert_eq!(dw.negate().negate(), dw);
        assert_eq!(dw.negate().as_i128(), -dw.as_i128());
    }

    #[test]
    fn test_circular_shift_crosses_word_boundary() {
        let dw = DoubleWord36::from_words(Word36::ZERO, Word36::from_bits(0o400_000_000_000));
        let shifted = dw.left_shift_circular(1);
        assert_eq!(shifted.msw(), Word36::from_bits(1));
        assert_eq!(shifted.lsw(), Word36::ZERO);
    }

    #[test]
    fn test_circular_shift_wraps() {
        let dw = DoubleWord36::from_bits(1 << 71);
        assert_eq!(dw.left_shift_circular(1), DoubleWord36::from_bits(1));
        assert_eq!(dw.left_shift_circular(72), dw);
    }

    #[test]
    fn test_logical_shift() {
        let dw = DoubleWord36::from_bits(1);
        assert_eq!(dw.left_shift_logical(71), DoubleWord36::from_bits(1 << 71));
        assert_eq!(dw.left_shift_logical(72), DoubleWord36::ZERO);
    }

    #[test]
    fn test_shift_until_sign_change() {
        let (dw, count) = DoubleWord36::from_bits(1).left_shift_until_sign_change();
        assert_eq!(count, 70);
        assert_eq!(dw, DoubleWord36::from_bits(1 << 70));

        let (dw, count) = DoubleWord36::ZERO.left_shift_until_sign_change();
        assert!(dw.is_zero());
        assert_eq!(count, 71);
    }
}
