//! The prelude exports the types which are useful in representing
//! things to do with the 36-bit machine.  Providing this prelude is
//! the main purpose of the base crate.
pub use super::doubleword::DoubleWord36;
pub use super::floating::{
    add_floating, divide_floating, multiply_floating, subtract_floating, ArithmeticCondition,
    FloatingPoint,
};
pub use super::indexreg::IndexRegister;
pub use super::instruction::InstructionWord;
pub use super::w36;
pub use super::word36::{
    add_ones_complement, negate_field, sign_extend, ConversionFailed, Sum36, Word36, MASK_36,
};
