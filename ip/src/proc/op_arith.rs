//! Fixed-point, logical and floating-point instruction handlers.

use base::prelude::*;

use crate::interrupt::MachineInterrupt;
use crate::proc::{ExecFault, InstructionProcessor};

/// Largest positive 36-bit one's-complement value.
const MAX_POSITIVE: i128 = (1 << 35) - 1;

impl InstructionProcessor {
    /// One's-complement add into A(a + dest), recording carry and
    /// overflow and trapping on overflow when the designator asks
    /// for it.
    fn add_to_accumulator(
        &mut self,
        lhs: Word36,
        rhs: Word36,
        dest: usize,
    ) -> Result<(), ExecFault> {
        let sum = lhs.add_ones(rhs);
        self.designator.set_carry(sum.carry);
        self.designator.set_overflow(sum.overflow);
        self.set_register_a(dest, sum.value);
        if sum.overflow && self.designator.operation_trap_enabled() {
            return Err(MachineInterrupt::operation_trap().into());
        }
        Ok(())
    }

    pub(crate) fn op_aa(&mut self) -> Result<(), ExecFault> {
        let operand = self.get_operand()?;
        let lhs = self.register_a(0);
        self.add_to_accumulator(lhs, operand, 0)
    }

    pub(crate) fn op_ana(&mut self) -> Result<(), ExecFault> {
        let operand = self.get_operand()?;
        let lhs = self.register_a(0);
        self.add_to_accumulator(lhs, operand.negate(), 0)
    }

    pub(crate) fn op_ama(&mut self) -> Result<(), ExecFault> {
        let operand = self.get_operand()?;
        let lhs = self.register_a(0);
        self.add_to_accumulator(lhs, operand.magnitude(), 0)
    }

    pub(crate) fn op_anma(&mut self) -> Result<(), ExecFault> {
        let operand = self.get_operand()?;
        let lhs = self.register_a(0);
        self.add_to_accumulator(lhs, operand.magnitude().negate(), 0)
    }

    /// Sum delivered to A(a+1), leaving A(a) untouched.
    pub(crate) fn op_au(&mut self) -> Result<(), ExecFault> {
        let operand = self.get_operand()?;
        let lhs = self.register_a(0);
        self.add_to_accumulator(lhs, operand, 1)
    }

    pub(crate) fn op_anu(&mut self) -> Result<(), ExecFault> {
        let operand = self.get_operand()?;
        let lhs = self.register_a(0);
        self.add_to_accumulator(lhs, operand.negate(), 1)
    }

    fn add_to_index(&mut self, rhs: Word36) -> Result<(), ExecFault> {
        let sum = self.register_x().word().add_ones(rhs);
        self.designator.set_carry(sum.carry);
        self.designator.set_overflow(sum.overflow);
        self.set_register_x(IndexRegister::new(sum.value));
        if sum.overflow && self.designator.operation_trap_enabled() {
            return Err(MachineInterrupt::operation_trap().into());
        }
        Ok(())
    }

    pub(crate) fn op_ax(&mut self) -> Result<(), ExecFault> {
        let operand = self.get_operand()?;
        self.add_to_index(operand)
    }

    pub(crate) fn op_anx(&mut self) -> Result<(), ExecFault> {
        let operand = self.get_operand()?;
        self.add_to_index(operand.negate())
    }

    /// 72-bit product into A(a) and A(a+1).
    pub(crate) fn op_mi(&mut self) -> Result<(), ExecFault> {
        let operand = self.get_operand()?;
        let product =
            i128::from(self.register_a(0).as_i64()) * i128::from(operand.as_i64());
        let double = DoubleWord36::from_i128(product);
        self.set_register_a(0, double.msw());
        self.set_register_a(1, double.lsw());
        Ok(())
    }

    /// 72-bit dividend in A(a) and A(a+1); quotient to A(a),
    /// remainder to A(a+1).
    pub(crate) fn op_di(&mut self) -> Result<(), ExecFault> {
        let operand = self.get_operand()?;
        let dividend = DoubleWord36::from_words(self.register_a(0), self.register_a(1)).as_i128();
        let divisor = i128::from(operand.as_i64());
        if divisor == 0 || (dividend / divisor).abs() > MAX_POSITIVE {
            self.designator.set_divide_check(true);
            if self.designator.arithmetic_exception_enabled() {
                return Err(
                    MachineInterrupt::arithmetic_exception(ArithmeticCondition::DivideCheck).into(),
                );
            }
            // Exception reporting disabled: the registers are left
            // untouched and execution continues.
            return Ok(());
        }
        let quotient = dividend / divisor;
        let remainder = dividend % divisor;
        self.set_register_a(0, Word36::from_i64(quotient as i64));
        self.set_register_a(1, Word36::from_i64(remainder as i64));
        Ok(())
    }

    // The logical family delivers to A(a+1), like AU.

    pub(crate) fn op_or(&mut self) -> Result<(), ExecFault> {
        let operand = self.get_operand()?;
        let result = self.register_a(0) | operand;
        self.set_register_a(1, result);
        Ok(())
    }

    pub(crate) fn op_xor(&mut self) -> Result<(), ExecFault> {
        let operand = self.get_operand()?;
        let result = self.register_a(0) ^ operand;
        self.set_register_a(1, result);
        Ok(())
    }

    pub(crate) fn op_and(&mut self) -> Result<(), ExecFault> {
        let operand = self.get_operand()?;
        let result = self.register_a(0) & operand;
        self.set_register_a(1, result);
        Ok(())
    }

    /// Apply a floating-point operation to A(a) and the operand.  A
    /// characteristic overflow/underflow or divide check sets the
    /// matching designator and raises an arithmetic exception when
    /// reporting is enabled.
    fn floating_op(
        &mut self,
        op: fn(Word36, Word36) -> Result<Word36, ArithmeticCondition>,
    ) -> Result<(), ExecFault> {
        let operand = self.get_operand()?;
        match op(self.register_a(0), operand) {
            Ok(result) => {
                self.set_register_a(0, result);
                Ok(())
            }
            Err(condition) => {
                match condition {
                    ArithmeticCondition::CharacteristicOverflow => {
                        self.designator.set_characteristic_overflow(true);
                    }
                    ArithmeticCondition::CharacteristicUnderflow => {
                        self.designator.set_characteristic_underflow(true);
                    }
                    ArithmeticCondition::DivideCheck => {
                        self.designator.set_divide_check(true);
                    }
                }
                if self.designator.arithmetic_exception_enabled() {
                    Err(MachineInterrupt::arithmetic_exception(condition).into())
                } else {
                    Ok(())
                }
            }
        }
    }

    pub(crate) fn op_fa(&mut self) -> Result<(), ExecFault> {
        self.floating_op(add_floating)
    }

    pub(crate) fn op_fan(&mut self) -> Result<(), ExecFault> {
        self.floating_op(subtract_floating)
    }

    pub(crate) fn op_fm(&mut self) -> Result<(), ExecFault> {
        self.floating_op(multiply_floating)
    }

    pub(crate) fn op_fd(&mut self) -> Result<(), ExecFault> {
        self.floating_op(divide_floating)
    }
}
