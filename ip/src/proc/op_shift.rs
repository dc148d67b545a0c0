//! Shift instruction handlers.
//!
//! The shift count is the low seven bits of the resolved operand
//! address.  Single shifts act on A(a); double shifts act on the
//! 72-bit concatenation of A(a) and A(a+1).

use base::prelude::*;

use crate::proc::{ExecFault, InstructionProcessor};

impl InstructionProcessor {
    fn shift_count(&self) -> u32 {
        self.resolved_address() & 0o177
    }

    fn double_accumulator(&self) -> DoubleWord36 {
        DoubleWord36::from_words(self.register_a(0), self.register_a(1))
    }

    fn set_double_accumulator(&mut self, value: DoubleWord36) {
        self.set_register_a(0, value.msw());
        self.set_register_a(1, value.lsw());
    }

    pub(crate) fn op_ssc(&mut self) -> Result<(), ExecFault> {
        let count = self.shift_count();
        let result = self.register_a(0).right_shift_circular(count);
        self.set_register_a(0, result);
        Ok(())
    }

    pub(crate) fn op_dsc(&mut self) -> Result<(), ExecFault> {
        let count = self.shift_count();
        let result = self.double_accumulator().right_shift_circular(count);
        self.set_double_accumulator(result);
        Ok(())
    }

    pub(crate) fn op_ssl(&mut self) -> Result<(), ExecFault> {
        let count = self.shift_count();
        let result = self.register_a(0).right_shift_logical(count);
        self.set_register_a(0, result);
        Ok(())
    }

    pub(crate) fn op_dsl(&mut self) -> Result<(), ExecFault> {
        let count = self.shift_count();
        let result = self.double_accumulator().right_shift_logical(count);
        self.set_double_accumulator(result);
        Ok(())
    }

    pub(crate) fn op_ssa(&mut self) -> Result<(), ExecFault> {
        let count = self.shift_count();
        let result = self.register_a(0).right_shift_algebraic(count);
        self.set_register_a(0, result);
        Ok(())
    }

    pub(crate) fn op_dsa(&mut self) -> Result<(), ExecFault> {
        let count = self.shift_count();
        let result = self.double_accumulator().right_shift_algebraic(count);
        self.set_double_accumulator(result);
        Ok(())
    }

    /// Shift A(a) left circularly until the sign would change; the
    /// shift count lands in A(a+1).
    pub(crate) fn op_lsc(&mut self) -> Result<(), ExecFault> {
        let (shifted, count) = self.register_a(0).left_shift_until_sign_change();
        self.set_register_a(0, shifted);
        self.set_register_a(1, Word36::from(count));
        Ok(())
    }

    /// Double-width normalizing shift; the count lands in A(a+2).
    pub(crate) fn op_dlsc(&mut self) -> Result<(), ExecFault> {
        let (shifted, count) = self.double_accumulator().left_shift_until_sign_change();
        self.set_double_accumulator(shifted);
        self.set_register_a(2, Word36::from(count));
        Ok(())
    }

    pub(crate) fn op_lssc(&mut self) -> Result<(), ExecFault> {
        let count = self.shift_count();
        let result = self.register_a(0).left_shift_circular(count);
        self.set_register_a(0, result);
        Ok(())
    }

    pub(crate) fn op_ldsc(&mut self) -> Result<(), ExecFault> {
        let count = self.shift_count();
        let result = self.double_accumulator().left_shift_circular(count);
        self.set_double_accumulator(result);
        Ok(())
    }

    pub(crate) fn op_lssl(&mut self) -> Result<(), ExecFault> {
        let count = self.shift_count();
        let result = self.register_a(0).left_shift_logical(count);
        self.set_register_a(0, result);
        Ok(())
    }

    pub(crate) fn op_ldsl(&mut self) -> Result<(), ExecFault> {
        let count = self.shift_count();
        let result = self.double_accumulator().left_shift_logical(count);
        self.set_double_accumulator(result);
        Ok(())
    }
}
