//! System instruction handlers: designator access, the day clock,
//! signals, the return control stack and the halts.

use base::prelude::*;

use crate::interrupt::MachineInterrupt;
use crate::proc::{
    ExecFault, InstructionProcessor, StopReason, RCS_BASE_REGISTER,
};
use crate::regfile::{DesignatorRegister, RCS_INDEX_REGISTER};

impl InstructionProcessor {
    pub(crate) fn op_ld(&mut self) -> Result<(), ExecFault> {
        let operand = self.get_operand()?;
        self.designator = DesignatorRegister::from_word(operand);
        Ok(())
    }

    pub(crate) fn op_sd(&mut self) -> Result<(), ExecFault> {
        let word = self.designator.to_word();
        self.store_operand(word)
    }

    /// Read the day clock into A(a) and A(a+1) as a 72-bit
    /// microsecond count.
    pub(crate) fn op_rdc(&mut self) -> Result<(), ExecFault> {
        let micros = DoubleWord36::from_bits(u128::from(self.clock.microseconds()));
        self.set_register_a(0, micros.msw());
        self.set_register_a(1, micros.lsw());
        Ok(())
    }

    /// Set the day clock from a two-word operand.
    pub(crate) fn op_sdc(&mut self) -> Result<(), ExecFault> {
        let words = self.get_consecutive_operands(2)?;
        let micros = DoubleWord36::from_words(words[0], words[1]);
        // A 72-bit count saturates the clock's 64-bit register.
        let truncated = u64::try_from(micros.bits()).unwrap_or(u64::MAX);
        self.clock.set_microseconds(truncated);
        Ok(())
    }

    /// Raise a signal interrupt against this processor; the code is
    /// the low six bits of the operand address.
    pub(crate) fn op_sgnl(&mut self) -> Result<(), ExecFault> {
        let code = (self.resolved_address() & 0o77) as u8;
        self.raise_interrupt(MachineInterrupt::signal(code));
        Ok(())
    }

    pub(crate) fn op_buy(&mut self) -> Result<(), ExecFault> {
        let value = self.get_operand()?;
        self.rcs_push(value)
    }

    pub(crate) fn op_sell(&mut self) -> Result<(), ExecFault> {
        let value = self.rcs_pop()?;
        self.store_operand(value)
    }

    pub(crate) fn op_halt(&mut self) -> Result<(), ExecFault> {
        self.stop(StopReason::Development);
        Ok(())
    }

    // The return control stack lives in the bank on B25 and grows
    // downward under the modifier of EX0.  It is processor-local, so
    // no storage locks are taken.

    fn rcs_push(&mut self, value: Word36) -> Result<(), ExecFault> {
        let bank = self.base_registers[RCS_BASE_REGISTER];
        let pointer = IndexRegister::new(self.grs.get(RCS_INDEX_REGISTER));
        let top = match pointer.xm().checked_sub(1) {
            Some(top) if bank.contains(top as u32) => top,
            _ => return Err(MachineInterrupt::rcs_underflow_overflow(true).into()),
        };
        self.storage.write(bank.absolute_address(top as u32), value);
        self.grs
            .set(RCS_INDEX_REGISTER, pointer.with_xm(top).word());
        Ok(())
    }

    fn rcs_pop(&mut self) -> Result<Word36, ExecFault> {
        let bank = self.base_registers[RCS_BASE_REGISTER];
        let pointer = IndexRegister::new(self.grs.get(RCS_INDEX_REGISTER));
        let top = pointer.xm() as u32;
        if !bank.contains(top) {
            return Err(MachineInterrupt::rcs_underflow_overflow(false).into());
        }
        let value = self.storage.read(bank.absolute_address(top));
        self.grs
            .set(RCS_INDEX_REGISTER, pointer.with_xm(u64::from(top) + 1).word());
        Ok(value)
    }
}
