//! Test (conditional skip) and test-and-set instruction handlers.

use crate::interrupt::MachineInterrupt;
use crate::proc::{ExecFault, InstructionProcessor, OperandTarget, ProgramCounterChange};
use crate::storage::AbsoluteAddress;

/// The lock bit tested and set by the TS family, bit 30 of the
/// operand word.
const TS_BIT: u64 = 1 << 30;

impl InstructionProcessor {
    fn skip_if(&mut self, condition: bool) {
        if condition {
            self.pc_change = ProgramCounterChange::Skip;
        }
    }

    pub(crate) fn op_tz(&mut self) -> Result<(), ExecFault> {
        let operand = self.get_operand()?;
        self.skip_if(operand.is_zero());
        Ok(())
    }

    pub(crate) fn op_tnz(&mut self) -> Result<(), ExecFault> {
        let operand = self.get_operand()?;
        self.skip_if(!operand.is_zero());
        Ok(())
    }

    pub(crate) fn op_te(&mut self) -> Result<(), ExecFault> {
        let operand = self.get_operand()?;
        self.skip_if(operand == self.register_a(0));
        Ok(())
    }

    pub(crate) fn op_tne(&mut self) -> Result<(), ExecFault> {
        let operand = self.get_operand()?;
        self.skip_if(operand != self.register_a(0));
        Ok(())
    }

    pub(crate) fn op_tle(&mut self) -> Result<(), ExecFault> {
        let operand = self.get_operand()?;
        self.skip_if(operand.as_i64() <= self.register_a(0).as_i64());
        Ok(())
    }

    pub(crate) fn op_tg(&mut self) -> Result<(), ExecFault> {
        let operand = self.get_operand()?;
        self.skip_if(operand.as_i64() > self.register_a(0).as_i64());
        Ok(())
    }

    // The TS family holds the storage lock across test and update, so
    // two processors cannot both observe the bit clear.

    fn ts_interrupt_address(target: OperandTarget) -> AbsoluteAddress {
        match target {
            OperandTarget::Storage(address) => address,
            // Register operands report their register-set index.
            OperandTarget::Register(index) => AbsoluteAddress::new(0, index as u32),
        }
    }

    /// Raise a test-and-set interrupt when the lock bit is already
    /// set; otherwise take it by writing 01 into S1.
    pub(crate) fn op_ts(&mut self) -> Result<(), ExecFault> {
        let target = self.operand_target(true)?;
        let raw = self.read_target(target);
        if raw.bits() & TS_BIT != 0 {
            return Err(MachineInterrupt::test_and_set(Self::ts_interrupt_address(target)).into());
        }
        let mut word = raw;
        word.set_s1(0o01);
        self.write_target(target, word);
        Ok(())
    }

    /// Like TS, but a held lock skips nothing and a taken lock skips
    /// the next instruction instead of interrupting.
    pub(crate) fn op_tss(&mut self) -> Result<(), ExecFault> {
        let target = self.operand_target(true)?;
        let raw = self.read_target(target);
        if raw.bits() & TS_BIT == 0 {
            let mut word = raw;
            word.set_s1(0o01);
            self.write_target(target, word);
            self.pc_change = ProgramCounterChange::Skip;
        }
        Ok(())
    }

    /// Clear the lock bit, skipping the next instruction when it was
    /// set.
    pub(crate) fn op_tcs(&mut self) -> Result<(), ExecFault> {
        let target = self.operand_target(true)?;
        let raw = self.read_target(target);
        if raw.bits() & TS_BIT != 0 {
            let mut word = raw;
            word.set_s1(0);
            self.write_target(target, word);
            self.pc_change = ProgramCounterChange::Skip;
        }
        Ok(())
    }
}
