//! Jump instruction handlers.

use crate::proc::{ExecFault, InstructionProcessor, ProgramCounterChange, StopReason};

impl InstructionProcessor {
    fn jump(&mut self) {
        self.pc_change = ProgramCounterChange::Jump(self.resolved_address());
    }

    fn jump_if(&mut self, condition: bool) -> Result<(), ExecFault> {
        if condition {
            self.jump();
        }
        Ok(())
    }

    pub(crate) fn op_j(&mut self) -> Result<(), ExecFault> {
        self.jump();
        Ok(())
    }

    /// Jump conditioned on an operator select-jump key.  No key panel
    /// is modeled, so the jump is never taken; the index side effects
    /// of resolution still apply.
    pub(crate) fn op_jk(&mut self) -> Result<(), ExecFault> {
        Ok(())
    }

    /// Stop the processor with the program counter on the jump
    /// target, so a restart resumes there.
    pub(crate) fn op_hltj(&mut self) -> Result<(), ExecFault> {
        self.jump();
        self.stop(StopReason::HaltJumpExecuted);
        Ok(())
    }

    /// Store the return address in the modifier of X(a), then jump.
    pub(crate) fn op_lmj(&mut self) -> Result<(), ExecFault> {
        let return_address = (self.program_address.program_counter() + 1) & 0o777_777;
        let linked = self.register_x().with_xm(u64::from(return_address));
        self.set_register_x(linked);
        self.jump();
        Ok(())
    }

    /// Store the return address in the lower half of the target word
    /// and continue at target + 1.
    pub(crate) fn op_slj(&mut self) -> Result<(), ExecFault> {
        let target = self.resolved_address();
        let return_address = (self.program_address.program_counter() + 1) & 0o777_777;
        let cell = self.operand_target(true)?;
        let mut word = self.read_target(cell);
        word.set_h2(u64::from(return_address));
        self.write_target(cell, word);
        self.pc_change = ProgramCounterChange::Jump((target + 1) & 0o777_777);
        Ok(())
    }

    pub(crate) fn op_jz(&mut self) -> Result<(), ExecFault> {
        let a = self.register_a(0);
        self.jump_if(a.is_zero())
    }

    pub(crate) fn op_jnz(&mut self) -> Result<(), ExecFault> {
        let a = self.register_a(0);
        self.jump_if(!a.is_zero())
    }

    pub(crate) fn op_jp(&mut self) -> Result<(), ExecFault> {
        let a = self.register_a(0);
        self.jump_if(a.is_positive())
    }

    pub(crate) fn op_jn(&mut self) -> Result<(), ExecFault> {
        let a = self.register_a(0);
        self.jump_if(a.is_negative())
    }

    pub(crate) fn op_jo(&mut self) -> Result<(), ExecFault> {
        let overflow = self.designator.overflow();
        self.jump_if(overflow)
    }

    pub(crate) fn op_jno(&mut self) -> Result<(), ExecFault> {
        let overflow = self.designator.overflow();
        self.jump_if(!overflow)
    }

    pub(crate) fn op_jc(&mut self) -> Result<(), ExecFault> {
        let carry = self.designator.carry();
        self.jump_if(carry)
    }

    pub(crate) fn op_jnc(&mut self) -> Result<(), ExecFault> {
        let carry = self.designator.carry();
        self.jump_if(!carry)
    }
}
