//! Load and store instruction handlers.

use base::prelude::*;

use crate::interrupt::MachineInterrupt;
use crate::proc::{ExecFault, InstructionProcessor, OperandTarget, ProgramCounterChange};

// Fieldata and ASCII fill constants for the fixed stores.
const FIELDATA_SPACES: u64 = 0o050_505_050_505;
const FIELDATA_ZEROS: u64 = 0o606_060_606_060;
const ASCII_SPACES: u64 = 0o040_040_040_040;
const ASCII_ZEROS: u64 = 0o060_060_060_060;

impl InstructionProcessor {
    pub(crate) fn op_la(&mut self) -> Result<(), ExecFault> {
        let operand = self.get_operand()?;
        self.set_register_a(0, operand);
        Ok(())
    }

    pub(crate) fn op_lna(&mut self) -> Result<(), ExecFault> {
        let operand = self.get_operand()?;
        self.set_register_a(0, operand.negate());
        Ok(())
    }

    pub(crate) fn op_lma(&mut self) -> Result<(), ExecFault> {
        let operand = self.get_operand()?;
        self.set_register_a(0, operand.magnitude());
        Ok(())
    }

    pub(crate) fn op_lnma(&mut self) -> Result<(), ExecFault> {
        let operand = self.get_operand()?;
        self.set_register_a(0, operand.magnitude().negate());
        Ok(())
    }

    pub(crate) fn op_lr(&mut self) -> Result<(), ExecFault> {
        let operand = self.get_operand()?;
        self.set_register_r(operand);
        Ok(())
    }

    pub(crate) fn op_lx(&mut self) -> Result<(), ExecFault> {
        let operand = self.get_operand()?;
        self.set_register_x(IndexRegister::new(operand));
        Ok(())
    }

    /// Load only the increment field of the index register.
    pub(crate) fn op_lxi(&mut self) -> Result<(), ExecFault> {
        let operand = self.get_operand()?;
        let mut word = self.register_x().word();
        word.set_h1(operand.h2());
        self.set_register_x(IndexRegister::new(word));
        Ok(())
    }

    /// Load only the modifier field of the index register.
    pub(crate) fn op_lxm(&mut self) -> Result<(), ExecFault> {
        let operand = self.get_operand()?;
        self.set_register_x(self.register_x().with_xm(operand.h2()));
        Ok(())
    }

    pub(crate) fn op_dl(&mut self) -> Result<(), ExecFault> {
        let words = self.get_consecutive_operands(2)?;
        self.set_register_a(0, words[0]);
        self.set_register_a(1, words[1]);
        Ok(())
    }

    pub(crate) fn op_ds(&mut self) -> Result<(), ExecFault> {
        let pair = [self.register_a(0), self.register_a(1)];
        self.store_consecutive_operands(&pair)
    }

    pub(crate) fn op_sa(&mut self) -> Result<(), ExecFault> {
        let value = self.register_a(0);
        self.store_operand(value)
    }

    pub(crate) fn op_sna(&mut self) -> Result<(), ExecFault> {
        let value = self.register_a(0).negate();
        self.store_operand(value)
    }

    pub(crate) fn op_sma(&mut self) -> Result<(), ExecFault> {
        let value = self.register_a(0).magnitude();
        self.store_operand(value)
    }

    pub(crate) fn op_sr(&mut self) -> Result<(), ExecFault> {
        let value = self.register_r();
        self.store_operand(value)
    }

    pub(crate) fn op_sx(&mut self) -> Result<(), ExecFault> {
        let value = self.register_x().word();
        self.store_operand(value)
    }

    // The fixed stores, selected by the a field.

    pub(crate) fn op_sz(&mut self) -> Result<(), ExecFault> {
        self.store_operand(Word36::ZERO)
    }

    pub(crate) fn op_snz(&mut self) -> Result<(), ExecFault> {
        self.store_operand(Word36::NEGATIVE_ZERO)
    }

    pub(crate) fn op_sp1(&mut self) -> Result<(), ExecFault> {
        self.store_operand(Word36::from_i64(1))
    }

    pub(crate) fn op_sn1(&mut self) -> Result<(), ExecFault> {
        self.store_operand(Word36::from_i64(-1))
    }

    pub(crate) fn op_sfs(&mut self) -> Result<(), ExecFault> {
        self.store_operand(Word36::from_bits(FIELDATA_SPACES))
    }

    pub(crate) fn op_sfz(&mut self) -> Result<(), ExecFault> {
        self.store_operand(Word36::from_bits(FIELDATA_ZEROS))
    }

    pub(crate) fn op_sas(&mut self) -> Result<(), ExecFault> {
        self.store_operand(Word36::from_bits(ASCII_SPACES))
    }

    pub(crate) fn op_saz(&mut self) -> Result<(), ExecFault> {
        self.store_operand(Word36::from_bits(ASCII_ZEROS))
    }

    // In-place adjustment, also selected by the a field.  These hold
    // the storage lock across the whole read-modify-write.

    fn adjust_operand(
        &mut self,
        delta: i64,
        skip_on_nonzero: bool,
        trap_on_overflow: bool,
    ) -> Result<(), ExecFault> {
        let target = self.operand_target(true)?;
        let j = self.f0.j();
        let raw = self.read_target(target);
        let old = match target {
            OperandTarget::Register(_) => raw,
            OperandTarget::Storage(_) => self.extract_partial(raw, j),
        };
        // Whole words count in one's complement; partial fields wrap
        // in two's complement within the field.  The field arithmetic
        // runs on the sign-extended bit pattern so an all-ones field
        // counts as -1, not as one's-complement negative zero.
        let whole = matches!(target, OperandTarget::Register(_)) || j == 0 || j >= 0o16;
        let (new, carry, overflow) = if whole {
            let sum = old.add_ones(Word36::from_i64(delta));
            (sum.value, sum.carry, sum.overflow)
        } else {
            let bits = old.bits().wrapping_add(delta as u64) & MASK_36;
            (Word36::from_bits(bits), false, false)
        };
        self.designator.set_carry(carry);
        self.designator.set_overflow(overflow);
        let word = match target {
            OperandTarget::Register(_) => new,
            OperandTarget::Storage(_) => self.inject_partial(raw, j, new),
        };
        self.write_target(target, word);
        if skip_on_nonzero && !new.is_zero() {
            self.pc_change = ProgramCounterChange::Skip;
        }
        if trap_on_overflow && overflow && self.designator.operation_trap_enabled() {
            return Err(MachineInterrupt::operation_trap().into());
        }
        Ok(())
    }

    pub(crate) fn op_inc(&mut self) -> Result<(), ExecFault> {
        self.adjust_operand(1, true, false)
    }

    pub(crate) fn op_dec(&mut self) -> Result<(), ExecFault> {
        self.adjust_operand(-1, true, false)
    }

    pub(crate) fn op_inc2(&mut self) -> Result<(), ExecFault> {
        self.adjust_operand(2, true, false)
    }

    pub(crate) fn op_dec2(&mut self) -> Result<(), ExecFault> {
        self.adjust_operand(-2, true, false)
    }

    pub(crate) fn op_add1(&mut self) -> Result<(), ExecFault> {
        self.adjust_operand(1, false, true)
    }

    pub(crate) fn op_sub1(&mut self) -> Result<(), ExecFault> {
        self.adjust_operand(-1, false, true)
    }

    /// Normalize a negative-zero operand to positive zero, skipping
    /// the next instruction when the result is nonzero.
    pub(crate) fn op_enz(&mut self) -> Result<(), ExecFault> {
        let (_, new) = self.update_operand(|old| {
            if old.is_negative_zero() {
                Word36::ZERO
            } else {
                old
            }
        })?;
        if !new.is_zero() {
            self.pc_change = ProgramCounterChange::Skip;
        }
        Ok(())
    }
}
