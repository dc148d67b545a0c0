//! Operand access: bank selection, register-versus-storage routing,
//! storage-lock acquisition and partial-word transfer.
//!
//! Relative addresses below the register-set size reach registers
//! rather than storage (in basic mode, or in extended mode under B0);
//! register operands always transfer whole words.  Storage operands
//! honour the instruction's j field, interpreted under the
//! quarter-word-mode designator, and are locked before they are
//! touched so multi-processor read-modify-write sequences stay
//! atomic.

use base::prelude::*;

use crate::interrupt::{MachineInterrupt, ReferenceViolationReason};
use crate::proc::{InstructionProcessor, ResolvedOperand};
use crate::regfile::{BaseRegister, GeneralRegisterSet, GRS_SIZE};
use crate::storage::AbsoluteAddress;

use super::ExecFault;

/// A located operand cell, ready for raw whole-word transfer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum OperandTarget {
    Register(usize),
    Storage(AbsoluteAddress),
}

const fn partial_is_whole(j: u8) -> bool {
    j == 0 || j >= 0o16
}

impl InstructionProcessor {
    /// The j field as a partial-word selector, or whole-word for
    /// instructions whose j is a minor function code.
    fn operand_j(&self) -> u8 {
        if self.current_entry.is_some_and(|e| e.uses_j_field) {
            self.f0.j()
        } else {
            0
        }
    }

    fn register_operand(&self, relative: u32) -> bool {
        (relative as usize) < GRS_SIZE
            && (self.designator.basic_mode_enabled() || self.f0.b() == 0)
    }

    fn register_access_check(&self, index: usize) -> Result<(), MachineInterrupt> {
        if GeneralRegisterSet::is_exec_window(index) && self.designator.processor_privilege() > 0 {
            return Err(MachineInterrupt::reference_violation(
                ReferenceViolationReason::GrsViolation,
                index as u64,
                false,
            ));
        }
        Ok(())
    }

    /// Select and validate the bank for a storage operand spanning
    /// `count` words from `relative`.
    fn operand_bank_span(
        &self,
        relative: u32,
        count: u32,
        write: bool,
    ) -> Result<BaseRegister, MachineInterrupt> {
        let last = relative + count - 1;
        let bank = if self.designator.basic_mode_enabled() {
            self.basic_bank_search(relative)
        } else {
            let privileged = self.designator.processor_privilege() < 2;
            let index = if privileged {
                self.f0.b_extended()
            } else {
                self.f0.b()
            } as usize;
            let bank = self.base_registers[index];
            bank.contains(relative).then_some(bank)
        };
        let bank = bank.filter(|bank| bank.contains(last)).ok_or_else(|| {
            MachineInterrupt::reference_violation(
                ReferenceViolationReason::StorageLimits,
                u64::from(relative),
                false,
            )
        })?;
        let permissions = bank.effective_permissions(self.indicator_key.access_key);
        if write && !permissions.write {
            return Err(MachineInterrupt::reference_violation(
                ReferenceViolationReason::WriteAccess,
                u64::from(relative),
                false,
            ));
        }
        if !write && !permissions.read {
            return Err(MachineInterrupt::reference_violation(
                ReferenceViolationReason::ReadAccess,
                u64::from(relative),
                false,
            ));
        }
        Ok(bank)
    }

    pub(crate) fn operand_bank(
        &self,
        relative: u32,
        write: bool,
    ) -> Result<BaseRegister, MachineInterrupt> {
        self.operand_bank_span(relative, 1, write)
    }

    /// Locate the operand cell, acquiring the storage lock when it
    /// lives in storage.
    pub(crate) fn operand_target(&mut self, write: bool) -> Result<OperandTarget, ExecFault> {
        match self.resolved {
            Some(ResolvedOperand::Address { relative }) => {
                if self.register_operand(relative) {
                    let index = relative as usize;
                    self.register_access_check(index)?;
                    Ok(OperandTarget::Register(index))
                } else {
                    let bank = self.operand_bank(relative, write)?;
                    let address = bank.absolute_address(relative);
                    self.locks.acquire(self.upi, &[address])?;
                    Ok(OperandTarget::Storage(address))
                }
            }
            Some(ResolvedOperand::Immediate(_)) => {
                panic!("addressable target requested for an immediate operand")
            }
            None => panic!("operand accessed before address resolution"),
        }
    }

    pub(crate) fn read_target(&self, target: OperandTarget) -> Word36 {
        match target {
            OperandTarget::Register(index) => self.grs.get(index),
            OperandTarget::Storage(address) => self.storage.read(address),
        }
    }

    pub(crate) fn write_target(&mut self, target: OperandTarget, value: Word36) {
        match target {
            OperandTarget::Register(index) => self.grs.set(index, value),
            OperandTarget::Storage(address) => self.storage.write(address, value),
        }
    }

    /// Fetch the operand value: the immediate, the whole register, or
    /// the selected partial word from storage.
    pub(crate) fn get_operand(&mut self) -> Result<Word36, ExecFault> {
        if let Some(ResolvedOperand::Immediate(value)) = self.resolved {
            return Ok(value);
        }
        let target = self.operand_target(false)?;
        let raw = self.read_target(target);
        Ok(match target {
            OperandTarget::Register(_) => raw,
            OperandTarget::Storage(_) => self.extract_partial(raw, self.operand_j()),
        })
    }

    /// Store into the operand cell, preserving the unselected part of
    /// a storage word under a partial-word designator.
    pub(crate) fn store_operand(&mut self, value: Word36) -> Result<(), ExecFault> {
        let target = self.operand_target(true)?;
        let j = self.operand_j();
        let word = match target {
            OperandTarget::Register(_) => value,
            OperandTarget::Storage(_) if partial_is_whole(j) => value,
            OperandTarget::Storage(_) => {
                let old = self.read_target(target);
                self.inject_partial(old, j, value)
            }
        };
        self.write_target(target, word);
        Ok(())
    }

    /// Read-modify-write under a single lock acquisition, returning
    /// the value seen and the value written, both through the
    /// partial-word window.
    pub(crate) fn update_operand(
        &mut self,
        f: impl FnOnce(Word36) -> Word36,
    ) -> Result<(Word36, Word36), ExecFault> {
        let target = self.operand_target(true)?;
        let j = self.operand_j();
        let raw = self.read_target(target);
        let old = match target {
            OperandTarget::Register(_) => raw,
            OperandTarget::Storage(_) => self.extract_partial(raw, j),
        };
        let new = f(old);
        let word = match target {
            OperandTarget::Register(_) => new,
            OperandTarget::Storage(_) if partial_is_whole(j) => new,
            OperandTarget::Storage(_) => self.inject_partial(raw, j, new),
        };
        self.write_target(target, word);
        Ok((old, new))
    }

    /// Fetch `count` whole words from consecutive cells.
    pub(crate) fn get_consecutive_operands(
        &mut self,
        count: usize,
    ) -> Result<Vec<Word36>, ExecFault> {
        match self.resolved {
            Some(ResolvedOperand::Address { relative }) => {
                if self.register_operand(relative) {
                    let base = relative as usize;
                    (0..count)
                        .map(|i| {
                            let index = base + i;
                            self.register_access_check(index)?;
                            Ok(self.grs.get(index))
                        })
                        .collect()
                } else {
                    let bank = self.operand_bank_span(relative, count as u32, false)?;
                    let first = bank.absolute_address(relative);
                    let addresses: Vec<AbsoluteAddress> =
                        (0..count).map(|i| first.offset_by(i as u32)).collect();
                    self.locks.acquire(self.upi, &addresses)?;
                    Ok(self.storage.read_range(first, count))
                }
            }
            _ => panic!("consecutive operands accessed before address resolution"),
        }
    }

    /// Store whole words into consecutive cells.
    pub(crate) fn store_consecutive_operands(
        &mut self,
        values: &[Word36],
    ) -> Result<(), ExecFault> {
        match self.resolved {
            Some(ResolvedOperand::Address { relative }) => {
                if self.register_operand(relative) {
                    let base = relative as usize;
                    for (i, value) in values.iter().enumerate() {
                        let index = base + i;
                        self.register_access_check(index)?;
                        self.grs.set(index, *value);
                    }
                    Ok(())
                } else {
                    let bank = self.operand_bank_span(relative, values.len() as u32, true)?;
                    let first = bank.absolute_address(relative);
                    let addresses: Vec<AbsoluteAddress> =
                        (0..values.len()).map(|i| first.offset_by(i as u32)).collect();
                    self.locks.acquire(self.upi, &addresses)?;
                    for (i, value) in values.iter().enumerate() {
                        self.storage.write(first.offset_by(i as u32), *value);
                    }
                    Ok(())
                }
            }
            _ => panic!("consecutive operands accessed before address resolution"),
        }
    }

    /// The resolved address for instructions which consume it
    /// directly: jump targets, shift counts, signal codes.
    pub(crate) fn resolved_address(&self) -> u32 {
        match self.resolved {
            Some(ResolvedOperand::Address { relative }) => relative & 0o777_777,
            _ => panic!("address requested without a resolved address operand"),
        }
    }

    /// Extract the partial word selected by `j`, zero- or
    /// sign-filling as the designation requires.  Quarter-word mode
    /// swaps the j4-j7 designations from sign-extending half/third
    /// words to quarters.
    pub(crate) fn extract_partial(&self, word: Word36, j: u8) -> Word36 {
        let quarter = self.designator.quarter_word_mode_enabled();
        let bits = match j {
            0o01 => word.h2(),
            0o02 => word.h1(),
            0o03 => word.xh2(),
            0o04 => {
                if quarter {
                    word.q2()
                } else {
                    word.xh1()
                }
            }
            0o05 => {
                if quarter {
                    word.q4()
                } else {
                    word.xt3()
                }
            }
            0o06 => {
                if quarter {
                    word.q3()
                } else {
                    word.xt2()
                }
            }
            0o07 => {
                if quarter {
                    word.q1()
                } else {
                    word.xt1()
                }
            }
            0o10 => word.s6(),
            0o11 => word.s5(),
            0o12 => word.s4(),
            0o13 => word.s3(),
            0o14 => word.s2(),
            0o15 => word.s1(),
            _ => return word,
        };
        Word36::from_bits(bits & MASK_36)
    }

    /// Replace the partial word selected by `j` within `old`.
    pub(crate) fn inject_partial(&self, old: Word36, j: u8, value: Word36) -> Word36 {
        let quarter = self.designator.quarter_word_mode_enabled();
        let mut word = old;
        match j {
            0o01 | 0o03 => word.set_h2(value.bits()),
            0o02 => word.set_h1(value.bits()),
            0o04 => {
                if quarter {
                    word.set_q2(value.bits());
                } else {
                    word.set_h1(value.bits());
                }
            }
            0o05 => {
                if quarter {
                    word.set_q4(value.bits());
                } else {
                    word.set_t3(value.bits());
                }
            }
            0o06 => {
                if quarter {
                    word.set_q3(value.bits());
                } else {
                    word.set_t2(value.bits());
                }
            }
            0o07 => {
                if quarter {
                    word.set_q1(value.bits());
                } else {
                    word.set_t1(value.bits());
                }
            }
            0o10 => word.set_s6(value.bits()),
            0o11 => word.set_s5(value.bits()),
            0o12 => word.set_s4(value.bits()),
            0o13 => word.set_s3(value.bits()),
            0o14 => word.set_s2(value.bits()),
            0o15 => word.set_s1(value.bits()),
            _ => return value,
        }
        word
    }
}
