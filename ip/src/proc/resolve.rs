//! Operand-address resolution.
//!
//! Every instruction's low fields name either an immediate value or a
//! bank-relative address, possibly modified by an index register and
//! (in basic mode) routed through a chain of indirect words.  Each
//! indirect hop is a separate resolution step so the instruction
//! stays interruptible while chasing the chain.

use conv::ValueFrom;

use base::prelude::*;

use crate::dispatch::FunctionTableEntry;
use crate::interrupt::MachineInterrupt;
use crate::proc::InstructionProcessor;

/// The operand an instruction will act on, once resolution is done.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ResolvedOperand {
    /// Value composed from the instruction word itself; never
    /// negative zero.
    Immediate(Word36),
    /// Bank-relative address; bank selection and the register-versus-
    /// storage decision happen at access time.
    Address { relative: u32 },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum AddressResolution {
    /// The resolved operand has been recorded on the processor.
    Complete,
    /// An indirect word was spliced into F0; resolve again.
    Indirect,
}

impl InstructionProcessor {
    /// Resolve one step of the operand address for the staged
    /// instruction, applying index modification (and the index
    /// increment, once per step) as it goes.
    pub(crate) fn resolve_operand_address(
        &mut self,
        entry: &'static FunctionTableEntry,
    ) -> Result<AddressResolution, MachineInterrupt> {
        let iw = self.f0;
        let basic = self.designator.basic_mode_enabled();
        let exec = self.designator.exec_register_set_selected();
        let wide = !basic
            && self.designator.executive_24bit_indexing()
            && self.designator.processor_privilege() < 2;
        let x = iw.x() as usize;

        if entry.uses_j_field && entry.allow_immediate && iw.j() >= 0o16 {
            let extend = iw.j() == 0o17;
            let value = if x == 0 {
                // Without indexing the immediate is the whole 18-bit
                // h|i|u field, with negative zero eliminated in the
                // field before any sign extension.
                let field = match iw.hiu() {
                    0o777_777 => 0,
                    field => field,
                };
                if extend {
                    Word36::from_bits(sign_extend(field, 18) & MASK_36)
                } else {
                    Word36::from_bits(field)
                }
            } else {
                let index = self.grs.x(x, exec);
                let (sum, width) = if wide {
                    (add_ones_complement(iw.u(), index.xm24(), 24), 24)
                } else {
                    (add_ones_complement(iw.u(), index.xm(), 18), 18)
                };
                if iw.h() {
                    let incremented = if wide {
                        index.incremented_24()
                    } else {
                        index.incremented_18()
                    };
                    self.grs.set_x(x, exec, incremented);
                }
                if extend {
                    Word36::from_bits(sign_extend(sum, width) & MASK_36)
                } else {
                    Word36::from_bits(sum)
                }
            };
            // Immediate composition never produces negative zero.
            let value = if value.is_negative_zero() {
                Word36::ZERO
            } else {
                value
            };
            self.resolved = Some(ResolvedOperand::Immediate(value));
            return Ok(AddressResolution::Complete);
        }

        let offset = if basic { iw.u() } else { iw.d() };
        let modified = if x == 0 {
            offset
        } else {
            let index = self.grs.x(x, exec);
            let sum = if wide {
                add_ones_complement(offset, index.xm24(), 24)
            } else {
                add_ones_complement(offset, index.xm(), 18)
            };
            if iw.h() {
                let incremented = if wide {
                    index.incremented_24()
                } else {
                    index.incremented_18()
                };
                self.grs.set_x(x, exec, incremented);
            }
            sum
        };

        let relative = u32::value_from(modified & 0o77_777_777).unwrap_or(0);
        if basic && iw.i() {
            let bank = self.operand_bank(relative, false)?;
            let indirect = self.storage.read(bank.absolute_address(relative));
            self.f0.splice_xhiu(indirect);
            return Ok(AddressResolution::Indirect);
        }
        self.resolved = Some(ResolvedOperand::Address { relative });
        Ok(AddressResolution::Complete)
    }
}
