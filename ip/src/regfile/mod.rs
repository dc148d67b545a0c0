//! Per-processor register state: the general register set, the
//! designator register, the indicator/key register and the program
//! address register.  None of this state is ever shared between
//! processors.

mod basereg;

pub use basereg::{AccessInfo, AccessPermissions, BaseRegister};

use std::fmt::{self, Debug, Formatter};

use serde::Serialize;

use base::prelude::*;

/// Number of directly addressable general-register-set locations.
/// Operand addresses below this value reach registers, not storage.
pub const GRS_SIZE: usize = 0o200;

// Window origins within the register set.  The X and A windows
// overlap in the architecture (A0 is the same cell as X12, and EA0
// the same cell as EX12), which is why A0 is at 0o14.  The executive
// windows fill the upper half of the set, starting at ER0.
pub const X0: usize = 0o0;
pub const A0: usize = 0o14;
pub const R0: usize = 0o100;
pub const ER0: usize = 0o120;
pub const EX0: usize = 0o140;
pub const EA0: usize = 0o154;

/// Index register used to walk the interrupt control stack.
pub const ICS_INDEX_REGISTER: usize = EX0 + 1;
/// Index register used to walk the return control stack.
pub const RCS_INDEX_REGISTER: usize = EX0;

#[derive(Clone)]
pub struct GeneralRegisterSet {
    values: [Word36; GRS_SIZE],
}

// Serialized as the flat cell array.
impl Serialize for GeneralRegisterSet {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.collect_seq(self.values.iter())
    }
}

impl GeneralRegisterSet {
    #[must_use]
    pub fn new() -> GeneralRegisterSet {
        GeneralRegisterSet {
            values: [Word36::ZERO; GRS_SIZE],
        }
    }

    #[must_use]
    pub fn get(&self, index: usize) -> Word36 {
        self.values[index]
    }

    pub fn set(&mut self, index: usize, value: Word36) {
        self.values[index] = value;
    }

    /// Is `index` inside one of the executive register windows?
    /// Unprivileged GRS-addressed operands may not touch these.
    #[must_use]
    pub const fn is_exec_window(index: usize) -> bool {
        index >= ER0
    }

    // Double- and triple-register operands may spill one or two
    // cells past the A window, which the layout leaves room for.
    const fn window(base: usize, n: usize, exec: bool) -> usize {
        debug_assert!(n < 18);
        base + n + if exec { EX0 - X0 } else { 0 }
    }

    #[must_use]
    pub fn x(&self, n: usize, exec: bool) -> IndexRegister {
        IndexRegister::new(self.values[Self::window(X0, n, exec)])
    }

    pub fn set_x(&mut self, n: usize, exec: bool, value: IndexRegister) {
        self.values[Self::window(X0, n, exec)] = value.word();
    }

    #[must_use]
    pub fn a(&self, n: usize, exec: bool) -> Word36 {
        self.values[Self::window(A0, n, exec)]
    }

    pub fn set_a(&mut self, n: usize, exec: bool, value: Word36) {
        self.values[Self::window(A0, n, exec)] = value;
    }

    #[must_use]
    pub fn r(&self, n: usize, exec: bool) -> Word36 {
        debug_assert!(n < 16);
        let index = if exec { ER0 + n } else { R0 + n };
        self.values[index]
    }

    pub fn set_r(&mut self, n: usize, exec: bool, value: Word36) {
        debug_assert!(n < 16);
        let index = if exec { ER0 + n } else { R0 + n };
        self.values[index] = value;
    }
}

impl Default for GeneralRegisterSet {
    fn default() -> GeneralRegisterSet {
        GeneralRegisterSet::new()
    }
}

impl Debug for GeneralRegisterSet {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        f.write_str("GeneralRegisterSet{..}")
    }
}

macro_rules! designator_flags {
    ($(($getter:ident, $setter:ident, $b:expr)),* $(,)?) => {
        $(
            #[must_use]
            pub const fn $getter(&self) -> bool {
                self.bits & (1_u64 << (35 - $b)) != 0
            }

            pub fn $setter(&mut self, value: bool) {
                let mask = 1_u64 << (35 - $b);
                if value {
                    self.bits |= mask;
                } else {
                    self.bits &= !mask;
                }
            }
        )*
    };
}

/// The designator register, a bit field of mode, privilege and
/// condition designators.  Bit positions are named B0 (leftmost,
/// bit 35 of the word) through B35.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct DesignatorRegister {
    bits: u64,
}

impl DesignatorRegister {
    designator_flags!(
        (activity_level_queue_monitor, set_activity_level_queue_monitor, 0),
        (fault_handling_in_progress, set_fault_handling_in_progress, 6),
        (executive_24bit_indexing, set_executive_24bit_indexing, 11),
        (quantum_timer_enabled, set_quantum_timer_enabled, 12),
        (deferrable_interrupt_enabled, set_deferrable_interrupt_enabled, 13),
        (basic_mode_enabled, set_basic_mode_enabled, 16),
        (exec_register_set_selected, set_exec_register_set_selected, 17),
        (carry, set_carry, 18),
        (overflow, set_overflow, 19),
        (characteristic_underflow, set_characteristic_underflow, 21),
        (characteristic_overflow, set_characteristic_overflow, 22),
        (divide_check, set_divide_check, 23),
        (operation_trap_enabled, set_operation_trap_enabled, 27),
        (arithmetic_exception_enabled, set_arithmetic_exception_enabled, 29),
        (basic_mode_base_register_selection, set_basic_mode_base_register_selection, 31),
        (quarter_word_mode_enabled, set_quarter_word_mode_enabled, 32),
    );

    /// Processor privilege, 0 (most privileged) through 3, held in
    /// B14-B15.
    #[must_use]
    pub const fn processor_privilege(&self) -> u8 {
        ((self.bits >> 20) & 0o3) as u8
    }

    pub fn set_processor_privilege(&mut self, privilege: u8) {
        self.bits = (self.bits & !(0o3 << 20)) | (u64::from(privilege & 0o3) << 20);
    }

    #[must_use]
    pub const fn to_word(self) -> Word36 {
        Word36::from_bits(self.bits)
    }

    #[must_use]
    pub const fn from_word(word: Word36) -> DesignatorRegister {
        DesignatorRegister { bits: word.bits() }
    }

    /// The designator state established on interrupt entry: all
    /// designators clear except fault-handling-in-progress (which
    /// carries over), with the executive register set selected and
    /// arithmetic exceptions enabled.
    #[must_use]
    pub fn interrupt_entry_state(&self) -> DesignatorRegister {
        let mut dr = DesignatorRegister::default();
        dr.set_fault_handling_in_progress(self.fault_handling_in_progress());
        dr.set_exec_register_set_selected(true);
        dr.set_arithmetic_exception_enabled(true);
        dr
    }
}

/// The indicator/key register: the access key under which operands
/// are referenced, plus the delivery status of the most recent
/// interrupt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct IndicatorKeyRegister {
    pub access_key: AccessInfo,
    pub short_status: u8,
    pub interrupt_class_code: u8,
    pub instruction_in_f0: bool,
    pub breakpoint_match: bool,
}

impl IndicatorKeyRegister {
    /// Layout: short status in S1, interrupt class code in S2,
    /// instruction-in-F0 at bit 23, breakpoint match at bit 22,
    /// access key ring at bits 16-17 and domain at bits 0-15.
    #[must_use]
    pub fn to_word(self) -> Word36 {
        let mut w = Word36::ZERO;
        w.set_s1(u64::from(self.short_status));
        w.set_s2(u64::from(self.interrupt_class_code));
        let flags = (u64::from(self.instruction_in_f0) << 23)
            | (u64::from(self.breakpoint_match) << 22)
            | (u64::from(self.access_key.ring & 0o3) << 16)
            | u64::from(self.access_key.domain);
        Word36::from_bits(w.bits() | flags)
    }

    #[must_use]
    pub fn from_word(word: Word36) -> IndicatorKeyRegister {
        IndicatorKeyRegister {
            access_key: AccessInfo {
                ring: ((word.bits() >> 16) & 0o3) as u8,
                domain: (word.bits() & 0o177_777) as u16,
            },
            short_status: word.s1() as u8,
            interrupt_class_code: word.s2() as u8,
            instruction_in_f0: word.bits() & (1 << 23) != 0,
            breakpoint_match: word.bits() & (1 << 22) != 0,
        }
    }

    pub fn record_interrupt(&mut self, class_code: u8, short_status: u8) {
        self.interrupt_class_code = class_code;
        self.short_status = short_status;
    }
}

/// Bank-descriptor index and program counter for the next
/// instruction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct ProgramAddressRegister {
    level_bdi: u32,
    program_counter: u32,
}

impl ProgramAddressRegister {
    #[must_use]
    pub const fn new(level_bdi: u32, program_counter: u32) -> ProgramAddressRegister {
        ProgramAddressRegister {
            level_bdi: level_bdi & 0o777_777,
            program_counter: program_counter & 0o777_777,
        }
    }

    #[must_use]
    pub const fn level_bdi(&self) -> u32 {
        self.level_bdi
    }

    #[must_use]
    pub const fn program_counter(&self) -> u32 {
        self.program_counter
    }

    pub fn set_program_counter(&mut self, pc: u32) {
        self.program_counter = pc & 0o777_777;
    }

    pub fn advance(&mut self, count: u32) {
        self.program_counter = (self.program_counter + count) & 0o777_777;
    }

    #[must_use]
    pub fn to_word(self) -> Word36 {
        let mut w = Word36::ZERO;
        w.set_h1(u64::from(self.level_bdi));
        w.set_h2(u64::from(self.program_counter));
        w
    }

    #[must_use]
    pub fn from_word(word: Word36) -> ProgramAddressRegister {
        ProgramAddressRegister::new(word.h1() as u32, word.h2() as u32)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_designator_privilege_field() {
        let mut dr = DesignatorRegister::default();
        assert_eq!(dr.processor_privilege(), 0);
        dr.set_processor_privilege(2);
        assert_eq!(dr.processor_privilege(), 2);
        dr.set_basic_mode_enabled(true);
        assert_eq!(dr.processor_privilege(), 2);
        dr.set_processor_privilege(0);
        assert!(dr.basic_mode_enabled());
    }

    #[test]
    fn test_designator_word_round_trip() {
        let mut dr = DesignatorRegister::default();
        dr.set_carry(true);
        dr.set_overflow(true);
        dr.set_quarter_word_mode_enabled(true);
        dr.set_processor_privilege(3);
        let w = dr.to_word();
        assert_eq!(DesignatorRegister::from_word(w), dr);
    }

    #[test]
    fn test_interrupt_entry_state() {
        let mut dr = DesignatorRegister::default();
        dr.set_basic_mode_enabled(true);
        dr.set_carry(true);
        dr.set_fault_handling_in_progress(true);
        let entry = dr.interrupt_entry_state();
        assert!(entry.fault_handling_in_progress());
        assert!(entry.exec_register_set_selected());
        assert!(entry.arithmetic_exception_enabled());
        assert!(!entry.basic_mode_enabled());
        assert!(!entry.carry());
        assert_eq!(entry.processor_privilege(), 0);
    }

    #[test]
    fn test_grs_windows_overlap() {
        let mut grs = GeneralRegisterSet::new();
        // A0 and X12 are the same cell.
        grs.set_a(0, false, Word36::from_bits(0o123));
        assert_eq!(grs.x(12, false).word(), Word36::from_bits(0o123));
        // Executive window is distinct from the user window.
        grs.set_a(0, true, Word36::from_bits(0o456));
        assert_eq!(grs.a(0, false), Word36::from_bits(0o123));
        assert_eq!(grs.a(0, true), Word36::from_bits(0o456));
    }

    #[test]
    fn test_exec_window_detection() {
        assert!(!GeneralRegisterSet::is_exec_window(X0));
        assert!(!GeneralRegisterSet::is_exec_window(A0));
        // Cells 0o34-0o77 are ordinary unnamed user registers.
        assert!(!GeneralRegisterSet::is_exec_window(0o41));
        assert!(!GeneralRegisterSet::is_exec_window(0o77));
        assert!(!GeneralRegisterSet::is_exec_window(R0));
        assert!(GeneralRegisterSet::is_exec_window(ER0));
        assert!(GeneralRegisterSet::is_exec_window(EX0));
        assert!(GeneralRegisterSet::is_exec_window(EA0));
    }

    #[test]
    fn test_exec_windows_occupy_upper_half() {
        let mut grs = GeneralRegisterSet::new();
        grs.set_x(1, true, IndexRegister::new(Word36::from_bits(0o7)));
        assert_eq!(grs.get(EX0 + 1), Word36::from_bits(0o7));
        grs.set_a(0, true, Word36::from_bits(0o11));
        assert_eq!(grs.get(EA0), Word36::from_bits(0o11));
        // EA0 aliases EX12, just as A0 aliases X12.
        assert_eq!(grs.x(12, true).word(), Word36::from_bits(0o11));
    }

    #[test]
    fn test_grs_serializes_every_cell() {
        let mut grs = GeneralRegisterSet::new();
        grs.set(GRS_SIZE - 1, Word36::from_bits(0o123));
        let value = serde_json::to_value(&grs).unwrap();
        let cells = value.as_array().unwrap();
        assert_eq!(cells.len(), GRS_SIZE);
    }

    #[test]
    fn test_indicator_key_round_trip() {
        let ikr = IndicatorKeyRegister {
            access_key: AccessInfo { ring: 2, domain: 0o1234 },
            short_status: 0o21,
            interrupt_class_code: 0o16,
            instruction_in_f0: true,
            breakpoint_match: false,
        };
        assert_eq!(IndicatorKeyRegister::from_word(ikr.to_word()), ikr);
    }

    #[test]
    fn test_par_wraps_at_18_bits() {
        let mut par = ProgramAddressRegister::new(0o600004, 0o777_777);
        par.advance(1);
        assert_eq!(par.program_counter(), 0);
        assert_eq!(par.level_bdi(), 0o600004);
    }
}
