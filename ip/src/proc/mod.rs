//! The instruction processor itself.
//!
//! A processor owns its register state and a handle on the shared
//! main storage.  [`InstructionProcessor::step`] runs one cycle of
//! the engine: deliver a pending interrupt if one may be taken,
//! otherwise fetch, decode, resolve the operand address and dispatch
//! the handler from the function table.  Basic-mode indirect
//! addressing consumes one cycle per hop, leaving the instruction
//! interruptible between hops.
//!
//! Storage-lock contention is not an error and never reaches the
//! executive: the losing processor abandons the attempt with no state
//! changed, yields, and retries the same instruction.

mod op_arith;
mod op_jump;
mod op_loadstore;
mod op_shift;
mod op_system;
mod op_test;
mod operands;
mod resolve;


use std::fmt::{self, Display, Formatter};
use std::sync::Arc;
use std::thread;

use serde::Serialize;
use tracing::{event, Level};

use base::prelude::*;

use crate::clock::DayClock;
use crate::dispatch::{self, FunctionTableEntry};
use crate::interrupt::{
    InterruptClass, InvalidInstructionReason, MachineInterrupt, PendingInterrupts,
    ReferenceViolationReason,
};
use crate::locks::{LockContention, StorageLocks, UpiId};
use crate::regfile::{
    AccessInfo, BaseRegister, DesignatorRegister, GeneralRegisterSet, IndicatorKeyRegister,
    ProgramAddressRegister, ICS_INDEX_REGISTER,
};
use crate::snapshot::ProcessorSnapshot;
use crate::storage::{BankImage, MainStorage};

pub(crate) use operands::OperandTarget;
pub(crate) use resolve::{AddressResolution, ResolvedOperand};

pub const BASE_REGISTER_COUNT: usize = 32;
/// Base register describing the level-0 bank-descriptor table, whose
/// first words form the interrupt vector table.
pub const L0_BDT_BASE_REGISTER: usize = 16;
/// Base register describing the return control stack.
pub const RCS_BASE_REGISTER: usize = 25;
/// Base register describing the interrupt control stack.
pub const ICS_BASE_REGISTER: usize = 26;

const ICS_FRAME_SIZE: u64 = 6;
const JUMP_HISTORY_SIZE: usize = 128;
const QUANTUM_CHARGE_INSTRUCTION: i64 = 20;
const QUANTUM_CHARGE_HOP: i64 = 10;

/// Why a processor is (or last was) stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum StopReason {
    /// Never started since construction.
    Initial,
    Cleared,
    Debug,
    Development,
    Breakpoint,
    HaltJumpExecuted,
    IcsBaseRegisterInvalid,
    IcsOverflow,
    InitiateAutoRecovery,
    L0BaseRegisterInvalid,
    PanelHalt,
    /// A hardware-check condition arose while a hardware-check
    /// handler was already in progress.
    InterruptHandlerHardwareFailure,
    InterruptHandlerOffersUnresponsive,
}

impl Display for StopReason {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ProcessorState {
    Running,
    Stopped(StopReason),
}

/// What interrupted an instruction handler.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecFault {
    /// The instruction aborts and the interrupt is queued for
    /// delivery; the program counter is not advanced.
    Interrupt(MachineInterrupt),
    /// Another processor holds a needed storage lock; the instruction
    /// retries after a yield.
    LockContention,
}

impl From<MachineInterrupt> for ExecFault {
    fn from(interrupt: MachineInterrupt) -> ExecFault {
        ExecFault::Interrupt(interrupt)
    }
}

impl From<LockContention> for ExecFault {
    fn from(_: LockContention) -> ExecFault {
        ExecFault::LockContention
    }
}

/// How the program counter moves when the current instruction
/// completes.  Handlers which jump or skip set this; everything else
/// advances by one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ProgramCounterChange {
    Advance,
    Skip,
    Jump(u32),
}

pub struct InstructionProcessor {
    upi: UpiId,
    storage: MainStorage,
    locks: Arc<StorageLocks>,
    clock: Box<dyn DayClock + Send>,
    state: ProcessorState,
    designator: DesignatorRegister,
    indicator_key: IndicatorKeyRegister,
    program_address: ProgramAddressRegister,
    grs: GeneralRegisterSet,
    base_registers: [BaseRegister; BASE_REGISTER_COUNT],
    pending: PendingInterrupts,
    /// The instruction currently staged for execution; meaningful
    /// only while the indicator/key register says so.
    f0: InstructionWord,
    current_entry: Option<&'static FunctionTableEntry>,
    resolved: Option<ResolvedOperand>,
    /// True between indirect-addressing hops, when the in-flight
    /// instruction may still be abandoned for an interrupt.
    mid_execution: bool,
    pc_change: ProgramCounterChange,
    quantum_timer: i64,
    jump_history: Vec<Word36>,
    jump_history_index: usize,
}

impl InstructionProcessor {
    #[must_use]
    pub fn new(
        upi: UpiId,
        storage: MainStorage,
        locks: Arc<StorageLocks>,
        clock: Box<dyn DayClock + Send>,
    ) -> InstructionProcessor {
        InstructionProcessor {
            upi,
            storage,
            locks,
            clock,
            state: ProcessorState::Stopped(StopReason::Initial),
            designator: DesignatorRegister::default(),
            indicator_key: IndicatorKeyRegister::default(),
            program_address: ProgramAddressRegister::default(),
            grs: GeneralRegisterSet::new(),
            base_registers: [BaseRegister::void(); BASE_REGISTER_COUNT],
            pending: PendingInterrupts::new(),
            f0: InstructionWord::default(),
            current_entry: None,
            resolved: None,
            mid_execution: false,
            pc_change: ProgramCounterChange::Advance,
            quantum_timer: 0,
            jump_history: Vec::with_capacity(JUMP_HISTORY_SIZE),
            jump_history_index: 0,
        }
    }

    #[must_use]
    pub fn upi(&self) -> UpiId {
        self.upi
    }

    #[must_use]
    pub fn state(&self) -> ProcessorState {
        self.state
    }

    #[must_use]
    pub fn stop_reason(&self) -> Option<StopReason> {
        match self.state {
            ProcessorState::Running => None,
            ProcessorState::Stopped(reason) => Some(reason),
        }
    }

    pub fn start(&mut self) {
        if let ProcessorState::Stopped(reason) = self.state {
            event!(Level::INFO, upi = self.upi, %reason, "processor starting");
            self.state = ProcessorState::Running;
        }
    }

    pub fn stop(&mut self, reason: StopReason) {
        event!(Level::INFO, upi = self.upi, %reason, "processor stopped");
        self.state = ProcessorState::Stopped(reason);
    }

    /// Queue an interrupt for delivery at the next interrupt point.
    /// This is also the entry point for conditions raised from
    /// outside the instruction stream (UPI, dayclock, panel).
    pub fn raise_interrupt(&mut self, interrupt: MachineInterrupt) {
        event!(Level::TRACE, upi = self.upi, %interrupt, "interrupt raised");
        self.pending.raise(interrupt);
    }

    /// Place a bank image into storage and describe it on base
    /// register `index`.
    pub fn load_bank(&mut self, index: usize, image: &BankImage) {
        self.base_registers[index] = self.storage.load_image(image);
    }

    pub fn set_base_register(&mut self, index: usize, bank: BaseRegister) {
        self.base_registers[index] = bank;
    }

    #[must_use]
    pub fn base_register(&self, index: usize) -> BaseRegister {
        self.base_registers[index]
    }

    #[must_use]
    pub fn designator_register(&self) -> DesignatorRegister {
        self.designator
    }

    pub fn set_designator_register(&mut self, designator: DesignatorRegister) {
        self.designator = designator;
    }

    pub fn set_access_key(&mut self, key: AccessInfo) {
        self.indicator_key.access_key = key;
    }

    #[must_use]
    pub fn program_address(&self) -> ProgramAddressRegister {
        self.program_address
    }

    pub fn set_program_address(&mut self, level_bdi: u32, program_counter: u32) {
        self.program_address = ProgramAddressRegister::new(level_bdi, program_counter);
    }

    #[must_use]
    pub fn general_register(&self, index: usize) -> Word36 {
        self.grs.get(index)
    }

    pub fn set_general_register(&mut self, index: usize, value: Word36) {
        self.grs.set(index, value);
    }

    #[must_use]
    pub fn quantum_timer(&self) -> i64 {
        self.quantum_timer
    }

    pub fn set_quantum_timer(&mut self, value: i64) {
        self.quantum_timer = value;
    }

    #[must_use]
    pub fn jump_history(&self) -> &[Word36] {
        &self.jump_history
    }

    #[must_use]
    pub fn snapshot(&self) -> ProcessorSnapshot {
        ProcessorSnapshot {
            upi: self.upi,
            state: self.state,
            designator: self.designator,
            indicator_key: self.indicator_key,
            program_address: self.program_address,
            general_registers: (0..crate::regfile::GRS_SIZE).map(|i| self.grs.get(i)).collect(),
            quantum_timer: self.quantum_timer,
        }
    }

    /// Run one engine cycle if the processor is running.
    pub fn step(&mut self) {
        if matches!(self.state, ProcessorState::Running) {
            self.cycle();
        }
    }

    /// Step until the processor stops or `max_cycles` elapse,
    /// returning the stop reason if it stopped.
    pub fn run_until_stopped(&mut self, max_cycles: usize) -> Option<StopReason> {
        for _ in 0..max_cycles {
            match self.state {
                ProcessorState::Running => self.cycle(),
                ProcessorState::Stopped(reason) => return Some(reason),
            }
        }
        self.stop_reason()
    }

    fn cycle(&mut self) {
        // Interrupts are taken between instructions and between
        // indirect-addressing hops, never mid-handler.
        if !self.indicator_key.instruction_in_f0 || self.mid_execution {
            if let Some(interrupt) = self.pending.take_deliverable(&self.designator) {
                self.deliver_interrupt(interrupt);
                return;
            }
        }
        if !self.indicator_key.instruction_in_f0 {
            if let Err(interrupt) = self.fetch_instruction() {
                self.pending.raise(interrupt);
                return;
            }
        }
        let entry = match self.current_entry {
            Some(entry) => entry,
            None => match self.decode() {
                Ok(entry) => entry,
                Err(interrupt) => {
                    self.abort_instruction(interrupt);
                    return;
                }
            },
        };
        if self.resolved.is_none() {
            match self.resolve_operand_address(entry) {
                Ok(AddressResolution::Complete) => {
                    self.mid_execution = false;
                }
                Ok(AddressResolution::Indirect) => {
                    self.mid_execution = true;
                    self.charge_quantum(QUANTUM_CHARGE_HOP);
                    return;
                }
                Err(interrupt) => {
                    self.abort_instruction(interrupt);
                    return;
                }
            }
        }
        match (entry.handler)(self) {
            Ok(()) => self.complete_instruction(),
            Err(ExecFault::LockContention) => {
                // Nothing was mutated; keep the resolved operand (so
                // index increments are not repeated) and retry.
                self.locks.release_all(self.upi);
                thread::yield_now();
            }
            Err(ExecFault::Interrupt(interrupt)) => self.abort_instruction(interrupt),
        }
    }

    fn decode(&mut self) -> Result<&'static FunctionTableEntry, MachineInterrupt> {
        let entry = dispatch::lookup(
            self.f0.f(),
            self.f0.j(),
            self.f0.a(),
            self.designator.basic_mode_enabled(),
        )
        .ok_or_else(|| {
            MachineInterrupt::invalid_instruction(InvalidInstructionReason::UndefinedFunctionCode)
        })?;
        // The privilege check precedes address resolution, so a
        // privilege fault never mutates index registers.
        if self.designator.processor_privilege() > entry.maximum_privilege {
            return Err(MachineInterrupt::invalid_instruction(
                InvalidInstructionReason::InvalidProcessorPrivilege,
            ));
        }
        self.current_entry = Some(entry);
        Ok(entry)
    }

    fn fetch_instruction(&mut self) -> Result<(), MachineInterrupt> {
        let pc = self.program_address.program_counter();
        let bank = self.fetch_bank(pc)?;
        let word = self.storage.read(bank.absolute_address(pc));
        self.f0 = InstructionWord::new(word);
        self.indicator_key.instruction_in_f0 = true;
        self.current_entry = None;
        self.resolved = None;
        self.mid_execution = false;
        self.pc_change = ProgramCounterChange::Advance;
        Ok(())
    }

    fn fetch_bank(&self, pc: u32) -> Result<BaseRegister, MachineInterrupt> {
        let bank = if self.designator.basic_mode_enabled() {
            self.basic_bank_search(pc)
        } else {
            let b0 = self.base_registers[0];
            b0.contains(pc).then_some(b0)
        };
        let bank = bank.ok_or_else(|| {
            MachineInterrupt::reference_violation(
                ReferenceViolationReason::StorageLimits,
                u64::from(pc),
                true,
            )
        })?;
        if !bank.effective_permissions(self.indicator_key.access_key).read {
            return Err(MachineInterrupt::reference_violation(
                ReferenceViolationReason::ReadAccess,
                u64::from(pc),
                true,
            ));
        }
        Ok(bank)
    }

    /// Find the first basic-mode candidate bank (B12-B15) whose
    /// limits cover `relative`.  The designator's base-register
    /// selection bit swaps the B12/B14 and B13/B15 pair order.
    pub(crate) fn basic_bank_search(&self, relative: u32) -> Option<BaseRegister> {
        let order: [usize; 4] = if self.designator.basic_mode_base_register_selection() {
            [13, 15, 12, 14]
        } else {
            [12, 14, 13, 15]
        };
        order
            .iter()
            .map(|&index| self.base_registers[index])
            .find(|bank| bank.contains(relative))
    }

    fn complete_instruction(&mut self) {
        self.locks.release_all(self.upi);
        match self.pc_change {
            ProgramCounterChange::Advance => self.program_address.advance(1),
            ProgramCounterChange::Skip => self.program_address.advance(2),
            ProgramCounterChange::Jump(target) => {
                self.program_address.set_program_counter(target);
                self.record_jump(self.program_address.to_word());
            }
        }
        self.clear_instruction_state();
        self.charge_quantum(QUANTUM_CHARGE_INSTRUCTION);
    }

    fn abort_instruction(&mut self, interrupt: MachineInterrupt) {
        self.locks.release_all(self.upi);
        self.clear_instruction_state();
        event!(Level::DEBUG, upi = self.upi, %interrupt, "instruction aborted");
        self.pending.raise(interrupt);
    }

    fn clear_instruction_state(&mut self) {
        self.indicator_key.instruction_in_f0 = false;
        self.current_entry = None;
        self.resolved = None;
        self.mid_execution = false;
        self.pc_change = ProgramCounterChange::Advance;
    }

    fn charge_quantum(&mut self, cost: i64) {
        if !self.designator.quantum_timer_enabled() {
            return;
        }
        let before = self.quantum_timer;
        self.quantum_timer -= cost;
        if before > 0 && self.quantum_timer <= 0 {
            self.pending.raise(MachineInterrupt::quantum_timer());
        }
    }

    fn record_jump(&mut self, target: Word36) {
        if self.jump_history.len() < JUMP_HISTORY_SIZE {
            self.jump_history.push(target);
        } else {
            self.jump_history[self.jump_history_index] = target;
        }
        self.jump_history_index = (self.jump_history_index + 1) % JUMP_HISTORY_SIZE;
        if self.jump_history_index == 0 {
            self.pending.raise(MachineInterrupt::jump_history_full());
        }
    }

    /// Push an interrupt control stack frame, switch to the handler
    /// named by the vector table, and enter the executive designator
    /// state.  Failures here are unrecoverable and stop the
    /// processor.
    fn deliver_interrupt(&mut self, interrupt: MachineInterrupt) {
        event!(Level::DEBUG, upi = self.upi, %interrupt, "delivering interrupt");
        self.locks.release_all(self.upi);
        self.clear_instruction_state();
        if interrupt.class == InterruptClass::HardwareCheck
            && self.designator.fault_handling_in_progress()
        {
            self.stop(StopReason::InterruptHandlerHardwareFailure);
            return;
        }
        self.indicator_key
            .record_interrupt(interrupt.class.code(), interrupt.short_status);

        let ics = self.base_registers[ICS_BASE_REGISTER];
        if ics.is_void() {
            self.stop(StopReason::IcsBaseRegisterInvalid);
            return;
        }
        // The stack grows downward; the pointer register holds the
        // current top-of-stack relative address in its modifier.
        let pointer = IndexRegister::new(self.grs.get(ICS_INDEX_REGISTER));
        let frame_base = match pointer.xm().checked_sub(ICS_FRAME_SIZE) {
            Some(base) => base as u32,
            None => {
                self.stop(StopReason::IcsOverflow);
                return;
            }
        };
        let frame_last = frame_base + ICS_FRAME_SIZE as u32 - 1;
        if !ics.contains(frame_base) || !ics.contains(frame_last) {
            self.stop(StopReason::IcsOverflow);
            return;
        }
        let frame = [
            self.program_address.to_word(),
            self.designator.to_word(),
            self.indicator_key.to_word(),
            Word36::from_i64(self.quantum_timer),
            interrupt.status_word_0,
            interrupt.status_word_1,
        ];
        for (i, word) in frame.iter().enumerate() {
            self.storage
                .write(ics.absolute_address(frame_base + i as u32), *word);
        }
        self.grs.set(
            ICS_INDEX_REGISTER,
            pointer.with_xm(u64::from(frame_base)).word(),
        );

        let l0 = self.base_registers[L0_BDT_BASE_REGISTER];
        let slot = l0
            .lower_limit_normalized()
            .wrapping_add(u32::from(interrupt.class.code()));
        if !l0.contains(slot) {
            self.stop(StopReason::L0BaseRegisterInvalid);
            return;
        }
        let vector = self.storage.read(l0.absolute_address(slot));
        self.program_address = ProgramAddressRegister::from_word(vector);
        self.designator = self.designator.interrupt_entry_state();
        if interrupt.class == InterruptClass::HardwareCheck {
            self.designator.set_fault_handling_in_progress(true);
        }
        self.record_jump(self.program_address.to_word());
    }

    // Register views selected by the instruction's a field.

    pub(crate) fn register_a(&self, offset: usize) -> Word36 {
        let exec = self.designator.exec_register_set_selected();
        self.grs.a(self.f0.a() as usize + offset, exec)
    }

    pub(crate) fn set_register_a(&mut self, offset: usize, value: Word36) {
        let exec = self.designator.exec_register_set_selected();
        self.grs.set_a(self.f0.a() as usize + offset, exec, value);
    }

    pub(crate) fn register_x(&self) -> IndexRegister {
        let exec = self.designator.exec_register_set_selected();
        self.grs.x(self.f0.a() as usize, exec)
    }

    pub(crate) fn set_register_x(&mut self, value: IndexRegister) {
        let exec = self.designator.exec_register_set_selected();
        self.grs.set_x(self.f0.a() as usize, exec, value);
    }

    pub(crate) fn register_r(&self) -> Word36 {
        let exec = self.designator.exec_register_set_selected();
        self.grs.r(self.f0.a() as usize, exec)
    }

    pub(crate) fn set_register_r(&mut self, value: Word36) {
        let exec = self.designator.exec_register_set_selected();
        self.grs.set_r(self.f0.a() as usize, exec, value);
    }
}

impl fmt::Debug for InstructionProcessor {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "InstructionProcessor{{upi: {}, state: {:?}, pc: {:06o}}}",
            self.upi,
            self.state,
            self.program_address.program_counter()
        )
    }
}
