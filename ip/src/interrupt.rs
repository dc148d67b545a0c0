//! Machine-interrupt classification and the pending-interrupt queue.
//!
//! Every abnormal condition the processor can detect is described by
//! a [`MachineInterrupt`] carrying its class, a short status field
//! and two status words.  The class code doubles as the service
//! priority: numerically lower classes are delivered first.

use std::fmt::{self, Display, Formatter};

use serde::Serialize;

use base::prelude::*;
use base::KeyedReversePriorityQueue;

use crate::regfile::DesignatorRegister;
use crate::storage::AbsoluteAddress;

/// Identifies the condition an interrupt reports.  The octal codes
/// index the interrupt vector table and order delivery priority.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum InterruptClass {
    HardwareDefault,
    HardwareCheck,
    ReferenceViolation,
    AddressingException,
    TerminalAddressingException,
    RcsGenericStackUnderflowOverflow,
    Signal,
    TestAndSet,
    InvalidInstruction,
    PageException,
    ArithmeticException,
    DataException,
    OperationTrap,
    Breakpoint,
    QuantumTimer,
    SoftwareBreak,
    JumpHistoryFull,
    Dayclock,
    InitialProgramLoad,
    UpiInitial,
    UpiNormal,
}

/// Whether delivery aborts the instruction during which the
/// condition arose.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ConditionCategory {
    Fault,
    NonFault,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Deferrability {
    /// Delivered at the next interrupt point no matter what.
    Exigent,
    /// Held while the designator register's deferrable-interrupt
    /// enable is clear.
    Deferrable,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Synchrony {
    /// Raised by this processor's own instruction stream.
    Synchronous,
    /// Raised against the instruction stream (timers, clocks).
    Asynchronous,
    /// Raised by another processor.
    Broadcast,
}

/// Where in instruction processing the condition was detected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum InterruptPoint {
    BetweenInstructions,
    MidExecution,
    IndirectExecute,
}

impl InterruptClass {
    #[must_use]
    pub const fn code(self) -> u8 {
        match self {
            InterruptClass::HardwareDefault => 0o00,
            InterruptClass::HardwareCheck => 0o01,
            InterruptClass::ReferenceViolation => 0o10,
            InterruptClass::AddressingException => 0o11,
            InterruptClass::TerminalAddressingException => 0o12,
            InterruptClass::RcsGenericStackUnderflowOverflow => 0o13,
            InterruptClass::Signal => 0o14,
            InterruptClass::TestAndSet => 0o15,
            InterruptClass::InvalidInstruction => 0o16,
            InterruptClass::PageException => 0o17,
            InterruptClass::ArithmeticException => 0o20,
            InterruptClass::DataException => 0o21,
            InterruptClass::OperationTrap => 0o22,
            InterruptClass::Breakpoint => 0o23,
            InterruptClass::QuantumTimer => 0o24,
            InterruptClass::SoftwareBreak => 0o30,
            InterruptClass::JumpHistoryFull => 0o31,
            InterruptClass::Dayclock => 0o33,
            InterruptClass::InitialProgramLoad => 0o35,
            InterruptClass::UpiInitial => 0o36,
            InterruptClass::UpiNormal => 0o37,
        }
    }

    #[must_use]
    pub const fn condition_category(self) -> ConditionCategory {
        match self {
            InterruptClass::Signal
            | InterruptClass::QuantumTimer
            | InterruptClass::SoftwareBreak
            | InterruptClass::JumpHistoryFull
            | InterruptClass::Dayclock
            | InterruptClass::InitialProgramLoad
            | InterruptClass::UpiInitial
            | InterruptClass::UpiNormal => ConditionCategory::NonFault,
            _ => ConditionCategory::Fault,
        }
    }

    #[must_use]
    pub const fn deferrability(self) -> Deferrability {
        match self {
            InterruptClass::QuantumTimer
            | InterruptClass::SoftwareBreak
            | InterruptClass::JumpHistoryFull
            | InterruptClass::Dayclock
            | InterruptClass::UpiNormal => Deferrability::Deferrable,
            _ => Deferrability::Exigent,
        }
    }

    const fn name(self) -> &'static str {
        match self {
            InterruptClass::HardwareDefault => "hardware-default",
            InterruptClass::HardwareCheck => "hardware-check",
            InterruptClass::ReferenceViolation => "reference-violation",
            InterruptClass::AddressingException => "addressing-exception",
            InterruptClass::TerminalAddressingException => "terminal-addressing-exception",
            InterruptClass::RcsGenericStackUnderflowOverflow => "rcs-underflow-overflow",
            InterruptClass::Signal => "signal",
            InterruptClass::TestAndSet => "test-and-set",
            InterruptClass::InvalidInstruction => "invalid-instruction",
            InterruptClass::PageException => "page-exception",
            InterruptClass::ArithmeticException => "arithmetic-exception",
            InterruptClass::DataException => "data-exception",
            InterruptClass::OperationTrap => "operation-trap",
            InterruptClass::Breakpoint => "breakpoint",
            InterruptClass::QuantumTimer => "quantum-timer",
            InterruptClass::SoftwareBreak => "software-break",
            InterruptClass::JumpHistoryFull => "jump-history-full",
            InterruptClass::Dayclock => "dayclock",
            InterruptClass::InitialProgramLoad => "initial-program-load",
            InterruptClass::UpiInitial => "upi-initial",
            InterruptClass::UpiNormal => "upi-normal",
        }
    }
}

impl Display for InterruptClass {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{:03o}:{}", self.code(), self.name())
    }
}

/// Short-status values for [`InterruptClass::ReferenceViolation`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ReferenceViolationReason {
    StorageLimits = 0,
    ReadAccess = 1,
    WriteAccess = 2,
    GrsViolation = 3,
}

/// Short-status values for [`InterruptClass::InvalidInstruction`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum InvalidInstructionReason {
    UndefinedFunctionCode = 0,
    InvalidProcessorPrivilege = 1,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct MachineInterrupt {
    pub class: InterruptClass,
    pub synchrony: Synchrony,
    pub point: InterruptPoint,
    /// Class-specific reason code, recorded in the indicator/key
    /// register at delivery for the handler to inspect.
    pub short_status: u8,
    pub status_word_0: Word36,
    pub status_word_1: Word36,
}

impl MachineInterrupt {
    fn synchronous(class: InterruptClass, short_status: u8) -> MachineInterrupt {
        MachineInterrupt {
            class,
            synchrony: Synchrony::Synchronous,
            point: InterruptPoint::MidExecution,
            short_status,
            status_word_0: Word36::ZERO,
            status_word_1: Word36::ZERO,
        }
    }

    #[must_use]
    pub fn hardware_check(detail: Word36) -> MachineInterrupt {
        MachineInterrupt {
            status_word_0: detail,
            ..MachineInterrupt::synchronous(InterruptClass::HardwareCheck, 0)
        }
    }

    /// A storage-limits or access-permission failure.  The violated
    /// relative address is recorded in status word 0; bit 0 of the
    /// short status distinguishes an instruction fetch.
    #[must_use]
    pub fn reference_violation(
        reason: ReferenceViolationReason,
        relative_address: u64,
        fetch: bool,
    ) -> MachineInterrupt {
        MachineInterrupt {
            status_word_0: Word36::from_bits(relative_address),
            ..MachineInterrupt::synchronous(
                InterruptClass::ReferenceViolation,
                ((reason as u8) << 1) | u8::from(fetch),
            )
        }
    }

    #[must_use]
    pub fn addressing_exception(relative_address: u64) -> MachineInterrupt {
        MachineInterrupt {
            status_word_0: Word36::from_bits(relative_address),
            ..MachineInterrupt::synchronous(InterruptClass::AddressingException, 0)
        }
    }

    #[must_use]
    pub fn invalid_instruction(reason: InvalidInstructionReason) -> MachineInterrupt {
        MachineInterrupt::synchronous(InterruptClass::InvalidInstruction, reason as u8)
    }

    #[must_use]
    pub fn arithmetic_exception(condition: ArithmeticCondition) -> MachineInterrupt {
        let short_status = match condition {
            ArithmeticCondition::CharacteristicOverflow => 0,
            ArithmeticCondition::CharacteristicUnderflow => 1,
            ArithmeticCondition::DivideCheck => 2,
        };
        MachineInterrupt::synchronous(InterruptClass::ArithmeticException, short_status)
    }

    #[must_use]
    pub fn operation_trap() -> MachineInterrupt {
        MachineInterrupt::synchronous(InterruptClass::OperationTrap, 0)
    }

    #[must_use]
    pub fn test_and_set(address: AbsoluteAddress) -> MachineInterrupt {
        MachineInterrupt {
            status_word_0: address.to_word(),
            ..MachineInterrupt::synchronous(InterruptClass::TestAndSet, 0)
        }
    }

    #[must_use]
    pub fn rcs_underflow_overflow(overflow: bool) -> MachineInterrupt {
        MachineInterrupt::synchronous(
            InterruptClass::RcsGenericStackUnderflowOverflow,
            u8::from(overflow),
        )
    }

    #[must_use]
    pub fn signal(code: u8) -> MachineInterrupt {
        MachineInterrupt::synchronous(InterruptClass::Signal, code)
    }

    #[must_use]
    pub fn quantum_timer() -> MachineInterrupt {
        MachineInterrupt {
            synchrony: Synchrony::Asynchronous,
            point: InterruptPoint::BetweenInstructions,
            ..MachineInterrupt::synchronous(InterruptClass::QuantumTimer, 0)
        }
    }

    #[must_use]
    pub fn jump_history_full() -> MachineInterrupt {
        MachineInterrupt {
            synchrony: Synchrony::Asynchronous,
            ..MachineInterrupt::synchronous(InterruptClass::JumpHistoryFull, 0)
        }
    }

    #[must_use]
    pub fn dayclock() -> MachineInterrupt {
        MachineInterrupt {
            synchrony: Synchrony::Asynchronous,
            ..MachineInterrupt::synchronous(InterruptClass::Dayclock, 0)
        }
    }

    #[must_use]
    pub fn initial_program_load() -> MachineInterrupt {
        MachineInterrupt {
            synchrony: Synchrony::Broadcast,
            point: InterruptPoint::BetweenInstructions,
            ..MachineInterrupt::synchronous(InterruptClass::InitialProgramLoad, 0)
        }
    }

    #[must_use]
    pub fn upi_normal(source: u16) -> MachineInterrupt {
        MachineInterrupt {
            synchrony: Synchrony::Broadcast,
            point: InterruptPoint::BetweenInstructions,
            status_word_0: Word36::from_bits(u64::from(source)),
            ..MachineInterrupt::synchronous(InterruptClass::UpiNormal, 0)
        }
    }

    /// May this interrupt be taken now, given the current designator
    /// state?
    #[must_use]
    pub fn is_deliverable(&self, designator: &DesignatorRegister) -> bool {
        match self.class.deferrability() {
            Deferrability::Exigent => true,
            Deferrability::Deferrable => designator.deferrable_interrupt_enabled(),
        }
    }
}

impl Display for MachineInterrupt {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{} ssf={:02o}", self.class, self.short_status)
    }
}

/// The set of interrupts raised but not yet delivered, at most one
/// per class, served lowest class code first.
#[derive(Debug, Default)]
pub struct PendingInterrupts {
    queue: KeyedReversePriorityQueue<InterruptClass, u8>,
    slots: std::collections::HashMap<InterruptClass, MachineInterrupt>,
}

impl PendingInterrupts {
    #[must_use]
    pub fn new() -> PendingInterrupts {
        PendingInterrupts {
            queue: KeyedReversePriorityQueue::new(),
            slots: std::collections::HashMap::new(),
        }
    }

    /// Queue an interrupt.  A later interrupt of the same class
    /// replaces the earlier one; interrupts of other classes are
    /// unaffected, so a non-fault condition never displaces a
    /// pending fault.
    pub fn raise(&mut self, interrupt: MachineInterrupt) {
        self.queue.push(interrupt.class, interrupt.class.code());
        self.slots.insert(interrupt.class, interrupt);
    }

    /// Remove and return the most urgent interrupt which may be
    /// delivered under the current designator state.
    pub fn take_deliverable(
        &mut self,
        designator: &DesignatorRegister,
    ) -> Option<MachineInterrupt> {
        // The queue orders by class code only; deferred entries stay
        // queued without blocking more urgent deliverable ones, so
        // scan in priority order.
        let mut deferred: Vec<(InterruptClass, u8)> = Vec::new();
        let mut found = None;
        while let Some((class, code)) = self.queue.pop() {
            let interrupt = self.slots[&class];
            if interrupt.is_deliverable(designator) {
                self.slots.remove(&class);
                found = Some(interrupt);
                break;
            }
            deferred.push((class, code));
        }
        for (class, code) in deferred {
            self.queue.push(class, code);
        }
        found
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    #[must_use]
    pub fn contains(&self, class: InterruptClass) -> bool {
        self.queue.contains_key(&class)
    }

    pub fn clear(&mut self) {
        self.queue.clear();
        self.slots.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn permissive_designator() -> DesignatorRegister {
        let mut dr = DesignatorRegister::default();
        dr.set_deferrable_interrupt_enabled(true);
        dr
    }

    #[test]
    fn test_class_codes_order_priority() {
        assert!(InterruptClass::HardwareCheck.code() < InterruptClass::ReferenceViolation.code());
        assert!(InterruptClass::InvalidInstruction.code() < InterruptClass::QuantumTimer.code());
    }

    #[test]
    fn test_lower_class_delivered_first() {
        let mut pending = PendingInterrupts::new();
        pending.raise(MachineInterrupt::quantum_timer());
        pending.raise(MachineInterrupt::invalid_instruction(
            InvalidInstructionReason::UndefinedFunctionCode,
        ));
        let dr = permissive_designator();
        let first = pending.take_deliverable(&dr).expect("two are pending");
        assert_eq!(first.class, InterruptClass::InvalidInstruction);
        let second = pending.take_deliverable(&dr).expect("one remains");
        assert_eq!(second.class, InterruptClass::QuantumTimer);
        assert!(pending.take_deliverable(&dr).is_none());
    }

    #[test]
    fn test_nonfault_does_not_displace_fault() {
        let mut pending = PendingInterrupts::new();
        pending.raise(MachineInterrupt::reference_violation(
            ReferenceViolationReason::StorageLimits,
            0o100,
            false,
        ));
        pending.raise(MachineInterrupt::quantum_timer());
        assert!(pending.contains(InterruptClass::ReferenceViolation));
        let dr = permissive_designator();
        assert_eq!(
            pending.take_deliverable(&dr).map(|i| i.class),
            Some(InterruptClass::ReferenceViolation)
        );
    }

    #[test]
    fn test_deferrable_interrupt_held_until_enabled() {
        let mut pending = PendingInterrupts::new();
        pending.raise(MachineInterrupt::quantum_timer());
        let mut dr = DesignatorRegister::default();
        assert!(pending.take_deliverable(&dr).is_none());
        assert!(pending.contains(InterruptClass::QuantumTimer));
        dr.set_deferrable_interrupt_enabled(true);
        assert_eq!(
            pending.take_deliverable(&dr).map(|i| i.class),
            Some(InterruptClass::QuantumTimer)
        );
    }

    #[test]
    fn test_exigent_delivered_while_deferred_held() {
        let mut pending = PendingInterrupts::new();
        pending.raise(MachineInterrupt::quantum_timer());
        pending.raise(MachineInterrupt::operation_trap());
        let dr = DesignatorRegister::default();
        assert_eq!(
            pending.take_deliverable(&dr).map(|i| i.class),
            Some(InterruptClass::OperationTrap)
        );
        // The deferrable one is still queued.
        assert!(pending.contains(InterruptClass::QuantumTimer));
    }

    #[test]
    fn test_same_class_replaces() {
        let mut pending = PendingInterrupts::new();
        pending.raise(MachineInterrupt::signal(1));
        pending.raise(MachineInterrupt::signal(2));
        let dr = permissive_designator();
        let taken = pending.take_deliverable(&dr).expect("pending");
        assert_eq!(taken.short_status, 2);
        assert!(pending.take_deliverable(&dr).is_none());
    }
}
