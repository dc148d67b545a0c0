//! This crate emulates the instruction processor: registers, the
//! execution engine, interrupt machinery and its view of shared main
//! storage.
#![crate_name = "ip"]

mod clock;
mod dispatch;
mod interrupt;
mod locks;
mod proc;
mod regfile;
mod snapshot;
mod storage;

pub use clock::{DayClock, ManualDayClock, SystemDayClock};
pub use dispatch::{FunctionTableEntry, InstructionModes, Mnemonic};
pub use interrupt::{
    ConditionCategory, Deferrability, InterruptClass, InterruptPoint, InvalidInstructionReason,
    MachineInterrupt, PendingInterrupts, ReferenceViolationReason, Synchrony,
};
pub use locks::{LockContention, StorageLocks, UpiId};
pub use proc::{
    ExecFault, InstructionProcessor, ProcessorState, StopReason, BASE_REGISTER_COUNT,
    ICS_BASE_REGISTER, L0_BDT_BASE_REGISTER, RCS_BASE_REGISTER,
};
pub use regfile::{
    AccessInfo, AccessPermissions, BaseRegister, DesignatorRegister, GeneralRegisterSet,
    IndicatorKeyRegister, ProgramAddressRegister, GRS_SIZE, ICS_INDEX_REGISTER,
    RCS_INDEX_REGISTER,
};
pub use snapshot::ProcessorSnapshot;
pub use storage::{AbsoluteAddress, BankImage, MainStorage};
