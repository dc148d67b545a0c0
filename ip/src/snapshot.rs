//! Serializable view of a processor's externally visible state, for
//! panels, debuggers and persisted dumps.

use serde::Serialize;

use base::prelude::*;

use crate::locks::UpiId;
use crate::proc::ProcessorState;
use crate::regfile::{DesignatorRegister, IndicatorKeyRegister, ProgramAddressRegister};

#[derive(Debug, Clone, Serialize)]
pub struct ProcessorSnapshot {
    pub upi: UpiId,
    pub state: ProcessorState,
    pub designator: DesignatorRegister,
    pub indicator_key: IndicatorKeyRegister,
    pub program_address: ProgramAddressRegister,
    pub general_registers: Vec<Word36>,
    pub quantum_timer: i64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::proc::StopReason;

    #[test]
    fn test_snapshot_serializes() {
        let snapshot = ProcessorSnapshot {
            upi: 3,
            state: ProcessorState::Stopped(StopReason::Initial),
            designator: DesignatorRegister::default(),
            indicator_key: IndicatorKeyRegister::default(),
            program_address: ProgramAddressRegister::new(0, 0o1000),
            general_registers: vec![Word36::ZERO; 4],
            quantum_timer: 500,
        };
        let json = serde_json::to_string(&snapshot).expect("snapshot serializes");
        assert!(json.contains("\"upi\":3"));
        assert!(json.contains("Initial"));
    }
}
