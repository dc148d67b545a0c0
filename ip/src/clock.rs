//! The day clock, an injected time source used by the clock
//! instruction family.

use std::time::{SystemTime, UNIX_EPOCH};

/// Supplies microseconds-since-epoch to the clock-read instruction
/// and accepts updates from the (privileged) clock-set instruction.
pub trait DayClock {
    fn microseconds(&self) -> u64;

    fn set_microseconds(&mut self, value: u64);
}

/// A manually advanced clock, useful for deterministic emulation and
/// tests.
#[derive(Debug, Default)]
pub struct ManualDayClock {
    now: u64,
}

impl ManualDayClock {
    #[must_use]
    pub fn new() -> ManualDayClock {
        ManualDayClock::default()
    }

    pub fn advance(&mut self, micros: u64) {
        self.now += micros;
    }
}

impl DayClock for ManualDayClock {
    fn microseconds(&self) -> u64 {
        self.now
    }

    fn set_microseconds(&mut self, value: u64) {
        self.now = value;
    }
}

/// Tracks host wall-clock time, with a settable offset so the guest
/// may adjust its notion of the epoch.
#[derive(Debug, Default)]
pub struct SystemDayClock {
    offset: i64,
}

impl SystemDayClock {
    #[must_use]
    pub fn new() -> SystemDayClock {
        SystemDayClock::default()
    }

    fn host_micros() -> u64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map_or(0, |d| d.as_micros() as u64)
    }
}

impl DayClock for SystemDayClock {
    fn microseconds(&self) -> u64 {
        Self::host_micros().saturating_add_signed(self.offset)
    }

    fn set_microseconds(&mut self, value: u64) {
        self.offset = value as i64 - Self::host_micros() as i64;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_manual_clock_advances() {
        let mut clock = ManualDayClock::new();
        assert_eq!(clock.microseconds(), 0);
        clock.advance(250);
        assert_eq!(clock.microseconds(), 250);
        clock.set_microseconds(100);
        assert_eq!(clock.microseconds(), 100);
    }

    #[test]
    fn test_system_clock_honours_set() {
        let mut clock = SystemDayClock::new();
        clock.set_microseconds(1_000_000);
        let now = clock.microseconds();
        // Within a second of the value just set.
        assert!((1_000_000..2_000_000).contains(&now));
    }
}
