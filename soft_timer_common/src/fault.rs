//! Fault codes and the bounded, deduplicating fault log.
//!
//! Nothing in this crate aborts on bad input. Out-of-range accesses and
//! unknown settings are absorbed at the operation boundary and reported
//! here instead, where foreground code can poll for them.

use core::cell::RefCell;

use critical_section::Mutex;
use thiserror_no_std::Error;

/// Number of distinct faults the log keeps before overwriting the oldest.
pub const FAULT_LOG_CAPACITY: usize = 5;

/// Every fault the timer core and its collaborators can report.
///
/// The numeric codes are stable and are what the log stores.
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Error, Debug, Copy, Clone, PartialEq, Eq)]
pub enum TimerFault {
    #[error("InvalidTimerRead")]
    InvalidTimerRead,
    #[error("InvalidTimerWrite")]
    InvalidTimerWrite,
    #[error("InvalidControlSetting")]
    InvalidControlSetting,
    #[error("InvalidInterruptId")]
    InvalidInterruptId,
    #[error("InvalidPinConfig")]
    InvalidPinConfig,
    #[error("InvalidPinId")]
    InvalidPinId,
}

impl TimerFault {
    pub const fn code(self) -> u16 {
        match self {
            TimerFault::InvalidTimerRead => 11,
            TimerFault::InvalidTimerWrite => 12,
            TimerFault::InvalidControlSetting => 13,
            TimerFault::InvalidInterruptId => 20,
            TimerFault::InvalidPinConfig => 100,
            TimerFault::InvalidPinId => 101,
        }
    }

    pub const fn from_code(code: u16) -> Option<Self> {
        match code {
            11 => Some(TimerFault::InvalidTimerRead),
            12 => Some(TimerFault::InvalidTimerWrite),
            13 => Some(TimerFault::InvalidControlSetting),
            20 => Some(TimerFault::InvalidInterruptId),
            100 => Some(TimerFault::InvalidPinConfig),
            101 => Some(TimerFault::InvalidPinId),
            _ => None,
        }
    }
}

/// Somewhere to report absorbed faults.
///
/// Takes `&self` so a single sink can be shared by every service, including
/// from interrupt context.
pub trait FaultSink {
    fn log_fault(&self, fault: TimerFault);
}

impl<T: FaultSink + ?Sized> FaultSink for &T {
    fn log_fault(&self, fault: TimerFault) {
        (**self).log_fault(fault)
    }
}

/// Code 0 marks an empty slot; no fault uses it.
const EMPTY: u16 = 0;

struct LogState<const N: usize> {
    entries: [u16; N],
    write_index: usize,
    count: usize,
    flagged: bool,
}

impl<const N: usize> LogState<N> {
    const fn new() -> Self {
        Self {
            entries: [EMPTY; N],
            write_index: 0,
            count: 0,
            flagged: false,
        }
    }
}

/// Circular log of fault codes.
///
/// A code already present is not logged again. A new code takes the first
/// empty slot; once full, it overwrites the oldest one. All access goes through a critical section so
/// the log can be written from interrupt handlers.
pub struct FaultLog<const N: usize = FAULT_LOG_CAPACITY> {
    state: Mutex<RefCell<LogState<N>>>,
}

impl<const N: usize> FaultLog<N> {
    pub const fn new() -> Self {
        Self {
            state: Mutex::new(RefCell::new(LogState::new())),
        }
    }

    pub fn init(&self) {
        critical_section::with(|cs| {
            *self.state.borrow(cs).borrow_mut() = LogState::new();
        });
    }

    pub fn count(&self) -> usize {
        critical_section::with(|cs| self.state.borrow(cs).borrow().count)
    }

    pub fn has_errors(&self) -> bool {
        critical_section::with(|cs| self.state.borrow(cs).borrow().flagged)
    }

    pub fn contains(&self, fault: TimerFault) -> bool {
        let code = fault.code();
        critical_section::with(|cs| self.state.borrow(cs).borrow().entries.contains(&code))
    }

    /// Removes every entry for `fault`.
    pub fn clear(&self, fault: TimerFault) {
        let code = fault.code();
        critical_section::with(|cs| {
            let mut state = self.state.borrow(cs).borrow_mut();
            for index in 0..N {
                if state.entries[index] == code {
                    state.entries[index] = EMPTY;
                    state.count = state.count.saturating_sub(1);
                    if state.count == 0 {
                        state.flagged = false;
                    }
                }
            }
        });
    }

    /// Copy of the log in slot order. Empty slots are `None`.
    pub fn snapshot(&self) -> [Option<TimerFault>; N] {
        critical_section::with(|cs| {
            let state = self.state.borrow(cs).borrow();
            let mut faults = [None; N];
            for (fault, &code) in faults.iter_mut().zip(state.entries.iter()) {
                *fault = TimerFault::from_code(code);
            }
            faults
        })
    }
}

impl<const N: usize> Default for FaultLog<N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const N: usize> FaultSink for FaultLog<N> {
    fn log_fault(&self, fault: TimerFault) {
        if N == 0 {
            return;
        }

        let code = fault.code();
        critical_section::with(|cs| {
            let mut state = self.state.borrow(cs).borrow_mut();
            if state.entries.contains(&code) {
                return;
            }

            // Cleared slots are reused before anything live is overwritten.
            let empty = state.entries.iter().position(|&entry| entry == EMPTY);
            let index = match empty {
                Some(index) => {
                    state.count += 1;
                    index
                }
                None => state.write_index,
            };
            state.entries[index] = code;
            state.write_index = (index + 1) % N;
            state.flagged = true;
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codes_round_trip() {
        for fault in [
            TimerFault::InvalidTimerRead,
            TimerFault::InvalidTimerWrite,
            TimerFault::InvalidControlSetting,
            TimerFault::InvalidInterruptId,
            TimerFault::InvalidPinConfig,
            TimerFault::InvalidPinId,
        ] {
            assert_eq!(TimerFault::from_code(fault.code()), Some(fault));
        }
        assert_eq!(TimerFault::from_code(0), None);
    }

    #[test]
    fn test_log_dedupes() {
        let log: FaultLog = FaultLog::new();
        assert!(!log.has_errors());

        log.log_fault(TimerFault::InvalidTimerRead);
        log.log_fault(TimerFault::InvalidTimerRead);

        assert_eq!(log.count(), 1);
        assert!(log.has_errors());
        assert!(log.contains(TimerFault::InvalidTimerRead));
    }

    #[test]
    fn test_log_overwrites_oldest_when_full() {
        let log: FaultLog<2> = FaultLog::new();
        log.log_fault(TimerFault::InvalidTimerRead);
        log.log_fault(TimerFault::InvalidTimerWrite);
        log.log_fault(TimerFault::InvalidControlSetting);

        assert_eq!(log.count(), 2);
        assert_eq!(
            log.snapshot(),
            [Some(TimerFault::InvalidControlSetting), Some(TimerFault::InvalidTimerWrite)]
        );
    }

    #[test]
    fn test_clear_drops_flag_when_empty() {
        let log: FaultLog = FaultLog::new();
        log.log_fault(TimerFault::InvalidPinId);
        log.log_fault(TimerFault::InvalidPinConfig);

        log.clear(TimerFault::InvalidPinId);
        assert_eq!(log.count(), 1);
        assert!(log.has_errors());

        log.clear(TimerFault::InvalidPinConfig);
        assert_eq!(log.count(), 0);
        assert!(!log.has_errors());
    }

    #[test]
    fn test_cleared_slot_reused_before_overwrite() {
        let log: FaultLog<2> = FaultLog::new();
        log.log_fault(TimerFault::InvalidTimerRead);
        log.log_fault(TimerFault::InvalidTimerWrite);
        log.clear(TimerFault::InvalidTimerWrite);
        log.log_fault(TimerFault::InvalidControlSetting);

        assert_eq!(
            log.snapshot(),
            [Some(TimerFault::InvalidTimerRead), Some(TimerFault::InvalidControlSetting)]
        );
        assert_eq!(log.count(), 2);

        log.clear(TimerFault::InvalidControlSetting);
        log.clear(TimerFault::InvalidTimerRead);
        assert_eq!(log.snapshot(), [None, None]);
        assert_eq!(log.count(), 0);
        assert!(!log.has_errors());
    }

    #[test]
    fn test_count_matches_live_entries() {
        let log: FaultLog = FaultLog::new();
        log.log_fault(TimerFault::InvalidPinId);
        log.log_fault(TimerFault::InvalidPinConfig);
        log.clear(TimerFault::InvalidPinId);
        log.log_fault(TimerFault::InvalidInterruptId);
        log.log_fault(TimerFault::InvalidTimerRead);

        let live = log.snapshot().iter().flatten().count();
        assert_eq!(log.count(), live);
        assert_eq!(live, 3);
    }

    #[test]
    fn test_init_empties_log() {
        let log: FaultLog = FaultLog::new();
        log.log_fault(TimerFault::InvalidInterruptId);
        log.init();

        assert_eq!(log.count(), 0);
        assert!(!log.has_errors());
        assert_eq!(log.snapshot(), [None; FAULT_LOG_CAPACITY]);
    }

    #[test]
    fn test_shared_through_reference() {
        let log: FaultLog = FaultLog::new();
        let sink = &log;
        sink.log_fault(TimerFault::InvalidTimerWrite);
        assert!(log.contains(TimerFault::InvalidTimerWrite));
    }
}
