//! Fixed-size table of countdown timers.

use crate::fault::TimerFault;

/// Exclusive upper bound on the number of slots in one table.
pub const MAX_SOFT_TIMERS: usize = 16;

/// `N` countdown slots, each the number of ticks left before it expires.
///
/// A slot reading zero is idle (or expired). Only [`SoftTimerTable::tick`]
/// ever decrements, and never below zero.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SoftTimerTable<const N: usize> {
    slots: [u16; N],
}

impl<const N: usize> SoftTimerTable<N> {
    const SIZE_CHECK: () = assert!(N < MAX_SOFT_TIMERS, "soft timer table exceeds MAX_SOFT_TIMERS");

    pub const fn new() -> Self {
        #[allow(clippy::let_unit_value)]
        let () = Self::SIZE_CHECK;
        Self { slots: [0; N] }
    }

    pub fn reset(&mut self) {
        self.slots = [0; N];
    }

    pub fn get(&self, timer_id: usize) -> Result<u16, TimerFault> {
        self.slots.get(timer_id).copied().ok_or(TimerFault::InvalidTimerRead)
    }

    pub fn set(&mut self, timer_id: usize, ticks: u16) -> Result<(), TimerFault> {
        let slot = self.slots.get_mut(timer_id).ok_or(TimerFault::InvalidTimerWrite)?;
        *slot = ticks;
        Ok(())
    }

    pub fn tick(&mut self) {
        for slot in self.slots.iter_mut() {
            if *slot > 0 {
                *slot -= 1;
            }
        }
    }

    pub const fn len(&self) -> usize {
        N
    }

    pub const fn is_empty(&self) -> bool {
        N == 0
    }

    pub fn armed(&self) -> usize {
        self.slots.iter().filter(|&&ticks| ticks > 0).count()
    }

    pub fn iter(&self) -> impl Iterator<Item = u16> + '_ {
        self.slots.iter().copied()
    }
}

impl<const N: usize> Default for SoftTimerTable<N> {
    fn default() -> Self {
        Self::new()
    }
}
