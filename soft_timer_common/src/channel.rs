//! One compare channel of the free-running counter.
//!
//! The counter is never stopped or cleared. Each channel keeps its own
//! cadence by moving its compare register forward by `period` counts every
//! time it matches, wrapping past zero when the register would overflow.

use core::num::NonZeroU16;

use crate::gate::{InterruptGate, InterruptSource, MaskGuard};

pub const COUNTER_WIDTH: u32 = 16;
pub const COUNTER_MAX: u16 = u16::MAX;

/// Register-level access to one compare channel.
///
/// Boards implement this over their peripheral; the mock implements it over
/// simulated registers.
pub trait CompareRegisters {
    fn source(&self) -> InterruptSource;

    fn compare(&self) -> u16;
    fn set_compare(&mut self, value: u16);

    /// Match flag. Hardware sets it on every match, even with the channel's
    /// interrupt generation turned off.
    fn is_pending(&self) -> bool;
    fn clear_pending(&mut self);

    fn interrupt_enabled(&self) -> bool;
    fn set_interrupt_enabled(&mut self, enabled: bool);
}

/// Number of counter ticks between two matches of a channel.
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct Cadence {
    period: NonZeroU16,
}

impl Cadence {
    /// `None` for a zero period, which would never advance the compare value.
    pub const fn new(period: u16) -> Option<Self> {
        match NonZeroU16::new(period) {
            Some(period) => Some(Self { period }),
            None => None,
        }
    }

    pub const fn period(self) -> u16 {
        self.period.get()
    }
}

/// Compare value for the match after the one at `current`.
///
/// `headroom` is how far `current` sits below [`COUNTER_MAX`]. While the next
/// match fits above `current` it is simply `current + period`; otherwise the
/// compare value wraps to `period - headroom`. A re-arm that wraps lands one
/// count later than `period` after the previous match.
pub const fn next_compare(current: u16, period: u16) -> u16 {
    let headroom = COUNTER_MAX - current;
    if headroom > period {
        current + period
    } else {
        period - headroom
    }
}

pub struct HardwareCompareChannel<R> {
    registers: R,
    cadence: Cadence,
}

impl<R: CompareRegisters> HardwareCompareChannel<R> {
    pub fn new(registers: R, cadence: Cadence) -> Self {
        Self { registers, cadence }
    }

    /// Puts the channel in its reset state: interrupt generation off, match
    /// flag cleared and the first match `period` counts after counter zero.
    pub fn configure(&mut self) {
        self.registers.set_interrupt_enabled(false);
        self.registers.clear_pending();
        self.registers.set_compare(self.cadence.period());
    }

    /// Moves the compare register to the next match. Called once per match
    /// from the interrupt handler; returns the new compare value.
    pub fn rearm(&mut self) -> u16 {
        let next = next_compare(self.registers.compare(), self.cadence.period());
        self.registers.set_compare(next);
        next
    }

    /// Turns interrupt generation on or off.
    ///
    /// The guard proves the channel's own source is masked while the
    /// register changes, so a match cannot fire against a half-updated
    /// channel.
    pub fn set_enabled<G: InterruptGate + ?Sized>(&mut self, masked: &MaskGuard<'_, G>, enabled: bool) {
        debug_assert_eq!(masked.source(), self.registers.source());
        self.registers.set_interrupt_enabled(enabled);
    }

    pub fn is_enabled(&self) -> bool {
        self.registers.interrupt_enabled()
    }

    pub fn is_pending(&self) -> bool {
        self.registers.is_pending()
    }

    pub fn clear_pending(&mut self) {
        self.registers.clear_pending();
    }

    pub fn compare_value(&self) -> u16 {
        self.registers.compare()
    }

    pub fn period(&self) -> u16 {
        self.cadence.period()
    }

    pub fn cadence(&self) -> Cadence {
        self.cadence
    }

    pub fn source(&self) -> InterruptSource {
        self.registers.source()
    }

    pub fn registers(&self) -> &R {
        &self.registers
    }

    pub fn registers_mut(&mut self) -> &mut R {
        &mut self.registers
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core::cell::Cell;

    #[derive(Default)]
    struct TestRegisters {
        compare: u16,
        pending: bool,
        enabled: bool,
    }

    impl CompareRegisters for TestRegisters {
        fn source(&self) -> InterruptSource {
            InterruptSource::CompareMatch(1)
        }

        fn compare(&self) -> u16 {
            self.compare
        }

        fn set_compare(&mut self, value: u16) {
            self.compare = value;
        }

        fn is_pending(&self) -> bool {
            self.pending
        }

        fn clear_pending(&mut self) {
            self.pending = false;
        }

        fn interrupt_enabled(&self) -> bool {
            self.enabled
        }

        fn set_interrupt_enabled(&mut self, enabled: bool) {
            self.enabled = enabled;
        }
    }

    struct OpenGate(Cell<bool>);

    impl InterruptGate for OpenGate {
        fn enable(&self, _source: InterruptSource) {
            self.0.set(true);
        }

        fn disable(&self, _source: InterruptSource) {
            self.0.set(false);
        }

        fn is_enabled(&self, _source: InterruptSource) -> bool {
            self.0.get()
        }
    }

    fn distance(from: u16, to: u16) -> u16 {
        to.wrapping_sub(from)
    }

    #[test]
    fn test_zero_period_rejected() {
        assert_eq!(Cadence::new(0), None);
        assert_eq!(Cadence::new(10_000).map(Cadence::period), Some(10_000));
    }

    #[test]
    fn test_next_compare_without_wrap() {
        assert_eq!(next_compare(0, 1_000), 1_000);
        assert_eq!(next_compare(40_000, 10_000), 50_000);
        assert_eq!(next_compare(COUNTER_MAX - 10_001, 10_000), COUNTER_MAX - 1);
    }

    #[test]
    fn test_next_compare_across_wrap() {
        // Headroom of 7 below the top of the counter.
        let previous = 0xFFF8;
        let next = next_compare(previous, 10_000);
        assert_eq!(next, 9_993);
        assert_eq!(distance(previous, next), 10_001);

        // Headroom equal to the period takes the wrapping branch.
        assert_eq!(next_compare(COUNTER_MAX - 10_000, 10_000), 0);
        assert_eq!(next_compare(COUNTER_MAX, 1), 1);
        assert_eq!(next_compare(COUNTER_MAX, 1_000), 1_000);
    }

    #[test]
    fn test_wrapping_rearm_adds_one_count() {
        for period in [1u16, 7, 1_000, 10_000, 40_000] {
            let mut compare = period;
            for _ in 0..200 {
                let next = next_compare(compare, period);
                let expected = if COUNTER_MAX - compare > period { period } else { period + 1 };
                assert_eq!(distance(compare, next), expected);
                compare = next;
            }
        }
    }

    #[test]
    fn test_configure_loads_period() {
        let mut channel = HardwareCompareChannel::new(
            TestRegisters {
                compare: 1234,
                pending: true,
                enabled: true,
            },
            Cadence::new(10_000).unwrap(),
        );
        channel.configure();

        assert_eq!(channel.compare_value(), 10_000);
        assert!(!channel.is_pending());
        assert!(!channel.is_enabled());
    }

    #[test]
    fn test_rearm_advances_one_period() {
        let mut channel = HardwareCompareChannel::new(TestRegisters::default(), Cadence::new(10_000).unwrap());
        channel.configure();

        assert_eq!(channel.rearm(), 20_000);
        assert_eq!(channel.rearm(), 30_000);
    }

    #[test]
    fn test_set_enabled_under_mask() {
        let gate = OpenGate(Cell::new(true));
        let mut channel = HardwareCompareChannel::new(TestRegisters::default(), Cadence::new(1_000).unwrap());

        {
            let mask = MaskGuard::new(&gate, channel.source());
            assert!(!gate.0.get());
            channel.set_enabled(&mask, true);
        }

        assert!(channel.is_enabled());
        assert!(gate.0.get());
    }
}
