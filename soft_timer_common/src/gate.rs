//! Per-source interrupt masking.
//!
//! The timer core never touches the global interrupt enable. It only masks
//! the one source belonging to the channel it is reconfiguring, through an
//! [`InterruptGate`] provided by the board.

use crate::fault::TimerFault;

/// Highest pin number that can raise a port interrupt.
pub const MAX_PORT_SOURCE: u8 = 13;
pub const COMPARE_CHANNELS: u8 = 3;
pub const SOURCE_COUNT: usize = 18;

const COUNTER_OVERFLOW_ID: u8 = 14;
const COMPARE_BASE_ID: u8 = 15;

/// A named interrupt source.
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum InterruptSource {
    /// Edge interrupt on a generic pin id, `0..=MAX_PORT_SOURCE`.
    Port(u8),
    /// The free-running counter wrapped to zero.
    CounterOverflow,
    /// Compare match on channel `0..COMPARE_CHANNELS`.
    CompareMatch(u8),
}

impl InterruptSource {
    /// Numeric source id. Port pins map to 0..=13, overflow to 14 and the
    /// compare channels to 15..=17.
    pub const fn id(self) -> u8 {
        match self {
            InterruptSource::Port(pin) => pin,
            InterruptSource::CounterOverflow => COUNTER_OVERFLOW_ID,
            InterruptSource::CompareMatch(channel) => COMPARE_BASE_ID + channel,
        }
    }

    /// `id()` as a table index, or `None` for a source that does not exist
    /// on this counter.
    pub const fn index(self) -> Option<usize> {
        match self {
            InterruptSource::Port(pin) if pin > MAX_PORT_SOURCE => None,
            InterruptSource::CompareMatch(channel) if channel >= COMPARE_CHANNELS => None,
            source => Some(source.id() as usize),
        }
    }
}

impl TryFrom<u8> for InterruptSource {
    type Error = TimerFault;

    fn try_from(id: u8) -> Result<Self, Self::Error> {
        match id {
            0..=MAX_PORT_SOURCE => Ok(InterruptSource::Port(id)),
            COUNTER_OVERFLOW_ID => Ok(InterruptSource::CounterOverflow),
            id if id >= COMPARE_BASE_ID && id < COMPARE_BASE_ID + COMPARE_CHANNELS => {
                Ok(InterruptSource::CompareMatch(id - COMPARE_BASE_ID))
            }
            _ => Err(TimerFault::InvalidInterruptId),
        }
    }
}

/// Enables and disables individual interrupt sources.
///
/// Methods take `&self`: implementations write hardware registers, and one
/// gate is shared by every service on the counter.
pub trait InterruptGate {
    fn enable(&self, source: InterruptSource);
    fn disable(&self, source: InterruptSource);
    fn is_enabled(&self, source: InterruptSource) -> bool;
}

impl<G: InterruptGate + ?Sized> InterruptGate for &G {
    fn enable(&self, source: InterruptSource) {
        (**self).enable(source)
    }

    fn disable(&self, source: InterruptSource) {
        (**self).disable(source)
    }

    fn is_enabled(&self, source: InterruptSource) -> bool {
        (**self).is_enabled(source)
    }
}

/// Masks one source for as long as the guard lives.
///
/// On drop the source is re-enabled if it was enabled when the guard was
/// taken, unless [`MaskGuard::restore_to`] picked a different final state.
/// Holding a guard is also the proof [`crate::HardwareCompareChannel::set_enabled`]
/// asks for.
#[must_use = "the source is unmasked as soon as the guard is dropped"]
pub struct MaskGuard<'a, G: InterruptGate + ?Sized> {
    gate: &'a G,
    source: InterruptSource,
    restore: bool,
}

impl<'a, G: InterruptGate + ?Sized> MaskGuard<'a, G> {
    pub fn new(gate: &'a G, source: InterruptSource) -> Self {
        let restore = gate.is_enabled(source);
        gate.disable(source);
        Self {
            gate,
            source,
            restore,
        }
    }

    pub fn source(&self) -> InterruptSource {
        self.source
    }

    /// Chooses whether the source ends up enabled once the guard drops.
    pub fn restore_to(&mut self, enabled: bool) {
        self.restore = enabled;
    }
}

impl<G: InterruptGate + ?Sized> Drop for MaskGuard<'_, G> {
    fn drop(&mut self) {
        if self.restore {
            self.gate.enable(self.source);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core::cell::Cell;

    /// Records the enable bit of a single source and how often it changed.
    struct TestGate {
        enabled: Cell<bool>,
        writes: Cell<u32>,
    }

    impl TestGate {
        fn new(enabled: bool) -> Self {
            Self {
                enabled: Cell::new(enabled),
                writes: Cell::new(0),
            }
        }
    }

    impl InterruptGate for TestGate {
        fn enable(&self, _source: InterruptSource) {
            self.enabled.set(true);
            self.writes.set(self.writes.get() + 1);
        }

        fn disable(&self, _source: InterruptSource) {
            self.enabled.set(false);
            self.writes.set(self.writes.get() + 1);
        }

        fn is_enabled(&self, _source: InterruptSource) -> bool {
            self.enabled.get()
        }
    }

    #[test]
    fn test_source_ids() {
        assert_eq!(InterruptSource::Port(7).id(), 7);
        assert_eq!(InterruptSource::CounterOverflow.id(), 14);
        assert_eq!(InterruptSource::CompareMatch(0).id(), 15);
        assert_eq!(InterruptSource::CompareMatch(2).id(), 17);

        assert_eq!(InterruptSource::try_from(16), Ok(InterruptSource::CompareMatch(1)));
        assert_eq!(InterruptSource::try_from(13), Ok(InterruptSource::Port(13)));
        assert_eq!(InterruptSource::try_from(18), Err(TimerFault::InvalidInterruptId));
    }

    #[test]
    fn test_index_rejects_missing_sources() {
        assert_eq!(InterruptSource::Port(14).index(), None);
        assert_eq!(InterruptSource::CompareMatch(3).index(), None);
        assert_eq!(InterruptSource::CompareMatch(1).index(), Some(16));
    }

    #[test]
    fn test_guard_restores_enabled_source() {
        let gate = TestGate::new(true);
        {
            let guard = MaskGuard::new(&gate, InterruptSource::CompareMatch(0));
            assert!(!gate.enabled.get());
            assert_eq!(guard.source(), InterruptSource::CompareMatch(0));
        }
        assert!(gate.enabled.get());
    }

    #[test]
    fn test_guard_leaves_disabled_source_masked() {
        let gate = TestGate::new(false);
        drop(MaskGuard::new(&gate, InterruptSource::CompareMatch(1)));
        assert!(!gate.enabled.get());
        // Only the masking write; nothing to restore.
        assert_eq!(gate.writes.get(), 1);
    }

    #[test]
    fn test_restore_to_overrides_prior_state() {
        let gate = TestGate::new(true);
        {
            let mut guard = MaskGuard::new(&gate, InterruptSource::CompareMatch(0));
            guard.restore_to(false);
        }
        assert!(!gate.enabled.get());

        {
            let mut guard = MaskGuard::new(&gate, InterruptSource::CompareMatch(0));
            guard.restore_to(true);
        }
        assert!(gate.enabled.get());
    }
}
