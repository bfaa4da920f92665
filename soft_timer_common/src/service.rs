//! The software timer service for one cadence.
//!
//! A [`TimerService`] owns one compare channel and one soft timer table.
//! Foreground code calls [`reset`](TimerService::reset),
//! [`control`](TimerService::control), [`read`](TimerService::read) and
//! [`write`](TimerService::write); the interrupt vector calls
//! [`on_interrupt`](TimerService::on_interrupt). Two services with different
//! periods can share one counter as long as they use different channels.
//!
//! Foreground accesses mask the channel's own interrupt source for their
//! duration. The handler itself runs to completion and never masks.

use crate::channel::{Cadence, CompareRegisters, HardwareCompareChannel};
use crate::fault::{FaultSink, TimerFault};
use crate::gate::{InterruptGate, MaskGuard};
use crate::table::SoftTimerTable;

/// Argument to [`TimerService::control`].
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
#[repr(u16)]
pub enum ControlSetting {
    Start = 0,
    Stop = 1,
}

impl TryFrom<u16> for ControlSetting {
    type Error = TimerFault;

    fn try_from(raw: u16) -> Result<Self, Self::Error> {
        match raw {
            0 => Ok(ControlSetting::Start),
            1 => Ok(ControlSetting::Stop),
            _ => Err(TimerFault::InvalidControlSetting),
        }
    }
}

pub struct TimerService<R, G, F, const N: usize> {
    channel: HardwareCompareChannel<R>,
    table: SoftTimerTable<N>,
    gate: G,
    faults: F,
}

impl<R, G, F, const N: usize> TimerService<R, G, F, N>
where
    R: CompareRegisters,
    G: InterruptGate,
    F: FaultSink,
{
    /// Binds a channel to a fresh table. Nothing is written to the hardware
    /// until [`TimerService::reset`].
    pub fn new(registers: R, cadence: Cadence, gate: G, faults: F) -> Self {
        Self {
            channel: HardwareCompareChannel::new(registers, cadence),
            table: SoftTimerTable::new(),
            gate,
            faults,
        }
    }

    /// Idles every timer, re-arms the channel for its first match one period
    /// after counter zero, and enables it.
    ///
    /// Expects the counter to be running already.
    pub fn reset(&mut self) {
        let mut mask = MaskGuard::new(&self.gate, self.channel.source());
        self.channel.configure();
        self.table.reset();
        self.channel.set_enabled(&mask, true);
        mask.restore_to(true);

        debug!(
            "timer service (period {}) reset, {} slots",
            self.channel.period(),
            N
        );
    }

    /// Starts or stops interrupt generation. The table is left alone, so a
    /// stopped service freezes its countdowns and a restarted one resumes
    /// them.
    pub fn control(&mut self, setting: ControlSetting) {
        let mut mask = MaskGuard::new(&self.gate, self.channel.source());
        let enabled = match setting {
            ControlSetting::Start => true,
            ControlSetting::Stop => false,
        };
        self.channel.set_enabled(&mask, enabled);
        mask.restore_to(enabled);

        debug!(
            "timer service (period {}) control {:?}",
            self.channel.period(),
            setting
        );
    }

    /// [`TimerService::control`] with an undecoded setting. Unknown values
    /// are logged and otherwise ignored.
    pub fn control_raw(&mut self, raw: u16) {
        match ControlSetting::try_from(raw) {
            Ok(setting) => self.control(setting),
            Err(fault) => {
                warn!(
                    "timer service (period {}): unknown control setting {}",
                    self.channel.period(),
                    raw
                );
                self.faults.log_fault(fault);
            }
        }
    }

    /// Ticks left on `timer_id`.
    ///
    /// An id outside the table is logged and yields `None`; there is no
    /// default value to fall back on.
    pub fn read(&self, timer_id: usize) -> Option<u16> {
        let result = {
            let _mask = MaskGuard::new(&self.gate, self.channel.source());
            self.table.get(timer_id)
        };

        match result {
            Ok(ticks) => Some(ticks),
            Err(fault) => {
                warn!(
                    "timer service (period {}): read of timer {} outside {} slots",
                    self.channel.period(),
                    timer_id,
                    N
                );
                self.faults.log_fault(fault);
                None
            }
        }
    }

    /// Arms `timer_id` to expire after `ticks` matches of this channel.
    /// Writing zero idles it. An id outside the table is logged and nothing
    /// changes.
    pub fn write(&mut self, timer_id: usize, ticks: u16) {
        let result = {
            let _mask = MaskGuard::new(&self.gate, self.channel.source());
            self.table.set(timer_id, ticks)
        };

        if let Err(fault) = result {
            warn!(
                "timer service (period {}): write of timer {} outside {} slots",
                self.channel.period(),
                timer_id,
                N
            );
            self.faults.log_fault(fault);
        }
    }

    pub fn is_expired(&self, timer_id: usize) -> bool {
        self.read(timer_id) == Some(0)
    }

    /// Match handler body: re-arm, count every armed slot down once, clear
    /// the match flag. Interrupt context only.
    pub fn tick(&mut self) {
        self.channel.rearm();
        self.table.tick();
        self.channel.clear_pending();
    }

    /// Entry point for the interrupt vector.
    ///
    /// Several channels may share one vector, and the match flag is raised
    /// even while a channel is stopped, so this only ticks when the channel
    /// is enabled and its flag is set. Returns whether it ticked.
    pub fn on_interrupt(&mut self) -> bool {
        if !(self.channel.is_enabled() && self.channel.is_pending()) {
            return false;
        }
        self.tick();
        true
    }

    pub fn is_running(&self) -> bool {
        self.channel.is_enabled()
    }

    pub fn period(&self) -> u16 {
        self.channel.period()
    }

    pub const fn capacity(&self) -> usize {
        N
    }

    pub fn channel(&self) -> &HardwareCompareChannel<R> {
        &self.channel
    }

    pub fn table(&self) -> &SoftTimerTable<N> {
        &self.table
    }
}
