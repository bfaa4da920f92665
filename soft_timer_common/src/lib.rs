#![cfg_attr(not(any(test, feature = "std")), no_std)]

//! Compare-match driven software timers.
//!
//! One free-running 16-bit hardware counter plus one compare channel per
//! cadence is turned into a fixed table of countdown timers. The interrupt
//! handler ([`TimerService::on_interrupt`]) re-arms the compare register and
//! decrements every armed slot; foreground code seeds and polls slots with
//! [`TimerService::write`] and [`TimerService::read`].

#[macro_use]
mod fmt;

pub mod channel;
pub mod fault;
pub mod gate;
pub mod pin;
pub mod service;
pub mod table;

#[cfg(feature = "mock")]
pub mod mock;

pub use channel::{next_compare, Cadence, CompareRegisters, HardwareCompareChannel, COUNTER_MAX, COUNTER_WIDTH};
pub use fault::{FaultLog, FaultSink, TimerFault, FAULT_LOG_CAPACITY};
pub use gate::{InterruptGate, InterruptSource, MaskGuard};
pub use pin::{Level, PinConfig, PinController, PinId, TOTAL_PINS};
pub use service::{ControlSetting, TimerService};
pub use table::{SoftTimerTable, MAX_SOFT_TIMERS};
