//! Host-side simulation of a board running two soft timer services off one
//! free-running counter.

pub mod app;
pub mod board;
pub mod trace;

pub use app::{Application, BlinkApp};
pub use board::{Board, COUNTS_PER_MS, FAST_CHANNEL, FAST_PERIOD, SLOW_CHANNEL, SLOW_PERIOD};
pub use trace::Trace;

use soft_timer_common::TimerFault;

#[derive(thiserror::Error, Debug)]
pub enum SimError {
    #[error("Blink interval must be at least one tick")]
    ZeroBlinkTicks,
    #[error("TimerFault({:?})", .0)]
    Fault(#[from] TimerFault),
    #[error("serde_json::Error {:?}", .0)]
    Json(#[from] serde_json::Error),
}
