use serde::Serialize;
use soft_timer_common::{FaultLog, Level, PinController};

use crate::app::BlinkApp;
use crate::board::Board;

/// Summary of one simulation run.
#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct Trace {
    pub counts: u64,
    pub fast_ticks: u64,
    pub slow_ticks: u64,
    pub slow_running: bool,
    pub led_toggles: u32,
    pub led_level: Level,
    /// Codes in log slot order.
    pub faults: Vec<u16>,
}

impl Trace {
    pub fn capture(board: &Board<'_>, app: &BlinkApp) -> Self {
        let ticks = board.ticks();
        Self {
            counts: board.counts(),
            fast_ticks: ticks.fast,
            slow_ticks: ticks.slow,
            slow_running: board.slow.is_running(),
            led_toggles: app.toggles(),
            led_level: board.ports.output(app.led()),
            faults: fault_codes(board.faults),
        }
    }
}

fn fault_codes(faults: &FaultLog) -> Vec<u16> {
    faults.snapshot().iter().flatten().map(|fault| fault.code()).collect()
}
