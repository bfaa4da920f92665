use log::debug;
use soft_timer_common::{Level, PinConfig, PinController, PinId};

use crate::board::Board;

/// Slot on the slow service that paces the LED.
pub const LED_SOFT_TIMER: usize = 0;

/// Foreground code, polled once per simulated count.
pub trait Application {
    fn poll(&mut self, board: &mut Board<'_>);
}

/// Toggles an LED every time its soft timer runs out, then re-arms it.
#[derive(Debug)]
pub struct BlinkApp {
    led: PinId,
    blink_ticks: u16,
    toggles: u32,
}

impl BlinkApp {
    pub fn new(led: PinId, blink_ticks: u16) -> Self {
        Self {
            led,
            blink_ticks,
            toggles: 0,
        }
    }

    /// Drives the LED pin as an output. Call after the board boots.
    pub fn setup(&self, board: &mut Board<'_>) {
        board.ports.configure(self.led, PinConfig::Output);
        board.ports.write(self.led, Level::Low);
    }

    pub fn toggles(&self) -> u32 {
        self.toggles
    }

    pub fn led(&self) -> PinId {
        self.led
    }
}

impl Application for BlinkApp {
    fn poll(&mut self, board: &mut Board<'_>) {
        if !board.slow.is_expired(LED_SOFT_TIMER) {
            return;
        }

        board.ports.toggle(self.led);
        board.slow.write(LED_SOFT_TIMER, self.blink_ticks);
        self.toggles += 1;
        debug!(
            "LED {:?} toggled at count {}",
            board.ports.output(self.led),
            board.counts()
        );
    }
}
