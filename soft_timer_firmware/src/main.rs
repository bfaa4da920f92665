#![no_main]
#![no_std]

mod config;
mod setup;

use rtic::app;
use cortex_m::asm;

use defmt_rtt as _;
use panic_probe as _;

use nrf52810_hal as hal;
use hal::pac;

use soft_timer_common::{Cadence, FaultLog, TimerService};

/// Faults absorbed by either service. Polled from idle.
static FAULTS: FaultLog = FaultLog::new();

const fn cadence(period: u16) -> Cadence {
    match Cadence::new(period) {
        Some(cadence) => cadence,
        None => panic!("cadence period must be non-zero"),
    }
}

const FAST_CADENCE: Cadence = cadence(config::FAST_PERIOD);
const SLOW_CADENCE: Cadence = cadence(config::SLOW_PERIOD);

#[app(device = pac, peripherals = false)]
mod app {
    use super::*;
    use defmt::{debug, info, unwrap, warn};
    use rtic::mutex_prelude::*;
    use soft_timer_common::{Level, PinConfig, PinController, PinId};

    use crate::config::{
        FAST_PERIOD, FAST_SLOTS, LED_BLINK_TICKS, LED_SOFT_TIMER, SLOW_PERIOD, SLOW_SLOTS,
    };
    use crate::setup::{Board, P0Pins, Timer1Channel, Timer1Gate};

    type Service<const N: usize> = TimerService<Timer1Channel, Timer1Gate, &'static FaultLog, N>;

    #[shared]
    struct Shared {
        fast: Service<FAST_SLOTS>,
        slow: Service<SLOW_SLOTS>,
    }

    #[local]
    struct Local {
        pins: P0Pins,
        led: PinId,
    }

    #[init]
    fn init(_cx: init::Context) -> (Shared, Local) {
        let board = unwrap!(Board::take());

        let mut fast = TimerService::new(board.fast_channel, FAST_CADENCE, board.gate, &FAULTS);
        let mut slow = TimerService::new(board.slow_channel, SLOW_CADENCE, board.gate, &FAULTS);
        let mut pins = board.pins;

        FAULTS.init();
        slow.reset();
        fast.reset();
        pins.reset();
        info!("Timer services up: {} and {} counts", FAST_PERIOD, SLOW_PERIOD);

        (Shared { fast, slow }, Local { pins, led: board.led })
    }

    #[idle(shared = [slow], local = [pins, led])]
    fn idle(mut cx: idle::Context) -> ! {
        let pins: &mut P0Pins = cx.local.pins;
        let led: PinId = *cx.local.led;
        pins.configure(led, PinConfig::Output);
        pins.write(led, Level::Low);

        loop {
            let expired = cx.shared.slow.lock(|slow| slow.is_expired(LED_SOFT_TIMER));
            if expired {
                pins.toggle(led);
                cx.shared.slow.lock(|slow| slow.write(LED_SOFT_TIMER, LED_BLINK_TICKS));
                debug!("LED toggled");
            }

            if FAULTS.has_errors() {
                warn!("Faults logged: {}", FAULTS.snapshot());
                FAULTS.init();
            }

            asm::wfi();
        }
    }

    /// Both compare channels share this vector; each service only ticks when
    /// its own channel matched.
    #[task(binds = TIMER1, shared = [fast, slow])]
    fn timer1(cx: timer1::Context) {
        (cx.shared.fast, cx.shared.slow).lock(|fast, slow| {
            fast.on_interrupt();
            slow.on_interrupt();
        });
    }
}
