use thiserror_no_std::Error;

use nrf52810_hal::{clocks, pac};
use nrf52810_hal::pac::timer1::{bitmode as timer_bitmode, mode as timer_mode};

use soft_timer_common::{
    CompareRegisters, InterruptGate, InterruptSource, Level, PinConfig, PinController, PinId, TimerFault,
};

use crate::config::{FAST_CHANNEL, LED_PIN, P0_PIN_MAP, SLOW_CHANNEL, TIMER_PRESCALER};

#[derive(Error, Debug, defmt::Format)]
pub enum SetupError {
    #[error("PeripheralAccess")]
    PeripheralAccess,
    #[error("InvalidPin({:?})", .0)]
    InvalidPin(#[from] TimerFault),
}

/// Every peripheral the application uses, configured and split into the
/// pieces the timer services and the foreground own.
pub struct Board {
    pub fast_channel: Timer1Channel,
    pub slow_channel: Timer1Channel,
    pub gate: Timer1Gate,
    pub pins: P0Pins,
    pub led: PinId,
}

impl Board {
    /// Takes the peripherals and configures them.
    ///
    /// TIMER1 is consumed here and never handed out again. The two channel
    /// handles and the gate built below are its only users from then on,
    /// and each touches nothing but its own CC, EVENTS_COMPARE and INTEN
    /// bits, so they reach the register block through `timer1()` without
    /// holding the owned peripheral. Only one `Board` can ever exist.
    pub fn take() -> Result<Self, SetupError> {
        let p = pac::Peripherals::take().ok_or(SetupError::PeripheralAccess)?;
        let led = PinId::new(LED_PIN)?;

        setup_clocks(p.CLOCK);
        setup_counter(p.TIMER1);

        Ok(Self {
            fast_channel: Timer1Channel { index: FAST_CHANNEL },
            slow_channel: Timer1Channel { index: SLOW_CHANNEL },
            gate: Timer1Gate { _private: () },
            pins: P0Pins { p0: p.P0 },
            led,
        })
    }
}

/// Start the external high-frequency oscillator so the counter keeps accurate
/// time. The clocks stay running when the handle is dropped.
fn setup_clocks(clock: pac::CLOCK) {
    let _ = clocks::Clocks::new(clock).enable_ext_hfosc();
}

/// Configure TIMER1 as the free-running 16-bit counter:
///  - Timer mode, clocked at 16MHz / 2^TIMER_PRESCALER
///  - 16-bit width, so it rolls over from 0xFFFF to 0
///  - No shortcuts: a compare match never clears or stops the counter
///  - All compare interrupts off until a service enables its channel
fn setup_counter(timer1: pac::TIMER1) {
    // The higher-level Timer HAL clears the counter on compare, so we must get nasty with the PAC
    timer1.tasks_stop.write(|w| w.tasks_stop().set_bit());
    timer1.mode.write(|w| w.mode().variant(timer_mode::MODE_A::TIMER));
    timer1.bitmode.write(|w| w.bitmode().variant(timer_bitmode::BITMODE_A::_16BIT));
    timer1.prescaler.write(|w| unsafe { w.prescaler().bits(TIMER_PRESCALER) });
    timer1.shorts.reset();
    timer1.intenclr.write(|w| unsafe { w.bits(u32::MAX) });
    for event in timer1.events_compare.iter() {
        event.reset();
    }
    timer1.tasks_clear.write(|w| w.tasks_clear().set_bit());
    timer1.tasks_start.write(|w| w.tasks_start().set_bit());
}

fn timer1() -> &'static pac::timer1::RegisterBlock {
    // See `Board::take`.
    unsafe { &*pac::TIMER1::ptr() }
}

/// INTENSET/INTENCLR bit for compare channel `index`.
const fn compare_bit(index: u8) -> u32 {
    1 << (16 + index as u32)
}

/// One compare channel of TIMER1.
pub struct Timer1Channel {
    index: u8,
}

impl CompareRegisters for Timer1Channel {
    fn source(&self) -> InterruptSource {
        InterruptSource::CompareMatch(self.index)
    }

    fn compare(&self) -> u16 {
        timer1().cc[self.index as usize].read().bits() as u16
    }

    fn set_compare(&mut self, value: u16) {
        timer1().cc[self.index as usize].write(|w| unsafe { w.bits(value as u32) });
    }

    fn is_pending(&self) -> bool {
        timer1().events_compare[self.index as usize].read().bits() != 0
    }

    fn clear_pending(&mut self) {
        timer1().events_compare[self.index as usize].reset();
    }

    fn interrupt_enabled(&self) -> bool {
        timer1().intenset.read().bits() & compare_bit(self.index) != 0
    }

    fn set_interrupt_enabled(&mut self, enabled: bool) {
        let bit = compare_bit(self.index);
        if enabled {
            timer1().intenset.write(|w| unsafe { w.bits(bit) });
        } else {
            timer1().intenclr.write(|w| unsafe { w.bits(bit) });
        }
    }
}

/// Per-channel masking for TIMER1.
///
/// Both cadences share the TIMER1 vector, so masking in the NVIC would
/// silence the other service too. The INTEN bit of each compare channel is
/// the only per-source mask this peripheral has, which makes it the same bit
/// as the channel's own interrupt enable. Sources other than TIMER1 compare
/// channels are ignored.
#[derive(Clone, Copy)]
pub struct Timer1Gate {
    _private: (),
}

impl InterruptGate for Timer1Gate {
    fn enable(&self, source: InterruptSource) {
        if let InterruptSource::CompareMatch(index) = source {
            timer1().intenset.write(|w| unsafe { w.bits(compare_bit(index)) });
        }
    }

    fn disable(&self, source: InterruptSource) {
        if let InterruptSource::CompareMatch(index) = source {
            timer1().intenclr.write(|w| unsafe { w.bits(compare_bit(index)) });
        }
    }

    fn is_enabled(&self, source: InterruptSource) -> bool {
        match source {
            InterruptSource::CompareMatch(index) => timer1().intenset.read().bits() & compare_bit(index) != 0,
            _ => false,
        }
    }
}

/// The generic pins, mapped onto port 0 through `P0_PIN_MAP`.
pub struct P0Pins {
    p0: pac::P0,
}

impl P0Pins {
    fn mask(pin: PinId) -> (usize, u32) {
        let number = P0_PIN_MAP[pin.id() as usize] as usize;
        (number, 1 << number)
    }
}

impl PinController for P0Pins {
    fn reset(&mut self) {
        for pin in P0_PIN_MAP.iter().map(|&number| number as usize) {
            self.p0.outclr.write(|w| unsafe { w.bits(1 << pin) });
            self.p0.pin_cnf[pin].write(|w| w.dir().output().input().connect().pull().disabled());
        }
    }

    fn configure(&mut self, pin: PinId, config: PinConfig) {
        let (number, _) = Self::mask(pin);
        let cnf = &self.p0.pin_cnf[number];
        match config {
            PinConfig::Output => cnf.modify(|_, w| w.dir().output()),
            PinConfig::Input => cnf.modify(|_, w| w.dir().input()),
            PinConfig::EnablePull => cnf.modify(|_, w| w.pull().pullup()),
            PinConfig::DisablePull => cnf.modify(|_, w| w.pull().disabled()),
        }
    }

    fn write(&mut self, pin: PinId, level: Level) {
        let (_, mask) = Self::mask(pin);
        match level {
            Level::High => self.p0.outset.write(|w| unsafe { w.bits(mask) }),
            Level::Low => self.p0.outclr.write(|w| unsafe { w.bits(mask) }),
        }
    }

    fn read(&self, pin: PinId) -> Level {
        let (_, mask) = Self::mask(pin);
        Level::from(self.p0.in_.read().bits() & mask != 0)
    }

    fn output(&self, pin: PinId) -> Level {
        let (_, mask) = Self::mask(pin);
        Level::from(self.p0.out.read().bits() & mask != 0)
    }
}
