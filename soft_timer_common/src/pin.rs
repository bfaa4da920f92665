//! Generic pin ids and the board pin controller interface.
//!
//! Application code names pins by a flat id. Boards split it into a port and
//! a pin within that port.

use core::ops::Not;

use crate::fault::TimerFault;

pub const PINS_PER_PORT: u8 = 8;
pub const PORT_COUNT: u8 = 2;
pub const TOTAL_PINS: u8 = PINS_PER_PORT * PORT_COUNT;

/// A pin id known to be in range.
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct PinId(u8);

impl PinId {
    pub const fn new(id: u8) -> Result<Self, TimerFault> {
        if id < TOTAL_PINS {
            Ok(Self(id))
        } else {
            Err(TimerFault::InvalidPinId)
        }
    }

    pub const fn id(self) -> u8 {
        self.0
    }

    /// `(port, pin)` with ports numbered from 1.
    pub const fn port_pin(self) -> (u8, u8) {
        (self.0 / PINS_PER_PORT + 1, self.0 % PINS_PER_PORT)
    }
}

impl TryFrom<u8> for PinId {
    type Error = TimerFault;

    fn try_from(id: u8) -> Result<Self, Self::Error> {
        PinId::new(id)
    }
}

#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
#[repr(u8)]
pub enum PinConfig {
    Output = 0,
    Input = 1,
    EnablePull = 2,
    DisablePull = 3,
}

impl TryFrom<u8> for PinConfig {
    type Error = TimerFault;

    fn try_from(raw: u8) -> Result<Self, Self::Error> {
        match raw {
            0 => Ok(PinConfig::Output),
            1 => Ok(PinConfig::Input),
            2 => Ok(PinConfig::EnablePull),
            3 => Ok(PinConfig::DisablePull),
            _ => Err(TimerFault::InvalidPinConfig),
        }
    }
}

#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub enum Level {
    #[default]
    Low,
    High,
}

impl Not for Level {
    type Output = Level;

    fn not(self) -> Level {
        match self {
            Level::Low => Level::High,
            Level::High => Level::Low,
        }
    }
}

impl From<bool> for Level {
    fn from(high: bool) -> Self {
        if high {
            Level::High
        } else {
            Level::Low
        }
    }
}

/// Direction, pull and level control for the board's pins.
pub trait PinController {
    /// Every pin to a driven-low output with pulls off.
    fn reset(&mut self);

    fn configure(&mut self, pin: PinId, config: PinConfig);

    fn write(&mut self, pin: PinId, level: Level);

    /// Level seen on the pin.
    fn read(&self, pin: PinId) -> Level;

    /// Level the pin is being driven to.
    fn output(&self, pin: PinId) -> Level;

    fn toggle(&mut self, pin: PinId) {
        let level = self.output(pin);
        self.write(pin, !level);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_port_pin_decode() {
        assert_eq!(PinId::new(0).map(PinId::port_pin), Ok((1, 0)));
        assert_eq!(PinId::new(7).map(PinId::port_pin), Ok((1, 7)));
        assert_eq!(PinId::new(8).map(PinId::port_pin), Ok((2, 0)));
        assert_eq!(PinId::new(13).map(PinId::port_pin), Ok((2, 5)));
        assert_eq!(PinId::new(TOTAL_PINS), Err(TimerFault::InvalidPinId));
    }

    #[test]
    fn test_pin_config_decoding() {
        assert_eq!(PinConfig::try_from(2), Ok(PinConfig::EnablePull));
        assert_eq!(PinConfig::try_from(4), Err(TimerFault::InvalidPinConfig));
    }

    #[test]
    fn test_level_not() {
        assert_eq!(!Level::Low, Level::High);
        assert_eq!(!Level::High, Level::Low);
        assert_eq!(Level::from(true), Level::High);
    }

    /// One port worth of output latches.
    #[derive(Default)]
    struct Latches([Level; TOTAL_PINS as usize]);

    impl PinController for Latches {
        fn reset(&mut self) {
            self.0 = [Level::Low; TOTAL_PINS as usize];
        }

        fn configure(&mut self, _pin: PinId, _config: PinConfig) {}

        fn write(&mut self, pin: PinId, level: Level) {
            self.0[pin.id() as usize] = level;
        }

        fn read(&self, pin: PinId) -> Level {
            self.0[pin.id() as usize]
        }

        fn output(&self, pin: PinId) -> Level {
            self.0[pin.id() as usize]
        }
    }

    #[test]
    fn test_toggle_flips_output() {
        let mut latches = Latches::default();
        let pin = PinId::new(3).unwrap();

        latches.toggle(pin);
        assert_eq!(latches.read(pin), Level::High);
        latches.toggle(pin);
        assert_eq!(latches.read(pin), Level::Low);
    }
}
