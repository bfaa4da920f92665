//! Simulated counter, interrupt controller and pin ports.
//!
//! The counter and its controller share one state block; the handles given
//! out by [`MockTimerA`] are cheap clones onto it, so a test can keep poking
//! the hardware while services own their channels.

use std::cell::RefCell;
use std::rc::Rc;

use crate::channel::CompareRegisters;
use crate::gate::{InterruptGate, InterruptSource, COMPARE_CHANNELS, SOURCE_COUNT};
use crate::pin::{Level, PinConfig, PinController, PinId, PORT_COUNT};

const CHANNELS: usize = COMPARE_CHANNELS as usize;

#[derive(Debug, Default, Clone, Copy)]
struct CompareState {
    ccr: u16,
    ccie: bool,
    ccifg: bool,
}

#[derive(Debug)]
struct TimerAState {
    tar: u16,
    running: bool,
    channels: [CompareState; CHANNELS],
    unmasked: [bool; SOURCE_COUNT],
}

/// A 16-bit free-running counter with three compare channels.
///
/// The counter starts at zero, running, with every source unmasked.
#[derive(Debug, Clone)]
pub struct MockTimerA {
    state: Rc<RefCell<TimerAState>>,
}

impl MockTimerA {
    pub fn new() -> Self {
        Self {
            state: Rc::new(RefCell::new(TimerAState {
                tar: 0,
                running: true,
                channels: [CompareState::default(); CHANNELS],
                unmasked: [true; SOURCE_COUNT],
            })),
        }
    }

    /// Register handle for compare channel `index`.
    ///
    /// # Panics
    ///
    /// If `index` is not a channel of this counter.
    pub fn channel(&self, index: u8) -> MockCompareChannel {
        assert!(index < COMPARE_CHANNELS, "no compare channel {index}");
        MockCompareChannel {
            state: Rc::clone(&self.state),
            index,
        }
    }

    pub fn interrupt_controller(&self) -> MockInterruptController {
        MockInterruptController {
            state: Rc::clone(&self.state),
        }
    }

    pub fn counter(&self) -> u16 {
        self.state.borrow().tar
    }

    /// Jumps the counter without raising any match.
    pub fn set_counter(&self, value: u16) {
        self.state.borrow_mut().tar = value;
    }

    pub fn set_running(&self, running: bool) {
        self.state.borrow_mut().running = running;
    }

    /// One count. Every channel whose compare register equals the new counter
    /// value gets its match flag set, whatever its interrupt enable says.
    pub fn step(&self) {
        let mut state = self.state.borrow_mut();
        if !state.running {
            return;
        }
        state.tar = state.tar.wrapping_add(1);
        let tar = state.tar;
        for channel in state.channels.iter_mut() {
            if channel.ccr == tar {
                channel.ccifg = true;
            }
        }
    }

    pub fn advance(&self, counts: u32) {
        for _ in 0..counts {
            self.step();
        }
    }

    /// Channels that would enter the interrupt vector right now: flag set,
    /// interrupt enabled and source unmasked.
    pub fn deliverable(&self) -> Vec<u8> {
        let state = self.state.borrow();
        (0..COMPARE_CHANNELS)
            .filter(|&index| {
                let channel = &state.channels[index as usize];
                let source = InterruptSource::CompareMatch(index);
                let unmasked = source.index().map_or(false, |slot| state.unmasked[slot]);
                channel.ccifg && channel.ccie && unmasked
            })
            .collect()
    }
}

impl Default for MockTimerA {
    fn default() -> Self {
        Self::new()
    }
}

/// Handle onto one compare channel of a [`MockTimerA`].
#[derive(Debug, Clone)]
pub struct MockCompareChannel {
    state: Rc<RefCell<TimerAState>>,
    index: u8,
}

impl MockCompareChannel {
    fn with<T>(&self, f: impl FnOnce(&CompareState) -> T) -> T {
        f(&self.state.borrow().channels[self.index as usize])
    }

    fn with_mut(&mut self, f: impl FnOnce(&mut CompareState)) {
        f(&mut self.state.borrow_mut().channels[self.index as usize])
    }

    pub fn index(&self) -> u8 {
        self.index
    }

    /// Raises the match flag as if the counter had matched.
    pub fn force_match(&mut self) {
        self.with_mut(|channel| channel.ccifg = true);
    }
}

impl CompareRegisters for MockCompareChannel {
    fn source(&self) -> InterruptSource {
        InterruptSource::CompareMatch(self.index)
    }

    fn compare(&self) -> u16 {
        self.with(|channel| channel.ccr)
    }

    fn set_compare(&mut self, value: u16) {
        self.with_mut(|channel| channel.ccr = value);
    }

    fn is_pending(&self) -> bool {
        self.with(|channel| channel.ccifg)
    }

    fn clear_pending(&mut self) {
        self.with_mut(|channel| channel.ccifg = false);
    }

    fn interrupt_enabled(&self) -> bool {
        self.with(|channel| channel.ccie)
    }

    fn set_interrupt_enabled(&mut self, enabled: bool) {
        self.with_mut(|channel| channel.ccie = enabled);
    }
}

/// Per-source mask bits of a [`MockTimerA`]. Sources that do not exist on
/// the counter are ignored and read as masked.
#[derive(Debug, Clone)]
pub struct MockInterruptController {
    state: Rc<RefCell<TimerAState>>,
}

impl InterruptGate for MockInterruptController {
    fn enable(&self, source: InterruptSource) {
        if let Some(slot) = source.index() {
            self.state.borrow_mut().unmasked[slot] = true;
        }
    }

    fn disable(&self, source: InterruptSource) {
        if let Some(slot) = source.index() {
            self.state.borrow_mut().unmasked[slot] = false;
        }
    }

    fn is_enabled(&self, source: InterruptSource) -> bool {
        source.index().map_or(false, |slot| self.state.borrow().unmasked[slot])
    }
}

const PORTS: usize = PORT_COUNT as usize;

/// Two 8-pin ports with direction, output, input and pull-enable registers.
#[derive(Debug, Default)]
pub struct MockPorts {
    dir: [u8; PORTS],
    out: [u8; PORTS],
    input: [u8; PORTS],
    ren: [u8; PORTS],
}

impl MockPorts {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn drive_input(&mut self, pin: PinId, level: Level) {
        let (port, mask) = locate(pin);
        write_bit(&mut self.input[port], mask, level == Level::High);
    }

    pub fn is_output(&self, pin: PinId) -> bool {
        let (port, mask) = locate(pin);
        self.dir[port] & mask != 0
    }

    pub fn pull_enabled(&self, pin: PinId) -> bool {
        let (port, mask) = locate(pin);
        self.ren[port] & mask != 0
    }
}

fn locate(pin: PinId) -> (usize, u8) {
    let (port, bit) = pin.port_pin();
    ((port - 1) as usize, 1 << bit)
}

fn write_bit(register: &mut u8, mask: u8, set: bool) {
    if set {
        *register |= mask;
    } else {
        *register &= !mask;
    }
}

impl PinController for MockPorts {
    fn reset(&mut self) {
        self.dir = [0xFF; PORTS];
        self.out = [0; PORTS];
        self.ren = [0; PORTS];
    }

    fn configure(&mut self, pin: PinId, config: PinConfig) {
        let (port, mask) = locate(pin);
        match config {
            PinConfig::Output => write_bit(&mut self.dir[port], mask, true),
            PinConfig::Input => write_bit(&mut self.dir[port], mask, false),
            PinConfig::EnablePull => write_bit(&mut self.ren[port], mask, true),
            PinConfig::DisablePull => write_bit(&mut self.ren[port], mask, false),
        }
    }

    fn write(&mut self, pin: PinId, level: Level) {
        let (port, mask) = locate(pin);
        write_bit(&mut self.out[port], mask, level == Level::High);
    }

    fn read(&self, pin: PinId) -> Level {
        let (port, mask) = locate(pin);
        let register = if self.dir[port] & mask != 0 {
            self.out[port]
        } else {
            self.input[port]
        };
        Level::from(register & mask != 0)
    }

    fn output(&self, pin: PinId) -> Level {
        let (port, mask) = locate(pin);
        Level::from(self.out[port] & mask != 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pin(id: u8) -> PinId {
        PinId::new(id).unwrap()
    }

    #[test]
    fn test_step_raises_match_flag() {
        let timer = MockTimerA::new();
        let mut channel = timer.channel(0);
        channel.set_compare(3);

        timer.advance(2);
        assert!(!channel.is_pending());
        timer.step();
        assert_eq!(timer.counter(), 3);
        assert!(channel.is_pending());

        // Flag only, no interrupt enable yet.
        assert!(timer.deliverable().is_empty());
        channel.set_interrupt_enabled(true);
        assert_eq!(timer.deliverable(), vec![0]);
    }

    #[test]
    fn test_counter_wraps() {
        let timer = MockTimerA::new();
        let mut channel = timer.channel(1);
        channel.set_compare(0);
        timer.set_counter(u16::MAX);

        timer.step();
        assert_eq!(timer.counter(), 0);
        assert!(channel.is_pending());
    }

    #[test]
    fn test_stopped_counter_holds() {
        let timer = MockTimerA::new();
        timer.set_running(false);
        timer.advance(10);
        assert_eq!(timer.counter(), 0);
    }

    #[test]
    fn test_masked_source_not_deliverable() {
        let timer = MockTimerA::new();
        let gate = timer.interrupt_controller();
        let mut channel = timer.channel(2);
        channel.set_interrupt_enabled(true);
        channel.force_match();

        gate.disable(InterruptSource::CompareMatch(2));
        assert!(timer.deliverable().is_empty());
        gate.enable(InterruptSource::CompareMatch(2));
        assert_eq!(timer.deliverable(), vec![2]);
    }

    #[test]
    fn test_controller_ignores_missing_sources() {
        let timer = MockTimerA::new();
        let gate = timer.interrupt_controller();
        gate.enable(InterruptSource::CompareMatch(5));
        assert!(!gate.is_enabled(InterruptSource::CompareMatch(5)));
    }

    #[test]
    fn test_ports_reset_and_configure() {
        let mut ports = MockPorts::new();
        ports.reset();
        assert!(ports.is_output(pin(12)));
        assert_eq!(ports.output(pin(12)), Level::Low);

        ports.configure(pin(9), PinConfig::Input);
        ports.configure(pin(9), PinConfig::EnablePull);
        assert!(!ports.is_output(pin(9)));
        assert!(ports.pull_enabled(pin(9)));

        ports.drive_input(pin(9), Level::High);
        assert_eq!(ports.read(pin(9)), Level::High);
    }

    #[test]
    fn test_ports_output_readback() {
        let mut ports = MockPorts::new();
        ports.reset();

        ports.toggle(pin(0));
        assert_eq!(ports.read(pin(0)), Level::High);
        // Neighbours on the same port untouched.
        assert_eq!(ports.read(pin(1)), Level::Low);
        // Same bit on the other port untouched.
        assert_eq!(ports.read(pin(8)), Level::Low);
    }
}
