use log::{debug, info, warn};
use soft_timer_common::mock::{MockCompareChannel, MockInterruptController, MockPorts, MockTimerA};
use soft_timer_common::{Cadence, ControlSetting, FaultLog, PinController, TimerService};

use crate::app::Application;

/// Counter ticks per millisecond with the counter clocked at 1 MHz.
pub const COUNTS_PER_MS: u32 = 1_000;

pub const FAST_PERIOD: u16 = 1_000;
pub const SLOW_PERIOD: u16 = 10_000;
pub const FAST_CHANNEL: u8 = 0;
pub const SLOW_CHANNEL: u8 = 1;
pub const FAST_SLOTS: usize = 4;
pub const SLOW_SLOTS: usize = 4;

const fn cadence(period: u16) -> Cadence {
    match Cadence::new(period) {
        Some(cadence) => cadence,
        None => panic!("cadence period must be non-zero"),
    }
}

const FAST_CADENCE: Cadence = cadence(FAST_PERIOD);
const SLOW_CADENCE: Cadence = cadence(SLOW_PERIOD);

pub type Service<'a, const N: usize> = TimerService<MockCompareChannel, MockInterruptController, &'a FaultLog, N>;

/// Ticks each service has handled since boot.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct TickCounts {
    pub fast: u64,
    pub slow: u64,
}

/// Mock hardware wired up the way the firmware wires the real thing.
pub struct Board<'a> {
    pub timer: MockTimerA,
    pub fast: Service<'a, FAST_SLOTS>,
    pub slow: Service<'a, SLOW_SLOTS>,
    pub ports: MockPorts,
    pub faults: &'a FaultLog,
    ticks: TickCounts,
    counts: u64,
}

impl<'a> Board<'a> {
    pub fn new(faults: &'a FaultLog) -> Self {
        let timer = MockTimerA::new();
        let fast = TimerService::new(
            timer.channel(FAST_CHANNEL),
            FAST_CADENCE,
            timer.interrupt_controller(),
            faults,
        );
        let slow = TimerService::new(
            timer.channel(SLOW_CHANNEL),
            SLOW_CADENCE,
            timer.interrupt_controller(),
            faults,
        );

        Self {
            timer,
            fast,
            slow,
            ports: MockPorts::new(),
            faults,
            ticks: TickCounts::default(),
            counts: 0,
        }
    }

    /// Brings every driver to its reset state. The counter keeps running
    /// throughout.
    pub fn boot(&mut self) {
        self.faults.init();
        self.slow.reset();
        self.fast.reset();
        self.ports.reset();
        self.ticks = TickCounts::default();
        info!("Board booted at counter {}", self.timer.counter());
    }

    /// Runs `counts` counter ticks. After every tick pending matches are
    /// dispatched to their service, then `app` gets one foreground pass.
    pub fn run_for<A: Application + ?Sized>(&mut self, counts: u32, app: &mut A) {
        for _ in 0..counts {
            self.timer.step();
            self.counts += 1;
            self.dispatch();
            app.poll(self);
        }
    }

    /// The interrupt vector: every deliverable channel goes to the service
    /// that owns it.
    fn dispatch(&mut self) {
        for channel in self.timer.deliverable() {
            match channel {
                FAST_CHANNEL => {
                    if self.fast.on_interrupt() {
                        self.ticks.fast += 1;
                    }
                }
                SLOW_CHANNEL => {
                    if self.slow.on_interrupt() {
                        self.ticks.slow += 1;
                    }
                }
                other => warn!("Match on unowned channel {}", other),
            }
        }
    }

    pub fn control_slow(&mut self, setting: ControlSetting) {
        debug!("Slow service control {:?} at count {}", setting, self.counts);
        self.slow.control(setting);
    }

    pub fn ticks(&self) -> TickCounts {
        self.ticks
    }

    /// Counts simulated since the board was created.
    pub fn counts(&self) -> u64 {
        self.counts
    }
}
