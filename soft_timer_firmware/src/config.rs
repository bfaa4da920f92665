use soft_timer_common::TOTAL_PINS;

/// Statically parse a decimal environment variable into a u16.
/// Compilation will fail if the value is empty, not a decimal number, zero, or
/// does not fit in 16 bits.
const fn parse_ticks(string: &'static str) -> u16 {
    let mut bytes = string.as_bytes();
    assert!(!bytes.is_empty());
    let mut res: u32 = 0;
    while let [byte, rest @ ..] = bytes {
        bytes = rest;
        let digit = match byte {
            b'0'..=b'9' => *byte - b'0',
            _ => panic!("LED_BLINK_TICKS is not a decimal number"),
        };
        res = res * 10 + digit as u32;
        assert!(res <= u16::MAX as u32);
    }
    assert!(res > 0);
    res as u16
}

/// Timer configuration:
/// TIMER1 runs off the 16MHz peripheral clock divided by 2^PRESCALER, so 4
/// gives one count per microsecond. Must be at most 9.
pub const TIMER_PRESCALER: u8 = 4;
const _: () = assert!(TIMER_PRESCALER <= 9);

/// 1ms cadence on compare channel 0.
pub const FAST_PERIOD: u16 = 1_000;
pub const FAST_CHANNEL: u8 = 0;
pub const FAST_SLOTS: usize = 4;

/// 10ms cadence on compare channel 1.
pub const SLOW_PERIOD: u16 = 10_000;
pub const SLOW_CHANNEL: u8 = 1;
pub const SLOW_SLOTS: usize = 4;

/// Slow service slot pacing the LED.
pub const LED_SOFT_TIMER: usize = 0;
/// Generic pin id of the LED.
pub const LED_PIN: u8 = 0;
/// Slow service ticks between LED toggles, from the LED_BLINK_TICKS
/// environment variable.
pub const LED_BLINK_TICKS: u16 = parse_ticks(env!("LED_BLINK_TICKS"));

/// P0 pin behind each generic pin id. Ids 0..8 are the first port and
/// 8..16 the second.
pub const P0_PIN_MAP: [u8; TOTAL_PINS as usize] = [
    17, 18, 19, 20, 22, 23, 24, 25, //
    2, 3, 4, 5, 6, 7, 8, 9,
];
