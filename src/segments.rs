//! Seven-segment display helpers
//!
//! Pure digit/segment arithmetic for a four-digit multiplexed display.
//! Driving the pins is left to the task that uses these helpers.

/// Number of digits on the display.
pub const DIGITS: u8 = 4;

/// Largest value the display can show.
pub const MAX_VALUE: u16 = 9999;

/// Segment patterns (bit 0 = segment a … bit 6 = segment g) for 0–9,
/// active high.
const PATTERNS: [u8; 10] = [
    0x3F, // 0
    0x06, // 1
    0x5B, // 2
    0x4F, // 3
    0x66, // 4
    0x6D, // 5
    0x7D, // 6
    0x07, // 7
    0x7F, // 8
    0x67, // 9
];

/// Electrical polarity of the display's segment lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Polarity {
    /// Segments light on a high level.
    CommonCathode,
    /// Segments light on a low level.
    CommonAnode,
}

/// Segment byte for `digit`, taken modulo 10.
pub fn encode(digit: u8, polarity: Polarity) -> u8 {
    let pattern = PATTERNS[usize::from(digit % 10)];
    match polarity {
        Polarity::CommonCathode => pattern,
        Polarity::CommonAnode => !pattern,
    }
}

/// Digit of `value` shown at `position` (1 = thousands … 4 = units).
/// Positions outside 1..=4 read as 0.
pub fn digit_at(value: u16, position: u8) -> u8 {
    let digit = match position {
        1 => value / 1000,
        2 => (value % 1000) / 100,
        3 => (value % 100) / 10,
        4 => value % 10,
        _ => 0,
    };
    (digit % 10) as u8
}

/// Next value of a counter that wraps within `0..=max`, stepping down
/// when `down` is set.
pub fn count_step(value: u16, max: u16, down: bool) -> u16 {
    if down {
        value.checked_sub(1).unwrap_or(max)
    } else if value >= max {
        0
    } else {
        value + 1
    }
}

/// Per-display multiplexing state: lights one digit per call, cycling
/// through positions 1 to 4.
#[derive(Debug, Clone)]
pub struct Multiplexer {
    position: u8,
    polarity: Polarity,
}

impl Multiplexer {
    pub const fn new(polarity: Polarity) -> Self {
        Self {
            position: 1,
            polarity,
        }
    }

    /// Next `(position, segments)` pair for `value`.
    pub fn next(&mut self, value: u16) -> (u8, u8) {
        let position = self.position;
        let segments = encode(digit_at(value, position), self.polarity);
        self.position = if position >= DIGITS { 1 } else { position + 1 };
        (position, segments)
    }
}
