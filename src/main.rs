//! # kzero Demo Firmware
//!
//! Three cooperative tasks on an STM32F4 board, the classic kernel
//! exercise: a multiplexed four-digit display, a two-button keypad and a
//! slow counter.
//!
//! | Task | Period | Behavior |
//! |------|--------|----------|
//! | `DisplayTask` | 5 ticks | Lights one digit per run; steps its counter every 500 ms |
//! | `KeypadTask` | 25 ticks | Toggles a count direction on each button release |
//! | `CounterTask` | 1000 ticks | 0..=10000 counter, reported over the log |
//!
//! ## Wiring
//!
//! - PA0–PA7: segments a–g and dp (common cathode)
//! - PB0–PB3: digit enables, thousands to units
//! - PC0, PC1: buttons, active high with external pull-downs

#![no_std]
#![no_main]

use core::sync::atomic::{AtomicBool, Ordering};

use cortex_m_rt::entry;
use panic_halt as _;

#[cfg(feature = "defmt")]
use defmt_rtt as _;

use kzero::kernel;
use kzero::segments::{self, Multiplexer, Polarity};
use kzero::task::{Task, TaskHandle};
use kzero::tick;

// ---------------------------------------------------------------------------
// Task identities and timing
// ---------------------------------------------------------------------------

const DISPLAY: TaskHandle = TaskHandle::new(0);
const KEYPAD: TaskHandle = TaskHandle::new(1);
const COUNTER: TaskHandle = TaskHandle::new(2);

const DISPLAY_PERIOD: u32 = 5;
const KEYPAD_PERIOD: u32 = 25;
const COUNTER_PERIOD: u32 = 1000;

/// Ticks between two steps of the display counter.
const DISPLAY_STEP_INTERVAL: u32 = 500;

/// Wrap point of the slow counter.
const COUNTER_MAX: u16 = 10_000;

// ---------------------------------------------------------------------------
// Board I/O (STM32F4 GPIO, raw registers)
// ---------------------------------------------------------------------------

mod board {
    const RCC_AHB1ENR: *mut u32 = 0x4002_3830 as *mut u32;

    const GPIOA_MODER: *mut u32 = 0x4002_0000 as *mut u32;
    const GPIOA_ODR: *mut u32 = 0x4002_0014 as *mut u32;
    const GPIOB_MODER: *mut u32 = 0x4002_0400 as *mut u32;
    const GPIOB_ODR: *mut u32 = 0x4002_0414 as *mut u32;
    const GPIOC_IDR: *const u32 = 0x4002_0810 as *const u32;

    /// Clock GPIOA–C, make PA0–PA7 and PB0–PB3 push-pull outputs.
    pub fn init() {
        unsafe {
            let enr = core::ptr::read_volatile(RCC_AHB1ENR);
            core::ptr::write_volatile(RCC_AHB1ENR, enr | 0b111);

            let moder = core::ptr::read_volatile(GPIOA_MODER);
            core::ptr::write_volatile(GPIOA_MODER, (moder & !0xFFFF) | 0x5555);

            let moder = core::ptr::read_volatile(GPIOB_MODER);
            core::ptr::write_volatile(GPIOB_MODER, (moder & !0xFF) | 0x55);

            // All digits off, all segments off
            let odr = core::ptr::read_volatile(GPIOB_ODR);
            core::ptr::write_volatile(GPIOB_ODR, odr & !0x0F);
            let odr = core::ptr::read_volatile(GPIOA_ODR);
            core::ptr::write_volatile(GPIOA_ODR, odr & !0xFF);
        }
    }

    /// Light digit `position` (1..=4) with `segments`, others off.
    pub fn show_digit(position: u8, segments: u8) {
        unsafe {
            let odr = core::ptr::read_volatile(GPIOB_ODR) & !0x0F;
            // Blank before switching segments to avoid ghosting
            core::ptr::write_volatile(GPIOB_ODR, odr);

            let seg = core::ptr::read_volatile(GPIOA_ODR) & !0xFF;
            core::ptr::write_volatile(GPIOA_ODR, seg | u32::from(segments));

            let enable = 1u32 << (position.saturating_sub(1) & 0x03);
            core::ptr::write_volatile(GPIOB_ODR, odr | enable);
        }
    }

    /// Level of button `index` (0 or 1).
    pub fn button(index: u8) -> bool {
        unsafe { core::ptr::read_volatile(GPIOC_IDR) & (1 << index) != 0 }
    }
}

// ---------------------------------------------------------------------------
// Tasks
// ---------------------------------------------------------------------------

/// Four-digit display. Self-times its counter steps with `kernel::now()`
/// independently of its 5-tick dispatch period.
struct DisplayTask {
    mux: Multiplexer,
    value: u16,
    last_step: u32,
    counts_down: &'static AtomicBool,
}

impl DisplayTask {
    const fn new(counts_down: &'static AtomicBool) -> Self {
        Self {
            mux: Multiplexer::new(Polarity::CommonCathode),
            value: 0,
            last_step: 0,
            counts_down,
        }
    }
}

impl Task for DisplayTask {
    fn run(&mut self) {
        let now = kernel::now();
        if tick::elapsed(now, self.last_step) > DISPLAY_STEP_INTERVAL {
            self.last_step = now;
            let down = self.counts_down.load(Ordering::Relaxed);
            self.value = segments::count_step(self.value, segments::MAX_VALUE, down);
        }

        let (position, pattern) = self.mux.next(self.value);
        board::show_digit(position, pattern);
    }
}

/// Two buttons; each toggles the direction flag it is wired to when
/// released. Button 1 drives the slow counter, button 2 the display.
struct KeypadTask {
    held: [bool; 2],
    directions: [&'static AtomicBool; 2],
}

impl KeypadTask {
    const fn new(counter: &'static AtomicBool, display: &'static AtomicBool) -> Self {
        Self {
            held: [false; 2],
            directions: [counter, display],
        }
    }

    fn poll(&mut self, index: u8) {
        let pressed = board::button(index);
        let slot = usize::from(index);
        if pressed {
            self.held[slot] = true;
        } else if self.held[slot] {
            self.held[slot] = false;
            let flag = self.directions[slot];
            flag.store(!flag.load(Ordering::Relaxed), Ordering::Relaxed);
            kzero::log_debug!("button {} released", index);
        }
    }
}

impl Task for KeypadTask {
    fn run(&mut self) {
        self.poll(0);
        self.poll(1);
    }
}

/// Slow counter, stepping once per run.
struct CounterTask {
    count: u16,
    counts_down: &'static AtomicBool,
}

impl CounterTask {
    const fn new(counts_down: &'static AtomicBool) -> Self {
        Self {
            count: 0,
            counts_down,
        }
    }
}

impl Task for CounterTask {
    fn run(&mut self) {
        let down = self.counts_down.load(Ordering::Relaxed);
        self.count = segments::count_step(self.count, COUNTER_MAX, down);
        kzero::log_info!("count {}", self.count);
    }
}

// ---------------------------------------------------------------------------
// Main entry point
// ---------------------------------------------------------------------------

/// Firmware entry point. Initializes the board and the kernel, registers
/// the tasks and starts the scheduler. Does not return.
#[entry]
fn main() -> ! {
    // Take ownership of core peripherals
    let cp = cortex_m::Peripherals::take().unwrap();

    board::init();
    kernel::init().expect("kernel init");

    // Direction flags shared between the keypad and the two counters
    let display_down: &'static AtomicBool =
        cortex_m::singleton!(: AtomicBool = AtomicBool::new(false)).unwrap();
    let counter_down: &'static AtomicBool =
        cortex_m::singleton!(: AtomicBool = AtomicBool::new(false)).unwrap();

    let display = cortex_m::singleton!(: DisplayTask = DisplayTask::new(display_down)).unwrap();
    let keypad =
        cortex_m::singleton!(: KeypadTask = KeypadTask::new(counter_down, display_down)).unwrap();
    let counter = cortex_m::singleton!(: CounterTask = CounterTask::new(counter_down)).unwrap();

    kernel::add_task(display, Some("disp7seg"), DISPLAY_PERIOD, true, DISPLAY)
        .expect("Failed to add display task");
    kernel::add_task(keypad, Some("keypad"), KEYPAD_PERIOD, true, KEYPAD)
        .expect("Failed to add keypad task");
    kernel::add_task(counter, Some("counter"), COUNTER_PERIOD, true, COUNTER)
        .expect("Failed to add counter task");

    // Start the scheduler, does not return
    kernel::start(cp)
}
