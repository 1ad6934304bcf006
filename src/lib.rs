#![cfg_attr(not(test), no_std)]
#![deny(unsafe_code)]

//! never-blocking driver for hd44780 compatible character lcds on a 4 bit bus
//!
//! nothing in here ever waits. every state machine is advanced by [`Lcd::tick`],
//! which should be called from the main loop as often as possible, and every delay
//! the controller needs is measured against a [`TickSource`] instead of spun away
//! that keeps the loop free for whatever else it has to do (step pulses, serial...)
//!
//! the application only ever touches a [`FrameBuffer`]; a write marks it dirty and the
//! driver streams the whole grid to the controller in the background
//!
//! currently only works in write-only mode
//! rw pin must be tied low, busy flag is never read
//! instead, every command waits a fixed worst-case time, see [`Timing`]
//!
//! example
//! ```ignore
//! static OVERFLOWS: OverflowCounter = OverflowCounter::new();
//!
//! #[interrupt]
//! fn TIM2() {
//!     OVERFLOWS.increment();
//! }
//!
//! let mut lcd = Lcd::<_, _, Infallible, 4, 20>::new(
//!     LcdPinConfiguration {
//!         en: pins.d7.into_output(),
//!         rs: pins.d6.into_output(),
//!         bus: HalfWidthBus {
//!             d4: pins.d8.into_output(),
//!             d5: pins.d9.into_output(),
//!             d6: pins.d10.into_output(),
//!             d7: pins.d11.into_output()
//!         }
//!     },
//!     OverflowClock::new(&OVERFLOWS, timer),
//!     Config::default()
//! ).unwrap();
//!
//! lcd.write_row(1, "second line").unwrap();
//! loop {
//!     lcd.tick().unwrap();
//!     // other latency sensitive work
//! }
//! ```

#[macro_use]
mod fmt;

pub mod clock;
pub mod config;
pub mod frame;
pub mod init;
pub mod nonblocking;
pub mod stream;
pub mod transmit;

#[cfg(test)]
pub(crate) mod mock;

use core::fmt::{Debug, Formatter};
use embedded_hal::digital::v2::{OutputPin, PinState};

pub use clock::{FreeRunningCounter, OverflowClock, OverflowCounter, Tick, TickSource};
pub use config::{Config, InitTiming, Timing};
pub use frame::{FrameBuffer, InvalidRow, RowWriter};
pub use init::{InitSequencer, InitStage};
pub use nonblocking::{ContentUpdater, Heartbeat, Lcd};
pub use stream::TextStreamer;
pub use transmit::{ByteTransmitter, Phase, Width};

#[repr(u8)]
#[allow(dead_code)]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Command {
    ClearDisplay   = 0b00000001,
    ReturnHome     = 0b00000010,
    EntryModeSet   = 0b00000100,
    DisplayControl = 0b00001000,
    CursorShift    = 0b00010000,
    FunctionSet    = 0b00100000,
    SetCGramAddr   = 0b01000000,
    SetDDRAMAddr   = 0b10000000
}

/// raw nibble sent three times to pull the controller out of any bus width
pub(crate) const WAKE_UP: u8 = 0b0011;
/// raw nibble switching the controller into 4 bit mode
pub(crate) const FOUR_BIT_MODE: u8 = 0b0010;

/// register selected by the rs line
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Mode {
    Command,
    Data
}

impl Mode {
    fn pin_state(self) -> PinState {
        pin_state(self == Mode::Data)
    }
}

#[repr(u8)]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum IncrementMode {
    Decremental = 0b00,
    Incremental = 0b10,
}

/// line mode of the function set command
///
/// 4 row modules are wired as two long lines, use [`Lines::TwoLines`] for them
#[repr(u8)]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Lines {
    TwoLines    = 0b1000,
    OneLine5x10 = 0b0100,
    OneLine5x8  = 0b0000
}

impl Lines {
    /// function set byte for a 4 bit bus
    pub(crate) fn function_set(self) -> u8 {
        Command::FunctionSet as u8 | self as u8
    }
}

impl Default for Lines {
    fn default() -> Self {
        Self::TwoLines
    }
}

#[derive(Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct DisplayControl(u8);

impl DisplayControl {
    const DISPLAY: u8 = 0b100;
    const CURSOR: u8 = 0b010;
    const BLINK: u8 = 0b001;

    pub fn set_display_on(&mut self, v: bool) {
        self.set(Self::DISPLAY, v);
    }

    pub fn set_cursor(&mut self, v: bool) {
        self.set(Self::CURSOR, v);
    }

    pub fn set_blink(&mut self, v: bool) {
        self.set(Self::BLINK, v);
    }

    pub fn display_on(&self) -> bool {
        self.0 & Self::DISPLAY != 0
    }

    pub fn cursor(&self) -> bool {
        self.0 & Self::CURSOR != 0
    }

    pub fn blink(&self) -> bool {
        self.0 & Self::BLINK != 0
    }

    fn set(&mut self, flag: u8, v: bool) {
        self.0 &= !flag;
        if v {
            self.0 |= flag;
        }
    }

    pub(crate) fn command(self) -> u8 {
        Command::DisplayControl as u8 | self.0
    }
}

/// display on, cursor and blink off
impl Default for DisplayControl {
    fn default() -> Self {
        let mut v = DisplayControl(0);
        v.set_display_on(true);
        v
    }
}

impl Debug for DisplayControl {
    fn fmt(&self, f: &mut Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("DisplayControl")
            .field("display", &self.display_on())
            .field("cursor", &self.cursor())
            .field("blink", &self.blink())
            .finish()
    }
}

#[derive(Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct EntryMode(u8);

impl EntryMode {
    const INCREMENT: u8 = 0b010;
    const SCROLL: u8 = 0b001;

    pub fn set_increment_mode(&mut self, increment_mode: IncrementMode) {
        self.0 &= !Self::INCREMENT;
        if increment_mode == IncrementMode::Incremental {
            self.0 |= Self::INCREMENT;
        }
    }

    pub fn set_scroll(&mut self, v: bool) {
        self.0 &= !Self::SCROLL;
        if v {
            self.0 |= Self::SCROLL;
        }
    }

    pub fn increment_mode(&self) -> IncrementMode {
        match self.0 & Self::INCREMENT {
            0 => IncrementMode::Decremental,
            _ => IncrementMode::Incremental
        }
    }

    pub fn scroll(&self) -> bool {
        self.0 & Self::SCROLL != 0
    }

    pub(crate) fn command(self) -> u8 {
        Command::EntryModeSet as u8 | self.0
    }
}

/// left to right, no display shift
impl Default for EntryMode {
    fn default() -> Self {
        let mut v = Self(0);
        v.set_increment_mode(IncrementMode::Incremental);
        v
    }
}

impl Debug for EntryMode {
    fn fmt(&self, f: &mut Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("EntryMode")
            .field("increment_mode", &self.increment_mode())
            .field("scroll", &self.scroll())
            .finish()
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct HalfWidthBus<
    D4: OutputPin,
    D5: OutputPin,
    D6: OutputPin,
    D7: OutputPin
> {
    pub d4: D4,
    pub d5: D5,
    pub d6: D6,
    pub d7: D7
}

pub(crate) fn pin_state(v: bool) -> PinState {
    match v {
        true => PinState::High,
        false => PinState::Low
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LcdPinConfiguration<
    EN: OutputPin,
    RS: OutputPin,
    B
> {
    pub en: EN,
    pub rs: RS,
    pub bus: B
}

/// the only way the state machines touch hardware
///
/// every call sets lines and returns, timing is entirely up to the caller
pub trait NibbleBus<E> {
    /// drive rs
    fn register_select(&mut self, mode: Mode) -> Result<(), E>;

    /// drive d4..d7 with the low 4 bits of `nibble`
    fn present(&mut self, nibble: u8) -> Result<(), E>;

    /// drive en
    fn enable(&mut self, high: bool) -> Result<(), E>;
}

impl<
    EN: OutputPin,
    RS: OutputPin,
    D4: OutputPin,
    D5: OutputPin,
    D6: OutputPin,
    D7: OutputPin,
    E:
        From<EN::Error> + From<RS::Error> +
        From<D4::Error> + From<D5::Error> + From<D6::Error> + From<D7::Error>
> NibbleBus<E> for LcdPinConfiguration<EN, RS, HalfWidthBus<D4, D5, D6, D7>> {
    fn register_select(&mut self, mode: Mode) -> Result<(), E> {
        self.rs.set_state(mode.pin_state())?;
        Ok(())
    }

    fn present(&mut self, mut nibble: u8) -> Result<(), E> {
        self.bus.d4.set_state(pin_state(nibble & 1 == 1))?;
        nibble >>= 1;
        self.bus.d5.set_state(pin_state(nibble & 1 == 1))?;
        nibble >>= 1;
        self.bus.d6.set_state(pin_state(nibble & 1 == 1))?;
        nibble >>= 1;
        self.bus.d7.set_state(pin_state(nibble & 1 == 1))?;
        Ok(())
    }

    fn enable(&mut self, high: bool) -> Result<(), E> {
        self.en.set_state(pin_state(high))?;
        Ok(())
    }
}

impl<E, T: NibbleBus<E>> NibbleBus<E> for &mut T {
    fn register_select(&mut self, mode: Mode) -> Result<(), E> {
        (**self).register_select(mode)
    }

    fn present(&mut self, nibble: u8) -> Result<(), E> {
        (**self).present(nibble)
    }

    fn enable(&mut self, high: bool) -> Result<(), E> {
        (**self).enable(high)
    }
}
