//! driver configuration
//!
//! all durations are in ticks, the defaults assume one tick per microsecond and come
//! from the HD44780U datasheet, rounded up so slower compatible controllers (KS0066, ST7066U) keep up
//! without the busy flag

use crate::{DisplayControl, EntryMode, Lines};

/// bus timing of a single transmission
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Timing {
    /// data lines stable before en rises (datasheet t_AS, 60 ns)
    pub enable_setup: u32,
    /// en high time (datasheet PW_EH, 450 ns)
    pub enable_pulse: u32,
    /// wait after each nibble of a command (datasheet 37 us)
    pub command_settle: u32,
    /// wait after each nibble of a data write (datasheet 37 us + 4 us)
    pub data_settle: u32,
}

impl Default for Timing {
    fn default() -> Self {
        Self {
            enable_setup: 2,
            enable_pulse: 2,
            command_settle: 100,
            data_settle: 50,
        }
    }
}

/// power-on reset sequence
///
/// each wait is measured from the previous step
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct InitTiming {
    /// after power on, before anything is sent (datasheet 40 ms at 2.7 V)
    pub power_on: u32,
    /// between the raw 0x3 wake up nibbles
    pub wake_up_interval: u32,
    /// how often 0x3 is sent, the datasheet's "initialization by instruction" uses 3
    pub wake_up_repeats: u8,
    /// before the raw 0x2 that selects the 4 bit bus
    pub four_bit_interval: u32,
    /// before each of function set, display control and entry mode
    pub command_interval: u32,
    /// how often function set is sent, some clones miss the first one
    pub function_set_repeats: u8,
    /// after entry mode, before text streaming starts
    pub final_settle: u32,
}

impl Default for InitTiming {
    fn default() -> Self {
        Self {
            power_on: 40_000,
            wake_up_interval: 15_000,
            wake_up_repeats: 3,
            four_bit_interval: 15_000,
            command_interval: 4_500,
            function_set_repeats: 2,
            final_settle: 50,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Config {
    pub timing: Timing,
    pub init: InitTiming,
    pub lines: Lines,
    pub display_control: DisplayControl,
    pub entry_mode: EntryMode,
    /// ddram address of the first column of each row
    ///
    /// `None` uses the usual layout `[0x00, 0x40, COLS, 0x40 + COLS]`
    pub row_offsets: Option<[u8; 4]>,
    /// written to row 0 on construction
    pub banner: Option<&'static str>,
    /// ticks between [`ContentUpdater`](crate::ContentUpdater) calls
    pub update_interval: u32,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            timing: Timing::default(),
            init: InitTiming::default(),
            lines: Lines::default(),
            display_control: DisplayControl::default(),
            entry_mode: EntryMode::default(),
            row_offsets: None,
            banner: Some("HELLO"),
            update_interval: 1_000_000,
        }
    }
}

impl Config {
    pub fn with_timing(mut self, timing: Timing) -> Self {
        self.timing = timing;
        self
    }

    pub fn with_init_timing(mut self, init: InitTiming) -> Self {
        self.init = init;
        self
    }

    pub fn with_lines(mut self, lines: Lines) -> Self {
        self.lines = lines;
        self
    }

    pub fn with_display_control(mut self, display_control: DisplayControl) -> Self {
        self.display_control = display_control;
        self
    }

    pub fn with_entry_mode(mut self, entry_mode: EntryMode) -> Self {
        self.entry_mode = entry_mode;
        self
    }

    pub fn with_row_offsets(mut self, row_offsets: [u8; 4]) -> Self {
        self.row_offsets = Some(row_offsets);
        self
    }

    pub fn with_banner(mut self, banner: Option<&'static str>) -> Self {
        self.banner = banner;
        self
    }

    pub fn with_update_interval(mut self, ticks: u32) -> Self {
        self.update_interval = ticks;
        self
    }

    /// ddram row addresses for a display `cols` wide
    pub(crate) fn row_offsets(&self, cols: u8) -> [u8; 4] {
        self.row_offsets.unwrap_or([0x00, 0x40, cols, 0x40 + cols])
    }
}
