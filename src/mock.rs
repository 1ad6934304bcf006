//! test doubles: a hand-cranked clock and a bus that remembers everything

use core::cell::Cell;
use core::convert::Infallible;

use crate::clock::{Tick, TickSource};
use crate::{Mode, NibbleBus};

pub struct ManualClock {
    now: Cell<u32>,
}

impl ManualClock {
    pub fn new(start: u32) -> Self {
        Self { now: Cell::new(start) }
    }

    pub fn advance(&self, ticks: u32) {
        self.now.set(self.now.get().wrapping_add(ticks));
    }
}

impl TickSource for ManualClock {
    fn now(&self) -> Tick {
        Tick(self.now.get())
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BusEvent {
    RegisterSelect(Mode),
    Present(u8),
    Enable(bool),
}

/// records every line change and decodes what the controller would have latched
pub struct RecordingBus<'a> {
    clock: &'a ManualClock,
    events: Vec<(Tick, BusEvent)>,
    rs: Mode,
    nibble: u8,
    en: bool,
    latched: Vec<(Mode, u8)>,
    latched_at: Vec<Tick>,
}

impl<'a> RecordingBus<'a> {
    pub fn new(clock: &'a ManualClock) -> Self {
        Self {
            clock,
            events: Vec::new(),
            rs: Mode::Command,
            nibble: 0,
            en: false,
            latched: Vec::new(),
            latched_at: Vec::new(),
        }
    }

    pub fn events(&self) -> &[(Tick, BusEvent)] {
        &self.events
    }

    /// nibbles taken by the controller, on each falling edge of en
    pub fn latched(&self) -> Vec<(Mode, u8)> {
        self.latched.clone()
    }

    pub fn latched_at(&self) -> &[Tick] {
        &self.latched_at
    }

    /// whole bytes sent after the first `raw` single-nibble transfers
    pub fn bytes_after(&self, raw: usize) -> Vec<(Mode, u8)> {
        self.latched[raw..]
            .chunks(2)
            .map(|pair| {
                assert_eq!(pair.len(), 2, "half a byte on the bus");
                assert_eq!(pair[0].0, pair[1].0, "rs changed mid byte");
                (pair[0].0, pair[0].1 << 4 | pair[1].1)
            })
            .collect()
    }

    pub fn clear(&mut self) {
        self.events.clear();
        self.latched.clear();
        self.latched_at.clear();
    }

    fn record(&mut self, event: BusEvent) {
        self.events.push((self.clock.now(), event));
    }
}

impl NibbleBus<Infallible> for RecordingBus<'_> {
    fn register_select(&mut self, mode: Mode) -> Result<(), Infallible> {
        self.rs = mode;
        self.record(BusEvent::RegisterSelect(mode));
        Ok(())
    }

    fn present(&mut self, nibble: u8) -> Result<(), Infallible> {
        self.nibble = nibble & 0xf;
        self.record(BusEvent::Present(self.nibble));
        Ok(())
    }

    fn enable(&mut self, high: bool) -> Result<(), Infallible> {
        if self.en && !high {
            self.latched.push((self.rs, self.nibble));
            self.latched_at.push(self.clock.now());
        }
        self.en = high;
        self.record(BusEvent::Enable(high));
        Ok(())
    }
}
