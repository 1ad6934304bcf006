use crate::clock::Tick;
use crate::config::Timing;
use crate::{Mode, NibbleBus};

/// how much of the byte goes over the bus
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Width {
    /// only the low nibble, used while the controller may still be in 8 bit mode
    FourBit,
    /// high nibble then low nibble
    EightBit
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Phase {
    Idle,
    PresentNibble,
    EnableHigh,
    EnableLow,
    Settle
}

/// clocks one byte onto the bus, one step per [`poll`](Self::poll)
///
/// the enable line is never pulsed shorter than [`Timing::enable_pulse`], however often or
/// rarely it is polled; slow polling only stretches the transmission
#[derive(Clone, Debug)]
pub struct ByteTransmitter {
    timing: Timing,
    phase: Phase,
    mode: Mode,
    /// nibble to present next sits in the upper 4 bits
    latched: u8,
    low_nibble_pending: bool,
    since: Tick,
}

impl ByteTransmitter {
    pub fn new(timing: Timing) -> Self {
        Self {
            timing,
            phase: Phase::Idle,
            mode: Mode::Command,
            latched: 0,
            low_nibble_pending: false,
            since: Tick::default(),
        }
    }

    pub fn is_busy(&self) -> bool {
        self.phase != Phase::Idle
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// begin sending `byte`
    ///
    /// sets rs right away, returns `Ok(false)` without touching the bus if a transmission
    /// is still in flight
    pub fn start<E>(
        &mut self,
        bus: &mut impl NibbleBus<E>,
        now: Tick,
        byte: u8,
        mode: Mode,
        width: Width
    ) -> Result<bool, E> {
        if self.is_busy() {
            return Ok(false);
        }
        bus.register_select(mode)?;
        self.mode = mode;
        (self.latched, self.low_nibble_pending) = match width {
            Width::FourBit => (byte << 4, false),
            Width::EightBit => (byte, true)
        };
        self.enter(Phase::PresentNibble, now);
        Ok(true)
    }

    pub fn poll<E>(&mut self, bus: &mut impl NibbleBus<E>, now: Tick) -> Result<(), E> {
        let elapsed = now.elapsed_since(self.since);
        match self.phase {
            Phase::Idle => {}
            Phase::PresentNibble => {
                bus.present(self.latched >> 4)?;
                bus.enable(false)?;
                self.enter(Phase::EnableHigh, now);
            }
            Phase::EnableHigh => if elapsed >= self.timing.enable_setup {
                bus.enable(true)?;
                self.enter(Phase::EnableLow, now);
            }
            Phase::EnableLow => if elapsed >= self.timing.enable_pulse {
                bus.enable(false)?;
                self.enter(Phase::Settle, now);
            }
            Phase::Settle => if elapsed >= self.settle_time() {
                if self.low_nibble_pending {
                    self.low_nibble_pending = false;
                    self.latched <<= 4;
                    self.enter(Phase::PresentNibble, now);
                } else {
                    self.enter(Phase::Idle, now);
                }
            }
        }
        Ok(())
    }

    fn settle_time(&self) -> u32 {
        match self.mode {
            Mode::Command => self.timing.command_settle,
            Mode::Data => self.timing.data_settle
        }
    }

    fn enter(&mut self, phase: Phase, now: Tick) {
        self.phase = phase;
        self.since = now;
    }
}
