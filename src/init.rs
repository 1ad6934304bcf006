//! power-on reset, replayed once
//!
//! the controller may come up in 8 bit mode, in 4 bit mode, or halfway through a 4 bit
//! transfer. three raw `0x3` nibbles force it into 8 bit mode from any of those, `0x2`
//! then switches to the 4 bit bus, after which normal commands go out as nibble pairs

use crate::clock::Tick;
use crate::config::{Config, InitTiming};
use crate::transmit::{ByteTransmitter, Width};
use crate::{Mode, NibbleBus, FOUR_BIT_MODE, WAKE_UP};

/// where the reset sequence is, strictly in declaration order
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum InitStage {
    Idle,
    Wait,
    WakeUp { remaining: u8 },
    FourBitMode,
    FunctionSet { remaining: u8 },
    DisplayControl,
    EntryModeSet,
    Settle,
    Ready,
}

#[derive(Clone, Debug)]
pub struct InitSequencer {
    timing: InitTiming,
    function_set: u8,
    display_control: u8,
    entry_mode: u8,
    stage: InitStage,
    since: Tick,
}

impl InitSequencer {
    pub fn new(config: &Config) -> Self {
        Self {
            timing: config.init,
            function_set: config.lines.function_set(),
            display_control: config.display_control.command(),
            entry_mode: config.entry_mode.command(),
            stage: InitStage::Idle,
            since: Tick::default(),
        }
    }

    pub fn stage(&self) -> InitStage {
        self.stage
    }

    pub fn is_ready(&self) -> bool {
        self.stage == InitStage::Ready
    }

    /// take at most one step
    ///
    /// every step waits for its delay and for `tx` to be idle, nothing is ever sent again
    /// once [`InitStage::Ready`] is reached
    pub fn poll<E>(
        &mut self,
        tx: &mut ByteTransmitter,
        bus: &mut impl NibbleBus<E>,
        now: Tick
    ) -> Result<(), E> {
        if self.is_ready() || tx.is_busy() {
            return Ok(());
        }
        let t = self.timing;
        let elapsed = now.elapsed_since(self.since);

        match self.stage {
            InitStage::Idle => self.advance(InitStage::Wait, now),
            InitStage::Wait => if elapsed >= t.power_on {
                self.advance(Self::wake_up(t.wake_up_repeats), now);
            }
            InitStage::WakeUp { remaining } => if elapsed >= t.wake_up_interval {
                tx.start(bus, now, WAKE_UP, Mode::Command, Width::FourBit)?;
                let next = match remaining {
                    0 | 1 => InitStage::FourBitMode,
                    n => InitStage::WakeUp { remaining: n - 1 }
                };
                self.advance(next, now);
            }
            InitStage::FourBitMode => if elapsed >= t.four_bit_interval {
                tx.start(bus, now, FOUR_BIT_MODE, Mode::Command, Width::FourBit)?;
                self.advance(Self::function_set(t.function_set_repeats), now);
            }
            InitStage::FunctionSet { remaining } => if elapsed >= t.command_interval {
                tx.start(bus, now, self.function_set, Mode::Command, Width::EightBit)?;
                let next = match remaining {
                    0 | 1 => InitStage::DisplayControl,
                    n => InitStage::FunctionSet { remaining: n - 1 }
                };
                self.advance(next, now);
            }
            InitStage::DisplayControl => if elapsed >= t.command_interval {
                tx.start(bus, now, self.display_control, Mode::Command, Width::EightBit)?;
                self.advance(InitStage::EntryModeSet, now);
            }
            InitStage::EntryModeSet => if elapsed >= t.command_interval {
                tx.start(bus, now, self.entry_mode, Mode::Command, Width::EightBit)?;
                self.advance(InitStage::Settle, now);
            }
            InitStage::Settle => if elapsed >= t.final_settle {
                debug!("lcd ready");
                self.advance(InitStage::Ready, now);
            }
            InitStage::Ready => {}
        }
        Ok(())
    }

    fn wake_up(repeats: u8) -> InitStage {
        match repeats {
            0 => InitStage::FourBitMode,
            remaining => InitStage::WakeUp { remaining }
        }
    }

    fn function_set(repeats: u8) -> InitStage {
        match repeats {
            0 => InitStage::DisplayControl,
            remaining => InitStage::FunctionSet { remaining }
        }
    }

    fn advance(&mut self, stage: InitStage, now: Tick) {
        trace!("init {} -> {}", self.stage, stage);
        self.stage = stage;
        self.since = now;
    }
}
