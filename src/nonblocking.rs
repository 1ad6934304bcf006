use core::marker::PhantomData;
use embedded_io::Write;

use crate::clock::{Tick, TickSource};
use crate::config::Config;
use crate::frame::{FrameBuffer, InvalidRow, RowWriter};
use crate::init::{InitSequencer, InitStage};
use crate::stream::TextStreamer;
use crate::transmit::ByteTransmitter;
use crate::{Mode, NibbleBus};

/// something that redraws part of the frame now and then, see [`Lcd::tick_with`]
pub trait ContentUpdater<const ROWS: usize, const COLS: usize> {
    fn update(&mut self, frame: &mut FrameBuffer<ROWS, COLS>);
}

impl<F, const ROWS: usize, const COLS: usize> ContentUpdater<ROWS, COLS> for F
where
    F: FnMut(&mut FrameBuffer<ROWS, COLS>)
{
    fn update(&mut self, frame: &mut FrameBuffer<ROWS, COLS>) {
        self(frame)
    }
}

/// writes `HELLO <n>` to the first row, `n` counting from 1 on every update
///
/// handy as a first sign of life on new hardware
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Heartbeat {
    count: u32,
}

impl Heartbeat {
    pub fn new() -> Self {
        Self::default()
    }

    /// updates done so far
    pub fn count(&self) -> u32 {
        self.count
    }
}

impl<const ROWS: usize, const COLS: usize> ContentUpdater<ROWS, COLS> for Heartbeat {
    fn update(&mut self, frame: &mut FrameBuffer<ROWS, COLS>) {
        self.count = self.count.wrapping_add(1);
        if let Ok(mut row) = frame.row_writer(0) {
            // the writer truncates instead of failing
            write!(row, "HELLO {}", self.count).ok();
        }
    }
}

/// `ROWS` x `COLS` character lcd, driven one small step per [`tick`](Self::tick)
///
/// `P` is usually a [`LcdPinConfiguration`](crate::LcdPinConfiguration) over a
/// [`HalfWidthBus`](crate::HalfWidthBus), `E` the error every pin error converts into
pub struct Lcd<
    P: NibbleBus<E>,
    C: TickSource,
    E,
    const ROWS: usize,
    const COLS: usize
> {
    pins: P,
    clock: C,
    config: Config,
    frame: FrameBuffer<ROWS, COLS>,
    init: InitSequencer,
    transmitter: ByteTransmitter,
    streamer: TextStreamer,
    last_update: Tick,
    _error: PhantomData<E>
}

impl<
    P: NibbleBus<E>,
    C: TickSource,
    E,
    const ROWS: usize,
    const COLS: usize
> Lcd<P, C, E, ROWS, COLS> {
    /// takes the pins and pulls en and rs low, nothing else is sent yet
    ///
    /// the reset sequence runs over the following [`tick`](Self::tick)s, starting with the
    /// power-on wait, and [`Config::banner`] is shown as soon as it is done
    pub fn new(mut pins: P, clock: C, config: Config) -> Result<Self, E> {
        pins.enable(false)?;
        pins.register_select(Mode::Command)?;

        let mut frame = FrameBuffer::new();
        if let Some(banner) = config.banner {
            // row 0 always exists
            frame.write_row(0, banner).ok();
        }
        debug!("lcd {}x{}", ROWS, COLS);

        let now = clock.now();
        Ok(Self {
            pins,
            init: InitSequencer::new(&config),
            transmitter: ByteTransmitter::new(config.timing),
            streamer: TextStreamer::new(config.row_offsets(COLS as u8)),
            clock,
            config,
            frame,
            last_update: now,
            _error: PhantomData::default()
        })
    }

    /// advance every state machine by at most one step, never waits
    ///
    /// initialization comes first, text streaming only starts once it's done,
    /// and the transmitter moves whatever either of them started
    pub fn tick(&mut self) -> Result<(), E> {
        let now = self.clock.now();
        if self.init.is_ready() {
            self.streamer.poll(&mut self.transmitter, &mut self.pins, now, &mut self.frame)?;
        } else {
            self.init.poll(&mut self.transmitter, &mut self.pins, now)?;
        }
        self.transmitter.poll(&mut self.pins, now)
    }

    /// [`tick`](Self::tick), calling `updater` first whenever [`Config::update_interval`]
    /// has passed since its last call
    pub fn tick_with(&mut self, updater: &mut impl ContentUpdater<ROWS, COLS>) -> Result<(), E> {
        let now = self.clock.now();
        if now.has_elapsed(self.last_update, self.config.update_interval) {
            trace!("content update at {}", now);
            updater.update(&mut self.frame);
            self.last_update = now;
        }
        self.tick()
    }

    pub fn clear(&mut self) {
        self.frame.clear();
    }

    /// see [`FrameBuffer::write_row`]
    pub fn write_row(&mut self, row: usize, text: &str) -> Result<usize, InvalidRow> {
        self.frame.write_row(row, text)
    }

    /// see [`FrameBuffer::row_writer`]
    pub fn row_writer(&mut self, row: usize) -> Result<RowWriter<'_, ROWS, COLS>, InvalidRow> {
        self.frame.row_writer(row)
    }

    pub fn request_refresh(&mut self) {
        self.frame.request_refresh();
    }

    pub fn frame(&self) -> &FrameBuffer<ROWS, COLS> {
        &self.frame
    }

    pub fn frame_mut(&mut self) -> &mut FrameBuffer<ROWS, COLS> {
        &mut self.frame
    }

    pub fn is_ready(&self) -> bool {
        self.init.is_ready()
    }

    pub fn init_stage(&self) -> InitStage {
        self.init.stage()
    }

    /// initialized, and the display shows exactly what the frame holds
    pub fn is_idle(&self) -> bool {
        self.init.is_ready()
            && !self.streamer.is_streaming()
            && !self.frame.refresh_requested()
            && !self.transmitter.is_busy()
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn pins(&self) -> &P {
        &self.pins
    }

    /// give back the pins and the clock
    pub fn release(self) -> (P, C) {
        (self.pins, self.clock)
    }
}
