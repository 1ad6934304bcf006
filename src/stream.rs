//! streams the frame buffer to ddram, one byte per idle transmitter
//!
//! a pass sends, for every row, a "set ddram address" command followed by the row's
//! `COLS` bytes. rows are addressed explicitly because the controller's rows are not
//! contiguous in ddram: on a 20x4 module row 1 starts at `0x40` and row 2 at `0x14`

use crate::clock::Tick;
use crate::frame::FrameBuffer;
use crate::transmit::{ByteTransmitter, Width};
use crate::{Command, Mode, NibbleBus};

#[derive(Clone, Debug)]
pub struct TextStreamer {
    row_offsets: [u8; 4],
    /// next byte of the pass, `None` between passes
    cursor: Option<usize>,
    address_pending: bool,
    /// frame revision the pass started from
    revision: u32,
}

impl TextStreamer {
    pub fn new(row_offsets: [u8; 4]) -> Self {
        Self {
            row_offsets,
            cursor: None,
            address_pending: true,
            revision: 0,
        }
    }

    /// `true` while a pass is underway
    pub fn is_streaming(&self) -> bool {
        self.cursor.is_some()
    }

    /// offset of the next byte to send
    pub fn cursor(&self) -> Option<usize> {
        self.cursor
    }

    /// start at most one transmission
    ///
    /// only call once the controller is initialized; does nothing while `tx` is busy
    pub fn poll<E, const ROWS: usize, const COLS: usize>(
        &mut self,
        tx: &mut ByteTransmitter,
        bus: &mut impl NibbleBus<E>,
        now: Tick,
        frame: &mut FrameBuffer<ROWS, COLS>
    ) -> Result<(), E> {
        if tx.is_busy() {
            return Ok(());
        }

        let cursor = match self.cursor {
            Some(cursor) => cursor,
            None if frame.refresh_requested() => {
                trace!("refresh pass from revision {}", frame.revision());
                self.revision = frame.revision();
                self.address_pending = true;
                self.cursor = Some(0);
                0
            }
            None => return Ok(()),
        };

        if self.address_pending && cursor % COLS == 0 {
            let address = self.row_offsets[cursor / COLS];
            tx.start(bus, now, Command::SetDDRAMAddr as u8 | address, Mode::Command, Width::EightBit)?;
            self.address_pending = false;
            return Ok(());
        }

        let byte = frame.byte_at(cursor).unwrap_or(b' ');
        tx.start(bus, now, byte, Mode::Data, Width::EightBit)?;
        self.address_pending = true;

        let next = cursor + 1;
        if next >= ROWS * COLS {
            self.cursor = None;
            if !frame.settle(self.revision) {
                trace!("frame changed during pass, going again");
            }
        } else {
            self.cursor = Some(next);
        }
        Ok(())
    }
}
