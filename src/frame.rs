//! text grid the application draws into
//!
//! nothing here talks to the display, every mutation raises the refresh flag and the
//! driver picks it up on a later [`Lcd::tick`](crate::Lcd::tick)

use core::fmt::{Display, Formatter};
use embedded_io::{ErrorKind, ErrorType, Write};

/// row index past the bottom of the display
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct InvalidRow {
    pub row: usize,
}

impl Display for InvalidRow {
    fn fmt(&self, f: &mut Formatter<'_>) -> core::fmt::Result {
        write!(f, "row {} is out of range", self.row)
    }
}

impl embedded_io::Error for InvalidRow {
    fn kind(&self) -> ErrorKind {
        ErrorKind::InvalidInput
    }
}

/// `ROWS` x `COLS` bytes of controller character codes, space padded
///
/// bytes are sent as they are, so ascii shows up as expected and the controller's own
/// character rom decides the rest
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FrameBuffer<const ROWS: usize, const COLS: usize> {
    cells: [[u8; COLS]; ROWS],
    refresh_requested: bool,
    revision: u32,
}

impl<const ROWS: usize, const COLS: usize> FrameBuffer<ROWS, COLS> {
    /// hd44780 ddram holds 2 lines of 40 characters, 4 row modules split those in half
    const GEOMETRY: () = assert!(
        ROWS >= 1 && ROWS <= 4 && COLS >= 1 && COLS <= 40 && ROWS * COLS <= 80,
        "unsupported lcd geometry"
    );

    /// blank buffer, with a refresh pending since ddram content is unknown after reset
    pub fn new() -> Self {
        #[allow(clippy::let_unit_value)]
        let () = Self::GEOMETRY;
        Self {
            cells: [[b' '; COLS]; ROWS],
            refresh_requested: true,
            revision: 0,
        }
    }

    pub const fn rows(&self) -> usize {
        ROWS
    }

    pub const fn cols(&self) -> usize {
        COLS
    }

    pub fn clear(&mut self) {
        self.cells = [[b' '; COLS]; ROWS];
        self.touch();
    }

    /// replace a whole row
    ///
    /// `text` is cut at `COLS` bytes and padded with spaces, returns how many bytes of it
    /// made it into the row
    pub fn write_row(&mut self, row: usize, text: &str) -> Result<usize, InvalidRow> {
        let cells = self.cells.get_mut(row).ok_or(InvalidRow { row })?;
        let len = text.len().min(COLS);
        cells.fill(b' ');
        cells[..len].copy_from_slice(&text.as_bytes()[..len]);
        self.touch();
        Ok(len)
    }

    /// blank a row and return a writer positioned at its first column
    ///
    /// ```ignore
    /// use embedded_io::Write;
    /// write!(frame.row_writer(0)?, "T: {}C", temp).ok();
    /// ```
    pub fn row_writer(&mut self, row: usize) -> Result<RowWriter<'_, ROWS, COLS>, InvalidRow> {
        if row >= ROWS {
            return Err(InvalidRow { row });
        }
        self.cells[row].fill(b' ');
        self.touch();
        Ok(RowWriter { frame: self, row, col: 0 })
    }

    /// ask for a full redraw without changing anything
    pub fn request_refresh(&mut self) {
        self.touch();
    }

    pub fn refresh_requested(&self) -> bool {
        self.refresh_requested
    }

    /// bumped on every mutation, wrapping
    pub fn revision(&self) -> u32 {
        self.revision
    }

    pub fn row(&self, row: usize) -> Option<&[u8; COLS]> {
        self.cells.get(row)
    }

    /// byte at row-major `offset`
    pub fn byte_at(&self, offset: usize) -> Option<u8> {
        self.cells.get(offset / COLS).map(|row| row[offset % COLS])
    }

    /// clears the refresh flag unless something changed since `revision`
    pub(crate) fn settle(&mut self, revision: u32) -> bool {
        if self.revision == revision {
            self.refresh_requested = false;
        }
        !self.refresh_requested
    }

    fn touch(&mut self) {
        self.refresh_requested = true;
        self.revision = self.revision.wrapping_add(1);
    }
}

impl<const ROWS: usize, const COLS: usize> Default for FrameBuffer<ROWS, COLS> {
    fn default() -> Self {
        Self::new()
    }
}

/// cursor into one row of a [`FrameBuffer`]
///
/// writes past the end of the row are dropped, the same way [`FrameBuffer::write_row`]
/// truncates, so formatting never fails
pub struct RowWriter<'a, const ROWS: usize, const COLS: usize> {
    frame: &'a mut FrameBuffer<ROWS, COLS>,
    row: usize,
    col: usize,
}

impl<const ROWS: usize, const COLS: usize> RowWriter<'_, ROWS, COLS> {
    /// bytes written so far, at most `COLS`
    pub fn position(&self) -> usize {
        self.col
    }
}

impl<const ROWS: usize, const COLS: usize> ErrorType for RowWriter<'_, ROWS, COLS> {
    type Error = core::convert::Infallible;
}

impl<const ROWS: usize, const COLS: usize> Write for RowWriter<'_, ROWS, COLS> {
    fn write(&mut self, buf: &[u8]) -> Result<usize, Self::Error> {
        let len = buf.len().min(COLS - self.col);
        if len > 0 {
            self.frame.cells[self.row][self.col..self.col + len].copy_from_slice(&buf[..len]);
            self.col += len;
            self.frame.touch();
        }
        Ok(buf.len())
    }

    fn flush(&mut self) -> Result<(), Self::Error> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn row_str<const R: usize, const C: usize>(frame: &FrameBuffer<R, C>, row: usize) -> &str {
        core::str::from_utf8(frame.row(row).unwrap()).unwrap()
    }

    #[test]
    fn test_new_is_blank_and_dirty() {
        let frame = FrameBuffer::<4, 20>::new();
        assert!(frame.refresh_requested());
        assert!((0..80).all(|i| frame.byte_at(i) == Some(b' ')));
        assert_eq!(frame.byte_at(80), None);
    }

    #[test]
    fn test_write_row_pads() {
        let mut frame = FrameBuffer::<4, 20>::new();
        assert_eq!(frame.write_row(0, "HELLO"), Ok(5));
        assert_eq!(row_str(&frame, 0), "HELLO               ");
        assert_eq!(row_str(&frame, 1), "                    ");
    }

    #[test]
    fn test_write_row_truncates() {
        let mut frame = FrameBuffer::<2, 16>::new();
        assert_eq!(frame.write_row(1, "this line is far too long"), Ok(16));
        assert_eq!(row_str(&frame, 1), "this line is far");
    }

    #[test]
    fn test_write_row_replaces_old_content() {
        let mut frame = FrameBuffer::<2, 16>::new();
        frame.write_row(0, "a longer line").unwrap();
        frame.write_row(0, "short").unwrap();
        assert_eq!(row_str(&frame, 0), "short           ");
    }

    #[test]
    fn test_invalid_row_leaves_buffer_alone() {
        let mut frame = FrameBuffer::<4, 20>::new();
        frame.write_row(0, "HELLO").unwrap();
        frame.settle(frame.revision());
        let before = frame.clone();

        assert_eq!(frame.write_row(5, "X"), Err(InvalidRow { row: 5 }));
        assert_eq!(frame.write_row(4, "X"), Err(InvalidRow { row: 4 }));
        assert!(frame.row_writer(4).is_err());
        assert_eq!(frame, before);
        assert!(!frame.refresh_requested());
    }

    #[test]
    fn test_invalid_row_error_kind() {
        use embedded_io::Error;
        assert_eq!(InvalidRow { row: 7 }.kind(), ErrorKind::InvalidInput);
    }

    #[test]
    fn test_clear() {
        let mut frame = FrameBuffer::<2, 8>::new();
        frame.write_row(0, "abc").unwrap();
        frame.write_row(1, "def").unwrap();
        frame.settle(frame.revision());

        frame.clear();
        assert!(frame.refresh_requested());
        assert_eq!(row_str(&frame, 0), "        ");
        assert_eq!(row_str(&frame, 1), "        ");
    }

    #[test]
    fn test_request_refresh_keeps_content() {
        let mut frame = FrameBuffer::<2, 8>::new();
        frame.write_row(0, "abc").unwrap();
        frame.settle(frame.revision());
        let before = frame.row(0).copied();

        frame.request_refresh();
        assert!(frame.refresh_requested());
        assert_eq!(frame.row(0).copied(), before);
    }

    #[test]
    fn test_settle_only_when_untouched() {
        let mut frame = FrameBuffer::<1, 8>::new();
        let revision = frame.revision();
        frame.write_row(0, "late").unwrap();
        assert!(!frame.settle(revision));
        assert!(frame.refresh_requested());

        assert!(frame.settle(frame.revision()));
        assert!(!frame.refresh_requested());
    }

    #[test]
    fn test_row_writer_formats_and_truncates() {
        let mut frame = FrameBuffer::<2, 10>::new();
        frame.write_row(1, "old content").unwrap();

        let mut writer = frame.row_writer(1).unwrap();
        write!(writer, "HELLO {}", 12345678).unwrap();
        assert_eq!(writer.position(), 10);

        assert_eq!(row_str(&frame, 1), "HELLO 1234");
        assert_eq!(row_str(&frame, 0), "          ");
    }

    #[test]
    fn test_row_writer_blanks_row() {
        let mut frame = FrameBuffer::<1, 8>::new();
        frame.write_row(0, "previous").unwrap();
        let mut writer = frame.row_writer(0).unwrap();
        writer.write_all(b"ab").unwrap();
        assert_eq!(row_str(&frame, 0), "ab      ");
    }

    proptest! {
        #[test]
        fn prop_write_row_is_exactly_cols(row in 0usize..4, text in "[ -~]{0,40}") {
            let mut frame = FrameBuffer::<4, 20>::new();
            let written = frame.write_row(row, &text).unwrap();
            let len = text.len().min(20);
            prop_assert_eq!(written, len);

            let cells = frame.row(row).unwrap();
            prop_assert_eq!(&cells[..len], &text.as_bytes()[..len]);
            prop_assert!(cells[len..].iter().all(|&b| b == b' '));
        }

        #[test]
        fn prop_out_of_range_rows_fail(row in 4usize..1000, text in "[ -~]{0,40}") {
            let mut frame = FrameBuffer::<4, 20>::new();
            let before = frame.clone();
            prop_assert_eq!(frame.write_row(row, &text), Err(InvalidRow { row }));
            prop_assert_eq!(frame, before);
        }
    }
}
