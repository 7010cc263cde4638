//! Screen buffer
//!
//! A fixed-size grid of cells stored row-major in one contiguous vector,
//! plus a per-row kind tag. Scrolling shifts rows inside an inclusive range
//! and never changes the grid's shape.

use std::fmt;
use std::ops::{Index, IndexMut};

use super::cell::Cell;
use super::error::{Result, TermError};

/// Line rendering kind (DEC double-width / double-height lines)
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum RowKind {
    #[default]
    Normal,
    DoubleWidth,
    TopHalf,
    BottomHalf,
}

/// Screen buffer holding one screen's worth of cells
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ScreenBuffer {
    columns: usize,
    rows: usize,
    cells: Vec<Cell>,
    kinds: Vec<RowKind>,
}

impl ScreenBuffer {
    /// Create a blank buffer. Both dimensions must be positive.
    pub fn new(columns: usize, rows: usize) -> Result<Self> {
        if columns == 0 || rows == 0 {
            return Err(TermError::InvalidDimensions { columns, rows });
        }
        Ok(Self::blank(columns, rows))
    }

    /// Infallible constructor for dimensions already validated by the caller
    pub(crate) fn blank(columns: usize, rows: usize) -> Self {
        debug_assert!(columns > 0 && rows > 0);
        Self {
            columns,
            rows,
            cells: vec![Cell::default(); columns * rows],
            kinds: vec![RowKind::Normal; rows],
        }
    }

    pub fn columns(&self) -> usize {
        self.columns
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    /// Total number of cells
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    fn check(&self, row: usize, col: usize) -> Result<usize> {
        if row >= self.rows || col >= self.columns {
            return Err(TermError::CellOutOfRange {
                row,
                col,
                rows: self.rows,
                columns: self.columns,
            });
        }
        Ok(row * self.columns + col)
    }

    fn check_offset(&self, offset: usize) -> Result<usize> {
        if offset >= self.cells.len() {
            return Err(TermError::OffsetOutOfRange {
                offset,
                len: self.cells.len(),
            });
        }
        Ok(offset)
    }

    fn check_row(&self, row: usize) -> Result<()> {
        if row >= self.rows {
            return Err(TermError::RowOutOfRange {
                row,
                rows: self.rows,
            });
        }
        Ok(())
    }

    pub fn cell(&self, row: usize, col: usize) -> Result<&Cell> {
        let i = self.check(row, col)?;
        Ok(&self.cells[i])
    }

    pub fn set_cell(&mut self, row: usize, col: usize, cell: Cell) -> Result<()> {
        let i = self.check(row, col)?;
        self.cells[i] = cell;
        Ok(())
    }

    pub fn cell_at_offset(&self, offset: usize) -> Result<&Cell> {
        let i = self.check_offset(offset)?;
        Ok(&self.cells[i])
    }

    pub fn set_cell_at_offset(&mut self, offset: usize, cell: Cell) -> Result<()> {
        let i = self.check_offset(offset)?;
        self.cells[i] = cell;
        Ok(())
    }

    /// Cells of one row
    pub fn row(&self, row: usize) -> Result<&[Cell]> {
        self.check_row(row)?;
        Ok(&self.cells[row * self.columns..(row + 1) * self.columns])
    }

    pub(crate) fn row_mut(&mut self, row: usize) -> &mut [Cell] {
        let cols = self.columns;
        &mut self.cells[row * cols..(row + 1) * cols]
    }

    pub fn row_kind(&self, row: usize) -> Result<RowKind> {
        self.check_row(row)?;
        Ok(self.kinds[row])
    }

    pub fn set_row_kind(&mut self, row: usize, kind: RowKind) -> Result<()> {
        self.check_row(row)?;
        self.kinds[row] = kind;
        Ok(())
    }

    /// All cells in row-major order
    pub fn cells(&self) -> &[Cell] {
        &self.cells
    }

    /// Overwrite the half-open linear range `[from, to)` with blank cells
    pub(crate) fn clear_range(&mut self, from: usize, to: usize) {
        let to = to.min(self.cells.len());
        if from < to {
            self.cells[from..to].fill(Cell::default());
        }
    }

    /// Overwrite every cell
    pub(crate) fn fill(&mut self, cell: Cell) {
        self.cells.fill(cell);
    }

    /// Shift rows `top..=bottom` up by `n`, blanking the vacated rows at the
    /// bottom of the range. `n` larger than the range clears it.
    ///
    /// # Panics
    ///
    /// Panics if `top > bottom` or `bottom` is outside the buffer.
    pub fn scroll_up(&mut self, top: usize, bottom: usize, n: usize) {
        assert!(top <= bottom && bottom < self.rows, "invalid scroll range {top}..={bottom}");
        let n = n.min(bottom - top + 1);
        if n == 0 {
            return;
        }
        let cols = self.columns;
        let region = &mut self.cells[top * cols..(bottom + 1) * cols];
        region.rotate_left(n * cols);
        let len = region.len();
        region[len - n * cols..].fill(Cell::default());

        let kinds = &mut self.kinds[top..=bottom];
        kinds.rotate_left(n);
        let len = kinds.len();
        kinds[len - n..].fill(RowKind::Normal);
    }

    /// Shift rows `top..=bottom` down by `n`, blanking the vacated rows at
    /// the top of the range.
    ///
    /// # Panics
    ///
    /// Panics if `top > bottom` or `bottom` is outside the buffer.
    pub fn scroll_down(&mut self, top: usize, bottom: usize, n: usize) {
        assert!(top <= bottom && bottom < self.rows, "invalid scroll range {top}..={bottom}");
        let n = n.min(bottom - top + 1);
        if n == 0 {
            return;
        }
        let cols = self.columns;
        let region = &mut self.cells[top * cols..(bottom + 1) * cols];
        region.rotate_right(n * cols);
        region[..n * cols].fill(Cell::default());

        let kinds = &mut self.kinds[top..=bottom];
        kinds.rotate_right(n);
        kinds[..n].fill(RowKind::Normal);
    }
}

impl Index<(usize, usize)> for ScreenBuffer {
    type Output = Cell;

    fn index(&self, (row, col): (usize, usize)) -> &Cell {
        assert!(
            row < self.rows && col < self.columns,
            "cell ({row}, {col}) outside {}x{} screen",
            self.columns,
            self.rows
        );
        &self.cells[row * self.columns + col]
    }
}

impl IndexMut<(usize, usize)> for ScreenBuffer {
    fn index_mut(&mut self, (row, col): (usize, usize)) -> &mut Cell {
        assert!(
            row < self.rows && col < self.columns,
            "cell ({row}, {col}) outside {}x{} screen",
            self.columns,
            self.rows
        );
        &mut self.cells[row * self.columns + col]
    }
}

/// Plain text dump, one line per row. Continuation cells print nothing.
impl fmt::Display for ScreenBuffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for row in self.cells.chunks(self.columns) {
            for cell in row {
                if let Some(ch) = cell.character {
                    write!(f, "{}", ch)?;
                }
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::term::cell::PenState;

    fn numbered(columns: usize, rows: usize) -> ScreenBuffer {
        let mut buf = ScreenBuffer::new(columns, rows).unwrap();
        for y in 0..rows {
            let ch = char::from(b'0' + y as u8);
            for x in 0..columns {
                buf.set_cell(y, x, Cell::new(ch, PenState::default())).unwrap();
            }
        }
        buf
    }

    fn first_column(buf: &ScreenBuffer) -> String {
        (0..buf.rows())
            .map(|y| buf[(y, 0)].character.unwrap_or('?'))
            .collect()
    }

    #[test]
    fn test_new_rejects_zero_dimensions() {
        assert_eq!(
            ScreenBuffer::new(0, 24),
            Err(TermError::InvalidDimensions { columns: 0, rows: 24 })
        );
        assert!(ScreenBuffer::new(80, 0).is_err());
    }

    #[test]
    fn test_blank_dump() {
        let buf = ScreenBuffer::new(80, 24).unwrap();
        let expected = format!("{}\n", " ".repeat(80)).repeat(24);
        assert_eq!(buf.to_string(), expected);
    }

    #[test]
    fn test_out_of_range_access() {
        let mut buf = ScreenBuffer::new(10, 5).unwrap();
        assert!(buf.cell(5, 0).is_err());
        assert!(buf.cell(0, 10).is_err());
        assert!(buf.cell_at_offset(50).is_err());
        assert!(buf.set_cell(4, 9, Cell::default()).is_ok());
        assert!(buf.set_cell_at_offset(50, Cell::default()).is_err());
        assert!(buf.row(5).is_err());
        assert!(buf.row_kind(5).is_err());
    }

    #[test]
    fn test_offset_matches_row_col() {
        let mut buf = ScreenBuffer::new(10, 5).unwrap();
        buf.set_cell_at_offset(23, Cell::new('x', PenState::default())).unwrap();
        assert_eq!(buf.cell(2, 3).unwrap().character, Some('x'));
        assert_eq!(buf.row(2).unwrap()[3].character, Some('x'));
    }

    #[test]
    fn test_scroll_up_within_region() {
        let mut buf = numbered(3, 6);
        buf.scroll_up(1, 4, 2);
        assert_eq!(first_column(&buf), "034  5");
        assert_eq!(buf.rows(), 6);
        assert_eq!(buf.len(), 18);
    }

    #[test]
    fn test_scroll_down_within_region() {
        let mut buf = numbered(3, 6);
        buf.scroll_down(1, 4, 1);
        assert_eq!(first_column(&buf), "0 1235");
    }

    #[test]
    fn test_scroll_conserves_rows() {
        for n in 1..=4 {
            let before = numbered(4, 6);
            let mut after = before.clone();
            after.scroll_up(1, 4, n);
            for k in 0..(4 - n) {
                assert_eq!(after.row(1 + k).unwrap(), before.row(1 + k + n).unwrap());
            }
            assert_eq!(after.row(0).unwrap(), before.row(0).unwrap());
            assert_eq!(after.row(5).unwrap(), before.row(5).unwrap());
            assert_eq!(after.rows(), 6);
        }
    }

    #[test]
    fn test_scroll_moves_row_kinds() {
        let mut buf = numbered(3, 4);
        buf.set_row_kind(2, RowKind::DoubleWidth).unwrap();
        buf.scroll_up(0, 3, 1);
        assert_eq!(buf.row_kind(1).unwrap(), RowKind::DoubleWidth);
        assert_eq!(buf.row_kind(3).unwrap(), RowKind::Normal);
    }

    #[test]
    fn test_clone_is_deep() {
        let original = numbered(3, 3);
        let mut copy = original.clone();
        copy.set_cell(0, 0, Cell::default()).unwrap();
        assert_eq!(original.cell(0, 0).unwrap().character, Some('0'));
    }
}
