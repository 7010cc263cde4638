//! Change tracking
//!
//! Reports which cells a display layer must repaint after a batch of input.

use super::buffer::ScreenBuffer;

/// Cells to repaint, as (row, col) coordinates
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Damage {
    /// Everything on a screen of this size
    Full { rows: usize, columns: usize },
    /// Only these cells, in row-major order
    Cells(Vec<(usize, usize)>),
}

impl Damage {
    pub fn full(screen: &ScreenBuffer) -> Self {
        Damage::Full {
            rows: screen.rows(),
            columns: screen.columns(),
        }
    }

    /// Cell-by-cell comparison of two snapshots of the active screen
    pub fn between(before: &ScreenBuffer, after: &ScreenBuffer) -> Self {
        if before.columns() != after.columns() || before.rows() != after.rows() {
            return Self::full(after);
        }
        let columns = after.columns();
        let cells = before
            .cells()
            .iter()
            .zip(after.cells())
            .enumerate()
            .filter(|(_, (old, new))| old != new)
            .map(|(i, _)| (i / columns, i % columns))
            .collect();
        Damage::Cells(cells)
    }

    pub fn is_full(&self) -> bool {
        matches!(self, Damage::Full { .. })
    }

    pub fn is_empty(&self) -> bool {
        match self {
            Damage::Full { .. } => false,
            Damage::Cells(cells) => cells.is_empty(),
        }
    }

    pub fn len(&self) -> usize {
        match self {
            Damage::Full { rows, columns } => rows * columns,
            Damage::Cells(cells) => cells.len(),
        }
    }

    /// Every damaged coordinate, each exactly once
    pub fn positions(&self) -> Vec<(usize, usize)> {
        match self {
            Damage::Full { rows, columns } => (0..*rows)
                .flat_map(|y| (0..*columns).map(move |x| (y, x)))
                .collect(),
            Damage::Cells(cells) => cells.clone(),
        }
    }

    /// Distinct damaged rows, ascending
    pub fn rows(&self) -> Vec<usize> {
        match self {
            Damage::Full { rows, .. } => (0..*rows).collect(),
            Damage::Cells(cells) => {
                let mut rows: Vec<usize> = cells.iter().map(|&(y, _)| y).collect();
                rows.dedup();
                rows
            }
        }
    }
}
