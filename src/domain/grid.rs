//! Game field: a rectangular, column-major collection of cells.
//!
//! `columns[x][y]` is the cell in column `x`, row `y`, which is also the
//! nesting used by level pack files (one `<column>` per x).
//! Width and height are derived from the collection sizes and validated
//! once in `from_columns`, so every accessor can trust the shape.

use super::cell::{Cell, CellKind};
use crate::error::GridError;

/// (column, row)
pub type Pos = (usize, usize);

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Grid {
    columns: Vec<Vec<Cell>>,
    width: usize,
    height: usize,
}

impl Grid {
    /// Build a grid from columns of cell kinds. Rejects empty and jagged input.
    pub fn from_columns(columns: Vec<Vec<CellKind>>) -> Result<Self, GridError> {
        let width = columns.len();
        let height = columns.first().map_or(0, |c| c.len());
        if width == 0 || height == 0 {
            return Err(GridError::Empty);
        }
        for (column, col) in columns.iter().enumerate() {
            if col.len() != height {
                return Err(GridError::Jagged { column, expected: height, found: col.len() });
            }
        }
        let columns = columns
            .into_iter()
            .map(|col| col.into_iter().map(Cell::new).collect())
            .collect();
        Ok(Grid { columns, width, height })
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn contains(&self, x: usize, y: usize) -> bool {
        x < self.width && y < self.height
    }

    /// Cell at (x, y). Out of bounds is a programmer error and panics.
    pub fn cell_at(&self, x: usize, y: usize) -> &Cell {
        assert!(self.contains(x, y), "cell ({x}, {y}) outside {}x{} grid", self.width, self.height);
        &self.columns[x][y]
    }

    pub fn cell_at_mut(&mut self, x: usize, y: usize) -> &mut Cell {
        assert!(self.contains(x, y), "cell ({x}, {y}) outside {}x{} grid", self.width, self.height);
        &mut self.columns[x][y]
    }

    /// Checked lookup.
    pub fn get(&self, x: usize, y: usize) -> Option<&Cell> {
        self.columns.get(x).and_then(|col| col.get(y))
    }

    pub fn kind_at(&self, pos: Pos) -> CellKind {
        self.cell_at(pos.0, pos.1).kind()
    }

    /// All cells in raster order (column by column), with positions.
    pub fn cells(&self) -> impl Iterator<Item = (Pos, &Cell)> + '_ {
        self.columns.iter().enumerate().flat_map(|(x, col)| {
            col.iter().enumerate().map(move |(y, cell)| ((x, y), cell))
        })
    }

    pub fn columns(&self) -> impl Iterator<Item = &[Cell]> + '_ {
        self.columns.iter().map(|c| c.as_slice())
    }

    /// Position of the (first) start cell.
    pub fn start(&self) -> Option<Pos> {
        self.cells().find(|(_, c)| c.kind() == CellKind::Start).map(|(p, _)| p)
    }

    /// Exactly one start and at least one finish.
    pub fn validate_endpoints(&self) -> Result<(), GridError> {
        let starts = self.count(CellKind::Start);
        match starts {
            0 => return Err(GridError::MissingStart),
            1 => {}
            n => return Err(GridError::MultipleStarts(n)),
        }
        if self.count(CellKind::Finish) == 0 {
            return Err(GridError::MissingFinish);
        }
        Ok(())
    }

    pub fn count(&self, kind: CellKind) -> usize {
        self.cells().filter(|(_, c)| c.kind() == kind).count()
    }

    /// Clear every visit, then put the player back on start.
    pub fn reset_progress(&mut self) {
        for col in &mut self.columns {
            for cell in col.iter_mut() {
                cell.reset_visited();
                if cell.kind() == CellKind::Start {
                    cell.mark_visited();
                }
            }
        }
    }

    /// Number of cells that still need a visit.
    pub fn unvisited_remaining(&self) -> usize {
        self.cells()
            .filter(|(_, c)| c.kind().must_visit() && !c.is_visited())
            .count()
    }
}

/// Build a grid from a row-wise diagram.
/// Legend:  'S'=Start  'F'=Finish  '.'=Empty  '#'=Wall  ' '=Background
#[cfg(test)]
pub fn diagram(rows: &[&str]) -> Grid {
    let height = rows.len();
    let width = rows[0].chars().count();
    let mut columns = vec![Vec::with_capacity(height); width];
    for row in rows {
        for (x, ch) in row.chars().enumerate() {
            columns[x].push(match ch {
                'S' => CellKind::Start,
                'F' => CellKind::Finish,
                '.' => CellKind::Empty,
                '#' => CellKind::Wall,
                _   => CellKind::Background,
            });
        }
    }
    Grid::from_columns(columns).expect("diagram must be rectangular")
}
