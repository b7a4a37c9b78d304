//! Canonical state representation and the state canonicalizer.
//!
//! Raw observations arrive as axis-aligned bounding boxes (or the terminal
//! sentinel) and are collapsed to the grid cell containing the box center.
//! This keeps the state space bounded at `grid_num² + 1` canonical keys no
//! matter how objects move within their cells.

use std::fmt;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Text rendering of the terminal state.
pub const FINISHED_KEY: &str = "finished";

/// Integer coordinates of one grid cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct GridCell {
    pub col: i32,
    pub row: i32,
}

impl GridCell {
    /// Creates a cell from column and row indices.
    pub fn new(col: i32, row: i32) -> Self {
        Self { col, row }
    }

    /// Manhattan distance to another cell.
    pub fn manhattan(&self, other: GridCell) -> i32 {
        (self.col - other.col).abs() + (self.row - other.row).abs()
    }
}

impl fmt::Display for GridCell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.col, self.row)
    }
}

/// Canonical key for one row of the Q-table.
///
/// `Opaque` is the degraded fallback for raw input that cannot be parsed as a
/// bounding box. It preserves the raw text so that a malformed input never
/// silently aliases a legitimate grid key.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum StateKey {
    /// A grid cell, derived from a bounding-box center.
    Cell(GridCell),
    /// The absorbing goal state.
    Finished,
    /// Unparseable raw input, kept verbatim.
    Opaque(String),
}

impl StateKey {
    /// Returns the grid cell for `Cell` keys, `None` otherwise.
    pub fn cell(&self) -> Option<GridCell> {
        match self {
            StateKey::Cell(c) => Some(*c),
            _ => None,
        }
    }

    /// Returns true for the terminal key.
    pub fn is_finished(&self) -> bool {
        matches!(self, StateKey::Finished)
    }
}

/// A raw observation as reported by the environment collaborator.
#[derive(Debug, Clone, PartialEq)]
pub enum Observation {
    /// Bounding box `[x0, y0, x1, y1]` of the observed object.
    Coords([f64; 4]),
    /// Terminal sentinel: the goal was reached.
    Finished,
    /// String-encoded observation, e.g. replayed from a persisted table.
    Text(String),
}

/// Maps raw observations to canonical [`StateKey`]s.
///
/// Owns the cell width so that it can both derive a cell from arbitrary
/// coordinates and render a cell back to its canonical bounding-box text.
#[derive(Debug, Clone, Copy)]
pub struct Canonicalizer {
    cell_width: f64,
}

impl Canonicalizer {
    /// Creates a canonicalizer for the given cell width.
    pub fn new(cell_width: f64) -> Self {
        Self { cell_width }
    }

    /// The configured cell width.
    pub fn cell_width(&self) -> f64 {
        self.cell_width
    }

    /// Returns the grid cell containing the center of a bounding box.
    pub fn cell_of_box(&self, b: &[f64; 4]) -> GridCell {
        let cx = (b[0] + b[2]) / 2.0;
        let cy = (b[1] + b[3]) / 2.0;
        GridCell::new(
            (cx / self.cell_width).floor() as i32,
            (cy / self.cell_width).floor() as i32,
        )
    }

    /// Normalizes a raw observation into a canonical key.
    ///
    /// Never fails: structured input that cannot be parsed degrades to
    /// [`StateKey::Opaque`].
    pub fn normalize(&self, obs: &Observation) -> StateKey {
        match obs {
            Observation::Finished => StateKey::Finished,
            Observation::Coords(b) => StateKey::Cell(self.cell_of_box(b)),
            Observation::Text(s) => self.parse(s),
        }
    }

    /// Parses a string-encoded state into a canonical key.
    ///
    /// Accepts the terminal sentinel, any `[x0, y0, x1, y1]` rendering
    /// (canonical or not; the cell is re-derived from the center), and falls
    /// back to [`StateKey::Opaque`] for anything else.
    pub fn parse(&self, text: &str) -> StateKey {
        let trimmed = text.trim();
        if trimmed == FINISHED_KEY {
            return StateKey::Finished;
        }
        if let Some(b) = parse_box(trimmed) {
            return StateKey::Cell(self.cell_of_box(&b));
        }
        StateKey::Opaque(trimmed.to_string())
    }

    /// Renders a key to its canonical text form.
    ///
    /// Cells expand to their bounding box with exactly one decimal digit per
    /// coordinate, so textual and structural inputs falling in the same cell
    /// render byte-identically.
    pub fn render(&self, key: &StateKey) -> String {
        match key {
            StateKey::Cell(c) => {
                let w = self.cell_width;
                let x0 = c.col as f64 * w;
                let y0 = c.row as f64 * w;
                format!(
                    "[{:.1}, {:.1}, {:.1}, {:.1}]",
                    x0,
                    y0,
                    x0 + w,
                    y0 + w
                )
            }
            StateKey::Finished => FINISHED_KEY.to_string(),
            StateKey::Opaque(s) => s.clone(),
        }
    }
}

/// Parses `[x0, y0, x1, y1]` into four floats, returning `None` on any
/// structural or numeric mismatch.
fn parse_box(text: &str) -> Option<[f64; 4]> {
    let inner = text.strip_prefix('[')?.strip_suffix(']')?;
    let mut out = [0.0f64; 4];
    let mut n = 0;
    for part in inner.split(',') {
        if n == 4 {
            return None; // too many elements
        }
        out[n] = part.trim().parse().ok()?;
        n += 1;
    }
    if n == 4 {
        Some(out)
    } else {
        None
    }
}
