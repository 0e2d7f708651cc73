use std::fmt;

use crate::constants::{H, W, bit_index};
use crate::state::State;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Disc {
    First,
    Second,
}

impl Disc {
    pub fn other(self) -> Self {
        match self {
            Disc::First => Disc::Second,
            Disc::Second => Disc::First,
        }
    }
}

/// Plain 2D view of a position, row 0 at the bottom.
pub struct Grid {
    cells: [Option<Disc>; H * W],
}

impl Grid {
    pub fn new() -> Self {
        Self {
            cells: [None; H * W],
        }
    }

    pub fn from_state(state: &State) -> Self {
        let to_move = if state.is_first() {
            Disc::First
        } else {
            Disc::Second
        };
        let mut grid = Self::new();
        for col in 0..W {
            for row in 0..H {
                let bit = 1u64 << bit_index(col, row);
                if state.own_stones() & bit != 0 {
                    grid.set(col, row, to_move);
                } else if state.all_stones() & bit != 0 {
                    grid.set(col, row, to_move.other());
                }
            }
        }
        grid
    }

    fn idx(col: usize, row: usize) -> usize {
        row * W + col
    }

    pub fn get(&self, col: usize, row: usize) -> Option<Disc> {
        if col >= W || row >= H {
            return None;
        }
        self.cells[Self::idx(col, row)]
    }

    /// Place `disc` at `(col, row)`. Off-board coordinates are ignored.
    pub fn set(&mut self, col: usize, row: usize, disc: Disc) {
        if col >= W || row >= H {
            return;
        }
        self.cells[Self::idx(col, row)] = Some(disc);
    }

    /// Scan every cell for four of `disc` in a line.
    pub fn has_four(&self, disc: Disc) -> bool {
        const DIRECTIONS: [(isize, isize); 4] = [(1, 0), (0, 1), (1, 1), (1, -1)];
        for col in 0..W as isize {
            for row in 0..H as isize {
                for (dc, dr) in DIRECTIONS {
                    let run = (0..4).all(|k| {
                        let c = col + dc * k;
                        let r = row + dr * k;
                        c >= 0 && r >= 0 && self.get(c as usize, r as usize) == Some(disc)
                    });
                    if run {
                        return true;
                    }
                }
            }
        }
        false
    }
}

impl Default for Grid {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for Grid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for row in (0..H).rev() {
            for col in 0..W {
                let ch = match self.get(col, row) {
                    Some(Disc::First) => 'X',
                    Some(Disc::Second) => 'O',
                    None => '.',
                };
                write!(f, "{ch} ")?;
            }
            writeln!(f)?;
        }
        for col in 0..W {
            write!(f, "{col} ")?;
        }
        writeln!(f)
    }
}
