//! Board geometry, bit layout and search parameters.
//!
//! The board is stored column-major: column `c` owns bits
//! `c * COLUMN_BITS .. (c + 1) * COLUMN_BITS`, row 0 at the bottom. The topmost
//! bit of every column is a guard that is never set, so carries from the
//! "lowest empty cell" addition cannot spill into the next column.
//!
//! ```text
//!  guard  6 13 20 27 34 41 48
//!  row 5  5 12 19 26 33 40 47
//!  ...
//!  row 0  0  7 14 21 28 35 42
//! ```

use std::time::Duration;

// =============================================================================
// Board Geometry
// =============================================================================

/// Number of playable rows.
pub const H: usize = 6;

/// Number of columns.
pub const W: usize = 7;

/// Bits reserved per column (playable rows plus the guard bit).
pub const COLUMN_BITS: usize = H + 1;

/// Number of cells on the board.
pub const CELLS: usize = H * W;

/// One bit at row 0 of every column.
pub const BOTTOM_MASK: u64 = 0b0000001_0000001_0000001_0000001_0000001_0000001_0000001;

/// Every playable cell set, guard bits clear.
pub const FULL_BOARD: u64 = 0b0111111_0111111_0111111_0111111_0111111_0111111_0111111;

/// Bit index of `(col, row)` in the column-major layout.
#[inline]
pub const fn bit_index(col: usize, row: usize) -> usize {
    col * COLUMN_BITS + row
}

/// The bit of the topmost playable cell of `col`.
#[inline]
pub const fn top_mask(col: usize) -> u64 {
    1 << bit_index(col, H - 1)
}

/// The bit of the bottom cell of `col`.
#[inline]
pub const fn bottom_mask(col: usize) -> u64 {
    1 << bit_index(col, 0)
}

/// Every playable bit of `col`.
#[inline]
pub const fn column_mask(col: usize) -> u64 {
    ((1 << H) - 1) << bit_index(col, 0)
}

/// Shifts used by the four-in-a-row test: vertical, two diagonals, horizontal.
pub const LINE_SHIFTS: [usize; 4] = [1, COLUMN_BITS - 1, COLUMN_BITS + 1, COLUMN_BITS];

// =============================================================================
// MCTS Parameters
// =============================================================================

/// UCB1 exploration constant.
pub const EXPLORATION: f64 = 1.0;

/// Visits a leaf needs before it is expanded.
pub const EXPAND_THRESHOLD: u32 = 1;

/// Default thinking time per move.
pub const DEFAULT_TIME_BUDGET: Duration = Duration::from_millis(500);
