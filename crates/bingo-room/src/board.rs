//! Board engine and win validation. Pure functions, no I/O.
//!
//! Board values run 1..=25 and have nothing to do with the 1..=75 call
//! pool; a cell counts as marked on a claim only if the number printed in
//! it has been called.

use bingo_protocol::{Board, MarkedCell, BOARD_CELLS};
use rand::seq::SliceRandom;

use crate::RoomError;

/// Side length of the square board.
const SIDE: usize = 5;

/// Every winning line as cell indices: 5 rows, 5 columns, 2 diagonals.
pub const LINES: [[usize; SIDE]; 12] = [
    [0, 1, 2, 3, 4],
    [5, 6, 7, 8, 9],
    [10, 11, 12, 13, 14],
    [15, 16, 17, 18, 19],
    [20, 21, 22, 23, 24],
    [0, 5, 10, 15, 20],
    [1, 6, 11, 16, 21],
    [2, 7, 12, 17, 22],
    [3, 8, 13, 18, 23],
    [4, 9, 14, 19, 24],
    [0, 6, 12, 18, 24],
    [4, 8, 12, 16, 20],
];

/// Returns a uniformly random permutation of 1..=25.
pub fn random_board() -> Board {
    let mut cells: Vec<u8> = (1..=BOARD_CELLS as u8).collect();
    cells.shuffle(&mut rand::rng());
    Board::from_cells(cells)
}

/// Places the next sequential value into `cell_index`.
///
/// The n-th filled cell always receives `n`, so a full board is a
/// permutation of 1..=25 by construction. An empty board is treated as
/// all-unfilled. Returns the new board and the value placed.
///
/// # Errors
/// - [`RoomError::InvalidCell`]: index outside the board
/// - [`RoomError::BoardFull`]: all 25 cells already hold a value
/// - [`RoomError::CellFilled`]: the target cell already holds a value
pub fn fill_next(board: &Board, cell_index: u32) -> Result<(Board, u8), RoomError> {
    let index = usize::try_from(cell_index)
        .ok()
        .filter(|&i| i < BOARD_CELLS)
        .ok_or(RoomError::InvalidCell(cell_index))?;

    let current = if board.is_empty() {
        Board::blank()
    } else {
        let mut cells = board.cells().to_vec();
        cells.resize(BOARD_CELLS, 0);
        Board::from_cells(cells)
    };

    let filled = current.filled_count();
    if filled >= BOARD_CELLS {
        return Err(RoomError::BoardFull);
    }
    if current.cells()[index] != 0 {
        return Err(RoomError::CellFilled);
    }

    // filled < 25, so this fits in a u8.
    let value = filled as u8 + 1;
    let mut cells = current.into_cells();
    cells[index] = value;
    Ok((Board::from_cells(cells), value))
}

/// Returns `true` if every cell holds a distinct value in 1..=25.
pub fn is_playable(board: &Board) -> bool {
    let mut seen = [false; BOARD_CELLS];
    board.is_complete()
        && board.cells().iter().all(|&v| {
            match seen.get_mut(usize::from(v).wrapping_sub(1)) {
                Some(slot) if !*slot => {
                    *slot = true;
                    true
                }
                _ => false,
            }
        })
}

/// Counts how many of the 12 lines are fully marked.
pub fn count_lines(marked: &[bool; BOARD_CELLS]) -> usize {
    LINES
        .iter()
        .filter(|line| line.iter().all(|&i| marked[i]))
        .count()
}

/// Result of checking a bingo claim.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClaimOutcome {
    pub valid: bool,
    /// Completed lines; zero if any mark was forged.
    pub lines: usize,
}

/// Checks a claim against the numbers called so far.
///
/// Every marked cell must hold a called number. A single forged mark
/// voids the whole claim with zero lines. Cells past the 25th are checked
/// for forgery but never count toward a line.
pub fn validate_claim(
    drawn: &[u8],
    board_state: &[MarkedCell],
    lines_to_win: usize,
) -> ClaimOutcome {
    let mut marked = [false; BOARD_CELLS];

    for (index, cell) in board_state.iter().enumerate() {
        if !cell.marked {
            continue;
        }
        let called = cell
            .number
            .is_some_and(|n| drawn.iter().any(|&d| u32::from(d) == n));
        if !called {
            return ClaimOutcome {
                valid: false,
                lines: 0,
            };
        }
        if let Some(slot) = marked.get_mut(index) {
            *slot = true;
        }
    }

    let lines = count_lines(&marked);
    ClaimOutcome {
        valid: lines >= lines_to_win,
        lines,
    }
}
