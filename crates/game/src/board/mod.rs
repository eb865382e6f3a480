mod grid;
mod rules;

pub use grid::{Board, Cell, Mark, MoveRejection, BOARD_SIZE, CELL_COUNT};
pub use rules::{parse_position, Outcome, LINES};
