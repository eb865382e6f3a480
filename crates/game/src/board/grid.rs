use std::fmt;

pub const BOARD_SIZE: usize = 3;
pub const CELL_COUNT: usize = BOARD_SIZE * BOARD_SIZE;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Mark {
    X,
    O,
}

impl Mark {
    pub const ALL: [Mark; 2] = [Mark::X, Mark::O];

    pub fn opponent(self) -> Mark {
        match self {
            Mark::X => Mark::O,
            Mark::O => Mark::X,
        }
    }

    pub fn as_char(self) -> char {
        match self {
            Mark::X => 'X',
            Mark::O => 'O',
        }
    }

    pub fn index(self) -> usize {
        match self {
            Mark::X => 0,
            Mark::O => 1,
        }
    }
}

impl fmt::Display for Mark {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_char())
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum Cell {
    #[default]
    Empty,
    X,
    O,
}

impl Cell {
    pub fn mark(self) -> Option<Mark> {
        match self {
            Cell::Empty => None,
            Cell::X => Some(Mark::X),
            Cell::O => Some(Mark::O),
        }
    }

    pub fn is_empty(self) -> bool {
        self == Cell::Empty
    }

    pub fn as_char(self) -> char {
        self.mark().map_or(' ', Mark::as_char)
    }
}

impl From<Mark> for Cell {
    fn from(mark: Mark) -> Self {
        match mark {
            Mark::X => Cell::X,
            Mark::O => Cell::O,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum MoveRejection {
    #[error("position {0} is outside 1..=9")]
    OutOfRange(i64),
    #[error("position {0} is already taken")]
    Occupied(usize),
}

/// 3x3 grid addressed either by `(row, col)` or by the 1-based position used
/// on the wire, where position `p` lives at `((p - 1) / 3, (p - 1) % 3)`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Board {
    cells: [[Cell; BOARD_SIZE]; BOARD_SIZE],
}

impl Board {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reset(&mut self) {
        self.cells = [[Cell::Empty; BOARD_SIZE]; BOARD_SIZE];
    }

    pub fn cell(&self, row: usize, col: usize) -> Cell {
        self.cells[row][col]
    }

    pub fn rows(&self) -> &[[Cell; BOARD_SIZE]; BOARD_SIZE] {
        &self.cells
    }

    pub fn cells(&self) -> impl Iterator<Item = Cell> + '_ {
        self.cells.iter().flatten().copied()
    }

    #[cfg(test)]
    pub fn at(&self, position: usize) -> Option<Cell> {
        let (row, col) = Self::coordinates(position)?;
        Some(self.cells[row][col])
    }

    pub fn is_full(&self) -> bool {
        self.cells().all(|cell| !cell.is_empty())
    }

    #[cfg(test)]
    pub fn empty_count(&self) -> usize {
        self.cells().filter(|cell| cell.is_empty()).count()
    }

    /// Places `mark` at `position`. A rejected move leaves the board untouched.
    pub fn apply(&mut self, mark: Mark, position: i64) -> Result<(), MoveRejection> {
        let Some((row, col)) = usize::try_from(position)
            .ok()
            .and_then(Self::coordinates)
        else {
            return Err(MoveRejection::OutOfRange(position));
        };

        let cell = &mut self.cells[row][col];
        if !cell.is_empty() {
            return Err(MoveRejection::Occupied(position as usize));
        }

        *cell = Cell::from(mark);
        Ok(())
    }

    fn coordinates(position: usize) -> Option<(usize, usize)> {
        if !(1..=CELL_COUNT).contains(&position) {
            return None;
        }
        let index = position - 1;
        Some((index / BOARD_SIZE, index % BOARD_SIZE))
    }
}
