use std::cmp::Ordering;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Represents a 2D coordinate on the minesweeper board.
///
/// Locations order row-major, `(y, x)`, which is the order every board scan
/// visits them in and the order used to break ties between guesses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Location {
    pub x: usize,
    pub y: usize,
}

impl Location {
    pub fn new(x: usize, y: usize) -> Self {
        Location { x, y }
    }
}

impl Ord for Location {
    fn cmp(&self, other: &Self) -> Ordering {
        (self.y, self.x).cmp(&(other.y, other.x))
    }
}

impl PartialOrd for Location {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// The visible state of a single cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Cell {
    Unknown,
    Revealed(u8), // The u8 is the number of adjacent mines.
    /// Either a mine confirmed by the server or one deduced by the solver.
    MarkedBomb,
}

/// Outcome of a single game.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum GameStatus {
    InProgress,
    Won,
    Lost,
    /// Declared by the solver when no certain or rankable move is left.
    Unsure,
}

impl GameStatus {
    pub fn is_terminal(self) -> bool {
        self != GameStatus::InProgress
    }
}

impl fmt::Display for GameStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            GameStatus::InProgress => "in progress",
            GameStatus::Won => "won",
            GameStatus::Lost => "lost",
            GameStatus::Unsure => "unsure",
        };
        f.write_str(name)
    }
}

/// A row-major grid of cell states plus the mine count fixed at creation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Board {
    width: usize,
    height: usize,
    cells: Vec<Cell>,
    mines_total: usize,
}

impl Board {
    /// A board with every cell still unknown.
    pub fn new(width: usize, height: usize, mines_total: usize) -> Self {
        Board {
            width,
            height,
            cells: vec![Cell::Unknown; width * height],
            mines_total,
        }
    }

    /// Builds a board from row-major cells. Returns `None` when the cell count
    /// does not match the dimensions or a revealed count exceeds 8.
    pub fn from_cells(
        width: usize,
        height: usize,
        mines_total: usize,
        cells: Vec<Cell>,
    ) -> Option<Self> {
        if width.checked_mul(height) != Some(cells.len()) {
            return None;
        }
        if cells.iter().any(|&cell| matches!(cell, Cell::Revealed(n) if n > 8)) {
            return None;
        }
        Some(Board {
            width,
            height,
            cells,
            mines_total,
        })
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn mines_total(&self) -> usize {
        self.mines_total
    }

    pub fn cells(&self) -> &[Cell] {
        &self.cells
    }

    pub fn contains(&self, at: Location) -> bool {
        at.x < self.width && at.y < self.height
    }

    /// The board centre, where every game opens.
    pub fn center(&self) -> Location {
        Location::new(self.width / 2, self.height / 2)
    }

    pub fn get(&self, at: Location) -> Cell {
        self.cells[self.offset(at)]
    }

    pub fn set(&mut self, at: Location, cell: Cell) {
        let offset = self.offset(at);
        self.cells[offset] = cell;
    }

    pub fn is_unknown(&self, at: Location) -> bool {
        self.get(at) == Cell::Unknown
    }

    fn offset(&self, at: Location) -> usize {
        at.y * self.width + at.x
    }

    /// Every location in row-major order.
    pub fn locations(&self) -> impl Iterator<Item = Location> + use<> {
        let width = self.width;
        (0..self.width * self.height).map(move |offset| Location::new(offset % width, offset / width))
    }

    /// Revealed numbered cells with their counts, row-major.
    pub fn numbered(&self) -> impl Iterator<Item = (Location, u8)> + '_ {
        self.locations().filter_map(|at| match self.get(at) {
            Cell::Revealed(count) => Some((at, count)),
            _ => None,
        })
    }

    /// All valid neighbour coordinates of `at`, handling edges and corners.
    pub fn neighbors(&self, at: Location) -> impl Iterator<Item = Location> + use<> {
        let width = self.width as isize;
        let height = self.height as isize;

        (-1..=1).flat_map(move |dy| {
            (-1..=1).filter_map(move |dx| {
                if dx == 0 && dy == 0 {
                    return None;
                }
                let nx = at.x as isize + dx;
                let ny = at.y as isize + dy;
                if nx >= 0 && nx < width && ny >= 0 && ny < height {
                    Some(Location::new(nx as usize, ny as usize))
                } else {
                    None
                }
            })
        })
    }

    pub fn unknowns_around(&self, at: Location) -> Vec<Location> {
        self.cells_around(at, Cell::Unknown)
    }

    pub fn bombs_around(&self, at: Location) -> Vec<Location> {
        self.cells_around(at, Cell::MarkedBomb)
    }

    fn cells_around(&self, at: Location, wanted: Cell) -> Vec<Location> {
        self.neighbors(at)
            .filter(|&neighbor| self.get(neighbor) == wanted)
            .collect()
    }

    /// Overlays deduced bombs. Only unknown cells are converted so a later
    /// server reveal is never hidden behind a stale mark.
    pub fn overlay_bombs<'a>(&mut self, bombs: impl IntoIterator<Item = &'a Location>) {
        for &at in bombs {
            if self.contains(at) && self.is_unknown(at) {
                self.set(at, Cell::MarkedBomb);
            }
        }
    }
}
