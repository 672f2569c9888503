use thiserror::Error;

use crate::constants::{BOARD_HEIGHT, BOARD_WIDTH};
use crate::types::CellType;

/// Board template, one row per string. `#` wall, `.` pellet, `o` power pellet,
/// `-` ghost-house door, space empty. Row 10 is the tunnel row: both edges are
/// open and wrap horizontally.
pub const MAZE_TEMPLATE: [&str; 21] = [
    "###################",
    "#o.......#.......o#",
    "#.##.###.#.###.##.#",
    "#.................#",
    "#.##.#.#####.#.##.#",
    "#....#...#...#....#",
    "####.###.#.###.####",
    "####.#.......#.####",
    "####.#.##-##.#.####",
    "#....#.#   #.#....#",
    "       #   #       ",
    "####.#.#####.#.####",
    "####.#.......#.####",
    "####.#.#####.#.####",
    "#........#........#",
    "#.##.###. .###.##.#",
    "#o...#...#...#...o#",
    "#.##.#.#####.#.##.#",
    "#....#...#...#....#",
    "#.................#",
    "###################",
];

#[derive(Debug, Error, PartialEq, Eq)]
pub enum MazeError {
    #[error("maze has {found} rows, expected {expected}")]
    BadHeight { found: usize, expected: usize },
    #[error("maze row {row} is {found} cells wide, expected {expected}")]
    BadWidth {
        row: usize,
        found: usize,
        expected: usize,
    },
    #[error("maze row {row} contains unknown tile {tile:?}")]
    UnknownTile { row: usize, tile: char },
}

#[derive(Clone, Debug)]
pub struct MazeGrid {
    cells: Vec<Vec<CellType>>,
}

impl MazeGrid {
    pub fn new() -> Result<Self, MazeError> {
        Self::from_template(&MAZE_TEMPLATE)
    }

    pub fn from_template(template: &[&str]) -> Result<Self, MazeError> {
        if template.len() != BOARD_HEIGHT as usize {
            return Err(MazeError::BadHeight {
                found: template.len(),
                expected: BOARD_HEIGHT as usize,
            });
        }

        let mut cells = Vec::with_capacity(template.len());
        for (row, line) in template.iter().enumerate() {
            let width = line.chars().count();
            if width != BOARD_WIDTH as usize {
                return Err(MazeError::BadWidth {
                    row,
                    found: width,
                    expected: BOARD_WIDTH as usize,
                });
            }
            let mut out = Vec::with_capacity(width);
            for tile in line.chars() {
                out.push(match tile {
                    '#' => CellType::Wall,
                    '.' => CellType::Pellet,
                    'o' => CellType::PowerPellet,
                    '-' => CellType::Door,
                    ' ' => CellType::Empty,
                    other => return Err(MazeError::UnknownTile { row, tile: other }),
                });
            }
            cells.push(out);
        }

        Ok(Self { cells })
    }

    /// Bounds-checked lookup. Out-of-bounds fails closed as WALL so collision
    /// callers treat the outside as blocking.
    pub fn cell_at(&self, x: i32, y: i32) -> CellType {
        if x < 0 || y < 0 || x >= BOARD_WIDTH || y >= BOARD_HEIGHT {
            return CellType::Wall;
        }
        self.cells[y as usize][x as usize]
    }

    /// Clears a PELLET/POWER_PELLET cell. No-op on anything else.
    pub fn consume_pellet(&mut self, x: i32, y: i32) {
        if self.cell_at(x, y).is_pellet() {
            self.cells[y as usize][x as usize] = CellType::Empty;
        }
    }

    pub fn count_pellets(&self) -> i32 {
        self.cells
            .iter()
            .flatten()
            .filter(|cell| cell.is_pellet())
            .count() as i32
    }
}
