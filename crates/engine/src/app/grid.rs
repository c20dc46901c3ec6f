use thiserror::Error;

pub const WALL_SYMBOL: char = '*';
pub const OPEN_SYMBOL: char = ' ';
pub const DOOR_SYMBOL: char = 'd';
pub const SPAWN_SYMBOL: char = 'o';
pub const EXIT_SYMBOL: char = 'f';

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Cell {
    Open,
    Wall,
    Door,
}

impl Cell {
    pub fn symbol(self) -> char {
        match self {
            Cell::Open => OPEN_SYMBOL,
            Cell::Wall => WALL_SYMBOL,
            Cell::Door => DOOR_SYMBOL,
        }
    }

    /// Walls and closed doors stop the player.
    pub fn is_blocking(self) -> bool {
        matches!(self, Cell::Wall | Cell::Door)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CellCoord {
    pub x: u32,
    pub y: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GridError {
    #[error("grid has no cells")]
    Empty,
    #[error("grid row {row} has {actual} cells, expected {expected}")]
    RaggedRow {
        row: usize,
        expected: usize,
        actual: usize,
    },
    #[error("unknown grid symbol {symbol:?} at row {row}, column {column}")]
    UnknownSymbol {
        row: usize,
        column: usize,
        symbol: char,
    },
    #[error("cell count mismatch: expected {expected}, got {actual}")]
    CellCountMismatch { expected: usize, actual: usize },
}

/// Level collision grid.
///
/// Coordinate convention:
/// - Row `y` of the grid runs along world Z, column `x` along world X.
/// - A world point maps to `round(clamp(world + offset, 0, size - 1))` on each
///   axis, so every query lands on exactly one cell and out-of-range points
///   are absorbed by the nearest edge cell.
#[derive(Debug, Clone, PartialEq)]
pub struct GridMap {
    width: u32,
    height: u32,
    offset_x: f32,
    offset_z: f32,
    cells: Vec<Cell>,
    spawn: Option<CellCoord>,
    exit: Option<CellCoord>,
}

impl GridMap {
    pub fn new(
        width: u32,
        height: u32,
        offset_x: f32,
        offset_z: f32,
        cells: Vec<Cell>,
    ) -> Result<Self, GridError> {
        if width == 0 || height == 0 {
            return Err(GridError::Empty);
        }
        let expected = width as usize * height as usize;
        let actual = cells.len();
        if expected != actual {
            return Err(GridError::CellCountMismatch { expected, actual });
        }
        Ok(Self {
            width,
            height,
            offset_x,
            offset_z,
            cells,
            spawn: None,
            exit: None,
        })
    }

    /// Parses authoring rows of `'*'` (wall), `' '` (open), `'d'` (door),
    /// `'o'` (open, player start) and `'f'` (open, exit).
    pub fn from_rows<S: AsRef<str>>(
        rows: &[S],
        offset_x: f32,
        offset_z: f32,
    ) -> Result<Self, GridError> {
        let Some(first) = rows.first() else {
            return Err(GridError::Empty);
        };
        let width = first.as_ref().chars().count();
        if width == 0 {
            return Err(GridError::Empty);
        }

        let mut cells = Vec::with_capacity(width * rows.len());
        let mut spawn = None;
        let mut exit = None;
        for (row, line) in rows.iter().enumerate() {
            let line = line.as_ref();
            let actual = line.chars().count();
            if actual != width {
                return Err(GridError::RaggedRow {
                    row,
                    expected: width,
                    actual,
                });
            }
            for (column, symbol) in line.chars().enumerate() {
                let coord = CellCoord {
                    x: column as u32,
                    y: row as u32,
                };
                let cell = match symbol {
                    WALL_SYMBOL => Cell::Wall,
                    OPEN_SYMBOL => Cell::Open,
                    DOOR_SYMBOL => Cell::Door,
                    SPAWN_SYMBOL => {
                        spawn = Some(coord);
                        Cell::Open
                    }
                    EXIT_SYMBOL => {
                        exit = Some(coord);
                        Cell::Open
                    }
                    other => {
                        return Err(GridError::UnknownSymbol {
                            row,
                            column,
                            symbol: other,
                        })
                    }
                };
                cells.push(cell);
            }
        }

        let mut grid = Self::new(width as u32, rows.len() as u32, offset_x, offset_z, cells)?;
        grid.spawn = spawn;
        grid.exit = exit;
        Ok(grid)
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn offset(&self) -> (f32, f32) {
        (self.offset_x, self.offset_z)
    }

    pub fn spawn_cell(&self) -> Option<CellCoord> {
        self.spawn
    }

    pub fn exit_cell(&self) -> Option<CellCoord> {
        self.exit
    }

    pub fn index_of(&self, coord: CellCoord) -> Option<usize> {
        if coord.x >= self.width || coord.y >= self.height {
            return None;
        }
        Some(coord.y as usize * self.width as usize + coord.x as usize)
    }

    pub fn world_to_cell(&self, world_x: f32, world_z: f32) -> CellCoord {
        CellCoord {
            x: clamp_axis(world_x + self.offset_x, self.width),
            y: clamp_axis(world_z + self.offset_z, self.height),
        }
    }

    /// Inverse of [`GridMap::world_to_cell`] for in-range cells: the world
    /// X/Z that rounds exactly onto `coord`.
    pub fn cell_center_world(&self, coord: CellCoord) -> (f32, f32) {
        (
            coord.x as f32 - self.offset_x,
            coord.y as f32 - self.offset_z,
        )
    }

    pub fn cell(&self, coord: CellCoord) -> Option<Cell> {
        self.index_of(coord)
            .and_then(|index| self.cells.get(index).copied())
    }

    pub fn cell_at(&self, world_x: f32, world_z: f32) -> Cell {
        let coord = self.world_to_cell(world_x, world_z);
        // world_to_cell always yields an in-range coordinate.
        self.cell(coord).unwrap_or(Cell::Wall)
    }

    pub fn set_cell_at(&mut self, coord: CellCoord, cell: Cell) -> bool {
        let Some(index) = self.index_of(coord) else {
            return false;
        };
        self.cells[index] = cell;
        true
    }

    pub fn set_cell(&mut self, world_x: f32, world_z: f32, cell: Cell) {
        let coord = self.world_to_cell(world_x, world_z);
        self.set_cell_at(coord, cell);
    }

    pub fn row_string(&self, y: u32) -> Option<String> {
        if y >= self.height {
            return None;
        }
        let start = y as usize * self.width as usize;
        let end = start + self.width as usize;
        Some(self.cells[start..end].iter().map(|cell| cell.symbol()).collect())
    }
}

fn clamp_axis(value: f32, size: u32) -> u32 {
    let max = size.saturating_sub(1) as f32;
    // NaN falls through clamp unchanged and saturates to 0 on the cast.
    value.clamp(0.0, max).round() as u32
}
