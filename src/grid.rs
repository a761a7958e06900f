//! Maze cell storage and the rules for sizing it.

use std::fmt;

/// Smallest accepted viewport width in cells before falling back.
pub const MIN_COLS: usize = 15;
/// Smallest accepted viewport height in cells before falling back.
pub const MIN_ROWS: usize = 11;
pub const FALLBACK_COLS: usize = 21;
pub const FALLBACK_ROWS: usize = 15;

/// Carving starts here, and so does the player.
pub const START: Pos = Pos { x: 1, y: 1 };

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Tile {
    Wall,
    Floor,
    Exit,
    FragmentNode,
}

impl Tile {
    pub fn is_passable(self) -> bool {
        self != Tile::Wall
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Pos {
    pub x: usize,
    pub y: usize,
}

impl Pos {
    pub const fn new(x: usize, y: usize) -> Self {
        Self { x, y }
    }

    /// Neighbouring position `steps` cells away, or `None` below zero.
    pub fn offset(self, dir: Dir, steps: isize) -> Option<Pos> {
        let (dx, dy) = dir.delta();
        let nx = self.x as isize + dx * steps;
        let ny = self.y as isize + dy * steps;
        if nx < 0 || ny < 0 {
            return None;
        }
        Some(Pos {
            x: nx as usize,
            y: ny as usize,
        })
    }
}

impl fmt::Display for Pos {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Dir {
    Up,
    Down,
    Left,
    Right,
}

impl Dir {
    /// Neighbour expansion order used by every breadth-first search.
    pub const ALL: [Dir; 4] = [Dir::Right, Dir::Left, Dir::Down, Dir::Up];

    pub fn delta(self) -> (isize, isize) {
        match self {
            Dir::Up => (0, -1),
            Dir::Down => (0, 1),
            Dir::Left => (-1, 0),
            Dir::Right => (1, 0),
        }
    }
}

/// Grid dimensions. Always odd and at least `MIN_COLS` x `MIN_ROWS`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GridDims {
    cols: usize,
    rows: usize,
}

impl GridDims {
    /// Derive grid dimensions from a viewport measured in whole cells.
    ///
    /// A viewport narrower than `MIN_COLS` (or shorter than `MIN_ROWS`) falls
    /// back to `FALLBACK_COLS` (`FALLBACK_ROWS`); even sizes lose one cell so
    /// the two-step carver keeps a wall between parallel corridors.
    pub fn from_viewport(cols: usize, rows: usize) -> Self {
        let cols = if cols >= MIN_COLS { cols } else { FALLBACK_COLS };
        let rows = if rows >= MIN_ROWS { rows } else { FALLBACK_ROWS };
        Self {
            cols: force_odd(cols),
            rows: force_odd(rows),
        }
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    pub fn rows(&self) -> usize {
        self.rows
    }
}

impl Default for GridDims {
    fn default() -> Self {
        Self::from_viewport(FALLBACK_COLS, FALLBACK_ROWS)
    }
}

fn force_odd(n: usize) -> usize {
    if n % 2 == 1 {
        n
    } else {
        n - 1
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Grid {
    width: usize,
    height: usize,
    cells: Vec<Vec<Tile>>,
}

impl Grid {
    pub fn filled(dims: GridDims, tile: Tile) -> Self {
        Self {
            width: dims.cols(),
            height: dims.rows(),
            cells: vec![vec![tile; dims.cols()]; dims.rows()],
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn dims(&self) -> GridDims {
        GridDims {
            cols: self.width,
            rows: self.height,
        }
    }

    /// Cell at signed coordinates. `None` means off the edge of the world,
    /// which callers must not confuse with a real `Wall`.
    pub fn cell_at(&self, col: isize, row: isize) -> Option<Tile> {
        if col < 0 || row < 0 {
            return None;
        }
        self.tile(Pos::new(col as usize, row as usize))
    }

    pub fn tile(&self, pos: Pos) -> Option<Tile> {
        self.cells.get(pos.y).and_then(|row| row.get(pos.x)).copied()
    }

    /// Overwrite a cell in place. Returns `false` if `pos` is out of bounds.
    pub fn set_cell(&mut self, pos: Pos, tile: Tile) -> bool {
        match self.cells.get_mut(pos.y).and_then(|row| row.get_mut(pos.x)) {
            Some(cell) => {
                *cell = tile;
                true
            }
            None => false,
        }
    }

    pub fn in_bounds(&self, pos: Pos) -> bool {
        pos.x < self.width && pos.y < self.height
    }

    /// Inside the bounds and off the outer wall ring.
    pub fn is_interior(&self, pos: Pos) -> bool {
        pos.x > 0 && pos.y > 0 && pos.x + 1 < self.width && pos.y + 1 < self.height
    }

    pub fn is_border(&self, pos: Pos) -> bool {
        self.in_bounds(pos) && !self.is_interior(pos)
    }

    /// Movement predicate: in bounds and not a wall.
    pub fn can_occupy(&self, col: isize, row: isize) -> bool {
        self.cell_at(col, row).is_some_and(Tile::is_passable)
    }

    pub fn is_passable(&self, pos: Pos) -> bool {
        self.tile(pos).is_some_and(Tile::is_passable)
    }

    /// Row-major scan for the exit cell.
    pub fn find_exit(&self) -> Option<Pos> {
        self.positions_of(Tile::Exit).into_iter().next()
    }

    pub fn positions_of(&self, tile: Tile) -> Vec<Pos> {
        let mut found = Vec::new();
        for (y, row) in self.cells.iter().enumerate() {
            for (x, cell) in row.iter().enumerate() {
                if *cell == tile {
                    found.push(Pos { x, y });
                }
            }
        }
        found
    }

    pub fn count(&self, tile: Tile) -> usize {
        self.cells
            .iter()
            .flat_map(|row| row.iter())
            .filter(|&&cell| cell == tile)
            .count()
    }

    /// In-bounds 4-neighbours of `pos`, in `Dir::ALL` order.
    pub fn neighbors(&self, pos: Pos) -> impl Iterator<Item = Pos> + '_ {
        Dir::ALL
            .into_iter()
            .filter_map(move |dir| pos.offset(dir, 1))
            .filter(move |next| self.in_bounds(*next))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn viewport_dims_are_odd_and_at_least_minimum() {
        for cols in 0..80 {
            for rows in 0..50 {
                let dims = GridDims::from_viewport(cols, rows);
                assert_eq!(dims.cols() % 2, 1, "cols {cols}");
                assert_eq!(dims.rows() % 2, 1, "rows {rows}");
                assert!(dims.cols() >= MIN_COLS);
                assert!(dims.rows() >= MIN_ROWS);
            }
        }
    }

    #[test]
    fn small_viewport_falls_back() {
        let dims = GridDims::from_viewport(14, 10);
        assert_eq!((dims.cols(), dims.rows()), (21, 15));
        let dims = GridDims::from_viewport(16, 12);
        assert_eq!((dims.cols(), dims.rows()), (15, 11));
        let dims = GridDims::from_viewport(40, 25);
        assert_eq!((dims.cols(), dims.rows()), (39, 25));
    }

    #[test]
    fn out_of_bounds_is_not_a_wall() {
        let grid = Grid::filled(GridDims::default(), Tile::Wall);
        assert_eq!(grid.cell_at(0, 0), Some(Tile::Wall));
        assert_eq!(grid.cell_at(-1, 0), None);
        assert_eq!(grid.cell_at(0, -1), None);
        assert_eq!(grid.cell_at(21, 0), None);
        assert_eq!(grid.cell_at(0, 15), None);
        assert!(!grid.can_occupy(-1, 3));
    }

    #[test]
    fn set_cell_reports_bounds() {
        let mut grid = Grid::filled(GridDims::default(), Tile::Wall);
        assert!(grid.set_cell(Pos::new(3, 3), Tile::Floor));
        assert_eq!(grid.tile(Pos::new(3, 3)), Some(Tile::Floor));
        assert!(grid.can_occupy(3, 3));
        assert!(!grid.set_cell(Pos::new(99, 3), Tile::Floor));
        assert_eq!(grid.count(Tile::Floor), 1);
    }

    #[test]
    fn border_and_interior_partition_the_grid() {
        let grid = Grid::filled(GridDims::default(), Tile::Wall);
        assert!(grid.is_border(Pos::new(0, 5)));
        assert!(grid.is_border(Pos::new(20, 14)));
        assert!(grid.is_interior(Pos::new(1, 1)));
        assert!(grid.is_interior(Pos::new(19, 13)));
        assert!(!grid.is_border(Pos::new(21, 5)));
    }

    #[test]
    fn neighbors_skip_negative_and_outside() {
        let grid = Grid::filled(GridDims::default(), Tile::Wall);
        let corner: Vec<Pos> = grid.neighbors(Pos::new(0, 0)).collect();
        assert_eq!(corner, vec![Pos::new(1, 0), Pos::new(0, 1)]);
    }
}
