//! Grid model for the link-match board.
//!
//! This module defines the board's fundamental components:
//! - `Position` and `Direction`: signed cell coordinates and the four orthogonal moves.
//! - `TileKind` / `Tile`: what occupies a cell and whether it is frozen.
//! - `Grid`: the fixed-size board, with accessors that treat out-of-bounds
//!   positions as "no tile" instead of panicking.
use crate::error::LevelError;
use crate::level::{parse_cell_code, LevelConfig};
use std::fmt;

/// A cell coordinate, `(column, row)`, with row 0 at the top of the board.
///
/// Coordinates are signed so that link paths can name cells on the border ring
/// (`-1` and `width`/`height`). Such positions are never inside a `Grid`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Position {
    pub col: i32,
    pub row: i32,
}

impl Position {
    pub const fn new(col: i32, row: i32) -> Self {
        Position { col, row }
    }

    /// The neighbouring position one step in `dir`.
    pub fn step(self, dir: Direction) -> Self {
        let (dc, dr) = dir.delta();
        Position::new(self.col + dc, self.row + dr)
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.col, self.row)
    }
}

/// One of the four orthogonal directions a link can travel in.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
}

impl Direction {
    pub const ALL: [Direction; 4] = [
        Direction::Up,
        Direction::Down,
        Direction::Left,
        Direction::Right,
    ];

    /// `(column delta, row delta)`. `Up` decreases the row because row 0 is the top.
    pub fn delta(self) -> (i32, i32) {
        match self {
            Direction::Up => (0, -1),
            Direction::Down => (0, 1),
            Direction::Left => (-1, 0),
            Direction::Right => (1, 0),
        }
    }

    pub fn opposite(self) -> Direction {
        match self {
            Direction::Up => Direction::Down,
            Direction::Down => Direction::Up,
            Direction::Left => Direction::Right,
            Direction::Right => Direction::Left,
        }
    }

    pub(crate) fn index(self) -> usize {
        match self {
            Direction::Up => 0,
            Direction::Down => 1,
            Direction::Left => 2,
            Direction::Right => 3,
        }
    }
}

/// What occupies a cell.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TileKind {
    /// Open space; links pass through it.
    Empty,
    /// A matchable tile of the given (positive) type.
    Normal(u16),
    /// Matches any other bomb and clears its orthogonal neighbours.
    Bomb,
    /// Permanent obstacle. Never linkable, never removed.
    Rock,
}

/// The category two tiles must share to be matched.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum MatchKey {
    Type(u16),
    Bomb,
}

impl TileKind {
    pub fn match_key(self) -> Option<MatchKey> {
        match self {
            TileKind::Normal(t) => Some(MatchKey::Type(t)),
            TileKind::Bomb => Some(MatchKey::Bomb),
            TileKind::Empty | TileKind::Rock => None,
        }
    }

    /// `true` for the kinds that count toward the win condition.
    pub fn is_piece(self) -> bool {
        matches!(self, TileKind::Normal(_) | TileKind::Bomb)
    }

    /// Returns the level-file cell code for this kind (`"00"`, `"ST"`, `"BB"`, `"07"`).
    ///
    /// # Examples
    ///
    /// ```
    /// use link_match::grid::TileKind;
    /// assert_eq!(TileKind::Normal(7).code(), "07");
    /// assert_eq!(TileKind::Rock.code(), "ST");
    /// ```
    pub fn code(self) -> String {
        match self {
            TileKind::Empty => "00".to_string(),
            TileKind::Normal(t) => format!("{:02}", t),
            TileKind::Bomb => "BB".to_string(),
            TileKind::Rock => "ST".to_string(),
        }
    }

    fn ansi_color_code(self) -> &'static str {
        match self {
            TileKind::Empty => "40",
            TileKind::Rock => "47",
            TileKind::Bomb => "41",
            TileKind::Normal(t) => match t % 5 {
                0 => "42",
                1 => "43",
                2 => "44",
                3 => "45",
                _ => "46",
            },
        }
    }
}

/// A cell of the grid.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Tile {
    pub kind: TileKind,
    pub position: Position,
    pub frozen: bool,
}

impl Tile {
    /// Builds a tile, dropping the frozen flag on kinds that can never be frozen
    /// (`Empty`, `Rock`, `Bomb`).
    pub fn new(kind: TileKind, position: Position, frozen: bool) -> Self {
        Tile {
            kind,
            position,
            frozen: frozen && matches!(kind, TileKind::Normal(_)),
        }
    }

    pub fn empty(position: Position) -> Self {
        Tile::new(TileKind::Empty, position, false)
    }

    /// A tile the player may pick: a bomb or normal tile that is not frozen.
    pub fn is_selectable(&self) -> bool {
        self.kind.is_piece() && !self.frozen
    }
}

/// A single gravity displacement.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TileMove {
    pub from: Position,
    pub to: Position,
}

/// The board: a `width x height` row-major array of tiles.
///
/// Every in-bounds position holds exactly one `Tile` (empty cells included).
/// Accessors given an out-of-bounds position return `None` / `false` and
/// leave the grid untouched.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Grid {
    width: usize,
    height: usize,
    tiles: Vec<Tile>,
}

impl Grid {
    /// Creates a grid where every cell is `TileKind::Empty`.
    ///
    /// # Examples
    /// ```
    /// use link_match::grid::{Grid, Position, TileKind};
    /// let grid = Grid::new_empty(3, 2);
    /// assert_eq!(grid.get(Position::new(2, 1)).unwrap().kind, TileKind::Empty);
    /// assert!(grid.get(Position::new(3, 0)).is_none());
    /// ```
    pub fn new_empty(width: usize, height: usize) -> Self {
        let mut tiles = Vec::with_capacity(width * height);
        for row in 0..height {
            for col in 0..width {
                tiles.push(Tile::empty(Position::new(col as i32, row as i32)));
            }
        }
        Grid {
            width,
            height,
            tiles,
        }
    }

    /// Populates a grid from a validated level description.
    pub fn from_level(level: &LevelConfig) -> Self {
        let mut grid = Grid::new_empty(level.width(), level.height());
        for (index, cell) in level.cells().iter().enumerate() {
            let pos = Position::new(
                (index % level.width()) as i32,
                (index / level.width()) as i32,
            );
            grid.set(pos, Tile::new(cell.kind, pos, cell.frozen));
        }
        grid
    }

    /// Builds a grid from rows of whitespace-separated cell codes.
    ///
    /// Unlike level loading, this is strict: the first row fixes the width, every
    /// row must match it, and any unrecognised code is an error. Any positive
    /// numeric type is accepted.
    ///
    /// # Examples
    /// ```
    /// use link_match::grid::{Grid, Position, TileKind};
    /// let grid = Grid::from_codes(&["05 00 05", "ST BB 03FZ"]).unwrap();
    /// assert_eq!(grid.get(Position::new(0, 0)).unwrap().kind, TileKind::Normal(5));
    /// assert_eq!(grid.get(Position::new(1, 1)).unwrap().kind, TileKind::Bomb);
    /// assert!(grid.get(Position::new(2, 1)).unwrap().frozen);
    ///
    /// assert!(Grid::from_codes(&["05 XX"]).is_err());
    /// assert!(Grid::from_codes(&["05 05", "05"]).is_err());
    /// ```
    pub fn from_codes(rows: &[&str]) -> Result<Self, LevelError> {
        let width = rows
            .first()
            .map(|r| r.split_whitespace().count())
            .unwrap_or(0);
        if width == 0 {
            return Err(LevelError::InvalidDimensions {
                width: 0,
                height: rows.len(),
            });
        }

        let mut grid = Grid::new_empty(width, rows.len());
        for (row, line) in rows.iter().enumerate() {
            let tokens: Vec<&str> = line.split_whitespace().collect();
            if tokens.len() != width {
                return Err(LevelError::RowWidth {
                    row,
                    expected: width,
                    found: tokens.len(),
                });
            }
            for (col, token) in tokens.iter().enumerate() {
                let cell = parse_cell_code(token, u16::MAX).map_err(|_| {
                    LevelError::InvalidCellCode {
                        row,
                        col,
                        token: token.to_string(),
                    }
                })?;
                let pos = Position::new(col as i32, row as i32);
                grid.set(pos, Tile::new(cell.kind, pos, cell.frozen));
            }
        }
        Ok(grid)
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn contains(&self, pos: Position) -> bool {
        pos.col >= 0
            && pos.row >= 0
            && (pos.col as usize) < self.width
            && (pos.row as usize) < self.height
    }

    fn index(&self, pos: Position) -> Option<usize> {
        if self.contains(pos) {
            Some(pos.row as usize * self.width + pos.col as usize)
        } else {
            None
        }
    }

    /// Returns the tile at `pos`, or `None` when `pos` is outside the grid.
    pub fn get(&self, pos: Position) -> Option<Tile> {
        self.index(pos).map(|i| self.tiles[i])
    }

    /// Stores `tile` at `pos`. The tile's own position is overwritten with `pos`
    /// and its frozen flag re-normalised. Returns `false` (and does nothing)
    /// when `pos` is out of bounds.
    pub fn set(&mut self, pos: Position, tile: Tile) -> bool {
        match self.index(pos) {
            Some(i) => {
                self.tiles[i] = Tile::new(tile.kind, pos, tile.frozen);
                true
            }
            None => false,
        }
    }

    /// In-bounds orthogonal neighbours of `pos`, in `Direction::ALL` order.
    pub fn neighbors4(&self, pos: Position) -> Vec<Position> {
        if !self.contains(pos) {
            return Vec::new();
        }
        Direction::ALL
            .iter()
            .map(|&d| pos.step(d))
            .filter(|&p| self.contains(p))
            .collect()
    }

    /// Number of `Normal` and `Bomb` tiles left. Rocks never count.
    pub fn remaining_count(&self) -> usize {
        self.tiles.iter().filter(|t| t.kind.is_piece()).count()
    }

    /// Turns the tile at `pos` into an empty cell. Returns `false` if `pos` is
    /// out of bounds or already empty.
    pub fn clear(&mut self, pos: Position) -> bool {
        match self.get(pos) {
            Some(tile) if tile.kind != TileKind::Empty => self.set(pos, Tile::empty(pos)),
            _ => false,
        }
    }

    /// Unfreezes the tile at `pos`. Returns `true` only if it was frozen, so
    /// thawing twice is a no-op the second time.
    pub fn thaw(&mut self, pos: Position) -> bool {
        match self.index(pos) {
            Some(i) if self.tiles[i].frozen => {
                self.tiles[i].frozen = false;
                true
            }
            _ => false,
        }
    }

    /// Freezes the tile at `pos` if it is a `Normal` tile.
    pub fn freeze(&mut self, pos: Position) -> bool {
        match self.index(pos) {
            Some(i) if matches!(self.tiles[i].kind, TileKind::Normal(_)) => {
                self.tiles[i].frozen = true;
                true
            }
            _ => false,
        }
    }

    /// Relocates the tile at `from` onto `to`, leaving `from` empty.
    pub fn move_tile(&mut self, from: Position, to: Position) -> bool {
        if from == to || !self.contains(to) {
            return false;
        }
        match self.get(from) {
            Some(tile) => {
                self.set(to, tile);
                self.set(from, Tile::empty(from));
                true
            }
            None => false,
        }
    }

    /// All tiles in row-major order.
    pub fn tiles(&self) -> impl Iterator<Item = &Tile> {
        self.tiles.iter()
    }

    /// All in-bounds positions in row-major order.
    pub fn positions(&self) -> impl Iterator<Item = Position> + '_ {
        self.tiles.iter().map(|t| t.position)
    }

    /// Renders the board for a terminal, with column/row headers and ANSI
    /// colours. The tile at `highlight`, if any, is bracketed.
    pub fn render_with_highlight(&self, highlight: Option<Position>) -> String {
        let mut output = String::new();

        output.push_str("   ");
        for col in 0..self.width {
            output.push_str(&format!("{:<4}", col));
        }
        output.push('\n');

        for row in 0..self.height {
            output.push_str(&format!("{:<3}", row));
            for col in 0..self.width {
                let pos = Position::new(col as i32, row as i32);
                let tile = self.tiles[row * self.width + col];
                let label = match tile.kind {
                    TileKind::Empty => "  ".to_string(),
                    kind => kind.code(),
                };
                let (open, close) = if highlight == Some(pos) {
                    ('[', ']')
                } else if tile.frozen {
                    ('*', '*')
                } else {
                    (' ', ' ')
                };
                output.push_str(&format!(
                    "\x1b[1;{}m{}{}{}\x1b[m",
                    tile.kind.ansi_color_code(),
                    open,
                    label,
                    close
                ));
            }
            if row + 1 < self.height {
                output.push('\n');
            }
        }
        output
    }
}

impl fmt::Display for Grid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.render_with_highlight(None))
    }
}
