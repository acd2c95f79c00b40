//! Turn-limited link search between two cells.
//!
//! The search runs on the grid padded with one always-passable ring, so links
//! may leave the board and come back. States are `(cell, incoming direction)`
//! because the remaining turn budget depends on how a cell was entered.
use crate::grid::{Direction, Grid, Position, TileKind};
use std::collections::VecDeque;

/// Maximum number of direction changes a link may make.
pub const MAX_TURNS: u8 = 2;

const NO_PARENT: usize = usize::MAX;
const UNSEEN: u8 = u8::MAX;

/// A found link, simplified to its start, its corners, and its end.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LinkPath {
    points: Vec<Position>,
}

impl LinkPath {
    /// Start cell, every corner, end cell. Corners may lie on the border ring.
    pub fn points(&self) -> &[Position] {
        &self.points
    }

    pub fn start(&self) -> Position {
        self.points[0]
    }

    pub fn end(&self) -> Position {
        self.points[self.points.len() - 1]
    }

    /// Number of direction changes (corners).
    pub fn turns(&self) -> u8 {
        (self.points.len() - 2) as u8
    }

    /// Number of single-cell steps from start to end.
    pub fn length(&self) -> usize {
        self.points
            .windows(2)
            .map(|w| ((w[0].col - w[1].col).abs() + (w[0].row - w[1].row).abs()) as usize)
            .sum()
    }

    /// Every cell the link passes through, endpoints included.
    pub fn cells(&self) -> Vec<Position> {
        let mut cells = vec![self.start()];
        for w in self.points.windows(2) {
            let step_col = (w[1].col - w[0].col).signum();
            let step_row = (w[1].row - w[0].row).signum();
            let mut cur = w[0];
            while cur != w[1] {
                cur = Position::new(cur.col + step_col, cur.row + step_row);
                cells.push(cur);
            }
        }
        cells
    }
}

/// The padded search space: `(width + 2) x (height + 2)`, grid shifted by `(+1, +1)`.
struct SearchSpace {
    width: usize,
    height: usize,
    passable: Vec<bool>,
}

impl SearchSpace {
    fn new(grid: &Grid) -> Self {
        let width = grid.width() + 2;
        let height = grid.height() + 2;
        let mut passable = vec![true; width * height];
        for tile in grid.tiles() {
            if tile.kind != TileKind::Empty {
                let row = tile.position.row as usize + 1;
                let col = tile.position.col as usize + 1;
                passable[row * width + col] = false;
            }
        }
        SearchSpace {
            width,
            height,
            passable,
        }
    }

    fn cell(&self, pos: Position) -> Option<usize> {
        let x = pos.col + 1;
        let y = pos.row + 1;
        if x < 0 || y < 0 || x as usize >= self.width || y as usize >= self.height {
            None
        } else {
            Some(y as usize * self.width + x as usize)
        }
    }
}

/// Searches for a link from `from` to `to` with at most `MAX_TURNS` turns.
///
/// Intermediate cells must be empty or on the border ring; the endpoints' own
/// contents are ignored. Returns `None` when no link exists, when the two
/// positions are equal, or when either is outside the grid.
///
/// # Examples
/// ```
/// use link_match::grid::{Grid, Position};
/// use link_match::pathfinder::find_path;
///
/// let grid = Grid::from_codes(&["05 05"]).unwrap();
/// let path = find_path(&grid, Position::new(0, 0), Position::new(1, 0)).unwrap();
/// assert_eq!(path.points(), &[Position::new(0, 0), Position::new(1, 0)]);
/// assert_eq!(path.turns(), 0);
/// ```
pub fn find_path(grid: &Grid, from: Position, to: Position) -> Option<LinkPath> {
    if from == to || !grid.contains(from) || !grid.contains(to) {
        return None;
    }

    let space = SearchSpace::new(grid);
    let target = space.cell(to)?;
    let state_count = space.passable.len() * 4;
    let mut best_turns = vec![UNSEEN; state_count];
    let mut parent = vec![NO_PARENT; state_count];
    let mut queue: VecDeque<(Position, Direction, u8)> = VecDeque::new();

    for dir in Direction::ALL {
        let next = from.step(dir);
        if let Some(cell) = space.cell(next) {
            if space.passable[cell] || cell == target {
                let state = cell * 4 + dir.index();
                best_turns[state] = 0;
                queue.push_back((next, dir, 0));
            }
        }
    }

    while let Some((pos, dir, turns)) = queue.pop_front() {
        let cell = match space.cell(pos) {
            Some(cell) => cell,
            None => continue,
        };
        let state = cell * 4 + dir.index();
        if turns > best_turns[state] {
            continue; // stale entry, settled earlier with fewer turns
        }
        if cell == target {
            return Some(rebuild(&space, &parent, from, state));
        }

        for next_dir in Direction::ALL {
            if next_dir == dir.opposite() {
                continue;
            }
            let next_turns = turns + u8::from(next_dir != dir);
            if next_turns > MAX_TURNS {
                continue;
            }
            let next = pos.step(next_dir);
            let next_cell = match space.cell(next) {
                Some(c) if space.passable[c] || c == target => c,
                _ => continue,
            };
            let next_state = next_cell * 4 + next_dir.index();
            if next_turns < best_turns[next_state] {
                best_turns[next_state] = next_turns;
                parent[next_state] = state;
                if next_dir == dir {
                    queue.push_front((next, next_dir, next_turns));
                } else {
                    queue.push_back((next, next_dir, next_turns));
                }
            }
        }
    }

    None
}

fn rebuild(space: &SearchSpace, parent: &[usize], from: Position, end_state: usize) -> LinkPath {
    let mut states = vec![end_state];
    let mut cur = end_state;
    while parent[cur] != NO_PARENT {
        cur = parent[cur];
        states.push(cur);
    }
    states.reverse();

    let position_of = |state: usize| {
        let cell = state / 4;
        Position::new(
            (cell % space.width) as i32 - 1,
            (cell / space.width) as i32 - 1,
        )
    };

    let mut points = vec![from];
    for pair in states.windows(2) {
        if pair[0] % 4 != pair[1] % 4 {
            points.push(position_of(pair[0]));
        }
    }
    points.push(position_of(end_state));
    LinkPath { points }
}
