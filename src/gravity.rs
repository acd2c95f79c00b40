//! Column compaction after removals.
use crate::grid::{Grid, Position, TileKind, TileMove};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Whether tiles fall after removals.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum GravityMode {
    #[default]
    None,
    Down,
}

impl FromStr for GravityMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "NONE" => Ok(GravityMode::None),
            "DOWN" => Ok(GravityMode::Down),
            other => Err(format!("unknown gravity mode '{}'", other)),
        }
    }
}

/// Lets tiles fall toward the bottom row, column by column.
///
/// Rocks stay put and split a column into independent segments; inside a
/// segment, tiles keep their relative order and the vacated top cells become
/// empty. Frozen tiles fall like any other tile. Returns every displacement
/// in the order it was applied.
///
/// # Examples
/// ```
/// use link_match::grid::{Grid, Position, TileKind};
/// use link_match::gravity::apply_gravity;
///
/// let mut grid = Grid::from_codes(&["01", "00", "02", "00"]).unwrap();
/// let moves = apply_gravity(&mut grid);
/// assert_eq!(moves.len(), 2);
/// assert_eq!(grid.get(Position::new(0, 3)).unwrap().kind, TileKind::Normal(2));
/// assert_eq!(grid.get(Position::new(0, 2)).unwrap().kind, TileKind::Normal(1));
/// ```
pub fn apply_gravity(grid: &mut Grid) -> Vec<TileMove> {
    let mut moves = Vec::new();
    for col in 0..grid.width() as i32 {
        // Lowest row in the current segment that has not been filled yet.
        let mut write_row = grid.height() as i32 - 1;
        for row in (0..grid.height() as i32).rev() {
            let from = Position::new(col, row);
            let kind = match grid.get(from) {
                Some(tile) => tile.kind,
                None => continue,
            };
            match kind {
                TileKind::Rock => write_row = row - 1,
                TileKind::Empty => {}
                TileKind::Normal(_) | TileKind::Bomb => {
                    if row != write_row {
                        let to = Position::new(col, write_row);
                        grid.move_tile(from, to);
                        moves.push(TileMove { from, to });
                    }
                    write_row -= 1;
                }
            }
        }
    }
    moves
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gravity_mode_from_str() {
        assert_eq!("down".parse::<GravityMode>(), Ok(GravityMode::Down));
        assert_eq!(" NONE ".parse::<GravityMode>(), Ok(GravityMode::None));
        assert!("up".parse::<GravityMode>().is_err());
    }

    #[test]
    fn test_apply_gravity_empty_grid_is_unchanged() {
        let mut grid = Grid::new_empty(3, 3);
        let before = grid.clone();
        assert!(apply_gravity(&mut grid).is_empty());
        assert_eq!(grid, before);
    }

    #[test]
    fn test_apply_gravity_settled_column_is_unchanged() {
        let mut grid = Grid::from_codes(&["00 00", "01 00", "02 03"]).unwrap();
        let before = grid.clone();
        assert!(apply_gravity(&mut grid).is_empty());
        assert_eq!(grid, before);
    }

    #[test]
    fn test_apply_gravity_preserves_order() {
        let mut grid = Grid::from_codes(&["01", "00", "02", "00", "03", "00"]).unwrap();
        apply_gravity(&mut grid);
        let expected = Grid::from_codes(&["00", "00", "00", "01", "02", "03"]).unwrap();
        assert_eq!(grid, expected);
    }

    #[test]
    fn test_rock_splits_column_into_segments() {
        let mut grid = Grid::from_codes(&["01", "00", "ST", "02", "00"]).unwrap();
        let moves = apply_gravity(&mut grid);
        let expected = Grid::from_codes(&["00", "01", "ST", "00", "02"]).unwrap();
        assert_eq!(grid, expected);
        assert_eq!(
            moves,
            vec![
                TileMove {
                    from: Position::new(0, 3),
                    to: Position::new(0, 4)
                },
                TileMove {
                    from: Position::new(0, 0),
                    to: Position::new(0, 1)
                },
            ]
        );
    }

    #[test]
    fn test_frozen_tiles_fall_with_their_flag() {
        let mut grid = Grid::from_codes(&["04FZ BB", "00 00"]).unwrap();
        apply_gravity(&mut grid);
        let fallen = grid.get(Position::new(0, 1)).unwrap();
        assert_eq!(fallen.kind, TileKind::Normal(4));
        assert!(fallen.frozen);
        assert_eq!(grid.get(Position::new(1, 1)).unwrap().kind, TileKind::Bomb);
        assert_eq!(grid.remaining_count(), 2);
    }

    #[test]
    fn test_gravity_is_deterministic() {
        let start = Grid::from_codes(&["01 00 03", "00 02 00", "02 00 01", "00 03 00"]).unwrap();
        let mut a = start.clone();
        let mut b = start.clone();
        assert_eq!(apply_gravity(&mut a), apply_gravity(&mut b));
        assert_eq!(a, b);
    }
}
