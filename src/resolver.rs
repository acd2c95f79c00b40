//! Match validation and its effects: removal, thaw, bomb blasts, parity
//! restoration and gravity.
use crate::gravity::{apply_gravity, GravityMode};
use crate::grid::{Grid, MatchKey, Position, Tile, TileKind, TileMove};
use crate::pathfinder::{find_path, LinkPath};
use rand::seq::SliceRandom;
use rand::Rng;
use std::collections::BTreeMap;

/// Why a candidate pair was rejected.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NoMatchReason {
    OutOfBounds,
    SameTile,
    /// Empty, rock, or frozen.
    NotSelectable,
    TypeMismatch,
    NoPath,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MatchKind {
    Pair,
    BombBlast,
}

/// Everything a successful match changed, in the order it was applied.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MatchReport {
    pub kind: MatchKind,
    pub path: LinkPath,
    /// Cells that became empty, before gravity.
    pub removed: Vec<Position>,
    pub thawed: Vec<Position>,
    /// Parity tiles placed after a blast, before gravity.
    pub respawned: Vec<(Position, TileKind)>,
    pub moved: Vec<TileMove>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum MatchOutcome {
    NoMatch(NoMatchReason),
    Matched(MatchReport),
}

impl MatchOutcome {
    pub fn is_matched(&self) -> bool {
        matches!(self, MatchOutcome::Matched(_))
    }
}

/// Checks whether `a` and `b` can be matched right now, without changing anything.
pub fn check_match(grid: &Grid, a: Position, b: Position) -> Result<LinkPath, NoMatchReason> {
    let (tile_a, tile_b) = match (grid.get(a), grid.get(b)) {
        (Some(ta), Some(tb)) => (ta, tb),
        _ => return Err(NoMatchReason::OutOfBounds),
    };
    if a == b {
        return Err(NoMatchReason::SameTile);
    }
    if !tile_a.is_selectable() || !tile_b.is_selectable() {
        return Err(NoMatchReason::NotSelectable);
    }
    if tile_a.kind.match_key() != tile_b.kind.match_key() {
        return Err(NoMatchReason::TypeMismatch);
    }
    find_path(grid, a, b).ok_or(NoMatchReason::NoPath)
}

/// Tries to match the tiles at `a` and `b` and, on success, applies every
/// effect of the match to `grid`.
///
/// On `NoMatch` the grid is untouched. `rng` is only consulted to place parity
/// tiles after a bomb blast.
///
/// # Examples
/// ```
/// use link_match::grid::{Grid, Position};
/// use link_match::gravity::GravityMode;
/// use link_match::resolver::{try_match, MatchOutcome};
/// use rand::rngs::SmallRng;
/// use rand::SeedableRng;
///
/// let mut grid = Grid::from_codes(&["05 05"]).unwrap();
/// let mut rng = SmallRng::seed_from_u64(7);
/// let (a, b) = (Position::new(0, 0), Position::new(1, 0));
/// let outcome = try_match(&mut grid, a, b, GravityMode::None, &mut rng);
/// assert!(outcome.is_matched());
/// assert_eq!(grid.remaining_count(), 0);
/// ```
pub fn try_match<R: Rng + ?Sized>(
    grid: &mut Grid,
    a: Position,
    b: Position,
    gravity: GravityMode,
    rng: &mut R,
) -> MatchOutcome {
    let path = match check_match(grid, a, b) {
        Ok(path) => path,
        Err(reason) => return MatchOutcome::NoMatch(reason),
    };
    let bomb_pair = grid.get(a).map(|t| t.kind) == Some(TileKind::Bomb);

    let mut removed = Vec::new();
    let mut thawed = Vec::new();
    let mut respawned = Vec::new();
    let kind = if bomb_pair {
        detonate(grid, [a, b], &mut removed, &mut thawed);
        respawned = restore_parity(grid, &removed, rng);
        MatchKind::BombBlast
    } else {
        for pos in [a, b] {
            remove_and_thaw(grid, pos, &mut removed, &mut thawed);
        }
        MatchKind::Pair
    };

    let moved = match gravity {
        GravityMode::Down => apply_gravity(grid),
        GravityMode::None => Vec::new(),
    };

    MatchOutcome::Matched(MatchReport {
        kind,
        path,
        removed,
        thawed,
        respawned,
        moved,
    })
}

/// Empties `pos` and thaws its frozen neighbours.
fn remove_and_thaw(
    grid: &mut Grid,
    pos: Position,
    removed: &mut Vec<Position>,
    thawed: &mut Vec<Position>,
) {
    if grid.clear(pos) {
        removed.push(pos);
    }
    for neighbor in grid.neighbors4(pos) {
        if grid.thaw(neighbor) {
            thawed.push(neighbor);
        }
    }
}

/// Clears both bombs and their orthogonal neighbours.
///
/// Targets are chosen from the pre-blast state: a neighbour frozen before the
/// blast is thawed and survives, even when another removal in the same blast
/// would have thawed it first.
fn detonate(
    grid: &mut Grid,
    bombs: [Position; 2],
    removed: &mut Vec<Position>,
    thawed: &mut Vec<Position>,
) {
    let mut targets: Vec<Position> = bombs.to_vec();
    let mut shielded: Vec<Position> = Vec::new();
    for bomb in bombs {
        for neighbor in grid.neighbors4(bomb) {
            if targets.contains(&neighbor) || shielded.contains(&neighbor) {
                continue;
            }
            let tile = match grid.get(neighbor) {
                Some(tile) => tile,
                None => continue,
            };
            if tile.frozen {
                shielded.push(neighbor);
            } else if tile.kind.is_piece() {
                targets.push(neighbor);
            }
        }
    }

    for pos in shielded {
        if grid.thaw(pos) {
            thawed.push(pos);
        }
    }
    for pos in targets {
        remove_and_thaw(grid, pos, removed, thawed);
    }
}

/// Respawns one tile for every category left with an odd count, so the board
/// can still be cleared in pairs.
///
/// Each tile goes to a uniformly chosen cell among `vacated` that is still
/// empty, falling back to any empty cell.
fn restore_parity<R: Rng + ?Sized>(
    grid: &mut Grid,
    vacated: &[Position],
    rng: &mut R,
) -> Vec<(Position, TileKind)> {
    let mut counts: BTreeMap<MatchKey, usize> = BTreeMap::new();
    for tile in grid.tiles() {
        if let Some(key) = tile.kind.match_key() {
            *counts.entry(key).or_insert(0) += 1;
        }
    }

    let mut respawned = Vec::new();
    for (key, count) in counts {
        if count % 2 == 0 {
            continue;
        }
        let kind = match key {
            MatchKey::Type(t) => TileKind::Normal(t),
            MatchKey::Bomb => TileKind::Bomb,
        };
        let is_empty = |p: &Position| grid.get(*p).map(|t| t.kind) == Some(TileKind::Empty);
        let mut candidates: Vec<Position> = vacated.iter().copied().filter(is_empty).collect();
        if candidates.is_empty() {
            candidates = grid.positions().filter(is_empty).collect();
        }
        if let Some(&pos) = candidates.choose(rng) {
            grid.set(pos, Tile::new(kind, pos, false));
            respawned.push((pos, kind));
        }
    }
    respawned
}
