//! Board-wide move scan and the solvable-shuffle search.
use crate::grid::{Grid, MatchKey, Position, Tile, TileKind};
use crate::pathfinder::find_path;
use rand::seq::SliceRandom;
use rand::Rng;

/// Result of one `shuffle` call.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ShuffleOutcome {
    /// The board now has at least one legal move. `assignment` lists the new
    /// type of every `Normal` tile in row-major order.
    Accepted {
        attempts: u32,
        assignment: Vec<(Position, u16)>,
    },
    /// No solvable permutation was found; the board was restored.
    Exhausted { attempts: u32 },
}

impl ShuffleOutcome {
    pub fn is_accepted(&self) -> bool {
        matches!(self, ShuffleOutcome::Accepted { .. })
    }

    pub fn attempts(&self) -> u32 {
        match self {
            ShuffleOutcome::Accepted { attempts, .. } | ShuffleOutcome::Exhausted { attempts } => {
                *attempts
            }
        }
    }
}

/// Steps of a single shuffle invocation.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum ShufflePhase {
    Generating,
    Checking,
    Retry,
    Accepted,
    Exhausted,
}

/// Returns the first pair of tiles that can currently be matched.
///
/// Candidates are scanned in row-major order; frozen tiles, rocks and empty
/// cells are skipped. The scan stops at the first linkable pair.
///
/// # Examples
/// ```
/// use link_match::grid::{Grid, Position};
/// use link_match::shuffle::find_linkable_pair;
///
/// let grid = Grid::from_codes(&["01 02 01", "ST ST ST"]).unwrap();
/// assert_eq!(
///     find_linkable_pair(&grid),
///     Some((Position::new(0, 0), Position::new(2, 0)))
/// );
/// ```
pub fn find_linkable_pair(grid: &Grid) -> Option<(Position, Position)> {
    let candidates: Vec<(Position, MatchKey)> = grid
        .tiles()
        .filter(|t| t.is_selectable())
        .filter_map(|t| t.kind.match_key().map(|key| (t.position, key)))
        .collect();

    for (i, &(a, key_a)) in candidates.iter().enumerate() {
        for &(b, key_b) in &candidates[i + 1..] {
            if key_a == key_b && find_path(grid, a, b).is_some() {
                return Some((a, b));
            }
        }
    }
    None
}

/// `true` when at least one pair can be matched.
pub fn has_moves(grid: &Grid) -> bool {
    find_linkable_pair(grid).is_some()
}

/// Randomly permutes the types of all `Normal` tiles until the board has a
/// legal move, trying at most `max_attempts` permutations.
///
/// Only type labels move: rocks, bombs, empty cells and frozen flags stay
/// where they are. The multiset of types is preserved. When every attempt
/// fails the original assignment is put back and `Exhausted` is returned.
pub fn shuffle<R: Rng + ?Sized>(grid: &mut Grid, rng: &mut R, max_attempts: u32) -> ShuffleOutcome {
    let slots: Vec<Position> = grid
        .tiles()
        .filter(|t| matches!(t.kind, TileKind::Normal(_)))
        .map(|t| t.position)
        .collect();
    let original: Vec<u16> = slots
        .iter()
        .filter_map(|&p| match grid.get(p).map(|t| t.kind) {
            Some(TileKind::Normal(ty)) => Some(ty),
            _ => None,
        })
        .collect();

    let mut types = original.clone();
    let mut attempts = 0;
    let mut phase = if max_attempts == 0 {
        ShufflePhase::Exhausted
    } else {
        ShufflePhase::Generating
    };

    loop {
        phase = match phase {
            ShufflePhase::Generating => {
                attempts += 1;
                types.shuffle(rng);
                assign_types(grid, &slots, &types);
                ShufflePhase::Checking
            }
            ShufflePhase::Checking => {
                if has_moves(grid) {
                    ShufflePhase::Accepted
                } else {
                    ShufflePhase::Retry
                }
            }
            ShufflePhase::Retry => {
                if attempts < max_attempts {
                    ShufflePhase::Generating
                } else {
                    ShufflePhase::Exhausted
                }
            }
            ShufflePhase::Accepted => {
                let assignment = slots.iter().copied().zip(types.iter().copied()).collect();
                return ShuffleOutcome::Accepted {
                    attempts,
                    assignment,
                };
            }
            ShufflePhase::Exhausted => {
                assign_types(grid, &slots, &original);
                return ShuffleOutcome::Exhausted { attempts };
            }
        };
    }
}

fn assign_types(grid: &mut Grid, slots: &[Position], types: &[u16]) {
    for (&pos, &ty) in slots.iter().zip(types) {
        if let Some(tile) = grid.get(pos) {
            grid.set(pos, Tile::new(TileKind::Normal(ty), pos, tile.frozen));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::SmallRng;
    use rand::SeedableRng;

    fn type_multiset(grid: &Grid) -> Vec<u16> {
        let mut types: Vec<u16> = grid
            .tiles()
            .filter_map(|t| match t.kind {
                TileKind::Normal(ty) => Some(ty),
                _ => None,
            })
            .collect();
        types.sort_unstable();
        types
    }

    #[test]
    fn test_find_linkable_pair_none_when_blocked() {
        // Two pairs, each separated by another type with no way around.
        let grid = Grid::from_codes(&[
            "ST ST ST ST ST", //
            "ST 01 02 01 ST",
            "ST 02 01 02 ST",
            "ST ST ST ST ST",
        ])
        .unwrap();
        assert_eq!(find_linkable_pair(&grid), None);
        assert!(!has_moves(&grid));
    }

    #[test]
    fn test_find_linkable_pair_skips_frozen() {
        let grid = Grid::from_codes(&["03 03FZ"]).unwrap();
        assert_eq!(find_linkable_pair(&grid), None);
    }

    #[test]
    fn test_bombs_count_as_a_move() {
        let grid = Grid::from_codes(&["BB 01 BB"]).unwrap();
        assert_eq!(
            find_linkable_pair(&grid),
            Some((Position::new(0, 0), Position::new(2, 0)))
        );
    }

    #[test]
    fn test_shuffle_preserves_types_and_fixed_tiles() {
        let mut grid = Grid::from_codes(&[
            "ST ST ST ST ST", //
            "ST 01 02 01 ST",
            "ST 02 01 02 ST",
            "ST BB 04FZ 04 ST",
            "ST ST ST ST ST",
        ])
        .unwrap();
        let before = grid.clone();
        let mut rng = SmallRng::seed_from_u64(42);

        let outcome = shuffle(&mut grid, &mut rng, 200);
        assert!(outcome.is_accepted(), "{:?}", outcome);
        assert!(has_moves(&grid));
        assert_eq!(type_multiset(&grid), type_multiset(&before));

        for (old, new) in before.tiles().zip(grid.tiles()) {
            match old.kind {
                TileKind::Normal(_) => {
                    assert!(matches!(new.kind, TileKind::Normal(_)));
                    assert_eq!(old.frozen, new.frozen);
                }
                kind => assert_eq!(new.kind, kind),
            }
        }

        if let ShuffleOutcome::Accepted { assignment, .. } = outcome {
            assert_eq!(assignment.len(), 8);
            for (pos, ty) in assignment {
                assert_eq!(grid.get(pos).unwrap().kind, TileKind::Normal(ty));
            }
        }
    }

    #[test]
    fn test_shuffle_exhausted_restores_board() {
        // Every Normal tile is frozen, so no permutation can ever produce a move.
        let mut grid = Grid::from_codes(&["01FZ 02FZ", "02FZ 01FZ"]).unwrap();
        let before = grid.clone();
        let mut rng = SmallRng::seed_from_u64(1);

        let outcome = shuffle(&mut grid, &mut rng, 5);
        assert_eq!(outcome, ShuffleOutcome::Exhausted { attempts: 5 });
        assert_eq!(grid, before);
    }

    #[test]
    fn test_shuffle_zero_attempts() {
        let mut grid = Grid::from_codes(&["01 01"]).unwrap();
        let before = grid.clone();
        let mut rng = SmallRng::seed_from_u64(1);
        assert_eq!(
            shuffle(&mut grid, &mut rng, 0),
            ShuffleOutcome::Exhausted { attempts: 0 }
        );
        assert_eq!(grid, before);
    }

    #[test]
    fn test_shuffle_is_reproducible_with_seed() {
        let start = Grid::from_codes(&["01 02 03 04", "04 03 02 01", "05 06 06 05"]).unwrap();
        let mut a = start.clone();
        let mut b = start.clone();
        let outcome_a = shuffle(&mut a, &mut SmallRng::seed_from_u64(9), 10);
        let outcome_b = shuffle(&mut b, &mut SmallRng::seed_from_u64(9), 10);
        assert_eq!(outcome_a, outcome_b);
        assert_eq!(a, b);
    }
}
