//! Game session for a single level.
//!
//! `Engine` owns the grid and is the only thing that mutates it. It turns
//! player input (tile taps, hint and shuffle requests, elapsed time) into
//! committed state changes, reports each change to its observers, and
//! enforces single-flight resolution: after a match or shuffle is applied the
//! engine stays `busy` until the presentation layer calls `complete_turn`.
use crate::config::EngineConfig;
use crate::error::EngineError;
use crate::gravity::GravityMode;
use crate::grid::{Grid, Position, TileKind, TileMove};
use crate::level::LevelConfig;
use crate::resolver::{try_match, MatchKind, MatchOutcome, MatchReport, NoMatchReason};
use crate::shuffle::{find_linkable_pair, has_moves, shuffle, ShuffleOutcome};
use rand::rngs::SmallRng;
use rand::SeedableRng;
use std::fmt;
use std::time::Duration;

/// Where the session is in its lifecycle.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GameState {
    Playing,
    Paused,
    Won,
    TimeUp,
}

/// Limited-use player aids.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PowerUp {
    Hint,
    Shuffle,
}

impl fmt::Display for PowerUp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PowerUp::Hint => write!(f, "hint"),
            PowerUp::Shuffle => write!(f, "shuffle"),
        }
    }
}

/// A committed change, delivered to observers after it has been applied.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum EngineEvent {
    TilesRemoved {
        positions: Vec<Position>,
        bomb_blast: bool,
    },
    TilesThawed {
        positions: Vec<Position>,
    },
    TilesMoved {
        moves: Vec<TileMove>,
    },
    TileRespawned {
        position: Position,
        kind: TileKind,
    },
    ShuffleResult {
        success: bool,
        assignment: Vec<(Position, u16)>,
    },
    BoardSolved,
    NoMovesAvailable,
    TimeExpired,
}

/// Receives engine events. Any `FnMut(&EngineEvent)` closure is an observer.
pub trait EngineObserver {
    fn on_event(&mut self, event: &EngineEvent);
}

impl<F> EngineObserver for F
where
    F: FnMut(&EngineEvent),
{
    fn on_event(&mut self, event: &EngineEvent) {
        self(event)
    }
}

/// What a completed match changed, plus the follow-up checks.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TurnReport {
    pub report: MatchReport,
    pub solved: bool,
    /// Set when the match left no legal move and an automatic shuffle ran.
    pub auto_shuffle: Option<ShuffleOutcome>,
}

/// Result of tapping a tile.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Selection {
    /// Out of bounds, empty, rock, or frozen. Nothing changed.
    Ignored,
    Selected(Position),
    /// The selected tile was tapped again.
    Deselected(Position),
    /// The pair did not match; the second tile is now the selection.
    Rejected {
        reason: NoMatchReason,
        selected: Position,
    },
    Matched(TurnReport),
}

/// Final numbers of a session, returned by `Engine::shutdown`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SessionSummary {
    pub state: GameState,
    pub score: u32,
    pub matches: u32,
    pub remaining: usize,
    pub time_remaining: Option<Duration>,
}

pub struct Engine {
    grid: Grid,
    gravity: GravityMode,
    config: EngineConfig,
    rng: SmallRng,
    state: GameState,
    selected: Option<Position>,
    busy: bool,
    score: u32,
    matches: u32,
    time_remaining: Option<Duration>,
    initial_shuffle: Option<ShuffleOutcome>,
    hints_left: u32,
    shuffles_left: u32,
    observers: Vec<Box<dyn EngineObserver>>,
}

impl Engine {
    /// Starts a session on `level`.
    ///
    /// # Examples
    /// ```
    /// use link_match::config::EngineConfig;
    /// use link_match::engine::{Engine, GameState, Selection};
    /// use link_match::grid::Position;
    /// use link_match::level::{LevelConfig, LevelHeader};
    ///
    /// let level = LevelConfig::new(LevelHeader::new(2, 1, 5), &["05 05"]).unwrap().level;
    /// let mut engine = Engine::new(&level, EngineConfig::default().with_seed(1)).unwrap();
    ///
    /// engine.select_tile(Position::new(0, 0)).unwrap();
    /// let turn = engine.select_tile(Position::new(1, 0)).unwrap();
    /// assert!(matches!(turn, Selection::Matched(ref t) if t.solved));
    /// assert_eq!(engine.state(), GameState::Won);
    /// engine.complete_turn();
    /// ```
    pub fn new(level: &LevelConfig, config: EngineConfig) -> Result<Self, EngineError> {
        config.validate()?;
        let rng = match config.seed {
            Some(seed) => SmallRng::seed_from_u64(seed),
            None => SmallRng::from_entropy(),
        };
        let grid = Grid::from_level(level);
        let state = if grid.remaining_count() == 0 {
            GameState::Won
        } else {
            GameState::Playing
        };
        let time_remaining = match level.time_limit() {
            0 => None,
            secs => Some(Duration::from_secs(u64::from(secs))),
        };

        let mut engine = Engine {
            grid,
            gravity: level.gravity(),
            hints_left: config.hint_charges,
            shuffles_left: config.shuffle_charges,
            config,
            rng,
            state,
            selected: None,
            busy: false,
            score: 0,
            matches: 0,
            time_remaining,
            initial_shuffle: None,
            observers: Vec::new(),
        };
        if engine.state == GameState::Playing
            && engine.config.auto_shuffle
            && !has_moves(&engine.grid)
        {
            engine.initial_shuffle = Some(engine.run_shuffle());
        }
        Ok(engine)
    }

    /// Ends the session and returns its final numbers.
    pub fn shutdown(self) -> SessionSummary {
        SessionSummary {
            state: self.state,
            score: self.score,
            matches: self.matches,
            remaining: self.grid.remaining_count(),
            time_remaining: self.time_remaining,
        }
    }

    pub fn subscribe<O: EngineObserver + 'static>(&mut self, observer: O) {
        self.observers.push(Box::new(observer));
    }

    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    pub fn state(&self) -> GameState {
        self.state
    }

    pub fn selected(&self) -> Option<Position> {
        self.selected
    }

    /// `true` between a committed match or shuffle and `complete_turn`.
    pub fn is_busy(&self) -> bool {
        self.busy
    }

    pub fn score(&self) -> u32 {
        self.score
    }

    pub fn matches(&self) -> u32 {
        self.matches
    }

    pub fn remaining_count(&self) -> usize {
        self.grid.remaining_count()
    }

    pub fn has_moves(&self) -> bool {
        has_moves(&self.grid)
    }

    pub fn hints_left(&self) -> u32 {
        self.hints_left
    }

    pub fn shuffles_left(&self) -> u32 {
        self.shuffles_left
    }

    /// The free shuffle run by `new` when the level was dealt without a legal
    /// move. Observers subscribe after construction, so this is its only report.
    pub fn initial_shuffle(&self) -> Option<&ShuffleOutcome> {
        self.initial_shuffle.as_ref()
    }

    /// `None` for untimed levels.
    pub fn time_remaining(&self) -> Option<Duration> {
        self.time_remaining
    }

    /// Taps the tile at `pos`.
    ///
    /// The first tap selects, a tap on the selected tile deselects, and a tap
    /// on a second tile attempts the match. A successful match is applied
    /// immediately and leaves the engine busy.
    pub fn select_tile(&mut self, pos: Position) -> Result<Selection, EngineError> {
        self.ensure_ready()?;
        match self.grid.get(pos) {
            Some(tile) if tile.is_selectable() => {}
            _ => return Ok(Selection::Ignored),
        }

        let first = match self.selected {
            None => {
                self.selected = Some(pos);
                return Ok(Selection::Selected(pos));
            }
            Some(first) if first == pos => {
                self.selected = None;
                return Ok(Selection::Deselected(pos));
            }
            Some(first) => first,
        };

        match try_match(&mut self.grid, first, pos, self.gravity, &mut self.rng) {
            MatchOutcome::NoMatch(reason) => {
                self.selected = Some(pos);
                Ok(Selection::Rejected {
                    reason,
                    selected: pos,
                })
            }
            MatchOutcome::Matched(report) => {
                self.selected = None;
                Ok(Selection::Matched(self.commit_match(report)))
            }
        }
    }

    /// Spends a shuffle charge to re-deal the remaining tile types. The charge
    /// is only consumed when the shuffle is accepted.
    pub fn request_shuffle(&mut self) -> Result<ShuffleOutcome, EngineError> {
        self.ensure_ready()?;
        if self.shuffles_left == 0 {
            return Err(EngineError::NoChargesLeft(PowerUp::Shuffle));
        }
        let outcome = self.run_shuffle();
        if outcome.is_accepted() {
            self.shuffles_left -= 1;
            self.selected = None;
            self.busy = true;
        }
        Ok(outcome)
    }

    /// Returns the first linkable pair, spending a hint charge when one is found.
    pub fn request_hint(&mut self) -> Result<Option<(Position, Position)>, EngineError> {
        self.ensure_ready()?;
        if self.hints_left == 0 {
            return Err(EngineError::NoChargesLeft(PowerUp::Hint));
        }
        let hint = find_linkable_pair(&self.grid);
        if hint.is_some() {
            self.hints_left -= 1;
        }
        Ok(hint)
    }

    /// Signals that the presentation layer finished showing the last turn.
    pub fn complete_turn(&mut self) {
        self.busy = false;
    }

    /// Counts `elapsed` off the level timer. Only runs while playing; does
    /// nothing on untimed levels.
    pub fn advance_clock(&mut self, elapsed: Duration) -> GameState {
        if self.state != GameState::Playing {
            return self.state;
        }
        if let Some(remaining) = self.time_remaining {
            let left = remaining.saturating_sub(elapsed);
            self.time_remaining = Some(left);
            if left.is_zero() {
                self.state = GameState::TimeUp;
                self.selected = None;
                self.emit(EngineEvent::TimeExpired);
            }
        }
        self.state
    }

    pub fn pause(&mut self) -> bool {
        if self.state == GameState::Playing {
            self.state = GameState::Paused;
            true
        } else {
            false
        }
    }

    pub fn resume(&mut self) -> bool {
        if self.state == GameState::Paused {
            self.state = GameState::Playing;
            true
        } else {
            false
        }
    }

    fn ensure_ready(&self) -> Result<(), EngineError> {
        if self.busy {
            return Err(EngineError::Busy);
        }
        if self.state != GameState::Playing {
            return Err(EngineError::NotPlaying(self.state));
        }
        Ok(())
    }

    fn commit_match(&mut self, report: MatchReport) -> TurnReport {
        self.busy = true;
        self.matches += 1;
        self.score = self.score.saturating_add(self.config.score_per_match);

        self.emit(EngineEvent::TilesRemoved {
            positions: report.removed.clone(),
            bomb_blast: report.kind == MatchKind::BombBlast,
        });
        if !report.thawed.is_empty() {
            self.emit(EngineEvent::TilesThawed {
                positions: report.thawed.clone(),
            });
        }
        for &(position, kind) in &report.respawned {
            self.emit(EngineEvent::TileRespawned { position, kind });
        }
        if !report.moved.is_empty() {
            self.emit(EngineEvent::TilesMoved {
                moves: report.moved.clone(),
            });
        }

        let solved = self.grid.remaining_count() == 0;
        let mut auto_shuffle = None;
        if solved {
            self.state = GameState::Won;
            self.emit(EngineEvent::BoardSolved);
        } else if !has_moves(&self.grid) {
            self.emit(EngineEvent::NoMovesAvailable);
            if self.config.auto_shuffle {
                auto_shuffle = Some(self.run_shuffle());
            }
        }

        TurnReport {
            report,
            solved,
            auto_shuffle,
        }
    }

    fn run_shuffle(&mut self) -> ShuffleOutcome {
        let outcome = shuffle(&mut self.grid, &mut self.rng, self.config.shuffle_attempts);
        let event = match &outcome {
            ShuffleOutcome::Accepted { assignment, .. } => EngineEvent::ShuffleResult {
                success: true,
                assignment: assignment.clone(),
            },
            ShuffleOutcome::Exhausted { .. } => EngineEvent::ShuffleResult {
                success: false,
                assignment: Vec::new(),
            },
        };
        self.emit(event);
        outcome
    }

    fn emit(&mut self, event: EngineEvent) {
        for observer in &mut self.observers {
            observer.on_event(&event);
        }
    }
}
