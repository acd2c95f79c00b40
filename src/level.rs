//! Level descriptions: the immutable input a board is built from.
//!
//! A level can be built from header values plus layout rows
//! (`LevelConfig::new`), parsed from the text level format
//! (`LevelConfig::parse` / `LevelConfig::load`), or generated at random
//! (`LevelConfig::random`). Bad cell codes never abort loading: they are
//! coerced to `"00"` and reported as `LevelWarning`s. Structural problems
//! (dimensions, row count, row width) are `LevelError`s.
use crate::error::LevelError;
use crate::gravity::GravityMode;
use crate::grid::{MatchKey, TileKind};
use rand::rngs::SmallRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;
use std::str::FromStr;

/// One parsed layout cell.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CellSpec {
    pub kind: TileKind,
    pub frozen: bool,
}

impl CellSpec {
    pub const EMPTY: CellSpec = CellSpec {
        kind: TileKind::Empty,
        frozen: false,
    };
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum CellCodeIssue {
    Unrecognized,
    TypeOutOfRange,
}

/// Parses one cell code (case-insensitive, optional `FZ` suffix).
///
/// The frozen flag is returned as written; callers decide what to do with a
/// frozen suffix on kinds that cannot be frozen.
pub(crate) fn parse_cell_code(token: &str, max_type: u16) -> Result<CellSpec, CellCodeIssue> {
    let upper = token.trim().to_ascii_uppercase();
    let (base, frozen) = match upper.strip_suffix("FZ") {
        Some(base) if !base.is_empty() => (base, true),
        _ => (upper.as_str(), false),
    };

    let kind = match base {
        "00" => TileKind::Empty,
        "ST" => TileKind::Rock,
        "BB" => TileKind::Bomb,
        digits if !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit()) => {
            match digits.parse::<u32>() {
                Ok(n) if n >= 1 && n <= u32::from(max_type) => TileKind::Normal(n as u16),
                _ => return Err(CellCodeIssue::TypeOutOfRange),
            }
        }
        _ => return Err(CellCodeIssue::Unrecognized),
    };
    Ok(CellSpec { kind, frozen })
}

/// A non-fatal problem found while loading a level.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum LevelWarning {
    /// The token was malformed or its type out of range; the cell is now empty.
    CoercedCell {
        row: usize,
        col: usize,
        token: String,
    },
    /// `FZ` on an empty, rock, or bomb cell; the flag was dropped.
    FrozenIgnored {
        row: usize,
        col: usize,
        token: String,
    },
    /// A tile category with an odd count can never be fully cleared.
    OddCount { key: MatchKey, count: usize },
    UnknownGravity(String),
    IgnoredLine { line: usize, text: String },
}

impl fmt::Display for LevelWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LevelWarning::CoercedCell { row, col, token } => write!(
                f,
                "invalid cell '{}' at [{}, {}], using '00'",
                token, row, col
            ),
            LevelWarning::FrozenIgnored { row, col, token } => write!(
                f,
                "'{}' at [{}, {}] cannot be frozen, ignoring FZ",
                token, row, col
            ),
            LevelWarning::OddCount { key, count } => {
                write!(f, "{:?} appears {} times, one will be left over", key, count)
            }
            LevelWarning::UnknownGravity(value) => {
                write!(f, "unknown gravity '{}', using NONE", value)
            }
            LevelWarning::IgnoredLine { line, text } => {
                write!(f, "ignoring line {}: {}", line, text)
            }
        }
    }
}

/// Header values of a level.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LevelHeader {
    pub width: usize,
    pub height: usize,
    /// Seconds; 0 means untimed.
    pub time_limit: u32,
    pub tile_type_count: u16,
    pub gravity: GravityMode,
}

impl LevelHeader {
    pub fn new(width: usize, height: usize, tile_type_count: u16) -> Self {
        LevelHeader {
            width,
            height,
            time_limit: 0,
            tile_type_count,
            gravity: GravityMode::None,
        }
    }

    pub fn with_time_limit(mut self, seconds: u32) -> Self {
        self.time_limit = seconds;
        self
    }

    pub fn with_gravity(mut self, gravity: GravityMode) -> Self {
        self.gravity = gravity;
        self
    }
}

/// A validated, immutable level description.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LevelConfig {
    header: LevelHeader,
    cells: Vec<CellSpec>,
}

/// A level together with the warnings produced while loading it.
#[derive(Clone, Debug)]
pub struct LoadedLevel {
    pub level: LevelConfig,
    pub warnings: Vec<LevelWarning>,
}

impl LevelConfig {
    /// Builds a level from header values and `height` rows of `width`
    /// whitespace-separated cell codes.
    ///
    /// # Examples
    /// ```
    /// use link_match::level::{LevelConfig, LevelHeader, LevelWarning};
    ///
    /// let loaded = LevelConfig::new(LevelHeader::new(3, 1, 2), &["01 07 01"]).unwrap();
    /// assert_eq!(loaded.level.width(), 3);
    /// // Type 7 is above TILE_TYPES and gets coerced to an empty cell.
    /// assert!(matches!(loaded.warnings[0], LevelWarning::CoercedCell { col: 1, .. }));
    /// ```
    pub fn new(header: LevelHeader, rows: &[&str]) -> Result<LoadedLevel, LevelError> {
        if header.width == 0 || header.height == 0 {
            return Err(LevelError::InvalidDimensions {
                width: header.width,
                height: header.height,
            });
        }
        if header.tile_type_count == 0 {
            return Err(LevelError::InvalidTileTypeCount);
        }
        if rows.len() != header.height {
            return Err(LevelError::RowCount {
                expected: header.height,
                found: rows.len(),
            });
        }

        let mut warnings = Vec::new();
        let mut cells = Vec::new();
        for (row, line) in rows.iter().enumerate() {
            let tokens: Vec<&str> = line.split_whitespace().collect();
            if tokens.len() != header.width {
                return Err(LevelError::RowWidth {
                    row,
                    expected: header.width,
                    found: tokens.len(),
                });
            }
            for (col, token) in tokens.into_iter().enumerate() {
                let cell = match parse_cell_code(token, header.tile_type_count) {
                    Ok(cell) if cell.frozen && !matches!(cell.kind, TileKind::Normal(_)) => {
                        warnings.push(LevelWarning::FrozenIgnored {
                            row,
                            col,
                            token: token.to_string(),
                        });
                        CellSpec {
                            kind: cell.kind,
                            frozen: false,
                        }
                    }
                    Ok(cell) => cell,
                    Err(_) => {
                        warnings.push(LevelWarning::CoercedCell {
                            row,
                            col,
                            token: token.to_string(),
                        });
                        CellSpec::EMPTY
                    }
                };
                cells.push(cell);
            }
        }

        let level = LevelConfig { header, cells };
        for (key, count) in level.key_counts() {
            if count % 2 == 1 {
                warnings.push(LevelWarning::OddCount { key, count });
            }
        }
        Ok(LoadedLevel { level, warnings })
    }

    /// Parses the text level format:
    ///
    /// ```text
    /// COLUMNS: 4
    /// ROWS: 2
    /// TIME: 120
    /// TILE_TYPES: 3
    /// GRAVITY: DOWN
    /// // Grid Layout
    /// 01 02 02 01
    /// 03 ST 00 03FZ
    /// ```
    ///
    /// `COLUMNS`, `ROWS` and `TILE_TYPES` are required. Without a
    /// `// Grid Layout` marker every non-header line is a layout row.
    pub fn parse(text: &str) -> Result<LoadedLevel, LevelError> {
        let mut width: Option<usize> = None;
        let mut height: Option<usize> = None;
        let mut time_limit: u32 = 0;
        let mut tile_types: Option<u16> = None;
        let mut gravity = GravityMode::None;
        let mut warnings = Vec::new();

        let mut marker_seen = false;
        let mut grid_rows: Vec<&str> = Vec::new();
        let mut loose_rows: Vec<(usize, &str)> = Vec::new();

        for (index, raw) in text.lines().enumerate() {
            let line = raw.trim();
            if line.is_empty() {
                continue;
            }
            if let Some(comment) = line.strip_prefix("//") {
                if comment.to_ascii_lowercase().contains("grid layout") {
                    marker_seen = true;
                }
                continue;
            }
            if let Some((key, value)) = line.split_once(':') {
                let key = key.trim().to_ascii_uppercase();
                let value = value.trim();
                match key.as_str() {
                    "COLUMNS" => width = Some(parse_header(&key, value)?),
                    "ROWS" => height = Some(parse_header(&key, value)?),
                    "TIME" => time_limit = parse_header(&key, value)?,
                    "TILE_TYPES" => tile_types = Some(parse_header(&key, value)?),
                    "GRAVITY" => match value.parse::<GravityMode>() {
                        Ok(mode) => gravity = mode,
                        Err(_) => warnings.push(LevelWarning::UnknownGravity(value.to_string())),
                    },
                    _ => warnings.push(LevelWarning::IgnoredLine {
                        line: index + 1,
                        text: line.to_string(),
                    }),
                }
                continue;
            }
            if marker_seen {
                grid_rows.push(line);
            } else {
                loose_rows.push((index + 1, line));
            }
        }

        let rows: Vec<&str> = if marker_seen {
            warnings.extend(loose_rows.into_iter().map(|(line, text)| {
                LevelWarning::IgnoredLine {
                    line,
                    text: text.to_string(),
                }
            }));
            grid_rows
        } else {
            loose_rows.into_iter().map(|(_, text)| text).collect()
        };

        let header = LevelHeader {
            width: width.ok_or(LevelError::MissingHeader("COLUMNS"))?,
            height: height.ok_or(LevelError::MissingHeader("ROWS"))?,
            time_limit,
            tile_type_count: tile_types.ok_or(LevelError::MissingHeader("TILE_TYPES"))?,
            gravity,
        };
        let mut loaded = LevelConfig::new(header, &rows)?;
        warnings.append(&mut loaded.warnings);
        loaded.warnings = warnings;
        Ok(loaded)
    }

    /// Reads and parses a level file.
    pub fn load(path: &Path) -> Result<LoadedLevel, LevelError> {
        let content = std::fs::read_to_string(path).map_err(|e| LevelError::FileRead {
            path: path.to_path_buf(),
            source: e,
        })?;
        LevelConfig::parse(&content)
    }

    /// Generates a full board of random pairs using a seeded `SmallRng`.
    ///
    /// Types are dealt in pairs, cycling through `1..=tile_type_count`, then
    /// shuffled. When `width * height` is odd one cell is left empty. The same
    /// seed always gives the same level.
    pub fn random(
        width: usize,
        height: usize,
        tile_type_count: u16,
        seed: u64,
    ) -> Result<LevelConfig, LevelError> {
        if width == 0 || height == 0 {
            return Err(LevelError::InvalidDimensions { width, height });
        }
        if tile_type_count == 0 {
            return Err(LevelError::InvalidTileTypeCount);
        }

        let total = width
            .checked_mul(height)
            .ok_or(LevelError::InvalidDimensions { width, height })?;
        let mut cells = Vec::with_capacity(total);
        for pair in 0..total / 2 {
            let kind = TileKind::Normal((pair % tile_type_count as usize) as u16 + 1);
            cells.push(CellSpec { kind, frozen: false });
            cells.push(CellSpec { kind, frozen: false });
        }
        if total % 2 == 1 {
            cells.push(CellSpec::EMPTY);
        }

        let mut rng = SmallRng::seed_from_u64(seed);
        cells.shuffle(&mut rng);
        Ok(LevelConfig {
            header: LevelHeader::new(width, height, tile_type_count),
            cells,
        })
    }

    pub fn header(&self) -> &LevelHeader {
        &self.header
    }

    pub fn width(&self) -> usize {
        self.header.width
    }

    pub fn height(&self) -> usize {
        self.header.height
    }

    pub fn time_limit(&self) -> u32 {
        self.header.time_limit
    }

    pub fn tile_type_count(&self) -> u16 {
        self.header.tile_type_count
    }

    pub fn gravity(&self) -> GravityMode {
        self.header.gravity
    }

    /// Cells in row-major order.
    pub fn cells(&self) -> &[CellSpec] {
        &self.cells
    }

    /// Number of same-type `Normal` pairs at spawn.
    pub fn pair_count(&self) -> usize {
        self.key_counts()
            .into_iter()
            .filter(|(key, _)| matches!(key, MatchKey::Type(_)))
            .map(|(_, count)| count / 2)
            .sum()
    }

    fn key_counts(&self) -> BTreeMap<MatchKey, usize> {
        let mut counts = BTreeMap::new();
        for cell in &self.cells {
            if let Some(key) = cell.kind.match_key() {
                *counts.entry(key).or_insert(0) += 1;
            }
        }
        counts
    }
}

fn parse_header<T: FromStr>(key: &str, value: &str) -> Result<T, LevelError> {
    value.parse::<T>().map_err(|_| LevelError::InvalidHeader {
        key: key.to_string(),
        value: value.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "\
COLUMNS: 4
ROWS: 3
TIME: 120
TILE_TYPES: 3
GRAVITY: down

// Grid Layout
01 02 02 01
03 ST 00 03FZ
BB 00 00 BB
";

    #[test]
    fn test_parse_cell_codes() {
        assert_eq!(parse_cell_code("00", 5), Ok(CellSpec::EMPTY));
        assert_eq!(parse_cell_code("st", 5).unwrap().kind, TileKind::Rock);
        assert_eq!(parse_cell_code("BB", 5).unwrap().kind, TileKind::Bomb);
        assert_eq!(
            parse_cell_code("05FZ", 5),
            Ok(CellSpec {
                kind: TileKind::Normal(5),
                frozen: true
            })
        );
        assert_eq!(parse_cell_code("06", 5), Err(CellCodeIssue::TypeOutOfRange));
        assert_eq!(parse_cell_code("0", 5), Err(CellCodeIssue::TypeOutOfRange));
        assert_eq!(parse_cell_code("FZ", 5), Err(CellCodeIssue::Unrecognized));
        assert_eq!(parse_cell_code("A1", 5), Err(CellCodeIssue::Unrecognized));
        assert_eq!(
            parse_cell_code("99999999999", 5),
            Err(CellCodeIssue::TypeOutOfRange)
        );
    }

    #[test]
    fn test_parse_sample_level() {
        let loaded = LevelConfig::parse(SAMPLE).unwrap();
        let level = &loaded.level;
        assert_eq!(level.width(), 4);
        assert_eq!(level.height(), 3);
        assert_eq!(level.time_limit(), 120);
        assert_eq!(level.tile_type_count(), 3);
        assert_eq!(level.gravity(), GravityMode::Down);
        assert_eq!(level.cells()[5].kind, TileKind::Rock);
        assert!(level.cells()[7].frozen);
        assert_eq!(level.cells()[8].kind, TileKind::Bomb);
        assert!(loaded.warnings.is_empty(), "{:?}", loaded.warnings);
        assert_eq!(level.pair_count(), 3);
    }

    #[test]
    fn test_bad_tokens_are_coerced_with_warning() {
        let loaded = LevelConfig::new(LevelHeader::new(3, 1, 4), &["01 zz 01"]).unwrap();
        assert_eq!(loaded.level.cells()[1], CellSpec::EMPTY);
        assert_eq!(
            loaded.warnings,
            vec![LevelWarning::CoercedCell {
                row: 0,
                col: 1,
                token: "zz".to_string()
            }]
        );
    }

    #[test]
    fn test_frozen_suffix_dropped_on_rock_and_bomb() {
        let loaded = LevelConfig::new(LevelHeader::new(4, 1, 4), &["STFZ BBFZ BB 00FZ"]).unwrap();
        assert!(loaded.level.cells().iter().all(|c| !c.frozen));
        let dropped = loaded
            .warnings
            .iter()
            .filter(|w| matches!(w, LevelWarning::FrozenIgnored { .. }))
            .count();
        assert_eq!(dropped, 3);
    }

    #[test]
    fn test_odd_counts_are_reported() {
        let loaded = LevelConfig::new(LevelHeader::new(3, 1, 4), &["01 02 02"]).unwrap();
        assert_eq!(
            loaded.warnings,
            vec![LevelWarning::OddCount {
                key: MatchKey::Type(1),
                count: 1
            }]
        );
    }

    #[test]
    fn test_structural_errors_are_fatal() {
        assert!(matches!(
            LevelConfig::new(LevelHeader::new(0, 2, 1), &[]),
            Err(LevelError::InvalidDimensions { .. })
        ));
        assert!(matches!(
            LevelConfig::new(LevelHeader::new(2, 1, 0), &["00 00"]),
            Err(LevelError::InvalidTileTypeCount)
        ));
        assert!(matches!(
            LevelConfig::new(LevelHeader::new(2, 2, 1), &["01 01"]),
            Err(LevelError::RowCount { expected: 2, found: 1 })
        ));
        assert!(matches!(
            LevelConfig::new(LevelHeader::new(2, 1, 1), &["01"]),
            Err(LevelError::RowWidth { row: 0, .. })
        ));
    }

    #[test]
    fn test_oversized_columns_header_is_a_row_width_error() {
        let text = "COLUMNS: 4611686018427387904\nROWS: 1\nTILE_TYPES: 1\n01 01\n";
        assert!(matches!(
            LevelConfig::parse(text),
            Err(LevelError::RowWidth { row: 0, found: 2, .. })
        ));
    }

    #[test]
    fn test_random_rejects_overflowing_dimensions() {
        assert!(matches!(
            LevelConfig::random(usize::MAX, 2, 4, 1),
            Err(LevelError::InvalidDimensions { .. })
        ));
    }

    #[test]
    fn test_missing_and_invalid_headers() {
        let missing = "ROWS: 1\nTILE_TYPES: 1\n01 01";
        assert!(matches!(
            LevelConfig::parse(missing),
            Err(LevelError::MissingHeader("COLUMNS"))
        ));
        let invalid = "COLUMNS: two\nROWS: 1\nTILE_TYPES: 1\n01 01";
        assert!(matches!(
            LevelConfig::parse(invalid),
            Err(LevelError::InvalidHeader { .. })
        ));
    }

    #[test]
    fn test_parse_without_marker_and_unknown_gravity() {
        let text = "columns: 2\nrows: 1\ntile_types: 1\ngravity: sideways\n01 01\n";
        let loaded = LevelConfig::parse(text).unwrap();
        assert_eq!(loaded.level.gravity(), GravityMode::None);
        assert_eq!(
            loaded.warnings,
            vec![LevelWarning::UnknownGravity("sideways".to_string())]
        );
    }

    #[test]
    fn test_lines_before_marker_are_ignored() {
        let text = "COLUMNS: 2\nROWS: 1\nTILE_TYPES: 1\nstray text\n// Grid Layout\n01 01\n";
        let loaded = LevelConfig::parse(text).unwrap();
        assert_eq!(loaded.level.cells()[0].kind, TileKind::Normal(1));
        assert!(matches!(
            loaded.warnings.as_slice(),
            [LevelWarning::IgnoredLine { line: 4, .. }]
        ));
    }

    #[test]
    fn test_random_level_is_deterministic_and_paired() {
        let a = LevelConfig::random(6, 5, 4, 514514).unwrap();
        let b = LevelConfig::random(6, 5, 4, 514514).unwrap();
        let c = LevelConfig::random(6, 5, 4, 514515).unwrap();
        assert_eq!(a, b);
        assert_ne!(a.cells(), c.cells());
        assert_eq!(a.pair_count(), 15);
        assert!(a.key_counts().values().all(|n| n % 2 == 0));

        let odd = LevelConfig::random(3, 3, 2, 1).unwrap();
        let empties = odd
            .cells()
            .iter()
            .filter(|c| c.kind == TileKind::Empty)
            .count();
        assert_eq!(empties, 1);
    }

    #[test]
    fn test_bundled_levels_load_cleanly() {
        for text in [
            include_str!("../levels/level_1.txt"),
            include_str!("../levels/level_2.txt"),
        ] {
            let loaded = LevelConfig::parse(text).unwrap();
            assert!(loaded.warnings.is_empty(), "{:?}", loaded.warnings);
        }
    }

    #[test]
    fn test_load_missing_file() {
        let result = LevelConfig::load(Path::new("definitely/not/here.txt"));
        assert!(matches!(result, Err(LevelError::FileRead { .. })));
    }
}
