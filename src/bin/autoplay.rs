use anyhow::{Context, Result};
use clap::Parser;
use link_match::config::EngineConfig;
use link_match::engine::{Engine, GameState, Selection};
use link_match::level::LevelConfig;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[clap(author, version, about, long_about = None)]
struct Args {
    /// Level file to play; a random level is generated per game when omitted
    level: Option<PathBuf>,

    /// Columns of generated levels
    #[clap(long, default_value_t = 8)]
    width: usize,

    /// Rows of generated levels
    #[clap(long, default_value_t = 6)]
    height: usize,

    /// Tile types of generated levels
    #[clap(long, default_value_t = 6)]
    types: u16,

    /// Number of games to play
    #[clap(short, long, default_value_t = 10)]
    games: u32,

    /// Base seed; game `i` uses `seed + i`
    #[clap(short, long, default_value_t = 514514)]
    seed: u64,

    /// Shuffles allowed per game when the board runs out of moves
    #[clap(long, default_value_t = 3)]
    shuffles: u32,
}

struct GameResult {
    cleared: bool,
    matches: u32,
    remaining: usize,
}

/// Plays one game by always taking the hinted pair.
fn play(level: &LevelConfig, config: EngineConfig) -> Result<GameResult> {
    let mut engine = Engine::new(level, config)?;

    while engine.state() == GameState::Playing {
        match engine.request_hint()? {
            Some((a, b)) => {
                engine.select_tile(a)?;
                if let Selection::Matched(turn) = engine.select_tile(b)? {
                    if turn.auto_shuffle.map_or(false, |s| !s.is_accepted()) {
                        break;
                    }
                }
            }
            None => {
                if engine.shuffles_left() == 0 || !engine.request_shuffle()?.is_accepted() {
                    break;
                }
            }
        }
        engine.complete_turn();
    }

    let summary = engine.shutdown();
    Ok(GameResult {
        cleared: summary.state == GameState::Won,
        matches: summary.matches,
        remaining: summary.remaining,
    })
}

fn main() -> Result<()> {
    let args = Args::parse();

    let fixed_level = match &args.level {
        Some(path) => {
            let loaded = LevelConfig::load(path)
                .with_context(|| format!("failed to load level {}", path.display()))?;
            for warning in &loaded.warnings {
                eprintln!("warning: {}", warning);
            }
            println!("Loaded level from {}\n", path.display());
            Some(loaded.level)
        }
        None => None,
    };

    let mut cleared = 0;
    for game in 0..args.games {
        let seed = args.seed.wrapping_add(u64::from(game));
        let level = match &fixed_level {
            Some(level) => level.clone(),
            None => LevelConfig::random(args.width, args.height, args.types, seed)
                .context("failed to generate a random level")?,
        };
        let config = EngineConfig {
            seed: Some(seed),
            hint_charges: u32::MAX,
            shuffle_charges: args.shuffles,
            ..EngineConfig::default()
        };

        let result = play(&level, config).with_context(|| format!("game {} failed", game + 1))?;
        if result.cleared {
            cleared += 1;
        }
        println!(
            "Game {:>3}: {} after {} matches ({} tiles left)",
            game + 1,
            if result.cleared { "cleared" } else { "stuck" },
            result.matches,
            result.remaining
        );
    }

    println!("\nCleared {} of {} boards.", cleared, args.games);
    Ok(())
}
