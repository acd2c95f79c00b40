use anyhow::{Context, Result};
use clap::Parser;
use link_match::config::EngineConfig;
use link_match::engine::{Engine, GameState, Selection};
use link_match::grid::Position;
use link_match::level::LevelConfig;
use link_match::shuffle::ShuffleOutcome;
use std::io::{self, Write};
use std::path::PathBuf;
use std::time::Instant;

#[derive(Parser, Debug)]
#[clap(author, version, about, long_about = None)]
struct Args {
    /// Path to the level file
    level: PathBuf,

    /// Engine configuration (TOML); defaults are used when the file is missing
    #[clap(short, long, default_value = "link_match.toml")]
    config: PathBuf,

    /// Seed for shuffles and bomb respawns, overriding the config file
    #[clap(short, long)]
    seed: Option<u64>,
}

fn load(args: &Args) -> Result<Engine> {
    let loaded = LevelConfig::load(&args.level)
        .with_context(|| format!("failed to load level {}", args.level.display()))?;
    for warning in &loaded.warnings {
        eprintln!("warning: {}", warning);
    }

    let mut config = EngineConfig::load_or_default(&args.config)
        .with_context(|| format!("failed to load config {}", args.config.display()))?;
    if let Some(seed) = args.seed {
        config = config.with_seed(seed);
    }
    let engine = Engine::new(&loaded.level, config).context("failed to start the level")?;
    Ok(engine)
}

fn print_status(engine: &Engine) {
    println!("---------------------");
    let clock = match engine.time_remaining() {
        Some(left) => format!(", Time: {}s", left.as_secs()),
        None => String::new(),
    };
    println!(
        "Score: {}, Tiles: {}, Hints: {}, Shuffles: {}{}",
        engine.score(),
        engine.remaining_count(),
        engine.hints_left(),
        engine.shuffles_left(),
        clock
    );
    println!("{}", engine.grid().render_with_highlight(engine.selected()));
}

fn report_shuffle(outcome: &ShuffleOutcome) {
    match outcome {
        ShuffleOutcome::Accepted { attempts, .. } => {
            println!("Board shuffled ({} attempt(s)).", attempts)
        }
        ShuffleOutcome::Exhausted { attempts } => println!(
            "No solvable arrangement found after {} attempts; board unchanged.",
            attempts
        ),
    }
}

fn main() -> Result<()> {
    let args = Args::parse();
    let mut engine = load(&args)?;
    println!("Welcome to Link Match!");
    if let Some(outcome) = engine.initial_shuffle() {
        println!("The board was dealt without a move.");
        report_shuffle(outcome);
    }

    let mut last_tick = Instant::now();
    loop {
        engine.advance_clock(last_tick.elapsed());
        last_tick = Instant::now();
        print_status(&engine);

        match engine.state() {
            GameState::Won => {
                println!("🎉 BOARD CLEARED! 🎉");
                break;
            }
            GameState::TimeUp => {
                println!("⏰ TIME'S UP!");
                break;
            }
            GameState::Playing | GameState::Paused => {}
        }

        print!("Enter a tile (col row), 'h' for a hint, 's' to shuffle, 'q' to quit: ");
        io::stdout().flush()?;

        let mut input = String::new();
        match io::stdin().read_line(&mut input) {
            Ok(0) => break,
            Ok(_) => {}
            Err(_) => {
                println!("Error reading input. Please try again.");
                continue;
            }
        }

        engine.advance_clock(last_tick.elapsed());
        last_tick = Instant::now();
        if engine.state() != GameState::Playing {
            continue;
        }

        match input.trim() {
            "q" => break,
            "h" => match engine.request_hint() {
                Ok(Some((a, b))) => println!("Try {} and {}.", a, b),
                Ok(None) => println!("No moves available; try a shuffle."),
                Err(e) => println!("{}", e),
            },
            "s" => match engine.request_shuffle() {
                Ok(outcome) => report_shuffle(&outcome),
                Err(e) => println!("{}", e),
            },
            other => {
                let parts: Vec<&str> = other.split_whitespace().collect();
                let coords = match parts.as_slice() {
                    [c, r] => c.parse::<i32>().ok().zip(r.parse::<i32>().ok()),
                    _ => None,
                };
                let (col, row) = match coords {
                    Some(coords) => coords,
                    None => {
                        println!("Invalid input format. Use 'col row', 'h', 's', or 'q'.");
                        continue;
                    }
                };

                match engine.select_tile(Position::new(col, row)) {
                    Ok(Selection::Ignored) => println!("({}, {}) cannot be selected.", col, row),
                    Ok(Selection::Selected(pos)) => println!("Selected {}.", pos),
                    Ok(Selection::Deselected(pos)) => println!("Deselected {}.", pos),
                    Ok(Selection::Rejected { reason, selected }) => {
                        println!("No match ({:?}); {} is now selected.", reason, selected)
                    }
                    Ok(Selection::Matched(turn)) => {
                        println!(
                            "Matched! Path: {}",
                            turn.report
                                .path
                                .points()
                                .iter()
                                .map(|p| p.to_string())
                                .collect::<Vec<_>>()
                                .join(" -> ")
                        );
                        if !turn.report.respawned.is_empty() {
                            println!(
                                "{} tile(s) respawned to keep pairs even.",
                                turn.report.respawned.len()
                            );
                        }
                        if let Some(outcome) = &turn.auto_shuffle {
                            println!("No moves left.");
                            report_shuffle(outcome);
                        }
                    }
                    Err(e) => println!("{}", e),
                }
            }
        }
        engine.complete_turn();
    }

    let summary = engine.shutdown();
    println!("---------------------");
    println!("Final Score: {}", summary.score);
    println!("Matches: {}", summary.matches);
    println!("Tiles left: {}", summary.remaining);
    println!("---------------------");
    Ok(())
}
