use anyhow::{Context, anyhow};
use clap::{Parser, ValueEnum};
use crossterm::ExecutableCommand;
use crossterm::cursor::{Hide, Show};
use crossterm::terminal::{self, EnterAlternateScreen, LeaveAlternateScreen};
use std::fs::File;
use std::io::{self, BufReader, Write};
use std::path::PathBuf;
use std::sync::Mutex;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::filter::LevelFilter;
use trapmaze_core as game;

mod app;
mod render;

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
enum Preset {
    /// 15 traps, goal in the bottom-right corner
    Classic,
    /// 5 traps, goal anywhere
    Scattered,
}

impl Preset {
    fn config(self) -> game::GameConfig {
        match self {
            Self::Classic => game::GameConfig::CLASSIC,
            Self::Scattered => game::GameConfig::SCATTERED,
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
enum Goal {
    Fixed,
    Random,
}

impl From<Goal> for game::GoalPlacement {
    fn from(goal: Goal) -> Self {
        match goal {
            Goal::Fixed => Self::Fixed,
            Goal::Random => Self::Random,
        }
    }
}

/// Reach the goal before the clock runs out, without stepping on a hidden trap.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// What log level to use
    #[command(flatten)]
    verbose: clap_verbosity_flag::Verbosity,

    /// Write logs to this file, the terminal is busy drawing the maze
    #[arg(long)]
    log_file: Option<PathBuf>,

    /// Force a seed instead of random
    #[arg(short, long)]
    seed: Option<u64>,

    /// Starting point for the game settings
    #[arg(long, value_enum, default_value_t = Preset::Classic)]
    preset: Preset,

    /// Read game settings from a JSON file instead of a preset
    #[arg(long, conflicts_with = "preset")]
    config: Option<PathBuf>,

    #[arg(long)]
    rows: Option<game::Coord>,

    #[arg(long)]
    cols: Option<game::Coord>,

    #[arg(long)]
    traps: Option<game::CellCount>,

    /// Countdown length in seconds
    #[arg(long)]
    seconds: Option<u32>,

    #[arg(long, value_enum)]
    goal: Option<Goal>,

    /// Print the generated maze as JSON and exit
    #[arg(long)]
    dump_maze: bool,
}

impl Args {
    fn game_config(&self) -> anyhow::Result<game::GameConfig> {
        let mut config = match &self.config {
            Some(path) => {
                let file = File::open(path)
                    .with_context(|| format!("Could not open config {}", path.display()))?;
                serde_json::from_reader(BufReader::new(file))
                    .with_context(|| format!("Could not parse config {}", path.display()))?
            }
            None => self.preset.config(),
        };

        if let Some(rows) = self.rows {
            config.size.0 = rows;
        }
        if let Some(cols) = self.cols {
            config.size.1 = cols;
        }
        if let Some(traps) = self.traps {
            config.traps = traps;
        }
        if let Some(seconds) = self.seconds {
            config.initial_secs = seconds;
        }
        if let Some(goal) = self.goal {
            config.goal_placement = goal.into();
        }

        config.validate().context("Invalid game settings")?;
        Ok(config)
    }
}

fn level_filter(level: Option<log::Level>) -> LevelFilter {
    match level {
        None => LevelFilter::OFF,
        Some(log::Level::Error) => LevelFilter::ERROR,
        Some(log::Level::Warn) => LevelFilter::WARN,
        Some(log::Level::Info) => LevelFilter::INFO,
        Some(log::Level::Debug) => LevelFilter::DEBUG,
        Some(log::Level::Trace) => LevelFilter::TRACE,
    }
}

fn init_logging(args: &Args) -> anyhow::Result<()> {
    let Some(path) = &args.log_file else {
        return Ok(());
    };

    let file = File::create(path)
        .with_context(|| format!("Could not create log file {}", path.display()))?;
    let filter = EnvFilter::builder()
        .with_default_directive(level_filter(args.verbose.log_level()).into())
        .from_env_lossy();

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .try_init()
        .map_err(|err| anyhow!(err))
        .context("Error initializing logger")
}

/// Raw mode plus alternate screen, restored on drop even when setup or the game loop fails.
struct TerminalGuard<W: Write> {
    out: W,
}

impl<W: Write> TerminalGuard<W> {
    fn enter(out: W) -> io::Result<Self> {
        terminal::enable_raw_mode()?;
        let mut guard = Self { out };
        guard.out.execute(EnterAlternateScreen)?;
        guard.out.execute(Hide)?;
        Ok(guard)
    }
}

impl<W: Write> Drop for TerminalGuard<W> {
    fn drop(&mut self) {
        let steps = [
            self.out.execute(Show).map(|_| ()),
            self.out.execute(LeaveAlternateScreen).map(|_| ()),
            terminal::disable_raw_mode(),
        ];
        for err in steps.into_iter().filter_map(Result::err) {
            log::warn!("Could not restore terminal: {}", err);
        }
    }
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    init_logging(&args)?;

    let config = args.game_config()?;
    let seed = args.seed.unwrap_or_else(rand::random);
    log::debug!("seed: {}, config: {:?}", seed, config);

    let mut engine = game::GameEngine::from_seed(config, seed)?;

    if args.dump_maze {
        let mut stdout = io::stdout().lock();
        serde_json::to_writer_pretty(&mut stdout, engine.maze())?;
        writeln!(stdout)?;
        return Ok(());
    }

    let _guard = TerminalGuard::enter(io::stdout())?;
    app::run(&mut io::stdout(), &mut engine)
}
