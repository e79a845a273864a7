//! CLI for the gesture nearest-neighbor trainer

use clap::{Parser, Subcommand};
use gesture_knn::{parse_vector, CommandResult, GestureClass, TrainerConfig, TrainerSession};
use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use tracing_subscriber::filter::LevelFilter;

#[derive(Parser)]
#[command(name = "gesture-knn")]
#[command(about = "Online nearest-neighbor gesture trainer", long_about = None)]
struct Cli {
    /// Directory holding the per-class sample files
    #[arg(short, long, global = true)]
    data_dir: Option<PathBuf>,

    /// JSON config file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Always use brute-force nearest neighbor
    #[arg(long, global = true)]
    no_index: bool,

    /// Log level (error, warn, info, debug, trace)
    #[arg(long, global = true)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Read vectors and control lines from stdin, print classifications
    Run,

    /// Classify a single vector
    Classify {
        /// Vector values (comma-separated)
        #[arg(short, long)]
        vector: String,
    },

    /// Show per-class sample counts
    Stats,

    /// Delete every stored sample
    Clear {
        /// Confirm the deletion
        #[arg(long)]
        yes: bool,
    },
}

/// `CommandError` is not a `std::error::Error`, so convert by message
trait CommandResultExt<T> {
    fn cli(self) -> anyhow::Result<T>;
}

impl<T> CommandResultExt<T> for CommandResult<T> {
    fn cli(self) -> anyhow::Result<T> {
        self.map_err(|e| anyhow::anyhow!("{}", e.message()))
    }
}

fn load_config(cli: &Cli) -> anyhow::Result<TrainerConfig> {
    let mut config = match &cli.config {
        Some(path) => TrainerConfig::load(path)?,
        None => TrainerConfig::default(),
    };
    if let Some(dir) = &cli.data_dir {
        config.data_dir = Some(dir.clone());
    }
    if cli.no_index {
        config.use_index = false;
    }
    if let Some(level) = &cli.log_level {
        config.log_level = level.clone();
    }
    Ok(config)
}

fn open_session(config: &TrainerConfig) -> anyhow::Result<TrainerSession> {
    TrainerSession::open(config).cli()
}

fn parse_class(s: &str) -> anyhow::Result<GestureClass> {
    let index: u8 = s.trim().parse()?;
    Ok(GestureClass::new(index)?)
}

fn parse_log_level(s: &str) -> anyhow::Result<LevelFilter> {
    match s.parse() {
        Ok(level) => Ok(level),
        Err(_) => anyhow::bail!(
            "Invalid log level '{}' (expected error, warn, info, debug, trace or off)",
            s
        ),
    }
}

/// What a single stdin line turned into
#[derive(Debug, PartialEq)]
enum LineOutcome {
    /// JSON to print
    Output(String),
    /// Control line handled, nothing to print
    Handled,
    /// Malformed line, skipped with a warning
    Rejected(String),
}

/// Parse and execute one stdin line.
/// Malformed input is `Rejected`; any session or storage failure is an `Err`.
fn handle_line(session: &TrainerSession, line: &str) -> anyhow::Result<LineOutcome> {
    let line = line.trim();
    let mut parts = line.splitn(2, ' ');
    let command = parts.next().unwrap_or_default();
    let outcome = match command {
        "" => LineOutcome::Handled,
        "rec" => match parse_class(parts.next().unwrap_or_default()) {
            Ok(class) => {
                session.set_recording(Some(class)).cli()?;
                LineOutcome::Handled
            }
            Err(e) => LineOutcome::Rejected(e.to_string()),
        },
        "stop" => {
            session.set_recording(None).cli()?;
            LineOutcome::Handled
        }
        "reload" => {
            session.reload().cli()?;
            LineOutcome::Handled
        }
        "reset" => {
            session.reset().cli()?;
            LineOutcome::Handled
        }
        "status" => {
            let snapshot = session.snapshot().cli()?;
            LineOutcome::Output(serde_json::to_string(&snapshot)?)
        }
        _ => match parse_vector(line) {
            Ok(vector) => {
                let result = session.handle_vector(vector).cli()?;
                LineOutcome::Output(serde_json::to_string(&result)?)
            }
            Err(e) => LineOutcome::Rejected(e),
        },
    };
    Ok(outcome)
}

fn run(session: &TrainerSession) -> anyhow::Result<()> {
    let stdin = io::stdin();
    let mut stdout = io::stdout().lock();

    for line in stdin.lock().lines() {
        let line = line?;
        match handle_line(session, &line)? {
            LineOutcome::Output(output) => writeln!(stdout, "{}", output)?,
            LineOutcome::Handled => {}
            LineOutcome::Rejected(reason) => {
                log::warn!("Ignoring line '{}': {}", line.trim(), reason)
            }
        }
    }
    Ok(())
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = load_config(&cli)?;

    let level = parse_log_level(&config.log_level)?;
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(io::stderr)
        .init();

    match cli.command.unwrap_or(Commands::Run) {
        Commands::Run => {
            let session = open_session(&config)?;
            run(&session)?;
        }
        Commands::Classify { vector } => {
            let vector = parse_vector(&vector).map_err(|e| anyhow::anyhow!(e))?;
            let session = open_session(&config)?;
            let class = session.classify(&vector).cli()?;
            println!("{}", class);
        }
        Commands::Stats => {
            let session = open_session(&config)?;
            let snapshot = session.snapshot().cli()?;
            println!("{}", serde_json::to_string_pretty(&snapshot)?);
        }
        Commands::Clear { yes } => {
            if !yes {
                anyhow::bail!("Refusing to delete stored samples without --yes");
            }
            let session = open_session(&config)?;
            session.reset().cli()?;
            println!("Cleared all stored samples");
        }
    }

    Ok(())
}
