use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use alembic_core::context::SettingsStore;
use alembic_core::host::{MemoryHost, WorldSeed};
use alembic_types::AlembicSettings;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod commands;

use commands::Session;

const SAMPLE_WORLD: &str = include_str!("../world.toml");

#[derive(Parser)]
#[command(version, about = "Alembic tracker REPL over an in-memory world")]
struct Args {
    /// World seed (TOML). Defaults to the bundled sample world.
    #[arg(short, long)]
    world: Option<PathBuf>,
    /// Settings file. Defaults to the platform config directory.
    #[arg(short, long)]
    settings: Option<PathBuf>,
}

fn init_logging() {
    let filter = EnvFilter::builder()
        .with_default_directive(tracing::Level::WARN.into())
        .from_env_lossy();

    if let Ok(path) = std::env::var("ALEMBIC_LOG_PATH")
        && let Ok(file) = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
    {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(true)
            .with_ansi(false)
            .with_writer(file)
            .init();
        return;
    }

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();
}

fn load_world(path: Option<&Path>) -> Result<WorldSeed, String> {
    let text = match path {
        Some(path) => std::fs::read_to_string(path)
            .map_err(|e| format!("{}: {e}", path.display()))?,
        None => SAMPLE_WORLD.to_string(),
    };
    toml::from_str(&text).map_err(|e| format!("invalid world seed: {e}"))
}

fn readline() -> Result<Option<String>, String> {
    write!(std::io::stdout(), "alembic> ").map_err(|e| e.to_string())?;
    std::io::stdout().flush().map_err(|e| e.to_string())?;
    let mut buffer = String::new();
    let read = std::io::stdin()
        .read_line(&mut buffer)
        .map_err(|e| e.to_string())?;
    Ok((read > 0).then_some(buffer))
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), String> {
    init_logging();
    let args = Args::parse();

    let seed = load_world(args.world.as_deref())?;
    let settings = match &args.settings {
        Some(path) => AlembicSettings::load_path(path).map_err(|e| e.to_string())?,
        None => AlembicSettings::load(),
    };
    let host = Arc::new(MemoryHost::from_seed(seed));
    let mut session = Session::new(host, settings, args.settings);
    session.open().await;

    while let Some(line) = readline()? {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        match respond(line, &mut session).await {
            Ok(true) => break,
            Ok(false) => {}
            Err(err) => {
                writeln!(std::io::stdout(), "{err}").map_err(|e| e.to_string())?;
            }
        }
        session.print_output();
    }

    Ok(())
}

#[derive(Parser)]
#[command(no_binary_name = true, disable_version_flag = true)]
struct Repl {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Show vials and daily preparations
    Status,
    /// Show the formula book
    Formulas,
    UseVial,
    AddVial,
    AddVials {
        #[arg(default_value_t = 2)]
        count: u32,
    },
    Refill,
    /// Drag a template onto the preparation list
    Enqueue {
        uuid: String,
        #[arg(short, long)]
        formula: bool,
    },
    /// Drop a raw JSON drag payload onto the preparation list
    Drop { payload: String },
    Remove { id: String },
    Commit,
    Reset,
    Rest,
    /// Advance the world clock by some seconds
    Advance { seconds: u64 },
    /// Press the button on the last vial prompt
    Accept,
    Combat {
        #[arg(action = clap::ArgAction::Set)]
        on: bool,
    },
    Learn { uuid: String },
    Forget { uuid: String },
    /// Post a formula's info card to chat
    Share { uuid: String },
    Settings {
        #[arg(long)]
        vials: Option<u32>,
        #[arg(long)]
        preparations: Option<u32>,
    },
    /// Show capacities derived from intelligence
    Defaults,
    /// Close and reopen the tracker
    Reopen,
    Exit,
}

async fn respond(line: &str, session: &mut Session) -> Result<bool, String> {
    let args = shlex::split(line).ok_or("error: Invalid quoting")?;
    let repl = Repl::try_parse_from(args).map_err(|e| e.to_string())?;

    match repl.command {
        Some(Commands::Status) => session.status().await,
        Some(Commands::Formulas) => session.formulas().await,
        Some(Commands::UseVial) => session.act(commands::use_vial()).await,
        Some(Commands::AddVial) => session.act(commands::add_vial()).await,
        Some(Commands::AddVials { count }) => session.act(commands::add_vials(count)).await,
        Some(Commands::Refill) => session.act(commands::refill()).await,
        Some(Commands::Enqueue { uuid, formula }) => {
            session.act(commands::enqueue(&uuid, formula)).await
        }
        Some(Commands::Drop { payload }) => session.act(commands::drop_payload(payload)).await,
        Some(Commands::Remove { id }) => session.act(commands::remove(id)).await,
        Some(Commands::Commit) => session.commit().await,
        Some(Commands::Reset) => session.act(commands::reset()).await,
        Some(Commands::Rest) => session.rest().await?,
        Some(Commands::Advance { seconds }) => session.advance(seconds).await,
        Some(Commands::Accept) => session.accept().await,
        Some(Commands::Combat { on }) => session.set_combat(on),
        Some(Commands::Learn { uuid }) => session.act(commands::learn(&uuid)).await,
        Some(Commands::Forget { uuid }) => session.act(commands::forget(uuid)).await,
        Some(Commands::Share { uuid }) => session.act(commands::share(uuid)).await,
        Some(Commands::Settings {
            vials,
            preparations,
        }) => session.update_settings(vials, preparations).await?,
        Some(Commands::Defaults) => session.defaults().await,
        Some(Commands::Reopen) => session.reopen().await,
        Some(Commands::Exit) => return Ok(true),
        None => {}
    }
    Ok(false)
}
