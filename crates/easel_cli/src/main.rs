//! Command-line host for persisted editor state.
//!
//! # Responsibility
//! - Run the slice migrator over snapshot files.
//! - Inspect, update and reset slices stored in a snapshot database.

use clap::{Parser, Subcommand, ValueEnum};
use easel_core::db::open_db;
use easel_core::model::snapshot::snapshot_from_value;
use easel_core::{
    core_version, flush_logging, init_logging, migrate_snapshot, CanvasSettingsState,
    CoreConfig, PersistenceService, Slice, SliceStore, SqliteSnapshotRepository, UiState,
};
use log::{error, info};
use serde_json::{json, Value};
use std::error::Error;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

type CliResult<T> = Result<T, Box<dyn Error>>;

#[derive(Parser)]
#[command(name = "easel", version, about = "Migrate and inspect persisted easel editor state")]
struct Cli {
    /// JSON config file (`log_level`, `log_dir`, `db_path`).
    #[arg(long, global = true, env = "EASEL_CONFIG")]
    config: Option<PathBuf>,
    #[arg(long, global = true, env = "EASEL_LOG_LEVEL")]
    log_level: Option<String>,
    /// Absolute directory for rolling log files.
    #[arg(long, global = true, env = "EASEL_LOG_DIR")]
    log_dir: Option<PathBuf>,
    /// Snapshot database file.
    #[arg(long, global = true, env = "EASEL_DB")]
    db: Option<PathBuf>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Migrate a snapshot read from FILE (or stdin) and print it.
    Migrate {
        #[arg(long, value_enum)]
        slice: SliceArg,
        file: Option<PathBuf>,
    },
    /// Print every slice hydrated from the database.
    Inspect,
    /// Apply one JSON command to a stored slice and save it.
    Dispatch {
        #[arg(long, value_enum)]
        slice: SliceArg,
        /// Command JSON, e.g. `{"type":"toggleHud"}`.
        #[arg(long)]
        command: String,
    },
    /// Delete the stored snapshot of a slice.
    Reset {
        #[arg(long, value_enum)]
        slice: SliceArg,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum SliceArg {
    Ui,
    CanvasSettings,
}

fn main() -> ExitCode {
    let code = match run(Cli::parse()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!("event=cli_exit module=cli status=error error={err}");
            eprintln!("error: {err}");
            ExitCode::FAILURE
        }
    };
    // The logger handle lives in a static and is never dropped.
    flush_logging();
    code
}

fn run(cli: Cli) -> CliResult<()> {
    let config = match &cli.config {
        Some(path) => CoreConfig::load(path)?,
        None => CoreConfig::default(),
    }
    .with_overrides(cli.log_level, cli.log_dir, cli.db)?;

    if let Some(log_dir) = &config.log_dir {
        init_logging(&config.log_level, log_dir)?;
    }
    info!(
        "event=cli_start module=cli status=ok core_version={}",
        core_version()
    );

    match cli.command {
        Commands::Migrate { slice, file } => {
            let snapshot = read_snapshot(file.as_deref())?;
            let migrated = match slice {
                SliceArg::Ui => migrate_as::<UiState>(snapshot),
                SliceArg::CanvasSettings => migrate_as::<CanvasSettingsState>(snapshot),
            };
            print_json(&migrated)
        }
        Commands::Inspect => {
            let conn = open_db(require_db(&config)?)?;
            let service = PersistenceService::new(SqliteSnapshotRepository::new(&conn));
            let store = service.load_app_store()?;
            print_json(&json!({
                (CanvasSettingsState::NAME): &**store.canvas_settings(),
                (UiState::NAME): &**store.ui(),
            }))
        }
        Commands::Dispatch { slice, command } => {
            let conn = open_db(require_db(&config)?)?;
            let service = PersistenceService::new(SqliteSnapshotRepository::new(&conn));
            let state = match slice {
                SliceArg::Ui => dispatch_as::<UiState, _>(&service, &command)?,
                SliceArg::CanvasSettings => {
                    dispatch_as::<CanvasSettingsState, _>(&service, &command)?
                }
            };
            print_json(&state)
        }
        Commands::Reset { slice } => {
            let conn = open_db(require_db(&config)?)?;
            let service = PersistenceService::new(SqliteSnapshotRepository::new(&conn));
            let existed = match slice {
                SliceArg::Ui => service.reset_slice::<UiState>()?,
                SliceArg::CanvasSettings => service.reset_slice::<CanvasSettingsState>()?,
            };
            println!("{}", if existed { "reset" } else { "nothing stored" });
            Ok(())
        }
    }
}

fn migrate_as<S: Slice>(snapshot: easel_core::Snapshot) -> Value {
    Value::Object(migrate_snapshot::<S>(snapshot).0)
}

fn dispatch_as<S, R>(service: &PersistenceService<R>, raw_command: &str) -> CliResult<Value>
where
    S: Slice,
    R: easel_core::SnapshotRepository,
{
    let command: S::Command = serde_json::from_str(raw_command)?;
    let mut store = SliceStore::with_state(service.load_slice::<S>()?);
    store.dispatch(command);
    service.save_slice::<S>(store.state())?;
    Ok(serde_json::to_value(&**store.state())?)
}

fn read_snapshot(file: Option<&Path>) -> CliResult<easel_core::Snapshot> {
    let raw = match file {
        Some(path) => std::fs::read_to_string(path)
            .map_err(|err| format!("cannot read `{}`: {err}", path.display()))?,
        None => {
            let mut buffer = String::new();
            std::io::stdin().read_to_string(&mut buffer)?;
            buffer
        }
    };
    let value: Value = serde_json::from_str(&raw)?;
    snapshot_from_value(value).ok_or_else(|| "snapshot must be a JSON object".into())
}

fn require_db(config: &CoreConfig) -> CliResult<&Path> {
    config
        .db_path
        .as_deref()
        .ok_or_else(|| "no database given; pass --db or set db_path in the config".into())
}

fn print_json(value: &impl serde::Serialize) -> CliResult<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
