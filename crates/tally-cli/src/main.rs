#![forbid(unsafe_code)]

mod cmd;
mod output;
mod paths;

use clap::{Parser, Subcommand};
use output::{CliError, OutputMode};
use std::env;
use std::path::PathBuf;
use tally_core::TallyError;
use tracing::info;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "tally: inventory counting for stocktakes",
    long_about = None
)]
struct Cli {
    /// Enable verbose logging.
    #[arg(short, long)]
    verbose: bool,

    /// Emit JSON output instead of human-readable text.
    #[arg(long, global = true)]
    json: bool,

    /// Suppress non-essential output.
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Override the data directory (default: platform data dir, or
    /// TALLY_DATA_DIR).
    #[arg(long, global = true, value_name = "DIR")]
    data_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

impl Cli {
    /// Derive the output mode from flags.
    fn output_mode(&self) -> OutputMode {
        if self.json {
            OutputMode::Json
        } else {
            OutputMode::Human
        }
    }
}

#[derive(Subcommand, Debug)]
enum Commands {
    #[command(
        about = "Create a count from counting list XML",
        after_help = "EXAMPLES:\n    # Create a count from one or more exported lists\n    tally create --name \"March stocktake\" aisle1.xml aisle2.xml\n\n    # Emit machine-readable output\n    tally create --name \"March stocktake\" aisle1.xml --json"
    )]
    Create(cmd::create::CreateArgs),

    #[command(
        about = "List all counts",
        after_help = "EXAMPLES:\n    # List counts, newest first\n    tally list\n\n    # Emit machine-readable output\n    tally list --json"
    )]
    List(cmd::list::ListArgs),

    #[command(
        about = "Show one count's items",
        after_help = "EXAMPLES:\n    # Show a count\n    tally show count_1712345678901_a1b2c3d4e\n\n    # Narrow to matching items\n    tally show count_1712345678901_a1b2c3d4e --filter bolt"
    )]
    Show(cmd::show::ShowArgs),

    #[command(
        about = "Count interactively with undo/redo",
        after_help = "EXAMPLES:\n    # Start a counting session\n    tally session count_1712345678901_a1b2c3d4e\n\n    # Then type commands like: inc 0 cases 3, done 0, undo, quit"
    )]
    Session(cmd::session::SessionArgs),

    #[command(
        about = "Delete a count permanently",
        after_help = "EXAMPLES:\n    # Delete after confirming\n    tally delete count_1712345678901_a1b2c3d4e --yes"
    )]
    Delete(cmd::delete::DeleteArgs),

    #[command(
        about = "Export a count as CSV",
        after_help = "EXAMPLES:\n    # Write <name>_<date>.csv in the current directory\n    tally export count_1712345678901_a1b2c3d4e\n\n    # Write to stdout\n    tally export count_1712345678901_a1b2c3d4e --output -"
    )]
    Export(cmd::export::ExportArgs),

    #[command(
        about = "Back up every count to JSON",
        after_help = "EXAMPLES:\n    # Write a timestamped backup file\n    tally backup\n\n    # Write to a chosen path\n    tally backup --output saved.json"
    )]
    Backup(cmd::backup::BackupArgs),

    #[command(
        about = "Restore counts from a backup file",
        after_help = "EXAMPLES:\n    # Preview what a restore would do\n    tally restore saved.json\n\n    # Apply it\n    tally restore saved.json --yes"
    )]
    Restore(cmd::restore::RestoreArgs),

    #[command(
        about = "Read or set the theme",
        after_help = "EXAMPLES:\n    # Print the current theme\n    tally theme\n\n    # Switch to dark\n    tally theme dark"
    )]
    Theme(cmd::theme::ThemeArgs),

    #[command(
        about = "Report storage usage",
        after_help = "EXAMPLES:\n    # Show total and per-count sizes\n    tally storage\n\n    # Emit machine-readable output\n    tally storage --json"
    )]
    Storage(cmd::storage::StorageArgs),
}

fn init_tracing() {
    let filter = EnvFilter::try_from_env("TALLY_LOG").unwrap_or_else(|_| {
        EnvFilter::new(if env::var("DEBUG").is_ok() {
            "tally=debug,info"
        } else {
            "tally=info,warn"
        })
    });

    let format = env::var("TALLY_LOG_FORMAT").unwrap_or_else(|_| "compact".to_string());

    let registry = tracing_subscriber::registry().with(filter);

    // Logs go to stderr; stdout is reserved for command output.
    match format.as_str() {
        "json" => {
            registry
                .with(
                    fmt::layer()
                        .json()
                        .with_ansi(false)
                        .with_writer(std::io::stderr),
                )
                .init();
        }
        _ => {
            registry
                .with(fmt::layer().compact().with_writer(std::io::stderr))
                .init();
        }
    }
}

fn main() {
    init_tracing();

    let cli = Cli::parse();
    if cli.verbose {
        info!("Verbose mode enabled");
    }

    let mode = cli.output_mode();
    let result = run(&cli, mode);

    if let Err(err) = result {
        let cli_error = err
            .downcast_ref::<TallyError>()
            .map_or_else(|| CliError::new(format!("{err:#}")), CliError::from);
        let _ = output::render_error(mode, &cli_error);
        std::process::exit(1);
    }
}

fn run(cli: &Cli, mode: OutputMode) -> anyhow::Result<()> {
    let data_dir = paths::resolve_data_dir(cli.data_dir.as_deref())?;

    match &cli.command {
        Commands::Create(args) => cmd::create::run_create(args, mode, &data_dir),
        Commands::List(args) => cmd::list::run_list(args, mode, &data_dir),
        Commands::Show(args) => cmd::show::run_show(args, mode, &data_dir),
        Commands::Session(args) => cmd::session::run_session(args, mode, &data_dir),
        Commands::Delete(args) => cmd::delete::run_delete(args, mode, &data_dir),
        Commands::Export(args) => cmd::export::run_export(args, mode, &data_dir),
        Commands::Backup(args) => cmd::backup::run_backup(args, mode, &data_dir),
        Commands::Restore(args) => cmd::restore::run_restore(args, mode, &data_dir),
        Commands::Theme(args) => cmd::theme::run_theme(args, mode, &data_dir),
        Commands::Storage(args) => cmd::storage::run_storage(args, mode, &data_dir),
    }
}
