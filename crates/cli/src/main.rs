//! Orca CLI
//!
//! Picks a working directory on an Orca backend, starts a coding session in
//! it, and sends prompts and model/agent switches from the terminal.

mod cmd_dirs;
mod cmd_start;
mod config;
mod logging;
mod paths;

use std::path::PathBuf;

use clap::{CommandFactory, Parser, Subcommand};
use url::Url;

pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[derive(Parser)]
#[command(name = "orca", version, about = "Start and drive remote coding sessions")]
struct Cli {
    /// Backend origin, e.g. https://orca.example.com
    #[arg(long, env = "ORCA_SERVER_URL", global = true)]
    server: Option<Url>,

    /// Config file (default: <data-dir>/client.toml)
    #[arg(long, env = "ORCA_CONFIG", global = true)]
    config: Option<PathBuf>,

    /// Data directory for config and logs (default: ~/.orca)
    #[arg(long, env = "ORCA_DATA_DIR", global = true)]
    data_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// List the directories the backend offers
    Dirs,
    /// Start a session and open an interactive prompt
    Start {
        /// Directory path or name to use instead of asking
        #[arg(long)]
        dir: Option<String>,
        /// Seconds to wait for the session to start (0 waits forever)
        #[arg(long)]
        timeout_secs: Option<u64>,
    },
    /// Print shell completions
    Completions {
        shell: clap_complete::Shell,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    if let Command::Completions { shell } = cli.command {
        clap_complete::generate(shell, &mut Cli::command(), "orca", &mut std::io::stdout());
        return Ok(());
    }

    let data_dir = paths::resolve_data_dir(cli.data_dir.as_deref())?;
    let _logging = logging::init_logging(&paths::log_dir(&data_dir))?;

    let (config_path, explicit) = match cli.config {
        Some(path) => (path, true),
        None => (paths::config_path(&data_dir), false),
    };
    let file = config::load_file(&config_path, explicit)?;

    let timeout_override = match &cli.command {
        Command::Start { timeout_secs, .. } => *timeout_secs,
        _ => None,
    };
    let config = config::resolve(
        file,
        config::Overrides {
            server_url: cli.server,
            session_ready_timeout_secs: timeout_override,
        },
    )?;

    tracing::info!(
        component = "cli",
        event = "cli.started",
        version = VERSION,
        server_url = %config.server_url,
        config_path = %config_path.display(),
    );

    match cli.command {
        Command::Dirs => cmd_dirs::run(&config).await,
        Command::Start { dir, .. } => cmd_start::run(&config, dir.as_deref()).await,
        Command::Completions { .. } => Ok(()),
    }
}
