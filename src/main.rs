use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use tracing::debug;

use gator::{registered_commands, Command, Config, Database, GatorError, State};

/// Personal RSS aggregator.
#[derive(Debug, Parser)]
#[command(name = "gator", version, about)]
struct Cli {
    /// Config file to use.
    #[arg(long, env = "GATOR_CONFIG")]
    config: Option<PathBuf>,

    /// Act as this user instead of the configured current user.
    #[arg(long)]
    user: Option<String>,

    /// Override the configured log level.
    #[arg(long)]
    log_level: Option<String>,

    /// Command to run.
    command: String,

    /// Arguments for the command.
    #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
    args: Vec<String>,
}

async fn run(cli: Cli) -> Result<(), GatorError> {
    let config_path = cli.config.unwrap_or_else(Config::default_path);
    let mut config = Config::load_or_default(&config_path)?;
    if let Some(level) = cli.log_level {
        config.logging.level = level;
    }

    if let Err(e) = gator::logging::init(&config.logging) {
        eprintln!("gator: failed to initialize file logging: {e}");
        gator::logging::init_console_only(&config.logging.level);
    }
    debug!("Using config {:?}", config_path);

    let db = Database::open(&config.database.path).await?;
    let commands = registered_commands();

    let mut state = State::new(db, config, config_path);
    if cli.user.is_some() {
        state = state.with_current_user(cli.user);
    }

    let command = Command::new(cli.command, cli.args);
    commands.run(&state, &command).await
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            // Expected conditions get a short message; faults keep the wrapped context
            if e.is_expected() {
                eprintln!("error: {}", e.root());
            } else {
                eprintln!("gator: {e}");
            }
            ExitCode::from(e.exit_code() as u8)
        }
    }
}
