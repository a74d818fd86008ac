//! Recordflow CLI - ingest, validate and analyze tabular data
//!
//! ```bash
//! recordflow process data.csv                  # Clean + transform
//! recordflow process data.csv -o output.csv    # Custom output
//! recordflow validate data.csv -o errors.json  # Validate with error report
//! recordflow analyze data.csv                  # Field statistics
//! recordflow convert data.csv data.json        # CSV <-> JSON
//! recordflow info --verbose                    # Configuration and system info
//! recordflow demo                              # Feature demo (default)
//! ```

use clap::Parser;
use recordflow::{logging, AppContext, Command, CommandDispatcher, SettingsLoader};
use std::path::PathBuf;
use tracing::{info, warn};

/// Exit status for a user interrupt (128 + SIGINT).
const EXIT_INTERRUPTED: i32 = 130;

#[derive(Parser)]
#[command(name = "recordflow", version)]
#[command(about = "Tabular data ingestion, validation and analysis", long_about = None)]
struct Cli {
    /// Path to the configuration file (default: config/config.json)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Logging level (overrides the configuration)
    #[arg(
        long,
        global = true,
        value_parser = clap::builder::PossibleValuesParser::new(logging::LEVEL_NAMES.iter().copied())
    )]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[tokio::main]
async fn main() {
    // Load .env file (if present)
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    let mut loader = SettingsLoader::new(cli.config.as_deref());
    if let Some(ref level) = cli.log_level {
        loader = loader.with_override("logging.level", level.as_str());
    }

    let settings = match loader.load() {
        Ok(settings) => settings,
        Err(e) => {
            eprintln!("❌ Error: {}", e);
            std::process::exit(1);
        }
    };

    let level = match logging::parse_level(settings.log_level()) {
        Ok(level) => level,
        Err(e) => {
            eprintln!("❌ Error: {}", e);
            std::process::exit(1);
        }
    };
    logging::init(level);

    if !settings.loaded_from_file() {
        warn!(
            "Config file {} not found, using defaults",
            settings.config_path().display()
        );
    }
    info!("Starting {} v{}", settings.app_name(), settings.app_version());

    let command = cli.command.unwrap_or_default();
    let ctx = AppContext::new(settings);
    let task = tokio::task::spawn_blocking(move || {
        CommandDispatcher::new(ctx).dispatch_stdio(&command)
    });

    let interrupted = async {
        if tokio::signal::ctrl_c().await.is_err() {
            std::future::pending::<()>().await;
        }
    };

    let code = tokio::select! {
        joined = task => match joined {
            Ok(code) => code,
            Err(e) => {
                eprintln!("❌ Error: {}", e);
                1
            }
        },
        _ = interrupted => {
            info!("Application interrupted by user");
            EXIT_INTERRUPTED
        }
    };

    if code == 0 {
        info!("Application completed successfully");
    }
    std::process::exit(code);
}
