mod config;
mod emitter;
mod predict;
mod visibility;

use clap::{Parser, Subcommand};
use std::process::ExitCode;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::config::Config;
use crate::emitter::Runner;
use crate::predict::{PassesClient, ReqwestClient};
use crate::visibility::{SystemClock, VisibilityOrchestrator};

const DEFAULT_CONFIG: &str = "/app/config.yaml";
const EXIT_INTERRUPTED: u8 = 130;

#[derive(Parser)]
#[command(name = "satlight")]
#[command(about = "Emit a status line while configured satellites are overhead")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate a config file
    Validate {
        #[arg(default_value = DEFAULT_CONFIG)]
        config: String,
    },
    /// Watch for passes and emit status lines
    Run {
        #[arg(default_value = DEFAULT_CONFIG)]
        config: String,
        /// Run a single cycle and exit
        #[arg(long)]
        once: bool,
    },
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Validate { config } => validate(&config),
        Commands::Run { config, once } => run(&config, once),
    }
}

fn load(path: &str) -> Option<Config> {
    match Config::from_file(path) {
        Ok(config) => Some(config),
        Err(e) => {
            log::error!("Failed to load config {}: {}", path, e);
            None
        }
    }
}

fn validate(path: &str) -> ExitCode {
    let Some(config) = load(path) else {
        return ExitCode::FAILURE;
    };

    println!(
        "Config is valid ({} satellites, min elevation {}°)",
        config.satellites.len(),
        config.min_elevation_deg
    );
    println!(
        "  station: {}, {}",
        config.station.latitude_deg, config.station.longitude_deg
    );
    for (id, tag) in &config.satellites {
        println!("  {}: {}", id, tag);
    }
    for output in &config.outputs {
        println!("  output: {}", output);
    }
    ExitCode::SUCCESS
}

fn run(path: &str, once: bool) -> ExitCode {
    let Some(config) = load(path) else {
        return ExitCode::FAILURE;
    };

    let client = match ReqwestClient::with_timeout(config.api.timeout) {
        Ok(c) => c,
        Err(e) => {
            log::error!("{}", e);
            return ExitCode::FAILURE;
        }
    };
    let fetcher = PassesClient::new(client, config.api.base_url.clone());
    let visibility = VisibilityOrchestrator::new(fetcher);
    let mut runner = Runner::new(config, visibility, SystemClock::new());

    if once {
        runner.run_once();
        return ExitCode::SUCCESS;
    }

    let shutdown = Arc::new(AtomicBool::new(false));
    let handler_flag = Arc::clone(&shutdown);
    if let Err(e) = ctrlc::set_handler(move || handler_flag.store(true, Ordering::SeqCst)) {
        log::error!("Failed to set signal handler: {}", e);
        return ExitCode::FAILURE;
    }

    runner.run_until(&shutdown);
    log::info!("Interrupted, exiting.");
    ExitCode::from(EXIT_INTERRUPTED)
}
