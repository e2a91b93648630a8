use std::path::PathBuf;
use std::process::ExitCode;

use availcheck::{Config, Monitor};
use clap::Parser;
use clap::error::ErrorKind;
use log::{error, info};
use tokio_util::sync::CancellationToken;

/// Probes HTTP endpoints and reports per-domain availability.
#[derive(Parser, Debug)]
#[command(version, about)]
struct Cli {
    /// Endpoint list (.yaml, .yml or .toml)
    config_file_path: PathBuf,
}

#[tokio::main]
async fn main() -> ExitCode {
    env_logger::init_from_env(env_logger::Env::default().default_filter_or("info"));

    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) if matches!(e.kind(), ErrorKind::DisplayHelp | ErrorKind::DisplayVersion) => {
            e.exit()
        }
        Err(e) => {
            eprintln!("{e}");
            eprintln!("Must give exactly 1 argument - config_file_path.yaml");
            return ExitCode::FAILURE;
        }
    };

    let monitor = match Config::load(&cli.config_file_path).and_then(Monitor::from_config) {
        Ok(monitor) => monitor,
        Err(e) => {
            error!(
                "Failed to load configuration from {}: {e}",
                cli.config_file_path.display()
            );
            return ExitCode::FAILURE;
        }
    };

    let token = CancellationToken::new();
    let signal_token = token.clone();
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                info!("Interrupt received, cancelling monitor");
                signal_token.cancel();
            }
            Err(e) => error!("Unable to listen for shutdown signal: {e}"),
        }
    });

    let mut stdout = std::io::stdout();
    // The loop only ends once the interrupt has cancelled the token
    match monitor.run(token, &mut stdout).await {
        Ok(_) => {
            println!("User pressed CTRL+C. Exiting...");
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!("Monitoring failed: {e}");
            ExitCode::FAILURE
        }
    }
}
