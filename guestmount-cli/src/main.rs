mod cli;
mod commands;

use std::process;

use clap::Parser;
use cli::Cli;
use guestmount::BridgeError;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // With a home directory, logs go to <home>/logs; otherwise to stderr.
    if let Some(logs_dir) = cli.global.logs_dir() {
        if let Err(error) = guestmount::init_logging_for(&logs_dir) {
            eprintln!("Error: {}", error);
            process::exit(1);
        }
    } else {
        let level = if cli.global.debug { "debug" } else { "info" };
        let env_filter = EnvFilter::try_from_default_env()
            .or_else(|_| EnvFilter::try_new(level))
            .unwrap_or_else(|_| EnvFilter::new(level));

        tracing_subscriber::registry()
            .with(env_filter)
            .with(fmt::layer().with_writer(std::io::stderr))
            .init();
    }

    let result = match cli.command {
        cli::Commands::Probe(args) => commands::probe::execute(args, &cli.global).await,
    };

    if let Err(error) = result {
        eprintln!("Error: {}", error);
        if let Some(hint) = error.downcast_ref::<BridgeError>().and_then(BridgeError::hint) {
            eprintln!("Hint: {}", hint);
        }
        process::exit(1);
    }
}
