use clap::Parser; // for cli
use std::process::ExitCode;
use tracing::error;
use tracing_subscriber::{EnvFilter, fmt};

use ubett_waitlist::{config::Args, start_server};

#[tokio::main]
async fn main() -> ExitCode {
    fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    // parse cli arguments, falling back to the environment
    let args = Args::parse();

    match start_server(args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{e}");
            ExitCode::FAILURE
        }
    }
}
