//! toolchat - function-calling chat gateway
//!
//! HTTP service that lets an Ollama-hosted model answer questions by
//! calling weather, news and currency functions.

use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::EnvFilter;

/// Function-calling chat gateway
#[derive(Parser, Debug)]
#[command(name = "toolchat", version, about)]
struct Args {
    /// Path to the YAML configuration file
    #[arg(short, long, default_value = "config/toolchat.yaml")]
    config: String,
}

#[tokio::main]
async fn main() -> ExitCode {
    // Provider API keys are usually supplied via a local .env file
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    let args = Args::parse();

    match toolchat::server::run_server(&args.config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            // Print error using Display (not Debug) to preserve newlines
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}
