//! docext CLI binary entry point.

use std::process::ExitCode;

use docext::cli::commands::{handle_extract, handle_infer, handle_parse};
use docext::cli::{Cli, Commands};
use docext::config::DocextConfig;
use docext::error::DocextError;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "docext=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    match run(Cli::parse_args()).await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<ExitCode, DocextError> {
    // `parse` works offline and needs no configuration.
    let load = || DocextConfig::load(cli.config.as_deref());
    match cli.command {
        Commands::Infer(args) => handle_infer(&load()?, args).await,
        Commands::Extract(args) => handle_extract(&load()?, args).await,
        Commands::Parse(args) => handle_parse(args).await,
    }
}
