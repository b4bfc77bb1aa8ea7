use anyhow::Result;
use clap::Parser;

use load_test::cli::{Cli, Mode};
use load_test::{scenarios, validate};

#[tokio::main]
async fn main() -> Result<()> {
    // Parse command line arguments
    let cli = Cli::parse();

    // Initialize tracing
    let subscriber = tracing_subscriber::fmt()
        .with_max_level(if cli.verbose {
            tracing::Level::DEBUG
        } else {
            tracing::Level::INFO
        })
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    match cli.mode {
        Mode::Validate(args) => {
            validate::run(args)?;
        }

        Mode::Run(args) => {
            tracing::info!("MIP Engine Load Test Starting...");
            tracing::info!("Base URL: {}", args.base_url);
            tracing::info!("Requests Dir: {}", args.corpus.requests_dir.display());

            scenarios::random_algorithm::run(args).await?;

            tracing::info!("Load test complete");
        }
    }

    Ok(())
}
