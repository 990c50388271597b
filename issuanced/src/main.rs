use clap::{Parser, Subcommand};
use rst_common::with_tokio::tokio;

use rstdev_domain::entity::ToJSON;

use prople_issuanced::errors::DaemonError;
use prople_issuanced::svc::issuance::Issuance;

#[derive(Parser)]
#[command(name = "issuanced")]
#[command(version = "1.0")]
#[command(long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    #[command(name = "run")]
    #[command(about = "Running the credential issuance flow between the configured agents")]
    Run {
        #[arg(short, long, value_name = "FILE")]
        #[arg(required = true)]
        config: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<(), DaemonError> {
    let cli = Cli::parse();
    match &cli.command {
        Commands::Run { config } => {
            let config = config
                .to_owned()
                .ok_or(DaemonError::ConfigError("missing config file".to_string()))?;

            Issuance::setup_tracing();
            let outcome = Issuance::new(config).run().await?;
            let output = outcome
                .to_json()
                .map_err(|err| DaemonError::OutputError(err.to_string()))?;

            println!("{}", output);
        }
    }

    Ok(())
}
