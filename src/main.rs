use std::time::Duration;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use vgsales_client::{
    ClientConfig, DEFAULT_ENDPOINT, InferenceClient, PredictError, PredictionRequest, send_batch,
};

#[derive(Parser)]
#[command(name = "vgsales", version, about = "Predict video-game sales via the inference endpoint")]
struct Cli {
    /// Base URL of the inference server
    #[arg(long, global = true, env = "VGSALES_ENDPOINT", default_value = DEFAULT_ENDPOINT)]
    endpoint: String,

    /// Give up on a request after this many seconds
    #[arg(long, global = true, value_parser = clap::value_parser!(u64).range(1..))]
    timeout_secs: Option<u64>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Predict sales for one game
    Predict {
        #[arg(long)]
        platform: String,
        #[arg(long, allow_negative_numbers = true)]
        year: i64,
        #[arg(long)]
        genre: String,
        #[arg(long)]
        publisher: String,
    },
    /// Run the two sample predictions
    Demo,
    /// Send valid and invalid requests and print each status
    Smoke {
        #[arg(long, default_value_t = 5)]
        valid: usize,
        #[arg(long, default_value_t = 3)]
        invalid: usize,
    },
    /// Check whether the server is ready
    Health,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let mut config = ClientConfig::new(cli.endpoint);
    if let Some(secs) = cli.timeout_secs {
        config = config.with_timeout(Duration::from_secs(secs));
    }
    let client =
        InferenceClient::from_config(&config).context("failed to set up inference client")?;

    match cli.command {
        Command::Predict {
            platform,
            year,
            genre,
            publisher,
        } => {
            let request = PredictionRequest::new(platform, year, genre, publisher);
            print_prediction(&client, &request).await?;
        }
        Command::Demo => {
            let samples = [
                PredictionRequest::new("Nintendo Switch", 2021, "Adventure", "Nintendo"),
                PredictionRequest::new("PS4", 2022, "Action", "Sony Computer Entertainment"),
            ];
            for request in &samples {
                print_prediction(&client, request).await?;
            }
        }
        Command::Smoke { valid, invalid } => {
            let report = send_batch(&client, valid, invalid).await;
            for outcome in &report.outcomes {
                println!("{outcome}");
            }
            if report.aborted().is_some() {
                anyhow::bail!("smoke run against {} aborted", client.base_url());
            }
        }
        Command::Health => {
            let ready = client
                .ready()
                .await
                .with_context(|| format!("could not reach {}", client.base_url()))?;
            println!("{}", if ready { "ready" } else { "not ready" });
            if !ready {
                std::process::exit(1);
            }
        }
    }

    Ok(())
}

/// Prints the prediction, or the server's rejection. Anything else is fatal.
async fn print_prediction(
    client: &InferenceClient,
    request: &PredictionRequest,
) -> anyhow::Result<()> {
    match client.predict(request).await {
        Ok(sales) => println!("Predicted North American sales: {sales} million units"),
        Err(e @ PredictError::Rejected { .. }) => println!("{e}"),
        Err(e) => return Err(e).context("prediction failed"),
    }
    Ok(())
}
