//! `postcodes`: query postcodes.io from the command line and print JSON.

mod cli;

use std::process::ExitCode;

use clap::Parser;
use cli::{Cli, Commands};
use postcodes_client::transport::ReqwestTransport;
use postcodes_client::{Coordinate, PostcodesClient, PostcodesError};
use serde_json::{Value, json};
use tracing_subscriber::EnvFilter;

async fn run(
    client: &mut PostcodesClient<ReqwestTransport>,
    command: Commands,
) -> Result<Value, PostcodesError> {
    let output = match command {
        Commands::Lookup { postcode } => Value::Object(client.lookup(&postcode).await?),
        Commands::Bulk { postcodes } => json!(client.lookup_bulk(postcodes.as_slice()).await?),
        Commands::Latlon {
            longitude,
            latitude,
        } => json!(
            client
                .lookup_lat_lon(Coordinate::new(longitude, latitude))
                .await?
        ),
        Commands::Validate { postcode } => json!(client.is_valid(&postcode).await?),
        Commands::Nearest { postcode } => json!(client.nearest(&postcode).await?),
        Commands::Autocomplete { postcode, limit } => {
            json!(client.autocomplete(&postcode, limit).await?)
        }
        Commands::Random => Value::Object(client.random().await?),
        Commands::Distance { from, to } => json!({ "km": client.distance(&from, &to).await? }),
        Commands::Outcode { outcode } => Value::Object(client.lookup_outcode(&outcode).await?),
    };
    Ok(output)
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Cli::parse();
    let config = args.config();
    let mut client = match PostcodesClient::from_config(&config) {
        Ok(client) => client,
        Err(e) => {
            eprintln!("Failed to create client: {e}");
            return ExitCode::FAILURE;
        }
    };

    match run(&mut client, args.command).await {
        Ok(output) => {
            match serde_json::to_string_pretty(&output) {
                Ok(text) => println!("{text}"),
                Err(_) => println!("{output}"),
            }
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}
