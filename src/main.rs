use anyhow::Result;
use clap::Parser;
use log::{debug, info};
use zoho_crm::cli::{self, Cli, Commands};
use zoho_crm::config::ClientConfig;

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::Builder::from_default_env().init();

    let cli = Cli::parse();
    info!("Starting zoho-crm");

    let config = ClientConfig::load(cli.config.as_deref())?;
    debug!("Using API host {}", config.base_url);

    match cli.command {
        Commands::Config => {
            let mut shown = config.clone();
            if shown.auth_token.is_some() {
                shown.auth_token = Some("********".to_string());
            }
            print!("{}", shown.to_toml()?);
        }
        Commands::Modules => {
            let client = config.into_client()?;
            println!("{}", serde_json::to_string_pretty(&cli::list_modules(&client))?);
        }
        Commands::Request(args) => {
            let client = config.into_client()?;
            // Pages are driven by the CLI so --timeout can abort them
            client.set_auto_fetch_paginated_requests(false);
            let output = cli::run_request(&client, args).await?;
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
    }

    Ok(())
}
