use anyhow::Result;
use clap::{Parser, Subcommand};
use log::{debug, info};

use netatmo_client::config;
use netatmo_client::{Credentials, DeviceListOptions, NetatmoClient, StationsDataOptions};

#[derive(Parser)]
#[command(name = "netatmo")]
#[command(about = "A CLI for querying Netatmo weather stations and thermostats")]
#[command(version)]
struct Cli {
    /// OAuth2 client id for the Netatmo application
    #[arg(long, env = "NETATMO_CLIENT_ID")]
    client_id: Option<String>,

    /// OAuth2 client secret for the Netatmo application
    #[arg(long, env = "NETATMO_CLIENT_SECRET")]
    client_secret: Option<String>,

    /// Username for the Netatmo account
    #[arg(long, env = "NETATMO_USERNAME")]
    username: Option<String>,

    /// Password for the Netatmo account (optional, will prompt if not provided)
    #[arg(long, env = "NETATMO_PASSWORD")]
    password: Option<String>,

    /// Override the API base URL
    #[arg(long, env = "NETATMO_BASE_URL", hide = true)]
    base_url: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List all modules and devices connected to the account
    Devices {
        /// Restrict the listing to one application type (e.g. app_station)
        #[arg(long)]
        app_type: Option<String>,
    },
    /// Show weather station data for the account
    Stations {
        /// Restrict the listing to one application type (e.g. app_station)
        #[arg(long)]
        app_type: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::init();

    let cli = Cli::parse();

    // Flags and environment variables win over the config file.
    let stored = config::load_config().ok();

    let client_id = cli
        .client_id
        .or_else(|| stored.as_ref().map(|c| c.client_id.clone()))
        .unwrap_or_default();
    let client_secret = cli
        .client_secret
        .or_else(|| stored.as_ref().map(|c| c.client_secret.clone()))
        .unwrap_or_default();
    let username = cli
        .username
        .or_else(|| stored.as_ref().map(|c| c.username.clone()))
        .unwrap_or_default();
    let mut password = cli
        .password
        .or_else(|| stored.as_ref().map(|c| c.password.clone()))
        .unwrap_or_default();

    // Only prompt when the password is the single missing piece; otherwise
    // fall through and let credential validation report what is missing.
    if password.is_empty()
        && !client_id.is_empty()
        && !client_secret.is_empty()
        && !username.is_empty()
    {
        password = rpassword::prompt_password("Netatmo password: ")?;
    }

    let mut credentials = Credentials::new(client_id, client_secret, username, password)?;
    if let Some(scope) = stored.as_ref().and_then(|c| c.scope.clone()) {
        credentials = credentials.with_scope(scope);
    }

    let base_url = cli
        .base_url
        .or_else(|| stored.as_ref().and_then(|c| c.base_url.clone()));

    let client = match base_url {
        Some(url) => NetatmoClient::new_with_base_url(credentials, &url),
        None => NetatmoClient::new(credentials),
    };

    match cli.command {
        Commands::Devices { app_type } => {
            info!("Fetching device list...");
            let options = DeviceListOptions { app_type };
            let (modules, devices) = client.get_device_list(&options).await?;

            println!("modules={}", serde_json::to_string_pretty(&modules)?);
            println!("devices={}", serde_json::to_string_pretty(&devices)?);
        }
        Commands::Stations { app_type } => {
            info!("Fetching stations data...");
            let options = StationsDataOptions { app_type };
            let data = client.get_stations_data(&options).await?;

            println!("devices={}", serde_json::to_string_pretty(&data)?);
        }
    }

    debug!("Cancelling scheduled token refresh before exit");
    client.stop().await;

    Ok(())
}
