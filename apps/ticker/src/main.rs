use anyhow::Result;
use stock::{PriceClient, WidgetOutcome, load_widget};
use ticker::config::Config;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let config = Config::from_env()?;
    info!(symbol = %config.symbol, days = config.days, "rendering ticker");

    let outcome = match config.credentials() {
        Some((key_id, secret)) => {
            let client = PriceClient::new(&config.base_api, key_id, secret)?;
            load_widget(&client, &config.symbol, config.days).await
        }
        None => {
            warn!("APCA_API_KEY_ID or APCA_API_SECRET_KEY not set");
            WidgetOutcome::missing_credentials()
        }
    };

    println!("{}", serde_json::to_string_pretty(&outcome)?);
    Ok(())
}
