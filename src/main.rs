use batch_writer::{App, Config};
use tracing::info;

/// Entry point for the batch writer.
///
/// Loads the configuration (path from the first argument, defaulting to
/// `config/default.toml`), wires the application and serves until the
/// ingress stops.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();

    let path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "config/default.toml".to_string());
    let config = Config::load(&path)?;
    info!("Batch writer starting with config: {:?}", config);

    let app = App::build(config).await?;
    app.run().await?;

    Ok(())
}
