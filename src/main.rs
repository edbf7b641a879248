use clap::Parser;
use tracing_subscriber::EnvFilter;

use rapseglog_api::cli::{self, Cli};
use rapseglog_api::config::{config, LoggingConfig};

fn init_tracing(logging: &LoggingConfig) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&logging.level));
    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    if logging.json {
        builder.json().init();
    } else {
        builder.compact().init();
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present so DATABASE_URL and friends are visible to the config singleton
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();
    let config = config().clone();
    init_tracing(&config.logging);

    if let Err(e) = cli::run(cli, config).await {
        tracing::error!("{:#}", e);
        eprintln!("Error: {e:#}");
        std::process::exit(1);
    }

    Ok(())
}
