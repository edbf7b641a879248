use clap::{Parser, Subcommand};

use crate::config::AppConfig;
use crate::database::DatabaseManager;
use crate::services::{CepLookup, ViaCepClient};
use crate::validation;

#[derive(Parser)]
#[command(name = "rapseglog-api")]
#[command(about = "REST back office for clients, orders and deliveries")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    #[command(about = "Run the HTTP API (default)")]
    Serve {
        #[arg(long, help = "Address to bind, overrides SERVER_HOST")]
        host: Option<String>,
        #[arg(long, help = "Port to listen on, overrides RAPSEGLOG_API_PORT")]
        port: Option<u16>,
    },

    #[command(about = "Apply database migrations")]
    Migrate,

    #[command(about = "Resolve a postal code and print it as JSON")]
    Cep {
        #[arg(help = "CEP, 8 digits")]
        cep: String,
    },
}

pub async fn run(cli: Cli, mut config: AppConfig) -> anyhow::Result<()> {
    match cli.command.unwrap_or(Commands::Serve { host: None, port: None }) {
        Commands::Serve { host, port } => {
            if let Some(host) = host {
                config.server.host = host;
            }
            if let Some(port) = port {
                config.server.port = port;
            }
            crate::server::serve(config).await
        }
        Commands::Migrate => {
            let pool = DatabaseManager::connect_lazy(&config.database)?;
            DatabaseManager::migrate(&pool).await?;
            println!("Migrations applied");
            Ok(())
        }
        Commands::Cep { cep } => {
            let cep = validation::cep(&cep)?;
            let client = ViaCepClient::new(&config.cep)?;
            let address = client.lookup(&cep).await?;
            println!("{}", serde_json::to_string_pretty(&address)?);
            Ok(())
        }
    }
}
