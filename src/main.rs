use clap::{Parser, Subcommand};
use configuration::{init_tracing, load_settings, ConfigOverrides};
use database::{check_database, connect, DbRepository};
use onboarding::CustomerService;
use std::net::SocketAddr;

/// The main entry point for the Bankdesk customer service.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file, if one exists
    dotenvy::dotenv().ok();

    // Parse command-line arguments
    let cli = Cli::parse();

    let settings = load_settings(&cli.overrides)?;
    // The guard flushes the log file on drop, so it lives until main returns.
    let _log_guard = init_tracing(&settings.logging)?;
    tracing::debug!(?settings, "Configuration loaded.");

    // Execute the appropriate command
    match cli.command {
        Commands::Serve { addr } => {
            let addr = match addr {
                Some(addr) => addr,
                None => settings.server.socket_addr()?,
            };

            let pool = connect(&settings.database).await?;

            let service = CustomerService::new(DbRepository::new(pool), settings.onboarding.clone());
            web_server::run_server(addr, service).await?;
        }
        Commands::CheckDb => {
            match check_database(&settings.database).await {
                Ok(()) => println!("Database is up and responding!"),
                Err(e) => {
                    eprintln!("Database check failed: {}", e);
                    return Err(e.into());
                }
            }
        }
    }

    Ok(())
}

// ==============================================================================
// CLI Structure
// ==============================================================================

/// HTTP service for opening, reading and closing bank customers.
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(flatten)]
    overrides: ConfigOverrides,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP server.
    Serve {
        /// Listen address, overriding `server.host` and `server.port`.
        #[arg(long)]
        addr: Option<SocketAddr>,
    },
    /// Connect to the database and run a trivial query.
    CheckDb,
}
