use amocrm_sdk::config::Config;
use anyhow::Result;
use clap::Parser;
use log::info;

mod cli;
mod commands;

use cli::{Cli, Commands};
use commands::{Session, delete_command, get_command, token_command, webhooks_command};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logger to file (truncate on each run)
    let log_file = std::fs::OpenOptions::new()
        .create(true)
        .write(true)
        .truncate(true)
        .open("amocrm-cli.log")?;
    env_logger::Builder::from_default_env()
        .target(env_logger::Target::Pipe(Box::new(log_file)))
        .init();

    if let Err(error) = dotenvy::dotenv() {
        log::debug!("No .env file loaded: {}", error);
    }

    let cli = Cli::parse();
    info!("Starting amocrm-cli");

    let config = Config::load()?;
    let account = cli.account.as_deref();

    match cli.command {
        Commands::Token(args) => token_command(&config, account, args).await,
        Commands::Get(args) => {
            let session = Session::open(config, account).await?;
            get_command(&session, args).await
        }
        Commands::Delete(args) => {
            let session = Session::open(config, account).await?;
            delete_command(&session, args).await
        }
        Commands::Webhooks(args) => {
            let session = Session::open(config, account).await?;
            webhooks_command(&session, args).await
        }
    }
}
