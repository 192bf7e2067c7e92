use super::commands::{DeleteCommands, GetCommands, TokenCommands, WebhookCommands};
use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "amocrm-cli")]
#[command(about = "A CLI tool for reading and writing amoCRM / Kommo data")]
pub struct Cli {
    /// Account name from the config file (defaults to AMOCRM_SUBDOMAIN, then the current account)
    #[arg(short, long, global = true)]
    pub account: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// List records or fetch one by id
    Get(GetCommands),
    /// Delete records by id
    Delete(DeleteCommands),
    /// Webhook subscriptions
    Webhooks(WebhookCommands),
    /// OAuth token management
    Token(TokenCommands),
}
