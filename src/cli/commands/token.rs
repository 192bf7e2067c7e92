use clap::{Args, Subcommand};

#[derive(Args)]
pub struct TokenCommands {
    #[command(subcommand)]
    pub command: TokenSubcommands,
}

#[derive(Subcommand)]
pub enum TokenSubcommands {
    /// Show whether tokens are stored for the account
    Status,
    /// Exchange an authorization code for tokens and store them
    Authorize {
        /// Code from the integration's redirect
        code: String,
    },
}
