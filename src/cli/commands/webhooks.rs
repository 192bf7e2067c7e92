use clap::{Args, Subcommand};

#[derive(Args)]
pub struct WebhookCommands {
    #[command(subcommand)]
    pub command: WebhookSubcommands,
}

#[derive(Subcommand)]
pub enum WebhookSubcommands {
    /// List webhook subscriptions
    List,
    /// Subscribe a URL to events
    Subscribe {
        /// URL amoCRM will call
        destination: String,
        /// Events, e.g. add_lead,update_contact
        #[arg(short, long, value_delimiter = ',', required = true)]
        events: Vec<String>,
    },
    /// Remove a URL's subscription
    Unsubscribe {
        destination: String,
    },
}
