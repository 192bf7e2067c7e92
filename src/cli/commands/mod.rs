pub mod delete;
pub mod get;
pub mod token;
pub mod webhooks;

pub use delete::DeleteCommands;
pub use get::GetCommands;
pub use token::{TokenCommands, TokenSubcommands};
pub use webhooks::{WebhookCommands, WebhookSubcommands};
