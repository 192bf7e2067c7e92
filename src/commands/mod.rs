pub mod context;
pub mod delete;
pub mod get;
pub mod token;
pub mod webhooks;

pub use context::Session;
pub use delete::delete_command;
pub use get::get_command;
pub use token::token_command;
pub use webhooks::webhooks_command;
