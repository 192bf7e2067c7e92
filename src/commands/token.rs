use super::context::open_token_store;
use crate::cli::commands::{TokenCommands, TokenSubcommands};
use amocrm_sdk::auth::{OAuth2Auth, TokenStore};
use amocrm_sdk::config::Config;
use anyhow::{Context, Result};
use log::info;

pub async fn token_command(config: &Config, account_name: Option<&str>, args: TokenCommands) -> Result<()> {
    let (name, account_config) = config.resolve_account(account_name)?;
    let account = account_config.account();
    let store = open_token_store(config).await?;

    match args.command {
        TokenSubcommands::Status => {
            if account_config.token.is_some() {
                println!("Account '{}' uses a permanent token", name);
            } else if store.has_tokens(&account.full_domain()).await? {
                println!("Tokens stored for {}", account.full_domain());
            } else {
                println!(
                    "No tokens stored for {}; run `amocrm-cli token authorize <code>`",
                    account.full_domain()
                );
            }
        }
        TokenSubcommands::Authorize { code } => {
            let oauth = account_config
                .oauth
                .as_ref()
                .with_context(|| format!("Account '{}' has no OAuth credentials", name))?;

            info!("Authorizing account '{}'", name);
            let auth = OAuth2Auth::new(oauth.into(), store);
            let tokens = auth.authorize(&account, &code).await?;
            println!(
                "Stored tokens for {} (expire in {}s)",
                account.full_domain(),
                tokens.expires_in
            );
        }
    }
    Ok(())
}
