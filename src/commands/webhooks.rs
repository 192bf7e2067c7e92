use super::context::Session;
use crate::cli::commands::{WebhookCommands, WebhookSubcommands};
use amocrm_sdk::api::Webhook;
use anyhow::Result;
use log::info;

pub async fn webhooks_command(session: &Session, args: WebhookCommands) -> Result<()> {
    let service = session.webhooks();

    let records = match args.command {
        WebhookSubcommands::List => service.list(&session.account).await?,
        WebhookSubcommands::Subscribe {
            destination,
            events,
        } => {
            info!("Subscribing {} to {:?}", destination, events);
            let hook = Webhook::new(destination).on(events);
            service.subscribe(&session.account, &[hook]).await?
        }
        WebhookSubcommands::Unsubscribe { destination } => {
            info!("Unsubscribing {}", destination);
            service
                .unsubscribe(&session.account, &[Webhook::new(destination)])
                .await?
        }
    };

    println!("{}", serde_json::to_string_pretty(&records)?);
    Ok(())
}
