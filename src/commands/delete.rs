use super::context::Session;
use crate::cli::commands::DeleteCommands;
use amocrm_sdk::api::models::{Entity, RawEntity};
use amocrm_sdk::api::{BatchOutput, Resource, ResponseMode};
use anyhow::{Context, Result, bail};
use log::info;

pub async fn delete_command(session: &Session, args: DeleteCommands) -> Result<()> {
    let resource = Resource::parse(&args.resource)
        .with_context(|| format!("Unknown resource '{}'", args.resource))?;

    if resource.is_container_scoped() && args.catalog.is_none() {
        bail!("{} needs --catalog", resource.name());
    }

    let entities: Vec<RawEntity> = args
        .ids
        .iter()
        .map(|id| {
            let entity = RawEntity::with_id(resource, *id);
            match args.catalog {
                Some(catalog_id) => entity.in_container(catalog_id),
                None => entity,
            }
        })
        .collect();
    let refs: Vec<&dyn Entity> = entities.iter().map(|entity| entity as &dyn Entity).collect();

    let mode = if args.raw {
        ResponseMode::Raw
    } else {
        ResponseMode::Normalized
    };

    info!("Deleting {} {} record(s)", refs.len(), resource.name());
    let output = session
        .planner()
        .delete_many_with(&session.account, &refs, mode)
        .await?;

    println!("Deleted {} {} record(s)", refs.len(), resource.name());
    match output {
        BatchOutput::Items(items) if !items.is_empty() => {
            println!("{}", serde_json::to_string_pretty(&items)?)
        }
        BatchOutput::Raw(responses) => println!("{}", serde_json::to_string_pretty(&responses)?),
        BatchOutput::Items(_) => {}
    }
    Ok(())
}
