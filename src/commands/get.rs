use super::context::{Session, parse_params};
use crate::cli::commands::GetCommands;
use amocrm_sdk::api::Resource;
use anyhow::{Context, Result, bail};
use log::info;
use serde_json::Value;

/// Print records of a resource, or one record when an id is given
pub async fn get_command(session: &Session, args: GetCommands) -> Result<()> {
    let resource = Resource::parse(&args.resource)
        .with_context(|| format!("Unknown resource '{}'", args.resource))?;
    if resource.is_container_scoped() && args.catalog.is_none() {
        bail!("{} needs --catalog", resource.name());
    }
    let params = parse_params(&args.params)?;
    let reader = session.reader();

    info!("Reading {} for account '{}'", resource.name(), session.name);

    let output = match args.id {
        Some(id) => {
            reader
                .fetch_record(&session.account, resource, args.catalog, id, params)
                .await?
        }
        None => {
            let path = resource
                .path(args.catalog)
                .with_context(|| format!("{} needs --catalog", resource.name()))?;
            if args.raw {
                reader
                    .get_raw(&session.account, &path, params)
                    .await?
                    .unwrap_or(Value::Null)
            } else {
                let records = reader.list(&session.account, &path, params).await?;
                println!("{} record(s)", records.len());
                Value::Array(records)
            }
        }
    };

    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}
