use clap::Args;

#[derive(Args)]
pub struct DeleteCommands {
    /// Resource name, e.g. catalog_elements, leads/notes
    pub resource: String,

    /// Ids to delete
    #[arg(required = true)]
    pub ids: Vec<u64>,

    /// Catalog id for catalog elements
    #[arg(long)]
    pub catalog: Option<u64>,

    /// Print the responses as received
    #[arg(long)]
    pub raw: bool,
}
