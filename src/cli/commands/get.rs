use clap::Args;

#[derive(Args)]
pub struct GetCommands {
    /// Resource name, e.g. leads, contacts, catalog_elements, leads/notes, contacts/custom_fields
    pub resource: String,

    /// Fetch a single record by id
    #[arg(long)]
    pub id: Option<u64>,

    /// Catalog id for catalog elements
    #[arg(long)]
    pub catalog: Option<u64>,

    /// Query parameter as key=value; nested keys use brackets, e.g. filter[id]=5
    #[arg(short, long = "param", value_name = "KEY=VALUE")]
    pub params: Vec<String>,

    /// Print the response as received instead of the extracted records
    #[arg(long)]
    pub raw: bool,
}
