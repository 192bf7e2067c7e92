//! API constants and the resource path table for amoCRM API v4

/// API version segment
pub const API_VERSION: &str = "v4";

/// Base API path
pub const API_BASE_PATH: &str = "/api";

/// Default account domain (Kommo accounts use "kommo.com")
pub const DEFAULT_DOMAIN: &str = "amocrm.ru";

/// Maximum number of entities amoCRM accepts in one write request
pub const DEFAULT_BATCH_LIMIT: usize = 250;

/// Seconds added to `updated_at` on updates so the server accepts the change as newest
pub const DEFAULT_UPDATED_AT_DELTA: i64 = 5;

/// Full API path with version
pub fn api_path() -> String {
    format!("{}/{}", API_BASE_PATH, API_VERSION)
}

/// Standard headers for amoCRM requests
pub mod headers {
    /// Content type for JSON requests
    pub const CONTENT_TYPE_JSON: &str = "application/json";

    /// Content type amoCRM uses for HAL responses
    pub const CONTENT_TYPE_HAL_JSON: &str = "application/hal+json";

    /// User agent sent with every request
    pub const USER_AGENT: &str = "amocrm-sdk/0.1";
}

/// Envelope marker keys
pub mod envelope {
    pub const LINKS: &str = "_links";
    pub const EMBEDDED: &str = "_embedded";
    pub const SELF: &str = "self";
    pub const HREF: &str = "href";

    /// Container of custom field groups; not part of the generic lookup
    pub const CUSTOM_FIELD_GROUPS: &str = "custom_field_groups";

    /// Known `_embedded` container keys, in lookup priority order
    pub const CONTAINER_KEYS: [&str; 16] = [
        "leads",
        "contacts",
        "companies",
        "tasks",
        "events",
        "notes",
        "users",
        "roles",
        "pipelines",
        "statuses",
        "catalogs",
        "elements",
        "unsorted",
        "webhooks",
        "widgets",
        "custom_fields",
    ];

    /// Resource names whose endpoints may answer with the bare record plus `_links`
    pub const BARE_RECORD_RESOURCES: [&str; 2] = ["contacts", "leads"];
}

/// Entity types that own notes and custom fields
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum EntityType {
    Leads,
    Contacts,
    Companies,
    Customers,
    Catalogs,
}

impl EntityType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Leads => "leads",
            Self::Contacts => "contacts",
            Self::Companies => "companies",
            Self::Customers => "customers",
            Self::Catalogs => "catalogs",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "leads" => Some(Self::Leads),
            "contacts" => Some(Self::Contacts),
            "companies" => Some(Self::Companies),
            "customers" => Some(Self::Customers),
            "catalogs" => Some(Self::Catalogs),
            _ => None,
        }
    }
}

/// Resource kinds the SDK can route
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Resource {
    Leads,
    Contacts,
    Companies,
    Tasks,
    Events,
    Notes(EntityType),
    Catalogs,
    /// Elements of one catalog; addressed through the catalog id
    CatalogElements,
    CustomFields(EntityType),
    Unsorted,
    Pipelines,
    Users,
    Roles,
    Widgets,
    Webhooks,
}

impl Resource {
    /// Short name used for lock keys and log lines
    pub fn name(&self) -> &'static str {
        match self {
            Self::Leads => "leads",
            Self::Contacts => "contacts",
            Self::Companies => "companies",
            Self::Tasks => "tasks",
            Self::Events => "events",
            Self::Notes(_) => "notes",
            Self::Catalogs => "catalogs",
            Self::CatalogElements => "catalog_elements",
            Self::CustomFields(_) => "custom_fields",
            Self::Unsorted => "unsorted",
            Self::Pipelines => "pipelines",
            Self::Users => "users",
            Self::Roles => "roles",
            Self::Widgets => "widgets",
            Self::Webhooks => "webhooks",
        }
    }

    /// Whether the path depends on a parent (container) identifier
    pub fn is_container_scoped(&self) -> bool {
        matches!(self, Self::CatalogElements)
    }

    /// Resolve the collection path, or `None` when a required container id is missing
    pub fn path(&self, container_id: Option<u64>) -> Option<String> {
        let base = api_path();
        let path = match self {
            Self::Leads => format!("{}/leads", base),
            Self::Contacts => format!("{}/contacts", base),
            Self::Companies => format!("{}/companies", base),
            Self::Tasks => format!("{}/tasks", base),
            Self::Events => format!("{}/events", base),
            Self::Notes(parent) => format!("{}/{}/notes", base, parent.as_str()),
            Self::Catalogs => format!("{}/catalogs", base),
            Self::CatalogElements => format!("{}/catalogs/{}/elements", base, container_id?),
            Self::CustomFields(entity) => format!("{}/{}/custom_fields", base, entity.as_str()),
            Self::Unsorted => format!("{}/leads/unsorted", base),
            Self::Pipelines => format!("{}/leads/pipelines", base),
            Self::Users => format!("{}/users", base),
            Self::Roles => format!("{}/roles", base),
            Self::Widgets => format!("{}/widgets", base),
            Self::Webhooks => format!("{}/webhooks", base),
        };
        Some(path)
    }

    /// Single record path
    pub fn record_path(&self, id: u64, container_id: Option<u64>) -> Option<String> {
        self.path(container_id).map(|path| format!("{}/{}", path, id))
    }

    /// Parse a resource name; notes and custom fields are written `leads/notes`, `contacts/custom_fields`
    pub fn parse(value: &str) -> Option<Self> {
        if let Some((entity, sub)) = value.split_once('/') {
            let entity = EntityType::parse(entity)?;
            return match sub {
                "notes" => Some(Self::Notes(entity)),
                "custom_fields" => Some(Self::CustomFields(entity)),
                _ => None,
            };
        }

        match value {
            "leads" => Some(Self::Leads),
            "contacts" => Some(Self::Contacts),
            "companies" => Some(Self::Companies),
            "tasks" => Some(Self::Tasks),
            "events" => Some(Self::Events),
            "catalogs" => Some(Self::Catalogs),
            "catalog_elements" | "elements" => Some(Self::CatalogElements),
            "unsorted" => Some(Self::Unsorted),
            "pipelines" => Some(Self::Pipelines),
            "users" => Some(Self::Users),
            "roles" => Some(Self::Roles),
            "widgets" => Some(Self::Widgets),
            "webhooks" => Some(Self::Webhooks),
            _ => None,
        }
    }
}

/// Statuses of one pipeline
pub fn pipeline_statuses_path(pipeline_id: u64) -> String {
    format!("{}/leads/pipelines/{}/statuses", api_path(), pipeline_id)
}

/// Webhook subscription endpoints
pub fn webhooks_subscribe_path() -> String {
    format!("{}/webhooks/subscribe", api_path())
}

pub fn webhooks_unsubscribe_path() -> String {
    format!("{}/webhooks/unsubscribe", api_path())
}

/// Unsorted (incoming) lead actions
pub fn unsorted_accept_path() -> String {
    format!("{}/leads/unsorted/accept", api_path())
}

pub fn unsorted_decline_path() -> String {
    format!("{}/leads/unsorted/decline", api_path())
}

/// Widget by code; also the install (POST) and uninstall (DELETE) target
pub fn widget_path(code: &str) -> String {
    format!("{}/widgets/{}", api_path(), code)
}

pub fn custom_field_groups_path(entity: EntityType) -> String {
    format!("{}/{}/custom_fields/groups", api_path(), entity.as_str())
}

/// Unsorted summary; only served by the v2 API
pub fn unsorted_summary_path() -> String {
    format!("{}/v2/incoming_leads/summary", API_BASE_PATH)
}

/// Build the account base URL
pub fn base_url(subdomain: &str, domain: &str) -> String {
    format!("https://{}.{}", subdomain, domain)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resource_paths() {
        assert_eq!(Resource::Leads.path(None).as_deref(), Some("/api/v4/leads"));
        assert_eq!(
            Resource::Notes(EntityType::Contacts).path(None).as_deref(),
            Some("/api/v4/contacts/notes")
        );
        assert_eq!(
            Resource::CustomFields(EntityType::Companies).path(None).as_deref(),
            Some("/api/v4/companies/custom_fields")
        );
    }

    #[test]
    fn test_container_scoped_path_requires_container() {
        assert!(Resource::CatalogElements.is_container_scoped());
        assert_eq!(Resource::CatalogElements.path(None), None);
        assert_eq!(
            Resource::CatalogElements.path(Some(7)).as_deref(),
            Some("/api/v4/catalogs/7/elements")
        );
        assert_eq!(
            Resource::CatalogElements.record_path(3, Some(7)).as_deref(),
            Some("/api/v4/catalogs/7/elements/3")
        );
    }

    #[test]
    fn test_admin_paths() {
        assert_eq!(widget_path("amo_chat"), "/api/v4/widgets/amo_chat");
        assert_eq!(
            custom_field_groups_path(EntityType::Leads),
            "/api/v4/leads/custom_fields/groups"
        );
        assert_eq!(unsorted_summary_path(), "/api/v2/incoming_leads/summary");
        assert_eq!(
            Resource::CustomFields(EntityType::Contacts).record_path(12, None).as_deref(),
            Some("/api/v4/contacts/custom_fields/12")
        );
    }

    #[test]
    fn test_parse_nested_resources() {
        assert_eq!(Resource::parse("leads"), Some(Resource::Leads));
        assert_eq!(
            Resource::parse("contacts/notes"),
            Some(Resource::Notes(EntityType::Contacts))
        );
        assert_eq!(
            Resource::parse("companies/custom_fields"),
            Some(Resource::CustomFields(EntityType::Companies))
        );
        assert_eq!(Resource::parse("leads/unknown"), None);
        assert_eq!(Resource::parse("deals"), None);
    }
}
