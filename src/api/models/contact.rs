use super::entity::Entity;
use super::fields::{CommonFields, insert_opt};
use super::relation::{Relation, embedded_ids};
use crate::api::constants::Resource;
use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};

/// A person
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(remote = "Self")]
pub struct Contact {
    #[serde(flatten)]
    pub common: CommonFields,
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
    #[serde(default)]
    pub company_id: Option<u64>,
    #[serde(default)]
    pub closest_task_at: Option<i64>,
    #[serde(skip)]
    pub leads: Relation,
}

impl Contact {
    pub fn new(name: impl Into<String>) -> Self {
        let mut contact = Self::default();
        contact.common.name = Some(name.into());
        contact
    }

    pub fn with_id(id: u64) -> Self {
        let mut contact = Self::default();
        contact.common.id = Some(id);
        contact
    }

    pub fn add_leads<I: IntoIterator<Item = u64>>(&mut self, ids: I) -> &mut Self {
        self.leads.link(ids);
        self
    }

    pub fn remove_leads<I: IntoIterator<Item = u64>>(&mut self, ids: I) -> &mut Self {
        self.leads.unlink(ids);
        self
    }

    /// A contact belongs to at most one company; the last call wins
    pub fn set_company(&mut self, company_id: u64) -> &mut Self {
        self.company_id = Some(company_id);
        self
    }

    pub fn phone(&self) -> Option<&str> {
        self.common.phone()
    }

    pub fn email(&self) -> Option<&str> {
        self.common.email()
    }
}

impl Serialize for Contact {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        Contact::serialize(self, serializer)
    }
}

/// Relations start from the ids the server lists under `_embedded` (`leads`)
impl<'de> Deserialize<'de> for Contact {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let record = Value::deserialize(deserializer)?;
        let mut contact = Contact::deserialize(&record).map_err(D::Error::custom)?;
        contact.leads = Relation::from_linked(embedded_ids(&record, "leads"));
        Ok(contact)
    }
}

impl Entity for Contact {
    fn resource(&self) -> Resource {
        Resource::Contacts
    }

    fn id(&self) -> Option<u64> {
        self.common.id
    }

    fn fields(&self) -> Map<String, Value> {
        let mut params = Map::new();
        self.common.write_params(&mut params);
        insert_opt(&mut params, "first_name", &self.first_name);
        insert_opt(&mut params, "last_name", &self.last_name);
        insert_opt(&mut params, "company_id", &self.company_id);
        insert_opt(&mut params, "closest_task_at", &self.closest_task_at);
        params
    }

    fn relations(&self) -> Vec<(&'static str, &Relation)> {
        vec![("leads", &self.leads)]
    }

    fn relations_mut(&mut self) -> Vec<&mut Relation> {
        vec![&mut self.leads]
    }
}
