use super::entity::Entity;
use super::fields::{CommonFields, insert_opt};
use super::relation::{Relation, embedded_ids};
use crate::api::constants::Resource;
use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};

/// An organization
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(remote = "Self")]
pub struct Company {
    #[serde(flatten)]
    pub common: CommonFields,
    #[serde(default)]
    pub closest_task_at: Option<i64>,
    #[serde(skip)]
    pub leads: Relation,
    #[serde(skip)]
    pub contacts: Relation,
    #[serde(skip)]
    pub customers: Relation,
}

impl Company {
    pub fn new(name: impl Into<String>) -> Self {
        let mut company = Self::default();
        company.common.name = Some(name.into());
        company
    }

    pub fn with_id(id: u64) -> Self {
        let mut company = Self::default();
        company.common.id = Some(id);
        company
    }

    pub fn add_leads<I: IntoIterator<Item = u64>>(&mut self, ids: I) -> &mut Self {
        self.leads.link(ids);
        self
    }

    pub fn remove_leads<I: IntoIterator<Item = u64>>(&mut self, ids: I) -> &mut Self {
        self.leads.unlink(ids);
        self
    }

    pub fn add_contacts<I: IntoIterator<Item = u64>>(&mut self, ids: I) -> &mut Self {
        self.contacts.link(ids);
        self
    }

    pub fn remove_contacts<I: IntoIterator<Item = u64>>(&mut self, ids: I) -> &mut Self {
        self.contacts.unlink(ids);
        self
    }

    pub fn add_customers<I: IntoIterator<Item = u64>>(&mut self, ids: I) -> &mut Self {
        self.customers.link(ids);
        self
    }

    pub fn remove_customers<I: IntoIterator<Item = u64>>(&mut self, ids: I) -> &mut Self {
        self.customers.unlink(ids);
        self
    }

    pub fn phone(&self) -> Option<&str> {
        self.common.phone()
    }

    pub fn email(&self) -> Option<&str> {
        self.common.email()
    }
}

impl Serialize for Company {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        Company::serialize(self, serializer)
    }
}

/// Relations start from the ids the server lists under `_embedded`
impl<'de> Deserialize<'de> for Company {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let record = Value::deserialize(deserializer)?;
        let mut company = Company::deserialize(&record).map_err(D::Error::custom)?;
        company.leads = Relation::from_linked(embedded_ids(&record, "leads"));
        company.contacts = Relation::from_linked(embedded_ids(&record, "contacts"));
        company.customers = Relation::from_linked(embedded_ids(&record, "customers"));
        Ok(company)
    }
}

impl Entity for Company {
    fn resource(&self) -> Resource {
        Resource::Companies
    }

    fn id(&self) -> Option<u64> {
        self.common.id
    }

    fn fields(&self) -> Map<String, Value> {
        let mut params = Map::new();
        self.common.write_params(&mut params);
        insert_opt(&mut params, "closest_task_at", &self.closest_task_at);
        params
    }

    fn relations(&self) -> Vec<(&'static str, &Relation)> {
        vec![
            ("leads", &self.leads),
            ("contacts", &self.contacts),
            ("customers", &self.customers),
        ]
    }

    fn relations_mut(&mut self) -> Vec<&mut Relation> {
        vec![&mut self.leads, &mut self.contacts, &mut self.customers]
    }
}
