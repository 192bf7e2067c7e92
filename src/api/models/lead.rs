use super::entity::Entity;
use super::fields::{CommonFields, insert_opt};
use super::relation::{Relation, embedded_ids};
use crate::api::constants::Resource;
use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};

/// A deal
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(remote = "Self")]
pub struct Lead {
    #[serde(flatten)]
    pub common: CommonFields,
    #[serde(default)]
    pub price: Option<i64>,
    #[serde(default)]
    pub status_id: Option<u64>,
    #[serde(default)]
    pub pipeline_id: Option<u64>,
    #[serde(default)]
    pub loss_reason_id: Option<u64>,
    #[serde(default)]
    pub closed_at: Option<i64>,
    #[serde(default)]
    pub company_id: Option<u64>,
    #[serde(skip)]
    pub contacts: Relation,
}

impl Lead {
    pub fn new(name: impl Into<String>) -> Self {
        let mut lead = Self::default();
        lead.common.name = Some(name.into());
        lead
    }

    pub fn with_id(id: u64) -> Self {
        let mut lead = Self::default();
        lead.common.id = Some(id);
        lead
    }

    pub fn add_contacts<I: IntoIterator<Item = u64>>(&mut self, ids: I) -> &mut Self {
        self.contacts.link(ids);
        self
    }

    pub fn remove_contacts<I: IntoIterator<Item = u64>>(&mut self, ids: I) -> &mut Self {
        self.contacts.unlink(ids);
        self
    }

    pub fn set_company(&mut self, company_id: u64) -> &mut Self {
        self.company_id = Some(company_id);
        self
    }
}

impl Serialize for Lead {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        Lead::serialize(self, serializer)
    }
}

/// Relations start from the ids the server lists under `_embedded` (`contacts`)
impl<'de> Deserialize<'de> for Lead {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let record = Value::deserialize(deserializer)?;
        let mut lead = Lead::deserialize(&record).map_err(D::Error::custom)?;
        lead.contacts = Relation::from_linked(embedded_ids(&record, "contacts"));
        Ok(lead)
    }
}

impl Entity for Lead {
    fn resource(&self) -> Resource {
        Resource::Leads
    }

    fn id(&self) -> Option<u64> {
        self.common.id
    }

    fn fields(&self) -> Map<String, Value> {
        let mut params = Map::new();
        self.common.write_params(&mut params);
        insert_opt(&mut params, "price", &self.price);
        insert_opt(&mut params, "status_id", &self.status_id);
        insert_opt(&mut params, "pipeline_id", &self.pipeline_id);
        insert_opt(&mut params, "loss_reason_id", &self.loss_reason_id);
        insert_opt(&mut params, "closed_at", &self.closed_at);
        insert_opt(&mut params, "company_id", &self.company_id);
        params
    }

    fn relations(&self) -> Vec<(&'static str, &Relation)> {
        vec![("contacts", &self.contacts)]
    }

    fn relations_mut(&mut self) -> Vec<&mut Relation> {
        vec![&mut self.contacts]
    }
}
