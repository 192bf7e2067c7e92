//! Typed amoCRM entity models

pub mod catalog_element;
pub mod company;
pub mod contact;
pub mod custom_field;
pub mod entity;
pub mod fields;
pub mod incoming_lead;
pub mod lead;
pub mod note;
pub mod relation;
pub mod task;

pub use catalog_element::CatalogElement;
pub use company::Company;
pub use contact::Contact;
pub use custom_field::CustomField;
pub use entity::{Entity, RawEntity};
pub use fields::{CommonFields, CustomFieldValues, Tag};
pub use incoming_lead::IncomingLead;
pub use lead::Lead;
pub use note::Note;
pub use relation::{Relation, RelationDiff};
pub use task::Task;
