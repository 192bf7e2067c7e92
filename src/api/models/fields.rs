//! Fields shared by all amoCRM entities: the common allow-list, custom fields and tags

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value, json};

static PHONE_PATTERN: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\+?\d").expect("valid regex"));

/// amoCRM sends `null` for empty collections
pub(crate) fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Insert `value` under `key` when present
pub(crate) fn insert_opt<T: Serialize>(params: &mut Map<String, Value>, key: &str, value: &Option<T>) {
    if let Some(value) = value {
        if let Ok(value) = serde_json::to_value(value) {
            params.insert(key.to_string(), value);
        }
    }
}

/// Values of one custom field
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CustomFieldValues {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub field_id: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub field_code: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub field_name: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub values: Vec<Value>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tag {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<u64>,
    pub name: String,
}

/// Fields every entity carries
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CommonFields {
    #[serde(default)]
    pub id: Option<u64>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub responsible_user_id: Option<u64>,
    #[serde(default)]
    pub created_by: Option<u64>,
    #[serde(default)]
    pub updated_by: Option<u64>,
    #[serde(default)]
    pub created_at: Option<i64>,
    #[serde(default)]
    pub updated_at: Option<i64>,
    #[serde(default)]
    pub account_id: Option<u64>,
    #[serde(default)]
    pub group_id: Option<u64>,
    #[serde(default)]
    pub request_id: Option<u64>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub custom_fields_values: Vec<CustomFieldValues>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub tags: Vec<Tag>,
}

impl CommonFields {
    /// Write the allow-listed fields. `updated_at` is stamped by the write engine, not here.
    pub fn write_params(&self, params: &mut Map<String, Value>) {
        insert_opt(params, "id", &self.id);
        insert_opt(params, "name", &self.name);
        insert_opt(params, "responsible_user_id", &self.responsible_user_id);
        insert_opt(params, "created_by", &self.created_by);
        insert_opt(params, "created_at", &self.created_at);
        insert_opt(params, "updated_by", &self.updated_by);
        insert_opt(params, "account_id", &self.account_id);
        insert_opt(params, "group_id", &self.group_id);
        insert_opt(params, "request_id", &self.request_id);

        if !self.custom_fields_values.is_empty() {
            if let Ok(values) = serde_json::to_value(&self.custom_fields_values) {
                params.insert("custom_fields_values".to_string(), values);
            }
        }

        if !self.tags.is_empty() {
            let names: Vec<&str> = self.tags.iter().map(|tag| tag.name.as_str()).collect();
            params.insert("tags".to_string(), json!(names));
        }
    }

    /// Set a custom field. A list is stored as the field's values, anything else becomes
    /// `[{"value": ...}]`. An existing entry for the same field is replaced.
    pub fn set_custom_field(&mut self, field_id: u64, value: impl Into<Value>) -> &mut Self {
        let values = match value.into() {
            Value::Array(values) => values,
            other => vec![json!({ "value": other })],
        };

        match self
            .custom_fields_values
            .iter_mut()
            .find(|field| field.field_id == Some(field_id))
        {
            Some(field) => field.values = values,
            None => self.custom_fields_values.push(CustomFieldValues {
                field_id: Some(field_id),
                values,
                ..Default::default()
            }),
        }
        self
    }

    /// Set several custom fields at once
    pub fn set_custom_fields<I, V>(&mut self, fields: I) -> &mut Self
    where
        I: IntoIterator<Item = (u64, V)>,
        V: Into<Value>,
    {
        for (field_id, value) in fields {
            self.set_custom_field(field_id, value);
        }
        self
    }

    /// All values of a custom field, reading `key` out of object values
    pub fn custom_field_values(&self, field_id: u64, key: &str) -> Vec<&Value> {
        let Some(field) = self
            .custom_fields_values
            .iter()
            .find(|field| field.field_id == Some(field_id))
        else {
            return Vec::new();
        };

        field
            .values
            .iter()
            .filter_map(|item| match item {
                Value::Object(map) => map.get(key),
                other => Some(other),
            })
            .collect()
    }

    /// First `value` of a custom field
    pub fn custom_field_value(&self, field_id: u64) -> Option<&Value> {
        self.custom_field_values(field_id, "value").into_iter().next()
    }

    /// Add tags by name, skipping names already present
    pub fn add_tags<I, S>(&mut self, names: I) -> &mut Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        for name in names {
            let name = name.into();
            if !self.tags.iter().any(|tag| tag.name == name) {
                self.tags.push(Tag { id: None, name });
            }
        }
        self
    }

    pub fn remove_tags<I, S>(&mut self, names: I) -> &mut Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let names: Vec<S> = names.into_iter().collect();
        self.tags
            .retain(|tag| !names.iter().any(|name| name.as_ref() == tag.name));
        self
    }

    pub fn tag_names(&self) -> Vec<&str> {
        self.tags.iter().map(|tag| tag.name.as_str()).collect()
    }

    /// First phone number: a `PHONE` field first, else any value that looks like a number
    pub fn phone(&self) -> Option<&str> {
        self.find_contact_value("PHONE", |value| PHONE_PATTERN.is_match(value))
    }

    /// First email address: an `EMAIL` field first, else any value containing `@`
    pub fn email(&self) -> Option<&str> {
        self.find_contact_value("EMAIL", |value| value.contains('@'))
    }

    fn find_contact_value(&self, code: &str, looks_like: impl Fn(&str) -> bool) -> Option<&str> {
        for field in &self.custom_fields_values {
            if field.field_code.as_deref() == Some(code) {
                if let Some(value) = field
                    .values
                    .first()
                    .and_then(|v| v.get("value"))
                    .and_then(Value::as_str)
                {
                    return Some(value);
                }
            }

            let candidate = field
                .values
                .iter()
                .filter_map(|v| v.get("value").and_then(Value::as_str))
                .find(|value| looks_like(value));
            if candidate.is_some() {
                return candidate;
            }
        }
        None
    }
}
