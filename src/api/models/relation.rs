//! Link/unlink tracking for relation fields

use crate::api::constants::envelope;
use serde_json::{Map, Value};

/// Ids linked to an entity plus the unlinks still owed to the server.
///
/// An id is never both linked and pending unlink: linking cancels a pending unlink, unlinking
/// removes the id from the linked set.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Relation {
    linked: Vec<u64>,
    pending_unlink: Vec<u64>,
}

/// Wire instructions produced by a relation at save time
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RelationDiff {
    pub link: Vec<u64>,
    pub unlink: Vec<u64>,
}

impl Relation {
    pub fn new() -> Self {
        Self::default()
    }

    /// Relation whose ids are already linked on the server
    pub fn from_linked<I: IntoIterator<Item = u64>>(ids: I) -> Self {
        let mut relation = Self::new();
        for id in ids {
            if !relation.linked.contains(&id) {
                relation.linked.push(id);
            }
        }
        relation
    }

    pub fn link<I: IntoIterator<Item = u64>>(&mut self, ids: I) -> &mut Self {
        for id in ids {
            self.pending_unlink.retain(|pending| *pending != id);
            if !self.linked.contains(&id) {
                self.linked.push(id);
            }
        }
        self
    }

    /// Unlink ids; ids not linked locally are still sent, the server may know them
    pub fn unlink<I: IntoIterator<Item = u64>>(&mut self, ids: I) -> &mut Self {
        for id in ids {
            self.linked.retain(|linked| *linked != id);
            if !self.pending_unlink.contains(&id) {
                self.pending_unlink.push(id);
            }
        }
        self
    }

    pub fn linked(&self) -> &[u64] {
        &self.linked
    }

    pub fn pending_unlink(&self) -> &[u64] {
        &self.pending_unlink
    }

    pub fn is_linked(&self, id: u64) -> bool {
        self.linked.contains(&id)
    }

    pub fn is_empty(&self) -> bool {
        self.linked.is_empty() && self.pending_unlink.is_empty()
    }

    /// Current instructions; does not change the tracker
    pub fn serialize(&self) -> RelationDiff {
        RelationDiff {
            link: self.linked.clone(),
            unlink: self.pending_unlink.clone(),
        }
    }

    /// Forget unlinks the server has accepted. `linked` stays as the new baseline.
    pub fn commit(&mut self, sent: &RelationDiff) {
        self.pending_unlink.retain(|id| !sent.unlink.contains(id));
    }
}

impl RelationDiff {
    pub fn is_empty(&self) -> bool {
        self.link.is_empty() && self.unlink.is_empty()
    }
}

/// Ids listed under `_embedded.<name>` of a record as the server returns it
pub fn embedded_ids(record: &Value, name: &str) -> Vec<u64> {
    record
        .get(envelope::EMBEDDED)
        .and_then(|embedded| embedded.get(name))
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .filter_map(|item| item.get("id").and_then(Value::as_u64))
                .collect()
        })
        .unwrap_or_default()
}

/// Fold a relation into outgoing params as `<name>_id` plus an entry of the shared `unlink`
/// object
pub fn write_relation(params: &mut Map<String, Value>, name: &str, diff: &RelationDiff) {
    let field = format!("{}_id", name);
    if !diff.link.is_empty() {
        params.insert(field.clone(), Value::from(diff.link.clone()));
    }
    if !diff.unlink.is_empty() {
        let unlink = params
            .entry("unlink")
            .or_insert_with(|| Value::Object(Map::new()));
        if let Value::Object(unlink) = unlink {
            unlink.insert(field, Value::from(diff.unlink.clone()));
        }
    }
}
