//! Grouping and chunking of pending writes

use crate::api::transport::Method;

/// One wire request target
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct BatchKey {
    pub path: String,
    pub method: Method,
}

impl BatchKey {
    pub fn new(path: impl Into<String>, method: Method) -> Self {
        Self {
            path: path.into(),
            method,
        }
    }
}

/// Items sharing a path and verb, in submission order
#[derive(Debug, Clone, PartialEq)]
pub struct BatchGroup<T> {
    pub key: BatchKey,
    pub items: Vec<T>,
}

impl<T> BatchGroup<T> {
    /// Ordered slices of at most `limit` items (a zero limit counts as one)
    pub fn chunks(&self, limit: usize) -> std::slice::Chunks<'_, T> {
        self.items.chunks(limit.max(1))
    }

    pub fn chunk_count(&self, limit: usize) -> usize {
        self.items.len().div_ceil(limit.max(1))
    }
}

/// Group items by key; groups keep the order their key was first seen
pub fn group_by_key<T, I>(items: I) -> Vec<BatchGroup<T>>
where
    I: IntoIterator<Item = (BatchKey, T)>,
{
    let mut groups: Vec<BatchGroup<T>> = Vec::new();
    for (key, item) in items {
        match groups.iter_mut().find(|group| group.key == key) {
            Some(group) => group.items.push(item),
            None => groups.push(BatchGroup {
                key,
                items: vec![item],
            }),
        }
    }
    groups
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_groups_keep_first_seen_order() {
        let leads = BatchKey::new("/api/v4/leads", Method::Post);
        let contacts = BatchKey::new("/api/v4/contacts", Method::Post);

        let groups = group_by_key(vec![
            (leads.clone(), 1),
            (contacts.clone(), 2),
            (leads.clone(), 3),
        ]);

        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].key, leads);
        assert_eq!(groups[0].items, vec![1, 3]);
        assert_eq!(groups[1].items, vec![2]);
    }

    #[test]
    fn test_same_path_different_verb_is_a_different_group() {
        let groups = group_by_key(vec![
            (BatchKey::new("/api/v4/leads", Method::Post), 1),
            (BatchKey::new("/api/v4/leads", Method::Patch), 2),
        ]);
        assert_eq!(groups.len(), 2);
    }

    #[test]
    fn test_chunks_are_bounded_and_ordered() {
        let group = BatchGroup {
            key: BatchKey::new("/api/v4/leads", Method::Post),
            items: (0..300).collect::<Vec<_>>(),
        };

        let chunks: Vec<&[i32]> = group.chunks(250).collect();
        assert_eq!(group.chunk_count(250), 2);
        assert_eq!(chunks[0].len(), 250);
        assert_eq!(chunks[1].len(), 50);
        assert_eq!(chunks.concat(), group.items);
        assert_eq!(group.chunk_count(300), 1);
        assert_eq!(group.chunk_count(299), 2);
    }
}
