//! Response envelope normalization
//!
//! amoCRM answers in several shapes: HAL envelopes with the records under
//! `_embedded.<resource>`, bare records carrying only `_links`, and plain objects or lists
//! without any envelope. [`extract_items`] reduces all of them to the value holding the records.

use super::constants::envelope;
use serde_json::Value;

/// Extract the records held by a decoded response.
///
/// Returns `None` for an absent, `null` or scalar response. Never fails: an unrecognized shape
/// comes back unchanged, so callers that need data must check the result themselves.
///
/// When `_embedded` holds several known containers the first one in
/// [`envelope::CONTAINER_KEYS`] order wins. Mixed responses are not expected from the API and
/// are not disambiguated further.
pub fn extract_items(response: Option<&Value>) -> Option<&Value> {
    let response = response?;
    let map = match response {
        Value::Object(map) => map,
        Value::Array(_) => return Some(response),
        _ => return None,
    };

    let embedded = map.get(envelope::EMBEDDED);
    if map.get(envelope::LINKS).is_none() && embedded.is_none() {
        return Some(response);
    }

    if let Some(embedded) = embedded {
        if let Some(items) = envelope::CONTAINER_KEYS
            .iter()
            .find_map(|key| embedded.get(*key))
        {
            return Some(items);
        }
        return Some(response);
    }

    // Some endpoints answer with the bare record plus `_links`
    let href = map
        .get(envelope::LINKS)
        .and_then(|links| links.get(envelope::SELF))
        .and_then(|link| link.get(envelope::HREF))
        .and_then(Value::as_str);
    if let Some(href) = href {
        if envelope::BARE_RECORD_RESOURCES
            .iter()
            .any(|resource| href.contains(resource))
        {
            return Some(response);
        }
    }

    Some(response)
}

/// Whether a normalized value carries no records
pub fn is_empty(items: Option<&Value>) -> bool {
    match items {
        None | Some(Value::Null) => true,
        Some(Value::Array(list)) => list.is_empty(),
        Some(Value::Object(map)) => map.is_empty(),
        Some(_) => false,
    }
}

/// Flatten a normalized value into record maps: a list yields its elements, a map yields itself
pub fn records(items: Option<&Value>) -> Vec<Value> {
    match items {
        Some(Value::Array(list)) => list.clone(),
        Some(Value::Object(map)) if !map.is_empty() => vec![Value::Object(map.clone())],
        _ => Vec::new(),
    }
}

/// `extract_items` followed by `records`
pub fn normalize(response: Option<&Value>) -> Vec<Value> {
    records(extract_items(response))
}

/// First record of a normalized value
pub fn first_record(items: Option<&Value>) -> Option<&Value> {
    match items? {
        Value::Array(list) => list.first(),
        value @ Value::Object(_) => Some(value),
        _ => None,
    }
}
