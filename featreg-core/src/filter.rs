//! Tag filtering for list operations

use std::collections::BTreeMap;

/// Key/value labels attached to registry objects.
pub type Tags = BTreeMap<String, String>;

/// Check whether `object_tags` carries every requested tag.
///
/// An absent or empty request matches everything. A requested tag matches
/// only when the object has the same key with the same value.
pub fn has_all_tags(object_tags: &Tags, requested: Option<&Tags>) -> bool {
    let Some(requested) = requested else {
        return true;
    };
    requested
        .iter()
        .all(|(key, value)| object_tags.get(key) == Some(value))
}
