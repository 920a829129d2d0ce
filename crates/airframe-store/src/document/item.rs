use std::borrow::Cow;

use airframe_types::{Object, Payload, PublicKey, Timestamp};
use serde_json::Value;

use crate::error::{StoreError, StoreResult};

/// A flattened stored record: attribute name to JSON value.
pub type Item = serde_json::Map<String, Value>;

pub const ATTR_ID: &str = "id";
pub const ATTR_DATA: &str = "data";
pub const ATTR_OWNER: &str = "owner";
pub const ATTR_CREATED_AT: &str = "createdAt";
pub const ATTR_LAST_UPDATED_AT: &str = "lastUpdatedAt";
/// Write counter used as the optimistic concurrency token.
pub const ATTR_VERSION: &str = "version";

/// Top-level attribute names owned by the adapter.
pub const RESERVED_ATTRIBUTES: [&str; 6] = [
    ATTR_ID,
    ATTR_DATA,
    ATTR_OWNER,
    ATTR_CREATED_AT,
    ATTR_LAST_UPDATED_AT,
    ATTR_VERSION,
];

/// Prefix marking an escaped user key.
pub const ESCAPE: char = '~';

fn is_reserved(key: &str) -> bool {
    RESERVED_ATTRIBUTES.contains(&key)
}

/// Stored attribute name for a user data key.
///
/// Reserved names and names already starting with [`ESCAPE`] get one more
/// `~`, so the mapping is reversible and never lands on a reserved name.
pub fn escape_key(key: &str) -> Cow<'_, str> {
    if is_reserved(key) || key.starts_with(ESCAPE) {
        Cow::Owned(format!("{ESCAPE}{key}"))
    } else {
        Cow::Borrowed(key)
    }
}

/// Inverse of [`escape_key`] for a non-reserved attribute.
pub fn unescape_key(attribute: &str) -> &str {
    attribute.strip_prefix(ESCAPE).unwrap_or(attribute)
}

/// Spread `data` into top-level attributes next to the reserved ones and
/// stamp the write `version`. The type is not stored; it is carried by the
/// table name.
pub fn flatten(object: &Object, version: u64) -> Item {
    let mut item = Item::new();
    for (key, value) in &object.data {
        item.insert(escape_key(key).into_owned(), value.clone());
    }
    item.insert(ATTR_ID.into(), Value::String(object.id.clone()));
    item.insert(ATTR_OWNER.into(), Value::String(object.owner.to_hex()));
    item.insert(ATTR_CREATED_AT.into(), Value::from(object.created_at.as_nanos()));
    item.insert(
        ATTR_LAST_UPDATED_AT.into(),
        Value::from(object.last_updated_at.as_nanos()),
    );
    item.insert(ATTR_VERSION.into(), Value::from(version));
    item
}

/// The write version stamped on a stored item.
pub fn version_of(item: &Item) -> StoreResult<u64> {
    match item.get(ATTR_VERSION) {
        Some(Value::Number(n)) => n
            .as_u64()
            .ok_or_else(|| corrupt(ATTR_VERSION, Some(Value::Number(n.clone())))),
        other => Err(corrupt(ATTR_VERSION, other.cloned())),
    }
}

/// Rebuild an object from a stored item.
pub fn unflatten(typ: &str, mut item: Item) -> StoreResult<Object> {
    let id = take_str(&mut item, ATTR_ID)?;
    let owner = PublicKey::from_hex(&take_str(&mut item, ATTR_OWNER)?)?;
    let created_at = take_timestamp(&mut item, ATTR_CREATED_AT)?;
    let last_updated_at = take_timestamp(&mut item, ATTR_LAST_UPDATED_AT)?;
    item.remove(ATTR_DATA);
    item.remove(ATTR_VERSION);

    let data: Payload = item
        .into_iter()
        .map(|(attr, value)| (unescape_key(&attr).to_string(), value))
        .collect();

    Ok(Object {
        typ: typ.to_string(),
        id,
        data,
        owner,
        created_at,
        last_updated_at,
    })
}

fn take_str(item: &mut Item, attr: &str) -> StoreResult<String> {
    match item.remove(attr) {
        Some(Value::String(s)) => Ok(s),
        other => Err(corrupt(attr, other)),
    }
}

fn take_timestamp(item: &mut Item, attr: &str) -> StoreResult<Timestamp> {
    match item.remove(attr) {
        Some(Value::Number(n)) => match n.as_i64() {
            Some(nanos) => Ok(Timestamp::from_nanos(nanos)),
            None => Err(corrupt(attr, Some(Value::Number(n)))),
        },
        other => Err(corrupt(attr, other)),
    }
}

fn corrupt(attr: &str, found: Option<Value>) -> StoreError {
    StoreError::Serialization(format!("stored item has invalid {attr:?}: {found:?}"))
}
