use serde::{Deserialize, Serialize};

use crate::error::TypeError;
use crate::identity::PublicKey;
use crate::temporal::Timestamp;

/// Character that may never appear in an object id.
///
/// The hash preimage joins type, id and data with this separator, so an id
/// containing it could alias a different (type, id) pair.
pub const ID_SEPARATOR: char = '/';

/// The user-controlled content of an object: string keys to arbitrary JSON.
pub type Payload = serde_json::Map<String, serde_json::Value>;

/// Reject ids containing [`ID_SEPARATOR`].
pub fn validate_id(id: &str) -> Result<(), TypeError> {
    if id.contains(ID_SEPARATOR) {
        return Err(TypeError::InvalidId(id.to_string()));
    }
    Ok(())
}

/// A stored document.
///
/// Objects are partitioned by `typ`; `id` is unique within a type. The owner
/// is fixed when the object is created and every later update must be
/// signed by the same key.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Object {
    #[serde(rename = "type")]
    pub typ: String,
    pub id: String,
    pub data: Payload,
    pub owner: PublicKey,
    pub created_at: Timestamp,
    pub last_updated_at: Timestamp,
}

impl Object {
    /// A freshly created object; both timestamps are set to `now`.
    pub fn new(
        typ: impl Into<String>,
        id: impl Into<String>,
        data: Payload,
        owner: PublicKey,
        now: Timestamp,
    ) -> Self {
        Self {
            typ: typ.into(),
            id: id.into(),
            data,
            owner,
            created_at: now,
            last_updated_at: now,
        }
    }

    /// Replace the data and refresh `last_updated_at`. Ownership and
    /// `created_at` are untouched.
    pub fn update(&mut self, data: Payload, now: Timestamp) {
        self.data = data;
        self.last_updated_at = now;
    }
}

/// Outcome of a successful write.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PutResult {
    /// `true` when the write created the object, `false` for an update.
    pub created: bool,
    /// Fee charged for the write. Always zero; reserved for billing.
    pub fee_used: u64,
}

impl PutResult {
    pub fn created() -> Self {
        Self { created: true, fee_used: 0 }
    }

    pub fn updated() -> Self {
        Self { created: false, fee_used: 0 }
    }
}
