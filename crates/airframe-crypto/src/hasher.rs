use std::fmt;

use airframe_types::{Payload, ID_SEPARATOR};
use serde_json::Value;
use sha3::{Digest, Sha3_256};

/// 32-byte SHA3-256 digest of an object's canonical preimage.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct ObjectHash([u8; 32]);

impl ObjectHash {
    pub const fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

impl fmt::Debug for ObjectHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ObjectHash({}...)", hex::encode(&self.0[..4]))
    }
}

impl fmt::Display for ObjectHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", self.to_hex())
    }
}

/// Computes the hash every signature in Airframe is made over.
///
/// The preimage is `"{type}/{id}/{canonical_json(data)}"`. Signers and
/// verifiers must produce it byte for byte identically.
pub struct ObjectHasher;

impl ObjectHasher {
    /// The exact bytes that get hashed.
    pub fn preimage(typ: &str, id: &str, data: &Payload) -> Vec<u8> {
        let mut out = Vec::with_capacity(typ.len() + id.len() + 64);
        out.extend_from_slice(typ.as_bytes());
        push_separator(&mut out);
        out.extend_from_slice(id.as_bytes());
        push_separator(&mut out);
        out.extend_from_slice(Value::Object(sorted_map(data)).to_string().as_bytes());
        out
    }

    /// Hash `(type, id, data)`.
    pub fn hash(typ: &str, id: &str, data: &Payload) -> ObjectHash {
        let digest = Sha3_256::digest(Self::preimage(typ, id, data));
        ObjectHash(digest.into())
    }

    /// Check that `(type, id, data)` hashes to `expected`.
    pub fn verify(typ: &str, id: &str, data: &Payload, expected: &ObjectHash) -> bool {
        Self::hash(typ, id, data) == *expected
    }
}

fn push_separator(out: &mut Vec<u8>) {
    let mut buf = [0u8; 4];
    out.extend_from_slice(ID_SEPARATOR.encode_utf8(&mut buf).as_bytes());
}

/// Serialize a JSON value with object keys sorted at every level and no
/// insignificant whitespace.
///
/// The output does not depend on map insertion order or on which
/// `serde_json` map backend is compiled in.
pub fn canonical_json(value: &Value) -> Vec<u8> {
    sorted(value).to_string().into_bytes()
}

fn sorted(value: &Value) -> Value {
    match value {
        Value::Object(map) => Value::Object(sorted_map(map)),
        Value::Array(items) => Value::Array(items.iter().map(sorted).collect()),
        other => other.clone(),
    }
}

/// Rebuild `map` with keys inserted in order, so an insertion-ordered map
/// backend serializes them sorted as well.
fn sorted_map(map: &Payload) -> Payload {
    let mut entries: Vec<(&String, &Value)> = map.iter().collect();
    entries.sort_unstable_by(|a, b| a.0.cmp(b.0));
    entries
        .into_iter()
        .map(|(key, value)| (key.clone(), sorted(value)))
        .collect()
}
