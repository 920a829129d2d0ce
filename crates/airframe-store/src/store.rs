use std::sync::Arc;

use airframe_crypto::Signature;
use airframe_types::{validate_id, Object, Payload, PutResult};

use crate::error::StoreResult;
use crate::memory::InMemoryBackend;
use crate::ownership;
use crate::query::Query;
use crate::traits::StorageBackend;

/// Entry point for transports: compiles queries, decodes signatures, and
/// delegates to one [`StorageBackend`].
///
/// Cloning is cheap; clones share the backend.
#[derive(Clone)]
pub struct ObjectStore {
    backend: Arc<dyn StorageBackend>,
}

impl ObjectStore {
    pub fn new(backend: impl StorageBackend + 'static) -> Self {
        Self::from_arc(Arc::new(backend))
    }

    pub fn from_arc(backend: Arc<dyn StorageBackend>) -> Self {
        Self { backend }
    }

    /// Store backed by a fresh [`InMemoryBackend`].
    pub fn in_memory() -> Self {
        Self::new(InMemoryBackend::new())
    }

    pub fn backend_name(&self) -> &'static str {
        self.backend.name()
    }

    pub fn get(&self, typ: &str, id: &str) -> StoreResult<Object> {
        tracing::debug!(typ, id, backend = self.backend.name(), "get");
        self.backend.get(typ, id)
    }

    pub fn exists(&self, typ: &str, id: &str) -> StoreResult<bool> {
        tracing::debug!(typ, id, backend = self.backend.name(), "exists");
        self.backend.exists(typ, id)
    }

    /// Compile `raw` (a JSON query document; blank means match-all) and run it.
    pub fn query(&self, typ: &str, raw: &str, skip: usize, limit: usize) -> StoreResult<Vec<Object>> {
        let query = Query::from_json(raw)?;
        self.query_compiled(typ, &query, skip, limit)
    }

    pub fn query_compiled(
        &self,
        typ: &str,
        query: &Query,
        skip: usize,
        limit: usize,
    ) -> StoreResult<Vec<Object>> {
        tracing::debug!(
            typ,
            clauses = query.clauses().len(),
            skip,
            limit,
            backend = self.backend.name(),
            "query"
        );
        self.backend.query(typ, query, skip, limit)
    }

    /// Create or update `(typ, id)`. `signature` is the raw 65-byte
    /// `[R || S || V]` signature over the hash of the new content. An invalid
    /// id is reported before the signature is decoded.
    pub fn put(&self, typ: &str, id: &str, data: Payload, signature: &[u8]) -> StoreResult<PutResult> {
        validate_id(id)?;
        let signature = Signature::from_slice(signature)?;
        self.put_signed(typ, id, data, &signature)
    }

    pub fn put_signed(
        &self,
        typ: &str,
        id: &str,
        data: Payload,
        signature: &Signature,
    ) -> StoreResult<PutResult> {
        validate_id(id)?;
        tracing::debug!(typ, id, backend = self.backend.name(), "put");
        let result = self.backend.put(typ, id, data, signature)?;
        if result.created {
            tracing::info!(typ, id, "object created");
        }
        Ok(result)
    }

    /// Whether `signature` over the stored content of `(typ, id)` recovers
    /// to its owner.
    pub fn is_owner(&self, typ: &str, id: &str, signature: &[u8]) -> StoreResult<bool> {
        let signature = Signature::from_slice(signature)?;
        let object = self.backend.get(typ, id)?;
        Ok(ownership::is_owner(&object, &signature))
    }
}

impl std::fmt::Debug for ObjectStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ObjectStore")
            .field("backend", &self.backend.name())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::{DocumentBackend, MemoryDocumentClient};
    use crate::error::StoreError;
    use airframe_crypto::SigningKey;
    use serde_json::{json, Value};

    fn payload(value: Value) -> Payload {
        value.as_object().cloned().unwrap()
    }

    fn stores() -> Vec<ObjectStore> {
        vec![
            ObjectStore::in_memory(),
            ObjectStore::new(DocumentBackend::new(MemoryDocumentClient::new())),
        ]
    }

    fn signed_put(
        store: &ObjectStore,
        key: &SigningKey,
        typ: &str,
        id: &str,
        data: Value,
    ) -> StoreResult<PutResult> {
        let data = payload(data);
        let sig = key.sign_object(typ, id, &data).unwrap();
        store.put(typ, id, data, sig.as_bytes())
    }

    #[test]
    fn idempotent_create() {
        for store in stores() {
            let key = SigningKey::generate();
            assert!(signed_put(&store, &key, "t", "1", json!({"v": 1})).unwrap().created);
            let second = signed_put(&store, &key, "t", "1", json!({"v": 2})).unwrap();
            assert!(!second.created);
            assert_eq!(second.fee_used, 0);
            assert_eq!(store.get("t", "1").unwrap().data, payload(json!({"v": 2})));
        }
    }

    #[test]
    fn ownership_enforcement() {
        for store in stores() {
            let k1 = SigningKey::generate();
            let k2 = SigningKey::generate();
            signed_put(&store, &k1, "t", "o", json!({"v": 1})).unwrap();
            let err = signed_put(&store, &k2, "t", "o", json!({"v": 2})).unwrap_err();
            assert!(matches!(err, StoreError::NotAuthorized { .. }), "{}", store.backend_name());
            let stored = store.get("t", "o").unwrap();
            assert_eq!(stored.data, payload(json!({"v": 1})));
            assert_eq!(stored.owner, k1.public_key());
        }
    }

    #[test]
    fn signature_binding() {
        let store = ObjectStore::in_memory();
        let key = SigningKey::generate();
        let sig = key.sign_object("a", "1", &payload(json!({"x": 1}))).unwrap();
        store.put("a", "1", payload(json!({"x": 1})), sig.as_bytes()).unwrap();

        assert!(store.is_owner("a", "1", sig.as_bytes()).unwrap());
        // A replay against other data recovers some other key.
        let err = store.put("a", "1", payload(json!({"x": 2})), sig.as_bytes());
        assert!(matches!(
            err,
            Err(StoreError::NotAuthorized { .. }) | Err(StoreError::InvalidSignature(_))
        ));
        assert_eq!(store.get("a", "1").unwrap().data, payload(json!({"x": 1})));
    }

    #[test]
    fn id_rejection_ignores_signature() {
        for store in stores() {
            let err = signed_put(&store, &SigningKey::generate(), "t", "a/b", json!({})).unwrap_err();
            assert!(matches!(err, StoreError::InvalidId(_)));
            let err = store.put("t", "a/b", Payload::new(), &[0u8; 65]).unwrap_err();
            assert!(matches!(err, StoreError::InvalidId(_)));
        }
    }

    #[test]
    fn id_rejection_precedes_signature_decoding() {
        for store in stores() {
            let err = store.put("t", "a/b", Payload::new(), &[0u8; 10]).unwrap_err();
            assert!(
                matches!(err, StoreError::InvalidId(ref id) if id == "a/b"),
                "{}: {err:?}",
                store.backend_name()
            );
            assert!(!store.exists("t", "a/b").unwrap());
        }
    }

    #[test]
    fn wrong_length_signature_is_invalid() {
        let store = ObjectStore::in_memory();
        let err = store.put("t", "1", Payload::new(), &[1u8; 64]).unwrap_err();
        assert!(matches!(err, StoreError::InvalidSignature(_)));
        let err = store.is_owner("t", "1", &[1u8; 66]).unwrap_err();
        assert!(matches!(err, StoreError::InvalidSignature(_)));
    }

    #[test]
    fn contains_with_pagination() {
        for store in stores() {
            let key = SigningKey::generate();
            signed_put(&store, &key, "testdata", "1", json!({"foo": "bar"})).unwrap();
            signed_put(&store, &key, "testdata", "2", json!({"foo": "baz"})).unwrap();

            let raw = r#"{"foo": {"contains": "b"}}"#;
            assert_eq!(store.query("testdata", raw, 0, 1).unwrap().len(), 1);
            let rest = store.query("testdata", raw, 1, 0).unwrap();
            assert_eq!(rest.len(), 1);
            assert_eq!(rest[0].id, "2");
            assert_eq!(store.query("testdata", raw, 0, 0).unwrap().len(), 2);
            assert_eq!(store.query("testdata", "", 0, 0).unwrap().len(), 2);
        }
    }

    #[test]
    fn unknown_operator_is_reported() {
        let err = ObjectStore::in_memory()
            .query("t", r#"{"a": {"like": "x"}}"#, 0, 0)
            .unwrap_err();
        assert!(matches!(err, StoreError::UnknownOperator(op) if op == "like"));
    }

    #[test]
    fn get_missing_and_exists() {
        for store in stores() {
            assert!(matches!(store.get("t", "nope"), Err(StoreError::NotFound { .. })));
            assert!(!store.exists("t", "nope").unwrap());
        }
    }

    #[test]
    fn clones_share_the_backend() {
        let store = ObjectStore::in_memory();
        let clone = store.clone();
        signed_put(&store, &SigningKey::generate(), "t", "1", json!({})).unwrap();
        assert!(clone.exists("t", "1").unwrap());
        assert_eq!(format!("{clone:?}"), r#"ObjectStore { backend: "memory" }"#);
    }
}
