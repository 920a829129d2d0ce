use airframe_crypto::Signature;
use airframe_types::{validate_id, Object, Payload, PutResult, Timestamp};
use serde_json::Value;

use crate::document::client::{DocumentClient, PutItemOutcome, WriteCondition};
use crate::document::filter::FilterExpression;
use crate::document::item::{flatten, unflatten, version_of, ATTR_VERSION};
use crate::error::{StoreError, StoreResult};
use crate::ownership;
use crate::query::Query;
use crate::traits::{paginate, StorageBackend};

/// Default prefix for per-type tables.
pub const DEFAULT_TABLE_PREFIX: &str = "airframe_";

/// [`StorageBackend`] over an external document store.
///
/// Each type lives in its own table, `{prefix}{type}`. The adapter only
/// translates: queries become scan filters, objects become flat items.
/// Writes are made atomic with the store's conditional puts. Every item
/// carries a `version` counter: a create requires the key to be absent and
/// writes version 1, an update requires the version that was read and writes
/// the next one. Losing that race yields [`StoreError::Conflict`].
pub struct DocumentBackend<C> {
    client: C,
    table_prefix: String,
}

impl<C: DocumentClient> DocumentBackend<C> {
    pub fn new(client: C) -> Self {
        Self::with_prefix(client, DEFAULT_TABLE_PREFIX)
    }

    pub fn with_prefix(client: C, table_prefix: impl Into<String>) -> Self {
        Self {
            client,
            table_prefix: table_prefix.into(),
        }
    }

    pub fn client(&self) -> &C {
        &self.client
    }

    /// Table holding objects of `typ`.
    pub fn table(&self, typ: &str) -> String {
        format!("{}{}", self.table_prefix, typ)
    }

    fn load(&self, typ: &str, id: &str) -> StoreResult<Option<Object>> {
        self.client
            .get_item(&self.table(typ), id)?
            .map(|item| unflatten(typ, item))
            .transpose()
    }

    /// Read an object together with the version it was stored at.
    fn load_versioned(&self, typ: &str, id: &str) -> StoreResult<Option<(Object, u64)>> {
        let Some(item) = self.client.get_item(&self.table(typ), id)? else {
            return Ok(None);
        };
        let version = version_of(&item)?;
        Ok(Some((unflatten(typ, item)?, version)))
    }
}

impl<C: DocumentClient> StorageBackend for DocumentBackend<C> {
    fn name(&self) -> &'static str {
        "document"
    }

    fn get(&self, typ: &str, id: &str) -> StoreResult<Object> {
        self.load(typ, id)?
            .ok_or_else(|| StoreError::not_found(typ, id))
    }

    fn exists(&self, typ: &str, id: &str) -> StoreResult<bool> {
        Ok(self.client.get_item(&self.table(typ), id)?.is_some())
    }

    fn query(
        &self,
        typ: &str,
        query: &Query,
        skip: usize,
        limit: usize,
    ) -> StoreResult<Vec<Object>> {
        let filter = FilterExpression::from_query(query);
        tracing::trace!(
            table = %self.table(typ),
            expression = ?filter.render().expression,
            "scanning"
        );
        let objects = self
            .client
            .scan(&self.table(typ), &filter)?
            .into_iter()
            .map(|item| unflatten(typ, item))
            .collect::<StoreResult<Vec<_>>>()?;
        Ok(paginate(objects, skip, limit))
    }

    fn put(
        &self,
        typ: &str,
        id: &str,
        data: Payload,
        signature: &Signature,
    ) -> StoreResult<PutResult> {
        validate_id(id)?;
        let signer = ownership::recover_signer(typ, id, &data, signature)?;

        let (object, version, condition, result) = match self.load_versioned(typ, id)? {
            None => (
                Object::new(typ, id, data, signer, Timestamp::now()),
                1,
                WriteCondition::NotExists,
                PutResult::created(),
            ),
            Some((mut existing, read_version)) => {
                ownership::ensure_owner(&existing, &signer)?;
                let condition = WriteCondition::AttributeEquals {
                    attribute: ATTR_VERSION.to_string(),
                    value: Value::from(read_version),
                };
                existing.update(data, Timestamp::now());
                (existing, read_version + 1, condition, PutResult::updated())
            }
        };

        let item = flatten(&object, version);
        match self.client.put_item(&self.table(typ), item, &condition)? {
            PutItemOutcome::Written => Ok(result),
            PutItemOutcome::ConditionFailed => Err(StoreError::Conflict {
                typ: typ.to_string(),
                id: id.to_string(),
            }),
        }
    }
}

impl<C> std::fmt::Debug for DocumentBackend<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DocumentBackend")
            .field("table_prefix", &self.table_prefix)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::client::MemoryDocumentClient;
    use crate::document::item::{Item, ATTR_LAST_UPDATED_AT};
    use airframe_crypto::SigningKey;
    use serde_json::json;

    fn payload(value: Value) -> Payload {
        value.as_object().cloned().unwrap()
    }

    fn backend() -> DocumentBackend<MemoryDocumentClient> {
        DocumentBackend::new(MemoryDocumentClient::new())
    }

    fn put<C: DocumentClient>(
        backend: &DocumentBackend<C>,
        key: &SigningKey,
        typ: &str,
        id: &str,
        data: Value,
    ) -> StoreResult<PutResult> {
        let data = payload(data);
        let sig = key.sign_object(typ, id, &data).unwrap();
        backend.put(typ, id, data, &sig)
    }

    #[test]
    fn create_update_and_get() {
        let backend = backend();
        let key = SigningKey::generate();
        assert!(put(&backend, &key, "user", "1", json!({"name": "Ann"})).unwrap().created);
        assert!(!put(&backend, &key, "user", "1", json!({"name": "Bo"})).unwrap().created);

        let obj = backend.get("user", "1").unwrap();
        assert_eq!(obj.typ, "user");
        assert_eq!(obj.data, payload(json!({"name": "Bo"})));
        assert_eq!(obj.owner, key.public_key());
        assert!(backend.exists("user", "1").unwrap());
        assert!(!backend.exists("user", "2").unwrap());
    }

    #[test]
    fn tables_are_prefixed_per_type() {
        let backend = DocumentBackend::with_prefix(MemoryDocumentClient::new(), "test_");
        put(&backend, &SigningKey::generate(), "user", "1", json!({})).unwrap();
        assert_eq!(backend.client().tables().unwrap(), vec!["test_user".to_string()]);
    }

    #[test]
    fn non_owner_update_is_rejected() {
        let backend = backend();
        put(&backend, &SigningKey::generate(), "t", "1", json!({"v": 1})).unwrap();
        let err = put(&backend, &SigningKey::generate(), "t", "1", json!({"v": 2})).unwrap_err();
        assert!(matches!(err, StoreError::NotAuthorized { .. }));
        assert_eq!(backend.get("t", "1").unwrap().data, payload(json!({"v": 1})));
    }

    #[test]
    fn id_with_separator_is_rejected() {
        let err = put(&backend(), &SigningKey::generate(), "t", "a/b", json!({})).unwrap_err();
        assert!(matches!(err, StoreError::InvalidId(_)));
    }

    #[test]
    fn reserved_data_keys_survive_a_roundtrip() {
        let backend = backend();
        let data = json!({"id": "user-id", "owner": "user-owner", "createdAt": 1});
        put(&backend, &SigningKey::generate(), "t", "1", data.clone()).unwrap();
        let obj = backend.get("t", "1").unwrap();
        assert_eq!(obj.id, "1");
        assert_eq!(obj.data, payload(data));
    }

    #[test]
    fn query_translates_and_paginates() {
        let backend = backend();
        let key = SigningKey::generate();
        put(&backend, &key, "testdata", "1", json!({"foo": "bar"})).unwrap();
        put(&backend, &key, "testdata", "2", json!({"foo": "baz"})).unwrap();
        put(&backend, &key, "testdata", "3", json!({"foo": "qux", "id": "x"})).unwrap();

        let q = Query::from_json(r#"{"foo": {"contains": "b"}}"#).unwrap();
        assert_eq!(backend.query("testdata", &q, 0, 0).unwrap().len(), 2);
        assert_eq!(backend.query("testdata", &q, 0, 1).unwrap().len(), 1);
        let rest = backend.query("testdata", &q, 1, 0).unwrap();
        assert_eq!(rest.len(), 1);
        assert_eq!(rest[0].id, "2");

        let by_reserved = Query::from_json(r#"{"id": "x"}"#).unwrap();
        let found = backend.query("testdata", &by_reserved, 0, 0).unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].id, "3");
    }

    /// Client where another writer updates the item between our read and
    /// our write. The interleaved write keeps `lastUpdatedAt` unchanged, as a
    /// clock step back or two writes in the same nanosecond would.
    struct RacingClient {
        inner: MemoryDocumentClient,
    }

    impl DocumentClient for RacingClient {
        fn get_item(&self, table: &str, key: &str) -> StoreResult<Option<Item>> {
            let item = self.inner.get_item(table, key)?;
            if let Some(current) = &item {
                let mut rival = current.clone();
                rival.insert("v".into(), json!("rival"));
                rival.insert(ATTR_VERSION.into(), json!(version_of(current)? + 1));
                self.inner.put_item(table, rival, &WriteCondition::AttributeEquals {
                    attribute: ATTR_VERSION.into(),
                    value: json!(version_of(current)?),
                })?;
            }
            Ok(item)
        }

        fn put_item(&self, table: &str, item: Item, condition: &WriteCondition) -> StoreResult<PutItemOutcome> {
            self.inner.put_item(table, item, condition)
        }

        fn scan(&self, table: &str, filter: &FilterExpression) -> StoreResult<Vec<Item>> {
            self.inner.scan(table, filter)
        }
    }

    #[test]
    fn lost_update_race_is_a_conflict() {
        let backend = DocumentBackend::new(RacingClient { inner: MemoryDocumentClient::new() });
        let key = SigningKey::generate();
        put(&backend, &key, "t", "1", json!({"v": 1})).unwrap();
        let stored = backend.client().inner.get_item("airframe_t", "1").unwrap().unwrap();
        let err = put(&backend, &key, "t", "1", json!({"v": 2})).unwrap_err();
        assert!(matches!(err, StoreError::Conflict { .. }));

        let after = backend.client().inner.get_item("airframe_t", "1").unwrap().unwrap();
        assert_eq!(after["v"], json!("rival"));
        assert_eq!(after[ATTR_LAST_UPDATED_AT], stored[ATTR_LAST_UPDATED_AT]);
    }

    #[test]
    fn versions_advance_per_write() {
        let backend = backend();
        let key = SigningKey::generate();
        for n in 1..=3u64 {
            put(&backend, &key, "t", "1", json!({"n": n})).unwrap();
            let item = backend.client().get_item("airframe_t", "1").unwrap().unwrap();
            assert_eq!(version_of(&item).unwrap(), n);
        }
        let data = json!({"version": "user-owned"});
        put(&backend, &key, "t", "1", data.clone()).unwrap();
        assert_eq!(backend.get("t", "1").unwrap().data, payload(data));
    }
}
