use std::collections::{BTreeMap, HashMap};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use airframe_crypto::Signature;
use airframe_types::{validate_id, Object, Payload, PutResult, Timestamp};

use crate::error::{StoreError, StoreResult};
use crate::ownership;
use crate::query::Query;
use crate::traits::{paginate, StorageBackend};

type Collections = HashMap<String, BTreeMap<String, Object>>;

/// In-memory backend: a map from type to an id-ordered map of objects.
///
/// Nothing survives a restart. Reads share the lock; a `put` holds the write
/// lock across its existence check, ownership check and write, so concurrent
/// updates of one key are serialized. Query results come back in id order.
pub struct InMemoryBackend {
    collections: RwLock<Collections>,
}

impl InMemoryBackend {
    /// Create a new empty backend.
    pub fn new() -> Self {
        Self {
            collections: RwLock::new(HashMap::new()),
        }
    }

    /// Total number of objects across all types.
    pub fn len(&self) -> StoreResult<usize> {
        Ok(self.read()?.values().map(BTreeMap::len).sum())
    }

    /// Returns `true` if no object has been stored.
    pub fn is_empty(&self) -> StoreResult<bool> {
        Ok(self.len()? == 0)
    }

    /// Sorted list of types holding at least one object.
    pub fn types(&self) -> StoreResult<Vec<String>> {
        let mut types: Vec<String> = self.read()?.keys().cloned().collect();
        types.sort();
        Ok(types)
    }

    fn read(&self) -> StoreResult<RwLockReadGuard<'_, Collections>> {
        self.collections.read().map_err(StoreError::lock_poisoned)
    }

    fn write(&self) -> StoreResult<RwLockWriteGuard<'_, Collections>> {
        self.collections.write().map_err(StoreError::lock_poisoned)
    }
}

impl Default for InMemoryBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl StorageBackend for InMemoryBackend {
    fn name(&self) -> &'static str {
        "memory"
    }

    fn get(&self, typ: &str, id: &str) -> StoreResult<Object> {
        self.read()?
            .get(typ)
            .and_then(|objects| objects.get(id))
            .cloned()
            .ok_or_else(|| StoreError::not_found(typ, id))
    }

    fn exists(&self, typ: &str, id: &str) -> StoreResult<bool> {
        Ok(self
            .read()?
            .get(typ)
            .is_some_and(|objects| objects.contains_key(id)))
    }

    fn query(
        &self,
        typ: &str,
        query: &Query,
        skip: usize,
        limit: usize,
    ) -> StoreResult<Vec<Object>> {
        let collections = self.read()?;
        let Some(objects) = collections.get(typ) else {
            return Ok(Vec::new());
        };
        let matches = objects
            .values()
            .filter(|obj| query.matches(&obj.data))
            .cloned();
        Ok(paginate(matches, skip, limit))
    }

    fn put(
        &self,
        typ: &str,
        id: &str,
        data: Payload,
        signature: &Signature,
    ) -> StoreResult<PutResult> {
        validate_id(id)?;
        // Recovery depends only on the request, so it runs outside the lock.
        let signer = ownership::recover_signer(typ, id, &data, signature)?;

        let mut collections = self.write()?;
        let objects = collections.entry(typ.to_string()).or_default();
        match objects.get_mut(id) {
            Some(existing) => {
                ownership::ensure_owner(existing, &signer)?;
                existing.update(data, Timestamp::now());
                Ok(PutResult::updated())
            }
            None => {
                objects.insert(
                    id.to_string(),
                    Object::new(typ, id, data, signer, Timestamp::now()),
                );
                Ok(PutResult::created())
            }
        }
    }
}

impl std::fmt::Debug for InMemoryBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let count = self.len().unwrap_or_default();
        f.debug_struct("InMemoryBackend")
            .field("object_count", &count)
            .finish()
    }
}
