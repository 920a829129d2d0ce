use airframe_crypto::Signature;
use airframe_types::{Object, Payload, PutResult};

use crate::error::StoreResult;
use crate::query::Query;

/// Storage medium for signed objects, partitioned by type.
///
/// All implementations must satisfy these invariants:
/// - `put` is atomic per `(type, id)`: the existence check, the ownership
///   check and the write happen as one step with respect to other `put`s on
///   the same key, and readers never observe a half-written object.
/// - The owner of a new object is the key recovered from the signature; an
///   update must recover to the stored owner or fail with `NotAuthorized`.
/// - Ids containing `/` are rejected with `InvalidId` before anything else.
/// - All storage errors are propagated, never silently ignored.
pub trait StorageBackend: Send + Sync {
    /// Short name used in logs and diagnostics.
    fn name(&self) -> &'static str;

    /// Read an object. Returns `NotFound` if absent.
    fn get(&self, typ: &str, id: &str) -> StoreResult<Object>;

    /// Check whether an object exists.
    fn exists(&self, typ: &str, id: &str) -> StoreResult<bool>;

    /// Objects of `typ` matching every clause of `query`, after skipping
    /// `skip` matches and keeping at most `limit` (`0` = unlimited).
    fn query(&self, typ: &str, query: &Query, skip: usize, limit: usize)
        -> StoreResult<Vec<Object>>;

    /// Create or update `(typ, id)` with `data`, authorized by `signature`
    /// over the hash of the new content.
    fn put(&self, typ: &str, id: &str, data: Payload, signature: &Signature)
        -> StoreResult<PutResult>;
}

/// Apply skip/limit to an ordered stream of matches.
pub fn paginate<I>(matches: I, skip: usize, limit: usize) -> Vec<Object>
where
    I: IntoIterator<Item = Object>,
{
    let iter = matches.into_iter().skip(skip);
    if limit == 0 {
        iter.collect()
    } else {
        iter.take(limit).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use airframe_types::{PublicKey, Timestamp};

    fn objects(n: usize) -> Vec<Object> {
        (0..n)
            .map(|i| {
                Object::new(
                    "t",
                    i.to_string(),
                    Payload::new(),
                    PublicKey::from_bytes([2; 33]),
                    Timestamp::zero(),
                )
            })
            .collect()
    }

    fn ids(objs: &[Object]) -> Vec<&str> {
        objs.iter().map(|o| o.id.as_str()).collect()
    }

    #[test]
    fn zero_limit_is_unlimited() {
        assert_eq!(paginate(objects(4), 0, 0).len(), 4);
    }

    #[test]
    fn skip_then_limit() {
        assert_eq!(ids(&paginate(objects(5), 1, 2)), vec!["1", "2"]);
    }

    #[test]
    fn skip_past_end_is_empty() {
        assert!(paginate(objects(2), 5, 0).is_empty());
    }
}
