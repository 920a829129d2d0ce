use airframe_crypto::SignatureError;
use airframe_types::TypeError;

/// Errors from object store operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// No object exists at `(type, id)`.
    #[error("object not found: {typ}/{id}")]
    NotFound { typ: String, id: String },

    /// The write was signed by a key other than the object's owner.
    #[error("not authorized to update {typ}/{id}")]
    NotAuthorized { typ: String, id: String },

    /// The signature is malformed, has the wrong length, or does not recover.
    #[error("invalid signature: {0}")]
    InvalidSignature(#[from] SignatureError),

    /// The id contains the reserved separator.
    #[error("invalid object id {0:?}")]
    InvalidId(String),

    /// The query names an operator outside the fixed set.
    #[error("unknown operator: {0}")]
    UnknownOperator(String),

    /// The query document is not well formed.
    #[error("invalid query: {0}")]
    InvalidQuery(String),

    /// A clause was applied to a field of an incompatible type.
    #[error("type mismatch on field {field:?}: expected {expected}")]
    TypeMismatch { field: String, expected: &'static str },

    /// A concurrent write changed the object between read and write.
    #[error("concurrent write conflict on {typ}/{id}")]
    Conflict { typ: String, id: String },

    /// Serialization or deserialization failure.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// The underlying storage medium failed.
    #[error("backend failure: {0}")]
    Backend(String),
}

impl From<TypeError> for StoreError {
    fn from(err: TypeError) -> Self {
        match err {
            TypeError::InvalidId(id) => Self::InvalidId(id),
            other => Self::Serialization(other.to_string()),
        }
    }
}

impl StoreError {
    pub(crate) fn not_found(typ: &str, id: &str) -> Self {
        Self::NotFound { typ: typ.to_string(), id: id.to_string() }
    }

    pub(crate) fn lock_poisoned(err: impl std::fmt::Display) -> Self {
        Self::Backend(format!("lock poisoned: {err}"))
    }
}

/// Result alias for store operations.
pub type StoreResult<T> = Result<T, StoreError>;
