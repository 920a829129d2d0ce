//! Signed object storage for Airframe.
//!
//! Objects are JSON documents addressed by `(type, id)`. Writes carry a
//! recoverable ECDSA signature over the object's hash; the key it recovers
//! to becomes the owner on create and must match the owner on update.
//!
//! # Components
//!
//! - [`ownership`] -- recovers signers and enforces ownership
//! - [`Query`] -- compiles a JSON query document into AND-combined clauses
//! - [`StorageBackend`] -- the storage contract every backend satisfies
//! - [`InMemoryBackend`] -- reference backend held in process memory
//! - [`DocumentBackend`] -- adapter onto an external document store
//! - [`ObjectStore`] -- facade exposing get, exists, query and put
//!
//! # Design Rules
//!
//! 1. Ownership is derived from signatures only. There is no other credential.
//! 2. A `put` is atomic per `(type, id)`, including its ownership check.
//! 3. Ids containing `/` are rejected before the signature is looked at.
//! 4. A query clause that meets an incompatible field does not match; it
//!    never fails the query.
//! 5. All backend errors are propagated, never silently ignored.

pub mod document;
pub mod error;
pub mod memory;
pub mod ownership;
pub mod query;
pub mod store;
pub mod traits;

// Re-export primary types at crate root for ergonomic imports.
pub use document::{DocumentBackend, DocumentClient, MemoryDocumentClient};
pub use error::{StoreError, StoreResult};
pub use memory::InMemoryBackend;
pub use query::{Clause, Operator, Query};
pub use store::ObjectStore;
pub use traits::{paginate, StorageBackend};
