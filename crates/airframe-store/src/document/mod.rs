//! Adapter onto an external document store.
//!
//! The store is reached through the narrow [`DocumentClient`] trait: keyed
//! item reads, conditional puts, and filtered scans over one table per type.
//! [`DocumentBackend`] maps objects and queries onto that surface;
//! [`MemoryDocumentClient`] is an in-process client for tests and local runs.

pub mod backend;
pub mod client;
pub mod filter;
pub mod item;

pub use backend::{DocumentBackend, DEFAULT_TABLE_PREFIX};
pub use client::{DocumentClient, MemoryDocumentClient, PutItemOutcome, WriteCondition};
pub use filter::{FilterCondition, FilterExpression, RenderedFilter};
pub use item::Item;
