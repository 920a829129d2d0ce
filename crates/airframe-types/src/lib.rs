//! Foundation types for Airframe.
//!
//! Airframe is an object store where every write is authenticated by an
//! ECDSA signature over the object's content. The owner of an object is the
//! public key recovered from that signature, never a value asserted by the
//! caller. Every other Airframe crate depends on `airframe-types`.
//!
//! # Key Types
//!
//! - [`Object`] -- a typed, identified, owned document
//! - [`Payload`] -- the JSON mapping held in an object's `data`
//! - [`PublicKey`] -- 33-byte compressed secp256k1 key identifying an owner
//! - [`Timestamp`] -- nanoseconds since the Unix epoch
//! - [`PutResult`] -- outcome of a write

pub mod error;
pub mod identity;
pub mod object;
pub mod temporal;

pub use error::TypeError;
pub use identity::PublicKey;
pub use object::{validate_id, Object, Payload, PutResult, ID_SEPARATOR};
pub use temporal::Timestamp;
