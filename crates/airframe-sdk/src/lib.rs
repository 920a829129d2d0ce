//! Client SDK for Airframe.
//!
//! [`Client`] talks to an Airframe server over its HTTP API. Writes are
//! hashed and signed locally with the client's [`SigningKey`], so the server
//! only ever sees signatures. Not-found and not-authorized responses come
//! back as typed [`SdkError`] variants.

pub mod client;
pub mod error;

pub use client::Client;
pub use error::{SdkError, SdkResult};

// Re-export key types
pub use airframe_crypto::{Address, SigningKey};
pub use airframe_server::dto::ObjectResponse;
pub use airframe_types::{Payload, PutResult};
