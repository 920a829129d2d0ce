//! Cryptographic primitives for Airframe.
//!
//! Provides the deterministic object hash (SHA3-256 over a canonical
//! `type/id/data` preimage), recoverable secp256k1 ECDSA signatures in the
//! 65-byte `[R ‖ S ‖ V]` layout, and Ethereum-style owner addresses.
//!
//! All crypto operations wrap established libraries -- no custom cryptography.

pub mod address;
pub mod hasher;
pub mod signer;

pub use address::{keccak256, Address};
pub use hasher::{canonical_json, ObjectHash, ObjectHasher};
pub use signer::{Signature, SignatureError, SigningKey, SIGNATURE_LEN};
