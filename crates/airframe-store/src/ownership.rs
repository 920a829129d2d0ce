//! Signature-derived ownership.
//!
//! Every authorization decision in the store goes through this module. There
//! are no sessions or API keys: an object's owner is whoever can produce a
//! signature over its canonical hash that recovers to the stored key.

use airframe_crypto::{ObjectHash, ObjectHasher, Signature};
use airframe_types::{Object, Payload, PublicKey};

use crate::error::{StoreError, StoreResult};

/// Recover the compressed public key that signed `hash`.
pub fn recover_owner(hash: &ObjectHash, signature: &Signature) -> StoreResult<PublicKey> {
    Ok(signature.recover(hash)?)
}

/// Recover the signer of a write of `data` to `(typ, id)`.
///
/// The hash covers the data being written, so a signature over one payload
/// cannot be replayed with another.
pub fn recover_signer(
    typ: &str,
    id: &str,
    data: &Payload,
    signature: &Signature,
) -> StoreResult<PublicKey> {
    recover_owner(&ObjectHasher::hash(typ, id, data), signature)
}

/// Whether `signature` over the object's current content recovers to its
/// owner. Unrecoverable signatures are simply not the owner's.
pub fn is_owner(object: &Object, signature: &Signature) -> bool {
    recover_signer(&object.typ, &object.id, &object.data, signature)
        .map(|signer| signer == object.owner)
        .unwrap_or(false)
}

/// Authorize an update of `existing` by `signer`.
pub fn ensure_owner(existing: &Object, signer: &PublicKey) -> StoreResult<()> {
    if existing.owner != *signer {
        tracing::warn!(
            typ = %existing.typ,
            id = %existing.id,
            owner = %existing.owner,
            signer = %signer,
            "rejected update from non-owner"
        );
        return Err(StoreError::NotAuthorized {
            typ: existing.typ.clone(),
            id: existing.id.clone(),
        });
    }
    Ok(())
}
