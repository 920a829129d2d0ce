use std::fmt;

use airframe_types::{Payload, PublicKey};
use k256::ecdsa::{self, RecoveryId, VerifyingKey};
use k256::elliptic_curve::sec1::ToEncodedPoint;

use crate::hasher::{ObjectHash, ObjectHasher};

/// Length of a recoverable signature: `R (32) ‖ S (32) ‖ V (1)`.
pub const SIGNATURE_LEN: usize = 65;

/// Offset added to the recovery id by Ethereum tooling.
const LEGACY_V_OFFSET: u8 = 27;

/// secp256k1 signing key (private).
pub struct SigningKey(ecdsa::SigningKey);

/// Recoverable ECDSA signature in `[R ‖ S ‖ V]` layout.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct Signature([u8; SIGNATURE_LEN]);

impl SigningKey {
    /// Generate a new random signing key.
    pub fn generate() -> Self {
        Self(ecdsa::SigningKey::random(&mut rand::rngs::OsRng))
    }

    /// Create from a raw 32-byte secret scalar.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, SignatureError> {
        ecdsa::SigningKey::from_slice(bytes)
            .map(Self)
            .map_err(|_| SignatureError::InvalidKey)
    }

    /// Parse a hex secret, with or without a `0x` prefix.
    pub fn from_hex(s: &str) -> Result<Self, SignatureError> {
        let s = s.strip_prefix("0x").unwrap_or(s);
        let bytes = hex::decode(s).map_err(|_| SignatureError::InvalidKey)?;
        Self::from_bytes(&bytes)
    }

    /// Raw secret bytes as hex.
    pub fn to_hex(&self) -> String {
        hex::encode(self.0.to_bytes())
    }

    /// The compressed public key that signatures from this key recover to.
    pub fn public_key(&self) -> PublicKey {
        compress(self.0.verifying_key())
    }

    /// Sign a 32-byte digest.
    pub fn sign_hash(&self, hash: &ObjectHash) -> Result<Signature, SignatureError> {
        let (sig, recid) = self
            .0
            .sign_prehash_recoverable(hash.as_bytes())
            .map_err(|_| SignatureError::SigningFailed)?;
        let mut out = [0u8; SIGNATURE_LEN];
        out[..64].copy_from_slice(&sig.to_bytes());
        out[64] = recid.to_byte();
        Ok(Signature(out))
    }

    /// Sign the object hash of `(type, id, data)`; this is what a client
    /// sends alongside a write.
    pub fn sign_object(
        &self,
        typ: &str,
        id: &str,
        data: &Payload,
    ) -> Result<Signature, SignatureError> {
        self.sign_hash(&ObjectHasher::hash(typ, id, data))
    }
}

impl Signature {
    /// Wrap bytes, checking only the length. Curve validity is checked on
    /// recovery.
    pub fn from_slice(bytes: &[u8]) -> Result<Self, SignatureError> {
        let arr: [u8; SIGNATURE_LEN] = bytes
            .try_into()
            .map_err(|_| SignatureError::InvalidLength(bytes.len()))?;
        Ok(Self(arr))
    }

    /// Parse hex, with or without a `0x` prefix.
    pub fn from_hex(s: &str) -> Result<Self, SignatureError> {
        let s = s.strip_prefix("0x").unwrap_or(s);
        let bytes = hex::decode(s).map_err(|e| SignatureError::InvalidHex(e.to_string()))?;
        Self::from_slice(&bytes)
    }

    /// `0x`-prefixed hex.
    pub fn to_hex(&self) -> String {
        format!("0x{}", hex::encode(self.0))
    }

    pub fn as_bytes(&self) -> &[u8; SIGNATURE_LEN] {
        &self.0
    }

    /// Recover the compressed public key that produced this signature over
    /// `hash`.
    ///
    /// `V` may be `0`/`1` or the Ethereum-style `27`/`28`.
    pub fn recover(&self, hash: &ObjectHash) -> Result<PublicKey, SignatureError> {
        let v = match self.0[64] {
            v if v >= LEGACY_V_OFFSET => v - LEGACY_V_OFFSET,
            v => v,
        };
        let recid = RecoveryId::from_byte(v).ok_or(SignatureError::InvalidRecoveryId(self.0[64]))?;
        let sig = ecdsa::Signature::from_slice(&self.0[..64])
            .map_err(|_| SignatureError::Malformed)?;
        let key = VerifyingKey::recover_from_prehash(hash.as_bytes(), &sig, recid)
            .map_err(|_| SignatureError::RecoveryFailed)?;
        Ok(compress(&key))
    }
}

fn compress(key: &VerifyingKey) -> PublicKey {
    let point = key.to_encoded_point(true);
    let mut out = [0u8; 33];
    out.copy_from_slice(point.as_bytes());
    PublicKey::from_bytes(out)
}

impl fmt::Debug for SigningKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SigningKey(<redacted>)")
    }
}

impl fmt::Debug for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Signature({}...)", hex::encode(&self.0[..8]))
    }
}

/// Errors from signing and recovery.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum SignatureError {
    #[error("signature must be {SIGNATURE_LEN} bytes in [R || S || V] format, got {0}")]
    InvalidLength(usize),
    #[error("invalid signature hex: {0}")]
    InvalidHex(String),
    #[error("invalid recovery id {0}")]
    InvalidRecoveryId(u8),
    #[error("malformed signature")]
    Malformed,
    #[error("public key recovery failed")]
    RecoveryFailed,
    #[error("signing failed")]
    SigningFailed,
    #[error("invalid key")]
    InvalidKey,
}
