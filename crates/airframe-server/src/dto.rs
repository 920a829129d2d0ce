//! Wire shapes for the HTTP API.

use airframe_crypto::Address;
use airframe_types::{Object, Payload};
use serde::{Deserialize, Serialize};

use crate::error::{ServerError, ServerResult};

/// An object as returned to clients. `owner` is the checksummed address of
/// the owning key; `ownerKey` is the compressed key itself.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ObjectResponse {
    #[serde(rename = "type")]
    pub typ: String,
    pub id: String,
    pub data: Payload,
    pub owner: String,
    pub owner_key: String,
    pub created_at: i64,
    pub last_updated_at: i64,
}

impl TryFrom<Object> for ObjectResponse {
    type Error = ServerError;

    fn try_from(object: Object) -> ServerResult<Self> {
        let address = Address::from_public_key(&object.owner)
            .map_err(|e| ServerError::Internal(format!("stored owner key is invalid: {e}")))?;
        Ok(Self {
            owner: address.to_checksum_hex(),
            owner_key: object.owner.to_hex(),
            typ: object.typ,
            id: object.id,
            data: object.data,
            created_at: object.created_at.as_nanos(),
            last_updated_at: object.last_updated_at.as_nanos(),
        })
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct QueryResponse {
    pub results: Vec<ObjectResponse>,
}

/// Body of a write.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PutRequest {
    pub data: Payload,
    /// Hex of the 65-byte `[R || S || V]` signature, `0x` optional.
    pub signature: String,
}

impl PutRequest {
    /// Decode the signature, rejecting anything that is not exactly 65 bytes.
    pub fn signature_bytes(&self) -> ServerResult<Vec<u8>> {
        let hex_str = self.signature.strip_prefix("0x").unwrap_or(&self.signature);
        let bytes = hex::decode(hex_str)
            .map_err(|e| ServerError::BadRequest(format!("invalid signature: {e}")))?;
        if bytes.len() != airframe_crypto::SIGNATURE_LEN {
            return Err(ServerError::BadRequest(
                "invalid signature: should be 65-byte ECDSA signature with [R || S || V] format"
                    .into(),
            ));
        }
        Ok(bytes)
    }
}

/// Raw query-string parameters. `skip` and `limit` are kept as text so a
/// malformed number falls back to `0` instead of rejecting the request.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct QueryParams {
    pub query: Option<String>,
    pub skip: Option<String>,
    pub limit: Option<String>,
}

impl QueryParams {
    pub fn query(&self) -> &str {
        self.query.as_deref().unwrap_or("{}")
    }

    pub fn skip(&self) -> usize {
        parse_or_zero(self.skip.as_deref())
    }

    pub fn limit(&self) -> usize {
        parse_or_zero(self.limit.as_deref())
    }
}

fn parse_or_zero(raw: Option<&str>) -> usize {
    raw.and_then(|s| s.trim().parse().ok()).unwrap_or(0)
}
