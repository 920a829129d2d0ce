use std::time::Duration;

use airframe_crypto::{Address, SigningKey};
use airframe_server::dto::{ObjectResponse, PutRequest, QueryResponse};
use airframe_types::{Payload, PutResult};
use reqwest::{Method, RequestBuilder, Response, StatusCode, Url};
use serde_json::Value;

use crate::error::{SdkError, SdkResult};

const CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

/// Connection to an Airframe server, writing as one signing key.
///
/// Every `put` is signed locally; the key never leaves the process.
pub struct Client {
    http: reqwest::Client,
    base: Url,
    key: SigningKey,
}

impl Client {
    /// Connect to the server at `base_url` (e.g. `http://127.0.0.1:8080`).
    pub fn connect(base_url: &str, key: SigningKey) -> SdkResult<Self> {
        let base = Url::parse(base_url).map_err(|e| SdkError::InvalidUrl(e.to_string()))?;
        if base.cannot_be_a_base() {
            return Err(SdkError::InvalidUrl(base_url.to_string()));
        }
        let http = reqwest::Client::builder()
            .connect_timeout(CONNECT_TIMEOUT)
            .build()?;
        Ok(Self { http, base, key })
    }

    /// Address that objects written by this client will be owned by.
    pub fn address(&self) -> SdkResult<Address> {
        Ok(Address::from_public_key(&self.key.public_key())?)
    }

    pub async fn get(&self, typ: &str, id: &str) -> SdkResult<ObjectResponse> {
        let response = self.request(Method::GET, &[typ, id])?.send().await?;
        let response = check(response, typ, id).await?;
        Ok(response.json().await?)
    }

    pub async fn exists(&self, typ: &str, id: &str) -> SdkResult<bool> {
        let response = self.request(Method::HEAD, &[typ, id])?.send().await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(false);
        }
        check(response, typ, id).await?;
        Ok(true)
    }

    /// Objects of `typ` matching `query`. `limit` of `0` asks for all matches,
    /// subject to the server's cap.
    pub async fn query(
        &self,
        typ: &str,
        query: &Value,
        skip: usize,
        limit: usize,
    ) -> SdkResult<Vec<ObjectResponse>> {
        let params = [
            ("query", query.to_string()),
            ("skip", skip.to_string()),
            ("limit", limit.to_string()),
        ];
        let response = self.request(Method::GET, &[typ])?.query(&params).send().await?;
        let response = check(response, typ, "").await?;
        let body: QueryResponse = response.json().await?;
        Ok(body.results)
    }

    /// Sign `data` for `(typ, id)` and write it.
    pub async fn put(&self, typ: &str, id: &str, data: Payload) -> SdkResult<PutResult> {
        let signature = self.key.sign_object(typ, id, &data)?;
        tracing::debug!(typ, id, owner = %self.key.public_key(), "put");

        let body = PutRequest { data, signature: signature.to_hex() };
        let response = self.request(Method::POST, &[typ, id])?.json(&body).send().await?;
        let response = check(response, typ, id).await?;
        Ok(response.json().await?)
    }

    fn request(&self, method: Method, segments: &[&str]) -> SdkResult<RequestBuilder> {
        let mut url = self.base.clone();
        url.path_segments_mut()
            .map_err(|()| SdkError::InvalidUrl(self.base.to_string()))?
            .pop_if_empty()
            .extend(["v1", "object"])
            .extend(segments);
        Ok(self.http.request(method, url))
    }
}

impl std::fmt::Debug for Client {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Client")
            .field("base", &self.base.as_str())
            .field("owner", &self.key.public_key())
            .finish()
    }
}

/// Turn an error response into a typed error.
async fn check(response: Response, typ: &str, id: &str) -> SdkResult<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let (typ, id) = (typ.to_string(), id.to_string());
    match status {
        StatusCode::NOT_FOUND => Err(SdkError::NotFound { typ, id }),
        StatusCode::UNAUTHORIZED => Err(SdkError::NotAuthorized { typ, id }),
        _ => {
            let message = response
                .json::<Value>()
                .await
                .ok()
                .and_then(|body| body.get("error").and_then(Value::as_str).map(str::to_owned))
                .unwrap_or_else(|| status.to_string());
            Err(SdkError::Rejected { status: status.as_u16(), message })
        }
    }
}
