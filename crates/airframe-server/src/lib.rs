//! HTTP server for Airframe.
//!
//! Exposes the object store over JSON: read an object, check that it exists,
//! query a type, and write with a hex-encoded signature. Store errors map to
//! HTTP statuses in [`ServerError::status`].

pub mod config;
pub mod dto;
pub mod error;
pub mod handler;
pub mod router;
pub mod server;

pub use config::{BackendKind, Profile, ServerConfig};
pub use error::{ServerError, ServerResult};
pub use handler::AppState;
pub use router::build_router;
pub use server::AirframeServer;

#[cfg(test)]
mod tests {
    use super::*;
    use airframe_crypto::SigningKey;
    use airframe_store::ObjectStore;
    use airframe_types::Payload;
    use axum::body::{to_bytes, Body};
    use axum::http::{Method, Request, StatusCode};
    use axum::Router;
    use serde_json::{json, Value};
    use tower::util::ServiceExt;

    fn app() -> Router {
        build_router(AppState::new(ObjectStore::in_memory(), ServerConfig::default()))
    }

    async fn call(app: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let request = Request::builder().method(method).uri(uri);
        let request = match body {
            Some(body) => request
                .header("content-type", "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => request.body(Body::empty()).unwrap(),
        };
        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, value)
    }

    fn put_body(key: &SigningKey, typ: &str, id: &str, data: Value) -> Value {
        let payload: Payload = data.as_object().cloned().unwrap();
        let sig = key.sign_object(typ, id, &payload).unwrap();
        json!({ "data": data, "signature": sig.to_hex() })
    }

    #[tokio::test]
    async fn health_endpoint() {
        let (status, body) = call(&app(), Method::GET, "/v1/health", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");
    }

    #[tokio::test]
    async fn info_endpoint() {
        let (status, body) = call(&app(), Method::GET, "/v1/info", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["name"], "airframe-server");
        assert_eq!(body["backend"], "memory");
    }

    #[tokio::test]
    async fn put_then_get() {
        let app = app();
        let key = SigningKey::generate();

        let body = put_body(&key, "user", "1", json!({"name": "Ann"}));
        let (status, result) = call(&app, Method::POST, "/v1/object/user/1", Some(body)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(result, json!({"created": true, "feeUsed": 0}));

        let body = put_body(&key, "user", "1", json!({"name": "Bo"}));
        let (_, result) = call(&app, Method::POST, "/v1/object/user/1", Some(body)).await;
        assert_eq!(result["created"], false);

        let (status, obj) = call(&app, Method::GET, "/v1/object/user/1", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(obj["data"], json!({"name": "Bo"}));
        assert_eq!(obj["ownerKey"], key.public_key().to_hex());
        assert!(obj["owner"].as_str().unwrap().starts_with("0x"));
    }

    #[tokio::test]
    async fn head_reports_existence() {
        let app = app();
        let (status, _) = call(&app, Method::HEAD, "/v1/object/user/1", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let body = put_body(&SigningKey::generate(), "user", "1", json!({}));
        call(&app, Method::POST, "/v1/object/user/1", Some(body)).await;
        let (status, _) = call(&app, Method::HEAD, "/v1/object/user/1", None).await;
        assert_eq!(status, StatusCode::OK);
    }

    #[tokio::test]
    async fn missing_object_is_404() {
        let (status, body) = call(&app(), Method::GET, "/v1/object/user/nope", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert!(body["error"].as_str().unwrap().contains("not found"));
    }

    #[tokio::test]
    async fn non_owner_write_is_401() {
        let app = app();
        let body = put_body(&SigningKey::generate(), "t", "1", json!({"v": 1}));
        call(&app, Method::POST, "/v1/object/t/1", Some(body)).await;

        let body = put_body(&SigningKey::generate(), "t", "1", json!({"v": 2}));
        let (status, _) = call(&app, Method::POST, "/v1/object/t/1", Some(body)).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn short_signature_is_400() {
        let body = json!({"data": {}, "signature": format!("0x{}", "ab".repeat(64))});
        let (status, body) = call(&app(), Method::POST, "/v1/object/t/1", Some(body)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"].as_str().unwrap().contains("65-byte"));
    }

    #[tokio::test]
    async fn malformed_body_is_400() {
        let body = json!({"signature": "0x00"});
        let (status, body) = call(&app(), Method::POST, "/v1/object/t/1", Some(body)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"].is_string());
    }

    #[tokio::test]
    async fn query_with_pagination() {
        let app = app();
        let key = SigningKey::generate();
        for (id, foo) in [("1", "bar"), ("2", "baz")] {
            let body = put_body(&key, "testdata", id, json!({"foo": foo}));
            call(&app, Method::POST, &format!("/v1/object/testdata/{id}"), Some(body)).await;
        }

        // {"foo":{"contains":"b"}}
        let q = "%7B%22foo%22%3A%7B%22contains%22%3A%22b%22%7D%7D";
        let (status, body) =
            call(&app, Method::GET, &format!("/v1/object/testdata?query={q}&limit=1"), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["results"].as_array().unwrap().len(), 1);

        let (_, body) =
            call(&app, Method::GET, &format!("/v1/object/testdata?query={q}&skip=1"), None).await;
        assert_eq!(body["results"][0]["id"], "2");

        let (_, body) =
            call(&app, Method::GET, "/v1/object/testdata?skip=oops&limit=oops", None).await;
        assert_eq!(body["results"].as_array().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn unknown_operator_is_400() {
        // {"a":{"like":1}}
        let uri = "/v1/object/t?query=%7B%22a%22%3A%7B%22like%22%3A1%7D%7D";
        let (status, body) = call(&app(), Method::GET, uri, None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"].as_str().unwrap().contains("like"));
    }

    #[tokio::test]
    async fn unknown_route_is_json_404() {
        let (status, body) = call(&app(), Method::GET, "/v2/nothing", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"], "not found");
    }
}
