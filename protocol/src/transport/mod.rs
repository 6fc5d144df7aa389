//! # Gateway Transport
//!
//! Two layers:
//!
//! - [`HttpTransport`] moves a [`GatewayRequest`] over the wire and hands
//!   back the response body parsed as JSON. That's the only thing it does.
//!   [`http::ReqwestTransport`] is the production implementation; tests
//!   plug in their own.
//! - [`TransportClient`] sits on top and decides whether the gateway said
//!   yes or no, using [`classify_response`].
//!
//! ## Error classification
//!
//! The gateway is inconsistent about how it reports errors. Some endpoints
//! answer with `{ devMessage, reason, ... }`, others with
//! `{ reason, message }`, and the HTTP status code is not reliable either
//! way. So the body decides, checked in this order:
//!
//! 1. `devMessage` present → [`NagadError::Gateway`] with that message.
//! 2. `reason` present → [`NagadError::Gateway`] with the body's `message`.
//! 3. Otherwise the body is the successful result.
//!
//! "Present" means non-null and not an empty string. A `devMessage: null`
//! on a successful response is not an error.

pub mod http;

use std::sync::Arc;

use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;
use tracing::warn;

use crate::config::{HEADER_API_VERSION, HEADER_CLIENT_IP, HEADER_CLIENT_TYPE};
use crate::error::NagadError;

pub use http::ReqwestTransport;

/// HTTP verb. The gateway only needs two.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
}

/// Call-site headers, on top of the fixed JSON `content-type` / `Accept`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RequestHeaders {
    /// `X-KM-Api-Version`, sent on every request.
    pub api_version: String,
    /// `X-KM-IP-V4`, Initialize and Confirm only.
    pub client_ip: Option<String>,
    /// `X-KM-Client-Type`, Initialize and Confirm only.
    pub client_type: Option<String>,
}

impl RequestHeaders {
    /// Just the API version. What Verify sends.
    pub fn base(api_version: impl Into<String>) -> Self {
        Self {
            api_version: api_version.into(),
            client_ip: None,
            client_type: None,
        }
    }

    /// Base headers plus the client IP and type. What the checkout
    /// endpoints get.
    pub fn with_client(mut self, ip: impl Into<String>, client_type: impl Into<String>) -> Self {
        self.client_ip = Some(ip.into());
        self.client_type = Some(client_type.into());
        self
    }

    /// Header name/value pairs, in a stable order.
    pub fn to_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = vec![(HEADER_API_VERSION, self.api_version.clone())];
        if let Some(ip) = &self.client_ip {
            pairs.push((HEADER_CLIENT_IP, ip.clone()));
        }
        if let Some(client_type) = &self.client_type {
            pairs.push((HEADER_CLIENT_TYPE, client_type.clone()));
        }
        pairs
    }
}

/// One outbound request to the gateway.
#[derive(Clone, Debug, PartialEq)]
pub struct GatewayRequest {
    pub method: Method,
    pub url: String,
    pub headers: RequestHeaders,
    pub body: Option<Value>,
}

/// Moves requests over the wire.
///
/// Implementations parse the body as JSON regardless of status code and
/// return [`NagadError::Transport`] for anything that isn't JSON, for
/// timeouts, and for connection failures. They must not interpret the
/// body; that's [`TransportClient`]'s job.
#[async_trait]
pub trait HttpTransport: Send + Sync {
    async fn send(&self, request: GatewayRequest) -> Result<Value, NagadError>;
}

/// Lets several clients share one transport.
#[async_trait]
impl<T: HttpTransport + ?Sized> HttpTransport for Arc<T> {
    async fn send(&self, request: GatewayRequest) -> Result<Value, NagadError> {
        (**self).send(request).await
    }
}

/// Render a gateway field as text. Strings verbatim, other scalars via
/// their JSON form, null / empty as absent.
fn field_text(body: &Value, field: &str) -> Option<String> {
    match body.get(field)? {
        Value::Null => None,
        Value::String(s) if s.is_empty() => None,
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}

/// Decide whether a parsed gateway body is a success or a rejection.
///
/// A body with `reason` but no `message` gets the reason text copied into
/// the `message` of [`NagadError::Gateway`]. That copy is not a message the
/// gateway sent.
pub fn classify_response(body: Value) -> Result<Value, NagadError> {
    let reason = field_text(&body, "reason");

    if let Some(dev_message) = field_text(&body, "devMessage") {
        return Err(NagadError::Gateway {
            message: dev_message,
            reason,
        });
    }

    if let Some(reason) = reason {
        let message = field_text(&body, "message").unwrap_or_else(|| reason.clone());
        return Err(NagadError::Gateway {
            message,
            reason: Some(reason),
        });
    }

    Ok(body)
}

/// GET / POST against the gateway with response classification applied.
pub struct TransportClient<T> {
    inner: T,
}

impl<T: HttpTransport> TransportClient<T> {
    pub fn new(inner: T) -> Self {
        Self { inner }
    }

    /// The underlying transport.
    pub fn inner(&self) -> &T {
        &self.inner
    }

    pub async fn get(&self, url: &str, headers: RequestHeaders) -> Result<Value, NagadError> {
        self.execute(GatewayRequest {
            method: Method::Get,
            url: url.to_string(),
            headers,
            body: None,
        })
        .await
    }

    pub async fn post<B: Serialize>(
        &self,
        url: &str,
        body: &B,
        headers: RequestHeaders,
    ) -> Result<Value, NagadError> {
        let body =
            serde_json::to_value(body).map_err(|e| NagadError::Serialization(e.to_string()))?;
        self.execute(GatewayRequest {
            method: Method::Post,
            url: url.to_string(),
            headers,
            body: Some(body),
        })
        .await
    }

    async fn execute(&self, request: GatewayRequest) -> Result<Value, NagadError> {
        let url = request.url.clone();
        let body = self.inner.send(request).await?;
        classify_response(body).map_err(|err| {
            warn!(url = %url, reason = err.reason().unwrap_or("-"), "gateway rejected request");
            err
        })
    }
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;
    use std::sync::Mutex;

    use serde_json::json;

    use super::*;

    #[test]
    fn dev_message_wins_over_reason() {
        let err = classify_response(json!({
            "devMessage": "Invalid merchant",
            "reason": "INVALID_MERCHANT",
            "message": "Something else entirely"
        }))
        .unwrap_err();

        match err {
            NagadError::Gateway { message, reason } => {
                assert_eq!(message, "Invalid merchant");
                assert_eq!(reason.as_deref(), Some("INVALID_MERCHANT"));
            }
            other => panic!("expected gateway error, got {other:?}"),
        }
    }

    #[test]
    fn dev_message_without_reason() {
        let err = classify_response(json!({ "devMessage": "Unauthorized" })).unwrap_err();
        assert!(matches!(
            err,
            NagadError::Gateway { ref message, reason: None } if message == "Unauthorized"
        ));
    }

    #[test]
    fn reason_uses_body_message() {
        let err = classify_response(json!({
            "reason": "DUPLICATE_ORDER",
            "message": "Order id already used"
        }))
        .unwrap_err();
        assert!(matches!(
            err,
            NagadError::Gateway { ref message, ref reason }
                if message == "Order id already used" && reason.as_deref() == Some("DUPLICATE_ORDER")
        ));
    }

    #[test]
    fn reason_without_message_falls_back_to_reason() {
        let err = classify_response(json!({ "reason": "INVALID_SIGNATURE" })).unwrap_err();
        assert!(matches!(
            err,
            NagadError::Gateway { ref message, .. } if message == "INVALID_SIGNATURE"
        ));
    }

    #[test]
    fn numeric_reason_is_stringified() {
        let err = classify_response(json!({ "reason": 4001, "message": "Bad IP" })).unwrap_err();
        assert_eq!(err.reason(), Some("4001"));
    }

    #[test]
    fn neither_field_is_success() {
        let body = json!({ "sensitiveData": "abc", "signature": "def" });
        assert_eq!(classify_response(body.clone()).unwrap(), body);
    }

    #[test]
    fn null_and_empty_fields_are_absent() {
        let body = json!({ "callBackUrl": "https://x", "devMessage": null, "reason": "" });
        assert!(classify_response(body).is_ok());
    }

    #[test]
    fn headers_in_stable_order() {
        let headers = RequestHeaders::base("v-0.2.0").with_client("203.0.113.7", "PC_WEB");
        assert_eq!(
            headers.to_pairs(),
            vec![
                ("X-KM-Api-Version", "v-0.2.0".to_string()),
                ("X-KM-IP-V4", "203.0.113.7".to_string()),
                ("X-KM-Client-Type", "PC_WEB".to_string()),
            ]
        );
        assert_eq!(RequestHeaders::base("v-0.2.0").to_pairs().len(), 1);
    }

    /// Hands back canned bodies and remembers what it was asked.
    struct Canned {
        replies: Mutex<VecDeque<Value>>,
        seen: Mutex<Vec<GatewayRequest>>,
    }

    #[async_trait]
    impl HttpTransport for Canned {
        async fn send(&self, request: GatewayRequest) -> Result<Value, NagadError> {
            self.seen.lock().unwrap().push(request);
            self.replies
                .lock()
                .unwrap()
                .pop_front()
                .ok_or_else(|| NagadError::Transport("no canned reply".to_string()))
        }
    }

    fn canned(replies: Vec<Value>) -> TransportClient<Canned> {
        TransportClient::new(Canned {
            replies: Mutex::new(replies.into()),
            seen: Mutex::new(Vec::new()),
        })
    }

    #[tokio::test]
    async fn post_serializes_body_and_classifies() {
        let client = canned(vec![json!({ "reason": "X", "message": "nope" })]);
        let result = client
            .post(
                "http://gw/api",
                &json!({ "a": 1 }),
                RequestHeaders::base("v1"),
            )
            .await;
        assert!(result.unwrap_err().is_gateway_rejection());

        let seen = client.inner().seen.lock().unwrap();
        assert_eq!(seen[0].method, Method::Post);
        assert_eq!(seen[0].body, Some(json!({ "a": 1 })));
    }

    #[tokio::test]
    async fn get_sends_no_body() {
        let client = canned(vec![json!({ "status": "Success" })]);
        let body = client
            .get("http://gw/verify", RequestHeaders::base("v1"))
            .await
            .unwrap();
        assert_eq!(body["status"], "Success");

        let seen = client.inner().seen.lock().unwrap();
        assert_eq!(seen[0].method, Method::Get);
        assert!(seen[0].body.is_none());
    }

    #[tokio::test]
    async fn transport_failures_pass_through() {
        let client = canned(vec![]);
        let err = client
            .get("http://gw/verify", RequestHeaders::base("v1"))
            .await
            .unwrap_err();
        assert!(matches!(err, NagadError::Transport(_)));
    }
}
