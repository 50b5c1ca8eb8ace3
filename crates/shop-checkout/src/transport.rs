//! # Completion Transport
//!
//! The wire contract between the checkout session and the
//! order-completion endpoint: `POST /checkout/{id}/complete` with
//! `{id, lines, actions}`, answered by one of `{error: {text}}`,
//! `{redirect: path}`, `{id: orderId}`, or an opaque order object.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use shop_core::{ActionMeta, CartLine, ShopError, ShopResult};

/// Body of the completion request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompleteRequest {
    /// Checkout session id
    pub id: String,

    /// Cart lines (prices are re-derived server-side)
    pub lines: Vec<CartLine>,

    /// Registered actions with their submitted values
    #[serde(default)]
    pub actions: Vec<ActionMeta>,
}

/// Decoded completion response
#[derive(Debug, Clone, PartialEq)]
pub enum CompleteResponse {
    /// Structured error the session surfaces to the user
    Error { text: String },
    /// Navigate the client to this path
    Redirect(String),
    /// Order created; client navigates to `/order/{id}`
    Created { id: String },
    /// Opaque order payload, returned as-is
    Order(Value),
}

impl CompleteResponse {
    /// Decode the response JSON by shape, matching the endpoint contract.
    /// Anything unrecognized is an opaque order object.
    pub fn from_value(value: Value) -> Self {
        if let Some(text) = value
            .get("error")
            .and_then(|e| e.get("text"))
            .and_then(Value::as_str)
        {
            return CompleteResponse::Error { text: text.into() };
        }
        if let Some(path) = value.get("redirect").and_then(Value::as_str) {
            return CompleteResponse::Redirect(path.into());
        }
        if let Some(id) = value.get("id").and_then(Value::as_str) {
            return CompleteResponse::Created { id: id.into() };
        }
        CompleteResponse::Order(value)
    }
}

/// Issues the order-completion request. The session owns the state
/// machine; the transport owns the wire.
#[async_trait]
pub trait CheckoutTransport: Send + Sync {
    async fn complete(&self, request: &CompleteRequest) -> ShopResult<CompleteResponse>;
}

/// reqwest-backed transport posting to `{base_url}/checkout/{id}/complete`
pub struct HttpTransport {
    client: reqwest::Client,
    base_url: String,
}

impl HttpTransport {
    pub fn new(base_url: impl Into<String>) -> Self {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(30))
            .build()
            .expect("Failed to create HTTP client");

        Self {
            client,
            base_url: base_url.into(),
        }
    }
}

#[async_trait]
impl CheckoutTransport for HttpTransport {
    async fn complete(&self, request: &CompleteRequest) -> ShopResult<CompleteResponse> {
        let url = format!("{}/checkout/{}/complete", self.base_url, request.id);

        let response = self
            .client
            .post(&url)
            .json(request)
            .send()
            .await
            .map_err(|e| ShopError::Network(e.to_string()))?;

        // Error shapes arrive with 4xx/5xx status but a structured body;
        // decode the body either way and let the session sort it out.
        let body: Value = response
            .json()
            .await
            .map_err(|e| ShopError::Serialization(e.to_string()))?;

        Ok(CompleteResponse::from_value(body))
    }
}
