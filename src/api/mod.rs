//! Typed calls against the public blog backend.
//!
//! Every method builds one [`RequestEnvelope`] and sends it through the
//! [`Gateway`], so authentication, error classification and notifications
//! are handled in one place. Payloads whose shape the caller does not need
//! are returned as raw [`serde_json::Value`].

pub mod auth;
pub mod content;

pub use auth::{EmailLogin, EmailRegister};
pub use content::{ArticleQuery, ArticleSummary};

use serde::Deserialize;
use serde_json::Value;

use crate::gateway::{Gateway, GatewayError, RequestEnvelope};
use crate::session::CredentialStore;

/// One page of a paginated listing.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    #[serde(default = "Vec::new")]
    pub records: Vec<T>,
    #[serde(default)]
    pub total: i64,
}

/// Client for the blog's `/v1` API.
#[derive(Clone)]
pub struct BlogApi {
    gateway: Gateway,
}

impl BlogApi {
    pub fn new(gateway: Gateway) -> Self {
        Self { gateway }
    }

    pub fn gateway(&self) -> &Gateway {
        &self.gateway
    }

    pub fn store(&self) -> &CredentialStore {
        self.gateway.store()
    }

    async fn send(&self, request: RequestEnvelope) -> Result<Value, GatewayError> {
        self.gateway.send(request).await
    }
}
