//! Session-aware request gateway.
//!
//! Every call to the backend passes through [`Gateway::send`]:
//! 1. the stored session (if any) is read and its token attached as the
//!    `Authorization` header
//! 2. the request is sent with the configured transport timeout
//! 3. the response is classified into a [`ResponseOutcome`]
//! 4. side effects are applied: nothing on success, session handling on a
//!    401 business code, an error toast on any other failure
//!
//! Every failure reaches the caller exactly once as a [`GatewayError`]. There
//! are no retries, no de-duplication and no cancellation: concurrent calls
//! race freely, and a call already in flight completes with whatever token it
//! was sent with even if another call clears the session meanwhile.

mod envelope;
mod error;

pub use envelope::{
    send_error_message, status_failure_message, Method, RequestEnvelope, ResponseEnvelope,
    ResponseOutcome,
};
pub use error::GatewayError;

use reqwest::header::AUTHORIZATION;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;

use crate::config::{AuthFailurePolicy, Config};
use crate::notifications::{Notice, Notifier};
use crate::session::CredentialStore;

/// Business code of a successful call.
pub const OK_CODE: i64 = 200;
/// Business code of an invalid or expired session.
pub const UNAUTHENTICATED_CODE: i64 = 401;
/// Used when a rejection carries no message of its own.
pub const FALLBACK_MESSAGE: &str = "Error";
/// Used when a request received no response at all.
pub const NETWORK_ERROR_MESSAGE: &str =
    "Network error: please check your connection or whether the backend service is running";
/// Last resort when an error has no text.
pub const GENERIC_FAILURE_MESSAGE: &str = "Request failed";

/// Transport-level settings for a [`Gateway`].
#[derive(Debug, Clone)]
pub struct GatewayOptions {
    pub base_url: String,
    pub timeout: Duration,
    pub auth_failure_policy: AuthFailurePolicy,
}

impl GatewayOptions {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            timeout: Duration::from_secs(36),
            auth_failure_policy: AuthFailurePolicy::default(),
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self {
            base_url: config.api.base_url.clone(),
            timeout: config.api.timeout(),
            auth_failure_policy: config.auth.failure_policy,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_auth_failure_policy(mut self, policy: AuthFailurePolicy) -> Self {
        self.auth_failure_policy = policy;
        self
    }
}

#[derive(Clone)]
pub struct Gateway {
    client: Client,
    options: GatewayOptions,
    store: CredentialStore,
    notifier: Arc<dyn Notifier>,
}

impl Gateway {
    pub fn new(
        options: GatewayOptions,
        store: CredentialStore,
        notifier: Arc<dyn Notifier>,
    ) -> Result<Self, GatewayError> {
        let client = Client::builder()
            .timeout(options.timeout)
            .build()
            .map_err(GatewayError::Client)?;

        Ok(Self {
            client,
            options,
            store,
            notifier,
        })
    }

    pub fn store(&self) -> &CredentialStore {
        &self.store
    }

    pub fn options(&self) -> &GatewayOptions {
        &self.options
    }

    /// Send a request and return the unwrapped `data` of a successful
    /// response.
    pub async fn send(&self, request: RequestEnvelope) -> Result<Value, GatewayError> {
        let outcome = self.dispatch(&request).await?;
        self.settle(&request, outcome).await
    }

    /// Like [`Gateway::send`], decoding `data` into `T`.
    pub async fn send_as<T: DeserializeOwned>(
        &self,
        request: RequestEnvelope,
    ) -> Result<T, GatewayError> {
        let data = self.send(request).await?;
        serde_json::from_value(data).map_err(|e| GatewayError::Decode {
            message: e.to_string(),
        })
    }

    /// Attach credentials, send, and classify. No side effects besides
    /// reading the session.
    pub async fn dispatch(&self, request: &RequestEnvelope) -> Result<ResponseOutcome, GatewayError> {
        let session = self.store.get_session()?;
        let url = request.resolve(&self.options.base_url);

        let mut builder = self.client.request(request.method.into(), &url);
        if let Some(session) = &session {
            builder = builder.header(AUTHORIZATION, session.token.as_str());
        }
        let query = request.query_pairs();
        if !query.is_empty() {
            builder = builder.query(&query);
        }
        if let Some(data) = &request.data {
            builder = builder.json(data);
        }

        tracing::debug!(
            method = %request.method,
            url = %url,
            authenticated = session.is_some(),
            "Sending request"
        );

        let response = match builder.send().await {
            Ok(response) => response,
            Err(e) => {
                tracing::error!(method = %request.method, url = %url, error = %e, "Request failed without a response");
                return Ok(ResponseOutcome::from_send_error(&e));
            }
        };

        let status = response.status();
        let body = match response.text().await {
            Ok(body) => body,
            Err(e) => {
                tracing::warn!(url = %url, status = status.as_u16(), error = %e, "Failed to read response body");
                String::new()
            }
        };

        Ok(ResponseOutcome::from_response(
            status.as_u16(),
            status.canonical_reason(),
            &body,
        ))
    }

    /// Apply the side effects of an outcome and turn it into the caller's
    /// result.
    pub async fn settle(
        &self,
        request: &RequestEnvelope,
        outcome: ResponseOutcome,
    ) -> Result<Value, GatewayError> {
        match outcome {
            ResponseOutcome::Succeeded(data) => Ok(data),
            ResponseOutcome::AuthenticationExpired { message } => {
                tracing::warn!(url = %request.url, message = %message, "Session expired");
                self.expire_session(&message).await;
                Err(GatewayError::AuthenticationExpired { message })
            }
            ResponseOutcome::BusinessRejection { code, message } => {
                tracing::warn!(url = %request.url, code = ?code, message = %message, "Request rejected");
                self.notifier.notify(Notice::error(message.clone()));
                Err(GatewayError::BusinessRejection { code, message })
            }
            ResponseOutcome::TransportFailure { status, message } => {
                tracing::error!(url = %request.url, status = ?status, message = %message, "Transport failure");
                self.notifier.notify(Notice::error(message.clone()));
                Err(GatewayError::Transport { message, status })
            }
        }
    }

    async fn expire_session(&self, message: &str) {
        let clear = match self.options.auth_failure_policy {
            AuthFailurePolicy::Clear => true,
            AuthFailurePolicy::Confirm => {
                self.notifier.notify(Notice::error(message));
                self.notifier.confirm_relogin(message).await
            }
        };
        if !clear {
            tracing::info!("Relogin declined, keeping stored session");
            return;
        }
        if let Err(e) = self.store.clear_session() {
            tracing::error!(error = %e, "Failed to clear expired session");
        }
    }
}
