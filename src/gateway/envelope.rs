//! Wire envelopes and response classification.
//!
//! Every backend body has the shape `{ code, message?, data? }`. The business
//! `code` is independent of the HTTP status: a 2xx response can still carry a
//! rejection, so 2xx bodies are classified by `code` first.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

use super::{
    FALLBACK_MESSAGE, GENERIC_FAILURE_MESSAGE, NETWORK_ERROR_MESSAGE, OK_CODE,
    UNAUTHENTICATED_CODE,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
    Put,
    Delete,
}

impl From<Method> for reqwest::Method {
    fn from(method: Method) -> Self {
        match method {
            Method::Get => reqwest::Method::GET,
            Method::Post => reqwest::Method::POST,
            Method::Put => reqwest::Method::PUT,
            Method::Delete => reqwest::Method::DELETE,
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Method::Get => write!(f, "GET"),
            Method::Post => write!(f, "POST"),
            Method::Put => write!(f, "PUT"),
            Method::Delete => write!(f, "DELETE"),
        }
    }
}

/// One outbound call: target path, method, query parameters and body.
#[derive(Debug, Clone, PartialEq)]
pub struct RequestEnvelope {
    pub url: String,
    pub method: Method,
    pub params: Option<Value>,
    pub data: Option<Value>,
}

impl RequestEnvelope {
    pub fn new(method: Method, url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            method,
            params: None,
            data: None,
        }
    }

    pub fn get(url: impl Into<String>) -> Self {
        Self::new(Method::Get, url)
    }

    pub fn post(url: impl Into<String>) -> Self {
        Self::new(Method::Post, url)
    }

    pub fn put(url: impl Into<String>) -> Self {
        Self::new(Method::Put, url)
    }

    pub fn delete(url: impl Into<String>) -> Self {
        Self::new(Method::Delete, url)
    }

    pub fn params(mut self, params: Value) -> Self {
        self.params = Some(params);
        self
    }

    pub fn data(mut self, data: Value) -> Self {
        self.data = Some(data);
        self
    }

    /// Query pairs from `params`. Nulls are skipped, strings are sent
    /// verbatim and other scalars as their JSON text.
    pub fn query_pairs(&self) -> Vec<(String, String)> {
        let Some(Value::Object(map)) = &self.params else {
            return Vec::new();
        };
        map.iter()
            .filter_map(|(key, value)| match value {
                Value::Null => None,
                Value::String(s) => Some((key.clone(), s.clone())),
                other => Some((key.clone(), other.to_string())),
            })
            .collect()
    }

    /// Resolve the target against `base_url`. Absolute URLs pass through.
    pub fn resolve(&self, base_url: &str) -> String {
        if self.url.starts_with("http://") || self.url.starts_with("https://") {
            return self.url.clone();
        }
        format!(
            "{}/{}",
            base_url.trim_end_matches('/'),
            self.url.trim_start_matches('/')
        )
    }
}

/// Body of every backend response.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResponseEnvelope {
    #[serde(default)]
    pub code: Option<i64>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub data: Option<Value>,
}

impl ResponseEnvelope {
    /// Read the envelope fields out of a parsed body. `None` unless the body
    /// is a JSON object.
    ///
    /// `code` is taken as an integer or a numeric string. A non-string
    /// `message` keeps its JSON text.
    pub fn from_value(body: &Value) -> Option<Self> {
        let fields = body.as_object()?;
        let code = match fields.get("code") {
            Some(Value::Number(n)) => n.as_i64(),
            Some(Value::String(s)) => s.trim().parse().ok(),
            _ => None,
        };
        let message = match fields.get("message") {
            None | Some(Value::Null) => None,
            Some(Value::String(s)) => Some(s.clone()),
            Some(other) => Some(other.to_string()),
        };
        Some(Self {
            code,
            message,
            data: fields.get("data").cloned(),
        })
    }
}

/// Classified result of one call, before any side effect is applied.
#[derive(Debug, Clone, PartialEq)]
pub enum ResponseOutcome {
    /// Business code 200; carries the unwrapped `data` (null when absent).
    Succeeded(Value),
    /// Business code 401.
    AuthenticationExpired { message: String },
    /// Any other business code, or a 2xx body that is not an envelope.
    BusinessRejection { code: Option<i64>, message: String },
    /// Non-2xx status or no response at all.
    TransportFailure { status: Option<u16>, message: String },
}

impl ResponseOutcome {
    pub fn from_envelope(envelope: ResponseEnvelope) -> Self {
        let message = || {
            envelope
                .message
                .clone()
                .filter(|m| !m.is_empty())
                .unwrap_or_else(|| FALLBACK_MESSAGE.to_string())
        };
        match envelope.code {
            Some(OK_CODE) => ResponseOutcome::Succeeded(envelope.data.unwrap_or(Value::Null)),
            Some(UNAUTHENTICATED_CODE) => ResponseOutcome::AuthenticationExpired {
                message: message(),
            },
            code => ResponseOutcome::BusinessRejection {
                code,
                message: message(),
            },
        }
    }

    /// Classify a received response from its HTTP status and raw body.
    pub fn from_response(status: u16, reason: Option<&str>, body: &str) -> Self {
        if !(200..300).contains(&status) {
            return ResponseOutcome::TransportFailure {
                status: Some(status),
                message: status_failure_message(status, reason, body),
            };
        }
        let envelope = serde_json::from_str::<Value>(body)
            .ok()
            .and_then(|value| ResponseEnvelope::from_value(&value));
        match envelope {
            Some(envelope) => Self::from_envelope(envelope),
            None => {
                tracing::warn!(status, "Response body is not an envelope");
                ResponseOutcome::BusinessRejection {
                    code: None,
                    message: FALLBACK_MESSAGE.to_string(),
                }
            }
        }
    }

    /// Failure before any response arrived.
    pub fn from_send_error(error: &reqwest::Error) -> Self {
        ResponseOutcome::TransportFailure {
            status: None,
            message: send_error_message(error),
        }
    }
}

/// Message for a non-2xx response: body `message`, then body `msg`, then a
/// synthesized line with the status.
pub fn status_failure_message(status: u16, reason: Option<&str>, body: &str) -> String {
    let parsed: Option<Value> = serde_json::from_str(body).ok();
    let field = |name: &str| {
        parsed
            .as_ref()
            .and_then(|v| v.get(name))
            .and_then(Value::as_str)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
    };
    field("message")
        .or_else(|| field("msg"))
        .unwrap_or_else(|| {
            format!("Request failed: {} {}", status, reason.unwrap_or(""))
                .trim_end()
                .to_string()
        })
}

/// Message for a request that got no response. Timeouts are not told apart
/// from other network failures; only a request that could not be built keeps
/// its own text.
pub fn send_error_message(error: &reqwest::Error) -> String {
    if error.is_builder() {
        let raw = error.to_string();
        if raw.is_empty() {
            GENERIC_FAILURE_MESSAGE.to_string()
        } else {
            raw
        }
    } else {
        NETWORK_ERROR_MESSAGE.to_string()
    }
}
