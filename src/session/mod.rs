//! Credential store for the current client session.
//!
//! The store is the single source of truth for "is anyone logged in, and with
//! what credential". It owns:
//! - the serialized [`Session`] in a durable slot under [`SESSION_KEY`], written
//!   with a short fixed expiry
//! - an ephemeral slot for the display skin ([`SKIN_KEY`]) and the
//!   redirect-return marker ([`RETURN_MARKER_KEY`])
//! - a broadcast channel announcing successful logins to other listeners
//!
//! `CredentialStore` is cheap to clone; all clones share the same slots, so it
//! can be handed to the gateway and to every caller that needs to read it.

mod preferences;
mod slot;

pub use preferences::Skin;
pub use slot::{DurableSlot, EphemeralSlot, FileSlot, MemorySlot};

use chrono::Duration;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::broadcast;

/// Durable slot key holding the serialized session.
pub const SESSION_KEY: &str = "user";
/// Ephemeral slot key holding the display skin.
pub const SKIN_KEY: &str = "skin";
/// Ephemeral slot key holding the redirect-return marker.
pub const RETURN_MARKER_KEY: &str = "baseUrl";
/// Name of the channel login signals are published on.
pub const SESSION_CHANNEL: &str = "my-channel";
/// Role id denoting an administrator.
pub const ADMIN_ROLE_ID: i32 = 1;
/// Default lifetime of a stored session, in seconds.
pub const DEFAULT_SESSION_TTL_SECS: i64 = 60 * 60;

const LOGIN_CHANNEL_CAPACITY: usize = 16;

/// Errors raised by the credential store.
#[derive(Debug, Error)]
pub enum SessionError {
    /// The durable slot holds a value that is not a serialized session.
    #[error("Stored session under '{key}' is corrupt: {source}")]
    Corrupt {
        key: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Failed to serialize session: {0}")]
    Serialize(#[source] serde_json::Error),

    #[error("Credential jar {} is unreadable: {source}", .path.display())]
    Jar {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Credential storage I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Authenticated identity of the current client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    /// Opaque bearer token sent as the `Authorization` header.
    pub token: String,
    #[serde(default, alias = "id", skip_serializing_if = "Option::is_none")]
    pub user_id: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role_id: Option<i32>,
    #[serde(default)]
    pub role_list: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nickname: Option<String>,
    #[serde(default, alias = "avatarUrl", skip_serializing_if = "Option::is_none")]
    pub avatar: Option<String>,
}

impl Session {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
            user_id: None,
            role_id: None,
            role_list: Vec::new(),
            nickname: None,
            avatar: None,
        }
    }

    pub fn is_admin(&self) -> bool {
        self.role_id == Some(ADMIN_ROLE_ID)
    }

    /// Coarse role check over `role_list`, see [`has_permission`].
    pub fn has_role(&self, required: &str) -> bool {
        has_permission(&self.role_list, Some(required))
    }
}

/// Published on [`SESSION_CHANNEL`] after a successful login.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoginSignal {
    /// The serialized session, as written to the durable slot.
    pub user_value: String,
}

/// Coarse permission check over a flat list of granted strings.
///
/// Matches when `required` is empty, or when some granted entry contains it
/// as a substring (`"read"` matches `"user:read"`). A missing requirement never
/// matches.
pub fn has_permission<I, S>(granted: I, required: Option<&str>) -> bool
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let Some(required) = required else {
        return false;
    };
    if required.is_empty() {
        return true;
    }
    granted
        .into_iter()
        .any(|perm| perm.as_ref().contains(required))
}

#[derive(Debug, Clone)]
pub struct CredentialStore {
    durable: Arc<dyn DurableSlot>,
    ephemeral: Arc<EphemeralSlot>,
    ttl: Duration,
    login_tx: broadcast::Sender<LoginSignal>,
}

impl CredentialStore {
    pub fn new(durable: Arc<dyn DurableSlot>, ttl: Duration) -> Self {
        let (login_tx, _) = broadcast::channel(LOGIN_CHANNEL_CAPACITY);
        Self {
            durable,
            ephemeral: Arc::new(EphemeralSlot::new()),
            ttl,
            login_tx,
        }
    }

    /// Store backed by [`MemorySlot`] with the default one-hour lifetime.
    pub fn in_memory() -> Self {
        Self::new(
            Arc::new(MemorySlot::new()),
            Duration::seconds(DEFAULT_SESSION_TTL_SECS),
        )
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Read the current session.
    ///
    /// An absent, empty or `null` value means nobody is logged in. Any other
    /// value that fails to parse is reported as [`SessionError::Corrupt`]
    /// rather than treated as logged out.
    pub fn get_session(&self) -> Result<Option<Session>, SessionError> {
        let Some(raw) = self.durable.get(SESSION_KEY)? else {
            return Ok(None);
        };
        if raw.trim().is_empty() {
            return Ok(None);
        }
        serde_json::from_str::<Option<Session>>(&raw).map_err(|source| SessionError::Corrupt {
            key: SESSION_KEY.to_string(),
            source,
        })
    }

    /// Replace the stored session, restarting its expiry.
    pub fn set_session(&self, session: &Session) -> Result<(), SessionError> {
        let raw = serde_json::to_string(session).map_err(SessionError::Serialize)?;
        self.durable.set(SESSION_KEY, &raw, self.ttl)?;
        tracing::debug!(
            user_id = ?session.user_id,
            ttl_secs = self.ttl.num_seconds(),
            "Session stored"
        );
        Ok(())
    }

    /// Remove the stored session. Idempotent.
    pub fn clear_session(&self) -> Result<(), SessionError> {
        self.durable.remove(SESSION_KEY)?;
        tracing::debug!("Session cleared");
        Ok(())
    }

    /// Persist a freshly authenticated session and announce it on
    /// [`SESSION_CHANNEL`].
    pub fn login(&self, session: &Session) -> Result<(), SessionError> {
        self.set_session(session)?;
        let user_value = serde_json::to_string(session).map_err(SessionError::Serialize)?;
        // Err only when nobody is subscribed.
        let receivers = self.login_tx.send(LoginSignal { user_value }).unwrap_or(0);
        tracing::info!(
            channel = SESSION_CHANNEL,
            receivers,
            user_id = ?session.user_id,
            "Login broadcast"
        );
        Ok(())
    }

    pub fn logout(&self) -> Result<(), SessionError> {
        self.clear_session()
    }

    /// Listen for login signals published by any clone of this store.
    pub fn subscribe(&self) -> broadcast::Receiver<LoginSignal> {
        self.login_tx.subscribe()
    }

    pub fn get_preference(&self, key: &str) -> Option<String> {
        self.ephemeral.get(key)
    }

    pub fn set_preference(&self, key: &str, value: &str) {
        self.ephemeral.set(key, value);
    }

    /// Current skin, [`Skin::Shallow`] when unset or unrecognised.
    pub fn skin(&self) -> Skin {
        self.get_preference(SKIN_KEY)
            .and_then(|s| s.parse().ok())
            .unwrap_or_default()
    }

    pub fn set_skin(&self, skin: Skin) {
        self.set_preference(SKIN_KEY, skin.as_str());
    }

    /// Where the user was before a login handoff. Not cleared on read.
    pub fn return_marker(&self) -> Option<String> {
        self.get_preference(RETURN_MARKER_KEY)
    }

    pub fn set_return_marker(&self, marker: &str) {
        self.set_preference(RETURN_MARKER_KEY, marker);
    }
}
