pub mod api;
pub mod cli;
pub mod config;
pub mod gateway;
pub mod notifications;
pub mod session;

#[cfg(test)]
pub(crate) mod test_support;

pub use api::BlogApi;
pub use config::{AuthFailurePolicy, Config};
pub use gateway::{Gateway, GatewayError, GatewayOptions, RequestEnvelope, ResponseOutcome};
pub use notifications::{Notice, NoticeLevel, Notifier};
pub use session::{has_permission, CredentialStore, Session, SessionError};
