//! Client layer for the hosted backend.
//!
//! The backend exposes two facets consumed by the session controller:
//! authentication (provider discovery, credential exchange, logout, a
//! login/logout notification channel) and the item document store (full
//! fetch, insert, checkbox update, bulk delete of checked items). Both are
//! trait seams so tests can substitute an in-memory backend.

pub mod http;
pub mod traits;
pub mod types;

pub use http::HttpBackend;
pub use traits::{AuthBackend, ItemStore};
pub use types::{
    AuthEvent, AuthProviderInfo, AuthSession, FacebookProviderConfig, GoogleProviderConfig,
    ProviderCredential, TodoItem,
};

/// Errors surfaced by the backend client.
///
/// Callers apply a uniform log-and-drop policy: every variant is logged
/// and the operation is abandoned without retry.
#[derive(Debug, thiserror::Error)]
pub enum BackendError {
    #[error("http transport error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("backend returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("not authenticated")]
    NotAuthenticated,
}
