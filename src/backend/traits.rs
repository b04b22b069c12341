//! Trait seams for the two backend facets.
//!
//! The session controller holds `Arc<dyn AuthBackend>` and
//! `Arc<dyn ItemStore>`; [`crate::backend::HttpBackend`] implements both
//! against the hosted backend, and tests substitute an in-memory mock.

use async_trait::async_trait;
use tokio::sync::broadcast;

use super::types::{AuthEvent, AuthProviderInfo, AuthSession, ProviderCredential, TodoItem};
use super::BackendError;

/// Authentication facet of the backend.
#[async_trait]
pub trait AuthBackend: Send + Sync {
    /// Fetch which login providers the application has configured.
    async fn fetch_auth_providers(&self) -> Result<AuthProviderInfo, BackendError>;

    /// Exchange a provider credential for a backend session.
    async fn login_with_credential(
        &self,
        credential: ProviderCredential,
    ) -> Result<AuthSession, BackendError>;

    /// End the current session. Idempotent; emits [`AuthEvent::LoggedOut`]
    /// on the notification channel when a session was actually ended.
    async fn logout(&self) -> Result<(), BackendError>;

    /// Whether a session is currently held.
    fn is_authenticated(&self) -> bool;

    /// User id of the current session, if any.
    fn current_user(&self) -> Option<String>;

    /// Subscribe to login/logout notifications.
    fn subscribe(&self) -> broadcast::Receiver<AuthEvent>;
}

/// Item document store facet of the backend.
#[async_trait]
pub trait ItemStore: Send + Sync {
    /// Fetch the full current set of items owned by `owner_id`.
    async fn find_items(&self, owner_id: &str) -> Result<Vec<TodoItem>, BackendError>;

    /// Insert a new, unchecked item for `owner_id`.
    async fn insert_item(&self, owner_id: &str, text: &str) -> Result<(), BackendError>;

    /// Persist a checkbox toggle for a single item.
    async fn set_checked(&self, item_id: &str, checked: bool) -> Result<(), BackendError>;

    /// Delete every item matching `{owner_id, checked: true}`. Returns the
    /// number of items removed.
    async fn delete_checked(&self, owner_id: &str) -> Result<u64, BackendError>;
}
