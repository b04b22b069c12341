//! HTTP implementation of the backend client.
//!
//! Talks to the hosted backend's REST surface, rooted at
//! `{base_url}/app/{app_id}`:
//!
//! - `GET  /auth/providers` — provider configuration
//! - `POST /auth/login/{provider}` — credential exchange
//! - `POST /auth/logout` — server-side session invalidation
//! - `GET  /items?user=eq.{id}` — full item fetch for a user
//! - `POST /items` — insert one item
//! - `PATCH /items?_id=eq.{id}` — checkbox update
//! - `DELETE /items?user=eq.{id}&checked=eq.true` — clear checked items
//!
//! The client holds the current [`AuthSession`] and broadcasts
//! [`AuthEvent`]s on login and logout; the session controller subscribes
//! to drive view teardown.

use parking_lot::Mutex;
use std::time::Duration;
use tokio::sync::broadcast;

use async_trait::async_trait;

use super::traits::{AuthBackend, ItemStore};
use super::types::{AuthEvent, AuthProviderInfo, AuthSession, ProviderCredential, TodoItem};
use super::BackendError;
use crate::config::BackendConfig;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Buffered auth notifications before slow subscribers start lagging.
const EVENT_CHANNEL_CAPACITY: usize = 16;

/// HTTP client for the hosted backend, implementing both facets.
pub struct HttpBackend {
    base_url: String,
    app_id: String,
    http: reqwest::Client,
    session: Mutex<Option<AuthSession>>,
    events: broadcast::Sender<AuthEvent>,
}

impl HttpBackend {
    pub fn new(config: &BackendConfig) -> Result<Self, BackendError> {
        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()?;
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);

        Ok(Self {
            base_url: config.base_url.trim_end_matches('/').to_string(),
            app_id: config.app_id.clone(),
            http,
            session: Mutex::new(None),
            events,
        })
    }

    /// Build an application-scoped URL.
    fn app_url(&self, path: &str) -> String {
        format!("{}/app/{}{}", self.base_url, self.app_id, path)
    }

    /// Bearer token of the current session.
    fn bearer_token(&self) -> Result<String, BackendError> {
        self.session
            .lock()
            .as_ref()
            .map(|s| s.access_token.clone())
            .ok_or(BackendError::NotAuthenticated)
    }

    /// Map a non-2xx response to [`BackendError::Status`] with its body.
    async fn check(resp: reqwest::Response) -> Result<reqwest::Response, BackendError> {
        let status = resp.status();
        if status.is_success() {
            Ok(resp)
        } else {
            let body = resp.text().await.unwrap_or_default();
            Err(BackendError::Status {
                status: status.as_u16(),
                body,
            })
        }
    }
}

#[async_trait]
impl AuthBackend for HttpBackend {
    async fn fetch_auth_providers(&self) -> Result<AuthProviderInfo, BackendError> {
        let resp = self
            .http
            .get(self.app_url("/auth/providers"))
            .send()
            .await?;
        Ok(Self::check(resp).await?.json().await?)
    }

    async fn login_with_credential(
        &self,
        credential: ProviderCredential,
    ) -> Result<AuthSession, BackendError> {
        let url = self.app_url(&format!("/auth/login/{}", credential.provider()));
        let resp = self
            .http
            .post(url)
            .json(&credential.login_body())
            .send()
            .await?;
        let session: AuthSession = Self::check(resp).await?.json().await?;

        *self.session.lock() = Some(session.clone());
        let _ = self.events.send(AuthEvent::LoggedIn {
            user_id: session.user_id.clone(),
        });
        Ok(session)
    }

    async fn logout(&self) -> Result<(), BackendError> {
        // Idempotent: a second logout finds no session and does nothing.
        let Some(session) = self.session.lock().take() else {
            return Ok(());
        };

        // Server-side invalidation is best-effort; local teardown and the
        // LoggedOut notification proceed regardless.
        match self
            .http
            .post(self.app_url("/auth/logout"))
            .bearer_auth(&session.access_token)
            .send()
            .await
        {
            Ok(resp) if !resp.status().is_success() => {
                tracing::warn!(status = resp.status().as_u16(), "server-side logout rejected");
            }
            Err(e) => tracing::warn!(error = %e, "server-side logout failed"),
            Ok(_) => {}
        }

        let _ = self.events.send(AuthEvent::LoggedOut);
        Ok(())
    }

    fn is_authenticated(&self) -> bool {
        self.session.lock().is_some()
    }

    fn current_user(&self) -> Option<String> {
        self.session.lock().as_ref().map(|s| s.user_id.clone())
    }

    fn subscribe(&self) -> broadcast::Receiver<AuthEvent> {
        self.events.subscribe()
    }
}

#[async_trait]
impl ItemStore for HttpBackend {
    async fn find_items(&self, owner_id: &str) -> Result<Vec<TodoItem>, BackendError> {
        let token = self.bearer_token()?;
        let url = format!("{}?user=eq.{owner_id}", self.app_url("/items"));
        let resp = self.http.get(url).bearer_auth(token).send().await?;
        Ok(Self::check(resp).await?.json().await?)
    }

    async fn insert_item(&self, owner_id: &str, text: &str) -> Result<(), BackendError> {
        let token = self.bearer_token()?;
        let body = serde_json::json!({ "user": owner_id, "text": text });
        let resp = self
            .http
            .post(self.app_url("/items"))
            .bearer_auth(token)
            .json(&body)
            .send()
            .await?;
        Self::check(resp).await?;
        Ok(())
    }

    async fn set_checked(&self, item_id: &str, checked: bool) -> Result<(), BackendError> {
        let token = self.bearer_token()?;
        let url = format!("{}?_id=eq.{item_id}", self.app_url("/items"));
        let resp = self
            .http
            .patch(url)
            .bearer_auth(token)
            .json(&serde_json::json!({ "checked": checked }))
            .send()
            .await?;
        Self::check(resp).await?;
        Ok(())
    }

    async fn delete_checked(&self, owner_id: &str) -> Result<u64, BackendError> {
        let token = self.bearer_token()?;
        let url = format!(
            "{}?user=eq.{owner_id}&checked=eq.true",
            self.app_url("/items")
        );
        let resp = self
            .http
            .delete(url)
            .bearer_auth(token)
            .header("Prefer", "return=representation")
            .send()
            .await?;
        let deleted: Vec<TodoItem> = Self::check(resp).await?.json().await?;
        Ok(deleted.len() as u64)
    }
}

// ── Tests ────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_json, header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn backend_for(server: &MockServer) -> HttpBackend {
        HttpBackend::new(&BackendConfig {
            base_url: server.uri(),
            app_id: "todo".into(),
        })
        .unwrap()
    }

    async fn mount_login(server: &MockServer) {
        Mock::given(method("POST"))
            .and(path("/app/todo/auth/login/facebook"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "user_id": "user-1",
                "access_token": "tok-1",
            })))
            .mount(server)
            .await;
    }

    async fn login(backend: &HttpBackend) {
        backend
            .login_with_credential(ProviderCredential::Facebook {
                access_token: "fb-token".into(),
            })
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn fetch_providers_parses_configuration() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/app/todo/auth/providers"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "facebook": { "app_id": "fb-app", "scopes": ["public_profile"] },
            })))
            .mount(&server)
            .await;

        let backend = backend_for(&server);
        let info = backend.fetch_auth_providers().await.unwrap();
        assert_eq!(info.provider_names(), vec!["Facebook"]);
        assert!(info.google.is_none());
    }

    #[tokio::test]
    async fn login_stores_session_and_notifies() {
        let server = MockServer::start().await;
        mount_login(&server).await;

        let backend = backend_for(&server);
        let mut events = backend.subscribe();
        assert!(!backend.is_authenticated());

        login(&backend).await;

        assert!(backend.is_authenticated());
        assert_eq!(backend.current_user().as_deref(), Some("user-1"));
        assert_eq!(
            events.try_recv().unwrap(),
            AuthEvent::LoggedIn {
                user_id: "user-1".into()
            }
        );
    }

    #[tokio::test]
    async fn login_failure_propagates_status() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/app/todo/auth/login/google"))
            .respond_with(ResponseTemplate::new(401).set_body_string("bad credential"))
            .mount(&server)
            .await;

        let backend = backend_for(&server);
        let err = backend
            .login_with_credential(ProviderCredential::Google {
                auth_code: "nope".into(),
            })
            .await
            .unwrap_err();

        match err {
            BackendError::Status { status, body } => {
                assert_eq!(status, 401);
                assert_eq!(body, "bad credential");
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert!(!backend.is_authenticated());
    }

    #[tokio::test]
    async fn find_items_requires_auth() {
        let server = MockServer::start().await;
        let backend = backend_for(&server);

        let err = backend.find_items("user-1").await.unwrap_err();
        assert!(matches!(err, BackendError::NotAuthenticated));
    }

    #[tokio::test]
    async fn find_items_queries_owner_with_bearer() {
        let server = MockServer::start().await;
        mount_login(&server).await;
        Mock::given(method("GET"))
            .and(path("/app/todo/items"))
            .and(query_param("user", "eq.user-1"))
            .and(header("authorization", "Bearer tok-1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([
                { "_id": "it-1", "user": "user-1", "text": "Buy milk" },
                { "_id": "it-2", "user": "user-1", "text": "Walk dog", "checked": true },
            ])))
            .mount(&server)
            .await;

        let backend = backend_for(&server);
        login(&backend).await;

        let items = backend.find_items("user-1").await.unwrap();
        assert_eq!(items.len(), 2);
        assert!(!items[0].checked);
        assert!(items[1].checked);
    }

    #[tokio::test]
    async fn insert_item_posts_document() {
        let server = MockServer::start().await;
        mount_login(&server).await;
        Mock::given(method("POST"))
            .and(path("/app/todo/items"))
            .and(body_json(serde_json::json!({
                "user": "user-1",
                "text": "Buy milk",
            })))
            .respond_with(ResponseTemplate::new(201))
            .expect(1)
            .mount(&server)
            .await;

        let backend = backend_for(&server);
        login(&backend).await;

        backend.insert_item("user-1", "Buy milk").await.unwrap();
    }

    #[tokio::test]
    async fn set_checked_patches_item() {
        let server = MockServer::start().await;
        mount_login(&server).await;
        Mock::given(method("PATCH"))
            .and(path("/app/todo/items"))
            .and(query_param("_id", "eq.it-1"))
            .and(body_json(serde_json::json!({ "checked": true })))
            .respond_with(ResponseTemplate::new(204))
            .expect(1)
            .mount(&server)
            .await;

        let backend = backend_for(&server);
        login(&backend).await;

        backend.set_checked("it-1", true).await.unwrap();
    }

    #[tokio::test]
    async fn delete_checked_returns_count() {
        let server = MockServer::start().await;
        mount_login(&server).await;
        Mock::given(method("DELETE"))
            .and(path("/app/todo/items"))
            .and(query_param("user", "eq.user-1"))
            .and(query_param("checked", "eq.true"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([
                { "_id": "it-2", "user": "user-1", "text": "Walk dog", "checked": true },
            ])))
            .mount(&server)
            .await;

        let backend = backend_for(&server);
        login(&backend).await;

        assert_eq!(backend.delete_checked("user-1").await.unwrap(), 1);
    }

    #[tokio::test]
    async fn logout_is_idempotent_and_notifies_once() {
        let server = MockServer::start().await;
        mount_login(&server).await;
        Mock::given(method("POST"))
            .and(path("/app/todo/auth/logout"))
            .respond_with(ResponseTemplate::new(200))
            .mount(&server)
            .await;

        let backend = backend_for(&server);
        login(&backend).await;

        let mut events = backend.subscribe();
        backend.logout().await.unwrap();
        assert!(!backend.is_authenticated());
        assert_eq!(events.try_recv().unwrap(), AuthEvent::LoggedOut);

        // Second logout: no session, no event.
        backend.logout().await.unwrap();
        assert!(events.try_recv().is_err());
    }

    #[tokio::test]
    async fn logout_clears_session_even_when_server_rejects() {
        let server = MockServer::start().await;
        mount_login(&server).await;
        Mock::given(method("POST"))
            .and(path("/app/todo/auth/logout"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let backend = backend_for(&server);
        login(&backend).await;

        let mut events = backend.subscribe();
        backend.logout().await.unwrap();
        assert!(!backend.is_authenticated());
        assert_eq!(events.try_recv().unwrap(), AuthEvent::LoggedOut);
    }

    #[test]
    fn app_url_is_scoped_and_trims_trailing_slash() {
        let backend = HttpBackend::new(&BackendConfig {
            base_url: "https://baas.example.com/".into(),
            app_id: "todo".into(),
        })
        .unwrap();
        assert_eq!(
            backend.app_url("/items"),
            "https://baas.example.com/app/todo/items"
        );
    }
}
