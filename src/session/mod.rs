//! Session controller: the login-state machine gating the todo view.
//!
//! Sequences the login flow against the backend, switches between the
//! login and todo screens, owns the polling refresher for the current
//! login epoch, and executes the item actions.
//!
//! ## Staleness guard
//!
//! Every asynchronous completion (login exchange, list fetch) captures the
//! *epoch* it started under. The epoch is bumped on every transition into
//! or out of an authenticated session, and completions are validated
//! against it under a single lock acquisition before they may change state
//! or touch the view. A logout racing an in-flight call therefore makes
//! the call's effects vanish instead of landing on a torn-down screen.

pub mod refresher;

use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::backend::{AuthBackend, AuthEvent, AuthProviderInfo, ItemStore, ProviderCredential};
use crate::ui::TodoView;
use refresher::RefresherHandle;

// ── Session state machine ────────────────────────────────────────

/// Authentication state, driven exclusively by explicit transitions.
///
/// `Unauthenticated → Authenticating → Authenticated` on login,
/// `Authenticating → Unauthenticated` on failure, and any state
/// `→ Unauthenticated` on logout. No terminal state; the cycle repeats
/// for the process lifetime.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionState {
    Unauthenticated,
    Authenticating,
    Authenticated { user_id: String },
}

impl SessionState {
    pub fn is_authenticated(&self) -> bool {
        matches!(self, Self::Authenticated { .. })
    }

    /// User id of the authenticated session, if any.
    pub fn user_id(&self) -> Option<&str> {
        match self {
            Self::Authenticated { user_id } => Some(user_id),
            _ => None,
        }
    }

    /// `Unauthenticated → Authenticating`. Returns false from any other
    /// state (a login attempt is already running, or one is active).
    pub fn begin_authentication(&mut self) -> bool {
        if *self == Self::Unauthenticated {
            *self = Self::Authenticating;
            true
        } else {
            false
        }
    }

    /// `Authenticating → Authenticated`.
    pub fn complete_authentication(&mut self, user_id: String) -> bool {
        if *self == Self::Authenticating {
            *self = Self::Authenticated { user_id };
            true
        } else {
            false
        }
    }

    /// `Authenticating → Unauthenticated`.
    pub fn fail_authentication(&mut self) -> bool {
        if *self == Self::Authenticating {
            *self = Self::Unauthenticated;
            true
        } else {
            false
        }
    }

    /// Any state `→ Unauthenticated`. Returns whether anything changed.
    pub fn log_out(&mut self) -> bool {
        if *self == Self::Unauthenticated {
            false
        } else {
            *self = Self::Unauthenticated;
            true
        }
    }
}

// ── Controller ───────────────────────────────────────────────────

struct Inner {
    state: SessionState,
    /// Bumped on every transition into or out of a session; async
    /// completions are discarded when their captured epoch is stale.
    epoch: u64,
    /// Provider configuration from the last successful `start()`.
    providers: Option<AuthProviderInfo>,
    refresher: Option<RefresherHandle>,
}

struct Shared {
    auth: Arc<dyn AuthBackend>,
    store: Arc<dyn ItemStore>,
    view: Arc<dyn TodoView>,
    refresh_interval: Duration,
    inner: Mutex<Inner>,
}

/// Owns the backend handles and the view, and drives the session
/// lifecycle. Cheap to clone; clones share one controller.
#[derive(Clone)]
pub struct SessionController {
    shared: Arc<Shared>,
}

impl SessionController {
    pub fn new(
        auth: Arc<dyn AuthBackend>,
        store: Arc<dyn ItemStore>,
        view: Arc<dyn TodoView>,
        refresh_interval: Duration,
    ) -> Self {
        Self {
            shared: Arc::new(Shared {
                auth,
                store,
                view,
                refresh_interval,
                inner: Mutex::new(Inner {
                    state: SessionState::Unauthenticated,
                    epoch: 0,
                    providers: None,
                    refresher: None,
                }),
            }),
        }
    }

    // ── Login flow ───────────────────────────────────────────────

    /// Begin (or return to) the login flow: fetch the provider
    /// configuration and present the matching screen. An existing backend
    /// session skips the login screen entirely.
    ///
    /// On fetch failure the login screen is left inert: the error is
    /// logged and no retry is scheduled.
    pub async fn start(&self) {
        match self.shared.auth.fetch_auth_providers().await {
            Ok(info) => {
                if self.shared.auth.is_authenticated() {
                    if let Some(user_id) = self.shared.auth.current_user() {
                        let epoch = {
                            let mut g = self.shared.inner.lock();
                            g.providers = Some(info);
                            g.epoch += 1;
                            g.state = SessionState::Authenticated {
                                user_id: user_id.clone(),
                            };
                            g.epoch
                        };
                        tracing::info!(user = %user_id, "existing session restored");
                        self.enter_todo_view(epoch);
                        return;
                    }
                }

                let names = info.provider_names();
                self.shared.inner.lock().providers = Some(info);
                self.shared.view.show_login(&names);
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to fetch auth provider configuration");
                self.shared.inner.lock().providers = None;
                self.shared.view.show_login(&[]);
            }
        }
    }

    /// Exchange a provider credential for a backend session and, on
    /// success, enter the todo view. On failure the state returns to
    /// unauthenticated and the login screen stays up.
    pub async fn login_with(&self, credential: ProviderCredential) {
        let provider = credential.provider();
        let epoch = {
            let mut g = self.shared.inner.lock();
            if !g.state.begin_authentication() {
                tracing::debug!(provider, "login ignored in state {:?}", g.state);
                return;
            }
            g.epoch += 1;
            g.epoch
        };

        match self.shared.auth.login_with_credential(credential).await {
            Ok(session) => {
                let entered = {
                    let mut g = self.shared.inner.lock();
                    if g.epoch == epoch {
                        g.state.complete_authentication(session.user_id.clone())
                    } else {
                        tracing::debug!(provider, "discarding stale login completion");
                        false
                    }
                };
                if entered {
                    tracing::info!(provider, user = %session.user_id, "logged in");
                    self.enter_todo_view(epoch);
                }
            }
            Err(e) => {
                tracing::error!(provider, error = %e, "login failed");
                let mut g = self.shared.inner.lock();
                if g.epoch == epoch {
                    g.state.fail_authentication();
                }
            }
        }
    }

    /// Show the todo screen and install the polling refresher for this
    /// epoch, stopping any previous loop. If a teardown raced the caller,
    /// the freshly spawned loop is stopped instead of installed.
    fn enter_todo_view(&self, epoch: u64) {
        let cancel = CancellationToken::new();
        let task = refresher::spawn(
            self.clone(),
            epoch,
            cancel.clone(),
            self.shared.refresh_interval,
        );
        let handle = RefresherHandle::new(cancel, task);

        let stale = {
            let mut g = self.shared.inner.lock();
            if g.epoch == epoch && g.state.is_authenticated() {
                self.shared.view.show_todo_list();
                g.refresher.replace(handle)
            } else {
                Some(handle)
            }
        };
        if let Some(h) = stale {
            h.stop();
        }
    }

    // ── Logout ───────────────────────────────────────────────────

    /// User-initiated logout: tear down the view and refresher, then end
    /// the backend session. The backend's `LoggedOut` notification re-runs
    /// the login flow via [`Self::on_logout`].
    pub async fn logout(&self) {
        self.teardown();
        if let Err(e) = self.shared.auth.logout().await {
            tracing::error!(error = %e, "logout failed");
        }
    }

    /// React to the session ending: cancel the pending refresher (if any)
    /// and return to the login flow. Idempotent, and safe to call with no
    /// refresher pending.
    pub async fn on_logout(&self) {
        if !self.teardown() {
            tracing::debug!("logout notification with no active session");
        }
        self.start().await;
    }

    /// Atomically leave the session: bump the epoch, reset the state, and
    /// take the refresher handle, all under one lock acquisition, so no
    /// in-flight completion can publish once this returns.
    fn teardown(&self) -> bool {
        let (changed, handle) = {
            let mut g = self.shared.inner.lock();
            let changed = g.state.log_out();
            if changed {
                g.epoch += 1;
            }
            (changed, g.refresher.take())
        };
        if let Some(h) = handle {
            h.stop();
        }
        changed
    }

    /// Listen for backend auth notifications for the process lifetime.
    pub fn spawn_auth_listener(&self) -> JoinHandle<()> {
        let controller = self.clone();
        let mut events = controller.shared.auth.subscribe();
        tokio::spawn(async move {
            loop {
                match events.recv().await {
                    Ok(AuthEvent::LoggedIn { user_id }) => {
                        tracing::debug!(user = %user_id, "backend session established");
                    }
                    Ok(AuthEvent::LoggedOut) => controller.on_logout().await,
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        tracing::warn!(skipped, "auth event stream lagged");
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
        })
    }

    // ── Refresh ──────────────────────────────────────────────────

    /// One fetch-and-publish cycle for the given epoch. Returns whether a
    /// list update was published.
    pub(crate) async fn refresh_once(&self, epoch: u64) -> bool {
        let owner = {
            let g = self.shared.inner.lock();
            if g.epoch != epoch {
                return false;
            }
            match g.state.user_id() {
                Some(user) => user.to_string(),
                None => return false,
            }
        };

        match self.shared.store.find_items(&owner).await {
            Ok(items) => {
                // The staleness check and the publish happen under one
                // lock acquisition so a racing logout cannot interleave.
                let g = self.shared.inner.lock();
                if g.epoch == epoch && g.state.is_authenticated() {
                    self.shared.view.replace_items(&items);
                    true
                } else {
                    tracing::debug!("discarding refresh for stale session");
                    false
                }
            }
            Err(e) => {
                tracing::warn!(error = %e, "list refresh failed");
                false
            }
        }
    }

    /// One immediate out-of-band refresh, independent of the polling
    /// cadence. No-op when unauthenticated.
    pub async fn refresh_now(&self) {
        let epoch = self.shared.inner.lock().epoch;
        self.refresh_once(epoch).await;
    }

    // ── Item actions ─────────────────────────────────────────────
    //
    // All three are fire-and-forget: failures are logged and dropped, and
    // the refresh triggered on success is the only caller feedback.

    /// Insert a new item for the current user, then refresh.
    pub async fn add_item(&self, text: &str) {
        let text = text.trim();
        if text.is_empty() {
            return;
        }
        let Some(owner) = self.current_owner() else {
            tracing::debug!("add ignored: not authenticated");
            return;
        };

        match self.shared.store.insert_item(&owner, text).await {
            Ok(()) => {
                tracing::debug!(text, "item added");
                self.refresh_now().await;
            }
            Err(e) => tracing::error!(error = %e, "failed to add item"),
        }
    }

    /// Delete all of the current user's checked items, then refresh.
    pub async fn clear_checked(&self) {
        let Some(owner) = self.current_owner() else {
            tracing::debug!("clear ignored: not authenticated");
            return;
        };

        match self.shared.store.delete_checked(&owner).await {
            Ok(removed) => {
                tracing::debug!(removed, "checked items cleared");
                self.refresh_now().await;
            }
            Err(e) => tracing::error!(error = %e, "failed to clear checked items"),
        }
    }

    /// Persist a checkbox toggle, then refresh.
    pub async fn set_checked(&self, item_id: &str, checked: bool) {
        if self.current_owner().is_none() {
            tracing::debug!("toggle ignored: not authenticated");
            return;
        }

        match self.shared.store.set_checked(item_id, checked).await {
            Ok(()) => {
                tracing::debug!(item_id, checked, "item toggled");
                self.refresh_now().await;
            }
            Err(e) => tracing::error!(error = %e, "failed to toggle item"),
        }
    }

    // ── Introspection ────────────────────────────────────────────

    pub fn is_authenticated(&self) -> bool {
        self.shared.inner.lock().state.is_authenticated()
    }

    /// Provider configuration from the last successful `start()`.
    pub fn providers(&self) -> Option<AuthProviderInfo> {
        self.shared.inner.lock().providers.clone()
    }

    /// Whether a refresher loop is currently installed and running.
    pub fn is_polling(&self) -> bool {
        self.shared
            .inner
            .lock()
            .refresher
            .as_ref()
            .map(|h| !h.is_finished())
            .unwrap_or(false)
    }

    fn current_owner(&self) -> Option<String> {
        self.shared
            .inner
            .lock()
            .state
            .user_id()
            .map(str::to_string)
    }
}

// ── Tests ────────────────────────────────────────────────────────
