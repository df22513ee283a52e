//! Authentication session
//!
//! [`AuthSession`] owns the in-memory authentication state for one process:
//! the current access token and, derived from it, whether the user is
//! authenticated. It is built once at startup and shared as `Arc` with
//! everything that needs to make authenticated calls.
//!
//! State lives in a `tokio::sync::watch` channel. Every write is a single
//! `send_*` call, so the read-modify-write needed to reconcile a late
//! refresh against a login is atomic, and hosts can [`AuthSession::subscribe`]
//! to re-render on changes.

mod refresh;
mod request;

use crate::client::{ApiClient, error::ClientError};
use serde_json::Value;
use std::sync::Arc;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tollgate_core::{
    ClientConfig, Credentials, RefreshFailurePolicy, TokenKey, TokenStore, is_expired,
};
use tracing::{debug, info, warn};

/// Snapshot of the in-memory authentication state
#[derive(Clone, Default, PartialEq, Eq)]
pub struct SessionState {
    access_token: Option<String>,
}

impl SessionState {
    pub const fn unauthenticated() -> Self {
        Self { access_token: None }
    }

    pub fn authenticated(access_token: impl Into<String>) -> Self {
        Self {
            access_token: Some(access_token.into()),
        }
    }

    /// True iff an access token is held
    pub const fn is_authenticated(&self) -> bool {
        self.access_token.is_some()
    }

    pub fn access_token(&self) -> Option<&str> {
        self.access_token.as_deref()
    }
}

impl std::fmt::Debug for SessionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionState")
            .field("is_authenticated", &self.is_authenticated())
            .finish()
    }
}

/// Login/logout, silent refresh and authenticated requests over a token store
pub struct AuthSession {
    client: ApiClient,
    store: Arc<dyn TokenStore>,
    state: watch::Sender<SessionState>,
    refresh_failure: RefreshFailurePolicy,
}

impl AuthSession {
    /// Create a session, restoring a still-valid access token from `store`
    ///
    /// An expired, malformed or unreadable stored token starts the session
    /// unauthenticated; [`AuthSession::initialize`] then attempts a refresh.
    pub fn new(client: ApiClient, store: Arc<dyn TokenStore>) -> Self {
        let stored = match store.get(TokenKey::Access) {
            Ok(token) => token,
            Err(e) => {
                warn!("Failed to read stored access token: {e}");
                None
            }
        };

        let initial = match stored {
            Some(token) if !is_expired(Some(&token)) => SessionState::authenticated(token),
            Some(_) => {
                debug!("Stored access token is expired");
                SessionState::unauthenticated()
            }
            None => SessionState::unauthenticated(),
        };

        let (state, _) = watch::channel(initial);

        Self {
            client,
            store,
            state,
            refresh_failure: RefreshFailurePolicy::default(),
        }
    }

    /// Create a session from loaded configuration
    pub fn from_config(
        config: &ClientConfig,
        store: Arc<dyn TokenStore>,
    ) -> Result<Self, ClientError> {
        let client = ApiClient::from_config(config)?;
        Ok(Self::new(client, store).with_refresh_failure_policy(config.refresh_failure))
    }

    /// Choose what a rejected refresh does to the stored tokens
    #[must_use]
    pub const fn with_refresh_failure_policy(mut self, policy: RefreshFailurePolicy) -> Self {
        self.refresh_failure = policy;
        self
    }

    pub const fn client(&self) -> &ApiClient {
        &self.client
    }

    /// Current state snapshot
    pub fn state(&self) -> SessionState {
        self.state.borrow().clone()
    }

    pub fn is_authenticated(&self) -> bool {
        self.state.borrow().is_authenticated()
    }

    /// Access token held in memory
    pub fn access_token(&self) -> Option<String> {
        self.state.borrow().access_token.clone()
    }

    /// Receiver notified whenever the authentication state changes
    pub fn subscribe(&self) -> watch::Receiver<SessionState> {
        self.state.subscribe()
    }

    /// Startup step: silently refresh when no valid token was restored
    ///
    /// A token obtained this way is adopted only if nothing else (such as a
    /// login) has set one while the refresh was in flight. Returns whether
    /// the session is authenticated afterwards.
    pub async fn initialize(&self) -> bool {
        if self.is_authenticated() {
            return true;
        }

        if let Ok(token) = self.refresh_stored_token().await {
            self.state.send_if_modified(|state| {
                if state.access_token.is_some() {
                    debug!("Keeping access token set during startup refresh");
                    false
                } else {
                    state.access_token = Some(token);
                    true
                }
            });
        }

        self.is_authenticated()
    }

    /// Share the session and kick off its startup refresh
    ///
    /// Must be called from within a tokio runtime. The handle resolves to
    /// whether the session is authenticated once the startup step is done;
    /// the session is usable immediately.
    pub fn start(self) -> (Arc<Self>, JoinHandle<bool>) {
        let session = Arc::new(self);
        let startup = session.spawn_initialize();
        (session, startup)
    }

    /// Run [`AuthSession::initialize`] on the runtime
    pub fn spawn_initialize(self: &Arc<Self>) -> JoinHandle<bool> {
        let session = Arc::clone(self);
        tokio::spawn(async move { session.initialize().await })
    }

    /// Log in, returning whether it succeeded
    ///
    /// Any failure leaves the in-memory state as it was.
    pub async fn login(&self, credentials: &Credentials) -> bool {
        match self.try_login(credentials).await {
            Ok(()) => {
                info!("Logged in as {}", credentials.username);
                true
            }
            Err(e) => {
                warn!("Login error: {e}");
                false
            }
        }
    }

    /// Log in, persisting both tokens
    ///
    /// If the refresh token cannot be stored, the access token written just
    /// before it is removed again.
    pub async fn try_login(&self, credentials: &Credentials) -> Result<(), ClientError> {
        let pair = self.client.obtain_token_pair(credentials).await?;

        self.store.set(TokenKey::Access, &pair.access)?;
        if let Err(e) = self.store.set(TokenKey::Refresh, &pair.refresh) {
            // Do not leave a half-written pair that authenticates requests
            if let Err(remove_err) = self.store.remove(TokenKey::Access) {
                warn!("Failed to roll back stored access token: {remove_err}");
            }
            return Err(e.into());
        }

        self.state
            .send_replace(SessionState::authenticated(pair.access));
        Ok(())
    }

    /// Clear both stored tokens and drop the in-memory session
    ///
    /// Storage failures are logged; the in-memory state is cleared regardless.
    pub fn logout(&self) {
        for key in [TokenKey::Access, TokenKey::Refresh] {
            if let Err(e) = self.store.remove(key) {
                warn!("Failed to clear {key}: {e}");
            }
        }

        self.state.send_if_modified(|state| {
            let was_authenticated = state.is_authenticated();
            state.access_token = None;
            was_authenticated
        });
        debug!("Logged out");
    }

    /// Create an account without logging in
    pub async fn register(&self, credentials: &Credentials) -> Option<Value> {
        match self.client.register(credentials).await {
            Ok(body) => {
                info!("Registration successful: {body}");
                Some(body)
            }
            Err(e) if e.is_rejection() => {
                warn!("Registration failed: {e}");
                None
            }
            Err(e) => {
                warn!("Registration error: {e}");
                None
            }
        }
    }

    /// Whether the store holds an access token that has not expired
    pub fn is_logged_in(&self) -> bool {
        match self.store.get(TokenKey::Access) {
            Ok(token) => token.is_some_and(|token| !is_expired(Some(&token))),
            Err(e) => {
                warn!("Failed to read stored access token: {e}");
                false
            }
        }
    }
}
