use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use tracing::{debug, info, warn};

use crate::api::{ApiClient, ApiError, RefreshOutcome, SignupProfile};
use crate::models::User;

use super::credentials::CredentialStore;
use super::scope::ScopeToken;

/// Where the session currently stands.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionState {
    Anonymous,
    Initializing,
    Authenticated(User),
}

impl SessionState {
    pub fn is_authenticated(&self) -> bool {
        matches!(self, SessionState::Authenticated(_))
    }

    pub fn user(&self) -> Option<&User> {
        match self {
            SessionState::Authenticated(user) => Some(user),
            _ => None,
        }
    }
}

/// Session state machine.
///
/// One `SessionManager` is constructed at startup and threaded explicitly to
/// whatever needs it; there is no ambient global. All state mutations are
/// gated on the caller's [`ScopeToken`], so an operation whose view has gone
/// away completes without touching shared state.
pub struct SessionManager {
    api: ApiClient,
    credentials: CredentialStore,
    state: Mutex<SessionState>,
    initialized: AtomicBool,
}

impl SessionManager {
    pub fn new(api: ApiClient, credentials: CredentialStore) -> Self {
        Self {
            api,
            credentials,
            state: Mutex::new(SessionState::Anonymous),
            initialized: AtomicBool::new(false),
        }
    }

    /// Current session state.
    pub fn state(&self) -> SessionState {
        self.lock_state().clone()
    }

    pub fn is_authenticated(&self) -> bool {
        self.state().is_authenticated()
    }

    /// Restore the session on startup.
    ///
    /// Runs once; later calls log and return the current state. Never fails:
    /// a held credential is tried first, then a silent refresh via the
    /// refresh-secret cookie, and every failure path lands in `Anonymous`.
    /// An explicit "no active session" answer from the refresh endpoint is
    /// the normal anonymous-visitor case, not an error.
    pub async fn initialize(&self, scope: &ScopeToken) -> SessionState {
        if self.initialized.swap(true, Ordering::SeqCst) {
            debug!("initialize called again, returning current state");
            return self.state();
        }

        self.set_state(scope, SessionState::Initializing);

        if let Some(credential) = self.credentials.get() {
            if credential.is_expired() {
                debug!("held credential is past its declared expiry");
                if scope.is_live() {
                    self.credentials.clear();
                }
            } else {
                match self.api.fetch_profile().await {
                    Ok(user) => {
                        info!(user_id = %user.id, "session restored from held credential");
                        self.set_state(scope, SessionState::Authenticated(user));
                        return self.state();
                    }
                    Err(e) => {
                        warn!(error = %e, "profile fetch with held credential failed");
                        if scope.is_live() {
                            self.credentials.clear();
                        }
                    }
                }
            }
        }

        match self.api.refresh_session().await {
            Ok(RefreshOutcome::Refreshed(_)) => match self.api.fetch_profile().await {
                Ok(user) => {
                    info!(user_id = %user.id, "session restored via silent refresh");
                    self.set_state(scope, SessionState::Authenticated(user));
                }
                Err(e) => {
                    warn!(error = %e, "profile fetch after silent refresh failed");
                    if scope.is_live() {
                        self.credentials.clear();
                    }
                    self.set_state(scope, SessionState::Anonymous);
                }
            },
            Ok(RefreshOutcome::NoSession) => {
                debug!("no active session, starting anonymous");
                self.set_state(scope, SessionState::Anonymous);
            }
            Err(e) => {
                warn!(error = %e, "silent refresh failed");
                if scope.is_live() {
                    self.credentials.clear();
                }
                self.set_state(scope, SessionState::Anonymous);
            }
        }

        self.state()
    }

    /// Sign in with email and password.
    ///
    /// The login response already carries the user, so success moves straight
    /// to `Authenticated` with no separate profile fetch. On failure the
    /// error is returned as-is and the state is left untouched.
    pub async fn login(
        &self,
        email: &str,
        password: &str,
        scope: &ScopeToken,
    ) -> Result<User, ApiError> {
        let (credential, user) = self.api.login(email, password).await?;

        if scope.is_live() {
            self.credentials.set(Some(credential));
            self.set_state(scope, SessionState::Authenticated(user.clone()));
            info!(user_id = %user.id, "login succeeded");
        } else {
            debug!("login finished after its scope ended, result discarded");
        }

        Ok(user)
    }

    /// Create an account; the new user comes back already signed in.
    pub async fn signup(
        &self,
        profile: &SignupProfile,
        scope: &ScopeToken,
    ) -> Result<User, ApiError> {
        let (credential, user) = self.api.signup(profile).await?;

        if scope.is_live() {
            self.credentials.set(Some(credential));
            self.set_state(scope, SessionState::Authenticated(user.clone()));
            info!(user_id = %user.id, "signup succeeded");
        } else {
            debug!("signup finished after its scope ended, result discarded");
        }

        Ok(user)
    }

    /// Sign out.
    ///
    /// The server call revokes the refresh secret; locally the credential and
    /// state are cleared even when that call fails, so the client never
    /// claims an authentication it can no longer exercise. The server error
    /// is still returned for display.
    pub async fn logout(&self, scope: &ScopeToken) -> Result<(), ApiError> {
        let result = self.api.logout().await;

        if scope.is_live() {
            self.credentials.clear();
            self.set_state(scope, SessionState::Anonymous);
        }

        match &result {
            Ok(()) => info!("logout acknowledged by server"),
            Err(e) => warn!(error = %e, "server logout failed, local session cleared anyway"),
        }

        result
    }

    fn set_state(&self, scope: &ScopeToken, next: SessionState) {
        if !scope.is_live() {
            debug!("scope ended, dropping state update");
            return;
        }
        *self.lock_state() = next;
    }

    fn lock_state(&self) -> std::sync::MutexGuard<'_, SessionState> {
        // A poisoned lock still holds a coherent state; recover it.
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
