//! Session store: the single owner of the bearer token and the current user.
//!
//! SYSTEM CONTEXT
//! ==============
//! The CLI and the route guard read derived state from here and never touch
//! token storage or the bearer themselves. State changes are broadcast over a
//! `watch` channel; dropping a receiver unsubscribes.
//!
//! CONCURRENCY
//! ===========
//! At most one bootstrap/login/register exchange runs per store. A call made
//! while another is pending is rejected with `SessionBusy` without touching
//! state, so a plain `false` always means the attempt ran and failed. `logout()`
//! is synchronous and may interleave with a pending exchange; it bumps the
//! session epoch so the exchange discards whatever it resolves afterwards.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use serde::Serialize;
use tokio::sync::watch;
use tracing::{debug, error, info, warn};

use crate::net::api::{ApiError, AuthApi};
use crate::net::types::{Credentials, Registration, SessionToken, User};
use crate::state::token_store::TokenStore;

pub const BOOTSTRAP_FAILED: &str = "Failed to authenticate";
pub const LOGIN_FAILED: &str = "Login failed";
pub const REGISTRATION_FAILED: &str = "Registration failed";
pub const SESSION_SAVE_FAILED: &str = "Failed to save session";

/// Another bootstrap/login/register exchange is already in flight.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("another session exchange is in flight")]
pub struct SessionBusy;

// =============================================================================
// STATE
// =============================================================================

/// Where identity resolution stands.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AuthStatus {
    /// Bootstrap has not finished; identity is unknown.
    Pending,
    Authenticated,
    Anonymous,
}

/// Snapshot of the session as seen by consumers.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct SessionState {
    pub user: Option<User>,
    pub loading: bool,
    pub error: Option<String>,
    /// Set once the first identity resolution (bootstrap, login or logout)
    /// has completed.
    pub bootstrapped: bool,
}

impl SessionState {
    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.user.is_some()
    }

    #[must_use]
    pub fn status(&self) -> AuthStatus {
        if self.user.is_some() {
            AuthStatus::Authenticated
        } else if self.bootstrapped {
            AuthStatus::Anonymous
        } else {
            AuthStatus::Pending
        }
    }
}

// =============================================================================
// STORE
// =============================================================================

pub struct SessionStore {
    api: Arc<dyn AuthApi>,
    tokens: Arc<dyn TokenStore>,
    bearer: Mutex<Option<SessionToken>>,
    state: watch::Sender<SessionState>,
    in_flight: AtomicBool,
    epoch: AtomicU64,
}

/// Marks an exchange as in flight; clears `loading` when dropped, including
/// when the owning future is cancelled.
struct ExchangeGuard<'a> {
    store: &'a SessionStore,
}

impl Drop for ExchangeGuard<'_> {
    fn drop(&mut self) {
        self.store.state.send_modify(|s| s.loading = false);
        self.store.in_flight.store(false, Ordering::Release);
    }
}

impl SessionStore {
    #[must_use]
    pub fn new(api: Arc<dyn AuthApi>, tokens: Arc<dyn TokenStore>) -> Self {
        let (state, _) = watch::channel(SessionState::default());
        Self {
            api,
            tokens,
            bearer: Mutex::new(None),
            state,
            in_flight: AtomicBool::new(false),
            epoch: AtomicU64::new(0),
        }
    }

    /// Receive every subsequent state change. Drop the receiver to unsubscribe.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<SessionState> {
        self.state.subscribe()
    }

    #[must_use]
    pub fn snapshot(&self) -> SessionState {
        self.state.borrow().clone()
    }

    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.state.borrow().is_authenticated()
    }

    /// Bearer for outbound calls. `None` unless a user is confirmed; a stored
    /// but unverified token is never handed out.
    #[must_use]
    pub fn bearer(&self) -> Option<SessionToken> {
        if !self.is_authenticated() {
            return None;
        }
        self.bearer.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }

    /// Restore a persisted session. Failures end up in `error`, never in the
    /// return path.
    pub async fn bootstrap(&self) {
        let Some(_guard) = self.begin_exchange(false) else {
            warn!("bootstrap skipped: another session exchange is in flight");
            return;
        };
        let epoch = self.epoch.load(Ordering::Acquire);

        let stored = self.tokens.load().unwrap_or_else(|e| {
            warn!(error = %e, "token storage unreadable; starting anonymous");
            None
        });
        let Some(token) = stored else {
            debug!("no persisted session");
            self.state.send_modify(|s| {
                s.user = None;
                s.bootstrapped = true;
            });
            return;
        };

        self.set_bearer(Some(token.clone()));
        let result = self.api.current_user(&token).await;
        if !self.epoch_current(epoch) {
            debug!("bootstrap result discarded after logout");
            self.set_bearer(None);
            self.state.send_modify(|s| s.bootstrapped = true);
            return;
        }

        match result {
            Ok(user) => {
                info!(user_id = user.id, "session restored");
                self.state.send_modify(|s| {
                    s.user = Some(user);
                    s.bootstrapped = true;
                });
            }
            Err(e) => {
                if e.is_unauthorized() {
                    info!("persisted token rejected; session expired");
                } else {
                    warn!(code = e.error_code(), error = %e, "session restore failed");
                }
                self.discard_token();
                self.state.send_modify(|s| {
                    s.user = None;
                    s.error = Some(BOOTSTRAP_FAILED.to_owned());
                    s.bootstrapped = true;
                });
            }
        }
    }

    /// Exchange credentials for a token and confirm the identity behind it.
    ///
    /// `Ok(true)` only when a user record was confirmed; after `Ok(false)`
    /// the store is unauthenticated.
    ///
    /// # Errors
    ///
    /// `SessionBusy` if another exchange is pending. State is left untouched.
    pub async fn login(&self, credentials: &Credentials) -> Result<bool, SessionBusy> {
        let Some(_guard) = self.begin_exchange(true) else {
            warn!("login rejected: another session exchange is in flight");
            return Err(SessionBusy);
        };
        Ok(self.login_inner(credentials).await)
    }

    /// Create an account, then log into it with the same email and password.
    ///
    /// # Errors
    ///
    /// `SessionBusy` if another exchange is pending.
    pub async fn register(&self, registration: &Registration) -> Result<bool, SessionBusy> {
        let Some(_guard) = self.begin_exchange(true) else {
            warn!("registration rejected: another session exchange is in flight");
            return Err(SessionBusy);
        };

        if let Err(e) = self.api.create_user(registration).await {
            warn!(code = e.error_code(), error = %e, username = %registration.username, "registration failed");
            let message = failure_message(&e, REGISTRATION_FAILED);
            self.state.send_modify(|s| s.error = Some(message));
            return Ok(false);
        }

        info!(username = %registration.username, "account created");
        Ok(self.login_inner(&registration.credentials()).await)
    }

    /// Drop the session. Always succeeds; calling it with no session is a no-op.
    pub fn logout(&self) {
        self.epoch.fetch_add(1, Ordering::AcqRel);
        self.discard_token();
        self.state.send_modify(|s| {
            if s.user.take().is_some() {
                info!("logged out");
            }
            s.bootstrapped = true;
        });
    }

    // -------------------------------------------------------------------------

    async fn login_inner(&self, credentials: &Credentials) -> bool {
        let epoch = self.epoch.load(Ordering::Acquire);

        let token = match self.api.exchange_token(credentials).await {
            Ok(response) => {
                debug!(token_type = %response.token_type, "token issued");
                SessionToken::new(&response.access_token)
            }
            Err(e) => {
                warn!(code = e.error_code(), error = %e, "token exchange failed");
                self.fail_login(failure_message(&e, LOGIN_FAILED));
                return false;
            }
        };
        if !self.epoch_current(epoch) {
            debug!("login result discarded after logout");
            return false;
        }
        let Some(token) = token else {
            warn!(code = "E_MALFORMED", "token exchange returned an empty token");
            self.fail_login(LOGIN_FAILED.to_owned());
            return false;
        };

        if let Err(e) = self.tokens.save(&token) {
            error!(error = %e, "failed to persist session token");
            self.fail_login(SESSION_SAVE_FAILED.to_owned());
            return false;
        }
        self.set_bearer(Some(token.clone()));

        let result = self.api.current_user(&token).await;
        if !self.epoch_current(epoch) {
            debug!("login result discarded after logout");
            self.discard_token();
            return false;
        }

        match result {
            Ok(user) => {
                info!(user_id = user.id, "login succeeded");
                self.state.send_modify(|s| {
                    s.user = Some(user);
                    s.error = None;
                    s.bootstrapped = true;
                });
                true
            }
            Err(e) => {
                warn!(code = e.error_code(), error = %e, "identity check after token exchange failed");
                self.discard_token();
                self.fail_login(failure_message(&e, LOGIN_FAILED));
                false
            }
        }
    }

    fn begin_exchange(&self, clear_error: bool) -> Option<ExchangeGuard<'_>> {
        if self
            .in_flight
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return None;
        }
        self.state.send_modify(|s| {
            s.loading = true;
            if clear_error {
                s.error = None;
            }
        });
        Some(ExchangeGuard { store: self })
    }

    /// In-memory sign-out after a failed login. The persisted token is left to
    /// the caller: an exchange failure must not destroy an unrelated session.
    fn fail_login(&self, message: String) {
        self.set_bearer(None);
        self.state.send_modify(|s| {
            s.user = None;
            s.error = Some(message);
            s.bootstrapped = true;
        });
    }

    fn discard_token(&self) {
        if let Err(e) = self.tokens.clear() {
            warn!(error = %e, "failed to remove persisted session token");
        }
        self.set_bearer(None);
    }

    fn set_bearer(&self, token: Option<SessionToken>) {
        *self.bearer.lock().unwrap_or_else(PoisonError::into_inner) = token;
    }

    fn epoch_current(&self, epoch: u64) -> bool {
        self.epoch.load(Ordering::Acquire) == epoch
    }
}

fn failure_message(error: &ApiError, fallback: &str) -> String {
    error.detail().unwrap_or(fallback).to_owned()
}

#[cfg(test)]
#[path = "session_test.rs"]
mod tests;
