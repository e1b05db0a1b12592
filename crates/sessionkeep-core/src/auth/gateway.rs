//! Session lifecycle against the remote authority.
//!
//! The gateway is the only writer of the `SessionStore` in normal operation:
//! it stores the session after a successful login, clears it on logout, and
//! clears it when any authenticated call comes back 401.

use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use serde_json::Value;
use tokio::sync::Mutex;
use tracing::{error, info, warn};

use super::error::AuthError;
use super::store::{SessionStatus, SessionStore};
use crate::api::{ApiClient, ApiError, Authority};
use crate::models::{Credentials, RegisterResponse};
use crate::validation::{LoginForm, SignupForm};

pub struct SessionGateway<A: Authority = ApiClient> {
    authority: Arc<A>,
    store: Arc<Mutex<SessionStore>>,
    // Bumped by every login attempt and every logout. A login response is
    // applied only while its ticket is still the latest.
    generation: AtomicU64,
}

impl<A: Authority> SessionGateway<A> {
    pub fn new(authority: A, store: SessionStore) -> Self {
        Self::with_shared_store(authority, Arc::new(Mutex::new(store)))
    }

    pub fn with_shared_store(authority: A, store: Arc<Mutex<SessionStore>>) -> Self {
        Self {
            authority: Arc::new(authority),
            store,
            generation: AtomicU64::new(0),
        }
    }

    pub fn store(&self) -> Arc<Mutex<SessionStore>> {
        Arc::clone(&self.store)
    }

    pub async fn status(&self) -> SessionStatus {
        self.store.lock().await.status()
    }

    fn next_generation(&self) -> u64 {
        self.generation.fetch_add(1, Ordering::SeqCst) + 1
    }

    /// Validate the login form, then establish a session.
    pub async fn login(&self, form: &LoginForm) -> Result<SessionStatus, AuthError> {
        let credentials = form.validate()?;
        self.establish_session(&credentials).await
    }

    /// Send credentials to the remote authority and store the returned
    /// session. On failure the store is left untouched.
    pub async fn establish_session(
        &self,
        credentials: &Credentials,
    ) -> Result<SessionStatus, AuthError> {
        let ticket = self.next_generation();

        let login = self
            .authority
            .login(credentials)
            .await
            .map_err(|e| {
                warn!(error = %e, "Login failed");
                AuthError::from_login(e)
            })?;

        if login.access_token.is_empty() || login.user.is_null() {
            return Err(AuthError::Malformed(
                "Login response is missing the user or token".to_string(),
            ));
        }

        let mut store = self.store.lock().await;
        if self.generation.load(Ordering::SeqCst) != ticket {
            warn!(ticket, "Discarding stale login response");
            return Err(AuthError::Superseded);
        }
        let status = store
            .set_session(login.user, login.access_token)
            .map_err(AuthError::storage)?;

        info!("Login successful");
        Ok(status)
    }

    /// End the session. Local state is cleared whatever the remote call
    /// returns; the remote outcome is still reported.
    pub async fn terminate_session(&self) -> Result<(), AuthError> {
        self.next_generation();

        let (token, cleared) = {
            let mut store = self.store.lock().await;
            let token = store.token().map(str::to_owned);
            (token, store.clear_session())
        };
        let cleared = cleared.map_err(|e| {
            error!(error = %e, "Failed to clear stored session");
            AuthError::storage(e)
        });

        if let Some(token) = token {
            match self.authority.logout(&token).await {
                Ok(()) => info!("Logged out"),
                // Already invalid on the server; nothing left to revoke.
                Err(ApiError::Unauthorized) => info!("Logged out (token already expired)"),
                Err(e) => {
                    warn!(error = %e, "Remote logout failed, local session cleared anyway");
                    // Storage failure takes priority over the remote one.
                    return Err(cleared.err().unwrap_or_else(|| e.into()));
                }
            }
        }

        cleared
    }

    /// Validate the signup form and register the account. Never touches
    /// the session store.
    pub async fn register(&self, form: &SignupForm) -> Result<RegisterResponse, AuthError> {
        let registration = form.validate()?;
        let response = self.authority.register(&registration).await?;
        if response.success {
            info!(username = %registration.username, "Account created");
            Ok(response)
        } else {
            Err(AuthError::Rejected(
                response
                    .message
                    .unwrap_or_else(|| "Registration failed".to_string()),
            ))
        }
    }

    /// Run an authenticated call with the current token. A 401 ends the
    /// session, unless a newer session replaced it while the call was out.
    pub async fn authorized<T, F, Fut>(&self, call: F) -> Result<T, AuthError>
    where
        F: FnOnce(String) -> Fut,
        Fut: Future<Output = Result<T, ApiError>>,
    {
        let token = self
            .store
            .lock()
            .await
            .token()
            .map(str::to_owned)
            .ok_or(AuthError::NotAuthenticated)?;

        match call(token.clone()).await {
            Ok(value) => Ok(value),
            Err(ApiError::Unauthorized) => {
                self.expire_session(&token).await;
                Err(AuthError::AuthorizationExpired)
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Fetch the current user's profile from the remote authority.
    pub async fn current_user(&self) -> Result<Value, AuthError> {
        let authority = Arc::clone(&self.authority);
        self.authorized(move |token| async move { authority.current_user(&token).await })
            .await
    }

    /// Clear the session the rejected token belonged to. Leaves the
    /// generation alone so an in-flight login still lands.
    async fn expire_session(&self, rejected: &str) {
        let mut store = self.store.lock().await;
        if store.token() != Some(rejected) {
            info!("Authorization rejected for a replaced session, keeping current one");
            return;
        }
        warn!("Authorization rejected, clearing session");
        if let Err(e) = store.clear_session() {
            error!(error = %e, "Failed to clear stored session");
        }
    }
}
