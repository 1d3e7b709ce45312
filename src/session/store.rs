//! Backend-facing session operations.
//!
//! Each mutation (login, registration, logout, refresh) holds a per-store
//! async mutex for its whole duration, so overlapping calls apply in order
//! instead of racing on the shared [`SessionContext`].

use std::sync::Arc;

use tokio::sync::Mutex;
use tracing::{info, warn};

use super::{ClearReason, SessionContext};
use crate::net::api::auth;
use crate::net::error::ApiError;
use crate::net::http::ApiClient;
use crate::net::types::{AuthResponse, LoginRequest, RegisterRequest, User};

#[derive(Clone)]
pub struct SessionStore {
    client: ApiClient,
    mutation: Arc<Mutex<()>>,
}

impl SessionStore {
    #[must_use]
    pub fn new(client: ApiClient) -> Self {
        Self { client, mutation: Arc::new(Mutex::new(())) }
    }

    #[must_use]
    pub fn context(&self) -> &Arc<SessionContext> {
        self.client.session()
    }

    /// Load the persisted session; see [`SessionContext::restore`].
    ///
    /// # Errors
    ///
    /// Returns an error if durable storage cannot be read.
    pub async fn restore(&self) -> Result<bool, ApiError> {
        let _guard = self.mutation.lock().await;
        Ok(self.context().restore().await?)
    }

    pub async fn is_authenticated(&self) -> bool {
        self.context().is_authenticated().await
    }

    pub async fn user(&self) -> Option<User> {
        self.context().user().await
    }

    /// Authenticate with username and password.
    ///
    /// # Errors
    ///
    /// Returns the backend or transport error unchanged; the session is not
    /// modified on failure.
    pub async fn login(&self, credentials: &LoginRequest) -> Result<AuthResponse, ApiError> {
        let _guard = self.mutation.lock().await;
        let response = auth::login(&self.client, credentials).await?;
        self.context().establish(response.token.clone(), response.user.clone()).await?;
        info!(username = %response.user.username, "logged in");
        Ok(response)
    }

    /// Create an account and sign in as it.
    ///
    /// # Errors
    ///
    /// Returns the backend or transport error unchanged; the session is not
    /// modified on failure.
    pub async fn register(&self, user_data: &RegisterRequest) -> Result<AuthResponse, ApiError> {
        let _guard = self.mutation.lock().await;
        let response = auth::register(&self.client, user_data).await?;
        self.context().establish(response.token.clone(), response.user.clone()).await?;
        info!(username = %response.user.username, "registered");
        Ok(response)
    }

    /// Clear memory and storage, then tell the backend the session ended.
    ///
    /// The session is cleared with [`ClearReason::Logout`] before the backend
    /// call, so a rejected token cannot change the reported reason. A failed
    /// backend call is logged and otherwise ignored.
    ///
    /// # Errors
    ///
    /// Returns an error only if durable storage cannot be cleared. Memory is
    /// cleared regardless.
    pub async fn logout(&self) -> Result<(), ApiError> {
        let _guard = self.mutation.lock().await;
        self.logout_locked(ClearReason::Logout).await
    }

    /// Re-fetch the current user from `/auth/me`.
    ///
    /// # Errors
    ///
    /// On any failure the session is logged out and the original error is
    /// returned.
    pub async fn refresh_current_user(&self) -> Result<User, ApiError> {
        let _guard = self.mutation.lock().await;
        let fetched = auth::current_user(&self.client).await;
        let user = match fetched {
            Ok(user) => user,
            Err(e) => {
                warn!(error = %e, "current user refresh failed; logging out");
                if let Err(clear_err) = self.logout_locked(ClearReason::RefreshFailed).await {
                    warn!(error = %clear_err, "logout after failed refresh did not complete");
                }
                return Err(e);
            }
        };
        self.context().replace_user(user.clone()).await?;
        Ok(user)
    }

    // Caller must hold `mutation`.
    async fn logout_locked(&self, reason: ClearReason) -> Result<(), ApiError> {
        let token = self
            .context()
            .stored_token()
            .inspect_err(|e| warn!(error = %e, "stored token unreadable; logging out without it"))
            .ok()
            .flatten();
        let cleared = self.context().clear(reason).await;
        if let Err(e) = auth::logout(&self.client, token.as_deref()).await {
            warn!(error = %e, "backend logout failed");
        }
        if cleared? {
            info!(?reason, "logged out");
        }
        Ok(())
    }
}
