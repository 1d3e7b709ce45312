//! Authentication endpoints under `/auth`.
//!
//! These are raw calls; [`SessionStore`](crate::session::SessionStore) wraps
//! them with session bookkeeping and is what callers normally use.

use crate::net::error::ApiError;
use crate::net::http::ApiClient;
use crate::net::types::{AuthResponse, LoginRequest, RegisterRequest, User};

/// `POST /auth/register`.
///
/// # Errors
///
/// Propagates any [`ApiError`] from the wrapper.
pub async fn register(client: &ApiClient, request: &RegisterRequest) -> Result<AuthResponse, ApiError> {
    client.post("/auth/register", request).await
}

/// `POST /auth/login`.
///
/// # Errors
///
/// Propagates any [`ApiError`] from the wrapper.
pub async fn login(client: &ApiClient, request: &LoginRequest) -> Result<AuthResponse, ApiError> {
    client.post("/auth/login", request).await
}

/// `POST /auth/logout`. The response body is plain text and ignored.
///
/// `token` is sent as the bearer instead of the stored one, so the call still
/// identifies the session after it has been cleared locally.
///
/// # Errors
///
/// Propagates any [`ApiError`] from the wrapper.
pub async fn logout(client: &ApiClient, token: Option<&str>) -> Result<(), ApiError> {
    client.post_empty_with_token("/auth/logout", token).await
}

/// `GET /auth/me`.
///
/// # Errors
///
/// Propagates any [`ApiError`] from the wrapper.
pub async fn current_user(client: &ApiClient) -> Result<User, ApiError> {
    client.get("/auth/me").await
}
