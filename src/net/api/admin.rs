//! Moderation endpoints under `/admin`. The backend answers 403 for
//! non-admin sessions, which the wrapper turns into a user notice.

#[cfg(test)]
#[path = "admin_test.rs"]
mod admin_test;

use serde::Serialize;

use crate::net::error::ApiError;
use crate::net::http::ApiClient;
use crate::net::types::{Post, User, UserSuspension};

fn user_action_endpoint(user_id: i64, action: &str) -> String {
    format!("/admin/users/{user_id}/{action}")
}

fn post_endpoint(post_id: i64) -> String {
    format!("/admin/posts/{post_id}")
}

fn post_action_endpoint(post_id: i64, action: &str) -> String {
    format!("/admin/posts/{post_id}/{action}")
}

#[derive(Serialize)]
struct SuspendBody<'a> {
    days: u32,
    reason: &'a str,
}

#[derive(Serialize)]
struct HideBody<'a> {
    reason: &'a str,
}

/// `GET /admin/users`.
///
/// # Errors
///
/// Propagates any [`ApiError`] from the wrapper.
pub async fn users(client: &ApiClient) -> Result<Vec<User>, ApiError> {
    client.get("/admin/users").await
}

/// `GET /admin/posts`, hidden posts included.
///
/// # Errors
///
/// Propagates any [`ApiError`] from the wrapper.
pub async fn posts(client: &ApiClient) -> Result<Vec<Post>, ApiError> {
    client.get("/admin/posts").await
}

/// `POST /admin/users/{id}/suspend` with `{days, reason}`.
///
/// # Errors
///
/// Propagates any [`ApiError`] from the wrapper.
pub async fn suspend_user(client: &ApiClient, user_id: i64, days: u32, reason: &str) -> Result<(), ApiError> {
    client
        .post_json_empty(&user_action_endpoint(user_id, "suspend"), &SuspendBody { days, reason })
        .await
}

/// `POST /admin/users/{id}/unsuspend`.
///
/// # Errors
///
/// Propagates any [`ApiError`] from the wrapper.
pub async fn unsuspend_user(client: &ApiClient, user_id: i64) -> Result<(), ApiError> {
    client.post_empty(&user_action_endpoint(user_id, "unsuspend")).await
}

/// `POST /admin/posts/{id}/hide` with `{reason}`.
///
/// # Errors
///
/// Propagates any [`ApiError`] from the wrapper.
pub async fn hide_post(client: &ApiClient, post_id: i64, reason: &str) -> Result<(), ApiError> {
    client.post_json_empty(&post_action_endpoint(post_id, "hide"), &HideBody { reason }).await
}

/// `POST /admin/posts/{id}/unhide`.
///
/// # Errors
///
/// Propagates any [`ApiError`] from the wrapper.
pub async fn unhide_post(client: &ApiClient, post_id: i64) -> Result<(), ApiError> {
    client.post_empty(&post_action_endpoint(post_id, "unhide")).await
}

/// `DELETE /admin/posts/{id}`.
///
/// # Errors
///
/// Propagates any [`ApiError`] from the wrapper.
pub async fn delete_post(client: &ApiClient, post_id: i64) -> Result<(), ApiError> {
    client.delete(&post_endpoint(post_id)).await
}

/// `GET /admin/users/{id}/suspension`.
///
/// A 404 means the user has no suspension and yields `Ok(None)`.
///
/// # Errors
///
/// Propagates every other [`ApiError`] from the wrapper.
pub async fn user_suspension(client: &ApiClient, user_id: i64) -> Result<Option<UserSuspension>, ApiError> {
    match client.get(&user_action_endpoint(user_id, "suspension")).await {
        Ok(suspension) => Ok(Some(suspension)),
        Err(e) if e.is_not_found() => Ok(None),
        Err(e) => Err(e),
    }
}
