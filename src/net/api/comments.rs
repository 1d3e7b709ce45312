//! Comment endpoints under `/comments`.

#[cfg(test)]
#[path = "comments_test.rs"]
mod comments_test;

use crate::net::error::ApiError;
use crate::net::http::ApiClient;
use crate::net::types::{Comment, CommentRequest};

fn post_comments_endpoint(post_id: i64) -> String {
    format!("/comments/post/{post_id}")
}

fn comment_endpoint(comment_id: i64) -> String {
    format!("/comments/{comment_id}")
}

fn count_endpoint(post_id: i64) -> String {
    format!("/comments/post/{post_id}/count")
}

/// `GET /comments/post/{postId}`.
///
/// # Errors
///
/// Propagates any [`ApiError`] from the wrapper.
pub async fn for_post(client: &ApiClient, post_id: i64) -> Result<Vec<Comment>, ApiError> {
    client.get(&post_comments_endpoint(post_id)).await
}

/// `POST /comments/post/{postId}`.
///
/// # Errors
///
/// Propagates any [`ApiError`] from the wrapper.
pub async fn create(client: &ApiClient, post_id: i64, request: &CommentRequest) -> Result<Comment, ApiError> {
    client.post(&post_comments_endpoint(post_id), request).await
}

/// `PUT /comments/{id}`.
///
/// # Errors
///
/// Propagates any [`ApiError`] from the wrapper.
pub async fn update(client: &ApiClient, comment_id: i64, request: &CommentRequest) -> Result<Comment, ApiError> {
    client.put(&comment_endpoint(comment_id), request).await
}

/// `DELETE /comments/{id}`.
///
/// # Errors
///
/// Propagates any [`ApiError`] from the wrapper.
pub async fn delete(client: &ApiClient, comment_id: i64) -> Result<(), ApiError> {
    client.delete(&comment_endpoint(comment_id)).await
}

/// `GET /comments/post/{postId}/count`; the body is a bare integer.
///
/// # Errors
///
/// Propagates any [`ApiError`] from the wrapper.
pub async fn count(client: &ApiClient, post_id: i64) -> Result<u64, ApiError> {
    client.get(&count_endpoint(post_id)).await
}
