//! Post endpoints under `/posts`.

#[cfg(test)]
#[path = "posts_test.rs"]
mod posts_test;

use serde::Serialize;

use crate::net::error::ApiError;
use crate::net::http::{ApiClient, encode_segment};
use crate::net::types::{LikeType, Post, PostRequest, SearchType, SortBy};

fn post_endpoint(id: i64) -> String {
    format!("/posts/{id}")
}

fn view_endpoint(id: i64) -> String {
    format!("/posts/{id}/view")
}

fn like_endpoint(id: i64) -> String {
    format!("/posts/{id}/like")
}

fn category_endpoint(category: &str) -> String {
    format!("/posts/category/{}", encode_segment(category))
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct SearchQuery<'a> {
    keyword: &'a str,
    search_type: SearchType,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct SortedQuery<'a> {
    sort_by: SortBy,
    category: &'a str,
}

#[derive(Serialize)]
struct LikeQuery {
    #[serde(rename = "type")]
    like_type: LikeType,
}

/// `GET /posts`.
///
/// # Errors
///
/// Propagates any [`ApiError`] from the wrapper.
pub async fn list(client: &ApiClient) -> Result<Vec<Post>, ApiError> {
    client.get("/posts").await
}

/// `GET /posts/{id}`.
///
/// # Errors
///
/// Propagates any [`ApiError`] from the wrapper.
pub async fn get(client: &ApiClient, id: i64) -> Result<Post, ApiError> {
    client.get(&post_endpoint(id)).await
}

/// `POST /posts`.
///
/// # Errors
///
/// Propagates any [`ApiError`] from the wrapper.
pub async fn create(client: &ApiClient, request: &PostRequest) -> Result<Post, ApiError> {
    client.post("/posts", request).await
}

/// `PUT /posts/{id}`.
///
/// # Errors
///
/// Propagates any [`ApiError`] from the wrapper.
pub async fn update(client: &ApiClient, id: i64, request: &PostRequest) -> Result<Post, ApiError> {
    client.put(&post_endpoint(id), request).await
}

/// `DELETE /posts/{id}`.
///
/// # Errors
///
/// Propagates any [`ApiError`] from the wrapper.
pub async fn delete(client: &ApiClient, id: i64) -> Result<(), ApiError> {
    client.delete(&post_endpoint(id)).await
}

/// `GET /posts/search?keyword=..&searchType=..`. The keyword is sent as given;
/// the backend decides what it matches.
///
/// # Errors
///
/// Propagates any [`ApiError`] from the wrapper.
pub async fn search(client: &ApiClient, keyword: &str, search_type: SearchType) -> Result<Vec<Post>, ApiError> {
    client.get_with_query("/posts/search", &SearchQuery { keyword, search_type }).await
}

/// `POST /posts/{id}/view`.
///
/// # Errors
///
/// Propagates any [`ApiError`] from the wrapper.
pub async fn increment_view_count(client: &ApiClient, id: i64) -> Result<(), ApiError> {
    client.post_empty(&view_endpoint(id)).await
}

/// `GET /posts/category/{category}`.
///
/// # Errors
///
/// Propagates any [`ApiError`] from the wrapper.
pub async fn by_category(client: &ApiClient, category: &str) -> Result<Vec<Post>, ApiError> {
    client.get(&category_endpoint(category)).await
}

/// `POST /posts/{id}/like?type=..`.
///
/// # Errors
///
/// Propagates any [`ApiError`] from the wrapper.
pub async fn toggle_like(client: &ApiClient, id: i64, like_type: LikeType) -> Result<(), ApiError> {
    client.post_query_empty(&like_endpoint(id), &LikeQuery { like_type }).await
}

/// `GET /posts/sorted?sortBy=..&category=..`. Pass
/// [`ALL_CATEGORIES`](crate::net::types::ALL_CATEGORIES) for no filter.
///
/// # Errors
///
/// Propagates any [`ApiError`] from the wrapper.
pub async fn sorted(client: &ApiClient, sort_by: SortBy, category: &str) -> Result<Vec<Post>, ApiError> {
    client.get_with_query("/posts/sorted", &SortedQuery { sort_by, category }).await
}
