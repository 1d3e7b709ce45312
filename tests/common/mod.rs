//! In-process stub of the forum backend for integration tests.
//!
//! Accounts: any username with password `secret`; the token is
//! `tok-<username>` and `admin` gets the ADMIN role. Any other bearer is
//! rejected with 401 by `/auth/me` and `/auth/logout`. Special ids make the stub
//! fail on purpose (see `get_post` and `get_suspension`).

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use axum::extract::{Multipart, Path, Query, Request, State};
use axum::http::header::AUTHORIZATION;
use axum::http::{HeaderMap, StatusCode};
use axum::middleware::{self, Next};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use boardclient::BoardClient;
use boardclient::config::ClientConfig;
use boardclient::notify::{Notice, Notifier};
use boardclient::storage::{KeyValueStore, MemoryStore};
use serde_json::{Value, json};

pub const PASSWORD: &str = "secret";

#[derive(Clone, Debug)]
pub struct Recorded {
    pub method: String,
    pub path: String,
    pub query: Option<String>,
    pub authorization: Option<String>,
}

#[derive(Default)]
pub struct Backend {
    requests: Mutex<Vec<Recorded>>,
    bodies: Mutex<Vec<Value>>,
    pub fail_logout: AtomicBool,
}

impl Backend {
    pub fn requests(&self) -> Vec<Recorded> {
        lock(&self.requests).clone()
    }

    /// Requests whose path ends with `suffix`.
    pub fn requests_to(&self, suffix: &str) -> Vec<Recorded> {
        self.requests().into_iter().filter(|r| r.path.ends_with(suffix)).collect()
    }

    pub fn bodies(&self) -> Vec<Value> {
        lock(&self.bodies).clone()
    }

    pub fn set_fail_logout(&self, fail: bool) {
        self.fail_logout.store(fail, Ordering::SeqCst);
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Stub server plus a client wired against it over in-memory storage.
pub struct Harness {
    pub base_url: String,
    pub backend: Arc<Backend>,
    pub storage: Arc<MemoryStore>,
    pub notifier: Arc<RecordingNotifier>,
    pub client: BoardClient,
}

impl Harness {
    pub async fn start() -> Self {
        Self::start_with_storage(Arc::new(MemoryStore::new())).await
    }

    pub async fn start_with_storage(storage: Arc<MemoryStore>) -> Self {
        let backend = Arc::new(Backend::default());
        let base_url = spawn_stub(backend.clone()).await;
        let notifier = Arc::new(RecordingNotifier::default());
        let client = client_for(&base_url, storage.clone(), notifier.clone());
        Self { base_url, backend, storage, notifier, client }
    }

    /// A second client over the same backend and storage, as after a restart.
    pub fn reopen(&self) -> BoardClient {
        client_for(&self.base_url, self.storage.clone(), self.notifier.clone())
    }
}

pub fn client_for(base_url: &str, storage: Arc<dyn KeyValueStore>, notifier: Arc<RecordingNotifier>) -> BoardClient {
    let config = ClientConfig::default().with_base_url(base_url).unwrap();
    BoardClient::new(&config, storage, notifier).unwrap()
}

#[derive(Default)]
pub struct RecordingNotifier {
    notices: Mutex<Vec<Notice>>,
}

impl RecordingNotifier {
    pub fn notices(&self) -> Vec<Notice> {
        lock(&self.notices).clone()
    }
}

impl Notifier for RecordingNotifier {
    fn notify(&self, notice: Notice) {
        lock(&self.notices).push(notice);
    }
}

/// Bind to an ephemeral port and serve the stub; returns the API base URL.
pub async fn spawn_stub(backend: Arc<Backend>) -> String {
    let api = Router::new()
        .route("/auth/login", post(login))
        .route("/auth/register", post(register))
        .route("/auth/logout", post(logout))
        .route("/auth/me", get(me))
        .route("/posts", get(list_posts).post(create_post))
        .route("/posts/search", get(search_posts))
        .route("/posts/sorted", get(sorted_posts))
        .route("/posts/category/{category}", get(posts_by_category))
        .route("/posts/{id}", get(get_post).put(update_post).delete(no_content))
        .route("/posts/{id}/view", post(ok))
        .route("/posts/{id}/like", post(ok))
        .route("/comments/post/{post_id}", get(list_comments).post(create_comment))
        .route("/comments/post/{post_id}/count", get(count_comments))
        .route("/comments/{id}", axum::routing::put(update_comment).delete(no_content))
        .route("/files/upload/{post_id}", post(upload_files))
        .route("/admin/users", get(admin_users))
        .route("/admin/posts", get(admin_posts))
        .route("/admin/users/{id}/suspend", post(record_body))
        .route("/admin/users/{id}/unsuspend", post(ok))
        .route("/admin/users/{id}/suspension", get(get_suspension))
        .route("/admin/posts/{id}/hide", post(record_body))
        .route("/admin/posts/{id}/unhide", post(ok))
        .route("/admin/posts/{id}", axum::routing::delete(no_content));

    let app = Router::new()
        .nest("/api", api)
        .layer(middleware::from_fn_with_state(backend.clone(), record))
        .with_state(backend);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{addr}/api")
}

async fn record(State(backend): State<Arc<Backend>>, request: Request, next: Next) -> Response {
    let authorization = request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .map(str::to_owned);
    lock(&backend.requests).push(Recorded {
        method: request.method().to_string(),
        path: request.uri().path().to_owned(),
        query: request.uri().query().map(str::to_owned),
        authorization,
    });
    next.run(request).await
}

// =============================================================================
// Fixtures
// =============================================================================

pub fn user_json(username: &str) -> Value {
    let role = if username == "admin" { "ADMIN" } else { "USER" };
    json!({
        "id": username.len(),
        "username": username,
        "email": format!("{username}@example.com"),
        "displayName": null,
        "createdDate": "2024-05-01T09:00:00",
        "points": 10,
        "role": role,
    })
}

fn post_json(id: i64, title: &str) -> Value {
    json!({
        "id": id,
        "title": title,
        "content": "body",
        "author": "alice",
        "category": "general",
        "viewCount": 0,
        "likeCount": 0,
        "dislikeCount": 0,
        "isHidden": false,
        "fileAttachments": [],
    })
}

fn error_json(status: StatusCode, message: &str) -> Response {
    (status, Json(json!({ "message": message, "error": status.canonical_reason() }))).into_response()
}

fn bearer_user(headers: &HeaderMap) -> Option<String> {
    headers
        .get(AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer tok-")
        .map(str::to_owned)
}

// =============================================================================
// Handlers
// =============================================================================

async fn login(Json(body): Json<Value>) -> Response {
    let username = body["username"].as_str().unwrap_or_default();
    if body["password"] != PASSWORD {
        return error_json(StatusCode::BAD_REQUEST, "Invalid username or password");
    }
    Json(json!({ "token": format!("tok-{username}"), "user": user_json(username) })).into_response()
}

async fn register(Json(body): Json<Value>) -> Response {
    let username = body["username"].as_str().unwrap_or_default();
    if username == "taken" {
        return error_json(StatusCode::BAD_REQUEST, "Username already exists");
    }
    let mut user = user_json(username);
    user["displayName"] = body["displayName"].clone();
    Json(json!({ "token": format!("tok-{username}"), "user": user })).into_response()
}

async fn logout(State(backend): State<Arc<Backend>>, headers: HeaderMap) -> Response {
    if backend.fail_logout.load(Ordering::SeqCst) {
        return (StatusCode::INTERNAL_SERVER_ERROR, "logout exploded").into_response();
    }
    if headers.contains_key(AUTHORIZATION) && bearer_user(&headers).is_none() {
        return error_json(StatusCode::UNAUTHORIZED, "Token expired");
    }
    "Logged out".into_response()
}

async fn me(headers: HeaderMap) -> Response {
    match bearer_user(&headers) {
        Some(username) => Json(user_json(&username)).into_response(),
        None => error_json(StatusCode::UNAUTHORIZED, "Not authenticated"),
    }
}

async fn list_posts() -> Json<Value> {
    Json(json!([post_json(1, "first"), post_json(2, "second")]))
}

async fn create_post(Json(body): Json<Value>) -> Json<Value> {
    let mut created = post_json(10, body["title"].as_str().unwrap_or_default());
    created["content"] = body["content"].clone();
    Json(created)
}

async fn get_post(Path(id): Path<i64>) -> Response {
    match id {
        401 => error_json(StatusCode::UNAUTHORIZED, "Token expired"),
        403 => error_json(StatusCode::FORBIDDEN, "Not your post"),
        404 => StatusCode::NOT_FOUND.into_response(),
        500 => (StatusCode::INTERNAL_SERVER_ERROR, "boom").into_response(),
        _ => Json(post_json(id, "fetched")).into_response(),
    }
}

async fn update_post(Path(id): Path<i64>, Json(body): Json<Value>) -> Json<Value> {
    Json(post_json(id, body["title"].as_str().unwrap_or_default()))
}

async fn search_posts(Query(query): Query<HashMap<String, String>>) -> Json<Value> {
    let title = format!(
        "{}:{}",
        query.get("keyword").map_or("", String::as_str),
        query.get("searchType").map_or("", String::as_str)
    );
    Json(json!([post_json(3, &title)]))
}

async fn sorted_posts(Query(query): Query<HashMap<String, String>>) -> Json<Value> {
    let title = format!(
        "{}:{}",
        query.get("sortBy").map_or("", String::as_str),
        query.get("category").map_or("", String::as_str)
    );
    Json(json!([post_json(4, &title)]))
}

async fn posts_by_category(Path(category): Path<String>) -> Json<Value> {
    let mut post = post_json(5, "categorized");
    post["category"] = Value::String(category);
    Json(json!([post]))
}

async fn list_comments(Path(post_id): Path<i64>) -> Json<Value> {
    Json(json!([{
        "id": 1,
        "author": "bob",
        "content": format!("on post {post_id}"),
        "userResponse": user_json("bob"),
    }]))
}

async fn create_comment(Path(_post_id): Path<i64>, Json(body): Json<Value>) -> Json<Value> {
    Json(json!({ "id": 2, "author": "alice", "content": body["content"] }))
}

async fn update_comment(Path(id): Path<i64>, Json(body): Json<Value>) -> Json<Value> {
    Json(json!({ "id": id, "content": body["content"] }))
}

async fn count_comments(Path(_post_id): Path<i64>) -> Json<u64> {
    Json(3)
}

async fn upload_files(Path(_post_id): Path<i64>, mut multipart: Multipart) -> Response {
    let mut attachments = Vec::new();
    while let Ok(Some(field)) = multipart.next_field().await {
        if field.name() != Some("files") {
            continue;
        }
        let name = field.file_name().unwrap_or_default().to_owned();
        let content_type = field.content_type().map(str::to_owned);
        let Ok(bytes) = field.bytes().await else {
            return StatusCode::BAD_REQUEST.into_response();
        };
        attachments.push(json!({
            "id": attachments.len() + 1,
            "originalFileName": name,
            "s3Url": format!("https://cdn.example/{name}"),
            "contentType": content_type,
            "fileSize": bytes.len(),
        }));
    }
    Json(attachments).into_response()
}

fn require_admin(headers: &HeaderMap) -> Result<(), Response> {
    match bearer_user(headers).as_deref() {
        Some("admin") => Ok(()),
        Some(_) => Err(error_json(StatusCode::FORBIDDEN, "Admin only")),
        None => Err(error_json(StatusCode::UNAUTHORIZED, "Not authenticated")),
    }
}

async fn admin_users(headers: HeaderMap) -> Response {
    if let Err(denied) = require_admin(&headers) {
        return denied;
    }
    Json(json!([user_json("admin"), user_json("alice")])).into_response()
}

async fn admin_posts(headers: HeaderMap) -> Response {
    if let Err(denied) = require_admin(&headers) {
        return denied;
    }
    let mut hidden = post_json(6, "hidden");
    hidden["isHidden"] = Value::Bool(true);
    Json(json!([post_json(1, "first"), hidden])).into_response()
}

async fn record_body(State(backend): State<Arc<Backend>>, Json(body): Json<Value>) -> StatusCode {
    lock(&backend.bodies).push(body);
    StatusCode::OK
}

async fn get_suspension(Path(id): Path<i64>) -> Response {
    match id {
        1 => StatusCode::NOT_FOUND.into_response(),
        2 => Json(json!({
            "id": 9,
            "suspendedBy": "admin",
            "reason": "spam",
            "startDate": "2024-05-01T09:00:00",
            "endDate": null,
            "isActive": true,
        }))
        .into_response(),
        _ => (StatusCode::INTERNAL_SERVER_ERROR, "lookup failed").into_response(),
    }
}

async fn ok() -> StatusCode {
    StatusCode::OK
}

async fn no_content() -> StatusCode {
    StatusCode::NO_CONTENT
}
