//! HTTP client wrapper for the board REST API.
//!
//! REQUEST PHASE
//! =============
//! Every request is resolved against the configured base URL and carries
//! `Authorization: Bearer <token>` when durable storage holds a token. Logout
//! passes its token explicitly because the session is cleared before it runs.
//!
//! RESPONSE PHASE
//! ==============
//! Success responses pass through. Failures are converted to
//! [`ApiError::Status`] after the recovery policy runs:
//! - 401 clears the session and moves history to `/login` (once);
//! - 403 notifies the user, session untouched;
//! - everything else is only logged.

#[cfg(test)]
#[path = "http_test.rs"]
mod http_test;

use std::sync::Arc;
#[cfg(not(target_arch = "wasm32"))]
use std::time::Duration;

use reqwest::{Method, RequestBuilder, Response};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use super::error::{ApiError, STATUS_FORBIDDEN, STATUS_NOT_FOUND, STATUS_UNAUTHORIZED};
use crate::config::ClientConfig;
use crate::navigation::{LOGIN_PATH, Navigator};
use crate::notify::{Notice, Notifier};
use crate::session::{ClearReason, SessionContext};

/// Maximum number of error body characters surfaced to callers.
const MAX_ERROR_CHARS: usize = 200;
const EMPTY_ERROR_MESSAGE: &str = "Request failed.";

#[derive(Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
    session: Arc<SessionContext>,
    navigator: Arc<dyn Navigator>,
    notifier: Arc<dyn Notifier>,
}

impl ApiClient {
    /// Build a client for `config.api_base_url`.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client fails to build.
    #[cfg_attr(target_arch = "wasm32", allow(unused_variables))]
    pub fn new(
        config: &ClientConfig,
        session: Arc<SessionContext>,
        navigator: Arc<dyn Navigator>,
        notifier: Arc<dyn Notifier>,
    ) -> Result<Self, ApiError> {
        let builder = reqwest::Client::builder();
        #[cfg(not(target_arch = "wasm32"))]
        let builder = builder
            .timeout(Duration::from_secs(config.timeouts.request_secs))
            .connect_timeout(Duration::from_secs(config.timeouts.connect_secs));
        let http = builder.build().map_err(|e| ApiError::ClientBuild(e.to_string()))?;

        Ok(Self {
            http,
            base_url: config.api_base_url.trim_end_matches('/').to_owned(),
            session,
            navigator,
            notifier,
        })
    }

    #[must_use]
    pub fn session(&self) -> &Arc<SessionContext> {
        &self.session
    }

    // =========================================================================
    // TYPED HELPERS
    // =========================================================================

    /// `GET path`, decoding a JSON body.
    ///
    /// # Errors
    ///
    /// Returns an error on transport failure, non-success status or a body
    /// that does not decode as `T`.
    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        let response = self.execute(Method::GET, path, |r| r).await?;
        decode_json(response).await
    }

    /// `GET path?query`, decoding a JSON body.
    ///
    /// # Errors
    ///
    /// Same as [`ApiClient::get`].
    pub async fn get_with_query<T, Q>(&self, path: &str, query: &Q) -> Result<T, ApiError>
    where
        T: DeserializeOwned,
        Q: Serialize + ?Sized,
    {
        let response = self.execute(Method::GET, path, |r| r.query(query)).await?;
        decode_json(response).await
    }

    /// `POST path` with a JSON body, decoding a JSON response.
    ///
    /// # Errors
    ///
    /// Same as [`ApiClient::get`].
    pub async fn post<B, T>(&self, path: &str, body: &B) -> Result<T, ApiError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let response = self.execute(Method::POST, path, |r| r.json(body)).await?;
        decode_json(response).await
    }

    /// `PUT path` with a JSON body, decoding a JSON response.
    ///
    /// # Errors
    ///
    /// Same as [`ApiClient::get`].
    pub async fn put<B, T>(&self, path: &str, body: &B) -> Result<T, ApiError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let response = self.execute(Method::PUT, path, |r| r.json(body)).await?;
        decode_json(response).await
    }

    /// `POST path` with no body; the response body is ignored.
    ///
    /// # Errors
    ///
    /// Returns an error on transport failure or non-success status.
    pub async fn post_empty(&self, path: &str) -> Result<(), ApiError> {
        self.execute(Method::POST, path, |r| r).await?;
        Ok(())
    }

    /// `POST path` with no body, carrying `token` instead of the stored one.
    ///
    /// # Errors
    ///
    /// Returns an error on transport failure or non-success status.
    pub async fn post_empty_with_token(&self, path: &str, token: Option<&str>) -> Result<(), ApiError> {
        self.send(Method::POST, path, token, |r| r).await?;
        Ok(())
    }

    /// `POST path` with a JSON body; the response body is ignored.
    ///
    /// # Errors
    ///
    /// Returns an error on transport failure or non-success status.
    pub async fn post_json_empty<B: Serialize + ?Sized>(&self, path: &str, body: &B) -> Result<(), ApiError> {
        self.execute(Method::POST, path, |r| r.json(body)).await?;
        Ok(())
    }

    /// `POST path?query` with no body; the response body is ignored.
    ///
    /// # Errors
    ///
    /// Returns an error on transport failure or non-success status.
    pub async fn post_query_empty<Q: Serialize + ?Sized>(&self, path: &str, query: &Q) -> Result<(), ApiError> {
        self.execute(Method::POST, path, |r| r.query(query)).await?;
        Ok(())
    }

    /// `DELETE path`; the response body is ignored.
    ///
    /// # Errors
    ///
    /// Returns an error on transport failure or non-success status.
    pub async fn delete(&self, path: &str) -> Result<(), ApiError> {
        self.execute(Method::DELETE, path, |r| r).await?;
        Ok(())
    }

    /// `POST path` with a multipart body, decoding a JSON response.
    ///
    /// # Errors
    ///
    /// Same as [`ApiClient::get`].
    pub async fn post_multipart<T: DeserializeOwned>(
        &self,
        path: &str,
        form: reqwest::multipart::Form,
    ) -> Result<T, ApiError> {
        let response = self.execute(Method::POST, path, |r| r.multipart(form)).await?;
        decode_json(response).await
    }

    // =========================================================================
    // PIPELINE
    // =========================================================================

    /// Send one request through the token and recovery pipeline.
    ///
    /// `build` customizes the request (body, query) after the URL and bearer
    /// header are set.
    ///
    /// # Errors
    ///
    /// Returns an error on storage read failure, transport failure or a
    /// non-success status.
    pub async fn execute(
        &self,
        method: Method,
        path: &str,
        build: impl FnOnce(RequestBuilder) -> RequestBuilder,
    ) -> Result<Response, ApiError> {
        let token = self.session.stored_token()?;
        self.send(method, path, token.as_deref(), build).await
    }

    async fn send(
        &self,
        method: Method,
        path: &str,
        token: Option<&str>,
        build: impl FnOnce(RequestBuilder) -> RequestBuilder,
    ) -> Result<Response, ApiError> {
        let mut request = self.http.request(method.clone(), build_url(&self.base_url, path));
        match token {
            Some(token) => {
                debug!(%method, %path, "api request with token");
                request = request.bearer_auth(token);
            }
            None => debug!(%method, %path, "api request without token"),
        }

        let response = build(request).send().await?;
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        Err(self.recover(status.as_u16(), path, &body).await)
    }

    async fn recover(&self, status: u16, path: &str, body: &str) -> ApiError {
        let message = error_message(body);
        match status {
            STATUS_UNAUTHORIZED => self.handle_unauthorized(path).await,
            STATUS_FORBIDDEN => {
                warn!(%path, %message, "access denied");
                self.notifier.notify(Notice::AccessDenied { message: message.clone() });
            }
            STATUS_NOT_FOUND => debug!(%path, "api 404"),
            _ => warn!(status, %path, %message, "api error"),
        }
        ApiError::Status { status, message }
    }

    async fn handle_unauthorized(&self, path: &str) {
        match self.session.clear(ClearReason::Unauthorized).await {
            Ok(true) => warn!(%path, "session rejected by backend; cleared"),
            Ok(false) => debug!(%path, "401 with no session to clear"),
            Err(e) => warn!(error = %e, "failed to clear rejected session from storage"),
        }
        if self.navigator.current_path() != LOGIN_PATH {
            self.navigator.push(LOGIN_PATH);
        }
    }
}

async fn decode_json<T: DeserializeOwned>(response: Response) -> Result<T, ApiError> {
    let text = response.text().await?;
    Ok(serde_json::from_str(&text)?)
}

/// Join the base URL and an API path.
pub(crate) fn build_url(base_url: &str, path: &str) -> String {
    let base = base_url.trim().trim_end_matches('/');
    let path = path.trim().trim_start_matches('/');
    if path.is_empty() {
        base.to_owned()
    } else {
        format!("{base}/{path}")
    }
}

/// Percent-encode one path segment (spaces become `%20`, `/` is escaped).
pub(crate) fn encode_segment(segment: &str) -> String {
    url::form_urlencoded::byte_serialize(segment.as_bytes())
        .collect::<String>()
        .replace('+', "%20")
}

/// User-facing message for an error body: the `message` field of a JSON
/// error payload when present, else the raw body, trimmed and truncated.
pub(crate) fn error_message(body: &str) -> String {
    #[derive(serde::Deserialize)]
    struct ErrorBody {
        message: Option<String>,
    }

    let trimmed = body.trim();
    if trimmed.is_empty() {
        return EMPTY_ERROR_MESSAGE.to_owned();
    }
    let parsed = serde_json::from_str::<ErrorBody>(trimmed)
        .ok()
        .and_then(|payload| payload.message)
        .filter(|message| !message.trim().is_empty());
    let text = parsed.as_deref().map_or(trimmed, str::trim);
    text.chars().take(MAX_ERROR_CHARS).collect()
}
