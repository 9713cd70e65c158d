//! Typed HTTP client for the `/api/v1` backend.
//!
//! Every request carries the stored bearer token. Failures are classified once,
//! here: a 401 outside `/auth/...` clears the session and navigates to `/login`,
//! other errors go to the [`Notifier`]. Auth endpoints are exempt from both so a
//! login form can show the error inline.
//!
//! Service functions live in the submodules and return the unwrapped `data`
//! of the `{data}` envelope, or a [`Paginated`] for lists.

pub mod auth;
pub mod employees;
pub mod error;
pub mod movements;
pub mod notifications;
pub mod organization;
pub mod payroll;
pub mod session;
pub mod templates;

use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use reqwest::{Method, RequestBuilder};
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::pagination::{Envelope, Paginated};

pub use error::{ClientError, ClientResult};
pub use session::{MemorySession, SessionStore};

pub const DEFAULT_API_URL: &str = "http://localhost:3000/api/v1";
pub const LOGIN_PATH: &str = "/login";

#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub base_url: String,
    pub timeout: Duration,
}

impl ClientConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            timeout: Duration::from_secs(30),
        }
    }

    /// `HRMS_API_URL`, falling back to the local development server.
    pub fn from_env() -> Self {
        let base_url =
            std::env::var("HRMS_API_URL").unwrap_or_else(|_| DEFAULT_API_URL.to_string());
        let mut config = Self::new(base_url);
        if let Some(secs) = std::env::var("HRMS_API_TIMEOUT_SECS")
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
        {
            config.timeout = Duration::from_secs(secs);
        }
        config
    }
}

/// Where the client sends the user when the session ends.
pub trait Navigator: Send + Sync {
    fn navigate(&self, path: &str);
}

/// Surfaces classified errors to the user.
pub trait Notifier: Send + Sync {
    fn error(&self, err: &ClientError);
}

pub struct NoopNavigator;

impl Navigator for NoopNavigator {
    fn navigate(&self, path: &str) {
        tracing::debug!("navigation to {path} requested");
    }
}

pub struct TracingNotifier;

impl Notifier for TracingNotifier {
    fn error(&self, err: &ClientError) {
        tracing::warn!("{err}");
    }
}

#[derive(Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
    session: Arc<dyn SessionStore>,
    navigator: Arc<dyn Navigator>,
    notifier: Arc<dyn Notifier>,
}

fn is_auth_path(path: &str) -> bool {
    path.trim_start_matches('/').starts_with("auth/")
}

/// Pull the backend's message out of an error body (`{"error": ..}` or `{"message": ..}`).
fn error_message(status: reqwest::StatusCode, body: &str) -> String {
    serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|v| {
            v.get("error")
                .or_else(|| v.get("message"))
                .and_then(|m| m.as_str())
                .map(str::to_string)
        })
        .or_else(|| Some(body.trim().to_string()).filter(|b| !b.is_empty()))
        .unwrap_or_else(|| {
            status
                .canonical_reason()
                .unwrap_or("Request failed")
                .to_string()
        })
}

/// Flatten a params struct into query pairs, skipping `None` fields.
pub fn query_pairs<Q: Serialize>(params: &Q) -> ClientResult<Vec<(String, String)>> {
    let value = serde_json::to_value(params)
        .map_err(|e| ClientError::InvalidInput(format!("Unencodable query: {e}")))?;
    let serde_json::Value::Object(map) = value else {
        return Err(ClientError::InvalidInput(
            "Query parameters must be a struct".to_string(),
        ));
    };
    Ok(map
        .into_iter()
        .filter_map(|(key, value)| match value {
            serde_json::Value::Null => None,
            serde_json::Value::String(s) => Some((key, s)),
            other => Some((key, other.to_string())),
        })
        .collect())
}

impl ApiClient {
    pub fn new(config: ClientConfig, session: Arc<dyn SessionStore>) -> ClientResult<Self> {
        let http = reqwest::Client::builder().timeout(config.timeout).build()?;
        Ok(Self {
            http,
            base_url: config.base_url,
            session,
            navigator: Arc::new(NoopNavigator),
            notifier: Arc::new(TracingNotifier),
        })
    }

    pub fn with_navigator(mut self, navigator: Arc<dyn Navigator>) -> Self {
        self.navigator = navigator;
        self
    }

    pub fn with_notifier(mut self, notifier: Arc<dyn Notifier>) -> Self {
        self.notifier = notifier;
        self
    }

    pub fn session(&self) -> &Arc<dyn SessionStore> {
        &self.session
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let req = self.http.request(method, self.url(path));
        match self.session.token() {
            Some(token) => req.bearer_auth(token),
            None => req,
        }
    }

    /// Route a classified error to the session teardown or the notifier.
    fn report(&self, path: &str, err: &ClientError) {
        if is_auth_path(path) {
            return;
        }
        match err {
            ClientError::Unauthorized(_) => {
                self.session.clear();
                self.navigator.navigate(LOGIN_PATH);
            }
            err => self.notifier.error(err),
        }
    }

    async fn send(&self, path: &str, req: RequestBuilder) -> ClientResult<reqwest::Response> {
        let response = match req.send().await {
            Ok(r) => r,
            Err(e) => {
                let err = ClientError::Http(e);
                self.report(path, &err);
                return Err(err);
            }
        };

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        let err = ClientError::from_status(status.as_u16(), error_message(status, &body));
        self.report(path, &err);
        Err(err)
    }

    async fn decode<T: DeserializeOwned>(
        &self,
        path: &str,
        req: RequestBuilder,
    ) -> ClientResult<T> {
        let response = self.send(path, req).await?;
        let bytes = response.bytes().await?;
        serde_json::from_slice(&bytes).map_err(|e| {
            let err = ClientError::InvalidResponse(format!("{path}: {e}"));
            self.report(path, &err);
            err
        })
    }

    async fn data<T: DeserializeOwned>(&self, path: &str, req: RequestBuilder) -> ClientResult<T> {
        let envelope: Envelope<T> = self.decode(path, req).await?;
        Ok(envelope.data)
    }

    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> ClientResult<T> {
        self.data(path, self.request(Method::GET, path)).await
    }

    pub async fn get_with<T: DeserializeOwned, Q: Serialize>(
        &self,
        path: &str,
        params: &Q,
    ) -> ClientResult<T> {
        let pairs = query_pairs(params)?;
        let url = with_query(path, &pairs);
        self.data(path, self.request(Method::GET, &url)).await
    }

    /// List endpoint: `{data, pagination}` (or the older `{data, meta}`).
    pub async fn get_page<T: DeserializeOwned, Q: Serialize>(
        &self,
        path: &str,
        params: &Q,
    ) -> ClientResult<Paginated<T>> {
        let pairs = query_pairs(params)?;
        let url = with_query(path, &pairs);
        self.decode(path, self.request(Method::GET, &url)).await
    }

    pub async fn post<T: DeserializeOwned, B: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &B,
    ) -> ClientResult<T> {
        self.data(path, self.request(Method::POST, path).json(body)).await
    }

    pub async fn post_empty<T: DeserializeOwned>(&self, path: &str) -> ClientResult<T> {
        self.data(path, self.request(Method::POST, path)).await
    }

    pub async fn put<T: DeserializeOwned, B: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &B,
    ) -> ClientResult<T> {
        self.data(path, self.request(Method::PUT, path).json(body)).await
    }

    pub async fn put_empty<T: DeserializeOwned>(&self, path: &str) -> ClientResult<T> {
        self.data(path, self.request(Method::PUT, path)).await
    }

    pub async fn delete(&self, path: &str) -> ClientResult<()> {
        let _: serde_json::Value = self.data(path, self.request(Method::DELETE, path)).await?;
        Ok(())
    }

    pub async fn upload<T: DeserializeOwned>(
        &self,
        path: &str,
        form: reqwest::multipart::Form,
    ) -> ClientResult<T> {
        self.data(path, self.request(Method::POST, path).multipart(form))
            .await
    }

    /// Raw response body, for file downloads.
    pub async fn download(&self, path: &str) -> ClientResult<Bytes> {
        let response = self.send(path, self.request(Method::GET, path)).await?;
        Ok(response.bytes().await?)
    }
}

fn with_query(path: &str, pairs: &[(String, String)]) -> String {
    if pairs.is_empty() {
        return path.to_string();
    }
    let query = form_urlencoded::Serializer::new(String::new())
        .extend_pairs(pairs)
        .finish();
    format!("{path}?{query}")
}

/// Multipart part for a file body; the server derives the MIME type from the name.
pub fn file_part(file_name: &str, bytes: Vec<u8>) -> reqwest::multipart::Part {
    reqwest::multipart::Part::bytes(bytes).file_name(file_name.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    #[derive(Serialize)]
    struct Params {
        page: Option<i64>,
        search: Option<String>,
        company_id: Option<Uuid>,
        unread_only: bool,
    }

    #[test]
    fn none_fields_are_left_out_of_the_query() {
        let id = Uuid::nil();
        let pairs = query_pairs(&Params {
            page: Some(2),
            search: None,
            company_id: Some(id),
            unread_only: true,
        })
        .unwrap();

        assert!(pairs.contains(&("page".to_string(), "2".to_string())));
        assert!(pairs.contains(&("company_id".to_string(), id.to_string())));
        assert!(pairs.contains(&("unread_only".to_string(), "true".to_string())));
        assert!(!pairs.iter().any(|(k, _)| k == "search"));
    }

    #[test]
    fn query_values_are_encoded() {
        let url = with_query(
            "/employees",
            &[("search".to_string(), "budi & sari".to_string())],
        );
        assert_eq!(url, "/employees?search=budi+%26+sari");
        assert_eq!(with_query("/employees", &[]), "/employees");
    }

    #[test]
    fn auth_paths_are_exempt() {
        assert!(is_auth_path("/auth/login"));
        assert!(is_auth_path("auth/refresh"));
        assert!(!is_auth_path("/employees"));
        assert!(!is_auth_path("/users/auth/x"));
    }

    #[test]
    fn error_message_prefers_the_backend_text() {
        let status = reqwest::StatusCode::UNPROCESSABLE_ENTITY;
        assert_eq!(error_message(status, r#"{"error":"bad reason"}"#), "bad reason");
        assert_eq!(error_message(status, r#"{"message":"nope"}"#), "nope");
        assert_eq!(error_message(status, "plain"), "plain");
        assert_eq!(error_message(status, ""), "Unprocessable Entity");
    }

    #[test]
    fn config_trims_trailing_slash() {
        assert_eq!(ClientConfig::new("http://x/api/v1/").base_url, "http://x/api/v1");
    }
}
