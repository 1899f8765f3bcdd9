//! Request pipeline
//!
//! Every API call goes through [`HttpPipeline`]: the installed bearer header is
//! attached, the response status is shown to each registered
//! [`ResponseHandler`], error bodies are mapped to [`ClientError`], and
//! requests marked retryable are re-sent on any failure other than a 401,
//! according to the pipeline's [`RetryPolicy`].

use std::sync::Arc;
use std::time::Duration;

use parking_lot::RwLock;
use reqwest::header::AUTHORIZATION;
use reqwest::{Client, Method};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};
use url::Url;

use super::handlers::ResponseHandler;
use super::retry::RetryPolicy;
use crate::auth::credential::Credential;
use crate::error::ClientError;

/// The single installed `Authorization` header value, shared between the
/// session manager (writer) and the pipeline (reader).
#[derive(Clone, Default)]
pub struct AuthHeader(Arc<RwLock<Option<String>>>);

impl AuthHeader {
    pub fn install(&self, credential: &Credential) {
        *self.0.write() = Some(credential.bearer_value());
    }

    pub fn remove(&self) {
        *self.0.write() = None;
    }

    pub fn current(&self) -> Option<String> {
        self.0.read().clone()
    }

    pub fn is_installed(&self) -> bool {
        self.0.read().is_some()
    }
}

impl std::fmt::Debug for AuthHeader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthHeader")
            .field("installed", &self.is_installed())
            .finish()
    }
}

/// A request to one API endpoint.
#[derive(Debug, Clone)]
pub struct ApiRequest {
    method: Method,
    path: String,
    query: Vec<(String, String)>,
    body: Option<serde_json::Value>,
    retryable: bool,
}

impl ApiRequest {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            query: Vec::new(),
            body: None,
            retryable: false,
        }
    }

    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::GET, path)
    }

    pub fn post(path: impl Into<String>) -> Self {
        Self::new(Method::POST, path)
    }

    pub fn put(path: impl Into<String>) -> Self {
        Self::new(Method::PUT, path)
    }

    pub fn delete(path: impl Into<String>) -> Self {
        Self::new(Method::DELETE, path)
    }

    pub fn query(mut self, key: impl Into<String>, value: impl ToString) -> Self {
        self.query.push((key.into(), value.to_string()));
        self
    }

    pub fn json<T: Serialize + ?Sized>(mut self, body: &T) -> Result<Self, ClientError> {
        let value = serde_json::to_value(body)
            .map_err(|e| ClientError::Decode(format!("failed to encode request body: {e}")))?;
        self.body = Some(value);
        Ok(self)
    }

    /// Opt in to the pipeline's retry policy.
    pub fn retryable(mut self) -> Self {
        self.retryable = true;
        self
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn is_retryable(&self) -> bool {
        self.retryable
    }
}

/// Acknowledgement body returned by write endpoints.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Ack {
    #[serde(default)]
    pub message: Option<String>,
}

/// Shared dispatcher for every API call.
///
/// Holds the base URL, the bearer header, the retry policy and the
/// registered [`ResponseHandler`]s. Share it behind an `Arc`.
pub struct HttpPipeline {
    client: Client,
    base: Url,
    auth: AuthHeader,
    retry: RetryPolicy,
    handlers: RwLock<Vec<Arc<dyn ResponseHandler>>>,
}

impl HttpPipeline {
    /// `timeout` applies to each attempt separately.
    pub fn new(base: Url, timeout: Duration, retry: RetryPolicy) -> Result<Self, ClientError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ClientError::Config(format!("failed to create HTTP client: {e}")))?;
        Ok(Self::with_client(client, base, retry))
    }

    /// Use a custom reqwest client (connection pool reuse or testing).
    pub fn with_client(client: Client, base: Url, retry: RetryPolicy) -> Self {
        Self {
            client,
            base,
            auth: AuthHeader::default(),
            retry,
            handlers: RwLock::new(Vec::new()),
        }
    }

    pub fn auth_header(&self) -> &AuthHeader {
        &self.auth
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        self.retry
    }

    pub fn base_url(&self) -> &Url {
        &self.base
    }

    /// Registers a handler; handlers run in registration order.
    pub fn add_handler(&self, handler: Arc<dyn ResponseHandler>) {
        self.handlers.write().push(handler);
    }

    /// Sends the request and decodes a JSON response body.
    pub async fn send_json<T: DeserializeOwned>(&self, request: ApiRequest) -> Result<T, ClientError> {
        let body = self.execute(&request).await?;
        serde_json::from_str(&body).map_err(|e| {
            ClientError::Decode(format!("{} {}: {e}", request.method, request.path))
        })
    }

    /// Sends the request; a success body that does not decode as `T` yields
    /// `T::default()` instead of an error.
    pub async fn send_lenient<T: DeserializeOwned + Default>(&self, request: ApiRequest) -> Result<T, ClientError> {
        let body = self.execute(&request).await?;
        Ok(serde_json::from_str(&body).unwrap_or_else(|e| {
            debug!("{} {}: ignoring undecodable body: {}", request.method, request.path, e);
            T::default()
        }))
    }

    /// Sends the request, accepting any (or no) success body.
    pub async fn send_ack(&self, request: ApiRequest) -> Result<Ack, ClientError> {
        self.send_lenient(request).await
    }

    async fn execute(&self, request: &ApiRequest) -> Result<String, ClientError> {
        let policy = if request.retryable {
            self.retry
        } else {
            RetryPolicy::none()
        };

        let mut attempt = 0;
        loop {
            attempt += 1;
            match self.dispatch(request).await {
                Ok(body) => return Ok(body),
                Err(err) if policy.retries(&err) && policy.should_retry(attempt) => {
                    let delay = policy.delay_for(attempt);
                    warn!(
                        "{} {} failed (attempt {}/{}): {}; retrying in {:?}",
                        request.method,
                        request.path,
                        attempt,
                        policy.max_attempts(),
                        err,
                        delay
                    );
                    tokio::time::sleep(delay).await;
                }
                Err(err) => return Err(err),
            }
        }
    }

    async fn dispatch(&self, request: &ApiRequest) -> Result<String, ClientError> {
        let url = self.endpoint(&request.path)?;
        debug!("→ {} {}", request.method, url);

        let mut builder = self.client.request(request.method.clone(), url);
        if !request.query.is_empty() {
            builder = builder.query(&request.query);
        }
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }
        if let Some(value) = self.auth.current() {
            builder = builder.header(AUTHORIZATION, value);
        }

        let response = builder.send().await?;
        let status = response.status();
        debug!("← {} {} {}", status.as_u16(), request.method, request.path);

        let handlers = self.handlers.read().clone();
        for handler in &handlers {
            handler.on_response(status);
        }

        let body = response.text().await?;
        if status.is_success() {
            Ok(body)
        } else {
            Err(ClientError::from_response(status, &body))
        }
    }

    fn endpoint(&self, path: &str) -> Result<Url, ClientError> {
        let base = self.base.as_str().trim_end_matches('/');
        let path = path.trim_start_matches('/');
        Url::parse(&format!("{base}/{path}"))
            .map_err(|e| ClientError::Config(format!("invalid endpoint {path}: {e}")))
    }
}
