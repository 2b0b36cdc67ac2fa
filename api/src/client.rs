//! Pocketbook API client implementation

use crate::{config::ApiConfig, error::ApiError};
use reqwest::header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE};
use reqwest::{Client, Method, StatusCode};
use serde::{de::DeserializeOwned, Serialize};
use std::sync::{Arc, PoisonError, RwLock};
use std::time::{Duration, Instant};

const JSON: &str = "application/json";

/// Authenticated JSON client for the Pocketbook REST API
///
/// Cloning is cheap; clones share the connection pool and the bearer token.
///
/// The `Authorization` header is captured when a request is built, so a token
/// change never affects requests already in flight.
#[derive(Clone)]
pub struct ApiClient {
    client: Client,
    base_url: String,
    timeout: Duration,
    token: Arc<RwLock<Option<String>>>,
}

impl ApiClient {
    /// Create a client for the configured base URL and timeout
    #[must_use]
    pub fn new(config: ApiConfig) -> Self {
        Self {
            client: Client::new(),
            base_url: config.base_url,
            timeout: config.timeout,
            token: Arc::new(RwLock::new(None)),
        }
    }

    /// Base URL requests are sent to
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Per-request timeout
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Replace (or clear) the bearer token sent with future requests
    pub fn set_token(&self, token: Option<String>) {
        *self.token.write().unwrap_or_else(PoisonError::into_inner) = token;
    }

    /// Current bearer token
    #[must_use]
    pub fn token(&self) -> Option<String> {
        self.token
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Adopt `token` if one is given and it differs from the current one
    ///
    /// Called before every request. An absent token leaves the client untouched.
    pub fn ensure_token(&self, token: Option<&str>) {
        let Some(token) = token else {
            return;
        };

        let mut current = self.token.write().unwrap_or_else(PoisonError::into_inner);
        if current.as_deref() != Some(token) {
            tracing::debug!("Adopting new session token");
            *current = Some(token.to_string());
        }
    }

    /// Compose the absolute URL for `path`
    #[must_use]
    pub fn url(&self, path: &str) -> String {
        compose_url(&self.base_url, path)
    }

    /// Send a JSON request and parse the JSON response
    ///
    /// # Errors
    ///
    /// - [`ApiError::Timeout`] if send plus body read exceed the timeout
    /// - [`ApiError::Server`] for non-2xx responses
    /// - [`ApiError::Encode`] if `body` cannot be serialized
    /// - [`ApiError::Decode`] if a 2xx body does not parse as `T`
    /// - [`ApiError::Transport`] for network failures
    #[tracing::instrument(name = "api_request", skip_all, fields(method = %method, path = %path))]
    pub async fn request<T, B>(
        &self,
        method: Method,
        path: &str,
        query: &[(&str, String)],
        body: Option<&B>,
    ) -> Result<T, ApiError>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        let url = self.url(path);

        let mut builder = self
            .client
            .request(method.clone(), &url)
            .header(CONTENT_TYPE, JSON)
            .header(ACCEPT, JSON);

        if !query.is_empty() {
            builder = builder.query(query);
        }

        if let Some(token) = self.token() {
            builder = builder.header(AUTHORIZATION, format!("Bearer {token}"));
        }

        if let Some(body) = body {
            let bytes = serde_json::to_vec(body).map_err(|e| ApiError::Encode {
                message: e.to_string(),
            })?;
            builder = builder.body(bytes);
        }

        metrics::counter!("api.requests.total", "method" => method.to_string()).increment(1);
        let start = Instant::now();

        let outcome = tokio::time::timeout(self.timeout, async move {
            let response = builder.send().await.map_err(|e| ApiError::Transport {
                message: e.to_string(),
            })?;
            let status = response.status();
            let bytes = response.bytes().await.map_err(|e| ApiError::Transport {
                message: e.to_string(),
            })?;
            Ok::<_, ApiError>((status, bytes))
        })
        .await;

        metrics::histogram!("api.request.duration_seconds").record(start.elapsed().as_secs_f64());

        let result = match outcome {
            Err(_) => Err(ApiError::Timeout),
            Ok(Err(error)) => Err(error),
            Ok(Ok((status, bytes))) => {
                tracing::debug!(status = status.as_u16(), bytes = bytes.len(), "Response received");
                if status.is_success() {
                    parse_body(&bytes)
                } else {
                    Err(ApiError::Server {
                        status: status.as_u16(),
                        message: error_message(status, &bytes),
                    })
                }
            },
        };

        if let Err(error) = &result {
            metrics::counter!("api.requests.failed").increment(1);
            tracing::warn!(status = ?error.status(), error = %error, "API request failed");
        }

        result
    }

    /// `GET path`
    ///
    /// # Errors
    ///
    /// See [`ApiClient::request`].
    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        self.request::<T, ()>(Method::GET, path, &[], None).await
    }

    /// `GET path?query`
    ///
    /// # Errors
    ///
    /// See [`ApiClient::request`].
    pub async fn get_with_query<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<T, ApiError> {
        self.request::<T, ()>(Method::GET, path, query, None).await
    }

    /// `POST path` with a JSON body
    ///
    /// # Errors
    ///
    /// See [`ApiClient::request`].
    pub async fn post<T, B>(&self, path: &str, body: &B) -> Result<T, ApiError>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        self.request(Method::POST, path, &[], Some(body)).await
    }

    /// `PUT path` with a JSON body
    ///
    /// # Errors
    ///
    /// See [`ApiClient::request`].
    pub async fn put<T, B>(&self, path: &str, body: &B) -> Result<T, ApiError>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        self.request(Method::PUT, path, &[], Some(body)).await
    }

    /// `DELETE path`
    ///
    /// # Errors
    ///
    /// See [`ApiClient::request`].
    pub async fn delete<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        self.request::<T, ()>(Method::DELETE, path, &[], None).await
    }
}

impl std::fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiClient")
            .field("base_url", &self.base_url)
            .field("timeout", &self.timeout)
            .field("authenticated", &self.token().is_some())
            .finish_non_exhaustive()
    }
}

/// Join a base URL and a path with exactly one slash between them
///
/// One trailing slash is trimmed from the base; a leading slash is added to
/// the path when missing.
#[must_use]
pub fn compose_url(base_url: &str, path: &str) -> String {
    let base = base_url.strip_suffix('/').unwrap_or(base_url);
    if path.starts_with('/') {
        format!("{base}{path}")
    } else {
        format!("{base}/{path}")
    }
}

/// Path of the resource `id` inside `collection`
///
/// The id is percent-encoded as a single path segment, so `/`, `?` and `#`
/// in an id cannot reach another endpoint.
///
/// # Errors
///
/// Returns [`ApiError::Encode`] for an empty id or a dot segment (`.` or
/// `..`), which URL normalization would resolve to a different path.
pub fn resource_path(collection: &str, id: &str) -> Result<String, ApiError> {
    if matches!(id, "" | "." | "..") {
        return Err(ApiError::Encode {
            message: format!("invalid resource id {id:?}"),
        });
    }
    let collection = collection.strip_suffix('/').unwrap_or(collection);
    Ok(format!("{collection}/{}", urlencoding::encode(id)))
}

/// Parse a 2xx body; an empty body reads as JSON `null`
fn parse_body<T: DeserializeOwned>(bytes: &[u8]) -> Result<T, ApiError> {
    let bytes = if bytes.iter().all(u8::is_ascii_whitespace) {
        b"null".as_slice()
    } else {
        bytes
    };

    serde_json::from_slice(bytes).map_err(|e| ApiError::Decode {
        message: e.to_string(),
    })
}

/// Best human-readable message for a failed response
///
/// Prefers a JSON `message` field, then a JSON `error` field, then the raw
/// body, then `Error <status>: <reason>`.
fn error_message(status: StatusCode, bytes: &[u8]) -> String {
    if let Ok(serde_json::Value::Object(fields)) = serde_json::from_slice(bytes) {
        let field = ["message", "error"].into_iter().find_map(|key| {
            fields
                .get(key)
                .and_then(serde_json::Value::as_str)
                .filter(|s| !s.trim().is_empty())
        });
        if let Some(message) = field {
            return message.to_string();
        }
    }

    let text = String::from_utf8_lossy(bytes);
    if !text.trim().is_empty() {
        return text.into_owned();
    }

    format!(
        "Error {}: {}",
        status.as_u16(),
        status.canonical_reason().unwrap_or("Unknown Status")
    )
}
