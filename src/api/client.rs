use std::sync::Arc;

use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, CONTENT_TYPE};
use reqwest::{Method, RequestBuilder, Url};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tokio_util::sync::CancellationToken;
use tracing::debug;
use uuid::Uuid;

use crate::config::ClientConfig;
use crate::error::{AppError, AppResult};
use crate::identity::SessionStore;
use crate::navigation::Navigator;

use super::envelope::{error_message, ApiResponse};
use super::interceptor;

/// HTTP client for the DICRI backend.
///
/// Every request reads the bearer token from the store at send time, and every
/// failure passes through the interceptor before reaching the caller. There is
/// no retry.
#[derive(Clone)]
pub struct ApiClient {
    base: Url,
    http: reqwest::Client,
    store: Arc<SessionStore>,
    navigator: Arc<dyn Navigator>,
}

impl std::fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiClient").field("base", &self.base.as_str()).finish()
    }
}

impl ApiClient {
    pub fn new(cfg: &ClientConfig, store: Arc<SessionStore>, navigator: Arc<dyn Navigator>) -> AppResult<Self> {
        let base = cfg.parsed_base_url()?;
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        let http = reqwest::Client::builder().timeout(cfg.timeout).default_headers(headers).build()?;
        Ok(Self { base, http, store, navigator })
    }

    pub fn base_url(&self) -> &Url { &self.base }

    pub fn store(&self) -> &Arc<SessionStore> { &self.store }

    /// Resolve an API path such as `/expedientes?pagina=1` against the base URL.
    /// Absolute URLs on another origin are refused; the bearer token never
    /// leaves the backend's origin.
    pub fn url(&self, path: &str) -> AppResult<Url> {
        let url = self
            .base
            .join(path.trim_start_matches('/'))
            .map_err(|e| AppError::internal("invalid_path".to_string(), format!("{}: {}", path, e)))?;
        if url.origin() != self.base.origin() {
            return Err(AppError::validation("foreign_origin".to_string(), format!("{} is outside {}", path, self.base)));
        }
        Ok(url)
    }

    fn request(&self, method: Method, path: &str) -> AppResult<RequestBuilder> {
        let mut rb = self.http.request(method, self.url(path)?).header("x-request-id", Uuid::new_v4().to_string());
        if let Some(token) = self.store.token().filter(|t| !t.is_empty()) {
            rb = rb.bearer_auth(token);
        }
        Ok(rb)
    }

    async fn dispatch(&self, rb: RequestBuilder, path: &str, cancel: Option<&CancellationToken>) -> AppResult<Vec<u8>> {
        let exchange = async {
            let resp = rb.send().await?;
            let status = resp.status();
            let body = resp.bytes().await?;
            Ok::<_, reqwest::Error>((status, body.to_vec()))
        };
        let outcome = match cancel {
            Some(token) => tokio::select! {
                biased;
                _ = token.cancelled() => {
                    debug!(target: "api", "{} cancelled", path);
                    return Err(AppError::cancelled());
                }
                r = exchange => r,
            },
            None => exchange.await,
        };
        match outcome {
            Ok((status, body)) if status.is_success() => {
                debug!(target: "api", "{} -> {}", path, status.as_u16());
                Ok(body)
            }
            Ok((status, body)) => {
                let code = status.as_u16();
                debug!(target: "api", "{} -> {}", path, code);
                self.intercept(Some(code), path);
                Err(AppError::from_status(code, error_message(&body)))
            }
            Err(e) => {
                debug!(target: "api", "{} failed: {}", path, e);
                self.intercept(e.status().map(|s| s.as_u16()), path);
                Err(e.into())
            }
        }
    }

    fn intercept(&self, status: Option<u16>, path: &str) {
        let location = self.navigator.current_path();
        let action = interceptor::classify(status, path, &location);
        interceptor::apply(action, &self.store, self.navigator.as_ref());
    }

    async fn call<T: DeserializeOwned>(&self, rb: RequestBuilder, path: &str, cancel: Option<&CancellationToken>) -> AppResult<T> {
        let body = self.dispatch(rb, path, cancel).await?;
        Ok(serde_json::from_slice(&body)?)
    }

    pub async fn get<T: DeserializeOwned>(&self, path: &str, cancel: Option<&CancellationToken>) -> AppResult<T> {
        let rb = self.request(Method::GET, path)?;
        self.call(rb, path, cancel).await
    }

    pub async fn post<B, T>(&self, path: &str, body: &B, cancel: Option<&CancellationToken>) -> AppResult<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let rb = self.request(Method::POST, path)?.json(body);
        self.call(rb, path, cancel).await
    }

    pub async fn put<B, T>(&self, path: &str, body: &B, cancel: Option<&CancellationToken>) -> AppResult<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let rb = self.request(Method::PUT, path)?.json(body);
        self.call(rb, path, cancel).await
    }

    pub async fn delete<T: DeserializeOwned>(&self, path: &str, cancel: Option<&CancellationToken>) -> AppResult<T> {
        let rb = self.request(Method::DELETE, path)?;
        self.call(rb, path, cancel).await
    }

    /// Raw body of a GET, for file exports.
    pub async fn get_bytes(&self, path: &str, cancel: Option<&CancellationToken>) -> AppResult<Vec<u8>> {
        let rb = self.request(Method::GET, path)?;
        self.dispatch(rb, path, cancel).await
    }

    pub async fn get_data<T: DeserializeOwned>(&self, path: &str, cancel: Option<&CancellationToken>) -> AppResult<T> {
        self.get::<ApiResponse<T>>(path, cancel).await?.into_data()
    }

    pub async fn post_data<B, T>(&self, path: &str, body: &B, cancel: Option<&CancellationToken>) -> AppResult<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        self.post::<B, ApiResponse<T>>(path, body, cancel).await?.into_data()
    }

    pub async fn put_data<B, T>(&self, path: &str, body: &B, cancel: Option<&CancellationToken>) -> AppResult<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        self.put::<B, ApiResponse<T>>(path, body, cancel).await?.into_data()
    }

    /// POST whose envelope payload is ignored. Returns the server message.
    pub async fn post_unit<B: Serialize + ?Sized>(&self, path: &str, body: &B, cancel: Option<&CancellationToken>) -> AppResult<String> {
        self.post::<B, ApiResponse<serde_json::Value>>(path, body, cancel).await?.into_unit()
    }

    pub async fn put_unit<B: Serialize + ?Sized>(&self, path: &str, body: &B, cancel: Option<&CancellationToken>) -> AppResult<String> {
        self.put::<B, ApiResponse<serde_json::Value>>(path, body, cancel).await?.into_unit()
    }
}
