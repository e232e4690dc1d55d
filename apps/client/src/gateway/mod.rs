/// Authenticated Request Gateway: the single entry point for backend calls.
///
/// Every call carries the session cookie. A `401` triggers exactly one
/// `POST /auth/jwt/refresh/`; if that succeeds the original request is
/// replayed exactly once and its outcome is returned as-is. At most three
/// network calls happen per logical request.
///
/// The gateway keeps no state between calls. Concurrent requests that all
/// hit `401` each issue their own refresh; there is no coalescing.
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::StatusCode;
use thiserror::Error;
use tracing::{debug, warn};

pub mod request;
pub mod transport;

pub use request::{ApiRequest, ApiResponse, MultipartForm, RequestBody};
pub use transport::HttpTransport;

pub const DEFAULT_BASE_URL: &str = "http://localhost:8000";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);
/// Exchanges the refresh cookie for a new access cookie.
pub const REFRESH_PATH: &str = "/auth/jwt/refresh/";

#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("request timed out after {}ms", .0.as_millis())]
    Timeout(Duration),

    #[error("transport error: {0}")]
    Transport(String),

    #[error("invalid request: {0}")]
    Request(String),
}

/// Puts a single request on the wire. Implementations must always send the
/// session credentials and must never retry on their own.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(
        &self,
        url: &str,
        request: &ApiRequest,
        timeout: Duration,
    ) -> Result<ApiResponse, GatewayError>;
}

#[derive(Clone)]
pub struct Gateway {
    transport: Arc<dyn Transport>,
    base_url: String,
    timeout: Duration,
}

impl Gateway {
    /// Gateway over a cookie-keeping HTTP client.
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, GatewayError> {
        let transport = HttpTransport::new()?;
        Ok(Self::with_transport(Arc::new(transport), base_url, timeout))
    }

    pub fn with_transport(
        transport: Arc<dyn Transport>,
        base_url: impl Into<String>,
        timeout: Duration,
    ) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self {
            transport,
            base_url,
            timeout,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Absolute `http(s)` URLs pass through verbatim; anything else is
    /// appended to the base URL.
    pub fn resolve_url(&self, target: &str) -> String {
        if is_absolute_url(target) {
            return target.to_string();
        }
        if target.is_empty() {
            self.base_url.clone()
        } else if target.starts_with('/') {
            format!("{}{}", self.base_url, target)
        } else {
            format!("{}/{}", self.base_url, target)
        }
    }

    /// Sends `request` to `target`, surviving one session expiry.
    ///
    /// HTTP error statuses are returned as responses, never as `Err`. Only
    /// transport failures and timeouts of the original call or the replay
    /// produce an error.
    pub async fn fetch(
        &self,
        target: &str,
        request: &ApiRequest,
    ) -> Result<ApiResponse, GatewayError> {
        let url = self.resolve_url(target);
        let timeout = request.timeout.unwrap_or(self.timeout);

        debug!("{} {}", request.method, url);
        let response = self.transport.send(&url, request, timeout).await?;
        if response.status != StatusCode::UNAUTHORIZED {
            return Ok(response);
        }

        warn!("{} {} returned 401, refreshing session", request.method, url);
        if !self.refresh_session().await {
            return Ok(response);
        }

        debug!("Session refreshed, replaying {} {}", request.method, url);
        self.transport.send(&url, request, timeout).await
    }

    /// Sends `request` once with credentials and no refresh handling.
    /// Used for calls that establish or tear down the session.
    pub async fn send_once(
        &self,
        target: &str,
        request: &ApiRequest,
    ) -> Result<ApiResponse, GatewayError> {
        let url = self.resolve_url(target);
        let timeout = request.timeout.unwrap_or(self.timeout);
        debug!("{} {}", request.method, url);
        self.transport.send(&url, request, timeout).await
    }

    /// One refresh attempt. Transport failures count as "not refreshed".
    async fn refresh_session(&self) -> bool {
        let url = self.resolve_url(REFRESH_PATH);
        match self
            .transport
            .send(&url, &ApiRequest::post(), self.timeout)
            .await
        {
            Ok(response) if response.is_success() => true,
            Ok(response) => {
                warn!("Session refresh rejected with {}", response.status);
                false
            }
            Err(e) => {
                warn!("Session refresh failed: {e}");
                false
            }
        }
    }
}

fn is_absolute_url(target: &str) -> bool {
    reqwest::Url::parse(target)
        .map(|url| matches!(url.scheme(), "http" | "https"))
        .unwrap_or(false)
}

#[cfg(test)]
pub(crate) mod testing {
    //! Scripted transport shared by the gateway and API client tests.

    use std::collections::VecDeque;
    use std::sync::Mutex;

    use super::*;

    #[derive(Debug, Clone)]
    pub struct RecordedCall {
        pub url: String,
        pub request: ApiRequest,
        pub timeout: Duration,
    }

    /// Replies with queued outcomes in order and records every call.
    /// Panics if more calls arrive than replies were queued.
    #[derive(Default)]
    pub struct ScriptedTransport {
        replies: Mutex<VecDeque<Result<ApiResponse, GatewayError>>>,
        calls: Mutex<Vec<RecordedCall>>,
    }

    impl ScriptedTransport {
        pub fn new(replies: Vec<Result<ApiResponse, GatewayError>>) -> Arc<Self> {
            Arc::new(Self {
                replies: Mutex::new(replies.into()),
                calls: Mutex::new(Vec::new()),
            })
        }

        pub fn calls(&self) -> Vec<RecordedCall> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl Transport for ScriptedTransport {
        async fn send(
            &self,
            url: &str,
            request: &ApiRequest,
            timeout: Duration,
        ) -> Result<ApiResponse, GatewayError> {
            self.calls.lock().unwrap().push(RecordedCall {
                url: url.to_string(),
                request: request.clone(),
                timeout,
            });
            self.replies
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| panic!("unexpected call to {url}"))
        }
    }

    pub fn reply(status: StatusCode, body: &str) -> Result<ApiResponse, GatewayError> {
        Ok(ApiResponse::new(status, body.to_string()))
    }

    pub fn gateway(transport: &Arc<ScriptedTransport>) -> Gateway {
        Gateway::with_transport(transport.clone(), "http://api.test", DEFAULT_TIMEOUT)
    }
}
