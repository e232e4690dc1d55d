use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;

use super::request::{ApiRequest, ApiResponse, RequestBody};
use super::{GatewayError, Transport};

/// `reqwest`-backed transport. The cookie store is always on, so the session
/// cookie is attached to every request and `Set-Cookie` headers from the
/// refresh endpoint update it in place.
#[derive(Clone)]
pub struct HttpTransport {
    client: Client,
}

impl HttpTransport {
    pub fn new() -> Result<Self, GatewayError> {
        let client = Client::builder()
            .cookie_store(true)
            .build()
            .map_err(|e| GatewayError::Request(format!("failed to build HTTP client: {e}")))?;
        Ok(Self { client })
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn send(
        &self,
        url: &str,
        request: &ApiRequest,
        timeout: Duration,
    ) -> Result<ApiResponse, GatewayError> {
        let mut builder = self
            .client
            .request(request.method.clone(), url)
            .headers(request.headers.clone())
            .timeout(timeout);

        builder = match &request.body {
            RequestBody::Empty => builder,
            RequestBody::Json(bytes) => builder.body(bytes.clone()),
            RequestBody::Multipart(form) => {
                let wire = form
                    .to_wire()
                    .map_err(|e| GatewayError::Request(e.to_string()))?;
                builder.multipart(wire)
            }
        };

        // The timeout covers connecting through reading the last body byte.
        let response = builder
            .send()
            .await
            .map_err(|e| classify(e, timeout))?;
        let status = response.status();
        let headers = response.headers().clone();
        let body = response.bytes().await.map_err(|e| classify(e, timeout))?;

        Ok(ApiResponse {
            status,
            headers,
            body,
        })
    }
}

fn classify(error: reqwest::Error, timeout: Duration) -> GatewayError {
    if error.is_timeout() {
        GatewayError::Timeout(timeout)
    } else if error.is_builder() {
        GatewayError::Request(error.to_string())
    } else {
        GatewayError::Transport(error.to_string())
    }
}

#[cfg(test)]
mod tests {
    use std::net::SocketAddr;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};

    use axum::{
        body::Bytes,
        extract::State,
        http::{header, HeaderMap, StatusCode},
        response::{IntoResponse, Response},
        routing::{get, post},
        Json, Router,
    };
    use serde_json::json;

    use super::*;
    use crate::gateway::{Gateway, MultipartForm, DEFAULT_TIMEOUT};

    #[derive(Clone, Default)]
    struct Backend {
        refreshes: Arc<AtomicUsize>,
        uploads: Arc<Mutex<Vec<Vec<u8>>>>,
    }

    fn has_fresh_session(headers: &HeaderMap) -> bool {
        headers
            .get(header::COOKIE)
            .and_then(|v| v.to_str().ok())
            .map(|cookies| cookies.contains("access=fresh"))
            .unwrap_or(false)
    }

    async fn refresh(State(backend): State<Backend>) -> Response {
        backend.refreshes.fetch_add(1, Ordering::SeqCst);
        (
            [(header::SET_COOKIE, "access=fresh; Path=/; HttpOnly")],
            Json(json!({})),
        )
            .into_response()
    }

    async fn me(headers: HeaderMap) -> Response {
        if has_fresh_session(&headers) {
            Json(json!({"email": "ada@example.com", "first_name": "Ada"})).into_response()
        } else {
            (StatusCode::UNAUTHORIZED, "token_not_valid").into_response()
        }
    }

    async fn parse_resume(
        State(backend): State<Backend>,
        headers: HeaderMap,
        body: Bytes,
    ) -> Response {
        backend.uploads.lock().unwrap().push(body.to_vec());
        if has_fresh_session(&headers) {
            Json(json!({"skills": [{"name": "Rust"}]})).into_response()
        } else {
            StatusCode::UNAUTHORIZED.into_response()
        }
    }

    async fn slow() -> &'static str {
        tokio::time::sleep(Duration::from_millis(500)).await;
        "late"
    }

    async fn spawn_backend(backend: Backend) -> SocketAddr {
        let app = Router::new()
            .route("/auth/jwt/refresh/", post(refresh))
            .route("/auth/users/me/", get(me))
            .route("/profiles/profile/parse_resume/", post(parse_resume))
            .route("/slow/", get(slow))
            .with_state(backend);

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        addr
    }

    #[tokio::test]
    async fn test_refresh_cookie_is_sent_on_retry() {
        let backend = Backend::default();
        let addr = spawn_backend(backend.clone()).await;
        let gw = Gateway::new(format!("http://{addr}"), DEFAULT_TIMEOUT).unwrap();

        let response = gw.fetch("/auth/users/me/", &ApiRequest::get()).await.unwrap();

        assert_eq!(response.status.as_u16(), 200);
        let user: serde_json::Value = response.json().unwrap();
        assert_eq!(user["email"], "ada@example.com");
        assert_eq!(backend.refreshes.load(Ordering::SeqCst), 1);

        // The cookie jar now holds the fresh session; no further refresh.
        let again = gw.fetch("/auth/users/me/", &ApiRequest::get()).await.unwrap();
        assert_eq!(again.status.as_u16(), 200);
        assert_eq!(backend.refreshes.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_multipart_body_is_replayed() {
        let backend = Backend::default();
        let addr = spawn_backend(backend.clone()).await;
        let gw = Gateway::new(format!("http://{addr}"), DEFAULT_TIMEOUT).unwrap();

        let form = MultipartForm::new().file(
            "resume_file",
            "cv.pdf",
            Some("application/pdf".to_string()),
            bytes::Bytes::from_static(b"%PDF-1.4 resume body"),
        );
        let response = gw
            .fetch(
                "/profiles/profile/parse_resume/",
                &ApiRequest::post().multipart(form),
            )
            .await
            .unwrap();

        assert_eq!(response.status.as_u16(), 200);
        let uploads = backend.uploads.lock().unwrap().clone();
        assert_eq!(uploads.len(), 2);
        for upload in uploads {
            let text = String::from_utf8_lossy(&upload).into_owned();
            assert!(text.contains("filename=\"cv.pdf\""));
            assert!(text.contains("%PDF-1.4 resume body"));
        }
    }

    #[tokio::test]
    async fn test_timeout_is_reported_and_not_refreshed() {
        let backend = Backend::default();
        let addr = spawn_backend(backend.clone()).await;
        let gw = Gateway::new(format!("http://{addr}"), DEFAULT_TIMEOUT).unwrap();

        let request = ApiRequest::get().timeout(Duration::from_millis(50));
        let err = gw.fetch("/slow/", &request).await.unwrap_err();

        assert!(matches!(err, GatewayError::Timeout(d) if d == Duration::from_millis(50)));
        assert_eq!(backend.refreshes.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_connection_refused_is_transport_error() {
        // Bind then drop to get a port with nothing listening.
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let gw = Gateway::new(format!("http://{addr}"), DEFAULT_TIMEOUT).unwrap();
        let err = gw
            .fetch("/auth/users/me/", &ApiRequest::get())
            .await
            .unwrap_err();

        assert!(matches!(err, GatewayError::Transport(_)));
    }
}
