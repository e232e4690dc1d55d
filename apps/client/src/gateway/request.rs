//! Request descriptors and buffered responses exchanged with a [`Transport`](super::Transport).
//!
//! An `ApiRequest` owns everything needed to put it on the wire, including
//! multipart file bytes, so the gateway can replay it after a session refresh
//! without rebuilding anything from the caller.

use std::time::Duration;

use bytes::Bytes;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, CONTENT_TYPE};
use reqwest::{Method, StatusCode};
use serde::{de::DeserializeOwned, Serialize};

#[derive(Debug, Clone, PartialEq)]
pub struct ApiRequest {
    pub method: Method,
    pub headers: HeaderMap,
    pub body: RequestBody,
    /// Per-request override of the gateway's default timeout.
    pub timeout: Option<Duration>,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub enum RequestBody {
    #[default]
    Empty,
    /// Pre-serialized JSON document.
    Json(Bytes),
    Multipart(MultipartForm),
}

impl ApiRequest {
    pub fn new(method: Method) -> Self {
        Self {
            method,
            headers: HeaderMap::new(),
            body: RequestBody::Empty,
            timeout: None,
        }
    }

    pub fn get() -> Self {
        Self::new(Method::GET)
    }

    pub fn post() -> Self {
        Self::new(Method::POST)
    }

    pub fn patch() -> Self {
        Self::new(Method::PATCH)
    }

    pub fn delete() -> Self {
        Self::new(Method::DELETE)
    }

    /// Serializes `payload` once and sets `Content-Type: application/json`.
    pub fn json<T: Serialize + ?Sized>(mut self, payload: &T) -> Result<Self, serde_json::Error> {
        let encoded = serde_json::to_vec(payload)?;
        self.headers
            .insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        self.body = RequestBody::Json(Bytes::from(encoded));
        Ok(self)
    }

    /// The transport sets the multipart content type (with its boundary) itself.
    pub fn multipart(mut self, form: MultipartForm) -> Self {
        self.body = RequestBody::Multipart(form);
        self
    }

    pub fn header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.insert(name, value);
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }
}

/// Multipart form data kept as owned parts so it can be sent more than once.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct MultipartForm {
    pub parts: Vec<FormPart>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FormPart {
    pub name: String,
    pub value: PartValue,
}

#[derive(Debug, Clone, PartialEq)]
pub enum PartValue {
    Text(String),
    File {
        file_name: String,
        mime: Option<String>,
        data: Bytes,
    },
}

impl MultipartForm {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn text(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.parts.push(FormPart {
            name: name.into(),
            value: PartValue::Text(value.into()),
        });
        self
    }

    pub fn file(
        mut self,
        name: impl Into<String>,
        file_name: impl Into<String>,
        mime: Option<String>,
        data: Bytes,
    ) -> Self {
        self.parts.push(FormPart {
            name: name.into(),
            value: PartValue::File {
                file_name: file_name.into(),
                mime,
                data,
            },
        });
        self
    }

    /// Builds a fresh `reqwest` form. Called once per dispatch.
    pub(crate) fn to_wire(&self) -> reqwest::Result<reqwest::multipart::Form> {
        let mut form = reqwest::multipart::Form::new();
        for part in &self.parts {
            form = match &part.value {
                PartValue::Text(text) => form.text(part.name.clone(), text.clone()),
                PartValue::File {
                    file_name,
                    mime,
                    data,
                } => {
                    let mut wire =
                        reqwest::multipart::Part::bytes(data.to_vec()).file_name(file_name.clone());
                    if let Some(mime) = mime {
                        wire = wire.mime_str(mime)?;
                    }
                    form.part(part.name.clone(), wire)
                }
            };
        }
        Ok(form)
    }
}

/// A fully buffered backend response, handed back to callers untouched.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Bytes,
}

impl ApiResponse {
    pub fn new(status: StatusCode, body: impl Into<Bytes>) -> Self {
        Self {
            status,
            headers: HeaderMap::new(),
            body: body.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }

    /// Body as text; invalid UTF-8 is replaced rather than rejected.
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }

    pub fn json<T: DeserializeOwned>(&self) -> Result<T, serde_json::Error> {
        serde_json::from_slice(&self.body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_json_sets_body_and_content_type() {
        let request = ApiRequest::post()
            .json(&json!({"job_description": "Rust engineer"}))
            .unwrap();

        assert_eq!(request.headers[CONTENT_TYPE], "application/json");
        match request.body {
            RequestBody::Json(bytes) => {
                let value: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
                assert_eq!(value["job_description"], "Rust engineer");
            }
            other => panic!("expected JSON body, got {other:?}"),
        }
    }

    #[test]
    fn test_clone_is_identical() {
        let form = MultipartForm::new().text("profile", "{}").file(
            "resume_file",
            "cv.pdf",
            Some("application/pdf".to_string()),
            Bytes::from_static(b"%PDF-1.4"),
        );
        let request = ApiRequest::post()
            .multipart(form)
            .timeout(Duration::from_secs(3));

        assert_eq!(request.clone(), request);
    }

    #[test]
    fn test_to_wire_rejects_bad_mime() {
        let form = MultipartForm::new().file(
            "resume_file",
            "cv.pdf",
            Some("not a mime".to_string()),
            Bytes::new(),
        );
        assert!(form.to_wire().is_err());
    }

    #[test]
    fn test_response_text_and_json() {
        let response = ApiResponse::new(StatusCode::OK, r#"{"email":"a@b.co"}"#);
        assert!(response.is_success());
        assert_eq!(response.text(), r#"{"email":"a@b.co"}"#);
        let value: serde_json::Value = response.json().unwrap();
        assert_eq!(value["email"], "a@b.co");
    }
}
