use std::collections::BTreeMap;

use reqwest::StatusCode;
use serde::Deserialize;
use thiserror::Error;

use crate::gateway::{ApiResponse, GatewayError};

/// Error type for typed backend calls.
/// The gateway itself only fails on transport problems; everything an HTTP
/// status can mean is classified here.
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("Not authenticated")]
    NotAuthenticated,

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("Gateway error: {0}")]
    Gateway(#[from] GatewayError),

    #[error("JSON decode error: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Django REST framework error body: `{"detail": "..."}`.
#[derive(Debug, Deserialize)]
struct ErrorDetail {
    detail: String,
}

/// `{"detail": "..."}`, else the first message of a field error body such as
/// `{"email": ["user with this email already exists."]}`, else the raw text.
fn error_message(body: &str) -> String {
    if let Ok(e) = serde_json::from_str::<ErrorDetail>(body) {
        return e.detail;
    }
    if let Ok(fields) = serde_json::from_str::<BTreeMap<String, Vec<String>>>(body) {
        if let Some(first) = fields.into_values().find_map(|messages| messages.into_iter().next()) {
            return first;
        }
    }
    body.trim().to_string()
}

impl ClientError {
    /// Classifies a non-2xx response.
    pub fn from_response(response: &ApiResponse) -> Self {
        let message = error_message(&response.text());

        match response.status {
            StatusCode::UNAUTHORIZED => ClientError::NotAuthenticated,
            StatusCode::NOT_FOUND => ClientError::NotFound(if message.is_empty() {
                "Not found.".to_string()
            } else {
                message
            }),
            status => ClientError::Api {
                status: status.as_u16(),
                message: if message.is_empty() {
                    format!("Request failed with status {status}")
                } else {
                    message
                },
            },
        }
    }

    /// The message shown to the user when a call ultimately fails.
    pub fn user_message(&self) -> String {
        match self {
            ClientError::NotAuthenticated => "Please log in again.".to_string(),
            ClientError::Gateway(_) => "Network error. Please try again.".to_string(),
            ClientError::NotFound(msg)
            | ClientError::Validation(msg)
            | ClientError::Api { message: msg, .. } => msg.clone(),
            ClientError::Decode(_) => "Unexpected response from the server.".to_string(),
            ClientError::Io(e) => format!("Could not read file: {e}"),
        }
    }

    pub fn is_not_authenticated(&self) -> bool {
        matches!(self, ClientError::NotAuthenticated)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_unauthorized_maps_to_not_authenticated() {
        let err = ClientError::from_response(&ApiResponse::new(StatusCode::UNAUTHORIZED, ""));
        assert!(err.is_not_authenticated());
        assert_eq!(err.user_message(), "Please log in again.");
    }

    #[test]
    fn test_detail_is_extracted() {
        let response = ApiResponse::new(StatusCode::NOT_FOUND, r#"{"detail": "Profile not found."}"#);
        match ClientError::from_response(&response) {
            ClientError::NotFound(msg) => assert_eq!(msg, "Profile not found."),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_plain_body_becomes_message() {
        let response = ApiResponse::new(StatusCode::BAD_REQUEST, "  Generation failed.\n");
        let err = ClientError::from_response(&response);
        assert!(matches!(err, ClientError::Api { status: 400, .. }));
        assert_eq!(err.user_message(), "Generation failed.");
    }

    #[test]
    fn test_field_errors_yield_first_message() {
        let response = ApiResponse::new(
            StatusCode::BAD_REQUEST,
            r#"{"password": ["This password is too common."], "email": ["user with this email already exists."]}"#,
        );
        let err = ClientError::from_response(&response);
        assert_eq!(err.user_message(), "user with this email already exists.");
    }

    #[test]
    fn test_empty_body_gets_generic_message() {
        let err = ClientError::from_response(&ApiResponse::new(StatusCode::BAD_GATEWAY, ""));
        assert_eq!(err.user_message(), "Request failed with status 502 Bad Gateway");
    }

    #[test]
    fn test_gateway_errors_read_as_network_errors() {
        let err = ClientError::from(GatewayError::Timeout(Duration::from_secs(10)));
        assert_eq!(err.user_message(), "Network error. Please try again.");
    }
}
