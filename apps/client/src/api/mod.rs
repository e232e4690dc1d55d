//! Typed backend calls, one submodule per backend app.
//!
//! Every call except login and logout goes through [`Gateway::fetch`], so an
//! expired session is refreshed once before the caller sees a `401`.

use serde::{de::DeserializeOwned, Serialize};

use crate::errors::ClientError;
use crate::gateway::{ApiRequest, ApiResponse, Gateway};

pub mod auth;
pub mod drafts;
pub mod generation;
pub mod profiles;

#[derive(Clone)]
pub struct BackendClient {
    gateway: Gateway,
}

impl BackendClient {
    pub fn new(gateway: Gateway) -> Self {
        Self { gateway }
    }

    pub fn gateway(&self) -> &Gateway {
        &self.gateway
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, ClientError> {
        let response = self.gateway.fetch(path, &ApiRequest::get()).await?;
        decode(response)
    }

    async fn send_json<B, T>(
        &self,
        path: &str,
        request: ApiRequest,
        payload: &B,
    ) -> Result<T, ClientError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let request = request.json(payload)?;
        let response = self.gateway.fetch(path, &request).await?;
        decode(response)
    }

    async fn delete(&self, path: &str) -> Result<(), ClientError> {
        let response = self.gateway.fetch(path, &ApiRequest::delete()).await?;
        ensure_success(response).map(|_| ())
    }
}

/// Passes 2xx responses through, classifies everything else.
pub(crate) fn ensure_success(response: ApiResponse) -> Result<ApiResponse, ClientError> {
    if response.is_success() {
        Ok(response)
    } else {
        Err(ClientError::from_response(&response))
    }
}

pub(crate) fn decode<T: DeserializeOwned>(response: ApiResponse) -> Result<T, ClientError> {
    let response = ensure_success(response)?;
    Ok(response.json()?)
}

#[cfg(test)]
pub(crate) mod testing {
    use std::sync::Arc;

    use crate::gateway::testing::{gateway, ScriptedTransport};

    use super::BackendClient;

    pub fn client(transport: &Arc<ScriptedTransport>) -> BackendClient {
        BackendClient::new(gateway(transport))
    }
}

#[cfg(test)]
mod tests {
    use reqwest::StatusCode;

    use super::*;

    #[test]
    fn test_decode_success() {
        let value: serde_json::Value =
            decode(ApiResponse::new(StatusCode::OK, r#"{"ok": true}"#)).unwrap();
        assert_eq!(value["ok"], true);
    }

    #[test]
    fn test_decode_error_status() {
        let err = decode::<serde_json::Value>(ApiResponse::new(StatusCode::FORBIDDEN, "nope"))
            .unwrap_err();
        assert!(matches!(err, ClientError::Api { status: 403, .. }));
    }

    #[test]
    fn test_decode_bad_body() {
        let err =
            decode::<serde_json::Value>(ApiResponse::new(StatusCode::OK, "<html>")).unwrap_err();
        assert!(matches!(err, ClientError::Decode(_)));
    }
}
