//! HTTP gateway for the tasks REST API.
//!
//! Wraps [`reqwest`] with the configured base URL, sends and receives JSON,
//! and decodes the uniform `{success, data, error, message}` envelope every
//! endpoint responds with. Outgoing requests are decorated with the current
//! session's identity headers when one exists.

use std::sync::Arc;

use reqwest::{Method, RequestBuilder};
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::app::models::ApiResponse;
use crate::app::session::SessionStore;

/// Errors from the API transport layer.
///
/// Application-level failures (`success:false` envelopes) are not errors
/// here; they come back as a decoded [`ApiResponse`] and are handled by the
/// flows.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// The HTTP request itself failed (network, DNS, TLS, timeout).
    #[error("HTTP request failed: {0}")]
    Transport(#[from] reqwest::Error),

    /// Non-2xx response whose body is not an envelope.
    #[error("API returned HTTP {status}: {body}")]
    Status {
        /// HTTP status code.
        status: u16,
        /// Raw response body for diagnostics.
        body: String,
    },

    /// 2xx response whose body could not be decoded as an envelope.
    #[error("could not decode API response: {0}")]
    Decode(#[from] serde_json::Error),
}

/// JSON client for one API deployment.
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
    session: Arc<SessionStore>,
}

impl ApiClient {
    /// Create a client for the given base URL, e.g. `http://host:3000/api`.
    pub fn new(base_url: String, session: Arc<SessionStore>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url,
            session,
        }
    }

    pub async fn get<T: DeserializeOwned>(
        &self,
        endpoint: &str,
    ) -> Result<ApiResponse<T>, ApiError> {
        self.execute(self.request(Method::GET, endpoint)).await
    }

    pub async fn post<T: DeserializeOwned, B: Serialize>(
        &self,
        endpoint: &str,
        body: &B,
    ) -> Result<ApiResponse<T>, ApiError> {
        self.execute(self.request(Method::POST, endpoint).json(body))
            .await
    }

    pub async fn put<T: DeserializeOwned, B: Serialize>(
        &self,
        endpoint: &str,
        body: &B,
    ) -> Result<ApiResponse<T>, ApiError> {
        self.execute(self.request(Method::PUT, endpoint).json(body))
            .await
    }

    pub async fn delete<T: DeserializeOwned>(
        &self,
        endpoint: &str,
    ) -> Result<ApiResponse<T>, ApiError> {
        self.execute(self.request(Method::DELETE, endpoint)).await
    }

    fn request(&self, method: Method, endpoint: &str) -> RequestBuilder {
        let builder = self
            .http
            .request(method, format!("{}{}", self.base_url, endpoint))
            .header(reqwest::header::CONTENT_TYPE, "application/json");
        self.authorize(builder)
    }

    /// Pure decoration step: attach the current user's identity headers.
    ///
    /// With no session the request goes out unauthenticated; that is not an
    /// error and nothing is retried or short-circuited here.
    fn authorize(&self, builder: RequestBuilder) -> RequestBuilder {
        match self.session.current_user() {
            Some(user) => builder
                .header("User-Id", user.id)
                .header(reqwest::header::AUTHORIZATION, format!("Bearer {}", user.token)),
            None => builder,
        }
    }

    async fn execute<T: DeserializeOwned>(
        &self,
        builder: RequestBuilder,
    ) -> Result<ApiResponse<T>, ApiError> {
        let response = builder.send().await?;
        let status = response.status();
        let body = response.text().await?;

        match serde_json::from_str::<ApiResponse<T>>(&body) {
            Ok(envelope) => Ok(envelope),
            // A non-2xx without an envelope is a transport-class failure.
            Err(_) if !status.is_success() => Err(ApiError::Status {
                status: status.as_u16(),
                body,
            }),
            Err(err) => Err(ApiError::Decode(err)),
        }
    }
}
