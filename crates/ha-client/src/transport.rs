//! Transport seam between the session logic and an HTTP stack

use crate::error::ClientError;
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Method {
    Get,
    Post,
    Put,
    Patch,
    Delete,
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Method::Get => "GET",
            Method::Post => "POST",
            Method::Put => "PUT",
            Method::Patch => "PATCH",
            Method::Delete => "DELETE",
        };
        f.write_str(name)
    }
}

/// One API call
#[derive(Debug, Clone, PartialEq)]
pub struct ApiRequest {
    pub method: Method,
    /// Path below the API root, e.g. `/api/me`
    pub path: String,
    pub body: Option<Value>,
    /// Sent as `Authorization: Bearer …`
    pub access_token: Option<String>,
    /// Set once the request has been replayed after a refresh
    pub retried: bool,
}

impl ApiRequest {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            body: None,
            access_token: None,
            retried: false,
        }
    }

    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::Get, path)
    }

    pub fn post(path: impl Into<String>, body: Value) -> Self {
        Self::new(Method::Post, path).with_body(body)
    }

    pub fn put(path: impl Into<String>, body: Value) -> Self {
        Self::new(Method::Put, path).with_body(body)
    }

    pub fn delete(path: impl Into<String>) -> Self {
        Self::new(Method::Delete, path)
    }

    pub fn with_body(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ApiResponse {
    pub status: u16,
    pub body: Value,
}

impl ApiResponse {
    pub fn new(status: u16, body: Value) -> Self {
        Self { status, body }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    pub fn is_unauthorized(&self) -> bool {
        self.status == 401
    }

    /// Decode a success body, or turn an error status into [`ClientError::Api`]
    pub fn into_json<T: DeserializeOwned>(self) -> Result<T, ClientError> {
        if !self.is_success() {
            return Err(ClientError::from_response(self.status, &self.body));
        }
        Ok(serde_json::from_value(self.body)?)
    }
}

/// Sends requests to the API server
#[async_trait]
pub trait ApiTransport: Send + Sync {
    /// Perform the request. Only connection-level failures are errors; HTTP
    /// error statuses come back as responses.
    async fn send(&self, request: ApiRequest) -> Result<ApiResponse, ClientError>;
}

#[async_trait]
impl<T: ApiTransport + ?Sized> ApiTransport for std::sync::Arc<T> {
    async fn send(&self, request: ApiRequest) -> Result<ApiResponse, ClientError> {
        (**self).send(request).await
    }
}
