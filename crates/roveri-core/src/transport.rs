use std::sync::{Arc, RwLock};
use std::time::Duration;

use async_trait::async_trait;
use reqwest::cookie::Jar;
use reqwest::multipart::{Form, Part};
use reqwest::{Method, StatusCode};
use serde::Serialize;
use tracing::debug;
use uuid::Uuid;

use crate::error::ApiError;

/// An outbound call described as plain data so it can be re-issued.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiRequest {
    pub method: Method,
    pub path: String,
    pub body: RequestBody,
    pub bearer: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum RequestBody {
    Empty,
    Json(serde_json::Value),
    Multipart(MultipartForm),
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct MultipartForm {
    pub fields: Vec<(String, String)>,
    pub file: Option<FilePart>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FilePart {
    pub field: String,
    pub file_name: String,
    pub bytes: Vec<u8>,
}

impl ApiRequest {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            body: RequestBody::Empty,
            bearer: None,
        }
    }

    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::GET, path)
    }

    pub fn delete(path: impl Into<String>) -> Self {
        Self::new(Method::DELETE, path)
    }

    pub fn post(path: impl Into<String>) -> Self {
        Self::new(Method::POST, path)
    }

    pub fn post_json<T: Serialize + ?Sized>(
        path: impl Into<String>,
        payload: &T,
    ) -> Result<Self, ApiError> {
        let body = serde_json::to_value(payload).map_err(|error| ApiError::Decode {
            message: error.to_string(),
        })?;
        Ok(Self::post(path).with_body(RequestBody::Json(body)))
    }

    pub fn with_body(mut self, body: RequestBody) -> Self {
        self.body = body;
        self
    }

    pub fn with_bearer(mut self, token: Option<String>) -> Self {
        self.bearer = token;
        self
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ApiResponse {
    pub status: StatusCode,
    pub body: Vec<u8>,
}

impl ApiResponse {
    pub fn new(status: StatusCode, body: impl Into<Vec<u8>>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    pub fn json<T>(&self) -> Result<T, ApiError>
    where
        T: for<'de> serde::Deserialize<'de>,
    {
        serde_json::from_slice::<T>(&self.body).map_err(|error| ApiError::Decode {
            message: error.to_string(),
        })
    }

    /// Success passes through; anything else becomes the matching `ApiError`.
    pub fn error_for_status(self) -> Result<Self, ApiError> {
        if self.status.is_success() {
            Ok(self)
        } else {
            Err(ApiError::from_status(self.status, &self.body))
        }
    }
}

/// The wire underneath `ApiClient`. Cookies set by the backend (access and
/// refresh) are kept by the transport and sent on every call.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(&self, request: ApiRequest) -> Result<ApiResponse, ApiError>;

    /// Forget every cookie, including the refresh credential.
    fn clear_cookies(&self);
}

pub struct ReqwestTransport {
    base_url: String,
    timeout: Duration,
    http: RwLock<reqwest::Client>,
}

impl ReqwestTransport {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, ApiError> {
        Ok(Self {
            base_url: base_url.trim().trim_end_matches('/').to_string(),
            timeout,
            http: RwLock::new(build_http_client()?),
        })
    }

    pub fn endpoint(&self, path: &str) -> String {
        let trimmed = path.trim();
        if trimmed.starts_with('/') {
            format!("{}{}", self.base_url, trimmed)
        } else {
            format!("{}/{}", self.base_url, trimmed)
        }
    }

    fn client(&self) -> reqwest::Client {
        self.http
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }
}

fn build_http_client() -> Result<reqwest::Client, ApiError> {
    reqwest::Client::builder()
        .cookie_provider(Arc::new(Jar::default()))
        .build()
        .map_err(ApiError::from)
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn send(&self, request: ApiRequest) -> Result<ApiResponse, ApiError> {
        let url = self.endpoint(&request.path);
        let request_id = format!("req_{}", Uuid::new_v4().simple());
        debug!(method = %request.method, %url, %request_id, "sending request");

        let mut builder = self
            .client()
            .request(request.method.clone(), url.as_str())
            .header("x-request-id", request_id)
            .timeout(self.timeout);

        if let Some(token) = &request.bearer {
            builder = builder.bearer_auth(token);
        }

        builder = match request.body {
            RequestBody::Empty => builder,
            RequestBody::Json(value) => builder.json(&value),
            RequestBody::Multipart(form) => builder.multipart(to_reqwest_form(form)),
        };

        let response = builder.send().await?;
        let status = response.status();
        let body = response.bytes().await?;
        debug!(%status, bytes = body.len(), "response received");
        Ok(ApiResponse::new(status, body.to_vec()))
    }

    fn clear_cookies(&self) {
        match build_http_client() {
            Ok(client) => {
                *self.http.write().unwrap_or_else(|poisoned| poisoned.into_inner()) = client;
            }
            Err(error) => tracing::error!(%error, "failed to reset cookie jar"),
        }
    }
}

fn to_reqwest_form(form: MultipartForm) -> Form {
    let mut out = Form::new();
    for (key, value) in form.fields {
        out = out.text(key, value);
    }
    if let Some(file) = form.file {
        out = out.part(file.field, Part::bytes(file.bytes).file_name(file.file_name));
    }
    out
}
