//! Authenticated access to the Roveri API.
//!
//! Every call goes out with the transport's cookie jar and, when one is held,
//! the current access token as a bearer header. A 401 triggers exactly one
//! refresh exchange (`POST token/refresh/`, driven by the refresh cookie) and
//! one retry of the original request. If the exchange fails the session is
//! torn down and `SessionEvent::SignInRequired` is emitted.
//!
//! Two requests failing with 401 at the same time each run their own refresh.

use std::sync::Arc;

use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::error::ApiError;
use crate::session::SessionHandle;
use crate::transport::{
    ApiRequest, ApiResponse, MultipartForm, ReqwestTransport, RequestBody, Transport,
};

pub const REFRESH_PATH: &str = "token/refresh/";

/// Signals from the client to whatever owns navigation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEvent {
    /// The session is gone; show the sign-in screen.
    SignInRequired,
}

#[derive(Deserialize)]
struct RefreshResponse {
    #[serde(default)]
    access: Option<String>,
}

#[derive(Clone)]
pub struct ApiClient {
    transport: Arc<dyn Transport>,
    session: SessionHandle,
    events: Option<mpsc::UnboundedSender<SessionEvent>>,
}

impl ApiClient {
    pub fn new(transport: Arc<dyn Transport>, session: SessionHandle) -> Self {
        Self {
            transport,
            session,
            events: None,
        }
    }

    pub fn from_config(config: &Config, session: SessionHandle) -> anyhow::Result<Self> {
        let transport = ReqwestTransport::new(&config.base_url()?, config.request_timeout())?;
        Ok(Self::new(Arc::new(transport), session))
    }

    pub fn with_events(mut self, events: mpsc::UnboundedSender<SessionEvent>) -> Self {
        self.events = Some(events);
        self
    }

    pub fn session(&self) -> &SessionHandle {
        &self.session
    }

    /// Send `request`, recovering once from an expired access token.
    pub async fn execute(&self, request: ApiRequest) -> Result<ApiResponse, ApiError> {
        let mut retried = false;
        loop {
            let response = self.send_once(&request).await?;
            if response.status != StatusCode::UNAUTHORIZED || retried {
                return response.error_for_status();
            }
            retried = true;
            debug!(method = %request.method, path = %request.path, "access token rejected");
            self.refresh_or_end_session().await?;
        }
    }

    async fn send_once(&self, request: &ApiRequest) -> Result<ApiResponse, ApiError> {
        let outbound = request
            .clone()
            .with_bearer(self.session.access_token());
        self.transport.send(outbound).await
    }

    async fn refresh_or_end_session(&self) -> Result<(), ApiError> {
        match self.refresh().await {
            Ok(()) => Ok(()),
            Err(error) => {
                warn!(%error, "token refresh failed, ending session");
                self.end_session();
                Err(ApiError::SessionExpired)
            }
        }
    }

    async fn refresh(&self) -> Result<(), ApiError> {
        let request = ApiRequest::post(REFRESH_PATH)
            .with_body(RequestBody::Json(serde_json::json!({})));
        let response = self.transport.send(request).await?.error_for_status()?;

        match response.json::<RefreshResponse>().ok().and_then(|r| r.access) {
            Some(access) => {
                self.session.set_access_token(access);
                info!("access token refreshed");
            }
            None => debug!("refresh succeeded without a new access token"),
        }
        Ok(())
    }

    /// Wipe all local credential state and ask for the sign-in screen.
    pub fn end_session(&self) {
        self.session.clear();
        self.transport.clear_cookies();
        if let Some(events) = &self.events {
            let _ = events.send(SessionEvent::SignInRequired);
        }
    }

    /// Local sign-out without the navigation signal.
    pub(crate) fn forget_session(&self) {
        self.session.clear();
        self.transport.clear_cookies();
    }

    pub async fn get_json<T>(&self, path: &str) -> Result<T, ApiError>
    where
        T: for<'de> Deserialize<'de>,
    {
        self.execute(ApiRequest::get(path)).await?.json()
    }

    pub async fn post_json<Req, Res>(&self, path: &str, payload: &Req) -> Result<Res, ApiError>
    where
        Req: Serialize + ?Sized,
        Res: for<'de> Deserialize<'de>,
    {
        self.execute(ApiRequest::post_json(path, payload)?)
            .await?
            .json()
    }

    /// POST with no body, ignoring whatever the backend answers on success.
    pub async fn post_empty(&self, path: &str) -> Result<(), ApiError> {
        self.execute(ApiRequest::post(path)).await.map(|_| ())
    }

    pub async fn post_multipart<Res>(&self, path: &str, form: MultipartForm) -> Result<Res, ApiError>
    where
        Res: for<'de> Deserialize<'de>,
    {
        self.execute(ApiRequest::post(path).with_body(RequestBody::Multipart(form)))
            .await?
            .json()
    }

    pub async fn delete(&self, path: &str) -> Result<(), ApiError> {
        self.execute(ApiRequest::delete(path)).await.map(|_| ())
    }
}
