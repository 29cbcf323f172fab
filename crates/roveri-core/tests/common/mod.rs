#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use reqwest::{Method, StatusCode};
use roveri_core::{
    ApiClient, ApiError, ApiRequest, ApiResponse, SessionEvent, SessionHandle, Transport, User,
};
use tokio::sync::mpsc;

type Handler = dyn Fn(&ApiRequest) -> Result<ApiResponse, ApiError> + Send + Sync;

/// In-memory backend: answers every request with `handler` and records it.
pub struct ScriptedTransport {
    handler: Box<Handler>,
    requests: Mutex<Vec<ApiRequest>>,
    cookie_resets: AtomicUsize,
}

impl ScriptedTransport {
    pub fn new(
        handler: impl Fn(&ApiRequest) -> Result<ApiResponse, ApiError> + Send + Sync + 'static,
    ) -> Arc<Self> {
        Arc::new(Self {
            handler: Box::new(handler),
            requests: Mutex::new(Vec::new()),
            cookie_resets: AtomicUsize::new(0),
        })
    }

    pub fn requests(&self) -> Vec<ApiRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn count(&self, method: Method, path: &str) -> usize {
        self.requests
            .lock()
            .unwrap()
            .iter()
            .filter(|request| request.method == method && request.path == path)
            .count()
    }

    pub fn cookie_resets(&self) -> usize {
        self.cookie_resets.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Transport for ScriptedTransport {
    async fn send(&self, request: ApiRequest) -> Result<ApiResponse, ApiError> {
        self.requests.lock().unwrap().push(request.clone());
        (self.handler)(&request)
    }

    fn clear_cookies(&self) {
        self.cookie_resets.fetch_add(1, Ordering::SeqCst);
    }
}

pub fn json(status: u16, value: serde_json::Value) -> Result<ApiResponse, ApiError> {
    Ok(ApiResponse::new(
        StatusCode::from_u16(status).unwrap(),
        serde_json::to_vec(&value).unwrap(),
    ))
}

pub fn client_with(
    transport: &Arc<ScriptedTransport>,
    session: SessionHandle,
) -> (ApiClient, mpsc::UnboundedReceiver<SessionEvent>) {
    let (tx, rx) = mpsc::unbounded_channel();
    let client = ApiClient::new(transport.clone() as Arc<dyn Transport>, session).with_events(tx);
    (client, rx)
}

pub fn user_json(id: i64, username: &str) -> serde_json::Value {
    serde_json::json!({
        "id": id,
        "username": username,
        "email": format!("{username}@example.com"),
        "name": username,
    })
}

pub fn user(id: i64, username: &str) -> User {
    serde_json::from_value(user_json(id, username)).unwrap()
}

pub fn message_json(id: i64, room: i64, content: &str) -> serde_json::Value {
    serde_json::json!({
        "id": id,
        "room": room,
        "sender": 1,
        "sender_username": "ana",
        "content": content,
        "timestamp": format!("2025-05-01T12:00:{:02}Z", id % 60),
    })
}
