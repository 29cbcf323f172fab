mod common;

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Method, StatusCode};
use roveri_core::api::chat::messages_path;
use roveri_core::client::REFRESH_PATH;
use roveri_core::{
    ApiClient, ApiError, ApiRequest, ApiResponse, ChatSync, Message, SessionEvent, SessionHandle,
    Transport,
};
use tokio::time::sleep;

use common::{client_with, json, message_json, ScriptedTransport};

const INTERVAL: Duration = Duration::from_secs(3);
const SETTLE: Duration = Duration::from_millis(10);

/// Backend whose rooms each hold a server-side message list; POST appends.
fn chat_backend() -> (Arc<ScriptedTransport>, Arc<Mutex<Vec<serde_json::Value>>>) {
    let server = Arc::new(Mutex::new(vec![
        message_json(1, 7, "hello"),
        message_json(2, 7, "is the dog still available?"),
    ]));
    let store = Arc::clone(&server);
    let transport = ScriptedTransport::new(move |request| {
        if request.method == Method::GET {
            if request.path == messages_path(7) {
                return json(200, serde_json::Value::Array(store.lock().unwrap().clone()));
            }
            return json(200, serde_json::json!([]));
        }
        let content = match &request.body {
            roveri_core::transport::RequestBody::Json(body) => {
                body["content"].as_str().unwrap_or_default().to_string()
            }
            _ => String::new(),
        };
        let mut messages = store.lock().unwrap();
        let created = message_json(messages.len() as i64 + 1, 7, &content);
        messages.push(created.clone());
        json(201, created)
    });
    (transport, server)
}

fn ids(messages: &[Message]) -> Vec<i64> {
    messages.iter().map(|message| message.id).collect()
}

#[tokio::test(start_paused = true)]
async fn select_fetches_immediately_then_every_interval() {
    let (transport, _) = chat_backend();
    let (client, _events) = client_with(&transport, SessionHandle::in_memory());
    let mut chat = ChatSync::new(client, INTERVAL);

    chat.select(7);
    sleep(SETTLE).await;
    assert_eq!(transport.count(Method::GET, &messages_path(7)), 1);
    assert_eq!(chat.view().messages().len(), 2);
    assert!(chat.is_polling());

    sleep(INTERVAL).await;
    assert_eq!(transport.count(Method::GET, &messages_path(7)), 2);
    sleep(INTERVAL).await;
    assert_eq!(transport.count(Method::GET, &messages_path(7)), 3);
}

#[tokio::test(start_paused = true)]
async fn switching_rooms_leaves_a_single_poller() {
    let (transport, _) = chat_backend();
    let (client, _events) = client_with(&transport, SessionHandle::in_memory());
    let mut chat = ChatSync::new(client, INTERVAL);
    let room_a = messages_path(7);
    let room_b = messages_path(8);

    chat.select(7);
    sleep(SETTLE).await;
    chat.select(8);
    sleep(SETTLE).await;
    assert_eq!(chat.active_room(), Some(8));
    assert!(chat.view().messages().is_empty());
    chat.select(7);
    sleep(SETTLE).await;
    assert_eq!(transport.count(Method::GET, &room_a), 2);
    assert_eq!(transport.count(Method::GET, &room_b), 1);

    // One interval later only the latest poller for room A has fired.
    sleep(INTERVAL).await;
    assert_eq!(transport.count(Method::GET, &room_a), 3);
    assert_eq!(transport.count(Method::GET, &room_b), 1);
}

#[tokio::test(start_paused = true)]
async fn stop_cancels_background_fetches() {
    let (transport, _) = chat_backend();
    let (client, _events) = client_with(&transport, SessionHandle::in_memory());
    let mut chat = ChatSync::new(client, INTERVAL);

    chat.select(7);
    sleep(SETTLE).await;
    chat.stop();
    sleep(INTERVAL * 3).await;

    assert_eq!(transport.count(Method::GET, &messages_path(7)), 1);
    assert_eq!(chat.active_room(), None);
    assert!(!chat.is_polling());
}

#[tokio::test(start_paused = true)]
async fn blank_text_or_no_room_sends_nothing() {
    let (transport, _) = chat_backend();
    let (client, _events) = client_with(&transport, SessionHandle::in_memory());
    let mut chat = ChatSync::new(client, INTERVAL);

    assert_eq!(chat.send("hi").await.unwrap(), None);
    assert!(transport.requests().is_empty());

    chat.select(7);
    sleep(SETTLE).await;
    assert_eq!(chat.send("   ").await.unwrap(), None);
    assert_eq!(chat.send("").await.unwrap(), None);
    assert_eq!(transport.count(Method::POST, &messages_path(7)), 0);
}

#[tokio::test(start_paused = true)]
async fn optimistic_send_is_reconciled_by_next_poll() {
    let (transport, server) = chat_backend();
    let (client, _events) = client_with(&transport, SessionHandle::in_memory());
    let mut chat = ChatSync::new(client, INTERVAL);

    chat.select(7);
    sleep(SETTLE).await;
    assert_eq!(ids(chat.view().messages()), vec![1, 2]);

    let sent = chat.send("hi").await.unwrap().unwrap();
    assert_eq!(sent.content, "hi");
    // Shown before any poll tick.
    assert_eq!(ids(chat.view().messages()), vec![1, 2, 3]);
    assert_eq!(transport.count(Method::GET, &messages_path(7)), 1);

    sleep(INTERVAL).await;
    let server_list: Vec<Message> =
        serde_json::from_value(serde_json::Value::Array(server.lock().unwrap().clone())).unwrap();
    assert_eq!(chat.view().messages(), server_list.as_slice());
    assert_eq!(ids(chat.view().messages()), vec![1, 2, 3]);
}

#[tokio::test(start_paused = true)]
async fn poll_errors_keep_polling() {
    let calls = Arc::new(Mutex::new(0usize));
    let counter = Arc::clone(&calls);
    let transport = ScriptedTransport::new(move |_| {
        let mut calls = counter.lock().unwrap();
        *calls += 1;
        if *calls == 1 {
            json(503, serde_json::json!({"detail": "maintenance"}))
        } else {
            json(200, serde_json::json!([message_json(1, 7, "back")]))
        }
    });
    let (client, _events) = client_with(&transport, SessionHandle::in_memory());
    let mut chat = ChatSync::new(client, INTERVAL);

    chat.select(7);
    sleep(SETTLE).await;
    assert!(chat.view().messages().is_empty());
    assert!(chat.is_polling());

    sleep(INTERVAL).await;
    assert_eq!(chat.view().messages().len(), 1);
}

#[tokio::test(start_paused = true)]
async fn expired_session_ends_polling() {
    let transport = ScriptedTransport::new(|_| json(401, serde_json::json!({})));
    let (client, mut events) = client_with(&transport, SessionHandle::in_memory());
    let mut chat = ChatSync::new(client, INTERVAL);

    chat.select(7);
    sleep(SETTLE).await;
    assert!(!chat.is_polling());
    assert_eq!(events.try_recv().unwrap(), SessionEvent::SignInRequired);

    sleep(INTERVAL * 2).await;
    assert_eq!(transport.count(Method::GET, &messages_path(7)), 1);
    assert_eq!(transport.count(Method::POST, REFRESH_PATH), 1);
}

/// Backend that takes `delay` to answer and tracks overlapping requests.
struct SlowTransport {
    delay: Duration,
    calls: AtomicUsize,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

#[async_trait]
impl Transport for SlowTransport {
    async fn send(&self, _request: ApiRequest) -> Result<ApiResponse, ApiError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);
        sleep(self.delay).await;
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        Ok(ApiResponse::new(StatusCode::OK, b"[]".to_vec()))
    }

    fn clear_cookies(&self) {}
}

#[tokio::test(start_paused = true)]
async fn slow_fetch_never_overlaps_the_next_tick() {
    let transport = Arc::new(SlowTransport {
        delay: Duration::from_secs(10),
        calls: AtomicUsize::new(0),
        in_flight: AtomicUsize::new(0),
        max_in_flight: AtomicUsize::new(0),
    });
    let client = ApiClient::new(transport.clone() as Arc<dyn Transport>, SessionHandle::in_memory());
    let mut chat = ChatSync::new(client, INTERVAL);

    chat.select(7);
    sleep(Duration::from_secs(31)).await;

    assert_eq!(transport.max_in_flight.load(Ordering::SeqCst), 1);
    // One fetch per 10s response, not one per 3s tick.
    assert_eq!(transport.calls.load(Ordering::SeqCst), 4);
    assert!(chat.is_polling());
}
