//! Keeps the active conversation's message list fresh by polling.
//!
//! Selecting a room fetches its messages at once and then on every interval
//! tick until another room is selected or the sync is stopped. There is at
//! most one poller alive, and it awaits each fetch before waiting for the next
//! tick, so a slow response never stacks a second request.
//!
//! Sent messages are appended immediately; the next poll replaces the whole
//! list with the server's copy.

use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, warn};

use crate::client::ApiClient;
use crate::config::DEFAULT_POLL_INTERVAL_SECS;
use crate::error::ApiError;
use crate::models::Message;

pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(DEFAULT_POLL_INTERVAL_SECS);

/// What the chat screen shows: the active room and its last known messages.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChatView {
    room: Option<i64>,
    messages: Vec<Message>,
}

impl ChatView {
    pub fn active_room(&self) -> Option<i64> {
        self.room
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    fn activate(&mut self, room: Option<i64>) {
        self.room = room;
        self.messages.clear();
    }

    /// Take the server's list wholesale, unless `room` is no longer active.
    pub fn replace(&mut self, room: i64, messages: Vec<Message>) -> bool {
        if self.room != Some(room) {
            return false;
        }
        self.messages = messages;
        true
    }

    /// Optimistically show a message just sent to `room`.
    pub fn append(&mut self, room: i64, message: Message) -> bool {
        if self.room != Some(room) {
            return false;
        }
        self.messages.push(message);
        true
    }
}

pub struct ChatSync {
    client: ApiClient,
    interval: Duration,
    view: Arc<Mutex<ChatView>>,
    poller: Option<JoinHandle<()>>,
}

impl ChatSync {
    pub fn new(client: ApiClient, interval: Duration) -> Self {
        Self {
            client,
            interval,
            view: Arc::new(Mutex::new(ChatView::default())),
            poller: None,
        }
    }

    /// Current state for rendering.
    pub fn view(&self) -> ChatView {
        lock(&self.view).clone()
    }

    pub fn active_room(&self) -> Option<i64> {
        lock(&self.view).active_room()
    }

    pub fn is_polling(&self) -> bool {
        self.poller
            .as_ref()
            .is_some_and(|handle| !handle.is_finished())
    }

    /// Make `room_id` active: cancel the old poller, start fetch-then-poll.
    /// Must be called from inside a tokio runtime.
    pub fn select(&mut self, room_id: i64) {
        self.cancel_poller();
        lock(&self.view).activate(Some(room_id));
        debug!(room_id, "chat room selected");

        let client = self.client.clone();
        let view = Arc::clone(&self.view);
        let period = self.interval;
        self.poller = Some(tokio::spawn(poll_room(client, view, room_id, period)));
    }

    /// Leave the chat: no room active, no background fetches.
    pub fn stop(&mut self) {
        self.cancel_poller();
        lock(&self.view).activate(None);
    }

    /// Post `text` to the active room and show it without waiting for a poll.
    /// Blank text or no active room is a no-op that touches no network.
    pub async fn send(&self, text: &str) -> Result<Option<Message>, ApiError> {
        let Some(room_id) = self.active_room() else {
            return Ok(None);
        };
        if text.trim().is_empty() {
            return Ok(None);
        }

        let message = self.client.send_message(room_id, text).await?;
        lock(&self.view).append(room_id, message.clone());
        Ok(Some(message))
    }

    fn cancel_poller(&mut self) {
        if let Some(handle) = self.poller.take() {
            handle.abort();
        }
    }
}

impl Drop for ChatSync {
    fn drop(&mut self) {
        self.cancel_poller();
    }
}

async fn poll_room(client: ApiClient, view: Arc<Mutex<ChatView>>, room_id: i64, period: Duration) {
    let mut ticker = tokio::time::interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        // The first tick completes immediately.
        ticker.tick().await;
        match client.list_messages(room_id).await {
            Ok(messages) => {
                lock(&view).replace(room_id, messages);
            }
            Err(ApiError::SessionExpired) => {
                warn!(room_id, "session expired, chat polling stopped");
                break;
            }
            Err(error) => warn!(room_id, %error, "failed to load messages"),
        }
    }
}

fn lock(view: &Mutex<ChatView>) -> MutexGuard<'_, ChatView> {
    view.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}
