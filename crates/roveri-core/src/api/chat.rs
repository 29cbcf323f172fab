use serde::Serialize;

use crate::client::ApiClient;
use crate::error::ApiError;
use crate::models::{ChatRoom, Listing, Message};

pub const ROOMS_PATH: &str = "chat/rooms/";

pub fn messages_path(room_id: i64) -> String {
    format!("chat/rooms/{room_id}/messages/")
}

#[derive(Serialize)]
struct OpenRoomRequest {
    pet_id: i64,
    receiver_id: i64,
}

#[derive(Serialize)]
struct SendMessageRequest<'a> {
    content: &'a str,
}

impl ApiClient {
    /// Rooms the signed-in user takes part in.
    pub async fn list_rooms(&self) -> Result<Vec<ChatRoom>, ApiError> {
        let rooms: Listing<ChatRoom> = self.get_json(ROOMS_PATH).await?;
        Ok(rooms.into_vec())
    }

    /// Get or create the room about `pet_id` between the caller and `receiver_id`.
    pub async fn open_room(&self, pet_id: i64, receiver_id: i64) -> Result<ChatRoom, ApiError> {
        self.post_json(
            ROOMS_PATH,
            &OpenRoomRequest {
                pet_id,
                receiver_id,
            },
        )
        .await
    }

    /// Full message list of a room, oldest first.
    pub async fn list_messages(&self, room_id: i64) -> Result<Vec<Message>, ApiError> {
        let messages: Listing<Message> = self.get_json(&messages_path(room_id)).await?;
        Ok(messages.into_vec())
    }

    pub async fn send_message(&self, room_id: i64, content: &str) -> Result<Message, ApiError> {
        self.post_json(&messages_path(room_id), &SendMessageRequest { content })
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_path_is_room_scoped() {
        assert_eq!(messages_path(7), "chat/rooms/7/messages/");
    }
}
