use tracing::info;

use crate::client::ApiClient;
use crate::error::ApiError;
use crate::models::{AdminUser, Listing};

pub const USERS_PATH: &str = "users/";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UserAction {
    Block,
    Unblock,
}

impl UserAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            UserAction::Block => "block",
            UserAction::Unblock => "unblock",
        }
    }

    /// Status a user ends up in once the action succeeds.
    pub fn resulting_status(&self) -> &'static str {
        match self {
            UserAction::Block => "blocked",
            UserAction::Unblock => "active",
        }
    }

    /// Block active users, unblock everyone else.
    pub fn for_user(user: &AdminUser) -> Self {
        if user.is_active() {
            UserAction::Block
        } else {
            UserAction::Unblock
        }
    }
}

pub fn user_action_path(user_id: i64, action: UserAction) -> String {
    format!("users/{user_id}/{}/", action.as_str())
}

impl ApiClient {
    pub async fn list_users(&self) -> Result<Vec<AdminUser>, ApiError> {
        let users: Listing<AdminUser> = self.get_json(USERS_PATH).await?;
        Ok(users.into_vec())
    }

    /// Apply `action` and mirror the new status into `users`.
    pub async fn moderate_user(
        &self,
        user_id: i64,
        action: UserAction,
        users: &mut [AdminUser],
    ) -> Result<(), ApiError> {
        self.post_empty(&user_action_path(user_id, action)).await?;
        if let Some(user) = users.iter_mut().find(|user| user.id == user_id) {
            user.status = Some(action.resulting_status().to_string());
        }
        info!(user_id, action = action.as_str(), "user moderated");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn action_paths_and_statuses() {
        assert_eq!(user_action_path(4, UserAction::Block), "users/4/block/");
        assert_eq!(user_action_path(4, UserAction::Unblock), "users/4/unblock/");
        assert_eq!(UserAction::Block.resulting_status(), "blocked");
        assert_eq!(UserAction::Unblock.resulting_status(), "active");
    }

    #[test]
    fn action_follows_current_status() {
        let mut user = AdminUser {
            id: 1,
            username: "ana".to_string(),
            email: String::new(),
            name: String::new(),
            status: Some("active".to_string()),
            is_staff: false,
        };
        assert_eq!(UserAction::for_user(&user), UserAction::Block);
        user.status = Some("blocked".to_string());
        assert_eq!(UserAction::for_user(&user), UserAction::Unblock);
    }
}
