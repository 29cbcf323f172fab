use serde::Serialize;
use tracing::{info, warn};

use crate::client::ApiClient;
use crate::error::ApiError;
use crate::models::User;

pub const LOGIN_PATH: &str = "accounts/login/";
pub const REGISTER_PATH: &str = "accounts/register/";
pub const LOGOUT_PATH: &str = "accounts/logout/";
pub const CURRENT_USER_PATH: &str = "accounts/user/";

#[derive(Debug, Clone, Default, Serialize)]
pub struct LoginForm {
    pub email: String,
    pub password: String,
}

impl LoginForm {
    pub fn validate(&self) -> Result<(), ApiError> {
        if self.email.trim().is_empty() || self.password.is_empty() {
            return Err(ApiError::InvalidInput(
                "Please fill in email and password".to_string(),
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default)]
pub struct RegisterForm {
    pub name: String,
    pub email: String,
    pub phone: String,
    pub city: String,
    pub password: String,
    pub confirm_password: String,
}

/// Wire shape of `accounts/register/`; the backend wants a username and a
/// repeated password, so the email doubles as username.
#[derive(Serialize)]
struct RegisterPayload<'a> {
    username: &'a str,
    email: &'a str,
    password: &'a str,
    password2: &'a str,
    name: &'a str,
    phone: &'a str,
    city: &'a str,
}

impl RegisterForm {
    pub fn validate(&self) -> Result<(), ApiError> {
        if self.email.trim().is_empty() || self.password.is_empty() {
            return Err(ApiError::InvalidInput(
                "Email and password are required".to_string(),
            ));
        }
        if self.password != self.confirm_password {
            return Err(ApiError::InvalidInput("Passwords do not match".to_string()));
        }
        Ok(())
    }

    fn payload(&self) -> RegisterPayload<'_> {
        let email = self.email.trim();
        RegisterPayload {
            username: email,
            email,
            password: &self.password,
            password2: &self.password,
            name: self.name.trim(),
            phone: self.phone.trim(),
            city: self.city.trim(),
        }
    }
}

impl ApiClient {
    /// Sign in, then load the full user record into the session.
    pub async fn login(&self, form: &LoginForm) -> Result<User, ApiError> {
        form.validate()?;
        let _: serde_json::Value = self
            .post_json(
                LOGIN_PATH,
                &LoginForm {
                    email: form.email.trim().to_string(),
                    password: form.password.clone(),
                },
            )
            .await?;
        let user = self.load_current_user().await?;
        info!(user_id = user.id, "signed in");
        Ok(user)
    }

    pub async fn register(&self, form: &RegisterForm) -> Result<User, ApiError> {
        form.validate()?;
        let _: serde_json::Value = self.post_json(REGISTER_PATH, &form.payload()).await?;
        let user = self.load_current_user().await?;
        info!(user_id = user.id, "registered");
        Ok(user)
    }

    /// Tell the backend, then clear local state whatever it answered.
    pub async fn logout(&self) {
        if let Err(error) = self.post_empty(LOGOUT_PATH).await {
            warn!(%error, "logout request failed, clearing local session anyway");
        }
        self.forget_session();
        info!("signed out");
    }

    pub async fn current_user(&self) -> Result<User, ApiError> {
        self.get_json(CURRENT_USER_PATH).await
    }

    /// Re-validate a persisted session. A rejected session is cleared.
    pub async fn restore(&self) -> Option<User> {
        self.session().user()?;
        match self.load_current_user().await {
            Ok(user) => Some(user),
            Err(error) => {
                warn!(%error, "saved session is no longer valid");
                self.forget_session();
                None
            }
        }
    }

    async fn load_current_user(&self) -> Result<User, ApiError> {
        let user = self.current_user().await?;
        self.session().set_user(Some(user.clone()));
        Ok(user)
    }
}
