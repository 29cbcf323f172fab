//! Records exchanged with the Roveri REST backend.
//!
//! Timestamps are kept as the ISO-8601 strings the backend sends; the client
//! only displays and orders them as received.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// The signed-in identity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub username: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub is_staff: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
}

impl User {
    pub fn is_admin(&self) -> bool {
        self.is_staff || self.role.as_deref() == Some("admin")
    }

    pub fn display_name(&self) -> &str {
        if self.name.trim().is_empty() {
            &self.username
        } else {
            &self.name
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Pet {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub species: String,
    #[serde(default)]
    pub breed: String,
    #[serde(default)]
    pub age_text: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub city: String,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub created_by: Option<i64>,
    #[serde(default)]
    pub created_by_username: Option<String>,
    #[serde(default = "default_published")]
    pub is_published: bool,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub views: Option<u64>,
    #[serde(default)]
    pub created_at: Option<String>,
}

fn default_published() -> bool {
    true
}

impl Pet {
    pub fn owner_label(&self) -> &str {
        self.created_by_username.as_deref().unwrap_or("Unknown")
    }

    pub fn city_label(&self) -> &str {
        if self.city.trim().is_empty() {
            "Unknown"
        } else {
            &self.city
        }
    }
}

/// Form data for publishing a pet. `image` is a local file uploaded with the form.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NewPet {
    pub name: String,
    pub species: String,
    pub breed: String,
    pub age_text: String,
    pub city: String,
    pub description: String,
    pub image: Option<PathBuf>,
}

impl NewPet {
    pub fn text_fields(&self) -> Vec<(String, String)> {
        [
            ("name", &self.name),
            ("species", &self.species),
            ("breed", &self.breed),
            ("age_text", &self.age_text),
            ("city", &self.city),
            ("description", &self.description),
        ]
        .into_iter()
        .map(|(key, value)| (key.to_string(), value.trim().to_string()))
        .collect()
    }
}

/// A conversation between two users about one pet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatRoom {
    pub id: i64,
    #[serde(default)]
    pub pet: Option<i64>,
    #[serde(default)]
    pub pet_name: Option<String>,
    #[serde(default)]
    pub user1: Option<i64>,
    #[serde(default)]
    pub user1_username: Option<String>,
    #[serde(default)]
    pub user2: Option<i64>,
    #[serde(default)]
    pub user2_username: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
}

impl ChatRoom {
    pub fn title(&self) -> String {
        self.pet_name
            .clone()
            .unwrap_or_else(|| format!("Room {}", self.id))
    }

    pub fn participants(&self) -> String {
        format!(
            "{} & {}",
            self.user1_username.as_deref().unwrap_or("?"),
            self.user2_username.as_deref().unwrap_or("?"),
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub id: i64,
    pub room: i64,
    pub sender: i64,
    #[serde(default)]
    pub sender_username: Option<String>,
    pub content: String,
    pub timestamp: String,
}

impl Message {
    pub fn is_from(&self, user: &User) -> bool {
        self.sender == user.id || self.sender_username.as_deref() == Some(user.username.as_str())
    }

    /// `HH:MM` slice of the timestamp, or the raw value if it is not ISO-8601.
    pub fn time_label(&self) -> &str {
        self.timestamp
            .split_once('T')
            .and_then(|(_, time)| time.get(..5))
            .unwrap_or(&self.timestamp)
    }
}

/// A row in the admin user table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdminUser {
    pub id: i64,
    pub username: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub is_staff: bool,
}

impl AdminUser {
    pub fn is_active(&self) -> bool {
        self.status.as_deref() == Some("active")
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SiteStats {
    #[serde(rename = "petsAdotados", default)]
    pub pets_adopted: u64,
    #[serde(rename = "usuariosAtivos", default)]
    pub active_users: u64,
    #[serde(rename = "cidadesAtendidas", default)]
    pub cities_served: u64,
}

/// Either a bare JSON array or a paginated `{ "results": [...] }` page.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum Listing<T> {
    Page { results: Vec<T> },
    Plain(Vec<T>),
}

impl<T> Listing<T> {
    pub fn into_vec(self) -> Vec<T> {
        match self {
            Listing::Page { results } => results,
            Listing::Plain(items) => items,
        }
    }
}
