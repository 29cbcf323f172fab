//! Typed wrappers over `ApiClient`, one module per backend area.
//!
//! Paths are relative to the API root and keep the backend's trailing slash.

pub mod accounts;
pub mod admin;
pub mod chat;
pub mod favorites;
pub mod pets;

pub use accounts::{LoginForm, RegisterForm};
pub use admin::UserAction;
