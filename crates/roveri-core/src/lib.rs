pub mod api;
pub mod chat_sync;
pub mod client;
pub mod config;
pub mod dashboard;
pub mod error;
pub mod filter;
pub mod models;
pub mod session;
pub mod transport;

// Re-export main types for convenience
pub use api::{LoginForm, RegisterForm, UserAction};
pub use chat_sync::{ChatSync, ChatView};
pub use client::{ApiClient, SessionEvent};
pub use config::Config;
pub use dashboard::DashboardStats;
pub use error::ApiError;
pub use filter::{PetFilter, SpeciesFilter};
pub use models::{AdminUser, ChatRoom, Message, NewPet, Pet, SiteStats, User};
pub use session::{FileSessionStore, MemorySessionStore, Session, SessionHandle, SessionStore};
pub use transport::{ApiRequest, ApiResponse, ReqwestTransport, Transport};
