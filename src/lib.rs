// Library root for the Emo Pop API

pub mod config;
pub mod db;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod router;
pub mod state;

// Re-export commonly used types
pub use db::Database;
pub use error::ApiError;
pub use models::{Emotion, RegisterUserRequest, User, UserStatus};
pub use router::build_router;
pub use state::{AppState, SharedState};
