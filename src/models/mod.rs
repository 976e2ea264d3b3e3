// Models module

pub mod user;
pub mod emotion;

// Re-export commonly used types
pub use user::{User, RegisterUserRequest, UserStatus};
pub use emotion::{Emotion, DEFAULT_EMOTIONS};
