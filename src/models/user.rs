use serde::{Deserialize, Serialize};
use uuid::Uuid;
use chrono::{DateTime, Utc};

/// Longest accepted user name, in characters.
pub const MAX_NAME_LENGTH: usize = 100;

/// A registered player. `name` is the external identity the client sends.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: Uuid,
    pub name: String,
    pub created_at: DateTime<Utc>,
}

/// Payload for `POST /api/users`.
#[derive(Debug, Deserialize)]
pub struct RegisterUserRequest {
    pub name: String,
}

/// Result of a find-or-create: `created` is false when the name was already registered.
#[derive(Debug, Clone, Serialize)]
pub struct UserStatus {
    pub created: bool,
    pub user: User,
}

impl User {
    pub fn new(name: String) -> Self {
        User {
            id: Uuid::new_v4(),
            name,
            created_at: Utc::now(),
        }
    }
}

impl RegisterUserRequest {
    /// Rejects names that are blank, too long, or carry control characters.
    /// Length is checked on the trimmed value, in characters rather than bytes.
    pub fn validate(&self) -> Result<(), String> {
        let name = self.name.trim();

        if name.is_empty() {
            return Err("Name cannot be empty".to_string());
        }

        if name.chars().count() > MAX_NAME_LENGTH {
            return Err(format!("Name cannot exceed {} characters", MAX_NAME_LENGTH));
        }

        if name.chars().any(char::is_control) {
            return Err("Name cannot contain control characters".to_string());
        }

        Ok(())
    }

    /// Trimmed, case-preserving identity used for lookup and storage.
    pub fn normalized_name(&self) -> String {
        self.name.trim().to_string()
    }

    pub fn into_user(self) -> User {
        User::new(self.normalized_name())
    }
}
