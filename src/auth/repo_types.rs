use sqlx::FromRow;
use time::OffsetDateTime;
use uuid::Uuid;

/// User record in the database.
#[derive(Debug, Clone, FromRow)]
pub struct User {
    pub id: Uuid,                     // unique user ID
    pub email: String,                // lowercased, unique
    pub password_hash: String,        // Argon2 PHC string, never the plaintext
    pub created_at: OffsetDateTime,   // creation timestamp
}

impl User {
    pub fn new(email: impl Into<String>, password_hash: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            email: email.into(),
            password_hash: password_hash.into(),
            created_at: OffsetDateTime::now_utc(),
        }
    }
}
