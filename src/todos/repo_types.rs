use sqlx::FromRow;
use time::OffsetDateTime;
use uuid::Uuid;

pub const MAX_TITLE_CHARS: usize = 100;

#[derive(Debug, Clone, FromRow, PartialEq, Eq)]
pub struct Todo {
    pub id: Uuid,
    pub user_id: Uuid,
    pub title: String,
    pub done: bool,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
}

impl Todo {
    pub fn new(user_id: Uuid, title: impl Into<String>) -> Self {
        let now = OffsetDateTime::now_utc();
        Self {
            id: Uuid::new_v4(),
            user_id,
            title: title.into(),
            done: false,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Trims the raw form value and checks it is 1..=100 characters.
pub fn normalize_title(raw: &str) -> Option<&str> {
    let title = raw.trim();
    let len = title.chars().count();
    (len > 0 && len <= MAX_TITLE_CHARS).then_some(title)
}
