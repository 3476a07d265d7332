use serde::Deserialize;
use uuid::Uuid;

#[derive(Debug, Deserialize)]
pub struct NewTodoForm {
    #[serde(default)]
    pub title: String,
}

/// Path ids are parsed by hand so a malformed id takes the same no-op path as a
/// foreign one instead of producing a 400.
pub fn parse_todo_id(raw: &str) -> Option<Uuid> {
    Uuid::parse_str(raw).ok()
}
