use serde::Deserialize;

pub const MIN_EMAIL_LEN: usize = 5;
pub const MIN_PASSWORD_LEN: usize = 6;

/// Form body for both `/login` and `/register`. Missing fields arrive as empty strings.
#[derive(Debug, Deserialize)]
pub struct CredentialsForm {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

impl CredentialsForm {
    pub fn normalized_email(&self) -> String {
        self.email.trim().to_lowercase()
    }
}

/// Query markers on the auth pages (`?fail=1`, `?exists=1`).
#[derive(Debug, Default, Deserialize)]
pub struct AuthNotice {
    pub fail: Option<String>,
    pub exists: Option<String>,
}

impl AuthNotice {
    pub fn message(&self) -> Option<&'static str> {
        if self.exists.is_some() {
            Some("An account with this email already exists.")
        } else if self.fail.is_some() {
            Some("Invalid email or password.")
        } else {
            None
        }
    }
}

pub fn is_acceptable_registration(email: &str, password: &str) -> bool {
    email.len() >= MIN_EMAIL_LEN && password.len() >= MIN_PASSWORD_LEN
}
