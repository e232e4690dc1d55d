use serde::{Deserialize, Serialize};

/// `GET /auth/users/me/`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CurrentUser {
    pub email: String,
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
}

impl CurrentUser {
    /// Up to two initials from the full name, else the first letter of the
    /// email, else `"U"`.
    pub fn initials(&self) -> String {
        let full_name = format!(
            "{} {}",
            self.first_name.as_deref().unwrap_or(""),
            self.last_name.as_deref().unwrap_or("")
        );

        let from_name: String = full_name
            .split_whitespace()
            .take(2)
            .filter_map(|part| part.chars().next())
            .flat_map(char::to_uppercase)
            .collect();
        if !from_name.is_empty() {
            return from_name;
        }

        self.email
            .chars()
            .next()
            .map(|c| c.to_uppercase().collect())
            .unwrap_or_else(|| "U".to_string())
    }
}

/// Body of `POST /auth/jwt/create/`.
#[derive(Debug, Clone, Serialize)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

/// Body of `POST /auth/users/`. The backend requires the password twice.
#[derive(Debug, Clone, Serialize)]
pub struct NewAccount {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub password: String,
    pub re_password: String,
}

impl NewAccount {
    pub fn new(
        first_name: impl Into<String>,
        last_name: impl Into<String>,
        email: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        let password = password.into();
        Self {
            first_name: first_name.into(),
            last_name: last_name.into(),
            email: email.into(),
            re_password: password.clone(),
            password,
        }
    }
}

/// `uid` and `token` from an activation or password reset link.
#[derive(Debug, Clone, Serialize)]
pub struct EmailToken {
    pub uid: String,
    pub token: String,
}

/// Body of `POST /auth/users/reset_password/`.
#[derive(Debug, Clone, Serialize)]
pub struct PasswordResetRequest {
    pub email: String,
}

/// Body of `POST /auth/users/reset_password_confirm/`.
#[derive(Debug, Clone, Serialize)]
pub struct PasswordResetConfirm {
    #[serde(flatten)]
    pub link: EmailToken,
    pub new_password: String,
    pub re_new_password: String,
}

/// Where a user should land, derived from the session and onboarding state.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionStatus {
    LoggedOut,
    NeedsOnboarding(CurrentUser),
    Ready(CurrentUser),
}
