use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::AppError;

/// Body of both `POST /user/` and `POST /login/`.
#[derive(Debug, Deserialize)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

impl Credentials {
    /// Trims and lowercases the email, then checks both fields are usable.
    pub fn normalized(mut self) -> Result<Self, AppError> {
        self.email = self.email.trim().to_lowercase();
        if !is_valid_email(&self.email) {
            return Err(AppError::validation("Invalid email"));
        }
        if self.password.is_empty() {
            return Err(AppError::validation("Password must not be empty"));
        }
        Ok(self)
    }
}

/// `{userId, isLogged, message}`, the shape both registration and login answer with.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthStatus {
    pub user_id: Option<i64>,
    pub is_logged: bool,
    pub message: String,
}

impl AuthStatus {
    pub fn logged_in(user_id: i64, message: &str) -> Self {
        Self {
            user_id: Some(user_id),
            is_logged: true,
            message: message.to_string(),
        }
    }

    pub fn rejected(message: &str) -> Self {
        Self {
            user_id: None,
            is_logged: false,
            message: message.to_string(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct PublicUser {
    pub id: i64,
    pub email: String,
}

pub(crate) fn is_valid_email(email: &str) -> bool {
    lazy_static! {
        static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
    }
    EMAIL_RE.is_match(email)
}
