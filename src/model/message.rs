//! Contact-form messages sent from the storefront.

use crate::error::AppError;
use chrono::{DateTime, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;
use uuid::Uuid;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ContactMessage {
    pub id: Uuid,
    pub tenant_id: Uuid,
    pub property_id: Option<Uuid>,
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub message: String,
    pub read: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct NewContactMessage {
    #[serde(default)]
    pub property_id: Option<Uuid>,
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub phone: Option<String>,
    pub message: String,
}

fn email_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").expect("static email pattern"))
}

impl NewContactMessage {
    pub fn validate(&self) -> Result<(), AppError> {
        if self.name.trim().is_empty() {
            return Err(AppError::Validation("name is required".into()));
        }
        if self.name.chars().count() > 120 {
            return Err(AppError::Validation("name must be at most 120 characters".into()));
        }
        if !email_re().is_match(self.email.trim()) {
            return Err(AppError::Validation("email must be a valid email".into()));
        }
        if self.message.trim().is_empty() {
            return Err(AppError::Validation("message is required".into()));
        }
        if self.message.chars().count() > 5000 {
            return Err(AppError::Validation("message must be at most 5000 characters".into()));
        }
        if let Some(phone) = &self.phone {
            if phone.chars().count() > 40 {
                return Err(AppError::Validation("phone must be at most 40 characters".into()));
            }
        }
        Ok(())
    }
}

#[derive(Clone, Debug, Deserialize)]
pub struct MessagePatch {
    pub read: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn msg(email: &str) -> NewContactMessage {
        NewContactMessage {
            property_id: None,
            name: "Ana".into(),
            email: email.into(),
            phone: None,
            message: "Tenho interesse".into(),
        }
    }

    #[test]
    fn rejects_malformed_email() {
        assert!(msg("ana@example.com").validate().is_ok());
        assert!(msg("ana@example").validate().is_err());
        assert!(msg("ana example.com").validate().is_err());
    }
}
