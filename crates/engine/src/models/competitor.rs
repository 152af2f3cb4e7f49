use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Competitor {
    pub competitor_id: Uuid,
    pub name: String,
    pub email: String,
    pub license_number: Option<String>,
    pub license_expires_at: Option<DateTime<Utc>>,
    pub active: bool,
    pub banned: bool,
    pub ban_reason: Option<String>,
    pub banned_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
}

impl Competitor {
    pub fn new(name: impl Into<String>, email: impl Into<String>, now: DateTime<Utc>) -> Self {
        Self {
            competitor_id: Uuid::new_v4(),
            name: name.into(),
            email: email.into(),
            license_number: None,
            license_expires_at: None,
            active: true,
            banned: false,
            ban_reason: None,
            banned_at: None,
            created_at: now,
            deleted_at: None,
        }
    }

    /// A license is valid only while its expiry lies strictly in the future.
    pub fn has_valid_license(&self, now: DateTime<Utc>) -> bool {
        self.license_expires_at.is_some_and(|expiry| expiry > now)
    }

    pub fn is_deleted(&self) -> bool {
        self.deleted_at.is_some()
    }
}
